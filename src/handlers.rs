// src/handlers.rs

pub mod admin;
pub mod auth;
pub mod cash_register;
pub mod checkin;
pub mod coupons;
pub mod customers;
pub mod feedbacks;
pub mod financial;
pub mod iam;
pub mod labels;
pub mod menu;
pub mod qr_codes;
pub mod restaurant;
pub mod rewards;
pub mod stock;
pub mod surveys;
pub mod waiter_calls;
