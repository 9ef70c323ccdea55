// src/models.rs

pub mod audit;
pub mod auth;
pub mod cash_register;
pub mod checkin;
pub mod coupon;
pub mod customer;
pub mod feedback;
pub mod financial;
pub mod iam;
pub mod label;
pub mod product;
pub mod qr_code;
pub mod restaurant;
pub mod reward;
pub mod stock;
pub mod survey;
pub mod waiter_call;
