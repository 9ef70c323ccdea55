// src/services.rs

pub mod audit_service;
pub mod auth;
pub mod cash_register_service;
pub mod checkin_service;
pub mod coupon_service;
pub mod customer_service;
pub mod feedback_service;
pub mod financial_service;
pub mod iam_service;
pub mod label_service;
pub mod product_service;
pub mod qr_code_service;
pub mod rate_limiter;
pub mod restaurant_service;
pub mod reward_service;
pub mod stock_service;
pub mod survey_service;
pub mod waiter_call_service;
