// src/db.rs

pub mod user_repo;
pub use user_repo::UserRepository;
pub mod restaurant_repo;
pub use restaurant_repo::RestaurantRepository;
pub mod iam_repo;
pub use iam_repo::IamRepository;
pub mod audit_repo;
pub use audit_repo::AuditRepository;
pub mod customer_repo;
pub use customer_repo::CustomerRepository;
pub mod checkin_repo;
pub use checkin_repo::CheckinRepository;
pub mod product_repo;
pub use product_repo::ProductRepository;
pub mod stock_repo;
pub use stock_repo::StockRepository;
pub mod label_repo;
pub use label_repo::LabelRepository;
pub mod reward_repo;
pub use reward_repo::RewardRepository;
pub mod coupon_repo;
pub use coupon_repo::CouponRepository;
pub mod survey_repo;
pub use survey_repo::SurveyRepository;
pub mod waiter_call_repo;
pub use waiter_call_repo::WaiterCallRepository;
pub mod financial_repo;
pub use financial_repo::FinancialRepository;
pub mod cash_register_repo;
pub use cash_register_repo::CashRegisterRepository;
pub mod feedback_repo;
pub use feedback_repo::FeedbackRepository;
pub mod qr_code_repo;
pub use qr_code_repo::QrCodeRepository;
