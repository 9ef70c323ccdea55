// src/common/db_utils.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::common::error::AppError;

// ---
// Helper de Constraint: traduz violação de UNIQUE para um erro de conflito
// ---
pub(crate) fn on_unique_violation(err: sqlx::Error, conflict_key: &'static str) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return AppError::Conflict(conflict_key);
        }
    }
    err.into()
}

/// Como `on_unique_violation`, mas com o erro de domínio escolhido pelo chamador.
pub(crate) fn on_unique_violation_as(err: sqlx::Error, error: AppError) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return error;
        }
    }
    err.into()
}

// ---
// Paginação (page/limit na query string)
// ---
pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, Copy)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    pub fn new(page: Option<i64>, limit: Option<i64>, default_limit: i64) -> Self {
        let page = page.filter(|p| *p > 0).unwrap_or(1);
        let limit = limit
            .filter(|l| *l > 0)
            .unwrap_or(default_limit)
            .min(MAX_PAGE_SIZE);
        Self { page, limit }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_items: i64,
    pub items_per_page: i64,
}

impl Pagination {
    pub fn from_total(request: PageRequest, total_items: i64) -> Self {
        // Divisão com arredondamento para cima
        let total_pages = (total_items + request.limit - 1) / request.limit;
        Self {
            current_page: request.page,
            total_pages,
            total_items,
            items_per_page: request.limit,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T: Serialize> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_request_clamps_invalid_values() {
        let req = PageRequest::new(Some(0), Some(1000), DEFAULT_PAGE_SIZE);
        assert_eq!(req.page, 1);
        assert_eq!(req.limit, MAX_PAGE_SIZE);
        assert_eq!(req.offset(), 0);

        let req = PageRequest::new(Some(3), None, 12);
        assert_eq!(req.limit, 12);
        assert_eq!(req.offset(), 24);
    }

    #[test]
    fn pagination_rounds_pages_up() {
        let req = PageRequest::new(Some(1), Some(10), DEFAULT_PAGE_SIZE);
        assert_eq!(Pagination::from_total(req, 0).total_pages, 0);
        assert_eq!(Pagination::from_total(req, 10).total_pages, 1);
        assert_eq!(Pagination::from_total(req, 11).total_pages, 2);
    }

    // Erro de banco mínimo para simular violações de constraint
    #[derive(Debug)]
    struct FakeDbError(sqlx::error::ErrorKind);

    impl std::fmt::Display for FakeDbError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "erro simulado")
        }
    }

    impl std::error::Error for FakeDbError {}

    impl sqlx::error::DatabaseError for FakeDbError {
        fn message(&self) -> &str {
            "erro simulado"
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            match self.0 {
                sqlx::error::ErrorKind::UniqueViolation => sqlx::error::ErrorKind::UniqueViolation,
                _ => sqlx::error::ErrorKind::Other,
            }
        }
    }

    fn db_error(kind: sqlx::error::ErrorKind) -> sqlx::Error {
        sqlx::Error::Database(Box::new(FakeDbError(kind)))
    }

    #[test]
    fn unique_violation_maps_to_the_chosen_error() {
        let err = on_unique_violation_as(
            db_error(sqlx::error::ErrorKind::UniqueViolation),
            AppError::BadRequest("checkin.already_active"),
        );
        assert!(matches!(err, AppError::BadRequest("checkin.already_active")));

        let err = on_unique_violation(db_error(sqlx::error::ErrorKind::UniqueViolation), "customer.already_exists");
        assert!(matches!(err, AppError::Conflict("customer.already_exists")));
    }

    #[test]
    fn other_database_errors_pass_through() {
        let err = on_unique_violation_as(
            db_error(sqlx::error::ErrorKind::Other),
            AppError::BadRequest("checkin.already_active"),
        );
        assert!(matches!(err, AppError::DatabaseError(_)));

        let err = on_unique_violation_as(sqlx::Error::RowNotFound, AppError::BadRequest("checkin.already_active"));
        assert!(matches!(err, AppError::DatabaseError(sqlx::Error::RowNotFound)));
    }

    #[test]
    fn schema_allows_a_single_active_checkin_per_customer() {
        let migration = include_str!("../../migrations/20250101000008_checkin_active_unique.sql");
        assert!(migration.contains("CREATE UNIQUE INDEX uq_checkins_one_active"));
        assert!(migration.contains("ON checkins(restaurant_id, customer_id)"));
        assert!(migration.contains("WHERE status = 'active'"));
    }
}
