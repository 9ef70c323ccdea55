// src/services/financial_service.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::FinancialRepository,
    models::financial::{
        CashFlowQuery, CashFlowReport, CreateCategoryPayload, CreateTransactionPayload, FinancialCategory,
        FinancialTransaction, PaymentMethod, PaymentMethodFilter, PaymentMethodPayload, TransactionFilter,
        TransactionType,
    },
};

/// Período do fluxo de caixa: as duas datas são obrigatórias e em ordem.
pub fn cash_flow_period(query: &CashFlowQuery) -> Result<(NaiveDate, NaiveDate), AppError> {
    match (query.start_date, query.end_date) {
        (Some(start), Some(end)) if start <= end => Ok((start, end)),
        (Some(_), Some(_)) => Err(AppError::BadRequest("financial.invalid_period")),
        _ => Err(AppError::BadRequest("financial.period_required")),
    }
}

pub fn check_category_type(category: &FinancialCategory, transaction_type: TransactionType) -> Result<(), AppError> {
    if category.category_type != transaction_type {
        return Err(AppError::BadRequest("financial.category_type_mismatch"));
    }
    Ok(())
}

#[derive(Clone)]
pub struct FinancialService {
    repo: FinancialRepository,
}

impl FinancialService {
    pub fn new(repo: FinancialRepository) -> Self {
        Self { repo }
    }

    // --- Transações ---

    pub async fn create_transaction(
        &self,
        restaurant_id: Uuid,
        user_id: Uuid,
        payload: &CreateTransactionPayload,
    ) -> Result<FinancialTransaction, AppError> {
        if payload.amount <= Decimal::ZERO {
            return Err(AppError::BadRequest("financial.invalid_amount"));
        }

        if let Some(category_id) = payload.category_id {
            let category = self
                .repo
                .find_category(restaurant_id, category_id)
                .await?
                .ok_or(AppError::NotFound("financial.category_not_found"))?;
            check_category_type(&category, payload.transaction_type)?;
        }

        let transaction = self.repo.create_transaction(restaurant_id, user_id, payload).await?;

        tracing::info!(
            %restaurant_id,
            transaction_id = %transaction.id,
            kind = ?transaction.transaction_type,
            amount = %transaction.amount,
            "Lançamento financeiro registrado"
        );
        Ok(transaction)
    }

    pub async fn list_transactions(&self, restaurant_id: Uuid, filter: &TransactionFilter) -> Result<Vec<FinancialTransaction>, AppError> {
        self.repo.list_transactions(restaurant_id, filter).await
    }

    // --- Categorias ---

    pub async fn list_categories(
        &self,
        restaurant_id: Uuid,
        category_type: Option<TransactionType>,
    ) -> Result<Vec<FinancialCategory>, AppError> {
        self.repo.list_categories(restaurant_id, category_type).await
    }

    pub async fn create_category(&self, restaurant_id: Uuid, payload: &CreateCategoryPayload) -> Result<FinancialCategory, AppError> {
        self.repo.create_category(restaurant_id, payload).await
    }

    // --- Formas de pagamento ---

    pub async fn list_payment_methods(&self, restaurant_id: Uuid, filter: &PaymentMethodFilter) -> Result<Vec<PaymentMethod>, AppError> {
        self.repo.list_payment_methods(restaurant_id, filter).await
    }

    pub async fn create_payment_method(&self, restaurant_id: Uuid, payload: &PaymentMethodPayload) -> Result<PaymentMethod, AppError> {
        self.repo.create_payment_method(restaurant_id, payload).await
    }

    /// Só as formas do próprio restaurante são editáveis; as globais respondem 404.
    pub async fn update_payment_method(
        &self,
        restaurant_id: Uuid,
        id: Uuid,
        payload: &PaymentMethodPayload,
    ) -> Result<PaymentMethod, AppError> {
        self.repo
            .update_payment_method(restaurant_id, id, payload)
            .await?
            .ok_or(AppError::NotFound("financial.payment_method_not_found"))
    }

    pub async fn delete_payment_method(&self, restaurant_id: Uuid, id: Uuid) -> Result<(), AppError> {
        match self.repo.delete_payment_method(restaurant_id, id).await? {
            0 => Err(AppError::NotFound("financial.payment_method_not_found")),
            _ => Ok(()),
        }
    }

    // --- Relatórios ---

    pub async fn cash_flow(&self, restaurant_id: Uuid, query: &CashFlowQuery) -> Result<CashFlowReport, AppError> {
        let (start, end) = cash_flow_period(query)?;
        let totals = self.repo.cash_flow_totals(restaurant_id, start, end).await?;

        tracing::debug!(%restaurant_id, %start, %end, "Fluxo de caixa calculado");
        Ok(CashFlowReport::from_totals(start, end, totals))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn date(d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2026, 10, d)
    }

    fn category(category_type: TransactionType) -> FinancialCategory {
        FinancialCategory {
            id: Uuid::new_v4(),
            restaurant_id: None,
            name: "Vendas".into(),
            category_type,
            color: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn period_requires_both_dates() {
        let q = |start, end| CashFlowQuery { start_date: start, end_date: end };
        assert_eq!(cash_flow_period(&q(date(1), date(31))).unwrap(), (date(1).unwrap(), date(31).unwrap()));
        assert!(matches!(cash_flow_period(&q(date(1), None)), Err(AppError::BadRequest("financial.period_required"))));
        assert!(matches!(cash_flow_period(&q(None, None)), Err(AppError::BadRequest("financial.period_required"))));
        assert!(matches!(cash_flow_period(&q(date(20), date(2))), Err(AppError::BadRequest("financial.invalid_period"))));
    }

    #[test]
    fn category_must_match_transaction_type() {
        assert!(check_category_type(&category(TransactionType::Income), TransactionType::Income).is_ok());
        assert!(matches!(
            check_category_type(&category(TransactionType::Income), TransactionType::Expense),
            Err(AppError::BadRequest("financial.category_type_mismatch"))
        ));
    }
}
