// src/services/cash_register_service.rs

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::CashRegisterRepository,
    models::cash_register::{
        expected_closing_cash, CashMovementPayload, CashRegisterCategory, CashRegisterMovement, CashRegisterSession,
        CashSessionStatus, CloseSessionPayload, CloseSessionResult, CurrentSession, OpenSessionPayload,
    },
};

/// Categoria opcional: precisa existir para o restaurante e ser do mesmo tipo do movimento.
pub fn check_movement_category(categories: &[CashRegisterCategory], payload: &CashMovementPayload) -> Result<(), AppError> {
    let Some(category_id) = payload.category_id else {
        return Ok(());
    };

    let matches = categories
        .iter()
        .any(|c| c.id == category_id && c.movement_type == payload.movement_type);

    if matches {
        Ok(())
    } else {
        Err(AppError::BadRequest("cash_register.invalid_category"))
    }
}

/// Movimentos e fechamento só valem para sessões ainda abertas.
pub fn ensure_open(session: &CashRegisterSession) -> Result<(), AppError> {
    if session.status == CashSessionStatus::Open {
        Ok(())
    } else {
        Err(AppError::BadRequest("cash_register.session_closed"))
    }
}

#[derive(Clone)]
pub struct CashRegisterService {
    repo: CashRegisterRepository,
}

impl CashRegisterService {
    pub fn new(repo: CashRegisterRepository) -> Self {
        Self { repo }
    }

    pub async fn open(&self, restaurant_id: Uuid, user_id: Uuid, payload: &OpenSessionPayload) -> Result<CashRegisterSession, AppError> {
        if payload.opening_cash.is_sign_negative() {
            return Err(AppError::BadRequest("cash_register.invalid_amount"));
        }

        // Índice único parcial: um caixa aberto por usuário e restaurante
        let session = self
            .repo
            .open_session(
                restaurant_id,
                user_id,
                payload.opening_cash,
                payload.opening_observations.as_deref(),
            )
            .await?;

        tracing::info!(%restaurant_id, %user_id, session_id = %session.id, "Caixa aberto");
        Ok(session)
    }

    pub async fn current(&self, restaurant_id: Uuid, user_id: Uuid) -> Result<CurrentSession, AppError> {
        let session = self
            .repo
            .find_open_session(restaurant_id, user_id)
            .await?
            .ok_or(AppError::NotFound("cash_register.no_open_session"))?;

        let movements = self.repo.list_movements(self.repo.pool(), session.id).await?;
        let expected_cash = expected_closing_cash(session.opening_cash, &movements);

        Ok(CurrentSession {
            session,
            movements,
            expected_cash,
        })
    }

    pub async fn add_movement(
        &self,
        restaurant_id: Uuid,
        user_id: Uuid,
        payload: &CashMovementPayload,
    ) -> Result<CashRegisterMovement, AppError> {
        if payload.amount <= Decimal::ZERO {
            return Err(AppError::BadRequest("cash_register.invalid_amount"));
        }

        let categories = self.repo.list_categories(restaurant_id).await?;
        check_movement_category(&categories, payload)?;

        let mut tx = self.repo.pool().begin().await?;

        let session = self
            .repo
            .lock_session(&mut *tx, restaurant_id, payload.session_id)
            .await?
            .ok_or(AppError::NotFound("cash_register.session_not_found"))?;
        ensure_open(&session)?;

        let movement = self.repo.insert_movement(&mut *tx, restaurant_id, user_id, payload).await?;
        tx.commit().await?;

        tracing::info!(
            %restaurant_id,
            session_id = %session.id,
            kind = ?movement.movement_type,
            amount = %movement.amount,
            "Movimento de caixa registrado"
        );
        Ok(movement)
    }

    pub async fn list_movements(&self, restaurant_id: Uuid, session_id: Uuid) -> Result<Vec<CashRegisterMovement>, AppError> {
        let session = self
            .repo
            .find_session(restaurant_id, session_id)
            .await?
            .ok_or(AppError::NotFound("cash_register.session_not_found"))?;
        self.repo.list_movements(self.repo.pool(), session.id).await
    }

    /// Fecha o caixa aberto do usuário e confere o valor informado com o esperado.
    pub async fn close(&self, restaurant_id: Uuid, user_id: Uuid, payload: &CloseSessionPayload) -> Result<CloseSessionResult, AppError> {
        if payload.closing_cash.is_sign_negative() {
            return Err(AppError::BadRequest("cash_register.invalid_amount"));
        }

        let mut tx = self.repo.pool().begin().await?;

        // Com a sessão travada nenhum movimento entra entre a soma e o fechamento
        let session = self
            .repo
            .lock_open_session(&mut *tx, restaurant_id, user_id)
            .await?
            .ok_or(AppError::NotFound("cash_register.no_open_session"))?;

        let movements = self.repo.list_movements(&mut *tx, session.id).await?;
        let expected_cash = expected_closing_cash(session.opening_cash, &movements);

        let session = self
            .repo
            .close_session(&mut *tx, session.id, payload.closing_cash, payload.closing_observations.as_deref())
            .await?
            .ok_or(AppError::BadRequest("cash_register.session_closed"))?;

        tx.commit().await?;

        let difference = payload.closing_cash - expected_cash;
        if !difference.is_zero() {
            tracing::warn!(
                %restaurant_id,
                session_id = %session.id,
                %expected_cash,
                %difference,
                "Caixa fechado com diferença"
            );
        }

        Ok(CloseSessionResult {
            session,
            expected_cash,
            difference,
        })
    }

    pub async fn categories(&self, restaurant_id: Uuid) -> Result<Vec<CashRegisterCategory>, AppError> {
        self.repo.list_categories(restaurant_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::cash_register::CashMovementType;

    fn category(movement_type: CashMovementType) -> CashRegisterCategory {
        CashRegisterCategory {
            id: Uuid::new_v4(),
            restaurant_id: None,
            name: "Troco".into(),
            movement_type,
        }
    }

    fn payload(category_id: Option<Uuid>, movement_type: CashMovementType) -> CashMovementPayload {
        CashMovementPayload {
            session_id: Uuid::new_v4(),
            movement_type,
            amount: Decimal::new(5000, 2),
            category_id,
            observations: None,
        }
    }

    #[test]
    fn only_open_sessions_accept_changes() {
        let mut session = CashRegisterSession {
            id: Uuid::new_v4(),
            restaurant_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            opening_cash: Decimal::new(10000, 2),
            opening_time: chrono::Utc::now(),
            opening_observations: None,
            closing_cash: None,
            closing_time: None,
            closing_observations: None,
            status: CashSessionStatus::Open,
        };
        assert!(ensure_open(&session).is_ok());

        session.status = CashSessionStatus::Closed;
        assert!(matches!(
            ensure_open(&session),
            Err(AppError::BadRequest("cash_register.session_closed"))
        ));
    }

    #[test]
    fn movement_without_category_is_accepted() {
        assert!(check_movement_category(&[], &payload(None, CashMovementType::Withdrawal)).is_ok());
    }

    #[test]
    fn category_must_exist_and_match_type() {
        let reinforcement = category(CashMovementType::Reinforcement);
        let categories = vec![reinforcement.clone()];

        assert!(check_movement_category(&categories, &payload(Some(reinforcement.id), CashMovementType::Reinforcement)).is_ok());
        assert!(matches!(
            check_movement_category(&categories, &payload(Some(reinforcement.id), CashMovementType::Withdrawal)),
            Err(AppError::BadRequest("cash_register.invalid_category"))
        ));
        assert!(check_movement_category(&categories, &payload(Some(Uuid::new_v4()), CashMovementType::Reinforcement)).is_err());
    }
}
