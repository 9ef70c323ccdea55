// src/models/waiter_call.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "waiter_call_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum WaiterCallStatus {
    Pending,
    Attended,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WaiterCall {
    pub id: Uuid,
    #[schema(ignore)]
    pub restaurant_id: Uuid,
    #[schema(example = "12")]
    pub table_number: String,
    #[schema(example = "bill")]
    pub call_type: String,
    pub status: WaiterCallStatus,
    pub attended_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateWaiterCallPayload {
    #[validate(length(min = 1, max = 20, message = "O número da mesa é obrigatório."))]
    pub table_number: String,

    #[validate(length(min = 1, max = 40, message = "Tipo de chamado inválido."))]
    pub call_type: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateWaiterCallPayload {
    pub status: WaiterCallStatus,
}

#[derive(Debug, Deserialize)]
pub struct WaiterCallFilter {
    pub status: Option<WaiterCallStatus>,
}
