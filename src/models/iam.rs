// src/models/iam.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// --- Enums (Mapeando o Postgres) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "entitlement_entity_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EntitlementEntityType {
    Module,
    Submodule,
    Feature,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "entitlement_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EntitlementStatus {
    Active,
    Trial,
    Locked,
    Hidden,
}

impl EntitlementStatus {
    pub fn is_locked(self) -> bool {
        matches!(self, EntitlementStatus::Locked | EntitlementStatus::Hidden)
    }
}

// --- Catálogo ---

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModuleRow {
    pub id: Uuid,
    #[schema(example = "fidelity")]
    pub key: String,
    pub name: String,
    pub visible: bool,
    pub sort_order: i32,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmoduleRow {
    pub id: Uuid,
    pub module_id: Uuid,
    #[schema(example = "fidelity_checkin")]
    pub key: String,
    pub name: String,
    pub sort_order: i32,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeatureRow {
    pub id: Uuid,
    pub submodule_id: Uuid,
    #[schema(example = "checkins")]
    pub key: String,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActionRow {
    pub id: i16,
    #[schema(example = "create")]
    pub key: String,
    pub name: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct EntitlementRow {
    pub entity_type: EntitlementEntityType,
    pub entity_id: Uuid,
    pub status: EntitlementStatus,
}

// Linha de role_permissions ou user_permission_overrides
#[derive(Debug, Clone, FromRow)]
pub struct PermissionGrantRow {
    pub feature_id: Uuid,
    pub action_id: i16,
    pub allowed: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSubmodule {
    #[serde(flatten)]
    pub submodule: SubmoduleRow,
    pub features: Vec<FeatureRow>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatalogModule {
    #[serde(flatten)]
    pub module: ModuleRow,
    pub submodules: Vec<CatalogSubmodule>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IamCatalog {
    pub modules: Vec<CatalogModule>,
    pub actions: Vec<ActionRow>,
}

// --- Decisão de permissão ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum PermissionReason {
    Superadmin,
    Owner,
    UserAllow,
    UserDeny,
    RoleAllow,
    RoleDeny,
    DefaultDeny,
    EntitlementLocked,
    FeatureLocked,
    PermissionNotFound,
    SnapshotError,
}

impl PermissionReason {
    /// Negações causadas pelo plano do restaurante (viram 402, não 403).
    pub fn is_lock(self) -> bool {
        matches!(self, PermissionReason::EntitlementLocked | PermissionReason::FeatureLocked)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PermissionDecision {
    pub allowed: bool,
    pub reason: PermissionReason,
}

impl PermissionDecision {
    pub fn allow(reason: PermissionReason) -> Self {
        Self { allowed: true, reason }
    }

    pub fn deny(reason: PermissionReason) -> Self {
        Self { allowed: false, reason }
    }

    pub fn locked(&self) -> bool {
        !self.allowed && self.reason.is_lock()
    }
}

// --- Snapshot (árvore módulo > submódulo > funcionalidade > ação) ---

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActionSnapshot {
    pub key: String,
    pub allowed: bool,
    pub reason: PermissionReason,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeatureSnapshot {
    pub id: Uuid,
    pub key: String,
    pub name: String,
    pub status: EntitlementStatus,
    pub locked: bool,
    pub actions: Vec<ActionSnapshot>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmoduleSnapshot {
    pub id: Uuid,
    pub key: String,
    pub name: String,
    pub status: EntitlementStatus,
    pub locked: bool,
    pub features: Vec<FeatureSnapshot>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModuleSnapshot {
    pub id: Uuid,
    pub key: String,
    pub name: String,
    pub visible: bool,
    pub status: EntitlementStatus,
    pub locked: bool,
    pub submodules: Vec<SubmoduleSnapshot>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PermissionSnapshot {
    pub restaurant_id: Uuid,
    pub user_id: Uuid,
    pub perm_version: i32,
    pub is_superadmin: bool,
    pub is_owner: bool,
    pub generated_at: DateTime<Utc>,
    pub modules: Vec<ModuleSnapshot>,
}

impl PermissionSnapshot {
    pub fn find_feature(&self, feature_key: &str) -> Option<&FeatureSnapshot> {
        self.modules
            .iter()
            .flat_map(|m| m.submodules.iter())
            .flat_map(|s| s.features.iter())
            .find(|f| f.key == feature_key)
    }

    /// Avalia (funcionalidade, ação) sobre o snapshot já montado.
    pub fn decide(&self, feature_key: &str, action_key: &str) -> PermissionDecision {
        if self.is_superadmin {
            return PermissionDecision::allow(PermissionReason::Superadmin);
        }

        let Some(feature) = self.find_feature(feature_key) else {
            return PermissionDecision::deny(PermissionReason::PermissionNotFound);
        };

        if feature.locked {
            return PermissionDecision::deny(PermissionReason::FeatureLocked);
        }

        feature
            .actions
            .iter()
            .find(|a| a.key == action_key)
            .map(|a| PermissionDecision {
                allowed: a.allowed,
                reason: a.reason,
            })
            .unwrap_or(PermissionDecision::deny(PermissionReason::PermissionNotFound))
    }
}

// --- Cargos ---

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,

    #[schema(ignore)]
    pub restaurant_id: Uuid,

    #[schema(example = "manager")]
    pub key: String,

    #[schema(example = "Gerente")]
    pub name: String,

    pub is_system: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PermissionEntry {
    #[validate(length(min = 1, message = "A funcionalidade é obrigatória."))]
    #[schema(example = "checkins")]
    pub feature_key: String,

    #[validate(length(min = 1, message = "A ação é obrigatória."))]
    #[schema(example = "create")]
    pub action_key: String,

    #[serde(default = "default_allowed")]
    pub allowed: bool,
}

fn default_allowed() -> bool {
    true
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoleResponse {
    #[serde(flatten)]
    pub role: Role,
    pub permissions: Vec<PermissionEntry>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRolePayload {
    #[validate(length(min = 2, max = 80, message = "A chave deve ter entre 2 e 80 caracteres."))]
    #[schema(example = "waiter")]
    pub key: String,

    #[validate(length(min = 2, max = 120, message = "O nome deve ter entre 2 e 120 caracteres."))]
    #[schema(example = "Garçom")]
    pub name: String,

    #[validate(nested)]
    #[serde(default)]
    pub permissions: Vec<PermissionEntry>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignRolesPayload {
    pub role_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OverrideEntry {
    #[validate(length(min = 1, message = "A funcionalidade é obrigatória."))]
    pub feature_key: String,

    #[validate(length(min = 1, message = "A ação é obrigatória."))]
    pub action_key: String,

    // `null` remove o override e volta a valer o cargo
    pub allowed: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetOverridesPayload {
    #[validate(nested)]
    pub overrides: Vec<OverrideEntry>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EntitlementEntry {
    pub entity_type: EntitlementEntityType,

    #[validate(length(min = 1, message = "A chave é obrigatória."))]
    #[schema(example = "fidelity")]
    pub entity_key: String,

    pub status: EntitlementStatus,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetEntitlementsPayload {
    #[validate(nested)]
    pub entitlements: Vec<EntitlementEntry>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckPermissionPayload {
    #[validate(length(min = 1, message = "A funcionalidade é obrigatória."))]
    pub feature_key: String,

    #[validate(length(min = 1, message = "A ação é obrigatória."))]
    pub action_key: String,
}
