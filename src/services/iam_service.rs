// src/services/iam_service.rs

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{IamRepository, RestaurantRepository, UserRepository},
    models::{
        auth::User,
        iam::{
            ActionRow, ActionSnapshot, CatalogModule, CatalogSubmodule, CreateRolePayload,
            EntitlementEntityType, EntitlementEntry, EntitlementRow, EntitlementStatus,
            FeatureRow, FeatureSnapshot, IamCatalog, ModuleRow, ModuleSnapshot, OverrideEntry,
            PermissionDecision, PermissionGrantRow, PermissionReason, PermissionSnapshot,
            RoleResponse, SubmoduleRow, SubmoduleSnapshot,
        },
    },
    services::audit_service::AuditService,
};

// Sem entitlement cadastrado o nó é considerado bloqueado
const MISSING_ENTITLEMENT: EntitlementStatus = EntitlementStatus::Locked;

// ---
// Montagem do snapshot (função pura)
// ---

/// Tudo o que o banco fornece para montar o snapshot de um (restaurante, usuário).
#[derive(Debug, Default, Clone)]
pub struct SnapshotSource {
    pub modules: Vec<ModuleRow>,
    pub submodules: Vec<SubmoduleRow>,
    pub features: Vec<FeatureRow>,
    pub actions: Vec<ActionRow>,
    pub entitlements: Vec<EntitlementRow>,
    pub role_grants: Vec<PermissionGrantRow>,
    pub user_overrides: Vec<PermissionGrantRow>,
    pub is_superadmin: bool,
    pub is_owner: bool,
}

pub fn build_snapshot(
    restaurant_id: Uuid,
    user_id: Uuid,
    perm_version: i32,
    source: &SnapshotSource,
    now: DateTime<Utc>,
) -> PermissionSnapshot {
    let entitlements: HashMap<(EntitlementEntityType, Uuid), EntitlementStatus> = source
        .entitlements
        .iter()
        .map(|e| ((e.entity_type, e.entity_id), e.status))
        .collect();

    let status_of = |entity_type: EntitlementEntityType, id: Uuid| {
        entitlements
            .get(&(entity_type, id))
            .copied()
            .unwrap_or(MISSING_ENTITLEMENT)
    };

    // Vários cargos: basta um permitir
    let mut role_map: HashMap<(Uuid, i16), bool> = HashMap::new();
    for grant in &source.role_grants {
        let entry = role_map.entry((grant.feature_id, grant.action_id)).or_insert(false);
        *entry = *entry || grant.allowed;
    }

    let override_map: HashMap<(Uuid, i16), bool> = source
        .user_overrides
        .iter()
        .map(|o| ((o.feature_id, o.action_id), o.allowed))
        .collect();

    let decide_action = |feature_id: Uuid, action: &ActionRow, feature_locked: bool| -> ActionSnapshot {
        let key = (feature_id, action.id);

        // Precedência: override do usuário > cargo > negação padrão
        let (mut allowed, mut reason) = if let Some(&allow) = override_map.get(&key) {
            (allow, if allow { PermissionReason::UserAllow } else { PermissionReason::UserDeny })
        } else if let Some(&allow) = role_map.get(&key) {
            (allow, if allow { PermissionReason::RoleAllow } else { PermissionReason::RoleDeny })
        } else {
            (false, PermissionReason::DefaultDeny)
        };

        if source.is_superadmin {
            (allowed, reason) = (true, PermissionReason::Superadmin);
        } else if source.is_owner && !feature_locked {
            (allowed, reason) = (true, PermissionReason::Owner);
        }

        if feature_locked {
            (allowed, reason) = (false, PermissionReason::EntitlementLocked);
        }

        ActionSnapshot {
            key: action.key.clone(),
            allowed,
            reason,
        }
    };

    let modules = source
        .modules
        .iter()
        .map(|module| {
            let module_status = status_of(EntitlementEntityType::Module, module.id);
            let module_locked = module_status.is_locked();

            let submodules = source
                .submodules
                .iter()
                .filter(|s| s.module_id == module.id)
                .map(|sub| {
                    let sub_status = status_of(EntitlementEntityType::Submodule, sub.id);
                    let sub_locked = module_locked || sub_status.is_locked();

                    let features = source
                        .features
                        .iter()
                        .filter(|f| f.submodule_id == sub.id)
                        .map(|feature| {
                            let feature_status = status_of(EntitlementEntityType::Feature, feature.id);
                            let feature_locked = sub_locked || feature_status.is_locked();

                            FeatureSnapshot {
                                id: feature.id,
                                key: feature.key.clone(),
                                name: feature.name.clone(),
                                status: feature_status,
                                locked: feature_locked,
                                actions: source
                                    .actions
                                    .iter()
                                    .map(|a| decide_action(feature.id, a, feature_locked))
                                    .collect(),
                            }
                        })
                        .collect();

                    SubmoduleSnapshot {
                        id: sub.id,
                        key: sub.key.clone(),
                        name: sub.name.clone(),
                        status: sub_status,
                        locked: sub_locked,
                        features,
                    }
                })
                .collect();

            ModuleSnapshot {
                id: module.id,
                key: module.key.clone(),
                name: module.name.clone(),
                visible: module.visible,
                status: module_status,
                locked: module_locked,
                submodules,
            }
        })
        .collect();

    PermissionSnapshot {
        restaurant_id,
        user_id,
        perm_version,
        is_superadmin: source.is_superadmin,
        is_owner: source.is_owner,
        generated_at: now,
        modules,
    }
}

/// Uma funcionalidade está liberada se nenhum nível da cadeia estiver bloqueado.
pub fn chain_enabled(chain: &[Option<EntitlementStatus>; 3]) -> bool {
    chain
        .iter()
        .all(|status| !status.unwrap_or(MISSING_ENTITLEMENT).is_locked())
}

// ---
// Serviço
// ---

type SnapshotCache = Arc<RwLock<HashMap<(Uuid, Uuid), Arc<PermissionSnapshot>>>>;

#[derive(Clone)]
pub struct IamService {
    repo: IamRepository,
    restaurant_repo: RestaurantRepository,
    user_repo: UserRepository,
    audit: AuditService,
    cache: SnapshotCache,
}

impl IamService {
    pub fn new(
        repo: IamRepository,
        restaurant_repo: RestaurantRepository,
        user_repo: UserRepository,
        audit: AuditService,
    ) -> Self {
        Self {
            repo,
            restaurant_repo,
            user_repo,
            audit,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn cached(&self, restaurant_id: Uuid, user_id: Uuid, perm_version: i32) -> Option<Arc<PermissionSnapshot>> {
        let cache = self.cache.read().unwrap_or_else(std::sync::PoisonError::into_inner);
        cache
            .get(&(restaurant_id, user_id))
            .filter(|s| s.perm_version == perm_version)
            .cloned()
    }

    fn store(&self, snapshot: Arc<PermissionSnapshot>) {
        let mut cache = self.cache.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        cache.insert((snapshot.restaurant_id, snapshot.user_id), snapshot);
    }

    fn evict_restaurant(&self, restaurant_id: Uuid) {
        let mut cache = self.cache.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        cache.retain(|(rid, _), _| *rid != restaurant_id);
    }

    /// Snapshot de permissões, reaproveitando o cache enquanto `perm_version` não mudar.
    pub async fn get_snapshot(&self, restaurant_id: Uuid, user_id: Uuid) -> Result<Arc<PermissionSnapshot>, AppError> {
        let perm_version = self
            .restaurant_repo
            .get_perm_version(restaurant_id)
            .await?
            .ok_or(AppError::NotFound("restaurant.not_found"))?;

        if let Some(snapshot) = self.cached(restaurant_id, user_id, perm_version) {
            return Ok(snapshot);
        }

        let user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::UserNotFound)?;

        let is_owner = self
            .restaurant_repo
            .membership(user_id, restaurant_id)
            .await?
            .unwrap_or(false);

        let source = SnapshotSource {
            modules: self.repo.list_modules().await?,
            submodules: self.repo.list_submodules().await?,
            features: self.repo.list_features().await?,
            actions: self.repo.list_actions().await?,
            entitlements: self.repo.list_entitlements(restaurant_id).await?,
            role_grants: self.repo.list_role_grants(restaurant_id, user_id).await?,
            user_overrides: self.repo.list_user_overrides(restaurant_id, user_id).await?,
            is_superadmin: user.is_superadmin,
            is_owner,
        };

        let snapshot = Arc::new(build_snapshot(restaurant_id, user_id, perm_version, &source, Utc::now()));
        self.store(snapshot.clone());

        tracing::debug!(%restaurant_id, %user_id, perm_version, "Snapshot de permissões montado");
        Ok(snapshot)
    }

    /// Nunca falha: problemas na montagem viram negação com `snapshot-error`.
    pub async fn check_permission(
        &self,
        restaurant_id: Uuid,
        user: &User,
        feature_key: &str,
        action_key: &str,
    ) -> PermissionDecision {
        if user.is_superadmin {
            return PermissionDecision::allow(PermissionReason::Superadmin);
        }

        match self.get_snapshot(restaurant_id, user.id).await {
            Ok(snapshot) => snapshot.decide(feature_key, action_key),
            Err(e) => {
                tracing::warn!(error = %e, %restaurant_id, user_id = %user.id, "Falha ao montar snapshot de permissões");
                PermissionDecision::deny(PermissionReason::SnapshotError)
            }
        }
    }

    /// Verifica apenas o plano do restaurante (usado nas rotas públicas).
    pub async fn is_feature_enabled(&self, restaurant_id: Uuid, feature_key: &str) -> Result<bool, AppError> {
        let chain = self.repo.feature_entitlement_chain(restaurant_id, feature_key).await?;
        Ok(chain.as_ref().is_some_and(chain_enabled))
    }

    pub async fn bump_perm_version<'e, E>(&self, executor: E, restaurant_id: Uuid) -> Result<i32, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let version = self.restaurant_repo.bump_perm_version(executor, restaurant_id).await?;
        self.evict_restaurant(restaurant_id);
        Ok(version)
    }

    pub async fn catalog(&self) -> Result<IamCatalog, AppError> {
        let modules = self.repo.list_modules().await?;
        let submodules = self.repo.list_submodules().await?;
        let features = self.repo.list_features().await?;
        let actions = self.repo.list_actions().await?;

        let modules = modules
            .into_iter()
            .map(|module| CatalogModule {
                submodules: submodules
                    .iter()
                    .filter(|s| s.module_id == module.id)
                    .map(|sub| CatalogSubmodule {
                        submodule: sub.clone(),
                        features: features
                            .iter()
                            .filter(|f| f.submodule_id == sub.id)
                            .cloned()
                            .collect(),
                    })
                    .collect(),
                module,
            })
            .collect();

        Ok(IamCatalog { modules, actions })
    }

    // ---
    // Cargos
    // ---

    pub async fn list_roles(&self, restaurant_id: Uuid) -> Result<Vec<RoleResponse>, AppError> {
        let roles = self.repo.list_roles(restaurant_id).await?;
        let mut permissions = self.repo.list_role_permissions(restaurant_id).await?;

        Ok(roles
            .into_iter()
            .map(|role| {
                let (mine, rest): (Vec<_>, Vec<_>) = permissions.drain(..).partition(|(rid, _)| *rid == role.id);
                permissions = rest;
                RoleResponse {
                    role,
                    permissions: mine.into_iter().map(|(_, p)| p).collect(),
                }
            })
            .collect())
    }

    pub async fn create_role<'e, E>(
        &self,
        executor: E,
        restaurant_id: Uuid,
        actor_id: Uuid,
        payload: CreateRolePayload,
    ) -> Result<RoleResponse, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let role = self
            .repo
            .create_role(&mut *tx, restaurant_id, &payload.key, &payload.name)
            .await?;

        for entry in &payload.permissions {
            let inserted = self
                .repo
                .add_role_permission(&mut *tx, role.id, &entry.feature_key, &entry.action_key, entry.allowed)
                .await?;
            if !inserted {
                return Err(AppError::BadRequest("iam.feature_not_found"));
            }
        }

        self.bump_perm_version(&mut *tx, restaurant_id).await?;
        tx.commit().await?;

        self.audit
            .record(
                Some(actor_id),
                Some(restaurant_id),
                "role.create",
                "roles",
                json!({ "roleId": role.id, "key": role.key, "permissions": payload.permissions.len() }),
            )
            .await;

        Ok(RoleResponse {
            role,
            permissions: payload.permissions,
        })
    }

    pub async fn assign_roles<'e, E>(
        &self,
        executor: E,
        restaurant_id: Uuid,
        actor_id: Uuid,
        user_id: Uuid,
        role_ids: &[Uuid],
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        if self.restaurant_repo.membership(user_id, restaurant_id).await?.is_none() {
            return Err(AppError::NotFound("restaurant.staff_not_found"));
        }

        let mut role_ids = role_ids.to_vec();
        role_ids.sort_unstable();
        role_ids.dedup();

        let mut tx = executor.begin().await?;

        let found = self
            .repo
            .count_roles_in_restaurant(&mut *tx, restaurant_id, &role_ids)
            .await?;
        if found != role_ids.len() as i64 {
            return Err(AppError::NotFound("iam.role_not_found"));
        }

        self.repo.clear_user_roles(&mut *tx, restaurant_id, user_id).await?;
        self.repo
            .assign_user_roles(&mut *tx, restaurant_id, user_id, &role_ids)
            .await?;
        self.bump_perm_version(&mut *tx, restaurant_id).await?;
        tx.commit().await?;

        self.audit
            .record(
                Some(actor_id),
                Some(restaurant_id),
                "user_roles.replace",
                "user_roles",
                json!({ "userId": user_id, "roleIds": role_ids }),
            )
            .await;
        Ok(())
    }

    pub async fn set_overrides<'e, E>(
        &self,
        executor: E,
        restaurant_id: Uuid,
        actor_id: Uuid,
        user_id: Uuid,
        overrides: &[OverrideEntry],
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        if self.restaurant_repo.membership(user_id, restaurant_id).await?.is_none() {
            return Err(AppError::NotFound("restaurant.staff_not_found"));
        }

        let mut tx = executor.begin().await?;

        for entry in overrides {
            match entry.allowed {
                Some(allowed) => {
                    let inserted = self
                        .repo
                        .upsert_override(&mut *tx, restaurant_id, user_id, &entry.feature_key, &entry.action_key, allowed)
                        .await?;
                    if !inserted {
                        return Err(AppError::BadRequest("iam.feature_not_found"));
                    }
                }
                None => {
                    self.repo
                        .delete_override(&mut *tx, restaurant_id, user_id, &entry.feature_key, &entry.action_key)
                        .await?;
                }
            }
        }

        self.bump_perm_version(&mut *tx, restaurant_id).await?;
        tx.commit().await?;

        self.audit
            .record(
                Some(actor_id),
                Some(restaurant_id),
                "user_overrides.set",
                "user_permission_overrides",
                json!({ "userId": user_id, "count": overrides.len() }),
            )
            .await;
        Ok(())
    }

    pub async fn set_entitlements<'e, E>(
        &self,
        executor: E,
        restaurant_id: Uuid,
        actor_id: Uuid,
        entries: &[EntitlementEntry],
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        for entry in entries {
            let entity_id = self
                .repo
                .find_entity_id(&mut *tx, entry.entity_type, &entry.entity_key)
                .await?
                .ok_or(AppError::BadRequest("iam.feature_not_found"))?;

            self.repo
                .upsert_entitlement(&mut *tx, restaurant_id, entry.entity_type, entity_id, entry.status, "manual")
                .await?;
        }

        self.bump_perm_version(&mut *tx, restaurant_id).await?;
        tx.commit().await?;

        self.audit
            .record(
                Some(actor_id),
                Some(restaurant_id),
                "entitlements.set",
                "restaurant_entitlements",
                json!({ "count": entries.len() }),
            )
            .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Catalog {
        source: SnapshotSource,
        module_id: Uuid,
        submodule_id: Uuid,
        feature_id: Uuid,
    }

    // Um módulo > um submódulo > uma funcionalidade "checkins", ações create/read
    fn catalog() -> Catalog {
        let module_id = Uuid::new_v4();
        let submodule_id = Uuid::new_v4();
        let feature_id = Uuid::new_v4();

        let source = SnapshotSource {
            modules: vec![ModuleRow {
                id: module_id,
                key: "fidelity".into(),
                name: "Fidelidade".into(),
                visible: true,
                sort_order: 1,
            }],
            submodules: vec![SubmoduleRow {
                id: submodule_id,
                module_id,
                key: "fidelity_checkin".into(),
                name: "Check-in".into(),
                sort_order: 1,
            }],
            features: vec![FeatureRow {
                id: feature_id,
                submodule_id,
                key: "checkins".into(),
                name: "Check-ins".into(),
                description: None,
            }],
            actions: vec![
                ActionRow { id: 1, key: "create".into(), name: "Criar".into() },
                ActionRow { id: 2, key: "read".into(), name: "Visualizar".into() },
            ],
            ..SnapshotSource::default()
        };

        Catalog { source, module_id, submodule_id, feature_id }
    }

    fn entitle(c: &mut Catalog, status: EntitlementStatus) {
        c.source.entitlements = vec![
            EntitlementRow { entity_type: EntitlementEntityType::Module, entity_id: c.module_id, status },
            EntitlementRow { entity_type: EntitlementEntityType::Submodule, entity_id: c.submodule_id, status },
            EntitlementRow { entity_type: EntitlementEntityType::Feature, entity_id: c.feature_id, status },
        ];
    }

    fn grant(feature_id: Uuid, action_id: i16, allowed: bool) -> PermissionGrantRow {
        PermissionGrantRow { feature_id, action_id, allowed }
    }

    fn snapshot(source: &SnapshotSource) -> PermissionSnapshot {
        build_snapshot(Uuid::new_v4(), Uuid::new_v4(), 1, source, Utc::now())
    }

    #[test]
    fn missing_entitlement_locks_the_feature() {
        let c = catalog();
        let snap = snapshot(&c.source);

        let feature = snap.find_feature("checkins").unwrap();
        assert!(feature.locked);
        assert_eq!(snap.decide("checkins", "read"), PermissionDecision::deny(PermissionReason::FeatureLocked));
    }

    #[test]
    fn role_grant_allows_when_entitled() {
        let mut c = catalog();
        entitle(&mut c, EntitlementStatus::Active);
        c.source.role_grants = vec![grant(c.feature_id, 1, true)];

        let snap = snapshot(&c.source);
        assert_eq!(snap.decide("checkins", "create"), PermissionDecision::allow(PermissionReason::RoleAllow));
        assert_eq!(snap.decide("checkins", "read"), PermissionDecision::deny(PermissionReason::DefaultDeny));
    }

    #[test]
    fn user_override_beats_role() {
        let mut c = catalog();
        entitle(&mut c, EntitlementStatus::Active);
        c.source.role_grants = vec![grant(c.feature_id, 1, true), grant(c.feature_id, 2, false)];
        c.source.user_overrides = vec![grant(c.feature_id, 1, false), grant(c.feature_id, 2, true)];

        let snap = snapshot(&c.source);
        assert_eq!(snap.decide("checkins", "create"), PermissionDecision::deny(PermissionReason::UserDeny));
        assert_eq!(snap.decide("checkins", "read"), PermissionDecision::allow(PermissionReason::UserAllow));
    }

    #[test]
    fn any_role_allowing_is_enough() {
        let mut c = catalog();
        entitle(&mut c, EntitlementStatus::Active);
        c.source.role_grants = vec![grant(c.feature_id, 1, false), grant(c.feature_id, 1, true)];

        let snap = snapshot(&c.source);
        assert!(snap.decide("checkins", "create").allowed);
    }

    #[test]
    fn owner_is_allowed_only_on_unlocked_features() {
        let mut c = catalog();
        c.source.is_owner = true;

        let locked = snapshot(&c.source);
        assert_eq!(locked.decide("checkins", "create").reason, PermissionReason::FeatureLocked);

        entitle(&mut c, EntitlementStatus::Trial);
        let unlocked = snapshot(&c.source);
        assert_eq!(unlocked.decide("checkins", "create"), PermissionDecision::allow(PermissionReason::Owner));
    }

    #[test]
    fn module_lock_cascades_to_features() {
        let mut c = catalog();
        entitle(&mut c, EntitlementStatus::Active);
        c.source.entitlements[0].status = EntitlementStatus::Hidden;
        c.source.role_grants = vec![grant(c.feature_id, 1, true)];

        let snap = snapshot(&c.source);
        let sub = &snap.modules[0].submodules[0];
        assert!(sub.locked);
        assert!(sub.features[0].locked);
        assert_eq!(sub.features[0].actions[0].reason, PermissionReason::EntitlementLocked);
        assert!(snap.decide("checkins", "create").locked());
    }

    #[test]
    fn superadmin_snapshot_allows_everything() {
        let mut c = catalog();
        entitle(&mut c, EntitlementStatus::Active);
        c.source.is_superadmin = true;

        let snap = snapshot(&c.source);
        assert_eq!(snap.decide("checkins", "create"), PermissionDecision::allow(PermissionReason::Superadmin));
        assert_eq!(snap.decide("nao_existe", "create"), PermissionDecision::allow(PermissionReason::Superadmin));
    }

    #[test]
    fn unknown_feature_or_action_is_not_found() {
        let mut c = catalog();
        entitle(&mut c, EntitlementStatus::Active);

        let snap = snapshot(&c.source);
        assert_eq!(snap.decide("nao_existe", "read").reason, PermissionReason::PermissionNotFound);
        assert_eq!(snap.decide("checkins", "export").reason, PermissionReason::PermissionNotFound);
        assert!(!snap.decide("checkins", "export").locked());
    }

    #[test]
    fn chain_is_enabled_only_without_locks() {
        use EntitlementStatus::*;
        assert!(chain_enabled(&[Some(Active), Some(Trial), Some(Active)]));
        assert!(!chain_enabled(&[Some(Active), None, Some(Active)]));
        assert!(!chain_enabled(&[Some(Locked), Some(Active), Some(Active)]));
        assert!(!chain_enabled(&[Some(Active), Some(Active), Some(Hidden)]));
    }
}
