// src/db/iam_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::common::{db_utils::on_unique_violation, error::AppError};
use crate::models::iam::{
    ActionRow, EntitlementEntityType, EntitlementRow, EntitlementStatus, FeatureRow, ModuleRow,
    PermissionEntry, PermissionGrantRow, Role, SubmoduleRow,
};

#[derive(Clone)]
pub struct IamRepository {
    pool: PgPool,
}

impl IamRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Catálogo (leituras simples na pool principal)
    // ---

    pub async fn list_modules(&self) -> Result<Vec<ModuleRow>, AppError> {
        let rows = sqlx::query_as::<_, ModuleRow>(
            "SELECT id, key, name, visible, sort_order FROM modules ORDER BY sort_order, name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn list_submodules(&self) -> Result<Vec<SubmoduleRow>, AppError> {
        let rows = sqlx::query_as::<_, SubmoduleRow>(
            "SELECT id, module_id, key, name, sort_order FROM submodules ORDER BY sort_order, name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn list_features(&self) -> Result<Vec<FeatureRow>, AppError> {
        let rows = sqlx::query_as::<_, FeatureRow>(
            "SELECT id, submodule_id, key, name, description FROM features ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn list_actions(&self) -> Result<Vec<ActionRow>, AppError> {
        let rows = sqlx::query_as::<_, ActionRow>("SELECT id, key, name FROM actions ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Resolve a chave de um nó do catálogo (módulo, submódulo ou funcionalidade) para o seu ID.
    pub async fn find_entity_id<'e, E>(
        &self,
        executor: E,
        entity_type: EntitlementEntityType,
        key: &str,
    ) -> Result<Option<Uuid>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = match entity_type {
            EntitlementEntityType::Module => "SELECT id FROM modules WHERE key = $1",
            EntitlementEntityType::Submodule => "SELECT id FROM submodules WHERE key = $1",
            EntitlementEntityType::Feature => "SELECT id FROM features WHERE key = $1",
        };

        let id = sqlx::query_scalar::<_, Uuid>(sql)
            .bind(key)
            .fetch_optional(executor)
            .await?;
        Ok(id)
    }

    // ---
    // Entitlements
    // ---

    pub async fn list_entitlements(&self, restaurant_id: Uuid) -> Result<Vec<EntitlementRow>, AppError> {
        let rows = sqlx::query_as::<_, EntitlementRow>(
            r#"
            SELECT entity_type, entity_id, status
            FROM restaurant_entitlements
            WHERE restaurant_id = $1
            "#,
        )
        .bind(restaurant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Status (módulo, submódulo, funcionalidade) da cadeia de uma funcionalidade.
    /// `None` na linha externa = funcionalidade inexistente; `None` interno = sem entitlement.
    pub async fn feature_entitlement_chain(
        &self,
        restaurant_id: Uuid,
        feature_key: &str,
    ) -> Result<Option<[Option<EntitlementStatus>; 3]>, AppError> {
        let row: Option<(
            Option<EntitlementStatus>,
            Option<EntitlementStatus>,
            Option<EntitlementStatus>,
        )> = sqlx::query_as(
            r#"
            SELECT em.status, es.status, ef.status
            FROM features f
            JOIN submodules s ON s.id = f.submodule_id
            JOIN modules m ON m.id = s.module_id
            LEFT JOIN restaurant_entitlements em
                ON em.restaurant_id = $1 AND em.entity_type = 'module' AND em.entity_id = m.id
            LEFT JOIN restaurant_entitlements es
                ON es.restaurant_id = $1 AND es.entity_type = 'submodule' AND es.entity_id = s.id
            LEFT JOIN restaurant_entitlements ef
                ON ef.restaurant_id = $1 AND ef.entity_type = 'feature' AND ef.entity_id = f.id
            WHERE f.key = $2
            "#,
        )
        .bind(restaurant_id)
        .bind(feature_key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(m, s, f)| [m, s, f]))
    }

    pub async fn upsert_entitlement<'e, E>(
        &self,
        executor: E,
        restaurant_id: Uuid,
        entity_type: EntitlementEntityType,
        entity_id: Uuid,
        status: EntitlementStatus,
        source: &str,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO restaurant_entitlements (restaurant_id, entity_type, entity_id, status, source)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (restaurant_id, entity_type, entity_id)
            DO UPDATE SET status = EXCLUDED.status, source = EXCLUDED.source, updated_at = NOW()
            "#,
        )
        .bind(restaurant_id)
        .bind(entity_type)
        .bind(entity_id)
        .bind(status)
        .bind(source)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Libera todos os módulos do catálogo (usado ao provisionar um restaurante).
    pub async fn grant_all_modules<'e, E>(&self, executor: E, restaurant_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO restaurant_entitlements (restaurant_id, entity_type, entity_id, status, source)
            SELECT $1, 'module', m.id, 'active', 'provisioning' FROM modules m
            UNION ALL
            SELECT $1, 'submodule', s.id, 'active', 'provisioning' FROM submodules s
            UNION ALL
            SELECT $1, 'feature', f.id, 'active', 'provisioning' FROM features f
            ON CONFLICT (restaurant_id, entity_type, entity_id) DO NOTHING
            "#,
        )
        .bind(restaurant_id)
        .execute(executor)
        .await?;
        Ok(())
    }

    // ---
    // Permissões efetivas do usuário
    // ---

    pub async fn list_role_grants(
        &self,
        restaurant_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<PermissionGrantRow>, AppError> {
        let rows = sqlx::query_as::<_, PermissionGrantRow>(
            r#"
            SELECT rp.feature_id, rp.action_id, rp.allowed
            FROM user_roles ur
            JOIN roles r ON r.id = ur.role_id AND r.restaurant_id = ur.restaurant_id
            JOIN role_permissions rp ON rp.role_id = r.id
            WHERE ur.user_id = $1 AND ur.restaurant_id = $2
            "#,
        )
        .bind(user_id)
        .bind(restaurant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn list_user_overrides(
        &self,
        restaurant_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<PermissionGrantRow>, AppError> {
        let rows = sqlx::query_as::<_, PermissionGrantRow>(
            r#"
            SELECT feature_id, action_id, allowed
            FROM user_permission_overrides
            WHERE user_id = $1 AND restaurant_id = $2
            "#,
        )
        .bind(user_id)
        .bind(restaurant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // ---
    // Cargos
    // ---

    pub async fn create_role<'e, E>(
        &self,
        executor: E,
        restaurant_id: Uuid,
        key: &str,
        name: &str,
    ) -> Result<Role, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Role>(
            r#"
            INSERT INTO roles (restaurant_id, key, name)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(restaurant_id)
        .bind(key)
        .bind(name)
        .fetch_one(executor)
        .await
        .map_err(|e| on_unique_violation(e, "iam.role_already_exists"))
    }

    pub async fn find_role_by_key<'e, E>(
        &self,
        executor: E,
        restaurant_id: Uuid,
        key: &str,
    ) -> Result<Option<Role>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let role = sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE restaurant_id = $1 AND key = $2")
            .bind(restaurant_id)
            .bind(key)
            .fetch_optional(executor)
            .await?;
        Ok(role)
    }

    pub async fn list_roles(&self, restaurant_id: Uuid) -> Result<Vec<Role>, AppError> {
        let roles = sqlx::query_as::<_, Role>(
            "SELECT * FROM roles WHERE restaurant_id = $1 ORDER BY is_system DESC, name",
        )
        .bind(restaurant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(roles)
    }

    pub async fn list_role_permissions(&self, restaurant_id: Uuid) -> Result<Vec<(Uuid, PermissionEntry)>, AppError> {
        let rows: Vec<(Uuid, String, String, bool)> = sqlx::query_as(
            r#"
            SELECT rp.role_id, f.key, a.key, rp.allowed
            FROM role_permissions rp
            JOIN roles r ON r.id = rp.role_id
            JOIN features f ON f.id = rp.feature_id
            JOIN actions a ON a.id = rp.action_id
            WHERE r.restaurant_id = $1
            ORDER BY f.key, a.id
            "#,
        )
        .bind(restaurant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(role_id, feature_key, action_key, allowed)| {
                (role_id, PermissionEntry { feature_key, action_key, allowed })
            })
            .collect())
    }

    /// Insere a permissão resolvendo as chaves. Retorna `false` se a chave não existe.
    pub async fn add_role_permission<'e, E>(
        &self,
        executor: E,
        role_id: Uuid,
        feature_key: &str,
        action_key: &str,
        allowed: bool,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            INSERT INTO role_permissions (role_id, feature_id, action_id, allowed)
            SELECT $1, f.id, a.id, $4
            FROM features f, actions a
            WHERE f.key = $2 AND a.key = $3
            ON CONFLICT (role_id, feature_id, action_id) DO UPDATE SET allowed = EXCLUDED.allowed
            "#,
        )
        .bind(role_id)
        .bind(feature_key)
        .bind(action_key)
        .bind(allowed)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count_roles_in_restaurant<'e, E>(
        &self,
        executor: E,
        restaurant_id: Uuid,
        role_ids: &[Uuid],
    ) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM roles WHERE restaurant_id = $1 AND id = ANY($2)",
        )
        .bind(restaurant_id)
        .bind(role_ids)
        .fetch_one(executor)
        .await?;
        Ok(count)
    }

    pub async fn clear_user_roles<'e, E>(&self, executor: E, restaurant_id: Uuid, user_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM user_roles WHERE restaurant_id = $1 AND user_id = $2")
            .bind(restaurant_id)
            .bind(user_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn assign_user_roles<'e, E>(
        &self,
        executor: E,
        restaurant_id: Uuid,
        user_id: Uuid,
        role_ids: &[Uuid],
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // Inserção em massa usando UNNEST
        sqlx::query(
            r#"
            INSERT INTO user_roles (user_id, restaurant_id, role_id)
            SELECT $1, $2, unnest($3::uuid[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(restaurant_id)
        .bind(role_ids)
        .execute(executor)
        .await?;
        Ok(())
    }

    // ---
    // Overrides por usuário
    // ---

    pub async fn upsert_override<'e, E>(
        &self,
        executor: E,
        restaurant_id: Uuid,
        user_id: Uuid,
        feature_key: &str,
        action_key: &str,
        allowed: bool,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            INSERT INTO user_permission_overrides (user_id, restaurant_id, feature_id, action_id, allowed)
            SELECT $1, $2, f.id, a.id, $5
            FROM features f, actions a
            WHERE f.key = $3 AND a.key = $4
            ON CONFLICT (user_id, restaurant_id, feature_id, action_id)
            DO UPDATE SET allowed = EXCLUDED.allowed
            "#,
        )
        .bind(user_id)
        .bind(restaurant_id)
        .bind(feature_key)
        .bind(action_key)
        .bind(allowed)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_override<'e, E>(
        &self,
        executor: E,
        restaurant_id: Uuid,
        user_id: Uuid,
        feature_key: &str,
        action_key: &str,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            DELETE FROM user_permission_overrides o
            USING features f, actions a
            WHERE o.feature_id = f.id AND o.action_id = a.id
              AND o.user_id = $1 AND o.restaurant_id = $2
              AND f.key = $3 AND a.key = $4
            "#,
        )
        .bind(user_id)
        .bind(restaurant_id)
        .bind(feature_key)
        .bind(action_key)
        .execute(executor)
        .await?;
        Ok(())
    }
}
