use async_trait::async_trait;
use sqlx::{Postgres, Transaction};
use tracing::warn;
use uuid::Uuid;

use super::{conflict_on_unique, contains_pattern, PgStore};
use crate::database::manager::DatabaseError;
use crate::database::models::{normalize_key, NewUser, Role, UpdateOutcome, User, UserUpdate};
use crate::database::repository::{DbResult, DirectoryStore};

const USER_COLUMNS: &str =
    "id, email, normalized_email, first_name, last_name, izaro_code, password_hash, created_at, updated_at";

#[async_trait]
impl DirectoryStore for PgStore {
    async fn find_user(&self, id: Uuid) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {} FROM auth.users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM auth.users WHERE normalized_email = $1",
            USER_COLUMNS
        ))
        .bind(normalize_key(email))
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn insert_user(&self, user: &NewUser) -> DbResult<User> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO auth.users (id, email, normalized_email, first_name, last_name, izaro_code, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(normalize_key(&user.email))
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.izaro_code)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, format!("Email '{}' is already registered", user.email)))
    }

    async fn apply_user_update(&self, id: Uuid, update: &UserUpdate) -> DbResult<UpdateOutcome> {
        let mut tx = self.pool.begin().await?;
        match write_user_update(&mut tx, id, update).await {
            Ok(UpdateOutcome::Applied(user)) => {
                tx.commit().await?;
                Ok(UpdateOutcome::Applied(user))
            }
            Ok(UpdateOutcome::LastHolder) => {
                tx.rollback().await?;
                Ok(UpdateOutcome::LastHolder)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!("Rollback of user {} update failed, ignoring: {}", id, rollback_err);
                }
                Err(err)
            }
        }
    }

    async fn search_users(&self, search: Option<&str>, offset: i64, limit: i64) -> DbResult<(i64, Vec<User>)> {
        let pattern = search.map(contains_pattern);
        let filter = r#"
            WHERE $1::text IS NULL
               OR email ILIKE $1
               OR first_name ILIKE $1
               OR last_name ILIKE $1
               OR izaro_code ILIKE $1
        "#;

        let total: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM auth.users {}", filter))
            .bind(&pattern)
            .fetch_one(&self.pool)
            .await?;

        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM auth.users {} ORDER BY email LIMIT $2 OFFSET $3",
            USER_COLUMNS, filter
        ))
        .bind(&pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((total.0, users))
    }

    async fn list_roles(&self) -> DbResult<Vec<Role>> {
        let roles = sqlx::query_as::<_, Role>("SELECT id, name FROM auth.roles ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(roles)
    }

    async fn find_role(&self, name: &str) -> DbResult<Option<Role>> {
        let role = sqlx::query_as::<_, Role>("SELECT id, name FROM auth.roles WHERE normalized_name = $1")
            .bind(normalize_key(name))
            .fetch_optional(&self.pool)
            .await?;
        Ok(role)
    }

    async fn insert_role(&self, name: &str) -> DbResult<Role> {
        sqlx::query_as::<_, Role>(
            "INSERT INTO auth.roles (id, name, normalized_name) VALUES ($1, $2, $3) RETURNING id, name",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(normalize_key(name))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, format!("Role '{}' already exists", name)))
    }

    async fn roles_of(&self, user_id: Uuid) -> DbResult<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT r.name
            FROM auth.roles r
            JOIN auth.user_roles ur ON ur.role_id = r.id
            WHERE ur.user_id = $1
            ORDER BY r.name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    async fn add_roles(&self, user_id: Uuid, roles: &[String]) -> DbResult<()> {
        let keys: Vec<String> = roles.iter().map(|r| normalize_key(r)).collect();
        sqlx::query(
            r#"
            INSERT INTO auth.user_roles (user_id, role_id)
            SELECT $1, id FROM auth.roles WHERE normalized_name = ANY($2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(&keys)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// Holder rows of the protected role are locked before anything is written,
/// so two updates demoting different holders serialize on the count.
async fn write_user_update(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    update: &UserUpdate,
) -> DbResult<UpdateOutcome> {
    if let Some(role) = update.removed_protected_role() {
        let holders: Vec<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT ur.user_id
            FROM auth.user_roles ur
            JOIN auth.roles r ON r.id = ur.role_id
            WHERE r.normalized_name = $1
            ORDER BY ur.user_id
            FOR UPDATE OF ur
            "#,
        )
        .bind(normalize_key(role))
        .fetch_all(&mut **tx)
        .await?;

        let others = holders.iter().filter(|(holder,)| *holder != id).count();
        if others == 0 && holders.len() > others {
            return Ok(UpdateOutcome::LastHolder);
        }
    }

    let user = match &update.profile {
        Some(profile) => sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE auth.users
            SET email = $2, normalized_email = $3, first_name = $4, last_name = $5, izaro_code = $6,
                updated_at = now()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(id)
        .bind(&profile.email)
        .bind(normalize_key(&profile.email))
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.izaro_code)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| conflict_on_unique(e, format!("Email '{}' is already registered", profile.email)))?,
        None => sqlx::query_as::<_, User>(&format!("SELECT {} FROM auth.users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?,
    }
    .ok_or_else(|| DatabaseError::NotFound(format!("User {} not found", id)))?;

    if !update.add_roles.is_empty() {
        let keys: Vec<String> = update.add_roles.iter().map(|r| normalize_key(r)).collect();
        sqlx::query(
            r#"
            INSERT INTO auth.user_roles (user_id, role_id)
            SELECT $1, id FROM auth.roles WHERE normalized_name = ANY($2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(id)
        .bind(&keys)
        .execute(&mut **tx)
        .await?;
    }

    if !update.remove_roles.is_empty() {
        let keys: Vec<String> = update.remove_roles.iter().map(|r| normalize_key(r)).collect();
        sqlx::query(
            r#"
            DELETE FROM auth.user_roles
            WHERE user_id = $1
              AND role_id IN (SELECT id FROM auth.roles WHERE normalized_name = ANY($2))
            "#,
        )
        .bind(id)
        .bind(&keys)
        .execute(&mut **tx)
        .await?;
    }

    Ok(UpdateOutcome::Applied(user))
}
