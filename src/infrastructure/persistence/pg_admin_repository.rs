//! PostgreSQL implementation of admin repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Transaction};
use std::sync::Arc;

use crate::domain::entities::{Admin, AdminFilter, NewAdmin, Role};
use crate::domain::repositories::AdminRepository;
use crate::error::AppError;
use crate::utils::db_error::is_unique_violation_on;

const ADMIN_COLUMNS: &str = "id, email, name, role, created_at";

#[derive(Debug, FromRow)]
struct AdminRow {
    id: i64,
    email: String,
    name: String,
    role: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<AdminRow> for Admin {
    type Error = AppError;

    fn try_from(r: AdminRow) -> Result<Self, Self::Error> {
        let role = r.role.parse::<Role>().map_err(|_| {
            AppError::internal("Stored account has an unknown role", json!({ "id": r.id }))
        })?;

        Ok(Admin {
            id: r.id,
            email: r.email,
            name: r.name,
            role,
            created_at: r.created_at,
        })
    }
}

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &AdminFilter) {
    qb.push(" WHERE TRUE");

    if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
        let escaped = search
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        let pattern = format!("%{escaped}%");
        qb.push(" AND (email ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR name ILIKE ")
            .push_bind(pattern)
            .push(")");
    }

    if let Some(role) = filter.role {
        qb.push(" AND role = ").push_bind(role.as_str());
    }
}

/// PostgreSQL repository for accounts.
///
/// Role changes and deletions lock every super-admin row and the target before
/// checking the caller's privilege and the last super-admin guard, which
/// serializes concurrent demotions.
pub struct PgAdminRepository {
    pool: Arc<PgPool>,
}

impl PgAdminRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Locks the super-admin set and the target row.
    ///
    /// Returns the target with its current role and the number of super-admins.
    async fn lock_for_guard(
        tx: &mut Transaction<'_, Postgres>,
        id: i64,
    ) -> Result<Option<(Admin, usize)>, AppError> {
        let super_admins: Vec<i64> = sqlx::query_scalar(
            "SELECT id FROM admins WHERE role = 'super_admin' ORDER BY id FOR UPDATE",
        )
        .fetch_all(&mut **tx)
        .await?;

        let sql = format!("SELECT {ADMIN_COLUMNS} FROM admins WHERE id = $1 FOR UPDATE");
        let row = sqlx::query_as::<_, AdminRow>(&sql)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?;

        match row {
            Some(row) => Ok(Some((Admin::try_from(row)?, super_admins.len()))),
            None => Ok(None),
        }
    }
}

fn last_super_admin(id: i64) -> AppError {
    AppError::conflict(
        "Cannot remove the last super-admin",
        json!({ "id": id }),
    )
}

#[async_trait]
impl AdminRepository for PgAdminRepository {
    async fn create(&self, new_admin: NewAdmin) -> Result<Admin, AppError> {
        let sql = format!(
            "INSERT INTO admins (email, name, role) VALUES ($1, $2, $3) RETURNING {ADMIN_COLUMNS}"
        );

        let row = sqlx::query_as::<_, AdminRow>(&sql)
            .bind(&new_admin.email)
            .bind(&new_admin.name)
            .bind(new_admin.role.as_str())
            .fetch_one(self.pool.as_ref())
            .await
            .map_err(|e| {
                if is_unique_violation_on(&e, "admins_email_key") {
                    AppError::conflict(
                        "Email is already registered",
                        json!({ "email": new_admin.email }),
                    )
                } else {
                    AppError::from(e)
                }
            })?;

        Admin::try_from(row)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Admin>, AppError> {
        let sql = format!("SELECT {ADMIN_COLUMNS} FROM admins WHERE id = $1");

        sqlx::query_as::<_, AdminRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?
            .map(Admin::try_from)
            .transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Admin>, AppError> {
        let sql = format!("SELECT {ADMIN_COLUMNS} FROM admins WHERE LOWER(email) = LOWER($1)");

        sqlx::query_as::<_, AdminRow>(&sql)
            .bind(email)
            .fetch_optional(self.pool.as_ref())
            .await?
            .map(Admin::try_from)
            .transpose()
    }

    async fn list(&self, filter: &AdminFilter) -> Result<Vec<Admin>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {ADMIN_COLUMNS} FROM admins"));
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(i64::from(filter.limit))
            .push(" OFFSET ")
            .push_bind(filter.offset());

        let rows = qb
            .build_query_as::<AdminRow>()
            .fetch_all(self.pool.as_ref())
            .await?;

        rows.into_iter().map(Admin::try_from).collect()
    }

    async fn count(&self, filter: &AdminFilter) -> Result<i64, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM admins");
        push_filter(&mut qb, filter);

        let count: i64 = qb
            .build_query_scalar()
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(count)
    }

    async fn change_role(&self, id: i64, role: Role, actor: Role) -> Result<Admin, AppError> {
        let mut tx = self.pool.begin().await?;

        let Some((current, super_admins)) = Self::lock_for_guard(&mut tx, id).await? else {
            return Err(AppError::not_found("Account not found", json!({ "id": id })));
        };

        actor.ensure_manages(current.role)?;
        actor.ensure_manages(role)?;

        if current.role == Role::SuperAdmin && role != Role::SuperAdmin && super_admins <= 1 {
            return Err(last_super_admin(id));
        }

        let sql = format!("UPDATE admins SET role = $2 WHERE id = $1 RETURNING {ADMIN_COLUMNS}");
        let row = sqlx::query_as::<_, AdminRow>(&sql)
            .bind(id)
            .bind(role.as_str())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Admin::try_from(row)
    }

    async fn delete(&self, id: i64, actor: Role) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        let Some((current, super_admins)) = Self::lock_for_guard(&mut tx, id).await? else {
            return Ok(false);
        };

        actor.ensure_manages(current.role)?;

        if current.role == Role::SuperAdmin && super_admins <= 1 {
            return Err(last_super_admin(id));
        }

        sqlx::query("DELETE FROM admins WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(true)
    }
}
