//! In-process accounts and API tokens.
//!
//! Both repositories share one lock so that deleting an account removes its
//! tokens in the same step, like the `ON DELETE CASCADE` in PostgreSQL.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::entities::{Admin, AdminFilter, NewAdmin, Role};
use crate::domain::repositories::{AdminRepository, ApiToken, TokenRepository};
use crate::error::AppError;

#[derive(Default)]
struct AccountTables {
    next_admin_id: i64,
    next_token_id: i64,
    admins: BTreeMap<i64, Admin>,
    tokens: BTreeMap<i64, ApiToken>,
}

impl AccountTables {
    fn super_admin_count(&self) -> usize {
        self.admins
            .values()
            .filter(|a| a.role == Role::SuperAdmin)
            .count()
    }

    fn matching<'a>(&'a self, filter: &'a AdminFilter) -> impl Iterator<Item = &'a Admin> + 'a {
        let needle = filter
            .search
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        self.admins.values().filter(move |admin| {
            if let Some(role) = filter.role
                && admin.role != role
            {
                return false;
            }
            match &needle {
                Some(needle) => {
                    admin.email.to_lowercase().contains(needle)
                        || admin.name.to_lowercase().contains(needle)
                }
                None => true,
            }
        })
    }
}

type SharedTables = Arc<RwLock<AccountTables>>;

#[derive(Clone, Default)]
pub struct MemoryAdminRepository {
    tables: SharedTables,
}

impl MemoryAdminRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token repository operating on the same account tables.
    pub fn tokens(&self) -> MemoryTokenRepository {
        MemoryTokenRepository {
            tables: Arc::clone(&self.tables),
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
impl AdminRepository for MemoryAdminRepository {
    async fn create(&self, new_admin: NewAdmin) -> Result<Admin, AppError> {
        let mut tables = self.tables.write().await;

        if tables
            .admins
            .values()
            .any(|a| a.email.eq_ignore_ascii_case(&new_admin.email))
        {
            return Err(AppError::conflict(
                "Email is already registered",
                json!({ "email": new_admin.email }),
            ));
        }

        tables.next_admin_id += 1;
        let admin = Admin {
            id: tables.next_admin_id,
            email: new_admin.email,
            name: new_admin.name,
            role: new_admin.role,
            created_at: Utc::now(),
        };
        tables.admins.insert(admin.id, admin.clone());

        Ok(admin)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Admin>, AppError> {
        Ok(self.tables.read().await.admins.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Admin>, AppError> {
        Ok(self
            .tables
            .read()
            .await
            .admins
            .values()
            .find(|a| a.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn list(&self, filter: &AdminFilter) -> Result<Vec<Admin>, AppError> {
        let tables = self.tables.read().await;
        let mut admins: Vec<Admin> = tables.matching(filter).cloned().collect();
        admins.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));

        let offset = usize::try_from(filter.offset()).unwrap_or(usize::MAX);
        Ok(admins
            .into_iter()
            .skip(offset)
            .take(filter.limit as usize)
            .collect())
    }

    async fn count(&self, filter: &AdminFilter) -> Result<i64, AppError> {
        Ok(self.tables.read().await.matching(filter).count() as i64)
    }

    async fn change_role(&self, id: i64, role: Role, actor: Role) -> Result<Admin, AppError> {
        let mut tables = self.tables.write().await;
        let super_admins = tables.super_admin_count();

        let admin = tables
            .admins
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("Account not found", json!({ "id": id })))?;

        actor.ensure_manages(admin.role)?;
        actor.ensure_manages(role)?;

        if admin.role == Role::SuperAdmin && role != Role::SuperAdmin && super_admins <= 1 {
            return Err(last_super_admin(id));
        }

        admin.role = role;
        Ok(admin.clone())
    }

    async fn delete(&self, id: i64, actor: Role) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;

        let Some(role) = tables.admins.get(&id).map(|a| a.role) else {
            return Ok(false);
        };

        actor.ensure_manages(role)?;

        if role == Role::SuperAdmin && tables.super_admin_count() <= 1 {
            return Err(last_super_admin(id));
        }

        tables.admins.remove(&id);
        tables.tokens.retain(|_, t| t.admin_id != id);

        Ok(true)
    }
}

#[derive(Clone)]
pub struct MemoryTokenRepository {
    tables: SharedTables,
}

#[async_trait]
impl TokenRepository for MemoryTokenRepository {
    async fn find_active(&self, token_hash: &str) -> Result<Option<ApiToken>, AppError> {
        Ok(self
            .tables
            .read()
            .await
            .tokens
            .values()
            .find(|t| t.token_hash == token_hash && !t.is_revoked())
            .cloned())
    }

    async fn update_last_used(&self, token_hash: &str) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        if let Some(token) = tables
            .tokens
            .values_mut()
            .find(|t| t.token_hash == token_hash && !t.is_revoked())
        {
            token.last_used_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn create_token(
        &self,
        admin_id: i64,
        name: &str,
        token_hash: &str,
    ) -> Result<ApiToken, AppError> {
        let mut tables = self.tables.write().await;

        if !tables.admins.contains_key(&admin_id) {
            return Err(AppError::not_found(
                "Account not found",
                json!({ "id": admin_id }),
            ));
        }
        if tables.tokens.values().any(|t| t.token_hash == token_hash) {
            return Err(AppError::conflict(
                "Token already registered",
                json!({ "name": name }),
            ));
        }

        tables.next_token_id += 1;
        let token = ApiToken {
            id: tables.next_token_id,
            admin_id,
            name: name.to_string(),
            token_hash: token_hash.to_string(),
            created_at: Utc::now(),
            last_used_at: None,
            revoked_at: None,
        };
        tables.tokens.insert(token.id, token.clone());

        Ok(token)
    }

    async fn list_tokens(&self, admin_id: Option<i64>) -> Result<Vec<ApiToken>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .tokens
            .values()
            .rev()
            .filter(|t| admin_id.is_none_or(|id| t.admin_id == id))
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<ApiToken>, AppError> {
        Ok(self.tables.read().await.tokens.get(&id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<ApiToken>, AppError> {
        Ok(self
            .tables
            .read()
            .await
            .tokens
            .values()
            .rev()
            .find(|t| t.name == name)
            .cloned())
    }

    async fn revoke_token(&self, id: i64) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        let token = tables
            .tokens
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("Token not found", json!({ "id": id })))?;

        if token.revoked_at.is_none() {
            token.revoked_at = Some(Utc::now());
        }
        Ok(())
    }
}
