//! Account management with role-gated privileges.

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::application::services::AuthService;
use crate::domain::entities::{Admin, AdminFilter, Identity, NewAdmin, Paginated, Role};
use crate::domain::repositories::AdminRepository;
use crate::error::AppError;
use crate::utils::deadline::bounded;
use crate::utils::validation::{FieldErrors, check_pagination, email_error};

pub const MAX_NAME_LENGTH: usize = 100;

/// Manages accounts on behalf of an authenticated identity.
///
/// Admins manage `User` accounts. Any operation that touches an admin or
/// super-admin account, either as the target or as the requested role,
/// requires super-admin.
pub struct AdminService {
    admins: Arc<dyn AdminRepository>,
    auth: Arc<AuthService>,
    storage_timeout: Duration,
}

impl AdminService {
    pub fn new(
        admins: Arc<dyn AdminRepository>,
        auth: Arc<AuthService>,
        storage_timeout: Duration,
    ) -> Self {
        Self {
            admins,
            auth,
            storage_timeout,
        }
    }

    pub async fn list(
        &self,
        actor: &Identity,
        filter: AdminFilter,
    ) -> Result<Paginated<Admin>, AppError> {
        actor.require_admin()?;

        let mut errors = FieldErrors::new();
        check_pagination(&mut errors, filter.page, filter.limit);
        errors.into_result()?;

        let (items, total) = tokio::try_join!(
            bounded(self.storage_timeout, self.admins.list(&filter)),
            bounded(self.storage_timeout, self.admins.count(&filter)),
        )?;

        Ok(Paginated::new(items, filter.page, filter.limit, total))
    }

    /// # Errors
    ///
    /// Returns [`AppError::Forbidden`] if the caller may not grant `role`,
    /// [`AppError::Validation`] for a bad email or name, and
    /// [`AppError::Conflict`] if the email is registered.
    pub async fn create(&self, actor: &Identity, new_admin: NewAdmin) -> Result<Admin, AppError> {
        actor.require_admin()?;
        actor.role.ensure_manages(new_admin.role)?;

        let new_admin = NewAdmin {
            email: new_admin.email.trim().to_lowercase(),
            name: new_admin.name.trim().to_string(),
            role: new_admin.role,
        };
        validate_account(&new_admin)?;

        let admin = bounded(self.storage_timeout, self.admins.create(new_admin)).await?;

        info!(admin_id = admin.id, role = %admin.role, actor = actor.admin_id, "Account created");
        Ok(admin)
    }

    /// # Errors
    ///
    /// Returns [`AppError::Forbidden`] if the caller may not manage the
    /// account's current or requested role, [`AppError::NotFound`] for an
    /// unknown account, and [`AppError::Conflict`] when demoting the last
    /// super-admin.
    pub async fn change_role(
        &self,
        actor: &Identity,
        id: i64,
        role: Role,
    ) -> Result<Admin, AppError> {
        actor.require_admin()?;
        actor.role.ensure_manages(role)?;

        // The target's current role is checked by the store under its lock.
        let admin = bounded(
            self.storage_timeout,
            self.admins.change_role(id, role, actor.role),
        )
        .await?;

        info!(admin_id = id, to = %role, actor = actor.admin_id, "Role changed");
        Ok(admin)
    }

    /// Deletes an account together with its tokens.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] when the caller targets their own
    /// account and [`AppError::Conflict`] for the last super-admin.
    pub async fn delete(&self, actor: &Identity, id: i64) -> Result<(), AppError> {
        actor.require_admin()?;
        if id == actor.admin_id {
            return Err(AppError::bad_request(
                "Cannot delete your own account",
                json!({ "id": id }),
            ));
        }

        if !bounded(self.storage_timeout, self.admins.delete(id, actor.role)).await? {
            return Err(account_not_found(id));
        }

        info!(admin_id = id, actor = actor.admin_id, "Account deleted");
        Ok(())
    }

    /// Ensures `email` is a super-admin whose API token is `raw_token`.
    ///
    /// Run at startup from `BOOTSTRAP_ADMIN_EMAIL` / `BOOTSTRAP_ADMIN_TOKEN`.
    pub async fn bootstrap(&self, email: &str, raw_token: &str) -> Result<Admin, AppError> {
        let email = email.trim().to_lowercase();

        let existing = bounded(self.storage_timeout, self.admins.find_by_email(&email)).await?;
        let admin = match existing {
            Some(admin) if admin.role == Role::SuperAdmin => admin,
            Some(admin) => {
                info!(admin_id = admin.id, "Promoting bootstrap account to super_admin");
                bounded(
                    self.storage_timeout,
                    self.admins
                        .change_role(admin.id, Role::SuperAdmin, Role::SuperAdmin),
                )
                .await?
            }
            None => {
                let new_admin = NewAdmin {
                    name: email.split('@').next().unwrap_or_default().to_string(),
                    email,
                    role: Role::SuperAdmin,
                };
                validate_account(&new_admin)?;
                let admin = bounded(self.storage_timeout, self.admins.create(new_admin)).await?;
                info!(admin_id = admin.id, "Bootstrap super_admin created");
                admin
            }
        };

        match self.auth.authenticate(raw_token).await {
            Ok(identity) if identity.admin_id == admin.id => {}
            Ok(identity) => {
                warn!(
                    owner = identity.admin_id,
                    "Bootstrap token is registered to another account"
                );
            }
            Err(AppError::Unauthorized { .. }) => {
                match self.auth.register_token(admin.id, "bootstrap", raw_token).await {
                    Ok(_) => info!(admin_id = admin.id, "Bootstrap token registered"),
                    Err(AppError::Conflict { .. }) => {
                        warn!("Bootstrap token was revoked and is not re-registered");
                    }
                    Err(e) => return Err(e),
                }
            }
            Err(e) => return Err(e),
        }

        Ok(admin)
    }
}

fn account_not_found(id: i64) -> AppError {
    AppError::not_found("Account not found", json!({ "id": id }))
}

fn validate_account(new_admin: &NewAdmin) -> Result<(), AppError> {
    let mut errors = FieldErrors::new();
    errors.check("email", email_error(&new_admin.email));
    if new_admin.name.is_empty() {
        errors.add("name", "Name must not be empty");
    } else if new_admin.name.chars().count() > MAX_NAME_LENGTH {
        errors.add(
            "name",
            format!("Name must be at most {MAX_NAME_LENGTH} characters"),
        );
    }
    errors.into_result()
}
