//! Repository trait for accounts.

use crate::domain::entities::{Admin, AdminFilter, NewAdmin, Role};
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for account management.
///
/// The last super-admin guard is part of the storage contract: `change_role`
/// and `delete` must check and mutate atomically so that two concurrent
/// demotions cannot leave the system without a super-admin. The caller's
/// privilege over the target is checked in the same step, against the role
/// the account holds at that moment.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AdminRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the email is already registered.
    async fn create(&self, new_admin: NewAdmin) -> Result<Admin, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Admin>, AppError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Admin>, AppError>;

    async fn list(&self, filter: &AdminFilter) -> Result<Vec<Admin>, AppError>;

    async fn count(&self, filter: &AdminFilter) -> Result<i64, AppError>;

    /// Changes an account's role on behalf of a caller holding `actor`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the account does not exist.
    /// Returns [`AppError::Forbidden`] unless `actor` manages both the current
    /// and the requested role.
    /// Returns [`AppError::Conflict`] if this would demote the last super-admin.
    async fn change_role(&self, id: i64, role: Role, actor: Role) -> Result<Admin, AppError>;

    /// Deletes an account and its tokens on behalf of a caller holding `actor`.
    ///
    /// Returns `Ok(false)` if the account does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Forbidden`] unless `actor` manages the account's role.
    /// Returns [`AppError::Conflict`] if this is the last super-admin.
    async fn delete(&self, id: i64, actor: Role) -> Result<bool, AppError>;
}
