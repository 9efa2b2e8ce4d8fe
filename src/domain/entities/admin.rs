//! Accounts, roles and the per-request caller identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

/// Account privilege level, ordered from least to most privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Read-only access to links and the dashboard.
    User,
    Admin,
    SuperAdmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::SuperAdmin => "super_admin",
        }
    }

    /// Admin and super-admin accounts are privileged records.
    pub fn is_privileged(&self) -> bool {
        *self >= Role::Admin
    }

    /// Whether a caller with this role may manage accounts holding, or being
    /// given, `other`. Admins manage users; privileged roles need super-admin.
    pub fn manages(&self, other: Role) -> bool {
        match self {
            Role::SuperAdmin => true,
            Role::Admin => !other.is_privileged(),
            Role::User => false,
        }
    }

    /// # Errors
    ///
    /// Returns [`AppError::Forbidden`] unless `self` manages `other`.
    pub fn ensure_manages(&self, other: Role) -> Result<(), AppError> {
        if self.manages(other) {
            return Ok(());
        }
        Err(AppError::forbidden(
            "Super-admin capability required",
            json!({ "role": self, "target_role": other }),
        ))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            "super_admin" => Ok(Role::SuperAdmin),
            other => Err(AppError::bad_request(
                "Unknown role",
                json!({ "role": other, "allowed": ["user", "admin", "super_admin"] }),
            )),
        }
    }
}

/// A stored account.
#[derive(Debug, Clone, PartialEq)]
pub struct Admin {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAdmin {
    pub email: String,
    pub name: String,
    pub role: Role,
}

/// Search, role filter and pagination for account listings.
#[derive(Debug, Clone, PartialEq)]
pub struct AdminFilter {
    /// Case-insensitive substring over email and name.
    pub search: Option<String>,
    pub role: Option<Role>,
    pub page: u32,
    pub limit: u32,
}

impl Default for AdminFilter {
    fn default() -> Self {
        Self {
            search: None,
            role: None,
            page: 1,
            limit: 20,
        }
    }
}

impl AdminFilter {
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.limit)
    }
}

/// The authenticated caller of an admin operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub admin_id: i64,
    pub email: String,
    pub role: Role,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role >= Role::Admin
    }

    pub fn is_super_admin(&self) -> bool {
        self.role == Role::SuperAdmin
    }

    /// # Errors
    ///
    /// Returns [`AppError::Forbidden`] unless the caller is an admin or super-admin.
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            return Ok(());
        }
        Err(AppError::forbidden(
            "Admin capability required",
            json!({ "role": self.role }),
        ))
    }

    /// # Errors
    ///
    /// Returns [`AppError::Forbidden`] unless the caller is a super-admin.
    pub fn require_super_admin(&self) -> Result<(), AppError> {
        if self.is_super_admin() {
            return Ok(());
        }
        Err(AppError::forbidden(
            "Super-admin capability required",
            json!({ "role": self.role }),
        ))
    }
}

impl From<&Admin> for Identity {
    fn from(admin: &Admin) -> Self {
        Self {
            admin_id: admin.id,
            email: admin.email.clone(),
            role: admin.role,
        }
    }
}
