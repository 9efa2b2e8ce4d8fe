//! DTOs for account management endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::dto::pagination::PaginationParams;
use crate::domain::entities::{Admin, AdminFilter, Identity, NewAdmin, Role};

fn default_role() -> Role {
    Role::User
}

/// Request body for `POST /api/admins`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateAdminRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, max = 100))]
    pub name: String,

    #[serde(default = "default_role")]
    pub role: Role,
}

impl From<CreateAdminRequest> for NewAdmin {
    fn from(req: CreateAdminRequest) -> Self {
        Self {
            email: req.email,
            name: req.name,
            role: req.role,
        }
    }
}

/// Request body for `PATCH /api/admins/{id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateAdminRequest {
    pub role: Role,
}

/// Query parameters for `GET /api/admins`.
#[derive(Debug, Deserialize)]
pub struct AdminListQuery {
    #[serde(flatten)]
    pub pagination: PaginationParams,

    pub search: Option<String>,

    pub role: Option<Role>,
}

impl AdminListQuery {
    pub fn into_filter(self) -> AdminFilter {
        let (page, limit) = self.pagination.resolve();
        AdminFilter {
            search: self.search.filter(|s| !s.trim().is_empty()),
            role: self.role,
            page,
            limit,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AdminResponse {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<Admin> for AdminResponse {
    fn from(admin: Admin) -> Self {
        Self {
            id: admin.id,
            email: admin.email,
            name: admin.name,
            role: admin.role,
            created_at: admin.created_at,
        }
    }
}

/// Body of `GET /api/me`.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub admin_id: i64,
    pub email: String,
    pub role: Role,
}

impl From<Identity> for MeResponse {
    fn from(identity: Identity) -> Self {
        Self {
            admin_id: identity.admin_id,
            email: identity.email,
            role: identity.role,
        }
    }
}
