//! Business logic services for the application layer.

pub mod admin_service;
pub mod auth_service;
pub mod link_service;
pub mod resolver;
pub mod settings_service;
pub mod visit_service;

pub use admin_service::AdminService;
pub use auth_service::AuthService;
pub use link_service::{CreateLink, Dashboard, LinkService};
pub use resolver::LinkResolver;
pub use settings_service::SettingsService;
pub use visit_service::VisitAccountant;
