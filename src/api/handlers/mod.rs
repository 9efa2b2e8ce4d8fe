//! HTTP request handlers for API endpoints.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod admins;
pub mod dashboard;
pub mod health;
pub mod links;
pub mod redirect;
pub mod settings;

pub use admins::{
    admin_list_handler, create_admin_handler, delete_admin_handler, me_handler,
    update_admin_handler,
};
pub use dashboard::dashboard_handler;
pub use health::health_handler;
pub use links::{
    create_link_handler, delete_link_handler, get_link_handler, link_list_handler,
    update_link_handler,
};
pub use redirect::{preview_handler, redirect_handler};
pub use settings::{get_settings_handler, update_settings_handler};
