//! Site-wide settings consumed as plain read-only values.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteSettings {
    pub site_name: String,
    pub support_email: String,
    /// Host serving the branded links, without scheme (e.g. `go.example.com`).
    pub base_domain: String,
    /// Active flag applied to new links created without an explicit value.
    pub default_active: bool,
    /// Delay a preview page should wait before following the redirect.
    pub redirect_delay_seconds: u32,
}

impl SiteSettings {
    /// Public short URL for a slug on the configured base domain.
    pub fn short_url(&self, slug: &str) -> String {
        format!("https://{}/{}", self.base_domain.trim_end_matches('/'), slug)
    }

    pub fn apply(&mut self, patch: SettingsPatch) {
        if let Some(site_name) = patch.site_name {
            self.site_name = site_name;
        }
        if let Some(support_email) = patch.support_email {
            self.support_email = support_email;
        }
        if let Some(base_domain) = patch.base_domain {
            self.base_domain = base_domain;
        }
        if let Some(default_active) = patch.default_active {
            self.default_active = default_active;
        }
        if let Some(delay) = patch.redirect_delay_seconds {
            self.redirect_delay_seconds = delay;
        }
    }
}

/// Partial settings update. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsPatch {
    pub site_name: Option<String>,
    pub support_email: Option<String>,
    pub base_domain: Option<String>,
    pub default_active: Option<bool>,
    pub redirect_delay_seconds: Option<u32>,
}
