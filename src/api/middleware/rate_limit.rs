//! Per-IP rate limiting for the preview and admin surfaces.
//!
//! Redirects and `/health` are not rate limited.

use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use std::sync::Arc;
use tower_governor::{
    GovernorLayer, governor::GovernorConfigBuilder, key_extractor::PeerIpKeyExtractor,
};

pub type PeerRateLimit =
    GovernorLayer<PeerIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Token bucket parameters for one client address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    /// Seconds needed to refill one token.
    pub replenish_seconds: u64,
    pub burst: u32,
}

/// `GET /preview/{slug}`: one token per second, bursts of 50.
pub const PREVIEW: RateLimit = RateLimit {
    replenish_seconds: 1,
    burst: 50,
};

/// `/api/*`: one token per second, bursts of 20.
pub const ADMIN: RateLimit = RateLimit {
    replenish_seconds: 1,
    burst: 20,
};

/// Builds a limiter keyed on the peer socket address.
///
/// Requests over the limit receive `429 Too Many Requests`. The router has to
/// be served with `into_make_service_with_connect_info::<SocketAddr>`.
pub fn peer_layer(limit: RateLimit) -> PeerRateLimit {
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(limit.replenish_seconds.max(1))
            .burst_size(limit.burst.max(1))
            .finish()
            .expect("quota values are clamped to non-zero"),
    );

    GovernorLayer::new(governor_conf)
}

pub fn preview_layer() -> PeerRateLimit {
    peer_layer(PREVIEW)
}

pub fn admin_layer() -> PeerRateLimit {
    peer_layer(ADMIN)
}
