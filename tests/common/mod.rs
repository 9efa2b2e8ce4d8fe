#![allow(dead_code)]

use async_trait::async_trait;
use axum::{Router, middleware, routing::get};
use branded_links::api;
use branded_links::api::handlers::{health_handler, preview_handler, redirect_handler};
use branded_links::api::middleware::auth;
use branded_links::domain::entities::{
    Admin, Link, LinkFilter, LinkMetadata, LinkPatch, LinkSummary, NewAdmin, NewLink, Role,
    SiteSettings,
};
use branded_links::domain::repositories::{AdminRepository, LinkRepository};
use branded_links::domain::visit_event::VisitEvent;
use branded_links::error::AppError;
use branded_links::infrastructure::Repositories;
use branded_links::infrastructure::cache::{CacheService, NullCache};
use branded_links::infrastructure::memory::MemoryLinkRepository;
use branded_links::state::AppState;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Notify, mpsc};

pub const SIGNING_SECRET: &str = "test-signing-secret";
pub const STORAGE_TIMEOUT: Duration = Duration::from_millis(500);

pub fn site_defaults() -> SiteSettings {
    SiteSettings {
        site_name: "Acme Links".to_string(),
        support_email: "help@acme.test".to_string(),
        base_domain: "go.acme.test".to_string(),
        default_active: true,
        redirect_delay_seconds: 0,
    }
}

pub struct TestContext {
    pub state: AppState,
    pub repos: Repositories,
    pub visit_rx: mpsc::Receiver<VisitEvent>,
}

pub fn create_test_context() -> TestContext {
    create_test_context_with(Repositories::memory(), 100)
}

pub fn create_test_context_with(repos: Repositories, queue_capacity: usize) -> TestContext {
    create_test_context_with_cache(repos, Arc::new(NullCache::new()), queue_capacity)
}

pub fn create_test_context_with_cache(
    repos: Repositories,
    cache: Arc<dyn CacheService>,
    queue_capacity: usize,
) -> TestContext {
    let (tx, rx) = mpsc::channel(queue_capacity);

    let state = AppState::new(
        repos.clone(),
        cache,
        tx,
        site_defaults(),
        SIGNING_SECRET.to_string(),
        STORAGE_TIMEOUT,
    );

    TestContext {
        state,
        repos,
        visit_rx: rx,
    }
}

/// `/api` routes behind bearer auth, without rate limiting.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .nest(
            "/api",
            api::routes::protected_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer)),
        )
        .with_state(state)
}

pub fn public_router(state: AppState) -> Router {
    Router::new()
        .route("/{slug}", get(redirect_handler))
        .route("/preview/{slug}", get(preview_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Public and `/api` routes on one router.
pub fn full_router(state: AppState) -> Router {
    api_router(state.clone()).merge(public_router(state))
}

/// Creates an account and returns it with a working raw token.
pub async fn seed_account(ctx: &TestContext, email: &str, role: Role) -> (Admin, String) {
    let admin = ctx
        .repos
        .admins
        .create(NewAdmin {
            email: email.to_string(),
            name: email.split('@').next().unwrap_or("test").to_string(),
            role,
        })
        .await
        .unwrap();

    let (_, raw) = ctx
        .state
        .auth_service
        .issue_token(admin.id, "test")
        .await
        .unwrap();

    (admin, raw)
}

pub async fn seed_link(ctx: &TestContext, slug: &str, target_url: &str, active: bool) -> Link {
    ctx.repos
        .links
        .create(NewLink {
            slug: slug.to_string(),
            target_url: target_url.to_string(),
            metadata: LinkMetadata {
                title: Some(format!("Title of {slug}")),
                description: None,
                image: None,
            },
            active,
            created_by: 1,
        })
        .await
        .unwrap()
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

/// Link store whose lookups or increments can be made to fail or stall.
///
/// With `pause_next_lookup` set, the next `find_by_slug` reads the store,
/// signals `lookup_done`, then holds its result until `resume_lookup` fires.
pub struct FlakyLinkRepository {
    pub inner: MemoryLinkRepository,
    pub fail_lookups: AtomicBool,
    pub fail_increments: AtomicBool,
    pub stall_increments: AtomicBool,
    pub increment_calls: AtomicUsize,
    pub pause_next_lookup: AtomicBool,
    pub lookup_done: Notify,
    pub resume_lookup: Notify,
}

impl FlakyLinkRepository {
    pub fn new() -> Self {
        Self {
            inner: MemoryLinkRepository::new(),
            fail_lookups: AtomicBool::new(false),
            fail_increments: AtomicBool::new(false),
            stall_increments: AtomicBool::new(false),
            increment_calls: AtomicUsize::new(0),
            pause_next_lookup: AtomicBool::new(false),
            lookup_done: Notify::new(),
            resume_lookup: Notify::new(),
        }
    }
}

fn injected() -> AppError {
    AppError::unavailable("Injected storage fault", json!({}))
}

#[async_trait]
impl LinkRepository for FlakyLinkRepository {
    async fn create(&self, new_link: NewLink) -> Result<Link, AppError> {
        self.inner.create(new_link).await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Link>, AppError> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Link>, AppError> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(injected());
        }
        let found = self.inner.find_by_slug(slug).await;
        if self.pause_next_lookup.swap(false, Ordering::SeqCst) {
            self.lookup_done.notify_one();
            self.resume_lookup.notified().await;
        }
        found
    }

    async fn update(&self, id: i64, patch: LinkPatch) -> Result<Link, AppError> {
        self.inner.update(id, patch).await
    }

    async fn delete(&self, id: i64) -> Result<Option<Link>, AppError> {
        self.inner.delete(id).await
    }

    async fn increment_visits(&self, id: i64) -> Result<bool, AppError> {
        self.increment_calls.fetch_add(1, Ordering::SeqCst);
        if self.stall_increments.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if self.fail_increments.load(Ordering::SeqCst) {
            return Err(injected());
        }
        self.inner.increment_visits(id).await
    }

    async fn list(&self, filter: &LinkFilter) -> Result<Vec<Link>, AppError> {
        self.inner.list(filter).await
    }

    async fn count(&self, filter: &LinkFilter) -> Result<i64, AppError> {
        self.inner.count(filter).await
    }

    async fn summary(&self) -> Result<LinkSummary, AppError> {
        self.inner.summary().await
    }

    async fn ping(&self) -> Result<(), AppError> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(injected());
        }
        self.inner.ping().await
    }
}

/// Memory repositories with the link store swapped for `links`.
pub fn repositories_with_links(links: Arc<dyn LinkRepository>) -> Repositories {
    Repositories {
        links,
        ..Repositories::memory()
    }
}
