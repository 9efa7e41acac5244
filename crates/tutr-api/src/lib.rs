//! JSON REST API for Tutr.
//!
//! Exposes an axum [`Router`] backed by any [`tutr_core::store::MarketStore`].
//! TLS, CORS, and request tracing are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", tutr_api::api_router(state))
//! ```

pub mod auth;
pub mod error;
pub mod json;
pub mod posts;
pub mod requests;
pub mod users;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, patch, post, put},
};
use tutr_core::store::MarketStore;

pub use auth::{AuthConfig, AuthUser};
pub use error::ApiError;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: MarketStore> {
  pub store: Arc<S>,
  pub auth:  Arc<AuthConfig>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: MarketStore + Clone + Send + Sync + 'static,
{
  Router::new()
    // Identity
    .route("/auth/register", post(auth::register::<S>))
    .route("/auth/login", post(auth::login::<S>))
    .route("/tutors", get(users::list_tutors::<S>))
    .route("/users/{id}", patch(users::update::<S>))
    // Posts
    .route("/posts", get(posts::list::<S>).post(posts::create::<S>))
    .route("/posts/{id}", put(posts::update::<S>).delete(posts::remove::<S>))
    // Requests
    .route(
      "/posts/{id}/requests",
      get(requests::for_post::<S>).post(requests::teach::<S>),
    )
    .route("/requests", get(requests::mine::<S>).post(requests::learn::<S>))
    .route("/requests/{id}", patch(requests::decide::<S>))
    .with_state(state)
}

#[cfg(test)]
mod tests;
