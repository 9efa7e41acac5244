//! Handlers for `/posts` endpoints.
//!
//! | Method   | Path          | Notes |
//! |----------|---------------|-------|
//! | `GET`    | `/posts`      | Newest first |
//! | `POST`   | `/posts`      | Students only; every field required |
//! | `PUT`    | `/posts/{id}` | Owner only; empty fields are kept |
//! | `DELETE` | `/posts/{id}` | Owner only; requests are kept |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde_json::json;
use tutr_core::{Market, market::PostForm, post::Post, store::MarketStore};

use crate::{AppState, AuthUser, error::ApiError, json::JsonBody};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /posts`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  _caller: AuthUser,
) -> Result<Json<Vec<Post>>, ApiError>
where
  S: MarketStore + Clone + Send + Sync + 'static,
{
  let posts = Market::new(state.store.as_ref()).list_posts().await?;
  Ok(Json(posts))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /posts`, body: `{"title","subject","description","level"}`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  caller: AuthUser,
  JsonBody(form): JsonBody<PostForm>,
) -> Result<impl IntoResponse, ApiError>
where
  S: MarketStore + Clone + Send + Sync + 'static,
{
  let post = Market::new(state.store.as_ref())
    .create_post(caller.user_id, form)
    .await?;
  Ok((StatusCode::CREATED, Json(post)))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PUT /posts/{id}`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  caller: AuthUser,
  Path(id): Path<String>,
  JsonBody(form): JsonBody<PostForm>,
) -> Result<Json<Post>, ApiError>
where
  S: MarketStore + Clone + Send + Sync + 'static,
{
  let post = Market::new(state.store.as_ref())
    .update_post(caller.user_id, &id, form)
    .await?;
  Ok(Json(post))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /posts/{id}`
pub async fn remove<S>(
  State(state): State<AppState<S>>,
  caller: AuthUser,
  Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
  S: MarketStore + Clone + Send + Sync + 'static,
{
  Market::new(state.store.as_ref())
    .delete_post(caller.user_id, &id)
    .await?;
  Ok(Json(json!({ "message": "post deleted" })))
}
