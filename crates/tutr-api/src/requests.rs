//! Handlers for teaching and learning requests.
//!
//! | Method  | Path                   | Notes |
//! |---------|------------------------|-------|
//! | `POST`  | `/posts/{id}/requests` | Tutor offers to teach a post |
//! | `GET`   | `/posts/{id}/requests` | Post owner only |
//! | `POST`  | `/requests`            | Body: `{"tutorId","subject"}` |
//! | `GET`   | `/requests`            | Caller's `{sent, received}` |
//! | `PATCH` | `/requests/{id}`       | Body: `{"status":"accepted"\|"rejected"}` |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use tutr_core::{
  Market,
  request::{Request, TutorRequests},
  store::MarketStore,
};

use crate::{AppState, AuthUser, error::ApiError, json::JsonBody};

// ─── Post-bound ───────────────────────────────────────────────────────────────

/// `POST /posts/{id}/requests`
pub async fn teach<S>(
  State(state): State<AppState<S>>,
  caller: AuthUser,
  Path(post_id): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
  S: MarketStore + Clone + Send + Sync + 'static,
{
  let request = Market::new(state.store.as_ref())
    .request_to_teach(caller.user_id, &post_id)
    .await?;
  Ok((StatusCode::CREATED, Json(request)))
}

/// `GET /posts/{id}/requests`
pub async fn for_post<S>(
  State(state): State<AppState<S>>,
  caller: AuthUser,
  Path(post_id): Path<String>,
) -> Result<Json<Vec<Request>>, ApiError>
where
  S: MarketStore + Clone + Send + Sync + 'static,
{
  let requests = Market::new(state.store.as_ref())
    .requests_for_post(caller.user_id, &post_id)
    .await?;
  Ok(Json(requests))
}

// ─── Subject-bound ────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LearnBody {
  pub tutor_id: Option<String>,
  pub subject:  Option<String>,
}

/// `POST /requests`
pub async fn learn<S>(
  State(state): State<AppState<S>>,
  caller: AuthUser,
  JsonBody(body): JsonBody<LearnBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: MarketStore + Clone + Send + Sync + 'static,
{
  let request = Market::new(state.store.as_ref())
    .request_to_learn(
      caller.user_id,
      body.tutor_id.as_deref().unwrap_or_default(),
      body.subject.as_deref().unwrap_or_default(),
    )
    .await?;
  Ok((StatusCode::CREATED, Json(request)))
}

// ─── Views and transitions ────────────────────────────────────────────────────

/// `GET /requests`
pub async fn mine<S>(
  State(state): State<AppState<S>>,
  caller: AuthUser,
) -> Result<Json<TutorRequests>, ApiError>
where
  S: MarketStore + Clone + Send + Sync + 'static,
{
  let requests = Market::new(state.store.as_ref())
    .tutor_requests(caller.user_id)
    .await?;
  Ok(Json(requests))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DecideBody {
  pub status: Option<String>,
}

/// `PATCH /requests/{id}`
pub async fn decide<S>(
  State(state): State<AppState<S>>,
  caller: AuthUser,
  Path(request_id): Path<String>,
  JsonBody(body): JsonBody<DecideBody>,
) -> Result<Json<Request>, ApiError>
where
  S: MarketStore + Clone + Send + Sync + 'static,
{
  let request = Market::new(state.store.as_ref())
    .decide(
      caller.user_id,
      &request_id,
      body.status.as_deref().unwrap_or_default(),
    )
    .await?;
  Ok(Json(request))
}
