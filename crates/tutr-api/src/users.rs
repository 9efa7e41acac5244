//! Handlers for the tutor directory and profile edits.
//!
//! | Method  | Path          | Notes |
//! |---------|---------------|-------|
//! | `GET`   | `/tutors`     | Every tutor, credentials omitted |
//! | `PATCH` | `/users/{id}` | Caller must be `{id}` |

use axum::{
  Json,
  extract::{Path, State},
};
use tutr_core::{Market, market::ProfileEdits, store::MarketStore, user::User};

use crate::{AppState, AuthUser, error::ApiError, json::JsonBody};

/// `GET /tutors`
pub async fn list_tutors<S>(
  State(state): State<AppState<S>>,
  _caller: AuthUser,
) -> Result<Json<Vec<User>>, ApiError>
where
  S: MarketStore + Clone + Send + Sync + 'static,
{
  let tutors = Market::new(state.store.as_ref()).list_tutors().await?;
  Ok(Json(tutors))
}

/// `PATCH /users/{id}`, body: `{"name"?, "email"?, "subjects"?}`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  caller: AuthUser,
  Path(id): Path<String>,
  JsonBody(edits): JsonBody<ProfileEdits>,
) -> Result<Json<User>, ApiError>
where
  S: MarketStore + Clone + Send + Sync + 'static,
{
  let user = Market::new(state.store.as_ref())
    .update_profile(caller.user_id, &id, edits)
    .await?;
  Ok(Json(user))
}
