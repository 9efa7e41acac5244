//! Registration, login, and the bearer-token extractor.
//!
//! Passwords are stored as argon2 PHC strings. A successful register or
//! login issues a random 256-bit token, returned to the client once; the
//! store only keeps its SHA-256 digest.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use axum::{
  Json,
  extract::{FromRequestParts, State},
  http::{HeaderMap, StatusCode, header, request::Parts},
  response::IntoResponse,
};
use chrono::{Duration, Utc};
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, warn};
use tutr_core::{
  Error,
  store::{Insertion, MarketStore},
  user::{MIN_PASSWORD_LEN, NewUser, Role, Session, User, normalize_email},
};
use uuid::Uuid;

use crate::{AppState, error::ApiError, json::JsonBody};

/// Session policy for this server instance.
#[derive(Debug, Clone)]
pub struct AuthConfig {
  /// How long an issued token stays valid.
  pub token_ttl: Duration,
}

// ─── Passwords and tokens ─────────────────────────────────────────────────────

pub fn hash_password(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| ApiError::PasswordHash(e.to_string()))
}

/// `false` for a wrong password and for an unparseable stored hash alike.
pub fn verify_password(password: &str, phc: &str) -> bool {
  PasswordHash::new(phc)
    .map(|parsed| {
      Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
    })
    .unwrap_or(false)
}

/// Hex SHA-256 of a bearer token, as stored in the sessions table.
pub fn token_digest(token: &str) -> String {
  hex::encode(Sha256::digest(token.as_bytes()))
}

/// Create a session for `user_id` and return the raw bearer token.
pub async fn issue_token<S: MarketStore>(
  store: &S,
  config: &AuthConfig,
  user_id: Uuid,
) -> Result<String, ApiError> {
  let mut bytes = [0u8; 32];
  OsRng.fill_bytes(&mut bytes);
  let token = hex::encode(bytes);

  let now = Utc::now();
  store
    .insert_session(Session {
      token_hash: token_digest(&token),
      user_id,
      created_at: now,
      expires_at: now + config.token_ttl,
    })
    .await
    .map_err(Error::store)?;

  Ok(token)
}

// ─── Extractor ────────────────────────────────────────────────────────────────

/// The caller, resolved from `Authorization: Bearer <token>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
  pub user_id: Uuid,
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
  headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim)
    .filter(|t| !t.is_empty())
}

/// Resolve a bearer token to its user, rejecting unknown and expired ones.
pub async fn authenticate<S: MarketStore>(
  store: &S,
  headers: &HeaderMap,
) -> Result<AuthUser, ApiError> {
  let token = bearer_token(headers).ok_or(Error::Unauthenticated)?;

  let session = store
    .get_session(&token_digest(token))
    .await
    .map_err(Error::store)?
    .ok_or_else(|| {
      warn!("rejected unknown bearer token");
      Error::Unauthenticated
    })?;

  if session.is_expired(Utc::now()) {
    warn!(user_id = %session.user_id, "rejected expired bearer token");
    return Err(Error::Unauthenticated.into());
  }

  Ok(AuthUser { user_id: session.user_id })
}

impl<S> FromRequestParts<AppState<S>> for AuthUser
where
  S: MarketStore + Clone + Send + Sync + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    authenticate(state.store.as_ref(), &parts.headers).await
  }
}

// ─── Handlers ─────────────────────────────────────────────────────────────────

/// Returned by register and login. `token` is shown only here.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
  pub user:  User,
  pub token: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterBody {
  pub name:     Option<String>,
  pub email:    Option<String>,
  pub password: Option<String>,
  pub role:     Option<String>,
}

/// `POST /auth/register`: 201 with `{user, token}`.
pub async fn register<S>(
  State(state): State<AppState<S>>,
  JsonBody(body): JsonBody<RegisterBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: MarketStore + Clone + Send + Sync + 'static,
{
  let filled = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
  let (Some(name), Some(email), Some(password), Some(role)) = (
    filled(body.name),
    filled(body.email),
    filled(body.password),
    filled(body.role),
  ) else {
    return Err(Error::MissingFields("all fields are required").into());
  };

  let role: Role = role.parse()?;
  if password.chars().count() < MIN_PASSWORD_LEN {
    return Err(Error::PasswordTooShort(MIN_PASSWORD_LEN).into());
  }

  let email = normalize_email(&email);
  let existing = state
    .store
    .find_user_by_email(&email)
    .await
    .map_err(Error::store)?;
  if existing.is_some() {
    return Err(Error::EmailTaken.into());
  }

  let input = NewUser {
    name: name.trim().to_owned(),
    email,
    role,
    password_hash: hash_password(&password)?,
  };
  let user = match state.store.insert_user(input).await.map_err(Error::store)? {
    Insertion::Inserted(user) => user,
    Insertion::Duplicate => return Err(Error::EmailTaken.into()),
  };

  let token = issue_token(state.store.as_ref(), &state.auth, user.id).await?;
  info!(user_id = %user.id, role = %user.role, "user registered");
  Ok((StatusCode::CREATED, Json(AuthResponse { user, token })))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginBody {
  pub email:    Option<String>,
  pub password: Option<String>,
}

/// `POST /auth/login`: 200 with `{user, token}`.
///
/// Unknown email and wrong password are indistinguishable to the caller.
pub async fn login<S>(
  State(state): State<AppState<S>>,
  JsonBody(body): JsonBody<LoginBody>,
) -> Result<Json<AuthResponse>, ApiError>
where
  S: MarketStore + Clone + Send + Sync + 'static,
{
  let (Some(email), Some(password)) = (
    body.email.filter(|s| !s.trim().is_empty()),
    body.password.filter(|s| !s.is_empty()),
  ) else {
    return Err(Error::MissingFields("email and password are required").into());
  };

  let email = normalize_email(&email);
  let creds = state
    .store
    .get_credentials(&email)
    .await
    .map_err(Error::store)?
    .ok_or(Error::InvalidCredentials)?;

  if !verify_password(&password, &creds.password_hash) {
    warn!(user_id = %creds.user_id, "failed login");
    return Err(Error::InvalidCredentials.into());
  }

  let user = state
    .store
    .get_user(creds.user_id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::InvalidCredentials)?;

  let token = issue_token(state.store.as_ref(), &state.auth, user.id).await?;
  info!(user_id = %user.id, "user logged in");
  Ok(Json(AuthResponse { user, token }))
}
