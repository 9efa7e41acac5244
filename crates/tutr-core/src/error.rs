//! Error types for `tutr-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::{request::RequestStatus, user::Role};

#[derive(Debug, Error)]
pub enum Error {
  // ── Validation ────────────────────────────────────────────────────────

  #[error("{0}")]
  MissingFields(&'static str),

  #[error("invalid status: {0:?}")]
  InvalidStatus(String),

  #[error("invalid level: {0:?}")]
  InvalidLevel(String),

  #[error("invalid role: {0:?}, must be student or tutor")]
  InvalidRole(String),

  #[error("password must be at least {0} characters")]
  PasswordTooShort(usize),

  #[error("email already registered")]
  EmailTaken,

  #[error("user {0} is not a tutor")]
  NotATutor(Uuid),

  #[error("you cannot request to teach your own post")]
  SelfRequest,

  // ── Authentication ────────────────────────────────────────────────────

  #[error("authentication required")]
  Unauthenticated,

  #[error("invalid email or password")]
  InvalidCredentials,

  // ── Authorization ─────────────────────────────────────────────────────

  #[error("only {0}s can do this")]
  RoleRequired(Role),

  #[error("only the post owner can do this")]
  NotPostOwner,

  #[error("only the {0} can accept or reject this request")]
  NotDecider(Role),

  #[error("not authorized to update this user")]
  NotProfileOwner,

  // ── Missing records ───────────────────────────────────────────────────

  #[error("user not found: {0}")]
  UserNotFound(String),

  #[error("tutor not found: {0}")]
  TutorNotFound(String),

  #[error("student not found: {0}")]
  StudentNotFound(String),

  #[error("post not found: {0}")]
  PostNotFound(String),

  #[error("request not found: {0}")]
  RequestNotFound(String),

  // ── Conflicts ─────────────────────────────────────────────────────────

  #[error("you already have a pending request for this post")]
  DuplicatePostRequest,

  #[error("you already have a pending request for this tutor and subject")]
  DuplicateSubjectRequest,

  #[error("request {id} is already {status}")]
  AlreadyDecided { id: Uuid, status: RequestStatus },

  // ── Infrastructure ────────────────────────────────────────────────────

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// The coarse category of an [`Error`]; transports map this to a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  Invalid,
  Unauthenticated,
  Forbidden,
  NotFound,
  Conflict,
  Internal,
}

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::MissingFields(_)
      | Self::InvalidStatus(_)
      | Self::InvalidLevel(_)
      | Self::InvalidRole(_)
      | Self::PasswordTooShort(_)
      | Self::EmailTaken
      | Self::NotATutor(_)
      | Self::SelfRequest => ErrorKind::Invalid,
      Self::Unauthenticated | Self::InvalidCredentials => {
        ErrorKind::Unauthenticated
      }
      Self::RoleRequired(_)
      | Self::NotPostOwner
      | Self::NotDecider(_)
      | Self::NotProfileOwner => ErrorKind::Forbidden,
      Self::UserNotFound(_)
      | Self::TutorNotFound(_)
      | Self::StudentNotFound(_)
      | Self::PostNotFound(_)
      | Self::RequestNotFound(_) => ErrorKind::NotFound,
      Self::DuplicatePostRequest
      | Self::DuplicateSubjectRequest
      | Self::AlreadyDecided { .. } => ErrorKind::Conflict,
      Self::Store(_) => ErrorKind::Internal,
    }
  }

  /// Wrap a backend failure.
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
