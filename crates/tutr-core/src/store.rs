//! The `MarketStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `tutr-store-sqlite`).
//! [`crate::market::Market`] and the HTTP layer depend on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  post::{NewPost, Post, PostPatch},
  request::{NewRequest, Request, RequestStatus, TitledRequest},
  user::{Credentials, NewUser, Session, User, UserPatch},
};

/// Outcome of an insert guarded by a uniqueness constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Insertion<T> {
  Inserted(T),
  /// A conflicting row already exists; nothing was written.
  Duplicate,
}

/// Abstraction over a Tutr store backend.
///
/// The store enforces the uniqueness the marketplace relies on: one account
/// per email, and at most one *pending* request per (post, tutor) and per
/// (tutor, student, subject). A violation is reported as
/// [`Insertion::Duplicate`], so two concurrent callers can never both
/// succeed.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait MarketStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Persist a new user. `Duplicate` if the email is taken.
  fn insert_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<Insertion<User>, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Look up a user by (already normalised) email.
  fn find_user_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  fn get_credentials<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<Credentials>, Self::Error>> + Send + 'a;

  /// Apply a profile patch. Returns `None` if the user does not exist and
  /// `Some(Duplicate)` if the new email belongs to someone else; nothing is
  /// written in either case.
  fn update_user(
    &self,
    id: Uuid,
    patch: UserPatch,
  ) -> impl Future<Output = Result<Option<Insertion<User>>, Self::Error>> + Send + '_;

  fn list_tutors(
    &self,
  ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + '_;

  // ── Sessions ──────────────────────────────────────────────────────────

  /// Persist a session. Sessions that have already expired are dropped in
  /// the same call.
  fn insert_session(
    &self,
    session: Session,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_session<'a>(
    &'a self,
    token_hash: &'a str,
  ) -> impl Future<Output = Result<Option<Session>, Self::Error>> + Send + 'a;

  // ── Posts ─────────────────────────────────────────────────────────────

  fn insert_post(
    &self,
    input: NewPost,
  ) -> impl Future<Output = Result<Post, Self::Error>> + Send + '_;

  fn get_post(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Post>, Self::Error>> + Send + '_;

  /// All posts, newest first.
  fn list_posts(
    &self,
  ) -> impl Future<Output = Result<Vec<Post>, Self::Error>> + Send + '_;

  /// Returns `None` if the post does not exist.
  fn update_post(
    &self,
    id: Uuid,
    patch: PostPatch,
  ) -> impl Future<Output = Result<Option<Post>, Self::Error>> + Send + '_;

  /// Returns `false` if the post did not exist. Requests bound to the post
  /// are kept.
  fn delete_post(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Requests ──────────────────────────────────────────────────────────

  /// Persist a new `pending` request. `Duplicate` if an equivalent request
  /// is already pending.
  fn insert_request(
    &self,
    input: NewRequest,
  ) -> impl Future<Output = Result<Insertion<Request>, Self::Error>> + Send + '_;

  fn get_request(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Request>, Self::Error>> + Send + '_;

  /// Move a request out of `pending`.
  ///
  /// The write only applies while the stored status is still `pending`.
  /// Returns `None` if the request does not exist or was already decided.
  fn decide_request(
    &self,
    id: Uuid,
    status: RequestStatus,
  ) -> impl Future<Output = Result<Option<Request>, Self::Error>> + Send + '_;

  /// All requests bound to a post, newest first.
  fn list_requests_for_post(
    &self,
    post_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Request>, Self::Error>> + Send + '_;

  /// All requests naming this tutor, newest first, each joined with the
  /// current title of its post (if any).
  fn list_requests_for_tutor(
    &self,
    tutor_id: Uuid,
  ) -> impl Future<Output = Result<Vec<TitledRequest>, Self::Error>> + Send + '_;
}
