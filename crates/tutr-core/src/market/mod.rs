//! The marketplace service: every rule about who may do what.
//!
//! [`Market`] borrows a [`MarketStore`] for the duration of one operation.
//! Each operation checks its preconditions in a fixed order (the first
//! failure wins) and performs at most one write.

mod posts;
mod requests;
mod users;

pub use posts::PostForm;
pub use users::ProfileEdits;

use uuid::Uuid;

use crate::{Error, Result, post::Post, store::MarketStore, user::User};

pub struct Market<'s, S> {
  store: &'s S,
}

impl<'s, S: MarketStore> Market<'s, S> {
  pub fn new(store: &'s S) -> Self { Self { store } }

  async fn user(&self, id: Uuid) -> Result<Option<User>> {
    self.store.get_user(id).await.map_err(Error::store)
  }

  /// Resolve a client-supplied post id. An id that does not parse cannot
  /// name a post, so it is reported as not found.
  async fn post(&self, raw_id: &str) -> Result<Post> {
    let not_found = || Error::PostNotFound(raw_id.to_owned());
    let id = parse_id(raw_id).ok_or_else(not_found)?;
    self
      .store
      .get_post(id)
      .await
      .map_err(Error::store)?
      .ok_or_else(not_found)
  }
}

/// Parse a path or body id.
pub fn parse_id(raw: &str) -> Option<Uuid> { Uuid::parse_str(raw.trim()).ok() }

/// Trim and drop empty strings.
fn non_empty(value: Option<String>) -> Option<String> {
  value
    .map(|v| v.trim().to_owned())
    .filter(|v| !v.is_empty())
}
