//! Profiles and the tutor directory.

use serde::Deserialize;
use uuid::Uuid;

use super::{Market, non_empty};
use crate::{
  Error, Result,
  store::{Insertion, MarketStore},
  user::{User, UserPatch, normalize_email, normalize_subjects},
};

/// Profile edits as submitted by a client. Empty strings are ignored;
/// `subjects`, when present, replaces the whole set.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfileEdits {
  pub name:     Option<String>,
  pub email:    Option<String>,
  pub subjects: Option<Vec<String>>,
}

impl<S: MarketStore> Market<'_, S> {
  pub async fn list_tutors(&self) -> Result<Vec<User>> {
    self.store.list_tutors().await.map_err(Error::store)
  }

  /// Users may only edit themselves.
  pub async fn update_profile(
    &self,
    actor: Uuid,
    user_id: &str,
    edits: ProfileEdits,
  ) -> Result<User> {
    if super::parse_id(user_id) != Some(actor) {
      return Err(Error::NotProfileOwner);
    }

    let email = non_empty(edits.email).map(|e| normalize_email(&e));
    if let Some(email) = &email {
      let holder = self
        .store
        .find_user_by_email(email)
        .await
        .map_err(Error::store)?;
      if holder.is_some_and(|u| u.id != actor) {
        return Err(Error::EmailTaken);
      }
    }

    let patch = UserPatch {
      name: non_empty(edits.name),
      email,
      subjects: edits.subjects.map(normalize_subjects),
    };

    // The lookup above gives the usual answer; the store catches a
    // concurrent claim on the same email.
    match self.store.update_user(actor, patch).await.map_err(Error::store)? {
      Some(Insertion::Inserted(user)) => Ok(user),
      Some(Insertion::Duplicate) => Err(Error::EmailTaken),
      None => Err(Error::UserNotFound(user_id.to_owned())),
    }
  }
}
