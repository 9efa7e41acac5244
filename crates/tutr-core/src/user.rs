//! Users, credentials and bearer sessions.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Error;

/// Minimum accepted password length at registration.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Which side of the marketplace a user is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Student,
  Tutor,
}

impl Role {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Student => "student",
      Self::Tutor => "tutor",
    }
  }
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Role {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "student" => Ok(Self::Student),
      "tutor" => Ok(Self::Tutor),
      other => Err(Error::InvalidRole(other.to_owned())),
    }
  }
}

/// A registered user as exposed to clients. The password hash never leaves
/// the store except through [`Credentials`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub id:         Uuid,
  pub name:       String,
  pub email:      String,
  pub role:       Role,
  /// Subjects a tutor teaches; always empty for students unless they set it.
  pub subjects:   Vec<String>,
  pub created_at: DateTime<Utc>,
}

impl User {
  pub fn is_tutor(&self) -> bool { self.role == Role::Tutor }

  pub fn is_student(&self) -> bool { self.role == Role::Student }
}

/// Input to [`crate::store::MarketStore::insert_user`].
#[derive(Debug, Clone)]
pub struct NewUser {
  pub name:          String,
  pub email:         String,
  pub role:          Role,
  /// argon2 PHC string.
  pub password_hash: String,
}

/// What login needs to verify a password.
#[derive(Debug, Clone)]
pub struct Credentials {
  pub user_id:       Uuid,
  pub password_hash: String,
}

/// Profile changes. `None` leaves a field untouched; `subjects` replaces the
/// whole set.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
  pub name:     Option<String>,
  pub email:    Option<String>,
  pub subjects: Option<Vec<String>>,
}

/// A bearer session. Only the SHA-256 digest of the token is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
  pub token_hash: String,
  pub user_id:    Uuid,
  pub created_at: DateTime<Utc>,
  pub expires_at: DateTime<Utc>,
}

impl Session {
  pub fn is_expired(&self, now: DateTime<Utc>) -> bool { now >= self.expires_at }
}

/// Lowercase and trim an email so lookups are case-insensitive.
pub fn normalize_email(email: &str) -> String { email.trim().to_lowercase() }

/// Trim subjects, drop blanks, and drop repeats while keeping first-seen
/// order.
pub fn normalize_subjects<I, S>(subjects: I) -> Vec<String>
where
  I: IntoIterator<Item = S>,
  S: AsRef<str>,
{
  let mut out: Vec<String> = Vec::new();
  for s in subjects {
    let s = s.as_ref().trim();
    if !s.is_empty() && !out.iter().any(|o| o == s) {
      out.push(s.to_owned());
    }
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn role_parses_lowercase_only() {
    assert_eq!("tutor".parse::<Role>().unwrap(), Role::Tutor);
    assert_eq!("student".parse::<Role>().unwrap(), Role::Student);
    assert!(matches!("Tutor".parse::<Role>(), Err(Error::InvalidRole(_))));
    assert!(matches!("admin".parse::<Role>(), Err(Error::InvalidRole(_))));
  }

  #[test]
  fn subjects_are_deduplicated_in_order() {
    let s = normalize_subjects([" Algebra", "Physics", "", "Algebra ", "  "]);
    assert_eq!(s, vec!["Algebra".to_owned(), "Physics".to_owned()]);
  }

  #[test]
  fn email_is_normalized() {
    assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
  }

  #[test]
  fn user_serializes_camel_case() {
    let user = User {
      id:         Uuid::nil(),
      name:       "Bob".into(),
      email:      "bob@example.com".into(),
      role:       Role::Tutor,
      subjects:   vec!["Physics".into()],
      created_at: DateTime::<Utc>::UNIX_EPOCH,
    };
    let v = serde_json::to_value(&user).unwrap();
    assert_eq!(v["role"], "tutor");
    assert!(v.get("createdAt").is_some());
    assert!(v.get("passwordHash").is_none());
  }
}
