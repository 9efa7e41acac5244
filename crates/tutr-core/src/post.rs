//! Learning posts written by students.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Error;

/// How far along the student says they are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
  Beginner,
  Intermediate,
  Advanced,
}

impl Level {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Beginner => "beginner",
      Self::Intermediate => "intermediate",
      Self::Advanced => "advanced",
    }
  }
}

impl fmt::Display for Level {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Level {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "beginner" => Ok(Self::Beginner),
      "intermediate" => Ok(Self::Intermediate),
      "advanced" => Ok(Self::Advanced),
      other => Err(Error::InvalidLevel(other.to_owned())),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
  pub id:           Uuid,
  pub title:        String,
  pub subject:      String,
  pub description:  String,
  pub level:        Level,
  pub student_id:   Uuid,
  /// Author's name when the post was written; not kept in sync.
  pub student_name: String,
  pub created_at:   DateTime<Utc>,
}

/// Input to [`crate::store::MarketStore::insert_post`].
#[derive(Debug, Clone)]
pub struct NewPost {
  pub title:        String,
  pub subject:      String,
  pub description:  String,
  pub level:        Level,
  pub student_id:   Uuid,
  pub student_name: String,
}

/// Owner edits. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct PostPatch {
  pub title:       Option<String>,
  pub subject:     Option<String>,
  pub description: Option<String>,
  pub level:       Option<Level>,
}
