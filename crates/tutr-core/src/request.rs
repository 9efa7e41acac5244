//! Teach and learn requests, and how they move between statuses.
//!
//! A request is opened by one side of the marketplace and decided, exactly
//! once, by the other. Which side opened it is encoded in [`RequestOrigin`]:
//!
//! - a tutor offering to teach a student's post ([`RequestOrigin::Post`]),
//!   decided by the student who wrote the post;
//! - a student asking a tutor for a subject ([`RequestOrigin::Subject`]),
//!   decided by the tutor.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, user::Role};

// ─── Status ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
  Pending,
  Accepted,
  Rejected,
}

impl RequestStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Pending => "pending",
      Self::Accepted => "accepted",
      Self::Rejected => "rejected",
    }
  }

  /// Accepted and rejected requests never change again.
  pub fn is_terminal(self) -> bool { !matches!(self, Self::Pending) }
}

impl fmt::Display for RequestStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// The only statuses a request may be moved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
  Accept,
  Reject,
}

impl Decision {
  pub fn status(self) -> RequestStatus {
    match self {
      Self::Accept => RequestStatus::Accepted,
      Self::Reject => RequestStatus::Rejected,
    }
  }
}

impl FromStr for Decision {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "accepted" => Ok(Self::Accept),
      "rejected" => Ok(Self::Reject),
      other => Err(Error::InvalidStatus(other.to_owned())),
    }
  }
}

// ─── Origin ──────────────────────────────────────────────────────────────────

/// Exactly one of `postId` / `subject` is present on the wire; serde flattens
/// this enum into [`Request`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestOrigin {
  /// A tutor asked to teach this post.
  Post {
    #[serde(rename = "postId")]
    post_id: Uuid,
  },
  /// A student asked this tutor for a subject, with no post involved.
  Subject { subject: String },
}

impl RequestOrigin {
  pub fn post_id(&self) -> Option<Uuid> {
    match self {
      Self::Post { post_id } => Some(*post_id),
      Self::Subject { .. } => None,
    }
  }

  pub fn subject(&self) -> Option<&str> {
    match self {
      Self::Post { .. } => None,
      Self::Subject { subject } => Some(subject),
    }
  }

  /// The side of the marketplace allowed to decide a request of this shape.
  pub fn decider_role(&self) -> Role {
    match self {
      Self::Post { .. } => Role::Student,
      Self::Subject { .. } => Role::Tutor,
    }
  }
}

// ─── Request ─────────────────────────────────────────────────────────────────

/// A stored request.
///
/// `tutor_name` and `student_name` are snapshots taken when the request was
/// opened. They are never refreshed if either user later renames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
  pub id:           Uuid,
  #[serde(flatten)]
  pub origin:       RequestOrigin,
  pub tutor_id:     Uuid,
  pub tutor_name:   String,
  pub student_id:   Uuid,
  pub student_name: String,
  pub status:       RequestStatus,
  pub created_at:   DateTime<Utc>,
}

impl Request {
  /// The one user allowed to accept or reject this request: the post owner
  /// for post-bound requests, the tutor for subject-bound ones.
  pub fn decider(&self) -> Uuid {
    match self.origin.decider_role() {
      Role::Student => self.student_id,
      Role::Tutor => self.tutor_id,
    }
  }

  pub fn is_post_bound(&self) -> bool {
    matches!(self.origin, RequestOrigin::Post { .. })
  }
}

/// Input to [`crate::store::MarketStore::insert_request`]. The store assigns
/// the id, the timestamp and the `pending` status.
#[derive(Debug, Clone)]
pub struct NewRequest {
  pub origin:       RequestOrigin,
  pub tutor_id:     Uuid,
  pub tutor_name:   String,
  pub student_id:   Uuid,
  pub student_name: String,
}

// ─── Read views ──────────────────────────────────────────────────────────────

/// A request joined with the current title of its post, if it has one and the
/// post still exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitledRequest {
  #[serde(flatten)]
  pub request:    Request,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub post_title: Option<String>,
}

/// A tutor's requests: the ones they sent against posts, and the ones
/// students sent them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TutorRequests {
  pub sent:     Vec<TitledRequest>,
  pub received: Vec<Request>,
}

impl TutorRequests {
  /// Split by origin. Order is preserved within each side.
  pub fn partition(rows: impl IntoIterator<Item = TitledRequest>) -> Self {
    let mut out = Self::default();
    for row in rows {
      if row.request.is_post_bound() {
        out.sent.push(row);
      } else {
        out.received.push(row.request);
      }
    }
    out
  }
}
