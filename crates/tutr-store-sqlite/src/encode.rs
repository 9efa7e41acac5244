//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microsecond
//! precision, `Z` suffix) so that `ORDER BY created_at` is chronological.
//! UUIDs are stored as hyphenated lowercase strings. Subjects are a JSON
//! array.

use chrono::{DateTime, SecondsFormat, Utc};
use tutr_core::{
  post::{Level, Post},
  request::{Request, RequestOrigin, RequestStatus, TitledRequest},
  user::{Role, Session, User},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

/// The current time, truncated to what [`encode_dt`] keeps, so a value
/// returned from an insert equals the value read back later.
pub fn now() -> DateTime<Utc> {
  let now = Utc::now();
  DateTime::from_timestamp_micros(now.timestamp_micros()).unwrap_or(now)
}

// ─── Enums ───────────────────────────────────────────────────────────────────

pub fn decode_role(s: &str) -> Result<Role> {
  s.parse().map_err(|_| unknown("role", s))
}

pub fn decode_level(s: &str) -> Result<Level> {
  s.parse().map_err(|_| unknown("level", s))
}

pub fn decode_status(s: &str) -> Result<RequestStatus> {
  match s {
    "pending" => Ok(RequestStatus::Pending),
    "accepted" => Ok(RequestStatus::Accepted),
    "rejected" => Ok(RequestStatus::Rejected),
    other => Err(unknown("status", other)),
  }
}

fn unknown(column: &'static str, value: &str) -> Error {
  Error::UnknownValue { column, value: value.to_owned() }
}

// ─── Subjects ────────────────────────────────────────────────────────────────

pub fn encode_subjects(subjects: &[String]) -> Result<String> {
  Ok(serde_json::to_string(subjects)?)
}

pub fn decode_subjects(s: &str) -> Result<Vec<String>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawUser::from_row`].
pub const USER_COLUMNS: &str = "user_id, name, email, role, subjects, created_at";

/// Raw strings read directly from a `users` row.
pub struct RawUser {
  pub user_id:    String,
  pub name:       String,
  pub email:      String,
  pub role:       String,
  pub subjects:   String,
  pub created_at: String,
}

impl RawUser {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:    row.get(0)?,
      name:       row.get(1)?,
      email:      row.get(2)?,
      role:       row.get(3)?,
      subjects:   row.get(4)?,
      created_at: row.get(5)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      id:         decode_uuid(&self.user_id)?,
      name:       self.name,
      email:      self.email,
      role:       decode_role(&self.role)?,
      subjects:   decode_subjects(&self.subjects)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `sessions` row.
pub struct RawSession {
  pub token_hash: String,
  pub user_id:    String,
  pub created_at: String,
  pub expires_at: String,
}

impl RawSession {
  pub fn into_session(self) -> Result<Session> {
    Ok(Session {
      token_hash: self.token_hash,
      user_id:    decode_uuid(&self.user_id)?,
      created_at: decode_dt(&self.created_at)?,
      expires_at: decode_dt(&self.expires_at)?,
    })
  }
}

/// Column list matching [`RawPost::from_row`].
pub const POST_COLUMNS: &str =
  "post_id, title, subject, description, level, student_id, student_name, created_at";

/// Raw strings read directly from a `posts` row.
pub struct RawPost {
  pub post_id:      String,
  pub title:        String,
  pub subject:      String,
  pub description:  String,
  pub level:        String,
  pub student_id:   String,
  pub student_name: String,
  pub created_at:   String,
}

impl RawPost {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      post_id:      row.get(0)?,
      title:        row.get(1)?,
      subject:      row.get(2)?,
      description:  row.get(3)?,
      level:        row.get(4)?,
      student_id:   row.get(5)?,
      student_name: row.get(6)?,
      created_at:   row.get(7)?,
    })
  }

  pub fn into_post(self) -> Result<Post> {
    Ok(Post {
      id:           decode_uuid(&self.post_id)?,
      title:        self.title,
      subject:      self.subject,
      description:  self.description,
      level:        decode_level(&self.level)?,
      student_id:   decode_uuid(&self.student_id)?,
      student_name: self.student_name,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

/// Column list matching [`RawRequest::from_row`], qualified with the `r`
/// alias so it can be used in joins.
pub const REQUEST_COLUMNS: &str = "r.request_id, r.post_id, r.subject, r.tutor_id, r.tutor_name, \
   r.student_id, r.student_name, r.status, r.created_at";

/// Raw strings read directly from a `requests` row.
pub struct RawRequest {
  pub request_id:   String,
  pub post_id:      Option<String>,
  pub subject:      Option<String>,
  pub tutor_id:     String,
  pub tutor_name:   String,
  pub student_id:   String,
  pub student_name: String,
  pub status:       String,
  pub created_at:   String,
}

impl RawRequest {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      request_id:   row.get(0)?,
      post_id:      row.get(1)?,
      subject:      row.get(2)?,
      tutor_id:     row.get(3)?,
      tutor_name:   row.get(4)?,
      student_id:   row.get(5)?,
      student_name: row.get(6)?,
      status:       row.get(7)?,
      created_at:   row.get(8)?,
    })
  }

  pub fn into_request(self) -> Result<Request> {
    let origin = match (self.post_id, self.subject) {
      (Some(post_id), None) => RequestOrigin::Post { post_id: decode_uuid(&post_id)? },
      (None, Some(subject)) => RequestOrigin::Subject { subject },
      _ => return Err(Error::InvalidOrigin(self.request_id)),
    };

    Ok(Request {
      id: decode_uuid(&self.request_id)?,
      origin,
      tutor_id: decode_uuid(&self.tutor_id)?,
      tutor_name: self.tutor_name,
      student_id: decode_uuid(&self.student_id)?,
      student_name: self.student_name,
      status: decode_status(&self.status)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// A request row joined with the title of its post.
pub struct RawTitledRequest {
  pub request:    RawRequest,
  pub post_title: Option<String>,
}

impl RawTitledRequest {
  pub fn into_titled(self) -> Result<TitledRequest> {
    Ok(TitledRequest {
      request:    self.request.into_request()?,
      post_title: self.post_title,
    })
  }
}
