//! [`SqliteStore`]: the SQLite implementation of [`MarketStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use tutr_core::{
  post::{NewPost, Post, PostPatch},
  request::{NewRequest, Request, RequestStatus, TitledRequest},
  store::{Insertion, MarketStore},
  user::{Credentials, NewUser, Session, User, UserPatch},
};

use crate::{
  encode::{
    POST_COLUMNS, REQUEST_COLUMNS, RawPost, RawRequest, RawSession,
    RawTitledRequest, RawUser, USER_COLUMNS, decode_uuid, encode_dt,
    encode_subjects, encode_uuid, now,
  },
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Tutr store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. Every call
/// runs on the connection's own thread, one at a time.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open a private in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn fetch_request(&self, id_str: String) -> Result<Option<Request>> {
    let raw: Option<RawRequest> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {REQUEST_COLUMNS} FROM requests r WHERE r.request_id = ?1"),
            rusqlite::params![id_str],
            RawRequest::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawRequest::into_request).transpose()
  }
}

/// `true` if `err` is a UNIQUE constraint (or unique index) violation.
fn is_unique_violation(err: &rusqlite::Error) -> bool {
  matches!(
    err,
    rusqlite::Error::SqliteFailure(e, _)
      if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
  )
}

// ─── MarketStore impl ────────────────────────────────────────────────────────

impl MarketStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn insert_user(&self, input: NewUser) -> Result<Insertion<User>> {
    let user = User {
      id:         Uuid::new_v4(),
      name:       input.name,
      email:      input.email,
      role:       input.role,
      subjects:   Vec::new(),
      created_at: now(),
    };

    let id_str       = encode_uuid(user.id);
    let name         = user.name.clone();
    let email        = user.email.clone();
    let role_str     = user.role.as_str();
    let subjects_str = encode_subjects(&user.subjects)?;
    let at_str       = encode_dt(user.created_at);
    let hash         = input.password_hash;

    let inserted = self
      .conn
      .call(move |conn| {
        let res = conn.execute(
          "INSERT INTO users (user_id, name, email, password_hash, role, subjects, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![id_str, name, email, hash, role_str, subjects_str, at_str],
        );
        match res {
          Ok(_) => Ok(true),
          Err(e) if is_unique_violation(&e) => Ok(false),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    Ok(if inserted { Insertion::Inserted(user) } else { Insertion::Duplicate })
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
            rusqlite::params![id_str],
            RawUser::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
    let email = email.to_owned();

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
            rusqlite::params![email],
            RawUser::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn get_credentials(&self, email: &str) -> Result<Option<Credentials>> {
    let email = email.to_owned();

    let raw: Option<(String, String)> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT user_id, password_hash FROM users WHERE email = ?1",
            rusqlite::params![email],
            |row| Ok((row.get(0)?, row.get(1)?)),
          )
          .optional()?)
      })
      .await?;

    raw
      .map(|(id, password_hash)| {
        Ok(Credentials { user_id: decode_uuid(&id)?, password_hash })
      })
      .transpose()
  }

  async fn update_user(
    &self,
    id:    Uuid,
    patch: UserPatch,
  ) -> Result<Option<Insertion<User>>> {
    let id_str       = encode_uuid(id);
    let subjects_str = patch.subjects.as_deref().map(encode_subjects).transpose()?;
    let name         = patch.name;
    let email        = patch.email;

    let raw: Option<Insertion<RawUser>> = self
      .conn
      .call(move |conn| {
        let res = conn.execute(
          "UPDATE users SET
             name     = COALESCE(?2, name),
             email    = COALESCE(?3, email),
             subjects = COALESCE(?4, subjects)
           WHERE user_id = ?1",
          rusqlite::params![id_str, name, email, subjects_str],
        );
        match res {
          Ok(0) => return Ok(None),
          Ok(_) => {}
          Err(e) if is_unique_violation(&e) => return Ok(Some(Insertion::Duplicate)),
          Err(e) => return Err(e.into()),
        }
        Ok(Some(Insertion::Inserted(conn.query_row(
          &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
          rusqlite::params![id_str],
          RawUser::from_row,
        )?)))
      })
      .await?;

    Ok(match raw {
      None => None,
      Some(Insertion::Duplicate) => Some(Insertion::Duplicate),
      Some(Insertion::Inserted(raw)) => Some(Insertion::Inserted(raw.into_user()?)),
    })
  }

  async fn list_tutors(&self) -> Result<Vec<User>> {
    let raws: Vec<RawUser> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {USER_COLUMNS} FROM users WHERE role = 'tutor' ORDER BY name, rowid"
        ))?;
        let rows = stmt
          .query_map([], RawUser::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawUser::into_user).collect()
  }

  // ── Sessions ──────────────────────────────────────────────────────────────

  async fn insert_session(&self, session: Session) -> Result<()> {
    let user_str    = encode_uuid(session.user_id);
    let created_str = encode_dt(session.created_at);
    let expires_str = encode_dt(session.expires_at);
    let hash        = session.token_hash;
    let now_str     = encode_dt(now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM sessions WHERE expires_at < ?1",
          rusqlite::params![now_str],
        )?;
        conn.execute(
          "INSERT INTO sessions (token_hash, user_id, created_at, expires_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![hash, user_str, created_str, expires_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_session(&self, token_hash: &str) -> Result<Option<Session>> {
    let hash = token_hash.to_owned();

    let raw: Option<RawSession> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT token_hash, user_id, created_at, expires_at
             FROM sessions WHERE token_hash = ?1",
            rusqlite::params![hash],
            |row| {
              Ok(RawSession {
                token_hash: row.get(0)?,
                user_id:    row.get(1)?,
                created_at: row.get(2)?,
                expires_at: row.get(3)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawSession::into_session).transpose()
  }

  // ── Posts ─────────────────────────────────────────────────────────────────

  async fn insert_post(&self, input: NewPost) -> Result<Post> {
    let post = Post {
      id:           Uuid::new_v4(),
      title:        input.title,
      subject:      input.subject,
      description:  input.description,
      level:        input.level,
      student_id:   input.student_id,
      student_name: input.student_name,
      created_at:   now(),
    };

    let id_str       = encode_uuid(post.id);
    let title        = post.title.clone();
    let subject      = post.subject.clone();
    let description  = post.description.clone();
    let level_str    = post.level.as_str();
    let student_str  = encode_uuid(post.student_id);
    let student_name = post.student_name.clone();
    let at_str       = encode_dt(post.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO posts (
             post_id, title, subject, description, level,
             student_id, student_name, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            id_str,
            title,
            subject,
            description,
            level_str,
            student_str,
            student_name,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(post)
  }

  async fn get_post(&self, id: Uuid) -> Result<Option<Post>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawPost> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {POST_COLUMNS} FROM posts WHERE post_id = ?1"),
            rusqlite::params![id_str],
            RawPost::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawPost::into_post).transpose()
  }

  async fn list_posts(&self) -> Result<Vec<Post>> {
    let raws: Vec<RawPost> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {POST_COLUMNS} FROM posts ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map([], RawPost::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPost::into_post).collect()
  }

  async fn update_post(&self, id: Uuid, patch: PostPatch) -> Result<Option<Post>> {
    let id_str      = encode_uuid(id);
    let level_str   = patch.level.map(|l| l.as_str());
    let title       = patch.title;
    let subject     = patch.subject;
    let description = patch.description;

    let raw: Option<RawPost> = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE posts SET
             title       = COALESCE(?2, title),
             subject     = COALESCE(?3, subject),
             description = COALESCE(?4, description),
             level       = COALESCE(?5, level)
           WHERE post_id = ?1",
          rusqlite::params![id_str, title, subject, description, level_str],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(Some(conn.query_row(
          &format!("SELECT {POST_COLUMNS} FROM posts WHERE post_id = ?1"),
          rusqlite::params![id_str],
          RawPost::from_row,
        )?))
      })
      .await?;

    raw.map(RawPost::into_post).transpose()
  }

  async fn delete_post(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM posts WHERE post_id = ?1", rusqlite::params![id_str])?)
      })
      .await?;

    Ok(deleted > 0)
  }

  // ── Requests ──────────────────────────────────────────────────────────────

  async fn insert_request(&self, input: NewRequest) -> Result<Insertion<Request>> {
    let request = Request {
      id:           Uuid::new_v4(),
      origin:       input.origin,
      tutor_id:     input.tutor_id,
      tutor_name:   input.tutor_name,
      student_id:   input.student_id,
      student_name: input.student_name,
      status:       RequestStatus::Pending,
      created_at:   now(),
    };

    let id_str       = encode_uuid(request.id);
    let post_str     = request.origin.post_id().map(encode_uuid);
    let subject      = request.origin.subject().map(str::to_owned);
    let tutor_str    = encode_uuid(request.tutor_id);
    let tutor_name   = request.tutor_name.clone();
    let student_str  = encode_uuid(request.student_id);
    let student_name = request.student_name.clone();
    let status_str   = request.status.as_str();
    let at_str       = encode_dt(request.created_at);

    let inserted = self
      .conn
      .call(move |conn| {
        let res = conn.execute(
          "INSERT INTO requests (
             request_id, post_id, subject, tutor_id, tutor_name,
             student_id, student_name, status, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            id_str,
            post_str,
            subject,
            tutor_str,
            tutor_name,
            student_str,
            student_name,
            status_str,
            at_str,
          ],
        );
        match res {
          Ok(_) => Ok(true),
          Err(e) if is_unique_violation(&e) => Ok(false),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    Ok(if inserted { Insertion::Inserted(request) } else { Insertion::Duplicate })
  }

  async fn get_request(&self, id: Uuid) -> Result<Option<Request>> {
    self.fetch_request(encode_uuid(id)).await
  }

  async fn decide_request(
    &self,
    id:     Uuid,
    status: RequestStatus,
  ) -> Result<Option<Request>> {
    let id_str     = encode_uuid(id);
    let status_str = status.as_str();

    let changed = {
      let id_str = id_str.clone();
      self
        .conn
        .call(move |conn| {
          Ok(conn.execute(
            "UPDATE requests SET status = ?2
             WHERE request_id = ?1 AND status = 'pending'",
            rusqlite::params![id_str, status_str],
          )?)
        })
        .await?
    };

    if changed == 0 {
      return Ok(None);
    }
    self.fetch_request(id_str).await
  }

  async fn list_requests_for_post(&self, post_id: Uuid) -> Result<Vec<Request>> {
    let post_str = encode_uuid(post_id);

    let raws: Vec<RawRequest> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {REQUEST_COLUMNS} FROM requests r
           WHERE r.post_id = ?1
           ORDER BY r.created_at DESC, r.rowid DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![post_str], RawRequest::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRequest::into_request).collect()
  }

  async fn list_requests_for_tutor(&self, tutor_id: Uuid) -> Result<Vec<TitledRequest>> {
    let tutor_str = encode_uuid(tutor_id);

    let raws: Vec<RawTitledRequest> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {REQUEST_COLUMNS}, p.title
           FROM requests r
           LEFT JOIN posts p ON p.post_id = r.post_id
           WHERE r.tutor_id = ?1
           ORDER BY r.created_at DESC, r.rowid DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![tutor_str], |row| {
            Ok(RawTitledRequest {
              request:    RawRequest::from_row(row)?,
              post_title: row.get(9)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawTitledRequest::into_titled).collect()
  }
}
