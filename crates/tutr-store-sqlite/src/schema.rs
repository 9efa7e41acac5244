//! SQL schema for the Tutr SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    name          TEXT NOT NULL,
    email         TEXT NOT NULL UNIQUE,  -- trimmed + lowercased
    password_hash TEXT NOT NULL,         -- argon2 PHC string
    role          TEXT NOT NULL,         -- 'student' | 'tutor'
    subjects      TEXT NOT NULL DEFAULT '[]',
    created_at    TEXT NOT NULL
);

-- Only a digest of each bearer token is kept.
CREATE TABLE IF NOT EXISTS sessions (
    token_hash TEXT PRIMARY KEY,
    user_id    TEXT NOT NULL REFERENCES users(user_id),
    created_at TEXT NOT NULL,
    expires_at TEXT NOT NULL
);

-- Expired rows are purged whenever a session is issued.
CREATE INDEX IF NOT EXISTS sessions_expires_idx ON sessions (expires_at);

CREATE TABLE IF NOT EXISTS posts (
    post_id      TEXT PRIMARY KEY,
    title        TEXT NOT NULL,
    subject      TEXT NOT NULL,
    description  TEXT NOT NULL,
    level        TEXT NOT NULL,   -- 'beginner' | 'intermediate' | 'advanced'
    student_id   TEXT NOT NULL REFERENCES users(user_id),
    student_name TEXT NOT NULL,
    created_at   TEXT NOT NULL
);

-- post_id deliberately has no foreign key: posts may be deleted while
-- their requests are kept.
CREATE TABLE IF NOT EXISTS requests (
    request_id   TEXT PRIMARY KEY,
    post_id      TEXT,
    subject      TEXT,
    tutor_id     TEXT NOT NULL REFERENCES users(user_id),
    tutor_name   TEXT NOT NULL,
    student_id   TEXT NOT NULL REFERENCES users(user_id),
    student_name TEXT NOT NULL,
    status       TEXT NOT NULL DEFAULT 'pending',
    created_at   TEXT NOT NULL,
    CHECK ((post_id IS NULL) != (subject IS NULL)),
    CHECK (status IN ('pending', 'accepted', 'rejected'))
);

-- At most one pending request per (post, tutor) and per
-- (tutor, student, subject). Decided requests fall out of the index.
CREATE UNIQUE INDEX IF NOT EXISTS requests_pending_post_idx
    ON requests(post_id, tutor_id)
    WHERE status = 'pending' AND post_id IS NOT NULL;

CREATE UNIQUE INDEX IF NOT EXISTS requests_pending_subject_idx
    ON requests(tutor_id, student_id, subject)
    WHERE status = 'pending' AND subject IS NOT NULL;

CREATE INDEX IF NOT EXISTS requests_post_idx  ON requests(post_id);
CREATE INDEX IF NOT EXISTS requests_tutor_idx ON requests(tutor_id);
CREATE INDEX IF NOT EXISTS posts_created_idx  ON posts(created_at);
CREATE INDEX IF NOT EXISTS users_role_idx     ON users(role);

PRAGMA user_version = 1;
";
