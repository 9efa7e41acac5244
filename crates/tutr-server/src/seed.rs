//! Demo data for a fresh database.

use anyhow::Context as _;
use tracing::info;
use tutr_api::auth::hash_password;
use tutr_core::{
  post::{Level, NewPost},
  store::{Insertion, MarketStore},
  user::{NewUser, Role, UserPatch},
};
use tutr_store_sqlite::SqliteStore;

const PASSWORD: &str = "password123";

/// Insert a demo student, a demo tutor, and two posts. Does nothing if the
/// demo student is already registered.
pub async fn seed(store: &SqliteStore) -> anyhow::Result<()> {
  let hash = hash_password(PASSWORD).context("failed to hash demo password")?;

  let student = match store
    .insert_user(NewUser {
      name:          "Alice Johnson".into(),
      email:         "alice@example.com".into(),
      role:          Role::Student,
      password_hash: hash.clone(),
    })
    .await?
  {
    Insertion::Inserted(user) => user,
    Insertion::Duplicate => {
      info!("demo data already present, skipping seed");
      return Ok(());
    }
  };

  if let Insertion::Inserted(tutor) = store
    .insert_user(NewUser {
      name:          "Bob Smith".into(),
      email:         "bob@example.com".into(),
      role:          Role::Tutor,
      password_hash: hash,
    })
    .await?
  {
    store
      .update_user(tutor.id, UserPatch {
        subjects: Some(vec!["Mathematics".into(), "Physics".into()]),
        ..Default::default()
      })
      .await?;
  }

  let posts = [
    (
      "Need Help with Calculus - Derivatives",
      "Mathematics",
      "I am struggling with understanding derivatives and their applications. \
       Looking for a tutor who can explain the concepts clearly and help me \
       solve practice problems. I have an exam coming up next week.",
      Level::Intermediate,
    ),
    (
      "Learn React Hooks and State Management",
      "Programming",
      "I am new to React and want to understand hooks, especially useState \
       and useEffect. Also interested in learning about state management \
       patterns.",
      Level::Beginner,
    ),
  ];
  for (title, subject, description, level) in posts {
    store
      .insert_post(NewPost {
        title: title.into(),
        subject: subject.into(),
        description: description.into(),
        level,
        student_id: student.id,
        student_name: student.name.clone(),
      })
      .await?;
  }

  info!("seeded demo users alice@example.com and bob@example.com / {PASSWORD}");
  Ok(())
}
