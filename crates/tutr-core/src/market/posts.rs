//! Student posts: create, list, edit, delete.

use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use super::{Market, non_empty};
use crate::{
  Error, Result,
  post::{Level, NewPost, Post, PostPatch},
  store::MarketStore,
  user::Role,
};

/// Post fields as submitted by a client.
///
/// On create every field is required. On update, missing or empty fields are
/// left as they are.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PostForm {
  pub title:       Option<String>,
  pub subject:     Option<String>,
  pub description: Option<String>,
  pub level:       Option<String>,
}

impl<S: MarketStore> Market<'_, S> {
  pub async fn list_posts(&self) -> Result<Vec<Post>> {
    self.store.list_posts().await.map_err(Error::store)
  }

  pub async fn create_post(&self, author: Uuid, form: PostForm) -> Result<Post> {
    let (Some(title), Some(subject), Some(description), Some(level)) = (
      non_empty(form.title),
      non_empty(form.subject),
      non_empty(form.description),
      non_empty(form.level),
    ) else {
      return Err(Error::MissingFields("all fields are required"));
    };
    let level: Level = level.parse()?;

    let student = self
      .user(author)
      .await?
      .ok_or_else(|| Error::UserNotFound(author.to_string()))?;
    if !student.is_student() {
      return Err(Error::RoleRequired(Role::Student));
    }

    let post = self
      .store
      .insert_post(NewPost {
        title,
        subject,
        description,
        level,
        student_id: student.id,
        student_name: student.name,
      })
      .await
      .map_err(Error::store)?;

    info!(post_id = %post.id, student_id = %post.student_id, "post created");
    Ok(post)
  }

  pub async fn update_post(
    &self,
    actor: Uuid,
    post_id: &str,
    edits: PostForm,
  ) -> Result<Post> {
    let post = self.post(post_id).await?;
    if post.student_id != actor {
      return Err(Error::NotPostOwner);
    }

    let patch = PostPatch {
      title:       non_empty(edits.title),
      subject:     non_empty(edits.subject),
      description: non_empty(edits.description),
      level:       non_empty(edits.level)
        .map(|l| l.parse::<Level>())
        .transpose()?,
    };

    self
      .store
      .update_post(post.id, patch)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::PostNotFound(post_id.to_owned()))
  }

  pub async fn delete_post(&self, actor: Uuid, post_id: &str) -> Result<()> {
    let post = self.post(post_id).await?;
    if post.student_id != actor {
      return Err(Error::NotPostOwner);
    }

    if !self.store.delete_post(post.id).await.map_err(Error::store)? {
      return Err(Error::PostNotFound(post_id.to_owned()));
    }
    info!(post_id = %post.id, "post deleted");
    Ok(())
  }
}
