//! Opening, deciding and listing requests.

use tracing::info;
use uuid::Uuid;

use super::{Market, parse_id};
use crate::{
  Error, Result,
  request::{
    Decision, NewRequest, Request, RequestOrigin, TutorRequests,
  },
  store::{Insertion, MarketStore},
  user::{Role, User},
};

impl<S: MarketStore> Market<'_, S> {
  /// A tutor offers to teach a post.
  ///
  /// Fails with, in order: post not found; caller missing or not a tutor;
  /// caller wrote the post; a request from this tutor for this post is
  /// already pending.
  pub async fn request_to_teach(
    &self,
    tutor_id: Uuid,
    post_id: &str,
  ) -> Result<Request> {
    let post = self.post(post_id).await?;

    let tutor = self
      .user(tutor_id)
      .await?
      .filter(User::is_tutor)
      .ok_or(Error::RoleRequired(Role::Tutor))?;

    if post.student_id == tutor.id {
      return Err(Error::SelfRequest);
    }

    let input = NewRequest {
      origin:       RequestOrigin::Post { post_id: post.id },
      tutor_id:     tutor.id,
      tutor_name:   tutor.name,
      student_id:   post.student_id,
      student_name: post.student_name,
    };

    match self.store.insert_request(input).await.map_err(Error::store)? {
      Insertion::Inserted(request) => {
        info!(request_id = %request.id, post_id = %post.id, %tutor_id, "teach request opened");
        Ok(request)
      }
      Insertion::Duplicate => Err(Error::DuplicatePostRequest),
    }
  }

  /// A student asks a tutor to teach them a subject, without a post.
  ///
  /// Fails with, in order: missing tutor id or subject; tutor not found;
  /// target is not a tutor; an identical request is already pending;
  /// student not found.
  pub async fn request_to_learn(
    &self,
    student_id: Uuid,
    tutor_id: &str,
    subject: &str,
  ) -> Result<Request> {
    let subject = subject.trim();
    if tutor_id.trim().is_empty() || subject.is_empty() {
      return Err(Error::MissingFields("tutorId and subject are required"));
    }

    let tutor_not_found = || Error::TutorNotFound(tutor_id.to_owned());
    let tutor_uuid = parse_id(tutor_id).ok_or_else(tutor_not_found)?;
    let tutor = self.user(tutor_uuid).await?.ok_or_else(tutor_not_found)?;
    if !tutor.is_tutor() {
      return Err(Error::NotATutor(tutor.id));
    }

    // A pending duplicate can only exist for a student that exists, so
    // resolving the student before the guarded insert keeps the reported
    // order intact.
    let student = self
      .user(student_id)
      .await?
      .ok_or_else(|| Error::StudentNotFound(student_id.to_string()))?;

    let input = NewRequest {
      origin:       RequestOrigin::Subject { subject: subject.to_owned() },
      tutor_id:     tutor.id,
      tutor_name:   tutor.name,
      student_id:   student.id,
      student_name: student.name,
    };

    match self.store.insert_request(input).await.map_err(Error::store)? {
      Insertion::Inserted(request) => {
        info!(request_id = %request.id, tutor_id = %tutor.id, %student_id, "learn request opened");
        Ok(request)
      }
      Insertion::Duplicate => Err(Error::DuplicateSubjectRequest),
    }
  }

  /// Accept or reject a request.
  ///
  /// `status` must be `accepted` or `rejected`. Only [`Request::decider`]
  /// may act. A decided request stays decided: repeating the same decision
  /// returns it unchanged, a different one is a conflict.
  pub async fn decide(
    &self,
    actor: Uuid,
    request_id: &str,
    status: &str,
  ) -> Result<Request> {
    let decision: Decision = status.parse()?;

    let not_found = || Error::RequestNotFound(request_id.to_owned());
    let id = parse_id(request_id).ok_or_else(not_found)?;
    let request = self
      .store
      .get_request(id)
      .await
      .map_err(Error::store)?
      .ok_or_else(not_found)?;

    if request.decider() != actor {
      return Err(Error::NotDecider(request.origin.decider_role()));
    }

    if request.status.is_terminal() {
      return settled(request, decision);
    }

    let target = decision.status();
    match self.store.decide_request(id, target).await.map_err(Error::store)? {
      Some(updated) => {
        info!(request_id = %id, status = %target, %actor, "request decided");
        Ok(updated)
      }
      // Someone else decided it between our read and our write.
      None => {
        let current = self
          .store
          .get_request(id)
          .await
          .map_err(Error::store)?
          .ok_or_else(not_found)?;
        settled(current, decision)
      }
    }
  }

  /// Requests tutors have sent against a post, newest first. Only the post
  /// owner may look.
  pub async fn requests_for_post(
    &self,
    actor: Uuid,
    post_id: &str,
  ) -> Result<Vec<Request>> {
    let post = self.post(post_id).await?;
    if post.student_id != actor {
      return Err(Error::NotPostOwner);
    }
    self
      .store
      .list_requests_for_post(post.id)
      .await
      .map_err(Error::store)
  }

  /// Everything naming `tutor_id`, split into sent (post-bound, with the
  /// post's current title) and received (subject-bound).
  pub async fn tutor_requests(&self, tutor_id: Uuid) -> Result<TutorRequests> {
    let rows = self
      .store
      .list_requests_for_tutor(tutor_id)
      .await
      .map_err(Error::store)?;
    Ok(TutorRequests::partition(rows))
  }
}

fn settled(request: Request, decision: Decision) -> Result<Request> {
  if request.status == decision.status() {
    Ok(request)
  } else {
    Err(Error::AlreadyDecided { id: request.id, status: request.status })
  }
}
