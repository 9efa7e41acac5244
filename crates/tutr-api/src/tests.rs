use std::sync::Arc;

use axum::{
  body::Body,
  http::{Method, Request, StatusCode, header},
};
use chrono::Duration;
use serde_json::{Value, json};
use tower::ServiceExt;
use tutr_core::{
  post::{Level, NewPost},
  store::MarketStore,
};
use tutr_store_sqlite::SqliteStore;
use uuid::Uuid;

use crate::{AppState, AuthConfig, api_router};

struct Harness {
  state: AppState<SqliteStore>,
}

struct Account {
  id:    String,
  token: String,
}

impl Harness {
  async fn new() -> Self { Self::with_ttl(Duration::days(7)).await }

  async fn with_ttl(ttl: Duration) -> Self {
    let store = SqliteStore::open_in_memory().await.unwrap();
    Self {
      state: AppState {
        store: Arc::new(store),
        auth:  Arc::new(AuthConfig { token_ttl: ttl }),
      },
    }
  }

  async fn call(
    &self,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
      builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
      Some(v) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(v.to_string())
      }
      None => Body::empty(),
    };

    let resp = api_router(self.state.clone())
      .oneshot(builder.body(body).unwrap())
      .await
      .unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    let value = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
  }

  async fn register(&self, name: &str, role: &str) -> Account {
    let (status, body) = self
      .call(
        Method::POST,
        "/auth/register",
        None,
        Some(json!({
          "name": name,
          "email": format!("{}@example.com", name.to_lowercase()),
          "password": "password123",
          "role": role,
        })),
      )
      .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    Account {
      id:    body["user"]["id"].as_str().unwrap().to_owned(),
      token: body["token"].as_str().unwrap().to_owned(),
    }
  }

  async fn post(&self, author: &Account, title: &str) -> String {
    let (status, body) = self
      .call(
        Method::POST,
        "/posts",
        Some(&author.token),
        Some(json!({
          "title": title,
          "subject": "Mathematics",
          "description": "Need help with derivatives",
          "level": "intermediate",
        })),
      )
      .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_str().unwrap().to_owned()
  }

  async fn teach(&self, tutor: &Account, post_id: &str) -> (StatusCode, Value) {
    self
      .call(
        Method::POST,
        &format!("/posts/{post_id}/requests"),
        Some(&tutor.token),
        None,
      )
      .await
  }

  async fn learn(
    &self,
    student: &Account,
    tutor_id: &str,
    subject: &str,
  ) -> (StatusCode, Value) {
    self
      .call(
        Method::POST,
        "/requests",
        Some(&student.token),
        Some(json!({ "tutorId": tutor_id, "subject": subject })),
      )
      .await
  }

  async fn decide(
    &self,
    actor: &Account,
    request_id: &str,
    status: &str,
  ) -> (StatusCode, Value) {
    self
      .call(
        Method::PATCH,
        &format!("/requests/{request_id}"),
        Some(&actor.token),
        Some(json!({ "status": status })),
      )
      .await
  }
}

// ─── Post-bound flow ──────────────────────────────────────────────────────────

#[tokio::test]
async fn post_bound_scenario() {
  let h = Harness::new().await;
  let s = h.register("Sam", "student").await;
  let t1 = h.register("Tina", "tutor").await;
  let p = h.post(&s, "Calculus help").await;

  let (status, r1) = h.teach(&t1, &p).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(r1["postId"], p.as_str());
  assert_eq!(r1["status"], "pending");
  assert_eq!(r1["tutorName"], "Tina");
  assert_eq!(r1["studentName"], "Sam");
  assert!(r1.get("subject").is_none());

  let (status, _) = h.teach(&t1, &p).await;
  assert_eq!(status, StatusCode::CONFLICT);

  let r1_id = r1["id"].as_str().unwrap();
  let (status, _) = h.decide(&t1, r1_id, "accepted").await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, accepted) = h.decide(&s, r1_id, "accepted").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(accepted["status"], "accepted");

  // Once decided, the pending slot is free again.
  let (status, r2) = h.teach(&t1, &p).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_ne!(r2["id"], r1["id"]);
}

#[tokio::test]
async fn tutor_cannot_request_own_post() {
  let h = Harness::new().await;
  let t = h.register("Tina", "tutor").await;
  let tutor_id = Uuid::parse_str(&t.id).unwrap();

  // The API never lets a tutor author a post, so plant one directly.
  let post = h
    .state
    .store
    .insert_post(NewPost {
      title:        "Mine".into(),
      subject:      "Physics".into(),
      description:  "self".into(),
      level:        Level::Beginner,
      student_id:   tutor_id,
      student_name: "Tina".into(),
    })
    .await
    .unwrap();

  let (status, body) = h.teach(&t, &post.id.to_string()).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["message"], "you cannot request to teach your own post");
}

#[tokio::test]
async fn only_tutors_request_to_teach() {
  let h = Harness::new().await;
  let s = h.register("Sam", "student").await;
  let other = h.register("Olga", "student").await;
  let p = h.post(&s, "Calculus help").await;

  let (status, _) = h.teach(&other, &p).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn teach_unknown_post() {
  let h = Harness::new().await;
  let t = h.register("Tina", "tutor").await;

  let (status, _) = h.teach(&t, &Uuid::new_v4().to_string()).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  let (status, _) = h.teach(&t, "not-a-uuid").await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ─── Subject-bound flow ───────────────────────────────────────────────────────

#[tokio::test]
async fn subject_bound_scenario() {
  let h = Harness::new().await;
  let s2 = h.register("Sid", "student").await;
  let t2 = h.register("Theo", "tutor").await;

  let (status, r2) = h.learn(&s2, &t2.id, "Algebra").await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(r2["subject"], "Algebra");
  assert_eq!(r2["status"], "pending");
  assert!(r2.get("postId").is_none());

  let (status, _) = h.learn(&s2, &t2.id, "Algebra").await;
  assert_eq!(status, StatusCode::CONFLICT);

  let r2_id = r2["id"].as_str().unwrap();
  let (status, _) = h.decide(&s2, r2_id, "rejected").await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, rejected) = h.decide(&t2, r2_id, "rejected").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(rejected["status"], "rejected");

  let (status, mine) = h.call(Method::GET, "/requests", Some(&t2.token), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(mine["sent"], json!([]));
  let received = mine["received"].as_array().unwrap();
  assert_eq!(received.len(), 1);
  assert_eq!(received[0]["id"], r2["id"]);
  assert_eq!(received[0]["status"], "rejected");
}

#[tokio::test]
async fn learn_validation() {
  let h = Harness::new().await;
  let s = h.register("Sam", "student").await;
  let other = h.register("Olga", "student").await;

  let (status, body) = h.learn(&s, "", "Algebra").await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["message"], "tutorId and subject are required");

  let (status, _) = h
    .call(Method::POST, "/requests", Some(&s.token), Some(json!({ "subject": "Algebra" })))
    .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) = h.learn(&s, &Uuid::new_v4().to_string(), "Algebra").await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (status, _) = h.learn(&s, &other.id, "Algebra").await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn different_subjects_are_independent() {
  let h = Harness::new().await;
  let s = h.register("Sam", "student").await;
  let t = h.register("Tina", "tutor").await;

  assert_eq!(h.learn(&s, &t.id, "Algebra").await.0, StatusCode::CREATED);
  assert_eq!(h.learn(&s, &t.id, "Geometry").await.0, StatusCode::CREATED);
}

// ─── Decisions ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn decision_status_is_validated() {
  let h = Harness::new().await;
  let s = h.register("Sam", "student").await;
  let t = h.register("Tina", "tutor").await;
  let (_, r) = h.learn(&s, &t.id, "Algebra").await;
  let id = r["id"].as_str().unwrap();

  for bad in ["pending", "maybe", ""] {
    let (status, _) = h.decide(&t, id, bad).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "status {bad:?}");
  }

  let (status, _) = h
    .call(Method::PATCH, &format!("/requests/{id}"), Some(&t.token), Some(json!({})))
    .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn decide_unknown_request() {
  let h = Harness::new().await;
  let t = h.register("Tina", "tutor").await;

  let (status, _) = h.decide(&t, &Uuid::new_v4().to_string(), "accepted").await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  let (status, _) = h.decide(&t, "42", "accepted").await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn decided_requests_stay_decided() {
  let h = Harness::new().await;
  let s = h.register("Sam", "student").await;
  let t = h.register("Tina", "tutor").await;
  let (_, r) = h.learn(&s, &t.id, "Algebra").await;
  let id = r["id"].as_str().unwrap();

  assert_eq!(h.decide(&t, id, "accepted").await.0, StatusCode::OK);

  let (status, again) = h.decide(&t, id, "accepted").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(again["status"], "accepted");

  let (status, body) = h.decide(&t, id, "rejected").await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert!(body["message"].as_str().unwrap().contains("already accepted"));
}

// ─── Views ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn post_requests_are_owner_only() {
  let h = Harness::new().await;
  let s = h.register("Sam", "student").await;
  let other = h.register("Olga", "student").await;
  let t1 = h.register("Tina", "tutor").await;
  let t2 = h.register("Theo", "tutor").await;
  let p = h.post(&s, "Calculus help").await;

  let (_, first) = h.teach(&t1, &p).await;
  let (_, second) = h.teach(&t2, &p).await;

  let uri = format!("/posts/{p}/requests");
  let (status, list) = h.call(Method::GET, &uri, Some(&s.token), None).await;
  assert_eq!(status, StatusCode::OK);
  let ids: Vec<_> = list.as_array().unwrap().iter().map(|r| r["id"].clone()).collect();
  assert_eq!(ids, vec![second["id"].clone(), first["id"].clone()]);

  let (status, _) = h.call(Method::GET, &uri, Some(&other.token), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let missing = format!("/posts/{}/requests", Uuid::new_v4());
  let (status, _) = h.call(Method::GET, &missing, Some(&s.token), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn tutor_view_splits_and_titles() {
  let h = Harness::new().await;
  let s = h.register("Sam", "student").await;
  let t = h.register("Tina", "tutor").await;
  let p = h.post(&s, "Calculus help").await;

  h.teach(&t, &p).await;
  h.learn(&s, &t.id, "Algebra").await;

  let (_, mine) = h.call(Method::GET, "/requests", Some(&t.token), None).await;
  assert_eq!(mine["sent"][0]["postTitle"], "Calculus help");
  assert_eq!(mine["received"][0]["subject"], "Algebra");

  // Titles are read live; a deleted post leaves the request without one.
  let (status, _) = h
    .call(Method::PUT, &format!("/posts/{p}"), Some(&s.token), Some(json!({ "title": "Limits" })))
    .await;
  assert_eq!(status, StatusCode::OK);
  let (_, mine) = h.call(Method::GET, "/requests", Some(&t.token), None).await;
  assert_eq!(mine["sent"][0]["postTitle"], "Limits");

  let (status, body) = h.call(Method::DELETE, &format!("/posts/{p}"), Some(&s.token), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["message"], "post deleted");
  let (_, mine) = h.call(Method::GET, "/requests", Some(&t.token), None).await;
  let sent = mine["sent"].as_array().unwrap();
  assert_eq!(sent.len(), 1);
  assert!(sent[0].get("postTitle").is_none());
}

// ─── Posts ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn post_rules() {
  let h = Harness::new().await;
  let s = h.register("Sam", "student").await;
  let other = h.register("Olga", "student").await;
  let t = h.register("Tina", "tutor").await;

  let full = json!({
    "title": "Essay review",
    "subject": "English",
    "description": "Two pages",
    "level": "beginner",
  });

  let (status, _) = h.call(Method::POST, "/posts", Some(&t.token), Some(full.clone())).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, body) = h
    .call(Method::POST, "/posts", Some(&s.token), Some(json!({ "title": "x" })))
    .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["message"], "all fields are required");

  let mut bad_level = full.clone();
  bad_level["level"] = json!("expert");
  let (status, _) = h.call(Method::POST, "/posts", Some(&s.token), Some(bad_level)).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, post) = h.call(Method::POST, "/posts", Some(&s.token), Some(full)).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(post["studentName"], "Sam");
  let uri = format!("/posts/{}", post["id"].as_str().unwrap());

  let (status, _) = h
    .call(Method::PUT, &uri, Some(&other.token), Some(json!({ "title": "hijack" })))
    .await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  let (status, _) = h.call(Method::DELETE, &uri, Some(&other.token), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, edited) = h
    .call(Method::PUT, &uri, Some(&s.token), Some(json!({ "level": "advanced", "title": "" })))
    .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(edited["level"], "advanced");
  assert_eq!(edited["title"], "Essay review");

  let (status, list) = h.call(Method::GET, "/posts", Some(&t.token), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(list.as_array().unwrap().len(), 1);
}

// ─── Identity ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn registration_validation() {
  let h = Harness::new().await;
  let register = async |body: Value| h.call(Method::POST, "/auth/register", None, Some(body)).await;

  let (status, _) = register(json!({ "name": "A", "email": "a@x.io", "password": "password1" })).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) = register(json!({
    "name": "A", "email": "a@x.io", "password": "password1", "role": "admin"
  }))
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, body) = register(json!({
    "name": "A", "email": "a@x.io", "password": "short", "role": "student"
  }))
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["message"], "password must be at least 6 characters");

  let (status, body) = register(json!({
    "name": "A", "email": "A@X.io ", "password": "password1", "role": "student"
  }))
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["user"]["email"], "a@x.io");
  assert!(body["user"].get("passwordHash").is_none());

  let (status, body) = register(json!({
    "name": "B", "email": "a@x.io", "password": "password1", "role": "tutor"
  }))
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["message"], "email already registered");
}

#[tokio::test]
async fn login_issues_a_working_token() {
  let h = Harness::new().await;
  h.register("Sam", "student").await;

  let (status, _) = h
    .call(Method::POST, "/auth/login", None, Some(json!({ "email": "sam@example.com" })))
    .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, wrong) = h
    .call(
      Method::POST,
      "/auth/login",
      None,
      Some(json!({ "email": "sam@example.com", "password": "nope-nope" })),
    )
    .await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);

  let (status, unknown) = h
    .call(
      Method::POST,
      "/auth/login",
      None,
      Some(json!({ "email": "who@example.com", "password": "password123" })),
    )
    .await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert_eq!(wrong["message"], unknown["message"]);

  let (status, body) = h
    .call(
      Method::POST,
      "/auth/login",
      None,
      Some(json!({ "email": "SAM@example.com", "password": "password123" })),
    )
    .await;
  assert_eq!(status, StatusCode::OK);
  let token = body["token"].as_str().unwrap();
  let (status, _) = h.call(Method::GET, "/posts", Some(token), None).await;
  assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn protected_routes_need_a_live_token() {
  let h = Harness::new().await;
  let (status, body) = h.call(Method::GET, "/requests", None, None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert_eq!(body["message"], "authentication required");

  let (status, _) = h.call(Method::GET, "/posts", Some("bogus"), None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);

  let expired = Harness::with_ttl(Duration::seconds(-1)).await;
  let s = expired.register("Sam", "student").await;
  let (status, _) = expired.call(Method::GET, "/posts", Some(&s.token), None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn profile_edits() {
  let h = Harness::new().await;
  let s = h.register("Sam", "student").await;
  let t = h.register("Tina", "tutor").await;
  let uri = format!("/users/{}", t.id);

  let (status, _) = h
    .call(Method::PATCH, &uri, Some(&s.token), Some(json!({ "name": "Mallory" })))
    .await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, _) = h
    .call(Method::PATCH, &uri, Some(&t.token), Some(json!({ "email": "sam@example.com" })))
    .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, user) = h
    .call(
      Method::PATCH,
      &uri,
      Some(&t.token),
      Some(json!({ "name": "", "subjects": [" Physics ", "Mathematics", "Physics", ""] })),
    )
    .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(user["name"], "Tina");
  assert_eq!(user["subjects"], json!(["Physics", "Mathematics"]));

  let (status, tutors) = h.call(Method::GET, "/tutors", Some(&s.token), None).await;
  assert_eq!(status, StatusCode::OK);
  let tutors = tutors.as_array().unwrap();
  assert_eq!(tutors.len(), 1);
  assert_eq!(tutors[0]["id"], t.id.as_str());
  assert_eq!(tutors[0]["subjects"], json!(["Physics", "Mathematics"]));
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
  let h = Harness::new().await;
  let resp = api_router(h.state.clone())
    .oneshot(
      Request::builder()
        .method(Method::POST)
        .uri("/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap(),
    )
    .await
    .unwrap();
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
