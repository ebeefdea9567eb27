//! End-to-end router tests: authentication in front of the API.

use std::sync::Arc;

use axum::{
  body::{Body, to_bytes},
  http::{Request, StatusCode, header},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use freebible_api::password::hash_password;
use freebible_core::{
  bible::BibleVersion,
  lifecycle::Scope,
  store::BibleStore,
  user::{NewUser, User},
};
use freebible_store_sqlite::SqliteStore;
use serde_json::Value;
use tower::ServiceExt as _;

use crate::{AppState, ServerConfig, router, seed::seed_defaults};

const PASSWORD: &str = "hunter22";

async fn make_state() -> AppState<SqliteStore> {
  let store = SqliteStore::open_in_memory().await.unwrap();
  seed_defaults(&store).await.unwrap();

  let hash = hash_password(PASSWORD).unwrap();
  let reader = NewUser::new("reader@example.com", hash.clone(), 1, "Reader").unwrap();
  store.insert::<User>(reader).await.unwrap();
  let admin = NewUser::new("admin@example.com", hash, 2, "Admin").unwrap().into_superuser();
  store.insert::<User>(admin).await.unwrap();

  AppState { store: Arc::new(store) }
}

fn auth_header(user: &str, pass: &str) -> String {
  format!("Basic {}", B64.encode(format!("{user}:{pass}")))
}

async fn oneshot_raw(
  state:  AppState<SqliteStore>,
  method: &str,
  uri:    &str,
  auth:   Option<&str>,
) -> (StatusCode, header::HeaderMap, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  if let Some(auth) = auth {
    builder = builder.header(header::AUTHORIZATION, auth);
  }
  let resp = router(state)
    .oneshot(builder.body(Body::empty()).unwrap())
    .await
    .unwrap();

  let status = resp.status();
  let headers = resp.headers().clone();
  let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
  (status, headers, body)
}

// ── Authentication ──────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_credentials_get_a_basic_challenge() {
  let state = make_state().await;
  let (status, headers, _) = oneshot_raw(state, "GET", "/api/v1/bible/verse", None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert_eq!(headers[header::WWW_AUTHENTICATE], r#"Basic realm="freebible""#);
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
  let state = make_state().await;
  let auth = auth_header("reader@example.com", "nope");
  let (status, ..) = oneshot_raw(state, "GET", "/api/v1/bible/verse", Some(&auth)).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn email_domain_is_case_insensitive_for_login() {
  let state = make_state().await;
  let auth = auth_header("reader@EXAMPLE.com", PASSWORD);
  let (status, ..) = oneshot_raw(state, "GET", "/api/v1/bible/verse", Some(&auth)).await;
  assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn soft_deleted_user_cannot_log_in() {
  let state = make_state().await;
  let reader = state
    .store
    .find_user_by_email("reader@example.com")
    .await
    .unwrap()
    .unwrap();
  state.store.soft_delete::<User>(reader.id, false).await.unwrap();

  let auth = auth_header("reader@example.com", PASSWORD);
  let (status, ..) = oneshot_raw(state, "GET", "/api/v1/bible/verse", Some(&auth)).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ── Authorised traffic ──────────────────────────────────────────────────────

#[tokio::test]
async fn seeded_verses_are_listed() {
  let state = make_state().await;
  let auth = auth_header("reader@example.com", PASSWORD);
  let (status, _, body) = oneshot_raw(state, "GET", "/api/v1/bible/verse", Some(&auth)).await;
  assert_eq!(status, StatusCode::OK);
  let verses = body.as_array().unwrap();
  assert_eq!(verses.len(), 2);
  assert_eq!(verses[0]["number"], 1);
}

#[tokio::test]
async fn hard_delete_requires_staff() {
  let state = make_state().await;
  let versions: Vec<BibleVersion> = state.store.list(Scope::Visible).await.unwrap();
  let uri = format!("/api/v1/bible/bible_version/{}/hard", versions[0].id);

  let reader = auth_header("reader@example.com", PASSWORD);
  let (status, ..) = oneshot_raw(state.clone(), "DELETE", &uri, Some(&reader)).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let admin = auth_header("admin@example.com", PASSWORD);
  let (status, ..) = oneshot_raw(state.clone(), "DELETE", &uri, Some(&admin)).await;
  assert_eq!(status, StatusCode::NO_CONTENT);

  let (_, _, verses) = oneshot_raw(state, "GET", "/api/v1/bible/verse/all", Some(&admin)).await;
  assert!(verses.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn routes_outside_the_api_are_not_found() {
  let state = make_state().await;
  let (status, ..) = oneshot_raw(state, "GET", "/admin", None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ── Configuration ───────────────────────────────────────────────────────────

#[test]
fn config_defaults_apply_to_missing_keys() {
  let cfg: ServerConfig = config::Config::builder()
    .set_override("port", 9000)
    .unwrap()
    .build()
    .unwrap()
    .try_deserialize()
    .unwrap();
  assert_eq!(cfg.port, 9000);
  assert_eq!(cfg.host, "127.0.0.1");
  assert!(cfg.seed_defaults);
  assert_eq!(cfg.store_path, std::path::PathBuf::from("freebible.sqlite3"));
}
