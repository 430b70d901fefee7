use std::{io::Cursor, path::PathBuf, sync::LazyLock, time::Duration as StdDuration};

use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use axum::{
  body::Body,
  http::{Request, StatusCode, header},
};
use chrono::{Duration, Utc};
use folio_assets::FsObjectStore;
use folio_core::{
  store::FolioStore,
  user::{Role, SessionRecord},
};
use folio_store_sqlite::SqliteStore;
use rand_core::OsRng;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt as _;
use uuid::Uuid;

use super::*;
use crate::session::{IDENTITY_SECRET_HEADER, hash_token, mint_token};

const BRIDGE_SECRET: &str = "bridge-secret";
const BOUNDARY: &str = "folio-test-boundary";

static SECRET_HASH: LazyLock<String> = LazyLock::new(|| {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(BRIDGE_SECRET.as_bytes(), &salt)
    .unwrap()
    .to_string()
});

// ─── Harness ─────────────────────────────────────────────────────────────────

struct Harness {
  state:  AppState<SqliteStore, FsObjectStore>,
  assets: TempDir,
}

struct LoggedIn {
  token:   String,
  user_id: Uuid,
}

impl Harness {
  async fn new() -> Self { Self::with_limit(DEFAULT_MAX_UPLOAD_BYTES).await }

  async fn with_limit(max_upload_bytes: usize) -> Self {
    let assets = tempfile::tempdir().unwrap();
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let objects = Arc::new(FsObjectStore::new(assets.path(), "http://localhost:3400/assets"));
    let (janitor, _handle) = AssetJanitor::spawn(objects.clone());

    let config = ApiConfig {
      upload_base_path: "folio".into(),
      identity_secret_hash: SECRET_HASH.clone(),
      session_ttl: Duration::hours(1),
      provisioning: ProvisioningDefaults { free_plan_id: Uuid::now_v7() },
      max_upload_bytes,
    };

    Self {
      state: AppState { store, objects, janitor, config: Arc::new(config) },
      assets,
    }
  }

  async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
    let resp = router(self.state.clone()).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
  }

  async fn json(
    &self,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Value,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder()
      .method(method)
      .uri(uri)
      .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
      builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    self.send(builder.body(Body::from(body.to_string())).unwrap()).await
  }

  async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
      builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    self.send(builder.body(Body::empty()).unwrap()).await
  }

  async fn login(&self, email: &str) -> LoggedIn {
    let req = Request::builder()
      .method("POST")
      .uri("/api/v1/auth/login")
      .header(header::CONTENT_TYPE, "application/json")
      .header(IDENTITY_SECRET_HEADER, BRIDGE_SECRET)
      .body(Body::from(json!({ "email": email, "name": "Ada" }).to_string()))
      .unwrap();
    let (status, body) = self.send(req).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    LoggedIn {
      token:   body["data"]["token"].as_str().unwrap().to_owned(),
      user_id: body["data"]["user"]["id"].as_str().unwrap().parse().unwrap(),
    }
  }

  /// A session with `role`, created directly in the store.
  async fn session_for(&self, user_id: Uuid, role: Role, ttl: Duration) -> String {
    let token = mint_token();
    let now = Utc::now();
    self
      .state
      .store
      .create_session(SessionRecord {
        token_hash: hash_token(&token),
        user_id,
        role,
        created_at: now,
        expires_at: now + ttl,
      })
      .await
      .unwrap();
    token
  }

  async fn me(&self, who: &LoggedIn) -> Value {
    let (status, body) = self.get("/api/v1/users/me", Some(&who.token)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["data"].clone()
  }

  async fn folder_id(&self, who: &LoggedIn, name: &str) -> String {
    self.me(who).await["portfolio"]["folders"]
      .as_array()
      .unwrap()
      .iter()
      .find(|f| f["name"] == name)
      .map(|f| f["id"].as_str().unwrap().to_owned())
      .unwrap()
  }

  async fn upload(&self, who: &LoggedIn, folder_id: &str, file: &[u8]) -> (StatusCode, Value) {
    let req = Request::builder()
      .method("POST")
      .uri("/api/v1/photos")
      .header(header::AUTHORIZATION, format!("Bearer {}", who.token))
      .header(
        header::CONTENT_TYPE,
        format!("multipart/form-data; boundary={BOUNDARY}"),
      )
      .body(Body::from(multipart_body(folder_id, file)))
      .unwrap();
    self.send(req).await
  }

  fn asset_path(&self, asset_id: &str) -> PathBuf {
    self.assets.path().join(format!("{asset_id}.jpg"))
  }

  /// Wait for the janitor to remove `asset_id`.
  async fn wait_until_released(&self, asset_id: &str) {
    let path = self.asset_path(asset_id);
    for _ in 0..100 {
      if !path.exists() {
        return;
      }
      tokio::time::sleep(StdDuration::from_millis(20)).await;
    }
    panic!("asset {asset_id} was never released");
  }
}

fn png(width: u32, height: u32) -> Vec<u8> {
  let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 120, 40]));
  let mut buf = Cursor::new(Vec::new());
  img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
  buf.into_inner()
}

fn multipart_body(folder_id: &str, file: &[u8]) -> Vec<u8> {
  let mut body = Vec::new();
  body.extend_from_slice(
    format!(
      "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"folder_id\"\r\n\r\n{folder_id}\r\n"
    )
    .as_bytes(),
  );
  body.extend_from_slice(
    format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"alt\"\r\n\r\nA hill\r\n")
      .as_bytes(),
  );
  body.extend_from_slice(
    format!(
      "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; \
       filename=\"hill.png\"\r\nContent-Type: image/png\r\n\r\n"
    )
    .as_bytes(),
  );
  body.extend_from_slice(file);
  body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
  body
}

// ─── Probes ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn ping_and_health() {
  let h = Harness::new().await;

  let (status, body) = h.get("/ping", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body, json!({ "success": true, "data": "pong" }));

  let (status, body) = h.get("/health", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"], "ok");
}

// ─── Auth ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn login_requires_the_bridge_secret() {
  let h = Harness::new().await;
  let identity = json!({ "email": "ada@example.com", "name": "Ada" });

  let (status, body) = h.json("POST", "/api/v1/auth/login", None, identity.clone()).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert_eq!(body["success"], false);
  assert!(body.get("data").is_none());

  let req = Request::builder()
    .method("POST")
    .uri("/api/v1/auth/login")
    .header(header::CONTENT_TYPE, "application/json")
    .header(IDENTITY_SECRET_HEADER, "guess")
    .body(Body::from(identity.to_string()))
    .unwrap();
  let resp = router(h.state.clone()).oneshot(req).await.unwrap();
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  assert_eq!(resp.headers()[header::WWW_AUTHENTICATE], "Bearer");
}

#[tokio::test]
async fn login_provisions_once_per_email() {
  let h = Harness::new().await;
  let first = h.login("Ada@Example.com").await;
  let second = h.login("ada@example.com").await;

  assert_eq!(first.user_id, second.user_id);
  assert_ne!(first.token, second.token);

  let me = h.me(&second).await;
  assert_eq!(me["email"], "ada@example.com");
  assert_eq!(me["role"], "user");
  assert_eq!(me["membership"]["status"], "active");
  assert_eq!(me["portfolio"]["folders"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn login_rejects_an_invalid_identity() {
  let h = Harness::new().await;
  let req = Request::builder()
    .method("POST")
    .uri("/api/v1/auth/login")
    .header(header::CONTENT_TYPE, "application/json")
    .header(IDENTITY_SECRET_HEADER, BRIDGE_SECRET)
    .body(Body::from(json!({ "email": "nobody", "name": "Ada" }).to_string()))
    .unwrap();
  let (status, body) = h.send(req).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["success"], false);
}

#[tokio::test]
async fn protected_routes_require_a_live_session() {
  let h = Harness::new().await;
  let ada = h.login("ada@example.com").await;

  let (status, _) = h.get("/api/v1/users/me", None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);

  let (status, _) = h.get("/api/v1/users/me", Some("not-a-token")).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);

  let expired = h.session_for(ada.user_id, Role::User, Duration::seconds(-1)).await;
  let (status, _) = h.get("/api/v1/users/me", Some(&expired)).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_revokes_the_token() {
  let h = Harness::new().await;
  let ada = h.login("ada@example.com").await;

  let (status, body) = h.json("POST", "/api/v1/auth/logout", Some(&ada.token), json!({})).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"], true);

  let (status, _) = h.get("/api/v1/users/me", Some(&ada.token)).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ─── Portfolio tree ──────────────────────────────────────────────────────────

#[tokio::test]
async fn reconcile_applies_the_submitted_tree() {
  let h = Harness::new().await;
  let ada = h.login("ada@example.com").await;
  let landscapes = h.folder_id(&ada, "Landscapes").await;

  let (status, body) = h
    .json(
      "PATCH",
      "/api/v1/portfolios",
      Some(&ada.token),
      json!({
        "title": "Northern Light",
        "profiles": { "bio": "Shooting fjords" },
        "folders": [
          { "id": landscapes, "name": "Fjords" },
          { "name": "Aurora", "columns": 2 }
        ]
      }),
    )
    .await;
  assert_eq!(status, StatusCode::OK, "{body}");
  assert_eq!(body["data"]["created_folders"].as_array().unwrap().len(), 1);
  assert_eq!(body["data"]["updated_folders"], 1);

  let me = h.me(&ada).await;
  let portfolio = &me["portfolio"];
  assert_eq!(portfolio["title"], "Northern Light");
  assert_eq!(portfolio["profiles"]["bio"], "Shooting fjords");

  let names: Vec<&str> = portfolio["folders"]
    .as_array()
    .unwrap()
    .iter()
    .map(|f| f["name"].as_str().unwrap())
    .collect();
  assert!(names.contains(&"Fjords"));
  assert!(names.contains(&"Aurora"));
  assert!(!names.contains(&"Landscapes"));
}

#[tokio::test]
async fn reconcile_rejects_a_foreign_portfolio() {
  let h = Harness::new().await;
  let ada = h.login("ada@example.com").await;
  let bob = h.login("bob@example.com").await;
  let ada_portfolio = h.me(&ada).await["portfolio"]["id"].clone();

  let (status, body) = h
    .json(
      "PATCH",
      "/api/v1/portfolios",
      Some(&bob.token),
      json!({ "id": ada_portfolio, "title": "Mine now" }),
    )
    .await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  assert_eq!(body["success"], false);

  assert_ne!(h.me(&ada).await["portfolio"]["title"], "Mine now");
}

#[tokio::test]
async fn malformed_bodies_use_the_error_envelope() {
  let h = Harness::new().await;
  let ada = h.login("ada@example.com").await;

  let req = Request::builder()
    .method("PATCH")
    .uri("/api/v1/portfolios")
    .header(header::AUTHORIZATION, format!("Bearer {}", ada.token))
    .header(header::CONTENT_TYPE, "application/json")
    .body(Body::from("{ not json"))
    .unwrap();
  let (status, body) = h.send(req).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["success"], false);
  assert!(body["message"].is_string());
}

#[tokio::test]
async fn oversized_bodies_are_rejected() {
  let h = Harness::with_limit(512).await;
  let ada = h.login("ada@example.com").await;

  let (status, body) = h
    .json(
      "PATCH",
      "/api/v1/portfolios",
      Some(&ada.token),
      json!({ "title": "x".repeat(4096) }),
    )
    .await;
  assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
  assert_eq!(body["success"], false);
}

// ─── Photos ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn upload_stores_a_compressed_photo() {
  let h = Harness::new().await;
  let ada = h.login("ada@example.com").await;
  let landscapes = h.folder_id(&ada, "Landscapes").await;

  let (status, body) = h.upload(&ada, &landscapes, &png(16, 9)).await;
  assert_eq!(status, StatusCode::CREATED, "{body}");

  let photo = &body["data"];
  let asset_id = photo["public_id"].as_str().unwrap();
  assert!(asset_id.starts_with(&format!("folio/portfolios/{}/", ada.user_id)));
  assert_eq!(photo["alt"], "A hill");
  assert_eq!(photo["sort_index"], 0);
  assert_eq!(
    photo["src"],
    format!("http://localhost:3400/assets/{asset_id}.jpg")
  );

  let stored = std::fs::read(h.asset_path(asset_id)).unwrap();
  assert_eq!(&stored[..2], &[0xFF, 0xD8]);

  let me = h.me(&ada).await;
  let folder = me["portfolio"]["folders"]
    .as_array()
    .unwrap()
    .iter()
    .find(|f| f["id"] == landscapes.as_str())
    .unwrap()
    .clone();
  assert_eq!(folder["photos"][0]["public_id"], asset_id);
}

#[tokio::test]
async fn upload_validates_folder_and_file() {
  let h = Harness::new().await;
  let ada = h.login("ada@example.com").await;
  let bob = h.login("bob@example.com").await;
  let bobs_folder = h.folder_id(&bob, "Portraits").await;
  let adas_folder = h.folder_id(&ada, "Portraits").await;

  let (status, _) = h.upload(&ada, &bobs_folder, &png(4, 4)).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, _) = h.upload(&ada, "not-a-uuid", &png(4, 4)).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, body) = h.upload(&ada, &adas_folder, b"definitely not an image").await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["success"], false);

  assert_eq!(std::fs::read_dir(h.assets.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn remove_deletes_only_own_photos() {
  let h = Harness::new().await;
  let ada = h.login("ada@example.com").await;
  let bob = h.login("bob@example.com").await;
  let adas = h.folder_id(&ada, "Events").await;
  let bobs = h.folder_id(&bob, "Events").await;

  let (_, ada_photo) = h.upload(&ada, &adas, &png(8, 8)).await;
  let (_, bob_photo) = h.upload(&bob, &bobs, &png(8, 8)).await;
  let ada_asset = ada_photo["data"]["public_id"].as_str().unwrap().to_owned();
  let bob_asset = bob_photo["data"]["public_id"].as_str().unwrap().to_owned();

  let (status, body) = h
    .json(
      "DELETE",
      "/api/v1/photos",
      Some(&ada.token),
      json!({ "public_ids": [ada_asset, bob_asset] }),
    )
    .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["public_ids"], json!([ada_asset]));

  h.wait_until_released(&ada_asset).await;
  assert!(h.asset_path(&bob_asset).exists());
}

#[tokio::test]
async fn reconcile_releases_deleted_photos_after_commit() {
  let h = Harness::new().await;
  let ada = h.login("ada@example.com").await;
  let events = h.folder_id(&ada, "Events").await;

  let (_, photo) = h.upload(&ada, &events, &png(8, 8)).await;
  let asset_id = photo["data"]["public_id"].as_str().unwrap().to_owned();

  let (status, body) = h
    .json(
      "PATCH",
      "/api/v1/portfolios",
      Some(&ada.token),
      json!({ "deleted_folders": [events] }),
    )
    .await;
  assert_eq!(status, StatusCode::OK, "{body}");
  assert_eq!(body["data"]["released_assets"], json!([asset_id]));

  h.wait_until_released(&asset_id).await;
}

// ─── Memberships ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn members_see_only_their_own_memberships() {
  let h = Harness::new().await;
  let ada = h.login("ada@example.com").await;
  let bob = h.login("bob@example.com").await;

  let uri = format!("/api/v1/memberships?user_id={}", bob.user_id);
  let (status, body) = h.get(&uri, Some(&ada.token)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["total"], 1);
  let items = body["data"]["items"].as_array().unwrap();
  assert_eq!(items[0]["user_id"], ada.user_id.to_string());

  let bobs_membership = h.me(&bob).await["membership"]["id"].as_str().unwrap().to_owned();
  let (status, _) = h
    .get(&format!("/api/v1/memberships/{bobs_membership}"), Some(&ada.token))
    .await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (status, _) = h
    .get(&format!("/api/v1/memberships/{bobs_membership}"), Some(&bob.token))
    .await;
  assert_eq!(status, StatusCode::OK);

  let (status, _) = h
    .json(
      "POST",
      "/api/v1/memberships",
      Some(&ada.token),
      json!({
        "user_id": ada.user_id,
        "plan_id": Uuid::now_v7(),
        "status": "active",
        "start_date": Utc::now(),
      }),
    )
    .await;
  assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admins_manage_memberships() {
  let h = Harness::new().await;
  let ada = h.login("ada@example.com").await;
  let _bob = h.login("bob@example.com").await;
  let admin = h.session_for(ada.user_id, Role::Admin, Duration::hours(1)).await;

  let (_, body) = h.get("/api/v1/memberships", Some(&admin)).await;
  assert_eq!(body["data"]["total"], 2);

  let (status, body) = h
    .json(
      "POST",
      "/api/v1/memberships",
      Some(&admin),
      json!({
        "user_id": ada.user_id,
        "plan_id": Uuid::now_v7(),
        "status": "inactive",
        "start_date": Utc::now(),
      }),
    )
    .await;
  assert_eq!(status, StatusCode::CREATED, "{body}");
  let id = body["data"]["id"].as_str().unwrap().to_owned();
  let uri = format!("/api/v1/memberships/{id}");

  let (status, body) = h.json("PUT", &uri, Some(&admin), json!({ "status": "cancelled" })).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["status"], "cancelled");

  let (_, body) = h.get("/api/v1/memberships?status=cancelled", Some(&admin)).await;
  assert_eq!(body["data"]["total"], 1);

  let (status, _) = h.json("DELETE", &uri, Some(&admin), json!({})).await;
  assert_eq!(status, StatusCode::OK);
  let (status, _) = h.json("DELETE", &uri, Some(&admin), json!({})).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (status, body) = h
    .json(
      "POST",
      "/api/v1/memberships",
      Some(&admin),
      json!({
        "user_id": Uuid::now_v7(),
        "plan_id": Uuid::now_v7(),
        "status": "active",
        "start_date": Utc::now(),
      }),
    )
    .await;
  assert_eq!(status, StatusCode::NOT_FOUND, "{body}");

  let (status, _) = h.get("/api/v1/memberships/not-a-uuid", Some(&admin)).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ─── Plans ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn plans_are_admin_only() {
  let h = Harness::new().await;
  let ada = h.login("ada@example.com").await;

  let (status, body) = h.get("/api/v1/membership-plans", Some(&ada.token)).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  assert_eq!(body["message"], "admin role required");
}

#[tokio::test]
async fn admins_manage_plans() {
  let h = Harness::new().await;
  let ada = h.login("ada@example.com").await;
  let admin = h.session_for(ada.user_id, Role::Admin, Duration::hours(1)).await;

  let (status, body) = h
    .json(
      "POST",
      "/api/v1/membership-plans",
      Some(&admin),
      json!({
        "name": "Pro Monthly",
        "price": "12.50",
        "billing_cycle": "monthly",
        "features": ["custom domain"],
        "max_folders": 20,
        "external_product_id": "prod_pro",
      }),
    )
    .await;
  assert_eq!(status, StatusCode::CREATED, "{body}");
  let id = body["data"]["id"].as_str().unwrap().to_owned();
  let uri = format!("/api/v1/membership-plans/{id}");

  let (status, body) = h.get(&uri, Some(&admin)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["features"], json!(["custom domain"]));

  let (_, body) = h.get("/api/v1/membership-plans?keyword=PRO", Some(&admin)).await;
  assert_eq!(body["data"]["total"], 1);

  let (status, body) = h.json("PUT", &uri, Some(&admin), json!({ "is_popular": true })).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["is_popular"], true);
  assert_eq!(body["data"]["name"], "Pro Monthly");

  let (status, _) = h.json("PUT", &uri, Some(&admin), json!({ "name": "  " })).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) = h.json("DELETE", &uri, Some(&admin), json!({})).await;
  assert_eq!(status, StatusCode::OK);
  let (status, _) = h.get(&uri, Some(&admin)).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}
