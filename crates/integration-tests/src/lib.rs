//! Integration test support for Camellia.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p camellia-integration-tests
//! ```
//!
//! Each test spawns its own API server on an ephemeral port against a
//! fresh `SQLite` database in a temp directory, so tests are fully
//! isolated and need no external services. Verification codes are
//! captured by in-process recording channels instead of leaving the
//! machine, which lets tests walk the real signup flow end to end.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::SecretString;
use serde_json::{Value, json};
use sqlx::SqlitePool;
use tempfile::TempDir;

use camellia_api::config::AppConfig;
use camellia_api::db::{self, UserRepository};
use camellia_api::routes;
use camellia_api::services::auth;
use camellia_api::services::{CodeChannel, DeliveryError, MokaOtpStore, OtpStore};
use camellia_api::state::AppState;
use camellia_core::Email;

/// A [`CodeChannel`] that records deliveries instead of sending them.
#[derive(Clone, Default)]
pub struct RecordingChannel {
    deliveries: Arc<Mutex<Vec<(String, String)>>>,
}

impl RecordingChannel {
    /// All `(destination, code)` pairs delivered so far.
    #[must_use]
    pub fn deliveries(&self) -> Vec<(String, String)> {
        self.deliveries
            .lock()
            .expect("deliveries mutex poisoned")
            .clone()
    }

    /// The most recent code sent to `destination`.
    #[must_use]
    pub fn last_code_for(&self, destination: &str) -> Option<String> {
        self.deliveries()
            .iter()
            .rev()
            .find(|(dest, _)| dest == destination)
            .map(|(_, code)| code.clone())
    }
}

#[async_trait]
impl CodeChannel for RecordingChannel {
    async fn deliver(&self, destination: &str, code: &str) -> Result<(), DeliveryError> {
        self.deliveries
            .lock()
            .expect("deliveries mutex poisoned")
            .push((destination.to_owned(), code.to_owned()));
        Ok(())
    }
}

/// A running API server plus everything a test needs to talk to it.
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
    pub pool: SqlitePool,
    pub email_codes: RecordingChannel,
    pub sms_codes: RecordingChannel,
    // Holds the database and upload directory until the test ends.
    _dir: TempDir,
}

impl TestContext {
    /// Start a fresh server: temp database, migrations applied, recording
    /// channels wired in, listener bound to an ephemeral port.
    pub async fn spawn() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let db_path = dir.path().join("camellia-test.db");
        let database_url = SecretString::from(format!("sqlite://{}", db_path.display()));

        let pool = db::create_pool(&database_url).await.expect("create pool");
        db::MIGRATOR.run(&pool).await.expect("run migrations");

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral port");
        let addr = listener.local_addr().expect("read bound address");
        let base_url = format!("http://{addr}");

        let upload_dir = dir.path().join("uploads");
        std::fs::create_dir_all(&upload_dir).expect("create upload dir");

        let config = AppConfig {
            database_url,
            base_url: base_url.clone(),
            upload_dir,
            ..AppConfig::default()
        };

        let email_codes = RecordingChannel::default();
        let sms_codes = RecordingChannel::default();
        let otp_store: Arc<dyn OtpStore> = Arc::new(MokaOtpStore::new(config.otp_ttl()));

        let state = AppState::with_parts(
            config,
            pool.clone(),
            otp_store,
            Arc::new(email_codes.clone()),
            Arc::new(sms_codes.clone()),
        );

        let app = routes::app(state);
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve test app");
        });

        Self {
            client: Client::new(),
            base_url,
            pool,
            email_codes,
            sms_codes,
            _dir: dir,
        }
    }

    /// Build a full URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Insert an admin directly (there is no signup path for admins) and
    /// log in through the API. Returns a bearer token.
    pub async fn create_admin(&self, email: &str, password: &str) -> String {
        // Same normalization as signup, so login finds the row.
        let parsed = Email::parse(email.trim().to_lowercase().as_str()).expect("valid admin email");
        let hash = auth::hash_password(password).expect("hash password");
        UserRepository::new(&self.pool)
            .create_admin(&parsed, None, &hash)
            .await
            .expect("insert admin");

        self.login(email, password).await
    }

    /// Walk the whole signup flow over HTTP: request both codes, read them
    /// from the recording channels, confirm, then log in. Returns a bearer
    /// token.
    pub async fn signup_user(&self, email: &str, phone: &str, password: &str) -> String {
        let resp = self
            .client
            .post(self.url("/api/verify/send-email-otp"))
            .json(&json!({ "email": email }))
            .send()
            .await
            .expect("request email code");
        assert_eq!(resp.status(), StatusCode::OK, "email code request failed");

        let resp = self
            .client
            .post(self.url("/api/verify/send-phone-otp"))
            .json(&json!({ "phone": phone }))
            .send()
            .await
            .expect("request phone code");
        assert_eq!(resp.status(), StatusCode::OK, "phone code request failed");

        let email_otp = self
            .email_codes
            .last_code_for(email)
            .expect("recorded email code");
        let phone_otp = self
            .sms_codes
            .last_code_for(phone)
            .expect("recorded phone code");

        let resp = self
            .client
            .post(self.url("/api/verify/confirm"))
            .json(&json!({
                "email": email,
                "phone": phone,
                "password": password,
                "email_otp": email_otp,
                "phone_otp": phone_otp,
            }))
            .send()
            .await
            .expect("confirm signup");
        assert_eq!(resp.status(), StatusCode::OK, "signup confirm failed");

        self.login(email, password).await
    }

    /// Exchange credentials for a bearer token.
    pub async fn login(&self, email: &str, password: &str) -> String {
        let resp = self
            .client
            .post(self.url("/api/users/token"))
            .form(&[("username", email), ("password", password)])
            .send()
            .await
            .expect("send login form");
        assert_eq!(resp.status(), StatusCode::OK, "login failed");

        let body: Value = resp.json().await.expect("parse login response");
        body["access_token"]
            .as_str()
            .expect("access_token in response")
            .to_owned()
    }

    /// Create a product through the admin API. Returns its id.
    pub async fn create_product(
        &self,
        admin_token: &str,
        title: &str,
        price: &str,
        stock: i64,
    ) -> i64 {
        let resp = self
            .client
            .post(self.url("/api/products"))
            .bearer_auth(admin_token)
            .json(&json!({
                "title": title,
                "description": "integration test product",
                "price": price,
                "category": "Tops",
                "stock": stock,
                "sizes": ["S", "M", "L"],
            }))
            .send()
            .await
            .expect("create product");
        assert_eq!(resp.status(), StatusCode::OK, "product create failed");

        let body: Value = resp.json().await.expect("parse product response");
        body["id"].as_i64().expect("product id")
    }
}
