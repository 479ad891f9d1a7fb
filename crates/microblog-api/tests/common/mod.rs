//! Shared harness for end-to-end tests: a real listener on an ephemeral
//! port backed by a throwaway database file.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use microblog_api::mail::{MailConfig, Mailer, ResetEmail};
use microblog_api::{AppState, AppStateInner, router};
use microblog_auth::{AuthConfig, CredentialStore};
use microblog_db::Database;
use reqwest::{Response, StatusCode};
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::net::TcpListener;

pub const SECRET: &str = "test-secret-key";

/// Keeps outgoing mail so tests can read reset links.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<ResetEmail>>,
}

impl Mailer for RecordingMailer {
    fn send(&self, mail: &ResetEmail) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(mail.clone());
        Ok(())
    }
}

pub struct TestServer {
    pub base: String,
    pub state: AppState,
    pub mailer: Arc<RecordingMailer>,
    pub client: reqwest::Client,
    _temp_dir: TempDir,
}

impl TestServer {
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::open(&temp_dir.path().join("test.db")).unwrap();
        let mailer = Arc::new(RecordingMailer::default());

        let state: AppState = Arc::new(AppStateInner {
            db,
            credentials: CredentialStore::new(AuthConfig::new(SECRET)),
            mailer: mailer.clone(),
            mail: MailConfig {
                sender: "no-reply@microblog.test".into(),
                base_url: "http://microblog.test".into(),
            },
            posts_per_page: 5,
        });

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base: format!("http://{addr}"),
            state,
            mailer,
            client: reqwest::Client::new(),
            _temp_dir: temp_dir,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub async fn register(&self, username: &str, password: &str) -> Response {
        self.client
            .post(self.url("/auth/register"))
            .json(&json!({
                "username": username,
                "email": format!("{username}@example.com"),
                "password": password,
                "repeat_password": password,
            }))
            .send()
            .await
            .unwrap()
    }

    pub async fn login(&self, username: &str, password: &str) -> Response {
        self.client
            .post(self.url("/auth/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .unwrap()
    }

    /// Register and log in, returning the session token.
    pub async fn signup(&self, username: &str) -> String {
        assert_eq!(self.register(username, "password123").await.status(), StatusCode::CREATED);
        let res = self.login(username, "password123").await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    pub async fn get(&self, token: &str, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .unwrap()
    }

    pub async fn post(&self, token: &str, path: &str, body: Value) -> Response {
        self.client
            .post(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    pub async fn put(&self, token: &str, path: &str, body: Value) -> Response {
        self.client
            .put(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    /// Token embedded in the most recent reset mail.
    pub fn last_reset_token(&self) -> String {
        let sent = self.mailer.sent.lock().unwrap();
        let mail = sent.last().expect("no mail was sent");
        mail.text_body
            .split("token=")
            .nth(1)
            .and_then(|rest| rest.split_whitespace().next())
            .expect("reset link missing from mail")
            .to_string()
    }
}

pub async fn json_body(res: Response) -> Value {
    res.json().await.unwrap()
}
