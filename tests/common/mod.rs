//! In-process server for end-to-end tests.
#![allow(dead_code)]

use collabex::config::Config;
use collabex::db;
use collabex::routes;
use collabex::state::AppState;
use reqwest::Client;
use serde_json::{json, Value};
use tempfile::TempDir;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

pub struct TestServer {
    pub base: String,
    pub client: Client,
    _data_dir: TempDir,
}

impl TestServer {
    /// Serve the real router on an ephemeral port with a file-backed database.
    pub async fn spawn() -> TestServer {
        Self::spawn_with(|_| {}).await
    }

    pub async fn spawn_with(tweak: impl FnOnce(&mut Config)) -> TestServer {
        let data_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.auth.bcrypt_cost = 4;
        config.resolve_paths(data_dir.path());
        tweak(&mut config);

        let pool = db::create_pool(&config.db_path()).expect("Failed to create test database");
        db::run_migrations(&pool).expect("Failed to run migrations");
        let app = routes::app(AppState::new(pool, config));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        TestServer {
            base: format!("http://{}", addr),
            client: Client::new(),
            _data_dir: data_dir,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// Register a user and return their bearer token and id.
    pub async fn register(&self, name: &str) -> (String, String) {
        let body: Value = self
            .client
            .post(self.url("/api/auth/register"))
            .json(&json!({
                "name": name,
                "email": format!("{}@example.com", name.to_lowercase()),
                "password": "secret-pw"
            }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        (
            body["token"].as_str().unwrap().to_string(),
            body["user"]["id"].as_str().unwrap().to_string(),
        )
    }

    /// Create a Math/Beginner exercise and return its id.
    pub async fn create_exercise(&self, token: &str, title: &str) -> String {
        let response = self
            .client
            .post(self.url("/api/exercises"))
            .bearer_auth(token)
            .json(&json!({
                "title": title,
                "description": "Work it out",
                "subject": "Math",
                "difficulty": "Beginner",
                "tags": ["algebra"]
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201);
        let body: Value = response.json().await.unwrap();
        body["id"].as_str().unwrap().to_string()
    }

    pub async fn get_json(&self, token: Option<&str>, path: &str) -> (u16, Value) {
        let mut request = self.client.get(self.url(path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await.unwrap();
        let status = response.status().as_u16();
        (status, response.json().await.unwrap_or(Value::Null))
    }
}
