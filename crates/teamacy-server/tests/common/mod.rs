#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use futures_util::future::BoxFuture;
use http_body_util::BodyExt;
use jsonwebtoken::Algorithm;
use serde_json::{Value, json};
use teamacy_api::bootstrap::{self, AdminSeed};
use teamacy_api::token::TokenKeys;
use teamacy_api::{AppState, AppStateInner};
use teamacy_db::Database;
use teamacy_mail::{AdminNotifier, MailTransport, OutgoingEmail};
use teamacy_server::config::CorsOrigins;
use teamacy_server::router::build_router;
use tokio::sync::mpsc;
use tower::ServiceExt;

pub const ADMIN_EMAIL: &str = "admin@teamacy.com";
pub const ADMIN_PASSWORD: &str = "teamacy-admin";

/// Hands every email to the test through a channel.
pub struct Recorder(mpsc::UnboundedSender<OutgoingEmail>);

impl MailTransport for Recorder {
    fn send(&self, email: OutgoingEmail) -> BoxFuture<'_, anyhow::Result<()>> {
        let _ = self.0.send(email);
        Box::pin(async { Ok(()) })
    }
}

/// Always fails, like a provider outage.
pub struct Outage;

impl MailTransport for Outage {
    fn send(&self, _email: OutgoingEmail) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(async { Err(anyhow::anyhow!("503 from provider")) })
    }
}

pub struct TestApp {
    pub state: AppState,
    pub router: Router,
    pub outbox: mpsc::UnboundedReceiver<OutgoingEmail>,
}

pub fn admin_seed() -> AdminSeed {
    AdminSeed {
        name: "Teamacy Admin".into(),
        email: ADMIN_EMAIL.into(),
        password: ADMIN_PASSWORD.into(),
    }
}

pub fn keys() -> TokenKeys {
    TokenKeys::new("integration-secret", Algorithm::HS256, 24).unwrap()
}

impl TestApp {
    pub fn new() -> Self {
        let (tx, outbox) = mpsc::unbounded_channel();
        let notifier = AdminNotifier::new(
            Arc::new(Recorder(tx)),
            "site@teamacy.com".into(),
            "inbox@teamacy.com".into(),
        );
        Self::with_notifier(notifier, outbox)
    }

    pub fn with_broken_mail() -> Self {
        let (_tx, outbox) = mpsc::unbounded_channel();
        let notifier = AdminNotifier::new(Arc::new(Outage), "a@x.com".into(), "b@x.com".into());
        Self::with_notifier(notifier, outbox)
    }

    fn with_notifier(notifier: AdminNotifier, outbox: mpsc::UnboundedReceiver<OutgoingEmail>) -> Self {
        let db = Database::open_in_memory().unwrap();
        bootstrap::ensure_admin(&db, &admin_seed()).unwrap();

        let state = AppStateInner::new(db, keys(), notifier);
        let router = build_router(state.clone(), &CorsOrigins::Any);
        Self { state, router, outbox }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self.router.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> (StatusCode, Value) {
        self.post(
            "/api/auth/register",
            None,
            json!({ "name": name, "email": email, "password": password }),
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.post("/api/auth/login", None, json!({ "email": email, "password": password }))
            .await
    }

    pub async fn admin_token(&self) -> String {
        let (status, body) = self.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;
        assert_eq!(status, StatusCode::OK, "admin login failed: {body}");
        body["access_token"].as_str().unwrap().to_string()
    }

    pub async fn user_token(&self) -> String {
        let (status, body) = self.register("Ann", "ann@x.com", "p1").await;
        assert_eq!(status, StatusCode::OK, "registration failed: {body}");
        body["access_token"].as_str().unwrap().to_string()
    }

    pub async fn next_email(&mut self) -> OutgoingEmail {
        tokio::time::timeout(Duration::from_secs(5), self.outbox.recv())
            .await
            .expect("no email within 5s")
            .expect("outbox closed")
    }
}

pub fn contact(subject: &str, message: &str) -> Value {
    json!({
        "name": "Bob",
        "email": "bob@x.com",
        "subject": subject,
        "message": message,
    })
}
