use std::time::Duration;

use anyhow::{Context, Result, bail};
use futures_util::future::BoxFuture;
use serde::Serialize;
use tracing::debug;

use crate::{MailTransport, OutgoingEmail};

const RESEND_API_URL: &str = "https://api.resend.com/emails";

/// Transport backed by the Resend HTTP API.
pub struct ResendTransport {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

#[derive(Serialize)]
struct SendEmailBody<'a> {
    from: &'a str,
    to: &'a [String],
    subject: &'a str,
    html: &'a str,
}

impl ResendTransport {
    pub fn new(api_key: String) -> Result<Self> {
        Self::with_endpoint(api_key, RESEND_API_URL.to_string())
    }

    pub fn with_endpoint(api_key: String, endpoint: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("building email HTTP client")?;

        Ok(Self {
            client,
            api_key,
            endpoint,
        })
    }

    async fn deliver(&self, email: OutgoingEmail) -> Result<()> {
        let body = SendEmailBody {
            from: &email.from,
            to: &email.to,
            subject: &email.subject,
            html: &email.html,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("email provider unreachable")?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            bail!("email provider returned {}: {}", status, text);
        }

        debug!("Email accepted by provider: {}", text);
        Ok(())
    }
}

impl MailTransport for ResendTransport {
    fn send(&self, email: OutgoingEmail) -> BoxFuture<'_, Result<()>> {
        Box::pin(self.deliver(email))
    }
}

#[cfg(test)]
mod tests {
    use axum::Router;
    use axum::http::{HeaderMap, StatusCode, header};
    use axum::routing::post;
    use axum::Json;
    use serde_json::{Value, json};
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;

    use super::*;

    async fn serve(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/emails", addr)
    }

    fn email() -> OutgoingEmail {
        OutgoingEmail {
            from: "site@teamacy.com".into(),
            to: vec!["inbox@teamacy.com".into()],
            subject: "New Enquiry – Teamacy".into(),
            html: "<p>hi</p>".into(),
        }
    }

    #[tokio::test]
    async fn posts_json_with_bearer_key() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let router = Router::new().route(
            "/emails",
            post(move |headers: HeaderMap, Json(body): Json<Value>| {
                let tx = tx.clone();
                async move {
                    let auth = headers
                        .get(header::AUTHORIZATION)
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    let _ = tx.send((auth, body));
                    Json(json!({ "id": "email-1" }))
                }
            }),
        );
        let endpoint = serve(router).await;

        let transport = ResendTransport::with_endpoint("re_test_key".into(), endpoint).unwrap();
        transport.send(email()).await.unwrap();

        let (auth, body) = rx.recv().await.unwrap();
        assert_eq!(auth.as_deref(), Some("Bearer re_test_key"));
        assert_eq!(
            body,
            json!({
                "from": "site@teamacy.com",
                "to": ["inbox@teamacy.com"],
                "subject": "New Enquiry – Teamacy",
                "html": "<p>hi</p>",
            })
        );
    }

    #[tokio::test]
    async fn provider_rejection_is_an_error() {
        let router = Router::new().route(
            "/emails",
            post(|| async { (StatusCode::UNPROCESSABLE_ENTITY, "invalid from address") }),
        );
        let endpoint = serve(router).await;

        let transport = ResendTransport::with_endpoint("re_test_key".into(), endpoint).unwrap();
        let err = transport.send(email()).await.unwrap_err();
        assert!(err.to_string().contains("422"), "{err}");
    }

    #[tokio::test]
    async fn unreachable_provider_is_an_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}/emails", listener.local_addr().unwrap());
        drop(listener);

        let transport = ResendTransport::with_endpoint("re_test_key".into(), endpoint).unwrap();
        assert!(transport.send(email()).await.is_err());
    }
}
