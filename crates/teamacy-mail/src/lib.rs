//! Outbound admin notifications for new contact messages.
//!
//! Delivery is best effort: [`AdminNotifier::spawn_notify`] hands the work to a
//! background task and only logs the outcome.

pub mod render;
pub mod resend;

use std::sync::Arc;

use anyhow::Result;
use futures_util::future::BoxFuture;
use teamacy_types::models::Message;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// A fully rendered email ready for a transport.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
}

/// Anything that can deliver one email per call.
pub trait MailTransport: Send + Sync {
    fn send(&self, email: OutgoingEmail) -> BoxFuture<'_, Result<()>>;
}

/// Transport used when no provider key is configured.
pub struct NoopTransport;

impl MailTransport for NoopTransport {
    fn send(&self, email: OutgoingEmail) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            debug!("Email delivery disabled, dropping '{}'", email.subject);
            Ok(())
        })
    }
}

#[derive(Clone)]
pub struct AdminNotifier {
    transport: Arc<dyn MailTransport>,
    sender: String,
    recipient: String,
}

impl AdminNotifier {
    pub fn new(transport: Arc<dyn MailTransport>, sender: String, recipient: String) -> Self {
        Self {
            transport,
            sender,
            recipient,
        }
    }

    pub fn disabled() -> Self {
        Self::new(Arc::new(NoopTransport), String::new(), String::new())
    }

    pub fn email_for(&self, message: &Message) -> OutgoingEmail {
        OutgoingEmail {
            from: self.sender.clone(),
            to: vec![self.recipient.clone()],
            subject: render::subject_line(message.kind),
            html: render::admin_email_html(message),
        }
    }

    pub async fn notify_admin(&self, message: &Message) -> Result<()> {
        self.transport.send(self.email_for(message)).await
    }

    /// Fire-and-forget delivery. The returned handle never yields an error;
    /// callers are free to drop it.
    pub fn spawn_notify(&self, message: Message) -> JoinHandle<()> {
        let notifier = self.clone();
        tokio::spawn(async move {
            match notifier.notify_admin(&message).await {
                Ok(()) => info!("Admin notified of message {}", message.id),
                Err(e) => error!("Email failed for message {}: {:#}", message.id, e),
            }
        })
    }
}
