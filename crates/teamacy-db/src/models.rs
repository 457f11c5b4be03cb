//! Database row types — these map directly to SQLite rows.
//! Distinct from teamacy-types API models to keep the DB layer independent.
use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use teamacy_types::models::{Message, User};

pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub password_hash: String,
    pub created_at: String,
}

pub struct MessageRow {
    pub id: String,
    pub kind: Option<String>,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub message_html: String,
    pub user_id: Option<String>,
    pub created_at: String,
}

/// Fixed-width UTC timestamps so that lexical order in SQL is chronological.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("corrupt timestamp '{}'", raw))?
        .with_timezone(&Utc))
}

impl UserRow {
    pub fn from_user(user: &User, password_hash: String) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role.as_str().to_string(),
            password_hash,
            created_at: format_timestamp(user.created_at),
        }
    }

    pub fn to_user(&self) -> Result<User> {
        Ok(User {
            id: self.id.parse().with_context(|| format!("corrupt user id '{}'", self.id))?,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role.parse().with_context(|| format!("corrupt role on user '{}'", self.id))?,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

impl MessageRow {
    pub fn from_message(msg: &Message) -> Self {
        Self {
            id: msg.id.to_string(),
            kind: msg.kind.map(|k| k.as_str().to_string()),
            name: msg.name.clone(),
            email: msg.email.clone(),
            subject: msg.subject.clone(),
            message: msg.message.clone(),
            message_html: msg.message_html.clone(),
            user_id: msg.user_id.map(|id| id.to_string()),
            created_at: format_timestamp(msg.created_at),
        }
    }

    pub fn to_message(&self) -> Result<Message> {
        let kind = match &self.kind {
            Some(raw) => Some(raw.parse().with_context(|| format!("corrupt kind on message '{}'", self.id))?),
            None => None,
        };
        let user_id = match &self.user_id {
            Some(raw) => Some(raw.parse().with_context(|| format!("corrupt user_id on message '{}'", self.id))?),
            None => None,
        };

        Ok(Message {
            id: self.id.parse().with_context(|| format!("corrupt message id '{}'", self.id))?,
            kind,
            name: self.name.clone(),
            email: self.email.clone(),
            subject: self.subject.clone(),
            message: self.message.clone(),
            message_html: self.message_html.clone(),
            user_id,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}
