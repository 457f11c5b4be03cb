use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{MessageKind, Role, User};

// -- JWT Claims --

/// Claims carried by every access token. The role is informational only;
/// authorization always re-reads the user from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub iat: usize,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: User,
}

impl TokenResponse {
    pub fn bearer(access_token: String, user: User) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
            user,
        }
    }
}

// -- Messages --

#[derive(Debug, Deserialize)]
pub struct SubmitMessageRequest {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    #[serde(rename = "type", default)]
    pub kind: Option<MessageKind>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitMessageResponse {
    pub status: String,
    pub id: Uuid,
}

// -- Misc --

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusMessage {
    pub message: String,
}

/// Body of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}
