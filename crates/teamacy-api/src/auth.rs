use axum::{Extension, Json, extract::State};
use chrono::Utc;
use teamacy_db::{is_unique_violation, models::UserRow};
use teamacy_types::api::{LoginRequest, RegisterRequest, TokenResponse};
use teamacy_types::models::{Role, User};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{ApiError, AppJson};
use crate::middleware::CurrentUser;
use crate::password;
use crate::state::{AppState, blocking};
use crate::validate;

fn email_taken() -> ApiError {
    ApiError::Conflict("Email already exists".to_string())
}

pub async fn register(
    State(state): State<AppState>,
    AppJson(req): AppJson<RegisterRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let name = validate::required("name", &req.name)?;
    let email = validate::account_email(&req.email)?;
    if req.password.is_empty() {
        return Err(ApiError::Validation("password must not be empty".to_string()));
    }

    // Check if email is taken
    let db = state.clone();
    let lookup = email.clone();
    if blocking(move || db.db.get_user_by_email(&lookup)).await?.is_some() {
        return Err(email_taken());
    }

    let password = req.password;
    let password_hash = blocking(move || password::hash_password(&password)).await?;

    let user = User {
        id: Uuid::new_v4(),
        name,
        email,
        role: Role::User,
        created_at: Utc::now(),
    };

    // The unique index still catches a concurrent registration of the same email.
    let db = state.clone();
    let row = UserRow::from_user(&user, password_hash);
    match blocking(move || db.db.create_user(&row)).await {
        Ok(()) => {}
        Err(e) if is_unique_violation(&e) => return Err(email_taken()),
        Err(e) => return Err(e.into()),
    }

    info!("Registered user {} <{}>", user.id, user.email);

    let token = state.tokens.issue(user.id, user.role)?;
    Ok(Json(TokenResponse::bearer(token, user)))
}

pub async fn login(
    State(state): State<AppState>,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let email = validate::account_email(&req.email)?;

    let db = state.clone();
    let Some(row) = blocking(move || db.db.get_user_by_email(&email)).await? else {
        let password = req.password;
        blocking(move || Ok(password::verify_dummy(&password))).await?;
        return Err(ApiError::InvalidCredentials);
    };

    let password = req.password;
    let stored_hash = row.password_hash.clone();
    let valid = blocking(move || Ok(password::verify_password(&password, &stored_hash))).await?;
    if !valid {
        debug!("Wrong password for user {}", row.id);
        return Err(ApiError::InvalidCredentials);
    }

    let user = row.to_user()?;
    let token = state.tokens.issue(user.id, user.role)?;

    info!("User {} logged in", user.id);
    Ok(Json(TokenResponse::bearer(token, user)))
}

pub async fn me(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<User> {
    Json(user)
}
