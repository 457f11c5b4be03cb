use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use teamacy_types::models::User;
use tracing::debug;

use crate::error::ApiError;
use crate::state::{AppState, blocking};

/// The authenticated caller, as currently stored. Inserted by [`require_auth`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Verify `token` and load its subject from the store. A valid signature for
/// a user that no longer exists is still rejected.
pub async fn resolve_user(state: &AppState, token: &str) -> Result<User, ApiError> {
    let claims = state.tokens.verify(token)?;

    let db = state.clone();
    let id = claims.sub.to_string();
    let row = blocking(move || db.db.get_user_by_id(&id)).await?;

    let row = row.ok_or_else(|| {
        debug!("Token subject {} no longer exists", claims.sub);
        ApiError::Unauthorized
    })?;

    Ok(row.to_user()?)
}

/// Extract and validate the bearer token, then attach the current user.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(req.headers())
        .ok_or(ApiError::Unauthorized)?
        .to_string();
    let user = resolve_user(&state, &token).await?;

    req.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(req).await)
}

/// Must run inside [`require_auth`]. Gates on the stored role, not the token's.
pub async fn require_admin(req: Request, next: Next) -> Result<Response, ApiError> {
    let CurrentUser(user) = req
        .extensions()
        .get::<CurrentUser>()
        .ok_or(ApiError::Unauthorized)?;

    if !user.is_admin() {
        debug!("User {} denied admin route {}", user.id, req.uri().path());
        return Err(ApiError::Forbidden);
    }

    Ok(next.run(req).await)
}

/// Identity for routes where signing in is optional. Any failure is anonymous.
pub async fn optional_user(state: &AppState, headers: &HeaderMap) -> Option<User> {
    let token = bearer_token(headers)?;
    match resolve_user(state, token).await {
        Ok(user) => Some(user),
        Err(e) => {
            debug!("Ignoring unusable token on public route: {}", e);
            None
        }
    }
}
