use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use tracing::warn;

use mental_maps_types::models::Role;

use crate::error::ApiError;
use crate::state::{AppState, run_blocking};

/// The authenticated caller, attached to request extensions by [`require_auth`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub id: String,
    pub role: Role,
}

impl Caller {
    pub fn is_moderator(&self) -> bool {
        self.role == Role::Moderator
    }
}

/// Pull the token out of `Authorization: Bearer <token>`. The scheme is
/// matched case-insensitively; anything after the token is ignored.
pub fn extract_bearer(header_value: &str) -> Option<&str> {
    let mut parts = header_value.split(' ');
    let scheme = parts.next()?;
    let token = parts.next()?.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return None;
    }
    Some(token)
}

/// Resolve the bearer token to a stored user.
///
/// The token *is* the user id: there is no signature, expiry or rotation.
/// Anyone who knows a user id can act as that user.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(extract_bearer)
        .map(str::to_string)
        .ok_or_else(|| ApiError::unauthorized("Missing or invalid authorization token"))?;

    let user = run_blocking(&state, move |db| db.get_user(&token))
        .await?
        .ok_or_else(|| ApiError::unauthorized("User not found (check the token)"))?;

    let role = Role::parse(&user.role).unwrap_or_else(|| {
        warn!("Unknown role '{}' on user '{}', treating as member", user.role, user.user_id);
        Role::Member
    });

    req.extensions_mut().insert(Caller {
        id: user.user_id,
        role,
    });
    Ok(next.run(req).await)
}
