use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use uuid::Uuid;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::session;
use crate::with_db;

/// The authenticated caller, inserted into request extensions by [`require_auth`].
#[derive(Debug, Clone)]
pub struct CurrentProfile {
    pub id: Uuid,
    pub username: String,
}

/// Resolve the session token to an existing profile, or answer 401.
pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let profile_id = session::extract_token(&jar, req.headers())
        .and_then(|token| state.tokens.verify(&token))
        .ok_or_else(ApiError::unauthenticated)?;

    // A valid token may outlive its profile row.
    let id = profile_id.to_string();
    let row = with_db(&state, move |db| Ok(db.get_profile_by_id(&id)?))
        .await?
        .ok_or_else(ApiError::unauthenticated)?;

    req.extensions_mut().insert(CurrentProfile {
        id: profile_id,
        username: row.username,
    });
    Ok(next.run(req).await)
}
