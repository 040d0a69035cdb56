use std::sync::Arc;

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::cookie::CookieJar;
use tracing::info;
use uuid::Uuid;

use chirp_db::Database;
use chirp_db::models::NewProfile;
use chirp_types::api::{MessageResponse, SignInRequest, SignUpRequest};

use crate::error::ApiError;
use crate::extract::JsonBody;
use crate::middleware::CurrentProfile;
use crate::password;
use crate::profiles::load_own_profile;
use crate::rows::now_timestamp;
use crate::session::{self, TokenIssuer};
use crate::validation::{normalize_email, validate_sign_up};
use crate::with_db;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub tokens: TokenIssuer,
    pub max_avatar_bytes: usize,
}

pub async fn sign_up(
    State(state): State<AppState>,
    jar: CookieJar,
    JsonBody(req): JsonBody<SignUpRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_sign_up(&req)?;

    let email = normalize_email(&req.email);
    let username = req.username.trim().to_string();

    let profile = with_db(&state, move |db| {
        if db.profile_exists(&email, &username)? {
            return Err(ApiError::Conflict("This user already exists".into()));
        }

        let password_hash = password::hash_password(&req.password)?;
        let id = Uuid::new_v4().to_string();
        let created = db.create_profile(&NewProfile {
            id: &id,
            username: &username,
            email: &email,
            password_hash: &password_hash,
            fname: req.fname.trim(),
            lname: req.lname.trim(),
            created_at: &now_timestamp(),
        })?;

        // Lost a race with a concurrent sign-up for the same identity.
        if !created {
            return Err(ApiError::Conflict("This user already exists".into()));
        }

        load_own_profile(db, &id)
    })
    .await?;

    let token = state.tokens.issue(profile.id)?;
    info!("Profile {} signed up", profile.username);

    Ok((StatusCode::CREATED, session::attach(jar, token), Json(profile)))
}

pub async fn sign_in(
    State(state): State<AppState>,
    jar: CookieJar,
    JsonBody(req): JsonBody<SignInRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let login = req.username.trim().to_string();
    let email = normalize_email(&login);

    let profile = with_db(&state, move |db| {
        let Some(row) = db.get_profile_by_login(&login, &email)? else {
            password::verify_without_account(&req.password);
            return Err(ApiError::invalid_credentials());
        };

        if !password::verify_password(&req.password, &row.password) {
            return Err(ApiError::invalid_credentials());
        }

        db.record_sign_in(&row.id, &now_timestamp())?;
        load_own_profile(db, &row.id)
    })
    .await?;

    let token = state.tokens.issue(profile.id)?;
    info!("Profile {} signed in", profile.username);

    Ok((session::attach(jar, token), Json(profile)))
}

/// The token itself cannot be revoked; this clears the server-side online
/// marker and tells the client to drop its cookie.
pub async fn sign_out(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentProfile>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    let id = current.id.to_string();
    with_db(&state, move |db| Ok(db.record_sign_out(&id)?)).await?;

    info!("Profile {} signed out", current.username);

    Ok((
        session::clear(jar),
        Json(MessageResponse {
            msg: "Successfully signed out.".into(),
        }),
    ))
}
