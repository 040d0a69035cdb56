use axum::{
    Extension, Json,
    body::Bytes,
    extract::{State, rejection::BytesRejection},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::info;

use chirp_db::Database;
use chirp_db::models::{ProfileEdit, ProfileRow};
use chirp_types::api::{EditProfileRequest, ProfileQuery, UsernameQuery};
use chirp_types::models::{OwnProfile, PublicProfile};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::extract::{JsonBody, QueryParams};
use crate::middleware::CurrentProfile;
use crate::relationships;
use crate::rows::{parse_id, parse_ids, parse_timestamp};
use crate::validation::validate_profile_edit;
use crate::with_db;

/// Assemble the owner view of a profile, graph edges included.
/// The password hash stays behind in the row.
pub fn load_own_profile(db: &Database, id: &str) -> Result<OwnProfile, ApiError> {
    let row = db
        .get_profile_by_id(id)?
        .ok_or_else(|| ApiError::NotFound("Profile not found".into()))?;
    own_profile(db, row)
}

fn own_profile(db: &Database, row: ProfileRow) -> Result<OwnProfile, ApiError> {
    let following = parse_ids(db.following_ids(&row.id)?);
    let followers = parse_ids(db.follower_ids(&row.id)?);
    let bookmarks = parse_ids(db.bookmark_ids(&row.id)?);

    Ok(OwnProfile {
        id: parse_id(&row.id),
        created_at: parse_timestamp(&row.created_at, &row.id),
        last_sign_in_at: row
            .last_sign_in_at
            .as_deref()
            .map(|raw| parse_timestamp(raw, &row.id)),
        username: row.username,
        email: row.email,
        fname: row.fname,
        lname: row.lname,
        bio: row.bio,
        has_avatar: row.has_avatar,
        online: row.online,
        following,
        followers,
        bookmarks,
    })
}

fn find_by_username(db: &Database, username: &str) -> Result<ProfileRow, ApiError> {
    db.get_profile_by_username(username.trim())?
        .ok_or_else(|| ApiError::NotFound("Profile not found".into()))
}

/// GET /profile?username= — one profile, or every profile when omitted.
pub async fn get_profile(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ProfileQuery>,
) -> Result<Response, ApiError> {
    match query.username {
        Some(username) => {
            let profile = with_db(&state, move |db| {
                let row = find_by_username(db, &username)?;
                Ok(PublicProfile::from(own_profile(db, row)?))
            })
            .await?;
            Ok(Json(profile).into_response())
        }
        None => {
            let profiles = with_db(&state, |db| {
                db.list_profiles()?
                    .into_iter()
                    .map(|row| own_profile(db, row).map(PublicProfile::from))
                    .collect::<Result<Vec<_>, _>>()
            })
            .await?;
            Ok(Json(profiles).into_response())
        }
    }
}

pub async fn current_profile(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentProfile>,
) -> Result<Json<OwnProfile>, ApiError> {
    let id = current.id.to_string();
    let profile = with_db(&state, move |db| load_own_profile(db, &id)).await?;
    Ok(Json(profile))
}

pub async fn edit_profile(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentProfile>,
    JsonBody(req): JsonBody<EditProfileRequest>,
) -> Result<Json<OwnProfile>, ApiError> {
    validate_profile_edit(&req)?;

    let id = current.id.to_string();
    let profile = with_db(&state, move |db| {
        db.update_profile(
            &id,
            &ProfileEdit {
                fname: req.fname.as_deref().map(str::trim),
                lname: req.lname.as_deref().map(str::trim),
                bio: req.bio.as_deref().map(str::trim),
            },
        )?;
        load_own_profile(db, &id)
    })
    .await?;

    Ok(Json(profile))
}

/// Raster formats only; SVG can carry script.
pub const AVATAR_TYPES: [&str; 4] = ["image/png", "image/jpeg", "image/gif", "image/webp"];

/// PUT /profile/me/avatar — raw image body, typed by `Content-Type`.
pub async fn upload_avatar(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentProfile>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<OwnProfile>, ApiError> {
    let body = body?;
    let mime = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|v| v.trim().to_ascii_lowercase())
        .unwrap_or_default();

    if !AVATAR_TYPES.contains(&mime.as_str()) {
        return Err(ApiError::InvalidOperation(
            "Avatar must be a PNG, JPEG, GIF or WebP image".into(),
        ));
    }
    if body.is_empty() {
        return Err(ApiError::InvalidOperation("Avatar is empty".into()));
    }
    if body.len() > state.max_avatar_bytes {
        return Err(ApiError::Rejected(
            StatusCode::PAYLOAD_TOO_LARGE,
            "Avatar is too large".into(),
        ));
    }

    let id = current.id.to_string();
    let size = body.len();
    let profile = with_db(&state, move |db| {
        db.set_avatar(&id, &body, &mime)?;
        load_own_profile(db, &id)
    })
    .await?;

    info!("Profile {} changed avatar ({} bytes)", current.username, size);
    Ok(Json(profile))
}

pub async fn get_avatar(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<UsernameQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let avatar = with_db(&state, move |db| Ok(db.get_avatar_by_username(query.username.trim())?))
        .await?
        .ok_or_else(|| ApiError::NotFound("Avatar not found".into()))?;

    Ok((
        [
            (header::CONTENT_TYPE, avatar.mime),
            (header::X_CONTENT_TYPE_OPTIONS, "nosniff".to_string()),
        ],
        avatar.bytes,
    ))
}

/// POST /profile/follow?username= — answers with the followed profile.
pub async fn follow(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentProfile>,
    QueryParams(query): QueryParams<UsernameQuery>,
) -> Result<Json<PublicProfile>, ApiError> {
    let actor_id = current.id.to_string();
    let target = with_db(&state, move |db| {
        let target = find_by_username(db, &query.username)?;
        relationships::follow(db, &actor_id, &target.id)?;
        Ok(PublicProfile::from(own_profile(db, target)?))
    })
    .await?;

    Ok(Json(target))
}

/// POST /profile/unfollow?username= — answers with the unfollowed profile.
pub async fn unfollow(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentProfile>,
    QueryParams(query): QueryParams<UsernameQuery>,
) -> Result<Json<PublicProfile>, ApiError> {
    let actor_id = current.id.to_string();
    let target = with_db(&state, move |db| {
        let target = find_by_username(db, &query.username)?;
        relationships::unfollow(db, &actor_id, &target.id)?;
        Ok(PublicProfile::from(own_profile(db, target)?))
    })
    .await?;

    Ok(Json(target))
}
