use axum::{
    Extension, Json,
    extract::State,
};

use chirp_types::api::BookmarkQuery;
use chirp_types::models::{OwnProfile, Tweet};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::extract::QueryParams;
use crate::middleware::CurrentProfile;
use crate::profiles::load_own_profile;
use crate::relationships::{self, parse_tweet_ref};
use crate::rows::tweet_from_row;
use crate::with_db;

/// GET /profile/bookmarks — bookmarked tweets and retweets, newest first.
pub async fn list_bookmarks(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentProfile>,
) -> Result<Json<Vec<Tweet>>, ApiError> {
    let id = current.id.to_string();
    let tweets = with_db(&state, move |db| Ok(db.list_bookmarked_tweets(&id)?)).await?;

    Ok(Json(tweets.into_iter().map(tweet_from_row).collect()))
}

pub async fn add_bookmark(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentProfile>,
    QueryParams(query): QueryParams<BookmarkQuery>,
) -> Result<Json<OwnProfile>, ApiError> {
    let tweet_id = parse_tweet_ref(&query.id)?;
    let id = current.id.to_string();

    let profile = with_db(&state, move |db| {
        relationships::add_bookmark(db, &id, tweet_id)?;
        load_own_profile(db, &id)
    })
    .await?;

    Ok(Json(profile))
}

pub async fn remove_bookmark(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentProfile>,
    QueryParams(query): QueryParams<BookmarkQuery>,
) -> Result<Json<OwnProfile>, ApiError> {
    let tweet_id = parse_tweet_ref(&query.id)?;
    let id = current.id.to_string();

    let profile = with_db(&state, move |db| {
        relationships::remove_bookmark(db, &id, tweet_id)?;
        load_own_profile(db, &id)
    })
    .await?;

    Ok(Json(profile))
}
