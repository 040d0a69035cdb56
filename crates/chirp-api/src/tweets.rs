use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;
use uuid::Uuid;

use chirp_db::models::TweetRow;
use chirp_types::api::{CreateTweetRequest, TweetsQuery};
use chirp_types::models::Tweet;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::extract::{JsonBody, QueryParams};
use crate::middleware::CurrentProfile;
use crate::relationships::parse_tweet_ref;
use crate::rows::{now_timestamp, tweet_from_row};
use crate::validation::validate_tweet;
use crate::with_db;

/// POST /tweets — retweets and replies must name an existing parent.
pub async fn create_tweet(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentProfile>,
    JsonBody(req): JsonBody<CreateTweetRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_tweet(&req)?;

    match (req.kind.needs_parent(), req.parent_id) {
        (true, None) => {
            return Err(ApiError::InvalidOperation(format!(
                "A {} needs a parent_id",
                req.kind
            )));
        }
        (false, Some(_)) => {
            return Err(ApiError::InvalidOperation(
                "Only retweets and replies take a parent_id".into(),
            ));
        }
        _ => {}
    }

    let row = TweetRow {
        id: Uuid::new_v4().to_string(),
        author_id: current.id.to_string(),
        kind: req.kind.as_str().to_string(),
        parent_id: req.parent_id.map(|id| id.to_string()),
        content: req.content.trim().to_string(),
        created_at: now_timestamp(),
    };

    let tweet = with_db(&state, move |db| {
        if let Some(parent) = &row.parent_id {
            if db.get_tweet_by_id(parent)?.is_none() {
                return Err(ApiError::NotFound("Parent tweet not found".into()));
            }
        }
        db.insert_tweet(&row)?;
        Ok(tweet_from_row(row))
    })
    .await?;

    info!("Profile {} posted {} {}", current.username, tweet.kind, tweet.id);
    Ok((StatusCode::CREATED, Json(tweet)))
}

pub async fn get_tweet(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Tweet>, ApiError> {
    let id = parse_tweet_ref(&id)?.to_string();
    let row = with_db(&state, move |db| Ok(db.get_tweet_by_id(&id)?))
        .await?
        .ok_or_else(|| ApiError::NotFound("Tweet not found".into()))?;

    Ok(Json(tweet_from_row(row)))
}

/// GET /profile/tweets?author= — an author's tweets, newest first.
pub async fn list_tweets(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<TweetsQuery>,
) -> Result<Json<Vec<Tweet>>, ApiError> {
    let rows = with_db(&state, move |db| {
        let author = db
            .get_profile_by_username(query.author.trim())?
            .ok_or_else(|| ApiError::NotFound("Profile not found".into()))?;
        Ok(db.tweets_by_author(&author.id)?)
    })
    .await?;

    Ok(Json(rows.into_iter().map(tweet_from_row).collect()))
}
