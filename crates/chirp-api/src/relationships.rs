//! Idempotent set-membership edits on the follow graph and bookmarks.
//!
//! Every edit is one atomic statement in the store. Repeating an edit that
//! is already in effect succeeds without changing anything; the returned
//! flag says whether membership actually changed.

use tracing::debug;
use uuid::Uuid;

use chirp_db::Database;

use crate::error::ApiError;
use crate::rows::now_timestamp;

pub fn follow(db: &Database, actor_id: &str, target_id: &str) -> Result<bool, ApiError> {
    if actor_id == target_id {
        return Err(ApiError::InvalidOperation("You cannot follow yourself".into()));
    }

    let changed = db.follow(actor_id, target_id, &now_timestamp())?;
    debug!("follow {} -> {} (changed: {})", actor_id, target_id, changed);
    Ok(changed)
}

pub fn unfollow(db: &Database, actor_id: &str, target_id: &str) -> Result<bool, ApiError> {
    let changed = db.unfollow(actor_id, target_id)?;
    debug!("unfollow {} -> {} (changed: {})", actor_id, target_id, changed);
    Ok(changed)
}

/// Fails with `NotFound` when the tweet does not exist.
pub fn add_bookmark(db: &Database, profile_id: &str, tweet_id: Uuid) -> Result<bool, ApiError> {
    let tweet_id = tweet_id.to_string();
    if db.get_tweet_by_id(&tweet_id)?.is_none() {
        return Err(ApiError::NotFound("Tweet not found".into()));
    }

    let changed = db.add_bookmark(profile_id, &tweet_id, &now_timestamp())?;
    debug!("bookmark {} by {} (changed: {})", tweet_id, profile_id, changed);
    Ok(changed)
}

pub fn remove_bookmark(db: &Database, profile_id: &str, tweet_id: Uuid) -> Result<bool, ApiError> {
    let tweet_id = tweet_id.to_string();
    let changed = db.remove_bookmark(profile_id, &tweet_id)?;
    debug!("unbookmark {} by {} (changed: {})", tweet_id, profile_id, changed);
    Ok(changed)
}

/// Parse a client-supplied tweet reference.
pub fn parse_tweet_ref(raw: &str) -> Result<Uuid, ApiError> {
    raw.trim()
        .parse()
        .map_err(|_| ApiError::InvalidOperation("Malformed tweet id".into()))
}
