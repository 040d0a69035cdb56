use chrono::{DateTime, SecondsFormat, Utc};
use tracing::warn;
use uuid::Uuid;

use chirp_db::models::TweetRow;
use chirp_types::models::{Tweet, TweetKind};

/// Fixed-width UTC timestamps so text ordering in SQLite matches time ordering.
pub(crate) fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(raw: &str, owner: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>().unwrap_or_else(|e| {
        warn!("Corrupt timestamp '{}' on '{}': {}", raw, owner, e);
        DateTime::default()
    })
}

pub(crate) fn parse_id(raw: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt id '{}': {}", raw, e);
        Uuid::default()
    })
}

pub(crate) fn parse_ids(raw: Vec<String>) -> Vec<Uuid> {
    raw.iter().map(|id| parse_id(id)).collect()
}

pub(crate) fn tweet_from_row(row: TweetRow) -> Tweet {
    let kind = row.kind.parse::<TweetKind>().unwrap_or_else(|e| {
        warn!("Corrupt kind on tweet '{}': {}", row.id, e);
        TweetKind::Tweet
    });

    Tweet {
        id: parse_id(&row.id),
        author_id: parse_id(&row.author_id),
        kind,
        parent_id: row.parent_id.as_deref().map(parse_id),
        content: row.content,
        created_at: parse_timestamp(&row.created_at, &row.id),
    }
}
