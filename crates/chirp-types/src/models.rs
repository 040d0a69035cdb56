use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A profile as its owner sees it. Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub fname: String,
    pub lname: String,
    pub bio: String,
    pub has_avatar: bool,
    pub following: Vec<Uuid>,
    pub followers: Vec<Uuid>,
    pub bookmarks: Vec<Uuid>,
    pub online: bool,
    pub last_sign_in_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A profile as any other caller sees it.
///
/// Email, bookmarks and session state stay private to the owner;
/// the follow graph is public.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicProfile {
    pub id: Uuid,
    pub username: String,
    pub fname: String,
    pub lname: String,
    pub bio: String,
    pub has_avatar: bool,
    pub following: Vec<Uuid>,
    pub followers: Vec<Uuid>,
    pub following_count: usize,
    pub followers_count: usize,
    pub created_at: DateTime<Utc>,
}

impl From<OwnProfile> for PublicProfile {
    fn from(p: OwnProfile) -> Self {
        Self {
            id: p.id,
            username: p.username,
            fname: p.fname,
            lname: p.lname,
            bio: p.bio,
            has_avatar: p.has_avatar,
            following_count: p.following.len(),
            followers_count: p.followers.len(),
            following: p.following,
            followers: p.followers,
            created_at: p.created_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TweetKind {
    Tweet,
    Retweet,
    Reply,
}

impl TweetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tweet => "tweet",
            Self::Retweet => "retweet",
            Self::Reply => "reply",
        }
    }

    /// Retweets and replies point at another tweet.
    pub fn needs_parent(&self) -> bool {
        !matches!(self, Self::Tweet)
    }
}

impl fmt::Display for TweetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TweetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tweet" => Ok(Self::Tweet),
            "retweet" => Ok(Self::Retweet),
            "reply" => Ok(Self::Reply),
            other => Err(format!("unknown tweet type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tweet {
    pub id: Uuid,
    pub author_id: Uuid,
    #[serde(rename = "type")]
    pub kind: TweetKind,
    pub parent_id: Option<Uuid>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tweet_kind_parses_wire_names() {
        assert_eq!("retweet".parse::<TweetKind>().unwrap(), TweetKind::Retweet);
        assert!("quote".parse::<TweetKind>().is_err());
        assert!(TweetKind::Reply.needs_parent());
        assert!(!TweetKind::Tweet.needs_parent());
    }

    #[test]
    fn public_view_drops_private_fields() {
        let own = OwnProfile {
            id: Uuid::new_v4(),
            username: "ada".into(),
            email: "ada@example.com".into(),
            fname: "Ada".into(),
            lname: "Lovelace".into(),
            bio: String::new(),
            has_avatar: false,
            following: vec![Uuid::new_v4()],
            followers: vec![],
            bookmarks: vec![Uuid::new_v4()],
            online: true,
            last_sign_in_at: None,
            created_at: Utc::now(),
        };

        let public = PublicProfile::from(own);
        let json = serde_json::to_value(&public).unwrap();
        assert!(json.get("email").is_none());
        assert!(json.get("bookmarks").is_none());
        assert!(json.get("online").is_none());
        assert_eq!(json["following_count"], 1);
        assert_eq!(json["followers_count"], 0);
    }
}
