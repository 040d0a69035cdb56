use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::TweetKind;

// -- Session token claims --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub iat: usize,
    pub exp: usize,
}

// -- Auth --

/// Missing fields deserialize as empty strings so the validator reports them
/// alongside every other failing rule.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignUpRequest {
    pub fname: String,
    pub lname: String,
    pub email: String,
    pub username: String,
    pub password: String,
    pub confirm: String,
}

/// `username` may hold either the username or the email address.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignInRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub msg: String,
}

// -- Profiles --

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EditProfileRequest {
    pub fname: Option<String>,
    pub lname: Option<String>,
    pub bio: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProfileQuery {
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UsernameQuery {
    pub username: String,
}

/// `id` is kept as text so a malformed reference is reported as an invalid
/// operation rather than a generic extractor rejection.
#[derive(Debug, Deserialize)]
pub struct BookmarkQuery {
    pub id: String,
}

// -- Tweets --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateTweetRequest {
    pub content: String,
    #[serde(rename = "type", default = "default_kind")]
    pub kind: TweetKind,
    pub parent_id: Option<Uuid>,
}

fn default_kind() -> TweetKind {
    TweetKind::Tweet
}

#[derive(Debug, Deserialize)]
pub struct TweetsQuery {
    pub author: String,
}

// -- Errors --

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorItem {
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub param: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub errors: Vec<ErrorItem>,
}
