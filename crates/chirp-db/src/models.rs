/// Database row types, mapped straight from SQLite rows.
/// Kept apart from chirp-types so the hash never reaches a serializable type.

pub struct ProfileRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub fname: String,
    pub lname: String,
    pub bio: String,
    pub has_avatar: bool,
    pub online: bool,
    pub last_sign_in_at: Option<String>,
    pub created_at: String,
}

pub struct NewProfile<'a> {
    pub id: &'a str,
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub fname: &'a str,
    pub lname: &'a str,
    pub created_at: &'a str,
}

/// Partial update; `None` leaves the column untouched.
#[derive(Default)]
pub struct ProfileEdit<'a> {
    pub fname: Option<&'a str>,
    pub lname: Option<&'a str>,
    pub bio: Option<&'a str>,
}

pub struct AvatarRow {
    pub bytes: Vec<u8>,
    pub mime: String,
}

pub struct TweetRow {
    pub id: String,
    pub author_id: String,
    pub kind: String,
    pub parent_id: Option<String>,
    pub content: String,
    pub created_at: String,
}
