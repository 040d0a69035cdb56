use crate::models::{AvatarRow, NewProfile, ProfileEdit, ProfileRow, TweetRow};
use crate::Database;
use anyhow::Result;
use rusqlite::{Connection, Row};

const PROFILE_COLUMNS: &str = "id, username, email, password, fname, lname, bio, \
     avatar IS NOT NULL, online, last_sign_in_at, created_at";

const TWEET_COLUMNS: &str = "id, author_id, kind, parent_id, content, created_at";

impl Database {
    // -- Profiles --

    /// Insert a profile. Returns `false` when the username or email is
    /// already taken, so a concurrent duplicate sign-up cannot slip through.
    pub fn create_profile(&self, profile: &NewProfile<'_>) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let inserted = conn.execute(
                "INSERT INTO profiles (id, username, email, password, fname, lname, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT DO NOTHING",
                rusqlite::params![
                    profile.id,
                    profile.username,
                    profile.email,
                    profile.password_hash,
                    profile.fname,
                    profile.lname,
                    profile.created_at,
                ],
            )?;
            Ok(inserted == 1)
        })
    }

    /// True when either value is already in use as a username or an email,
    /// so one account's login can never resolve to another.
    pub fn profile_exists(&self, email: &str, username: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let found: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM profiles
                     WHERE username IN (?1, ?2) OR email IN (?1, ?2)
                     LIMIT 1",
                    (email, username),
                    |row| row.get(0),
                )
                .optional()?;
            Ok(found.is_some())
        })
    }

    pub fn get_profile_by_id(&self, id: &str) -> Result<Option<ProfileRow>> {
        self.with_conn(|conn| query_profile(conn, "id = ?1", id))
    }

    pub fn get_profile_by_username(&self, username: &str) -> Result<Option<ProfileRow>> {
        self.with_conn(|conn| query_profile(conn, "username = ?1", username))
    }

    /// Sign-in lookup: `login` may be either the username or the email.
    /// An exact username match wins over an email match.
    pub fn get_profile_by_login(&self, login: &str, email: &str) -> Result<Option<ProfileRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {PROFILE_COLUMNS} FROM profiles
                 WHERE username = ?1 OR email = ?2
                 ORDER BY username = ?1 DESC
                 LIMIT 1"
            );
            let row = conn
                .query_row(&sql, (login, email), map_profile)
                .optional()?;
            Ok(row)
        })
    }

    pub fn list_profiles(&self) -> Result<Vec<ProfileRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles ORDER BY created_at");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], map_profile)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn record_sign_in(&self, id: &str, at: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE profiles SET online = 1, last_sign_in_at = ?2 WHERE id = ?1",
                (id, at),
            )?;
            Ok(())
        })
    }

    pub fn record_sign_out(&self, id: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute("UPDATE profiles SET online = 0 WHERE id = ?1", [id])?;
            Ok(())
        })
    }

    pub fn update_profile(&self, id: &str, edit: &ProfileEdit<'_>) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let updated = conn.execute(
                "UPDATE profiles
                 SET fname = COALESCE(?2, fname),
                     lname = COALESCE(?3, lname),
                     bio   = COALESCE(?4, bio)
                 WHERE id = ?1",
                rusqlite::params![id, edit.fname, edit.lname, edit.bio],
            )?;
            Ok(updated == 1)
        })
    }

    pub fn set_avatar(&self, id: &str, bytes: &[u8], mime: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let updated = conn.execute(
                "UPDATE profiles SET avatar = ?2, avatar_mime = ?3 WHERE id = ?1",
                rusqlite::params![id, bytes, mime],
            )?;
            Ok(updated == 1)
        })
    }

    pub fn get_avatar_by_username(&self, username: &str) -> Result<Option<AvatarRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT avatar, avatar_mime FROM profiles
                     WHERE username = ?1 AND avatar IS NOT NULL",
                    [username],
                    |row| {
                        Ok(AvatarRow {
                            bytes: row.get(0)?,
                            mime: row
                                .get::<_, Option<String>>(1)?
                                .unwrap_or_else(|| "application/octet-stream".to_string()),
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }

    // -- Follow graph --

    /// Record `follower -> followee`. A single edge row backs both sides of
    /// the relationship. Returns `true` only when the edge was new.
    pub fn follow(&self, follower_id: &str, followee_id: &str, at: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let inserted = conn.execute(
                "INSERT INTO follows (follower_id, followee_id, created_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT (follower_id, followee_id) DO NOTHING",
                (follower_id, followee_id, at),
            )?;
            Ok(inserted == 1)
        })
    }

    /// Returns `true` only when an edge was actually removed.
    pub fn unfollow(&self, follower_id: &str, followee_id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let removed = conn.execute(
                "DELETE FROM follows WHERE follower_id = ?1 AND followee_id = ?2",
                (follower_id, followee_id),
            )?;
            Ok(removed == 1)
        })
    }

    pub fn is_following(&self, follower_id: &str, followee_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let found: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM follows WHERE follower_id = ?1 AND followee_id = ?2",
                    (follower_id, followee_id),
                    |row| row.get(0),
                )
                .optional()?;
            Ok(found.is_some())
        })
    }

    pub fn following_ids(&self, profile_id: &str) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            query_ids(
                conn,
                "SELECT followee_id FROM follows WHERE follower_id = ?1 ORDER BY created_at",
                profile_id,
            )
        })
    }

    pub fn follower_ids(&self, profile_id: &str) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            query_ids(
                conn,
                "SELECT follower_id FROM follows WHERE followee_id = ?1 ORDER BY created_at",
                profile_id,
            )
        })
    }

    // -- Bookmarks --

    pub fn add_bookmark(&self, profile_id: &str, tweet_id: &str, at: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let inserted = conn.execute(
                "INSERT INTO bookmarks (profile_id, tweet_id, created_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT (profile_id, tweet_id) DO NOTHING",
                (profile_id, tweet_id, at),
            )?;
            Ok(inserted == 1)
        })
    }

    pub fn remove_bookmark(&self, profile_id: &str, tweet_id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let removed = conn.execute(
                "DELETE FROM bookmarks WHERE profile_id = ?1 AND tweet_id = ?2",
                (profile_id, tweet_id),
            )?;
            Ok(removed == 1)
        })
    }

    pub fn bookmark_ids(&self, profile_id: &str) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            query_ids(
                conn,
                "SELECT tweet_id FROM bookmarks WHERE profile_id = ?1 ORDER BY created_at",
                profile_id,
            )
        })
    }

    /// Bookmarked tweets and retweets (replies excluded), newest first.
    pub fn list_bookmarked_tweets(&self, profile_id: &str) -> Result<Vec<TweetRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT t.id, t.author_id, t.kind, t.parent_id, t.content, t.created_at
                 FROM tweets t
                 JOIN bookmarks b ON b.tweet_id = t.id
                 WHERE b.profile_id = ?1
                   AND t.kind IN ('tweet', 'retweet')
                 ORDER BY t.created_at DESC",
            )?;
            let rows = stmt
                .query_map([profile_id], map_tweet)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Tweets --

    pub fn insert_tweet(&self, tweet: &TweetRow) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO tweets (id, author_id, kind, parent_id, content, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    tweet.id,
                    tweet.author_id,
                    tweet.kind,
                    tweet.parent_id,
                    tweet.content,
                    tweet.created_at,
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_tweet_by_id(&self, id: &str) -> Result<Option<TweetRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {TWEET_COLUMNS} FROM tweets WHERE id = ?1");
            let row = conn.query_row(&sql, [id], map_tweet).optional()?;
            Ok(row)
        })
    }

    pub fn tweets_by_author(&self, author_id: &str) -> Result<Vec<TweetRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {TWEET_COLUMNS} FROM tweets WHERE author_id = ?1 ORDER BY created_at DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([author_id], map_tweet)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn query_profile(conn: &Connection, filter: &str, value: &str) -> Result<Option<ProfileRow>> {
    let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE {filter}");
    let row = conn.query_row(&sql, [value], map_profile).optional()?;
    Ok(row)
}

fn query_ids(conn: &Connection, sql: &str, key: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(sql)?;
    let ids = stmt
        .query_map([key], |row| row.get(0))?
        .collect::<std::result::Result<Vec<String>, _>>()?;
    Ok(ids)
}

fn map_profile(row: &Row<'_>) -> rusqlite::Result<ProfileRow> {
    Ok(ProfileRow {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        fname: row.get(4)?,
        lname: row.get(5)?,
        bio: row.get(6)?,
        has_avatar: row.get(7)?,
        online: row.get(8)?,
        last_sign_in_at: row.get(9)?,
        created_at: row.get(10)?,
    })
}

fn map_tweet(row: &Row<'_>) -> rusqlite::Result<TweetRow> {
    Ok(TweetRow {
        id: row.get(0)?,
        author_id: row.get(1)?,
        kind: row.get(2)?,
        parent_id: row.get(3)?,
        content: row.get(4)?,
        created_at: row.get(5)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    const T0: &str = "2024-05-01T10:00:00.000000Z";

    fn seed_profile(db: &Database, username: &str) -> String {
        let id = Uuid::new_v4().to_string();
        let email = format!("{username}@example.com");
        let created = db
            .create_profile(&NewProfile {
                id: &id,
                username,
                email: &email,
                password_hash: "$argon2id$stub",
                fname: "First",
                lname: "Last",
                created_at: T0,
            })
            .unwrap();
        assert!(created);
        id
    }

    fn seed_tweet(db: &Database, author: &str, kind: &str, created_at: &str) -> String {
        let id = Uuid::new_v4().to_string();
        db.insert_tweet(&TweetRow {
            id: id.clone(),
            author_id: author.to_string(),
            kind: kind.to_string(),
            parent_id: None,
            content: format!("{kind} at {created_at}"),
            created_at: created_at.to_string(),
        })
        .unwrap();
        id
    }

    #[test]
    fn duplicate_username_or_email_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        seed_profile(&db, "ada");

        let taken_username = db
            .create_profile(&NewProfile {
                id: &Uuid::new_v4().to_string(),
                username: "ada",
                email: "other@example.com",
                password_hash: "x",
                fname: "A",
                lname: "B",
                created_at: T0,
            })
            .unwrap();
        assert!(!taken_username);

        let taken_email = db
            .create_profile(&NewProfile {
                id: &Uuid::new_v4().to_string(),
                username: "grace",
                email: "ada@example.com",
                password_hash: "x",
                fname: "A",
                lname: "B",
                created_at: T0,
            })
            .unwrap();
        assert!(!taken_email);

        assert_eq!(db.list_profiles().unwrap().len(), 1);
        assert!(db.profile_exists("ada@example.com", "nobody").unwrap());
        assert!(db.profile_exists("nobody@example.com", "ada").unwrap());
        assert!(!db.profile_exists("nobody@example.com", "nobody").unwrap());
    }

    #[test]
    fn login_lookup_matches_username_or_email() {
        let db = Database::open_in_memory().unwrap();
        let id = seed_profile(&db, "ada");

        let by_name = db.get_profile_by_login("ada", "ada").unwrap().unwrap();
        assert_eq!(by_name.id, id);
        let by_email = db
            .get_profile_by_login("ada@example.com", "ada@example.com")
            .unwrap()
            .unwrap();
        assert_eq!(by_email.id, id);
        assert!(db.get_profile_by_login("grace", "grace").unwrap().is_none());
    }

    #[test]
    fn usernames_and_emails_share_one_namespace() {
        let db = Database::open_in_memory().unwrap();
        seed_profile(&db, "ada");

        // A new username equal to an existing email, and the reverse.
        assert!(db.profile_exists("grace@example.com", "ada@example.com").unwrap());
        assert!(db.profile_exists("ada", "grace").unwrap());
    }

    #[test]
    fn login_prefers_an_exact_username_match() {
        let db = Database::open_in_memory().unwrap();
        let ada = seed_profile(&db, "ada");
        // Rows written before the namespace check existed can still collide.
        let squatter = Uuid::new_v4().to_string();
        db.create_profile(&NewProfile {
            id: &squatter,
            username: "ada@example.com",
            email: "squatter@example.com",
            password_hash: "x",
            fname: "S",
            lname: "Q",
            created_at: T0,
        })
        .unwrap();

        let found = db
            .get_profile_by_login("ada@example.com", "ada@example.com")
            .unwrap()
            .unwrap();
        assert_eq!(found.id, squatter);
        let found = db.get_profile_by_login("ada", "ada").unwrap().unwrap();
        assert_eq!(found.id, ada);
    }

    #[test]
    fn follow_edge_is_visible_from_both_sides() {
        let db = Database::open_in_memory().unwrap();
        let a = seed_profile(&db, "ada");
        let b = seed_profile(&db, "grace");

        assert!(db.follow(&a, &b, T0).unwrap());
        assert_eq!(db.following_ids(&a).unwrap(), vec![b.clone()]);
        assert_eq!(db.follower_ids(&b).unwrap(), vec![a.clone()]);
        assert!(db.follower_ids(&a).unwrap().is_empty());

        assert!(db.unfollow(&a, &b).unwrap());
        assert!(db.following_ids(&a).unwrap().is_empty());
        assert!(db.follower_ids(&b).unwrap().is_empty());
    }

    #[test]
    fn follow_and_unfollow_are_idempotent() {
        let db = Database::open_in_memory().unwrap();
        let a = seed_profile(&db, "ada");
        let b = seed_profile(&db, "grace");

        assert!(db.follow(&a, &b, T0).unwrap());
        assert!(!db.follow(&a, &b, T0).unwrap());
        assert_eq!(db.following_ids(&a).unwrap().len(), 1);
        assert_eq!(db.follower_ids(&b).unwrap().len(), 1);

        assert!(db.unfollow(&a, &b).unwrap());
        assert!(!db.unfollow(&a, &b).unwrap());
        assert!(!db.is_following(&a, &b).unwrap());
    }

    #[test]
    fn self_follow_is_refused_by_the_store() {
        let db = Database::open_in_memory().unwrap();
        let a = seed_profile(&db, "ada");

        assert!(db.follow(&a, &a, T0).is_err());
        assert!(db.following_ids(&a).unwrap().is_empty());
    }

    #[test]
    fn bookmarks_are_idempotent() {
        let db = Database::open_in_memory().unwrap();
        let a = seed_profile(&db, "ada");
        let t = seed_tweet(&db, &a, "tweet", T0);

        assert!(db.add_bookmark(&a, &t, T0).unwrap());
        assert!(!db.add_bookmark(&a, &t, T0).unwrap());
        assert_eq!(db.bookmark_ids(&a).unwrap(), vec![t.clone()]);

        assert!(db.remove_bookmark(&a, &t).unwrap());
        assert!(!db.remove_bookmark(&a, &t).unwrap());
        assert!(db.bookmark_ids(&a).unwrap().is_empty());
    }

    #[test]
    fn bookmarked_tweets_skip_replies_and_sort_newest_first() {
        let db = Database::open_in_memory().unwrap();
        let a = seed_profile(&db, "ada");
        let b = seed_profile(&db, "grace");

        let old = seed_tweet(&db, &b, "tweet", "2024-05-01T10:00:00.000000Z");
        let new = seed_tweet(&db, &b, "retweet", "2024-05-02T10:00:00.000000Z");
        let reply = seed_tweet(&db, &b, "reply", "2024-05-03T10:00:00.000000Z");
        let unsaved = seed_tweet(&db, &b, "tweet", "2024-05-04T10:00:00.000000Z");

        for t in [&old, &new, &reply] {
            db.add_bookmark(&a, t, T0).unwrap();
        }

        let ids: Vec<String> = db
            .list_bookmarked_tweets(&a)
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec![new, old]);
        assert!(!ids.contains(&unsaved));
    }

    #[test]
    fn sign_in_and_out_toggle_session_state() {
        let db = Database::open_in_memory().unwrap();
        let a = seed_profile(&db, "ada");

        db.record_sign_in(&a, "2024-05-05T08:00:00.000000Z").unwrap();
        let row = db.get_profile_by_id(&a).unwrap().unwrap();
        assert!(row.online);
        assert_eq!(row.last_sign_in_at.as_deref(), Some("2024-05-05T08:00:00.000000Z"));

        db.record_sign_out(&a).unwrap();
        let row = db.get_profile_by_id(&a).unwrap().unwrap();
        assert!(!row.online);
        assert!(row.last_sign_in_at.is_some());
    }

    #[test]
    fn partial_edit_keeps_untouched_columns() {
        let db = Database::open_in_memory().unwrap();
        let a = seed_profile(&db, "ada");

        let edit = ProfileEdit {
            bio: Some("Analyst"),
            ..Default::default()
        };
        assert!(db.update_profile(&a, &edit).unwrap());

        let row = db.get_profile_by_id(&a).unwrap().unwrap();
        assert_eq!(row.bio, "Analyst");
        assert_eq!(row.fname, "First");
    }

    #[test]
    fn avatar_roundtrip() {
        let db = Database::open_in_memory().unwrap();
        let a = seed_profile(&db, "ada");
        assert!(db.get_avatar_by_username("ada").unwrap().is_none());

        db.set_avatar(&a, &[0x89, 0x50, 0x4e, 0x47], "image/png").unwrap();
        let avatar = db.get_avatar_by_username("ada").unwrap().unwrap();
        assert_eq!(avatar.mime, "image/png");
        assert_eq!(avatar.bytes.len(), 4);
        assert!(db.get_profile_by_id(&a).unwrap().unwrap().has_avatar);
    }
}
