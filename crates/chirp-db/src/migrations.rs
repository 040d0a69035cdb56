use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS profiles (
            id              TEXT PRIMARY KEY,
            username        TEXT NOT NULL UNIQUE,
            email           TEXT NOT NULL UNIQUE,
            password        TEXT NOT NULL,
            fname           TEXT NOT NULL,
            lname           TEXT NOT NULL,
            bio             TEXT NOT NULL DEFAULT '',
            avatar          BLOB,
            avatar_mime     TEXT,
            online          INTEGER NOT NULL DEFAULT 0,
            last_sign_in_at TEXT,
            created_at      TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS tweets (
            id          TEXT PRIMARY KEY,
            author_id   TEXT NOT NULL REFERENCES profiles(id),
            kind        TEXT NOT NULL CHECK (kind IN ('tweet', 'retweet', 'reply')),
            parent_id   TEXT REFERENCES tweets(id),
            content     TEXT NOT NULL,
            created_at  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_tweets_author
            ON tweets(author_id, created_at);

        -- One row per edge: backs both `following` and `followers`.
        CREATE TABLE IF NOT EXISTS follows (
            follower_id TEXT NOT NULL REFERENCES profiles(id),
            followee_id TEXT NOT NULL REFERENCES profiles(id),
            created_at  TEXT NOT NULL,
            PRIMARY KEY (follower_id, followee_id),
            CHECK (follower_id <> followee_id)
        );

        CREATE INDEX IF NOT EXISTS idx_follows_followee
            ON follows(followee_id);

        CREATE TABLE IF NOT EXISTS bookmarks (
            profile_id  TEXT NOT NULL REFERENCES profiles(id),
            tweet_id    TEXT NOT NULL REFERENCES tweets(id),
            created_at  TEXT NOT NULL,
            PRIMARY KEY (profile_id, tweet_id)
        );
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
