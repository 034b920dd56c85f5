// This file is part of herodex. Copyright © 2025 herodex contributors.
// herodex is licensed under the GNU AGPL v3.0 or any later version. See LICENSE file for full text.

use crate::db::helper;
use crate::error::HerodexError;
use sqlx::{Executor, SqliteConnection};
use tokio::time::Instant;
use tracing::debug;

const SCHEMA_MINOR_VERSION_KEY: &str = "schema_minor_version";
const SCHEMA_PATCH_VERSION_KEY: &str = "schema_patch_version";
/// Increment this if there is a backwards-compatibility breaking schema change, such as deleting a column
const SCHEMA_MINOR_VERSION_VALUE: i32 = 0;
/// Increment this if there is a backwards-compatible change, such as adding a new column
const SCHEMA_PATCH_VERSION_VALUE: i32 = 0;

/// Set up the database
pub(super) async fn init(connection: &mut SqliteConnection) -> Result<(), HerodexError> {
    let start = Instant::now();

    // simple key-value settings
    connection
        .execute(
            r#"CREATE TABLE IF NOT EXISTS "settings" (
                   key    TEXT NOT NULL PRIMARY KEY,
                   value  ANY NOT NULL
               ) STRICT, WITHOUT ROWID"#,
        )
        .await?;

    // hero catalog, keyed by the remote API's external id.
    // List-valued fields (aliases, height, weight) are JSON text.
    // We intentionally keep rowid: unfiltered listing pages in insertion order.
    connection
        .execute(
            r#"CREATE TABLE IF NOT EXISTS hero (
                   hero_id            TEXT NOT NULL PRIMARY KEY,
                   name               TEXT NOT NULL,
                   intelligence       INTEGER NOT NULL DEFAULT 0,
                   strength           INTEGER NOT NULL DEFAULT 0,
                   speed              INTEGER NOT NULL DEFAULT 0,
                   durability         INTEGER NOT NULL DEFAULT 0,
                   power              INTEGER NOT NULL DEFAULT 0,
                   combat             INTEGER NOT NULL DEFAULT 0,
                   full_name          TEXT,
                   alter_egos         TEXT,
                   aliases            TEXT NOT NULL DEFAULT '[]',
                   place_of_birth     TEXT,
                   first_appearance   TEXT,
                   publisher          TEXT,
                   alignment          TEXT,
                   gender             TEXT,
                   race               TEXT,
                   height             TEXT NOT NULL DEFAULT '[]',
                   weight             TEXT NOT NULL DEFAULT '[]',
                   eye_color          TEXT,
                   hair_color         TEXT,
                   occupation         TEXT,
                   base               TEXT,
                   group_affiliation  TEXT,
                   relatives          TEXT,
                   image_url          TEXT
               ) STRICT"#,
        )
        .await?;
    // the substring search filters on name, full_name, and publisher
    connection
        .execute(r#"CREATE INDEX IF NOT EXISTS hero_lookup_by_name ON hero (name)"#)
        .await?;

    // registered users
    // we intentionally use rowid as we have an integer pk
    connection
        .execute(
            r#"CREATE TABLE IF NOT EXISTS "user" (
                   user_id             INTEGER NOT NULL PRIMARY KEY,
                   username            TEXT NOT NULL UNIQUE,
                   email               TEXT NOT NULL UNIQUE,
                   password_hash       TEXT NOT NULL,
                   bio                 TEXT NOT NULL DEFAULT '',
                   location            TEXT NOT NULL DEFAULT '',
                   favorite_hero       TEXT NOT NULL DEFAULT '',
                   profile_private     INTEGER NOT NULL DEFAULT 0,
                   created_at_unix_ms  INTEGER NOT NULL
               ) STRICT"#,
        )
        .await?;

    // per-user favorite sets. The composite pk forbids duplicates within one user's set, and
    // rowid order is the user's favoriting order.
    // No foreign key on hero_id: favorites may dangle, and ranking drops unresolvable ids.
    connection
        .execute(
            r#"CREATE TABLE IF NOT EXISTS user_favorite (
                   user_id      INTEGER NOT NULL,
                   hero_id      TEXT NOT NULL,
                   PRIMARY KEY  (user_id, hero_id),
                   FOREIGN KEY  (user_id) REFERENCES "user"
               ) STRICT"#,
        )
        .await?;

    let schema_minor_version: i32 = helper::get_setting(connection, SCHEMA_MINOR_VERSION_KEY)
        .await?
        .unwrap_or(SCHEMA_MINOR_VERSION_VALUE);
    let schema_patch_version: i32 = helper::get_setting(connection, SCHEMA_PATCH_VERSION_KEY)
        .await?
        .unwrap_or(SCHEMA_PATCH_VERSION_VALUE);

    // handle schema downgrade (or rather, DON'T handle it and throw an error)
    if schema_minor_version > SCHEMA_MINOR_VERSION_VALUE {
        let message = format!(
            "db schema version is v{schema_minor_version}.{schema_patch_version}, which is newer than v{SCHEMA_MINOR_VERSION_VALUE} which is the latest schema this herodex build supports."
        );
        return Err(HerodexError::new(message));
    }

    // Applications that use long-lived database connections should run "PRAGMA optimize=0x10002;" when the connection is first opened.
    // All applications should run "PRAGMA optimize;" after a schema change.
    connection.execute(r#"PRAGMA optimize = 0x10002"#).await?;

    // update the schema version value persisted to the DB
    helper::set_setting(connection, SCHEMA_MINOR_VERSION_KEY, SCHEMA_MINOR_VERSION_VALUE).await?;
    helper::set_setting(connection, SCHEMA_PATCH_VERSION_KEY, SCHEMA_PATCH_VERSION_VALUE).await?;

    let elapsed = start.elapsed();
    debug!(
        "initialized v{}.{} db in {}ms",
        SCHEMA_MINOR_VERSION_VALUE,
        SCHEMA_PATCH_VERSION_VALUE,
        elapsed.as_millis()
    );

    Ok(())
}
