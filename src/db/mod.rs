// This file is part of herodex. Copyright © 2025 herodex contributors.
// herodex is licensed under the GNU AGPL v3.0 or any later version. See LICENSE file for full text.

//! Persistent hero and user stores, backed by SQLite.
//!
//! Heroes are keyed by the remote API's external id; upsert-by-id is a single atomic
//! `INSERT ... ON CONFLICT` so the uniqueness invariant never needs a separate existence check.
//! Favorites live in their own table whose composite primary key forbids duplicates within one
//! user's set.

mod schema;

use crate::error::HerodexError;
use crate::hero::{Appearance, Biography, Connections, Hero, Image, PowerStats, Work};
use crate::time::SimpleTime;
use sqlx::{
    Encode, FromRow, Pool, Row, Sqlite,
    error::Error as SqlxError,
    pool::PoolConnection,
    sqlite::{
        SqliteAutoVacuum, SqliteConnectOptions, SqliteJournalMode, SqliteLockingMode, SqlitePoolOptions, SqliteRow,
        SqliteSynchronous,
    },
};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

const DB_FILENAME: &str = "herodex.sqlite";
const API_KEY_KEY: &str = "superhero_api_key";

type HeroResult<T> = Result<T, HerodexError>;
type SqliteResult<T> = Result<T, SqlxError>;

const HERO_COLUMNS: &str = "hero_id, name, intelligence, strength, speed, durability, power, combat, \
     full_name, alter_egos, aliases, place_of_birth, first_appearance, publisher, alignment, \
     gender, race, height, weight, eye_color, hair_color, occupation, base, group_affiliation, \
     relatives, image_url";

/// Case-insensitive substring filter over the fields the original text index covered.
/// `?1` is a LIKE pattern produced by [`like_pattern`].
const HERO_SEARCH_FILTER: &str =
    r"name LIKE ?1 ESCAPE '\' OR full_name LIKE ?1 ESCAPE '\' OR publisher LIKE ?1 ESCAPE '\'";

const USER_COLUMNS: &str =
    "user_id, username, email, password_hash, bio, location, favorite_hero, profile_private, created_at_unix_ms";

/// A registered user. `favorites` is the user's ordered favorite set (hero external ids, in
/// favoriting order, no duplicates).
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: i64,
    pub username: String,
    pub email: String,
    /// Opaque pre-hashed credential. Hashing is the caller's concern.
    pub password_hash: String,
    pub profile: Profile,
    pub created_at: SimpleTime,
    pub favorites: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Profile {
    pub bio: String,
    pub location: String,
    /// Free-text "favorite hero" field, unrelated to the favorites set
    pub favorite_hero: String,
    pub profile_private: bool,
}

/// Cloning is by-reference.
#[derive(Clone)]
pub struct HeroDb {
    read_pool: Pool<Sqlite>,
    write_pool: Pool<Sqlite>,
}

impl HeroDb {
    /// Open the database at its default location
    pub async fn open() -> HeroResult<Self> {
        Self::open_at(DB_FILENAME).await
    }

    /// Open a database at the given path, creating it if missing
    pub async fn open_at(filename: impl AsRef<Path>) -> HeroResult<Self> {
        let pool_options_write = SqlitePoolOptions::new()
            .min_connections(1) // always keep at least one connection open
            .max_connections(1) // allow only 1 write connection
            .max_lifetime(None) // don't close connections for no reason, as we assume sqlite doesn't leak resources
            .test_before_acquire(false) // we assume sqlite is extremely reliable, as it's in-process
            .acquire_slow_threshold(Duration::from_millis(100)) // we expect sqlite to be fast
            .idle_timeout(Some(Duration::from_secs(90))); // idle extra connections may be closed after a while
        let pool_options_read = pool_options_write.clone().max_connections(4); // allow up to 4 read connections
        let connect_options_write = SqliteConnectOptions::new()
            .filename(filename)
            .foreign_keys(true)
            .in_memory(false)
            .shared_cache(false) // superseded by WAL mode
            .journal_mode(SqliteJournalMode::Wal)
            .locking_mode(SqliteLockingMode::Normal) // must be Normal to have multiple connections
            .read_only(false)
            .create_if_missing(true)
            .statement_cache_capacity(100)
            .busy_timeout(Duration::from_secs(5))
            .synchronous(SqliteSynchronous::Normal) // small possibility a transaction may be rolled back on OS crash or power-off
            .auto_vacuum(SqliteAutoVacuum::None)
            .page_size(4096)
            .pragma("trusted_schema", "OFF"); // all applications are encouraged to switch this setting off on every database connection as soon as that connection is opened
        let connect_options_read = connect_options_write.clone().read_only(true).create_if_missing(false);

        let write_pool = pool_options_write.connect_with(connect_options_write).await?;
        let mut write_connection = write_pool.acquire().await?;
        schema::init(&mut write_connection).await?;
        drop(write_connection);

        let read_pool = pool_options_read.connect_with(connect_options_read).await?;

        let db = HeroDb { read_pool, write_pool };
        Ok(db)
    }

    /// Gracefully close the database connections and wait for the close to complete
    pub async fn close(&self) {
        self.read_pool.close().await;
        self.write_pool.close().await;
    }

    /// Get something that we can DerefMut as SqliteConnection
    async fn write_connection(&self) -> SqliteResult<PoolConnection<Sqlite>> {
        self.write_pool.acquire().await
    }

    /// Attempt to optimize the database.
    ///
    /// Applications that use long-lived database connections should run "PRAGMA optimize;" periodically, perhaps once per day or once per hour.
    pub async fn optimize(&self) -> HeroResult<()> {
        use sqlx::Executor;
        let mut connection = self.write_connection().await?;
        connection.execute(r#"PRAGMA optimize"#).await?;
        Ok(())
    }

    async fn get_setting<'e, T>(&self, key: &str) -> SqliteResult<Option<T>>
    where
        T: sqlx::Type<Sqlite> + Send + Unpin + 'e,
        (T,): for<'r> FromRow<'r, SqliteRow>,
    {
        let mut connection = self.write_connection().await?;
        helper::get_setting(&mut connection, key).await
    }

    async fn set_setting<'q, T>(&self, key: &'q str, value: T) -> SqliteResult<()>
    where
        T: Encode<'q, Sqlite> + sqlx::Type<Sqlite> + 'q,
    {
        let mut connection = self.write_connection().await?;
        helper::set_setting(&mut connection, key, value).await
    }

    pub async fn set_api_key(&self, api_key: &str) -> HeroResult<()> {
        self.set_setting(API_KEY_KEY, api_key).await?;
        Ok(())
    }

    pub async fn get_api_key(&self) -> HeroResult<Option<String>> {
        let result = self.get_setting(API_KEY_KEY).await?;
        Ok(result)
    }

    /// Insert-or-replace a hero, keyed by its external id. Every field is overwritten on
    /// conflict, so a re-fetch fully refreshes the record. This is one atomic statement:
    /// upserting the same id twice can never create a duplicate.
    pub async fn upsert_hero(&self, hero: &Hero) -> HeroResult<()> {
        let aliases = serde_json::to_string(&hero.biography.aliases)?;
        let height = serde_json::to_string(&hero.appearance.height)?;
        let weight = serde_json::to_string(&hero.appearance.weight)?;
        let mut connection = self.write_connection().await?;
        sqlx::query(
            r#"INSERT INTO hero (hero_id, name, intelligence, strength, speed, durability, power, combat,
                   full_name, alter_egos, aliases, place_of_birth, first_appearance, publisher, alignment,
                   gender, race, height, weight, eye_color, hair_color, occupation, base, group_affiliation,
                   relatives, image_url)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT (hero_id) DO UPDATE SET
                   name = excluded.name,
                   intelligence = excluded.intelligence,
                   strength = excluded.strength,
                   speed = excluded.speed,
                   durability = excluded.durability,
                   power = excluded.power,
                   combat = excluded.combat,
                   full_name = excluded.full_name,
                   alter_egos = excluded.alter_egos,
                   aliases = excluded.aliases,
                   place_of_birth = excluded.place_of_birth,
                   first_appearance = excluded.first_appearance,
                   publisher = excluded.publisher,
                   alignment = excluded.alignment,
                   gender = excluded.gender,
                   race = excluded.race,
                   height = excluded.height,
                   weight = excluded.weight,
                   eye_color = excluded.eye_color,
                   hair_color = excluded.hair_color,
                   occupation = excluded.occupation,
                   base = excluded.base,
                   group_affiliation = excluded.group_affiliation,
                   relatives = excluded.relatives,
                   image_url = excluded.image_url"#,
        )
        .bind(&hero.id)
        .bind(&hero.name)
        .bind(hero.powerstats.intelligence)
        .bind(hero.powerstats.strength)
        .bind(hero.powerstats.speed)
        .bind(hero.powerstats.durability)
        .bind(hero.powerstats.power)
        .bind(hero.powerstats.combat)
        .bind(&hero.biography.full_name)
        .bind(&hero.biography.alter_egos)
        .bind(aliases)
        .bind(&hero.biography.place_of_birth)
        .bind(&hero.biography.first_appearance)
        .bind(&hero.biography.publisher)
        .bind(&hero.biography.alignment)
        .bind(&hero.appearance.gender)
        .bind(&hero.appearance.race)
        .bind(height)
        .bind(weight)
        .bind(&hero.appearance.eye_color)
        .bind(&hero.appearance.hair_color)
        .bind(&hero.work.occupation)
        .bind(&hero.work.base)
        .bind(&hero.connections.group_affiliation)
        .bind(&hero.connections.relatives)
        .bind(&hero.image.url)
        .execute(&mut *connection)
        .await?;
        Ok(())
    }

    /// Point lookup by external id
    pub async fn get_hero(&self, hero_id: &str) -> HeroResult<Option<Hero>> {
        let sql = format!(r#"SELECT {HERO_COLUMNS} FROM hero WHERE hero_id = ?"#);
        let row = sqlx::query(&sql).bind(hero_id).fetch_optional(&self.read_pool).await?;
        let hero = row.as_ref().map(hero_from_row).transpose()?;
        Ok(hero)
    }

    /// One page of heroes. An empty `search` lists the whole catalog in insertion order;
    /// otherwise rows match a case-insensitive substring filter on name, full name, and
    /// publisher. LIKE metacharacters in the term are escaped, not interpreted.
    pub async fn find_heroes(&self, search: &str, skip: u32, limit: u32) -> HeroResult<Vec<Hero>> {
        let rows = if search.is_empty() {
            let sql = format!(r#"SELECT {HERO_COLUMNS} FROM hero ORDER BY rowid LIMIT ?1 OFFSET ?2"#);
            sqlx::query(&sql)
                .bind(i64::from(limit))
                .bind(i64::from(skip))
                .fetch_all(&self.read_pool)
                .await?
        } else {
            let sql = format!(
                r#"SELECT {HERO_COLUMNS} FROM hero WHERE {HERO_SEARCH_FILTER} ORDER BY rowid LIMIT ?2 OFFSET ?3"#
            );
            sqlx::query(&sql)
                .bind(like_pattern(search))
                .bind(i64::from(limit))
                .bind(i64::from(skip))
                .fetch_all(&self.read_pool)
                .await?
        };
        let heroes = rows.iter().map(hero_from_row).collect::<SqliteResult<Vec<Hero>>>()?;
        Ok(heroes)
    }

    /// Total number of heroes matching `search` (all heroes if empty)
    pub async fn count_heroes(&self, search: &str) -> HeroResult<u64> {
        let count: i64 = if search.is_empty() {
            sqlx::query_scalar(r#"SELECT COUNT(*) FROM hero"#)
                .fetch_one(&self.read_pool)
                .await?
        } else {
            let sql = format!(r#"SELECT COUNT(*) FROM hero WHERE {HERO_SEARCH_FILTER}"#);
            sqlx::query_scalar(&sql)
                .bind(like_pattern(search))
                .fetch_one(&self.read_pool)
                .await?
        };
        Ok(count as u64)
    }

    /// Total number of heroes in the catalog
    pub async fn hero_count(&self) -> HeroResult<u64> {
        self.count_heroes("").await
    }

    /// Create a new user. `password_hash` must already be hashed; this layer never sees raw
    /// credentials. Returns the new user id. Username and email uniqueness is enforced by the
    /// schema; callers wanting friendly duplicate messages should check first.
    pub async fn create_user(&self, username: &str, email: &str, password_hash: &str) -> HeroResult<i64> {
        let created_at = SimpleTime::now().as_epoch_millis() as i64;
        let mut connection = self.write_connection().await?;
        let result = sqlx::query(
            r#"INSERT INTO "user" (username, email, password_hash, created_at_unix_ms) VALUES (?, ?, ?, ?)"#,
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(created_at)
        .execute(&mut *connection)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn get_user(&self, user_id: i64) -> HeroResult<Option<User>> {
        let sql = format!(r#"SELECT {USER_COLUMNS} FROM "user" WHERE user_id = ?"#);
        let user = sqlx::query(&sql)
            .bind(user_id)
            .fetch_optional(&self.read_pool)
            .await?
            .as_ref()
            .map(user_from_row)
            .transpose()?;
        self.load_favorites(user).await
    }

    pub async fn get_user_by_username(&self, username: &str) -> HeroResult<Option<User>> {
        let sql = format!(r#"SELECT {USER_COLUMNS} FROM "user" WHERE username = ?"#);
        let user = sqlx::query(&sql)
            .bind(username)
            .fetch_optional(&self.read_pool)
            .await?
            .as_ref()
            .map(user_from_row)
            .transpose()?;
        self.load_favorites(user).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> HeroResult<Option<User>> {
        let sql = format!(r#"SELECT {USER_COLUMNS} FROM "user" WHERE email = ?"#);
        let user = sqlx::query(&sql)
            .bind(email)
            .fetch_optional(&self.read_pool)
            .await?
            .as_ref()
            .map(user_from_row)
            .transpose()?;
        self.load_favorites(user).await
    }

    /// All users with their favorite sets loaded. This is the favorite-ranking scan; it reads the
    /// whole user table on purpose.
    pub async fn get_users(&self) -> HeroResult<Vec<User>> {
        let sql = format!(r#"SELECT {USER_COLUMNS} FROM "user" ORDER BY user_id"#);
        let rows = sqlx::query(&sql).fetch_all(&self.read_pool).await?;
        let mut users = rows.iter().map(user_from_row).collect::<SqliteResult<Vec<User>>>()?;

        let favorite_rows: Vec<(i64, String)> =
            sqlx::query_as(r#"SELECT user_id, hero_id FROM user_favorite ORDER BY rowid"#)
                .fetch_all(&self.read_pool)
                .await?;
        let mut favorites_by_user: HashMap<i64, Vec<String>, ahash::RandomState> = Default::default();
        for (user_id, hero_id) in favorite_rows {
            favorites_by_user.entry(user_id).or_default().push(hero_id);
        }
        for user in users.iter_mut() {
            if let Some(favorites) = favorites_by_user.remove(&user.user_id) {
                user.favorites = favorites;
            }
        }
        Ok(users)
    }

    /// Overwrite a user's profile blob. Returns `false` if the user does not exist.
    pub async fn update_profile(&self, user_id: i64, profile: &Profile) -> HeroResult<bool> {
        let mut connection = self.write_connection().await?;
        let result = sqlx::query(
            r#"UPDATE "user" SET bio = ?, location = ?, favorite_hero = ?, profile_private = ? WHERE user_id = ?"#,
        )
        .bind(&profile.bio)
        .bind(&profile.location)
        .bind(&profile.favorite_hero)
        .bind(profile.profile_private)
        .bind(user_id)
        .execute(&mut *connection)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Add a hero to a user's favorite set. Returns `true` if it was newly added, `false` if it
    /// was already present.
    pub async fn add_favorite(&self, user_id: i64, hero_id: &str) -> HeroResult<bool> {
        let mut connection = self.write_connection().await?;
        let result = sqlx::query(r#"INSERT OR IGNORE INTO user_favorite (user_id, hero_id) VALUES (?, ?)"#)
            .bind(user_id)
            .bind(hero_id)
            .execute(&mut *connection)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove a hero from a user's favorite set. Returns `true` if it was present.
    pub async fn remove_favorite(&self, user_id: i64, hero_id: &str) -> HeroResult<bool> {
        let mut connection = self.write_connection().await?;
        let result = sqlx::query(r#"DELETE FROM user_favorite WHERE user_id = ? AND hero_id = ?"#)
            .bind(user_id)
            .bind(hero_id)
            .execute(&mut *connection)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn is_favorite(&self, user_id: i64, hero_id: &str) -> HeroResult<bool> {
        let result = sqlx::query_scalar(
            r#"SELECT EXISTS(SELECT * FROM user_favorite WHERE user_id = ? AND hero_id = ?)"#,
        )
        .bind(user_id)
        .bind(hero_id)
        .fetch_one(&self.read_pool)
        .await?;
        Ok(result)
    }

    /// A user's favorite hero ids, in favoriting order
    pub async fn favorite_hero_ids(&self, user_id: i64) -> HeroResult<Vec<String>> {
        let result = sqlx::query_scalar(r#"SELECT hero_id FROM user_favorite WHERE user_id = ? ORDER BY rowid"#)
            .bind(user_id)
            .fetch_all(&self.read_pool)
            .await?;
        Ok(result)
    }

    async fn load_favorites(&self, user: Option<User>) -> HeroResult<Option<User>> {
        match user {
            Some(mut user) => {
                user.favorites = self.favorite_hero_ids(user.user_id).await?;
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }
}

/// Build a LIKE pattern matching `term` as a substring anywhere, with LIKE metacharacters in the
/// term escaped so user input can't smuggle wildcards in.
fn like_pattern(term: &str) -> String {
    let escaped = term.replace('\\', r"\\").replace('%', r"\%").replace('_', r"\_");
    format!("%{escaped}%")
}

fn hero_from_row(row: &SqliteRow) -> SqliteResult<Hero> {
    let aliases = decode_json_column(row.try_get("aliases")?, "aliases")?;
    let height = decode_json_column(row.try_get("height")?, "height")?;
    let weight = decode_json_column(row.try_get("weight")?, "weight")?;
    Ok(Hero {
        id: row.try_get("hero_id")?,
        name: row.try_get("name")?,
        powerstats: PowerStats {
            intelligence: row.try_get("intelligence")?,
            strength: row.try_get("strength")?,
            speed: row.try_get("speed")?,
            durability: row.try_get("durability")?,
            power: row.try_get("power")?,
            combat: row.try_get("combat")?,
        },
        biography: Biography {
            full_name: row.try_get("full_name")?,
            alter_egos: row.try_get("alter_egos")?,
            aliases,
            place_of_birth: row.try_get("place_of_birth")?,
            first_appearance: row.try_get("first_appearance")?,
            publisher: row.try_get("publisher")?,
            alignment: row.try_get("alignment")?,
        },
        appearance: Appearance {
            gender: row.try_get("gender")?,
            race: row.try_get("race")?,
            height,
            weight,
            eye_color: row.try_get("eye_color")?,
            hair_color: row.try_get("hair_color")?,
        },
        work: Work {
            occupation: row.try_get("occupation")?,
            base: row.try_get("base")?,
        },
        connections: Connections {
            group_affiliation: row.try_get("group_affiliation")?,
            relatives: row.try_get("relatives")?,
        },
        image: Image {
            url: row.try_get("image_url")?,
        },
    })
}

fn decode_json_column(text: String, column: &str) -> SqliteResult<Vec<String>> {
    serde_json::from_str(&text).map_err(|e| SqlxError::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

fn user_from_row(row: &SqliteRow) -> SqliteResult<User> {
    let created_at_unix_ms: i64 = row.try_get("created_at_unix_ms")?;
    Ok(User {
        user_id: row.try_get("user_id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        profile: Profile {
            bio: row.try_get("bio")?,
            location: row.try_get("location")?,
            favorite_hero: row.try_get("favorite_hero")?,
            profile_private: row.try_get("profile_private")?,
        },
        created_at: SimpleTime::from_unix_millis(created_at_unix_ms as u64),
        favorites: Vec::new(),
    })
}

pub(crate) mod helper {
    use super::SqliteResult;
    use sqlx::sqlite::SqliteRow;
    use sqlx::{Encode, FromRow, Sqlite, SqliteConnection};

    pub async fn get_setting<'e, T>(connection: &mut SqliteConnection, key: &str) -> SqliteResult<Option<T>>
    where
        T: sqlx::Type<Sqlite> + Send + Unpin + 'e,
        (T,): for<'r> FromRow<'r, SqliteRow>,
    {
        let result: Option<(T,)> = sqlx::query_as(r#"SELECT value FROM settings WHERE key = ?"#)
            .bind(key)
            .fetch_optional(&mut *connection)
            .await?;
        Ok(result.map(|(value,)| value))
    }

    pub async fn set_setting<'q, T>(connection: &mut SqliteConnection, key: &'q str, value: T) -> SqliteResult<()>
    where
        T: Encode<'q, Sqlite> + sqlx::Type<Sqlite> + 'q,
    {
        sqlx::query(r#"INSERT INTO settings (key, value) VALUES (?, ?) ON CONFLICT (key) DO UPDATE SET value = excluded.value"#)
            .bind(key)
            .bind(value)
            .execute(&mut *connection)
            .await?;
        Ok(())
    }
}
