// This file is part of herodex. Copyright © 2025 herodex contributors.
// herodex is licensed under the GNU AGPL v3.0 or any later version. See LICENSE file for full text.

//! Store-level tests against a real on-disk sqlite database. In-memory databases don't work here
//! because the store opens separate read and write pools, which would each get their own private
//! in-memory database.

use herodex::db::{HeroDb, Profile};
use herodex::hero::{Appearance, Biography, Connections, Hero, Image, PowerStats, Work};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_DB_ID: AtomicU32 = AtomicU32::new(0);

struct TestDb {
    db: HeroDb,
    path: PathBuf,
}

impl TestDb {
    async fn open() -> Self {
        let id = NEXT_DB_ID.fetch_add(1, Ordering::Relaxed);
        let path = std::env::temp_dir().join(format!("herodex-db-test-{}-{id}.sqlite", std::process::id()));
        // stale file from a previous crashed run
        let _ = std::fs::remove_file(&path);
        let db = HeroDb::open_at(&path).await.expect("failed to open test database");
        Self { db, path }
    }

    async fn close(self) {
        self.db.close().await;
        let _ = std::fs::remove_file(&self.path);
        let _ = std::fs::remove_file(self.path.with_extension("sqlite-wal"));
        let _ = std::fs::remove_file(self.path.with_extension("sqlite-shm"));
    }
}

fn hero(id: &str, name: &str, full_name: Option<&str>, publisher: Option<&str>) -> Hero {
    Hero {
        id: id.to_string(),
        name: name.to_string(),
        powerstats: PowerStats {
            intelligence: 50,
            ..Default::default()
        },
        biography: Biography {
            full_name: full_name.map(|s| s.to_string()),
            publisher: publisher.map(|s| s.to_string()),
            aliases: vec!["alias one".to_string()],
            ..Default::default()
        },
        appearance: Appearance {
            height: vec!["6'2".to_string(), "188 cm".to_string()],
            weight: vec!["210 lb".to_string(), "95 kg".to_string()],
            ..Default::default()
        },
        work: Work::default(),
        connections: Connections::default(),
        image: Image {
            url: Some(format!("https://example.com/{id}.jpg")),
        },
    }
}

#[tokio::test]
async fn test_upsert_is_keyed_by_id() {
    let test_db = TestDb::open().await;
    let db = &test_db.db;

    db.upsert_hero(&hero("70", "Batman", Some("Bruce Wayne"), Some("DC Comics")))
        .await
        .expect("first upsert failed");
    db.upsert_hero(&hero("70", "Batman of Zur-En-Arrh", None, Some("DC Comics")))
        .await
        .expect("second upsert failed");

    assert_eq!(db.count_heroes("").await.expect("count failed"), 1);
    let stored = db
        .get_hero("70")
        .await
        .expect("get failed")
        .expect("hero should exist");
    assert_eq!(stored.name, "Batman of Zur-En-Arrh");
    // the second upsert overwrites every field, including clearing full_name
    assert_eq!(stored.biography.full_name, None);

    test_db.close().await;
}

#[tokio::test]
async fn test_hero_round_trips_list_fields() {
    let test_db = TestDb::open().await;
    let db = &test_db.db;

    let original = hero("1", "A-Bomb", Some("Richard Milhouse Jones"), Some("Marvel Comics"));
    db.upsert_hero(&original).await.expect("upsert failed");
    let stored = db
        .get_hero("1")
        .await
        .expect("get failed")
        .expect("hero should exist");
    assert_eq!(stored, original);

    test_db.close().await;
}

#[tokio::test]
async fn test_get_hero_miss_is_none() {
    let test_db = TestDb::open().await;
    let result = test_db.db.get_hero("999999").await.expect("get failed");
    assert!(result.is_none());
    test_db.close().await;
}

#[tokio::test]
async fn test_listing_pages_in_insertion_order() {
    let test_db = TestDb::open().await;
    let db = &test_db.db;

    for (id, name) in [("5", "Echo"), ("3", "Alpha"), ("9", "Mirage"), ("1", "Zephyr")] {
        db.upsert_hero(&hero(id, name, None, None)).await.expect("upsert failed");
    }

    let page_one = db.find_heroes("", 0, 2).await.expect("find failed");
    let page_two = db.find_heroes("", 2, 2).await.expect("find failed");
    let names: Vec<&str> = page_one.iter().chain(page_two.iter()).map(|h| h.name.as_str()).collect();
    assert_eq!(names, vec!["Echo", "Alpha", "Mirage", "Zephyr"]);

    let past_the_end = db.find_heroes("", 4, 2).await.expect("find failed");
    assert!(past_the_end.is_empty());

    test_db.close().await;
}

#[tokio::test]
async fn test_search_matches_name_full_name_and_publisher() {
    let test_db = TestDb::open().await;
    let db = &test_db.db;

    db.upsert_hero(&hero("70", "Batman", Some("Bruce Wayne"), Some("DC Comics")))
        .await
        .expect("upsert failed");
    db.upsert_hero(&hero("620", "Spider-Man", Some("Peter Parker"), Some("Marvel Comics")))
        .await
        .expect("upsert failed");
    db.upsert_hero(&hero("149", "Captain Marvel", Some("Carol Danvers"), Some("Marvel Comics")))
        .await
        .expect("upsert failed");

    // name, case-insensitive substring
    let by_name = db.find_heroes("BAT", 0, 10).await.expect("find failed");
    assert_eq!(by_name.len(), 1);
    assert_eq!(by_name[0].name, "Batman");

    // full name
    let by_full_name = db.find_heroes("parker", 0, 10).await.expect("find failed");
    assert_eq!(by_full_name.len(), 1);
    assert_eq!(by_full_name[0].name, "Spider-Man");

    // publisher: matches both Marvel heroes, and "Captain Marvel" by name too
    let by_publisher = db.find_heroes("marvel", 0, 10).await.expect("find failed");
    assert_eq!(by_publisher.len(), 2);
    assert_eq!(db.count_heroes("marvel").await.expect("count failed"), 2);

    let no_match = db.find_heroes("zzz", 0, 10).await.expect("find failed");
    assert!(no_match.is_empty());

    test_db.close().await;
}

#[tokio::test]
async fn test_search_treats_wildcards_literally() {
    let test_db = TestDb::open().await;
    let db = &test_db.db;

    db.upsert_hero(&hero("1", "100% Hero", None, None)).await.expect("upsert failed");
    db.upsert_hero(&hero("2", "100x Hero", None, None)).await.expect("upsert failed");

    let results = db.find_heroes("100%", 0, 10).await.expect("find failed");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].name, "100% Hero");

    test_db.close().await;
}

#[tokio::test]
async fn test_user_creation_and_lookup() {
    let test_db = TestDb::open().await;
    let db = &test_db.db;

    let user_id = db
        .create_user("alice", "alice@example.com", "not-a-real-hash")
        .await
        .expect("create failed");

    let by_id = db
        .get_user(user_id)
        .await
        .expect("get failed")
        .expect("user should exist");
    assert_eq!(by_id.username, "alice");
    assert!(by_id.favorites.is_empty());
    assert!(!by_id.profile.profile_private);

    let by_username = db.get_user_by_username("alice").await.expect("get failed");
    assert!(by_username.is_some());
    let by_email = db.get_user_by_email("alice@example.com").await.expect("get failed");
    assert!(by_email.is_some());
    assert!(db.get_user_by_username("bob").await.expect("get failed").is_none());

    // username and email are unique
    assert!(db.create_user("alice", "alice2@example.com", "hash").await.is_err());
    assert!(db.create_user("alice2", "alice@example.com", "hash").await.is_err());

    test_db.close().await;
}

#[tokio::test]
async fn test_update_profile() {
    let test_db = TestDb::open().await;
    let db = &test_db.db;

    let user_id = db
        .create_user("alice", "alice@example.com", "hash")
        .await
        .expect("create failed");
    let profile = Profile {
        bio: "I fight crime".to_string(),
        location: "Gotham".to_string(),
        favorite_hero: "Batman".to_string(),
        profile_private: true,
    };
    assert!(db.update_profile(user_id, &profile).await.expect("update failed"));

    let user = db
        .get_user(user_id)
        .await
        .expect("get failed")
        .expect("user should exist");
    assert_eq!(user.profile.bio, "I fight crime");
    assert!(user.profile.profile_private);

    // missing user updates nothing
    assert!(!db.update_profile(999, &profile).await.expect("update failed"));

    test_db.close().await;
}

#[tokio::test]
async fn test_favorites_are_a_set_in_favoriting_order() {
    let test_db = TestDb::open().await;
    let db = &test_db.db;

    let user_id = db
        .create_user("alice", "alice@example.com", "hash")
        .await
        .expect("create failed");

    assert!(db.add_favorite(user_id, "70").await.expect("add failed"));
    assert!(db.add_favorite(user_id, "620").await.expect("add failed"));
    // re-adding is a no-op, not an error and not a duplicate
    assert!(!db.add_favorite(user_id, "70").await.expect("add failed"));

    assert!(db.is_favorite(user_id, "70").await.expect("check failed"));
    assert_eq!(
        db.favorite_hero_ids(user_id).await.expect("list failed"),
        vec!["70".to_string(), "620".to_string()]
    );

    assert!(db.remove_favorite(user_id, "70").await.expect("remove failed"));
    assert!(!db.remove_favorite(user_id, "70").await.expect("remove failed"));
    assert!(!db.is_favorite(user_id, "70").await.expect("check failed"));

    test_db.close().await;
}

#[tokio::test]
async fn test_get_users_loads_favorite_sets() {
    let test_db = TestDb::open().await;
    let db = &test_db.db;

    let alice = db
        .create_user("alice", "alice@example.com", "hash")
        .await
        .expect("create failed");
    let bob = db
        .create_user("bob", "bob@example.com", "hash")
        .await
        .expect("create failed");
    db.add_favorite(alice, "70").await.expect("add failed");
    db.add_favorite(bob, "70").await.expect("add failed");
    db.add_favorite(bob, "620").await.expect("add failed");

    let users = db.get_users().await.expect("get failed");
    assert_eq!(users.len(), 2);
    assert_eq!(users[0].favorites, vec!["70".to_string()]);
    assert_eq!(users[1].favorites, vec!["70".to_string(), "620".to_string()]);

    test_db.close().await;
}

#[tokio::test]
async fn test_api_key_round_trip() {
    let test_db = TestDb::open().await;
    let db = &test_db.db;

    assert!(db.get_api_key().await.expect("get failed").is_none());
    db.set_api_key("secret-key").await.expect("set failed");
    assert_eq!(db.get_api_key().await.expect("get failed").as_deref(), Some("secret-key"));
    // setting again overwrites
    db.set_api_key("rotated-key").await.expect("set failed");
    assert_eq!(db.get_api_key().await.expect("get failed").as_deref(), Some("rotated-key"));

    test_db.close().await;
}

#[tokio::test]
async fn test_reopen_preserves_data() {
    let test_db = TestDb::open().await;
    test_db
        .db
        .upsert_hero(&hero("70", "Batman", Some("Bruce Wayne"), Some("DC Comics")))
        .await
        .expect("upsert failed");
    test_db.db.close().await;

    let reopened = HeroDb::open_at(&test_db.path).await.expect("reopen failed");
    let stored = reopened.get_hero("70").await.expect("get failed");
    assert!(stored.is_some());
    reopened.close().await;

    test_db.close().await;
}
