// This file is part of herodex. Copyright © 2025 herodex contributors.
// herodex is licensed under the GNU AGPL v3.0 or any later version. See LICENSE file for full text.

//! Favorite ranking: tally every user's favorite set and produce the most-favorited heroes.

use crate::db::{HeroDb, User};
use crate::error::HerodexError;
use crate::hero::Hero;
use std::collections::HashMap;
use tracing::debug;

/// A hero together with its popularity standing
#[derive(Debug, Clone)]
pub struct RankedHero {
    pub hero: Hero,
    pub favorite_count: u32,
    /// 1-based position. Ties on count are broken by hero id, so ranks are dense and stable
    /// across identical data.
    pub rank: u32,
}

/// The at most `limit` most-favorited heroes, most popular first.
///
/// Counts favorites across every user, one count per user per hero. Ids that no longer resolve to
/// a stored hero are dropped from the result rather than failing the whole ranking.
pub async fn top_favorited(db: &HeroDb, limit: usize) -> Result<Vec<RankedHero>, HerodexError> {
    let users = db.get_users().await?;
    let tally = tally_favorites(&users);
    let top_ids = top_hero_ids(&tally, limit);

    let mut ranked: Vec<RankedHero> = Vec::with_capacity(top_ids.len());
    for (hero_id, favorite_count) in top_ids {
        match db.get_hero(&hero_id).await? {
            Some(hero) => ranked.push(RankedHero {
                hero,
                favorite_count,
                rank: 0, // assigned below, after unresolvable ids are dropped
            }),
            None => debug!("dropping favorited hero id \"{hero_id}\" with no stored hero"),
        }
    }
    for (index, entry) in ranked.iter_mut().enumerate() {
        entry.rank = index as u32 + 1;
    }
    Ok(ranked)
}

/// Count how many users favorited each hero id. Iteration order of the result follows first
/// appearance across the user scan.
fn tally_favorites(users: &[User]) -> Vec<(String, u32)> {
    let mut counts: HashMap<&str, usize, ahash::RandomState> = Default::default();
    let mut order: Vec<(String, u32)> = Vec::new();
    for user in users {
        // the store guarantees no duplicates within one user's set
        for hero_id in &user.favorites {
            match counts.get(hero_id.as_str()) {
                Some(&index) => order[index].1 += 1,
                None => {
                    counts.insert(hero_id, order.len());
                    order.push((hero_id.clone(), 1));
                }
            }
        }
    }
    order
}

/// The `limit` highest-counted ids, count descending, ties broken by id ascending
fn top_hero_ids(tally: &[(String, u32)], limit: usize) -> Vec<(String, u32)> {
    let mut sorted: Vec<(String, u32)> = tally.to_vec();
    sorted.sort_by(|(id_a, count_a), (id_b, count_b)| count_b.cmp(count_a).then_with(|| id_a.cmp(id_b)));
    sorted.truncate(limit);
    sorted
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::db::{Profile, User};
    use crate::time::SimpleTime;

    fn user(user_id: i64, favorites: &[&str]) -> User {
        User {
            user_id,
            username: format!("user{user_id}"),
            email: format!("user{user_id}@example.com"),
            password_hash: "hash".to_string(),
            profile: Profile::default(),
            created_at: SimpleTime::UNIX_EPOCH,
            favorites: favorites.iter().map(|id| id.to_string()).collect(),
        }
    }

    #[test]
    fn test_tally_counts_across_users() {
        let users = vec![user(1, &["1", "2"]), user(2, &["2", "3"])];
        let tally = tally_favorites(&users);
        assert_eq!(
            tally,
            vec![
                ("1".to_string(), 1),
                ("2".to_string(), 2),
                ("3".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_top_ids_ordered_by_count_then_id() {
        let users = vec![user(1, &["1", "2"]), user(2, &["2", "3"])];
        let tally = tally_favorites(&users);
        let top = top_hero_ids(&tally, 10);
        // hero 2 has two favorites; 1 and 3 tie and fall back to id order
        assert_eq!(
            top,
            vec![
                ("2".to_string(), 2),
                ("1".to_string(), 1),
                ("3".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_top_ids_truncates_to_limit() {
        let users = vec![user(1, &["1", "2", "3", "4"])];
        let tally = tally_favorites(&users);
        let top = top_hero_ids(&tally, 2);
        assert_eq!(top.len(), 2);
    }

    #[test]
    fn test_empty_users_produce_empty_tally() {
        let tally = tally_favorites(&[]);
        assert!(tally.is_empty());
        assert!(top_hero_ids(&tally, 10).is_empty());
    }
}
