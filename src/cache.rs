// This file is part of herodex. Copyright © 2025 herodex contributors.
// herodex is licensed under the GNU AGPL v3.0 or any later version. See LICENSE file for full text.

//! Time-windowed cache of the top-favorited heroes.
//!
//! One snapshot for the whole process. Reads within the window are served from memory; the first
//! read past the window recomputes. Refresh is not guarded against concurrent recomputation:
//! overlapping readers may both recompute, and last write wins. That is harmless (both computed
//! the same ranking) and cheaper than a refresh lock.

use crate::db::HeroDb;
use crate::hero::Hero;
use crate::ranking::{self, RankedHero};
use crate::time::SimpleTime;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;
use tracing::warn;

/// How many heroes a snapshot holds
pub const TOP_HEROES_LIMIT: usize = 10;
/// How long a snapshot stays fresh
const CACHE_EXPIRY_TIME: Duration = Duration::from_secs(30);

/// One computed ranking, stamped with its computation time
#[derive(Debug, Clone)]
pub struct TopHeroesSnapshot {
    pub heroes: Vec<RankedHero>,
    /// hero id -> 1-based rank, for point lookups without scanning `heroes`
    ranks: HashMap<String, u32, ahash::RandomState>,
    last_updated: SimpleTime,
}

impl TopHeroesSnapshot {
    fn empty() -> Self {
        Self {
            heroes: Vec::new(),
            ranks: Default::default(),
            // infinitely old, so the first read always refreshes
            last_updated: SimpleTime::UNIX_EPOCH,
        }
    }

    fn from_ranking(heroes: Vec<RankedHero>) -> Self {
        let ranks = heroes.iter().map(|entry| (entry.hero.id.clone(), entry.rank)).collect();
        Self {
            heroes,
            ranks,
            last_updated: SimpleTime::now(),
        }
    }

    /// 1-based rank of a hero, or `None` if it isn't in the snapshot
    pub fn rank_of(&self, hero: &Hero) -> Option<u32> {
        self.ranks.get(&hero.id).copied()
    }

    fn is_stale(&self) -> bool {
        self.last_updated.elapsed() >= CACHE_EXPIRY_TIME
    }
}

pub struct TopHeroesCache {
    snapshot: RwLock<TopHeroesSnapshot>,
}

impl TopHeroesCache {
    pub fn new() -> Self {
        Self {
            snapshot: RwLock::new(TopHeroesSnapshot::empty()),
        }
    }

    /// Get the current top-heroes snapshot, recomputing it first if the window has lapsed.
    ///
    /// If the recompute fails the previous snapshot is served as-is (still stamped stale, so the
    /// next read retries) and the failure is only logged. Popularity may be momentarily out of
    /// date; it must never take the caller down.
    pub async fn read(&self, db: &HeroDb) -> TopHeroesSnapshot {
        {
            let snapshot = self.snapshot.read().expect("top heroes lock poisoned");
            if !snapshot.is_stale() {
                return snapshot.clone();
            }
        }

        // compute outside the lock so readers are never blocked on the db scan
        match ranking::top_favorited(db, TOP_HEROES_LIMIT).await {
            Ok(heroes) => {
                let fresh = TopHeroesSnapshot::from_ranking(heroes);
                let mut snapshot = self.snapshot.write().expect("top heroes lock poisoned");
                *snapshot = fresh.clone();
                fresh
            }
            Err(e) => {
                warn!("failed to refresh top heroes, serving stale data: {e}");
                self.snapshot.read().expect("top heroes lock poisoned").clone()
            }
        }
    }

    /// Mark the snapshot infinitely old, forcing the next read to recompute. Called after any
    /// favorite mutation. The stale data itself is kept so a failed refresh still has something
    /// to serve.
    pub fn invalidate(&self) {
        let mut snapshot = self.snapshot.write().expect("top heroes lock poisoned");
        snapshot.last_updated = SimpleTime::UNIX_EPOCH;
    }
}

impl Default for TopHeroesCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_empty_snapshot_is_stale() {
        let snapshot = TopHeroesSnapshot::empty();
        assert!(snapshot.is_stale());
    }

    #[test]
    fn test_fresh_snapshot_is_not_stale() {
        let snapshot = TopHeroesSnapshot::from_ranking(Vec::new());
        assert!(!snapshot.is_stale());
    }

    #[test]
    fn test_invalidate_marks_snapshot_stale() {
        let cache = TopHeroesCache::new();
        {
            let mut snapshot = cache.snapshot.write().expect("lock poisoned");
            *snapshot = TopHeroesSnapshot::from_ranking(Vec::new());
            assert!(!snapshot.is_stale());
        }
        cache.invalidate();
        let snapshot = cache.snapshot.read().expect("lock poisoned");
        assert!(snapshot.is_stale());
    }
}
