// This file is part of herodex. Copyright © 2025 herodex contributors.
// herodex is licensed under the GNU AGPL v3.0 or any later version. See LICENSE file for full text.

//! Catalog operations that tie the store, the remote hero source, and the top-heroes cache
//! together. All the remote-fallback and cache-invalidation policy lives here.

use crate::cache::TopHeroesCache;
use crate::db::{HeroDb, Profile, User};
use crate::error::HerodexError;
use crate::hero::Hero;
use crate::http::superhero_api::{ApiResult, RawHero};
use crate::validation;
use std::time::Duration;
use tracing::{debug, info, warn};

type HeroResult<T> = Result<T, HerodexError>;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
/// Pause between consecutive remote fetches during a batch import, to stay polite
const IMPORT_RATE_LIMIT_DELAY: Duration = Duration::from_millis(100);

/// A remote provider of hero data. The live implementation is
/// [`SuperheroApi`](crate::http::superhero_api::SuperheroApi); tests substitute their own.
///
/// "Not found" is a successful `None`/empty result, never an `Err`.
#[allow(async_fn_in_trait)]
pub trait HeroSource {
    async fn fetch_by_id(&self, hero_id: &str) -> ApiResult<Option<RawHero>>;
    async fn search_by_name(&self, name: &str) -> ApiResult<Vec<RawHero>>;
}

/// One page of catalog results
#[derive(Debug, Clone)]
pub struct HeroPage {
    pub heroes: Vec<Hero>,
    /// Total matches across all pages
    pub total: u64,
    pub total_pages: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added,
    Removed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationOutcome {
    /// The new user's id
    Created(i64),
    Rejected(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateProfileOutcome {
    Updated,
    NotFound,
    Rejected(Vec<String>),
}

/// Outcome of a batch import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Heroes fetched and written to the store
    pub saved: u32,
    /// Ids the remote source does not know
    pub skipped: u32,
    /// Ids whose fetch failed (transport or decode)
    pub failed: u32,
}

/// One page of the catalog, optionally filtered by a search term, falling back to the remote
/// source when the local store comes up short.
///
/// The fallback fires when the page is short (fewer than `page_size` rows) AND the term is
/// non-empty: one remote name-search, whose results are upserted, then the local query runs
/// again so pagination and counts stay consistent with the store. At most one remote call per
/// invocation, and a remote failure degrades to local-only results rather than erroring.
pub async fn search_heroes(
    db: &HeroDb,
    source: &impl HeroSource,
    search: &str,
    page: u32,
    page_size: u32,
) -> HeroResult<HeroPage> {
    let skip = page.saturating_sub(1).saturating_mul(page_size);
    let mut heroes = db.find_heroes(search, skip, page_size).await?;

    if heroes.len() < page_size as usize && !search.is_empty() {
        match source.search_by_name(search).await {
            Ok(raw_heroes) => {
                if !raw_heroes.is_empty() {
                    info!("importing {} heroes from remote search for \"{search}\"", raw_heroes.len());
                    for raw_hero in raw_heroes {
                        let hero = Hero::from(raw_hero);
                        if let Err(e) = db.upsert_hero(&hero).await {
                            warn!("failed to save hero {}: {e}", hero.id);
                        }
                    }
                    heroes = db.find_heroes(search, skip, page_size).await?;
                }
            }
            Err(e) => {
                // local results still stand when the remote side is down
                warn!("remote search for \"{search}\" failed: {e}");
            }
        }
    }

    let total = db.count_heroes(search).await?;
    let total_pages = total.div_ceil(u64::from(page_size.max(1)));
    Ok(HeroPage {
        heroes,
        total,
        total_pages,
    })
}

/// An unfiltered catalog page. Never goes remote.
pub async fn list_heroes(db: &HeroDb, page: u32, page_size: u32) -> HeroResult<HeroPage> {
    let skip = page.saturating_sub(1).saturating_mul(page_size);
    let heroes = db.find_heroes("", skip, page_size).await?;
    let total = db.count_heroes("").await?;
    let total_pages = total.div_ceil(u64::from(page_size.max(1)));
    Ok(HeroPage {
        heroes,
        total,
        total_pages,
    })
}

/// Look up a hero by id, trying the store first and falling back to one remote fetch on a miss.
/// A remote hit is persisted before being returned. A remote failure is absorbed: the id is
/// simply not available right now, which reads the same as not found.
pub async fn get_hero(db: &HeroDb, source: &impl HeroSource, hero_id: &str) -> HeroResult<Option<Hero>> {
    if let Some(hero) = db.get_hero(hero_id).await? {
        return Ok(Some(hero));
    }
    match source.fetch_by_id(hero_id).await {
        Ok(Some(raw_hero)) => {
            let hero = Hero::from(raw_hero);
            db.upsert_hero(&hero).await?;
            Ok(Some(hero))
        }
        Ok(None) => Ok(None),
        Err(e) => {
            warn!("remote fetch for hero id \"{hero_id}\" failed: {e}");
            Ok(None)
        }
    }
}

/// Flip a hero's membership in a user's favorite set. Returns `None` if the user or the hero
/// does not exist locally. Any actual flip invalidates the top-heroes cache.
pub async fn toggle_favorite(
    db: &HeroDb,
    cache: &TopHeroesCache,
    user_id: i64,
    hero_id: &str,
) -> HeroResult<Option<ToggleOutcome>> {
    if db.get_hero(hero_id).await?.is_none() {
        debug!("refusing to toggle favorite for unknown hero id \"{hero_id}\"");
        return Ok(None);
    }
    if db.get_user(user_id).await?.is_none() {
        debug!("refusing to toggle favorite for unknown user {user_id}");
        return Ok(None);
    }
    let outcome = if db.remove_favorite(user_id, hero_id).await? {
        ToggleOutcome::Removed
    } else {
        db.add_favorite(user_id, hero_id).await?;
        ToggleOutcome::Added
    };
    cache.invalidate();
    Ok(Some(outcome))
}

/// Add a hero to a user's favorite set. Returns `true` if it was newly added. Invalidates the
/// top-heroes cache only when something actually changed.
pub async fn add_favorite(db: &HeroDb, cache: &TopHeroesCache, user_id: i64, hero_id: &str) -> HeroResult<bool> {
    let added = db.add_favorite(user_id, hero_id).await?;
    if added {
        cache.invalidate();
    }
    Ok(added)
}

/// Remove a hero from a user's favorite set. Returns `true` if it was present. Invalidates the
/// top-heroes cache only when something actually changed.
pub async fn remove_favorite(db: &HeroDb, cache: &TopHeroesCache, user_id: i64, hero_id: &str) -> HeroResult<bool> {
    let removed = db.remove_favorite(user_id, hero_id).await?;
    if removed {
        cache.invalidate();
    }
    Ok(removed)
}

/// Register a new user with pre-hashed credentials. Field validation and uniqueness checks run
/// before the insert so the caller gets friendly messages instead of constraint errors.
pub async fn register_user(
    db: &HeroDb,
    username: &str,
    email: &str,
    password: &str,
    confirm_password: &str,
    password_hash: &str,
) -> HeroResult<RegistrationOutcome> {
    let mut errors = validation::validate_registration(username, email, password, confirm_password);
    if errors.is_empty() {
        if db.get_user_by_email(email).await?.is_some() {
            errors.push("Email is already registered".to_string());
        }
        if db.get_user_by_username(username).await?.is_some() {
            errors.push("Username is already taken".to_string());
        }
    }
    if !errors.is_empty() {
        return Ok(RegistrationOutcome::Rejected(errors));
    }
    let user_id = db.create_user(username, email, password_hash).await?;
    info!("registered user \"{username}\" as user {user_id}");
    Ok(RegistrationOutcome::Created(user_id))
}

/// Replace a user's profile after validating field limits
pub async fn update_profile(db: &HeroDb, user_id: i64, profile: &Profile) -> HeroResult<UpdateProfileOutcome> {
    let errors = validation::validate_profile(&profile.bio, &profile.location, &profile.favorite_hero);
    if !errors.is_empty() {
        return Ok(UpdateProfileOutcome::Rejected(errors));
    }
    if db.update_profile(user_id, profile).await? {
        Ok(UpdateProfileOutcome::Updated)
    } else {
        Ok(UpdateProfileOutcome::NotFound)
    }
}

pub async fn get_user(db: &HeroDb, user_id: i64) -> HeroResult<Option<User>> {
    db.get_user(user_id).await
}

/// Fetch and store every hero id in `[start, end]` from the remote source. Individual failures
/// are counted, not fatal: a long import should survive the odd flaky response.
pub async fn import_heroes(
    db: &HeroDb,
    source: &impl HeroSource,
    start: u32,
    end: u32,
) -> HeroResult<ImportReport> {
    let mut report = ImportReport::default();
    for id in start..=end {
        let hero_id = id.to_string();
        match source.fetch_by_id(&hero_id).await {
            Ok(Some(raw_hero)) => {
                let hero = Hero::from(raw_hero);
                db.upsert_hero(&hero).await?;
                debug!("imported hero {} \"{}\"", hero.id, hero.name);
                report.saved += 1;
            }
            Ok(None) => {
                debug!("skipping hero id \"{hero_id}\": not known to the remote source");
                report.skipped += 1;
            }
            Err(e) => {
                warn!("failed to fetch hero id \"{hero_id}\": {e}");
                report.failed += 1;
            }
        }
        if id != end {
            tokio::time::sleep(IMPORT_RATE_LIMIT_DELAY).await;
        }
    }
    info!(
        "import finished: {} saved, {} skipped, {} failed",
        report.saved, report.skipped, report.failed
    );
    Ok(report)
}
