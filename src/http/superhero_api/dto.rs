// This file is part of herodex. Copyright © 2025 herodex contributors.
// herodex is licensed under the GNU AGPL v3.0 or any later version. See LICENSE file for full text.

//! Internal DTOs used only by superhero API response parsing logic

use crate::hero::{Appearance, Biography, Connections, Hero, Image, PowerStats, Work};
use serde::Deserialize;

/// Single-hero lookup envelope. The API abuses HTTP 200 for everything and reports failure
/// in-band via the `response` field.
#[derive(Debug, Deserialize)]
#[serde(tag = "response")]
pub(super) enum HeroResponse {
    #[serde(rename = "success")]
    Success(RawHero),
    #[serde(rename = "error")]
    Error(ApiFailure),
}

/// Name-search envelope. Same in-band error convention as [`HeroResponse`].
#[derive(Debug, Deserialize)]
#[serde(tag = "response")]
pub(super) enum SearchResponse {
    #[serde(rename = "success")]
    Success(SearchResults),
    #[serde(rename = "error")]
    Error(ApiFailure),
}

#[derive(Debug, Deserialize)]
pub(super) struct SearchResults {
    pub results: Vec<RawHero>,
}

/// In-band API failure, e.g. `{"response": "error", "error": "character with given name not found"}`
#[derive(Debug, Deserialize)]
pub(super) struct ApiFailure {
    error: String,
}

impl ApiFailure {
    pub fn message(&self) -> &str {
        self.error.as_str()
    }
}

/// One hero in the API's external schema: string-typed stats (including the literal `"null"`)
/// and kebab-case keys. Convert to [`Hero`] before anything touches the store.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawHero {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub powerstats: RawPowerStats,
    #[serde(default)]
    pub biography: RawBiography,
    #[serde(default)]
    pub appearance: RawAppearance,
    #[serde(default)]
    pub work: RawWork,
    #[serde(default)]
    pub connections: RawConnections,
    #[serde(default)]
    pub image: RawImage,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPowerStats {
    #[serde(default)]
    pub intelligence: String,
    #[serde(default)]
    pub strength: String,
    #[serde(default)]
    pub speed: String,
    #[serde(default)]
    pub durability: String,
    #[serde(default)]
    pub power: String,
    #[serde(default)]
    pub combat: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawBiography {
    #[serde(rename = "full-name")]
    pub full_name: Option<String>,
    #[serde(rename = "alter-egos")]
    pub alter_egos: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(rename = "place-of-birth")]
    pub place_of_birth: Option<String>,
    #[serde(rename = "first-appearance")]
    pub first_appearance: Option<String>,
    pub publisher: Option<String>,
    pub alignment: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAppearance {
    pub gender: Option<String>,
    pub race: Option<String>,
    #[serde(default)]
    pub height: Vec<String>,
    #[serde(default)]
    pub weight: Vec<String>,
    #[serde(rename = "eye-color")]
    pub eye_color: Option<String>,
    #[serde(rename = "hair-color")]
    pub hair_color: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawWork {
    pub occupation: Option<String>,
    pub base: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConnections {
    #[serde(rename = "group-affiliation")]
    pub group_affiliation: Option<String>,
    pub relatives: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawImage {
    pub url: Option<String>,
}

impl From<RawHero> for Hero {
    fn from(raw: RawHero) -> Self {
        Self {
            id: raw.id,
            name: raw.name,
            powerstats: PowerStats {
                intelligence: parse_stat(&raw.powerstats.intelligence),
                strength: parse_stat(&raw.powerstats.strength),
                speed: parse_stat(&raw.powerstats.speed),
                durability: parse_stat(&raw.powerstats.durability),
                power: parse_stat(&raw.powerstats.power),
                combat: parse_stat(&raw.powerstats.combat),
            },
            biography: Biography {
                full_name: raw.biography.full_name,
                alter_egos: raw.biography.alter_egos,
                aliases: raw.biography.aliases,
                place_of_birth: raw.biography.place_of_birth,
                first_appearance: raw.biography.first_appearance,
                publisher: raw.biography.publisher,
                alignment: raw.biography.alignment,
            },
            appearance: Appearance {
                gender: raw.appearance.gender,
                race: raw.appearance.race,
                height: raw.appearance.height,
                weight: raw.appearance.weight,
                eye_color: raw.appearance.eye_color,
                hair_color: raw.appearance.hair_color,
            },
            work: Work {
                occupation: raw.work.occupation,
                base: raw.work.base,
            },
            connections: Connections {
                group_affiliation: raw.connections.group_affiliation,
                relatives: raw.connections.relatives,
            },
            image: Image { url: raw.image.url },
        }
    }
}

/// Parse a stat the API serves as a string. The API returns `"null"` (the literal string) for
/// unknown stats, which falls out of the parse failure path like any other garbage.
fn parse_stat(value: &str) -> i64 {
    value.trim().parse().unwrap_or(0)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_stat() {
        assert_eq!(parse_stat("88"), 88);
        assert_eq!(parse_stat(" 100 "), 100);
        assert_eq!(parse_stat("null"), 0);
        assert_eq!(parse_stat(""), 0);
        assert_eq!(parse_stat("not a number"), 0);
    }

    #[test]
    fn test_hero_response_success() {
        let json = r#"{
            "response": "success",
            "id": "70",
            "name": "Batman",
            "powerstats": {
                "intelligence": "100",
                "strength": "26",
                "speed": "27",
                "durability": "50",
                "power": "47",
                "combat": "100"
            },
            "biography": {
                "full-name": "Bruce Wayne",
                "alter-egos": "No alter egos found.",
                "aliases": ["Insider", "Matches Malone"],
                "place-of-birth": "Crest Hill, Bristol Township; Gotham County",
                "first-appearance": "Detective Comics #27",
                "publisher": "DC Comics",
                "alignment": "good"
            },
            "appearance": {
                "gender": "Male",
                "race": "Human",
                "height": ["6'2", "188 cm"],
                "weight": ["210 lb", "95 kg"],
                "eye-color": "blue",
                "hair-color": "black"
            },
            "work": {
                "occupation": "Businessman",
                "base": "Batcave, Stately Wayne Manor, Gotham City"
            },
            "connections": {
                "group-affiliation": "Batman Family, Justice League",
                "relatives": "Damian Wayne (son)"
            },
            "image": {
                "url": "https://www.superherodb.com/pictures2/portraits/10/100/639.jpg"
            }
        }"#;
        let response: HeroResponse = serde_json::from_str(json).expect("failed to parse envelope");
        let raw = match response {
            HeroResponse::Success(raw) => raw,
            HeroResponse::Error(e) => panic!("expected success, got error: {}", e.message()),
        };
        assert_eq!(raw.id, "70");
        let hero = Hero::from(raw);
        assert_eq!(hero.name, "Batman");
        assert_eq!(hero.powerstats.intelligence, 100);
        assert_eq!(hero.biography.publisher.as_deref(), Some("DC Comics"));
        assert_eq!(hero.biography.aliases.len(), 2);
    }

    #[test]
    fn test_hero_response_error() {
        let json = r#"{"response": "error", "error": "invalid id"}"#;
        let response: HeroResponse = serde_json::from_str(json).expect("failed to parse envelope");
        match response {
            HeroResponse::Success(raw) => panic!("expected error, got hero {}", raw.id),
            HeroResponse::Error(e) => assert_eq!(e.message(), "invalid id"),
        }
    }

    #[test]
    fn test_search_response_not_found() {
        let json = r#"{"response": "error", "error": "character with given name not found"}"#;
        let response: SearchResponse = serde_json::from_str(json).expect("failed to parse envelope");
        assert!(matches!(response, SearchResponse::Error(_)));
    }

    #[test]
    fn test_null_stats_default_to_zero() {
        let raw = RawHero {
            id: "1".to_string(),
            name: "A-Bomb".to_string(),
            powerstats: RawPowerStats {
                intelligence: "null".to_string(),
                strength: "100".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        let hero = Hero::from(raw);
        assert_eq!(hero.powerstats.intelligence, 0);
        assert_eq!(hero.powerstats.strength, 100);
        assert_eq!(hero.powerstats.combat, 0);
    }
}
