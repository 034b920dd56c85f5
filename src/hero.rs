// This file is part of herodex. Copyright © 2025 herodex contributors.
// herodex is licensed under the GNU AGPL v3.0 or any later version. See LICENSE file for full text.

//! Catalog domain types. A [`Hero`] is one catalog entry in the internal schema: the remote API's
//! string-typed stats and kebab-case keys have already been normalized away by the time one of
//! these exists.

use serde::{Deserialize, Serialize};

/// One superhero catalog entry, keyed by the remote API's stable external id.
///
/// The id is unique in the hero store: upserting by id never creates duplicates, and a re-fetch
/// overwrites every field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hero {
    /// External id. Stable across refetches.
    pub id: String,
    pub name: String,
    pub powerstats: PowerStats,
    pub biography: Biography,
    pub appearance: Appearance,
    pub work: Work,
    pub connections: Connections,
    pub image: Image,
}

/// The six numeric stats. The remote API serves these as strings (including the literal `"null"`),
/// so they are parsed on ingest and default to 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerStats {
    pub intelligence: i64,
    pub strength: i64,
    pub speed: i64,
    pub durability: i64,
    pub power: i64,
    pub combat: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Biography {
    pub full_name: Option<String>,
    pub alter_egos: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub place_of_birth: Option<String>,
    pub first_appearance: Option<String>,
    pub publisher: Option<String>,
    pub alignment: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appearance {
    pub gender: Option<String>,
    pub race: Option<String>,
    /// Imperial and metric, e.g. `["6'8", "203 cm"]`
    #[serde(default)]
    pub height: Vec<String>,
    /// Imperial and metric, e.g. `["980 lb", "441 kg"]`
    #[serde(default)]
    pub weight: Vec<String>,
    pub eye_color: Option<String>,
    pub hair_color: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Work {
    pub occupation: Option<String>,
    pub base: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connections {
    pub group_affiliation: Option<String>,
    pub relatives: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub url: Option<String>,
}
