// This file is part of herodex. Copyright © 2025 herodex contributors.
// herodex is licensed under the GNU AGPL v3.0 or any later version. See LICENSE file for full text.

//! Superhero API calls and response objects

mod dto;
mod error;

use super::HTTP_CLIENT;
use crate::service::HeroSource;
pub use dto::RawHero;
pub use error::{ApiError, ApiResult};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use tracing::debug;

const API_BASE_URL: &str = "https://superheroapi.com/api/";

/// Fetch a single hero by its external id, or `None` if the API does not know the id.
///
/// The API reports unknown ids in-band with an HTTP 200, so only transport and decode problems
/// surface as errors.
pub async fn fetch_hero(api_key: &str, hero_id: &str) -> ApiResult<Option<RawHero>> {
    let response = HTTP_CLIENT
        .get(format!("{API_BASE_URL}{api_key}/{hero_id}"))
        .send()
        .await
        .map_err(|e| ApiError::from_request("/<id>", e))?;
    if !response.status().is_success() {
        return Err(ApiError::from_response("/<id>", response).await);
    }
    let bytes = response.bytes().await.map_err(|e| ApiError::from_read("/<id>", e))?;
    let response: dto::HeroResponse = serde_json::from_slice(&bytes).map_err(ApiError::from_json)?;
    match response {
        dto::HeroResponse::Success(raw_hero) => Ok(Some(raw_hero)),
        dto::HeroResponse::Error(failure) => {
            debug!("could not look up hero id \"{hero_id}\": {}", failure.message());
            Ok(None)
        }
    }
}

/// Search heroes by name. Returns an empty vec if nothing matched.
///
/// The API's name match is its own affair (it does substring matching server-side); we pass the
/// term through verbatim, percent-encoded.
pub async fn search_heroes(api_key: &str, name: &str) -> ApiResult<Vec<RawHero>> {
    let encoded_name = utf8_percent_encode(name, NON_ALPHANUMERIC);
    let response = HTTP_CLIENT
        .get(format!("{API_BASE_URL}{api_key}/search/{encoded_name}"))
        .send()
        .await
        .map_err(|e| ApiError::from_request("/search/<name>", e))?;
    if !response.status().is_success() {
        return Err(ApiError::from_response("/search/<name>", response).await);
    }
    let bytes = response
        .bytes()
        .await
        .map_err(|e| ApiError::from_read("/search/<name>", e))?;
    let response: dto::SearchResponse = serde_json::from_slice(&bytes).map_err(ApiError::from_json)?;
    match response {
        dto::SearchResponse::Success(results) => Ok(results.results),
        dto::SearchResponse::Error(failure) => {
            debug!("name search for \"{name}\" matched nothing: {}", failure.message());
            Ok(Vec::new())
        }
    }
}

/// The live remote hero source. Holds the API key; everything else lives in the process-wide
/// HTTP client.
pub struct SuperheroApi {
    api_key: String,
}

impl SuperheroApi {
    pub fn new(api_key: String) -> Self {
        Self { api_key }
    }
}

impl HeroSource for SuperheroApi {
    async fn fetch_by_id(&self, hero_id: &str) -> ApiResult<Option<RawHero>> {
        fetch_hero(&self.api_key, hero_id).await
    }

    async fn search_by_name(&self, name: &str) -> ApiResult<Vec<RawHero>> {
        search_heroes(&self.api_key, name).await
    }
}
