// This file is part of herodex. Copyright © 2025 herodex contributors.
// herodex is licensed under the GNU AGPL v3.0 or any later version. See LICENSE file for full text.

//! HTTP API calls

use crate::constants;
use std::sync::LazyLock;
use std::time::Duration;

pub mod superhero_api;

static HTTP_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    reqwest::Client::builder()
        .user_agent(constants::USER_AGENT)
        .gzip(true)
        .https_only(true)
        .connect_timeout(Duration::from_secs(6))
        .timeout(Duration::from_secs(10))
        // .connection_verbose(true) // useful for debugging
        .build()
        .expect("failed to build HTTP client")
});
