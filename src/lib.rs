// This file is part of herodex. Copyright © 2025 herodex contributors.
// herodex is licensed under the GNU AGPL v3.0 or any later version. See LICENSE file for full text.

pub mod cache;
pub mod db;
pub mod error;
pub mod hero;
pub mod http;
pub mod ranking;
pub mod service;
pub mod time;
pub mod validation;

/// Constants generated at build time
pub mod constants {
    include!(env!("CONSTANTS_PATH"));
}
