// This file is part of herodex. Copyright © 2025 herodex contributors.
// herodex is licensed under the GNU AGPL v3.0 or any later version. See LICENSE file for full text.

use clap::{Parser, Subcommand};
use herodex::constants::CLAP_VERSION;

/// Superhero catalog backed by the superhero API.
/// If ran with no subcommands a catalog status summary is printed.
#[derive(Parser)]
#[command(version = CLAP_VERSION, long_about, author)]
pub struct HerodexArgs {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Initialize DB with a superhero API key and exit.
    Init {
        /// Superhero API key. Depending on execution environment it may not be secure to pass secrets as a command-line argument.
        /// Instead, you may provide it with the `SUPERHERO_API_KEY` environment variable.
        api_key: Option<String>,
    },
    /// Fetch a range of hero ids from the remote API into the local store
    Import {
        /// First hero id to fetch, inclusive
        start: u32,
        /// Last hero id to fetch, inclusive
        end: u32,
    },
    /// List the most-favorited heroes
    TopFavorites {
        /// How many heroes to list
        #[arg(default_value_t = 10)]
        limit: usize,
    },
}
