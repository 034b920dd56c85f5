// This file is part of herodex. Copyright © 2025 herodex contributors.
// herodex is licensed under the GNU AGPL v3.0 or any later version. See LICENSE file for full text.

use crate::cli_args::HerodexArgs;
use clap::Parser;
use herodex::cache::TopHeroesCache;
use herodex::db::HeroDb;
use herodex::http::superhero_api::SuperheroApi;
use herodex::{constants, service};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod cli_args;

const DB_OPEN_ERROR_MESSAGE: &str = "Failed to open herodex.sqlite";
const DB_READ_ERROR_MESSAGE: &str = "Failed to read from database";
const DB_WRITE_ERROR_MESSAGE: &str = "Failed to write to database";
const API_KEY_ENV_VAR: &str = "SUPERHERO_API_KEY";

#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    let cli_args = HerodexArgs::parse();
    match cli_args.command {
        #[allow(clippy::print_stderr)]
        Some(cli_args::Command::Init { api_key }) => {
            let api_key = api_key.or_else(|| std::env::var(API_KEY_ENV_VAR).ok());
            if let Some(api_key) = api_key {
                let db = HeroDb::open()
                    .await
                    .unwrap_or_else(|e| panic!("{DB_OPEN_ERROR_MESSAGE}: {e:?}"));
                db.set_api_key(&api_key).await.expect("Failed to set API key");
                db.close().await;
                ExitCode::SUCCESS
            } else {
                eprintln!(
                    "API key must be provided either via command-line parameter or {API_KEY_ENV_VAR} environment variable"
                );
                ExitCode::FAILURE
            }
        }
        #[allow(clippy::print_stdout)]
        #[allow(clippy::print_stderr)]
        Some(cli_args::Command::Import { start, end }) => {
            init_logging();
            let db = HeroDb::open()
                .await
                .unwrap_or_else(|e| panic!("{DB_OPEN_ERROR_MESSAGE}: {e:?}"));
            let api_key = db
                .get_api_key()
                .await
                .unwrap_or_else(|e| panic!("{DB_READ_ERROR_MESSAGE}: {e:?}"))
                .or_else(|| std::env::var(API_KEY_ENV_VAR).ok());
            let Some(api_key) = api_key else {
                eprintln!("no API key configured. Run `herodex init` or set {API_KEY_ENV_VAR}.");
                return ExitCode::FAILURE;
            };
            let source = SuperheroApi::new(api_key);
            let report = service::import_heroes(&db, &source, start, end)
                .await
                .unwrap_or_else(|e| panic!("{DB_WRITE_ERROR_MESSAGE}: {e:?}"));
            println!(
                "imported ids {start}..={end}: {} saved, {} skipped, {} failed",
                report.saved, report.skipped, report.failed
            );
            db.optimize()
                .await
                .unwrap_or_else(|e| panic!("{DB_WRITE_ERROR_MESSAGE}: {e:?}"));
            db.close().await;
            ExitCode::SUCCESS
        }
        #[allow(clippy::print_stdout)]
        Some(cli_args::Command::TopFavorites { limit }) => {
            let db = HeroDb::open()
                .await
                .unwrap_or_else(|e| panic!("{DB_OPEN_ERROR_MESSAGE}: {e:?}"));
            let ranked = herodex::ranking::top_favorited(&db, limit)
                .await
                .unwrap_or_else(|e| panic!("{DB_READ_ERROR_MESSAGE}: {e:?}"));
            if ranked.is_empty() {
                println!("no favorites recorded yet");
            } else {
                for entry in ranked {
                    println!(
                        "{}. {} (ID: {}): {} favorites",
                        entry.rank, entry.hero.name, entry.hero.id, entry.favorite_count
                    );
                }
            }
            db.close().await;
            ExitCode::SUCCESS
        }
        #[allow(clippy::print_stdout)]
        None => {
            init_logging();

            info!(
                "starting {} {} {}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION"),
                constants::GIT_COMMIT_HASH
            );

            let db = HeroDb::open()
                .await
                .unwrap_or_else(|e| panic!("{DB_OPEN_ERROR_MESSAGE}: {e:?}"));
            let hero_count = db
                .hero_count()
                .await
                .unwrap_or_else(|e| panic!("{DB_READ_ERROR_MESSAGE}: {e:?}"));
            let users = db
                .get_users()
                .await
                .unwrap_or_else(|e| panic!("{DB_READ_ERROR_MESSAGE}: {e:?}"));
            println!("catalog: {hero_count} heroes, {} users", users.len());
            if hero_count == 0 {
                println!("the catalog is empty. Run `herodex import <start> <end>` to seed it from the remote API.");
            } else {
                let cache = TopHeroesCache::new();
                let snapshot = cache.read(&db).await;
                for entry in &snapshot.heroes {
                    println!(
                        "{}. {} (ID: {}): {} favorites",
                        entry.rank, entry.hero.name, entry.hero.id, entry.favorite_count
                    );
                }
            }
            db.close().await;
            ExitCode::SUCCESS
        }
    }
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new("info,herodex=debug").expect("Failed to create EnvFilter"))
        .init();
}
