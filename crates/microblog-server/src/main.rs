mod config;
mod logging;

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use microblog_api::mail::LogMailer;
use microblog_api::{AppState, AppStateInner};
use microblog_auth::CredentialStore;
use microblog_db::{Database, SeedError};

use crate::config::{Cli, Command, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Serve { bind: None });
    let bind = match &command {
        Command::Serve { bind } => bind.clone(),
        Command::PopulateDb { .. } => None,
    };
    let config = Config::from_env(cli.db_path, bind)?;

    // Init logging
    let _log_guard = logging::init(&config.log_dir)?;

    match command {
        Command::Serve { .. } => serve(config).await,
        Command::PopulateDb { table, json_file } => populate_db(&config, &table, &json_file),
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    config.require_secret()?;

    let db = Database::open(&config.db_path)?;

    let state: AppState = Arc::new(AppStateInner {
        db,
        credentials: CredentialStore::new(config.auth()),
        mailer: Arc::new(LogMailer),
        mail: config.mail(),
        posts_per_page: config.posts_per_page,
    });

    let app = microblog_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.bind_addr.parse()?;
    info!("Microblog listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn populate_db(config: &Config, table: &str, json_file: &std::path::Path) -> anyhow::Result<()> {
    let json = std::fs::read_to_string(json_file)?;
    let db = Database::open(&config.db_path)?;

    match db.populate(table, &json) {
        Ok(count) => {
            println!("Finished populating database ({count} rows)");
            Ok(())
        }
        Err(e @ SeedError::UnknownTable(_)) => {
            error!("{}: {}", e, table);
            println!("{e}");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
