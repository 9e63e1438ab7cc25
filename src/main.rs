//! SMIPE - share Spotify playlists on a map and find listeners nearby

mod api;
mod config;
mod core;
mod db;
mod models;
mod spotify;
mod state;
mod utils;

use std::path::PathBuf;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use crate::config::{Paths, UserConfig, UPLOADS_PREFIX};
use crate::core::NominatimGeocoder;
use crate::db::{run_migrations, setup_sqlite};
use crate::spotify::SpotifyClient;
use crate::state::AppState;

/// SMIPE - playlists on a map
#[derive(Parser, Debug)]
#[command(name = "smipe")]
#[command(version)]
#[command(about = "Share Spotify playlists on a map and discover what people nearby are listening to")]
struct Args {
    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(long, default_value_t = 3000)]
    port: u16,

    /// Enable debug mode
    #[arg(long)]
    debug: bool,

    /// Path to config directory
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to the built web client
    #[arg(long)]
    client: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("{},sqlx=warn", log_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    info!("SMIPE v{} starting...", env!("CARGO_PKG_VERSION"));

    let paths = Paths::init(args.config, args.client)?;
    info!("Config directory: {:?}", paths.config_dir());

    start_smipe(args.host, args.port, &paths).await
}

async fn start_smipe(host: String, port: u16, paths: &Paths) -> Result<()> {
    let config = UserConfig::load()?.with_env_overrides();
    if !config.has_spotify_credentials() {
        warn!(
            "Spotify credentials are not configured. \
             Set SPOTIFY_CLIENT_ID and SPOTIFY_CLIENT_SECRET to enable login."
        );
    }

    info!("Opening database...");
    let db = setup_sqlite(&paths.app_db_path()).await?;
    run_migrations(&db).await?;

    let spotify = SpotifyClient::new(&config).context("Failed to build Spotify client")?;
    let geocoder = NominatimGeocoder::new(&config).context("Failed to build geocoder")?;

    let uploads_dir = paths.uploads_dir();
    let client_path = paths.client_path().to_path_buf();
    let serve_client = client_path.join("index.html").is_file();
    if !serve_client {
        info!("No web client found at {:?}; serving the API only", client_path);
    }

    let state = web::Data::new(AppState::new(
        db,
        config,
        Arc::new(spotify),
        Arc::new(geocoder),
        uploads_dir.clone(),
    ));

    let addr = format!("{}:{}", host, port);
    info!("Server listening on http://{}", addr);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        let mut app = App::new()
            .app_data(state.clone())
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(api::configure)
            .service(actix_files::Files::new(UPLOADS_PREFIX, uploads_dir.clone()));

        // built map and player scripts
        if serve_client {
            app = app.service(
                actix_files::Files::new("/assets", client_path.clone()).index_file("index.html"),
            );
        }
        app
    })
    .bind(addr)?
    .run()
    .await?;

    Ok(())
}
