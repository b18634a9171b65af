mod config;
mod db;
mod entities;
mod error;
mod follows;
mod models;
mod routes;
mod search;
mod theaters;
mod tmdb;
mod users;
mod viewing_records;
mod wishlists;

use std::{sync::Arc, time::Duration};

use sea_orm::DatabaseConnection;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    config::Config, follows::FollowStore, theaters::TheaterStore, tmdb::TmdbClient,
    users::UserStore, viewing_records::ViewingRecordStore, wishlists::WishlistStore,
};

pub struct AppState {
    pub users: UserStore,
    pub follows: FollowStore,
    pub theaters: TheaterStore,
    pub records: ViewingRecordStore,
    pub wishlists: WishlistStore,
    pub tmdb: TmdbClient,
}

impl AppState {
    pub fn new(db: DatabaseConnection, tmdb: TmdbClient) -> Self {
        Self {
            users: UserStore::new(db.clone()),
            follows: FollowStore::new(db.clone()),
            theaters: TheaterStore::new(db.clone()),
            records: ViewingRecordStore::new(db.clone()),
            wishlists: WishlistStore::new(db),
            tmdb,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,cinelog=debug,sqlx=warn".to_string()),
        )
        .init();

    let config = Config::from_env()?;

    let http = reqwest::Client::builder()
        .user_agent("cinelog/0.1")
        .timeout(Duration::from_secs(30))
        .build()?;

    let db = db::connect_and_migrate(config.database_url.as_str()).await?;

    let tmdb = TmdbClient::new(
        http,
        config.tmdb_access_token.clone(),
        config.tmdb_base_url.clone(),
        config.tmdb_rps,
    );

    let state = Arc::new(AppState::new(db, tmdb));

    if let Some(path) = &config.theater_seed_path {
        state.theaters.seed_from_file(path).await?;
    }

    let app = routes::router(state)
        .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
