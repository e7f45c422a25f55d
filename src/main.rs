use std::io;
use std::sync::Arc;

use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};

mod config;
mod credentials;
mod db;
mod errors;
mod handlers;
mod middleware;
mod models;
mod password;
mod state;
mod store;
mod token;

use config::Config;
use state::AppState;
use token::TokenService;

async fn build_state(config: &Config) -> io::Result<AppState> {
    let tokens = TokenService::new(&config.jwt_secret);

    if config.uses_memory_store() {
        log::warn!("Using the in-memory store; data is lost on shutdown");
        return Ok(AppState::new(Arc::new(store::MemoryStore::new()), tokens));
    }

    let database = db::connect(&config.database_url, &config.database_name)
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("MongoDB connection failed: {}", e)))?;
    let mongo = db::MongoStore::init(&database)
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("MongoDB index setup failed: {}", e)))?;

    Ok(AppState::new(Arc::new(mongo), tokens))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = Config::from_env().map_err(|e| {
        log::error!("Invalid configuration: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e)
    })?;

    let state = web::Data::new(build_state(&config).await?);

    log::info!("Listening on {}:{}", config.bind_address, config.port);
    HttpServer::new(move || {
        let state = state.clone();
        App::new()
            .wrap(Logger::default())
            .wrap(handlers::cors())
            .configure(|cfg| handlers::routes(cfg, state))
    })
    .bind((config.bind_address.as_str(), config.port))?
    .run()
    .await
}
