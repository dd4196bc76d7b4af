use actix_web::web;
use dotenvy::dotenv;
use restaurant_ordering::config::ServerConfig;
use restaurant_ordering::{build_server, AppState};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = ServerConfig::from_env()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

    let state = web::Data::new(AppState::seeded());

    log::info!(
        "Starting development order service at http://{}:{}",
        config.host,
        config.port
    );

    build_server(state, &config.host, config.port)?.await
}
