use std::io;
use std::net::TcpListener;

use actix_web::web;

use taskforge_auth::config::Config;
use taskforge_auth::seed::seed_admin;
use taskforge_auth::startup;

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let address = format!("{}:{}", config.server_host, config.server_port);
    let url = config.server_url();

    let state = startup::build_state(config)
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;

    if let Err(e) = seed_admin(&state).await {
        log::error!("[seed] Admin seed failed: {}", e);
    }

    let listener = TcpListener::bind(&address)?;
    log::info!("Starting TaskForge auth server at {}", url);
    startup::run(listener, web::Data::new(state))?.await
}
