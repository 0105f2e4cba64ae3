use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};

use catalog_admin::config::Config;
use catalog_admin::routes;
use catalog_admin::state::AppState;

fn io_error(err: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, err.to_string())
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env().map_err(|e| {
        log::error!("Failed to load configuration: {}", e);
        io_error(e)
    })?;

    let state = AppState::init(&config).await.map_err(|e| {
        log::error!("Failed to initialize application state: {}", e);
        io_error(e)
    })?;

    let address = config.bind_address();
    log::info!("Starting catalog admin API on {}", address);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(web::Data::new(state.clone()))
            .configure(routes::configure(state.tokens.clone()))
    })
    .bind(address)?
    .run()
    .await
}
