use actix_web::middleware::Logger;
use actix_web::{App, HttpServer, web};
use dotenvy::dotenv;

use pushkind_adverts::cache::MemoryCacheStore;
use pushkind_adverts::db::{establish_connection_pool, prepare_database};
use pushkind_adverts::models::config::ServerConfig;
use pushkind_adverts::repository::DieselRepository;
use pushkind_adverts::routes;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let server_config = match ServerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    let pool = match establish_connection_pool(&server_config.database_url) {
        Ok(pool) => pool,
        Err(e) => {
            log::error!("Failed to establish database connection: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = prepare_database(&pool) {
        log::error!("Database is not usable: {e}");
        std::process::exit(1);
    }

    let repo = DieselRepository::new(pool);
    let cache = MemoryCacheStore::new(server_config.cache_capacity);
    let bind = (server_config.bind_address.clone(), server_config.port);

    log::info!("Listening on {}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(web::Data::new(repo.clone()))
            .app_data(web::Data::new(cache.clone()))
            .app_data(web::Data::new(server_config.clone()))
            .configure(routes::configure)
    })
    .bind(bind)?
    .run()
    .await
}
