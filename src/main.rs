use std::sync::Arc;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::{middleware::Logger, rt, web, App, HttpServer};
use sqlx::PgPool;

use taskvault::auth::{AuthGuard, PgRevocationStore, RevocationStore, TokenService};
use taskvault::config::Config;
use taskvault::routes;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = Config::from_env();

    let pool = PgPool::connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    let tokens = TokenService::new(config.jwt_secret.as_bytes());
    let store: Arc<dyn RevocationStore> = Arc::new(PgRevocationStore::new(pool.clone()));

    // Revocation entries outlive their usefulness once the token's own
    // expiry passes; sweep them hourly. The first tick also runs at startup.
    {
        let store = Arc::clone(&store);
        rt::spawn(async move {
            let mut interval = rt::time::interval(Duration::from_secs(3600));
            loop {
                interval.tick().await;
                match store.prune_expired().await {
                    Ok(0) => {}
                    Ok(pruned) => log::info!("pruned {} expired revoked tokens", pruned),
                    Err(e) => log::error!("failed to prune revoked tokens: {}", e),
                }
            }
        });
    }

    log::info!(
        "Starting TaskVault server at http://{}:{}",
        config.server_host,
        config.server_port
    );

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(tokens.clone()))
            .app_data(web::Data::from(Arc::clone(&store)))
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .service(routes::health::welcome)
            .service(routes::health::health)
            .service(
                web::scope("/api")
                    .wrap(AuthGuard)
                    .configure(routes::config),
            )
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
