use backend::auth::AuthSettings;
use backend::config::Config;
use backend::{api, services, setup_database, setup_logger, AppState};
use warp::Filter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;

    setup_logger(config.log_level, config.log_file.as_deref())?;
    config.log_summary();

    let pool = setup_database(&config.database_url).await?;

    if let Some(seed) = &config.admin {
        let mut conn = pool.acquire().await?;
        let admin = services::user::ensure_admin(&mut conn, seed, config.bcrypt_cost).await?;
        log::info!("admin account: {}", admin.email);
    }

    let state = AppState::new(pool, AuthSettings::from_config(&config));

    let routes = api(state)
        .with(warp::log("backend::api"))
        .with(warp::compression::gzip())
        .with(
            warp::cors()
                .allow_any_origin()
                .allow_methods(vec!["GET", "POST", "PUT", "OPTIONS"])
                .allow_headers(vec!["authorization", "content-type"]),
        );

    let (addr, server) =
        warp::serve(routes).try_bind_with_graceful_shutdown(([0, 0, 0, 0], config.port), async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("failed to install CTRL+C signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        })?;

    log::info!("running server on http://{}/", addr);
    server.await;
    log::info!("server stopped");

    Ok(())
}
