use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

mod auto_hide;
mod auto_post;
mod config;
mod content_risk;
mod controllers;
mod db;
mod facebook;
mod middleware;
mod models;
mod schedule;
mod scheduler;

use auto_hide::{HideSweeper, SweepLimits};
use auto_post::AutoPoster;
use config::Config;
use db::Database;
use facebook::{GraphClient, PageGraph};
use scheduler::Scheduler;

pub struct AppState {
    pub db: Arc<Database>,
    pub config: Config,
    pub graph: Arc<dyn PageGraph>,
    pub sweeper: Arc<HideSweeper>,
    pub poster: Arc<AutoPoster>,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    let port = config.port;

    log::info!("Initializing database at {}", config.database_url);
    let db = Database::new(&config.database_url).expect("Failed to initialize database");
    let db = Arc::new(db);

    log::info!("Using Graph API at {}", config.graph_api_base);
    let graph: Arc<dyn PageGraph> = Arc::new(
        GraphClient::new(&config.graph_api_base).expect("Failed to build Graph API client"),
    );

    let limits = SweepLimits::new(config.auto_hide_fetch_limit, config.auto_hide_batch_cap);
    log::info!(
        "Auto-hide limits: fetch {} posts, hide at most {} per page per sweep",
        limits.fetch_limit,
        limits.batch_cap
    );
    let sweeper = Arc::new(HideSweeper::new(db.clone(), graph.clone(), limits));
    let poster = Arc::new(AutoPoster::new(db.clone(), graph.clone()));

    if config.cron_secret.is_none() {
        log::warn!("CRON_SECRET is not set, cron endpoints are open");
    }

    let shutdown = CancellationToken::new();
    let scheduler_handle = if config.scheduler_enabled {
        log::info!(
            "Initializing scheduler (auto-hide: '{}', auto-post: '{}')",
            config.scheduler.auto_hide_cron,
            config.scheduler.auto_post_cron
        );
        let scheduler = Scheduler::new(sweeper.clone(), poster.clone(), &config.scheduler)
            .unwrap_or_else(|e| panic!("{}", e));
        let cancel = shutdown.clone();
        Some(tokio::spawn(async move {
            scheduler.start(cancel).await;
        }))
    } else {
        log::info!("Scheduler disabled, jobs run only via /api/cron");
        None
    };

    log::info!("Starting PagePilot server on port {}", port);

    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(AppState {
                db: Arc::clone(&db),
                config: config.clone(),
                graph: Arc::clone(&graph),
                sweeper: Arc::clone(&sweeper),
                poster: Arc::clone(&poster),
            }))
            .wrap(Logger::default())
            .wrap(cors)
            .configure(controllers::health::config)
            .configure(controllers::auto_hide::config)
            .configure(controllers::auto_post::config)
            .configure(controllers::cron::config)
            .configure(controllers::quotes::config)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await;

    shutdown.cancel();
    if let Some(handle) = scheduler_handle {
        let _ = handle.await;
    }

    server
}
