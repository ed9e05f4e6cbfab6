//! Tollgate server
//!
//! Rates calls against time-windowed rate plans, charges prepaid accounts
//! and runs scheduled account actions.

use actix_cors::Cors;
use actix_web::{http::header, middleware, web, App, HttpResponse, HttpServer};
use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tollgate_api::{configure_routes, AppState};
use tollgate_core::config::{AppConfig, LogFormat, LoggingConfig};
use tollgate_services::{AccountService, RatingEngine, Scheduler};
use tollgate_store::Storage;
use tracing::{info, warn};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging
fn init_tracing(logging: &LoggingConfig) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "tollgate={0},tollgate_api={0},tollgate_services={0},tollgate_store={0},actix_web=info",
            logging.level
        ))
    });

    let registry = tracing_subscriber::registry().with(env_filter);
    match logging.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_target(true).with_current_span(true))
            .init(),
        LogFormat::Text => registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .init(),
    }
}

fn cors(origins: Option<&str>) -> Cors {
    let Some(origins) = origins else {
        return Cors::default();
    };

    let origins: Vec<String> = origins
        .split(',')
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
        .collect();
    Cors::default()
        .allowed_origin_fn(move |origin, _req_head| {
            origin
                .to_str()
                .map(|origin| origins.iter().any(|o| o == origin))
                .unwrap_or(false)
        })
        .allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
        .max_age(3600)
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("failed to load configuration")?;
    init_tracing(&config.logging);

    info!("Starting Tollgate v{}", env!("CARGO_PKG_VERSION"));

    let storage = Arc::new(
        Storage::connect(&config.storage)
            .await
            .context("failed to open storage")?,
    );

    let accounts = Arc::new(AccountService::new(storage.clone()));
    let rating = Arc::new(RatingEngine::new(
        storage.clone(),
        accounts.clone(),
        config.rating.clone(),
    ));
    let scheduler = Arc::new(Scheduler::new(storage.clone(), accounts.clone()));

    if config.scheduler.enabled {
        scheduler
            .load_action_timings()
            .await
            .context("failed to load action timings")?;
        tokio::spawn(scheduler.clone().run());
    } else {
        info!("Scheduler disabled");
    }

    let state = web::Data::new(AppState::new(rating, accounts, scheduler));
    let cors_origins = config.server.cors_origins.clone();
    let bind_addr = config.server_addr();
    info!(
        "Starting HTTP server on {} with {} workers",
        bind_addr, config.server.workers
    );

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                let error_message = err.to_string();
                warn!(error = %error_message, "Rejected request body");
                actix_web::error::InternalError::from_response(
                    err,
                    HttpResponse::BadRequest().json(serde_json::json!({
                        "error": "invalid_json",
                        "message": error_message
                    })),
                )
                .into()
            }))
            // Middleware
            .wrap(cors(cors_origins.as_deref()))
            .wrap(TracingLogger::default())
            .wrap(middleware::NormalizePath::trim())
            // Configure routes
            .configure(configure_routes::<Storage>)
    })
    .workers(config.server.workers)
    .client_request_timeout(Duration::from_secs(config.server.timeout_secs))
    .bind(&bind_addr)?
    .run()
    .await?;

    Ok(())
}
