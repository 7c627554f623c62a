use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use clap::Parser;
use lead_api::database::leads::SqliteLeadRepository;
use lead_api::helpers::sessions::SessionRegistry;
use lead_api::{config, helpers, integrations};
use lead_pipeline::{BackgroundNotifier, SystemClock};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::prelude::*;

const PRUNE_INTERVAL_SECS: u64 = 60;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(long)]
    log_file_path: Option<String>,

    /// Config file, defaults to the platform config directory
    #[arg(long)]
    config: Option<PathBuf>,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if let Some(log_path) = args.log_file_path {
        let log_path = std::path::Path::new(&log_path);
        let file_appender = tracing_appender::rolling::never(
            log_path.parent().unwrap_or(std::path::Path::new(".")),
            log_path
                .file_name()
                .unwrap_or(std::ffi::OsStr::new("lead-api.log")),
        );
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        std::mem::forget(guard);

        tracing_subscriber::registry()
            .with(env_filter.clone())
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(true)
                    .with_writer(std::io::stdout),
            )
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(non_blocking),
            )
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let (config, config_path) =
        config::ApiConfig::load(args.config).expect("Failed to load config");
    tracing::info!("Config loaded from {:?}", config_path);

    let (db, db_path) = helpers::database::initialize_database(&config.database)
        .expect("Failed to initialize database");
    tracing::info!("Database initialized at {:?}", db_path);

    let dispatcher = integrations::build_dispatcher(&config.notification)
        .expect("Failed to initialize notification dispatcher");
    // Notifications run on the main runtime so worker shutdown can't cancel them
    let notifier = Arc::new(
        BackgroundNotifier::new(dispatcher).on_runtime(tokio::runtime::Handle::current()),
    );

    let sessions = Arc::new(SessionRegistry::new(
        Arc::new(SqliteLeadRepository::new(db.async_connection.clone())),
        notifier.clone(),
        Arc::new(SystemClock),
        config.submission.orchestrator_settings(),
        config.submission.session_idle(),
        config.submission.max_sessions,
    ));

    let sessions_for_prune = sessions.clone();
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(std::time::Duration::from_secs(PRUNE_INTERVAL_SECS));
        loop {
            interval.tick().await;
            let pruned = sessions_for_prune.prune_idle().await;
            if pruned > 0 {
                tracing::debug!("Pruned {} idle submission sessions", pruned);
            }
        }
    });

    let host = config.server.host.clone();
    let port = config.server.port;
    tracing::info!("Server will listen on {}:{}", host, port);

    let cors_config = config.cors.clone();
    let server = HttpServer::new(move || {
        let cors = if let Some(cors_config) = &cors_config {
            let mut cors_builder = Cors::default();
            for origin in &cors_config.allowed_origins {
                cors_builder = cors_builder.allowed_origin(origin);
            }
            cors_builder
                .allowed_methods(vec!["GET", "POST", "DELETE", "OPTIONS"])
                .allowed_headers(vec!["Accept", "Content-Type"])
                .supports_credentials()
                .max_age(3600)
        } else {
            Cors::default()
                .allow_any_origin()
                .allowed_methods(vec!["GET", "POST", "DELETE", "OPTIONS"])
                .allowed_headers(vec!["Accept", "Content-Type"])
                .max_age(3600)
        };

        App::new()
            .wrap(cors)
            .app_data(web::Data::new(db.clone()))
            .app_data(web::Data::new(sessions.clone()))
            .configure(lead_api::configure)
    })
    .bind((host.as_str(), port))?
    .run();

    let handle = server.handle();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }

        tracing::info!("Ctrl+C received, shutting down...");
        handle.stop(true).await;
    });

    let result = server.await;

    let pending = notifier.pending().await;
    if pending > 0 {
        tracing::info!("Waiting for {} lead notifications to finish", pending);
    }
    notifier.drain().await;

    result
}
