use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, http, middleware::NormalizePath, web};
use tracing_actix_web::TracingLogger;

use geonix_backend::{
    AppState,
    graceful_shutdown::shutdown_signal,
    mailer::{Mailer, SmtpMailer},
    routes::configure_routes,
    settings::AppConfig,
};

fn build_cors(origins: &[String]) -> Cors {
    let cors = Cors::default()
        .allowed_methods(vec!["GET", "POST"])
        .allowed_headers(vec![http::header::CONTENT_TYPE])
        .max_age(3600);

    if origins.iter().any(|o| o == "*") {
        cors.allow_any_origin()
    } else {
        origins
            .iter()
            .fold(cors, |cors, origin| cors.allowed_origin(origin))
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt::init();

    let config = match AppConfig::new() {
        Ok(cfg) => {
            tracing::info!("Loaded configuration: {:?}", cfg);
            cfg
        }
        Err(e) => {
            tracing::error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    match config.mail.relay() {
        Some(relay) => tracing::info!("Mail relay configured: {}:{}", relay.host, relay.port),
        None => tracing::warn!(
            "Mail relay not configured; submissions will be answered with server_not_configured"
        ),
    }

    let mailer: Arc<dyn Mailer> = Arc::new(SmtpMailer::new(config.mail.clone()));
    let app_state = web::Data::new(AppState::new(&config, mailer));

    let server_addr = format!("{}:{}", config.host, config.port);
    tracing::info!(
        "Starting {} v{} on {}",
        config.name,
        env!("CARGO_PKG_VERSION"),
        server_addr
    );

    let cors_origins = config.cors_origins();
    let server = HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(NormalizePath::trim())
            .wrap(TracingLogger::default())
            .wrap(build_cors(&cors_origins))
            .configure(configure_routes)
    })
    .workers(config.worker_count)
    .bind(server_addr)?
    .run();

    tokio::select! {
        res = server => res,
        _ = shutdown_signal() => Ok(()),
    }
}
