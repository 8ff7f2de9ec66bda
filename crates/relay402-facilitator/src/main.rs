use actix_cors::Cors;
use actix_governor::{Governor, GovernorConfigBuilder};
use actix_web::{web, App, HttpServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use relay402::svm;
use relay402_facilitator::config::FacilitatorConfig;
use relay402_facilitator::provisioner;
use relay402_facilitator::routes;
use relay402_facilitator::state::AppState;

fn build_cors(origins: &[String]) -> Cors {
    if origins.is_empty() {
        // Default: allow localhost on any port
        Cors::default()
            .allowed_origin_fn(|origin, _| {
                origin
                    .to_str()
                    .map(|o| o == "http://localhost" || o.starts_with("http://localhost:"))
                    .unwrap_or(false)
            })
            .allow_any_method()
            .allowed_headers(vec!["content-type", "authorization"])
            .max_age(3600)
    } else {
        let mut cors = Cors::default();
        for origin in origins {
            cors = cors.allowed_origin(origin);
        }
        cors.allow_any_method()
            .allowed_headers(vec!["content-type", "authorization"])
            .max_age(3600)
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match FacilitatorConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    if config.evm_private_key.is_some() {
        match provisioner::evm_signer_address(&config) {
            Ok(address) => tracing::info!("EVM settlement signer: {address}"),
            Err(e) => tracing::warn!("EVM key configured but unusable: {e}"),
        }
    }
    if let Some(key) = config.svm_private_key.as_deref() {
        match svm::fee_payer_from_base58(key) {
            Ok(address) => tracing::info!("SVM fee payer: {address}"),
            Err(e) => tracing::warn!("SVM key configured but unusable: {e}"),
        }
    }
    if config.metrics_token.is_none() {
        tracing::warn!("METRICS_TOKEN not set; /metrics endpoint is disabled");
    }

    let port = config.port;
    let rate_limit_rpm = config.rate_limit_rpm;
    let cors_origins = config.allowed_origins.clone();
    let state = web::Data::new(AppState::new(config));

    tracing::info!("relay402 facilitator listening on port {port}");
    tracing::info!("Rate limit: {rate_limit_rpm} req/min per IP");
    tracing::info!("  GET  http://localhost:{port}/health");
    tracing::info!("  GET  http://localhost:{port}/health/rpc");
    tracing::info!("  GET  http://localhost:{port}/supported");
    tracing::info!("  POST http://localhost:{port}/verify");
    tracing::info!("  POST http://localhost:{port}/settle");

    let governor_conf = GovernorConfigBuilder::default()
        .requests_per_minute(rate_limit_rpm as u64)
        .finish()
        .expect("failed to build rate limiter config");

    HttpServer::new(move || {
        App::new()
            .wrap(build_cors(&cors_origins))
            .wrap(Governor::new(&governor_conf))
            .app_data(state.clone())
            .app_data(web::PayloadConfig::new(65_536))
            .service(routes::health_live)
            .service(routes::health_rpc)
            .service(routes::metrics_endpoint)
            .service(routes::supported_endpoint)
            .service(routes::verify)
            .service(routes::settle)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
