//! # Flatboard Binary
//!
//! The entry point that assembles the application from configuration and
//! the storage backend selected at compile time.

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use fb_api::guard::Cooldown;
use fb_api::{configure_routes, middleware, AppState};
use fb_config::{LogFormat, Settings};
use fb_core::submission::{Limits, SubmissionPipeline};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[cfg(feature = "storage-flatfile")]
use fb_storage_flatfile::FlatFileBackend;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = fb_config::load_dotenv();
    let settings = Settings::load().context("failed to load configuration")?;
    init_tracing(settings.log_format);

    match dotenv {
        Ok(Some(path)) => info!(path = %path.display(), "loaded environment file"),
        Ok(None) => {}
        Err(e) => warn!("{e}"),
    }

    // 1. Initialize Storage Implementation
    #[cfg(feature = "storage-flatfile")]
    let backend = match FlatFileBackend::open(&settings.data_dir, settings.lock_timeout()) {
        Ok(backend) => backend,
        Err(e) => {
            error!(data_dir = %settings.data_dir.display(), "storage unavailable: {e}");
            return Err(e).context("data directory is not usable");
        }
    };

    // 2. Wrap in AppState, shared by every worker
    let state = web::Data::new(AppState {
        forum: backend.forum_service(),
        pipeline: SubmissionPipeline::new(Limits::default(), settings.default_author.clone()),
        site_name: settings.site_name.clone(),
        threads_per_page: settings.threads_per_page,
        cooldown: Cooldown::new(settings.post_cooldown()),
    });

    info!(
        "Flatboard starting on http://{}:{}",
        settings.host, settings.port
    );

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::standard_middleware())
            .wrap(middleware::security_headers())
            .configure(configure_routes)
    })
    .bind((settings.host.as_str(), settings.port))
    .with_context(|| format!("failed to bind {}:{}", settings.host, settings.port))?
    .run()
    .await?;

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}
