use anyhow::{Context, Result};
use axum::{Router, routing::get};
use clap::{Parser, Subcommand};
use incident_directory::{FilterCriteria, IncidentDirectory, RemoteCollection, StrapiClient};
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use tower_http::cors::CorsLayer;
use tower_http::trace::MakeSpan;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::prelude::*;
use uuid::Uuid;

mod cli;
mod config;
mod handlers;
mod metrics;
#[cfg(test)]
mod test_helpers;

use crate::config::{CacheConfig, FileConfig, LocaleConfig, load_config};
use crate::metrics::ServerMetrics;

/// Custom span maker that adds a unique request ID to each incoming request
#[derive(Clone)]
struct RequestIdMakeSpan;

impl<B> MakeSpan<B> for RequestIdMakeSpan {
    fn make_span(&mut self, request: &axum::http::Request<B>) -> tracing::Span {
        let request_id = Uuid::new_v4().to_string();
        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
        )
    }
}

#[derive(Parser)]
#[command(name = "wall")]
#[command(about = "Incident directory API over a Strapi collection")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (missing file = defaults + WALL_* env vars)
    #[arg(long, global = true, default_value = "config.toml")]
    config: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve(ServeArgs),

    /// Print facet statistics for a locale
    Stats(LangArgs),

    /// Print one random incident
    Random(LangArgs),

    /// Print the previous/next slugs of an incident
    Adjacent(AdjacentArgs),
}

#[derive(Parser)]
struct ServeArgs {
    /// Port for the web server (overrides [server].port)
    #[arg(short, long)]
    port: Option<u16>,

    /// Host to bind to (overrides [server].host)
    #[arg(short = 'b', long)]
    host: Option<String>,
}

#[derive(Parser)]
struct LangArgs {
    /// Locale (unknown locales fall back to the default)
    #[arg(short, long)]
    lang: Option<String>,
}

#[derive(Parser)]
struct AdjacentArgs {
    /// Slug of the incident
    slug: String,

    #[command(flatten)]
    lang: LangArgs,

    /// Navigate within this search: incident year
    #[arg(long)]
    year: Option<String>,

    /// Navigate within this search: category
    #[arg(long)]
    category: Option<String>,

    /// Navigate within this search: subject canton
    #[arg(long)]
    canton: Option<String>,

    /// Navigate within this search: subject affiliation
    #[arg(long)]
    affiliation: Option<String>,

    /// Navigate within this search: free text
    #[arg(short, long)]
    query: Option<String>,
}

impl AdjacentArgs {
    fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            year: self.year.clone(),
            category: self.category.clone(),
            region: self.canton.clone(),
            affiliation: self.affiliation.clone(),
            query: self.query.clone(),
            page: None,
            page_size: None,
        }
    }
}

/// The directory as served: any remote collection behind a trait object.
pub(crate) type Directory = IncidentDirectory<Arc<dyn RemoteCollection>>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub directory: Arc<Directory>,
    /// Served locales and the fallback for unknown ones
    pub locales: Arc<LocaleConfig>,
    /// Server metrics for observability
    pub metrics: Arc<ServerMetrics>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.debug);

    let file_config: FileConfig = load_config(&cli.config)
        .extract()
        .with_context(|| format!("Invalid configuration ({})", cli.config.display()))?;
    let locales = LocaleConfig::from_file(&file_config.locales);
    let directory = build_directory(&file_config)?;

    match cli.command {
        Commands::Serve(args) => run_server(args, file_config, directory, locales).await,
        Commands::Stats(args) => {
            cli::stats_command(&directory, locales.resolve(args.lang.as_deref())).await
        }
        Commands::Random(args) => {
            cli::random_command(&directory, locales.resolve(args.lang.as_deref())).await
        }
        Commands::Adjacent(args) => {
            let lang = locales.resolve(args.lang.lang.as_deref());
            cli::adjacent_command(&directory, &args.slug, lang, args.criteria()).await
        }
    }
}

fn init_tracing(debug: bool) {
    let default_directive = if debug {
        "wall=debug,incident_directory=debug,tower_http=debug,info"
    } else {
        "wall=info,incident_directory=info,tower_http=info,warn"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));
    // stderr keeps stdout clean for the one-shot commands' JSON
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}

fn build_directory(file_config: &FileConfig) -> Result<Directory> {
    let strapi = file_config.remote.strapi_config();
    let client = StrapiClient::new(&strapi).context("Failed to build HTTP client")?;
    info!("Remote collection: {}", client.endpoint());

    let remote: Arc<dyn RemoteCollection> = Arc::new(client);
    let cache = CacheConfig::from_file(&file_config.cache);

    Ok(IncidentDirectory::new(remote)
        .with_page_cap(file_config.remote.page_cap)
        .with_listing_ttl(cache.listing_ttl)
        .with_stats_ttl(cache.stats_ttl))
}

fn build_router(state: AppState) -> Router {
    Router::new()
        // Directory routes
        .route("/api/incidents", get(handlers::list_incidents))
        .route("/api/incidents/{slug}", get(handlers::get_incident))
        .route("/api/search", get(handlers::search_incidents))
        .route("/api/stats", get(handlers::stats_handler))
        .route("/api/random", get(handlers::random_incident))
        .route("/api/sitemap", get(handlers::sitemap_handler))
        // Health endpoints
        .route("/health", get(handlers::health_handler))
        .route("/health/live", get(handlers::health_live_handler))
        .route("/metrics", get(handlers::metrics_handler))
        .layer(TraceLayer::new_for_http().make_span_with(RequestIdMakeSpan))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn run_server(
    args: ServeArgs,
    file_config: FileConfig,
    directory: Directory,
    locales: LocaleConfig,
) -> Result<()> {
    info!("Starting incident directory server");

    info!(
        "Locales: {} (default {})",
        locales.supported().join(", "),
        locales.default_locale()
    );
    info!(
        "Cache TTLs: listings={}s, stats={}s",
        file_config.cache.listing_ttl_secs, file_config.cache.stats_ttl_secs
    );

    let app_state = AppState {
        directory: Arc::new(directory),
        locales: Arc::new(locales),
        metrics: Arc::new(ServerMetrics::new()),
    };

    let app = build_router(app_state);

    let host = args
        .host
        .or(file_config.server.host)
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let port = args.port.or(file_config.server.port).unwrap_or(3000);
    let addr = format!("{host}:{port}")
        .parse::<SocketAddr>()
        .with_context(|| format!("Invalid listen address {host}:{port}"))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    let actual_addr = listener.local_addr()?;

    info!("Listening on http://{}", actual_addr);
    info!("API endpoints:");
    info!("  GET /api/incidents        - Unfiltered listing page");
    info!("  GET /api/search           - Filtered listing page");
    info!("  GET /api/incidents/:slug  - Incident with neighbors");
    info!("  GET /api/stats            - Facet statistics");
    info!("  GET /api/random           - Redirect to a random incident");
    info!("  GET /api/sitemap          - Slugs and modification times");

    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received shutdown signal");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .context("Server error")?;

    info!("Shutdown complete");
    Ok(())
}
