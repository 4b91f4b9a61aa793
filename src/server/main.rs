//! Overlap analysis server.
//!
//! Ranks administrative regions by how much of them a drawn polygon covers,
//! either against local ADM1/ADM2 datasets or against OpenStreetMap
//! boundaries fetched from Overpass.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use url::Url;

use admin_overlap::dataset::{DatasetCache, GeoJsonDirSource};
use admin_overlap::remote::{OverpassClient, DEFAULT_OVERPASS_URL};
use admin_overlap::{FallbackPolicy, GeoKernel, LocalAnalyzer, RemoteAnalyzer};

mod routes;
use routes::{router, AppState};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "server")]
#[command(about = "Administrative overlap ranking server")]
struct Args {
    /// Listen address
    #[arg(short, long, env = "LISTEN", default_value = "0.0.0.0:3000")]
    listen: String,

    /// Directory holding the ADM GeoJSON datasets
    #[arg(long, env = "DATA_DIR", default_value = "data")]
    data_dir: String,

    /// Dataset file prefix, as in `<prefix>_adm1.geojson`
    #[arg(long, env = "DATASET_PREFIX", default_value = "lao")]
    dataset_prefix: String,

    /// Overpass interpreter endpoint
    #[arg(long, env = "OVERPASS_URL", default_value = DEFAULT_OVERPASS_URL)]
    overpass_url: Url,

    /// Client-side timeout for Overpass requests
    #[arg(long, default_value_t = 60)]
    overpass_timeout_secs: u64,

    /// Drop features whose intersections fail instead of estimating them
    #[arg(long)]
    no_centroid_fallback: bool,

    /// Load datasets at startup instead of on first request
    #[arg(long)]
    preload: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    info!("Admin overlap server");

    let source = GeoJsonDirSource::new(&args.data_dir, &args.dataset_prefix);
    info!(
        "Datasets: {}, {}",
        source.path_for(1).display(),
        source.path_for(2).display()
    );

    let policy = if args.no_centroid_fallback {
        FallbackPolicy::Disabled
    } else {
        FallbackPolicy::CentroidUpperBound
    };
    let local = LocalAnalyzer::new(GeoKernel, DatasetCache::new(source), policy);

    if args.preload {
        let loaded = local.datasets().preload();
        if loaded == 0 {
            warn!("No datasets available: {}", local.datasets().provisioning_hint());
        }
    }

    let client = OverpassClient::new(
        args.overpass_url,
        Duration::from_secs(args.overpass_timeout_secs),
    )
    .context("failed to build Overpass client")?;
    let remote = RemoteAnalyzer::new(GeoKernel, client);
    info!("Using Overpass at {}", remote.client().url());

    let app = router(Arc::new(AppState { local, remote }))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    info!("Starting server on {}", args.listen);

    let listener = tokio::net::TcpListener::bind(&args.listen)
        .await
        .with_context(|| format!("failed to bind {}", args.listen))?;
    axum::serve(listener, app).await?;

    Ok(())
}
