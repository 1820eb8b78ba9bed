mod api;
mod config;
mod dataset;
mod error;
mod fetch;
mod pipeline;
mod storage;
mod types;

use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::api::BlizzardClient;
use crate::config::Config;
use crate::error::Result;
use crate::pipeline::{ComponentOutcome, ExecuteOptions, SnapshotPipeline};
use crate::storage::{ColumnarStore, LocalStore};

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    let api = Arc::new(BlizzardClient::new(&cfg)?);
    let store: Arc<dyn ColumnarStore> = Arc::new(LocalStore::new(&cfg.data_dir)?);
    info!(
        region = %cfg.region,
        data_dir = %store.base_path(),
        max_concurrent = cfg.max_concurrent,
        "harvester starting"
    );

    let pipeline = SnapshotPipeline::new(api, store);

    let report = pipeline
        .execute(ExecuteOptions {
            include_realms: cfg.include_realms,
            include_auctions: cfg.include_auctions,
            include_commodities: cfg.include_commodities,
            realm_ids: cfg.realm_ids.clone(),
            max_concurrent: cfg.max_concurrent,
            combined_auctions: cfg.combined_auctions,
        })
        .await?;

    match &report.realms {
        ComponentOutcome::Completed(realms) => info!(realms = realms.len(), "realms: done"),
        ComponentOutcome::Skipped => info!("realms: skipped"),
        ComponentOutcome::Failed(reason) => warn!(%reason, "realms: failed"),
    }
    match &report.auctions {
        ComponentOutcome::Completed(written) => info!(files = written.len(), "auctions: done"),
        ComponentOutcome::Skipped => info!("auctions: skipped"),
        ComponentOutcome::Failed(reason) => warn!(%reason, "auctions: failed"),
    }
    match &report.commodities {
        ComponentOutcome::Completed(Some(path)) => info!(%path, "commodities: done"),
        ComponentOutcome::Completed(None) => info!("commodities: pool was empty"),
        ComponentOutcome::Skipped => info!("commodities: skipped"),
        ComponentOutcome::Failed(reason) => warn!(%reason, "commodities: failed"),
    }

    // Reference-data snapshots, only when configured.
    if !cfg.item_ids.is_empty() {
        match pipeline.snapshot_items(&cfg.item_ids, cfg.max_concurrent).await {
            Ok(Some(path)) => info!(%path, "items: done"),
            Ok(None) => info!("items: nothing fetched"),
            Err(e) => warn!(error = %e, "items: failed"),
        }
    }
    if !cfg.recipe_ids.is_empty() {
        match pipeline.snapshot_recipes(&cfg.recipe_ids, cfg.max_concurrent).await {
            Ok(Some(path)) => info!(%path, "recipes: done"),
            Ok(None) => info!("recipes: nothing fetched"),
            Err(e) => warn!(error = %e, "recipes: failed"),
        }
    }
    if cfg.include_professions {
        match pipeline.snapshot_professions().await {
            Ok(Some(path)) => info!(%path, "professions: done"),
            Ok(None) => info!("professions: nothing fetched"),
            Err(e) => warn!(error = %e, "professions: failed"),
        }
    }

    let all_failed = report.realms.is_failed()
        && report.auctions.is_failed()
        && report.commodities.is_failed();
    if all_failed {
        return Err(crate::error::AppError::Pipeline(
            "every requested workflow failed".to_string(),
        ));
    }

    Ok(())
}
