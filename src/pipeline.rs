//! Pipeline orchestration: composes the data source, the bounded fetcher,
//! the dataset transformers and the storage sink into the three snapshot
//! workflows, plus `execute` to run a configured subset of them.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{error, info};

use crate::api::GameDataSource;
use crate::config::DEFAULT_MAX_CONCURRENT;
use crate::dataset::{
    auction_path, auction_schema, auctions_to_frame, combined_auction_path, item_schema,
    items_to_frame, profession_schema, professions_to_frame, realm_schema, realms_to_frame,
    recipe_schema, recipes_to_frame, ITEMS_PATH, PROFESSIONS_PATH, REALMS_PATH, RECIPES_PATH,
};
use crate::error::{AppError, Result};
use crate::fetch::fetch_all;
use crate::storage::ColumnarStore;
use crate::types::{AuctionData, ConnectedRealm};

// ---------------------------------------------------------------------------
// Execute options & report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    pub include_realms: bool,
    pub include_auctions: bool,
    pub include_commodities: bool,
    /// Explicit realm ids for the auction workflow; `None` means all realms.
    pub realm_ids: Option<Vec<u32>>,
    pub max_concurrent: usize,
    /// One combined auctions file instead of one file per realm.
    pub combined_auctions: bool,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            include_realms: true,
            include_auctions: true,
            include_commodities: true,
            realm_ids: None,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            combined_auctions: false,
        }
    }
}

/// Outcome of one toggled workflow inside `execute`. A failure is recorded
/// here instead of aborting sibling workflows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentOutcome<T> {
    Completed(T),
    Skipped,
    Failed(String),
}

impl<T> ComponentOutcome<T> {
    pub fn completed(&self) -> Option<&T> {
        match self {
            ComponentOutcome::Completed(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ComponentOutcome::Failed(_))
    }
}

#[derive(Debug)]
pub struct ExecuteReport {
    pub realms: ComponentOutcome<HashMap<u32, ConnectedRealm>>,
    /// Realm id → written location. In combined mode every non-empty realm
    /// maps to the single combined artifact.
    pub auctions: ComponentOutcome<HashMap<u32, String>>,
    /// Written location, or `None` when the commodity pool was empty.
    pub commodities: ComponentOutcome<Option<String>>,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

pub struct SnapshotPipeline {
    api: Arc<dyn GameDataSource>,
    store: Arc<dyn ColumnarStore>,
}

impl SnapshotPipeline {
    pub fn new(api: Arc<dyn GameDataSource>, store: Arc<dyn ColumnarStore>) -> Self {
        Self { api, store }
    }

    /// Realm metadata snapshot: index → bounded fetch of details → one
    /// whole-file write. Returns the realm map for reuse within the run.
    pub async fn snapshot_realms(
        &self,
        max_concurrent: usize,
    ) -> Result<HashMap<u32, ConnectedRealm>> {
        let ids = self.api.connected_realm_ids().await?;
        info!(realms = ids.len(), "fetched connected-realm index");

        let api = Arc::clone(&self.api);
        let realms = fetch_all(ids, max_concurrent, move |id| {
            let api = Arc::clone(&api);
            async move { api.connected_realm(id).await }
        })
        .await?;

        if let Some(mut frame) = realms_to_frame(&realms)? {
            let schema = realm_schema();
            self.store.write(&mut frame, REALMS_PATH, Some(&schema), None)?;
        }

        info!(realms = realms.len(), "realm metadata snapshot complete");
        Ok(realms)
    }

    /// Per-realm auction snapshot. Realms whose fetch failed are skipped by
    /// the fetcher; realms with zero auctions are skipped at the write step
    /// so no empty artifacts appear. Returns realm id → written location.
    pub async fn snapshot_auctions(
        &self,
        realm_ids: Option<Vec<u32>>,
        max_concurrent: usize,
        combined: bool,
    ) -> Result<HashMap<u32, String>> {
        let ids = match realm_ids {
            Some(ids) => ids,
            None => self.api.connected_realm_ids().await?,
        };

        let api = Arc::clone(&self.api);
        let by_realm: HashMap<u32, AuctionData> = fetch_all(ids, max_concurrent, move |id| {
            let api = Arc::clone(&api);
            async move { api.auctions(id).await.map(Some) }
        })
        .await?;

        let mut written = HashMap::new();

        if combined {
            let mut batches: Vec<&AuctionData> = by_realm
                .values()
                .filter(|batch| !batch.auctions.is_empty())
                .collect();
            batches.sort_by_key(|batch| batch.connected_realm_id);

            if let Some(mut frame) = auctions_to_frame(&batches, true)? {
                let schema = auction_schema(true);
                let path = combined_auction_path(&batches[0].fetch_timestamp);
                let resolved = self.store.write(&mut frame, &path, Some(&schema), None)?;
                for batch in &batches {
                    written.insert(batch.connected_realm_id, resolved.clone());
                }
                info!(realms = batches.len(), rows = frame.height(), "combined auction snapshot written");
            }
        } else {
            let mut realm_order: Vec<u32> = by_realm.keys().copied().collect();
            realm_order.sort_unstable();

            for realm_id in realm_order {
                let batch = &by_realm[&realm_id];
                let Some(mut frame) = auctions_to_frame(&[batch], true)? else {
                    info!(realm_id, "no auctions; skipping write");
                    continue;
                };
                let schema = auction_schema(true);
                let path = auction_path(&batch.fetch_timestamp, realm_id);
                let resolved = self.store.write(&mut frame, &path, Some(&schema), None)?;
                written.insert(realm_id, resolved);
            }
        }

        info!(written = written.len(), "auction snapshot complete");
        Ok(written)
    }

    /// Region-wide commodity snapshot, realm id 0 by convention. One fetch,
    /// no fan-out — an error here is fatal for this workflow.
    pub async fn snapshot_commodities(&self) -> Result<Option<String>> {
        let batch = self.api.commodity_auctions().await?;

        match auctions_to_frame(&[&batch], true)? {
            None => {
                info!("commodity pool empty; nothing written");
                Ok(None)
            }
            Some(mut frame) => {
                let schema = auction_schema(true);
                let path = auction_path(&batch.fetch_timestamp, 0);
                let resolved = self.store.write(&mut frame, &path, Some(&schema), None)?;
                info!(rows = frame.height(), "commodity snapshot written");
                Ok(Some(resolved))
            }
        }
    }

    /// Run the requested subset of workflows. One workflow's failure is
    /// recorded in the report and never aborts the others. When the realm
    /// workflow ran and no explicit realm ids were given, its realm map
    /// seeds the auction workflow's id list.
    pub async fn execute(&self, options: ExecuteOptions) -> Result<ExecuteReport> {
        if options.max_concurrent == 0 {
            return Err(AppError::Config(
                "max_concurrent must be at least 1".to_string(),
            ));
        }

        let mut report = ExecuteReport {
            realms: ComponentOutcome::Skipped,
            auctions: ComponentOutcome::Skipped,
            commodities: ComponentOutcome::Skipped,
        };

        let mut realm_seed: Option<Vec<u32>> = None;

        if options.include_realms {
            match self.snapshot_realms(options.max_concurrent).await {
                Ok(realms) => {
                    let mut ids: Vec<u32> = realms.keys().copied().collect();
                    ids.sort_unstable();
                    realm_seed = Some(ids);
                    report.realms = ComponentOutcome::Completed(realms);
                }
                Err(e) => {
                    error!(error = %e, "realm metadata snapshot failed");
                    report.realms = ComponentOutcome::Failed(e.to_string());
                }
            }
        }

        if options.include_auctions {
            let ids = options.realm_ids.clone().or(realm_seed);
            match self
                .snapshot_auctions(ids, options.max_concurrent, options.combined_auctions)
                .await
            {
                Ok(written) => report.auctions = ComponentOutcome::Completed(written),
                Err(e) => {
                    error!(error = %e, "auction snapshot failed");
                    report.auctions = ComponentOutcome::Failed(e.to_string());
                }
            }
        }

        if options.include_commodities {
            match self.snapshot_commodities().await {
                Ok(path) => report.commodities = ComponentOutcome::Completed(path),
                Err(e) => {
                    error!(error = %e, "commodity snapshot failed");
                    report.commodities = ComponentOutcome::Failed(e.to_string());
                }
            }
        }

        Ok(report)
    }

    // -----------------------------------------------------------------------
    // Reference-data snapshots
    // -----------------------------------------------------------------------

    /// Item reference snapshot for an explicit id list.
    pub async fn snapshot_items(
        &self,
        item_ids: &[u32],
        max_concurrent: usize,
    ) -> Result<Option<String>> {
        let api = Arc::clone(&self.api);
        let items = fetch_all(item_ids.iter().copied(), max_concurrent, move |id| {
            let api = Arc::clone(&api);
            async move { api.item(id).await }
        })
        .await?;

        match items_to_frame(&items)? {
            None => Ok(None),
            Some(mut frame) => {
                let schema = item_schema();
                Ok(Some(self.store.write(&mut frame, ITEMS_PATH, Some(&schema), None)?))
            }
        }
    }

    /// Recipe reference snapshot for an explicit id list.
    pub async fn snapshot_recipes(
        &self,
        recipe_ids: &[u32],
        max_concurrent: usize,
    ) -> Result<Option<String>> {
        let api = Arc::clone(&self.api);
        let recipes = fetch_all(recipe_ids.iter().copied(), max_concurrent, move |id| {
            let api = Arc::clone(&api);
            async move { api.recipe(id).await }
        })
        .await?;

        match recipes_to_frame(&recipes)? {
            None => Ok(None),
            Some(mut frame) => {
                let schema = recipe_schema();
                Ok(Some(self.store.write(&mut frame, RECIPES_PATH, Some(&schema), None)?))
            }
        }
    }

    /// Profession index snapshot (single fetch).
    pub async fn snapshot_professions(&self) -> Result<Option<String>> {
        let professions = self.api.professions().await?;

        match professions_to_frame(&professions)? {
            None => Ok(None),
            Some(mut frame) => {
                let schema = profession_schema();
                Ok(Some(self.store.write(
                    &mut frame,
                    PROFESSIONS_PATH,
                    Some(&schema),
                    None,
                )?))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
