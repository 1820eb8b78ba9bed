//! Battle.net game-data API: capability trait, OAuth token management,
//! HTTP client and response normalizers.

pub mod auth;
pub mod client;
pub mod parse;

pub use client::BlizzardClient;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{AuctionData, ConnectedRealm, Item, Profession, Recipe};

/// Point-read operations against the game-data API.
///
/// Every method performs one authenticated remote call. `Ok(None)` is the
/// not-found signal (the resource does not exist server-side); transient
/// failures surface as `Err` so callers can tell "skip" from "retry-worthy".
#[async_trait]
pub trait GameDataSource: Send + Sync {
    /// All connected-realm IDs in the configured region.
    async fn connected_realm_ids(&self) -> Result<Vec<u32>>;

    async fn connected_realm(&self, realm_id: u32) -> Result<Option<ConnectedRealm>>;

    /// Full auction snapshot for one connected realm.
    async fn auctions(&self, realm_id: u32) -> Result<AuctionData>;

    /// Region-wide commodity snapshot (`connected_realm_id == 0`).
    async fn commodity_auctions(&self) -> Result<AuctionData>;

    async fn item(&self, item_id: u32) -> Result<Option<Item>>;

    async fn recipe(&self, recipe_id: u32) -> Result<Option<Recipe>>;

    async fn professions(&self) -> Result<Vec<Profession>>;
}
