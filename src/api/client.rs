use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::debug;

use crate::api::auth::TokenProvider;
use crate::api::parse;
use crate::api::GameDataSource;
use crate::config::{api_base_url, token_url, Config, HTTP_TIMEOUT_SECS};
use crate::error::{AppError, Result};
use crate::types::{AuctionData, ConnectedRealm, Item, Profession, Recipe};

/// API namespace families. Realm and auction data live in `dynamic-{region}`;
/// item, recipe and profession reference data in `static-{region}`.
#[derive(Debug, Clone, Copy)]
enum Namespace {
    Dynamic,
    Static,
}

impl Namespace {
    fn as_str(self) -> &'static str {
        match self {
            Namespace::Dynamic => "dynamic",
            Namespace::Static => "static",
        }
    }
}

/// Authenticated Battle.net game-data client.
///
/// Owns one shared HTTP client and a token provider; rate limiting beyond
/// the pipeline's concurrency cap is the server's concern.
pub struct BlizzardClient {
    http: reqwest::Client,
    auth: TokenProvider,
    api_base: String,
    region: String,
    locale: String,
}

impl BlizzardClient {
    pub fn new(cfg: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()?;

        let auth = TokenProvider::new(
            http.clone(),
            token_url(&cfg.region),
            cfg.client_id.clone(),
            cfg.client_secret.clone(),
        );

        Ok(Self {
            http,
            auth,
            api_base: api_base_url(&cfg.region),
            region: cfg.region.clone(),
            locale: cfg.locale.clone(),
        })
    }

    /// Authenticated GET. 404 maps to `Ok(None)` — "does not exist" is a
    /// skip signal, not an error; every other non-success status is an
    /// `AppError::Api`.
    async fn get(&self, endpoint: &str, namespace: Namespace) -> Result<Option<Value>> {
        let token = self.auth.access_token().await?;
        let url = format!("{}{}", self.api_base, endpoint);

        debug!(endpoint, namespace = namespace.as_str(), "GET");

        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .query(&[
                ("namespace", format!("{}-{}", namespace.as_str(), self.region)),
                ("locale", self.locale.clone()),
            ])
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.json().await?)),
            status => Err(AppError::Api {
                status: status.as_u16(),
                endpoint: endpoint.to_string(),
            }),
        }
    }

    /// Like `get`, but for endpoints where a 404 is itself unexpected.
    async fn get_required(&self, endpoint: &str, namespace: Namespace) -> Result<Value> {
        self.get(endpoint, namespace).await?.ok_or(AppError::Api {
            status: 404,
            endpoint: endpoint.to_string(),
        })
    }
}

#[async_trait]
impl GameDataSource for BlizzardClient {
    async fn connected_realm_ids(&self) -> Result<Vec<u32>> {
        let data = self
            .get_required("/data/wow/connected-realm/index", Namespace::Dynamic)
            .await?;
        Ok(parse::parse_realm_index(&data))
    }

    async fn connected_realm(&self, realm_id: u32) -> Result<Option<ConnectedRealm>> {
        let endpoint = format!("/data/wow/connected-realm/{realm_id}");
        let data = self.get(&endpoint, Namespace::Dynamic).await?;
        Ok(data.as_ref().and_then(parse::parse_connected_realm))
    }

    async fn auctions(&self, realm_id: u32) -> Result<AuctionData> {
        let endpoint = format!("/data/wow/connected-realm/{realm_id}/auctions");
        let data = self.get_required(&endpoint, Namespace::Dynamic).await?;
        Ok(parse::parse_auction_data(&data, realm_id))
    }

    async fn commodity_auctions(&self) -> Result<AuctionData> {
        let data = self
            .get_required("/data/wow/auctions/commodities", Namespace::Dynamic)
            .await?;
        // Realm id 0 marks the region-wide pool; no real realm uses it.
        Ok(parse::parse_auction_data(&data, 0))
    }

    async fn item(&self, item_id: u32) -> Result<Option<Item>> {
        let endpoint = format!("/data/wow/item/{item_id}");
        let data = self.get(&endpoint, Namespace::Static).await?;
        Ok(data.as_ref().map(parse::parse_item))
    }

    async fn recipe(&self, recipe_id: u32) -> Result<Option<Recipe>> {
        let endpoint = format!("/data/wow/recipe/{recipe_id}");
        let data = self.get(&endpoint, Namespace::Static).await?;
        Ok(data.as_ref().map(parse::parse_recipe))
    }

    async fn professions(&self) -> Result<Vec<Profession>> {
        let data = self
            .get_required("/data/wow/profession/index", Namespace::Static)
            .await?;
        Ok(parse::parse_professions(&data))
    }
}
