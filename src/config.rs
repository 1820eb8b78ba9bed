use crate::error::{AppError, Result};

/// HTTP timeout for every Battle.net request (seconds).
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Refresh the OAuth token this many seconds before its reported expiry.
pub const TOKEN_EXPIRY_BUFFER_SECS: u64 = 60;

/// Default ceiling on in-flight API requests per fetch batch.
pub const DEFAULT_MAX_CONCURRENT: usize = 5;

/// Regions served by the Battle.net API. CN lives on a separate gateway.
pub const REGIONS: &[&str] = &["us", "eu", "kr", "tw", "cn"];

/// OAuth token endpoint for a region.
pub fn token_url(region: &str) -> &'static str {
    match region {
        "cn" => "https://oauth.battlenet.com.cn/token",
        _ => "https://oauth.battle.net/token",
    }
}

/// Game-data API base URL for a region.
pub fn api_base_url(region: &str) -> String {
    match region {
        "cn" => "https://gateway.battlenet.com.cn".to_string(),
        r => format!("https://{r}.api.blizzard.com"),
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Battle.net OAuth client ID (BLIZZARD_CLIENT_ID, required)
    pub client_id: String,
    /// Battle.net OAuth client secret (BLIZZARD_CLIENT_SECRET, required)
    pub client_secret: String,
    /// API region: us, eu, kr, tw, cn (BLIZZARD_REGION)
    pub region: String,
    /// Locale for localized response fields (BLIZZARD_LOCALE)
    pub locale: String,
    /// Root directory for Parquet output (DATA_DIR)
    pub data_dir: String,
    pub log_level: String,
    /// Ceiling on in-flight API requests per batch (MAX_CONCURRENT)
    pub max_concurrent: usize,
    /// Explicit connected-realm IDs to fetch auctions for (REALM_IDS,
    /// comma-separated). Empty means "all realms in the region".
    pub realm_ids: Option<Vec<u32>>,
    pub include_realms: bool,
    pub include_auctions: bool,
    pub include_commodities: bool,
    /// Write one combined auctions file instead of one file per realm
    /// (COMBINED_AUCTIONS)
    pub combined_auctions: bool,
    /// Item IDs for the reference-data snapshot (ITEM_IDS, comma-separated)
    pub item_ids: Vec<u32>,
    /// Recipe IDs for the reference-data snapshot (RECIPE_IDS, comma-separated)
    pub recipe_ids: Vec<u32>,
    pub include_professions: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let region = std::env::var("BLIZZARD_REGION")
            .unwrap_or_else(|_| "eu".to_string())
            .to_lowercase();
        if !REGIONS.contains(&region.as_str()) {
            return Err(AppError::Config(format!(
                "BLIZZARD_REGION must be one of {REGIONS:?}, got {region:?}"
            )));
        }

        let max_concurrent = std::env::var("MAX_CONCURRENT")
            .unwrap_or_else(|_| DEFAULT_MAX_CONCURRENT.to_string())
            .parse::<usize>()
            .map_err(|_| AppError::Config("MAX_CONCURRENT must be a positive integer".to_string()))?;
        if max_concurrent == 0 {
            return Err(AppError::Config(
                "MAX_CONCURRENT must be at least 1".to_string(),
            ));
        }

        let realm_ids = match std::env::var("REALM_IDS") {
            Ok(raw) if !raw.trim().is_empty() => Some(parse_id_list("REALM_IDS", &raw)?),
            _ => None,
        };

        Ok(Self {
            client_id: std::env::var("BLIZZARD_CLIENT_ID")
                .map_err(|_| AppError::Config("BLIZZARD_CLIENT_ID is not set".to_string()))?,
            client_secret: std::env::var("BLIZZARD_CLIENT_SECRET")
                .map_err(|_| AppError::Config("BLIZZARD_CLIENT_SECRET is not set".to_string()))?,
            region,
            locale: std::env::var("BLIZZARD_LOCALE").unwrap_or_else(|_| "en_GB".to_string()),
            data_dir: std::env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            max_concurrent,
            realm_ids,
            include_realms: env_flag("INCLUDE_REALMS", true),
            include_auctions: env_flag("INCLUDE_AUCTIONS", true),
            include_commodities: env_flag("INCLUDE_COMMODITIES", true),
            combined_auctions: env_flag("COMBINED_AUCTIONS", false),
            item_ids: std::env::var("ITEM_IDS")
                .ok()
                .filter(|raw| !raw.trim().is_empty())
                .map(|raw| parse_id_list("ITEM_IDS", &raw))
                .transpose()?
                .unwrap_or_default(),
            recipe_ids: std::env::var("RECIPE_IDS")
                .ok()
                .filter(|raw| !raw.trim().is_empty())
                .map(|raw| parse_id_list("RECIPE_IDS", &raw))
                .transpose()?
                .unwrap_or_default(),
            include_professions: env_flag("INCLUDE_PROFESSIONS", false),
        })
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Ok(v) => matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"),
        Err(_) => default,
    }
}

fn parse_id_list(name: &str, raw: &str) -> Result<Vec<u32>> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u32>()
                .map_err(|_| AppError::Config(format!("{name} contains a non-numeric id: {s:?}")))
        })
        .collect()
}
