use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Connected realms
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RealmStatus {
    Up,
    Down,
    /// Upstream occasionally ships values this client does not know yet.
    Unknown,
}

impl RealmStatus {
    pub fn parse(s: &str) -> Self {
        match s {
            "UP" => RealmStatus::Up,
            "DOWN" => RealmStatus::Down,
            _ => RealmStatus::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RealmStatus::Up => "UP",
            RealmStatus::Down => "DOWN",
            RealmStatus::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for RealmStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Population {
    Full,
    High,
    Medium,
    Low,
    NewPlayers,
    Recommended,
    Unknown,
}

impl Population {
    pub fn parse(s: &str) -> Self {
        match s {
            "FULL" => Population::Full,
            "HIGH" => Population::High,
            "MEDIUM" => Population::Medium,
            "LOW" => Population::Low,
            "NEW_PLAYERS" => Population::NewPlayers,
            "RECOMMENDED" => Population::Recommended,
            _ => Population::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Population::Full => "FULL",
            Population::High => "HIGH",
            Population::Medium => "MEDIUM",
            Population::Low => "LOW",
            Population::NewPlayers => "NEW_PLAYERS",
            Population::Recommended => "RECOMMENDED",
            Population::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for Population {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A connected-realm grouping: several game worlds sharing one auction house.
///
/// `realm_names` and `realm_slugs` are index-aligned and always equal length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectedRealm {
    pub id: u32,
    pub realm_names: Vec<String>,
    pub realm_slugs: Vec<String>,
    pub status: RealmStatus,
    pub population: Population,
    pub has_queue: bool,
}

// ---------------------------------------------------------------------------
// Auctions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeLeft {
    Short,
    Medium,
    Long,
    VeryLong,
    Unknown,
}

impl TimeLeft {
    pub fn parse(s: &str) -> Self {
        match s {
            "SHORT" => TimeLeft::Short,
            "MEDIUM" => TimeLeft::Medium,
            "LONG" => TimeLeft::Long,
            "VERY_LONG" => TimeLeft::VeryLong,
            _ => TimeLeft::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeLeft::Short => "SHORT",
            TimeLeft::Medium => "MEDIUM",
            TimeLeft::Long => "LONG",
            TimeLeft::VeryLong => "VERY_LONG",
            TimeLeft::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for TimeLeft {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The item side of a listing. Identical `id` with different `bonus_lists`
/// or `modifiers` is a different tradable — listings are never merged on id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionItem {
    pub id: u32,
    pub bonus_lists: Vec<u32>,
    /// (type, value) pairs in source order.
    pub modifiers: Vec<(i32, i32)>,
}

/// One auction-house listing. Auction IDs are unique within a snapshot only;
/// the source recycles them across snapshots.
///
/// Commodities carry `unit_price`; non-commodity lots carry `bid`/`buyout`.
/// Absent prices stay `None` — zero is a real price, not a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Auction {
    pub id: u64,
    pub item: AuctionItem,
    pub quantity: u32,
    pub time_left: TimeLeft,
    pub unit_price: Option<u64>,
    pub buyout: Option<u64>,
    pub bid: Option<u64>,
}

/// All listings fetched from one auction house in one call.
/// `connected_realm_id == 0` marks the region-wide commodity pool.
/// `fetch_timestamp` is the snapshot instant, shared by every auction here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionData {
    pub connected_realm_id: u32,
    pub auctions: Vec<Auction>,
    pub fetch_timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: u32,
    pub name: String,
    pub quality: String,
    pub level: u32,
    pub item_class: String,
    pub item_subclass: String,
    pub inventory_type: String,
    /// Vendor prices in copper.
    pub purchase_price: u64,
    pub sell_price: u64,
    pub max_count: u32,
    pub is_equippable: bool,
    pub is_stackable: bool,
    pub description: String,
}

// ---------------------------------------------------------------------------
// Recipes & professions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeReagent {
    pub item_id: u32,
    pub item_name: String,
    pub quantity: u32,
}

/// A crafting recipe. `crafted_item_*` are absent for recipes that produce
/// no discrete item (enchants etc.); `crafted_quantity_min..=max` is the
/// output range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: u32,
    pub name: String,
    pub crafted_item_id: Option<u32>,
    pub crafted_item_name: Option<String>,
    pub crafted_quantity_min: u32,
    pub crafted_quantity_max: u32,
    pub reagents: Vec<RecipeReagent>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProfessionKind {
    Primary,
    Secondary,
    Unknown,
}

impl ProfessionKind {
    pub fn parse(s: &str) -> Self {
        match s {
            "PRIMARY" => ProfessionKind::Primary,
            "SECONDARY" => ProfessionKind::Secondary,
            _ => ProfessionKind::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProfessionKind::Primary => "PRIMARY",
            ProfessionKind::Secondary => "SECONDARY",
            ProfessionKind::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for ProfessionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profession {
    pub id: u32,
    pub name: String,
    pub kind: ProfessionKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unseen_enum_values_fall_back_to_unknown() {
        assert_eq!(RealmStatus::parse("MAINTENANCE"), RealmStatus::Unknown);
        assert_eq!(Population::parse("LOCKED"), Population::Unknown);
        assert_eq!(TimeLeft::parse("INSTANT"), TimeLeft::Unknown);
        assert_eq!(ProfessionKind::parse("TERTIARY"), ProfessionKind::Unknown);
    }

    #[test]
    fn enum_round_trip() {
        for tl in [TimeLeft::Short, TimeLeft::Medium, TimeLeft::Long, TimeLeft::VeryLong] {
            assert_eq!(TimeLeft::parse(tl.as_str()), tl);
        }
        assert_eq!(Population::parse(Population::NewPlayers.as_str()), Population::NewPlayers);
    }
}
