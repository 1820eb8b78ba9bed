//! Domain records → flat tabular form.
//!
//! Column names, order, dtypes and nullability are a contract downstream
//! readers depend on; unlike the lenient normalizer, this layer fails
//! loudly on any mismatch. Nested sequences (bonus lists, modifiers,
//! reagents) are JSON-encoded into string columns, order preserved.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use polars::prelude::*;

use crate::error::Result;
use crate::types::{AuctionData, ConnectedRealm, Item, Profession, Recipe};

pub const REALMS_PATH: &str = "global/connected_realms.parquet";
pub const ITEMS_PATH: &str = "global/items.parquet";
pub const RECIPES_PATH: &str = "global/recipes.parquet";
pub const PROFESSIONS_PATH: &str = "global/professions.parquet";

fn categorical() -> DataType {
    DataType::Categorical(None, CategoricalOrdering::Physical)
}

fn timestamp_utc() -> DataType {
    DataType::Datetime(TimeUnit::Microseconds, Some("UTC".into()))
}

// ---------------------------------------------------------------------------
// Schemas
// ---------------------------------------------------------------------------

pub fn auction_schema(include_partitions: bool) -> Schema {
    let mut schema = Schema::from_iter([
        Field::new("auction_id".into(), DataType::Int64),
        Field::new("item_id".into(), DataType::Int32),
        Field::new("quantity".into(), DataType::Int16),
        Field::new("time_left".into(), categorical()),
        Field::new("unit_price".into(), DataType::Int64),
        Field::new("buyout".into(), DataType::Int64),
        Field::new("bid".into(), DataType::Int64),
        Field::new("bonus_lists".into(), DataType::String),
        Field::new("modifiers".into(), DataType::String),
        Field::new("connected_realm_id".into(), DataType::Int32),
        Field::new("fetch_timestamp".into(), timestamp_utc()),
    ]);
    if include_partitions {
        schema.with_column("date".into(), DataType::String);
        schema.with_column("hour".into(), DataType::String);
    }
    schema
}

pub fn realm_schema() -> Schema {
    Schema::from_iter([
        Field::new("id".into(), DataType::Int32),
        Field::new("realm_names".into(), DataType::String),
        Field::new("realm_slugs".into(), DataType::String),
        Field::new("status".into(), categorical()),
        Field::new("population".into(), categorical()),
        Field::new("has_queue".into(), DataType::Boolean),
    ])
}

pub fn item_schema() -> Schema {
    Schema::from_iter([
        Field::new("id".into(), DataType::Int32),
        Field::new("name".into(), DataType::String),
        Field::new("quality".into(), categorical()),
        Field::new("level".into(), DataType::Int32),
        Field::new("item_class".into(), DataType::String),
        Field::new("item_subclass".into(), DataType::String),
        Field::new("inventory_type".into(), DataType::String),
        Field::new("purchase_price".into(), DataType::Int64),
        Field::new("sell_price".into(), DataType::Int64),
        Field::new("max_count".into(), DataType::Int32),
        Field::new("is_equippable".into(), DataType::Boolean),
        Field::new("is_stackable".into(), DataType::Boolean),
        Field::new("description".into(), DataType::String),
    ])
}

pub fn recipe_schema() -> Schema {
    Schema::from_iter([
        Field::new("id".into(), DataType::Int32),
        Field::new("name".into(), DataType::String),
        Field::new("crafted_item_id".into(), DataType::Int32),
        Field::new("crafted_item_name".into(), DataType::String),
        Field::new("crafted_quantity_min".into(), DataType::Int32),
        Field::new("crafted_quantity_max".into(), DataType::Int32),
        Field::new("reagents".into(), DataType::String),
    ])
}

pub fn profession_schema() -> Schema {
    Schema::from_iter([
        Field::new("id".into(), DataType::Int32),
        Field::new("name".into(), DataType::String),
        Field::new("kind".into(), categorical()),
    ])
}

// ---------------------------------------------------------------------------
// Transformers
// ---------------------------------------------------------------------------

/// One row per auction across all given batches; `Ok(None)` when there are
/// no rows at all — callers must skip the write rather than produce an
/// empty artifact.
///
/// Per-realm and commodity snapshots pass a single batch; combined mode
/// passes one batch per realm. Partition columns derive from each batch's
/// own `fetch_timestamp`.
pub fn auctions_to_frame(
    batches: &[&AuctionData],
    include_partitions: bool,
) -> Result<Option<DataFrame>> {
    let total: usize = batches.iter().map(|b| b.auctions.len()).sum();
    if total == 0 {
        return Ok(None);
    }

    let mut auction_ids: Vec<i64> = Vec::with_capacity(total);
    let mut item_ids: Vec<i32> = Vec::with_capacity(total);
    let mut quantities: Vec<i16> = Vec::with_capacity(total);
    let mut time_lefts: Vec<&str> = Vec::with_capacity(total);
    let mut unit_prices: Vec<Option<i64>> = Vec::with_capacity(total);
    let mut buyouts: Vec<Option<i64>> = Vec::with_capacity(total);
    let mut bids: Vec<Option<i64>> = Vec::with_capacity(total);
    let mut bonus_lists: Vec<String> = Vec::with_capacity(total);
    let mut modifiers: Vec<String> = Vec::with_capacity(total);
    let mut realm_ids: Vec<i32> = Vec::with_capacity(total);
    let mut timestamps: Vec<i64> = Vec::with_capacity(total);
    let mut dates: Vec<String> = Vec::new();
    let mut hours: Vec<String> = Vec::new();

    for batch in batches {
        let ts_micros = batch.fetch_timestamp.timestamp_micros();
        let date = batch.fetch_timestamp.format("%Y-%m-%d").to_string();
        let hour = batch.fetch_timestamp.format("%H").to_string();

        for auction in &batch.auctions {
            auction_ids.push(auction.id as i64);
            item_ids.push(auction.item.id as i32);
            // Stack sizes sit far below i16::MAX; saturate rather than wrap.
            quantities.push(auction.quantity.min(i16::MAX as u32) as i16);
            time_lefts.push(auction.time_left.as_str());
            unit_prices.push(auction.unit_price.map(|p| p as i64));
            buyouts.push(auction.buyout.map(|p| p as i64));
            bids.push(auction.bid.map(|p| p as i64));
            bonus_lists.push(serde_json::to_string(&auction.item.bonus_lists)?);
            modifiers.push(serde_json::to_string(&auction.item.modifiers)?);
            realm_ids.push(batch.connected_realm_id as i32);
            timestamps.push(ts_micros);
            if include_partitions {
                dates.push(date.clone());
                hours.push(hour.clone());
            }
        }
    }

    let mut columns = vec![
        Column::new("auction_id".into(), auction_ids),
        Column::new("item_id".into(), item_ids),
        Column::new("quantity".into(), quantities),
        Column::new("time_left".into(), time_lefts).cast(&categorical())?,
        Column::new("unit_price".into(), unit_prices),
        Column::new("buyout".into(), buyouts),
        Column::new("bid".into(), bids),
        Column::new("bonus_lists".into(), bonus_lists),
        Column::new("modifiers".into(), modifiers),
        Column::new("connected_realm_id".into(), realm_ids),
        Column::new("fetch_timestamp".into(), timestamps).cast(&timestamp_utc())?,
    ];
    if include_partitions {
        columns.push(Column::new("date".into(), dates));
        columns.push(Column::new("hour".into(), hours));
    }

    Ok(Some(DataFrame::new(columns)?))
}

/// One row per connected realm, sorted by id so re-runs with identical
/// upstream data produce identical row content.
pub fn realms_to_frame(realms: &HashMap<u32, ConnectedRealm>) -> Result<Option<DataFrame>> {
    if realms.is_empty() {
        return Ok(None);
    }

    let mut sorted: Vec<&ConnectedRealm> = realms.values().collect();
    sorted.sort_by_key(|r| r.id);

    let ids: Vec<i32> = sorted.iter().map(|r| r.id as i32).collect();
    let names: Vec<String> = sorted.iter().map(|r| r.realm_names.join(",")).collect();
    let slugs: Vec<String> = sorted.iter().map(|r| r.realm_slugs.join(",")).collect();
    let statuses: Vec<&str> = sorted.iter().map(|r| r.status.as_str()).collect();
    let populations: Vec<&str> = sorted.iter().map(|r| r.population.as_str()).collect();
    let has_queue: Vec<bool> = sorted.iter().map(|r| r.has_queue).collect();

    let frame = DataFrame::new(vec![
        Column::new("id".into(), ids),
        Column::new("realm_names".into(), names),
        Column::new("realm_slugs".into(), slugs),
        Column::new("status".into(), statuses).cast(&categorical())?,
        Column::new("population".into(), populations).cast(&categorical())?,
        Column::new("has_queue".into(), has_queue),
    ])?;

    Ok(Some(frame))
}

/// One row per item, sorted by id.
pub fn items_to_frame(items: &HashMap<u32, Item>) -> Result<Option<DataFrame>> {
    if items.is_empty() {
        return Ok(None);
    }

    let mut sorted: Vec<&Item> = items.values().collect();
    sorted.sort_by_key(|i| i.id);

    let frame = DataFrame::new(vec![
        Column::new("id".into(), sorted.iter().map(|i| i.id as i32).collect::<Vec<_>>()),
        Column::new("name".into(), sorted.iter().map(|i| i.name.as_str()).collect::<Vec<_>>()),
        Column::new("quality".into(), sorted.iter().map(|i| i.quality.as_str()).collect::<Vec<_>>())
            .cast(&categorical())?,
        Column::new("level".into(), sorted.iter().map(|i| i.level as i32).collect::<Vec<_>>()),
        Column::new("item_class".into(), sorted.iter().map(|i| i.item_class.as_str()).collect::<Vec<_>>()),
        Column::new("item_subclass".into(), sorted.iter().map(|i| i.item_subclass.as_str()).collect::<Vec<_>>()),
        Column::new("inventory_type".into(), sorted.iter().map(|i| i.inventory_type.as_str()).collect::<Vec<_>>()),
        Column::new("purchase_price".into(), sorted.iter().map(|i| i.purchase_price as i64).collect::<Vec<_>>()),
        Column::new("sell_price".into(), sorted.iter().map(|i| i.sell_price as i64).collect::<Vec<_>>()),
        Column::new("max_count".into(), sorted.iter().map(|i| i.max_count as i32).collect::<Vec<_>>()),
        Column::new("is_equippable".into(), sorted.iter().map(|i| i.is_equippable).collect::<Vec<_>>()),
        Column::new("is_stackable".into(), sorted.iter().map(|i| i.is_stackable).collect::<Vec<_>>()),
        Column::new("description".into(), sorted.iter().map(|i| i.description.as_str()).collect::<Vec<_>>()),
    ])?;

    Ok(Some(frame))
}

/// One row per recipe, sorted by id. Reagents encode as a JSON list of
/// `[item_id, item_name, quantity]` triples in source order.
pub fn recipes_to_frame(recipes: &HashMap<u32, Recipe>) -> Result<Option<DataFrame>> {
    if recipes.is_empty() {
        return Ok(None);
    }

    let mut sorted: Vec<&Recipe> = recipes.values().collect();
    sorted.sort_by_key(|r| r.id);

    let mut reagents: Vec<String> = Vec::with_capacity(sorted.len());
    for recipe in &sorted {
        let triples: Vec<(u32, &str, u32)> = recipe
            .reagents
            .iter()
            .map(|r| (r.item_id, r.item_name.as_str(), r.quantity))
            .collect();
        reagents.push(serde_json::to_string(&triples)?);
    }

    let frame = DataFrame::new(vec![
        Column::new("id".into(), sorted.iter().map(|r| r.id as i32).collect::<Vec<_>>()),
        Column::new("name".into(), sorted.iter().map(|r| r.name.as_str()).collect::<Vec<_>>()),
        Column::new(
            "crafted_item_id".into(),
            sorted.iter().map(|r| r.crafted_item_id.map(|i| i as i32)).collect::<Vec<_>>(),
        ),
        Column::new(
            "crafted_item_name".into(),
            sorted.iter().map(|r| r.crafted_item_name.as_deref()).collect::<Vec<_>>(),
        ),
        Column::new(
            "crafted_quantity_min".into(),
            sorted.iter().map(|r| r.crafted_quantity_min as i32).collect::<Vec<_>>(),
        ),
        Column::new(
            "crafted_quantity_max".into(),
            sorted.iter().map(|r| r.crafted_quantity_max as i32).collect::<Vec<_>>(),
        ),
        Column::new("reagents".into(), reagents),
    ])?;

    Ok(Some(frame))
}

/// One row per profession, sorted by id.
pub fn professions_to_frame(professions: &[Profession]) -> Result<Option<DataFrame>> {
    if professions.is_empty() {
        return Ok(None);
    }

    let mut sorted: Vec<&Profession> = professions.iter().collect();
    sorted.sort_by_key(|p| p.id);

    let frame = DataFrame::new(vec![
        Column::new("id".into(), sorted.iter().map(|p| p.id as i32).collect::<Vec<_>>()),
        Column::new("name".into(), sorted.iter().map(|p| p.name.as_str()).collect::<Vec<_>>()),
        Column::new("kind".into(), sorted.iter().map(|p| p.kind.as_str()).collect::<Vec<_>>())
            .cast(&categorical())?,
    ])?;

    Ok(Some(frame))
}

// ---------------------------------------------------------------------------
// Output paths
// ---------------------------------------------------------------------------

/// `auctions/{date}/{hour}/realm_{id}/auctions_{ts}.parquet`, with realm id
/// 0 (the commodity pool) routed to its own `commodities/` directory.
pub fn auction_path(timestamp: &DateTime<Utc>, realm_id: u32) -> String {
    let date = timestamp.format("%Y-%m-%d");
    let hour = timestamp.format("%H");
    let file_ts = timestamp.format("%Y%m%d%H%M%S");

    if realm_id == 0 {
        format!("auctions/{date}/{hour}/commodities/commodities_{file_ts}.parquet")
    } else {
        format!("auctions/{date}/{hour}/realm_{realm_id}/auctions_{file_ts}.parquet")
    }
}

/// Single-artifact path for combined mode.
pub fn combined_auction_path(timestamp: &DateTime<Utc>) -> String {
    let date = timestamp.format("%Y-%m-%d");
    let hour = timestamp.format("%H");
    let file_ts = timestamp.format("%Y%m%d%H%M%S");
    format!("auctions/{date}/{hour}/combined/auctions_{file_ts}.parquet")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Auction, AuctionItem, Population, RealmStatus, TimeLeft};
    use chrono::TimeZone;

    fn fixed_ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 14, 5, 32).unwrap()
    }

    fn auction(id: u64, item_id: u32) -> Auction {
        Auction {
            id,
            item: AuctionItem {
                id: item_id,
                bonus_lists: vec![6654, 1708],
                modifiers: vec![(9, 70), (28, 2164)],
            },
            quantity: 1,
            time_left: TimeLeft::VeryLong,
            unit_price: None,
            buyout: Some(1_500_000),
            bid: Some(1_200_000),
        }
    }

    fn batch(realm_id: u32, auctions: Vec<Auction>) -> AuctionData {
        AuctionData {
            connected_realm_id: realm_id,
            auctions,
            fetch_timestamp: fixed_ts(),
        }
    }

    fn realm(id: u32) -> ConnectedRealm {
        ConnectedRealm {
            id,
            realm_names: vec!["Draenor".to_string(), "Dentarg".to_string()],
            realm_slugs: vec!["draenor".to_string(), "dentarg".to_string()],
            status: RealmStatus::Up,
            population: Population::Full,
            has_queue: false,
        }
    }

    #[test]
    fn one_row_per_auction() {
        let data = batch(1099, vec![auction(1, 10), auction(2, 11), auction(3, 12)]);
        let frame = auctions_to_frame(&[&data], true).unwrap().unwrap();
        assert_eq!(frame.height(), 3);
    }

    #[test]
    fn empty_batch_is_no_data_not_zero_rows() {
        let data = batch(1099, vec![]);
        assert!(auctions_to_frame(&[&data], true).unwrap().is_none());
        assert!(auctions_to_frame(&[], true).unwrap().is_none());
    }

    #[test]
    fn auction_dtypes_match_contract() {
        let data = batch(1099, vec![auction(1, 10)]);
        let frame = auctions_to_frame(&[&data], true).unwrap().unwrap();

        assert_eq!(frame.column("auction_id").unwrap().dtype(), &DataType::Int64);
        assert_eq!(frame.column("item_id").unwrap().dtype(), &DataType::Int32);
        assert_eq!(frame.column("quantity").unwrap().dtype(), &DataType::Int16);
        assert_eq!(frame.column("unit_price").unwrap().dtype(), &DataType::Int64);
        assert_eq!(
            frame.column("connected_realm_id").unwrap().dtype(),
            &DataType::Int32
        );
        assert!(matches!(
            frame.column("time_left").unwrap().dtype(),
            DataType::Categorical(_, _)
        ));
        assert!(matches!(
            frame.column("fetch_timestamp").unwrap().dtype(),
            DataType::Datetime(TimeUnit::Microseconds, Some(_))
        ));
    }

    #[test]
    fn absent_prices_are_real_nulls() {
        let data = batch(1099, vec![auction(1, 10)]);
        let frame = auctions_to_frame(&[&data], false).unwrap().unwrap();

        let unit_price = frame.column("unit_price").unwrap();
        assert_eq!(unit_price.null_count(), 1);
        let buyout = frame.column("buyout").unwrap().i64().unwrap();
        assert_eq!(buyout.get(0), Some(1_500_000));
    }

    #[test]
    fn nested_sequences_encode_deterministically() {
        let data = batch(1099, vec![auction(1, 10)]);
        let frame = auctions_to_frame(&[&data], false).unwrap().unwrap();

        let bonus = frame.column("bonus_lists").unwrap().str().unwrap();
        assert_eq!(bonus.get(0), Some("[6654,1708]"));
        let modifiers = frame.column("modifiers").unwrap().str().unwrap();
        assert_eq!(modifiers.get(0), Some("[[9,70],[28,2164]]"));
    }

    #[test]
    fn empty_sequences_encode_as_empty_list() {
        let mut a = auction(1, 10);
        a.item.bonus_lists.clear();
        a.item.modifiers.clear();
        let data = batch(1099, vec![a]);
        let frame = auctions_to_frame(&[&data], false).unwrap().unwrap();

        assert_eq!(frame.column("bonus_lists").unwrap().str().unwrap().get(0), Some("[]"));
        assert_eq!(frame.column("modifiers").unwrap().str().unwrap().get(0), Some("[]"));
    }

    #[test]
    fn partition_columns_derive_from_fetch_timestamp() {
        let data = batch(1099, vec![auction(1, 10)]);
        let frame = auctions_to_frame(&[&data], true).unwrap().unwrap();

        assert_eq!(frame.column("date").unwrap().str().unwrap().get(0), Some("2024-01-15"));
        assert_eq!(frame.column("hour").unwrap().str().unwrap().get(0), Some("14"));
    }

    #[test]
    fn partition_columns_absent_when_not_requested() {
        let data = batch(1099, vec![auction(1, 10)]);
        let frame = auctions_to_frame(&[&data], false).unwrap().unwrap();
        assert!(frame.column("date").is_err());
        assert!(frame.column("hour").is_err());
    }

    #[test]
    fn commodity_rows_carry_literal_realm_zero() {
        let data = batch(0, vec![auction(1, 10), auction(2, 11)]);
        let frame = auctions_to_frame(&[&data], true).unwrap().unwrap();

        let realm_ids = frame.column("connected_realm_id").unwrap().i32().unwrap();
        for i in 0..frame.height() {
            assert_eq!(realm_ids.get(i), Some(0));
        }
    }

    #[test]
    fn combined_batches_keep_per_realm_ids() {
        let a = batch(11, vec![auction(1, 10)]);
        let b = batch(13, vec![auction(2, 11), auction(3, 12)]);
        let frame = auctions_to_frame(&[&a, &b], true).unwrap().unwrap();

        assert_eq!(frame.height(), 3);
        let realm_ids = frame.column("connected_realm_id").unwrap().i32().unwrap();
        assert_eq!(realm_ids.get(0), Some(11));
        assert_eq!(realm_ids.get(1), Some(13));
        assert_eq!(realm_ids.get(2), Some(13));
    }

    #[test]
    fn identical_input_yields_identical_rows() {
        let data = batch(1099, vec![auction(1, 10), auction(2, 11)]);
        let first = auctions_to_frame(&[&data], true).unwrap().unwrap();
        let second = auctions_to_frame(&[&data], true).unwrap().unwrap();

        assert_eq!(first.height(), second.height());
        for col in ["auction_id", "item_id", "quantity", "buyout", "bonus_lists", "date", "hour"] {
            let left = first.column(col).unwrap().as_materialized_series();
            let right = second.column(col).unwrap().as_materialized_series();
            assert!(left.equals_missing(right), "column {col} differs");
        }
    }

    #[test]
    fn realms_frame_is_sorted_and_joined() {
        let mut realms = HashMap::new();
        realms.insert(1305, realm(1305));
        realms.insert(509, realm(509));
        realms.insert(1099, realm(1099));

        let frame = realms_to_frame(&realms).unwrap().unwrap();
        assert_eq!(frame.height(), 3);

        let ids = frame.column("id").unwrap().i32().unwrap();
        assert_eq!(ids.get(0), Some(509));
        assert_eq!(ids.get(1), Some(1099));
        assert_eq!(ids.get(2), Some(1305));

        let names = frame.column("realm_names").unwrap().str().unwrap();
        assert_eq!(names.get(0), Some("Draenor,Dentarg"));
    }

    #[test]
    fn empty_realms_yield_no_data() {
        assert!(realms_to_frame(&HashMap::new()).unwrap().is_none());
    }

    #[test]
    fn auction_paths_follow_layout() {
        let ts = fixed_ts();
        assert_eq!(
            auction_path(&ts, 1099),
            "auctions/2024-01-15/14/realm_1099/auctions_20240115140532.parquet"
        );
        assert_eq!(
            auction_path(&ts, 0),
            "auctions/2024-01-15/14/commodities/commodities_20240115140532.parquet"
        );
        assert_eq!(
            combined_auction_path(&ts),
            "auctions/2024-01-15/14/combined/auctions_20240115140532.parquet"
        );
    }

    #[test]
    fn recipe_reagents_encode_as_triples() {
        let mut recipes = HashMap::new();
        recipes.insert(
            1631,
            Recipe {
                id: 1631,
                name: "Elixir of Minor Defense".to_string(),
                crafted_item_id: Some(5997),
                crafted_item_name: Some("Elixir of Minor Defense".to_string()),
                crafted_quantity_min: 1,
                crafted_quantity_max: 1,
                reagents: vec![crate::types::RecipeReagent {
                    item_id: 765,
                    item_name: "Silverleaf".to_string(),
                    quantity: 1,
                }],
            },
        );

        let frame = recipes_to_frame(&recipes).unwrap().unwrap();
        let reagents = frame.column("reagents").unwrap().str().unwrap();
        assert_eq!(reagents.get(0), Some(r#"[[765,"Silverleaf",1]]"#));
    }
}
