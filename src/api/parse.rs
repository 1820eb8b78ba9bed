//! Response normalizers: pure functions from raw API payloads to domain
//! records. Every optional lookup has a default — one malformed listing
//! must never abort a whole batch — so these functions do not fail, they
//! substitute sentinels.

use chrono::Utc;
use serde_json::Value;

use crate::types::{
    Auction, AuctionData, AuctionItem, ConnectedRealm, Item, Population, Profession,
    ProfessionKind, RealmStatus, Recipe, RecipeReagent, TimeLeft,
};

/// Extract a realm id from an embedded resource link.
///
/// `".../connected-realm/1234?namespace=dynamic-eu"` → `Some(1234)`.
/// A missing or non-numeric trailing segment yields `None` — that realm is
/// skipped, not fatal.
pub fn realm_id_from_href(href: &str) -> Option<u32> {
    let path = href.split('?').next().unwrap_or(href);
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .and_then(|segment| segment.parse::<u32>().ok())
}

/// Realm ids from the connected-realm index payload.
pub fn parse_realm_index(v: &Value) -> Vec<u32> {
    v.get("connected_realms")
        .and_then(|r| r.as_array())
        .map(|entries| {
            entries
                .iter()
                .filter_map(|e| e.get("href").and_then(|h| h.as_str()))
                .filter_map(realm_id_from_href)
                .collect()
        })
        .unwrap_or_default()
}

/// Connected-realm detail payload → `ConnectedRealm`.
///
/// Defaults: unknown status/population enums fall back to their `Unknown`
/// variant, missing realm names/slugs to empty strings, missing queue flag
/// to `false`. Returns `None` only when the payload carries no realm id at
/// all (nothing to key the record on).
pub fn parse_connected_realm(v: &Value) -> Option<ConnectedRealm> {
    let id = v.get("id").and_then(|i| i.as_u64())? as u32;

    let realms = v
        .get("realms")
        .and_then(|r| r.as_array())
        .cloned()
        .unwrap_or_default();
    let realm_names: Vec<String> = realms
        .iter()
        .map(|r| r.get("name").and_then(|n| n.as_str()).unwrap_or("").to_string())
        .collect();
    let realm_slugs: Vec<String> = realms
        .iter()
        .map(|r| r.get("slug").and_then(|s| s.as_str()).unwrap_or("").to_string())
        .collect();

    let status = v
        .get("status")
        .and_then(|s| s.get("type"))
        .and_then(|t| t.as_str())
        .map(RealmStatus::parse)
        .unwrap_or(RealmStatus::Up);

    let population = v
        .get("population")
        .and_then(|p| p.get("type"))
        .and_then(|t| t.as_str())
        .map(Population::parse)
        .unwrap_or(Population::Medium);

    Some(ConnectedRealm {
        id,
        realm_names,
        realm_slugs,
        status,
        population,
        has_queue: v.get("has_queue").and_then(|q| q.as_bool()).unwrap_or(false),
    })
}

/// Auctions payload → `AuctionData`, stamped with a single fetch timestamp
/// shared by every listing in the batch.
///
/// Per-listing defaults: id 0 (sentinel, kept rather than dropped), item id
/// 0, quantity 1, time_left `Unknown`. Modifier objects flatten to
/// `(type, value)` pairs in source order; missing halves default to 0.
pub fn parse_auction_data(v: &Value, connected_realm_id: u32) -> AuctionData {
    let auctions = v
        .get("auctions")
        .and_then(|a| a.as_array())
        .map(|entries| entries.iter().map(parse_auction).collect())
        .unwrap_or_default();

    AuctionData {
        connected_realm_id,
        auctions,
        fetch_timestamp: Utc::now(),
    }
}

fn parse_auction(v: &Value) -> Auction {
    let item_data = v.get("item");

    let bonus_lists: Vec<u32> = item_data
        .and_then(|i| i.get("bonus_lists"))
        .and_then(|b| b.as_array())
        .map(|ids| ids.iter().filter_map(|b| b.as_u64()).map(|b| b as u32).collect())
        .unwrap_or_default();

    let modifiers: Vec<(i32, i32)> = item_data
        .and_then(|i| i.get("modifiers"))
        .and_then(|m| m.as_array())
        .map(|mods| {
            mods.iter()
                .map(|m| {
                    (
                        m.get("type").and_then(|t| t.as_i64()).unwrap_or(0) as i32,
                        m.get("value").and_then(|x| x.as_i64()).unwrap_or(0) as i32,
                    )
                })
                .collect()
        })
        .unwrap_or_default();

    let item = AuctionItem {
        id: item_data.and_then(|i| i.get("id")).and_then(|i| i.as_u64()).unwrap_or(0) as u32,
        bonus_lists,
        modifiers,
    };

    Auction {
        id: v.get("id").and_then(|i| i.as_u64()).unwrap_or(0),
        item,
        quantity: v.get("quantity").and_then(|q| q.as_u64()).unwrap_or(1) as u32,
        time_left: v
            .get("time_left")
            .and_then(|t| t.as_str())
            .map(TimeLeft::parse)
            .unwrap_or(TimeLeft::Unknown),
        unit_price: v.get("unit_price").and_then(|p| p.as_u64()),
        buyout: v.get("buyout").and_then(|p| p.as_u64()),
        bid: v.get("bid").and_then(|p| p.as_u64()),
    }
}

/// Item detail payload → `Item`. Nested `quality`/`item_class`/
/// `item_subclass`/`inventory_type` objects flatten to their name or type
/// string; missing prices default to 0 copper.
pub fn parse_item(v: &Value) -> Item {
    Item {
        id: v.get("id").and_then(|i| i.as_u64()).unwrap_or(0) as u32,
        name: str_field(v, "name"),
        quality: v
            .get("quality")
            .and_then(|q| q.get("type"))
            .and_then(|t| t.as_str())
            .unwrap_or("COMMON")
            .to_string(),
        level: v.get("level").and_then(|l| l.as_u64()).unwrap_or(0) as u32,
        item_class: nested_name(v, "item_class"),
        item_subclass: nested_name(v, "item_subclass"),
        inventory_type: v
            .get("inventory_type")
            .and_then(|t| t.get("type"))
            .and_then(|t| t.as_str())
            .unwrap_or("")
            .to_string(),
        purchase_price: v.get("purchase_price").and_then(|p| p.as_u64()).unwrap_or(0),
        sell_price: v.get("sell_price").and_then(|p| p.as_u64()).unwrap_or(0),
        max_count: v.get("max_count").and_then(|m| m.as_u64()).unwrap_or(0) as u32,
        is_equippable: v.get("is_equippable").and_then(|b| b.as_bool()).unwrap_or(false),
        is_stackable: v.get("is_stackable").and_then(|b| b.as_bool()).unwrap_or(false),
        description: str_field(v, "description"),
    }
}

/// Recipe detail payload → `Recipe`. Flattens the nested `crafted_item` and
/// `crafted_quantity` sub-objects; each reagent pairs its nested `reagent`
/// object with its own `quantity` (default 1). Recipes with no crafted item
/// keep `None` — some recipes produce no discrete item.
pub fn parse_recipe(v: &Value) -> Recipe {
    let reagents = v
        .get("reagents")
        .and_then(|r| r.as_array())
        .map(|entries| {
            entries
                .iter()
                .map(|entry| {
                    let reagent = entry.get("reagent");
                    RecipeReagent {
                        item_id: reagent
                            .and_then(|r| r.get("id"))
                            .and_then(|i| i.as_u64())
                            .unwrap_or(0) as u32,
                        item_name: reagent
                            .and_then(|r| r.get("name"))
                            .and_then(|n| n.as_str())
                            .unwrap_or("")
                            .to_string(),
                        quantity: entry.get("quantity").and_then(|q| q.as_u64()).unwrap_or(1)
                            as u32,
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    let crafted_item = v.get("crafted_item");
    let crafted_quantity = v.get("crafted_quantity");

    Recipe {
        id: v.get("id").and_then(|i| i.as_u64()).unwrap_or(0) as u32,
        name: str_field(v, "name"),
        crafted_item_id: crafted_item
            .and_then(|c| c.get("id"))
            .and_then(|i| i.as_u64())
            .map(|i| i as u32),
        crafted_item_name: crafted_item
            .and_then(|c| c.get("name"))
            .and_then(|n| n.as_str())
            .map(|n| n.to_string()),
        crafted_quantity_min: crafted_quantity
            .and_then(|q| q.get("minimum"))
            .and_then(|m| m.as_u64())
            .unwrap_or(1) as u32,
        crafted_quantity_max: crafted_quantity
            .and_then(|q| q.get("maximum"))
            .and_then(|m| m.as_u64())
            .unwrap_or(1) as u32,
        reagents,
    }
}

/// Profession index payload → `Vec<Profession>`.
pub fn parse_professions(v: &Value) -> Vec<Profession> {
    v.get("professions")
        .and_then(|p| p.as_array())
        .map(|entries| {
            entries
                .iter()
                .map(|p| Profession {
                    id: p.get("id").and_then(|i| i.as_u64()).unwrap_or(0) as u32,
                    name: str_field(p, "name"),
                    kind: p
                        .get("type")
                        .and_then(|t| t.get("type"))
                        .and_then(|t| t.as_str())
                        .map(ProfessionKind::parse)
                        .unwrap_or(ProfessionKind::Unknown),
                })
                .collect()
        })
        .unwrap_or_default()
}

fn str_field(v: &Value, key: &str) -> String {
    v.get(key).and_then(|s| s.as_str()).unwrap_or("").to_string()
}

fn nested_name(v: &Value, key: &str) -> String {
    v.get(key)
        .and_then(|n| n.get("name"))
        .and_then(|n| n.as_str())
        .unwrap_or("")
        .to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn href_extraction_takes_trailing_segment_before_query() {
        assert_eq!(
            realm_id_from_href("https://eu.api.blizzard.com/data/wow/connected-realm/1234?namespace=dynamic-eu"),
            Some(1234)
        );
        assert_eq!(realm_id_from_href(".../connected-realm/509"), Some(509));
    }

    #[test]
    fn href_extraction_skips_non_numeric_segment() {
        assert_eq!(realm_id_from_href(".../connected-realm/index"), None);
        assert_eq!(realm_id_from_href(""), None);
    }

    #[test]
    fn realm_index_collects_only_parsable_hrefs() {
        let v = json!({
            "connected_realms": [
                {"href": ".../connected-realm/1099?ns=dynamic-eu"},
                {"href": ".../connected-realm/oops"},
                {"href": ".../connected-realm/1305"},
                {"no_href": true},
            ]
        });
        assert_eq!(parse_realm_index(&v), vec![1099, 1305]);
    }

    #[test]
    fn connected_realm_parses_names_and_enums() {
        let v = json!({
            "id": 1099,
            "realms": [
                {"name": "Draenor", "slug": "draenor"},
                {"name": "Dentarg", "slug": "dentarg"},
            ],
            "status": {"type": "UP"},
            "population": {"type": "FULL"},
            "has_queue": true,
        });
        let realm = parse_connected_realm(&v).unwrap();
        assert_eq!(realm.id, 1099);
        assert_eq!(realm.realm_names, vec!["Draenor", "Dentarg"]);
        assert_eq!(realm.realm_slugs, vec!["draenor", "dentarg"]);
        assert_eq!(realm.realm_names.len(), realm.realm_slugs.len());
        assert_eq!(realm.status, RealmStatus::Up);
        assert_eq!(realm.population, Population::Full);
        assert!(realm.has_queue);
    }

    #[test]
    fn connected_realm_defaults_when_fields_missing() {
        let realm = parse_connected_realm(&json!({"id": 509})).unwrap();
        assert!(realm.realm_names.is_empty());
        assert_eq!(realm.status, RealmStatus::Up);
        assert_eq!(realm.population, Population::Medium);
        assert!(!realm.has_queue);
    }

    #[test]
    fn connected_realm_without_id_is_skipped() {
        assert!(parse_connected_realm(&json!({"realms": []})).is_none());
    }

    #[test]
    fn auction_flattens_item_and_modifiers_in_order() {
        let v = json!({
            "auctions": [{
                "id": 987654321,
                "item": {
                    "id": 19019,
                    "bonus_lists": [6654, 1708],
                    "modifiers": [
                        {"type": 9, "value": 70},
                        {"type": 28, "value": 2164},
                    ],
                },
                "quantity": 1,
                "time_left": "VERY_LONG",
                "buyout": 1_500_000u64,
                "bid": 1_200_000u64,
            }]
        });
        let data = parse_auction_data(&v, 1099);
        assert_eq!(data.connected_realm_id, 1099);
        assert_eq!(data.auctions.len(), 1);
        let a = &data.auctions[0];
        assert_eq!(a.id, 987654321);
        assert_eq!(a.item.id, 19019);
        assert_eq!(a.item.bonus_lists, vec![6654, 1708]);
        assert_eq!(a.item.modifiers, vec![(9, 70), (28, 2164)]);
        assert_eq!(a.time_left, TimeLeft::VeryLong);
        assert_eq!(a.buyout, Some(1_500_000));
        assert_eq!(a.bid, Some(1_200_000));
        assert_eq!(a.unit_price, None);
    }

    #[test]
    fn auction_defaults_do_not_abort_the_batch() {
        // Listing with no id at all — sentinel defaults, still one record.
        let v = json!({"auctions": [{}]});
        let data = parse_auction_data(&v, 0);
        assert_eq!(data.auctions.len(), 1);
        let a = &data.auctions[0];
        assert_eq!(a.id, 0);
        assert_eq!(a.item.id, 0);
        assert_eq!(a.quantity, 1);
        assert_eq!(a.time_left, TimeLeft::Unknown);
        assert!(a.item.bonus_lists.is_empty());
        assert!(a.item.modifiers.is_empty());
    }

    #[test]
    fn commodity_auction_keeps_unit_price_only() {
        let v = json!({
            "auctions": [{
                "id": 42,
                "item": {"id": 190396},
                "quantity": 200,
                "unit_price": 8400u64,
                "time_left": "SHORT",
            }]
        });
        let data = parse_auction_data(&v, 0);
        let a = &data.auctions[0];
        assert_eq!(a.unit_price, Some(8400));
        assert_eq!(a.buyout, None);
        assert_eq!(a.bid, None);
        assert_eq!(a.quantity, 200);
    }

    #[test]
    fn empty_auctions_payload_yields_empty_batch() {
        let data = parse_auction_data(&json!({}), 1099);
        assert!(data.auctions.is_empty());
        assert_eq!(data.connected_realm_id, 1099);
    }

    #[test]
    fn item_flattens_nested_categories() {
        let v = json!({
            "id": 19019,
            "name": "Thunderfury, Blessed Blade of the Windseeker",
            "quality": {"type": "LEGENDARY"},
            "level": 80,
            "item_class": {"name": "Weapon"},
            "item_subclass": {"name": "Sword"},
            "inventory_type": {"type": "WEAPON"},
            "purchase_price": 271494,
            "sell_price": 54298,
            "max_count": 1,
            "is_equippable": true,
            "is_stackable": false,
        });
        let item = parse_item(&v);
        assert_eq!(item.quality, "LEGENDARY");
        assert_eq!(item.item_class, "Weapon");
        assert_eq!(item.item_subclass, "Sword");
        assert_eq!(item.inventory_type, "WEAPON");
        assert!(item.is_equippable);
        assert_eq!(item.description, "");
    }

    #[test]
    fn recipe_flattens_crafted_item_and_reagents() {
        let v = json!({
            "id": 1631,
            "name": "Elixir of Minor Defense",
            "crafted_item": {"id": 5997, "name": "Elixir of Minor Defense"},
            "crafted_quantity": {"minimum": 1, "maximum": 1},
            "reagents": [
                {"reagent": {"id": 765, "name": "Silverleaf"}, "quantity": 1},
                {"reagent": {"id": 3371, "name": "Empty Vial"}, "quantity": 1},
            ],
        });
        let recipe = parse_recipe(&v);
        assert_eq!(recipe.crafted_item_id, Some(5997));
        assert_eq!(recipe.crafted_quantity_min, 1);
        assert_eq!(recipe.reagents.len(), 2);
        assert_eq!(recipe.reagents[0].item_id, 765);
        assert_eq!(recipe.reagents[0].item_name, "Silverleaf");
        assert_eq!(recipe.reagents[0].quantity, 1);
    }

    #[test]
    fn recipe_without_crafted_item_keeps_none() {
        let recipe = parse_recipe(&json!({"id": 7, "name": "Enchant Boots"}));
        assert_eq!(recipe.crafted_item_id, None);
        assert_eq!(recipe.crafted_item_name, None);
        assert_eq!(recipe.crafted_quantity_min, 1);
        assert_eq!(recipe.crafted_quantity_max, 1);
        assert!(recipe.reagents.is_empty());
    }

    #[test]
    fn profession_index_maps_kind() {
        let v = json!({
            "professions": [
                {"id": 164, "name": "Blacksmithing", "type": {"type": "PRIMARY"}},
                {"id": 185, "name": "Cooking", "type": {"type": "SECONDARY"}},
                {"id": 999, "name": "Mystery"},
            ]
        });
        let professions = parse_professions(&v);
        assert_eq!(professions.len(), 3);
        assert_eq!(professions[0].kind, ProfessionKind::Primary);
        assert_eq!(professions[1].kind, ProfessionKind::Secondary);
        assert_eq!(professions[2].kind, ProfessionKind::Unknown);
    }
}
