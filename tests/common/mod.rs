//! Shared fixtures for the integration tests.
//!
//! Provides sample cards with realistic pricing shapes and a stub
//! [`CardLookup`] for import tests that should not touch the network.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::BTreeMap;

use mtg_inventory::csv_codec::CardLookup;
use mtg_inventory::models::{Card, PriceSide, Pricing, ProviderPrices, Rarity};
use mtg_inventory::{InventoryError, Result};

/// Route `log` output through the test harness.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn prices(quotes: &[(&str, Option<f64>)]) -> ProviderPrices {
    quotes
        .iter()
        .map(|(provider, price)| (provider.to_string(), *price))
        .collect()
}

pub fn card(uuid: &str, set_code: &str, name: &str) -> Card {
    Card {
        uuid: uuid.to_string(),
        set_code: set_code.to_string(),
        name: name.to_string(),
        ..Default::default()
    }
}

/// Shivan Dragon: normal and foil retail, normal buylist.
pub fn shivan_dragon() -> Card {
    Card {
        number: "162".to_string(),
        type_line: "Creature — Dragon".to_string(),
        rarity: Rarity::Rare,
        colors: vec!["R".to_string()],
        mana_cost: Some("{4}{R}{R}".to_string()),
        text: Some("Flying\n{R}: Shivan Dragon gets +1/+0 until end of turn.".to_string()),
        artist: Some("Donato Giancola".to_string()),
        power: Some("5".to_string()),
        toughness: Some("5".to_string()),
        pricing: Some(Pricing {
            retail: Some(PriceSide {
                normal: Some(prices(&[
                    ("tcgplayer", Some(0.45)),
                    ("cardkingdom", Some(0.79)),
                    ("cardmarket", None),
                ])),
                foil: Some(prices(&[("tcgplayer", Some(3.1)), ("cardkingdom", Some(4.99))])),
            }),
            buylist: Some(PriceSide {
                normal: Some(prices(&[("cardkingdom", Some(0.1))])),
                foil: None,
            }),
        }),
        ..card("uuid-shivan", "M10", "Shivan Dragon")
    }
}

/// Counterspell: normal retail only.
pub fn counterspell() -> Card {
    Card {
        number: "50".to_string(),
        type_line: "Instant".to_string(),
        rarity: Rarity::Uncommon,
        colors: vec!["U".to_string()],
        mana_cost: Some("{U}{U}".to_string()),
        text: Some("Counter target spell.".to_string()),
        pricing: Some(Pricing {
            retail: Some(PriceSide {
                normal: Some(prices(&[("tcgplayer", Some(1.25))])),
                foil: None,
            }),
            buylist: None,
        }),
        ..card("uuid-counter", "A25", "Counterspell")
    }
}

/// A promo that only exists in foil.
pub fn foil_only_promo() -> Card {
    Card {
        number: "1★".to_string(),
        type_line: "Legendary Creature — Elf".to_string(),
        rarity: Rarity::Mythic,
        colors: vec!["G".to_string(), "W".to_string()],
        pricing: Some(Pricing {
            retail: Some(PriceSide {
                normal: None,
                foil: Some(prices(&[("tcgplayer", Some(12.0))])),
            }),
            buylist: None,
        }),
        ..card("uuid-promo", "PLST", "Selvala, Heart of the Wilds")
    }
}

/// A land without any pricing data.
pub fn forest() -> Card {
    Card {
        number: "280".to_string(),
        type_line: "Basic Land — Forest".to_string(),
        rarity: Rarity::Common,
        ..card("uuid-forest", "M10", "Forest")
    }
}

// ---------------------------------------------------------------------------
// StubLookup
// ---------------------------------------------------------------------------

/// In-memory [`CardLookup`] that records each request.
pub struct StubLookup {
    pub cards: Vec<Card>,
    pub fail: bool,
    pub requests: RefCell<Vec<Vec<String>>>,
}

impl StubLookup {
    pub fn new(cards: Vec<Card>) -> Self {
        Self {
            cards,
            fail: false,
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(Vec::new())
        }
    }
}

impl CardLookup for StubLookup {
    fn cards_by_uuids(&self, uuids: &[String]) -> Result<Vec<Card>> {
        self.requests.borrow_mut().push(uuids.to_vec());
        if self.fail {
            return Err(InventoryError::InvalidResponse("backend unavailable".into()));
        }
        Ok(self
            .cards
            .iter()
            .filter(|c| uuids.contains(&c.uuid))
            .cloned()
            .collect())
    }
}

/// Card JSON as the backend serves it.
pub fn card_json(uuid: &str, set_code: &str, name: &str) -> serde_json::Value {
    serde_json::json!({
        "uuid": uuid,
        "setCode": set_code,
        "number": "1",
        "name": name,
        "type": "Instant",
        "rarity": "common",
        "colors": ["R"],
        "manaCost": "{R}",
        "pricing": {
            "retail": { "normal": { "tcgplayer": 0.5, "cardkingdom": null } },
            "buylist": {}
        },
        "layout": "normal"
    })
}

pub fn extra(pairs: &[(&str, serde_json::Value)]) -> BTreeMap<String, serde_json::Value> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}
