//! Price aggregation across pricing providers.
//!
//! Every function selects the provider map for exactly one finish. A card
//! quoted only in foil has no non-foil price, and unknown prices are `None`,
//! never zero.

use crate::models::{Card, ProviderPrices};

// ---------------------------------------------------------------------------
// Retail
// ---------------------------------------------------------------------------

/// Highest positive retail quote for the finish, or `None` without quotes.
pub fn highest_retail_price(card: &Card, is_foil: bool) -> Option<f64> {
    quotes(retail(card, is_foil)).reduce(f64::max)
}

/// Lowest positive retail quote for the finish, or `None` without quotes.
pub fn lowest_retail_price(card: &Card, is_foil: bool) -> Option<f64> {
    quotes(retail(card, is_foil)).reduce(f64::min)
}

// ---------------------------------------------------------------------------
// Buylist
// ---------------------------------------------------------------------------

/// Whether any provider offers a positive buylist price for the finish.
pub fn has_buylist_price(card: &Card, is_foil: bool) -> bool {
    let buylist = card.pricing.as_ref().and_then(|p| p.buylist(is_foil));
    quotes(buylist).next().is_some()
}

// ---------------------------------------------------------------------------
// Foil eligibility
// ---------------------------------------------------------------------------

/// Any provider has a foil retail entry (a quote of any value).
pub fn has_foil_pricing(card: &Card) -> bool {
    has_any_quote(retail(card, true))
}

pub fn has_normal_pricing(card: &Card) -> bool {
    has_any_quote(retail(card, false))
}

/// Foil quotes exist but normal quotes do not: the card only exists as foil.
pub fn is_foil_only(card: &Card) -> bool {
    has_foil_pricing(card) && !has_normal_pricing(card)
}

// ---------------------------------------------------------------------------
// PriceRange
// ---------------------------------------------------------------------------

/// Retail range and buylist availability for one finish of a card.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceRange {
    pub low: Option<f64>,
    pub high: Option<f64>,
    pub buylist: bool,
}

impl PriceRange {
    pub fn of(card: &Card, is_foil: bool) -> Self {
        Self {
            low: lowest_retail_price(card, is_foil),
            high: highest_retail_price(card, is_foil),
            buylist: has_buylist_price(card, is_foil),
        }
    }

    /// `"$0.25 - $1.00"`, with `-` for unknown ends.
    pub fn display(&self) -> String {
        format!("{} - {}", format_price(self.low), format_price(self.high))
    }
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

pub fn format_price(price: Option<f64>) -> String {
    match price {
        Some(p) => format!("${:.2}", p),
        None => "-".to_string(),
    }
}

pub fn provider_display_name(provider: &str) -> &str {
    match provider {
        "tcgplayer" => "TCGPlayer",
        "cardkingdom" => "Card Kingdom",
        "cardsphere" => "Card Sphere",
        "cardmarket" => "Card Market",
        other => other,
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn retail(card: &Card, is_foil: bool) -> Option<&ProviderPrices> {
    card.pricing.as_ref().and_then(|p| p.retail(is_foil))
}

fn quotes(prices: Option<&ProviderPrices>) -> impl Iterator<Item = f64> + '_ {
    prices
        .into_iter()
        .flat_map(|map| map.values())
        .filter_map(|price| *price)
        .filter(|price| *price > 0.0)
}

fn has_any_quote(prices: Option<&ProviderPrices>) -> bool {
    prices.is_some_and(|map| map.values().any(|price| price.is_some()))
}
