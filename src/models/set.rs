use serde::{Deserialize, Serialize};

use super::card::Card;

// ---------------------------------------------------------------------------
// SetSummary — Set catalog entry (GET /api/v1/sets)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetSummary {
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub keyrune_code: String,
}

// ---------------------------------------------------------------------------
// SetName — Minimal code/name pair (GET /api/v1/set-names)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetName {
    pub code: String,
    pub name: String,
}

// ---------------------------------------------------------------------------
// CardSet — Set with its full card list (POST /api/v1/sets)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardSet {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub keyrune_code: String,
    #[serde(default)]
    pub cards: Vec<Card>,
}
