//! Stable keys for a card printing in a given finish.
//!
//! An identity has the form `{uuid}_{setCode}_{foil|normal}`, so the foil and
//! non-foil copies of one printing are always distinct collection lines.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::Card;

// ---------------------------------------------------------------------------
// Finish
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Finish {
    #[default]
    Normal,
    Foil,
}

impl Finish {
    pub fn from_foil(is_foil: bool) -> Self {
        if is_foil {
            Finish::Foil
        } else {
            Finish::Normal
        }
    }

    pub fn is_foil(self) -> bool {
        self == Finish::Foil
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Finish::Normal => "normal",
            Finish::Foil => "foil",
        }
    }
}

impl fmt::Display for Finish {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// CardIdentity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardIdentity(String);

/// Components recovered from an identity string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedIdentity {
    pub uuid: String,
    pub set_code: String,
    pub finish: Finish,
}

impl CardIdentity {
    pub fn new(uuid: &str, set_code: &str, finish: Finish) -> Self {
        CardIdentity(format!("{}_{}_{}", uuid, set_code, finish))
    }

    /// Identity of `card` in the given finish.
    pub fn of(card: &Card, is_foil: bool) -> Self {
        Self::new(&card.uuid, &card.set_code, Finish::from_foil(is_foil))
    }

    /// Resolve the finish the way callers holding either a catalog card or a
    /// collection entry expect: an explicit override wins, then the entry's
    /// own flag, then non-foil.
    pub fn resolve(card: &Card, own_foil: Option<bool>, foil_override: Option<bool>) -> Self {
        let is_foil = foil_override.or(own_foil).unwrap_or(false);
        Self::of(card, is_foil)
    }

    /// Split an identity string on `_`. Needs at least three parts; the first
    /// is the uuid and the last decides the finish (`foil` or anything else
    /// for normal). Everything between is the set code.
    pub fn parse(raw: &str) -> Option<ParsedIdentity> {
        let parts: Vec<&str> = raw.split('_').collect();
        if parts.len() < 3 {
            return None;
        }
        let uuid = parts[0];
        if uuid.is_empty() {
            return None;
        }
        let last = parts[parts.len() - 1];
        Some(ParsedIdentity {
            uuid: uuid.to_string(),
            set_code: parts[1..parts.len() - 1].join("_"),
            finish: Finish::from_foil(last == "foil"),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CardIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CardIdentity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Card {
    pub fn identity(&self, is_foil: bool) -> CardIdentity {
        CardIdentity::of(self, is_foil)
    }
}
