use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Provider name -> quoted price. `None` means the provider has no quote.
pub type ProviderPrices = BTreeMap<String, Option<f64>>;

// ---------------------------------------------------------------------------
// Pricing — transaction side x finish x provider
// ---------------------------------------------------------------------------

/// Quotes for one transaction side, split by finish.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSide {
    pub normal: Option<ProviderPrices>,
    pub foil: Option<ProviderPrices>,
}

impl PriceSide {
    /// Provider map for exactly the requested finish. There is no fallback
    /// from foil to normal or the other way round.
    pub fn finish(&self, foil: bool) -> Option<&ProviderPrices> {
        if foil {
            self.foil.as_ref()
        } else {
            self.normal.as_ref()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pricing {
    pub retail: Option<PriceSide>,
    pub buylist: Option<PriceSide>,
}

impl Pricing {
    pub fn retail(&self, foil: bool) -> Option<&ProviderPrices> {
        self.retail.as_ref().and_then(|side| side.finish(foil))
    }

    pub fn buylist(&self, foil: bool) -> Option<&ProviderPrices> {
        self.buylist.as_ref().and_then(|side| side.finish(foil))
    }
}

// ---------------------------------------------------------------------------
// Rarity
// ---------------------------------------------------------------------------

/// Printed rarity. Values the backend sends that are not one of the four
/// standard rarities are kept verbatim in `Other`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Mythic,
    #[default]
    Unspecified,
    Other(String),
}

impl Rarity {
    pub fn as_str(&self) -> &str {
        match self {
            Rarity::Common => "common",
            Rarity::Uncommon => "uncommon",
            Rarity::Rare => "rare",
            Rarity::Mythic => "mythic",
            Rarity::Unspecified => "",
            Rarity::Other(raw) => raw,
        }
    }

    /// Sort weight: mythic 4, rare 3, uncommon 2, common 1, anything else 0.
    pub fn weight(&self) -> u8 {
        match self {
            Rarity::Mythic => 4,
            Rarity::Rare => 3,
            Rarity::Uncommon => 2,
            Rarity::Common => 1,
            Rarity::Unspecified | Rarity::Other(_) => 0,
        }
    }
}

impl From<&str> for Rarity {
    fn from(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "common" => Rarity::Common,
            "uncommon" => Rarity::Uncommon,
            "rare" => Rarity::Rare,
            "mythic" => Rarity::Mythic,
            "" => Rarity::Unspecified,
            _ => Rarity::Other(raw.to_string()),
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Rarity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Rarity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.map(|s| Rarity::from(s.as_str())).unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// Card — A single printing as served by the card-data backend
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub uuid: String,
    pub set_code: String,
    #[serde(default)]
    pub number: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub type_line: String,
    #[serde(default)]
    pub rarity: Rarity,
    #[serde(default, deserialize_with = "colors_from_list_or_string")]
    pub colors: Vec<String>,
    pub mana_cost: Option<String>,
    pub text: Option<String>,
    pub flavor_text: Option<String>,
    pub artist: Option<String>,
    pub power: Option<String>,
    pub toughness: Option<String>,
    pub pricing: Option<Pricing>,
    /// Any other fields the backend returned, kept for CSV extension columns.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Card {
    /// Human readable color: `Colorless`, `Multicolored`, or the single
    /// color's name.
    pub fn color_name(&self) -> String {
        color_name(&self.colors)
    }
}

/// Maps a list of color codes to a display name.
pub fn color_name(colors: &[String]) -> String {
    let codes: Vec<&str> = colors
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .collect();
    match codes.as_slice() {
        [] => "Colorless".to_string(),
        [single] => color_code_name(single),
        _ => "Multicolored".to_string(),
    }
}

/// Maps a single color code (`W`, `U`, `B`, `R`, `G`) to its name. Unknown
/// codes are returned unchanged.
pub fn color_code_name(code: &str) -> String {
    match code.to_uppercase().as_str() {
        "W" => "White".to_string(),
        "U" => "Blue".to_string(),
        "B" => "Black".to_string(),
        "R" => "Red".to_string(),
        "G" => "Green".to_string(),
        "" => "Colorless".to_string(),
        _ => code.to_string(),
    }
}

// Some backends flatten the color list to "R, U".
fn colors_from_list_or_string<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Colors {
        List(Vec<String>),
        Joined(String),
    }

    Ok(match Option::<Colors>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(Colors::List(list)) => list,
        Some(Colors::Joined(joined)) => joined
            .split(',')
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect(),
    })
}
