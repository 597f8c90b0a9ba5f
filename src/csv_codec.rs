//! CSV export and import of a [`Collection`].
//!
//! Export writes one row per collection line using a [`CsvSchema`]: a fixed,
//! versioned field list plus extension columns taken from the backend fields
//! kept in [`Card::extra`]. The `cardIdentifier` column is sorted in with the
//! rest and `quantity` always comes last.
//!
//! Import only needs `cardIdentifier` (or, failing that, `uuid`) and
//! `quantity`. Full card records are looked up again through a
//! [`CardLookup`] before the collection is replaced, so a failed import never
//! touches the current collection.
//!
//! # Example
//!
//! ```rust
//! use mtg_inventory::collection::Collection;
//! use mtg_inventory::csv_codec;
//! use mtg_inventory::models::Card;
//!
//! let card = Card {
//!     uuid: "b1".into(),
//!     set_code: "M10".into(),
//!     name: "Lightning Bolt".into(),
//!     ..Default::default()
//! };
//! let mut collection = Collection::new();
//! collection.add(&card, 4, false);
//!
//! let csv = csv_codec::export_csv(&collection).unwrap();
//! let rows = csv_codec::parse_import(&csv).unwrap();
//! assert_eq!(rows[0].uuid, "b1");
//! assert_eq!(rows[0].quantity, 4);
//! ```

use std::borrow::Cow;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::collection::{Collection, CollectionEntry};
use crate::config;
use crate::error::{InventoryError, Result};
use crate::identity::{CardIdentity, Finish};
use crate::models::Card;

pub const IDENTIFIER_COLUMN: &str = "cardIdentifier";
pub const UUID_COLUMN: &str = "uuid";
pub const QUANTITY_COLUMN: &str = "quantity";

// ---------------------------------------------------------------------------
// Column
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Column {
    Artist,
    CardIdentifier,
    Colors,
    FlavorText,
    IsFoil,
    ManaCost,
    Name,
    Number,
    Power,
    Rarity,
    SetCode,
    Text,
    Toughness,
    Type,
    Uuid,
    Quantity,
    /// A backend field outside the fixed list, read from [`Card::extra`].
    Extra(String),
}

impl Column {
    pub fn header(&self) -> &str {
        match self {
            Column::Artist => "artist",
            Column::CardIdentifier => IDENTIFIER_COLUMN,
            Column::Colors => "colors",
            Column::FlavorText => "flavorText",
            Column::IsFoil => "isFoil",
            Column::ManaCost => "manaCost",
            Column::Name => "name",
            Column::Number => "number",
            Column::Power => "power",
            Column::Rarity => "rarity",
            Column::SetCode => "setCode",
            Column::Text => "text",
            Column::Toughness => "toughness",
            Column::Type => "type",
            Column::Uuid => UUID_COLUMN,
            Column::Quantity => QUANTITY_COLUMN,
            Column::Extra(key) => key,
        }
    }

    /// Text for this column, or `None` when the entry has no value.
    pub fn value(&self, entry: &CollectionEntry) -> Option<String> {
        let card = &entry.card;
        match self {
            Column::Artist => card.artist.clone(),
            Column::CardIdentifier => Some(entry.identity().to_string()),
            Column::Colors => Some(card.colors.join(",")),
            Column::FlavorText => card.flavor_text.clone(),
            Column::IsFoil => Some(entry.is_foil.to_string()),
            Column::ManaCost => card.mana_cost.clone(),
            Column::Name => Some(card.name.clone()),
            Column::Number => Some(card.number.clone()),
            Column::Power => card.power.clone(),
            Column::Rarity => Some(card.rarity.to_string()),
            Column::SetCode => Some(card.set_code.clone()),
            Column::Text => card.text.clone(),
            Column::Toughness => card.toughness.clone(),
            Column::Type => Some(card.type_line.clone()),
            Column::Uuid => Some(card.uuid.clone()),
            Column::Quantity => Some(entry.quantity.to_string()),
            Column::Extra(key) => match card.extra.get(key) {
                None | Some(serde_json::Value::Null) => None,
                Some(serde_json::Value::String(s)) => Some(s.clone()),
                Some(other) => Some(other.to_string()),
            },
        }
    }

    fn is_reserved(header: &str) -> bool {
        CsvSchema::v1()
            .columns
            .iter()
            .chain([Column::CardIdentifier, Column::Quantity].iter())
            .any(|c| c.header() == header)
    }
}

// ---------------------------------------------------------------------------
// CsvSchema
// ---------------------------------------------------------------------------

/// Versioned export field list.
///
/// Version 1 carries the card fields listed in [`CsvSchema::v1`].
/// [`with_extension`](Self::with_extension) appends backend fields not in
/// that list.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvSchema {
    version: u32,
    columns: Vec<Column>,
}

impl CsvSchema {
    pub const CURRENT_VERSION: u32 = 1;

    pub fn v1() -> Self {
        Self {
            version: 1,
            columns: vec![
                Column::Artist,
                Column::Colors,
                Column::FlavorText,
                Column::IsFoil,
                Column::ManaCost,
                Column::Name,
                Column::Number,
                Column::Power,
                Column::Rarity,
                Column::SetCode,
                Column::Text,
                Column::Toughness,
                Column::Type,
                Column::Uuid,
            ],
        }
    }

    /// The current schema extended with every backend field present on any
    /// card in the collection.
    pub fn for_collection(collection: &Collection) -> Self {
        let keys: BTreeSet<&String> = collection
            .iter()
            .flat_map(|entry| entry.card.extra.keys())
            .collect();
        keys.into_iter()
            .fold(Self::v1(), |schema, key| schema.with_extension(key))
    }

    /// Add an extension column. Names already used by the schema are ignored.
    pub fn with_extension(mut self, key: &str) -> Self {
        let taken = Column::is_reserved(key) || self.columns.iter().any(|c| c.header() == key);
        if !taken && !key.is_empty() {
            self.columns.push(Column::Extra(key.to_string()));
        }
        self
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Output column order: schema fields and `cardIdentifier` sorted by
    /// header name, then `quantity`.
    pub fn ordered_columns(&self) -> Vec<Column> {
        let mut columns = self.columns.clone();
        columns.push(Column::CardIdentifier);
        columns.sort_by(|a, b| a.header().cmp(b.header()));
        columns.push(Column::Quantity);
        columns
    }

    pub fn headers(&self) -> Vec<String> {
        self.ordered_columns()
            .iter()
            .map(|c| c.header().to_string())
            .collect()
    }
}

impl Default for CsvSchema {
    fn default() -> Self {
        Self::v1()
    }
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

/// Export with [`CsvSchema::for_collection`].
pub fn export_csv(collection: &Collection) -> Result<String> {
    export_with_schema(collection, &CsvSchema::for_collection(collection))
}

/// Render the collection as CSV text. Present values are always quoted with
/// embedded quotes doubled; absent values are left empty.
pub fn export_with_schema(collection: &Collection, schema: &CsvSchema) -> Result<String> {
    if collection.is_empty() {
        return Err(InventoryError::NothingToExport);
    }

    let columns = schema.ordered_columns();
    let mut lines = Vec::with_capacity(collection.len() + 1);
    lines.push(
        columns
            .iter()
            .map(Column::header)
            .collect::<Vec<_>>()
            .join(","),
    );
    for entry in collection {
        let row: Vec<String> = columns
            .iter()
            .map(|column| match column.value(entry) {
                Some(value) => quote_field(&value),
                None => String::new(),
            })
            .collect();
        lines.push(row.join(","));
    }

    debug!(
        "Exported {} collection lines with schema v{}",
        collection.len(),
        schema.version()
    );
    Ok(lines.join("\n"))
}

/// `name` with `.csv` appended; a blank name falls back to `collection`.
pub fn export_file_name(name: &str) -> String {
    let name = name.trim();
    let name = if name.is_empty() {
        config::DEFAULT_EXPORT_NAME
    } else {
        name
    };
    format!("{}.csv", name)
}

/// Export to `dir/{name}.csv`. The file is written to a temp file in `dir`
/// and renamed into place, so a failed write leaves no partial file.
pub fn write_export(collection: &Collection, dir: &Path, name: &str) -> Result<PathBuf> {
    let csv = export_csv(collection)?;
    let dest = dir.join(export_file_name(name));

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(csv.as_bytes())?;
    tmp.flush()?;
    tmp.persist(&dest).map_err(|e| InventoryError::Io(e.error))?;

    info!("Exported {} cards to {}", collection.total_quantity(), dest.display());
    Ok(dest)
}

fn quote_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

// ---------------------------------------------------------------------------
// CsvTable — generic parsed CSV
// ---------------------------------------------------------------------------

/// Header plus data rows. Rows may be shorter or longer than the header.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CsvTable {
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Field `name` of data row `row`, if both exist.
    pub fn field(&self, row: usize, name: &str) -> Option<&str> {
        let idx = self.column(name)?;
        self.rows.get(row)?.get(idx).map(String::as_str)
    }
}

/// Parse CSV text. Quoted fields may contain commas, doubled quotes and
/// backslash-escaped quotes; backslashes themselves are kept as written.
/// Blank rows are dropped. Text without a header and at least one data row
/// is rejected.
pub fn read_table(text: &str) -> Result<CsvTable> {
    let text = text.trim();
    let non_blank = text.lines().filter(|l| !l.trim().is_empty()).count();
    if non_blank < 2 {
        return Err(InventoryError::EmptyCsv);
    }

    let text = double_escaped_quotes(text);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(CsvTable { headers, rows })
}

// Rewrites a `\"` inside a quoted field as `\""` so the reader sees a
// literal quote and keeps the backslash. Doubled quotes are read first, and a
// quote right before a delimiter or line end always closes the field, which
// keeps every exported value (including one ending in `\`) readable.
fn double_escaped_quotes(text: &str) -> Cow<'_, str> {
    if !text.contains("\\\"") {
        return Cow::Borrowed(text);
    }

    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 8);
    let mut in_quotes = false;
    let mut field_start = true;
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        if in_quotes && c == '"' {
            if next == Some('"') {
                out.push_str("\"\"");
                i += 2;
                continue;
            }
            let escaped = i > 0
                && chars[i - 1] == '\\'
                && !matches!(next, None | Some(',' | '\n' | '\r'));
            if escaped {
                out.push_str("\"\"");
            } else {
                out.push('"');
                in_quotes = false;
            }
        } else {
            out.push(c);
            if !in_quotes {
                in_quotes = c == '"' && field_start;
                field_start = matches!(c, ',' | '\n' | '\r');
            }
        }
        i += 1;
    }
    Cow::Owned(out)
}

// ---------------------------------------------------------------------------
// Import parsing
// ---------------------------------------------------------------------------

/// One usable row of an imported file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRow {
    pub uuid: String,
    pub finish: Finish,
    pub quantity: u32,
}

/// Extract `(uuid, finish, quantity)` rows.
///
/// The finish comes from `cardIdentifier`; files with only a `uuid` column
/// import everything as non-foil. Rows whose card cannot be identified, or
/// whose quantity is zero or negative, are skipped. A missing or blank
/// quantity counts as 1.
pub fn parse_import(text: &str) -> Result<Vec<ImportRow>> {
    let table = read_table(text)?;

    let identifier_idx = table.column(IDENTIFIER_COLUMN);
    let uuid_idx = table.column(UUID_COLUMN);
    if identifier_idx.is_none() && uuid_idx.is_none() {
        return Err(InventoryError::MissingIdentityColumn);
    }
    let quantity_idx = table.column(QUANTITY_COLUMN);

    let mut parsed = Vec::new();
    for (line, row) in table.rows.iter().enumerate() {
        let field = |idx: Option<usize>| {
            idx.and_then(|i| row.get(i))
                .map(|v| v.replace('"', "").trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let key = match identifier_idx {
            Some(_) => field(identifier_idx)
                .and_then(|raw| CardIdentity::parse(&raw))
                .map(|p| (p.uuid, p.finish)),
            None => field(uuid_idx).map(|uuid| (uuid, Finish::Normal)),
        };
        let Some((uuid, finish)) = key else {
            debug!("Skipping CSV row {}: no card identity", line + 2);
            continue;
        };

        let quantity = match field(quantity_idx) {
            None => 1,
            Some(raw) => match parse_quantity(&raw) {
                Some(q) if q > 0 => u32::try_from(q).unwrap_or(u32::MAX),
                Some(_) => {
                    debug!("Skipping CSV row {}: quantity {}", line + 2, raw);
                    continue;
                }
                None => {
                    warn!("CSV row {}: unreadable quantity {:?}, using 1", line + 2, raw);
                    1
                }
            },
        };

        parsed.push(ImportRow {
            uuid,
            finish,
            quantity,
        });
    }

    if parsed.is_empty() {
        return Err(InventoryError::NoValidCards);
    }
    Ok(parsed)
}

// "3" and "3.0" are both 3.
fn parse_quantity(raw: &str) -> Option<i64> {
    raw.parse::<i64>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(|f| f.trunc() as i64)
    })
}

// ---------------------------------------------------------------------------
// ImportPlan — reconciliation with looked-up cards
// ---------------------------------------------------------------------------

/// Parsed rows grouped by `(uuid, finish)`. When a card is listed more than
/// once the last row's quantity wins; the line keeps its first position.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImportPlan {
    lines: Vec<ImportRow>,
    index: HashMap<(String, Finish), usize>,
    parsed_rows: usize,
}

impl ImportPlan {
    pub fn from_rows(rows: Vec<ImportRow>) -> Self {
        let parsed_rows = rows.len();
        let mut lines: Vec<ImportRow> = Vec::with_capacity(rows.len());
        let mut index = HashMap::with_capacity(rows.len());
        for row in rows {
            match index.get(&(row.uuid.clone(), row.finish)) {
                Some(&idx) => {
                    let line: &mut ImportRow = &mut lines[idx];
                    debug!(
                        "Duplicate import row for {} ({}): {} replaces {}",
                        row.uuid,
                        row.finish.as_str(),
                        row.quantity,
                        line.quantity
                    );
                    line.quantity = row.quantity;
                }
                None => {
                    index.insert((row.uuid.clone(), row.finish), lines.len());
                    lines.push(row);
                }
            }
        }
        Self {
            lines,
            index,
            parsed_rows,
        }
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(Self::from_rows(parse_import(text)?))
    }

    /// Distinct uuids in first-seen order: the lookup request.
    pub fn uuids(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        self.lines
            .iter()
            .filter(|l| seen.insert(l.uuid.as_str()))
            .map(|l| l.uuid.clone())
            .collect()
    }

    pub fn quantity(&self, uuid: &str, finish: Finish) -> Option<u32> {
        self.index
            .get(&(uuid.to_string(), finish))
            .map(|&idx| self.lines[idx].quantity)
    }

    pub fn lines(&self) -> &[ImportRow] {
        &self.lines
    }

    /// Rows that survived parsing, before grouping.
    pub fn parsed_rows(&self) -> usize {
        self.parsed_rows
    }

    /// Collection entries for the looked-up cards: the normal and the foil
    /// line of each card, for whichever of the two the file listed.
    pub fn build(&self, cards: &[Card]) -> Vec<CollectionEntry> {
        let mut seen = BTreeSet::new();
        let mut entries = Vec::new();
        for card in cards {
            if !seen.insert(card.uuid.as_str()) {
                continue;
            }
            for finish in [Finish::Normal, Finish::Foil] {
                if let Some(quantity) = self.quantity(&card.uuid, finish) {
                    let is_foil = finish.is_foil();
                    entries.push(CollectionEntry::new(card.clone(), quantity, is_foil));
                }
            }
        }
        entries
    }

    /// Uuids the lookup did not return.
    pub fn unresolved(&self, cards: &[Card]) -> Vec<String> {
        let known: HashSet<&str> = cards.iter().map(|c| c.uuid.as_str()).collect();
        self.uuids()
            .into_iter()
            .filter(|uuid| !known.contains(uuid.as_str()))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// CardLookup + import_csv
// ---------------------------------------------------------------------------

/// Resolves full card records by uuid. Implemented by
/// [`ApiClient`](crate::client::ApiClient).
pub trait CardLookup {
    fn cards_by_uuids(&self, uuids: &[String]) -> Result<Vec<Card>>;
}

/// Outcome of a successful import.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportSummary {
    /// Data rows that parsed into a card identity.
    pub parsed_rows: usize,
    /// Collection lines after the import.
    pub entries: usize,
    /// Physical cards after the import.
    pub total_quantity: u64,
    /// Uuids from the file the lookup did not know.
    pub unresolved: Vec<String>,
}

/// Replace `collection` with the contents of a CSV file.
///
/// The file is parsed and every card resolved through `lookup` first; the
/// collection is only replaced once all of that succeeded. If the lookup
/// resolves none of the file's cards the import fails and the collection
/// keeps its current contents.
pub fn import_csv<L>(
    text: &str,
    lookup: &L,
    collection: &mut Collection,
) -> Result<ImportSummary>
where
    L: CardLookup + ?Sized,
{
    let plan = ImportPlan::parse(text)?;
    let uuids = plan.uuids();
    debug!("Resolving {} uuids for import", uuids.len());

    let cards = lookup.cards_by_uuids(&uuids)?;
    let entries = plan.build(&cards);
    if entries.is_empty() {
        return Err(InventoryError::NotFound(format!(
            "none of the {} cards in the file are known to the backend",
            uuids.len()
        )));
    }

    let unresolved = plan.unresolved(&cards);
    if !unresolved.is_empty() {
        warn!("{} imported cards could not be resolved", unresolved.len());
    }

    collection.replace_with(entries);
    let summary = ImportSummary {
        parsed_rows: plan.parsed_rows(),
        entries: collection.len(),
        total_quantity: collection.total_quantity(),
        unresolved,
    };
    info!(
        "Imported {} rows into {} collection lines",
        summary.parsed_rows, summary.entries
    );
    Ok(summary)
}
