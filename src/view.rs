//! Filter → sort → paginate pipeline shared by the catalog browser and the
//! collection view.
//!
//! The pipeline borrows its input: [`ListState::apply`] returns a [`Page`] of
//! references into the caller's slice, so applying it to the catalog or to a
//! [`Collection`](crate::collection::Collection) costs no clones.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::collection::CollectionEntry;
use crate::config;
use crate::models::Card;
use crate::pricing;

// ---------------------------------------------------------------------------
// Listable
// ---------------------------------------------------------------------------

/// Anything that can be shown in a card list: a catalog card or a card with
/// an owned quantity attached.
pub trait Listable {
    fn card(&self) -> &Card;

    /// Owned copies. Catalog cards own none.
    fn quantity(&self) -> u32 {
        0
    }

    /// Finish of an owned line, `None` for catalog cards.
    fn owned_foil(&self) -> Option<bool> {
        None
    }
}

impl Listable for Card {
    fn card(&self) -> &Card {
        self
    }
}

impl Listable for CollectionEntry {
    fn card(&self) -> &Card {
        &self.card
    }

    fn quantity(&self) -> u32 {
        self.quantity
    }

    fn owned_foil(&self) -> Option<bool> {
        Some(self.is_foil)
    }
}

impl<T: Listable> Listable for &T {
    fn card(&self) -> &Card {
        (*self).card()
    }

    fn quantity(&self) -> u32 {
        (*self).quantity()
    }

    fn owned_foil(&self) -> Option<bool> {
        (*self).owned_foil()
    }
}

// ---------------------------------------------------------------------------
// Sorting
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    Name,
    Number,
    Set,
    Rarity,
    Color,
    Type,
    Price,
    Quantity,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// Base (ascending) comparison of two items on `field`.
///
/// Rarity is compared by weight with the operands swapped, so an ascending
/// rarity sort lists mythics first. Existing exports and saved orderings
/// depend on this.
pub fn compare<T: Listable>(a: &T, b: &T, field: SortField) -> Ordering {
    let (ca, cb) = (a.card(), b.card());
    match field {
        SortField::Name => compare_text(&ca.name, &cb.name),
        SortField::Set => compare_text(&ca.set_code, &cb.set_code),
        SortField::Type => compare_text(&ca.type_line, &cb.type_line),
        SortField::Color => compare_text(&ca.color_name(), &cb.color_name()),
        SortField::Number => compare_numbers(&ca.number, &cb.number),
        SortField::Rarity => cb.rarity.weight().cmp(&ca.rarity.weight()),
        SortField::Price => {
            let pa = pricing::highest_retail_price(ca, false).unwrap_or(0.0);
            let pb = pricing::highest_retail_price(cb, false).unwrap_or(0.0);
            pa.total_cmp(&pb)
        }
        SortField::Quantity => a.quantity().cmp(&b.quantity()),
    }
}

/// Stable sort in place. `None` leaves the order untouched.
pub fn sort_items<T: Listable>(
    items: &mut [T],
    field: Option<SortField>,
    direction: SortDirection,
) {
    if let Some(field) = field {
        items.sort_by(|a, b| direction.apply(compare(a, b, field)));
    }
}

// Case-insensitive first, raw text as the tie-break.
fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

// Collector numbers like "12" compare numerically; "12a" or "★3" fall back to text.
fn compare_numbers(a: &str, b: &str) -> Ordering {
    match (a.trim().parse::<i64>(), b.trim().parse::<i64>()) {
        (Ok(na), Ok(nb)) => na.cmp(&nb),
        _ => compare_text(a, b),
    }
}

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

/// Case-insensitive substring match on name, type line and set code. A blank
/// query matches every card.
pub fn matches_query(card: &Card, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    [&card.name, &card.type_line, &card.set_code]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

pub fn filter_items<'a, T: Listable>(items: &'a [T], query: &str) -> Vec<&'a T> {
    if query.trim().is_empty() {
        return items.iter().collect();
    }
    items
        .iter()
        .filter(|item| matches_query(item.card(), query))
        .collect()
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

/// `ceil(count / page_size)`; zero for an empty list.
pub fn total_pages(count: usize, page_size: usize) -> usize {
    count.div_ceil(page_size.max(1))
}

/// One page of a filtered and sorted list.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<'a, T> {
    pub items: Vec<&'a T>,
    /// The page actually shown, 1-based.
    pub page: usize,
    pub total_pages: usize,
    /// Items left after filtering.
    pub total_items: usize,
}

impl<T> Page<'_, T> {
    /// Page count for the pager: an empty list reads as "page 1 of 1".
    pub fn display_total_pages(&self) -> usize {
        self.total_pages.max(1)
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

// ---------------------------------------------------------------------------
// ListState
// ---------------------------------------------------------------------------

/// Search text, sort order and pager position for one list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListState {
    query: String,
    sort_field: Option<SortField>,
    direction: SortDirection,
    page: usize,
    page_size: usize,
}

impl Default for ListState {
    fn default() -> Self {
        Self {
            query: String::new(),
            sort_field: None,
            direction: SortDirection::Asc,
            page: 1,
            page_size: config::DEFAULT_PAGE_SIZE,
        }
    }
}

impl ListState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn sort_field(&self) -> Option<SortField> {
        self.sort_field
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    // -- Changes that restart at page 1 --------------------------------------

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
        self.page = 1;
    }

    pub fn set_sort(&mut self, field: Option<SortField>, direction: SortDirection) {
        self.sort_field = field;
        self.direction = direction;
        self.page = 1;
    }

    /// Column-header behavior: clicking the active field flips the direction,
    /// clicking another field sorts it ascending.
    pub fn toggle_sort(&mut self, field: SortField) {
        let direction = if self.sort_field == Some(field) {
            self.direction.flipped()
        } else {
            SortDirection::Asc
        };
        self.set_sort(Some(field), direction);
    }

    /// Zero is treated as one.
    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
        self.page = 1;
    }

    // -- Navigation ----------------------------------------------------------

    pub fn first(&mut self) {
        self.page = 1;
    }

    pub fn prev(&mut self) {
        self.page = self.page.saturating_sub(1).max(1);
    }

    pub fn next(&mut self, total_pages: usize) {
        self.page = (self.page + 1).min(total_pages.max(1));
    }

    pub fn last(&mut self, total_pages: usize) {
        self.page = total_pages.max(1);
    }

    pub fn go_to(&mut self, page: usize, total_pages: usize) {
        self.page = page.clamp(1, total_pages.max(1));
    }

    /// Pull the page back into range after the underlying list shrank.
    pub fn clamp(&mut self, total_pages: usize) {
        self.go_to(self.page, total_pages);
    }

    // -- Pipeline ------------------------------------------------------------

    /// Filter, sort and slice `items` according to this state. The page used
    /// is clamped to the available range; the state itself is not modified.
    pub fn apply<'a, T: Listable>(&self, items: &'a [T]) -> Page<'a, T> {
        let mut visible = filter_items(items, &self.query);
        sort_items(&mut visible, self.sort_field, self.direction);

        let total_items = visible.len();
        let total_pages = total_pages(total_items, self.page_size);
        let page = self.page.clamp(1, total_pages.max(1));
        let start = (page - 1) * self.page_size;

        let items = visible
            .into_iter()
            .skip(start)
            .take(self.page_size)
            .collect();

        Page {
            items,
            page,
            total_pages,
            total_items,
        }
    }
}

// ---------------------------------------------------------------------------
// FoilMarkers
// ---------------------------------------------------------------------------

/// Catalog cards the user flagged as foil before adding them, keyed by uuid.
///
/// Cards priced only in foil count as foil without being flagged, and their
/// flag cannot be changed. Cards without any foil quote cannot be flagged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FoilMarkers {
    flagged: HashSet<String>,
}

impl FoilMarkers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_foil(&self, card: &Card) -> bool {
        pricing::is_foil_only(card) || self.flagged.contains(&card.uuid)
    }

    pub fn can_toggle(&self, card: &Card) -> bool {
        pricing::has_foil_pricing(card) && !pricing::is_foil_only(card)
    }

    /// Returns `false` when the card's flag is not user-editable.
    pub fn set(&mut self, card: &Card, is_foil: bool) -> bool {
        if !self.can_toggle(card) {
            return false;
        }
        if is_foil {
            self.flagged.insert(card.uuid.clone());
        } else {
            self.flagged.remove(&card.uuid);
        }
        true
    }

    pub fn clear(&mut self) {
        self.flagged.clear();
    }

    pub fn len(&self) -> usize {
        self.flagged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flagged.is_empty()
    }
}
