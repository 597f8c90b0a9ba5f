//! In-memory collection store keyed by [`CardIdentity`].
//!
//! Entries keep insertion order so an unsorted list view shows cards in the
//! order they were added; a hash index on [`CardIdentity`] keeps lookups
//! constant time. The store never holds an entry with quantity 0.

use std::collections::HashMap;
use std::fmt;

use log::{debug, warn};

use crate::identity::{CardIdentity, Finish};
use crate::models::Card;
use crate::pricing;

// ---------------------------------------------------------------------------
// CollectionEntry
// ---------------------------------------------------------------------------

/// A user-owned quantity of one card in one finish.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionEntry {
    pub card: Card,
    pub quantity: u32,
    pub is_foil: bool,
}

impl CollectionEntry {
    pub fn new(card: Card, quantity: u32, is_foil: bool) -> Self {
        Self {
            card,
            quantity,
            is_foil,
        }
    }

    pub fn identity(&self) -> CardIdentity {
        CardIdentity::of(&self.card, self.is_foil)
    }

    pub fn finish(&self) -> Finish {
        Finish::from_foil(self.is_foil)
    }

    /// High retail price of this entry's finish times its quantity.
    pub fn value(&self) -> Option<f64> {
        pricing::highest_retail_price(&self.card, self.is_foil)
            .map(|p| p * self.quantity as f64)
    }
}

// ---------------------------------------------------------------------------
// CollectionEvent
// ---------------------------------------------------------------------------

/// Published to subscribers after every mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum CollectionEvent {
    Added { identity: CardIdentity, quantity: u32 },
    Updated { identity: CardIdentity, quantity: u32 },
    Removed { identity: CardIdentity },
    Cleared,
    Replaced { entries: usize },
}

type Observer = Box<dyn FnMut(&CollectionEvent) + Send>;

// ---------------------------------------------------------------------------
// Collection
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct Collection {
    entries: Vec<CollectionEntry>,
    index: HashMap<CardIdentity, usize>,
    observers: Vec<Observer>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback invoked after each mutation.
    pub fn subscribe<F>(&mut self, observer: F)
    where
        F: FnMut(&CollectionEvent) + Send + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    // -- Mutations ---------------------------------------------------------

    /// Add `quantity` copies of `card` in the given finish. An existing line
    /// with the same identity has its quantity increased; otherwise a new
    /// line is inserted. Adding zero copies of a card not yet owned is a
    /// no-op.
    pub fn add(&mut self, card: &Card, quantity: u32, is_foil: bool) -> CardIdentity {
        let identity = CardIdentity::of(card, is_foil);
        match self.position(&identity) {
            Some(idx) => {
                let entry = &mut self.entries[idx];
                entry.quantity = entry.quantity.saturating_add(quantity);
                let total = entry.quantity;
                debug!("Added {} to {} (now {})", quantity, identity, total);
                self.notify(CollectionEvent::Updated {
                    identity: identity.clone(),
                    quantity: total,
                });
            }
            None if quantity == 0 => {}
            None => {
                self.insert(CollectionEntry::new(card.clone(), quantity, is_foil));
                debug!("Inserted {} x{}", identity, quantity);
                self.notify(CollectionEvent::Added {
                    identity: identity.clone(),
                    quantity,
                });
            }
        }
        identity
    }

    /// Set the quantity of `entry` to an absolute value. A quantity of zero
    /// or less removes the line. An entry that is not in the collection is
    /// inserted with the given quantity.
    pub fn update(&mut self, entry: &CollectionEntry, quantity: i64) {
        let identity = entry.identity();
        if quantity <= 0 {
            self.remove(&identity);
            return;
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        match self.position(&identity) {
            Some(idx) => {
                self.entries[idx].quantity = quantity;
                self.notify(CollectionEvent::Updated { identity, quantity });
            }
            None => {
                warn!(
                    "Quantity update for {} which is not in the collection; inserting",
                    identity
                );
                self.insert(CollectionEntry {
                    quantity,
                    ..entry.clone()
                });
                self.notify(CollectionEvent::Added { identity, quantity });
            }
        }
    }

    /// Like [`update`](Self::update) but keyed by identity only. Returns
    /// `false` when the identity is unknown (nothing is inserted).
    pub fn set_quantity(&mut self, identity: &CardIdentity, quantity: i64) -> bool {
        match self.position(identity) {
            Some(idx) => {
                let entry = self.entries[idx].clone();
                self.update(&entry, quantity);
                true
            }
            None => false,
        }
    }

    /// Remove the line with this identity. No-op if absent.
    pub fn remove(&mut self, identity: &CardIdentity) -> Option<CollectionEntry> {
        let idx = self.index.remove(identity)?;
        let removed = self.entries.remove(idx);
        for later in self.index.values_mut().filter(|i| **i > idx) {
            *later -= 1;
        }
        self.notify(CollectionEvent::Removed {
            identity: identity.clone(),
        });
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
        self.notify(CollectionEvent::Cleared);
    }

    /// Swap in a complete new set of entries in one step. Lines sharing an
    /// identity are merged and empty lines dropped.
    pub fn replace_with(&mut self, entries: Vec<CollectionEntry>) {
        let mut merged: Vec<CollectionEntry> = Vec::with_capacity(entries.len());
        let mut index = HashMap::with_capacity(entries.len());
        for entry in entries.into_iter().filter(|e| e.quantity > 0) {
            match index.get(&entry.identity()) {
                Some(&idx) => {
                    let existing: &mut CollectionEntry = &mut merged[idx];
                    existing.quantity = existing.quantity.saturating_add(entry.quantity);
                }
                None => {
                    index.insert(entry.identity(), merged.len());
                    merged.push(entry);
                }
            }
        }
        self.entries = merged;
        self.index = index;
        let count = self.entries.len();
        self.notify(CollectionEvent::Replaced { entries: count });
    }

    // -- Queries -----------------------------------------------------------

    pub fn get(&self, identity: &CardIdentity) -> Option<&CollectionEntry> {
        self.position(identity).map(|idx| &self.entries[idx])
    }

    pub fn contains(&self, identity: &CardIdentity) -> bool {
        self.position(identity).is_some()
    }

    pub fn entries(&self) -> &[CollectionEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CollectionEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of physical cards across all lines.
    pub fn total_quantity(&self) -> u64 {
        self.entries.iter().map(|e| e.quantity as u64).sum()
    }

    /// Sum of each line's high retail price times quantity. Lines without a
    /// quote contribute nothing.
    pub fn total_value(&self) -> f64 {
        self.entries.iter().filter_map(CollectionEntry::value).sum()
    }

    // -- Internals ---------------------------------------------------------

    fn position(&self, identity: &CardIdentity) -> Option<usize> {
        self.index.get(identity).copied()
    }

    fn insert(&mut self, entry: CollectionEntry) {
        self.index.insert(entry.identity(), self.entries.len());
        self.entries.push(entry);
    }

    fn notify(&mut self, event: CollectionEvent) {
        for observer in self.observers.iter_mut() {
            observer(&event);
        }
    }
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("entries", &self.entries)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a CollectionEntry;
    type IntoIter = std::slice::Iter<'a, CollectionEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
