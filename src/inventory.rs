//! Application state: the backend client, the loaded catalog, the user's
//! collection and the list settings of both views, held in one explicit
//! object instead of ambient globals.
//!
//! Connectivity problems never surface as errors here: they flip the
//! [`BackendStatus`] to disconnected and leave the previous data in place.
//! Import and export return `Result`s that [`Notice`] turns into user
//! messages.

use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::client::{ApiClient, ConnectionStatus};
use crate::collection::{Collection, CollectionEntry};
use crate::config;
use crate::csv_codec::{self, ImportSummary};
use crate::error::{InventoryError, Result};
use crate::identity::CardIdentity;
use crate::models::{Card, SetSummary};
use crate::status::{BackendStatus, StatusPoller};
use crate::view::{FoilMarkers, ListState, Page};

// ---------------------------------------------------------------------------
// Notice
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A user-facing notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub description: String,
}

impl Notice {
    pub fn new(
        level: NoticeLevel,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            level,
            title: title.into(),
            description: description.into(),
        }
    }

    /// An empty collection on export is a warning; everything else is an
    /// error.
    pub fn from_error(title: &str, error: &InventoryError) -> Self {
        match error {
            InventoryError::NothingToExport => {
                Self::new(NoticeLevel::Warning, error.to_string(), "Your collection is empty")
            }
            other => Self::new(NoticeLevel::Error, title, other.to_string()),
        }
    }

    pub fn for_import(result: &Result<ImportSummary>) -> Self {
        match result {
            Ok(summary) => Self::new(
                NoticeLevel::Success,
                "Import successful",
                format!("Imported {} cards to your collection", summary.parsed_rows),
            ),
            Err(e) => Self::from_error("Import failed", e),
        }
    }

    pub fn for_export(result: &Result<PathBuf>) -> Self {
        match result {
            Ok(path) => Self::new(
                NoticeLevel::Success,
                "Export successful",
                format!("Your collection has been exported to {}", path.display()),
            ),
            Err(e) => Self::from_error("Export failed", e),
        }
    }
}

// ---------------------------------------------------------------------------
// Inventory
// ---------------------------------------------------------------------------

pub struct Inventory {
    client: ApiClient,
    status: BackendStatus,
    selected_sets: Vec<String>,
    catalog: Vec<Card>,
    pub collection: Collection,
    pub catalog_view: ListState,
    pub collection_view: ListState,
    pub foil_markers: FoilMarkers,
}

impl Inventory {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            status: BackendStatus::new(),
            selected_sets: Vec::new(),
            catalog: Vec::new(),
            collection: Collection::new(),
            catalog_view: ListState::new(),
            collection_view: ListState::new(),
            foil_markers: FoilMarkers::new(),
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn status(&self) -> &BackendStatus {
        &self.status
    }

    pub fn catalog(&self) -> &[Card] {
        &self.catalog
    }

    pub fn selected_sets(&self) -> &[String] {
        &self.selected_sets
    }

    // -- Backend -----------------------------------------------------------

    pub fn refresh_status(&mut self) -> ConnectionStatus {
        self.status.check(&self.client);
        self.status.status()
    }

    /// Start polling backend connectivity every
    /// [`STATUS_POLL_INTERVAL`](config::STATUS_POLL_INTERVAL) on a
    /// background thread. Polling stops when the returned poller is dropped.
    ///
    /// The poller gets its own client with
    /// [`STATUS_TIMEOUT`](config::STATUS_TIMEOUT), so a hung backend delays
    /// the drop by at most that long.
    pub fn watch_status<F>(&self, on_change: F) -> Result<StatusPoller>
    where
        F: FnMut(ConnectionStatus) + Send + 'static,
    {
        let client = ApiClient::builder()
            .base_url(self.client.base_url())
            .timeout(config::STATUS_TIMEOUT)
            .build()?;
        StatusPoller::spawn(client, config::STATUS_POLL_INTERVAL, on_change)
    }

    /// The set catalog, or an empty list while the backend is unreachable.
    pub fn available_sets(&mut self) -> Vec<SetSummary> {
        match self.client.list_sets() {
            Ok(sets) => {
                self.status.record(ConnectionStatus::Connected);
                sets
            }
            Err(e) => {
                warn!("Could not load set catalog: {}", e);
                self.status.record(ConnectionStatus::Disconnected);
                Vec::new()
            }
        }
    }

    /// Load every card of the chosen sets into the catalog. On failure the
    /// previous catalog stays and `false` is returned.
    pub fn select_sets(&mut self, set_codes: Vec<String>) -> bool {
        match self.client.cards_by_set_codes(&set_codes) {
            Ok(cards) => {
                info!("Loaded {} cards from {} sets", cards.len(), set_codes.len());
                self.status.record(ConnectionStatus::Connected);
                self.catalog = cards;
                self.selected_sets = set_codes;
                self.catalog_view.first();
                true
            }
            Err(e) => {
                warn!("Could not load cards for {:?}: {}", set_codes, e);
                self.status.record(ConnectionStatus::Disconnected);
                false
            }
        }
    }

    // -- Views -------------------------------------------------------------

    pub fn catalog_page(&self) -> Page<'_, Card> {
        self.catalog_view.apply(&self.catalog)
    }

    pub fn collection_page(&self) -> Page<'_, CollectionEntry> {
        self.collection_view.apply(self.collection.entries())
    }

    // -- Collection --------------------------------------------------------

    /// Add a catalog card in the finish its foil marker selects.
    pub fn add_from_catalog(&mut self, card: &Card, quantity: u32) -> CardIdentity {
        let is_foil = self.foil_markers.is_foil(card);
        self.collection.add(card, quantity, is_foil)
    }

    /// Replace the collection with a CSV file's contents. The current
    /// collection is kept if anything fails.
    pub fn import_csv(&mut self, text: &str) -> Result<ImportSummary> {
        let summary = csv_codec::import_csv(text, &self.client, &mut self.collection)?;
        self.collection_view.first();
        Ok(summary)
    }

    pub fn export_csv(&self, dir: &Path, name: &str) -> Result<PathBuf> {
        csv_codec::write_export(&self.collection, dir, name)
    }
}
