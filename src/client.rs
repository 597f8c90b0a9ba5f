//! Blocking HTTP client for the card-data backend.
//!
//! Covers the set catalog, card listing by set, card lookup by uuid and the
//! admin status endpoint. Requests are not retried and cannot be cancelled;
//! a caller that issues a newer request while an older one is still running
//! must discard the stale response itself.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, warn};
use reqwest::blocking::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config;
use crate::csv_codec::CardLookup;
use crate::error::{InventoryError, Result};
use crate::models::{Card, CardSet, SetName, SetSummary};

// ---------------------------------------------------------------------------
// ConnectionStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connected,
    #[default]
    Disconnected,
}

impl ConnectionStatus {
    pub fn is_connected(self) -> bool {
        self == ConnectionStatus::Connected
    }
}

// ---------------------------------------------------------------------------
// ApiClientBuilder
// ---------------------------------------------------------------------------

/// Builder for an [`ApiClient`].
pub struct ApiClientBuilder {
    base_url: String,
    timeout: Duration,
}

impl Default for ApiClientBuilder {
    fn default() -> Self {
        Self {
            base_url: config::DEFAULT_API_BASE.to_string(),
            timeout: config::DEFAULT_TIMEOUT,
        }
    }
}

impl ApiClientBuilder {
    /// Backend root, e.g. `http://localhost:3000`. A trailing slash is ignored.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Per-request timeout. Defaults to 30 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<ApiClient> {
        let client = Client::builder()
            .timeout(self.timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(ApiClient {
            base_url: self.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SetCodesRequest<'a> {
    set_codes: &'a [String],
}

#[derive(Serialize)]
struct UuidsRequest<'a> {
    uuids: &'a [String],
}

// ---------------------------------------------------------------------------
// ApiClient
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    client: Client,
}

impl ApiClient {
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// Client for `base_url` with default settings.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::builder().base_url(base_url).build()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // -- Status ------------------------------------------------------------

    /// `GET /admin/status`. Any 2xx answer means connected; anything else,
    /// including transport errors, means disconnected.
    pub fn status(&self) -> ConnectionStatus {
        match self.client.get(self.url(config::STATUS_PATH)).send() {
            Ok(resp) if resp.status().is_success() => ConnectionStatus::Connected,
            Ok(resp) => {
                debug!("Backend status check returned {}", resp.status());
                ConnectionStatus::Disconnected
            }
            Err(e) => {
                debug!("Backend status check failed: {}", e);
                ConnectionStatus::Disconnected
            }
        }
    }

    // -- Sets --------------------------------------------------------------

    /// `GET /api/v1/sets`: the set catalog.
    pub fn list_sets(&self) -> Result<Vec<SetSummary>> {
        self.fetch(self.client.get(self.url(config::SETS_PATH)))
    }

    /// `GET /api/v1/set-names`: code/name pairs for set pickers.
    pub fn set_names(&self) -> Result<Vec<SetName>> {
        self.fetch(self.client.get(self.url(config::SET_NAMES_PATH)))
    }

    /// `POST /api/v1/sets`: full sets including their cards.
    pub fn load_sets(&self, set_codes: &[String]) -> Result<Vec<CardSet>> {
        if set_codes.is_empty() {
            return Ok(Vec::new());
        }
        let body = SetCodesRequest { set_codes };
        self.fetch(self.client.post(self.url(config::SETS_PATH)).json(&body))
    }

    // -- Cards -------------------------------------------------------------

    /// `POST /api/v1/cards/set-code`: every card of the given sets.
    pub fn cards_by_set_codes(&self, set_codes: &[String]) -> Result<Vec<Card>> {
        if set_codes.is_empty() {
            return Ok(Vec::new());
        }
        let body = SetCodesRequest { set_codes };
        self.fetch(
            self.client
                .post(self.url(config::CARDS_BY_SET_CODE_PATH))
                .json(&body),
        )
    }

    /// `POST /api/v1/cards/uuid/`: card records for the given uuids. Unknown
    /// uuids are simply missing from the answer.
    pub fn cards_by_uuids(&self, uuids: &[String]) -> Result<Vec<Card>> {
        if uuids.is_empty() {
            return Ok(Vec::new());
        }
        let body = UuidsRequest { uuids };
        self.fetch(
            self.client
                .post(self.url(config::CARDS_BY_UUID_PATH))
                .json(&body),
        )
    }

    // -- Misc --------------------------------------------------------------

    /// `HEAD url` and parse its `Last-Modified` header. `Ok(None)` when the
    /// server sends no (or an unreadable) header.
    pub fn last_modified(&self, url: &str) -> Result<Option<DateTime<Utc>>> {
        let resp = self.client.head(url).send()?.error_for_status()?;
        let Some(header) = resp.headers().get(reqwest::header::LAST_MODIFIED) else {
            return Ok(None);
        };
        let parsed = header
            .to_str()
            .ok()
            .and_then(|raw| DateTime::parse_from_rfc2822(raw).ok())
            .map(|dt| dt.with_timezone(&Utc));
        if parsed.is_none() {
            warn!("Unreadable Last-Modified header from {}: {:?}", url, header);
        }
        Ok(parsed)
    }

    // -- Internals ---------------------------------------------------------

    fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let resp = request.send()?.error_for_status()?;
        let url = resp.url().to_string();
        let body = resp.text()?;
        serde_json::from_str(&body).map_err(|e| {
            InventoryError::InvalidResponse(format!("{}: {}", url, e))
        })
    }
}

impl CardLookup for ApiClient {
    fn cards_by_uuids(&self, uuids: &[String]) -> Result<Vec<Card>> {
        ApiClient::cards_by_uuids(self, uuids)
    }
}

impl fmt::Display for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiClient(base_url={})", self.base_url)
    }
}
