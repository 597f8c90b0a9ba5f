//! Async wrapper around [`ApiClient`] for use in async runtimes (Tokio, etc.).
//!
//! Runs every request on the blocking thread pool via
//! [`tokio::task::spawn_blocking`], keeping the async event loop free. The
//! wrapped client is also built there, since a blocking HTTP client cannot
//! be created on a runtime thread.
//!
//! # Example
//!
//! ```no_run
//! use mtg_inventory::AsyncApiClient;
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = AsyncApiClient::builder()
//!         .base_url("http://localhost:3000")
//!         .build()
//!         .await
//!         .unwrap();
//!     let sets = client.list_sets().await.unwrap();
//!     println!("{} sets", sets.len());
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use crate::client::{ApiClient, ConnectionStatus};
use crate::config;
use crate::error::{InventoryError, Result};
use crate::models::{Card, CardSet, SetName, SetSummary};

// ---------------------------------------------------------------------------
// AsyncApiClientBuilder
// ---------------------------------------------------------------------------

/// Builder for an [`AsyncApiClient`].
pub struct AsyncApiClientBuilder {
    base_url: String,
    timeout: Duration,
}

impl Default for AsyncApiClientBuilder {
    fn default() -> Self {
        Self {
            base_url: config::DEFAULT_API_BASE.to_string(),
            timeout: config::DEFAULT_TIMEOUT,
        }
    }
}

impl AsyncApiClientBuilder {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the wrapped [`ApiClient`] on the blocking thread pool.
    pub async fn build(self) -> Result<AsyncApiClient> {
        tokio::task::spawn_blocking(move || {
            let client = ApiClient::builder()
                .base_url(self.base_url)
                .timeout(self.timeout)
                .build()?;
            Ok(AsyncApiClient::from_client(client))
        })
        .await
        .map_err(|e| InventoryError::InvalidArgument(format!("Task join error: {e}")))?
    }
}

// ---------------------------------------------------------------------------
// AsyncApiClient
// ---------------------------------------------------------------------------

/// Async wrapper around [`ApiClient`].
#[derive(Debug, Clone)]
pub struct AsyncApiClient {
    inner: Arc<ApiClient>,
}

impl AsyncApiClient {
    pub fn builder() -> AsyncApiClientBuilder {
        AsyncApiClientBuilder::default()
    }

    /// Wrap a client that was built outside the runtime.
    pub fn from_client(client: ApiClient) -> Self {
        Self {
            inner: Arc::new(client),
        }
    }

    /// Run a blocking client call on the blocking thread pool.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use mtg_inventory::AsyncApiClient;
    /// # async fn example() -> mtg_inventory::Result<()> {
    /// # let client = AsyncApiClient::builder().build().await?;
    /// let names = client.run(|c| c.set_names()).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&ApiClient) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let client = self.inner.clone();
        tokio::task::spawn_blocking(move || f(&client))
            .await
            .map_err(|e| InventoryError::InvalidArgument(format!("Task join error: {e}")))?
    }

    pub async fn status(&self) -> ConnectionStatus {
        self.run(|c| Ok(c.status()))
            .await
            .unwrap_or(ConnectionStatus::Disconnected)
    }

    pub async fn list_sets(&self) -> Result<Vec<SetSummary>> {
        self.run(|c| c.list_sets()).await
    }

    pub async fn set_names(&self) -> Result<Vec<SetName>> {
        self.run(|c| c.set_names()).await
    }

    pub async fn load_sets(&self, set_codes: Vec<String>) -> Result<Vec<CardSet>> {
        self.run(move |c| c.load_sets(&set_codes)).await
    }

    pub async fn cards_by_set_codes(&self, set_codes: Vec<String>) -> Result<Vec<Card>> {
        self.run(move |c| c.cards_by_set_codes(&set_codes)).await
    }

    pub async fn cards_by_uuids(&self, uuids: Vec<String>) -> Result<Vec<Card>> {
        self.run(move |c| c.cards_by_uuids(&uuids)).await
    }

    /// Drop this handle on the blocking thread pool. The client itself is
    /// released once the last clone is closed.
    pub async fn close(self) -> Result<()> {
        tokio::task::spawn_blocking(move || drop(self))
            .await
            .map_err(|e| InventoryError::InvalidArgument(format!("Task join error: {e}")))
    }
}
