//! Backend connectivity tracking.
//!
//! [`BackendStatus`] records the result of explicit checks. [`StatusPoller`]
//! repeats the check on a background thread at a fixed interval (no
//! backoff) until it is dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::info;

use crate::client::{ApiClient, ConnectionStatus};
use crate::error::Result;

// ---------------------------------------------------------------------------
// BackendStatus
// ---------------------------------------------------------------------------

/// Last known connectivity of the backend. Starts out disconnected.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BackendStatus {
    status: ConnectionStatus,
    last_checked: Option<DateTime<Utc>>,
}

impl BackendStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn is_connected(&self) -> bool {
        self.status.is_connected()
    }

    pub fn last_checked(&self) -> Option<DateTime<Utc>> {
        self.last_checked
    }

    /// Query the backend and record the answer. Returns `true` if the
    /// status changed.
    pub fn check(&mut self, client: &ApiClient) -> bool {
        let status = client.status();
        self.record(status)
    }

    /// Record a status observed elsewhere, e.g. a failed catalog fetch.
    pub fn record(&mut self, status: ConnectionStatus) -> bool {
        let changed = self.status != status;
        self.status = status;
        self.last_checked = Some(Utc::now());
        if changed {
            info!("Backend is now {:?}", status);
        }
        changed
    }
}

// ---------------------------------------------------------------------------
// StatusPoller
// ---------------------------------------------------------------------------

/// Background connectivity poll. The first check runs immediately; later
/// checks follow every `interval`. `on_change` is called from the poll
/// thread whenever the status differs from the previous check.
///
/// Dropping the poller stops it. The drop waits for an in-flight check to
/// finish, which can take up to the client's request timeout; give the
/// poller a client with a short timeout (see
/// [`STATUS_TIMEOUT`](crate::config::STATUS_TIMEOUT)).
pub struct StatusPoller {
    connected: Arc<AtomicBool>,
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl StatusPoller {
    pub fn spawn<F>(client: ApiClient, interval: Duration, mut on_change: F) -> Result<Self>
    where
        F: FnMut(ConnectionStatus) + Send + 'static,
    {
        let connected = Arc::new(AtomicBool::new(false));
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let flag = connected.clone();

        let handle = thread::Builder::new()
            .name("backend-status".to_string())
            .spawn(move || {
                let mut last: Option<ConnectionStatus> = None;
                loop {
                    let status = client.status();
                    flag.store(status.is_connected(), Ordering::SeqCst);
                    if last != Some(status) {
                        info!("Backend {} is {:?}", client.base_url(), status);
                        on_change(status);
                        last = Some(status);
                    }
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => continue,
                        _ => break,
                    }
                }
            })?;

        Ok(Self {
            connected,
            stop: Some(stop_tx),
            handle: Some(handle),
        })
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Stop polling and join the poll thread. Blocks until a check already
    /// in flight returns or hits the client's timeout.
    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for StatusPoller {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
