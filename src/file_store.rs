//! Local blob store for downloaded data archives.
//!
//! Files live flat in one directory. Each successful download records a
//! timestamp in `timestamps.json` so callers can show when data was last
//! refreshed. JSON payloads may be stored gzip-compressed (`.gz`).

use std::collections::BTreeMap;
use std::fs;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use log::{info, warn};
use reqwest::blocking::Client;

use crate::config;
use crate::error::{InventoryError, Result};

const TIMESTAMPS_FILE: &str = "timestamps.json";

pub const ALL_PRINTINGS_FILE: &str = "AllPrintings.json.gz";
pub const META_FILE: &str = "Meta.json";

/// Presence and download time of a stored file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStatus {
    pub exists: bool,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Downloads files into a directory and reads them back.
pub struct FileStore {
    /// Directory where files are stored.
    pub dir: PathBuf,
    /// If true, never download (use stored files only).
    pub offline: bool,
    /// Root URL the `refresh_*` downloads are fetched from.
    pub cdn_base: String,
    timeout: Duration,
    client: Option<Client>,
}

impl FileStore {
    /// Open a store. `None` uses the platform cache directory. The directory
    /// is created if missing.
    pub fn new(dir: Option<PathBuf>, offline: bool, timeout: Duration) -> Result<Self> {
        let dir = dir.unwrap_or_else(config::default_cache_dir);
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            offline,
            cdn_base: config::MTGJSON_CDN_BASE.to_string(),
            timeout,
            client: None,
        })
    }

    /// Lazy HTTP client, created on first download.
    fn client(&mut self) -> Result<&Client> {
        if self.client.is_none() {
            let client = Client::builder()
                .timeout(self.timeout)
                .redirect(reqwest::redirect::Policy::limited(10))
                .build()?;
            self.client = Some(client);
        }
        self.client
            .as_ref()
            .ok_or_else(|| InventoryError::InvalidArgument("HTTP client unavailable".into()))
    }

    /// Location of `filename` inside the store.
    pub fn path(&self, filename: &str) -> Result<PathBuf> {
        let plain = Path::new(filename)
            .file_name()
            .is_some_and(|name| name == filename);
        if !plain || filename == TIMESTAMPS_FILE {
            return Err(InventoryError::InvalidArgument(format!(
                "invalid file name: {}",
                filename
            )));
        }
        Ok(self.dir.join(filename))
    }

    // -- Downloads ---------------------------------------------------------

    /// Download `url` into the store as `filename`, replacing any previous
    /// copy. The body goes to a temp file first and is renamed on success.
    pub fn download_file(&mut self, url: &str, filename: &str) -> Result<PathBuf> {
        let dest = self.path(filename)?;
        if self.offline {
            return Err(InventoryError::NotFound(format!(
                "{} cannot be downloaded in offline mode",
                filename
            )));
        }
        info!("Downloading {}", url);

        let client = self.client()?.clone();
        let bytes = client.get(url).send()?.error_for_status()?.bytes()?;

        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(&bytes)?;
        tmp.flush()?;
        tmp.persist(&dest).map_err(|e| InventoryError::Io(e.error))?;

        self.record_download(filename)?;
        Ok(dest)
    }

    /// Return the stored file, downloading it first if it is missing.
    pub fn ensure_file(&mut self, url: &str, filename: &str) -> Result<PathBuf> {
        let path = self.path(filename)?;
        if path.exists() {
            return Ok(path);
        }
        if self.offline {
            return Err(InventoryError::NotFound(format!(
                "{} not stored and offline mode is enabled",
                filename
            )));
        }
        self.download_file(url, filename)
    }

    /// Re-download the full MTGJSON card database.
    pub fn refresh_all_printings(&mut self) -> Result<PathBuf> {
        let url = self.cdn_url(ALL_PRINTINGS_FILE);
        self.download_file(&url, ALL_PRINTINGS_FILE)
    }

    /// Download `Meta.json` and return its `data.version`, if present.
    pub fn refresh_meta(&mut self) -> Result<Option<String>> {
        let url = self.cdn_url(META_FILE);
        self.download_file(&url, META_FILE)?;
        let meta = self.load_json(META_FILE)?;
        Ok(meta
            .get("data")
            .and_then(|d| d.get("version"))
            .and_then(|v| v.as_str())
            .map(String::from))
    }

    fn cdn_url(&self, filename: &str) -> String {
        format!("{}/{}", self.cdn_base.trim_end_matches('/'), filename)
    }

    // -- Reads -------------------------------------------------------------

    pub fn check_file(&self, filename: &str) -> Result<FileStatus> {
        let exists = self.path(filename)?.exists();
        let last_modified = if exists {
            self.read_timestamps().get(filename).copied()
        } else {
            None
        };
        Ok(FileStatus {
            exists,
            last_modified,
        })
    }

    /// Load and parse a stored JSON file (`.gz` is decompressed).
    ///
    /// A file that fails to parse is deleted so the next download replaces
    /// it.
    pub fn load_json(&self, filename: &str) -> Result<serde_json::Value> {
        let path = self.path(filename)?;
        if !path.exists() {
            return Err(InventoryError::NotFound(format!("File not found: {}", filename)));
        }

        let contents = if path.extension().and_then(|e| e.to_str()) == Some("gz") {
            let file = fs::File::open(&path)?;
            let mut decoder = GzDecoder::new(BufReader::new(file));
            let mut contents = String::new();
            decoder.read_to_string(&mut contents).map(|_| contents)
        } else {
            fs::read_to_string(&path)
        };

        let parsed = contents
            .map_err(InventoryError::from)
            .and_then(|text| serde_json::from_str(&text).map_err(InventoryError::from));

        match parsed {
            Ok(value) => Ok(value),
            Err(e) => {
                warn!("Corrupt stored file {}: {} -- removing", path.display(), e);
                let _ = fs::remove_file(&path);
                self.forget(filename);
                Err(InventoryError::NotFound(format!(
                    "Stored file '{}' was corrupt and has been removed. \
                     Download it again. Original error: {}",
                    filename, e
                )))
            }
        }
    }

    // -- Removal -----------------------------------------------------------

    /// Delete a stored file. Returns whether it existed.
    pub fn remove(&self, filename: &str) -> Result<bool> {
        let path = self.path(filename)?;
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path)?;
        self.forget(filename);
        Ok(true)
    }

    /// Remove all stored files and recreate the directory.
    pub fn clear(&self) -> Result<()> {
        if self.dir.exists() {
            fs::remove_dir_all(&self.dir)?;
        }
        fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    /// Drop the HTTP client, if open.
    pub fn close(&mut self) {
        self.client = None;
    }

    // -- Timestamps --------------------------------------------------------

    fn read_timestamps(&self) -> BTreeMap<String, DateTime<Utc>> {
        fs::read_to_string(self.dir.join(TIMESTAMPS_FILE))
            .ok()
            .and_then(|text| serde_json::from_str(&text).ok())
            .unwrap_or_default()
    }

    fn write_timestamps(&self, stamps: &BTreeMap<String, DateTime<Utc>>) -> Result<()> {
        let text = serde_json::to_string_pretty(stamps)?;
        fs::write(self.dir.join(TIMESTAMPS_FILE), text)?;
        Ok(())
    }

    fn record_download(&self, filename: &str) -> Result<()> {
        let mut stamps = self.read_timestamps();
        stamps.insert(filename.to_string(), Utc::now());
        self.write_timestamps(&stamps)
    }

    fn forget(&self, filename: &str) {
        let mut stamps = self.read_timestamps();
        if stamps.remove(filename).is_some() {
            if let Err(e) = self.write_timestamps(&stamps) {
                warn!("Could not update {}: {}", TIMESTAMPS_FILE, e);
            }
        }
    }
}
