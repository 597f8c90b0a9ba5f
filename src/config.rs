use std::path::PathBuf;
use std::time::Duration;

/// Base URL of the card-data backend used when none is configured.
pub const DEFAULT_API_BASE: &str = "http://localhost:3000";

pub const STATUS_PATH: &str = "/admin/status";
pub const SETS_PATH: &str = "/api/v1/sets";
pub const SET_NAMES_PATH: &str = "/api/v1/set-names";
pub const CARDS_BY_SET_CODE_PATH: &str = "/api/v1/cards/set-code";
pub const CARDS_BY_UUID_PATH: &str = "/api/v1/cards/uuid/";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Fixed connectivity polling interval (no backoff).
pub const STATUS_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Request timeout of the background status check. Bounds how long stopping
/// a poller can wait on an in-flight check.
pub const STATUS_TIMEOUT: Duration = Duration::from_secs(5);

pub const DEFAULT_PAGE_SIZE: usize = 10;

pub const DEFAULT_EXPORT_NAME: &str = "collection";

/// Where the file store fetches card database archives from.
pub const MTGJSON_CDN_BASE: &str = "https://mtgjson.com/api/v5";

pub fn default_cache_dir() -> PathBuf {
    if let Some(cache) = dirs::cache_dir() {
        cache.join("mtg-inventory")
    } else {
        PathBuf::from(".mtg-inventory-cache")
    }
}
