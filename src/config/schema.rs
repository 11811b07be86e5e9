//! Configuration schema for sootcache
//!
//! Configuration is stored at `~/.config/sootcache/config.toml`

use serde::{Deserialize, Serialize};

/// Name of the cache generation owned by this build of the worker
pub const DEFAULT_CACHE_NAME: &str = "soot-silicon-v1";

/// Document served when a page cannot be fetched
pub const DEFAULT_OFFLINE_URL: &str = "/offline.html";

/// Google Fonts stylesheet used by every page
pub const FONTS_STYLESHEET_URL: &str = "https://fonts.googleapis.com/css2?family=Fira+Code:wght@400;500;600&family=Inter:wght@400;500;600;700;800&display=swap";

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Worker and cache settings
    pub worker: WorkerConfig,

    /// Network client settings
    pub network: NetworkConfig,

    /// Push notification presentation
    pub notifications: NotificationConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Worker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Versioned cache bucket name (change it to roll out a new generation)
    pub cache_name: String,

    /// Origin the worker serves (scheme, host and port)
    pub origin: String,

    /// Offline fallback document, relative to the origin
    pub offline_url: String,

    /// External hosts whose requests are intercepted as well
    pub allowed_hosts: Vec<String>,

    /// Assets stored on install, relative paths or absolute URLs
    pub precache: Vec<String>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            cache_name: DEFAULT_CACHE_NAME.to_string(),
            origin: "http://localhost:4000".to_string(),
            offline_url: DEFAULT_OFFLINE_URL.to_string(),
            allowed_hosts: vec![
                "fonts.googleapis.com".to_string(),
                "fonts.gstatic.com".to_string(),
            ],
            precache: vec![
                "/".to_string(),
                "/index.html".to_string(),
                "/resources.html".to_string(),
                "/useful-commands.html".to_string(),
                "/assets/css/main.css".to_string(),
                "/assets/js/main.js".to_string(),
                "/blog/".to_string(),
                DEFAULT_OFFLINE_URL.to_string(),
                FONTS_STYLESHEET_URL.to_string(),
            ],
        }
    }
}

/// Network client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Whole-request timeout in seconds
    pub timeout_secs: u64,

    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: format!("sootcache/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Push notification presentation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Notification title
    pub title: String,

    /// Body used when a push carries no payload
    pub default_body: String,

    /// Icon path
    pub icon: String,

    /// Badge path
    pub badge: String,

    /// Vibration pattern in milliseconds
    pub vibrate: Vec<u32>,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            title: "Soot & Silicon".to_string(),
            default_body: "New update available!".to_string(),
            icon: "/assets/images/icon-192.png".to_string(),
            badge: "/assets/images/badge-72.png".to_string(),
            vibrate: vec![100, 50, 100],
        }
    }
}
