//! Error types for sootcache
//!
//! All modules use `SootResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for sootcache operations
pub type SootResult<T> = Result<T, SootError>;

/// All errors that can occur in sootcache
#[derive(Error, Debug)]
pub enum SootError {
    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    // Network errors
    #[error("Network request failed for {url}: {reason}")]
    Network { url: String, reason: String },

    // Cache errors
    #[error("Precache failed for {url}: {reason}")]
    Precache { url: String, reason: String },

    #[error("Cache rejected request {url}: {reason}")]
    CacheRejected { url: String, reason: String },

    #[error("Corrupt cache entry {path}: {reason}")]
    CacheEntryCorrupt { path: PathBuf, reason: String },

    // Lifecycle errors
    #[error("No active worker. Install one first")]
    NoActiveWorker,

    #[error("No worker version is waiting to activate")]
    NothingWaiting,

    #[error("Registered version {registered} does not match configured version {configured}")]
    VersionMismatch {
        registered: String,
        configured: String,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl SootError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a network error for a URL
    pub fn network(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Network {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error came from the network rather than local storage
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::Precache { .. })
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::NoActiveWorker => Some("Run: sootcache install"),
            Self::NothingWaiting => Some("Run: sootcache install --no-activate"),
            Self::VersionMismatch { .. } => Some("Run: sootcache install to register the configured version"),
            Self::Precache { .. } => Some("Check that every precache asset is reachable"),
            Self::Network { .. } => Some("Check network connectivity and the configured origin"),
            Self::CacheEntryCorrupt { .. } => Some("Run: sootcache message clear-cache"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = SootError::network("http://localhost/a.css", "connection refused");
        assert!(err.to_string().contains("http://localhost/a.css"));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn error_hint() {
        let err = SootError::NoActiveWorker;
        assert_eq!(err.hint(), Some("Run: sootcache install"));
        assert_eq!(SootError::Internal("x".into()).hint(), None);
    }

    #[test]
    fn error_is_network() {
        assert!(SootError::network("u", "r").is_network());
        assert!(SootError::Precache {
            url: "u".into(),
            reason: "r".into()
        }
        .is_network());
        assert!(!SootError::NoActiveWorker.is_network());
    }
}
