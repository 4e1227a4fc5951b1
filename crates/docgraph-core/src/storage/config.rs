//! Storage configuration.

use std::path::PathBuf;

/// How many versions of a document are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Keep at most N versions per document; older ones are pruned on save.
    /// None means unlimited. The latest version is always kept.
    pub max_versions: Option<usize>,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            max_versions: Some(4),
        }
    }
}

impl RetentionPolicy {
    /// Keep every version.
    pub fn keep_all() -> Self {
        Self { max_versions: None }
    }

    /// Keep only the latest version.
    pub fn latest_only() -> Self {
        Self::max_versions(1)
    }

    /// Keep at most `n` versions (at least one).
    pub fn max_versions(n: usize) -> Self {
        Self {
            max_versions: Some(n.max(1)),
        }
    }
}

/// Configuration for the storage engine.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Path to the database directory.
    pub path: PathBuf,

    /// Page cache capacity in bytes.
    pub cache_capacity: u64,

    /// Flush interval in milliseconds. None means flush on every write.
    pub flush_every_ms: Option<u64>,

    /// Enable zstd compression.
    pub compression: bool,

    /// Temporary database (deleted on drop).
    pub temporary: bool,

    /// Version retention.
    pub retention: RetentionPolicy,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./docgraph_data"),
            cache_capacity: 256 * 1024 * 1024, // 256MB
            flush_every_ms: Some(1000),        // Flush every second
            compression: true,
            temporary: false,
            retention: RetentionPolicy::default(),
        }
    }
}

impl StorageConfig {
    /// Create a new configuration with the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Create a temporary in-memory configuration for testing.
    pub fn temporary() -> Self {
        Self {
            path: PathBuf::from(""),
            temporary: true,
            ..Default::default()
        }
    }

    /// Set the page cache capacity.
    pub fn with_cache_capacity(mut self, bytes: u64) -> Self {
        self.cache_capacity = bytes;
        self
    }

    /// Set the flush interval. None flushes only on explicit request.
    pub fn with_flush_every_ms(mut self, ms: Option<u64>) -> Self {
        self.flush_every_ms = ms;
        self
    }

    /// Enable or disable compression.
    pub fn with_compression(mut self, compression: bool) -> Self {
        self.compression = compression;
        self
    }

    /// Set the version retention policy.
    pub fn with_retention(mut self, retention: RetentionPolicy) -> Self {
        self.retention = retention;
        self
    }

    /// Convert to sled configuration.
    pub(crate) fn to_sled_config(&self) -> sled::Config {
        let mut config = sled::Config::new()
            .cache_capacity(self.cache_capacity)
            .use_compression(self.compression)
            .flush_every_ms(self.flush_every_ms);

        if self.temporary {
            config = config.temporary(true);
        } else {
            config = config.path(&self.path);
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StorageConfig::new("/tmp/docgraph");
        assert_eq!(config.path, PathBuf::from("/tmp/docgraph"));
        assert!(!config.temporary);
        assert!(config.compression);
        assert_eq!(config.retention.max_versions, Some(4));
    }

    #[test]
    fn test_retention() {
        assert_eq!(RetentionPolicy::keep_all().max_versions, None);
        assert_eq!(RetentionPolicy::latest_only().max_versions, Some(1));
        assert_eq!(RetentionPolicy::max_versions(0).max_versions, Some(1));

        let config = StorageConfig::temporary().with_retention(RetentionPolicy::latest_only());
        assert_eq!(config.retention, RetentionPolicy::latest_only());
    }

    #[test]
    fn test_temporary() {
        let config = StorageConfig::temporary()
            .with_compression(false)
            .with_flush_every_ms(None);
        assert!(config.temporary);
        assert!(!config.compression);
        assert!(config.flush_every_ms.is_none());
    }
}
