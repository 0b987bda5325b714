//! Config loading, validation, and derived values.

use super::model::LockConfig;
use crate::error::{LockError, Result};
use std::path::{Path, PathBuf};

impl LockConfig {
    /// Load config from a YAML file.
    ///
    /// # Returns
    ///
    /// * `Ok(LockConfig)` - Successfully loaded and validated config
    /// * `Err(LockError::Config)` - Read error, parse error, or validation failure
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            LockError::Config(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Load config from a YAML file, falling back to defaults when the file
    /// does not exist. A present but invalid file is still an error.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // serde_yaml maps an empty document to unit, not an empty mapping
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: LockConfig = serde_yaml::from_str(yaml)
            .map_err(|e| LockError::Config(format!("failed to parse config YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| LockError::Config(format!("failed to serialize config to YAML: {}", e)))
    }

    /// Validate config values.
    ///
    /// Validation rules:
    /// - `lock_file` must be a bare, non-empty file name
    /// - `stale_threshold_minutes`, `heartbeat_interval_secs` and
    ///   `io_timeout_secs` must be positive
    /// - the heartbeat interval must be shorter than the stale threshold
    pub fn validate(&self) -> Result<()> {
        let name = self.lock_file.trim();
        if name.is_empty() || name.contains('/') || name.contains('\\') {
            return Err(LockError::Config(format!(
                "config validation failed: lock_file must be a plain file name (found '{}')",
                self.lock_file
            )));
        }

        if self.stale_threshold_minutes == 0 {
            return Err(LockError::Config(
                "config validation failed: stale_threshold_minutes must be greater than 0"
                    .to_string(),
            ));
        }

        if self.heartbeat_interval_secs == 0 {
            return Err(LockError::Config(
                "config validation failed: heartbeat_interval_secs must be greater than 0"
                    .to_string(),
            ));
        }

        if self.io_timeout_secs == 0 {
            return Err(LockError::Config(
                "config validation failed: io_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.heartbeat_interval_secs >= u64::from(self.stale_threshold_minutes) * 60 {
            return Err(LockError::Config(format!(
                "config validation failed: heartbeat_interval_secs ({}) must be shorter than the \
                 stale threshold ({} minutes), or a live holder would look abandoned",
                self.heartbeat_interval_secs, self.stale_threshold_minutes
            )));
        }

        Ok(())
    }

    /// Path of the lock file inside `shared_dir`.
    pub fn lock_path<P: AsRef<Path>>(&self, shared_dir: P) -> PathBuf {
        shared_dir.as_ref().join(self.lock_file.trim())
    }

    /// Staleness threshold as a wall-clock duration.
    pub fn stale_threshold(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.stale_threshold_minutes))
    }

    /// Interval between heartbeats.
    pub fn heartbeat_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.heartbeat_interval_secs)
    }

    /// Bound on each lock store call.
    pub fn io_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.io_timeout_secs)
    }

    /// Display name override with blank values treated as unset.
    pub fn display_name_override(&self) -> Option<&str> {
        self.display_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
    }
}
