use log::{info, warn};
use once_cell::sync::OnceCell;
use serde_derive::Deserialize;
use std::sync::{Mutex, MutexGuard};

static INSTANCE: OnceCell<Mutex<RuntimeConfig>> = OnceCell::new();

pub fn instance() -> &'static Mutex<RuntimeConfig> {
    INSTANCE.get_or_init(|| Mutex::new(RuntimeConfig::new()))
}

fn lock() -> MutexGuard<'static, RuntimeConfig> {
    instance().lock().unwrap_or_else(|e| e.into_inner())
}

/// Snapshot of the process-wide configuration.
pub fn current() -> RuntimeConfig {
    lock().clone()
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct RuntimeConfig {
    pub addr: String,
    pub metrics_addr: String,
    pub min_batch_size: usize,
    pub max_batch_size: usize,
    pub max_body_bytes: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RuntimeConfig {
    pub fn new() -> Self {
        RuntimeConfig {
            addr: "0.0.0.0:4000".to_string(),
            metrics_addr: "0.0.0.0:4010".to_string(),
            min_batch_size: 2,
            max_batch_size: 1000,
            max_body_bytes: 1024 * 1024,
        }
    }

    /// Reads `path` and installs the result as the process-wide config.
    ///
    /// Falls back to defaults when the file is missing or invalid.
    pub fn from_toml(path: &str) -> Self {
        let config = Self::read_toml(path);
        *lock() = config.clone();
        config
    }

    fn read_toml(path: &str) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                warn!(
                    "Something went wrong reading the runtime config file {}, using defaults: {:?}",
                    path, e
                );
                return RuntimeConfig::new();
            }
        };
        let mut config: RuntimeConfig = match toml::from_str(&contents) {
            Ok(c) => c,
            Err(e) => {
                warn!(
                    "Something went wrong parsing the runtime config file {}, using defaults: {:?}",
                    path, e
                );
                return RuntimeConfig::new();
            }
        };
        if config.min_batch_size < 2 {
            warn!(
                "min_batch_size {} is below 2, pairs cannot be formed; using 2",
                config.min_batch_size
            );
            config.min_batch_size = 2;
        }
        if config.max_batch_size < config.min_batch_size {
            warn!(
                "max_batch_size {} is below min_batch_size {}; using {}",
                config.max_batch_size, config.min_batch_size, config.min_batch_size
            );
            config.max_batch_size = config.min_batch_size;
        }
        info!("loaded runtime config from {}: {:?}", path, config);
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = RuntimeConfig::read_toml("/definitely/not/here/config.toml");
        assert_eq!(config, RuntimeConfig::new());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let file = write_config("addr = \"127.0.0.1:8080\"\nmax_batch_size = 50\n");
        let config = RuntimeConfig::read_toml(file.path().to_str().unwrap());
        assert_eq!(config.addr, "127.0.0.1:8080");
        assert_eq!(config.max_batch_size, 50);
        assert_eq!(config.min_batch_size, 2);
        assert_eq!(config.metrics_addr, "0.0.0.0:4010");
        assert_eq!(config.max_body_bytes, 1024 * 1024);
    }

    #[test]
    fn test_invalid_file_uses_defaults() {
        let file = write_config("addr = [not toml");
        let config = RuntimeConfig::read_toml(file.path().to_str().unwrap());
        assert_eq!(config, RuntimeConfig::new());
    }

    #[test]
    fn test_batch_limits_are_clamped() {
        let file = write_config("min_batch_size = 1\nmax_batch_size = 1\n");
        let config = RuntimeConfig::read_toml(file.path().to_str().unwrap());
        assert_eq!(config.min_batch_size, 2);
        assert_eq!(config.max_batch_size, 2);
    }
}
