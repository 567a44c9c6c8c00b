//! Configuration types for the snapshot proxy.

mod cache;
mod listen;
mod upstream;

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

pub use cache::CacheConfig;
pub use listen::ListenConfig;
pub use upstream::{ConnectionPoolConfig, UpstreamConfig};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub listen: ListenConfig,
    #[serde(default)]
    pub connection_pool: ConnectionPoolConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_yaml(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    pub fn from_yaml(contents: &str) -> Result<Self, anyhow::Error> {
        // serde_yaml rejects an empty document, which is a valid all-defaults config
        let config: Config = if contents.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(contents)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.cache.lock_stripes == 0 {
            anyhow::bail!("cache.lock_stripes must be greater than zero");
        }

        if self.cache.dir.as_os_str().is_empty() {
            anyhow::bail!("cache.dir must not be empty (use \".\" for the working directory)");
        }

        for host in &self.upstream.allowed_hosts {
            let bare = host.strip_prefix("*.").unwrap_or(host);
            if bare.is_empty() || bare.contains('/') || bare.contains(':') {
                anyhow::bail!(
                    "Invalid entry '{host}' in upstream.allowed_hosts: expected a host name such as 'api.example.com' or '*.example.com'"
                );
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_yaml("").unwrap();
        assert_eq!(config.listen.port, 8080);
        assert_eq!(config.cache.dir, PathBuf::from("."));
        assert_eq!(config.cache.lock_stripes, 64);
        assert!(config.upstream.allowed_hosts.is_empty());
        assert!(!config.upstream.tls_skip_verify);
        assert_eq!(config.connection_pool.max_idle_per_host, 100);
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
listen:
  port: 9000
connection_pool:
  max_idle_per_host: 10
  connect_timeout_secs: 2
upstream:
  tls_skip_verify: true
  allowed_hosts:
    - api.example.com
    - "*.internal.example.com"
cache:
  dir: /var/cache/snapshot-proxy
  lock_stripes: 8
"#;

        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.listen.port, 9000);
        assert_eq!(config.connection_pool.max_idle_per_host, 10);
        assert_eq!(config.connection_pool.connect_timeout_secs, 2);
        // Unset pool fields keep their defaults
        assert_eq!(config.connection_pool.idle_timeout_secs, 90);
        assert!(config.upstream.tls_skip_verify);
        assert_eq!(config.upstream.allowed_hosts.len(), 2);
        assert_eq!(
            config.cache.dir,
            PathBuf::from("/var/cache/snapshot-proxy")
        );
        assert_eq!(config.cache.lock_stripes, 8);
    }

    #[test]
    fn test_zero_lock_stripes_rejected() {
        let yaml = r#"
cache:
  lock_stripes: 0
"#;
        let err = Config::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("lock_stripes"));
    }

    #[test]
    fn test_invalid_allowed_host_rejected() {
        let yaml = r#"
upstream:
  allowed_hosts: ["https://example.com"]
"#;
        let err = Config::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("allowed_hosts"));
    }

    #[test]
    fn test_from_file_missing() {
        let result = Config::from_file("/definitely/not/here.yaml");
        assert!(result.is_err());
    }
}
