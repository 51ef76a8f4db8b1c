use std::env;
use std::path::PathBuf;

use crate::client::DEFAULT_VENDOR_ENDPOINT;
use crate::credentials::DEFAULT_KEY_FILE;
use crate::logging::LogFormat;

pub const DEFAULT_SITE_ID: &str = "1036556791122480";

/// Process configuration, read from the environment once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    pub host: String,
    pub port: u16,
    pub vendor_endpoint: String,
    pub default_site_id: String,
    pub key_file: PathBuf,
    pub log_format: LogFormat,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            vendor_endpoint: DEFAULT_VENDOR_ENDPOINT.to_string(),
            default_site_id: DEFAULT_SITE_ID.to_string(),
            key_file: PathBuf::from(DEFAULT_KEY_FILE),
            log_format: LogFormat::Compact,
        }
    }
}

impl ProxyConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            host: var("HOST").unwrap_or(defaults.host),
            port: var("PORT")
                .and_then(|p| p.trim().parse().ok())
                .unwrap_or(defaults.port),
            vendor_endpoint: var("ESA_ENDPOINT").unwrap_or(defaults.vendor_endpoint),
            default_site_id: var("ESA_DEFAULT_SITE_ID").unwrap_or(defaults.default_site_id),
            key_file: var("ESA_KEY_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.key_file),
            log_format: var("LOG_FORMAT")
                .map(|f| LogFormat::parse(&f))
                .unwrap_or(defaults.log_format),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let config = ProxyConfig::from_lookup(|_| None);
        assert_eq!(config, ProxyConfig::default());
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.default_site_id, "1036556791122480");
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = ProxyConfig::from_lookup(lookup_from(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "9090"),
            ("ESA_ENDPOINT", "http://localhost:1234"),
            ("ESA_DEFAULT_SITE_ID", "777"),
            ("ESA_KEY_FILE", "/etc/esa/key.txt"),
            ("LOG_FORMAT", "json"),
        ]));
        assert_eq!(config.bind_address(), "127.0.0.1:9090");
        assert_eq!(config.vendor_endpoint, "http://localhost:1234");
        assert_eq!(config.default_site_id, "777");
        assert_eq!(config.key_file, PathBuf::from("/etc/esa/key.txt"));
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn invalid_port_and_blank_values_fall_back() {
        let config = ProxyConfig::from_lookup(lookup_from(&[("PORT", "eighty"), ("HOST", "  ")]));
        assert_eq!(config.port, 8080);
        assert_eq!(config.host, "0.0.0.0");
    }
}
