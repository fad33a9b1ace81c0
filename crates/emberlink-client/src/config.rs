//! Environment-backed client configuration.

use std::env;

use thiserror::Error;
use url::Url;

const DEFAULT_PACKAGE: &str = "io.emberlink.companion";
const DEFAULT_ENDPOINT: &str = "io.emberlink.companion/io.emberlink.companion.EventService";

/// Configuration error for invalid environment values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A configuration value could not be used.
    #[error("invalid value for {key}: '{value}' ({reason})")]
    InvalidValue {
        /// Environment variable name.
        key: &'static str,
        /// Offending value.
        value: String,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Runtime configuration of the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Package identity of the companion service application.
    pub package: String,
    /// Named service endpoint to bind within that package.
    pub endpoint: String,
    /// Acquisition URI opened when the companion application is missing.
    pub acquisition_uri: Url,
}

impl ClientConfig {
    /// Build a configuration with an explicit acquisition URI.
    pub fn new(
        package: impl Into<String>,
        endpoint: impl Into<String>,
        acquisition_uri: &str,
    ) -> Result<Self, ConfigError> {
        let acquisition_uri = parse_acquisition_uri("EMBERLINK_ACQUISITION_URI", acquisition_uri)?;
        Ok(Self {
            package: package.into(),
            endpoint: endpoint.into(),
            acquisition_uri,
        })
    }

    /// Parse configuration from environment variables.
    ///
    /// `EMBERLINK_PACKAGE`, `EMBERLINK_ENDPOINT`, and
    /// `EMBERLINK_ACQUISITION_URI` override the defaults; the acquisition URI
    /// falls back to the store listing of the configured package.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(mut lookup: F) -> Result<Self, ConfigError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let package = optional_trimmed("EMBERLINK_PACKAGE", &mut lookup)
            .unwrap_or_else(|| DEFAULT_PACKAGE.to_owned());
        let endpoint = optional_trimmed("EMBERLINK_ENDPOINT", &mut lookup)
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_owned());
        let acquisition_uri = match optional_trimmed("EMBERLINK_ACQUISITION_URI", &mut lookup) {
            Some(raw) => parse_acquisition_uri("EMBERLINK_ACQUISITION_URI", &raw)?,
            None => store_listing_uri(&package),
        };

        Ok(Self {
            package,
            endpoint,
            acquisition_uri,
        })
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            package: DEFAULT_PACKAGE.to_owned(),
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            acquisition_uri: store_listing_uri(DEFAULT_PACKAGE),
        }
    }
}

/// Store listing URI for a package identity.
fn store_listing_uri(package: &str) -> Url {
    Url::parse(&format!("market://details?id={package}"))
        .expect("store listing URI for a package identity is always parseable")
}

fn parse_acquisition_uri(key: &'static str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|err| ConfigError::InvalidValue {
        key,
        value: raw.to_owned(),
        reason: err.to_string(),
    })
}

fn optional_trimmed<F>(key: &str, lookup: &mut F) -> Option<String>
where
    F: FnMut(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl FnMut(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn falls_back_to_defaults() {
        let config = ClientConfig::from_lookup(lookup_from(&[])).expect("defaults must be valid");
        assert_eq!(config, ClientConfig::default());
        assert_eq!(
            config.acquisition_uri.as_str(),
            "market://details?id=io.emberlink.companion"
        );
    }

    #[test]
    fn derives_store_uri_from_overridden_package() {
        let config =
            ClientConfig::from_lookup(lookup_from(&[("EMBERLINK_PACKAGE", "com.example.svc")]))
                .expect("override must be valid");
        assert_eq!(config.package, "com.example.svc");
        assert_eq!(
            config.acquisition_uri.as_str(),
            "market://details?id=com.example.svc"
        );
    }

    #[test]
    fn rejects_unparseable_acquisition_uri() {
        let err = ClientConfig::from_lookup(lookup_from(&[(
            "EMBERLINK_ACQUISITION_URI",
            "not a uri",
        )]))
        .expect_err("bad URI must be rejected");
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "EMBERLINK_ACQUISITION_URI",
                ..
            }
        ));
    }

    #[test]
    fn ignores_blank_overrides() {
        let config = ClientConfig::from_lookup(lookup_from(&[("EMBERLINK_PACKAGE", "   ")]))
            .expect("blank override falls back to default");
        assert_eq!(config.package, "io.emberlink.companion");
    }
}
