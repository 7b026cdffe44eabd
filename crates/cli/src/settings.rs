use address_gateway::GatewayConfig;
use address_resolver::ResolverConfig;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const ENV_POSTCODE_URL: &str = "ADDRESS_POSTCODE_URL";
pub const ENV_PLACE_URL: &str = "ADDRESS_PLACE_URL";
pub const ENV_API_KEY: &str = "ADDRESS_API_KEY";

/// Everything the host needs, as read from `--config`.
///
/// ```toml
/// [gateway]
/// postcode_url = "https://lookup.example/api/postcodes"
/// place_url = "https://lookup.example/api/places/autocomplete"
///
/// [resolver]
/// debounce_ms = 250
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub gateway: GatewayConfig,
    pub resolver: ResolverConfig,
}

/// Command-line overrides; they win over the file and the environment.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub postcode_url: Option<String>,
    pub place_url: Option<String>,
    pub api_key: Option<String>,
    pub timeout_ms: Option<u64>,
}

impl Settings {
    /// Parse a settings document. JSON is tried first, then TOML.
    pub fn parse(raw: &str) -> Result<Self> {
        match serde_json::from_str(raw) {
            Ok(settings) => Ok(settings),
            Err(json_err) => toml::from_str(raw).map_err(|toml_err| {
                anyhow!("settings are neither valid JSON ({json_err}) nor valid TOML ({toml_err})")
            }),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("Invalid settings file {}", path.display()))
    }

    /// File (if any), then environment, then flags; validated at the end.
    pub fn load(path: Option<&Path>, overrides: &SettingsOverrides) -> Result<Self> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        settings.apply_env(|key| std::env::var(key).ok());
        settings.apply_overrides(overrides);
        settings.validate()?;
        Ok(settings)
    }

    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        if let Some(url) = non_empty(ENV_POSTCODE_URL) {
            self.gateway.postcode_url = url;
        }
        if let Some(url) = non_empty(ENV_PLACE_URL) {
            self.gateway.place_url = url;
        }
        if let Some(key) = non_empty(ENV_API_KEY) {
            self.gateway.api_key = Some(key);
        }
    }

    pub fn apply_overrides(&mut self, overrides: &SettingsOverrides) {
        if let Some(url) = &overrides.postcode_url {
            self.gateway.postcode_url.clone_from(url);
        }
        if let Some(url) = &overrides.place_url {
            self.gateway.place_url.clone_from(url);
        }
        if let Some(key) = &overrides.api_key {
            self.gateway.api_key = Some(key.clone());
        }
        if let Some(timeout_ms) = overrides.timeout_ms {
            self.gateway.timeout_ms = timeout_ms;
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.gateway
            .validate()
            .map_err(|err| anyhow!("Invalid gateway settings: {err}"))?;
        self.resolver
            .validate()
            .map_err(|err| anyhow!("Invalid resolver settings: {err}"))?;
        Ok(())
    }
}
