use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Where the two lookup providers live and how patient to be with them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Base URL of the postcode provider; the normalized postcode is appended
    /// as the final path segment.
    pub postcode_url: String,

    /// URL of the place-autocomplete provider (`input` and `sessiontoken`
    /// query parameters are added per request).
    pub place_url: String,

    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,

    /// Maximum number of candidates kept from a single provider response
    pub max_candidates: usize,

    /// Optional API key sent as the `key` query parameter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            postcode_url: "http://127.0.0.1:8080/api/postcodes".to_string(),
            place_url: "http://127.0.0.1:8080/api/places/autocomplete".to_string(),
            timeout_ms: 5_000,
            max_candidates: 10,
            api_key: None,
        }
    }
}

impl GatewayConfig {
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.postcode_url.trim().is_empty() {
            return Err("postcode_url must not be empty".to_string());
        }
        if self.place_url.trim().is_empty() {
            return Err("place_url must not be empty".to_string());
        }
        for (name, raw) in [
            ("postcode_url", &self.postcode_url),
            ("place_url", &self.place_url),
        ] {
            reqwest::Url::parse(raw.trim())
                .map_err(|err| format!("{name} is not a valid URL ({raw}): {err}"))?;
        }
        if self.timeout_ms == 0 {
            return Err("timeout_ms must be > 0".to_string());
        }
        if self.max_candidates == 0 {
            return Err("max_candidates must be > 0".to_string());
        }
        Ok(())
    }
}
