use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Response of the postcode-to-address-list provider.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq, JsonSchema)]
pub struct PostcodeLookupResponse {
    #[serde(default)]
    pub postcode: String,
    #[serde(default)]
    pub addresses: Vec<PostcodeAddress>,
}

/// One address record returned for a postcode.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq, JsonSchema)]
pub struct PostcodeAddress {
    #[serde(default)]
    pub line_1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub town_or_city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub county: Option<String>,
    #[serde(default)]
    pub postcode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_address: Option<String>,
}

impl PostcodeAddress {
    /// Address lines in display order with blanks removed.
    pub fn non_empty_lines(&self) -> Vec<&str> {
        [
            Some(self.line_1.as_str()),
            self.line_2.as_deref(),
            self.town_or_city.as_deref(),
            self.county.as_deref(),
            Some(self.postcode.as_str()),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
    }
}

/// Response of the place-autocomplete provider.
///
/// The provider either returns predictions or an error message; both fields are
/// optional on the wire so a malformed body still deserializes and can be
/// rejected explicitly.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq, JsonSchema)]
pub struct PlacePredictionsResponse {
    #[serde(default)]
    pub predictions: Vec<PlacePrediction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq, JsonSchema)]
pub struct PlacePrediction {
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_text: Option<String>,
}
