use crate::payload::{PlacePrediction, PostcodeAddress};
use crate::ADDRESS_LINE_SEPARATOR;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    Postcode,
    Place,
}

/// A single selectable resolved address.
///
/// Fields are private so a candidate cannot be edited after the gateway built
/// it; the two `from_*` constructors are the only way in.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
pub struct Candidate {
    description: String,
    primary_text: String,
    secondary_text: String,
    source: CandidateSource,
    is_postcode: bool,
}

impl Candidate {
    pub fn from_postcode_address(address: &PostcodeAddress) -> Self {
        let lines = address.non_empty_lines();
        let description = if lines.is_empty() {
            address
                .full_address
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string()
        } else {
            lines.join(ADDRESS_LINE_SEPARATOR)
        };
        let (primary_text, secondary_text) = match lines.split_first() {
            Some((first, rest)) => (first.to_string(), rest.join(ADDRESS_LINE_SEPARATOR)),
            None => (description.clone(), String::new()),
        };
        Self {
            description,
            primary_text,
            secondary_text,
            source: CandidateSource::Postcode,
            is_postcode: true,
        }
    }

    pub fn from_place_prediction(prediction: &PlacePrediction) -> Self {
        let primary_text = prediction
            .main_text
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .unwrap_or(prediction.description.as_str())
            .to_string();
        Self {
            description: prediction.description.clone(),
            primary_text,
            secondary_text: prediction.secondary_text.clone().unwrap_or_default(),
            source: CandidateSource::Place,
            is_postcode: false,
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn primary_text(&self) -> &str {
        &self.primary_text
    }

    pub fn secondary_text(&self) -> &str {
        &self.secondary_text
    }

    pub const fn source(&self) -> CandidateSource {
        self.source
    }

    pub const fn is_postcode(&self) -> bool {
        self.is_postcode
    }
}
