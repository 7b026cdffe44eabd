use crate::http::{HttpPlaceProvider, HttpPostcodeProvider};
use crate::provider::{PlaceProvider, PostcodeProvider};
use crate::{GatewayConfig, Result};
use address_protocol::{Candidate, SessionToken};
use log::{debug, warn};
use std::sync::Arc;

/// Both lookup backends behind one candidate shape.
///
/// Lookups never fail from the caller's point of view: transport errors,
/// HTTP errors and error-flagged payloads are logged and turned into an empty
/// candidate list, so the field stays usable when a provider is down.
#[derive(Clone)]
pub struct LookupGateway {
    postcode: Arc<dyn PostcodeProvider>,
    places: Arc<dyn PlaceProvider>,
    max_candidates: usize,
}

impl LookupGateway {
    pub fn new(postcode: Arc<dyn PostcodeProvider>, places: Arc<dyn PlaceProvider>) -> Self {
        Self {
            postcode,
            places,
            max_candidates: GatewayConfig::default().max_candidates,
        }
    }

    /// Build a gateway talking to the HTTP providers named in `config`.
    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        let postcode = Arc::new(HttpPostcodeProvider::new(config)?);
        let places = Arc::new(HttpPlaceProvider::new(config)?);
        Ok(Self::new(postcode, places).with_max_candidates(config.max_candidates))
    }

    #[must_use]
    pub fn with_max_candidates(mut self, limit: usize) -> Self {
        self.max_candidates = limit.max(1);
        self
    }

    pub async fn lookup_by_postcode(&self, postcode: &str) -> Vec<Candidate> {
        match self.postcode.addresses(postcode).await {
            Ok(response) => {
                let candidates: Vec<Candidate> = response
                    .addresses
                    .iter()
                    .take(self.max_candidates)
                    .map(Candidate::from_postcode_address)
                    .filter(|candidate| !candidate.description().is_empty())
                    .collect();
                debug!(
                    "postcode lookup {postcode}: {} candidate(s)",
                    candidates.len()
                );
                candidates
            }
            Err(err) => {
                warn!("Postcode lookup for {postcode} failed: {err}");
                Vec::new()
            }
        }
    }

    pub async fn lookup_by_place_text(&self, text: &str, session: &SessionToken) -> Vec<Candidate> {
        match self.places.predictions(text, session).await {
            Ok(response) => {
                let candidates: Vec<Candidate> = response
                    .predictions
                    .iter()
                    .take(self.max_candidates)
                    .map(Candidate::from_place_prediction)
                    .collect();
                debug!("place lookup {text:?}: {} candidate(s)", candidates.len());
                candidates
            }
            Err(err) => {
                warn!("Place lookup for {text:?} failed: {err}");
                Vec::new()
            }
        }
    }
}
