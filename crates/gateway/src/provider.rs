use crate::Result;
use address_protocol::{PlacePredictionsResponse, PostcodeLookupResponse, SessionToken};
use async_trait::async_trait;

/// Postcode-to-address-list backend.
#[async_trait]
pub trait PostcodeProvider: Send + Sync {
    /// Fetch every address registered under `postcode` (already normalized).
    async fn addresses(&self, postcode: &str) -> Result<PostcodeLookupResponse>;
}

/// Free-text place-autocomplete backend.
#[async_trait]
pub trait PlaceProvider: Send + Sync {
    /// Fetch suggestions for `input`, scoped to `session` so the provider can
    /// group the calls of one typing session.
    async fn predictions(
        &self,
        input: &str,
        session: &SessionToken,
    ) -> Result<PlacePredictionsResponse>;
}
