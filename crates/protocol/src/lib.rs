//! # Address Protocol
//!
//! Shared shapes for the address-resolution engine.
//!
//! ## Flow
//!
//! ```text
//! PostcodeLookupResponse ──┐
//!                          ├──> Candidate (one shape, tagged by source)
//! PlacePredictionsResponse ┘
//! ```
//!
//! Provider payloads are deserialized exactly as the upstream services return
//! them; everything downstream of the gateway only ever sees [`Candidate`].

mod candidate;
mod payload;
mod session;

pub use candidate::{Candidate, CandidateSource};
pub use payload::{
    PlacePrediction, PlacePredictionsResponse, PostcodeAddress, PostcodeLookupResponse,
};
pub use session::SessionToken;

/// Separator used when joining address lines into a display string.
pub const ADDRESS_LINE_SEPARATOR: &str = ", ";
