//! # Address Resolver
//!
//! Turns partial input in a single address field (a UK postcode fragment or
//! free text) into a short list of concrete addresses.
//!
//! ## Pipeline
//!
//! ```text
//! keystroke
//!     │
//!     ├──> ResolutionController (debounce, generation counter)
//!     │      └─> PostcodeShapeClassifier
//!     │
//!     ├──> LookupGateway (postcode first, place search as fallback)
//!     │      └─> Vec<Candidate>
//!     │
//!     ├──> ViewportTracker (panel placement while visible)
//!     │
//!     └──> selection → on_change(description), session token rotated
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use address_gateway::{GatewayConfig, LookupGateway};
//! use address_resolver::{AddressResolver, ResolverConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let gateway = LookupGateway::from_config(&GatewayConfig::default())?;
//!     let resolver = AddressResolver::start(gateway, ResolverConfig::default())?;
//!
//!     resolver.keystroke("SR8 5AB").await?;
//!     let mut updates = resolver.subscribe();
//!     let snapshot = updates.wait_for(|s| !s.candidates.is_empty()).await?.clone();
//!     for candidate in &snapshot.candidates {
//!         println!("{}", candidate.description());
//!     }
//!     resolver.select(0).await?;
//!     Ok(())
//! }
//! ```

mod classifier;
mod config;
mod controller;
mod driver;
mod error;
mod registry;
mod session;
mod sync;
mod viewport;

pub use classifier::PostcodeShapeClassifier;
pub use config::{PanelGeometry, ResolverConfig};
pub use controller::{
    DismissReason, Generation, LookupKind, LookupRequest, LookupResponse, LookupStage, Phase,
    ResolutionController, ResponseOutcome,
};
pub use driver::{AddressResolver, OnChange, ResolverOptions, ResolverSnapshot};
pub use error::{ResolverError, Result};
pub use registry::{PanelId, PanelRegistration, PanelRegistry};
pub use session::SessionTokenManager;
pub use sync::SelectionSync;
pub use viewport::{
    AnchorRect, LayoutEvent, ViewportPositioner, ViewportRect, ViewportTracker, WindowSize,
};

// Re-export shared shapes for convenience
pub use address_protocol::{Candidate, CandidateSource, SessionToken};
