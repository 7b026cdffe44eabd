//! # Address Gateway
//!
//! Async access to the two address backends.
//!
//! ## Providers
//!
//! ```text
//! normalized postcode ──> PostcodeProvider ──> PostcodeLookupResponse ─┐
//!                                                                       ├─> Vec<Candidate>
//! free text + session ──> PlaceProvider ────> PlacePredictionsResponse ┘
//! ```
//!
//! [`LookupGateway`] owns one provider of each kind. HTTP implementations are
//! provided; tests and embedders can plug in anything implementing the traits.
//!
//! ## Example
//!
//! ```no_run
//! use address_gateway::{GatewayConfig, LookupGateway};
//! use address_protocol::SessionToken;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let gateway = LookupGateway::from_config(&GatewayConfig::default())?;
//!     let token = SessionToken::new("demo");
//!     for candidate in gateway.lookup_by_place_text("Durham Station", &token).await {
//!         println!("{}", candidate.description());
//!     }
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod gateway;
mod http;
mod provider;

pub use config::GatewayConfig;
pub use error::{ProviderError, Result};
pub use gateway::LookupGateway;
pub use http::{HttpPlaceProvider, HttpPostcodeProvider};
pub use provider::{PlaceProvider, PostcodeProvider};
