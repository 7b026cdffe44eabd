use thiserror::Error;

pub type Result<T> = std::result::Result<T, ResolverError>;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ResolverError {
    #[error("Resolver loop has shut down")]
    Closed,

    #[error("No candidate at index {index} (showing {len})")]
    NoSuchCandidate { index: usize, len: usize },

    #[error("No candidate is highlighted")]
    NothingHighlighted,

    #[error("Invalid resolver configuration: {0}")]
    InvalidConfig(String),
}
