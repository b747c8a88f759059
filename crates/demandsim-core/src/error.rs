use thiserror::Error;

/// Core error type shared across demandsim crates.
#[derive(Debug, Error)]
pub enum Error {
    /// The product or customer catalog violates internal invariants.
    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),
    /// A date window is empty or reversed.
    #[error("invalid window: {0}")]
    InvalidWindow(String),
    /// A demand profile carries values outside their domain.
    #[error("invalid profile: {0}")]
    InvalidProfile(String),
}

/// Convenience alias for results returned by demandsim crates.
pub type Result<T> = std::result::Result<T, Error>;
