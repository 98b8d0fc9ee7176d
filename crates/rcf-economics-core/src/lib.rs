pub mod error;
pub mod types;

#[cfg(feature = "rcf")]
pub mod rcf;

pub use error::RcfError;
pub use types::*;

/// Standard result type for all rcf-economics operations
pub type RcfResult<T> = Result<T, RcfError>;
