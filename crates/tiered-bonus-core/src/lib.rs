pub mod bonus;
pub mod currency;
pub mod error;
pub mod tiers;
pub mod types;

#[cfg(feature = "export")]
pub mod export;

pub use error::BonusError;
pub use types::*;

/// Standard result type for all bonus engine operations
pub type BonusResult<T> = Result<T, BonusError>;
