//! Step-function tables: typed tiers, the lookup itself, and the cleaning
//! pass that turns editable rows into usable tiers.

pub mod lookup;
pub mod table;

pub use lookup::{lookup, matching_tier, CostFactorTier, RateTier, Tier, Tiered};
pub use table::{clean_rows, lookup_rows, CleanedTable, DiscardedRow, RawTierRow};
