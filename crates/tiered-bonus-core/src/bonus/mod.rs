pub mod batch;
pub mod calculator;
pub mod policy;

pub use batch::{calculate_bonuses, BonusBatchInput, BonusBatchOutput, RawBonusBatchInput};
pub use calculator::{compute_person, LineResult, PersonInput, PersonResult, RawPersonInput};
pub use policy::{BonusPolicy, RoundingRule, RoundingSettings};
