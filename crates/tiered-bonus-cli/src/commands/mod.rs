pub mod bonus;
pub mod lookup;
pub mod policy;
