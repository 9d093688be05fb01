pub mod file;
pub mod roster;
pub mod stdin;
