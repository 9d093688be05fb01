//! Shaping results for the outside world: the machine-readable CSV export
//! (and roster import), and a localized view for humans.

pub mod csv_export;
pub mod display;

pub use csv_export::{read_csv, read_persons_csv, write_csv, ExportRow, EXPORT_COLUMNS};
pub use display::{display_rows, DisplayOptions, DisplayRow};
