use tiered_bonus_core::bonus::PersonInput;
use tiered_bonus_core::export::read_persons_csv;

use super::file;

/// Read a CSV roster of people (`name,line_a_revenue,line_a_cost,line_b_revenue,line_b_cost`).
pub fn read_roster(path: &str) -> Result<Vec<PersonInput>, Box<dyn std::error::Error>> {
    let contents = file::read_text(path)?;
    let persons = read_persons_csv(&contents)?;
    tracing::debug!(path, records = persons.len(), "loaded roster");
    Ok(persons)
}
