use std::collections::BTreeMap;

use super::timestamp::{parse_timestamp, DateRange};
use super::{Field, ListConfig, Record, Toggle};
use crate::error::{Result, TentlyError};

/// Independent on/off switches, one per toggle in the entity's table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleState {
    switches: BTreeMap<&'static str, bool>,
}

impl ToggleState {
    /// Every toggle at its configured default.
    pub fn defaults(table: &[Toggle]) -> Self {
        Self {
            switches: table.iter().map(|t| (t.id, t.default_on)).collect(),
        }
    }

    /// Every toggle off, which lets every record through.
    pub fn none(table: &[Toggle]) -> Self {
        Self {
            switches: table.iter().map(|t| (t.id, false)).collect(),
        }
    }

    pub fn set(&mut self, id: &str, on: bool) -> Result<()> {
        let slot = self
            .switches
            .get_mut(id)
            .ok_or_else(|| TentlyError::UnknownFilter(id.to_string()))?;
        *slot = on;
        Ok(())
    }

    /// Flip one toggle and return its new state.
    pub fn toggle(&mut self, id: &str) -> Result<bool> {
        let next = !self.is_on(id);
        self.set(id, next)?;
        Ok(next)
    }

    pub fn is_on(&self, id: &str) -> bool {
        self.switches.get(id).copied().unwrap_or(false)
    }

    pub fn any_active(&self) -> bool {
        self.switches.values().any(|on| *on)
    }
}

/// Empty query matches everything; otherwise a case-insensitive substring
/// of the display name or the id.
pub fn matches_query<R: Record>(record: &R, query: &str) -> bool {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return true;
    }
    record.display_name().to_lowercase().contains(&q) || record.key().to_lowercase().contains(&q)
}

/// OR over the active toggles. No active toggle lets the record through.
pub fn matches_toggles<R: Record>(
    record: &R,
    toggles: &ToggleState,
    table: &[Toggle],
    category: Field,
) -> bool {
    if !toggles.any_active() {
        return true;
    }
    let Some(value) = record.field(category) else {
        return false;
    };
    table
        .iter()
        .filter(|t| toggles.is_on(t.id))
        .any(|t| t.category.eq_ignore_ascii_case(value.trim()))
}

pub fn matches_date_range<R: Record>(record: &R, range: Option<&DateRange>, year: i32) -> bool {
    let Some(range) = range else {
        return true;
    };
    record
        .field(Field::Date)
        .and_then(|raw| parse_timestamp(&raw, year))
        .is_some_and(|at| range.contains(at))
}

/// Records passing the text query and the toggle table, in original order.
pub fn filter<'a, R: Record>(
    records: &'a [R],
    query: &str,
    toggles: &ToggleState,
    config: &ListConfig,
) -> Vec<&'a R> {
    records
        .iter()
        .filter(|r| matches_query(*r, query))
        .filter(|r| matches_toggles(*r, toggles, config.toggles, config.category))
        .collect()
}
