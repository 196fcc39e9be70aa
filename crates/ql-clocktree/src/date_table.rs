//! Date table parsing (spec §6 "External Interfaces").
//!
//! `name,date` CSV, `date` a decimal year. Lines that fail to parse are
//! silently skipped, matching spec.md's stated contract rather than
//! erroring — the teacher's own small hand-rolled parsers
//! (`ql_core::utilities::data_parsers::parse_period_string` et al.) take
//! the same "return `Option`/skip on failure" shape rather than pulling
//! in a CSV crate for a two-column format.

use std::collections::HashMap;

/// Maps leaf/tip names to their sampling date (decimal year).
#[derive(Debug, Clone, Default)]
pub struct DateTable {
    dates: HashMap<String, f64>,
}

impl DateTable {
    /// Parse a `name,date` CSV body. A header row (first field not
    /// parseable as a date) is tolerated and skipped; blank lines are
    /// ignored; any line with the wrong column count or an unparseable
    /// date is silently dropped, per spec.md §6.
    pub fn parse(csv: &str) -> Self {
        let mut dates = HashMap::new();
        for line in csv.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split(',').collect();
            if fields.len() < 2 {
                continue;
            }
            let (name, date_str) = (fields[0], fields[1]);
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            if let Ok(date) = date_str.trim().parse::<f64>() {
                dates.insert(name.to_string(), date);
            }
        }
        Self { dates }
    }

    /// The sampling date for `name`, if the table has one.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.dates.get(name).copied()
    }

    /// Number of entries successfully parsed.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// `true` if no entries were parsed.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}
