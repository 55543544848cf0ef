use regex::Regex;

use crate::app::{Result, WeighbridgeError};

/// Matches a numeral directly followed by a unit token, e.g. `1,25 kg`.
/// The whole run of digits and separators before the unit is the numeral.
#[derive(Debug, Clone)]
pub struct UnitPattern {
    unit: String,
    regex: Regex,
}

impl UnitPattern {
    pub fn new(unit: &str) -> Result<Self> {
        let unit = unit.trim();
        if unit.is_empty() {
            return Err(WeighbridgeError::Other("unit token must not be empty".into()));
        }
        let pattern = format!(r"(?i)([0-9.,]+)\s*{}\b", regex::escape(unit));
        let regex = Regex::new(&pattern)
            .map_err(|e| WeighbridgeError::Other(format!("bad unit pattern: {}", e)))?;
        Ok(Self {
            unit: unit.to_string(),
            regex,
        })
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// First well-formed numeral tagged with the unit in `text`.
    pub fn find(&self, text: &str) -> Option<f64> {
        self.regex
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .find_map(|m| parse_numeral(m.as_str()))
    }
}

/// Parse a numeral with at most one decimal separator, comma or dot.
/// The separator must sit between digits: `.5` and `5.` are rejected.
pub fn parse_numeral(raw: &str) -> Option<f64> {
    let normalized = raw.trim().replace(',', ".");
    if normalized.matches('.').count() > 1
        || normalized.starts_with('.')
        || normalized.ends_with('.')
    {
        return None;
    }
    let value: f64 = normalized.parse().ok()?;
    (value.is_finite() && value >= 0.0).then_some(value)
}
