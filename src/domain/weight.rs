use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which link of the extraction chain produced a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    TargetedLocation,
    KnownTable,
    BulletList,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::TargetedLocation => "targeted_location",
            StrategyKind::KnownTable => "known_table",
            StrategyKind::BulletList => "bullet_list",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "targeted_location" => Ok(StrategyKind::TargetedLocation),
            "known_table" => Ok(StrategyKind::KnownTable),
            "bullet_list" => Ok(StrategyKind::BulletList),
            other => Err(format!("unknown strategy: {}", other)),
        }
    }
}

/// A weight pulled out of a product page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtractedValue {
    /// Non-negative, finite
    pub value: f64,
    pub strategy: StrategyKind,
}

impl ExtractedValue {
    pub fn new(value: f64, strategy: StrategyKind) -> Self {
        Self { value, strategy }
    }
}

/// One entry per input identifier, in input order.
pub type BatchResult = Vec<Option<ExtractedValue>>;

/// A resolved weight as kept by the persistent store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredWeight {
    pub identifier: String,
    pub value: Option<ExtractedValue>,
    pub fetched_at: DateTime<Utc>,
}

impl StoredWeight {
    pub fn new(identifier: impl Into<String>, value: Option<ExtractedValue>) -> Self {
        Self {
            identifier: identifier.into(),
            value,
            fetched_at: Utc::now(),
        }
    }

    pub fn display_value(&self) -> String {
        match self.value {
            Some(v) => format!("{}", v.value),
            None => "-".to_string(),
        }
    }
}
