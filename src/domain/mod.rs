pub mod weight;

pub use weight::{BatchResult, ExtractedValue, StoredWeight, StrategyKind};
