//! Weight extraction from product page HTML.
//!
//! Strategies run in a fixed order and the first hit wins:
//!
//! ```text
//! TargetedLocation → KnownTable → BulletList → not found
//! ```
//!
//! The targeted lookup is cheap and reliable while the expected layout
//! holds; the later ones are broader and slower.

mod config;
mod numeral;
mod strategies;

pub use config::ExtractConfig;
pub use numeral::{parse_numeral, UnitPattern};
pub use strategies::{BulletList, ExtractionStrategy, KnownTable, TargetedLocation};

use scraper::Html;
use tracing::debug;

use crate::app::Result;
use crate::domain::ExtractedValue;

pub struct Extractor {
    unit: UnitPattern,
    strategies: Vec<Box<dyn ExtractionStrategy>>,
}

impl Extractor {
    /// Build the standard three-step chain from configuration.
    pub fn new(config: &ExtractConfig) -> Result<Self> {
        let strategies: Vec<Box<dyn ExtractionStrategy>> = vec![
            Box::new(TargetedLocation::new(
                &config.targeted_table,
                config.targeted_row,
                config.targeted_cell,
            )?),
            Box::new(KnownTable::new(&config.known_tables)?),
            Box::new(BulletList::new(&config.bullet_regions)?),
        ];
        Ok(Self::with_strategies(UnitPattern::new(&config.unit)?, strategies))
    }

    pub fn with_strategies(unit: UnitPattern, strategies: Vec<Box<dyn ExtractionStrategy>>) -> Self {
        Self { unit, strategies }
    }

    pub fn unit(&self) -> &str {
        self.unit.unit()
    }

    /// Run the chain over `html`. A page with no matching numeral yields `None`.
    pub fn extract(&self, html: &str) -> Option<ExtractedValue> {
        let document = Html::parse_document(html);

        for strategy in &self.strategies {
            if let Some(value) = strategy.attempt(&document, &self.unit) {
                debug!("Strategy {} matched {} {}", strategy.kind(), value, self.unit());
                return Some(ExtractedValue::new(value, strategy.kind()));
            }
        }

        None
    }
}
