use scraper::{ElementRef, Html, Selector};

use crate::app::{Result, WeighbridgeError};
use crate::domain::StrategyKind;
use crate::extractor::numeral::UnitPattern;

/// One link of the extraction chain.
pub trait ExtractionStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Try to find a weight in `document`. `None` hands over to the next strategy.
    fn attempt(&self, document: &Html, unit: &UnitPattern) -> Option<f64>;
}

pub(crate) fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| WeighbridgeError::Selector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

/// Text of an element with whitespace collapsed. Text nodes are joined as-is
/// so a numeral split by inline markup (`<b>1</b>,5 kg`) stays whole.
fn cell_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Reads one known cell of one known table.
pub struct TargetedLocation {
    table: Selector,
    rows: Selector,
    cells: Selector,
    row: usize,
    cell: usize,
}

impl TargetedLocation {
    pub fn new(table: &str, row: usize, cell: usize) -> Result<Self> {
        Ok(Self {
            table: parse_selector(table)?,
            rows: parse_selector("tr")?,
            cells: parse_selector("th, td")?,
            row,
            cell,
        })
    }
}

impl ExtractionStrategy for TargetedLocation {
    fn kind(&self) -> StrategyKind {
        StrategyKind::TargetedLocation
    }

    fn attempt(&self, document: &Html, unit: &UnitPattern) -> Option<f64> {
        let table = document.select(&self.table).next()?;
        let row = table.select(&self.rows).nth(self.row)?;
        let cell = row.select(&self.cells).nth(self.cell)?;
        unit.find(&cell_text(cell))
    }
}

/// Scans every cell of every table matching one of several selectors.
pub struct KnownTable {
    tables: Vec<Selector>,
    cells: Selector,
}

impl KnownTable {
    pub fn new<S: AsRef<str>>(tables: &[S]) -> Result<Self> {
        let tables = tables
            .iter()
            .map(|s| parse_selector(s.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            tables,
            cells: parse_selector("tr th, tr td")?,
        })
    }
}

impl ExtractionStrategy for KnownTable {
    fn kind(&self) -> StrategyKind {
        StrategyKind::KnownTable
    }

    fn attempt(&self, document: &Html, unit: &UnitPattern) -> Option<f64> {
        self.tables
            .iter()
            .flat_map(|selector| document.select(selector))
            .flat_map(|table| table.select(&self.cells))
            .find_map(|cell| unit.find(&cell_text(cell)))
    }
}

/// Scans list items under fallback content regions.
pub struct BulletList {
    regions: Vec<Selector>,
    items: Selector,
}

impl BulletList {
    pub fn new<S: AsRef<str>>(regions: &[S]) -> Result<Self> {
        let regions = regions
            .iter()
            .map(|s| parse_selector(s.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            regions,
            items: parse_selector("li")?,
        })
    }
}

impl ExtractionStrategy for BulletList {
    fn kind(&self) -> StrategyKind {
        StrategyKind::BulletList
    }

    fn attempt(&self, document: &Html, unit: &UnitPattern) -> Option<f64> {
        self.regions
            .iter()
            .flat_map(|selector| document.select(selector))
            .flat_map(|region| region.select(&self.items))
            .find_map(|item| unit.find(&cell_text(item)))
    }
}
