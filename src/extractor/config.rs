use serde::{Deserialize, Serialize};

/// Where on a product page to look for the weight
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Unit token that must follow the numeral (default: "kg")
    pub unit: String,

    /// CSS selector of the table holding the weight in the usual layout
    pub targeted_table: String,

    /// Zero-based row inside `targeted_table`
    pub targeted_row: usize,

    /// Zero-based cell inside `targeted_row`, header cells included
    pub targeted_cell: usize,

    /// Tables scanned cell by cell when the usual layout does not hold
    pub known_tables: Vec<String>,

    /// Regions whose list items are scanned last
    pub bullet_regions: Vec<String>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            unit: "kg".to_string(),
            targeted_table: "table#product-attributes".to_string(),
            targeted_row: 2,
            targeted_cell: 1,
            known_tables: vec![
                "table#product-attributes".to_string(),
                "table.product-specs".to_string(),
                "table.tech-specs".to_string(),
            ],
            bullet_regions: vec![
                "#product-details".to_string(),
                ".product-features".to_string(),
            ],
        }
    }
}
