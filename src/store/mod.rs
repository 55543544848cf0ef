pub mod sqlite;

use crate::app::Result;
use crate::domain::StoredWeight;

pub use sqlite::SqliteStore;

pub trait Store {
    fn get_weight(&self, identifier: &str) -> Result<Option<StoredWeight>>;
    fn get_all_weights(&self) -> Result<Vec<StoredWeight>>;

    /// Insert unless the identifier is already stored. Returns whether a row was written.
    fn add_weight(&self, weight: &StoredWeight) -> Result<bool>;
    fn add_weights(&self, weights: &[StoredWeight]) -> Result<usize>;

    fn delete_weight(&self, identifier: &str) -> Result<bool>;
    fn delete_all_weights(&self) -> Result<usize>;
}
