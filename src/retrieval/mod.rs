pub mod coordinator;
pub mod retriever;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::doc::DocCategory;

pub use coordinator::{RetrievalCoordinator, RetrievalScope};
pub use retriever::CategoryRetriever;

/// Summary of one category's retrieval run.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievalOutcome {
    pub category: DocCategory,
    pub entries_added: usize,
    /// Set when the run ended in a contained error. Entries added before the
    /// error stay in the cache next to the failure entry.
    pub failed: bool,
    pub finished_at: DateTime<Utc>,
}
