use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::doc::fetcher::TocSource;
use crate::doc::parser::TocParser;
use crate::doc::{DocCategory, DocType, TocEntry};
use crate::error::Result;
use crate::retrieval::RetrievalOutcome;
use crate::storage::SharedCache;

/// Fetches one category's TOC, flattens it and appends the entries to the
/// shared cache one at a time.
pub struct CategoryRetriever {
    doc_type: DocType,
    source: Arc<dyn TocSource>,
    cache: SharedCache,
}

impl CategoryRetriever {
    pub fn new(doc_type: DocType, source: Arc<dyn TocSource>, cache: SharedCache) -> Self {
        Self {
            doc_type,
            source,
            cache,
        }
    }

    pub fn category(&self) -> DocCategory {
        self.doc_type.category
    }

    /// Runs the retrieval to completion.
    ///
    /// Fetch and parse errors do not escape: they are logged and recorded in
    /// the cache as a single failure entry for this category.
    pub async fn run(self) -> RetrievalOutcome {
        let category = self.category();
        info!("Retrieving {} documentation index", category);

        let mut entries_added = 0;
        let failed = match self.fetch_and_append(&mut entries_added).await {
            Ok(()) => {
                info!("Retrieved {} {} entries", entries_added, category);
                false
            }
            Err(e) => {
                warn!(
                    code = e.error_code(),
                    "Failed to retrieve {} documentation after {} entries: {}",
                    category,
                    entries_added,
                    e
                );
                self.cache.append(TocEntry::failed(category, e.to_string()));
                true
            }
        };

        RetrievalOutcome {
            category,
            entries_added,
            failed,
            finished_at: Utc::now(),
        }
    }

    async fn fetch_and_append(&self, entries_added: &mut usize) -> Result<()> {
        let raw = self.source.fetch_toc(&self.doc_type.toc_source_url).await?;
        let doc = TocParser::new().parse_document(&raw)?;
        debug!("Parsed {} top-level TOC nodes", doc.toc.len());

        let cache = &self.cache;
        self.doc_type
            .strategy
            .collect(&doc, self.doc_type.category, &mut |entry| {
                cache.append(entry);
                *entries_added += 1;
            })?;
        Ok(())
    }
}
