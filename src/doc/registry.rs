use serde::Serialize;

use crate::doc::parser::RetrievalStrategy;
use crate::doc::DocCategory;

const APEX_TOC_URL: &str =
    "https://developer.salesforce.com/docs/get_document/atlas.en-us.apexcode.meta";
const APEX_BASE_URL: &str =
    "https://developer.salesforce.com/docs/atlas.en-us.apexcode.meta/apexcode/";

const VISUALFORCE_TOC_URL: &str =
    "https://developer.salesforce.com/docs/get_document/atlas.en-us.pages.meta";
const VISUALFORCE_BASE_URL: &str =
    "https://developer.salesforce.com/docs/atlas.en-us.pages.meta/pages/";

const SERVICE_CONSOLE_TOC_URL: &str =
    "https://developer.salesforce.com/docs/get_document/atlas.en-us.api_console.meta";
const SERVICE_CONSOLE_BASE_URL: &str =
    "https://developer.salesforce.com/docs/atlas.en-us.api_console.meta/api_console/";

/// Static description of one documentation set: where its TOC lives, where
/// its pages live, and how its TOC is flattened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocType {
    pub category: DocCategory,
    pub doc_base_url: String,
    pub toc_source_url: String,
    #[serde(skip)]
    pub strategy: RetrievalStrategy,
}

impl DocType {
    pub fn builtin(category: DocCategory) -> Self {
        let (toc_source_url, doc_base_url, strategy) = match category {
            DocCategory::Apex => (
                APEX_TOC_URL,
                APEX_BASE_URL,
                RetrievalStrategy::LeafParents { anchor_id: "apex_reference" },
            ),
            DocCategory::Visualforce => (
                VISUALFORCE_TOC_URL,
                VISUALFORCE_BASE_URL,
                RetrievalStrategy::AllLeaves { anchor_id: "pages_compref" },
            ),
            DocCategory::ServiceConsole => (
                SERVICE_CONSOLE_TOC_URL,
                SERVICE_CONSOLE_BASE_URL,
                RetrievalStrategy::PrefixedRoots { prefix: "Methods for" },
            ),
        };

        Self {
            category,
            doc_base_url: doc_base_url.to_string(),
            toc_source_url: toc_source_url.to_string(),
            strategy,
        }
    }

    pub fn all() -> Vec<DocType> {
        DocCategory::ALL.iter().map(|c| Self::builtin(*c)).collect()
    }

    pub fn with_toc_source_url(mut self, url: impl Into<String>) -> Self {
        self.toc_source_url = url.into();
        self
    }

    pub fn with_doc_base_url(mut self, url: impl Into<String>) -> Self {
        self.doc_base_url = url.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_covers_every_category() {
        let all = DocType::all();
        assert_eq!(all.len(), 3);
        for (doc_type, category) in all.iter().zip(DocCategory::ALL) {
            assert_eq!(doc_type.category, category);
            assert!(doc_type.doc_base_url.ends_with('/'));
            assert!(doc_type.toc_source_url.starts_with("https://"));
        }
    }

    #[test]
    fn test_registry_strategies() {
        assert_eq!(
            DocType::builtin(DocCategory::Apex).strategy,
            RetrievalStrategy::LeafParents { anchor_id: "apex_reference" }
        );
        assert_eq!(
            DocType::builtin(DocCategory::Visualforce).strategy,
            RetrievalStrategy::AllLeaves { anchor_id: "pages_compref" }
        );
        assert_eq!(
            DocType::builtin(DocCategory::ServiceConsole).strategy,
            RetrievalStrategy::PrefixedRoots { prefix: "Methods for" }
        );
    }

    #[test]
    fn test_overrides() {
        let doc_type = DocType::builtin(DocCategory::Apex)
            .with_toc_source_url("http://localhost:8080/apex.json")
            .with_doc_base_url("http://localhost:8080/apex/");

        assert_eq!(doc_type.toc_source_url, "http://localhost:8080/apex.json");
        assert_eq!(doc_type.doc_base_url, "http://localhost:8080/apex/");
        assert_eq!(doc_type.category, DocCategory::Apex);
    }
}
