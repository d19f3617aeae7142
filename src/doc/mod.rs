pub mod fetcher;
pub mod parser;
pub mod registry;

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

pub use registry::DocType;

/// Title shown in place of real entries when a category could not be retrieved.
pub const RETRIEVAL_ERROR_TITLE: &str =
    "Error retrieving doc. See logs for details, and report the error";

/// One independent documentation set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DocCategory {
    #[serde(rename = "APEX")]
    Apex,
    #[serde(rename = "VISUALFORCE")]
    Visualforce,
    #[serde(rename = "SERVICECONSOLE")]
    ServiceConsole,
}

impl DocCategory {
    pub const ALL: [DocCategory; 3] = [
        DocCategory::Apex,
        DocCategory::Visualforce,
        DocCategory::ServiceConsole,
    ];

    /// Tag carried by every entry of this category.
    pub fn name(self) -> &'static str {
        match self {
            DocCategory::Apex => "APEX",
            DocCategory::Visualforce => "VISUALFORCE",
            DocCategory::ServiceConsole => "SERVICECONSOLE",
        }
    }

    /// Key used for the category's table in the configuration file.
    pub fn config_key(self) -> &'static str {
        match self {
            DocCategory::Apex => "apex",
            DocCategory::Visualforce => "visualforce",
            DocCategory::ServiceConsole => "service_console",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            DocCategory::Apex => "Apex",
            DocCategory::Visualforce => "Visualforce",
            DocCategory::ServiceConsole => "Service Console",
        }
    }
}

impl fmt::Display for DocCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DocCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "apex" => Ok(DocCategory::Apex),
            "visualforce" | "vf" => Ok(DocCategory::Visualforce),
            "serviceconsole" | "console" => Ok(DocCategory::ServiceConsole),
            _ => Err(Error::UnknownCategory(s.to_string())),
        }
    }
}

/// Whether an entry points at a real page or stands in for a failed retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EntryKind {
    #[default]
    Page,
    RetrievalFailed { reason: String },
}

/// A flattened documentation item.
///
/// Equality and ordering only look at the lowercased title and category tag,
/// so two entries with the same title in the same category compare equal
/// even when their URLs differ.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TocEntry {
    pub title: String,
    /// Relative path, appended to the category's base URL.
    pub url: String,
    pub category: DocCategory,
    #[serde(default)]
    pub kind: EntryKind,
}

impl TocEntry {
    pub fn new(title: impl Into<String>, url: impl Into<String>, category: DocCategory) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            category,
            kind: EntryKind::Page,
        }
    }

    /// Stand-in entry recorded when retrieving `category` failed.
    pub fn failed(category: DocCategory, reason: impl Into<String>) -> Self {
        Self {
            title: RETRIEVAL_ERROR_TITLE.to_string(),
            url: String::new(),
            category,
            kind: EntryKind::RetrievalFailed {
                reason: reason.into(),
            },
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.kind, EntryKind::RetrievalFailed { .. })
    }

    pub fn absolute_url(&self, doc_base_url: &str) -> String {
        format!("{}{}", doc_base_url, self.url)
    }
}

fn cmp_ignore_case(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

impl Ord for TocEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        cmp_ignore_case(&self.title, &other.title)
            .then_with(|| cmp_ignore_case(self.category.name(), other.category.name()))
    }
}

impl PartialOrd for TocEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for TocEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for TocEntry {}

impl fmt::Display for TocEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] {}", self.title, self.category, self.url)
    }
}
