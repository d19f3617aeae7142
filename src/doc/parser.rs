use serde::Deserialize;

use crate::doc::{DocCategory, TocEntry};
use crate::error::{Error, Result};

/// Raw TOC document as served by the documentation host.
#[derive(Debug, Clone, Deserialize)]
pub struct TocDocument {
    pub toc: Vec<TocNode>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TocNode {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub a_attr: Option<LinkAttr>,
    #[serde(default)]
    pub children: Option<Vec<TocNode>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LinkAttr {
    #[serde(default)]
    pub href: Option<String>,
}

impl TocNode {
    pub fn is_leaf(&self) -> bool {
        self.children.as_ref().map_or(true, |c| c.is_empty())
    }

    pub fn children(&self) -> &[TocNode] {
        self.children.as_deref().unwrap_or(&[])
    }

    pub fn href(&self) -> Option<&str> {
        self.a_attr.as_ref().and_then(|a| a.href.as_deref())
    }

    /// Depth-first search for the node carrying `id`, starting with `self`.
    pub fn find_by_id(&self, id: &str) -> Option<&TocNode> {
        if self.id.as_deref() == Some(id) {
            return Some(self);
        }
        self.children().iter().find_map(|child| child.find_by_id(id))
    }

    fn to_entry(&self, category: DocCategory) -> Result<TocEntry> {
        let title = self.text.as_deref().ok_or_else(|| {
            Error::TocShape(format!("{} node {:?} has no text", category, self.id))
        })?;
        let href = self.href().ok_or_else(|| {
            Error::TocShape(format!("{} node '{}' has no a_attr.href", category, title))
        })?;
        Ok(TocEntry::new(title, href, category))
    }
}

impl TocDocument {
    pub fn find_by_id(&self, id: &str) -> Option<&TocNode> {
        self.toc.iter().find_map(|node| node.find_by_id(id))
    }
}

/// How a category's TOC tree is flattened into entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalStrategy {
    /// One entry per distinct parent of the leaves beneath the anchor node.
    /// Reference docs group method leaves under their type, and the type is
    /// what gets listed.
    LeafParents { anchor_id: &'static str },
    /// One entry per leaf beneath the anchor node.
    AllLeaves { anchor_id: &'static str },
    /// One entry per leaf beneath every top-level node whose text starts
    /// with `prefix`.
    PrefixedRoots { prefix: &'static str },
}

impl RetrievalStrategy {
    /// Walks `doc` and hands each entry to `sink` as soon as it is found.
    ///
    /// Entries already handed over stay with the sink when a later node turns
    /// out to be malformed. Returns the number of entries emitted.
    pub fn collect(
        &self,
        doc: &TocDocument,
        category: DocCategory,
        sink: &mut dyn FnMut(TocEntry),
    ) -> Result<usize> {
        let mut emitted = 0;
        let mut emit = |entry: TocEntry| {
            emitted += 1;
            sink(entry);
        };

        match *self {
            RetrievalStrategy::LeafParents { anchor_id } => {
                let anchor = find_anchor(doc, anchor_id)?;
                emit_leaf_parents(anchor, category, &mut emit)?;
            }
            RetrievalStrategy::AllLeaves { anchor_id } => {
                let anchor = find_anchor(doc, anchor_id)?;
                for child in anchor.children() {
                    emit_leaves(child, category, &mut emit)?;
                }
            }
            RetrievalStrategy::PrefixedRoots { prefix } => {
                let roots: Vec<&TocNode> = doc
                    .toc
                    .iter()
                    .filter(|node| node.text.as_deref().map_or(false, |t| t.starts_with(prefix)))
                    .collect();

                if roots.is_empty() {
                    return Err(Error::TocShape(format!(
                        "no top-level section starting with '{}'",
                        prefix
                    )));
                }

                for root in roots {
                    for child in root.children() {
                        emit_leaves(child, category, &mut emit)?;
                    }
                }
            }
        }

        Ok(emitted)
    }
}

fn find_anchor<'a>(doc: &'a TocDocument, anchor_id: &str) -> Result<&'a TocNode> {
    doc.find_by_id(anchor_id)
        .ok_or_else(|| Error::TocShape(format!("node with id '{}' not found", anchor_id)))
}

fn emit_leaves(
    node: &TocNode,
    category: DocCategory,
    emit: &mut dyn FnMut(TocEntry),
) -> Result<()> {
    if node.is_leaf() {
        emit(node.to_entry(category)?);
        return Ok(());
    }
    for child in node.children() {
        emit_leaves(child, category, emit)?;
    }
    Ok(())
}

// A parent is emitted at its first leaf child, so entries come out in the
// document order of the leaves that produced them.
fn emit_leaf_parents(
    node: &TocNode,
    category: DocCategory,
    emit: &mut dyn FnMut(TocEntry),
) -> Result<()> {
    let mut emitted_self = false;
    for child in node.children() {
        if child.is_leaf() {
            if !emitted_self {
                emit(node.to_entry(category)?);
                emitted_self = true;
            }
        } else {
            emit_leaf_parents(child, category, emit)?;
        }
    }
    Ok(())
}

pub struct TocParser;

impl Default for TocParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TocParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse_document(&self, raw: &str) -> Result<TocDocument> {
        serde_json::from_str(raw)
            .map_err(|e| Error::TocParse(format!("Failed to parse TOC: {}", e)))
    }

    /// Parses `raw` and flattens it in one go.
    pub fn parse_entries(
        &self,
        raw: &str,
        category: DocCategory,
        strategy: RetrievalStrategy,
    ) -> Result<Vec<TocEntry>> {
        let doc = self.parse_document(raw)?;
        let mut entries = Vec::new();
        strategy.collect(&doc, category, &mut |entry| entries.push(entry))?;
        Ok(entries)
    }

    pub fn validate_toc_url(&self, url: &str) -> Result<()> {
        let parsed_url = url::Url::parse(url)
            .map_err(|e| Error::InvalidUrl(format!("Invalid URL: {}", e)))?;

        match parsed_url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(Error::InvalidUrl(format!("Unsupported scheme: {}", scheme))),
        }
    }
}
