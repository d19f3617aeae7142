//! Seams to the host front end: showing a pick list, showing progress while
//! retrieval runs, and opening a resolved link.

use crate::error::Result;

/// What the user did with a pick list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Chosen(usize),
    Cancelled,
}

impl Selection {
    /// Converts a host-style index where any negative value (usually `-1`)
    /// means the list was dismissed.
    pub fn from_index(index: i64) -> Self {
        usize::try_from(index).map_or(Selection::Cancelled, Selection::Chosen)
    }
}

pub trait Presenter {
    fn select(&self, prompt: &str, items: &[String]) -> Result<Selection>;
}

pub trait ProgressReporter: Send + Sync {
    fn begin(&self, message: &str);
    fn end(&self);
}

pub trait LinkOpener {
    fn open(&self, url: &str) -> Result<()>;
}

/// Reporter for non-interactive runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn begin(&self, _message: &str) {}
    fn end(&self) {}
}

/// Opener that writes the link to stdout instead of launching anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrintLink;

impl LinkOpener for PrintLink {
    fn open(&self, url: &str) -> Result<()> {
        println!("{}", url);
        Ok(())
    }
}
