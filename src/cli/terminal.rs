//! Terminal stand-ins for the editor's quick panel and status-bar progress.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use inquire::{InquireError, Select};
use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::ui::{Presenter, ProgressReporter, Selection};

/// Fuzzy-filterable pick list.
pub struct InquirePresenter {
    page_size: usize,
}

impl Default for InquirePresenter {
    fn default() -> Self {
        Self { page_size: 15 }
    }
}

impl Presenter for InquirePresenter {
    fn select(&self, prompt: &str, items: &[String]) -> Result<Selection> {
        if items.is_empty() {
            println!("📋 Nothing to show.");
            return Ok(Selection::Cancelled);
        }

        match Select::new(prompt, items.to_vec())
            .with_page_size(self.page_size)
            .raw_prompt()
        {
            Ok(choice) => Ok(Selection::Chosen(choice.index)),
            Err(InquireError::OperationCanceled) | Err(InquireError::OperationInterrupted) => {
                Ok(Selection::Cancelled)
            }
            Err(e) => Err(Error::Prompt(e.to_string())),
        }
    }
}

/// Indeterminate spinner on stderr; hidden when stderr is not a terminal.
#[derive(Default)]
pub struct SpinnerProgress {
    bar: Mutex<Option<ProgressBar>>,
}

impl SpinnerProgress {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressReporter for SpinnerProgress {
    fn begin(&self, message: &str) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        if let Some(previous) = self.bar.lock().replace(pb) {
            previous.finish_and_clear();
        }
    }

    fn end(&self) {
        if let Some(pb) = self.bar.lock().take() {
            pb.finish_and_clear();
        }
    }
}
