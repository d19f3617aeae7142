pub mod browser;
pub mod cli;
pub mod config;
pub mod doc;
pub mod error;
pub mod retrieval;
pub mod storage;
pub mod ui;

pub use config::Config;
pub use doc::{DocCategory, DocType, TocEntry};
pub use error::{Error, Result};
pub use retrieval::{RetrievalCoordinator, RetrievalScope};
pub use storage::SharedCache;
