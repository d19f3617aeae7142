pub mod cache;

pub use cache::{DocumentationCache, SharedCache};
