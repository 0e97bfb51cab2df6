//! Source document collectors: explicit URLs, web search and local files.

pub mod file;
pub mod html;
pub mod serp;
pub mod web;

pub use file::FileCollector;
pub use html::html_to_text;
pub use serp::SerpCollector;
pub use web::{clean_urls, UrlCollector};

pub mod prelude {
    pub use super::{FileCollector, SerpCollector, UrlCollector};
    pub use cg_core::{DocumentCollector, Result, SourceDocument};
}
