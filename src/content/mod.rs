//! Page acquisition: fetching raw HTML and reducing it to markdown.

pub mod extractor;
pub mod fetcher;

pub use extractor::ContentExtractor;
pub use fetcher::{read_html_file, FetchError, PageFetcher};
