pub mod boilerplate;
pub mod crawl;
pub mod errors;
pub mod extract;
pub mod fetcher;
pub mod language;

pub use crawl::crawl_links;
pub use errors::FetchError;
pub use extract::{HomepageInfo, extract_homepage, extract_text};
pub use fetcher::{Fetcher, Page};
pub use language::detect_language;
