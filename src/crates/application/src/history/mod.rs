pub mod aggregator;
pub mod fetcher;
pub mod source;

pub use aggregator::HistoryAggregator;
pub use fetcher::{FetchedPage, PageFetch, PageFetcher};
pub use source::{HistoryPage, HistorySource, UpstreamError};
