pub mod crawler;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod graph;
pub mod ignore;
pub mod normalize;
pub mod robots;

pub use crawler::{CrawlOutcome, Crawler, ProgressCallback};
pub use error::ScanError;
pub use extract::{HtmlLinkExtractor, ScraperExtractor};
pub use fetch::{HttpFetcher, PageFetcher};
pub use graph::{LinkGraph, Page};
pub use ignore::IgnoreFilter;
pub use normalize::UrlNormalizer;
pub use robots::{RobotsGate, RobotsPolicy};
