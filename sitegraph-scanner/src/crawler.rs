use crate::error::Result;
use crate::extract::{HtmlLinkExtractor, ScraperExtractor};
use crate::fetch::PageFetcher;
use crate::graph::LinkGraph;
use crate::ignore::IgnoreFilter;
use crate::normalize::UrlNormalizer;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Invoked before each fetch with the number of visited URLs and the URL.
pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;

pub const DEFAULT_MAX_DEPTH: usize = 5;
pub const DEFAULT_DELAY: Duration = Duration::from_millis(500);

/// Result of a finished crawl.
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub graph: LinkGraph,
    /// Every URL taken off the queue and marked visited, in visit order.
    /// Includes ignored URLs and URLs whose fetch failed.
    pub visited: Vec<String>,
}

/// Per-crawl state, owned by a single `crawl` call.
struct CrawlState {
    graph: LinkGraph,
    queue: VecDeque<(String, usize)>,
    visited: HashSet<String>,
    visit_order: Vec<String>,
}

impl CrawlState {
    fn new(start_url: String) -> Self {
        let mut queue = VecDeque::new();
        queue.push_back((start_url, 0));
        Self {
            graph: LinkGraph::new(),
            queue,
            visited: HashSet::new(),
            visit_order: Vec::new(),
        }
    }

    fn mark_visited(&mut self, url: &str) {
        if self.visited.insert(url.to_string()) {
            self.visit_order.push(url.to_string());
        }
    }
}

/// Breadth-first, same-domain crawler that builds a `LinkGraph`.
pub struct Crawler<F, X = ScraperExtractor> {
    fetcher: F,
    extractor: X,
    normalizer: UrlNormalizer,
    start_url: String,
    max_pages: Option<usize>,
    max_depth: usize,
    delay: Duration,
    progress_callback: Option<ProgressCallback>,
}

impl<F: PageFetcher> Crawler<F, ScraperExtractor> {
    pub fn new(start_url: &str, fetcher: F) -> Result<Self> {
        Self::with_extractor(start_url, fetcher, ScraperExtractor::new())
    }
}

impl<F, X> Crawler<F, X>
where
    F: PageFetcher,
    X: HtmlLinkExtractor,
{
    pub fn with_extractor(start_url: &str, fetcher: F, extractor: X) -> Result<Self> {
        let normalizer = UrlNormalizer::new(start_url)?;
        // The start URL is canonicalized like any link so that a later link
        // back to it resolves to the same node.
        let start_url = normalizer
            .normalize(start_url, start_url)
            .unwrap_or_else(|| start_url.to_string());

        Ok(Self {
            fetcher,
            extractor,
            normalizer,
            start_url,
            max_pages: None,
            max_depth: DEFAULT_MAX_DEPTH,
            delay: DEFAULT_DELAY,
            progress_callback: None,
        })
    }

    pub fn with_max_pages(mut self, max_pages: Option<usize>) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_ignore(mut self, ignore: IgnoreFilter) -> Self {
        self.normalizer = self.normalizer.with_ignore(ignore);
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn start_url(&self) -> &str {
        &self.start_url
    }

    pub fn normalizer(&self) -> &UrlNormalizer {
        &self.normalizer
    }

    fn under_page_cap(&self, visited: usize) -> bool {
        self.max_pages.is_none_or(|cap| visited < cap)
    }

    pub async fn crawl(&self) -> CrawlOutcome {
        info!(
            "Starting crawl of {} (max pages: {}, max depth: {})",
            self.start_url,
            self.max_pages
                .map(|p| p.to_string())
                .unwrap_or_else(|| "unlimited".to_string()),
            self.max_depth
        );

        let mut state = CrawlState::new(self.start_url.clone());

        while self.under_page_cap(state.visited.len()) {
            let Some((url, depth)) = state.queue.pop_front() else {
                break;
            };

            // Stale entries beyond the depth bound are dropped, not visited.
            if depth > self.max_depth {
                continue;
            }
            if state.visited.contains(&url) {
                continue;
            }
            if self.normalizer.ignore_filter().matches_url(&url) {
                debug!("Ignoring {}", url);
                state.mark_visited(&url);
                continue;
            }

            state.mark_visited(&url);
            if let Some(ref callback) = self.progress_callback {
                callback(state.visited.len(), url.clone());
            }
            debug!(
                "[{}] Fetching {} (depth: {})",
                state.visited.len(),
                url,
                depth
            );

            let Some(html) = self.fetcher.fetch(&url).await else {
                continue;
            };

            let title = self.extractor.title(&html);
            state.graph.visit(&url, depth, title);

            for link in self.extract_links(&html, &url) {
                state.graph.discover(&link);
                state.graph.add_edge(&url, &link);

                if !state.visited.contains(&link) && depth < self.max_depth {
                    state.queue.push_back((link, depth + 1));
                }
            }

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }

        info!(
            "Crawl complete: {} pages visited, {} nodes, {} links",
            state.visited.len(),
            state.graph.node_count(),
            state.graph.edge_count()
        );

        CrawlOutcome {
            graph: state.graph,
            visited: state.visit_order,
        }
    }

    /// Normalized same-domain links of a page, first occurrence order.
    /// Links back to the page itself are dropped.
    fn extract_links(&self, html: &str, page_url: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        self.extractor
            .hrefs(html)
            .iter()
            .filter_map(|href| self.normalizer.normalize(href, page_url))
            .filter(|link| link != page_url)
            .filter(|link| seen.insert(link.clone()))
            .collect()
    }
}
