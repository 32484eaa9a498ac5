use indicatif::{ProgressBar, ProgressStyle};
use sitegraph_scanner::crawler::{DEFAULT_DELAY, DEFAULT_MAX_DEPTH};
use sitegraph_scanner::fetch::DEFAULT_TIMEOUT;
use sitegraph_scanner::{
    CrawlOutcome, Crawler, HttpFetcher, IgnoreFilter, LinkGraph, ProgressCallback, ScanError,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use url::Url;

/// Options for configuring a crawl operation
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    pub url: String,
    pub max_pages: Option<usize>,
    pub max_depth: usize,
    pub delay: Duration,
    pub timeout: Duration,
    pub respect_robots: bool,
    pub ignore: IgnoreFilter,
    pub show_progress_bars: bool,
}

impl CrawlOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_pages: None,
            max_depth: DEFAULT_MAX_DEPTH,
            delay: DEFAULT_DELAY,
            timeout: DEFAULT_TIMEOUT,
            respect_robots: true,
            ignore: IgnoreFilter::default(),
            show_progress_bars: false,
        }
    }
}

/// Callback for reporting crawl progress
pub type CrawlProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Extract the path component from a URL
pub fn extract_url_path(url: &str) -> String {
    Url::parse(url)
        .ok()
        .map(|u| {
            let path = u.path().to_string();
            if path.is_empty() || path == "/" {
                "/".to_string()
            } else {
                path
            }
        })
        .unwrap_or_else(|| url.to_string())
}

/// Execute a crawl with the given options
pub async fn execute_crawl(
    options: CrawlOptions,
    progress_callback: Option<CrawlProgressCallback>,
) -> Result<CrawlOutcome, ScanError> {
    let CrawlOptions {
        url,
        max_pages,
        max_depth,
        delay,
        timeout,
        respect_robots,
        ignore,
        show_progress_bars,
    } = options;

    let start = Url::parse(&url).map_err(|e| ScanError::InvalidUrl(format!("{}: {}", url, e)))?;

    let mut fetcher = HttpFetcher::with_timeout(timeout)?;
    if respect_robots {
        if let Some(ref callback) = progress_callback {
            callback(format!("Loading robots.txt for {}", start.origin().ascii_serialization()));
        }
        fetcher = fetcher.load_robots(&start).await;
    }

    // Single spinner for overall crawl progress (only if enabled)
    let progress_bar = if show_progress_bars {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message("Starting crawl...");
        Some(Arc::new(pb))
    } else {
        None
    };

    let mut crawler = Crawler::new(&url, fetcher)?
        .with_max_pages(max_pages)
        .with_max_depth(max_depth)
        .with_delay(delay)
        .with_ignore(ignore);

    if let Some(ref pb) = progress_bar {
        let pb_clone = pb.clone();
        let internal_callback: ProgressCallback = Arc::new(move |count: usize, url: String| {
            pb_clone.set_message(format!("[{}] {}", count, extract_url_path(&url)));
            pb_clone.tick();
        });
        crawler = crawler.with_progress_callback(internal_callback);
    }

    if let Some(ref callback) = progress_callback {
        callback(format!("Crawling {}", crawler.start_url()));
    }

    let outcome = crawler.crawl().await;

    if let Some(ref pb) = progress_bar {
        pb.finish_with_message(format!(
            "Crawl complete! {} URLs processed",
            outcome.visited.len()
        ));
    }
    info!(
        "Crawled {}: {} nodes, {} links",
        url,
        outcome.graph.node_count(),
        outcome.graph.edge_count()
    );

    Ok(outcome)
}

/// Generate a crawl summary from a finished crawl
pub fn generate_crawl_report(outcome: &CrawlOutcome) -> String {
    let graph: &LinkGraph = &outcome.graph;
    let visited_pages = graph.visited_count();
    let discovered_only = graph.node_count() - visited_pages;
    let skipped = outcome.visited.len().saturating_sub(visited_pages);

    let mut report = String::new();
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
    report.push_str("# Summary:\n");
    report.push_str(&format!("  Pages crawled: {}\n", visited_pages));
    report.push_str(&format!("  Pages discovered but not crawled: {}\n", discovered_only));
    report.push_str(&format!("  URLs skipped (failed, non-HTML or ignored): {}\n", skipped));
    report.push_str(&format!("  Nodes: {}\n", graph.node_count()));
    report.push_str(&format!("  Links: {}\n", graph.edge_count()));

    report.push_str("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    let mut out_degrees: HashMap<&str, usize> = HashMap::new();
    for (source, _) in graph.edges() {
        *out_degrees.entry(source).or_default() += 1;
    }

    // Group crawled pages by depth
    let mut by_depth: BTreeMap<usize, Vec<(&str, &str, usize)>> = BTreeMap::new();
    for page in graph.pages() {
        if let Some(depth) = page.depth {
            let out_degree = out_degrees.get(page.url.as_str()).copied().unwrap_or(0);
            by_depth
                .entry(depth)
                .or_default()
                .push((page.url.as_str(), page.label.as_str(), out_degree));
        }
    }

    for (depth, pages) in by_depth.iter() {
        report.push_str(&format!("## Depth {}\n", depth));
        report.push_str(&format!("  {} pages\n\n", pages.len()));
        for (url, label, out_degree) in pages {
            let path = extract_url_path(url);
            if *label == *url {
                report.push_str(&format!("  {} ({} links)\n", path, out_degree));
            } else {
                report.push_str(&format!("  {} \"{}\" ({} links)\n", path, label, out_degree));
            }
        }
        report.push('\n');
    }

    report
}
