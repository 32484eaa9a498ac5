use anyhow::Context;
use clap::ArgMatches;
use colored::Colorize;
use sitegraph_core::crawl::{CrawlOptions, CrawlProgressCallback, execute_crawl};
use sitegraph_core::export::{ExportFormat, export_graph};
use sitegraph_scanner::crawler::{DEFAULT_DELAY, DEFAULT_MAX_DEPTH};
use sitegraph_scanner::fetch::DEFAULT_TIMEOUT;
use sitegraph_scanner::{CrawlOutcome, IgnoreFilter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;
use url::Url;

pub const DEFAULT_OUTPUT: &str = "graph.csv";

// Re-export crawl types and functions from sitegraph-core
pub use sitegraph_core::crawl::{extract_url_path, generate_crawl_report};

/// Fully resolved settings for one `crawl` invocation.
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    pub url: String,
    pub output: PathBuf,
    pub max_pages: Option<usize>,
    pub max_depth: usize,
    pub respect_robots: bool,
    pub delay: Duration,
    pub timeout: Duration,
    pub ignore: IgnoreFilter,
    pub formats: Vec<ExportFormat>,
    pub debug: bool,
}

impl CrawlSettings {
    pub fn crawl_options(&self, show_progress_bars: bool) -> CrawlOptions {
        CrawlOptions {
            url: self.url.clone(),
            max_pages: self.max_pages,
            max_depth: self.max_depth,
            delay: self.delay,
            timeout: self.timeout,
            respect_robots: self.respect_robots,
            ignore: self.ignore.clone(),
            show_progress_bars,
        }
    }
}

// Helper functions for crawl handler

/// Resolve crawl settings from parsed arguments, falling back to environment
/// variables looked up through `env`. Arguments win over the environment.
pub fn resolve_settings<E>(args: &ArgMatches, env: E) -> Result<CrawlSettings, String>
where
    E: Fn(&str) -> Option<String>,
{
    // Empty variables count as unset
    let lookup = |name: &str| {
        env(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let url = args
        .get_one::<String>("url")
        .cloned()
        .or_else(|| lookup("WEBSITE_URL"))
        .ok_or_else(|| {
            "WEBSITE_URL is required: provide it via --url or the WEBSITE_URL environment variable"
                .to_string()
        })?;
    let url = validate_start_url(&url)?;

    let output = match args.get_one::<PathBuf>("output") {
        Some(path) => expand_path(&path.to_string_lossy()),
        None => expand_path(&lookup("OUTPUT_FILE").unwrap_or_else(|| DEFAULT_OUTPUT.to_string())),
    };

    let max_pages = match args.get_one::<usize>("max-pages") {
        Some(n) => Some(*n),
        None => lookup("MAX_PAGES")
            .map(|v| parse_count("MAX_PAGES", &v))
            .transpose()?,
    }
    .filter(|n| *n > 0);

    let max_depth = match args.get_one::<usize>("max-depth") {
        Some(n) => *n,
        None => lookup("MAX_DEPTH")
            .map(|v| parse_count("MAX_DEPTH", &v))
            .transpose()?
            .unwrap_or(DEFAULT_MAX_DEPTH),
    };

    let respect_robots = if args.get_flag("respect-robots") {
        true
    } else if args.get_flag("no-respect-robots") {
        false
    } else {
        lookup("RESPECT_ROBOTS")
            .map(|v| parse_bool("RESPECT_ROBOTS", &v))
            .transpose()?
            .unwrap_or(true)
    };

    let delay = match args.get_one::<f64>("delay") {
        Some(secs) => seconds("--delay", *secs, true)?,
        None => match lookup("CRAWL_DELAY") {
            Some(v) => seconds("CRAWL_DELAY", parse_float("CRAWL_DELAY", &v)?, true)?,
            None => DEFAULT_DELAY,
        },
    };

    let timeout = match args.get_one::<f64>("timeout") {
        Some(secs) => seconds("--timeout", *secs, false)?,
        None => match lookup("CRAWL_TIMEOUT") {
            Some(v) => seconds("CRAWL_TIMEOUT", parse_float("CRAWL_TIMEOUT", &v)?, false)?,
            None => DEFAULT_TIMEOUT,
        },
    };

    let ignore_file = args
        .get_one::<PathBuf>("ignore-file")
        .map(|p| expand_path(&p.to_string_lossy()))
        .or_else(|| lookup("IGNORE_PATHS_FILE").map(|p| expand_path(&p)));
    let ignore_patterns: Vec<String> = match args.get_many::<String>("ignore") {
        Some(values) => values.cloned().collect(),
        None => lookup("IGNORE_PATHS")
            .map(|v| v.lines().map(str::to_string).collect())
            .unwrap_or_default(),
    };
    let ignore = load_ignore_filter(ignore_file.as_deref(), &ignore_patterns)?;

    let formats = match args.get_many::<String>("format") {
        Some(values) => ExportFormat::parse_list(&values.cloned().collect::<Vec<_>>().join(","))?,
        None => match lookup("OUTPUT_FORMATS") {
            Some(v) => ExportFormat::parse_list(&v)?,
            None => vec![ExportFormat::Csv],
        },
    };

    let debug = if args.get_flag("debug") {
        true
    } else {
        lookup("DEBUG")
            .map(|v| parse_bool("DEBUG", &v))
            .transpose()?
            .unwrap_or(false)
    };

    Ok(CrawlSettings {
        url,
        output,
        max_pages,
        max_depth,
        respect_robots,
        delay,
        timeout,
        ignore,
        formats,
        debug,
    })
}

/// The start URL needs an http(s) scheme and a host.
pub fn validate_start_url(raw: &str) -> Result<String, String> {
    let raw = raw.trim();
    let url = Url::parse(raw).map_err(|e| format!("Invalid URL '{}': {}", raw, e))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("Invalid URL '{}': scheme must be http or https", raw));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(format!("Invalid URL '{}': missing host", raw));
    }
    Ok(raw.to_string())
}

/// Merge patterns from an optional ignore file with explicitly given ones.
pub fn load_ignore_filter(file: Option<&Path>, patterns: &[String]) -> Result<IgnoreFilter, String> {
    let mut filter = match file {
        Some(path) => IgnoreFilter::from_file(path)
            .map_err(|e| format!("Failed to read ignore file {}: {}", path.display(), e))?,
        None => IgnoreFilter::default(),
    };
    filter.extend(IgnoreFilter::new(patterns));
    Ok(filter)
}

pub fn parse_bool(name: &str, value: &str) -> Result<bool, String> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(format!("{} must be true or false, got '{}'", name, other)),
    }
}

fn parse_count(name: &str, value: &str) -> Result<usize, String> {
    value
        .trim()
        .parse::<usize>()
        .map_err(|_| format!("{} must be a non-negative integer, got '{}'", name, value))
}

fn parse_float(name: &str, value: &str) -> Result<f64, String> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("{} must be a number of seconds, got '{}'", name, value))
}

fn seconds(name: &str, secs: f64, allow_zero: bool) -> Result<Duration, String> {
    let valid = secs.is_finite() && (secs > 0.0 || (allow_zero && secs == 0.0));
    if !valid {
        return Err(format!("{} must be a positive number of seconds, got {}", name, secs));
    }
    Duration::try_from_secs_f64(secs)
        .map_err(|e| format!("{} is out of range ({} seconds): {}", name, secs, e))
}

fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

/// Install the fmt subscriber: debug level with `--debug`, warnings otherwise.
pub fn init_logging(debug: bool) {
    let level = if debug { Level::DEBUG } else { Level::WARN };
    // A subscriber may already be installed (tests); keep it.
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Crawl and export. Returns the crawl outcome and the files written.
pub async fn run_crawl(
    settings: &CrawlSettings,
    quiet: bool,
) -> anyhow::Result<(CrawlOutcome, Vec<PathBuf>)> {
    let progress_callback: Option<CrawlProgressCallback> = if quiet {
        None
    } else {
        Some(Arc::new(|msg: String| {
            println!("{} {}", "→".blue(), msg);
        }))
    };

    let outcome = execute_crawl(settings.crawl_options(!quiet), progress_callback)
        .await
        .with_context(|| format!("Crawl of {} failed", settings.url))?;

    let written = export_graph(&outcome.graph, &settings.output, &settings.formats)
        .with_context(|| format!("Failed to write graph to {}", settings.output.display()))?;

    Ok((outcome, written))
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

fn print_settings(settings: &CrawlSettings) {
    let host = Url::parse(&settings.url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| settings.url.clone());
    let formats: Vec<&str> = settings.formats.iter().map(ExportFormat::name).collect();

    print_divider();
    println!("{} {}", "  SITEGRAPH CRAWL".bright_white().bold(), host.bright_white());
    print_divider();
    println!("{} Start URL: {}", "→".blue(), settings.url);
    println!(
        "{} Max pages: {}",
        "→".blue(),
        settings
            .max_pages
            .map(|n| n.to_string())
            .unwrap_or_else(|| "unlimited".to_string())
    );
    println!("{} Max depth: {}", "→".blue(), settings.max_depth);
    println!("{} Respect robots.txt: {}", "→".blue(), settings.respect_robots);
    println!("{} Delay: {:.2}s", "→".blue(), settings.delay.as_secs_f64());
    if !settings.ignore.is_empty() {
        println!("{} Ignore patterns: {}", "→".blue(), settings.ignore.len());
    }
    println!("{} Formats: {}", "→".blue(), formats.join(", "));
    println!();
}

pub async fn handle_crawl(sub_matches: &ArgMatches, quiet: bool) {
    let settings = match resolve_settings(sub_matches, |name| std::env::var(name).ok()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{} {}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    };

    init_logging(settings.debug);

    if !quiet {
        print_settings(&settings);
    }

    match run_crawl(&settings, quiet).await {
        Ok((outcome, written)) => {
            if !quiet {
                println!("\n{} Crawl complete!\n", "✓".green().bold());
                print!("{}", generate_crawl_report(&outcome));
            }
            for path in &written {
                println!(
                    "{} Saved {}",
                    "✓".green().bold(),
                    path.display().to_string().bright_white()
                );
            }
            println!("   Nodes: {}", outcome.graph.node_count());
            println!("   Edges: {}", outcome.graph.edge_count());
        }
        Err(e) => {
            eprintln!("{} {:#}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    }
}
