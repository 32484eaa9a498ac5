pub mod crawl;
pub mod export;
pub mod gexf;

pub use crawl::{
    CrawlOptions, CrawlProgressCallback, execute_crawl, extract_url_path, generate_crawl_report,
};
pub use export::{ExportFormat, export_graph, output_base};
