// Graph exporters: combined CSV, split nodes/edges CSV and graph-viewer JSON.
// GEXF lives in `gexf.rs`.

use crate::gexf::write_gexf;
use serde::Serialize;
use sitegraph_scanner::LinkGraph;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const EDGE_TYPE: &str = "Directed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    /// One CSV with `Node` and `Edge` rows.
    Csv,
    /// `_nodes.csv` + `_edges.csv` keyed by URL.
    SplitCsv,
    /// Cytoscape-style `elements` document.
    Json,
    Gexf,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 4] = [
        ExportFormat::Csv,
        ExportFormat::SplitCsv,
        ExportFormat::Json,
        ExportFormat::Gexf,
    ];

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Some(ExportFormat::Csv),
            "split" | "split-csv" | "split_csv" => Some(ExportFormat::SplitCsv),
            "json" | "cytoscape" => Some(ExportFormat::Json),
            "gexf" => Some(ExportFormat::Gexf),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::SplitCsv => "split",
            ExportFormat::Json => "json",
            ExportFormat::Gexf => "gexf",
        }
    }

    /// Parse a comma separated list; `all` selects every format. Duplicates
    /// are removed, order is kept.
    pub fn parse_list(s: &str) -> Result<Vec<Self>, String> {
        let mut formats = Vec::new();
        for item in s.split(',').map(str::trim).filter(|i| !i.is_empty()) {
            let parsed: Vec<Self> = if item.eq_ignore_ascii_case("all") {
                Self::ALL.to_vec()
            } else {
                vec![Self::from_str(item).ok_or_else(|| format!("Unknown output format '{}'", item))?]
            };
            for format in parsed {
                if !formats.contains(&format) {
                    formats.push(format);
                }
            }
        }
        if formats.is_empty() {
            return Err("No output format given".to_string());
        }
        Ok(formats)
    }

    /// Files this format writes for the given base path.
    pub fn output_paths(&self, base: &Path) -> Vec<PathBuf> {
        match self {
            ExportFormat::Csv => vec![with_suffix(base, ".csv")],
            ExportFormat::SplitCsv => vec![
                with_suffix(base, "_nodes.csv"),
                with_suffix(base, "_edges.csv"),
            ],
            ExportFormat::Json => vec![with_suffix(base, ".json")],
            ExportFormat::Gexf => vec![with_suffix(base, ".gexf")],
        }
    }
}

/// Strip the extension of the configured output file; every format appends
/// its own suffix to the result.
pub fn output_base(path: &Path) -> PathBuf {
    path.with_extension("")
}

fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut name = base.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

/// Write one file per requested format next to `output`. Returns the paths
/// written, in order.
pub fn export_graph(
    graph: &LinkGraph,
    output: &Path,
    formats: &[ExportFormat],
) -> io::Result<Vec<PathBuf>> {
    let base = output_base(output);
    if let Some(parent) = base.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut written = Vec::new();
    for format in formats {
        let paths = format.output_paths(&base);
        match format {
            ExportFormat::Csv => write_to(&paths[0], |w| write_combined_csv(graph, w))?,
            ExportFormat::SplitCsv => {
                write_to(&paths[0], |w| write_nodes_csv(graph, w))?;
                write_to(&paths[1], |w| write_edges_csv(graph, w))?;
            }
            ExportFormat::Json => write_to(&paths[0], |w| write_json(graph, w))?,
            ExportFormat::Gexf => write_to(&paths[0], |w| write_gexf(graph, w))?,
        }
        for path in &paths {
            debug!("Saved {}", path.display());
        }
        written.extend(paths);
    }
    Ok(written)
}

fn write_to<F>(path: &Path, write: F) -> io::Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
{
    let mut file = BufWriter::new(File::create(path)?);
    write(&mut file)?;
    file.flush()
}

/// Single CSV of `Node` and `Edge` rows. Each node row is followed by its
/// outgoing edges; nodes are identified by label.
pub fn write_combined_csv<W: Write>(graph: &LinkGraph, writer: W) -> io::Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record([
        "Type", "Id", "Label", "URL", "Depth", "Source", "Target", "EdgeType",
    ])?;

    let mut edges_by_source: HashMap<&str, Vec<&str>> = HashMap::new();
    for (source, target) in graph.edges() {
        edges_by_source.entry(source).or_default().push(target);
    }

    for page in graph.pages() {
        let depth = page.export_depth().to_string();
        csv.write_record([
            "Node",
            page.label.as_str(),
            page.label.as_str(),
            page.url.as_str(),
            depth.as_str(),
            "",
            "",
            "",
        ])?;

        for &target in edges_by_source.get(page.url.as_str()).into_iter().flatten() {
            let target_label = graph.page(target).map(|p| p.label.as_str()).unwrap_or(target);
            csv.write_record([
                "Edge",
                target_label,
                target_label,
                "",
                "",
                page.url.as_str(),
                target,
                EDGE_TYPE,
            ])?;
        }
    }

    csv.flush()
}

/// Node list keyed by URL.
pub fn write_nodes_csv<W: Write>(graph: &LinkGraph, writer: W) -> io::Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["Id", "Label", "URL", "Depth", "Title"])?;
    for page in graph.pages() {
        let depth = page.export_depth().to_string();
        csv.write_record([
            page.url.as_str(),
            page.label.as_str(),
            page.url.as_str(),
            depth.as_str(),
            page.title.as_deref().unwrap_or(""),
        ])?;
    }
    csv.flush()
}

/// Edge list referencing nodes by URL.
pub fn write_edges_csv<W: Write>(graph: &LinkGraph, writer: W) -> io::Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["Source", "Target", "Type"])?;
    for (source, target) in graph.edges() {
        csv.write_record([source, target, EDGE_TYPE])?;
    }
    csv.flush()
}

#[derive(Debug, Serialize)]
pub struct GraphDocument<'a> {
    pub elements: Elements<'a>,
}

#[derive(Debug, Serialize)]
pub struct Elements<'a> {
    pub nodes: Vec<Element<NodeData<'a>>>,
    pub edges: Vec<Element<EdgeData<'a>>>,
}

#[derive(Debug, Serialize)]
pub struct Element<T> {
    pub data: T,
}

#[derive(Debug, Serialize)]
pub struct NodeData<'a> {
    pub id: &'a str,
    pub label: &'a str,
    pub url: &'a str,
    pub depth: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct EdgeData<'a> {
    pub id: String,
    pub source: &'a str,
    pub target: &'a str,
}

/// Borrowing JSON view of the graph.
pub fn graph_document(graph: &LinkGraph) -> GraphDocument<'_> {
    let nodes = graph
        .pages()
        .map(|page| Element {
            data: NodeData {
                id: &page.url,
                label: &page.label,
                url: &page.url,
                depth: page.export_depth(),
                title: page.title.as_deref(),
            },
        })
        .collect();

    let edges = graph
        .edges()
        .enumerate()
        .map(|(i, (source, target))| Element {
            data: EdgeData {
                id: format!("e{}", i),
                source,
                target,
            },
        })
        .collect();

    GraphDocument {
        elements: Elements { nodes, edges },
    }
}

pub fn write_json<W: Write>(graph: &LinkGraph, writer: W) -> io::Result<()> {
    serde_json::to_writer_pretty(writer, &graph_document(graph))?;
    Ok(())
}
