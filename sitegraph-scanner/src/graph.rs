use indexmap::{IndexMap, IndexSet};

/// A page in the link graph.
///
/// A page is *discovered* when some link points at it and *visited* once the
/// crawler has fetched it. Only visited pages carry a depth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub url: String,
    pub label: String,
    pub depth: Option<usize>,
    pub title: Option<String>,
}

impl Page {
    pub fn discovered(url: String) -> Self {
        Self {
            label: url.clone(),
            url,
            depth: None,
            title: None,
        }
    }

    pub fn visited(url: String, depth: usize, title: Option<String>) -> Self {
        let label = title.clone().unwrap_or_else(|| url.clone());
        Self {
            url,
            label,
            depth: Some(depth),
            title,
        }
    }

    pub fn is_visited(&self) -> bool {
        self.depth.is_some()
    }

    /// Depth as exported; discovered-only pages report 0.
    pub fn export_depth(&self) -> usize {
        self.depth.unwrap_or(0)
    }
}

/// Directed graph of pages keyed by canonical URL.
///
/// Pages and edges keep insertion order so every export of the same crawl is
/// byte-for-byte stable.
#[derive(Debug, Clone, Default)]
pub struct LinkGraph {
    pages: IndexMap<String, Page>,
    edges: IndexSet<(String, String)>,
}

impl LinkGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a page known only through a link. Returns false if the URL is
    /// already present in either state.
    pub fn discover(&mut self, url: &str) -> bool {
        if self.pages.contains_key(url) {
            return false;
        }
        self.pages
            .insert(url.to_string(), Page::discovered(url.to_string()));
        true
    }

    /// Create or upgrade a page to the visited state. The first recorded
    /// depth wins.
    pub fn visit(&mut self, url: &str, depth: usize, title: Option<String>) {
        match self.pages.get_mut(url) {
            Some(page) if page.is_visited() => {}
            Some(page) => {
                *page = Page::visited(url.to_string(), depth, title);
            }
            None => {
                self.pages
                    .insert(url.to_string(), Page::visited(url.to_string(), depth, title));
            }
        }
    }

    /// Add a directed edge. Returns false when the pair already exists.
    pub fn add_edge(&mut self, source: &str, target: &str) -> bool {
        self.edges.insert((source.to_string(), target.to_string()))
    }

    pub fn page(&self, url: &str) -> Option<&Page> {
        self.pages.get(url)
    }

    pub fn contains(&self, url: &str) -> bool {
        self.pages.contains_key(url)
    }

    pub fn has_edge(&self, source: &str, target: &str) -> bool {
        self.edges.contains(&(source.to_string(), target.to_string()))
    }

    pub fn pages(&self) -> impl Iterator<Item = &Page> {
        self.pages.values()
    }

    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.edges.iter().map(|(s, t)| (s.as_str(), t.as_str()))
    }

    /// Targets of every edge leaving `source`, in insertion order.
    pub fn outgoing<'a>(&'a self, source: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.edges
            .iter()
            .filter(move |(s, _)| s == source)
            .map(|(_, t)| t.as_str())
    }

    pub fn node_count(&self) -> usize {
        self.pages.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn visited_count(&self) -> usize {
        self.pages.values().filter(|p| p.is_visited()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}
