use crate::error::Result;
use glob::Pattern;
use std::fs;
use std::path::Path;
use tracing::warn;

/// One ignore rule, compiled once.
#[derive(Debug, Clone)]
enum IgnoreRule {
    /// `/drafts*` excludes `/drafts` and everything below it.
    Prefix(String),
    /// Literal path or shell wildcard (`/tags/*/page`, `/*.xml`).
    Path { literal: String, glob: Option<Pattern> },
}

/// Path-based exclusion list for the crawl.
#[derive(Debug, Clone, Default)]
pub struct IgnoreFilter {
    rules: Vec<IgnoreRule>,
}

impl IgnoreFilter {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rules = patterns
            .into_iter()
            .filter_map(|p| Self::compile(p.as_ref()))
            .collect();
        Self { rules }
    }

    /// Parse newline separated patterns. Blank lines and `#` comments are skipped.
    pub fn parse(text: &str) -> Self {
        Self::new(text.lines())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    /// Merge the rules of another filter into this one.
    pub fn extend(&mut self, other: IgnoreFilter) {
        self.rules.extend(other.rules);
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    fn compile(raw: &str) -> Option<IgnoreRule> {
        let raw = raw.trim();
        if raw.is_empty() || raw.starts_with('#') {
            return None;
        }
        let rooted = if raw.starts_with('/') {
            raw.to_string()
        } else {
            format!("/{}", raw)
        };

        if let Some(prefix) = rooted.strip_suffix('*') {
            return Some(IgnoreRule::Prefix(prefix.to_string()));
        }

        let literal = normalize_path(&rooted).to_string();
        let glob = match Pattern::new(&literal) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                warn!("Ignore pattern '{}' is not a valid wildcard ({}), matching literally", raw, e);
                None
            }
        };
        Some(IgnoreRule::Path { literal, glob })
    }

    /// True when `path` (a URL path, e.g. `/blog/post/`) is excluded.
    pub fn matches_path(&self, path: &str) -> bool {
        let path = if path.is_empty() { "/" } else { path };
        let normalized = normalize_path(path);

        self.rules.iter().any(|rule| match rule {
            IgnoreRule::Prefix(prefix) => path.starts_with(prefix.as_str()),
            IgnoreRule::Path { literal, glob } => {
                normalized == literal
                    || glob.as_ref().is_some_and(|g| g.matches(normalized))
            }
        })
    }

    /// True when the path component of `url` is excluded. Unparseable URLs
    /// never match; they are rejected elsewhere.
    pub fn matches_url(&self, url: &str) -> bool {
        if self.rules.is_empty() {
            return false;
        }
        url::Url::parse(url)
            .map(|u| self.matches_path(u.path()))
            .unwrap_or(false)
    }
}

/// Strip trailing slashes, keeping the root.
fn normalize_path(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() { "/" } else { trimmed }
}
