use scraper::{Html, Selector};
use std::collections::HashSet;

/// Pulls the pieces the crawler needs out of an HTML document.
pub trait HtmlLinkExtractor {
    /// Page title with whitespace collapsed; `None` if missing or blank.
    fn title(&self, html: &str) -> Option<String>;

    /// Raw `href` values of every `<a>` element, first occurrence order,
    /// duplicates removed.
    fn hrefs(&self, html: &str) -> Vec<String>;
}

/// `HtmlLinkExtractor` backed by the `scraper` crate.
#[derive(Debug, Clone)]
pub struct ScraperExtractor {
    title_selector: Option<Selector>,
    link_selector: Option<Selector>,
}

impl ScraperExtractor {
    pub fn new() -> Self {
        Self {
            title_selector: Selector::parse("title").ok(),
            link_selector: Selector::parse("a[href]").ok(),
        }
    }
}

impl Default for ScraperExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl HtmlLinkExtractor for ScraperExtractor {
    fn title(&self, html: &str) -> Option<String> {
        let selector = self.title_selector.as_ref()?;
        let document = Html::parse_document(html);
        let element = document.select(selector).next()?;
        let text = element.text().collect::<Vec<_>>().join(" ");
        let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.is_empty() { None } else { Some(collapsed) }
    }

    fn hrefs(&self, html: &str) -> Vec<String> {
        let Some(selector) = self.link_selector.as_ref() else {
            return Vec::new();
        };
        let document = Html::parse_document(html);
        let mut seen = HashSet::new();
        document
            .select(selector)
            .filter_map(|element| element.value().attr("href"))
            .filter(|href| seen.insert(href.to_string()))
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_whitespace_is_collapsed() {
        let html = "<html><head><title>\n  My   Blog\n\t Home </title></head></html>";
        assert_eq!(ScraperExtractor::new().title(html).as_deref(), Some("My Blog Home"));
    }

    #[test]
    fn test_missing_or_blank_title() {
        let extractor = ScraperExtractor::new();
        assert_eq!(extractor.title("<html><body>no title</body></html>"), None);
        assert_eq!(extractor.title("<title>   </title>"), None);
        assert_eq!(extractor.title(""), None);
    }

    #[test]
    fn test_hrefs_in_document_order_without_duplicates() {
        let html = r#"<body>
            <a href="/b">B</a>
            <a>no href</a>
            <a href="/a">A</a>
            <a href="/b">B again</a>
            <link href="/style.css">
        </body>"#;
        assert_eq!(ScraperExtractor::new().hrefs(html), vec!["/b", "/a"]);
    }

    #[test]
    fn test_malformed_html_is_tolerated() {
        let html = "<a href='/ok'>ok<div><a href=\"/nested\"></p>";
        assert_eq!(ScraperExtractor::new().hrefs(html), vec!["/ok", "/nested"]);
    }
}
