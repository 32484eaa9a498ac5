// GEXF 1.3 writer for the link graph.
//
// Node ids are URLs; `url`, `depth` and (when present) `title` are node
// attributes, matching what graph tools such as Gephi expect.

use chrono::Utc;
use html_escape::encode_double_quoted_attribute;
use sitegraph_scanner::LinkGraph;
use std::io::{self, Write};

const GEXF_NAMESPACE: &str = "http://gexf.net/1.3";

const ATTR_URL: &str = "0";
const ATTR_DEPTH: &str = "1";
const ATTR_TITLE: &str = "2";

/// Escape an attribute value, dropping characters XML 1.0 does not allow
/// (control characters other than tab, newline and carriage return, and the
/// noncharacters U+FFFE and U+FFFF).
fn attr(value: &str) -> String {
    let cleaned: String = value.chars().filter(|&c| is_xml_char(c)).collect();
    encode_double_quoted_attribute(&cleaned).into_owned()
}

fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\r'
            | '\u{20}'..='\u{D7FF}'
            | '\u{E000}'..='\u{FFFD}'
            | '\u{10000}'..='\u{10FFFF}'
    )
}

pub fn write_gexf<W: Write>(graph: &LinkGraph, mut w: W) -> io::Result<()> {
    writeln!(w, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(w, r#"<gexf xmlns="{}" version="1.3">"#, GEXF_NAMESPACE)?;
    writeln!(
        w,
        r#"  <meta lastmodifieddate="{}">"#,
        Utc::now().format("%Y-%m-%d")
    )?;
    writeln!(w, "    <creator>sitegraph {}</creator>", env!("CARGO_PKG_VERSION"))?;
    writeln!(w, "  </meta>")?;
    writeln!(w, r#"  <graph defaultedgetype="directed" mode="static">"#)?;

    writeln!(w, r#"    <attributes class="node" mode="static">"#)?;
    writeln!(w, r#"      <attribute id="{}" title="url" type="string"/>"#, ATTR_URL)?;
    writeln!(w, r#"      <attribute id="{}" title="depth" type="integer"/>"#, ATTR_DEPTH)?;
    writeln!(w, r#"      <attribute id="{}" title="title" type="string"/>"#, ATTR_TITLE)?;
    writeln!(w, "    </attributes>")?;

    writeln!(w, "    <nodes>")?;
    for page in graph.pages() {
        writeln!(
            w,
            r#"      <node id="{}" label="{}">"#,
            attr(&page.url),
            attr(&page.label)
        )?;
        writeln!(w, "        <attvalues>")?;
        writeln!(
            w,
            r#"          <attvalue for="{}" value="{}"/>"#,
            ATTR_URL,
            attr(&page.url)
        )?;
        writeln!(
            w,
            r#"          <attvalue for="{}" value="{}"/>"#,
            ATTR_DEPTH,
            page.export_depth()
        )?;
        if let Some(title) = &page.title {
            writeln!(
                w,
                r#"          <attvalue for="{}" value="{}"/>"#,
                ATTR_TITLE,
                attr(title)
            )?;
        }
        writeln!(w, "        </attvalues>")?;
        writeln!(w, "      </node>")?;
    }
    writeln!(w, "    </nodes>")?;

    writeln!(w, "    <edges>")?;
    for (i, (source, target)) in graph.edges().enumerate() {
        writeln!(
            w,
            r#"      <edge id="{}" source="{}" target="{}"/>"#,
            i,
            attr(source),
            attr(target)
        )?;
    }
    writeln!(w, "    </edges>")?;
    writeln!(w, "  </graph>")?;
    writeln!(w, "</gexf>")?;
    w.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(graph: &LinkGraph) -> String {
        let mut out = Vec::new();
        write_gexf(graph, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_escapes_urls_and_labels() {
        let mut graph = LinkGraph::new();
        graph.visit("https://x.test/?a=1&b=2", 0, Some("Fish & \"Chips\"".to_string()));

        let xml = render(&graph);
        assert!(xml.contains(r#"<node id="https://x.test/?a=1&amp;b=2" label="Fish &amp; &quot;Chips&quot;">"#));
        assert!(!xml.contains("a=1&b=2"));
    }

    #[test]
    fn test_strips_characters_illegal_in_xml() {
        let mut graph = LinkGraph::new();
        graph.visit(
            "https://x.test/",
            0,
            Some("Bad\u{0B}Ti\u{1F}tle\u{FFFE}".to_string()),
        );

        let xml = render(&graph);
        assert!(xml.contains(r#"<node id="https://x.test/" label="BadTitle">"#));
        assert!(xml.contains(r#"<attvalue for="2" value="BadTitle"/>"#));
        assert!(!xml.contains('\u{0B}'));
        assert!(!xml.contains('\u{1F}'));
        assert!(!xml.contains('\u{FFFE}'));
    }

    #[test]
    fn test_discovered_node_defaults() {
        let mut graph = LinkGraph::new();
        graph.discover("https://x.test/later");

        let xml = render(&graph);
        assert!(xml.contains(r#"<attvalue for="1" value="0"/>"#));
        assert!(!xml.contains(r#"for="2""#));
    }

    #[test]
    fn test_directed_edges() {
        let mut graph = LinkGraph::new();
        graph.visit("https://x.test/", 0, None);
        graph.discover("https://x.test/a");
        graph.add_edge("https://x.test/", "https://x.test/a");

        let xml = render(&graph);
        assert!(xml.contains(r#"defaultedgetype="directed""#));
        assert!(xml.contains(r#"<edge id="0" source="https://x.test/" target="https://x.test/a"/>"#));
        assert!(xml.trim_end().ends_with("</gexf>"));
    }
}
