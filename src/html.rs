//! HTML parser collaborator (spec §6), thin wrapper over the
//! teacher's `scraper`/`Html`/`Selector` usage in `extract_links`.

use std::sync::OnceLock;

use scraper::{ElementRef, Html, Selector};

fn anchor_selector() -> &'static Selector {
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| Selector::parse("a").expect("valid selector"))
}

fn strip_selector() -> &'static Selector {
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| Selector::parse("script, style, meta, link").expect("valid selector"))
}

/// Parses `bytes` as HTML, strips `script`/`style`/`meta`/`link`
/// subtrees, and returns the remaining visible text plus every
/// `<a href>` value found anywhere in the document (hrefs inside
/// stripped subtrees don't occur in practice, but we collect before
/// stripping so a malformed document never silently loses links).
pub fn strip_and_extract(bytes: &[u8]) -> (String, Vec<String>) {
    let content = String::from_utf8_lossy(bytes);
    let document = Html::parse_document(&content);

    let hrefs: Vec<String> = document
        .select(anchor_selector())
        .filter_map(|el| el.value().attr("href").map(|h| h.to_string()))
        .collect();

    let stripped: std::collections::HashSet<_> =
        document.select(strip_selector()).map(|el| el.id()).collect();

    let text = visible_text(&document, &stripped);
    (text, hrefs)
}

fn visible_text(document: &Html, stripped_ids: &std::collections::HashSet<ego_tree::NodeId>) -> String {
    let root = document.root_element();
    let mut out = String::new();
    collect_text(root, stripped_ids, &mut out);
    out
}

fn collect_text(
    el: ElementRef,
    stripped_ids: &std::collections::HashSet<ego_tree::NodeId>,
    out: &mut String,
) {
    if stripped_ids.contains(&el.id()) {
        return;
    }
    for child in el.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
            out.push(' ');
        } else if let Some(child_el) = ElementRef::wrap(child) {
            collect_text(child_el, stripped_ids, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_hrefs_and_strips_script_text() {
        let html = br#"
            <html><body>
              <script>var x = "should not appear";</script>
              <p>Visible text here</p>
              <a href="/a">A</a>
              <a href="https://example.com/b">B</a>
            </body></html>
        "#;
        let (text, hrefs) = strip_and_extract(html);
        assert!(text.contains("Visible text here"));
        assert!(!text.contains("should not appear"));
        assert_eq!(hrefs, vec!["/a".to_string(), "https://example.com/b".to_string()]);
    }

    #[test]
    fn strips_style_and_meta() {
        let html = br#"
            <html><head><meta charset="utf-8"><style>.a{color:red}</style></head>
            <body><p>content</p></body></html>
        "#;
        let (text, _) = strip_and_extract(html);
        assert!(!text.contains("color"));
        assert!(text.contains("content"));
    }
}
