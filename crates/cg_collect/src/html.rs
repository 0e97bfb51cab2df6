use scraper::{ElementRef, Html, Selector};

const SKIPPED: &[&str] = &["script", "style", "noscript", "template", "svg", "head"];
const BLOCKS: &[&str] = &[
    "p", "div", "br", "li", "ul", "ol", "h1", "h2", "h3", "h4", "h5", "h6", "section", "article",
    "header", "footer", "blockquote", "pre", "table", "tr", "main", "nav", "aside",
];

/// Page title and readable text of an HTML document.
pub fn html_to_text(html: &str) -> (Option<String>, String) {
    let document = Html::parse_document(html);

    let title = Selector::parse("title").ok().and_then(|selector| {
        document
            .select(&selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())
    });

    let mut raw = String::new();
    collect_text(document.root_element(), &mut raw);
    (title, normalize(&raw))
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child) = ElementRef::wrap(child) {
            let name = child.value().name();
            if SKIPPED.contains(&name) {
                continue;
            }
            let block = BLOCKS.contains(&name);
            if block {
                out.push('\n');
            }
            collect_text(child, out);
            if block {
                out.push('\n');
            }
        }
    }
}

/// Collapses whitespace inside lines and drops blank lines.
fn normalize(raw: &str) -> String {
    raw.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_to_text_skips_scripts_and_keeps_blocks() {
        let html = r#"
            <html>
              <head><title> Memetics - Wikipedia </title><style>p { color: red; }</style></head>
              <body>
                <h1>Memetics</h1>
                <script>var tracking = true;</script>
                <p>Memetics is the   study of <b>memes</b>.</p>
                <ul><li>Dawkins</li><li>Blackmore</li></ul>
              </body>
            </html>
        "#;
        let (title, text) = html_to_text(html);
        assert_eq!(title.as_deref(), Some("Memetics - Wikipedia"));
        assert_eq!(text, "Memetics\nMemetics is the study of memes.\nDawkins\nBlackmore");
        assert!(!text.contains("tracking"));
        assert!(!text.contains("color"));
    }

    #[test]
    fn test_html_without_text() {
        let (title, text) = html_to_text("<html><body><script>x()</script></body></html>");
        assert!(title.is_none());
        assert!(text.is_empty());
    }
}
