//! HTML sanitizing: drop everything that is never main content.
//!
//! The cleaned tree is wrapped in [`CleanDocument`], which exposes the small
//! set of DOM operations the rest of the pipeline needs: selector lookups,
//! text/HTML serialization, node removal and sibling insertion.

use ego_tree::NodeId;
use pagesift_core::Error;
use scraper::{ElementRef, Html, Node};

use super::selector;

/// Elements removed from every document before content is located.
const NOISE_SELECTORS: &[&str] = &[
    "script",
    "style",
    "iframe",
    "noscript",
    "svg",
    "form",
    "button",
    "input",
    "nav",
    "footer",
    "aside",
    ".navbar",
    ".nav",
    ".navigation",
    ".menu",
    ".footer",
    ".site-footer",
    ".sidebar",
    "#sidebar",
    ".widget",
    ".ad",
    ".ads",
    ".advert",
    ".advertisement",
    ".sponsored",
    ".comments",
    "#comments",
    ".comment",
    ".comment-list",
    ".social",
    ".share",
    ".sharing",
    ".social-share",
    ".social-sharing",
    "[hidden]",
    "[style*=\"display:none\"]",
    "[style*=\"display: none\"]",
    ".hidden",
    ".visually-hidden",
];

/// A parsed HTML document with non-content nodes removed.
pub struct CleanDocument {
    html: Html,
}

impl CleanDocument {
    /// A valid document with an empty body.
    pub fn empty() -> Self {
        Self { html: Html::parse_document("") }
    }

    /// All elements matching `css`, in document order (querySelectorAll).
    pub fn select(&self, css: &str) -> Result<Vec<ElementRef<'_>>, Error> {
        let sel = selector(css)?;
        Ok(self.html.select(&sel).collect())
    }

    /// First element matching `css`, if any.
    pub fn first(&self, css: &str) -> Result<Option<ElementRef<'_>>, Error> {
        let sel = selector(css)?;
        Ok(self.html.select(&sel).next())
    }

    /// The `<body>` element. html5ever always synthesizes one for documents.
    pub fn body(&self) -> Option<ElementRef<'_>> {
        self.first("body").ok().flatten()
    }

    /// Element by id, if it is still an element in the tree.
    pub fn get(&self, id: NodeId) -> Option<ElementRef<'_>> {
        self.html.tree.get(id).and_then(ElementRef::wrap)
    }

    /// Concatenated text of an element and its descendants.
    pub fn text_of(element: ElementRef<'_>) -> String {
        element.text().collect()
    }

    /// Inner HTML of an element.
    pub fn html_of(element: ElementRef<'_>) -> String {
        element.inner_html()
    }

    /// Detach a node (and its subtree) from the document.
    pub fn remove(&mut self, id: NodeId) {
        if let Some(mut node) = self.html.tree.get_mut(id) {
            node.detach();
        }
    }

    /// Insert `node` as the next sibling of `id`, returning the new node's id.
    pub fn insert_after(&mut self, id: NodeId, node: Node) -> Option<NodeId> {
        let mut target = self.html.tree.get_mut(id)?;
        Some(target.insert_after(node).id())
    }

    /// Append `node` as the last child of `id`, returning the new node's id.
    pub fn append(&mut self, id: NodeId, node: Node) -> Option<NodeId> {
        let mut target = self.html.tree.get_mut(id)?;
        Some(target.append(node).id())
    }

    /// Number of comment nodes still attached to the document.
    pub fn comment_count(&self) -> usize {
        self.html
            .tree
            .root()
            .descendants()
            .filter(|n| n.value().is_comment())
            .count()
    }

    /// Serialize the whole document.
    pub fn html(&self) -> String {
        self.html.html()
    }

    fn strip_comments(&mut self) {
        let ids: Vec<NodeId> = self
            .html
            .tree
            .root()
            .descendants()
            .filter(|n| n.value().is_comment())
            .map(|n| n.id())
            .collect();

        for id in ids {
            self.remove(id);
        }
    }
}

/// Parse and clean `html`.
///
/// Removes scripts, styles, embeds, form controls, navigation, footers,
/// sidebars, ads, comment sections, social widgets, hidden elements and all
/// HTML comments.
pub fn try_sanitize(html: &str) -> Result<CleanDocument, Error> {
    let mut doc = CleanDocument { html: Html::parse_document(html) };

    let mut noise = Vec::new();
    for css in NOISE_SELECTORS {
        noise.extend(doc.select(css)?.into_iter().map(|el| el.id()));
    }

    for id in noise {
        doc.remove(id);
    }

    // after element removal so detached subtrees are not walked again
    doc.strip_comments();

    Ok(doc)
}

/// Like [`try_sanitize`], but degrades to an empty document instead of failing.
pub fn sanitize(html: &str) -> CleanDocument {
    try_sanitize(html).unwrap_or_else(|e| {
        tracing::debug!("sanitize failed, using empty document: {e}");
        CleanDocument::empty()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOISY_HTML: &str = r#"
        <html>
        <head>
            <style>body { color: red; }</style>
            <script>var tracking = true;</script>
        </head>
        <body>
            <!-- top banner -->
            <nav class="navbar"><a href="/">Home</a></nav>
            <div class="sidebar">Related posts</div>
            <main>
                <h1>Article</h1>
                <p>Visible paragraph.</p>
                <p style="display:none">Secret paragraph.</p>
                <p hidden>Also hidden.</p>
                <span class="visually-hidden">Screen reader text</span>
                <form><input type="text"><button>Go</button></form>
                <script>console.log("inline");</script>
                <!-- inline comment -->
                <svg><circle r="4"></circle></svg>
                <iframe src="https://ads.example.com"></iframe>
                <noscript>Enable JS</noscript>
            </main>
            <div class="social-share">Share this</div>
            <div class="ad">Buy now</div>
            <section id="comments">Comment thread</section>
            <footer>Copyright</footer>
        </body>
        </html>
    "#;

    #[test]
    fn test_sanitize_removes_scripts_styles_and_comments() {
        let doc = sanitize(NOISY_HTML);
        assert!(doc.select("script").unwrap().is_empty());
        assert!(doc.select("style").unwrap().is_empty());
        assert_eq!(doc.comment_count(), 0);

        let html = doc.html();
        assert!(!html.contains("<script"));
        assert!(!html.contains("<style"));
        assert!(!html.contains("<!--"));
    }

    #[test]
    fn test_sanitize_removes_layout_noise() {
        let doc = sanitize(NOISY_HTML);
        let text = CleanDocument::text_of(doc.body().unwrap());

        for gone in [
            "Home",
            "Related posts",
            "Share this",
            "Buy now",
            "Comment thread",
            "Copyright",
            "Enable JS",
            "Go",
        ] {
            assert!(!text.contains(gone), "{gone} should have been removed");
        }
        assert!(doc.select("form, input, button, svg, iframe").unwrap().is_empty());
    }

    #[test]
    fn test_sanitize_removes_hidden_elements() {
        let doc = sanitize(NOISY_HTML);
        let text = CleanDocument::text_of(doc.body().unwrap());
        assert!(!text.contains("Secret paragraph"));
        assert!(!text.contains("Also hidden"));
        assert!(!text.contains("Screen reader text"));
    }

    #[test]
    fn test_sanitize_keeps_content() {
        let doc = sanitize(NOISY_HTML);
        let main = doc.first("main").unwrap().unwrap();
        let text = CleanDocument::text_of(main);
        assert!(text.contains("Article"));
        assert!(text.contains("Visible paragraph."));
    }

    #[test]
    fn test_sanitize_empty_input() {
        let doc = sanitize("");
        let body = doc.body().expect("empty documents still have a body");
        assert_eq!(CleanDocument::text_of(body), "");
    }

    #[test]
    fn test_sanitize_malformed_input() {
        let doc = sanitize("<div><p>unclosed <b>bold <script>x()</div>");
        assert!(doc.select("script").unwrap().is_empty());
        assert!(CleanDocument::text_of(doc.body().unwrap()).contains("unclosed"));
    }

    #[test]
    fn test_select_invalid_selector_is_error() {
        let doc = sanitize("<p>hi</p>");
        assert!(matches!(doc.select("p[["), Err(Error::ExtractFailed(_))));
    }

    #[test]
    fn test_remove_and_insert_after() {
        let mut doc = sanitize("<div><p id=\"a\">A</p><p id=\"b\">B</p></div>");
        let a = doc.first("#a").unwrap().unwrap().id();
        let b = doc.first("#b").unwrap().unwrap().id();

        doc.remove(b);
        let inserted = doc.insert_after(a, Node::Text(scraper::node::Text { text: "!".into() }));
        assert!(inserted.is_some());

        let div = doc.first("div").unwrap().unwrap();
        assert_eq!(CleanDocument::html_of(div), "<p id=\"a\">A</p>!");
    }
}
