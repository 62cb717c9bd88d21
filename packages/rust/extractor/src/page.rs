//! Title and description extraction from fetched markup.

use std::sync::LazyLock;

use scraper::{Html, Selector};

const UNTITLED: &str = "Untitled";
const NO_DESCRIPTION: &str = "No description available";

static TITLE: LazyLock<Selector> = LazyLock::new(|| sel("title"));
static OG_TITLE: LazyLock<Selector> = LazyLock::new(|| sel(r#"meta[property="og:title"]"#));
static H1: LazyLock<Selector> = LazyLock::new(|| sel("h1"));
static META_DESCRIPTION: LazyLock<Selector> =
    LazyLock::new(|| sel(r#"meta[name="description"]"#));
static OG_DESCRIPTION: LazyLock<Selector> =
    LazyLock::new(|| sel(r#"meta[property="og:description"]"#));
static PARAGRAPH: LazyLock<Selector> = LazyLock::new(|| sel("p"));

fn sel(css: &str) -> Selector {
    Selector::parse(css).expect("static selector is valid CSS")
}

/// What a page says about itself before any model enrichment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSummary {
    pub title: String,
    pub description: String,
}

impl PageSummary {
    /// Parse `html` and pick title and description by precedence.
    ///
    /// Title: `<title>` → `og:title` → first `<h1>` → "Untitled".
    /// Description: `meta[name=description]` → `og:description` → first `<p>`
    /// → "No description available".
    pub fn from_html(html: &str) -> Self {
        let doc = Html::parse_document(html);

        let title = first_text(&doc, &TITLE)
            .or_else(|| first_content(&doc, &OG_TITLE))
            .or_else(|| first_text(&doc, &H1))
            .unwrap_or_else(|| UNTITLED.to_string());

        let description = first_content(&doc, &META_DESCRIPTION)
            .or_else(|| first_content(&doc, &OG_DESCRIPTION))
            .or_else(|| first_text(&doc, &PARAGRAPH))
            .unwrap_or_else(|| NO_DESCRIPTION.to_string());

        Self { title, description }
    }
}

/// Trimmed text of the first matching element, if non-empty.
fn first_text(doc: &Html, selector: &Selector) -> Option<String> {
    let el = doc.select(selector).next()?;
    let text = el.text().collect::<String>();
    non_empty(&text)
}

/// Trimmed `content` attribute of the first matching element, if non-empty.
fn first_content(doc: &Html, selector: &Selector) -> Option<String> {
    let el = doc.select(selector).next()?;
    non_empty(el.value().attr("content")?)
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
