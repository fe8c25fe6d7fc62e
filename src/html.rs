//! Thin document layer over `scraper` plus text helpers.

use scraper::{ElementRef, Html, Selector};

/// A parsed HTML document or email body.
pub struct HtmlDocument {
    doc: Html,
}

/// One element of an [`HtmlDocument`].
#[derive(Clone, Copy)]
pub struct Element<'a> {
    node: ElementRef<'a>,
}

impl HtmlDocument {
    /// Parses full documents and loose fragments alike; malformed markup is repaired, never rejected.
    pub fn parse(html: &str) -> Self {
        Self {
            doc: Html::parse_document(html),
        }
    }

    /// All elements with the given tag name, in document order.
    pub fn find_elements(&self, tag: &str) -> Vec<Element<'_>> {
        select(self.doc.root_element(), tag)
    }
}

impl<'a> Element<'a> {
    /// Attribute value with entities already decoded.
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.node.value().attr(name)
    }

    /// Descendant elements with the given tag name.
    pub fn find_elements(&self, tag: &str) -> Vec<Element<'a>> {
        select(self.node, tag)
    }

    /// Visible text with whitespace collapsed.
    pub fn text(&self) -> String {
        compact_whitespace(&self.node.text().collect::<Vec<_>>().join(" "))
    }

    pub fn outer_html(&self) -> String {
        self.node.html()
    }
}

fn select<'a>(scope: ElementRef<'a>, tag: &str) -> Vec<Element<'a>> {
    let Ok(selector) = Selector::parse(tag) else {
        return Vec::new();
    };
    scope.select(&selector).map(|node| Element { node }).collect()
}

/// Plain text of an HTML body: script/style dropped, tags stripped, entities
/// decoded, whitespace collapsed.
pub fn extract_text(html: &str) -> String {
    let doc = Html::parse_document(html);
    let mut pieces = Vec::new();
    for node in doc.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|parent| {
            parent
                .value()
                .as_element()
                .is_some_and(|el| matches!(el.name(), "script" | "style"))
        });
        if !hidden {
            pieces.push(&**text);
        }
    }
    compact_whitespace(&pieces.join(" "))
}

/// Decodes the handful of entities that show up in raw mail bodies.
pub fn decode_entities(input: &str) -> String {
    input
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

pub fn compact_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}
