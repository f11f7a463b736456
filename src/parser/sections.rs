//! Heading-to-content association.
//!
//! A heading owns every following sibling element up to the next heading of
//! the same level. Page parsers decide what text and links to take from the
//! owned elements.

use crate::error::Result;
use crate::parser::html::{joined_text, links_within, selector, stripped_text};
use crate::types::Link;
use scraper::ElementRef;
use serde::Serialize;

/// A heading and the sibling elements that follow it
#[derive(Debug, Clone)]
pub struct HeadingSpan<'a> {
    pub heading: ElementRef<'a>,
    pub content: Vec<ElementRef<'a>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Section {
    pub heading: String,
    pub text: String,
    pub links: Vec<Link>,
}

/// Every `level` heading under `root` with its content span, in document order.
pub fn heading_spans<'a>(root: &ElementRef<'a>, level: &str) -> Result<Vec<HeadingSpan<'a>>> {
    let heading_sel = selector(level)?;
    let spans = root
        .select(&heading_sel)
        .map(|heading| {
            let content = heading
                .next_siblings()
                .filter_map(ElementRef::wrap)
                .take_while(|el| el.value().name() != level)
                .collect();
            HeadingSpan { heading, content }
        })
        .collect();
    Ok(spans)
}

/// `h2` sections as single-line paragraph text plus line-per-item lists.
pub fn compact_sections(root: &ElementRef) -> Result<Vec<Section>> {
    let sections = heading_spans(root, "h2")?
        .into_iter()
        .map(|span| {
            let parts: Vec<String> = span
                .content
                .iter()
                .filter_map(|el| match el.value().name() {
                    "p" => Some(stripped_text(el, "")),
                    "ul" => Some(stripped_text(el, "\n")),
                    _ => None,
                })
                .collect();
            Section {
                heading: stripped_text(&span.heading, ""),
                text: parts.join("\n\n"),
                links: Vec::new(),
            }
        })
        .collect();
    Ok(sections)
}

/// `h2` sections keeping line breaks inside paragraphs and list items, with
/// every link resolved against `base`.
pub fn detailed_sections(root: &ElementRef, base: &str) -> Result<Vec<Section>> {
    let li = selector("li")?;
    let mut sections = Vec::new();

    for span in heading_spans(root, "h2")? {
        let mut lines = Vec::new();
        let mut links = Vec::new();
        for el in &span.content {
            match el.value().name() {
                "p" => {
                    let text = joined_text(el, "\n");
                    if !text.is_empty() {
                        lines.push(text);
                    }
                    links.extend(links_within(el, base)?);
                }
                "ul" => {
                    for item in el.select(&li) {
                        let text = joined_text(&item, "\n");
                        if !text.is_empty() {
                            lines.push(text);
                        }
                        links.extend(links_within(&item, base)?);
                    }
                }
                _ => {}
            }
        }
        sections.push(Section {
            heading: stripped_text(&span.heading, ""),
            text: lines.join("\n\n"),
            links,
        });
    }
    Ok(sections)
}

/// Text of the direct children of `root` before its first `h2`.
pub fn leading_description(root: &ElementRef) -> String {
    let mut lines = Vec::new();
    for child in root.children() {
        let text = if let Some(el) = ElementRef::wrap(child) {
            if el.value().name() == "h2" {
                break;
            }
            stripped_text(&el, "\n")
        } else if let Some(text) = child.value().as_text() {
            text.trim().to_string()
        } else {
            continue;
        };
        if !text.is_empty() {
            lines.push(text);
        }
    }
    lines.join("\n")
}

/// Last section with this heading; later duplicates replace earlier ones.
pub fn find_section<'s>(sections: &'s [Section], heading: &str) -> Option<&'s Section> {
    sections.iter().rev().find(|s| s.heading == heading)
}

/// The `n`th distinct heading in first-seen order.
pub fn nth_heading(sections: &[Section], n: usize) -> Option<&str> {
    let mut seen: Vec<&str> = Vec::new();
    for s in sections {
        if !seen.contains(&s.heading.as_str()) {
            seen.push(&s.heading);
        }
    }
    seen.get(n).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    const PAGE: &str = r#"
        <div class="body">
          <p>Intro line.</p>
          <h2>Definition</h2>
          <p>Generative AI <a href="/genai">creates</a> content.</p>
          <ul><li>Text</li><li>Images <a href="https://example.org/img">ref</a></li></ul>
          <h3>Not a boundary</h3>
          <p>Still definition.</p>
          <h2>Purpose</h2>
          <p>To help.</p>
        </div>"#;

    fn body(doc: &Html) -> ElementRef<'_> {
        doc.select(&selector("div.body").unwrap()).next().unwrap()
    }

    #[test]
    fn test_heading_spans_stop_at_same_level() {
        let doc = Html::parse_fragment(PAGE);
        let spans = heading_spans(&body(&doc), "h2").unwrap();

        assert_eq!(spans.len(), 2);
        let names: Vec<&str> = spans[0].content.iter().map(|e| e.value().name()).collect();
        assert_eq!(names, vec!["p", "ul", "h3", "p"]);
        assert_eq!(spans[1].content.len(), 1);
    }

    #[test]
    fn test_compact_sections() {
        let doc = Html::parse_fragment(PAGE);
        let sections = compact_sections(&body(&doc)).unwrap();

        assert_eq!(sections[0].heading, "Definition");
        assert_eq!(
            sections[0].text,
            "Generative AIcreatescontent.\n\nText\nImages\nref\n\nStill definition."
        );
        assert_eq!(find_section(&sections, "Purpose").unwrap().text, "To help.");
        assert!(find_section(&sections, "Objective").is_none());
    }

    #[test]
    fn test_detailed_sections_collect_links() {
        let doc = Html::parse_fragment(PAGE);
        let sections = detailed_sections(&body(&doc), "https://architecture.digital.gov.au").unwrap();

        let def = &sections[0];
        assert_eq!(def.links.len(), 2);
        assert_eq!(def.links[0].url, "https://architecture.digital.gov.au/genai");
        assert_eq!(def.links[1].url, "https://example.org/img");
        assert!(def.text.starts_with("Generative AI \ncreates\n content."));
        assert!(def.text.contains("\n\nText\n\n"));
    }

    #[test]
    fn test_leading_description_and_nth_heading() {
        let doc = Html::parse_fragment(PAGE);
        assert_eq!(leading_description(&body(&doc)), "Intro line.");

        let sections = compact_sections(&body(&doc)).unwrap();
        assert_eq!(nth_heading(&sections, 1), Some("Purpose"));
        assert_eq!(nth_heading(&sections, 2), None);
    }
}
