//! Parsers for architecture-site pages.

use crate::error::Result;
use crate::parser::html::{
    has_class, joined_text, links_within, next_element_sibling, selector, stripped_text,
};
use crate::parser::sections::{compact_sections, detailed_sections, leading_description, Section};
use crate::types::Link;
use scraper::Html;
use serde::Serialize;
use std::collections::HashMap;

const BODY_SELECTOR: &str = "div.field--name-body.text-formatted";
const NODE_CONTENT_SELECTOR: &str = "div.node__content";

pub type Metadata = HashMap<String, String>;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DomainPage {
    pub metadata: Metadata,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CapabilityPage {
    pub metadata: Metadata,
    pub sections: Vec<Section>,
}

/// A standard or design page
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DocumentPage {
    pub metadata: Metadata,
    pub description: String,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PolicyPage {
    pub metadata: Metadata,
    pub description: String,
    pub sections: Vec<Section>,
    pub requirements: PolicyRequirements,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PolicyRequirements {
    pub title: String,
    pub body: String,
    pub children: Vec<PolicyChild>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PolicyChild {
    pub heading: String,
    pub content: String,
    pub links: Vec<Link>,
}

/// Labels of the `div.metadata-card` mapped to the text that follows each.
///
/// `Reference` is read from a `div.codification-data` sibling, falling back
/// to a `<p>`; every other label expects a `<p>`. Anything else yields "".
pub fn parse_metadata_card(doc: &Html) -> Result<Metadata> {
    let card_sel = selector("div.metadata-card")?;
    let title_sel = selector("p.title")?;
    let mut metadata = Metadata::new();

    let Some(card) = doc.select(&card_sel).next() else {
        return Ok(metadata);
    };

    for title in card.select(&title_sel) {
        let label = stripped_text(&title, "");
        let value = match next_element_sibling(&title) {
            Some(sib) if label == "Reference" && sib.value().name() == "div" => {
                if has_class(&sib, "codification-data") {
                    stripped_text(&sib, "")
                } else {
                    String::new()
                }
            }
            Some(sib) if sib.value().name() == "p" => stripped_text(&sib, ""),
            _ => String::new(),
        };
        metadata.insert(label, value);
    }
    Ok(metadata)
}

pub fn parse_domain_page(html: &str) -> Result<DomainPage> {
    let doc = Html::parse_document(html);
    let body_sel = selector(BODY_SELECTOR)?;
    let description = doc
        .select(&body_sel)
        .next()
        .map(|body| stripped_text(&body, "\n"))
        .unwrap_or_default();

    Ok(DomainPage {
        metadata: parse_metadata_card(&doc)?,
        description,
    })
}

/// Capability pages take every `h2` in the document as a section heading.
pub fn parse_capability_page(html: &str) -> Result<CapabilityPage> {
    let doc = Html::parse_document(html);
    Ok(CapabilityPage {
        metadata: parse_metadata_card(&doc)?,
        sections: compact_sections(&doc.root_element())?,
    })
}

pub fn parse_document_page(html: &str, base: &str) -> Result<DocumentPage> {
    let doc = Html::parse_document(html);
    let (description, sections) = body_content(&doc, base)?;
    Ok(DocumentPage {
        metadata: parse_metadata_card(&doc)?,
        description,
        sections,
    })
}

pub fn parse_policy_page(html: &str, base: &str) -> Result<PolicyPage> {
    let doc = Html::parse_document(html);
    let (description, sections) = body_content(&doc, base)?;

    let title_sel = selector("div.field--name-field-policy-requirements-title")?;
    let body_sel = selector("div.field--name-field-requirements-body")?;
    let title = doc
        .select(&title_sel)
        .next()
        .map(|el| stripped_text(&el, ""))
        .unwrap_or_default();
    let body = doc
        .select(&body_sel)
        .next()
        .map(|el| stripped_text(&el, "\n"))
        .unwrap_or_default();

    Ok(PolicyPage {
        metadata: parse_metadata_card(&doc)?,
        description,
        sections,
        requirements: PolicyRequirements {
            title,
            body,
            children: policy_children(&doc, base)?,
        },
    })
}

/// Description and sections of the main body, or of `div.node__content`
/// when the body container is absent.
fn body_content(doc: &Html, base: &str) -> Result<(String, Vec<Section>)> {
    let body_sel = selector(BODY_SELECTOR)?;
    let node_sel = selector(NODE_CONTENT_SELECTOR)?;
    let body = doc
        .select(&body_sel)
        .next()
        .or_else(|| doc.select(&node_sel).next());

    match body {
        Some(body) => Ok((leading_description(&body), detailed_sections(&body, base)?)),
        None => Ok((String::new(), Vec::new())),
    }
}

fn policy_children(doc: &Html, base: &str) -> Result<Vec<PolicyChild>> {
    let container_sel = selector("div.field--name-field-children-of-policies")?;
    let item_sel = selector("div.field__item")?;
    let heading_sel = selector("h2, h3, strong, p")?;
    let p_sel = selector("p")?;

    let Some(container) = doc.select(&container_sel).next() else {
        return Ok(Vec::new());
    };

    let mut children = Vec::new();
    for item in container.select(&item_sel) {
        let heading = item
            .select(&heading_sel)
            .next()
            .map(|el| stripped_text(&el, ""))
            .unwrap_or_default();

        let mut paragraphs = Vec::new();
        let mut links = Vec::new();
        for p in item.select(&p_sel) {
            let text = joined_text(&p, "\n");
            if !text.is_empty() {
                paragraphs.push(text);
            }
            links.extend(links_within(&p, base)?);
        }
        children.push(PolicyChild {
            heading,
            content: paragraphs.join("\n\n"),
            links,
        });
    }
    Ok(children)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://architecture.digital.gov.au";

    const CARD: &str = r#"
        <div class="metadata-card">
          <p class="title">Type</p><p>Capability</p>
          <p class="title">Reference</p>
          <div class="codification-data"> DOM10.CAP72 </div>
          <p class="title">Mandate</p>
          <p>Recommended</p>
          <p class="title">Owner</p>
        </div>"#;

    fn page(body: &str) -> String {
        format!("<html><body>{CARD}{body}</body></html>")
    }

    #[test]
    fn test_metadata_card_labels() {
        let doc = Html::parse_document(&page(""));
        let meta = parse_metadata_card(&doc).unwrap();

        assert_eq!(meta["Type"], "Capability");
        assert_eq!(meta["Reference"], "DOM10.CAP72");
        assert_eq!(meta["Mandate"], "Recommended");
        assert_eq!(meta["Owner"], "");
    }

    #[test]
    fn test_metadata_card_reference_in_paragraph_and_absent_card() {
        let doc = Html::parse_document(
            r#"<div class="metadata-card"><p class="title">Reference</p><p>DOM3</p></div>"#,
        );
        assert_eq!(parse_metadata_card(&doc).unwrap()["Reference"], "DOM3");

        let empty = Html::parse_document("<p>No card here</p>");
        assert!(parse_metadata_card(&empty).unwrap().is_empty());
    }

    #[test]
    fn test_domain_page_description() {
        let html = page(
            r#"<div class="clearfix text-formatted field field--name-body field__item">
                 <p>AI covers models.</p><p>And <b>agents</b>.</p>
               </div>"#,
        );
        let domain = parse_domain_page(&html).unwrap();

        assert_eq!(domain.metadata["Reference"], "DOM10.CAP72");
        assert_eq!(domain.description, "AI covers models.\nAnd\nagents\n.");
    }

    #[test]
    fn test_capability_page_sections() {
        let html = page(
            r#"<h2>Header menu</h2><ul><li>Home</li></ul>
               <h2>Definition</h2><p>Use of generative models.</p>
               <h2>Objective</h2><p>Adopt safely.</p><ul><li>One</li><li>Two</li></ul>"#,
        );
        let cap = parse_capability_page(&html).unwrap();

        let headings: Vec<&str> = cap.sections.iter().map(|s| s.heading.as_str()).collect();
        assert_eq!(headings, vec!["Header menu", "Definition", "Objective"]);
        assert_eq!(cap.sections[2].text, "Adopt safely.\n\nOne\nTwo");
    }

    #[test]
    fn test_policy_page() {
        let html = page(
            r#"<div class="node__content">
                 <p>Applies to all entities.</p>
                 <h2>Context</h2><p>See <a href="/einvoicing-standard">standard</a>.</p>
               </div>
               <div class="field field--name-field-policy-requirements-title field__item">Policy requirements</div>
               <div class="clearfix text-formatted field field--name-field-requirements-body field__item"><p>Entities must comply.</p></div>
               <div class="field field--name-field-children-of-policies field__items">
                 <div class="field__item"><h3>Requirement 1</h3><p>Adopt <a href="https://peppol.org">Peppol</a>.</p></div>
               </div>"#,
        );
        let policy = parse_policy_page(&html, BASE).unwrap();

        assert_eq!(policy.description, "Applies to all entities.");
        assert_eq!(policy.sections[0].heading, "Context");
        assert_eq!(policy.sections[0].links[0].url, "https://architecture.digital.gov.au/einvoicing-standard");
        assert_eq!(policy.requirements.title, "Policy requirements");
        assert_eq!(policy.requirements.body, "Entities must comply.");
        let child = &policy.requirements.children[0];
        assert_eq!(child.heading, "Requirement 1");
        assert_eq!(child.content, "Adopt \nPeppol\n.");
        assert_eq!(child.links[0].url, "https://peppol.org/");
    }

    #[test]
    fn test_document_page_without_body_is_empty() {
        let doc = parse_document_page(&page("<p>stray</p>"), BASE).unwrap();
        assert_eq!(doc.metadata["Mandate"], "Recommended");
        assert!(doc.description.is_empty());
        assert!(doc.sections.is_empty());
    }
}
