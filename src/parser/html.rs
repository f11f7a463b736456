use crate::error::{Result, ScraperError};
use crate::types::Link;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};

pub fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|_| ScraperError::Selector(css.to_string()))
}

/// Text nodes trimmed, empties dropped, joined with `sep`.
pub fn stripped_text(element: &ElementRef, sep: &str) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(sep)
}

/// Text nodes joined with `sep` as-is, then outer spaces and line breaks removed.
pub fn joined_text(element: &ElementRef, sep: &str) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join(sep)
        .trim_matches(|c: char| c == '\r' || c == '\n' || c == ' ')
        .to_string()
}

pub fn has_class(element: &ElementRef, class: &str) -> bool {
    element.value().classes().any(|c| c == class)
}

/// Next sibling that is an element, skipping text and comments
pub fn next_element_sibling<'a>(element: &ElementRef<'a>) -> Option<ElementRef<'a>> {
    element.next_siblings().find_map(ElementRef::wrap)
}

/// Resolve `href` against `base`; falls back to plain concatenation when
/// `base` is not a valid absolute URL.
pub fn resolve_url(base: &str, href: &str) -> String {
    Url::parse(base)
        .and_then(|b| b.join(href))
        .map(|u| u.to_string())
        .unwrap_or_else(|_| format!("{base}{href}"))
}

/// First `<a href>` in an HTML fragment.
pub fn parse_anchor(fragment: &str, base: &str, field: &str) -> Result<Link> {
    let doc = Html::parse_fragment(fragment);
    let a = selector("a[href]")?;
    let link = doc.select(&a).next().and_then(|el| anchor_link(&el, base));
    link.ok_or_else(|| ScraperError::MissingLink {
        field: field.to_string(),
    })
}

/// Every `<a href>` in an HTML fragment, in document order.
pub fn parse_links(fragment: &str, base: &str) -> Result<Vec<Link>> {
    if fragment.trim().is_empty() {
        return Ok(Vec::new());
    }
    let doc = Html::parse_fragment(fragment);
    let a = selector("a")?;
    let links: Vec<Link> = doc
        .select(&a)
        .filter_map(|el| anchor_link(&el, base))
        .collect();
    Ok(links)
}

/// Links inside an element
pub fn links_within(element: &ElementRef, base: &str) -> Result<Vec<Link>> {
    let a = selector("a")?;
    let links: Vec<Link> = element
        .select(&a)
        .map(|el| {
            let href = el.value().attr("href").unwrap_or("");
            Link::new(stripped_text(&el, ""), resolve_url(base, href))
        })
        .collect();
    Ok(links)
}

fn anchor_link(el: &ElementRef, base: &str) -> Option<Link> {
    let href = el.value().attr("href")?;
    Some(Link::new(stripped_text(el, ""), resolve_url(base, href)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://architecture.digital.gov.au";

    #[test]
    fn test_parse_anchor() {
        let link = parse_anchor(
            r#"<a href="/ai">Artificial Intelligence (AI)</a>"#,
            BASE,
            "Domain",
        )
        .unwrap();
        assert_eq!(link.text, "Artificial Intelligence (AI)");
        assert_eq!(link.url, "https://architecture.digital.gov.au/ai");
    }

    #[test]
    fn test_parse_anchor_missing_is_missing_link() {
        let err = parse_anchor("Not linked", BASE, "Domain").unwrap_err();
        assert!(matches!(err, ScraperError::MissingLink { ref field } if field == "Domain"));
        assert!(err.is_record_level());
    }

    #[test]
    fn test_parse_links_separated_by_pipes() {
        let links = parse_links(
            r#"<a href="/einvoicing-policy">eInvoicing</a> | <a href="/data-policy"> Data </a>"#,
            BASE,
        )
        .unwrap();
        assert_eq!(links.len(), 2);
        assert_eq!(links[1].text, "Data");
        assert_eq!(links[1].url, "https://architecture.digital.gov.au/data-policy");
        assert!(parse_links("", BASE).unwrap().is_empty());
    }

    #[test]
    fn test_resolve_url_keeps_absolute_links() {
        assert_eq!(
            resolve_url(BASE, "https://www.finance.gov.au/x"),
            "https://www.finance.gov.au/x"
        );
        assert_eq!(resolve_url("not a url", "/x"), "not a url/x");
    }
}
