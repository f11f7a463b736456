//! Australian Government Architecture catalogue.
//!
//! The export endpoint lists one row per domain/capability pairing with HTML
//! fragments for each field. Rows are filtered by domain, then the domain and
//! capability pages are fetched to fill in references, mandates and the
//! capability's sections.

use crate::app::fetch::{fetch_html, fetch_json};
use crate::app::ports::{Fetcher, HttpRequest};
use crate::config::GovtConfig;
use crate::constants::{GOVT_ARCHITECTURE_SOURCE, MISSING_SECTION};
use crate::error::{Result, ScraperError};
use crate::parser::pages::{CapabilityPage, Metadata};
use crate::parser::{
    find_section, nth_heading, parse_anchor, parse_capability_page, parse_document_page,
    parse_domain_page, parse_links, parse_policy_page, Section,
};
use crate::pipeline::flatten::FlattenRules;
use crate::types::{DataSource, Dataset, Link, RawRecord};
use metrics::counter;
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};

/// One export row with its anchors parsed
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogueEntry {
    pub domain: Link,
    pub capability: Link,
    pub designs: Vec<Link>,
    pub policies: Vec<Link>,
    pub standards: Vec<Link>,
    pub strategies: Vec<Link>,
}

/// Which parser a linked page needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkedPage {
    Policy,
    Document,
}

#[derive(Debug, Clone, Default)]
struct LinkDetails {
    reference: String,
    mandate: String,
    description: String,
    /// Policy requirements body; standards and designs have none
    requirements: Option<String>,
}

pub struct GovtArchitectureSource {
    config: GovtConfig,
}

impl Default for GovtArchitectureSource {
    fn default() -> Self {
        Self::new(GovtConfig::default())
    }
}

impl GovtArchitectureSource {
    pub fn new(config: GovtConfig) -> Self {
        Self { config }
    }

    /// Whether the domain link falls under one of the configured filters.
    /// Matching is on the path below the site base.
    pub fn matches_domain(&self, domain: &Link) -> bool {
        let path = domain
            .url
            .strip_prefix(self.config.base_url.as_str())
            .unwrap_or(&domain.url);
        self.config
            .domain_filters
            .iter()
            .any(|filter| path.contains(filter.as_str()))
    }

    async fn build_record(
        &self,
        fetcher: &dyn Fetcher,
        mut entry: CatalogueEntry,
        details: &mut HashMap<String, LinkDetails>,
    ) -> Result<RawRecord> {
        let domain_page = parse_domain_page(&fetch_html(fetcher, &entry.domain.url).await?)?;
        let capability_page =
            parse_capability_page(&fetch_html(fetcher, &entry.capability.url).await?)?;

        if self.config.follow_links {
            self.enrich(fetcher, &mut entry.policies, LinkedPage::Policy, details).await;
            self.enrich(fetcher, &mut entry.standards, LinkedPage::Document, details).await;
            self.enrich(fetcher, &mut entry.designs, LinkedPage::Document, details).await;
        }

        info!("{} -> {}", entry.domain.text, entry.capability.text);
        catalogue_record(
            &entry,
            &domain_page.metadata,
            &domain_page.description,
            &capability_page,
        )
    }

    /// Attach reference, mandate and description from each linked page, plus
    /// the requirements body of policies.
    /// A page that cannot be fetched leaves its link as it was.
    async fn enrich(
        &self,
        fetcher: &dyn Fetcher,
        links: &mut [Link],
        kind: LinkedPage,
        details: &mut HashMap<String, LinkDetails>,
    ) {
        for link in links.iter_mut() {
            if !details.contains_key(&link.url) {
                match self.link_details(fetcher, &link.url, kind).await {
                    Ok(found) => {
                        details.insert(link.url.clone(), found);
                    }
                    Err(e) => {
                        warn!(url = %link.url, error = %e, "Could not follow link");
                        counter!("ods_govt_link_errors_total").increment(1);
                        continue;
                    }
                }
            }
            if let Some(found) = details.get(&link.url) {
                link.reference = Some(found.reference.clone());
                link.mandate = Some(found.mandate.clone());
                link.description = Some(found.description.clone());
                link.requirements = found.requirements.clone();
            }
        }
    }

    async fn link_details(
        &self,
        fetcher: &dyn Fetcher,
        url: &str,
        kind: LinkedPage,
    ) -> Result<LinkDetails> {
        let html = fetch_html(fetcher, url).await?;
        let (metadata, description, requirements) = match kind {
            LinkedPage::Policy => {
                let page = parse_policy_page(&html, &self.config.base_url)?;
                let body = page.requirements.body;
                (page.metadata, page.description, Some(body).filter(|b| !b.is_empty()))
            }
            LinkedPage::Document => {
                let page = parse_document_page(&html, &self.config.base_url)?;
                (page.metadata, page.description, None)
            }
        };
        debug!(url, "Followed link");
        Ok(LinkDetails {
            reference: metadata_value(&metadata, "Reference"),
            mandate: metadata_value(&metadata, "Mandate"),
            description,
            requirements,
        })
    }
}

/// Parse the HTML fragments of one export row.
///
/// The domain anchor is read first and handed to `keep`; a rejected row
/// yields `Ok(None)` without its other fields being looked at. The domain and
/// capability fields must each hold an anchor, otherwise the row fails with
/// `ScraperError::MissingLink`.
pub fn parse_export_row(
    row: &Value,
    base: &str,
    keep: impl Fn(&Link) -> bool,
) -> Result<Option<CatalogueEntry>> {
    let field = |name: &str| row.get(name).and_then(Value::as_str).unwrap_or("");
    let domain = parse_anchor(field("Domain"), base, "Domain")?;
    if !keep(&domain) {
        debug!(domain = %domain.url, "Domain not selected");
        return Ok(None);
    }
    Ok(Some(CatalogueEntry {
        domain,
        capability: parse_anchor(field("Capability"), base, "Capability")?,
        designs: parse_links(field("Designs"), base)?,
        policies: parse_links(field("Policies"), base)?,
        standards: parse_links(field("Standards"), base)?,
        strategies: parse_links(field("Strategies"), base)?,
    }))
}

/// Text of the `Definition` section. When that is absent or empty the third
/// section stands in for it, and failing that the missing marker.
pub fn capability_definition(sections: &[Section]) -> String {
    match find_section(sections, "Definition") {
        Some(section) if !section.text.is_empty() => section.text.clone(),
        _ => nth_heading(sections, 2)
            .and_then(|heading| find_section(sections, heading))
            .map(|section| section.text.clone())
            .unwrap_or_else(|| MISSING_SECTION.to_string()),
    }
}

fn section_or_missing(sections: &[Section], heading: &str) -> String {
    find_section(sections, heading)
        .map(|section| section.text.clone())
        .unwrap_or_else(|| MISSING_SECTION.to_string())
}

fn metadata_value(metadata: &Metadata, label: &str) -> String {
    metadata.get(label).cloned().unwrap_or_default()
}

/// The output record, keys in column order.
pub fn catalogue_record(
    entry: &CatalogueEntry,
    domain_metadata: &Metadata,
    domain_description: &str,
    capability: &CapabilityPage,
) -> Result<RawRecord> {
    let sections = &capability.sections;
    Ok(json!({
        "domain_name": entry.domain.text,
        "domain_url": entry.domain.url,
        "domain_reference": metadata_value(domain_metadata, "Reference"),
        "domain_mandate": metadata_value(domain_metadata, "Mandate"),
        "domain_description": domain_description,
        "capability_name": entry.capability.text,
        "capability_url": entry.capability.url,
        "capability_reference": metadata_value(&capability.metadata, "Reference"),
        "capability_mandate": metadata_value(&capability.metadata, "Mandate"),
        "capability_definition": capability_definition(sections),
        "capability_objective": section_or_missing(sections, "Objective"),
        "capability_purpose": section_or_missing(sections, "Purpose"),
        "capability_WoG_applicability": section_or_missing(sections, "Whole of government applicability"),
        "designs": serde_json::to_value(&entry.designs)?,
        "policies": serde_json::to_value(&entry.policies)?,
        "standards": serde_json::to_value(&entry.standards)?,
        "strategies": serde_json::to_value(&entry.strategies)?,
    }))
}

#[async_trait::async_trait]
impl DataSource for GovtArchitectureSource {
    fn source_name(&self) -> &'static str {
        GOVT_ARCHITECTURE_SOURCE
    }

    #[instrument(skip_all, fields(filters = ?self.config.domain_filters))]
    async fn collect(&self, fetcher: &dyn Fetcher) -> Result<Vec<Dataset>> {
        let export = fetch_json(fetcher, &HttpRequest::get(self.config.export_url())).await?;
        let rows = match export {
            Value::Array(rows) => rows,
            _ => return Err(ScraperError::MissingField("export row array".to_string())),
        };
        info!("Export lists {} rows", rows.len());

        let mut records = Vec::new();
        let mut skipped = 0;
        let mut details = HashMap::new();

        for (index, row) in rows.iter().enumerate() {
            let parsed = parse_export_row(row, &self.config.base_url, |domain| {
                self.matches_domain(domain)
            });
            let entry = match parsed {
                Ok(Some(entry)) => entry,
                Ok(None) => continue,
                Err(e) if e.is_record_level() => {
                    warn!(row = index, error = %e, "Skipping export row");
                    counter!("ods_govt_rows_skipped_total").increment(1);
                    skipped += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };
            records.push(self.build_record(fetcher, entry, &mut details).await?);
        }

        info!(
            "Built {} catalogue records ({} rows skipped)",
            records.len(),
            skipped
        );
        Ok(vec![Dataset {
            name: GOVT_ARCHITECTURE_SOURCE.to_string(),
            output_file: self.config.output_file.clone(),
            records,
            rules: FlattenRules::plain_records(),
            columns: self.config.columns.clone(),
            skipped,
        }])
    }
}
