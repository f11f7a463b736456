use anyhow::Result;
use open_data_scraper::apis::datacentres::DatacentresSource;
use open_data_scraper::apis::disasters::DisastersSource;
use open_data_scraper::apis::govt_architecture::GovtArchitectureSource;
use open_data_scraper::constants::{DATACENTRES_URL, GOVT_BASE_URL};
use open_data_scraper::error::ScraperError;
use open_data_scraper::infra::memory_fetcher::InMemoryFetcher;
use open_data_scraper::pipeline::Pipeline;
use serde_json::json;
use std::collections::HashMap;
use std::path::Path;
use tempfile::tempdir;

/// Header plus rows keyed by column name
fn read_csv(path: &Path) -> Result<(Vec<String>, Vec<HashMap<String, String>>)> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(
            headers
                .iter()
                .cloned()
                .zip(record.iter().map(String::from))
                .collect(),
        );
    }
    Ok((headers, rows))
}

#[tokio::test]
async fn test_datacentre_feature_collection_end_to_end() -> Result<()> {
    let collection = json!({
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [151.2, -33.8]},
                "properties": {
                    "id": 101,
                    "name": "SYD1",
                    "m2": "1200",
                    "certs": {"LEED": "TRUE"},
                    "readyForService": 1700000000000i64,
                    "clouds": ["aws", "azure"]
                }
            },
            {
                "type": "Feature",
                "geometry": {"type": "Point"},
                "properties": {"id": 102, "name": "MEL1", "certs": {"LEED": "FALSE"}}
            },
            {
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [115.8, -31.9]},
                "properties": {"id": 103, "name": "PER1", "m2": "abc"}
            }
        ]
    });
    let fetcher = InMemoryFetcher::new().with_get(DATACENTRES_URL, &collection.to_string());
    let dir = tempdir()?;

    let result = Pipeline::run(&DatacentresSource::default(), &fetcher, dir.path()).await?;

    assert_eq!(result.total_rows(), 3);
    let (headers, rows) = read_csv(&dir.path().join("datacenter_map_data.csv"))?;
    assert_eq!(
        headers,
        vec![
            "geometry_type",
            "coord_x",
            "coord_y",
            "feature_type",
            "certs_LEED",
            "clouds",
            "id",
            "m2",
            "name",
            "readyForService",
            "readyForService_dmy"
        ]
    );
    assert_eq!(rows.len(), 3);

    let leed: Vec<&str> = rows.iter().map(|r| r["certs_LEED"].as_str()).collect();
    assert_eq!(leed, vec!["True", "False", ""]);

    // missing coordinates render as empty
    assert_eq!(rows[1]["coord_x"], "");
    assert_eq!(rows[1]["coord_y"], "");
    assert_eq!(rows[0]["coord_x"], "151.2");

    assert_eq!(rows[0]["m2"], "1200.0");
    assert_eq!(rows[2]["m2"], "");
    assert_eq!(rows[0]["clouds"], r#"["aws", "azure"]"#);
    assert_eq!(rows[1]["clouds"], "[]");
    assert_eq!(rows[0]["id"], "101");
    assert_eq!(rows[0]["readyForService"], "2023-11-14 22:13:20");
    assert_eq!(rows[0]["readyForService_dmy"], "14-11-2023");
    assert_eq!(rows[1]["readyForService_dmy"], "");
    Ok(())
}

#[tokio::test]
async fn test_govt_catalogue_end_to_end() -> Result<()> {
    let export = json!([
        {
            "Domain": "<a href=\"/data-and-analytics\">Data and Analytics</a>",
            "Capability": "<a href=\"/data-sharing\">Data Sharing</a>",
            "Policies": "<a href=\"/data-policy\">Data policy</a> | <a href=\"/ai-policy\">AI policy</a>",
            "Standards": "",
            "Designs": "",
            "Strategies": ""
        },
        {"Domain": "", "Capability": ""}
    ]);
    let capability = r#"<html><body>
        <div class="metadata-card"><p class="title">Reference</p><div class="codification-data">DOM4.CAP9</div></div>
        <h2>Definition</h2><p>Sharing data safely.</p>
        <h2>Objective</h2><p>Reuse.</p>
    </body></html>"#;
    let domain = r#"<html><body>
        <div class="metadata-card"><p class="title">Mandate</p><p>Mandatory</p></div>
    </body></html>"#;
    let fetcher = InMemoryFetcher::new()
        .with_get(&format!("{GOVT_BASE_URL}/dynamic-data-export"), &export.to_string())
        .with_get(&format!("{GOVT_BASE_URL}/data-and-analytics"), domain)
        .with_get(&format!("{GOVT_BASE_URL}/data-sharing"), capability);
    let dir = tempdir()?;

    let result = Pipeline::run(&GovtArchitectureSource::default(), &fetcher, dir.path()).await?;

    assert_eq!(result.skipped, 1);
    let (headers, rows) = read_csv(&dir.path().join("govt_digital_infrastructure_website.csv"))?;
    assert_eq!(headers.len(), 17);
    assert_eq!(headers[0], "domain_name");
    assert_eq!(headers[12], "capability_WoG_applicability");
    assert_eq!(rows.len(), 1);

    let row = &rows[0];
    assert_eq!(row["domain_mandate"], "Mandatory");
    assert_eq!(row["domain_reference"], "");
    assert_eq!(row["capability_reference"], "DOM4.CAP9");
    assert_eq!(row["capability_definition"], "Sharing data safely.");
    assert_eq!(row["capability_purpose"], "Missing");
    assert_eq!(row["designs"], "[]");
    assert_eq!(
        row["policies"],
        r#"[{"text": "Data policy", "url": "https://architecture.digital.gov.au/data-policy"}, {"text": "AI policy", "url": "https://architecture.digital.gov.au/ai-policy"}]"#
    );
    Ok(())
}

#[tokio::test]
async fn test_fetch_failure_writes_nothing() -> Result<()> {
    let source = DisastersSource::default();
    let fetcher = InMemoryFetcher::new()
        .with_post(&source.suburbs_url(), r#"["Toowong"]"#)
        .with_status(&source.layers_url(), 502, "bad gateway");
    let dir = tempdir()?;
    let out = dir.path().join("out");

    let err = Pipeline::run(&source, &fetcher, &out).await.unwrap_err();

    assert!(matches!(err, ScraperError::Fetch { status: 502, .. }));
    assert!(!out.exists());
    Ok(())
}
