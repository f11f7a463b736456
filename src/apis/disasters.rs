use crate::app::fetch::fetch_json;
use crate::app::ports::{Fetcher, HttpRequest};
use crate::config::DisastersConfig;
use crate::constants::DISASTERS_SOURCE;
use crate::error::Result;
use crate::pipeline::flatten::FlattenRules;
use crate::types::{ColumnTypes, DataSource, Dataset, RawRecord};
use serde_json::Value;
use tracing::{info, instrument};

/// Queensland disaster-mapping lookups: suburb names and layer categories
pub struct DisastersSource {
    config: DisastersConfig,
}

impl Default for DisastersSource {
    fn default() -> Self {
        Self::new(DisastersConfig::default())
    }
}

impl DisastersSource {
    pub fn new(config: DisastersConfig) -> Self {
        Self { config }
    }

    pub fn suburbs_url(&self) -> String {
        format!("{}/suburb_name/", self.config.base_url)
    }

    pub fn layers_url(&self) -> String {
        format!("{}/layer_categories/", self.config.base_url)
    }

    fn with_headers(&self, request: HttpRequest) -> HttpRequest {
        request
            .header("Accept", "application/json")
            .header("User-Agent", self.config.user_agent.as_str())
    }

    fn dataset(name: &str, output_file: &str, payload: Value) -> Dataset {
        let records = into_records(payload);
        info!("{}: {} records", name, records.len());
        Dataset {
            name: name.to_string(),
            output_file: output_file.to_string(),
            records,
            rules: FlattenRules::plain_records(),
            columns: ColumnTypes::default(),
            skipped: 0,
        }
    }
}

/// A JSON array yields its elements; any other payload is a single record.
pub fn into_records(payload: Value) -> Vec<RawRecord> {
    match payload {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

#[async_trait::async_trait]
impl DataSource for DisastersSource {
    fn source_name(&self) -> &'static str {
        DISASTERS_SOURCE
    }

    #[instrument(skip_all, fields(base = %self.config.base_url))]
    async fn collect(&self, fetcher: &dyn Fetcher) -> Result<Vec<Dataset>> {
        let suburbs = fetch_json(fetcher, &self.with_headers(HttpRequest::post(self.suburbs_url()))).await?;
        let layers = fetch_json(fetcher, &self.with_headers(HttpRequest::get(self.layers_url()))).await?;

        Ok(vec![
            Self::dataset("suburbs", &self.config.suburbs_output, suburbs),
            Self::dataset("layer_categories", &self.config.layers_output, layers),
        ])
    }
}
