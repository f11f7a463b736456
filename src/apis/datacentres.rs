use crate::app::fetch::fetch_json;
use crate::app::ports::{Fetcher, HttpRequest};
use crate::config::DatacentresConfig;
use crate::constants::DATACENTRES_SOURCE;
use crate::error::{Result, ScraperError};
use crate::pipeline::flatten::FlattenRules;
use crate::types::{DataSource, Dataset};
use serde_json::Value;
use tracing::{info, instrument};

/// World data-centre map, served as a GeoJSON FeatureCollection
pub struct DatacentresSource {
    config: DatacentresConfig,
}

impl Default for DatacentresSource {
    fn default() -> Self {
        Self::new(DatacentresConfig::default())
    }
}

impl DatacentresSource {
    pub fn new(config: DatacentresConfig) -> Self {
        Self { config }
    }

    fn rules(&self) -> FlattenRules {
        let nested: Vec<&str> = self.config.nested.iter().map(String::as_str).collect();
        FlattenRules::feature_collection(&nested)
    }
}

/// The `features` array of a FeatureCollection.
pub fn features(collection: Value) -> Result<Vec<Value>> {
    match collection {
        Value::Object(mut map) => match map.remove("features") {
            Some(Value::Array(features)) => Ok(features),
            Some(_) => Err(ScraperError::MissingField(
                "features is not an array".to_string(),
            )),
            None => Err(ScraperError::MissingField("features".to_string())),
        },
        _ => Err(ScraperError::MissingField(
            "FeatureCollection object".to_string(),
        )),
    }
}

#[async_trait::async_trait]
impl DataSource for DatacentresSource {
    fn source_name(&self) -> &'static str {
        DATACENTRES_SOURCE
    }

    #[instrument(skip_all, fields(url = %self.config.url))]
    async fn collect(&self, fetcher: &dyn Fetcher) -> Result<Vec<Dataset>> {
        let collection = fetch_json(fetcher, &HttpRequest::get(&self.config.url)).await?;
        let records = features(collection)?;
        info!("Fetched {} data-centre features", records.len());

        Ok(vec![Dataset {
            name: DATACENTRES_SOURCE.to_string(),
            output_file: self.config.output_file.clone(),
            records,
            rules: self.rules(),
            columns: self.config.columns.clone(),
            skipped: 0,
        }])
    }
}
