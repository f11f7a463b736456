use crate::constants::{
    BROWSER_USER_AGENT, DATACENTRES_OUTPUT, DATACENTRES_URL, DEFAULT_CONFIG_PATH,
    DEFAULT_OUTPUT_DIR, DISASTERS_BASE_URL, DISASTERS_LAYERS_OUTPUT, DISASTERS_SUBURBS_OUTPUT,
    GOVT_BASE_URL, GOVT_DEFAULT_DOMAINS, GOVT_EXPORT_PATH, GOVT_OUTPUT,
};
use crate::error::{Result, ScraperError};
use crate::types::ColumnTypes;
use reqwest::Url;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable overriding `output_dir`
pub const OUTPUT_DIR_ENV: &str = "OPEN_DATA_OUTPUT_DIR";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub output_dir: PathBuf,
    pub datacentres: DatacentresConfig,
    pub disasters: DisastersConfig,
    pub govt: GovtConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatacentresConfig {
    pub url: String,
    pub output_file: String,
    /// Property keys whose objects expand into `<key>_<subkey>` columns
    pub nested: Vec<String>,
    pub columns: ColumnTypes,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DisastersConfig {
    pub base_url: String,
    pub user_agent: String,
    pub suburbs_output: String,
    pub layers_output: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GovtConfig {
    pub base_url: String,
    pub export_path: String,
    /// A row is kept when its domain href contains any of these
    pub domain_filters: Vec<String>,
    /// Fetch each linked policy, standard and design page
    pub follow_links: bool,
    pub output_file: String,
    pub columns: ColumnTypes,
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            datacentres: DatacentresConfig::default(),
            disasters: DisastersConfig::default(),
            govt: GovtConfig::default(),
        }
    }
}

impl Default for DatacentresConfig {
    fn default() -> Self {
        Self {
            url: DATACENTRES_URL.to_string(),
            output_file: DATACENTRES_OUTPUT.to_string(),
            nested: names(&["certs"]),
            columns: ColumnTypes {
                numeric: names(&["coord_x", "coord_y", "gross_max_power", "m2"]),
                boolean: names(&[
                    "certs_BREAAM",
                    "certs_EUcoc",
                    "certs_LEED",
                    "certs_Other",
                    "certs_UT_cert",
                    "certs_UT_level",
                ]),
                epoch_millis: names(&["readyForService", "construction_date"]),
                list: names(&["cdns", "clouds", "fibres", "ixps", "networks"]),
                categorical: names(&[
                    "geometry_type",
                    "feature_type",
                    "company_name",
                    "country",
                    "name",
                ]),
                identifier: names(&["id"]),
            },
        }
    }
}

impl Default for DisastersConfig {
    fn default() -> Self {
        Self {
            base_url: DISASTERS_BASE_URL.to_string(),
            user_agent: BROWSER_USER_AGENT.to_string(),
            suburbs_output: DISASTERS_SUBURBS_OUTPUT.to_string(),
            layers_output: DISASTERS_LAYERS_OUTPUT.to_string(),
        }
    }
}

impl Default for GovtConfig {
    fn default() -> Self {
        Self {
            base_url: GOVT_BASE_URL.to_string(),
            export_path: GOVT_EXPORT_PATH.to_string(),
            domain_filters: names(&GOVT_DEFAULT_DOMAINS),
            follow_links: false,
            output_file: GOVT_OUTPUT.to_string(),
            columns: ColumnTypes {
                list: names(&["designs", "policies", "standards", "strategies"]),
                ..ColumnTypes::default()
            },
        }
    }
}

impl GovtConfig {
    pub fn export_url(&self) -> String {
        format!("{}{}", self.base_url, self.export_path)
    }
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit `path` must exist. Without one, `config.toml` is read when
    /// present and built-in defaults are used otherwise. `OPEN_DATA_OUTPUT_DIR`
    /// overrides the output directory in both cases.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_PATH))?
            }
            None => {
                debug!("No {} found, using defaults", DEFAULT_CONFIG_PATH);
                Self::default()
            }
        };

        if let Ok(dir) = std::env::var(OUTPUT_DIR_ENV) {
            if !dir.trim().is_empty() {
                info!("Output directory overridden by {}: {}", OUTPUT_DIR_ENV, dir);
                config.output_dir = PathBuf::from(dir);
            }
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ScraperError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Every configured endpoint must be an absolute URL.
    pub fn validate(&self) -> Result<()> {
        for url in [
            self.datacentres.url.as_str(),
            self.disasters.base_url.as_str(),
            self.govt.base_url.as_str(),
        ] {
            Url::parse(url).map_err(|e| ScraperError::Url {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        }
        if self.govt.domain_filters.is_empty() {
            return Err(ScraperError::Config(
                "govt.domain_filters must name at least one domain".to_string(),
            ));
        }
        Ok(())
    }
}
