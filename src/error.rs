use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request to {url} failed with status code {status}")]
    Fetch { url: String, status: u16 },

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("No link found in {field} field")]
    MissingLink { field: String },

    #[error("Invalid CSS selector '{0}'")]
    Selector(String),

    #[error("Invalid URL '{url}': {message}")]
    Url { url: String, message: String },
}

impl ScraperError {
    /// Errors that only affect a single record; the pipeline drops the record and keeps going.
    pub fn is_record_level(&self) -> bool {
        matches!(
            self,
            ScraperError::MissingLink { .. } | ScraperError::MissingField(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ScraperError>;
