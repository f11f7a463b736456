/// Source names used on the command line and in logs
pub const DATACENTRES_SOURCE: &str = "datacentres";
pub const DISASTERS_SOURCE: &str = "disasters";
pub const GOVT_ARCHITECTURE_SOURCE: &str = "govt-architecture";

// Data-centre geo API
pub const DATACENTRES_URL: &str = "https://map.datacente.rs/api/geo/world";
pub const DATACENTRES_OUTPUT: &str = "datacenter_map_data.csv";

// Queensland disaster-mapping API
pub const DISASTERS_BASE_URL: &str = "https://sppims-dams.dsdiqlgp.qld.gov.au/api/v1/spp";
pub const DISASTERS_SUBURBS_OUTPUT: &str = "disaster_suburbs.csv";
pub const DISASTERS_LAYERS_OUTPUT: &str = "disaster_layer_categories.csv";
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0";

// Australian Government Architecture site
pub const GOVT_BASE_URL: &str = "https://architecture.digital.gov.au";
pub const GOVT_EXPORT_PATH: &str = "/dynamic-data-export";
pub const GOVT_OUTPUT: &str = "govt_digital_infrastructure_website.csv";
pub const GOVT_DEFAULT_DOMAINS: [&str; 2] = ["/data-and-analytics", "/ai"];

/// Placeholder written when a capability page lacks a section
pub const MISSING_SECTION: &str = "Missing";

/// Geometry columns always emitted first for feature collections
pub const GEOMETRY_COLUMNS: [&str; 4] = ["geometry_type", "coord_x", "coord_y", "feature_type"];

/// Column used when a record is a bare scalar rather than an object
pub const SCALAR_COLUMN: &str = "value";

/// Suffix of the dd-mm-yyyy companion column derived from epoch-ms dates
pub const DMY_SUFFIX: &str = "_dmy";
pub const DMY_FORMAT: &str = "%d-%m-%Y";

pub const DEFAULT_OUTPUT_DIR: &str = "output";
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Get all supported source names
pub fn get_supported_sources() -> Vec<&'static str> {
    vec![DATACENTRES_SOURCE, DISASTERS_SOURCE, GOVT_ARCHITECTURE_SOURCE]
}
