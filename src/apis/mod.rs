pub mod datacentres;
pub mod disasters;
pub mod govt_architecture;

use crate::config::Config;
use crate::constants::{DATACENTRES_SOURCE, DISASTERS_SOURCE, GOVT_ARCHITECTURE_SOURCE};
use crate::types::DataSource;
use datacentres::DatacentresSource;
use disasters::DisastersSource;
use govt_architecture::GovtArchitectureSource;

/// Build the data source registered under `name`.
pub fn create_source(name: &str, config: &Config) -> Option<Box<dyn DataSource>> {
    match name {
        DATACENTRES_SOURCE => Some(Box::new(DatacentresSource::new(config.datacentres.clone()))),
        DISASTERS_SOURCE => Some(Box::new(DisastersSource::new(config.disasters.clone()))),
        GOVT_ARCHITECTURE_SOURCE => Some(Box::new(GovtArchitectureSource::new(config.govt.clone()))),
        _ => None,
    }
}
