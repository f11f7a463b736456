pub mod apis;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod parser;
pub mod pipeline;
pub mod types;

// Transport port and its adapters
pub mod app;
pub mod infra;
