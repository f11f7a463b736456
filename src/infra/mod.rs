pub mod http_client;
pub mod memory_fetcher;
