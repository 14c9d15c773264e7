pub mod analyzers;
pub mod config;
pub mod fetch;
pub mod ingest;
pub mod output;
pub mod summary;
