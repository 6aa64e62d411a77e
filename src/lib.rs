pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;

pub use app::run_connector;
pub use config::{ConnectorConfig, OutputMode};
pub use core::pipeline::{MetadataPipeline, RunReport};
pub use utils::error::{EtlError, Result};
