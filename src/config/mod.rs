//! Configuration module for Estate-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use estate_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Detail workers: {}", config.crawler.max_concurrent_details);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CategoryConfig, Config, CrawlerConfig, OutputConfig, OutputFormat, SelectorConfig, SiteConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
