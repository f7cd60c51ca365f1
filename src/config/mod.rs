//! Configuration module for Catalog-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use catalog_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("configs/cocktails.toml")).unwrap();
//! println!("Listing page size: {}", config.source.page_size);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    AssetsConfig, AttrRule, Config, DetailConfig, FieldRule, FirstPageNotFound, HttpConfig,
    ListingConfig, OutputConfig, PipelineConfig, ReferenceRule, ScoreTerm, SourceConfig,
    SubResourceConfig,
};

// Re-export parser functions
pub use parser::{
    compute_config_hash, load_config, load_config_with_hash, parse_config,
    parse_config_unvalidated, read_config_with_hash,
};
pub use validation::validate;
