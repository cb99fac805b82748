//! Shared types, error model, and configuration for the parts catalog.
//!
//! This crate is the foundation depended on by all other catalog crates.
//! It provides:
//! - [`CatalogError`] — the unified error type
//! - Domain types ([`ComponentRef`], [`EnrichedComponent`], [`CatalogEntry`],
//!   [`Grammar`], [`RegistryPackage`], [`RejectionSet`])
//! - Configuration ([`AppConfig`], config loading, forge credentials)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, ClassifyConfig, EndpointsConfig, FetchConfig, ForgeConfig, ForgeCredentials,
    IndexConfig, PathsConfig, config_dir, config_file_path, forge_credentials, init_config,
    load_config, load_config_from, validate_config,
};
pub use error::{CatalogError, Result};
pub use types::{
    Branch, CatalogEntry, Category, ComponentRef, DocStore, EnrichedComponent, Grammar,
    MISSING_README_MARKER, Platforms, RegistryPackage, RegistryTime, RejectedEntry,
    RejectionSet, is_short_repo,
};
