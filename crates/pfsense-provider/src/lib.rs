//! # pfsense-provider
//!
//! Provider plumbing for reading pfSense configuration from an
//! infrastructure-as-code tool.
//!
//! ## Modules
//!
//! - [`diagnostics`] - User-facing errors and warnings
//! - [`value`] - Configuration values that may be null or not yet known
//! - [`schema`] - Attribute schemas and configuration validation
//! - [`validators`] - String validators attached to schema attributes
//! - [`plugin`] - Data source, resource and function traits
//! - [`config`] - Provider configuration and environment fallback
//! - [`provider`] - The `pfsense-v2` provider
//! - [`data_source`] - The `configs` data source
//! - [`stubs`] - Pass-through example resources, data sources and functions

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod data_source;
pub mod diagnostics;
pub mod plugin;
pub mod provider;
pub mod schema;
pub mod stubs;
pub mod validators;
pub mod value;

pub use diagnostics::{AttributePath, Diagnostic, Diagnostics, Severity};
pub use provider::PfSenseProvider;
pub use value::ConfigValue;
