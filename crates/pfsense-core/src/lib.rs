//! # pfsense-core
//!
//! Core types and utilities for talking to a pfSense appliance through its
//! REST API v2.
//!
//! ## Modules
//!
//! - [`error`] - Error types and HTTP status code mapping
//! - [`client`] - HTTP client tuning (timeouts, connection pooling)
//! - [`config`] - Connection configuration for a single appliance
//! - [`auth`] - Authentication strategies injected as request headers
//! - [`query`] - Query string helper

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod query;

// Re-export commonly used types
pub use auth::Authorization;
pub use error::{Error, Result};
