//! pfSense REST API v2 client and data models.
//!
//! Provides typed wire structures, the projections handed to the provider,
//! and an asynchronous client for the endpoints the provider reads.

#![deny(missing_docs)]

pub mod client;
pub mod models;

pub use client::{PfSenseApi, PfSenseClient, PfSenseClientBuilder};
pub use models::{BaseConfig, FirewallRule, FirewallRuleRecord, FirewallRules, SystemHostname};

/// Convenient result alias that reuses the shared pfSense error type.
pub type Result<T> = pfsense_core::Result<T>;
