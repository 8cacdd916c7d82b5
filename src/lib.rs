//! Normalize cloud-billing CSV exports and project RAM-hour costs.
//!
//! Raw export bytes flow through [`loader`] (column resolution, SKU
//! decomposition, cost projection, RAM-hour filter) into canonical rows, which
//! [`reports`] turns into dashboard series or itemized reports. [`service`]
//! ties this to an [`storage::ObjectStore`] and an [`storage::UploadLog`].

pub mod config;
pub mod error;
pub mod loader;
pub mod output;
pub mod reports;
pub mod service;
pub mod sku;
pub mod storage;
pub mod types;
pub mod util;

pub use error::{BillingError, Result};
