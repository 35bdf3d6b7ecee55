//! # biblioharvest
//!
//! Bibliometric harvester: per-topic, per-year work counts and top-cited
//! samples from OpenAlex, aggregated into one JSON document.
//!
//! ## Modules
//!
//! - [`abstracts`] - Abstract reconstruction from inverted indices
//! - [`normalize`] - Raw work → canonical article
//! - [`cell`] - Per-cell fetch with fallback
//! - [`harvest`] - Grid driver and configuration
//! - [`openalex`] - OpenAlex API client
//! - [`models`] - Output document model
//! - [`output`] - Document persistence
//! - [`error`] - Custom error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use biblioharvest::{harvest::{HarvestConfig, Harvester}, openalex::OpenAlexClient, output};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = HarvestConfig::default();
//!     let client = OpenAlexClient::with_base_url(&config.base_url, &config.mailto)?;
//!     let report = Harvester::new(client, config.clone())?.run().await?;
//!     output::write_document(&config.output, &report.document)?;
//!     Ok(())
//! }
//! ```

pub mod abstracts;
pub mod cell;
pub mod error;
pub mod harvest;
pub mod models;
pub mod normalize;
pub mod openalex;
pub mod output;

pub use error::{HarvestError, Result};
