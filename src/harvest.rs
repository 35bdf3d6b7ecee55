//! Grid driver.
//!
//! Walks every (topic, year) cell in configured order, records exactly one
//! [`YearCell`] per cell, and paces requests for the upstream polite pool.

use crate::cell::fetch_cell;
use crate::error::{HarvestError, Result};
use crate::models::Document;
use crate::openalex::{WorksSource, OPENALEX_API_BASE};
use futures::stream::{self, StreamExt};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

/// Default pause between cells
pub const DEFAULT_DELAY: Duration = Duration::from_millis(200);

/// Harvest configuration, fixed for the duration of a run.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// First publication year (inclusive)
    pub from_year: i32,
    /// Last publication year (inclusive)
    pub to_year: i32,
    /// Topics, in output order
    pub topics: Vec<String>,
    /// Where the finished document is written
    pub output: PathBuf,
    /// Courtesy contact identifier sent with every query
    pub mailto: String,
    /// OpenAlex API base URL
    pub base_url: String,
    /// Pause after each cell except the last
    pub delay: Duration,
    /// Maximum cells in flight at once
    pub concurrency: usize,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            from_year: 2020,
            to_year: 2025,
            topics: vec![
                "Blockchain".to_string(),
                "Tokenization".to_string(),
                "Smart contract".to_string(),
            ],
            output: PathBuf::from("data.json"),
            mailto: "researcher@example.com".to_string(),
            base_url: OPENALEX_API_BASE.to_string(),
            delay: DEFAULT_DELAY,
            concurrency: 1,
        }
    }
}

impl HarvestConfig {
    /// Configured years, ascending.
    pub fn years(&self) -> Vec<i32> {
        (self.from_year..=self.to_year).collect()
    }

    /// Number of cells in the grid.
    pub fn cell_total(&self) -> usize {
        self.topics.len() * self.years().len()
    }

    /// Reject grid settings that cannot produce a complete document.
    ///
    /// The output path is not checked here; see [`crate::output::check_output_path`].
    pub fn validate(&self) -> Result<()> {
        if self.topics.is_empty() {
            return Err(HarvestError::Config("topic list is empty".to_string()));
        }
        for topic in &self.topics {
            if topic.trim().is_empty() {
                return Err(HarvestError::Config("topic must not be blank".to_string()));
            }
            // OpenAlex separates filters with commas
            if topic.contains(',') {
                return Err(HarvestError::Config(format!(
                    "topic {:?} must not contain a comma",
                    topic
                )));
            }
        }
        if let Some(dup) = self
            .topics
            .iter()
            .enumerate()
            .find(|&(i, t)| self.topics[..i].contains(t))
            .map(|(_, t)| t)
        {
            return Err(HarvestError::Config(format!("topic {:?} listed twice", dup)));
        }
        if self.from_year > self.to_year {
            return Err(HarvestError::Config(format!(
                "year range {}..={} is empty",
                self.from_year, self.to_year
            )));
        }
        if self.concurrency == 0 {
            return Err(HarvestError::Config("concurrency must be at least 1".to_string()));
        }
        url::Url::parse(&self.base_url)
            .map_err(|e| HarvestError::Config(format!("invalid base URL {:?}: {}", self.base_url, e)))?;
        if self.mailto.trim().is_empty() {
            return Err(HarvestError::Config("contact identifier is empty".to_string()));
        }
        Ok(())
    }
}

/// A cell that fell back to the empty record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedCell {
    pub topic: String,
    pub year: i32,
    pub error: String,
}

/// Outcome of a full run.
#[derive(Debug)]
pub struct HarvestReport {
    pub document: Document,
    pub failed_cells: Vec<FailedCell>,
}

/// Drives the cell fetcher across the topic × year grid.
pub struct Harvester<S> {
    source: S,
    config: HarvestConfig,
}

impl<S: WorksSource> Harvester<S> {
    /// Create a harvester; fails on an invalid configuration.
    pub fn new(source: S, config: HarvestConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { source, config })
    }

    /// Attempt every cell exactly once and assemble the document.
    ///
    /// Individual cell failures never abort the run. The only error is a
    /// grid that came out incomplete, which indicates a bug.
    pub async fn run(&self) -> Result<HarvestReport> {
        let years = self.config.years();
        let grid: Vec<(&str, i32)> = self
            .config
            .topics
            .iter()
            .flat_map(|topic| years.iter().map(move |year| (topic.as_str(), *year)))
            .collect();
        let total = grid.len();
        let delay = self.config.delay;
        let source = &self.source;

        info!(
            topics = self.config.topics.len(),
            years = years.len(),
            cells = total,
            concurrency = self.config.concurrency,
            "Starting harvest"
        );

        // `buffered` yields in grid order regardless of completion order
        let outcomes: Vec<_> = stream::iter(grid.into_iter().enumerate())
            .map(move |(idx, (topic, year))| async move {
                info!(topic = topic, year = year, cell = idx + 1, total = total, "Fetching cell");
                let outcome = fetch_cell(source, topic, year).await;
                if idx + 1 < total && !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                (topic, outcome)
            })
            .buffered(self.config.concurrency)
            .collect()
            .await;

        let mut document = Document::new();
        for topic in &self.config.topics {
            document.add_topic(topic);
        }

        let mut failed_cells = Vec::new();
        for (topic, outcome) in outcomes {
            if let Some(e) = outcome.error() {
                failed_cells.push(FailedCell {
                    topic: topic.to_string(),
                    year: outcome.cell().year,
                    error: e.to_string(),
                });
            }
            document.push_cell(topic, outcome.into_cell());
        }

        let mismatches = document.grid_mismatches(&self.config.topics, &years);
        if !mismatches.is_empty() {
            return Err(HarvestError::Validation(format!(
                "harvest grid incomplete: {:?}",
                mismatches
            )));
        }

        if failed_cells.is_empty() {
            info!(cells = total, "Harvest complete");
        } else {
            warn!(
                cells = total,
                failed = failed_cells.len(),
                "Harvest complete with empty fallback cells"
            );
        }

        Ok(HarvestReport {
            document,
            failed_cells,
        })
    }
}
