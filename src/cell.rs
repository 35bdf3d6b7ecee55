//! Per-cell fetch protocol.
//!
//! A cell is one (topic, year) unit of the harvest grid. Fetching a cell
//! always yields a well-formed [`YearCell`]: upstream failures are folded
//! into a zero-count fallback and reported through [`CellOutcome`].

use crate::error::{HarvestError, Result};
use crate::models::YearCell;
use crate::normalize::normalize_work;
use crate::openalex::{WorksSource, TOP_N};
use tracing::{debug, error, warn};

/// Result of fetching one cell.
#[derive(Debug)]
pub enum CellOutcome {
    /// Both upstream queries succeeded
    Fetched(YearCell),
    /// Upstream retrieval failed; `cell` is the zero-count fallback
    Fallback { cell: YearCell, error: HarvestError },
}

impl CellOutcome {
    pub fn cell(&self) -> &YearCell {
        match self {
            Self::Fetched(cell) | Self::Fallback { cell, .. } => cell,
        }
    }

    pub fn into_cell(self) -> YearCell {
        match self {
            Self::Fetched(cell) | Self::Fallback { cell, .. } => cell,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }

    pub fn error(&self) -> Option<&HarvestError> {
        match self {
            Self::Fetched(_) => None,
            Self::Fallback { error, .. } => Some(error),
        }
    }
}

/// Fetch count and top-cited sample for one (topic, year) cell.
///
/// No retry is attempted; a failed cell becomes a fallback and the caller
/// moves on.
pub async fn fetch_cell<S: WorksSource + ?Sized>(source: &S, topic: &str, year: i32) -> CellOutcome {
    match try_fetch_cell(source, topic, year).await {
        Ok(cell) => {
            debug!(
                topic = topic,
                year = year,
                count = cell.count,
                sampled = cell.top_articles.len(),
                "Cell fetched"
            );
            CellOutcome::Fetched(cell)
        }
        Err(e) => {
            if e.is_cell_recoverable() {
                warn!(topic = topic, year = year, error = %e, "Cell fetch failed, recording empty cell");
            } else {
                error!(topic = topic, year = year, error = %e, "Unexpected cell error, recording empty cell");
            }
            CellOutcome::Fallback {
                cell: YearCell::fallback(year),
                error: e,
            }
        }
    }
}

async fn try_fetch_cell<S: WorksSource + ?Sized>(source: &S, topic: &str, year: i32) -> Result<YearCell> {
    let count = source.count_works(topic, year).await?;
    let works = source.top_cited_works(topic, year, TOP_N).await?;

    // Upstream order is citation-descending; keep it as returned
    let top_articles = works.into_iter().take(TOP_N).map(normalize_work).collect();

    Ok(YearCell {
        year,
        count,
        top_articles,
    })
}
