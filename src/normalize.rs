//! Raw OpenAlex work → canonical [`Article`].
//!
//! Normalization never fails: every optional field has a default, and a
//! malformed entry in a list field only drops that entry.

use crate::abstracts::{reconstruct_abstract, truncate_abstract};
use crate::models::Article;
use crate::openalex::RawWork;

/// Title used when a work has no display name.
pub const NO_TITLE: &str = "No Title";

/// Maximum keywords kept per article.
pub const MAX_KEYWORDS: usize = 5;

/// Normalize one upstream work record.
pub fn normalize_work(work: RawWork) -> Article {
    let title = work.display_name.unwrap_or_else(|| NO_TITLE.to_string());

    // Authors (entries without a nested author are skipped)
    let authors = work
        .authorships
        .unwrap_or_default()
        .into_iter()
        .filter_map(|a| a.author)
        .filter_map(|a| a.display_name)
        .collect();

    let abstract_text = truncate_abstract(reconstruct_abstract(work.abstract_inverted_index.as_ref()));

    // DOI preferred, then the work's own OpenAlex ID
    let url = work
        .doi
        .filter(|d| !d.is_empty())
        .or(work.id.filter(|id| !id.is_empty()));

    let keywords = work
        .concepts
        .unwrap_or_default()
        .into_iter()
        .filter_map(|c| c.display_name)
        .take(MAX_KEYWORDS)
        .collect();

    Article {
        title,
        authors,
        abstract_text,
        pub_year: work.publication_year,
        url,
        keywords,
    }
}
