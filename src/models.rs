//! Canonical output model.
//!
//! Field names follow the published document shape:
//! `topic → { yearly_stats: [ { year, count, top_articles: [ Article ] } ] }`.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// One sampled work, normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    /// Author display names in upstream order
    #[serde(rename = "author")]
    pub authors: Vec<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub pub_year: Option<i32>,
    pub url: Option<String>,
    pub keywords: Vec<String>,
}

/// Count and top-cited sample for one (topic, year) cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearCell {
    pub year: i32,
    pub count: u64,
    pub top_articles: Vec<Article>,
}

impl YearCell {
    /// Zero-count, empty-sample cell recorded when upstream retrieval fails.
    pub fn fallback(year: i32) -> Self {
        Self {
            year,
            count: 0,
            top_articles: Vec::new(),
        }
    }
}

/// Per-topic record: one cell per configured year, in range order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicRecord {
    pub yearly_stats: Vec<YearCell>,
}

/// The harvested document, keyed by topic.
///
/// Topics keep their insertion order, which is the configured order, both in
/// memory and on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    topics: Vec<(String, TopicRecord)>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start an empty record for `topic`, keeping any existing one.
    pub fn add_topic(&mut self, topic: &str) -> &mut TopicRecord {
        let idx = match self.position(topic) {
            Some(idx) => idx,
            None => {
                self.topics.push((topic.to_string(), TopicRecord::default()));
                self.topics.len() - 1
            }
        };
        &mut self.topics[idx].1
    }

    /// Append a cell to `topic`, creating the topic record if needed.
    pub fn push_cell(&mut self, topic: &str, cell: YearCell) {
        self.add_topic(topic).yearly_stats.push(cell);
    }

    pub fn get(&self, topic: &str) -> Option<&TopicRecord> {
        self.position(topic).map(|idx| &self.topics[idx].1)
    }

    pub fn topics(&self) -> impl Iterator<Item = (&str, &TopicRecord)> {
        self.topics.iter().map(|(t, r)| (t.as_str(), r))
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    /// Total number of cells across all topics.
    pub fn cell_count(&self) -> usize {
        self.topics.iter().map(|(_, r)| r.yearly_stats.len()).sum()
    }

    /// Cells whose count is zero: either genuinely empty or a fallback.
    pub fn zero_count_cells(&self) -> Vec<(&str, i32)> {
        self.topics()
            .flat_map(|(topic, record)| {
                record
                    .yearly_stats
                    .iter()
                    .filter(|c| c.count == 0)
                    .map(move |c| (topic, c.year))
            })
            .collect()
    }

    /// Grid positions that do not hold exactly one cell.
    ///
    /// Returns `(topic, year, cells_found)` for every missing or duplicated
    /// position, plus any topic present that was not requested.
    pub fn grid_mismatches(&self, topics: &[String], years: &[i32]) -> Vec<(String, i32, usize)> {
        let mut mismatches = Vec::new();
        for topic in topics {
            let cells = self.get(topic).map(|r| r.yearly_stats.as_slice()).unwrap_or_default();
            for year in years {
                let found = cells.iter().filter(|c| c.year == *year).count();
                if found != 1 {
                    mismatches.push((topic.clone(), *year, found));
                }
            }
            let stray = cells.iter().filter(|c| !years.contains(&c.year));
            mismatches.extend(stray.map(|c| (topic.clone(), c.year, 1)));
        }
        for (topic, record) in self.topics() {
            if !topics.iter().any(|t| t == topic) {
                mismatches.extend(record.yearly_stats.iter().map(|c| (topic.to_string(), c.year, 1)));
            }
        }
        mismatches
    }

    fn position(&self, topic: &str) -> Option<usize> {
        self.topics.iter().position(|(t, _)| t == topic)
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.topics.len()))?;
        for (topic, record) in &self.topics {
            map.serialize_entry(topic, record)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DocumentVisitor;

        impl<'de> Visitor<'de> for DocumentVisitor {
            type Value = Document;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of topic to yearly stats")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Document, A::Error> {
                let mut topics = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((topic, record)) = access.next_entry::<String, TopicRecord>()? {
                    topics.push((topic, record));
                }
                Ok(Document { topics })
            }
        }

        deserializer.deserialize_map(DocumentVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn article() -> Article {
        Article {
            title: "Paper A".into(),
            authors: vec!["Ada".into()],
            abstract_text: "world hello".into(),
            pub_year: Some(2021),
            url: Some("https://x/1".into()),
            keywords: vec!["Ledger".into()],
        }
    }

    #[test]
    fn test_article_wire_names() -> serde_json::Result<()> {
        let value = serde_json::to_value(article())?;
        assert_eq!(
            value,
            json!({
                "title": "Paper A",
                "author": ["Ada"],
                "abstract": "world hello",
                "pub_year": 2021,
                "url": "https://x/1",
                "keywords": ["Ledger"]
            })
        );
        Ok(())
    }

    #[test]
    fn test_absent_year_and_url_serialize_as_null() -> serde_json::Result<()> {
        let mut a = article();
        a.pub_year = None;
        a.url = None;
        let value = serde_json::to_value(a)?;
        assert!(value["pub_year"].is_null());
        assert!(value["url"].is_null());
        Ok(())
    }

    #[test]
    fn test_document_preserves_topic_order() -> serde_json::Result<()> {
        let mut doc = Document::new();
        for topic in ["Smart contract", "Blockchain", "Tokenization"] {
            doc.add_topic(topic);
        }
        doc.push_cell("Blockchain", YearCell::fallback(2020));

        let text = serde_json::to_string(&doc)?;
        let smart = text.find("Smart contract").unwrap_or(usize::MAX);
        let block = text.find("Blockchain").unwrap_or(usize::MAX);
        let token = text.find("Tokenization").unwrap_or(usize::MAX);
        assert!(smart < block && block < token, "{text}");

        let back: Document = serde_json::from_str(&text)?;
        let order: Vec<&str> = back.topics().map(|(t, _)| t).collect();
        assert_eq!(order, ["Smart contract", "Blockchain", "Tokenization"]);
        assert_eq!(back, doc);
        Ok(())
    }

    #[test]
    fn test_add_topic_is_idempotent() {
        let mut doc = Document::new();
        doc.push_cell("Blockchain", YearCell::fallback(2020));
        doc.add_topic("Blockchain");
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.cell_count(), 1);
    }

    #[test]
    fn test_zero_count_cells() {
        let mut doc = Document::new();
        doc.push_cell("Blockchain", YearCell::fallback(2020));
        doc.push_cell(
            "Blockchain",
            YearCell {
                year: 2021,
                count: 42,
                top_articles: vec![article()],
            },
        );
        doc.push_cell("Tokenization", YearCell::fallback(2021));
        assert_eq!(
            doc.zero_count_cells(),
            vec![("Blockchain", 2020), ("Tokenization", 2021)]
        );
    }

    #[test]
    fn test_grid_mismatches() {
        let topics = vec!["Blockchain".to_string(), "Tokenization".to_string()];
        let years = [2020, 2021];

        let mut doc = Document::new();
        for topic in &topics {
            for year in years {
                doc.push_cell(topic, YearCell::fallback(year));
            }
        }
        assert!(doc.grid_mismatches(&topics, &years).is_empty());

        doc.push_cell("Blockchain", YearCell::fallback(2021));
        doc.push_cell("Stray", YearCell::fallback(2020));
        let mismatches = doc.grid_mismatches(&topics, &years);
        assert!(mismatches.contains(&("Blockchain".to_string(), 2021, 2)));
        assert!(mismatches.contains(&("Stray".to_string(), 2020, 1)));

        let partial = Document::new();
        assert_eq!(partial.grid_mismatches(&topics, &years).len(), 4);
    }
}
