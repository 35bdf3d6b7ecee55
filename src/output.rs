//! Document persistence.
//!
//! The document is written once, at the end of a run. It goes to a sibling
//! temp file first and is renamed into place, so the output path only ever
//! holds a complete document.

use crate::error::{HarvestError, Result};
use crate::models::Document;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Serialize a document as 4-space indented JSON, non-ASCII kept verbatim.
pub fn to_pretty_json(document: &Document) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    document.serialize(&mut ser)?;
    Ok(buf)
}

/// Check, before a run, that `path` can take the finished document.
pub fn check_output_path(path: &Path) -> Result<()> {
    if path.is_dir() {
        return Err(HarvestError::Config(format!(
            "output path {:?} is a directory",
            path
        )));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.is_dir() {
            return Err(HarvestError::Config(format!(
                "output directory {:?} does not exist",
                parent
            )));
        }
    }
    Ok(())
}

/// Write the finished document to `path`.
pub fn write_document(path: &Path, document: &Document) -> Result<()> {
    let content = to_pretty_json(document)?;
    let tmp = temp_path(path);

    if let Err(e) = fs::write(&tmp, &content).and_then(|_| fs::rename(&tmp, path)) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }

    info!(
        path = %path.display(),
        topics = document.len(),
        cells = document.cell_count(),
        "Saved document"
    );
    Ok(())
}

/// Load a previously harvested document.
pub fn read_document(path: &Path) -> Result<Document> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}
