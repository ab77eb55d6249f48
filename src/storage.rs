//! On-disk persistence for the annotation table and history log.
//!
//! # File layout
//!
//! Next to the configured annotation path:
//! - `<name>.json` — the annotation table, a versioned JSON container. This
//!   is the primary form and the only file ever read back.
//! - `<name>.csv` — a plain delimited-text export of the same table,
//!   regenerated on every save, write-only.
//! - `history.json` — the full history log, rewritten on every append.
//!
//! All files are replaced via write-to-temp + rename so a crash mid-write
//! never leaves a truncated file behind.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::history::HistoryEntry;
use crate::model::AnnotationRecord;

/// Current annotation table file format version.
pub const TABLE_VERSION: u32 = 1;

/// File name of the history log, stored next to the annotation table.
pub const HISTORY_FILE_NAME: &str = "history.json";

/// Errors that can occur during persistence operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// I/O error during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Versioned on-disk container for the annotation table.
#[derive(Debug, Serialize, Deserialize)]
struct TableFile {
    version: u32,
    records: Vec<AnnotationRecord>,
}

/// Versioned on-disk container for the history log.
#[derive(Debug, Serialize, Deserialize)]
struct HistoryFile {
    version: u32,
    entries: Vec<HistoryEntry>,
}

/// Save the annotation table: the JSON primary form plus the CSV export.
pub fn save_table(path: &Path, records: &[AnnotationRecord]) -> Result<(), StorageError> {
    let file = TableFile {
        version: TABLE_VERSION,
        records: records.to_vec(),
    };
    let json = serde_json::to_string_pretty(&file)?;
    write_atomic(path, &json)?;

    let csv = render_csv(records);
    write_atomic(&csv_path(path), &csv)?;

    log::trace!("saved {} records to {:?}", records.len(), path);
    Ok(())
}

/// Load the annotation table from its JSON form.
pub fn load_table(path: &Path) -> Result<Vec<AnnotationRecord>, StorageError> {
    let json = fs::read_to_string(path)?;
    let file: TableFile = serde_json::from_str(&json)?;

    // Version check for future compatibility
    if file.version != TABLE_VERSION {
        log::warn!(
            "annotation table version mismatch: expected {}, got {}",
            TABLE_VERSION,
            file.version
        );
    }
    Ok(file.records)
}

/// Rewrite the full history log.
pub fn save_history(path: &Path, entries: &[HistoryEntry]) -> Result<(), StorageError> {
    let file = HistoryFile {
        version: TABLE_VERSION,
        entries: entries.to_vec(),
    };
    let json = serde_json::to_string_pretty(&file)?;
    write_atomic(path, &json)
}

/// Load a previously persisted history log.
pub fn load_history(path: &Path) -> Result<Vec<HistoryEntry>, StorageError> {
    let json = fs::read_to_string(path)?;
    let file: HistoryFile = serde_json::from_str(&json)?;
    Ok(file.entries)
}

/// Path of the CSV export next to the annotation table.
pub fn csv_path(table_path: &Path) -> PathBuf {
    table_path.with_extension("csv")
}

/// Path of the history log next to the annotation table.
pub fn history_path(table_path: &Path) -> PathBuf {
    match table_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join(HISTORY_FILE_NAME),
        _ => PathBuf::from(HISTORY_FILE_NAME),
    }
}

/// Write to a temporary file first, then rename it over the target path.
fn write_atomic(path: &Path, contents: &str) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, contents)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Column order of the CSV export.
const CSV_HEADER: &[&str] = &[
    "video_id",
    "frame_id",
    "frame_id_int",
    "comment",
    "seen",
    "difficult",
    "out_of_body",
    "post_view",
    "anatomical_variation",
    "roi_not_seen",
    "artifact",
    "roi_visible_partially",
    "instr_in_roi",
    "cvs_cri_1",
    "cvs_cri_2",
    "cvs_cri_3",
];

fn render_csv(records: &[AnnotationRecord]) -> String {
    let mut out = String::new();
    out.push_str(&CSV_HEADER.join(","));
    out.push('\n');
    for r in records {
        let fields = [
            csv_field(&r.video_id),
            csv_field(&r.frame_id),
            r.frame_id_int.to_string(),
            csv_field(&r.comment),
            (r.seen as u8).to_string(),
            (r.difficult as u8).to_string(),
            (r.out_of_body as u8).to_string(),
            (r.post_view as u8).to_string(),
            (r.anatomical_variation as u8).to_string(),
            (r.roi_not_seen as u8).to_string(),
            (r.artifact as u8).to_string(),
            (r.roi_visible_partially as u8).to_string(),
            (r.instr_in_roi as u8).to_string(),
            (r.cvs_cri_1 as u8).to_string(),
            (r.cvs_cri_2 as u8).to_string(),
            (r.cvs_cri_3 as u8).to_string(),
        ];
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    out
}

/// Quote a free-text field if it contains a delimiter, quote, or newline.
fn csv_field(value: &str) -> String {
    if value
        .chars()
        .any(|c| matches!(c, ',' | '"' | '\n' | '\r'))
    {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
