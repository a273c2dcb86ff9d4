//! Output contract for extraction runs.
//!
//! These types serialize to the JSON shape consumed by rendering, export,
//! and search collaborators: camelCase keys, optional fields omitted when
//! absent, and archive entries keyed by path in container order.

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

/// How much of each file to extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMode {
    /// Decode entry contents and parse recognized text formats.
    Full,
    /// Report classification and declared sizes without decoding payloads.
    MetadataOnly,
}

/// Category assigned to a filename by the extension table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Text,
    Image,
    Archive,
    Binary,
}

/// One file submitted for extraction.
#[derive(Debug, Clone)]
pub struct InputFile {
    pub name: String,
    pub bytes: Vec<u8>,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
    /// Declared mime type, if the provider knows one.
    pub mime_type: Option<String>,
}

impl InputFile {
    /// Builds an input from a name and raw bytes, sizing from the buffer.
    pub fn new(name: &str, bytes: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            size: bytes.len() as u64,
            bytes,
            last_modified: Utc::now(),
            mime_type: None,
        }
    }
}

/// One entry inside an archive. Serialized as the value of the parent's
/// `contents` map; the path is the map key and is not repeated here.
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveEntry {
    #[serde(skip)]
    pub path: String,
    #[serde(rename = "type")]
    pub category: FileCategory,
    pub extension: String,
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parsed: Option<Value>,
}

/// A regex post-processing script collected from a character archive.
#[derive(Debug, Clone, Serialize)]
pub struct RegexScriptRef {
    pub filename: String,
    pub data: Value,
}

/// An asset reference inside a character archive (name and kind only).
#[derive(Debug, Clone, Serialize)]
pub struct AssetRef {
    pub filename: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Structured summary of a character archive.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CharxSummary {
    /// Parsed canonical record; `Value::Null` when `card.json` is missing
    /// or unparseable.
    pub character_data: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regex_scripts: Option<Vec<RegexScriptRef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assets: Option<Vec<AssetRef>>,
}

/// One input file's extraction outcome.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedFile {
    pub filename: String,
    pub extension: String,
    pub size: u64,
    pub size_formatted: String,
    /// Modification time in ISO-8601 millisecond form.
    pub last_modified: String,
    pub mime_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_parsed: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_archive: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_files: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_list: Option<Vec<String>>,
    /// Entries in container order, serialized as a path-keyed map.
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_entry_map"
    )]
    pub contents: Option<Vec<ArchiveEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn serialize_entry_map<S>(
    entries: &Option<Vec<ArchiveEntry>>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match entries {
        Some(list) => {
            let mut map = serializer.serialize_map(Some(list.len()))?;
            for entry in list {
                map.serialize_entry(&entry.path, entry)?;
            }
            map.end()
        }
        None => serializer.serialize_none(),
    }
}

/// Batch envelope returned from an extraction run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    /// Completion time in ISO-8601 millisecond form.
    pub extracted_at: String,
    pub total_files: usize,
    pub extraction_mode: ExtractionMode,
    pub files: Vec<ExtractedFile>,
}

/// Formats a byte count using powers of 1024, trimming trailing zeros.
/// The unit never exceeds gigabytes.
pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    // Unit boundaries are exact powers of two, so the integer log is exact
    // where float log division can land just under a boundary.
    let i = ((bytes.ilog2() / 10) as usize).min(UNITS.len() - 1);
    let scaled = bytes as f64 / 1024_f64.powi(i as i32);
    let rounded = format!("{:.2}", scaled);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[i])
}
