//! Batch extraction over a set of input files.
//!
//! Each file is processed independently: scan failures, unreadable
//! containers, and parse misses are recorded on that file's result and the
//! batch moves on. The only way to stop a run early is the cancellation
//! flag, checked between files.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{SecondsFormat, Utc};
use tracing::{debug, warn};

use crate::archive;
use crate::classify::extension_of;
use crate::config::Config;
use crate::content;
use crate::models::{
    format_size, ExtractedFile, ExtractionMode, ExtractionResult, FileCategory, InputFile,
};
use crate::png;

const CARD_DETECTED: &str = "[PNG Image - Character Card Detected]";
const NO_EMBEDDED_DATA: &str = "[PNG Image - No embedded data found]";

/// Archive type reported for images carrying an embedded character record.
const CHARACTER_CARD: &str = "character_card";

/// Runs extraction over `files` in order and stamps the result envelope.
///
/// The cancellation flag is checked before each file; once set, remaining
/// files are skipped and the envelope covers only the processed prefix.
pub fn extract_batch(
    files: &[InputFile],
    mode: ExtractionMode,
    config: &Config,
    cancel: &AtomicBool,
) -> ExtractionResult {
    let mut records = Vec::with_capacity(files.len());
    for file in files {
        if cancel.load(Ordering::Relaxed) {
            debug!(
                "extraction cancelled after {} of {} files",
                records.len(),
                files.len()
            );
            break;
        }
        records.push(extract_one(file, mode, config));
    }
    ExtractionResult {
        extracted_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        total_files: records.len(),
        extraction_mode: mode,
        files: records,
    }
}

/// Extracts a single file. Never fails: problems are recorded on the
/// returned record's `error` field instead.
pub fn extract_one(file: &InputFile, mode: ExtractionMode, config: &Config) -> ExtractedFile {
    debug!("extracting {} ({} bytes)", file.name, file.size);
    let mut record = base_record(file);

    // PNG inputs are scanned for an embedded character record in every mode.
    if record.extension == "png" {
        let scan = png::scan_png(&file.bytes);
        match scan.embedded {
            Some(data) => {
                record.content = Some(CARD_DETECTED.to_string());
                record.content_parsed = Some(data);
                record.is_archive = Some(true);
                record.archive_type = Some(CHARACTER_CARD.to_string());
            }
            None => record.content = Some(NO_EMBEDDED_DATA.to_string()),
        }
        return record;
    }

    if config.categories.category_for(&record.extension) == FileCategory::Archive {
        extract_container(&mut record, file, mode, config);
        return record;
    }

    if mode == ExtractionMode::Full {
        let text = String::from_utf8_lossy(&file.bytes).into_owned();
        record.content_parsed = content::parse_content(&text, &record.extension);
        record.content = Some(text);
    }
    record
}

fn extract_container(
    record: &mut ExtractedFile,
    file: &InputFile,
    mode: ExtractionMode,
    config: &Config,
) {
    let character = record.extension == "charx" && mode == ExtractionMode::Full;
    let walked = if character {
        archive::walk_charx(&file.bytes, config)
    } else {
        archive::walk_archive(&file.bytes, mode, config)
    };

    match walked {
        Ok(walk) => {
            record.is_archive = Some(true);
            record.archive_type = Some(record.extension.clone());
            record.total_files = Some(walk.file_list.len());
            record.file_list = Some(walk.file_list);
            record.contents = Some(walk.entries);
            if let Some(summary) = walk.charx {
                record.content_parsed = serde_json::to_value(&summary).ok();
            }
        }
        Err(err) => {
            warn!("container walk failed for {}: {}", file.name, err);
            let prefix = if character {
                "Failed to extract charx: "
            } else if mode == ExtractionMode::MetadataOnly {
                "Failed to read metadata: "
            } else {
                "Failed to extract: "
            };
            record.error = Some(format!("{}{}", prefix, err));
            record.is_archive = Some(false);
        }
    }
}

fn base_record(file: &InputFile) -> ExtractedFile {
    ExtractedFile {
        extension: extension_of(&file.name),
        filename: file.name.clone(),
        size: file.size,
        size_formatted: format_size(file.size),
        last_modified: file
            .last_modified
            .to_rfc3339_opts(SecondsFormat::Millis, true),
        mime_type: file
            .mime_type
            .clone()
            .unwrap_or_else(|| "application/octet-stream".to_string()),
        content: None,
        content_parsed: None,
        is_archive: None,
        archive_type: None,
        total_files: None,
        file_list: None,
        contents: None,
        error: None,
    }
}
