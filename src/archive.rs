//! ZIP-family archive traversal.
//!
//! One walk serves every container format in the archive extension list.
//! Entries are classified through the extension table and, in full mode,
//! decoded according to their category. The character-archive variant layers
//! collection of the canonical card record, regex scripts, and asset
//! references on top of the same walk.

use std::io::{Cursor, Read};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::Value;
use tracing::{debug, warn};
use zip::ZipArchive;

use crate::classify::extension_of;
use crate::config::Config;
use crate::content;
use crate::error::Result;
use crate::models::{
    ArchiveEntry, AssetRef, CharxSummary, ExtractionMode, FileCategory, RegexScriptRef,
};

/// Placeholder recorded for entries whose bytes are not worth keeping.
const BINARY_PLACEHOLDER: &str = "[Binary file - not extracted]";
/// Placeholder recorded for entries over the decode cap.
const OVERSIZED_PLACEHOLDER: &str = "[File too large - not extracted]";

/// Number of leading characters inspected by the binary sniff.
const SNIFF_CHARS: usize = 1000;

/// Everything recovered from one container.
#[derive(Debug, Clone)]
pub struct ArchiveWalk {
    /// Entry paths in container order, directories excluded.
    pub file_list: Vec<String>,
    /// Per-entry records in the same order as `file_list`.
    pub entries: Vec<ArchiveEntry>,
    /// Character summary, present only for the character-archive variant.
    pub charx: Option<CharxSummary>,
}

/// Walks a ZIP-family container, classifying every non-directory entry and
/// decoding contents when `mode` is [`ExtractionMode::Full`].
///
/// Fails only when the container itself cannot be opened or enumerated;
/// unreadable entry data degrades to a placeholder record instead.
pub fn walk_archive(bytes: &[u8], mode: ExtractionMode, config: &Config) -> Result<ArchiveWalk> {
    walk(bytes, mode, config, false)
}

/// Walks a character archive: the generic full-mode walk plus collection of
/// the canonical `card.json` record, regex scripts, and asset references.
pub fn walk_charx(bytes: &[u8], config: &Config) -> Result<ArchiveWalk> {
    walk(bytes, ExtractionMode::Full, config, true)
}

fn walk(
    bytes: &[u8],
    mode: ExtractionMode,
    config: &Config,
    character: bool,
) -> Result<ArchiveWalk> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    debug!("container has {} entries", archive.len());

    let mut file_list = Vec::new();
    let mut entries = Vec::new();
    let mut collector = character.then(CharxCollector::default);

    for index in 0..archive.len() {
        if mode == ExtractionMode::MetadataOnly {
            let entry = archive.by_index_raw(index)?;
            if entry.is_dir() {
                continue;
            }
            let path = entry.name().to_string();
            let ext = extension_of(&path);
            file_list.push(path.clone());
            entries.push(ArchiveEntry {
                category: config.categories.category_for(&ext),
                extension: ext,
                size: entry.size(),
                path,
                content: None,
                parsed: None,
            });
            continue;
        }

        let mut entry = archive.by_index(index)?;
        if entry.is_dir() {
            continue;
        }
        let path = entry.name().to_string();
        let declared_size = entry.size();
        let ext = extension_of(&path);
        let category = config.categories.category_for(&ext);
        file_list.push(path.clone());

        let record = if category == FileCategory::Archive {
            // Nested containers are recorded but never decoded or recursed.
            ArchiveEntry {
                path,
                category,
                extension: ext,
                size: declared_size,
                content: None,
                parsed: None,
            }
        } else if declared_size > config.limits.max_entry_bytes {
            warn!(
                "entry {} declares {} bytes, over the {} byte cap",
                path, declared_size, config.limits.max_entry_bytes
            );
            binary_record(path, ext, OVERSIZED_PLACEHOLDER)
        } else {
            match read_entry_data(&mut entry, config.limits.max_entry_bytes) {
                EntryData::Bytes(buf) => {
                    decoded_record(path, ext, category, buf, collector.as_mut())
                }
                EntryData::Oversized => {
                    warn!("entry {} exceeded the decode cap while inflating", path);
                    binary_record(path, ext, OVERSIZED_PLACEHOLDER)
                }
                EntryData::Unreadable => {
                    warn!("entry {} could not be read, recording placeholder", path);
                    binary_record(path, ext, BINARY_PLACEHOLDER)
                }
            }
        };
        entries.push(record);
    }

    let charx = collector.map(CharxCollector::into_summary);
    Ok(ArchiveWalk {
        file_list,
        entries,
        charx,
    })
}

enum EntryData {
    Bytes(Vec<u8>),
    Oversized,
    Unreadable,
}

/// Reads at most `max_bytes` of decompressed entry data. Entries that keep
/// producing bytes past the cap are reported as oversized rather than
/// buffered whole.
fn read_entry_data<R: Read>(reader: R, max_bytes: u64) -> EntryData {
    let mut buf = Vec::new();
    match reader.take(max_bytes.saturating_add(1)).read_to_end(&mut buf) {
        Ok(_) => {
            if buf.len() as u64 > max_bytes {
                EntryData::Oversized
            } else {
                EntryData::Bytes(buf)
            }
        }
        Err(_) => EntryData::Unreadable,
    }
}

fn decoded_record(
    path: String,
    ext: String,
    category: FileCategory,
    buf: Vec<u8>,
    mut collector: Option<&mut CharxCollector>,
) -> ArchiveEntry {
    if let Some(col) = collector.as_deref_mut() {
        if base_name(&path) == "card.json" {
            let text = String::from_utf8_lossy(&buf).into_owned();
            let parsed = content::parse_json(&text);
            col.character_data = parsed.clone();
            return ArchiveEntry {
                size: text.len() as u64,
                path,
                category: FileCategory::Text,
                extension: ext,
                content: Some(text),
                parsed,
            };
        }

        if path.contains("regex_scripts/") || path.contains("regex_scripts\\") {
            let text = String::from_utf8_lossy(&buf).into_owned();
            let parsed = content::parse_json(&text);
            if let Some(data) = parsed.clone() {
                col.scripts.push(RegexScriptRef {
                    filename: base_name(&path).to_string(),
                    data,
                });
            }
            return ArchiveEntry {
                size: text.len() as u64,
                path,
                category: FileCategory::Text,
                extension: ext,
                content: Some(text),
                parsed,
            };
        }
    }

    match category {
        FileCategory::Image => {
            let encoded = STANDARD.encode(&buf);
            if let Some(col) = collector.as_deref_mut() {
                col.assets.push(AssetRef {
                    filename: base_name(&path).to_string(),
                    kind: "image".to_string(),
                });
            }
            let mime = if ext == "jpg" { "jpeg" } else { ext.as_str() };
            let content = format!("data:image/{};base64,{}", mime, encoded);
            ArchiveEntry {
                size: encoded.len() as u64,
                path,
                category,
                extension: ext,
                content: Some(content),
                parsed: None,
            }
        }
        FileCategory::Text => {
            let text = String::from_utf8_lossy(&buf).into_owned();
            let parsed = if ext == "json" {
                content::parse_json(&text)
            } else {
                None
            };
            ArchiveEntry {
                size: text.len() as u64,
                path,
                category,
                extension: ext,
                content: Some(text),
                parsed,
            }
        }
        FileCategory::Binary | FileCategory::Archive => {
            sniffed_record(path, ext, buf, collector)
        }
    }
}

/// Entries with an unknown extension are decoded and sniffed: clean text is
/// kept (with an opportunistic JSON parse), anything else degrades to the
/// binary placeholder.
fn sniffed_record(
    path: String,
    ext: String,
    buf: Vec<u8>,
    collector: Option<&mut CharxCollector>,
) -> ArchiveEntry {
    let text = String::from_utf8_lossy(&buf);
    if text.is_empty() || looks_binary(&text) {
        return binary_record(path, ext, BINARY_PLACEHOLDER);
    }

    let text = text.into_owned();
    let parsed = content::parse_json(&text);
    if let (Some(col), Some(value)) = (collector, parsed.as_ref()) {
        if regex_script_shape(value).is_some() {
            col.scripts.push(RegexScriptRef {
                filename: base_name(&path).to_string(),
                data: value.clone(),
            });
        }
    }
    ArchiveEntry {
        size: text.len() as u64,
        path,
        category: FileCategory::Text,
        extension: ext,
        content: Some(text),
        parsed,
    }
}

fn binary_record(path: String, ext: String, placeholder: &str) -> ArchiveEntry {
    ArchiveEntry {
        path,
        category: FileCategory::Binary,
        extension: ext,
        size: 0,
        content: Some(placeholder.to_string()),
        parsed: None,
    }
}

/// Control characters outside the tab/newline family mark decoded text as
/// binary. Only the first [`SNIFF_CHARS`] characters are inspected.
fn looks_binary(text: &str) -> bool {
    text.chars()
        .take(SNIFF_CHARS)
        .any(|c| matches!(c, '\u{00}'..='\u{08}' | '\u{0E}'..='\u{1F}'))
}

/// Final path segment of an entry name.
fn base_name(path: &str) -> &str {
    match path.rfind(['/', '\\']) {
        Some(i) => &path[i + 1..],
        None => path,
    }
}

/// Closed set of shapes recognized as regex scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RegexScriptShape {
    /// `{"type": "regex", "data": [...]}`.
    Bundle,
    /// An object carrying both `in` and `out` keys.
    Rule,
    /// An object carrying `comment` and `in` keys.
    AnnotatedRule,
}

fn regex_script_shape(value: &Value) -> Option<RegexScriptShape> {
    let obj = value.as_object()?;
    if obj.get("type").and_then(Value::as_str) == Some("regex")
        && obj.get("data").map_or(false, Value::is_array)
    {
        return Some(RegexScriptShape::Bundle);
    }
    if obj.contains_key("in") && obj.contains_key("out") {
        return Some(RegexScriptShape::Rule);
    }
    if obj.contains_key("comment") && obj.contains_key("in") {
        return Some(RegexScriptShape::AnnotatedRule);
    }
    None
}

/// Gathers card data, regex scripts, and asset references while the entries
/// of a character archive are walked.
#[derive(Debug, Default)]
struct CharxCollector {
    character_data: Option<Value>,
    scripts: Vec<RegexScriptRef>,
    assets: Vec<AssetRef>,
}

/// Script sources embedded in a parsed card, checked in strict precedence
/// order. The first source yielding at least one script wins; the rest are
/// ignored even when also present.
const EMBEDDED_SCRIPT_SOURCES: [(&[&str], &str); 4] = [
    (&["data", "extensions", "regex_scripts"], "embedded_regex"),
    (&["data", "regex_scripts"], "data_regex"),
    (&["extensions", "regex_scripts"], "ext_regex"),
    (&["regex_scripts"], "card_regex"),
];

impl CharxCollector {
    fn into_summary(mut self) -> CharxSummary {
        if let Some(card) = &self.character_data {
            let embedded = embedded_regex_scripts(card);
            self.scripts.extend(embedded);
        }
        let CharxCollector {
            character_data,
            scripts,
            assets,
        } = self;
        CharxSummary {
            character_data: character_data.unwrap_or(Value::Null),
            regex_scripts: if scripts.is_empty() {
                None
            } else {
                Some(scripts)
            },
            assets: if assets.is_empty() { None } else { Some(assets) },
        }
    }
}

fn embedded_regex_scripts(card: &Value) -> Vec<RegexScriptRef> {
    for (path, prefix) in EMBEDDED_SCRIPT_SOURCES {
        let mut source = Some(card);
        for key in path {
            source = source.and_then(|v| v.get(*key));
        }
        if let Some(value) = source {
            let scripts = flatten_script_source(value, prefix);
            if !scripts.is_empty() {
                debug!("embedded regex scripts resolved from {}", path.join("."));
                return scripts;
            }
        }
    }
    Vec::new()
}

/// Flattens one embedded source: either a bare array of scripts or a bundle
/// object wrapping the array under `data`. Flattened entries are named
/// `<prefix>_<n>` counting from 1.
fn flatten_script_source(value: &Value, prefix: &str) -> Vec<RegexScriptRef> {
    let items = match value {
        Value::Array(items) => items.as_slice(),
        _ if regex_script_shape(value) == Some(RegexScriptShape::Bundle) => value
            .get("data")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[]),
        _ => &[],
    };
    items
        .iter()
        .enumerate()
        .map(|(i, item)| RegexScriptRef {
            filename: format!("{}_{}", prefix, i + 1),
            data: item.clone(),
        })
        .collect()
}
