//! Extension classification.
//!
//! Filenames map to a handling category through an explicit extension table.
//! The table ships with defaults covering the ZIP family, common image
//! formats, and structured text, and can be replaced wholesale from
//! configuration.

use serde::Deserialize;

use crate::models::FileCategory;

/// Extension lists mapping file extensions to handling categories.
///
/// Extensions are matched lowercased and without the leading dot. Anything
/// not listed classifies as binary.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Categories {
    pub archive: Vec<String>,
    pub image: Vec<String>,
    pub text: Vec<String>,
}

impl Default for Categories {
    fn default() -> Self {
        Self {
            archive: vec![
                "zip".to_string(),
                "cbz".to_string(),
                "epub".to_string(),
                "docx".to_string(),
                "xlsx".to_string(),
                "pptx".to_string(),
                "odt".to_string(),
                "ods".to_string(),
                "odp".to_string(),
                "apk".to_string(),
                "jar".to_string(),
                "charx".to_string(),
            ],
            image: vec![
                "png".to_string(),
                "jpg".to_string(),
                "jpeg".to_string(),
                "gif".to_string(),
                "webp".to_string(),
                "bmp".to_string(),
            ],
            text: vec![
                "json".to_string(),
                "txt".to_string(),
                "xml".to_string(),
                "html".to_string(),
                "css".to_string(),
                "js".to_string(),
                "md".to_string(),
                "yaml".to_string(),
                "yml".to_string(),
            ],
        }
    }
}

impl Categories {
    /// Looks up the category for an already-lowercased extension.
    pub fn category_for(&self, ext: &str) -> FileCategory {
        if self.archive.iter().any(|e| e == ext) {
            FileCategory::Archive
        } else if self.image.iter().any(|e| e == ext) {
            FileCategory::Image
        } else if self.text.iter().any(|e| e == ext) {
            FileCategory::Text
        } else {
            FileCategory::Binary
        }
    }

    /// Lowercases every configured extension in place.
    pub fn normalize(&mut self) {
        for list in [&mut self.archive, &mut self.image, &mut self.text] {
            for ext in list.iter_mut() {
                *ext = ext.to_lowercase();
            }
        }
    }

    /// Returns an extension listed under more than one category, if any.
    pub fn first_duplicate(&self) -> Option<&str> {
        let mut seen = std::collections::HashSet::new();
        for ext in self
            .archive
            .iter()
            .chain(self.image.iter())
            .chain(self.text.iter())
        {
            if !seen.insert(ext.as_str()) {
                return Some(ext);
            }
        }
        None
    }
}

/// Extracts the lowercased extension from a filename.
///
/// The extension is the substring after the last dot, provided that dot
/// falls after the last path separator. Dotted directory names do not count,
/// and a name without a dot yields the empty string.
pub fn extension_of(name: &str) -> String {
    let base = match name.rfind(['/', '\\']) {
        Some(i) => &name[i + 1..],
        None => name,
    };
    match base.rfind('.') {
        Some(i) => base[i + 1..].to_lowercase(),
        None => String::new(),
    }
}

/// Guesses a mime type from a lowercased extension.
///
/// Covers the formats the extractor itself understands; callers fall back
/// to `application/octet-stream` for anything else.
pub fn mime_for(ext: &str) -> Option<&'static str> {
    let mime = match ext {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "json" => "application/json",
        "txt" | "md" => "text/plain",
        "xml" => "application/xml",
        "html" => "text/html",
        "css" => "text/css",
        "js" => "text/javascript",
        "csv" => "text/csv",
        "yaml" | "yml" => "application/yaml",
        "zip" | "cbz" | "charx" => "application/zip",
        "epub" => "application/epub+zip",
        "jar" => "application/java-archive",
        "apk" => "application/vnd.android.package-archive",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        _ => return None,
    };
    Some(mime)
}
