use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::classify::Categories;

/// Extraction settings. Every section is optional in the file; omitted
/// sections fall back to the built-in defaults.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub categories: Categories,
    pub limits: Limits,
}

/// Resource caps applied while walking archives.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Limits {
    /// Maximum decompressed bytes read from a single archive entry.
    /// Entries over the cap are reported without content.
    pub max_entry_bytes: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_entry_bytes: 50 * 1024 * 1024,
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config: Config =
        toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    config.categories.normalize();

    if config.limits.max_entry_bytes == 0 {
        anyhow::bail!("limits.max_entry_bytes must be > 0");
    }

    if let Some(ext) = config.categories.first_duplicate() {
        anyhow::bail!(
            "extension '{}' appears in more than one category list",
            ext
        );
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_sections_are_omitted() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.limits.max_entry_bytes, 50 * 1024 * 1024);
        assert!(config.categories.archive.iter().any(|e| e == "charx"));
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let config: Config = toml::from_str(
            r#"
[limits]
max_entry_bytes = 4096
"#,
        )
        .unwrap();
        assert_eq!(config.limits.max_entry_bytes, 4096);
        assert!(config.categories.text.iter().any(|e| e == "json"));
    }

    #[test]
    fn load_rejects_zero_entry_cap() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("extract.toml");
        std::fs::write(&path, "[limits]\nmax_entry_bytes = 0\n").unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("max_entry_bytes"));
    }

    #[test]
    fn load_rejects_duplicate_category_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("extract.toml");
        std::fs::write(
            &path,
            r#"
[categories]
archive = ["zip"]
image = ["png"]
text = ["zip"]
"#,
        )
        .unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("'zip'"));
    }

    #[test]
    fn load_lowercases_configured_extensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("extract.toml");
        std::fs::write(
            &path,
            r#"
[categories]
archive = ["ZIP"]
image = []
text = []
"#,
        )
        .unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.categories.archive, vec!["zip".to_string()]);
    }
}
