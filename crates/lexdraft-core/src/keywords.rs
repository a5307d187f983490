//! Required-keyword registry used by clause coverage scoring.
//!
//! Loaded once from a JSON object mapping contract category to the keywords a
//! complete contract of that category must mention:
//!
//! ```json
//! { "Non-Disclosure Agreement": ["confidential", "disclosure", "term"] }
//! ```
//!
//! The registry is read-only after construction.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::info;

use crate::ConfigError;

/// Contract category → required keywords.
#[derive(Debug, Clone, Default)]
pub struct KeywordRegistry {
    entries: BTreeMap<String, Vec<String>>,
}

impl KeywordRegistry {
    pub fn new(entries: BTreeMap<String, Vec<String>>) -> Self {
        Self { entries }
    }

    /// Parse a registry from a JSON object string.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let entries: BTreeMap<String, Vec<String>> = serde_json::from_str(json)?;
        Ok(Self::new(entries))
    }

    /// Load a registry from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let registry = Self::from_json_str(&json)?;
        info!(
            categories = registry.len(),
            path = %path.display(),
            "loaded keyword registry"
        );
        Ok(registry)
    }

    /// Required keywords for a category.
    ///
    /// Exact match first, then a case-insensitive match on the category name.
    pub fn required(&self, category: &str) -> Result<&[String], ConfigError> {
        let category = category.trim();
        if let Some(keywords) = self.entries.get(category) {
            return Ok(keywords);
        }
        self.entries
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(category))
            .map(|(_, keywords)| keywords.as_slice())
            .ok_or_else(|| ConfigError::UnknownCategory(category.to_string()))
    }

    /// Category names in sorted order.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Short category names offered to users, with the full contract type they stand for.
pub const CATEGORY_ALIASES: &[(&str, &str)] = &[
    ("NDA", "Non-Disclosure Agreement"),
    ("MSA", "Master Services Agreement"),
    ("Employment", "Employment Agreement"),
    ("Sponsorship", "Sponsorship Agreement"),
];

/// Expand a short category alias (`NDA`) to its contract type.
///
/// Unknown names are returned trimmed and unchanged, so full contract types
/// pass straight through.
pub fn expand_category(name: &str) -> String {
    let name = name.trim();
    CATEGORY_ALIASES
        .iter()
        .find(|(alias, _)| alias.eq_ignore_ascii_case(name))
        .map(|(_, full)| full.to_string())
        .unwrap_or_else(|| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "NDA": ["confidential", "disclosure"],
        "Employment Agreement": ["salary", "termination", "probation"],
        "Empty": []
    }"#;

    #[test]
    fn parse_and_lookup() {
        let reg = KeywordRegistry::from_json_str(SAMPLE).unwrap();
        assert_eq!(reg.len(), 3);
        assert_eq!(reg.required("NDA").unwrap(), ["confidential", "disclosure"]);
        assert!(reg.required("Empty").unwrap().is_empty());
    }

    #[test]
    fn lookup_is_case_insensitive_fallback() {
        let reg = KeywordRegistry::from_json_str(SAMPLE).unwrap();
        assert_eq!(reg.required("employment agreement").unwrap().len(), 3);
        assert_eq!(reg.required("  nda ").unwrap().len(), 2);
    }

    #[test]
    fn unknown_category_is_config_error() {
        let reg = KeywordRegistry::from_json_str(SAMPLE).unwrap();
        let err = reg.required("Lease").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownCategory(ref c) if c == "Lease"));
    }

    #[test]
    fn invalid_json_rejected() {
        let err = KeywordRegistry::from_json_str(r#"{"NDA": "confidential"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let reg = KeywordRegistry::from_json_file(file.path()).unwrap();
        let cats: Vec<&str> = reg.categories().collect();
        assert_eq!(cats, ["Employment Agreement", "Empty", "NDA"]);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = KeywordRegistry::from_json_file(Path::new("/nonexistent/keywords.json"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn expand_aliases() {
        assert_eq!(expand_category("nda"), "Non-Disclosure Agreement");
        assert_eq!(expand_category("MSA"), "Master Services Agreement");
        assert_eq!(expand_category(" Lease Agreement "), "Lease Agreement");
    }
}
