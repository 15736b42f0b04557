//! Product vocabulary and trigger words
//!
//! The vocabulary is built once at startup and shared read-only with the
//! classifier. Product files use the shape `{"products": ["coke", ...]}`.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::{Error, Result};

/// Words that turn the next recognized product into a deletion
pub const REMOVAL_WORDS: [&str; 3] = ["delete", "erase", "remove"];

/// Words that end the recording session
pub const STOPPING_WORDS: [&str; 2] = ["stop", "done"];

/// Product list compiled into the binary
const EMBEDDED_PRODUCTS: &str = include_str!("../assets/products.json");

/// On-disk product file schema
#[derive(Debug, Default, Deserialize)]
struct ProductsFile {
    #[serde(default)]
    products: Option<Vec<String>>,
}

/// Recognizable products plus the removal and stopping trigger sets
#[derive(Debug, Clone)]
pub struct Vocabulary {
    products: HashSet<String>,
    removal_words: HashSet<String>,
    stopping_words: HashSet<String>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::from_products(std::iter::empty::<String>())
    }
}

impl Vocabulary {
    /// Build a vocabulary from product names
    ///
    /// Names are lowercased and trimmed; blanks are skipped.
    pub fn from_products<I, S>(products: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let products = products
            .into_iter()
            .map(|p| p.as_ref().trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();

        Self {
            products,
            removal_words: REMOVAL_WORDS.iter().map(ToString::to_string).collect(),
            stopping_words: STOPPING_WORDS.iter().map(ToString::to_string).collect(),
        }
    }

    /// Parse a product JSON document
    ///
    /// A document without a `products` field yields an empty vocabulary.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigLoad` if the document is not a JSON object of string lists
    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: ProductsFile =
            serde_json::from_str(json).map_err(|e| Error::ConfigLoad(e.to_string()))?;
        Ok(Self::from_products(file.products.unwrap_or_default()))
    }

    /// Load a product file from disk
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigLoad` if the file is missing or malformed
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigLoad(format!("{}: {e}", path.display())))?;
        let vocabulary = Self::from_json_str(&content)
            .map_err(|e| Error::ConfigLoad(format!("{}: {e}", path.display())))?;

        tracing::info!(
            path = %path.display(),
            products = vocabulary.len(),
            "loaded product vocabulary"
        );
        Ok(vocabulary)
    }

    /// Load a product file, degrading to an empty vocabulary on failure
    #[must_use]
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::load(path) {
            Ok(vocabulary) => vocabulary,
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "no products will be recognized"
                );
                Self::default()
            }
        }
    }

    /// The product list bundled with the binary
    #[must_use]
    pub fn embedded() -> Self {
        Self::from_json_str(EMBEDDED_PRODUCTS).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "embedded product list is malformed");
            Self::default()
        })
    }

    /// Check whether a lowercase token names a product
    #[must_use]
    pub fn is_product(&self, token: &str) -> bool {
        self.products.contains(token)
    }

    /// Check whether a lowercase token is a removal trigger
    #[must_use]
    pub fn is_removal(&self, token: &str) -> bool {
        self.removal_words.contains(token)
    }

    /// Check whether a lowercase token is a stop trigger
    #[must_use]
    pub fn is_stopping(&self, token: &str) -> bool {
        self.stopping_words.contains(token)
    }

    /// All products
    #[must_use]
    pub const fn products(&self) -> &HashSet<String> {
        &self.products
    }

    /// Products sorted alphabetically, for display
    #[must_use]
    pub fn sorted_products(&self) -> Vec<&str> {
        let mut products: Vec<&str> = self.products.iter().map(String::as_str).collect();
        products.sort_unstable();
        products
    }

    /// `{"delete", "erase", "remove"}`
    #[must_use]
    pub const fn removal_words(&self) -> &HashSet<String> {
        &self.removal_words
    }

    /// `{"stop", "done"}`
    #[must_use]
    pub const fn stopping_words(&self) -> &HashSet<String> {
        &self.stopping_words
    }

    /// Number of products
    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether no products are recognizable
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_products_are_normalized() {
        let vocabulary = Vocabulary::from_products(["  Coke ", "MILK", "", "coke"]);

        assert_eq!(vocabulary.len(), 2);
        assert!(vocabulary.is_product("coke"));
        assert!(vocabulary.is_product("milk"));
        assert!(!vocabulary.is_product("Coke"));
    }

    #[test]
    fn test_trigger_sets() {
        let vocabulary = Vocabulary::default();

        assert_eq!(vocabulary.removal_words().len(), 3);
        for word in ["delete", "erase", "remove"] {
            assert!(vocabulary.is_removal(word));
        }
        assert_eq!(vocabulary.stopping_words().len(), 2);
        assert!(vocabulary.is_stopping("stop"));
        assert!(vocabulary.is_stopping("done"));
        assert!(!vocabulary.is_stopping("delete"));
    }

    #[test]
    fn test_json_without_products_field_is_empty() {
        let vocabulary = Vocabulary::from_json_str(r#"{"other": ["coke"]}"#).unwrap();
        assert!(vocabulary.is_empty());
    }

    #[test]
    fn test_malformed_json_is_config_load_error() {
        let err = Vocabulary::from_json_str(r#"{"products": "coke"}"#).unwrap_err();
        assert!(matches!(err, Error::ConfigLoad(_)));
    }

    #[test]
    fn test_missing_file_degrades_to_empty() {
        let vocabulary = Vocabulary::load_or_empty(Path::new("/nonexistent/products.json"));
        assert!(vocabulary.is_empty());
        assert!(vocabulary.is_removal("remove"));
    }

    #[test]
    fn test_embedded_products() {
        let vocabulary = Vocabulary::embedded();
        assert!(vocabulary.is_product("coke"));
        assert!(vocabulary.is_product("milk"));
    }
}
