//! Transcript classification
//!
//! Scans the tokens of one transcript update left to right and sorts
//! vocabulary words into additions and deletions. A removal word marks the
//! next product as a deletion; a stop word ends the scan.

use std::sync::Arc;

use crate::Vocabulary;

/// Products collected from one transcript update
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionLists {
    /// Products to add, in recognition order
    pub additions: Vec<String>,
    /// Products to delete, in recognition order
    pub deletions: Vec<String>,
}

impl SessionLists {
    /// Drop all collected products
    pub fn clear(&mut self) {
        self.additions.clear();
        self.deletions.clear();
    }

    /// Whether nothing was collected
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.deletions.is_empty()
    }
}

/// Outcome of classifying one transcript update
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    /// Products seen before the scan ended
    pub lists: SessionLists,
    /// A stop word was reached while stop was armed
    pub stop_requested: bool,
    /// A removal word was not followed by any product
    pub dangling_delete: bool,
}

/// Classifies transcript tokens against a vocabulary
#[derive(Debug, Clone)]
pub struct TranscriptClassifier {
    vocabulary: Arc<Vocabulary>,
}

impl TranscriptClassifier {
    /// Create a classifier over a shared vocabulary
    #[must_use]
    pub const fn new(vocabulary: Arc<Vocabulary>) -> Self {
        Self { vocabulary }
    }

    /// The vocabulary this classifier matches against
    #[must_use]
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Classify one transcript update
    ///
    /// With `stop_armed` false, stop words are treated like any other
    /// unrecognized token and the scan continues past them.
    pub fn classify<I, S>(&self, tokens: I, stop_armed: bool) -> Classification
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut result = Classification::default();
        let mut pending_delete = false;

        for token in tokens {
            let token = token.as_ref().to_lowercase();

            if self.vocabulary.is_removal(&token) {
                pending_delete = true;
                continue;
            }

            if self.vocabulary.is_stopping(&token) && stop_armed {
                tracing::debug!(token = %token, "stop word recognized");
                result.stop_requested = true;
                break;
            }

            if self.vocabulary.is_product(&token) {
                if pending_delete {
                    result.lists.deletions.push(token);
                    pending_delete = false;
                } else {
                    result.lists.additions.push(token);
                }
            }
        }

        result.dangling_delete = pending_delete;
        tracing::trace!(
            additions = ?result.lists.additions,
            deletions = ?result.lists.deletions,
            stop = result.stop_requested,
            "classified transcript"
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> TranscriptClassifier {
        TranscriptClassifier::new(Arc::new(Vocabulary::from_products(["coke", "milk"])))
    }

    #[test]
    fn test_tokens_are_case_folded() {
        let result = classifier().classify(["COKE", "Delete", "Milk"], true);

        assert_eq!(result.lists.additions, vec!["coke"]);
        assert_eq!(result.lists.deletions, vec!["milk"]);
    }

    #[test]
    fn test_delete_applies_to_next_product_only() {
        let result = classifier().classify(["remove", "coke", "milk"], true);

        assert_eq!(result.lists.deletions, vec!["coke"]);
        assert_eq!(result.lists.additions, vec!["milk"]);
    }

    #[test]
    fn test_removal_word_is_never_a_product() {
        let classifier = TranscriptClassifier::new(Arc::new(Vocabulary::from_products([
            "erase", "coke",
        ])));
        let result = classifier.classify(["erase", "coke"], true);

        assert!(result.lists.additions.is_empty());
        assert_eq!(result.lists.deletions, vec!["coke"]);
    }

    #[test]
    fn test_dangling_delete_is_reported() {
        let result = classifier().classify(["coke", "delete"], true);

        assert_eq!(result.lists.additions, vec!["coke"]);
        assert!(result.dangling_delete);
    }

    #[test]
    fn test_stop_ends_scan() {
        let result = classifier().classify(["milk", "done", "coke"], true);

        assert!(result.stop_requested);
        assert_eq!(result.lists.additions, vec!["milk"]);
    }

    #[test]
    fn test_disarmed_stop_is_ignored() {
        let result = classifier().classify(["stop", "coke"], false);

        assert!(!result.stop_requested);
        assert_eq!(result.lists.additions, vec!["coke"]);
    }

    #[test]
    fn test_session_lists_clear() {
        let mut lists = classifier().classify(["coke", "delete", "milk"], true).lists;
        assert!(!lists.is_empty());

        lists.clear();
        assert!(lists.is_empty());
    }
}
