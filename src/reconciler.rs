//! Merging pass results into the durable product list

use crate::classifier::SessionLists;

/// How reconciliation treats repeated products
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcilePolicy {
    /// Keep only the first occurrence of each product
    pub dedupe: bool,
}

/// Append `additions` to `added` and drop every entry named in `deletions`
///
/// A deleted product is removed wherever it appears, including entries
/// added by earlier passes. Repeats are kept.
#[must_use]
pub fn reconcile(added: &[String], additions: &[String], deletions: &[String]) -> Vec<String> {
    added
        .iter()
        .chain(additions)
        .filter(|product| !deletions.contains(product))
        .cloned()
        .collect()
}

/// The products currently considered added
#[derive(Debug, Clone, Default)]
pub struct ProductList {
    products: Vec<String>,
    policy: ReconcilePolicy,
}

impl ProductList {
    /// Create an empty list
    #[must_use]
    pub fn new(policy: ReconcilePolicy) -> Self {
        Self {
            products: Vec::new(),
            policy,
        }
    }

    /// Merge one pass into the list and clear the pass lists
    ///
    /// Returns `true` if the list changed.
    pub fn apply(&mut self, session: &mut SessionLists) -> bool {
        let mut merged = reconcile(&self.products, &session.additions, &session.deletions);
        if self.policy.dedupe {
            let mut seen = std::collections::HashSet::new();
            merged.retain(|product| seen.insert(product.clone()));
        }

        tracing::debug!(
            added = ?session.additions,
            deleted = ?session.deletions,
            total = merged.len(),
            "reconciled session"
        );

        session.clear();
        let changed = merged != self.products;
        self.products = merged;
        changed
    }

    /// Current products in order
    #[must_use]
    pub fn products(&self) -> &[String] {
        &self.products
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether the list is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_reconcile_appends_in_order() {
        let result = reconcile(&strings(&["milk"]), &strings(&["coke", "tea"]), &[]);
        assert_eq!(result, strings(&["milk", "coke", "tea"]));
    }

    #[test]
    fn test_reconcile_removes_every_deleted_occurrence() {
        let result = reconcile(
            &strings(&["coke", "milk", "coke"]),
            &strings(&["coke"]),
            &strings(&["coke"]),
        );
        assert_eq!(result, strings(&["milk"]));
    }

    #[test]
    fn test_reconcile_keeps_repeats() {
        let result = reconcile(&strings(&["coke"]), &strings(&["coke"]), &[]);
        assert_eq!(result, strings(&["coke", "coke"]));
    }

    #[test]
    fn test_apply_clears_session() {
        let mut list = ProductList::default();
        let mut session = SessionLists {
            additions: strings(&["coke"]),
            deletions: Vec::new(),
        };

        assert!(list.apply(&mut session));
        assert!(session.is_empty());
        assert_eq!(list.products(), strings(&["coke"]).as_slice());

        // Empty pass changes nothing
        assert!(!list.apply(&mut session));
    }

    #[test]
    fn test_apply_with_dedupe() {
        let mut list = ProductList::new(ReconcilePolicy { dedupe: true });
        let mut session = SessionLists {
            additions: strings(&["coke", "milk", "coke"]),
            deletions: Vec::new(),
        };
        list.apply(&mut session);

        session.additions = strings(&["milk"]);
        list.apply(&mut session);

        assert_eq!(list.products(), strings(&["coke", "milk"]).as_slice());
        assert_eq!(list.len(), 2);
    }
}
