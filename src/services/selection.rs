use tokio::sync::watch;

use crate::models::ProductRecord;

/// The simulated user context: an ordered, SKU-unique list of products
///
/// Subscribers receive the SKU list from [`SelectionSet::input_identifiers`]
/// each time it changes.
#[derive(Debug)]
pub struct SelectionSet {
    products: Vec<ProductRecord>,
    changes: watch::Sender<Vec<String>>,
}

impl Default for SelectionSet {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionSet {
    pub fn new() -> Self {
        let (changes, _) = watch::channel(Vec::new());
        Self {
            products: Vec::new(),
            changes,
        }
    }

    /// Appends `record` unless a record with the same SKU is already held
    ///
    /// Returns whether the record was added.
    pub fn add(&mut self, record: ProductRecord) -> bool {
        if self.contains(sku_key(&record)) {
            return false;
        }
        self.products.push(record);
        self.publish();
        true
    }

    /// Removes the record with `sku`; returns whether one was removed
    pub fn remove(&mut self, sku: &str) -> bool {
        let before = self.products.len();
        self.products.retain(|p| sku_key(p) != sku);
        let removed = self.products.len() != before;
        if removed {
            self.publish();
        }
        removed
    }

    pub fn clear(&mut self) {
        self.products.clear();
        self.publish();
    }

    pub fn contains(&self, sku: &str) -> bool {
        self.products.iter().any(|p| sku_key(p) == sku)
    }

    /// Non-empty SKUs of the held records, in insertion order
    pub fn input_identifiers(&self) -> Vec<String> {
        self.products
            .iter()
            .filter_map(|p| p.usable_sku())
            .map(str::to_string)
            .collect()
    }

    pub fn products(&self) -> &[ProductRecord] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Subscribes to changes of the input identifier list
    pub fn subscribe(&self) -> watch::Receiver<Vec<String>> {
        self.changes.subscribe()
    }

    fn publish(&self) {
        let current = self.input_identifiers();
        self.changes.send_if_modified(|skus| {
            if *skus == current {
                false
            } else {
                *skus = current;
                true
            }
        });
    }
}

/// Absent and empty SKUs share one identity, as they do in the dashboard
fn sku_key(record: &ProductRecord) -> &str {
    record.sku.as_deref().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, sku: &str) -> ProductRecord {
        ProductRecord::new(id).with_sku(sku)
    }

    fn skus(set: &SelectionSet) -> Vec<&str> {
        set.products()
            .iter()
            .map(|p| p.sku.as_deref().unwrap_or(""))
            .collect()
    }

    #[test]
    fn test_add_preserves_insertion_order() {
        let mut set = SelectionSet::new();
        assert!(set.add(product("1", "B")));
        assert!(set.add(product("2", "A")));
        assert!(set.add(product("3", "C")));

        assert_eq!(skus(&set), vec!["B", "A", "C"]);
    }

    #[test]
    fn test_add_is_idempotent_per_sku() {
        let mut set = SelectionSet::new();
        set.add(product("1", "A"));
        set.add(product("2", "B"));

        assert!(!set.add(product("99", "A")));
        assert_eq!(set.len(), 2);
        assert_eq!(skus(&set), vec!["A", "B"]);
        assert_eq!(set.products()[0].id, "1");
    }

    #[test]
    fn test_remove_then_add_moves_to_end() {
        let mut set = SelectionSet::new();
        set.add(product("1", "A"));
        set.add(product("2", "B"));
        set.add(product("3", "C"));

        assert!(set.remove("A"));
        assert!(!set.contains("A"));
        set.add(product("1", "A"));

        assert!(set.contains("A"));
        assert_eq!(skus(&set), vec!["B", "C", "A"]);
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let mut set = SelectionSet::new();
        set.add(product("1", "A"));
        assert!(!set.remove("Z"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_clear() {
        let mut set = SelectionSet::new();
        set.add(product("1", "A"));
        set.add(product("2", "B"));
        set.clear();
        assert!(set.is_empty());
        assert!(set.input_identifiers().is_empty());
    }

    #[test]
    fn test_input_identifiers_skip_missing_and_empty_skus() {
        let mut set = SelectionSet::new();
        set.add(product("1", "A"));
        set.add(ProductRecord::new("2"));
        set.add(product("4", "B"));

        assert_eq!(set.len(), 3);
        assert_eq!(set.input_identifiers(), vec!["A", "B"]);
    }

    #[test]
    fn test_absent_and_empty_sku_collide() {
        let mut set = SelectionSet::new();
        assert!(set.add(ProductRecord::new("1")));
        assert!(!set.add(product("2", "")));
        assert!(set.contains(""));

        assert!(set.remove(""));
        assert!(set.is_empty());
    }

    #[test]
    fn test_input_identifiers_never_duplicate_or_empty() {
        let mut set = SelectionSet::new();
        let ops: Vec<(bool, &str)> = vec![
            (true, "A"),
            (true, "B"),
            (true, "A"),
            (true, ""),
            (false, "B"),
            (true, "B"),
            (true, ""),
            (false, "A"),
            (true, "C"),
            (true, "A"),
        ];
        for (i, (add, sku)) in ops.into_iter().enumerate() {
            if add {
                set.add(product(&i.to_string(), sku));
            } else {
                set.remove(sku);
            }

            let ids = set.input_identifiers();
            assert!(ids.iter().all(|s| !s.is_empty()));
            let mut deduped = ids.clone();
            deduped.sort();
            deduped.dedup();
            assert_eq!(deduped.len(), ids.len());
        }

        assert_eq!(set.input_identifiers(), vec!["B", "C", "A"]);
    }

    #[tokio::test]
    async fn test_subscribers_see_identifier_changes() {
        let mut set = SelectionSet::new();
        let mut rx = set.subscribe();

        set.add(product("1", "A"));
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), vec!["A".to_string()]);

        set.add(product("1", "A"));
        assert!(!rx.has_changed().unwrap());

        set.clear();
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_empty());
    }

    #[tokio::test]
    async fn test_sku_less_add_does_not_notify() {
        let mut set = SelectionSet::new();
        let rx = set.subscribe();

        set.add(ProductRecord::new("1"));
        assert!(!rx.has_changed().unwrap());
    }
}
