// Batch Domain Model

/// Result of one fetch, with the count of entries that were dropped
///
/// `popped` entries left the backing store; `items.len() + skipped == popped`.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch<T> {
    pub items: Vec<T>,
    pub popped: usize,
    pub skipped: usize,
}

impl<T> Batch<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            popped: 0,
            skipped: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}

impl<T> Default for Batch<T> {
    fn default() -> Self {
        Self::empty()
    }
}
