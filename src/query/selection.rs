use std::collections::BTreeSet;

/// Selected record keys on the visible page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    keys: BTreeSet<String>,
}

impl Selection {
    /// Flip one key; returns whether it is now selected.
    pub fn toggle_one(&mut self, key: &str) -> bool {
        if self.keys.remove(key) {
            false
        } else {
            self.keys.insert(key.to_string());
            true
        }
    }

    /// Select every visible key, or clear everything if they already are.
    pub fn toggle_all(&mut self, visible: &[&str]) {
        if self.is_all_selected(visible.len()) {
            self.clear();
        } else {
            self.keys = visible.iter().map(|k| k.to_string()).collect();
        }
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    pub fn is_selected(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn is_all_selected(&self, visible_count: usize) -> bool {
        visible_count > 0 && self.keys.len() == visible_count
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_one() {
        let mut sel = Selection::default();
        assert!(sel.toggle_one("SG001"));
        assert!(sel.is_selected("SG001"));
        assert!(!sel.toggle_one("SG001"));
        assert!(sel.is_empty());
    }

    #[test]
    fn test_toggle_all_selects_then_clears() {
        let visible = ["a", "b", "c"];
        let mut sel = Selection::default();
        sel.toggle_one("b");
        assert!(!sel.is_all_selected(visible.len()));

        sel.toggle_all(&visible);
        assert_eq!(sel.len(), 3);
        assert!(sel.is_all_selected(visible.len()));

        sel.toggle_all(&visible);
        assert!(sel.is_empty());
    }

    #[test]
    fn test_nothing_visible_is_never_all_selected() {
        let mut sel = Selection::default();
        assert!(!sel.is_all_selected(0));
        sel.toggle_all(&[]);
        assert!(sel.is_empty());
        assert!(!sel.is_all_selected(0));
    }
}
