use std::collections::BTreeSet;

pub fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{word}s")
    }
}

/// Checkbox selection over one page of rows, driving the bulk-action toolbar.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkSelection {
    rows: BTreeSet<u64>,
    checked: BTreeSet<u64>,
}

impl BulkSelection {
    pub fn new(rows: impl IntoIterator<Item = u64>) -> Self {
        Self {
            rows: rows.into_iter().collect(),
            checked: BTreeSet::new(),
        }
    }

    /// Sets one row's checkbox. Unknown rows are ignored.
    pub fn set_checked(&mut self, row: u64, checked: bool) {
        if !self.rows.contains(&row) {
            return;
        }
        if checked {
            self.checked.insert(row);
        } else {
            self.checked.remove(&row);
        }
    }

    pub fn toggle(&mut self, row: u64) {
        let checked = !self.checked.contains(&row);
        self.set_checked(row, checked);
    }

    pub fn select_all(&mut self, checked: bool) {
        if checked {
            self.checked = self.rows.clone();
        } else {
            self.checked.clear();
        }
    }

    pub fn is_checked(&self, row: u64) -> bool {
        self.checked.contains(&row)
    }

    pub fn count(&self) -> usize {
        self.checked.len()
    }

    pub fn selected(&self) -> impl Iterator<Item = u64> + '_ {
        self.checked.iter().copied()
    }

    /// The toolbar replaces the column header while anything is checked.
    pub fn bulk_actions_visible(&self) -> bool {
        !self.checked.is_empty()
    }

    pub fn scope_label(&self) -> String {
        let count = self.count();
        format!("{count} selected {}", pluralize("item", count))
    }
}
