//! The snippet list and its edit field

use log::debug;

/// Saved snippets, the selected row, and the editable text field
#[derive(Debug, Default)]
pub struct SnippetList {
    items: Vec<String>,
    current: Option<usize>,
    edit: String,
}

impl SnippetList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `text` and select it; empty text is ignored
    pub fn add(&mut self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        self.items.push(text.to_string());
        self.select_last();
        true
    }

    /// Remove the selected row
    ///
    /// Selects the new last row afterwards, or clears the selection and the
    /// edit field when the list is empty.
    pub fn delete_current(&mut self) -> Option<String> {
        let row = self.current?;
        let removed = self.items.remove(row);
        debug!("Deleted snippet {}", row);

        if self.items.is_empty() {
            self.current = None;
            self.edit.clear();
        } else {
            self.select_last();
        }
        Some(removed)
    }

    /// Store the edit field: overwrite the selected row, or append
    pub fn save(&mut self) -> bool {
        if self.edit.is_empty() {
            return false;
        }
        match self.current {
            Some(row) => self.items[row] = self.edit.clone(),
            None => self.items.push(self.edit.clone()),
        }
        true
    }

    /// Select `row` and copy its text into the edit field
    pub fn select(&mut self, row: usize) -> bool {
        match self.items.get(row) {
            Some(text) => {
                self.edit = text.clone();
                self.current = Some(row);
                true
            }
            None => false,
        }
    }

    fn select_last(&mut self) {
        if let Some(last) = self.items.len().checked_sub(1) {
            self.select(last);
        }
    }

    pub fn set_edit(&mut self, text: &str) {
        self.edit = text.to_string();
    }

    /// Current contents of the edit field
    pub fn edit(&self) -> &str {
        &self.edit
    }

    pub fn current(&self) -> Option<usize> {
        self.current
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
