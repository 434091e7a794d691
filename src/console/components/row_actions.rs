//! Row actions offered by the data table
//!
//! The table knows nothing about "view", "edit" or "delete". Its owner hands
//! it an ordered set of [`RowAction`]s, each carrying the value the table
//! emits when the action is triggered on a row.

/// One action that can be applied to a table row.
#[derive(Debug, Clone, PartialEq)]
pub struct RowAction<A> {
    /// Value emitted to the owner when the action fires
    pub action: A,
    pub label: String,
    /// Short glyph shown in the actions column
    pub icon: &'static str,
    /// Key that triggers the action on the selected row
    pub key: char,
    /// Route the action through the delete-style confirmation prompt
    pub confirm: bool,
}

impl<A> RowAction<A> {
    pub fn new(action: A, label: &str, icon: &'static str, key: char) -> Self {
        Self {
            action,
            label: label.to_string(),
            icon,
            key,
            confirm: false,
        }
    }

    pub fn confirmed(mut self) -> Self {
        self.confirm = true;
        self
    }
}

/// Ordered set of row actions.
#[derive(Debug, Clone, PartialEq)]
pub struct RowActions<A> {
    actions: Vec<RowAction<A>>,
}

impl<A> Default for RowActions<A> {
    fn default() -> Self {
        Self { actions: Vec::new() }
    }
}

impl<A: Clone> RowActions<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an action. A later action bound to an already used key
    /// replaces the earlier one.
    pub fn with(mut self, action: RowAction<A>) -> Self {
        self.actions.retain(|existing| existing.key != action.key);
        self.actions.push(action);
        self
    }

    pub fn for_key(&self, key: char) -> Option<&RowAction<A>> {
        self.actions.iter().find(|a| a.key == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RowAction<A>> {
        self.actions.iter()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Text of the actions cell, e.g. `[v] [e] [d]`
    pub fn cell_text(&self) -> String {
        self.actions
            .iter()
            .map(|a| format!("[{}]", a.icon))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Key hints for the help line, e.g. `v: View | e: Edit`
    pub fn hints(&self) -> String {
        self.actions
            .iter()
            .map(|a| format!("{}: {}", a.key, a.label))
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Act {
        View,
        Delete,
        Archive,
    }

    #[test]
    fn test_order_and_lookup() {
        let actions = RowActions::new()
            .with(RowAction::new(Act::View, "View", "v", 'v'))
            .with(RowAction::new(Act::Delete, "Delete", "d", 'd').confirmed());

        assert_eq!(actions.len(), 2);
        assert_eq!(actions.cell_text(), "[v] [d]");
        assert_eq!(actions.hints(), "v: View | d: Delete");
        assert!(actions.for_key('d').unwrap().confirm);
        assert!(actions.for_key('x').is_none());
    }

    #[test]
    fn test_duplicate_key_replaces() {
        let actions = RowActions::new()
            .with(RowAction::new(Act::Delete, "Delete", "d", 'd'))
            .with(RowAction::new(Act::Archive, "Archive", "a", 'd'));

        assert_eq!(actions.len(), 1);
        assert_eq!(actions.for_key('d').unwrap().action, Act::Archive);
    }
}
