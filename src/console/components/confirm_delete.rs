//! Confirmation prompt guarding destructive row actions

use ratatui::{
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::console::ui::{centered_box, truncate_to_width, Styles};
use crate::models::Record;

/// `Idle -> Pending -> Idle`. Only the confirming transition yields the
/// action, and it yields it once.
#[derive(Debug, Clone, PartialEq)]
pub enum DeleteConfirmation<A> {
    Idle,
    Pending { action: A, record: Record },
}

impl<A> Default for DeleteConfirmation<A> {
    fn default() -> Self {
        DeleteConfirmation::Idle
    }
}

impl<A> DeleteConfirmation<A> {
    /// Ask for confirmation. A request made while another is pending
    /// replaces it.
    pub fn request(&mut self, action: A, record: Record) {
        *self = DeleteConfirmation::Pending { action, record };
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, DeleteConfirmation::Pending { .. })
    }

    pub fn record(&self) -> Option<&Record> {
        match self {
            DeleteConfirmation::Pending { record, .. } => Some(record),
            DeleteConfirmation::Idle => None,
        }
    }

    pub fn confirm(&mut self) -> Option<(A, Record)> {
        match std::mem::take(self) {
            DeleteConfirmation::Pending { action, record } => Some((action, record)),
            DeleteConfirmation::Idle => None,
        }
    }

    pub fn cancel(&mut self) {
        *self = DeleteConfirmation::Idle;
    }

    /// Draw the prompt naming the record by `label`
    pub fn render(&self, f: &mut Frame, area: Rect, label: &str) {
        if !self.is_pending() {
            return;
        }

        let popup = centered_box(50, 9, area);
        f.render_widget(Clear, popup);

        let text = vec![
            Line::from(format!(
                "This action cannot be undone. This will permanently delete the item \"{}\" and remove it from our servers.",
                truncate_to_width(label, 40)
            )),
            Line::from(""),
            Line::from(vec![
                Span::styled("[Esc/n] Cancel", Styles::inactive()),
                Span::raw("    "),
                Span::styled("[Enter/y] Delete", Styles::error()),
            ]),
        ];

        let paragraph = Paragraph::new(text)
            .wrap(Wrap { trim: true })
            .alignment(Alignment::Left)
            .block(
                Block::default()
                    .title("Are you absolutely sure?")
                    .title_style(Styles::error())
                    .borders(Borders::ALL)
                    .border_style(Styles::error()),
            );
        f.render_widget(paragraph, popup);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirm_emits_once() {
        let record = Record::new().with("id", 1);
        let mut confirmation = DeleteConfirmation::default();
        confirmation.request("delete", record.clone());
        assert!(confirmation.is_pending());

        assert_eq!(confirmation.confirm(), Some(("delete", record)));
        assert_eq!(confirmation.confirm(), None);
        assert!(!confirmation.is_pending());
    }

    #[test]
    fn test_cancel_discards_intent() {
        let mut confirmation = DeleteConfirmation::default();
        confirmation.request("delete", Record::new().with("id", 2));
        confirmation.cancel();

        assert!(confirmation.record().is_none());
        assert_eq!(confirmation.confirm(), None);
    }
}
