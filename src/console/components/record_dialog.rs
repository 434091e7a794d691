//! Modal editor bound to a single record
//!
//! The dialog owns a draft copy of the record it edits. It never performs
//! I/O: submitting hands the draft back to the owner as
//! [`DialogEvent::Submit`], and the owner reports progress through
//! [`RecordDialog::set_submitting`].

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};
use tracing::debug;

use super::form_field::{Form, FormField};
use crate::api::ApiError;
use crate::console::traits::FormHandler;
use crate::console::ui::{centered_box, Styles};
use crate::models::{FieldKind, FieldSpec, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogMode {
    Creating,
    Editing,
    Viewing,
}

impl DialogMode {
    pub fn title(&self) -> &'static str {
        match self {
            DialogMode::Creating => "Create New Item",
            DialogMode::Editing => "Edit Item",
            DialogMode::Viewing => "View Item",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DialogEvent {
    Submit(Record),
    Close,
    Consumed,
    Ignored,
}

pub struct RecordDialog {
    specs: Vec<FieldSpec>,
    form: Form,
    draft: Record,
    mode: DialogMode,
    open: bool,
    submitting: bool,
    loading: bool,
}

impl RecordDialog {
    pub fn new(specs: Vec<FieldSpec>) -> Self {
        let form = Form::new(specs.iter().map(FormField::from_spec).collect());
        Self {
            specs,
            form,
            draft: Record::new(),
            mode: DialogMode::Creating,
            open: false,
            submitting: false,
            loading: false,
        }
    }

    /// Show the dialog in `mode`, seeded from `initial`
    pub fn open(&mut self, mode: DialogMode, initial: Option<&Record>) {
        self.mode = mode;
        self.open = true;
        self.submitting = false;
        self.loading = false;
        self.form.set_read_only(mode == DialogMode::Viewing);
        self.form.set_current_field(0);
        self.load_draft(initial);
    }

    /// Show the dialog while its record is still being fetched
    pub fn open_loading(&mut self, mode: DialogMode) {
        self.open(mode, None);
        self.loading = true;
    }

    pub fn close(&mut self) {
        self.open = false;
        self.submitting = false;
        self.loading = false;
    }

    /// Replace the draft with a copy of `initial`, or with an empty draft.
    /// Nothing from the previous draft survives.
    pub fn load_draft(&mut self, initial: Option<&Record>) {
        self.draft = match initial {
            Some(record) => record.clone(),
            None => {
                let mut draft = Record::new();
                for spec in &self.specs {
                    draft.set_path(&spec.key, spec.default_value());
                }
                draft
            }
        };
        for field in &mut self.form.fields {
            field.load(self.draft.get_path(&field.key));
        }
        self.loading = false;
        debug!("Dialog draft seeded with {} fields", self.draft.0.len());
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn mode(&self) -> DialogMode {
        self.mode
    }

    pub fn draft(&self) -> &Record {
        &self.draft
    }

    pub fn form(&self) -> &Form {
        &self.form
    }

    pub fn set_submitting(&mut self, submitting: bool) {
        self.submitting = submitting;
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Label of the submit control, `None` when the mode has no submit
    pub fn submit_label(&self) -> Option<&'static str> {
        match (self.mode, self.submitting) {
            (DialogMode::Viewing, _) => None,
            (DialogMode::Creating, false) => Some("Create"),
            (DialogMode::Creating, true) => Some("Creating…"),
            (DialogMode::Editing, false) => Some("Update"),
            (DialogMode::Editing, true) => Some("Updating…"),
        }
    }

    /// Fill a dropdown's options
    pub fn set_lookup_options(&mut self, key: &str, options: Vec<String>) {
        if let Some(field) = self.form.field_mut(key) {
            field.options = options;
        }
    }

    /// Show backend validation messages next to the fields they name
    pub fn apply_errors(&mut self, error: &ApiError) {
        for field in &mut self.form.fields {
            if let Some(message) = error.field_error(&field.key) {
                field.validation_error = Some(message.to_string());
            }
        }
    }

    fn sync_current(&mut self) {
        if let Some(field) = self.form.focused() {
            let (key, value) = (field.key.clone(), field.json_value());
            self.draft.set_path(&key, value);
        }
    }

    fn focused_kind(&self) -> Option<FieldKind> {
        self.form.focused().map(|field| field.kind)
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) -> DialogEvent {
        if !self.open {
            return DialogEvent::Ignored;
        }

        match key.code {
            KeyCode::Esc => {
                if self.submitting {
                    return DialogEvent::Consumed;
                }
                DialogEvent::Close
            }
            KeyCode::Tab | KeyCode::Down => {
                self.form.next_field();
                DialogEvent::Consumed
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.form.previous_field();
                DialogEvent::Consumed
            }
            KeyCode::Enter => self.submit(),
            _ if self.mode == DialogMode::Viewing || self.submitting || self.loading => {
                DialogEvent::Consumed
            }
            KeyCode::Left => {
                if let Some(field) = self.form.get_current_field_mut() {
                    match field.kind {
                        FieldKind::Dropdown => field.cycle_option(false),
                        _ => field.move_cursor_left(),
                    }
                }
                self.sync_current();
                DialogEvent::Consumed
            }
            KeyCode::Right => {
                if let Some(field) = self.form.get_current_field_mut() {
                    match field.kind {
                        FieldKind::Dropdown => field.cycle_option(true),
                        _ => field.move_cursor_right(),
                    }
                }
                self.sync_current();
                DialogEvent::Consumed
            }
            KeyCode::Char(' ') if self.focused_kind() == Some(FieldKind::Dropdown) => {
                if let Some(field) = self.form.get_current_field_mut() {
                    field.cycle_option(true);
                }
                self.sync_current();
                DialogEvent::Consumed
            }
            KeyCode::Char(c) => {
                self.form.handle_char_input(c);
                self.sync_current();
                DialogEvent::Consumed
            }
            KeyCode::Backspace => {
                self.form.handle_backspace();
                self.sync_current();
                DialogEvent::Consumed
            }
            KeyCode::Delete => {
                self.form.handle_delete();
                self.sync_current();
                DialogEvent::Consumed
            }
            _ => DialogEvent::Ignored,
        }
    }

    fn submit(&mut self) -> DialogEvent {
        if self.mode == DialogMode::Viewing || self.submitting || self.loading {
            return DialogEvent::Consumed;
        }
        match self.form.validate() {
            Ok(()) => DialogEvent::Submit(self.draft.clone()),
            Err(message) => {
                debug!("Dialog validation failed: {}", message);
                DialogEvent::Consumed
            }
        }
    }

    pub fn render(&self, f: &mut Frame, area: Rect) {
        if !self.open {
            return;
        }

        let height = self.form.height() + 5;
        let popup = centered_box(60, height, area);
        f.render_widget(Clear, popup);

        let block = Block::default()
            .title(self.mode.title())
            .title_style(Styles::title())
            .borders(Borders::ALL)
            .border_style(Styles::active_border());
        let inner = block.inner(popup);
        f.render_widget(block, popup);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1), Constraint::Length(1)])
            .split(inner);

        if self.loading {
            f.render_widget(Paragraph::new("Loading...").style(Styles::warning()), chunks[0]);
        } else {
            self.form.render(f, chunks[0]);
        }

        let mut footer = Vec::new();
        if let Some(label) = self.submit_label() {
            let style = if self.submitting || self.loading {
                Styles::disabled()
            } else {
                Styles::success()
            };
            footer.push(Span::styled(format!("[Enter] {}", label), style));
            footer.push(Span::raw("   "));
        }
        let close_label = if self.mode == DialogMode::Viewing {
            "[Esc] Close"
        } else {
            "[Esc] Cancel"
        };
        footer.push(Span::styled(close_label, Styles::inactive()));
        f.render_widget(Paragraph::new(Line::from(footer)), chunks[2]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::ui::buffer_lines;
    use crate::models::EntityKind;
    use crossterm::event::KeyModifiers;
    use ratatui::{backend::TestBackend, Terminal};
    use serde_json::json;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn draw(dialog: &RecordDialog) -> Vec<String> {
        let mut terminal = Terminal::new(TestBackend::new(80, 30)).unwrap();
        terminal.draw(|f| {
            let area = f.size();
            dialog.render(f, area)
        }).unwrap();
        buffer_lines(terminal.backend().buffer())
    }

    #[test]
    fn test_reseed_sequence_has_no_leftovers() {
        let mut dialog = RecordDialog::new(EntityKind::Categories.fields());
        let a = Record::new().with("id", 1).with("nama_kategori", "Food");
        let b = Record::new().with("id", 2).with("nama_kategori", "Drinks");

        dialog.open(DialogMode::Editing, Some(&a));
        assert_eq!(dialog.draft(), &a);

        dialog.load_draft(None);
        assert_eq!(dialog.draft(), &Record::new().with("nama_kategori", ""));
        assert_eq!(dialog.form().field("nama_kategori").unwrap().value, "");

        dialog.load_draft(Some(&b));
        assert_eq!(dialog.draft(), &b);
        assert_eq!(dialog.form().field("nama_kategori").unwrap().value, "Drinks");
    }

    #[test]
    fn test_typing_updates_draft_and_submits() {
        let mut dialog = RecordDialog::new(EntityKind::Categories.fields());
        dialog.open(DialogMode::Creating, None);

        // empty required field blocks submit
        assert_eq!(dialog.handle_key_event(key(KeyCode::Enter)), DialogEvent::Consumed);

        for c in "Snacks".chars() {
            dialog.handle_key_event(key(KeyCode::Char(c)));
        }
        assert_eq!(
            dialog.handle_key_event(key(KeyCode::Enter)),
            DialogEvent::Submit(Record::new().with("nama_kategori", "Snacks"))
        );
    }

    #[test]
    fn test_product_draft_is_typed() {
        let mut dialog = RecordDialog::new(EntityKind::Products.fields());
        dialog.set_lookup_options("satuan", vec!["pcs".to_string(), "box".to_string()]);
        dialog.open(DialogMode::Creating, None);

        // kodebarcode, nama_barang, satuan, isi, kategori, pajak, then pricing
        dialog.handle_key_event(key(KeyCode::Tab));
        for c in "Tea".chars() {
            dialog.handle_key_event(key(KeyCode::Char(c)));
        }
        dialog.handle_key_event(key(KeyCode::Tab));
        dialog.handle_key_event(key(KeyCode::Right));
        dialog.handle_key_event(key(KeyCode::Tab));
        dialog.handle_key_event(key(KeyCode::Char('1')));
        dialog.handle_key_event(key(KeyCode::Char('2')));
        dialog.handle_key_event(key(KeyCode::Tab));
        dialog.handle_key_event(key(KeyCode::Tab));
        dialog.handle_key_event(key(KeyCode::Char(' ')));
        // saldo_awal starts at 0
        dialog.handle_key_event(key(KeyCode::Tab));
        dialog.handle_key_event(key(KeyCode::Backspace));
        for c in "40".chars() {
            dialog.handle_key_event(key(KeyCode::Char(c)));
        }

        let draft = dialog.draft();
        assert_eq!(draft.get("nama_barang"), Some(&json!("Tea")));
        assert_eq!(draft.get("satuan"), Some(&json!("pcs")));
        assert_eq!(draft.get("isi"), Some(&json!(12)));
        assert_eq!(draft.get("pajak"), Some(&json!(true)));
        assert_eq!(draft.get_path("details.0.saldo_awal"), Some(&json!(40)));
        assert_eq!(draft.get_path("details.0.nilai_akhir"), Some(&json!(0)));
    }

    #[test]
    fn test_submit_labels_and_disabled_submit() {
        let mut dialog = RecordDialog::new(EntityKind::Categories.fields());
        let record = Record::new().with("id", 1).with("nama_kategori", "Food");

        dialog.open(DialogMode::Editing, Some(&record));
        assert_eq!(dialog.submit_label(), Some("Update"));
        dialog.set_submitting(true);
        assert_eq!(dialog.submit_label(), Some("Updating…"));
        assert_eq!(dialog.handle_key_event(key(KeyCode::Enter)), DialogEvent::Consumed);
        assert_eq!(dialog.handle_key_event(key(KeyCode::Esc)), DialogEvent::Consumed);

        dialog.open(DialogMode::Creating, None);
        dialog.set_submitting(true);
        assert_eq!(dialog.submit_label(), Some("Creating…"));
        let lines = draw(&dialog);
        assert!(lines.iter().any(|line| line.contains("Create New Item")));
        assert!(lines.iter().any(|line| line.contains("[Enter] Creating…")));
    }

    #[test]
    fn test_viewing_is_read_only() {
        let mut dialog = RecordDialog::new(EntityKind::Categories.fields());
        let record = Record::new().with("id", 1).with("nama_kategori", "Food");
        dialog.open(DialogMode::Viewing, Some(&record));

        assert_eq!(dialog.submit_label(), None);
        dialog.handle_key_event(key(KeyCode::Char('x')));
        assert_eq!(dialog.draft(), &record);
        assert_eq!(dialog.handle_key_event(key(KeyCode::Enter)), DialogEvent::Consumed);
        assert_eq!(dialog.handle_key_event(key(KeyCode::Esc)), DialogEvent::Close);

        let lines = draw(&dialog);
        assert!(lines.iter().any(|line| line.contains("View Item")));
        assert!(!lines.iter().any(|line| line.contains("[Enter]")));
    }

    #[test]
    fn test_backend_field_errors_are_shown() {
        let mut dialog = RecordDialog::new(EntityKind::Categories.fields());
        dialog.open(DialogMode::Creating, None);
        let error = ApiError::from_response(
            422,
            r#"{"message":"The given data was invalid.","errors":{"nama_kategori":["The nama kategori has already been taken."]}}"#,
        );
        dialog.apply_errors(&error);
        assert_eq!(
            dialog.form().field("nama_kategori").unwrap().validation_error.as_deref(),
            Some("The nama kategori has already been taken.")
        );
    }
}
