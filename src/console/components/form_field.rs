//! Form field component for user input

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use serde_json::Value;
use unicode_width::UnicodeWidthStr;

use crate::console::{traits::FormHandler, ui::Styles};
use crate::models::{display_value, FieldKind, FieldSpec};

/// Individual form field
#[derive(Debug, Clone)]
pub struct FormField {
    pub key: String,
    pub label: String,
    pub value: String,
    pub checked: bool,
    pub placeholder: String,
    pub kind: FieldKind,
    pub required: bool,
    pub masked: bool,
    pub read_only: bool,
    pub is_focused: bool,
    /// Cursor position in characters
    pub cursor_position: usize,
    pub options: Vec<String>,
    pub validation_error: Option<String>,
}

impl FormField {
    pub fn new(key: &str, label: &str, kind: FieldKind) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            value: String::new(),
            checked: false,
            placeholder: String::new(),
            kind,
            required: false,
            masked: false,
            read_only: false,
            is_focused: false,
            cursor_position: 0,
            options: Vec::new(),
            validation_error: None,
        }
    }

    pub fn from_spec(spec: &FieldSpec) -> Self {
        let mut field = Self::new(&spec.key, &spec.label, spec.kind);
        field.required = spec.required;
        field
    }

    pub fn with_placeholder(mut self, placeholder: &str) -> Self {
        self.placeholder = placeholder.to_string();
        self
    }

    pub fn masked(mut self) -> Self {
        self.masked = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn set_focus(&mut self, focused: bool) {
        self.is_focused = focused;
    }

    /// Seed from a record value; absent and null become empty input
    pub fn load(&mut self, value: Option<&Value>) {
        self.validation_error = None;
        match self.kind {
            FieldKind::Checkbox => {
                self.checked = match value {
                    Some(Value::Bool(b)) => *b,
                    Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
                    Some(Value::String(s)) => matches!(s.as_str(), "1" | "true"),
                    _ => false,
                };
            }
            _ => {
                self.value = match value {
                    None | Some(Value::Null) => String::new(),
                    other => display_value(other),
                };
            }
        }
        self.cursor_position = self.value.chars().count();
    }

    /// Typed value written back into a draft
    pub fn json_value(&self) -> Value {
        match self.kind {
            FieldKind::Checkbox => Value::Bool(self.checked),
            FieldKind::Number => {
                let trimmed = self.value.trim();
                if let Ok(i) = trimmed.parse::<i64>() {
                    Value::from(i)
                } else if let Some(n) = trimmed
                    .parse::<f64>()
                    .ok()
                    .and_then(serde_json::Number::from_f64)
                {
                    Value::Number(n)
                } else {
                    Value::String(self.value.clone())
                }
            }
            FieldKind::Text | FieldKind::Dropdown => Value::String(self.value.clone()),
        }
    }

    fn byte_index(&self) -> usize {
        self.value
            .char_indices()
            .nth(self.cursor_position)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }

    fn accepts_text(&self) -> bool {
        !self.read_only && matches!(self.kind, FieldKind::Text | FieldKind::Number)
    }

    pub fn insert_char(&mut self, c: char) {
        if self.read_only {
            return;
        }
        if self.kind == FieldKind::Checkbox {
            if c == ' ' {
                self.toggle();
            }
            return;
        }
        if !self.accepts_text() {
            return;
        }
        let index = self.byte_index();
        self.value.insert(index, c);
        self.cursor_position += 1;
        self.validation_error = None;
    }

    pub fn delete_char(&mut self) {
        if !self.accepts_text() || self.cursor_position == 0 {
            return;
        }
        self.cursor_position -= 1;
        let index = self.byte_index();
        self.value.remove(index);
        self.validation_error = None;
    }

    pub fn delete_char_forward(&mut self) {
        if !self.accepts_text() || self.cursor_position >= self.value.chars().count() {
            return;
        }
        let index = self.byte_index();
        self.value.remove(index);
        self.validation_error = None;
    }

    pub fn move_cursor_left(&mut self) {
        if self.cursor_position > 0 {
            self.cursor_position -= 1;
        }
    }

    pub fn move_cursor_right(&mut self) {
        if self.cursor_position < self.value.chars().count() {
            self.cursor_position += 1;
        }
    }

    pub fn toggle(&mut self) {
        if !self.read_only && self.kind == FieldKind::Checkbox {
            self.checked = !self.checked;
        }
    }

    /// Step through dropdown options; `forward` moves to the next one.
    /// A value that is not among the options starts from the first option.
    pub fn cycle_option(&mut self, forward: bool) {
        if self.read_only || self.kind != FieldKind::Dropdown || self.options.is_empty() {
            return;
        }
        let len = self.options.len();
        let next = match self.options.iter().position(|o| *o == self.value) {
            Some(i) if forward => (i + 1) % len,
            Some(i) => (i + len - 1) % len,
            None => 0,
        };
        self.value = self.options[next].clone();
        self.cursor_position = self.value.chars().count();
        self.validation_error = None;
    }

    pub fn is_empty(&self) -> bool {
        self.value.trim().is_empty()
    }

    /// Text shown inside the input box
    pub fn display_text(&self) -> String {
        match self.kind {
            FieldKind::Checkbox => format!("[{}] {}", if self.checked { "x" } else { " " }, self.label),
            FieldKind::Dropdown if self.value.is_empty() => "Select...".to_string(),
            FieldKind::Dropdown => format!("{} ▾", self.value),
            _ if self.value.is_empty() => self.placeholder.clone(),
            _ if self.masked => "*".repeat(self.value.chars().count()),
            _ => self.value.clone(),
        }
    }

    /// Render the form field
    pub fn render(&self, f: &mut Frame, area: Rect) {
        let border_style = if self.is_focused {
            Styles::active_border()
        } else if self.validation_error.is_some() {
            Styles::error()
        } else {
            Styles::inactive_border()
        };

        let label = if self.required {
            format!("{} *", self.label)
        } else {
            self.label.clone()
        };
        let title = if let Some(ref error) = self.validation_error {
            format!("{} - Error: {}", label, error)
        } else {
            label
        };

        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(border_style);

        let text_style = if self.read_only {
            Styles::inactive()
        } else if self.kind != FieldKind::Checkbox && self.value.is_empty() {
            Styles::inactive()
        } else {
            Styles::default()
        };

        let paragraph = Paragraph::new(self.display_text())
            .style(text_style)
            .block(block);

        f.render_widget(paragraph, area);

        if self.is_focused && self.accepts_text() {
            let before: String = self.value.chars().take(self.cursor_position).collect();
            let cursor_x = area.x + 1 + before.width() as u16;
            let cursor_y = area.y + 1;
            if cursor_x < area.x + area.width.saturating_sub(1) {
                f.set_cursor(cursor_x, cursor_y);
            }
        }
    }

    /// Validate field value
    pub fn validate(&mut self) -> bool {
        self.validation_error = None;

        if self.kind == FieldKind::Checkbox {
            return true;
        }
        if self.required && self.is_empty() {
            self.validation_error = Some(format!("{} is required", self.label));
            return false;
        }
        if self.kind == FieldKind::Number && !self.is_empty() && self.value.trim().parse::<f64>().is_err() {
            self.validation_error = Some(format!("{} must be a number", self.label));
            return false;
        }

        true
    }
}

/// Form container that manages multiple fields
#[derive(Debug, Clone)]
pub struct Form {
    pub fields: Vec<FormField>,
    pub current_field: usize,
}

impl Form {
    pub fn new(fields: Vec<FormField>) -> Self {
        let mut form = Self {
            fields,
            current_field: 0,
        };
        form.update_focus();
        form
    }

    fn update_focus(&mut self) {
        for (i, field) in self.fields.iter_mut().enumerate() {
            field.set_focus(i == self.current_field);
        }
    }

    pub fn field(&self, key: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.key == key)
    }

    pub fn field_mut(&mut self, key: &str) -> Option<&mut FormField> {
        self.fields.iter_mut().find(|f| f.key == key)
    }

    pub fn get_current_field_mut(&mut self) -> Option<&mut FormField> {
        self.fields.get_mut(self.current_field)
    }

    pub fn focused(&self) -> Option<&FormField> {
        self.fields.get(self.current_field)
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        for field in &mut self.fields {
            field.read_only = read_only;
        }
    }

    /// Validate all fields
    pub fn validate_all(&mut self) -> bool {
        let mut all_valid = true;
        for field in &mut self.fields {
            if !field.validate() {
                all_valid = false;
            }
        }
        all_valid
    }

    /// Height needed to stack every field
    pub fn height(&self) -> u16 {
        self.fields.len() as u16 * 3
    }

    /// Fields drawn in `height` rows: a window that keeps the focused field
    /// in view.
    pub fn visible_range(&self, height: u16) -> std::ops::Range<usize> {
        let fits = usize::from(height / 3).max(1);
        let first = (self.current_field + 1).saturating_sub(fits);
        first..(first + fits).min(self.fields.len())
    }

    pub fn render(&self, f: &mut Frame, area: Rect) {
        let shown = &self.fields[self.visible_range(area.height)];
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(
                shown
                    .iter()
                    .map(|_| Constraint::Length(3))
                    .chain(std::iter::once(Constraint::Min(0))),
            )
            .split(area);

        for (field, chunk) in shown.iter().zip(chunks.iter()) {
            field.render(f, *chunk);
        }
    }
}

impl FormHandler for Form {
    fn get_current_field(&self) -> usize {
        self.current_field
    }

    fn set_current_field(&mut self, field: usize) {
        if field < self.fields.len() {
            self.current_field = field;
            self.update_focus();
        }
    }

    fn get_field_count(&self) -> usize {
        self.fields.len()
    }

    fn handle_char_input(&mut self, c: char) {
        if let Some(field) = self.get_current_field_mut() {
            field.insert_char(c);
        }
    }

    fn handle_backspace(&mut self) {
        if let Some(field) = self.get_current_field_mut() {
            field.delete_char();
        }
    }

    fn handle_delete(&mut self) {
        if let Some(field) = self.get_current_field_mut() {
            field.delete_char_forward();
        }
    }

    fn validate(&mut self) -> Result<(), String> {
        if self.validate_all() {
            return Ok(());
        }
        Err(self
            .fields
            .iter()
            .find_map(|field| field.validation_error.clone())
            .unwrap_or_else(|| "Form validation failed".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unicode_editing() {
        let mut field = FormField::new("nama_kategori", "Nama Kategori", FieldKind::Text);
        for c in "Café".chars() {
            field.insert_char(c);
        }
        field.move_cursor_left();
        field.delete_char();
        assert_eq!(field.value, "Caé");
        field.delete_char_forward();
        assert_eq!(field.value, "Ca");
    }

    #[test]
    fn test_number_field_values() {
        let mut field = FormField::new("isi", "Isi", FieldKind::Number);
        field.load(Some(&json!(12)));
        assert_eq!(field.value, "12");
        assert_eq!(field.json_value(), json!(12));

        field.delete_char();
        field.delete_char();
        field.insert_char('x');
        assert!(!field.validate());
        assert_eq!(field.validation_error.as_deref(), Some("Isi must be a number"));
    }

    #[test]
    fn test_checkbox_and_dropdown() {
        let mut pajak = FormField::new("pajak", "Pajak", FieldKind::Checkbox);
        pajak.load(Some(&json!(1)));
        assert!(pajak.checked);
        pajak.insert_char(' ');
        assert_eq!(pajak.json_value(), json!(false));

        let mut satuan = FormField::new("satuan", "Satuan", FieldKind::Dropdown);
        satuan.options = vec!["pcs".to_string(), "box".to_string()];
        satuan.insert_char('z');
        assert_eq!(satuan.value, "");
        satuan.cycle_option(true);
        assert_eq!(satuan.value, "pcs");
        satuan.cycle_option(false);
        assert_eq!(satuan.value, "box");
    }

    #[test]
    fn test_required_and_masked() {
        let mut form = Form::new(vec![
            FormField::new("name", "Username", FieldKind::Text).required(),
            FormField::new("password", "Password", FieldKind::Text).masked(),
        ]);
        assert_eq!(form.validate(), Err("Username is required".to_string()));

        form.next_field();
        form.handle_char_input('p');
        form.handle_char_input('w');
        assert_eq!(form.field("password").unwrap().display_text(), "**");
        assert_eq!(form.get_current_field(), 1);
    }

    #[test]
    fn test_visible_range_follows_focus() {
        let mut form = Form::new(
            (0..10)
                .map(|i| FormField::new(&format!("f{}", i), "Field", FieldKind::Text))
                .collect(),
        );
        assert_eq!(form.visible_range(12), 0..4);
        assert_eq!(form.visible_range(40), 0..10);

        form.set_current_field(6);
        assert_eq!(form.visible_range(12), 3..7);
        form.set_current_field(9);
        assert_eq!(form.visible_range(12), 6..10);
        assert_eq!(form.visible_range(0), 9..10);
    }

    #[test]
    fn test_read_only_ignores_input() {
        let mut field = FormField::new("nama_barang", "Nama Barang", FieldKind::Text);
        field.load(Some(&json!("Tea")));
        field.read_only = true;
        field.insert_char('!');
        field.delete_char();
        assert_eq!(field.value, "Tea");
    }
}
