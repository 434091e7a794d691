//! Paginated data table
//!
//! Draws one page of records with a search box, row actions, a loading
//! skeleton and a page navigation bar. The table never talks to the backend:
//! page changes and row actions come back to the owner as [`TableEvent`]s.
//!
//! Search only narrows the records of the page currently loaded. Matches on
//! other pages are not shown and the page count is unaffected.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use super::confirm_delete::DeleteConfirmation;
use super::pagination::pagination_line;
use super::row_actions::RowActions;
use super::skeleton::skeleton_rows;
use crate::console::traits::Navigable;
use crate::console::ui::Styles;
use crate::models::{ColumnDescriptor, PageState, Record};

/// What the owner should do after a key was handled by the table
#[derive(Debug, Clone, PartialEq)]
pub enum TableEvent<A> {
    /// Load this page
    PageChange(u32),
    /// Apply a row action to a record
    Action(A, Record),
    /// The "create new" trigger was pressed
    CreateNew,
    /// Handled inside the table
    Consumed,
    /// Not a table key
    Ignored,
}

/// Records whose coerced column values contain `query`, ignoring case.
/// An empty query keeps every record.
pub fn filter_records<'a>(
    records: &'a [Record],
    columns: &[ColumnDescriptor],
    query: &str,
) -> Vec<&'a Record> {
    let needle = query.to_lowercase();
    records
        .iter()
        .filter(|record| {
            needle.is_empty()
                || columns
                    .iter()
                    .any(|column| record.display(&column.key).to_lowercase().contains(&needle))
        })
        .collect()
}

pub struct DataTable<A> {
    pub title: String,
    columns: Vec<ColumnDescriptor>,
    records: Vec<Record>,
    page: PageState,
    actions: RowActions<A>,
    create_label: Option<String>,
    search_placeholder: String,
    query: String,
    searching: bool,
    is_loading: bool,
    state: TableState,
    confirmation: DeleteConfirmation<A>,
}

impl<A: Clone> DataTable<A> {
    pub fn new(title: &str, columns: Vec<ColumnDescriptor>, actions: RowActions<A>) -> Self {
        Self {
            title: title.to_string(),
            columns,
            records: Vec::new(),
            page: PageState::default(),
            actions,
            create_label: None,
            search_placeholder: "Search...".to_string(),
            query: String::new(),
            searching: false,
            is_loading: false,
            state: TableState::default(),
            confirmation: DeleteConfirmation::default(),
        }
    }

    /// Offer a "create new" trigger bound to `n`
    pub fn with_create(mut self, label: &str) -> Self {
        self.create_label = Some(label.to_string());
        self
    }

    pub fn with_search_placeholder(mut self, placeholder: &str) -> Self {
        self.search_placeholder = placeholder.to_string();
        self
    }

    /// Replace the loaded page. The search query is kept.
    pub fn set_records(&mut self, records: Vec<Record>, page: PageState) {
        self.records = records;
        self.page = page;
        self.is_loading = false;
        self.reset_selection();
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.is_loading = loading;
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn page(&self) -> PageState {
        self.page
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn actions(&self) -> &RowActions<A> {
        &self.actions
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_string();
        self.reset_selection();
    }

    pub fn is_searching(&self) -> bool {
        self.searching
    }

    pub fn is_confirming(&self) -> bool {
        self.confirmation.is_pending()
    }

    /// Records of the current page that pass the search query
    pub fn visible_records(&self) -> Vec<&Record> {
        filter_records(&self.records, &self.columns, &self.query)
    }

    pub fn selected_record(&self) -> Option<&Record> {
        let index = self.state.selected()?;
        self.visible_records().get(index).copied()
    }

    /// Cell texts of a data row, in column order
    pub fn row_cells(&self, record: &Record) -> Vec<String> {
        self.columns
            .iter()
            .map(|column| record.display(&column.key))
            .collect()
    }

    /// Request page `number`. Pages outside `1..=total_pages` are ignored.
    pub fn select_page(&mut self, number: u32) -> TableEvent<A> {
        if self.page.contains(number) {
            TableEvent::PageChange(number)
        } else {
            TableEvent::Consumed
        }
    }

    pub fn previous_page(&mut self) -> TableEvent<A> {
        if self.page.has_previous() {
            TableEvent::PageChange(self.page.current_page - 1)
        } else {
            TableEvent::Consumed
        }
    }

    pub fn next_page(&mut self) -> TableEvent<A> {
        if self.page.has_next() {
            TableEvent::PageChange(self.page.current_page + 1)
        } else {
            TableEvent::Consumed
        }
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) -> TableEvent<A> {
        if self.confirmation.is_pending() {
            return self.handle_confirmation_key(key);
        }
        if self.searching {
            return self.handle_search_key(key);
        }

        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.navigate_up();
                TableEvent::Consumed
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.navigate_down();
                TableEvent::Consumed
            }
            KeyCode::Home => {
                self.navigate_to_first();
                TableEvent::Consumed
            }
            KeyCode::End => {
                self.navigate_to_last();
                TableEvent::Consumed
            }
            KeyCode::Left | KeyCode::PageUp => self.previous_page(),
            KeyCode::Right | KeyCode::PageDown => self.next_page(),
            KeyCode::Char(c @ '1'..='9') => self.select_page(c as u32 - '0' as u32),
            KeyCode::Char('<') => self.select_page(1),
            KeyCode::Char('>') => self.select_page(self.page.total_pages),
            KeyCode::Char('/') => {
                self.searching = true;
                TableEvent::Consumed
            }
            KeyCode::Char('n') if self.create_label.is_some() => TableEvent::CreateNew,
            KeyCode::Char(c) => self.trigger_action(c),
            KeyCode::Esc if !self.query.is_empty() => {
                self.set_query("");
                TableEvent::Consumed
            }
            _ => TableEvent::Ignored,
        }
    }

    fn trigger_action(&mut self, key: char) -> TableEvent<A> {
        let Some(action) = self.actions.for_key(key) else {
            return TableEvent::Ignored;
        };
        if self.is_loading {
            return TableEvent::Consumed;
        }
        let Some(record) = self.selected_record().cloned() else {
            return TableEvent::Consumed;
        };

        if action.confirm {
            self.confirmation.request(action.action.clone(), record);
            TableEvent::Consumed
        } else {
            TableEvent::Action(action.action.clone(), record)
        }
    }

    fn handle_confirmation_key(&mut self, key: KeyEvent) -> TableEvent<A> {
        match key.code {
            KeyCode::Enter | KeyCode::Char('y') => match self.confirmation.confirm() {
                Some((action, record)) => TableEvent::Action(action, record),
                None => TableEvent::Consumed,
            },
            KeyCode::Esc | KeyCode::Char('n') => {
                self.confirmation.cancel();
                TableEvent::Consumed
            }
            _ => TableEvent::Consumed,
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) -> TableEvent<A> {
        match key.code {
            KeyCode::Enter => self.searching = false,
            KeyCode::Esc => {
                self.searching = false;
                self.set_query("");
            }
            KeyCode::Backspace => {
                let mut query = self.query.clone();
                query.pop();
                self.set_query(&query);
            }
            KeyCode::Char(c) => {
                let query = format!("{}{}", self.query, c);
                self.set_query(&query);
            }
            _ => {}
        }
        TableEvent::Consumed
    }

    fn reset_selection(&mut self) {
        let count = self.get_item_count();
        self.state.select(if count == 0 { None } else { Some(0) });
    }

    /// Label naming the record in the delete prompt: its first column value
    fn confirmation_label(&self) -> String {
        match (self.confirmation.record(), self.columns.first()) {
            (Some(record), Some(column)) => record.display(&column.key),
            _ => String::new(),
        }
    }

    pub fn render(&mut self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(area);

        self.render_search(f, chunks[0]);
        self.render_rows(f, chunks[1]);
        f.render_widget(Paragraph::new(pagination_line(self.page)), chunks[2]);
        self.render_hints(f, chunks[3]);

        let label = self.confirmation_label();
        self.confirmation.render(f, area, &label);
    }

    fn render_search(&self, f: &mut Frame, area: Rect) {
        let (text, style) = if self.query.is_empty() && !self.searching {
            (self.search_placeholder.clone(), Styles::inactive())
        } else {
            (self.query.clone(), Styles::default())
        };

        let border = if self.searching {
            Styles::active_border()
        } else {
            Styles::inactive_border()
        };

        let block = Block::default()
            .title("Search (current page)")
            .borders(Borders::ALL)
            .border_style(border);
        f.render_widget(Paragraph::new(text).style(style).block(block), area);

        if self.searching {
            let cursor_x = area.x + 1 + self.query.width() as u16;
            if cursor_x < area.x + area.width.saturating_sub(1) {
                f.set_cursor(cursor_x, area.y + 1);
            }
        }
    }

    fn render_rows(&mut self, f: &mut Frame, area: Rect) {
        let header = Row::new(
            self.columns
                .iter()
                .map(|column| Cell::from(column.header.clone()))
                .chain(std::iter::once(Cell::from("Actions"))),
        )
        .style(Styles::header());

        let rows: Vec<Row> = if self.is_loading {
            skeleton_rows(self.columns.len())
        } else {
            let visible = self.visible_records();
            if visible.is_empty() {
                vec![Row::new(vec![Cell::from("No data available")]).style(Styles::inactive())]
            } else {
                let actions = self.actions.cell_text();
                visible
                    .iter()
                    .map(|record| {
                        Row::new(
                            self.row_cells(record)
                                .into_iter()
                                .map(Cell::from)
                                .chain(std::iter::once(Cell::from(actions.clone()))),
                        )
                    })
                    .collect()
            }
        };

        let actions_width = self.actions.cell_text().width().max("Actions".len()) as u16;
        let widths: Vec<Constraint> = self
            .columns
            .iter()
            .map(|_| Constraint::Min(6))
            .chain(std::iter::once(Constraint::Length(actions_width)))
            .collect();

        let title = match &self.create_label {
            Some(label) => Line::from(vec![
                Span::styled(self.title.clone(), Styles::title()),
                Span::raw("  "),
                Span::styled(format!("[n] {}", label), Styles::success()),
            ]),
            None => Line::from(Span::styled(self.title.clone(), Styles::title())),
        };

        let table = Table::new(rows, widths)
            .header(header)
            .highlight_style(Styles::selected())
            .block(
                Block::default()
                    .title(title)
                    .borders(Borders::ALL)
                    .border_style(Styles::active_border()),
            );

        if self.is_loading {
            f.render_widget(table, area);
        } else {
            f.render_stateful_widget(table, area, &mut self.state);
        }
    }

    fn render_hints(&self, f: &mut Frame, area: Rect) {
        let hints = if self.searching {
            "Type to filter | Enter: Done | Esc: Clear".to_string()
        } else {
            let mut parts = vec!["↑↓: Select".to_string(), "←→/1-9: Page".to_string(), "/: Search".to_string()];
            if !self.actions.is_empty() {
                parts.push(self.actions.hints());
            }
            parts.join(" | ")
        };
        f.render_widget(Paragraph::new(hints).style(Styles::inactive()), area);
    }
}

impl<A: Clone> Navigable for DataTable<A> {
    fn navigate_up(&mut self) {
        let count = self.get_item_count();
        if count == 0 {
            return;
        }
        let selected = self.state.selected().unwrap_or(0);
        self.state
            .select(Some(if selected == 0 { count - 1 } else { selected - 1 }));
    }

    fn navigate_down(&mut self) {
        let count = self.get_item_count();
        if count == 0 {
            return;
        }
        let selected = self.state.selected().unwrap_or(0);
        self.state.select(Some((selected + 1) % count));
    }

    fn get_selected_index(&self) -> Option<usize> {
        self.state.selected()
    }

    fn set_selected_index(&mut self, index: Option<usize>) {
        self.state.select(index);
    }

    fn get_item_count(&self) -> usize {
        if self.is_loading {
            0
        } else {
            self.visible_records().len()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::components::row_actions::RowAction;
    use crate::console::ui::buffer_lines;
    use crossterm::event::KeyModifiers;
    use ratatui::{backend::TestBackend, Terminal};
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq)]
    enum Act {
        View,
        Delete,
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn columns() -> Vec<ColumnDescriptor> {
        vec![
            ColumnDescriptor::new("id", "ID"),
            ColumnDescriptor::new("nama_kategori", "Nama Kategori"),
        ]
    }

    fn category(id: i64, name: &str) -> Record {
        Record::new().with("id", id).with("nama_kategori", name)
    }

    fn table() -> DataTable<Act> {
        let actions = RowActions::new()
            .with(RowAction::new(Act::View, "View", "v", 'v'))
            .with(RowAction::new(Act::Delete, "Delete", "d", 'd').confirmed());
        DataTable::new("Categories", columns(), actions).with_create("Create New")
    }

    fn draw(table: &mut DataTable<Act>) -> Vec<String> {
        let mut terminal = Terminal::new(TestBackend::new(80, 16)).unwrap();
        terminal.draw(|f| {
            let area = f.size();
            table.render(f, area)
        }).unwrap();
        buffer_lines(terminal.backend().buffer())
    }

    #[test]
    fn test_filter_matches_any_column_ignoring_case() {
        let records = vec![category(1, "Food"), category(2, "Drinks"), category(3, "Snacks")];

        let filtered = filter_records(&records, &columns(), "dri");
        assert_eq!(filtered, vec![&records[1]]);

        let by_id = filter_records(&records, &columns(), "3");
        assert_eq!(by_id, vec![&records[2]]);

        assert_eq!(filter_records(&records, &columns(), "").len(), 3);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let records = vec![category(1, "Food"), category(2, "Frozen Food"), category(3, "Drinks")];
        let once: Vec<Record> = filter_records(&records, &columns(), "FOOD")
            .into_iter()
            .cloned()
            .collect();
        let twice: Vec<Record> = filter_records(&once, &columns(), "FOOD")
            .into_iter()
            .cloned()
            .collect();
        assert_eq!(once, twice);
        assert_eq!(once.len(), 2);
    }

    #[test]
    fn test_filter_sees_coerced_values() {
        let records = vec![Record::from_value(json!({"id": 7, "nama_kategori": null})).unwrap()];
        assert_eq!(filter_records(&records, &columns(), "null").len(), 1);
    }

    #[test]
    fn test_one_row_per_record() {
        let mut table = table();
        table.set_records(
            vec![category(1, "Food"), category(2, "Drinks")],
            PageState::new(1, 1),
        );

        let lines = draw(&mut table);
        let data_rows = lines
            .iter()
            .filter(|line| line.contains("Food") || line.contains("Drinks"))
            .count();
        assert_eq!(data_rows, 2);
        assert_eq!(table.get_item_count(), 2);
    }

    #[test]
    fn test_categories_page_scenario() {
        let mut table = table();
        let record = Record::from_value(json!({
            "id": 1,
            "nama_kategori": "Food",
            "created_by": "admin",
            "created_at": "2024-01-01"
        }))
        .unwrap();
        table.set_records(vec![record.clone()], PageState::new(1, 3));

        assert_eq!(table.row_cells(&record)[..2], ["1".to_string(), "Food".to_string()]);
        assert!(!table.page().has_previous());
        assert!(table.page().has_next());

        let lines = draw(&mut table);
        assert!(lines.iter().any(|line| line.contains("Food")));
        assert!(lines.iter().any(|line| line.contains("[1] 2  3")));

        assert_eq!(table.handle_key_event(key(KeyCode::Left)), TableEvent::Consumed);
        assert_eq!(table.handle_key_event(key(KeyCode::Right)), TableEvent::PageChange(2));
        assert_eq!(table.handle_key_event(key(KeyCode::Char('3'))), TableEvent::PageChange(3));
        assert_eq!(table.handle_key_event(key(KeyCode::Char('4'))), TableEvent::Consumed);
    }

    #[test]
    fn test_next_disabled_on_last_page() {
        let mut table = table();
        table.set_records(vec![category(1, "Food")], PageState::new(3, 3));
        assert_eq!(table.handle_key_event(key(KeyCode::Right)), TableEvent::Consumed);
        assert_eq!(table.handle_key_event(key(KeyCode::Left)), TableEvent::PageChange(2));
    }

    #[test]
    fn test_search_narrows_rows() {
        let mut table = table();
        table.set_records(
            vec![category(1, "Food"), category(2, "Drinks")],
            PageState::new(1, 1),
        );

        table.handle_key_event(key(KeyCode::Char('/')));
        assert!(table.is_searching());
        for c in "dri".chars() {
            table.handle_key_event(key(KeyCode::Char(c)));
        }
        table.handle_key_event(key(KeyCode::Enter));

        assert_eq!(table.query(), "dri");
        assert_eq!(table.visible_records(), vec![&category(2, "Drinks")]);
        let lines = draw(&mut table);
        assert!(!lines.iter().any(|line| line.contains("Food")));
    }

    #[test]
    fn test_empty_page_message() {
        let mut table = table();
        table.set_records(Vec::new(), PageState::new(1, 0));
        let lines = draw(&mut table);
        assert!(lines.iter().any(|line| line.contains("No data available")));
    }

    #[test]
    fn test_loading_draws_skeleton() {
        let mut table = table();
        table.set_records(vec![category(1, "Food")], PageState::new(1, 1));
        table.set_loading(true);

        let lines = draw(&mut table);
        assert!(!lines.iter().any(|line| line.contains("Food")));
        assert_eq!(lines.iter().filter(|line| line.contains("░░░")).count(), 5);
        assert_eq!(table.handle_key_event(key(KeyCode::Char('v'))), TableEvent::Consumed);
    }

    #[test]
    fn test_delete_emits_once_after_confirm() {
        let mut table = table();
        table.set_records(vec![category(1, "Food")], PageState::new(1, 1));

        assert_eq!(table.handle_key_event(key(KeyCode::Char('d'))), TableEvent::Consumed);
        assert!(table.is_confirming());
        let lines = draw(&mut table);
        assert!(lines.iter().any(|line| line.contains("Are you absolutely sure?")));

        assert_eq!(
            table.handle_key_event(key(KeyCode::Enter)),
            TableEvent::Action(Act::Delete, category(1, "Food"))
        );
        assert!(!table.is_confirming());
        assert_eq!(table.handle_key_event(key(KeyCode::Enter)), TableEvent::Ignored);
    }

    #[test]
    fn test_cancelled_delete_emits_nothing() {
        let mut table = table();
        table.set_records(vec![category(1, "Food")], PageState::new(1, 1));

        table.handle_key_event(key(KeyCode::Char('d')));
        assert_eq!(table.handle_key_event(key(KeyCode::Esc)), TableEvent::Consumed);
        assert!(!table.is_confirming());
    }

    #[test]
    fn test_view_action_and_create_trigger() {
        let mut table = table();
        table.set_records(vec![category(1, "Food"), category(2, "Drinks")], PageState::new(1, 1));

        table.handle_key_event(key(KeyCode::Down));
        assert_eq!(
            table.handle_key_event(key(KeyCode::Char('v'))),
            TableEvent::Action(Act::View, category(2, "Drinks"))
        );
        assert_eq!(table.handle_key_event(key(KeyCode::Char('n'))), TableEvent::CreateNew);
        assert_eq!(table.handle_key_event(key(KeyCode::Char('r'))), TableEvent::Ignored);
    }
}
