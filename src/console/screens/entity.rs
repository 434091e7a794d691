//! CRUD screen for one entity type
//!
//! Composes the data table and the record dialog and owns every backend call
//! they lead to. Calls are queued as [`PendingOp`]s and handed to the app loop
//! one at a time as background jobs, so responses are applied in the order
//! they were requested.

use std::collections::VecDeque;
use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Alignment, Rect},
    text::Line,
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use tracing::{error, info, warn};

use crate::api::{AdminBackend, ApiError};
use crate::console::app::Screen as ScreenType;
use crate::console::components::{
    DataTable, DialogEvent, DialogMode, Notice, RecordDialog, RowAction, RowActions, TableEvent,
};
use crate::console::traits::{Job, Screen, ScreenAction};
use crate::console::ui::Styles;
use crate::models::{EntityKind, FieldSpec, ListQuery, Record, RecordId, RecordPage};
use crate::session::{Credential, Session};

const SAVED: &str = "Your work has been saved!";
const DELETED: &str = "Data deleted successfully!";
const FAILED: &str = "Something went wrong!";

/// Row actions offered on every entity row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowCommand {
    View,
    Edit,
    Delete,
}

/// Which dialog, if any, is showing
#[derive(Debug, Clone, PartialEq)]
pub enum ModalState {
    Closed,
    Creating,
    Editing(Record),
    Viewing(Record),
}

#[derive(Debug, Clone, PartialEq)]
enum PendingOp {
    Fetch(u32),
    LoadLookups,
    LoadDetail { id: RecordId, mode: DialogMode },
    Submit(Record),
    Delete(Record),
}

/// Answers to the backend calls of an [`EntityScreen`]
#[derive(Debug)]
pub enum EntityOutcome {
    Page(Result<RecordPage, ApiError>),
    Lookups(Vec<(FieldSpec, Result<Vec<Record>, ApiError>)>),
    Detail {
        id: RecordId,
        mode: DialogMode,
        result: Result<Record, ApiError>,
    },
    Saved(Result<Option<Record>, ApiError>),
    Deleted {
        record: Record,
        result: Result<(), ApiError>,
    },
}

pub struct EntityScreen {
    kind: EntityKind,
    per_page: u32,
    table: DataTable<RowCommand>,
    dialog: RecordDialog,
    modal: ModalState,
    credential: Option<Credential>,
    pending: VecDeque<PendingOp>,
    fetch_error: Option<String>,
    /// Page of the latest fetch, retried from the error panel
    requested_page: u32,
    lookups_loaded: bool,
}

impl EntityScreen {
    pub fn new(kind: EntityKind, per_page: u32) -> Self {
        let actions = RowActions::new()
            .with(RowAction::new(RowCommand::View, "View", "v", 'v'))
            .with(RowAction::new(RowCommand::Edit, "Edit", "e", 'e'))
            .with(RowAction::new(RowCommand::Delete, "Delete", "d", 'd').confirmed());

        let table = DataTable::new(kind.title(), kind.columns(), actions)
            .with_create("Create New")
            .with_search_placeholder(kind.search_placeholder());

        Self {
            kind,
            per_page,
            table,
            dialog: RecordDialog::new(kind.fields()),
            modal: ModalState::Closed,
            credential: None,
            pending: VecDeque::new(),
            fetch_error: None,
            requested_page: 1,
            lookups_loaded: false,
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn table(&self) -> &DataTable<RowCommand> {
        &self.table
    }

    pub fn dialog(&self) -> &RecordDialog {
        &self.dialog
    }

    pub fn modal(&self) -> &ModalState {
        &self.modal
    }

    pub fn fetch_error(&self) -> Option<&str> {
        self.fetch_error.as_deref()
    }

    fn queue_fetch(&mut self, page: u32) {
        self.requested_page = page;
        self.table.set_loading(true);
        self.pending.push_back(PendingOp::Fetch(page));
    }

    fn open_create(&mut self) {
        self.modal = ModalState::Creating;
        self.dialog.open(DialogMode::Creating, None);
    }

    fn open_record(&mut self, mode: DialogMode, record: Record) {
        self.modal = match mode {
            DialogMode::Viewing => ModalState::Viewing(record.clone()),
            _ => ModalState::Editing(record.clone()),
        };

        match record.id() {
            Some(id) if self.kind.loads_detail() => {
                self.dialog.open_loading(mode);
                self.pending.push_back(PendingOp::LoadDetail { id, mode });
            }
            _ => self.dialog.open(mode, Some(&record)),
        }
    }

    fn close_dialog(&mut self) {
        self.modal = ModalState::Closed;
        self.dialog.close();
    }

    fn handle_table_event(&mut self, event: TableEvent<RowCommand>, key: KeyEvent) -> ScreenAction {
        match event {
            TableEvent::PageChange(page) => {
                info!("{}: page {} requested", self.kind.title(), page);
                self.queue_fetch(page);
                ScreenAction::None
            }
            TableEvent::Action(RowCommand::View, record) => {
                self.open_record(DialogMode::Viewing, record);
                ScreenAction::None
            }
            TableEvent::Action(RowCommand::Edit, record) => {
                self.open_record(DialogMode::Editing, record);
                ScreenAction::None
            }
            TableEvent::Action(RowCommand::Delete, record) => {
                self.pending.push_back(PendingOp::Delete(record));
                ScreenAction::SetStatus("Deleting...".to_string())
            }
            TableEvent::CreateNew => {
                self.open_create();
                ScreenAction::None
            }
            TableEvent::Consumed => ScreenAction::None,
            TableEvent::Ignored => match key.code {
                KeyCode::Char('r') => {
                    self.queue_fetch(self.table.page().current_page);
                    ScreenAction::None
                }
                KeyCode::Esc => ScreenAction::NavigateTo(ScreenType::Dashboard),
                _ => ScreenAction::None,
            },
        }
    }

    fn apply_page(&mut self, result: Result<RecordPage, ApiError>) -> ScreenAction {
        match result {
            Ok(page) => {
                info!(
                    "{}: loaded page {}/{} with {} records",
                    self.kind.title(),
                    page.page.current_page,
                    page.page.total_pages,
                    page.records.len()
                );
                self.fetch_error = None;
                self.table.set_records(page.records, page.page);
                ScreenAction::ClearMessages
            }
            Err(e) => {
                error!("{}: {}", self.kind.fetch_error(), e);
                self.fetch_error = Some(self.kind.fetch_error().to_string());
                self.table.set_loading(false);
                ScreenAction::SetError(e.user_message())
            }
        }
    }

    fn apply_lookups(&mut self, loaded: Vec<(FieldSpec, Result<Vec<Record>, ApiError>)>) -> ScreenAction {
        let mut failures = Vec::new();
        for (spec, result) in loaded {
            let Some(lookup) = spec.lookup else { continue };
            match result {
                Ok(rows) => {
                    let options = rows.iter().map(|row| row.display(&lookup.label_key)).collect();
                    self.dialog.set_lookup_options(&spec.key, options);
                }
                Err(e) => {
                    warn!("Failed to load options for {}: {}", spec.key, e);
                    failures.push(spec.label);
                }
            }
        }

        if failures.is_empty() {
            self.lookups_loaded = true;
            ScreenAction::None
        } else {
            ScreenAction::SetError(format!("Failed to load options for {}", failures.join(", ")))
        }
    }

    fn apply_detail(&mut self, id: RecordId, mode: DialogMode, result: Result<Record, ApiError>) -> ScreenAction {
        // the dialog may have been closed while the record loaded
        if !self.dialog.is_open() || self.dialog.mode() != mode {
            return ScreenAction::None;
        }
        match result {
            Ok(record) => {
                self.modal = match mode {
                    DialogMode::Viewing => ModalState::Viewing(record.clone()),
                    _ => ModalState::Editing(record.clone()),
                };
                self.dialog.load_draft(Some(&record));
                ScreenAction::None
            }
            Err(e) => {
                error!("Failed to load {} {}: {}", self.kind.resource(), id, e);
                self.close_dialog();
                ScreenAction::Notify(Notice::error(self.kind.fetch_error()))
            }
        }
    }

    fn apply_saved(&mut self, result: Result<Option<Record>, ApiError>) -> ScreenAction {
        match result {
            Ok(_) => {
                info!("{}: saved record", self.kind.title());
                self.close_dialog();
                self.queue_fetch(self.table.page().current_page);
                ScreenAction::Notify(Notice::success(SAVED))
            }
            Err(e) => {
                error!("{}: save failed: {}", self.kind.title(), e);
                if self.dialog.is_open() {
                    self.dialog.set_submitting(false);
                    self.dialog.apply_errors(&e);
                }
                ScreenAction::Notify(Notice::error(FAILED))
            }
        }
    }

    fn apply_deleted(&mut self, record: Record, result: Result<(), ApiError>) -> ScreenAction {
        match result {
            Ok(()) => {
                info!("{}: deleted record {:?}", self.kind.title(), record.id());
                self.queue_fetch(self.table.page().current_page);
                ScreenAction::Notify(Notice::success(DELETED))
            }
            Err(e) => {
                error!("{}: delete failed: {}", self.kind.title(), e);
                ScreenAction::Notify(Notice::error(FAILED))
            }
        }
    }

    /// Whether the inline fetch error replaces the table
    fn showing_fetch_error(&self) -> bool {
        self.fetch_error.is_some() && !self.table.is_loading()
    }

    fn draw_fetch_error(&self, f: &mut Frame, area: Rect, message: &str) {
        let text = vec![
            Line::styled(message.to_string(), Styles::error()),
            Line::from(""),
            Line::styled("Press r to retry, Esc to go back", Styles::inactive()),
        ];
        let paragraph = Paragraph::new(text).alignment(Alignment::Center).block(
            Block::default()
                .title(self.kind.title())
                .borders(Borders::ALL)
                .border_style(Styles::error()),
        );
        f.render_widget(paragraph, area);
    }
}

impl Screen for EntityScreen {
    type Outcome = EntityOutcome;

    fn draw(&mut self, f: &mut Frame, area: Rect) {
        match self.fetch_error.clone() {
            Some(message) if self.showing_fetch_error() => self.draw_fetch_error(f, area, &message),
            _ => self.table.render(f, area),
        }
        self.dialog.render(f, area);
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> ScreenAction {
        if self.dialog.is_open() {
            return match self.dialog.handle_key_event(key) {
                DialogEvent::Submit(draft) => {
                    self.dialog.set_submitting(true);
                    self.pending.push_back(PendingOp::Submit(draft));
                    ScreenAction::None
                }
                DialogEvent::Close => {
                    self.close_dialog();
                    ScreenAction::None
                }
                DialogEvent::Consumed | DialogEvent::Ignored => ScreenAction::None,
            };
        }

        // the table is hidden behind the fetch error and its rows are stale
        if self.showing_fetch_error() {
            return match key.code {
                KeyCode::Char('r') => {
                    self.queue_fetch(self.requested_page);
                    ScreenAction::None
                }
                KeyCode::Esc => ScreenAction::NavigateTo(ScreenType::Dashboard),
                _ => ScreenAction::None,
            };
        }

        let event = self.table.handle_key_event(key);
        self.handle_table_event(event, key)
    }

    fn screen_type(&self) -> ScreenType {
        match self.kind {
            EntityKind::Categories => ScreenType::Categories,
            EntityKind::Products => ScreenType::Products,
        }
    }

    fn on_enter(&mut self, credential: Option<&Credential>) -> ScreenAction {
        let Some(credential) = credential else {
            info!("{}: no credential, redirecting to login", self.kind.title());
            return ScreenAction::NavigateTo(ScreenType::Login);
        };

        self.credential = Some(credential.clone());
        self.close_dialog();
        self.fetch_error = None;
        self.pending.clear();
        self.queue_fetch(1);

        let needs_lookups = self.kind.fields().iter().any(|spec| spec.lookup.is_some());
        if needs_lookups && !self.lookups_loaded {
            self.pending.push_back(PendingOp::LoadLookups);
        }
        ScreenAction::None
    }

    fn on_exit(&mut self) {
        self.pending.clear();
        self.close_dialog();
    }

    fn captures_text(&self) -> bool {
        self.dialog.is_open() || self.table.is_searching()
    }

    fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    fn start_pending(&mut self, backend: Arc<dyn AdminBackend>) -> Option<Job<EntityOutcome>> {
        let op = self.pending.pop_front()?;
        let Some(credential) = self.credential.clone() else {
            warn!("{}: dropping queued work without a credential", self.kind.title());
            self.pending.clear();
            return None;
        };
        let resource = self.kind.resource();

        let job: Job<EntityOutcome> = match op {
            PendingOp::Fetch(page) => {
                let query = ListQuery::new(page, self.per_page);
                Box::pin(async move { EntityOutcome::Page(backend.list(&credential, resource, query).await) })
            }
            PendingOp::LoadLookups => {
                let specs: Vec<FieldSpec> = self
                    .kind
                    .fields()
                    .into_iter()
                    .filter(|spec| spec.lookup.is_some())
                    .collect();
                Box::pin(async move {
                    let mut loaded = Vec::with_capacity(specs.len());
                    for spec in specs {
                        let result = match &spec.lookup {
                            Some(lookup) => backend.lookup(&credential, &lookup.path).await,
                            None => continue,
                        };
                        loaded.push((spec, result));
                    }
                    EntityOutcome::Lookups(loaded)
                })
            }
            PendingOp::LoadDetail { id, mode } => Box::pin(async move {
                let result = backend.fetch(&credential, resource, &id).await;
                EntityOutcome::Detail { id, mode, result }
            }),
            PendingOp::Submit(draft) => {
                // None creates, Some(id) updates
                let target = match &self.modal {
                    ModalState::Creating => None,
                    ModalState::Editing(record) => Some(record.id()),
                    ModalState::Viewing(_) | ModalState::Closed => {
                        warn!("Dropping submit without an editable dialog");
                        self.dialog.set_submitting(false);
                        return None;
                    }
                };
                Box::pin(async move {
                    let result = match target {
                        None => backend.create(&credential, resource, &draft).await,
                        Some(Some(id)) => backend.update(&credential, resource, &id, &draft).await,
                        Some(None) => Err(ApiError::MissingId(resource.to_string())),
                    };
                    EntityOutcome::Saved(result)
                })
            }
            PendingOp::Delete(record) => Box::pin(async move {
                let result = match record.id() {
                    Some(id) => backend.delete(&credential, resource, &id).await,
                    None => Err(ApiError::MissingId(resource.to_string())),
                };
                EntityOutcome::Deleted { record, result }
            }),
        };
        Some(job)
    }

    fn complete(&mut self, outcome: EntityOutcome, _session: &mut Session) -> ScreenAction {
        match outcome {
            EntityOutcome::Page(result) => self.apply_page(result),
            EntityOutcome::Lookups(loaded) => self.apply_lookups(loaded),
            EntityOutcome::Detail { id, mode, result } => self.apply_detail(id, mode, result),
            EntityOutcome::Saved(result) => self.apply_saved(result),
            EntityOutcome::Deleted { record, result } => self.apply_deleted(record, result),
        }
    }
}
