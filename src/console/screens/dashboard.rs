//! Dashboard screen: greeting and the main menu

use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};
use tracing::{error, info, warn};

use crate::api::{AdminBackend, ApiError};
use crate::console::app::Screen as ScreenType;
use crate::console::components::Notice;
use crate::console::traits::{Job, Screen, ScreenAction};
use crate::console::ui::{SelectableList, Styles};
use crate::models::{EntityKind, User};
use crate::session::{Credential, Session};

/// Entries of the dashboard menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuEntry {
    Open(EntityKind),
    Logout,
}

impl MenuEntry {
    pub fn label(&self) -> &'static str {
        match self {
            MenuEntry::Open(kind) => kind.menu_label(),
            MenuEntry::Logout => "Logout",
        }
    }

    pub fn shortcut(&self) -> char {
        match self {
            MenuEntry::Open(EntityKind::Categories) => 'k',
            MenuEntry::Open(EntityKind::Products) => 'b',
            MenuEntry::Logout => 'l',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingOp {
    LoadUser,
    Logout,
}

/// Answers to the dashboard's backend calls
#[derive(Debug)]
pub enum DashboardOutcome {
    User(Result<User, ApiError>),
    Logout(Result<(), ApiError>),
}

pub struct DashboardScreen {
    menu: SelectableList<MenuEntry>,
    credential: Option<Credential>,
    user_name: Option<String>,
    user_error: Option<String>,
    pending: Option<PendingOp>,
}

impl DashboardScreen {
    pub fn new() -> Self {
        Self {
            menu: SelectableList::new(vec![
                MenuEntry::Open(EntityKind::Categories),
                MenuEntry::Open(EntityKind::Products),
                MenuEntry::Logout,
            ]),
            credential: None,
            user_name: None,
            user_error: None,
            pending: None,
        }
    }

    pub fn user_name(&self) -> Option<&str> {
        self.user_name.as_deref()
    }

    fn activate(&mut self, entry: MenuEntry) -> ScreenAction {
        match entry {
            MenuEntry::Open(EntityKind::Categories) => ScreenAction::NavigateTo(ScreenType::Categories),
            MenuEntry::Open(EntityKind::Products) => ScreenAction::NavigateTo(ScreenType::Products),
            MenuEntry::Logout => {
                self.pending = Some(PendingOp::Logout);
                ScreenAction::SetStatus("Logging out...".to_string())
            }
        }
    }

    fn draw_greeting(&self, f: &mut Frame, area: Rect) {
        let line = match (&self.user_name, &self.user_error) {
            (Some(name), _) => Line::from(vec![
                Span::raw("Welcome, "),
                Span::styled(name.clone(), Styles::title()),
            ]),
            (None, Some(error)) => Line::styled(error.clone(), Styles::error()),
            (None, None) => Line::styled("Loading user...", Styles::inactive()),
        };
        let paragraph = Paragraph::new(line).block(
            Block::default()
                .title("Dashboard")
                .borders(Borders::ALL)
                .border_style(Styles::inactive_border()),
        );
        f.render_widget(paragraph, area);
    }

    fn draw_menu(&mut self, f: &mut Frame, area: Rect) {
        let selected = self.menu.state.selected();
        let items: Vec<ListItem> = self
            .menu
            .items
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let style = if Some(i) == selected {
                    Styles::selected()
                } else {
                    Style::default()
                };
                ListItem::new(Line::from(vec![
                    Span::styled(format!("[{}] ", entry.shortcut()), Styles::info()),
                    Span::styled(entry.label(), style.add_modifier(Modifier::BOLD)),
                ]))
            })
            .collect();

        let menu = List::new(items)
            .block(
                Block::default()
                    .title("Menu")
                    .borders(Borders::ALL)
                    .border_style(Styles::active_border()),
            )
            .highlight_style(Styles::selected());

        f.render_stateful_widget(menu, area, &mut self.menu.state);
    }
}

impl Default for DashboardScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl Screen for DashboardScreen {
    type Outcome = DashboardOutcome;

    fn draw(&mut self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(1)])
            .split(area);

        self.draw_greeting(f, chunks[0]);
        self.draw_menu(f, chunks[1]);
        f.render_widget(
            Paragraph::new("↑/↓: Move | Enter: Open | k/b/l: Shortcuts | q: Quit").style(Styles::inactive()),
            chunks[2],
        );
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> ScreenAction {
        match key.code {
            KeyCode::Up => {
                self.menu.previous();
                ScreenAction::None
            }
            KeyCode::Down => {
                self.menu.next();
                ScreenAction::None
            }
            KeyCode::Enter => match self.menu.selected().copied() {
                Some(entry) => self.activate(entry),
                None => ScreenAction::None,
            },
            KeyCode::Char(c) => {
                let entry = self
                    .menu
                    .items
                    .iter()
                    .copied()
                    .find(|entry| entry.shortcut() == c.to_ascii_lowercase());
                match entry {
                    Some(entry) => self.activate(entry),
                    None => ScreenAction::None,
                }
            }
            _ => ScreenAction::None,
        }
    }

    fn screen_type(&self) -> ScreenType {
        ScreenType::Dashboard
    }

    fn on_enter(&mut self, credential: Option<&Credential>) -> ScreenAction {
        let Some(credential) = credential else {
            return ScreenAction::NavigateTo(ScreenType::Login);
        };
        self.credential = Some(credential.clone());
        self.user_error = None;
        self.pending = Some(PendingOp::LoadUser);
        ScreenAction::None
    }

    fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    fn start_pending(&mut self, backend: Arc<dyn AdminBackend>) -> Option<Job<DashboardOutcome>> {
        let op = self.pending.take()?;
        let Some(credential) = self.credential.clone() else {
            warn!("Dropping {:?} without a credential", op);
            return None;
        };

        let job: Job<DashboardOutcome> = match op {
            PendingOp::LoadUser => Box::pin(async move {
                DashboardOutcome::User(backend.current_user(&credential).await)
            }),
            PendingOp::Logout => Box::pin(async move {
                DashboardOutcome::Logout(backend.logout(&credential).await)
            }),
        };
        Some(job)
    }

    fn complete(&mut self, outcome: DashboardOutcome, session: &mut Session) -> ScreenAction {
        match outcome {
            DashboardOutcome::User(Ok(user)) => {
                self.user_name = user.name;
                ScreenAction::None
            }
            DashboardOutcome::User(Err(e)) => {
                error!("Failed to fetch user: {}", e);
                self.user_error = Some("Failed to fetch user".to_string());
                ScreenAction::None
            }
            DashboardOutcome::Logout(Ok(())) => {
                self.credential = None;
                self.user_name = None;
                if let Err(e) = session.sign_out() {
                    error!("Failed to remove credential: {}", e);
                    return ScreenAction::SetError(e.to_string());
                }
                info!("Signed out");
                ScreenAction::NavigateTo(ScreenType::Login)
            }
            DashboardOutcome::Logout(Err(e)) => {
                error!("Logout failed: {}", e);
                ScreenAction::Notify(Notice::error(e.user_message()))
            }
        }
    }
}
