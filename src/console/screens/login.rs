//! Login screen

use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use tracing::{error, info};

use crate::api::{AdminBackend, ApiError};
use crate::console::app::Screen as ScreenType;
use crate::console::components::{Form, FormField};
use crate::console::traits::{FormHandler, Job, Screen, ScreenAction};
use crate::console::ui::{centered_box, Styles};
use crate::models::{FieldKind, LoginResponse};
use crate::session::{Credential, Session};

/// Answer to a login attempt
#[derive(Debug)]
pub struct LoginOutcome {
    name: String,
    result: Result<LoginResponse, ApiError>,
}

pub struct LoginScreen {
    form: Form,
    submitting: bool,
    in_flight: bool,
    error_message: Option<String>,
}

impl LoginScreen {
    pub fn new() -> Self {
        Self {
            form: Self::empty_form(),
            submitting: false,
            in_flight: false,
            error_message: None,
        }
    }

    fn empty_form() -> Form {
        Form::new(vec![
            FormField::new("name", "Username", FieldKind::Text)
                .with_placeholder("Enter your username")
                .required(),
            FormField::new("password", "Password", FieldKind::Text)
                .with_placeholder("Enter your password")
                .masked()
                .required(),
        ])
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn form(&self) -> &Form {
        &self.form
    }

    fn value(&self, key: &str) -> String {
        self.form
            .field(key)
            .map(|field| field.value.clone())
            .unwrap_or_default()
    }

    fn submit(&mut self) -> ScreenAction {
        if self.submitting {
            return ScreenAction::None;
        }
        if let Err(message) = self.form.validate() {
            self.error_message = Some(message);
            return ScreenAction::None;
        }
        self.error_message = None;
        self.submitting = true;
        ScreenAction::SetStatus("Signing in...".to_string())
    }
}

impl Default for LoginScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl Screen for LoginScreen {
    type Outcome = LoginOutcome;

    fn draw(&mut self, f: &mut Frame, area: Rect) {
        let popup = centered_box(50, 14, area);
        let block = Block::default()
            .title("Login")
            .title_style(Styles::title())
            .borders(Borders::ALL)
            .border_style(Styles::active_border());
        let inner = block.inner(popup);
        f.render_widget(block, popup);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(self.form.height()),
                Constraint::Min(1),
                Constraint::Length(1),
            ])
            .split(inner);

        self.form.render(f, chunks[0]);

        if let Some(ref message) = self.error_message {
            f.render_widget(Paragraph::new(message.as_str()).style(Styles::error()), chunks[1]);
        }

        let footer = if self.submitting {
            Line::styled("Signing in...", Styles::warning())
        } else {
            Line::from(vec![
                Span::styled("[Enter] Login", Styles::success()),
                Span::raw("   "),
                Span::styled("[Tab] Next field   [Esc] Quit", Styles::inactive()),
            ])
        };
        f.render_widget(Paragraph::new(footer), chunks[2]);
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> ScreenAction {
        if self.submitting {
            return ScreenAction::None;
        }
        match key.code {
            KeyCode::Esc => ScreenAction::Quit,
            KeyCode::Tab | KeyCode::Down => {
                self.form.next_field();
                ScreenAction::None
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.form.previous_field();
                ScreenAction::None
            }
            KeyCode::Enter => {
                if self.form.get_current_field() + 1 < self.form.get_field_count()
                    && self.value("password").is_empty()
                {
                    self.form.next_field();
                    return ScreenAction::None;
                }
                self.submit()
            }
            KeyCode::Left => {
                if let Some(field) = self.form.get_current_field_mut() {
                    field.move_cursor_left();
                }
                ScreenAction::None
            }
            KeyCode::Right => {
                if let Some(field) = self.form.get_current_field_mut() {
                    field.move_cursor_right();
                }
                ScreenAction::None
            }
            KeyCode::Char(c) => {
                self.form.handle_char_input(c);
                ScreenAction::None
            }
            KeyCode::Backspace => {
                self.form.handle_backspace();
                ScreenAction::None
            }
            KeyCode::Delete => {
                self.form.handle_delete();
                ScreenAction::None
            }
            _ => ScreenAction::None,
        }
    }

    fn screen_type(&self) -> ScreenType {
        ScreenType::Login
    }

    fn on_enter(&mut self, credential: Option<&Credential>) -> ScreenAction {
        if credential.is_some() {
            return ScreenAction::NavigateTo(ScreenType::Dashboard);
        }
        self.form = Self::empty_form();
        ScreenAction::None
    }

    fn captures_text(&self) -> bool {
        true
    }

    fn has_pending(&self) -> bool {
        self.submitting && !self.in_flight
    }

    fn start_pending(&mut self, backend: Arc<dyn AdminBackend>) -> Option<Job<LoginOutcome>> {
        if !self.submitting || self.in_flight {
            return None;
        }
        self.in_flight = true;

        let name = self.value("name");
        let password = self.value("password");
        Some(Box::pin(async move {
            let result = backend.login(&name, &password).await;
            LoginOutcome { name, result }
        }))
    }

    fn complete(&mut self, outcome: LoginOutcome, session: &mut Session) -> ScreenAction {
        self.submitting = false;
        self.in_flight = false;

        match outcome.result {
            Ok(response) => {
                if let Some(role) = response.data.as_ref().and_then(|user| user.role.as_deref()) {
                    info!("Logged in as {} with role {}", outcome.name, role);
                }
                match session.sign_in(Credential::new(response.token)) {
                    Ok(()) => ScreenAction::NavigateTo(ScreenType::Dashboard),
                    Err(e) => {
                        error!("Failed to store credential: {}", e);
                        self.error_message = Some(e.to_string());
                        ScreenAction::SetError("Failed to store credential".to_string())
                    }
                }
            }
            Err(e) => {
                error!("Login failed: {}", e);
                let mut lines = vec![e.user_message()];
                for key in ["name", "password"] {
                    if let Some(message) = e.field_error(key) {
                        lines.push(message.to_string());
                    }
                }
                self.error_message = Some(lines.join(" "));
                ScreenAction::None
            }
        }
    }
}
