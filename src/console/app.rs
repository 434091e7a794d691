//! Main console application state and logic

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame, Terminal,
};
use tokio::task::JoinHandle;
use tracing::{error, info};

use super::components::NoticeCenter;
use super::screens::{
    DashboardOutcome, DashboardScreen, EntityOutcome, EntityScreen, LoginOutcome, LoginScreen,
};
use super::traits::{Job, Screen as _, ScreenAction};
use super::ui::centered_rect;
use crate::api::AdminBackend;
use crate::config::Config;
use crate::models::EntityKind;
use crate::session::Session;

/// Application screens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Dashboard,
    Categories,
    Products,
}

impl Screen {
    pub fn title(&self) -> &'static str {
        match self {
            Screen::Login => "Login",
            Screen::Dashboard => "Dashboard",
            Screen::Categories => "Kategori Barang",
            Screen::Products => "Barang",
        }
    }
}

/// How long the loop waits for a key before checking background work
const TICK_RATE: Duration = Duration::from_millis(50);

/// Outcome of a background job, tagged with the screen that queued it
#[derive(Debug)]
enum Completion {
    Login(LoginOutcome),
    Dashboard(DashboardOutcome),
    Categories(EntityOutcome),
    Products(EntityOutcome),
}

fn tagged<T: Send + 'static>(job: Job<T>, tag: fn(T) -> Completion) -> Job<Completion> {
    Box::pin(async move { tag(job.await) })
}

/// Main console application state
pub struct App {
    /// Current active screen
    pub current_screen: Screen,
    /// Previous screen for navigation
    pub previous_screen: Option<Screen>,

    backend: Arc<dyn AdminBackend>,
    session: Session,
    /// The one backend job running at a time
    in_flight: Option<JoinHandle<Completion>>,

    // Screen states
    pub login: LoginScreen,
    pub dashboard: DashboardScreen,
    pub categories: EntityScreen,
    pub products: EntityScreen,

    // Global application state
    pub notices: NoticeCenter,
    pub should_quit: bool,
    pub show_help_popup: bool,
    pub status_message: Option<String>,
    pub error_message: Option<String>,
}

impl App {
    pub fn new(config: &Config, backend: Arc<dyn AdminBackend>, session: Session) -> Self {
        Self {
            current_screen: Screen::Login,
            previous_screen: None,
            backend,
            session,
            in_flight: None,
            login: LoginScreen::new(),
            dashboard: DashboardScreen::new(),
            categories: EntityScreen::new(EntityKind::Categories, config.per_page),
            products: EntityScreen::new(EntityKind::Products, config.per_page),
            notices: NoticeCenter::new(),
            should_quit: false,
            show_help_popup: false,
            status_message: None,
            error_message: None,
        }
    }

    /// Run the main application loop
    pub async fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        self.enter_screen(Screen::Login);

        while !self.should_quit {
            self.start_pending();
            terminal.draw(|f| self.draw(f))?;

            if crossterm::event::poll(TICK_RATE)? {
                if let Event::Key(key) = crossterm::event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key_event(key);
                    }
                }
            }

            self.collect_finished().await;
        }

        self.cancel_in_flight();
        Ok(())
    }

    /// Whether a job is running or the active screen has work queued
    pub fn has_pending(&self) -> bool {
        if self.in_flight.is_some() {
            return true;
        }
        match self.current_screen {
            Screen::Login => self.login.has_pending(),
            Screen::Dashboard => self.dashboard.has_pending(),
            Screen::Categories => self.categories.has_pending(),
            Screen::Products => self.products.has_pending(),
        }
    }

    /// Spawn the active screen's next queued operation unless a job is
    /// already running. One job at a time keeps outcomes in request order.
    pub fn start_pending(&mut self) {
        if self.in_flight.is_some() {
            return;
        }

        let backend = Arc::clone(&self.backend);
        let job = match self.current_screen {
            Screen::Login => self.login.start_pending(backend).map(|job| tagged(job, Completion::Login)),
            Screen::Dashboard => self
                .dashboard
                .start_pending(backend)
                .map(|job| tagged(job, Completion::Dashboard)),
            Screen::Categories => self
                .categories
                .start_pending(backend)
                .map(|job| tagged(job, Completion::Categories)),
            Screen::Products => self
                .products
                .start_pending(backend)
                .map(|job| tagged(job, Completion::Products)),
        };

        if let Some(job) = job {
            self.in_flight = Some(tokio::spawn(job));
        }
    }

    /// Apply the running job's outcome if it has finished
    pub async fn collect_finished(&mut self) {
        if self.in_flight.as_ref().is_some_and(|handle| handle.is_finished()) {
            self.finish_in_flight().await;
        }
    }

    /// Wait for the running job and apply its outcome
    pub async fn finish_in_flight(&mut self) {
        let Some(handle) = self.in_flight.take() else {
            return;
        };
        match handle.await {
            Ok(completion) => self.complete(completion),
            Err(e) => {
                error!("Backend task failed: {}", e);
                self.set_error("Request failed".to_string());
            }
        }
    }

    /// Abort the running job, if any
    pub fn cancel_in_flight(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            info!("Cancelling in-flight request");
            handle.abort();
        }
    }

    fn complete(&mut self, completion: Completion) {
        let session = &mut self.session;
        let action = match completion {
            Completion::Login(outcome) => self.login.complete(outcome, session),
            Completion::Dashboard(outcome) => self.dashboard.complete(outcome, session),
            Completion::Categories(outcome) => self.categories.complete(outcome, session),
            Completion::Products(outcome) => self.products.complete(outcome, session),
        };
        self.apply_action(action);
    }

    fn captures_text(&self) -> bool {
        match self.current_screen {
            Screen::Login => self.login.captures_text(),
            Screen::Dashboard => self.dashboard.captures_text(),
            Screen::Categories => self.categories.captures_text(),
            Screen::Products => self.products.captures_text(),
        }
    }

    /// Handle keyboard input events
    pub fn handle_key_event(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        // An open notice takes every key until dismissed
        if self.notices.is_showing() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
                self.notices.dismiss();
            }
            return;
        }

        if self.show_help_popup {
            if matches!(key.code, KeyCode::Esc | KeyCode::F(1) | KeyCode::Char('?')) {
                self.show_help_popup = false;
            }
            return;
        }

        let text_input = self.captures_text();
        match key.code {
            KeyCode::F(1) => {
                self.show_help_popup = true;
                return;
            }
            KeyCode::Char('?') if !text_input => {
                self.show_help_popup = true;
                return;
            }
            KeyCode::Char('q') if !text_input => {
                self.should_quit = true;
                return;
            }
            _ => {}
        }

        let action = match self.current_screen {
            Screen::Login => self.login.handle_key_event(key),
            Screen::Dashboard => self.dashboard.handle_key_event(key),
            Screen::Categories => self.categories.handle_key_event(key),
            Screen::Products => self.products.handle_key_event(key),
        };
        self.apply_action(action);
    }

    pub fn apply_action(&mut self, action: ScreenAction) {
        match action {
            ScreenAction::NavigateTo(screen) => self.navigate_to_screen(screen),
            ScreenAction::Quit => self.should_quit = true,
            ScreenAction::Notify(notice) => {
                info!("{} {}", notice.title(), notice.message);
                self.notices.show(notice);
            }
            ScreenAction::SetStatus(message) => self.set_status(message),
            ScreenAction::SetError(message) => self.set_error(message),
            ScreenAction::ClearMessages => self.clear_messages(),
            ScreenAction::None => {}
        }
    }

    /// Navigate to a specific screen
    pub fn navigate_to_screen(&mut self, screen: Screen) {
        match self.current_screen {
            Screen::Login => self.login.on_exit(),
            Screen::Dashboard => self.dashboard.on_exit(),
            Screen::Categories => self.categories.on_exit(),
            Screen::Products => self.products.on_exit(),
        }
        self.previous_screen = Some(self.current_screen);
        self.enter_screen(screen);
    }

    fn enter_screen(&mut self, screen: Screen) {
        info!("Entering {} screen", screen.title());
        self.current_screen = screen;
        self.clear_messages();

        let credential = self.session.refresh().cloned();
        let action = match screen {
            Screen::Login => self.login.on_enter(credential.as_ref()),
            Screen::Dashboard => self.dashboard.on_enter(credential.as_ref()),
            Screen::Categories => self.categories.on_enter(credential.as_ref()),
            Screen::Products => self.products.on_enter(credential.as_ref()),
        };
        self.apply_action(action);
    }

    /// Draw the UI
    pub fn draw(&mut self, f: &mut Frame) {
        let size = f.size();

        // Main layout: status bar at bottom, content area above
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        match self.current_screen {
            Screen::Login => self.login.draw(f, chunks[0]),
            Screen::Dashboard => self.dashboard.draw(f, chunks[0]),
            Screen::Categories => self.categories.draw(f, chunks[0]),
            Screen::Products => self.products.draw(f, chunks[0]),
        }

        self.draw_status_bar(f, chunks[1]);

        if self.show_help_popup {
            self.draw_help_popup(f, size);
        }
        self.notices.render(f, size);
    }

    /// Draw status bar with current screen info and shortcuts
    fn draw_status_bar(&self, f: &mut Frame, area: Rect) {
        let status_text = if let Some(ref msg) = self.status_message {
            format!("Status: {}", msg)
        } else if let Some(ref err) = self.error_message {
            format!("Error: {}", err)
        } else {
            format!(
                "POS Admin - {} | ESC: Back | Q: Quit | F1/?: Help",
                self.current_screen.title()
            )
        };

        let style = if self.error_message.is_some() {
            Style::default().fg(Color::Red)
        } else if self.status_message.is_some() {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::Gray)
        };

        let status_bar = Paragraph::new(status_text)
            .style(style)
            .block(Block::default().borders(Borders::ALL));

        f.render_widget(status_bar, area);
    }

    /// Draw help popup with context-sensitive shortcuts
    fn draw_help_popup(&self, f: &mut Frame, area: Rect) {
        let popup_area = centered_rect(70, 60, area);

        f.render_widget(Clear, popup_area);

        let help_popup = Paragraph::new(self.get_context_help())
            .block(
                Block::default()
                    .title("Help - Context Shortcuts")
                    .borders(Borders::ALL)
                    .style(Style::default().fg(Color::Yellow)),
            )
            .style(Style::default().fg(Color::White));

        f.render_widget(help_popup, popup_area);
    }

    /// Get context-sensitive help content
    fn get_context_help(&self) -> String {
        let global_help = "Global Shortcuts:\n\
            Q - Quit application (outside text input)\n\
            Ctrl+C - Quit from anywhere\n\
            F1 / ? - Toggle this help\n\n";

        let screen_help = match self.current_screen {
            Screen::Login => {
                "Login:\n\
                Tab / Shift+Tab - Switch field\n\
                Enter - Next field, or log in from the last one\n\
                Esc - Quit"
            }
            Screen::Dashboard => {
                "Dashboard:\n\
                ↑/↓ - Navigate menu\n\
                Enter - Select option\n\
                k - Kategori Barang\n\
                b - Barang\n\
                l - Logout"
            }
            Screen::Categories | Screen::Products => {
                "Records:\n\
                ↑/↓ - Select row\n\
                ←/→ - Previous / next page\n\
                1-9 - Jump to page, < / > first / last page\n\
                / - Search the current page\n\
                n - Create new\n\
                v / e / d - View / edit / delete selected row\n\
                r - Reload page\n\
                Esc - Back to dashboard\n\n\
                In the editor: Tab moves between fields, ←/→ or Space\n\
                picks dropdown options, Space toggles checkboxes,\n\
                Enter submits, Esc cancels"
            }
        };

        format!("{}{}", global_help, screen_help)
    }

    /// Set status message
    pub fn set_status(&mut self, message: String) {
        self.status_message = Some(message);
        self.error_message = None;
    }

    /// Set error message
    pub fn set_error(&mut self, message: String) {
        self.error_message = Some(message);
        self.status_message = None;
    }

    /// Clear status and error messages
    pub fn clear_messages(&mut self) {
        self.status_message = None;
        self.error_message = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiClient;
    use crate::console::components::Notice;
    use crate::session::{Credential, TokenStore};
    use serde_json::json;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn app_with_backend(dir: &TempDir, backend: &str) -> App {
        let config = Config::default().with_backend(backend);
        let client = ApiClient::new(config.clone()).unwrap();
        let session = Session::open(TokenStore::new(dir.path().join("token")));
        App::new(&config, Arc::new(client), session)
    }

    fn app(dir: &TempDir) -> App {
        app_with_backend(dir, "http://127.0.0.1:9")
    }

    fn signed_in(dir: &TempDir) {
        TokenStore::new(dir.path().join("token"))
            .save(&Credential::new("tok"))
            .unwrap();
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_guarded_screens_redirect_to_login() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);

        app.navigate_to_screen(Screen::Categories);
        assert_eq!(app.current_screen, Screen::Login);
        assert!(!app.has_pending());

        app.navigate_to_screen(Screen::Dashboard);
        assert_eq!(app.current_screen, Screen::Login);
    }

    #[test]
    fn test_stored_credential_goes_to_dashboard() {
        let dir = TempDir::new().unwrap();
        signed_in(&dir);
        let mut app = app(&dir);

        app.navigate_to_screen(Screen::Login);
        assert_eq!(app.current_screen, Screen::Dashboard);
        assert!(app.has_pending());

        app.handle_key_event(key(KeyCode::Char('b')));
        assert_eq!(app.current_screen, Screen::Products);
        assert!(app.products.table().is_loading());
    }

    #[test]
    fn test_notice_blocks_keys_until_dismissed() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);

        app.apply_action(ScreenAction::Notify(Notice::success("Your work has been saved!")));
        app.handle_key_event(key(KeyCode::Char('q')));
        assert!(!app.should_quit);

        app.handle_key_event(key(KeyCode::Enter));
        assert!(!app.notices.is_showing());
        assert_eq!(app.notices.history().len(), 1);
    }

    #[test]
    fn test_quit_is_not_taken_from_text_input() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        app.navigate_to_screen(Screen::Login);

        app.handle_key_event(key(KeyCode::Char('q')));
        assert!(!app.should_quit);
        assert_eq!(app.login.form().field("name").unwrap().value, "q");

        app.handle_key_event(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn test_keys_are_handled_while_a_request_is_in_flight() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/categories"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"data": {"data": [], "current_page": 1, "last_page": 1}}))
                    .set_delay(Duration::from_secs(10)),
            )
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        signed_in(&dir);
        let mut app = app_with_backend(&dir, &server.uri());
        app.navigate_to_screen(Screen::Categories);
        app.start_pending();
        assert!(app.in_flight.is_some());

        app.collect_finished().await;
        assert!(app.categories.table().is_loading());

        app.handle_key_event(key(KeyCode::Char('/')));
        app.handle_key_event(key(KeyCode::Char('x')));
        assert_eq!(app.categories.table().query(), "x");

        app.handle_key_event(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit);
        app.cancel_in_flight();
        assert!(!app.has_pending());
    }

    #[tokio::test]
    async fn test_outcomes_apply_in_request_order() {
        let server = MockServer::start().await;
        for (page, name, delay) in [(1, "Food", 0), (2, "Drinks", 300), (3, "Snacks", 0)] {
            Mock::given(method("GET"))
                .and(path("/api/categories"))
                .and(query_param("page", page.to_string()))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_json(json!({
                            "data": {
                                "data": [{"id": page, "nama_kategori": name}],
                                "current_page": page,
                                "last_page": 3
                            }
                        }))
                        .set_delay(Duration::from_millis(delay)),
                )
                .expect(1)
                .mount(&server)
                .await;
        }

        let dir = TempDir::new().unwrap();
        signed_in(&dir);
        let mut app = app_with_backend(&dir, &server.uri());
        app.navigate_to_screen(Screen::Categories);
        app.start_pending();
        app.finish_in_flight().await;
        assert_eq!(app.categories.table().page().total_pages, 3);

        // page 3 is queued behind the slow page 2 request
        app.handle_key_event(key(KeyCode::Char('2')));
        app.start_pending();
        app.handle_key_event(key(KeyCode::Char('3')));
        app.start_pending();
        assert!(app.categories.has_pending());

        while app.has_pending() {
            app.finish_in_flight().await;
            app.start_pending();
        }
        let table = app.categories.table();
        assert_eq!(table.page().current_page, 3);
        assert_eq!(table.records()[0].display("nama_kategori"), "Snacks");
    }
}
