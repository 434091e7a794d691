//! Core traits for the console architecture
//!
//! Screens never talk to the terminal or to each other directly. Key handling
//! is synchronous and answers with a [`ScreenAction`]. Backend work is queued
//! by the screen and handed to the app loop as a [`Job`] through
//! [`Screen::start_pending`]; the app runs it on a background task and feeds
//! its outcome back through [`Screen::complete`].

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crossterm::event::KeyEvent;
use ratatui::{layout::Rect, Frame};

use crate::api::AdminBackend;
use crate::console::app::Screen as ScreenType;
use crate::console::components::Notice;
use crate::session::{Credential, Session};

/// Actions that can be returned from screen event handling
#[derive(Debug, Clone, PartialEq)]
pub enum ScreenAction {
    /// Navigate to a different screen
    NavigateTo(ScreenType),
    /// Quit the application
    Quit,
    /// Show a modal alert to the user
    Notify(Notice),
    /// Set status bar message
    SetStatus(String),
    /// Set status bar error
    SetError(String),
    /// Clear status bar messages
    ClearMessages,
    /// No action taken
    None,
}

/// Backend work detached from the screen that queued it
pub type Job<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// Core trait for all console screens
pub trait Screen {
    /// Result of one backend job, applied back through [`Screen::complete`]
    type Outcome: Send + 'static;

    /// Draw the screen content
    fn draw(&mut self, f: &mut Frame, area: Rect);

    /// Handle keyboard input and return an action for the app
    fn handle_key_event(&mut self, key: KeyEvent) -> ScreenAction;

    /// Get the screen type identifier
    fn screen_type(&self) -> ScreenType;

    /// Called when the screen becomes active, with the credential stored at
    /// that moment
    fn on_enter(&mut self, _credential: Option<&Credential>) -> ScreenAction {
        ScreenAction::None
    }

    /// Called when the screen becomes inactive
    fn on_exit(&mut self) {}

    /// Whether typed characters currently go into a text input
    fn captures_text(&self) -> bool {
        false
    }

    /// Whether backend work is queued
    fn has_pending(&self) -> bool {
        false
    }

    /// Take the next queued backend operation as a job that owns everything
    /// it needs
    fn start_pending(&mut self, _backend: Arc<dyn AdminBackend>) -> Option<Job<Self::Outcome>> {
        None
    }

    /// Apply the outcome of a finished job
    fn complete(&mut self, _outcome: Self::Outcome, _session: &mut Session) -> ScreenAction {
        ScreenAction::None
    }
}

/// Start the next queued job of `screen` and apply its outcome in place.
#[cfg(test)]
pub(crate) async fn run_next<S: Screen>(
    screen: &mut S,
    backend: Arc<dyn AdminBackend>,
    session: &mut Session,
) -> ScreenAction {
    match screen.start_pending(backend) {
        Some(job) => {
            let outcome = job.await;
            screen.complete(outcome, session)
        }
        None => ScreenAction::None,
    }
}

/// Trait for components with navigable rows
pub trait Navigable {
    /// Move selection up
    fn navigate_up(&mut self);

    /// Move selection down
    fn navigate_down(&mut self);

    /// Get currently selected index
    fn get_selected_index(&self) -> Option<usize>;

    /// Set selected index
    fn set_selected_index(&mut self, index: Option<usize>);

    /// Get total number of items
    fn get_item_count(&self) -> usize;

    /// Navigate to first item
    fn navigate_to_first(&mut self) {
        if self.get_item_count() > 0 {
            self.set_selected_index(Some(0));
        }
    }

    /// Navigate to last item
    fn navigate_to_last(&mut self) {
        let count = self.get_item_count();
        if count > 0 {
            self.set_selected_index(Some(count - 1));
        }
    }
}

/// Trait for form handling
pub trait FormHandler {
    /// Get current field index
    fn get_current_field(&self) -> usize;

    /// Set current field
    fn set_current_field(&mut self, field: usize);

    /// Get total number of fields
    fn get_field_count(&self) -> usize;

    /// Move to next field
    fn next_field(&mut self) {
        let total = self.get_field_count();
        if total == 0 {
            return;
        }
        let current = self.get_current_field();
        self.set_current_field((current + 1) % total);
    }

    /// Move to previous field
    fn previous_field(&mut self) {
        let total = self.get_field_count();
        if total == 0 {
            return;
        }
        let current = self.get_current_field();
        self.set_current_field(if current == 0 { total - 1 } else { current - 1 });
    }

    /// Handle character input for current field
    fn handle_char_input(&mut self, c: char);

    /// Handle backspace for current field
    fn handle_backspace(&mut self);

    /// Handle delete for current field
    fn handle_delete(&mut self);

    /// Validate form data, marking invalid fields
    fn validate(&mut self) -> Result<(), String>;
}
