//! Modal notices for the outcome of backend writes

use chrono::{DateTime, Local};
use ratatui::{
    layout::{Alignment, Rect},
    text::Line,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::console::ui::{centered_box, Styles};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// One user-facing notice
#[derive(Debug, Clone)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    pub timestamp: DateTime<Local>,
}

/// Notices compare by kind and message; when they were raised is ignored.
impl PartialEq for Notice {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.message == other.message
    }
}

impl Notice {
    pub fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            timestamp: Local::now(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeKind::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeKind::Error, message)
    }

    pub fn title(&self) -> &'static str {
        match self.kind {
            NoticeKind::Success => "Yeay!",
            NoticeKind::Error => "Oops!",
        }
    }
}

/// Dismissed notices kept for the history list
pub const MAX_HISTORY: usize = 100;

/// Shows one notice at a time and remembers the ones already dismissed
#[derive(Debug, Default)]
pub struct NoticeCenter {
    current: Option<Notice>,
    history: Vec<Notice>,
}

impl NoticeCenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self, notice: Notice) {
        self.archive_current();
        self.current = Some(notice);
    }

    pub fn dismiss(&mut self) {
        self.archive_current();
    }

    fn archive_current(&mut self) {
        if let Some(current) = self.current.take() {
            self.history.push(current);
            if self.history.len() > MAX_HISTORY {
                self.history.remove(0);
            }
        }
    }

    pub fn current(&self) -> Option<&Notice> {
        self.current.as_ref()
    }

    pub fn is_showing(&self) -> bool {
        self.current.is_some()
    }

    pub fn history(&self) -> &[Notice] {
        &self.history
    }

    pub fn render(&self, f: &mut Frame, area: Rect) {
        let Some(notice) = &self.current else {
            return;
        };

        let style = match notice.kind {
            NoticeKind::Success => Styles::success(),
            NoticeKind::Error => Styles::error(),
        };

        let popup = centered_box(40, 7, area);
        f.render_widget(Clear, popup);

        let text = vec![
            Line::from(notice.message.clone()),
            Line::from(""),
            Line::styled(
                format!("[Enter] OK  ({})", notice.timestamp.format("%H:%M:%S")),
                Styles::inactive(),
            ),
        ];

        let paragraph = Paragraph::new(text)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .title(notice.title())
                    .title_style(style)
                    .borders(Borders::ALL)
                    .border_style(style),
            );
        f.render_widget(paragraph, popup);
    }
}
