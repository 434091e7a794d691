//! Common UI styles and layout helpers for the console

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::ListState,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Common UI styles
pub struct Styles;

impl Styles {
    pub fn default() -> Style {
        Style::default()
    }

    pub fn selected() -> Style {
        Style::default()
            .bg(Color::Blue)
            .fg(Color::White)
            .add_modifier(Modifier::BOLD)
    }

    pub fn title() -> Style {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    }

    pub fn header() -> Style {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Gray)
            .add_modifier(Modifier::BOLD)
    }

    pub fn error() -> Style {
        Style::default()
            .fg(Color::Red)
    }

    pub fn success() -> Style {
        Style::default()
            .fg(Color::Green)
    }

    pub fn warning() -> Style {
        Style::default()
            .fg(Color::Yellow)
    }

    pub fn info() -> Style {
        Style::default()
            .fg(Color::Cyan)
    }

    pub fn inactive() -> Style {
        Style::default()
            .fg(Color::Gray)
    }

    pub fn disabled() -> Style {
        Style::default()
            .fg(Color::DarkGray)
    }

    pub fn skeleton() -> Style {
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::DIM)
    }

    pub fn active_border() -> Style {
        Style::default()
            .fg(Color::Yellow)
    }

    pub fn inactive_border() -> Style {
        Style::default()
            .fg(Color::Gray)
    }
}

/// Selectable list widget with state
pub struct SelectableList<T> {
    pub items: Vec<T>,
    pub state: ListState,
}

impl<T> SelectableList<T> {
    pub fn new(items: Vec<T>) -> Self {
        let mut state = ListState::default();
        if !items.is_empty() {
            state.select(Some(0));
        }
        Self { items, state }
    }

    pub fn next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => (i + 1) % self.items.len(),
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => self.items.len() - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    pub fn selected(&self) -> Option<&T> {
        self.state.selected().and_then(|i| self.items.get(i))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Center a rectangle within another rectangle
pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// Center a box of fixed height, useful for dialogs whose content size is known
pub fn centered_box(percent_x: u16, height: u16, r: Rect) -> Rect {
    let height = height.min(r.height);
    let top = r.y + (r.height - height) / 2;
    let horizontal = centered_rect(percent_x, 100, r);
    Rect::new(horizontal.x, top, horizontal.width, height)
}

/// Truncate a string to a display width (Unicode-aware), adding an ellipsis
pub fn truncate_to_width(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }

    let target_width = max_width.saturating_sub(1);
    let mut truncated = String::new();
    let mut current_width = 0;

    for ch in s.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if current_width + ch_width > target_width {
            break;
        }
        truncated.push(ch);
        current_width += ch_width;
    }

    if max_width > 0 {
        truncated.push('…');
    }
    truncated
}

/// Flatten a test buffer into lines of text.
#[cfg(test)]
pub fn buffer_lines(buffer: &ratatui::buffer::Buffer) -> Vec<String> {
    let area = buffer.area;
    (area.y..area.y + area.height)
        .map(|y| {
            (area.x..area.x + area.width)
                .map(|x| buffer.get(x, y).symbol().to_string())
                .collect::<String>()
        })
        .collect()
}
