//! Placeholder rows drawn while a page is loading

use ratatui::widgets::{Cell, Row};

use crate::console::ui::Styles;

/// Number of placeholder rows shown in place of data
pub const SKELETON_ROWS: usize = 5;

const PLACEHOLDER: &str = "░░░░░░░░";

/// Cell texts of the loading placeholder: one cell per column plus one for
/// the actions column.
pub fn skeleton_cells(column_count: usize) -> Vec<Vec<&'static str>> {
    (0..SKELETON_ROWS)
        .map(|_| vec![PLACEHOLDER; column_count + 1])
        .collect()
}

pub fn skeleton_rows(column_count: usize) -> Vec<Row<'static>> {
    skeleton_cells(column_count)
        .into_iter()
        .map(|cells| Row::new(cells.into_iter().map(Cell::from)).style(Styles::skeleton()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skeleton_shape() {
        let cells = skeleton_cells(4);
        assert_eq!(cells.len(), 5);
        assert!(cells.iter().all(|row| row.len() == 5));
        assert_eq!(skeleton_rows(4).len(), 5);
    }
}
