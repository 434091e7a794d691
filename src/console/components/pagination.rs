//! Page navigation bar for server-side pagination

use ratatui::{
    text::{Line, Span},
    style::Style,
};

use crate::console::ui::Styles;
use crate::models::PageState;

/// One entry between the Previous and Next controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLink {
    Page { number: u32, active: bool },
    Ellipsis,
}

/// Numbered links for a page state.
///
/// The first and last page are always listed, plus the current page and its
/// direct neighbours. Pages two away from the current one collapse into an
/// ellipsis; everything further out is dropped.
pub fn page_links(page: PageState) -> Vec<PageLink> {
    let current = page.current_page;
    let total = page.total_pages;

    let mut numbers = vec![
        1,
        current.saturating_sub(2),
        current.saturating_sub(1),
        current,
        current.saturating_add(1),
        current.saturating_add(2),
        total,
    ];
    numbers.retain(|&number| number >= 1 && number <= total);
    numbers.sort_unstable();
    numbers.dedup();

    numbers
        .into_iter()
        .map(|number| {
            if number == 1 || number == total || number.abs_diff(current) <= 1 {
                PageLink::Page {
                    number,
                    active: number == current,
                }
            } else {
                PageLink::Ellipsis
            }
        })
        .collect()
}

/// Render the bar as a single line: `‹ Previous  1 [2] 3 …  9  Next ›`
pub fn pagination_line(page: PageState) -> Line<'static> {
    let control_style = |enabled: bool| {
        if enabled {
            Styles::info()
        } else {
            Styles::disabled()
        }
    };

    let mut spans = vec![
        Span::styled("‹ Previous", control_style(page.has_previous())),
        Span::raw("  "),
    ];

    for link in page_links(page) {
        match link {
            PageLink::Page { number, active: true } => {
                spans.push(Span::styled(format!("[{}]", number), Styles::selected()));
            }
            PageLink::Page { number, active: false } => {
                spans.push(Span::styled(format!(" {} ", number), Style::default()));
            }
            PageLink::Ellipsis => spans.push(Span::styled(" … ", Styles::inactive())),
        }
    }

    spans.push(Span::raw("  "));
    spans.push(Span::styled("Next ›", control_style(page.has_next())));
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(links: &[PageLink]) -> Vec<Option<u32>> {
        links
            .iter()
            .map(|link| match link {
                PageLink::Page { number, .. } => Some(*number),
                PageLink::Ellipsis => None,
            })
            .collect()
    }

    #[test]
    fn test_small_page_count_lists_every_page() {
        let links = page_links(PageState::new(1, 3));
        assert_eq!(numbers(&links), vec![Some(1), Some(2), Some(3)]);
        assert_eq!(
            links[0],
            PageLink::Page {
                number: 1,
                active: true
            }
        );
    }

    #[test]
    fn test_window_around_current_page() {
        let links = page_links(PageState::new(5, 10));
        assert_eq!(
            numbers(&links),
            vec![Some(1), None, Some(4), Some(5), Some(6), None, Some(10)]
        );
    }

    #[test]
    fn test_near_start() {
        let links = page_links(PageState::new(2, 10));
        assert_eq!(numbers(&links), vec![Some(1), Some(2), Some(3), None, Some(10)]);
    }

    #[test]
    fn test_last_page_of_a_huge_range() {
        let links = page_links(PageState::new(u32::MAX, u32::MAX));
        assert_eq!(
            numbers(&links),
            vec![Some(1), None, Some(u32::MAX - 1), Some(u32::MAX)]
        );

        let links = page_links(PageState::new(1, u32::MAX));
        assert_eq!(numbers(&links), vec![Some(1), Some(2), None, Some(u32::MAX)]);
    }

    #[test]
    fn test_no_pages() {
        assert!(page_links(PageState::new(1, 0)).is_empty());
    }

    #[test]
    fn test_line_text() {
        let line = pagination_line(PageState::new(1, 3));
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text, "‹ Previous  [1] 2  3   Next ›");
    }
}
