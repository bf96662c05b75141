use ratatui::layout::{Constraint, Direction, Layout as RatLayout, Rect};

pub struct Layout {
    pub inner_area: Rect, // Area inside the outer border
    pub tabs_area: Rect,
    pub main_area: Rect,
    /// Right-hand pane: chore details, or the chores of the selected calendar day
    pub detail_area: Rect,
    pub status_area: Rect,
}

impl Layout {
    /// Minimum terminal dimensions required for the application.
    /// Width: 44 columns fits the 7-column calendar grid (7 * 4 + borders) plus a narrow detail pane.
    /// Height: 12 lines fits the tab bar, a six-week calendar and the status line.
    pub const MIN_WIDTH: u16 = 44;
    pub const MIN_HEIGHT: u16 = 12;

    /// Detail pane share of the content width, in percent
    pub const DETAIL_WIDTH_PERCENT: u16 = 40;

    pub fn calculate(size: Rect) -> Self {
        let min_width_with_border = Self::MIN_WIDTH + 2;
        let min_height_with_border = Self::MIN_HEIGHT + 2;
        let width = size.width.max(min_width_with_border);
        let height = size.height.max(min_height_with_border);
        let size = Rect::new(size.x, size.y, width, height);

        let inner_area = Rect::new(
            size.x + 1,
            size.y + 1,
            size.width.saturating_sub(2),
            size.height.saturating_sub(2),
        );

        let vertical = RatLayout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Tabs
                Constraint::Min(1),    // Content
                Constraint::Length(1), // Status
            ])
            .split(inner_area);

        // the calendar grid needs 30 columns; the detail pane gets whatever is left past that
        let detail_width = ((inner_area.width * Self::DETAIL_WIDTH_PERCENT) / 100)
            .min(inner_area.width.saturating_sub(30));

        let horizontal = RatLayout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(1), Constraint::Length(detail_width)])
            .split(vertical[1]);

        Self {
            inner_area,
            tabs_area: vertical[0],
            main_area: horizontal[0],
            detail_area: horizontal[1],
            status_area: vertical[2],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_splits_content() {
        let layout = Layout::calculate(Rect::new(0, 0, 100, 30));
        assert_eq!(layout.inner_area, Rect::new(1, 1, 98, 28));
        assert_eq!(layout.tabs_area.height, 1);
        assert_eq!(layout.status_area.height, 1);
        assert_eq!(layout.detail_area.width, 39);
        assert_eq!(layout.main_area.width + layout.detail_area.width, 98);
    }

    #[test]
    fn test_layout_enforces_minimum_size() {
        let layout = Layout::calculate(Rect::new(0, 0, 10, 5));
        assert_eq!(layout.inner_area.width, Layout::MIN_WIDTH);
        assert_eq!(layout.inner_area.height, Layout::MIN_HEIGHT);
        assert!(layout.main_area.width >= 30);
    }
}
