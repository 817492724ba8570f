use ratatui::layout::{Rect, Layout as RatLayout, Direction, Constraint};

pub struct Layout {
    pub inner_area: Rect,  // Area inside the outer border
    pub tabs_area: Rect,
    pub main_area: Rect,
    pub status_area: Rect,
}

impl Layout {
    /// Minimum terminal dimensions (inside the outer border). The beverage
    /// step shows up to four columns side by side.
    pub const MIN_WIDTH: u16 = 60;
    pub const MIN_HEIGHT: u16 = 14;

    /// Split the screen. `show_tabs` is false outside the main tabs, where
    /// the tab row is folded into the content area.
    pub fn calculate(size: Rect, show_tabs: bool) -> Self {
        let width = size.width.max(Self::MIN_WIDTH + 2);
        let height = size.height.max(Self::MIN_HEIGHT + 2);
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
                Constraint::Length(if show_tabs { 1 } else { 0 }),
                Constraint::Min(1),
                Constraint::Length(1),
            ])
            .split(inner_area);

        Self {
            inner_area,
            tabs_area: vertical[0],
            main_area: vertical[1],
            status_area: vertical[2],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tabs_row_only_on_main_screens() {
        let area = Rect::new(0, 0, 80, 24);
        let with_tabs = Layout::calculate(area, true);
        assert_eq!(with_tabs.tabs_area.height, 1);
        assert_eq!(with_tabs.status_area.height, 1);
        assert_eq!(with_tabs.main_area.height, 20);

        let without = Layout::calculate(area, false);
        assert_eq!(without.tabs_area.height, 0);
        assert_eq!(without.main_area.height, 21);
    }

    #[test]
    fn small_terminals_are_padded_to_minimum() {
        let layout = Layout::calculate(Rect::new(0, 0, 10, 5), true);
        assert_eq!(layout.inner_area.width, Layout::MIN_WIDTH);
        assert_eq!(layout.inner_area.height, Layout::MIN_HEIGHT);
    }
}
