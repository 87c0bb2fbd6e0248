// Screen layout: panel arrangement and sizing.
//
// Divides the terminal area into fixed zones for the planner dashboard:
//
// +--------------------------------------------------+
// | Status Bar (1 row)                                |
// +--------------------------------------------------+
// | Gameweek Banner (3 rows)                          |
// +-------------------------+------------------------+
// | Main Panel (65%)         | Sidebar (35%)          |
// |                          | +- Finances (40%) ----+|
// |                          | +- Checks (60%) ------+|
// +-------------------------+------------------------+
// | Help Bar (1 row)                                  |
// +--------------------------------------------------+

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Resolved screen areas for each dashboard zone.
#[derive(Debug, Clone)]
pub struct AppLayout {
    /// Top row: connection, team name, tab bar.
    pub status_bar: Rect,
    /// Selected gameweek with its deadline and plans.
    pub gameweek_banner: Rect,
    /// Left side of the middle section: tab-switched content area.
    pub main_panel: Rect,
    /// Right sidebar top: bank, squad value, points.
    pub finances: Rect,
    /// Right sidebar bottom: squad rule violations and availability flags.
    pub checks: Rect,
    /// Bottom row: key hints or the latest notice.
    pub help_bar: Rect,
}

/// Build the dashboard layout from the available terminal area.
pub fn build_layout(area: Rect) -> AppLayout {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // status bar
            Constraint::Length(3), // gameweek banner
            Constraint::Min(8),    // middle section (main + sidebar)
            Constraint::Length(1), // help bar
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(vertical[2]);

    let sidebar = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(horizontal[1]);

    AppLayout {
        status_bar: vertical[0],
        gameweek_banner: vertical[1],
        main_panel: horizontal[0],
        finances: sidebar[0],
        checks: sidebar[1],
        help_bar: vertical[3],
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
