// Status bar widget: connection status, team name, tab indicator.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use fplanner_app::protocol::ConnectionStatus;

use crate::tui::{TabId, ViewState};

/// Render the status bar into the given area.
///
/// Layout: [connection] [team] [current gameweek] | [tab bar]
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let mut spans = Vec::new();

    let (dot, dot_color) = connection_indicator(state.connection_status);
    spans.push(Span::styled(format!(" {dot} "), Style::default().fg(dot_color)));
    spans.push(Span::styled(
        state.connection_status.label(),
        Style::default().fg(Color::Gray),
    ));
    spans.push(Span::styled(" | ", Style::default().fg(Color::Gray)));

    spans.push(Span::styled(
        team_label(state),
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    ));

    if state.snapshot.current_gameweek > 0 {
        spans.push(Span::styled(
            format!("  Current GW {}", state.snapshot.current_gameweek),
            Style::default().fg(Color::Gray),
        ));
    }

    spans.push(Span::styled(" | ", Style::default().fg(Color::Gray)));
    spans.extend(tab_spans(state.active_tab));

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
    frame.render_widget(paragraph, area);
}

/// Return the connection dot character and its color.
pub fn connection_indicator(status: ConnectionStatus) -> (&'static str, Color) {
    match status {
        ConnectionStatus::Connected => ("●", Color::Green),
        ConnectionStatus::Connecting => ("●", Color::Yellow),
        ConnectionStatus::Disconnected => ("●", Color::Red),
    }
}

/// Team name with the manager's id, or a hint to connect.
fn team_label(state: &ViewState) -> String {
    match (&state.snapshot.manager, state.snapshot.team_id) {
        (Some(manager), _) => format!("{} ({})", manager.name, manager.id),
        (None, Some(id)) => format!("Team {id}"),
        (None, None) => "No team (c to connect)".into(),
    }
}

/// Build tab indicator spans with the active tab highlighted,
/// e.g. "[1:Squad] [2:Planner] [3:Transfers] [4:Analytics] [5:Leagues]".
pub fn tab_spans(active: TabId) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    for (i, tab) in TabId::ALL.iter().enumerate() {
        let style = if *tab == active {
            Style::default()
                .fg(Color::Black)
                .bg(Color::White)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        spans.push(Span::styled(format!("[{}:{}]", i + 1, tab.label()), style));
        spans.push(Span::raw(" "));
    }
    spans
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::test_support::connected_view;

    #[test]
    fn connection_indicator_colors() {
        assert_eq!(connection_indicator(ConnectionStatus::Connected).1, Color::Green);
        assert_eq!(connection_indicator(ConnectionStatus::Connecting).1, Color::Yellow);
        assert_eq!(connection_indicator(ConnectionStatus::Disconnected).1, Color::Red);
    }

    #[test]
    fn tab_spans_highlight_active() {
        let spans = tab_spans(TabId::Transfers);
        // [1:Squad] " " [2:Planner] " " [3:Transfers]
        assert!(spans[4].style.add_modifier.contains(Modifier::BOLD));
        assert!(!spans[0].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn tab_spans_contain_labels() {
        let labels: Vec<String> = tab_spans(TabId::Squad)
            .iter()
            .step_by(2)
            .map(|s| s.content.to_string())
            .collect();
        assert_eq!(
            labels,
            vec![
                "[1:Squad]",
                "[2:Planner]",
                "[3:Transfers]",
                "[4:Analytics]",
                "[5:Leagues]"
            ]
        );
    }

    #[test]
    fn team_label_variants() {
        let state = connected_view();
        assert_eq!(team_label(&state), "Expected Toulouse (4242)");

        let mut state = ViewState::default();
        assert_eq!(team_label(&state), "No team (c to connect)");
        state.snapshot.team_id = Some(99);
        assert_eq!(team_label(&state), "Team 99");
    }

    #[test]
    fn render_does_not_panic_with_defaults() {
        let backend = ratatui::backend::TestBackend::new(80, 1);
        let mut terminal = ratatui::Terminal::new(backend).unwrap();
        let state = ViewState::default();
        terminal
            .draw(|frame| render(frame, frame.area(), &state))
            .unwrap();
    }
}
