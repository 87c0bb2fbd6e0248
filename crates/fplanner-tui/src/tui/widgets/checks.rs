// Checks widget: squad rule violations of the projected squad, followed by
// availability flags for every squad player who is not fully fit.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use fplanner_core::analytics::{availability_alerts, Severity};

use crate::tui::ViewState;

/// Render the checks panel into the given area.
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let lines = build_lines(state);
    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Checks"))
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

pub fn severity_color(severity: Option<Severity>) -> Color {
    match severity {
        Some(Severity::Red) => Color::Red,
        Some(Severity::Orange) => Color::LightRed,
        Some(Severity::Yellow) => Color::Yellow,
        None => Color::Green,
    }
}

fn build_lines(state: &ViewState) -> Vec<Line<'static>> {
    let snapshot = &state.snapshot;
    let (Some(squad), Some(bootstrap)) = (&snapshot.squad, snapshot.bootstrap.as_deref()) else {
        return vec![Line::from(Span::styled(
            " Nothing to check yet",
            Style::default().fg(Color::DarkGray),
        ))];
    };

    let mut lines = Vec::new();
    if snapshot.validation.is_empty() {
        lines.push(Line::from(Span::styled(
            " ✓ Squad is valid",
            Style::default().fg(Color::Green),
        )));
    } else {
        for error in &snapshot.validation {
            lines.push(Line::from(Span::styled(
                format!(" ✗ {error}"),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )));
        }
    }

    let alerts = availability_alerts(squad, bootstrap);
    lines.push(Line::from(""));
    if alerts.is_empty() {
        lines.push(Line::from(Span::styled(
            " All players available",
            Style::default().fg(Color::Green),
        )));
    }
    for (player, availability) in alerts {
        let color = severity_color(availability.severity());
        let mut spans = vec![
            Span::styled(
                format!(" {:<12}", player.web_name),
                Style::default().fg(Color::White),
            ),
            Span::styled(availability.label(), Style::default().fg(color)),
        ];
        if !player.news.is_empty() {
            spans.push(Span::styled(
                format!(" {}", player.news),
                Style::default().fg(Color::Gray),
            ));
        }
        lines.push(Line::from(spans));
    }
    lines
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
