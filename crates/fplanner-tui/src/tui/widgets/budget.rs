// Finances widget: projected bank, squad value and budget for the selected
// gameweek, with the season totals underneath.
//
// Key-value display:
// Bank, Squad value, Budget, GW points, Total, Overall rank

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use fplanner_core::analytics::format_price;

use crate::tui::ViewState;

/// Render the finances panel into the given area.
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let lines = build_lines(state);
    let title = format!("Finances GW {}", state.snapshot.selected_gameweek);
    let paragraph = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(paragraph, area);
}

fn row(label: &'static str, value: String, style: Style) -> Line<'static> {
    Line::from(vec![
        Span::styled(label, Style::default().fg(Color::Gray)),
        Span::styled(value, style),
    ])
}

/// Thousands separators for ranks, e.g. `230,001`.
pub fn format_rank(rank: u32) -> String {
    let digits = rank.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn build_lines(state: &ViewState) -> Vec<Line<'static>> {
    let snapshot = &state.snapshot;
    let Some(fin) = snapshot.financials else {
        return vec![Line::from(Span::styled(
            " No squad loaded",
            Style::default().fg(Color::DarkGray),
        ))];
    };

    let white = Style::default().fg(Color::White);
    let mut lines = vec![
        row(
            " Bank:        ",
            format_price(fin.bank),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        row(" Squad value: ", format_price(fin.squad_value), white),
        row(" Budget:      ", format_price(fin.total_budget), white),
    ];

    if let Some(points) = snapshot.gameweek_points {
        lines.push(row(
            " GW points:   ",
            points.to_string(),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ));
    }
    if let Some(manager) = &snapshot.manager {
        if let Some(total) = manager.summary_overall_points {
            lines.push(row(" Total:       ", total.to_string(), white));
        }
        if let Some(rank) = manager.summary_overall_rank {
            lines.push(row(" Rank:        ", format_rank(rank), white));
        }
    }
    lines
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
