// Planner widget: upcoming gameweeks with their planned chip and transfer
// and the finances each plan leaves, plus the season's chip usage.

use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState};
use ratatui::Frame;

use fplanner_core::analytics::format_price;
use fplanner_core::model::Chip;
use fplanner_core::projection::Financials;

use super::gameweek_banner::{describe_transfer, format_deadline};
use crate::tui::{TabId, ViewState};

/// Render the planner into the given area.
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let [table_area, chips_area] =
        Layout::vertical([Constraint::Min(5), Constraint::Length(4)]).areas(area);

    render_outlook(frame, table_area, state);

    let chips = Paragraph::new(chip_lines(state))
        .block(Block::default().borders(Borders::ALL).title("Chips"));
    frame.render_widget(chips, chips_area);
}

fn render_outlook(frame: &mut Frame, area: Rect, state: &ViewState) {
    let snapshot = &state.snapshot;
    let header = Row::new(vec!["GW", "Deadline", "Chip", "Transfer", "Bank", "Value", "Budget"])
        .style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = snapshot
        .outlook
        .iter()
        .map(|row| {
            let transfer = match (&row.transfer, snapshot.bootstrap.as_deref()) {
                (Some(plan), Some(bootstrap)) => describe_transfer(plan, bootstrap),
                _ => "-".into(),
            };
            let money = |f: fn(&Financials) -> i32| {
                row.financials
                    .as_ref()
                    .map(|fin| format_price(f(fin)))
                    .unwrap_or_else(|| "-".into())
            };
            let style = if row.gameweek == snapshot.selected_gameweek {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };

            Row::new(vec![
                Cell::from(row.gameweek.to_string()),
                Cell::from(format_deadline(row.deadline)),
                Cell::from(row.chip.map(|c| c.label()).unwrap_or("-"))
                    .style(Style::default().fg(Color::Magenta)),
                Cell::from(transfer),
                Cell::from(money(|f| f.bank)),
                Cell::from(money(|f| f.squad_value)),
                Cell::from(money(|f| f.total_budget)),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(3),
        Constraint::Length(17),
        Constraint::Length(14),
        Constraint::Min(20),
        Constraint::Length(7),
        Constraint::Length(8),
        Constraint::Length(8),
    ];

    let title = if snapshot.outlook.is_empty() {
        "Planner (no game data)".to_string()
    } else {
        format!("Planner ({} gameweeks)", snapshot.outlook.len())
    };

    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title))
        .row_highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol(">> ");

    let cursor = state
        .scroll(TabId::Planner.scroll_key())
        .min(snapshot.outlook.len().saturating_sub(1));
    let mut table_state = TableState::default().with_selected(Some(cursor));
    frame.render_stateful_widget(table, area, &mut table_state);
}

/// One line with each chip's state: played (with gameweek), planned, or
/// available.
pub fn chip_lines(state: &ViewState) -> Vec<Line<'static>> {
    let snapshot = &state.snapshot;
    let mut spans = vec![Span::raw(" ")];
    for chip in Chip::PLANNABLE {
        let played = snapshot.history.as_ref().and_then(|h| h.chip_played(chip));
        let planned = snapshot
            .plans
            .chips()
            .iter()
            .find(|c| c.chip == chip)
            .map(|c| c.gameweek);
        let (text, color) = match (played, planned) {
            (Some(gw), _) => (format!("{} used GW{gw}", chip.badge()), Color::DarkGray),
            (None, Some(gw)) => (format!("{} planned GW{gw}", chip.badge()), Color::Magenta),
            (None, None) => (format!("{} available", chip.badge()), Color::Green),
        };
        spans.push(Span::styled(text, Style::default().fg(color)));
        spans.push(Span::raw("  "));
    }
    vec![
        Line::from(spans),
        Line::from(Span::styled(
            " w:Wildcard f:Free Hit b:Bench Boost 3:Triple Captain u:Unplan",
            Style::default().fg(Color::Gray),
        )),
    ]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
