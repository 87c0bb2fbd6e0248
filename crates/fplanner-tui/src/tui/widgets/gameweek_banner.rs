// Gameweek banner: the selected gameweek, its deadline and what is planned
// for it.

use chrono::{DateTime, Local, Utc};
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use fplanner_core::analytics::format_price;
use fplanner_core::model::Bootstrap;
use fplanner_core::plan::TransferPlan;

use crate::tui::ViewState;

/// Render the gameweek banner into the given area.
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let line = match state.snapshot.bootstrap.as_deref() {
        Some(bootstrap) if state.snapshot.selected_gameweek > 0 => build_line(state, bootstrap),
        _ => Line::from(Span::styled(
            "  No game data loaded",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::DIM),
        )),
    };

    let paragraph = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Gameweek")
            .border_style(Style::default().fg(Color::Cyan)),
    );
    frame.render_widget(paragraph, area);
}

fn build_line(state: &ViewState, bootstrap: &Bootstrap) -> Line<'static> {
    let snapshot = &state.snapshot;
    let gw = snapshot.selected_gameweek;
    let label = Style::default().fg(Color::Gray);

    let mut spans = vec![Span::styled(
        format!(" GW {gw}"),
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
    )];
    if gw == snapshot.current_gameweek {
        spans.push(Span::styled(" (current)", label));
    }

    let deadline = bootstrap.gameweek(gw).and_then(|e| e.deadline_time);
    spans.push(Span::styled(" | Deadline: ", label));
    spans.push(Span::raw(format_deadline(deadline)));

    spans.push(Span::styled(" | Chip: ", label));
    match snapshot.plans.chip_for(gw) {
        Some(chip) => spans.push(Span::styled(
            chip.label(),
            Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
        )),
        None => spans.push(Span::raw("-")),
    }

    spans.push(Span::styled(" | Transfer: ", label));
    spans.push(Span::raw(
        snapshot
            .plans
            .transfer_for(gw)
            .map(|plan| describe_transfer(plan, bootstrap))
            .unwrap_or_else(|| "-".into()),
    ));

    if let Some(points) = snapshot.gameweek_points {
        spans.push(Span::styled(" | Live: ", label));
        spans.push(Span::styled(
            format!("{points} pts"),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ));
    }

    Line::from(spans)
}

/// Deadline in local time, e.g. "Fri 17 Oct 18:30".
pub fn format_deadline(deadline: Option<DateTime<Utc>>) -> String {
    match deadline {
        Some(d) => d.with_timezone(&Local).format("%a %d %b %H:%M").to_string(),
        None => "TBC".into(),
    }
}

/// "Solanke → Wissa (-£4.0m)" with the cost the plan recorded.
pub fn describe_transfer(plan: &TransferPlan, bootstrap: &Bootstrap) -> String {
    let name = |id| {
        bootstrap
            .player(id)
            .map(|p| p.web_name.clone())
            .unwrap_or_else(|| format!("#{id}"))
    };
    format!(
        "{} → {} ({}{})",
        name(plan.player_out),
        name(plan.player_in),
        if plan.cost > 0 { "+" } else { "" },
        format_price(plan.cost)
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
