// Squad widget: the projected fifteen for the selected gameweek.
//
// Starting XI first, bench dimmed below. Each row shows price, form, the
// club's fixtures in the gameweek, live points once they exist, and the
// availability flag.

use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState};
use ratatui::Frame;

use fplanner_core::analytics::{describe_fixtures, fixtures_by_club, format_price, Availability};
use fplanner_core::model::{PlayerId, STARTING_XI};

use super::checks::severity_color;
use crate::tui::{TabId, ViewState};

/// Render the squad table into the given area.
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let snapshot = &state.snapshot;
    let (Some(squad), Some(bootstrap)) = (&snapshot.squad, snapshot.bootstrap.as_deref()) else {
        let paragraph = Paragraph::new("  No squad loaded. Press c to connect a team.")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title("Squad"));
        frame.render_widget(paragraph, area);
        return;
    };

    let gw = snapshot.selected_gameweek;
    let by_club = fixtures_by_club(&snapshot.fixtures, gw);

    let header = Row::new(vec![
        "", "Player", "Pos", "Club", "Price", "Form", "Fixture", "Pts", "Status",
    ])
    .style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = squad
        .picks
        .iter()
        .enumerate()
        .map(|(i, pick)| {
            let role = if pick.is_captain {
                "C"
            } else if pick.is_vice_captain {
                "V"
            } else {
                ""
            };
            let base_style = if i >= STARTING_XI {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default()
            };

            let Some(player) = bootstrap.player(pick.element) else {
                return Row::new(vec![
                    Cell::from(role),
                    Cell::from(format!("#{}", pick.element)),
                ])
                .style(base_style);
            };

            let fixtures = by_club.get(&player.team).map(Vec::as_slice).unwrap_or(&[]);
            let points = snapshot
                .live
                .as_ref()
                .and_then(|live| live.stats_for(player.id))
                .map(|s| s.total_points.to_string())
                .unwrap_or_else(|| "-".into());
            let availability = Availability::of(player);

            Row::new(vec![
                Cell::from(role).style(Style::default().fg(Color::Yellow)),
                Cell::from(player.web_name.clone()),
                Cell::from(player.position.short_name()),
                Cell::from(bootstrap.club_short_name(player).to_string()),
                Cell::from(format_price(player.now_cost)),
                Cell::from(format!("{:.1}", player.form)),
                Cell::from(describe_fixtures(bootstrap, fixtures)),
                Cell::from(points),
                Cell::from(availability.label())
                    .style(Style::default().fg(severity_color(availability.severity()))),
            ])
            .style(base_style)
        })
        .collect();

    let title = match snapshot.base_gameweek {
        Some(base) if base != gw => format!("Squad GW {gw} (projected from GW {base})"),
        _ => format!("Squad GW {gw}"),
    };

    let widths = [
        Constraint::Length(2),
        Constraint::Min(12),
        Constraint::Length(4),
        Constraint::Length(5),
        Constraint::Length(7),
        Constraint::Length(5),
        Constraint::Min(10),
        Constraint::Length(4),
        Constraint::Length(12),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title))
        .row_highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White))
        .highlight_symbol(">> ");

    let mut table_state = TableState::default().with_selected(Some(cursor(state)));
    frame.render_stateful_widget(table, area, &mut table_state);
}

/// Number of rows in the squad table.
pub fn row_count(state: &ViewState) -> usize {
    state.snapshot.squad.as_ref().map_or(0, |s| s.picks.len())
}

fn cursor(state: &ViewState) -> usize {
    state
        .scroll(TabId::Squad.scroll_key())
        .min(row_count(state).saturating_sub(1))
}

/// Player under the cursor.
pub fn highlighted(state: &ViewState) -> Option<PlayerId> {
    let squad = state.snapshot.squad.as_ref()?;
    squad.picks.get(cursor(state)).map(|p| p.element)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
