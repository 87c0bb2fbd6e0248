// Leagues widget: the manager's leagues on the left, the standings page of
// the chosen league on the right.

use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState};
use ratatui::Frame;

use fplanner_api::LeagueKind;
use fplanner_core::model::{LeagueStandings, LeagueSummary};

use crate::tui::{TabId, ViewState};

/// Render the leagues tab into the given area.
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let [list_area, table_area] =
        Layout::horizontal([Constraint::Percentage(40), Constraint::Percentage(60)]).areas(area);

    render_league_list(frame, list_area, state);

    match &state.snapshot.standings {
        Some(standings) => render_standings(frame, table_area, state, standings),
        None => {
            let paragraph = Paragraph::new("  Select a league and press Enter")
                .style(Style::default().fg(Color::DarkGray))
                .block(Block::default().borders(Borders::ALL).title("Standings"));
            frame.render_widget(paragraph, table_area);
        }
    }
}

/// Classic leagues followed by head-to-head leagues, in the order the
/// cursor walks them.
pub fn league_entries(state: &ViewState) -> Vec<(LeagueKind, &LeagueSummary)> {
    let Some(leagues) = &state.snapshot.leagues else {
        return Vec::new();
    };
    leagues
        .classic
        .iter()
        .map(|l| (LeagueKind::Classic, l))
        .chain(leagues.h2h.iter().map(|l| (LeagueKind::HeadToHead, l)))
        .collect()
}

fn kind_badge(kind: LeagueKind) -> &'static str {
    match kind {
        LeagueKind::Classic => "C",
        LeagueKind::HeadToHead => "H2H",
    }
}

/// Rank as text with the movement since the previous gameweek.
pub fn rank_movement(rank: Option<u32>, last_rank: Option<u32>) -> String {
    match (rank, last_rank) {
        (Some(rank), Some(last)) if last > rank => format!("{rank} ▲{}", last - rank),
        (Some(rank), Some(last)) if last < rank && last > 0 => format!("{rank} ▼{}", rank - last),
        (Some(rank), _) => rank.to_string(),
        (None, _) => "-".into(),
    }
}

fn render_league_list(frame: &mut Frame, area: Rect, state: &ViewState) {
    let entries = league_entries(state);
    let title = if state.snapshot.leagues.is_some() {
        format!("Leagues ({})", entries.len())
    } else {
        "Leagues (not loaded)".to_string()
    };

    let header = Row::new(vec!["", "League", "Rank"])
        .style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD));
    let rows: Vec<Row> = entries
        .iter()
        .map(|(kind, league)| {
            Row::new(vec![
                Cell::from(kind_badge(*kind)).style(Style::default().fg(Color::Gray)),
                Cell::from(league.name.clone()),
                Cell::from(rank_movement(league.entry_rank, league.entry_last_rank)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(3),
            Constraint::Min(12),
            Constraint::Length(14),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title(title))
    .row_highlight_style(Style::default().bg(Color::DarkGray))
    .highlight_symbol(">> ");

    let cursor = state
        .scroll(TabId::Leagues.scroll_key())
        .min(entries.len().saturating_sub(1));
    let mut table_state = TableState::default().with_selected(Some(cursor));
    frame.render_stateful_widget(table, area, &mut table_state);
}

fn render_standings(frame: &mut Frame, area: Rect, state: &ViewState, standings: &LeagueStandings) {
    let own_entry = state.snapshot.team_id;
    let header = Row::new(vec!["#", "Team", "Manager", "GW", "Total"])
        .style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = standings
        .standings
        .results
        .iter()
        .map(|entry| {
            let movement = entry.movement();
            let arrow = match movement {
                m if m > 0 => ("▲", Color::Green),
                m if m < 0 => ("▼", Color::Red),
                _ => (" ", Color::Gray),
            };
            let style = if Some(entry.entry) == own_entry {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(format!("{}{}", entry.rank, arrow.0)).style(Style::default().fg(arrow.1)),
                Cell::from(entry.entry_name.clone()),
                Cell::from(entry.player_name.clone()),
                Cell::from(entry.event_total.to_string()),
                Cell::from(entry.total.to_string()),
            ])
            .style(style)
        })
        .collect();

    let page = &standings.standings;
    let mut title = format!("{} - page {}", standings.league.name, page.page);
    if page.has_next {
        title.push_str(" (n: next)");
    }
    if page.page > 1 {
        title.push_str(" (p: prev)");
    }

    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Min(12),
            Constraint::Min(10),
            Constraint::Length(4),
            Constraint::Length(6),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(table, area);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
