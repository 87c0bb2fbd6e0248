// Transfers widget: players outside the projected squad, filterable by
// position and search text, with sell suggestions above the table.

use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState};
use ratatui::Frame;

use fplanner_core::analytics::{
    format_price, points_per_million, transfer_candidates, transfer_out_suggestions,
    CandidateFilter,
};
use fplanner_core::model::{Player, PlayerId};

use crate::tui::{TabId, ViewState};

/// Render the transfer market into the given area.
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let [hint_area, table_area] =
        Layout::vertical([Constraint::Length(3), Constraint::Min(5)]).areas(area);

    let hint = Paragraph::new(sell_hint(state))
        .block(Block::default().borders(Borders::ALL).title("Consider selling"));
    frame.render_widget(hint, hint_area);

    let candidates = candidates(state);
    let bootstrap = state.snapshot.bootstrap.as_deref();

    let header = Row::new(vec!["ID", "Player", "Pos", "Club", "Price", "Pts", "Form", "PPM"])
        .style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = candidates
        .iter()
        .map(|p| {
            let club = bootstrap.map(|b| b.club_short_name(p)).unwrap_or("???");
            Row::new(vec![
                Cell::from(p.id.to_string()),
                Cell::from(p.web_name.clone()),
                Cell::from(p.position.short_name()),
                Cell::from(club.to_string()),
                Cell::from(format_price(p.now_cost)),
                Cell::from(p.total_points.to_string()),
                Cell::from(format!("{:.1}", p.form)),
                Cell::from(format!("{:.1}", points_per_million(p))),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(4),
        Constraint::Min(14),
        Constraint::Length(4),
        Constraint::Length(5),
        Constraint::Length(7),
        Constraint::Length(4),
        Constraint::Length(5),
        Constraint::Length(5),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(build_title(state, candidates.len())),
        )
        .row_highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol(">> ");

    let mut table_state = TableState::default().with_selected(Some(cursor(state, candidates.len())));
    frame.render_stateful_widget(table, table_area, &mut table_state);
}

/// Candidates matching the current position filter and search text, best
/// total points first. Empty until a squad and game data are loaded.
pub fn candidates(state: &ViewState) -> Vec<&Player> {
    let snapshot = &state.snapshot;
    let (Some(bootstrap), Some(squad)) = (snapshot.bootstrap.as_deref(), &snapshot.squad) else {
        return Vec::new();
    };
    let filter = CandidateFilter {
        position: state.position_filter,
        query: state.filter_text.clone(),
        ..CandidateFilter::default()
    };
    transfer_candidates(bootstrap, squad, &filter)
}

fn cursor(state: &ViewState, rows: usize) -> usize {
    state
        .scroll(TabId::Transfers.scroll_key())
        .min(rows.saturating_sub(1))
}

/// Candidate under the cursor.
pub fn highlighted(state: &ViewState) -> Option<PlayerId> {
    let candidates = candidates(state);
    candidates.get(cursor(state, candidates.len())).map(|p| p.id)
}

fn sell_hint(state: &ViewState) -> Line<'static> {
    let snapshot = &state.snapshot;
    let (Some(bootstrap), Some(squad)) = (snapshot.bootstrap.as_deref(), &snapshot.squad) else {
        return Line::from(Span::styled(" -", Style::default().fg(Color::DarkGray)));
    };
    let weak = transfer_out_suggestions(squad, bootstrap);
    if weak.is_empty() {
        return Line::from(Span::styled(
            " No obvious weak links",
            Style::default().fg(Color::Green),
        ));
    }
    let names = weak
        .iter()
        .map(|p| format!("{} ({}, form {:.1})", p.web_name, p.id, p.form))
        .collect::<Vec<_>>()
        .join(", ");
    Line::from(Span::styled(format!(" {names}"), Style::default().fg(Color::Yellow)))
}

/// Title with the active filters and the number of matches.
fn build_title(state: &ViewState, count: usize) -> Line<'static> {
    let mut title = String::from("Transfer targets");
    if let Some(pos) = state.position_filter {
        title.push_str(&format!(" [{}]", pos.short_name()));
    }
    if !state.filter_text.is_empty() || state.filter_mode {
        let cursor = if state.filter_mode { "_" } else { "" };
        title.push_str(&format!(" \"{}{cursor}\"", state.filter_text));
    }
    title.push_str(&format!(" ({count})"));
    Line::from(title)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::test_support::connected_view;
    use fplanner_core::model::Position;

    fn title_text(state: &ViewState, count: usize) -> String {
        build_title(state, count)
            .spans
            .iter()
            .map(|s| s.content.to_string())
            .collect()
    }

    #[test]
    fn candidates_exclude_squad_players() {
        let state = connected_view();
        let ids: Vec<PlayerId> = candidates(&state).iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![20, 19, 18, 17, 16]);
    }

    #[test]
    fn candidates_follow_filters() {
        let mut state = connected_view();
        state.position_filter = Some(Position::Midfielder);
        let ids: Vec<PlayerId> = candidates(&state).iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![18, 16]);

        state.position_filter = None;
        state.filter_text = "PAL".into();
        let ids: Vec<PlayerId> = candidates(&state).iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![16]);
    }

    #[test]
    fn candidates_empty_without_squad() {
        assert!(candidates(&ViewState::default()).is_empty());
        assert_eq!(highlighted(&ViewState::default()), None);
    }

    #[test]
    fn highlighted_clamps_to_last_candidate() {
        let mut state = connected_view();
        state.scroll_offset.insert("transfers".into(), 1);
        assert_eq!(highlighted(&state), Some(19));
        state.scroll_offset.insert("transfers".into(), 50);
        assert_eq!(highlighted(&state), Some(16));
    }

    #[test]
    fn title_shows_filters() {
        let mut state = ViewState::default();
        assert_eq!(title_text(&state, 5), "Transfer targets (5)");
        state.position_filter = Some(Position::Forward);
        state.filter_text = "wis".into();
        assert_eq!(title_text(&state, 1), "Transfer targets [FWD] \"wis\" (1)");
        state.filter_mode = true;
        assert_eq!(title_text(&state, 1), "Transfer targets [FWD] \"wis_\" (1)");
    }

    #[test]
    fn sell_hint_names_weak_starters() {
        let state = connected_view();
        let text: String = sell_hint(&state)
            .spans
            .iter()
            .map(|s| s.content.to_string())
            .collect();
        // Rogers has the worst form in the XI.
        assert!(text.starts_with(" Rogers (9, form 0.5)"), "{text}");
    }

    #[test]
    fn render_does_not_panic() {
        let backend = ratatui::backend::TestBackend::new(100, 20);
        let mut terminal = ratatui::Terminal::new(backend).unwrap();
        for state in [ViewState::default(), connected_view()] {
            terminal
                .draw(|frame| render(frame, frame.area(), &state))
                .unwrap();
        }
    }
}
