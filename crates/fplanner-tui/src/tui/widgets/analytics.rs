// Analytics widget: captaincy pick, live summary, value and form tables,
// rotation risk, league-wide best value and the player comparison.
//
// One scrollable paragraph; sections are separated by blank lines.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use fplanner_core::analytics::{
    best_value, compare_players, difficulty_label, fixtures_by_club, form_table, format_price, live_summary,
    ppm_table, rotation_risk, suggest_captain, template_team, RotationRisk, WildcardDraft,
};
use fplanner_core::model::{Bootstrap, PlayerId, SquadSnapshot};

use crate::tui::{TabId, ViewState};

/// Rows shown in each ranked table.
const TOP_N: usize = 5;
/// Budget the template is drafted against when no squad is loaded.
const WILDCARD_BUDGET: i32 = 1000;

/// Render the analytics panel into the given area.
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let lines = build_lines(state);

    let visible_rows = (area.height as usize).saturating_sub(2);
    let max_offset = lines.len().saturating_sub(visible_rows);
    let scroll = state.scroll(TabId::Analytics.scroll_key()).min(max_offset) as u16;

    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Analytics"))
        .scroll((scroll, 0));
    frame.render_widget(paragraph, area);
}

fn heading(text: &str) -> Line<'static> {
    Line::from(Span::styled(
        format!(" {text}"),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    ))
}

fn name_of(bootstrap: &Bootstrap, id: PlayerId) -> String {
    bootstrap
        .player(id)
        .map(|p| p.web_name.clone())
        .unwrap_or_else(|| format!("#{id}"))
}

pub fn build_lines(state: &ViewState) -> Vec<Line<'static>> {
    let snapshot = &state.snapshot;
    let Some(bootstrap) = snapshot.bootstrap.as_deref() else {
        return vec![Line::from(Span::styled(
            "  No game data loaded",
            Style::default().fg(Color::DarkGray),
        ))];
    };

    let mut lines = Vec::new();
    if let Some(squad) = &snapshot.squad {
        squad_sections(state, squad, bootstrap, &mut lines);
    } else {
        lines.push(Line::from(Span::styled(
            "  Connect a team for squad analytics",
            Style::default().fg(Color::DarkGray),
        )));
        lines.push(Line::from(""));
    }

    lines.push(heading("Best value in the game"));
    for row in best_value(bootstrap, TOP_N) {
        lines.push(Line::from(format!(
            "  {:<14}{:<5}{:>8}  {:.1} pts/£m",
            row.player.web_name,
            bootstrap.club_short_name(row.player),
            format_price(row.player.now_cost),
            row.ppm
        )));
    }

    lines.push(Line::from(""));
    template_section(state, bootstrap, &mut lines);
    lines.push(Line::from(""));
    comparison_section(state, bootstrap, &mut lines);
    lines
}

/// The most-owned template, drafted in order against the projected budget
/// (a fresh £100.0m without a squad).
fn template_section(state: &ViewState, bootstrap: &Bootstrap, lines: &mut Vec<Line<'static>>) {
    let budget = state
        .snapshot
        .financials
        .map(|f| f.total_budget)
        .unwrap_or(WILDCARD_BUDGET);
    lines.push(heading(&format!("Most owned template ({})", format_price(budget))));

    let mut draft = WildcardDraft::new(budget);
    for (position, players) in template_team(bootstrap) {
        let mut spans = vec![Span::styled(
            format!("  {:<5}", position.short_name()),
            Style::default().fg(Color::Gray),
        )];
        for player in players {
            let style = if draft.add(player.id, bootstrap) {
                Style::default()
            } else {
                Style::default().fg(Color::DarkGray)
            };
            spans.push(Span::styled(
                format!("{} {:.1}%  ", player.web_name, player.selected_by_percent),
                style,
            ));
        }
        lines.push(Line::from(spans));
    }
    let remaining = draft.remaining(bootstrap);
    lines.push(Line::from(Span::styled(
        format!(
            "  Drafted {} for {}, {} left",
            draft.players().len(),
            format_price(draft.cost(bootstrap)),
            format_price(remaining)
        ),
        Style::default().fg(if remaining > 0 { Color::Green } else { Color::Yellow }),
    )));
}

fn squad_sections(
    state: &ViewState,
    squad: &SquadSnapshot,
    bootstrap: &Bootstrap,
    lines: &mut Vec<Line<'static>>,
) {
    let snapshot = &state.snapshot;
    let gw = snapshot.selected_gameweek;

    lines.push(heading("Captain pick"));
    let by_club = fixtures_by_club(&snapshot.fixtures, gw);
    match suggest_captain(squad, bootstrap, &by_club) {
        Some(pick) => {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("  {}", pick.player.full_name()),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                ),
                Span::raw(format!(
                    "  form {:.1}, fixture ease {:.1}, score {:.1}",
                    pick.form, pick.avg_ease, pick.score
                )),
            ]));
            for fixture in by_club.get(&pick.player.team).into_iter().flatten() {
                lines.push(Line::from(format!(
                    "    vs {} ({}): {}",
                    bootstrap
                        .club(fixture.opponent)
                        .map(|c| c.short_name.clone())
                        .unwrap_or_else(|| "???".into()),
                    if fixture.home { "H" } else { "A" },
                    difficulty_label(fixture.difficulty)
                )));
            }
        }
        None => lines.push(Line::from("  No standout captain")),
    }
    lines.push(Line::from(""));

    if let Some(live) = &snapshot.live {
        let chip = squad.active_chip.or(snapshot.plans.chip_for(gw));
        let summary = live_summary(squad, &**live, chip);
        lines.push(heading(&format!("Live GW {gw}")));
        lines.push(Line::from(format!(
            "  {} pts this week, {} overall, {} on the bench",
            summary.live_total, summary.overall_total, summary.bench_points
        )));
        if let Some((id, pts)) = summary.top_performer {
            lines.push(Line::from(format!("  Top: {} ({pts})", name_of(bootstrap, id))));
        }
        if let Some((id, pts)) = summary.worst_performer {
            lines.push(Line::from(format!("  Worst: {} ({pts})", name_of(bootstrap, id))));
        }
        lines.push(Line::from(""));
    }

    lines.push(heading("Points per million"));
    for row in ppm_table(squad, bootstrap).into_iter().take(TOP_N) {
        lines.push(Line::from(format!(
            "  {:<14}{:>8}  {:.1}",
            row.player.web_name,
            format_price(row.player.now_cost),
            row.ppm
        )));
    }
    lines.push(Line::from(""));

    lines.push(heading("Form"));
    for player in form_table(squad, bootstrap).into_iter().take(TOP_N) {
        lines.push(Line::from(format!(
            "  {:<14}{:.1}",
            player.web_name, player.form
        )));
    }
    lines.push(Line::from(""));

    lines.push(heading("Rotation risk"));
    let risky: Vec<_> = rotation_risk(squad, bootstrap)
        .into_iter()
        .filter(|r| r.risk != RotationRisk::Low)
        .collect();
    if risky.is_empty() {
        lines.push(Line::from(Span::styled(
            "  Every starter plays most minutes",
            Style::default().fg(Color::Green),
        )));
    }
    for row in risky {
        let color = match row.risk {
            RotationRisk::High => Color::Red,
            _ => Color::Yellow,
        };
        lines.push(Line::from(vec![
            Span::raw(format!("  {:<14}{:>5.0} min/gw  ", row.player.web_name, row.avg_minutes)),
            Span::styled(row.risk.label(), Style::default().fg(color)),
        ]));
    }
    lines.push(Line::from(""));
}

fn comparison_section(state: &ViewState, bootstrap: &Bootstrap, lines: &mut Vec<Line<'static>>) {
    lines.push(heading("Comparison"));
    let max = state.snapshot.max_compare.max(1);
    let rows = compare_players(&state.compare, bootstrap, max);
    if rows.is_empty() {
        lines.push(Line::from(Span::styled(
            "  Press a on the Squad or Transfers tab to add players",
            Style::default().fg(Color::DarkGray),
        )));
        return;
    }
    for row in rows {
        let values: String = row.values.iter().map(|v| format!("{v:<12}")).collect();
        let style = if row.label == "Player" {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        lines.push(Line::from(vec![
            Span::styled(format!("  {:<13}", row.label), Style::default().fg(Color::Gray)),
            Span::styled(values, style),
        ]));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
