// Keyboard input handling and command dispatch.
//
// Translates crossterm key events into UserCommand messages sent to the
// app orchestrator, or into local ViewState mutations (tab switching,
// cursor movement, filtering, prompts).

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use fplanner_app::protocol::UserCommand;
use fplanner_core::model::{Chip, Position, MAX_GAMEWEEK};

use super::widgets::{leagues, squad, transfers};
use super::{MessageKind, Prompt, TabId, ViewState};

/// Order of the position filter on the Transfers tab. The cycle wraps back
/// to "all positions".
const POSITION_CYCLE: &[Position] = &[
    Position::Goalkeeper,
    Position::Defender,
    Position::Midfielder,
    Position::Forward,
];

/// Rows moved by PageUp/PageDown.
const PAGE_SIZE: usize = 10;

/// Handle a keyboard event.
///
/// Returns `Some(UserCommand)` when the key press should be forwarded to the
/// app orchestrator. Returns `None` when the key press was handled locally.
pub fn handle_key(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    // Windows reports both Press and Release.
    if key_event.kind != KeyEventKind::Press {
        return None;
    }

    if key_event.modifiers.contains(KeyModifiers::CONTROL) && key_event.code == KeyCode::Char('c')
    {
        return Some(UserCommand::Quit);
    }

    if view_state.confirm_quit {
        return handle_confirm_quit(key_event, view_state);
    }

    if view_state.prompt.is_some() {
        return handle_prompt(key_event, view_state);
    }

    if view_state.filter_mode {
        return handle_filter_mode(key_event, view_state);
    }

    // A message stays up until the next key.
    let had_message = view_state.message.take().is_some();

    match key_event.code {
        KeyCode::Char(c @ '1'..='5') => {
            if c == '3' && view_state.active_tab == TabId::Planner {
                return toggle_chip(view_state, Chip::TripleCaptain);
            }
            let tab = TabId::ALL[(c as usize) - ('1' as usize)];
            switch_tab(view_state, tab)
        }
        KeyCode::Tab => {
            let next = (tab_index(view_state.active_tab) + 1) % TabId::ALL.len();
            switch_tab(view_state, TabId::ALL[next])
        }
        KeyCode::BackTab => {
            let len = TabId::ALL.len();
            let prev = (tab_index(view_state.active_tab) + len - 1) % len;
            switch_tab(view_state, TabId::ALL[prev])
        }

        KeyCode::Left => step_gameweek(view_state, -1),
        KeyCode::Right => step_gameweek(view_state, 1),

        KeyCode::Up | KeyCode::Char('k') => {
            move_cursor(view_state, -1);
            None
        }
        KeyCode::Down | KeyCode::Char('j') => {
            move_cursor(view_state, 1);
            None
        }
        KeyCode::PageUp => {
            move_cursor(view_state, -(PAGE_SIZE as isize));
            None
        }
        KeyCode::PageDown => {
            move_cursor(view_state, PAGE_SIZE as isize);
            None
        }

        KeyCode::Char('/') => {
            if view_state.active_tab == TabId::Transfers {
                view_state.filter_mode = true;
            }
            None
        }
        KeyCode::Char('p') => match view_state.active_tab {
            TabId::Transfers => {
                cycle_position_filter(view_state);
                reset_cursor(view_state, TabId::Transfers);
                None
            }
            TabId::Leagues => standings_page(view_state, -1),
            _ => None,
        },
        KeyCode::Char('n') if view_state.active_tab == TabId::Leagues => {
            standings_page(view_state, 1)
        }

        KeyCode::Esc => {
            if !view_state.filter_text.is_empty() || view_state.position_filter.is_some() {
                view_state.filter_text.clear();
                view_state.position_filter = None;
                reset_cursor(view_state, TabId::Transfers);
            } else if !had_message && view_state.active_tab == TabId::Analytics {
                view_state.compare.clear();
            }
            None
        }

        KeyCode::Char('c') => {
            open_prompt(view_state, Prompt::TeamId, String::new());
            None
        }
        KeyCode::Char('r') => Some(UserCommand::Refresh),
        KeyCode::Char('d') => Some(UserCommand::Disconnect),

        KeyCode::Char('t') => {
            if view_state.snapshot.squad.is_none() {
                view_state.message = Some((MessageKind::Notice, "No team connected".into()));
                return None;
            }
            let preset = match view_state.active_tab {
                TabId::Squad => squad::highlighted(view_state)
                    .map(|id| id.to_string())
                    .unwrap_or_default(),
                _ => String::new(),
            };
            open_prompt(view_state, Prompt::TransferOut, preset);
            None
        }
        KeyCode::Char('x') => selected_gameweek(view_state)
            .map(|gameweek| UserCommand::RemoveTransfer { gameweek }),
        KeyCode::Char('u') => {
            selected_gameweek(view_state).map(|gameweek| UserCommand::RemoveChip { gameweek })
        }

        KeyCode::Char('w') => toggle_chip(view_state, Chip::Wildcard),
        KeyCode::Char('f') => toggle_chip(view_state, Chip::FreeHit),
        KeyCode::Char('b') => toggle_chip(view_state, Chip::BenchBoost),

        KeyCode::Char('a') => {
            add_to_comparison(view_state);
            None
        }

        KeyCode::Enter if view_state.active_tab == TabId::Leagues => {
            let (kind, league) = {
                let entries = leagues::league_entries(view_state);
                let idx = view_state.scroll(TabId::Leagues.scroll_key());
                let (kind, league) = entries.get(idx)?;
                (*kind, league.id)
            };
            view_state.standings_kind = Some(kind);
            Some(UserCommand::LoadStandings {
                league_id: league,
                kind,
                page: 1,
            })
        }

        KeyCode::Char('q') => {
            view_state.confirm_quit = true;
            None
        }

        _ => None,
    }
}

/// Handle key events while in quit confirmation mode: `y`/`q` confirm,
/// `n`/Esc cancel, everything else is blocked.
fn handle_confirm_quit(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    match key_event.code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Char('q') | KeyCode::Char('Q') => {
            Some(UserCommand::Quit)
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            view_state.confirm_quit = false;
            None
        }
        _ => None,
    }
}

/// Handle key events while in filter mode.
fn handle_filter_mode(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    match key_event.code {
        KeyCode::Esc => {
            view_state.filter_mode = false;
            view_state.filter_text.clear();
        }
        KeyCode::Enter => {
            view_state.filter_mode = false;
        }
        KeyCode::Backspace => {
            view_state.filter_text.pop();
        }
        KeyCode::Char(c) => {
            view_state.filter_text.push(c);
        }
        _ => return None,
    }
    reset_cursor(view_state, TabId::Transfers);
    None
}

/// Handle key events while a numeric prompt is open. Only digits are
/// accepted; Enter submits and Esc cancels.
fn handle_prompt(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    match key_event.code {
        KeyCode::Esc => {
            close_prompt(view_state);
            None
        }
        KeyCode::Backspace => {
            view_state.prompt_input.pop();
            None
        }
        KeyCode::Char(c) if c.is_ascii_digit() => {
            if view_state.prompt_input.len() < 10 {
                view_state.prompt_input.push(c);
            }
            None
        }
        KeyCode::Enter => submit_prompt(view_state),
        _ => None,
    }
}

fn submit_prompt(view_state: &mut ViewState) -> Option<UserCommand> {
    let prompt = view_state.prompt.clone()?;
    let value = match view_state.prompt_input.parse::<u32>() {
        Ok(v) if v > 0 => v,
        _ => {
            view_state.message = Some((MessageKind::Error, "Enter a positive number".into()));
            return None;
        }
    };
    close_prompt(view_state);

    match prompt {
        Prompt::TeamId => Some(UserCommand::Connect { team_id: value }),
        Prompt::TransferOut => {
            let preset = if view_state.active_tab == TabId::Transfers {
                transfers::highlighted(view_state)
                    .map(|id| id.to_string())
                    .unwrap_or_default()
            } else {
                String::new()
            };
            open_prompt(view_state, Prompt::TransferIn { player_out: value }, preset);
            None
        }
        Prompt::TransferIn { player_out } => {
            let gameweek = selected_gameweek(view_state)?;
            Some(UserCommand::PlanTransfer {
                gameweek,
                player_out,
                player_in: value,
            })
        }
    }
}

fn open_prompt(view_state: &mut ViewState, prompt: Prompt, preset: String) {
    view_state.prompt = Some(prompt);
    view_state.prompt_input = preset;
}

fn close_prompt(view_state: &mut ViewState) {
    view_state.prompt = None;
    view_state.prompt_input.clear();
}

fn tab_index(tab: TabId) -> usize {
    TabId::ALL.iter().position(|t| *t == tab).unwrap_or(0)
}

/// Switch tabs. Entering Leagues without any league data asks for it.
fn switch_tab(view_state: &mut ViewState, tab: TabId) -> Option<UserCommand> {
    view_state.active_tab = tab;
    let needs_leagues = tab == TabId::Leagues
        && view_state.snapshot.leagues.is_none()
        && view_state.snapshot.team_id.is_some();
    needs_leagues.then_some(UserCommand::LoadLeagues)
}

/// The selected gameweek, or `None` before any game data has arrived.
fn selected_gameweek(view_state: &ViewState) -> Option<u32> {
    let gw = view_state.snapshot.selected_gameweek;
    (gw > 0).then_some(gw)
}

fn step_gameweek(view_state: &ViewState, delta: i64) -> Option<UserCommand> {
    let current = selected_gameweek(view_state)? as i64;
    let next = current + delta;
    if next < 1 || next > MAX_GAMEWEEK as i64 {
        return None;
    }
    Some(UserCommand::SelectGameweek(next as u32))
}

fn toggle_chip(view_state: &ViewState, chip: Chip) -> Option<UserCommand> {
    selected_gameweek(view_state).map(|gameweek| UserCommand::ToggleChip { gameweek, chip })
}

/// Request the neighbouring page of the standings on screen.
fn standings_page(view_state: &ViewState, delta: i64) -> Option<UserCommand> {
    let standings = view_state.snapshot.standings.as_ref()?;
    let kind = view_state.standings_kind?;
    let page = standings.standings.page as i64 + delta;
    if page < 1 || (delta > 0 && !standings.standings.has_next) {
        return None;
    }
    Some(UserCommand::LoadStandings {
        league_id: standings.league.id,
        kind,
        page: page as u32,
    })
}

/// Cycle the position filter: all -> GKP -> DEF -> MID -> FWD -> all.
fn cycle_position_filter(view_state: &mut ViewState) {
    view_state.position_filter = match view_state.position_filter {
        None => Some(POSITION_CYCLE[0]),
        Some(current) => POSITION_CYCLE
            .iter()
            .position(|p| *p == current)
            .and_then(|i| POSITION_CYCLE.get(i + 1))
            .copied(),
    };
}

/// Add the highlighted player on the Squad or Transfers tab to the
/// comparison. A full comparison drops its oldest player.
fn add_to_comparison(view_state: &mut ViewState) {
    let id = match view_state.active_tab {
        TabId::Squad => squad::highlighted(view_state),
        TabId::Transfers => transfers::highlighted(view_state),
        _ => None,
    };
    let Some(id) = id else {
        return;
    };
    if view_state.compare.contains(&id) {
        return;
    }
    let max = view_state.snapshot.max_compare.max(1);
    while view_state.compare.len() >= max {
        view_state.compare.remove(0);
    }
    view_state.compare.push(id);
    view_state.message = Some((
        MessageKind::Notice,
        format!("Comparing {} players (Analytics tab)", view_state.compare.len()),
    ));
}

fn reset_cursor(view_state: &mut ViewState, tab: TabId) {
    view_state.scroll_offset.insert(tab.scroll_key().to_string(), 0);
}

/// Move the cursor (or scroll position) of the active tab, clamped to the
/// rows it shows when that is known.
fn move_cursor(view_state: &mut ViewState, delta: isize) {
    let key = view_state.active_tab.scroll_key();
    let rows = match view_state.active_tab {
        TabId::Squad => Some(squad::row_count(view_state)),
        TabId::Transfers => Some(transfers::candidates(view_state).len()),
        TabId::Leagues => Some(leagues::league_entries(view_state).len()),
        TabId::Planner => Some(view_state.snapshot.outlook.len()),
        TabId::Analytics => None,
    };
    let current = view_state.scroll(key);
    let mut next = current.saturating_add_signed(delta);
    if let Some(rows) = rows {
        next = next.min(rows.saturating_sub(1));
    }
    view_state.scroll_offset.insert(key.to_string(), next);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
