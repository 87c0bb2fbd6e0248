// TUI dashboard: layout, input handling, and widget rendering.
//
// The TUI owns a `ViewState` holding the latest `AppSnapshot` plus purely
// local state (tab, scroll, filters, prompts). The app orchestrator pushes
// `UiUpdate` messages over an mpsc channel; the TUI applies them to
// `ViewState` and re-renders at ~30 fps.

pub mod input;
pub mod layout;
pub mod widgets;

use std::collections::HashMap;
use std::time::Duration;

use crossterm::event::{Event, EventStream};
use futures_util::StreamExt;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use fplanner_api::LeagueKind;
use fplanner_app::protocol::{AppSnapshot, ConnectionStatus, UiUpdate, UserCommand};
use fplanner_core::model::{PlayerId, Position};

use layout::{build_layout, AppLayout};

// ---------------------------------------------------------------------------
// Local view types
// ---------------------------------------------------------------------------

/// Main panel tabs, bound to keys 1-5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TabId {
    #[default]
    Squad,
    Planner,
    Transfers,
    Analytics,
    Leagues,
}

impl TabId {
    pub const ALL: [TabId; 5] = [
        TabId::Squad,
        TabId::Planner,
        TabId::Transfers,
        TabId::Analytics,
        TabId::Leagues,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TabId::Squad => "Squad",
            TabId::Planner => "Planner",
            TabId::Transfers => "Transfers",
            TabId::Analytics => "Analytics",
            TabId::Leagues => "Leagues",
        }
    }

    /// Key under which the tab's scroll offset or cursor is stored.
    pub fn scroll_key(&self) -> &'static str {
        match self {
            TabId::Squad => "squad",
            TabId::Planner => "planner",
            TabId::Transfers => "transfers",
            TabId::Analytics => "analytics",
            TabId::Leagues => "leagues",
        }
    }
}

/// Text entry the user is in the middle of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    TeamId,
    TransferOut,
    TransferIn { player_out: PlayerId },
}

impl Prompt {
    pub fn title(&self) -> String {
        match self {
            Prompt::TeamId => "Connect team id".into(),
            Prompt::TransferOut => "Player out (id)".into(),
            Prompt::TransferIn { player_out } => format!("Player in for {player_out} (id)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Notice,
    Error,
}

// ---------------------------------------------------------------------------
// ViewState
// ---------------------------------------------------------------------------

/// TUI-local state: the last snapshot from the orchestrator plus everything
/// that only affects what is drawn.
#[derive(Debug, Default)]
pub struct ViewState {
    pub snapshot: AppSnapshot,
    pub connection_status: ConnectionStatus,
    pub active_tab: TabId,
    /// Per-widget scroll offsets (keyed by widget name). Tables with a
    /// cursor use the offset as the highlighted row.
    pub scroll_offset: HashMap<String, usize>,
    /// Current search text for the transfer candidate table.
    pub filter_text: String,
    /// Whether the search input is active.
    pub filter_mode: bool,
    pub position_filter: Option<Position>,
    pub prompt: Option<Prompt>,
    pub prompt_input: String,
    pub confirm_quit: bool,
    /// Latest notice or error, shown in the help bar until the next key.
    pub message: Option<(MessageKind, String)>,
    /// Players picked for side-by-side comparison.
    pub compare: Vec<PlayerId>,
    /// Kind of the league whose standings are shown.
    pub standings_kind: Option<LeagueKind>,
}

impl ViewState {
    /// Apply a full state snapshot from the app orchestrator. Local view
    /// state is kept.
    pub fn apply_snapshot(&mut self, snapshot: AppSnapshot) {
        self.connection_status = snapshot.connection;
        self.snapshot = snapshot;
    }

    pub fn scroll(&self, key: &str) -> usize {
        self.scroll_offset.get(key).copied().unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// UiUpdate processing
// ---------------------------------------------------------------------------

/// Apply a single UiUpdate to the ViewState.
fn apply_ui_update(state: &mut ViewState, update: UiUpdate) {
    match update {
        UiUpdate::StateSnapshot(snapshot) => {
            state.apply_snapshot(*snapshot);
        }
        UiUpdate::ConnectionStatus(status) => {
            state.connection_status = status;
        }
        UiUpdate::Notice(text) => {
            state.message = Some((MessageKind::Notice, text));
        }
        UiUpdate::Error(text) => {
            state.message = Some((MessageKind::Error, text));
        }
    }
}

// ---------------------------------------------------------------------------
// Render frame
// ---------------------------------------------------------------------------

/// Render the complete dashboard frame.
pub fn render_frame(frame: &mut Frame, state: &ViewState) {
    let layout = build_layout(frame.area());

    widgets::status_bar::render(frame, layout.status_bar, state);
    widgets::gameweek_banner::render(frame, layout.gameweek_banner, state);
    render_main_panel(frame, &layout, state);
    widgets::budget::render(frame, layout.finances, state);
    widgets::checks::render(frame, layout.checks, state);
    render_help_bar(frame, &layout, state);

    if state.confirm_quit {
        widgets::overlay::render_quit(frame, frame.area());
    } else if let Some(prompt) = &state.prompt {
        widgets::overlay::render_prompt(frame, frame.area(), prompt, &state.prompt_input);
    }
}

fn render_main_panel(frame: &mut Frame, layout: &AppLayout, state: &ViewState) {
    let area = layout.main_panel;
    match state.active_tab {
        TabId::Squad => widgets::squad::render(frame, area, state),
        TabId::Planner => widgets::planner::render(frame, area, state),
        TabId::Transfers => widgets::transfers::render(frame, area, state),
        TabId::Analytics => widgets::analytics::render(frame, area, state),
        TabId::Leagues => widgets::leagues::render(frame, area, state),
    }
}

/// Key hints for the current mode, or the latest message.
pub fn help_text(state: &ViewState) -> String {
    if state.prompt.is_some() {
        return " Enter:Submit | Esc:Cancel | Backspace:Delete".into();
    }
    if state.filter_mode {
        return " Type to search | Enter:Keep | Esc:Clear".into();
    }
    let tab_keys = match state.active_tab {
        TabId::Transfers => " | /:Search | p:Position | a:Compare",
        TabId::Planner => " | 3:Triple captain",
        TabId::Leagues => " | Enter:Standings | n/p:Page",
        TabId::Analytics => " | Esc:Clear compare",
        TabId::Squad => "",
    };
    format!(
        " q:Quit | 1-5:Tabs | \u{2190}/\u{2192}:Gameweek | c:Connect | r:Refresh | d:Disconnect | t:Transfer | x:Undo transfer | w/f/b:Chips{tab_keys}"
    )
}

fn render_help_bar(frame: &mut Frame, layout: &AppLayout, state: &ViewState) {
    let line = match &state.message {
        Some((kind, text)) => {
            let color = match kind {
                MessageKind::Notice => Color::Yellow,
                MessageKind::Error => Color::Red,
            };
            Line::from(Span::styled(
                format!(" {text}"),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ))
        }
        None => Line::from(Span::styled(
            help_text(state),
            Style::default().fg(Color::White).add_modifier(Modifier::DIM),
        )),
    };
    let paragraph = Paragraph::new(line).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(paragraph, layout.help_bar);
}

// ---------------------------------------------------------------------------
// Main TUI loop
// ---------------------------------------------------------------------------

/// Run the TUI event loop.
///
/// This is the main entry point for the terminal UI. It:
/// 1. Initializes the terminal (enters raw mode, enables alternate screen).
/// 2. Installs a panic hook to restore the terminal on crash.
/// 3. Runs an async select loop: UI updates, keyboard input, render ticks.
/// 4. Restores the terminal on clean exit.
pub async fn run(
    mut ui_rx: mpsc::Receiver<UiUpdate>,
    cmd_tx: mpsc::Sender<UserCommand>,
) -> anyhow::Result<()> {
    let mut terminal = ratatui::init();

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        ratatui::restore();
        original_hook(panic_info);
    }));

    let mut view_state = ViewState::default();
    let mut event_stream = EventStream::new();

    let mut render_tick = tokio::time::interval(Duration::from_millis(33));
    render_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            update = ui_rx.recv() => {
                match update {
                    Some(ui_update) => apply_ui_update(&mut view_state, ui_update),
                    None => {
                        debug!("UI channel closed");
                        break;
                    }
                }
            }

            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key_event))) => {
                        if let Some(cmd) = input::handle_key(key_event, &mut view_state) {
                            let quit = cmd == UserCommand::Quit;
                            let _ = cmd_tx.send(cmd).await;
                            if quit {
                                break;
                            }
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("Terminal input error: {}", e);
                        break;
                    }
                    None => break,
                }
            }

            _ = render_tick.tick() => {
                terminal.draw(|frame| render_frame(frame, &view_state))?;
            }
        }
    }

    ratatui::restore();
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
