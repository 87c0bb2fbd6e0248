// Message types exchanged between the app orchestrator and the TUI.
//
// The TUI sends `UserCommand`s; the orchestrator answers with `UiUpdate`s.
// Snapshots are self-contained so the TUI never reaches back into app state.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use fplanner_api::LeagueKind;
use fplanner_core::model::{
    Bootstrap, Chip, Fixture, Gameweek, LeagueStandings, LiveGameweek, ManagerHistory,
    ManagerLeagues, ManagerSummary, PlayerId, SquadSnapshot,
};
use fplanner_core::plan::{PlanBook, TransferPlan};
use fplanner_core::projection::Financials;

// ---------------------------------------------------------------------------
// TUI -> app
// ---------------------------------------------------------------------------

/// Commands issued by the TUI in response to key presses.
#[derive(Debug, Clone, PartialEq)]
pub enum UserCommand {
    /// Connect the dashboard to an FPL team id.
    Connect { team_id: u32 },
    /// Drop cached API responses and fetched snapshots, then reconnect.
    Refresh,
    /// Forget the connected team and every stored plan.
    Disconnect,
    SelectGameweek(Gameweek),
    PlanTransfer {
        gameweek: Gameweek,
        player_out: PlayerId,
        player_in: PlayerId,
    },
    RemoveTransfer { gameweek: Gameweek },
    /// Plan `chip` for `gameweek`, or unplan it if it is already there.
    ToggleChip { gameweek: Gameweek, chip: Chip },
    RemoveChip { gameweek: Gameweek },
    LoadLeagues,
    LoadStandings {
        league_id: u32,
        kind: LeagueKind,
        page: u32,
    },
    Quit,
}

// ---------------------------------------------------------------------------
// app -> TUI
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionStatus::Disconnected => "Disconnected",
            ConnectionStatus::Connecting => "Connecting...",
            ConnectionStatus::Connected => "Connected",
        }
    }
}

/// One row of the planner: what is planned for a gameweek and the
/// finances it leaves.
#[derive(Debug, Clone, PartialEq)]
pub struct GameweekOutlook {
    pub gameweek: Gameweek,
    pub deadline: Option<DateTime<Utc>>,
    pub chip: Option<Chip>,
    pub transfer: Option<TransferPlan>,
    pub financials: Option<Financials>,
}

/// Everything the TUI needs to draw one frame.
///
/// `squad` and `financials` are already projected to `selected_gameweek`
/// with the plan book applied. Shared API payloads travel behind `Arc` so a
/// snapshot per state change stays cheap.
#[derive(Debug, Clone, Default)]
pub struct AppSnapshot {
    pub team_id: Option<u32>,
    pub manager: Option<ManagerSummary>,
    pub history: Option<ManagerHistory>,
    pub connection: ConnectionStatus,
    pub current_gameweek: Gameweek,
    pub selected_gameweek: Gameweek,
    pub bootstrap: Option<Arc<Bootstrap>>,
    pub fixtures: Arc<Vec<Fixture>>,
    pub squad: Option<SquadSnapshot>,
    /// Gameweek of the official snapshot the projected squad starts from.
    pub base_gameweek: Option<Gameweek>,
    pub financials: Option<Financials>,
    /// Live points for the selected gameweek; `None` before it starts.
    pub gameweek_points: Option<i32>,
    pub live: Option<Arc<LiveGameweek>>,
    pub plans: PlanBook,
    /// Upcoming gameweeks from the current one.
    pub outlook: Vec<GameweekOutlook>,
    /// How many players the comparison view holds.
    pub max_compare: usize,
    /// Squad rule violations of the projected squad.
    pub validation: Vec<String>,
    pub leagues: Option<ManagerLeagues>,
    pub standings: Option<LeagueStandings>,
}

/// Updates pushed from the orchestrator to the TUI.
#[derive(Debug, Clone)]
pub enum UiUpdate {
    StateSnapshot(Box<AppSnapshot>),
    ConnectionStatus(ConnectionStatus),
    /// Informational message, e.g. a rejected chip plan.
    Notice(String),
    Error(String),
}
