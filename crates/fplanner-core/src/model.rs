// Typed records for FPL API payloads (bootstrap, fixtures, picks, live, leagues).
//
// Every payload the dashboard consumes is decoded into one of these structs at
// the API boundary. Required fields are plain; fields the API omits or nulls
// in practice are `Option` or `#[serde(default)]`.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// FPL element id.
pub type PlayerId = u32;
/// FPL club id (1..=20).
pub type ClubId = u32;
/// Gameweek number (1..=38).
pub type Gameweek = u32;

/// Number of picks in a full squad.
pub const SQUAD_SIZE: usize = 15;
/// Number of picks in the starting lineup.
pub const STARTING_XI: usize = 11;
/// Last gameweek of a Premier League season.
pub const MAX_GAMEWEEK: Gameweek = 38;

// ---------------------------------------------------------------------------
// Decimal-string helper
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(untagged)]
enum StrOrNum {
    Num(f64),
    Str(String),
}

/// Decode a value the API ships as a decimal string (`"5.2"`) or as a number.
/// Empty strings decode as 0.0.
fn decimal<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match StrOrNum::deserialize(deserializer)? {
        StrOrNum::Num(n) => Ok(n),
        StrOrNum::Str(s) if s.trim().is_empty() => Ok(0.0),
        StrOrNum::Str(s) => s.trim().parse::<f64>().map_err(serde::de::Error::custom),
    }
}

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// Playing position, decoded from the API's `element_type` (1..=4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Position {
    Goalkeeper,
    Defender,
    Midfielder,
    Forward,
}

impl Position {
    pub const ALL: [Position; 4] = [
        Position::Goalkeeper,
        Position::Defender,
        Position::Midfielder,
        Position::Forward,
    ];

    /// Short label used in tables (`GKP`, `DEF`, `MID`, `FWD`).
    pub fn short_name(&self) -> &'static str {
        match self {
            Position::Goalkeeper => "GKP",
            Position::Defender => "DEF",
            Position::Midfielder => "MID",
            Position::Forward => "FWD",
        }
    }

    pub fn element_type(&self) -> u8 {
        match self {
            Position::Goalkeeper => 1,
            Position::Defender => 2,
            Position::Midfielder => 3,
            Position::Forward => 4,
        }
    }
}

impl TryFrom<u8> for Position {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Position::Goalkeeper),
            2 => Ok(Position::Defender),
            3 => Ok(Position::Midfielder),
            4 => Ok(Position::Forward),
            other => Err(format!("unknown element_type {other}")),
        }
    }
}

impl From<Position> for u8 {
    fn from(pos: Position) -> u8 {
        pos.element_type()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

// ---------------------------------------------------------------------------
// Chips
// ---------------------------------------------------------------------------

/// A chip, as named by the API (`bboost`, `3xc`, ...). The planner's long
/// names are accepted as aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Chip {
    #[serde(rename = "wildcard")]
    Wildcard,
    #[serde(rename = "freehit")]
    FreeHit,
    #[serde(rename = "bboost", alias = "benchboost")]
    BenchBoost,
    #[serde(rename = "3xc", alias = "triplecaptain")]
    TripleCaptain,
    /// Chips introduced after this client was written.
    #[serde(other)]
    Other,
}

impl Chip {
    /// The four chips a manager can plan.
    pub const PLANNABLE: [Chip; 4] = [
        Chip::Wildcard,
        Chip::FreeHit,
        Chip::BenchBoost,
        Chip::TripleCaptain,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Chip::Wildcard => "Wildcard",
            Chip::FreeHit => "Free Hit",
            Chip::BenchBoost => "Bench Boost",
            Chip::TripleCaptain => "Triple Captain",
            Chip::Other => "Other",
        }
    }

    /// The name the API uses for the chip. `None` for [`Chip::Other`],
    /// whose real name was not kept.
    pub fn api_name(&self) -> Option<&'static str> {
        match self {
            Chip::Wildcard => Some("wildcard"),
            Chip::FreeHit => Some("freehit"),
            Chip::BenchBoost => Some("bboost"),
            Chip::TripleCaptain => Some("3xc"),
            Chip::Other => None,
        }
    }

    /// Two-letter badge for compact views.
    pub fn badge(&self) -> &'static str {
        match self {
            Chip::Wildcard => "WC",
            Chip::FreeHit => "FH",
            Chip::BenchBoost => "BB",
            Chip::TripleCaptain => "TC",
            Chip::Other => "??",
        }
    }
}

impl fmt::Display for Chip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Player / club / fixture
// ---------------------------------------------------------------------------

/// Availability flag from the API's `status` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlayerStatus {
    #[default]
    #[serde(rename = "a")]
    Available,
    #[serde(rename = "d")]
    Doubtful,
    #[serde(rename = "i")]
    Injured,
    #[serde(rename = "s")]
    Suspended,
    #[serde(rename = "u")]
    Unavailable,
    #[serde(rename = "n")]
    NotInSquad,
    #[serde(other)]
    Unknown,
}

/// Season-long attributes of a player (`bootstrap-static` `elements[]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub web_name: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub second_name: String,
    pub team: ClubId,
    #[serde(rename = "element_type")]
    pub position: Position,
    /// Current price in tenths of a million.
    pub now_cost: i32,
    #[serde(default, deserialize_with = "decimal")]
    pub selected_by_percent: f64,
    #[serde(default, deserialize_with = "decimal")]
    pub form: f64,
    #[serde(default, deserialize_with = "decimal")]
    pub points_per_game: f64,
    pub total_points: i32,
    #[serde(default)]
    pub event_points: i32,
    #[serde(default)]
    pub minutes: u32,
    #[serde(default)]
    pub goals_scored: u32,
    #[serde(default)]
    pub assists: u32,
    #[serde(default)]
    pub clean_sheets: u32,
    #[serde(default)]
    pub goals_conceded: u32,
    #[serde(default)]
    pub bonus: i32,
    #[serde(default)]
    pub bps: i32,
    #[serde(default, deserialize_with = "decimal")]
    pub influence: f64,
    #[serde(default, deserialize_with = "decimal")]
    pub creativity: f64,
    #[serde(default, deserialize_with = "decimal")]
    pub threat: f64,
    #[serde(default, deserialize_with = "decimal")]
    pub ict_index: f64,
    #[serde(default, deserialize_with = "decimal")]
    pub expected_goals: f64,
    #[serde(default, deserialize_with = "decimal")]
    pub expected_assists: f64,
    #[serde(default, deserialize_with = "decimal")]
    pub expected_goal_involvements: f64,
    #[serde(default, deserialize_with = "decimal")]
    pub expected_goals_conceded: f64,
    #[serde(default)]
    pub news: String,
    #[serde(default)]
    pub chance_of_playing_next_round: Option<u32>,
    #[serde(default)]
    pub cost_change_start: i32,
    #[serde(default)]
    pub cost_change_event: i32,
    #[serde(default)]
    pub status: PlayerStatus,
}

impl Player {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.second_name)
            .trim()
            .to_string()
    }
}

/// Club metadata (`bootstrap-static` `teams[]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Club {
    pub id: ClubId,
    pub name: String,
    pub short_name: String,
    /// Badge/shirt code.
    #[serde(default)]
    pub code: u32,
    #[serde(default)]
    pub strength: u32,
    #[serde(default)]
    pub strength_overall_home: u32,
    #[serde(default)]
    pub strength_overall_away: u32,
    #[serde(default)]
    pub strength_attack_home: u32,
    #[serde(default)]
    pub strength_attack_away: u32,
    #[serde(default)]
    pub strength_defence_home: u32,
    #[serde(default)]
    pub strength_defence_away: u32,
}

/// A scheduled match. `event` is `None` for fixtures not yet assigned to a
/// gameweek (postponements).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    pub id: u32,
    #[serde(default)]
    pub event: Option<Gameweek>,
    pub team_h: ClubId,
    pub team_a: ClubId,
    pub team_h_difficulty: u8,
    pub team_a_difficulty: u8,
    #[serde(default)]
    pub kickoff_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub started: Option<bool>,
    #[serde(default)]
    pub finished: bool,
    #[serde(default)]
    pub team_h_score: Option<i32>,
    #[serde(default)]
    pub team_a_score: Option<i32>,
}

// ---------------------------------------------------------------------------
// Gameweeks / bootstrap
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChipPlay {
    pub chip_name: String,
    pub num_played: u32,
}

/// A gameweek (`bootstrap-static` `events[]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameweekInfo {
    pub id: Gameweek,
    pub name: String,
    #[serde(default)]
    pub deadline_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finished: bool,
    #[serde(default)]
    pub is_current: bool,
    #[serde(default)]
    pub is_next: bool,
    #[serde(default)]
    pub chip_plays: Vec<ChipPlay>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementTypeInfo {
    pub id: u8,
    pub singular_name: String,
    pub plural_name: String,
}

/// The `bootstrap-static` payload: every player, club and gameweek.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bootstrap {
    pub events: Vec<GameweekInfo>,
    pub teams: Vec<Club>,
    pub elements: Vec<Player>,
    #[serde(default)]
    pub element_types: Vec<ElementTypeInfo>,
}

impl Bootstrap {
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.elements.iter().find(|p| p.id == id)
    }

    pub fn club(&self, id: ClubId) -> Option<&Club> {
        self.teams.iter().find(|c| c.id == id)
    }

    pub fn gameweek(&self, id: Gameweek) -> Option<&GameweekInfo> {
        self.events.iter().find(|e| e.id == id)
    }

    /// The gameweek flagged `is_current`, or 1 before the season starts.
    pub fn current_gameweek(&self) -> Gameweek {
        self.events
            .iter()
            .find(|e| e.is_current)
            .map(|e| e.id)
            .unwrap_or(1)
    }

    /// Whether live stats can exist for `gw` (it is current or finished).
    pub fn has_started(&self, gw: Gameweek) -> bool {
        self.gameweek(gw)
            .is_some_and(|e| e.is_current || e.finished)
    }

    /// Club short name for a player, or `"???"` when either lookup fails.
    pub fn club_short_name(&self, player: &Player) -> &str {
        self.club(player.team)
            .map(|c| c.short_name.as_str())
            .unwrap_or("???")
    }
}

// ---------------------------------------------------------------------------
// Manager squad snapshot
// ---------------------------------------------------------------------------

/// One squad slot of a manager's picks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pick {
    /// Player id occupying the slot.
    pub element: PlayerId,
    /// Slot position 1..=15; 1..=11 start, 12..=15 bench in order.
    pub position: u8,
    #[serde(default = "default_multiplier")]
    pub multiplier: u8,
    #[serde(default)]
    pub is_captain: bool,
    #[serde(default)]
    pub is_vice_captain: bool,
}

fn default_multiplier() -> u8 {
    1
}

/// Official entry history for one gameweek, as returned by the API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryHistory {
    pub event: Gameweek,
    #[serde(default)]
    pub points: i32,
    #[serde(default)]
    pub total_points: i32,
    #[serde(default)]
    pub rank: Option<u32>,
    #[serde(default)]
    pub rank_sort: Option<u32>,
    #[serde(default)]
    pub overall_rank: Option<u32>,
    /// Money in the bank, tenths of a million.
    #[serde(default)]
    pub bank: i32,
    /// Squad value, tenths of a million.
    #[serde(default)]
    pub value: i32,
    #[serde(default)]
    pub event_transfers: u32,
    #[serde(default)]
    pub event_transfers_cost: i32,
    #[serde(default)]
    pub points_on_bench: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomaticSub {
    #[serde(default)]
    pub entry: u32,
    pub element_in: PlayerId,
    pub element_out: PlayerId,
    pub event: Gameweek,
}

/// A manager's picks for one gameweek.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SquadSnapshot {
    #[serde(default)]
    pub active_chip: Option<Chip>,
    #[serde(default)]
    pub automatic_subs: Vec<AutomaticSub>,
    pub entry_history: EntryHistory,
    pub picks: Vec<Pick>,
}

impl SquadSnapshot {
    /// The gameweek this snapshot was taken for.
    pub fn event(&self) -> Gameweek {
        self.entry_history.event
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.picks.iter().any(|p| p.element == id)
    }

    pub fn captain(&self) -> Option<&Pick> {
        self.picks.iter().find(|p| p.is_captain)
    }

    pub fn starting(&self) -> &[Pick] {
        &self.picks[..self.picks.len().min(STARTING_XI)]
    }

    pub fn bench(&self) -> &[Pick] {
        &self.picks[self.picks.len().min(STARTING_XI)..]
    }
}

// ---------------------------------------------------------------------------
// Manager summary / history
// ---------------------------------------------------------------------------

/// Summary of a manager's entry (`entry/{id}/`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagerSummary {
    pub id: u32,
    #[serde(default)]
    pub player_first_name: String,
    #[serde(default)]
    pub player_last_name: String,
    /// Team name.
    pub name: String,
    #[serde(default)]
    pub summary_overall_points: Option<i32>,
    #[serde(default)]
    pub summary_overall_rank: Option<u32>,
    #[serde(default)]
    pub current_event: Option<Gameweek>,
    #[serde(default, alias = "last_deadline_bank")]
    pub bank: Option<i32>,
    #[serde(default, alias = "last_deadline_value")]
    pub value: Option<i32>,
    #[serde(default)]
    pub leagues: Option<ManagerLeagues>,
}

impl ManagerSummary {
    pub fn manager_name(&self) -> String {
        format!("{} {}", self.player_first_name, self.player_last_name)
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChipUsage {
    pub name: Chip,
    pub event: Gameweek,
    #[serde(default)]
    pub time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PastSeason {
    pub season_name: String,
    pub total_points: i32,
    #[serde(default)]
    pub rank: Option<u32>,
}

/// `entry/{id}/history/`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManagerHistory {
    #[serde(default)]
    pub current: Vec<EntryHistory>,
    #[serde(default)]
    pub past: Vec<PastSeason>,
    #[serde(default)]
    pub chips: Vec<ChipUsage>,
}

impl ManagerHistory {
    /// Gameweek in which `chip` was already played this season, if any.
    pub fn chip_played(&self, chip: Chip) -> Option<Gameweek> {
        self.chips.iter().find(|c| c.name == chip).map(|c| c.event)
    }
}

// ---------------------------------------------------------------------------
// Live gameweek
// ---------------------------------------------------------------------------

/// Per-player stats for one gameweek (`event/{gw}/live/`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiveStats {
    #[serde(default)]
    pub minutes: u32,
    #[serde(default)]
    pub goals_scored: u32,
    #[serde(default)]
    pub assists: u32,
    #[serde(default)]
    pub clean_sheets: u32,
    /// Event points, including bonus.
    #[serde(default)]
    pub total_points: i32,
    #[serde(default)]
    pub bonus: i32,
    #[serde(default)]
    pub tackles: Option<u32>,
    #[serde(default)]
    pub interceptions: Option<u32>,
    #[serde(default)]
    pub own_goals: Option<u32>,
    #[serde(default)]
    pub penalties_saved: Option<u32>,
    #[serde(default)]
    pub yellow_cards: Option<u32>,
    #[serde(default)]
    pub red_cards: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveElement {
    pub id: PlayerId,
    pub stats: LiveStats,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiveGameweek {
    pub elements: Vec<LiveElement>,
}

impl LiveGameweek {
    pub fn stats_for(&self, id: PlayerId) -> Option<&LiveStats> {
        self.elements.iter().find(|e| e.id == id).map(|e| &e.stats)
    }
}

// ---------------------------------------------------------------------------
// Leagues
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueSummary {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub entry_rank: Option<u32>,
    #[serde(default)]
    pub entry_last_rank: Option<u32>,
}

/// Classic and head-to-head leagues an entry belongs to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManagerLeagues {
    #[serde(default)]
    pub classic: Vec<LeagueSummary>,
    #[serde(default)]
    pub h2h: Vec<LeagueSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandingEntry {
    pub entry: u32,
    pub entry_name: String,
    pub player_name: String,
    pub rank: u32,
    #[serde(default)]
    pub last_rank: u32,
    #[serde(default)]
    pub event_total: i32,
    pub total: i32,
}

impl StandingEntry {
    /// Positive when the entry climbed since the last gameweek.
    pub fn movement(&self) -> i64 {
        if self.last_rank == 0 {
            return 0;
        }
        self.last_rank as i64 - self.rank as i64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandingsPage {
    #[serde(default)]
    pub has_next: bool,
    #[serde(default = "first_page")]
    pub page: u32,
    pub results: Vec<StandingEntry>,
}

fn first_page() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueInfo {
    pub id: u32,
    pub name: String,
}

/// One page of a classic or h2h league table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueStandings {
    pub league: LeagueInfo,
    pub standings: StandingsPage,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
