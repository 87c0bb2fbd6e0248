// Derived views over a squad: value, form, minutes, availability, fixtures.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::model::{
    Bootstrap, Chip, ClubId, Fixture, Gameweek, Player, PlayerId, PlayerStatus, Position,
    SquadSnapshot, SQUAD_SIZE,
};
use crate::projection::{compute_gameweek_points, LivePoints, PriceLookup};

/// Most expensive player considered by [`best_value`] (tenths of a million).
pub const BEST_VALUE_MAX_PRICE: i32 = 150;
/// Maximum number of players from one club in a valid squad.
pub const MAX_PER_CLUB: usize = 3;

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// Format tenths of a million as `£5.5m`.
pub fn format_price(tenths: i32) -> String {
    let sign = if tenths < 0 { "-" } else { "" };
    let abs = tenths.abs();
    format!("{sign}£{}.{}m", abs / 10, abs % 10)
}

/// FPL fixture difficulty rating as text.
pub fn difficulty_label(difficulty: u8) -> &'static str {
    match difficulty {
        1 => "Very Easy",
        2 => "Easy",
        3 => "Medium",
        4 => "Hard",
        5 => "Very Hard",
        _ => "Unknown",
    }
}

fn squad_players<'a>(
    ids: impl Iterator<Item = PlayerId> + 'a,
    bootstrap: &'a Bootstrap,
) -> impl Iterator<Item = &'a Player> + 'a {
    ids.filter_map(move |id| bootstrap.player(id))
}

// ---------------------------------------------------------------------------
// Value and form
// ---------------------------------------------------------------------------

pub fn points_per_million(player: &Player) -> f64 {
    if player.now_cost <= 0 {
        return 0.0;
    }
    player.total_points as f64 / (player.now_cost as f64 / 10.0)
}

#[derive(Debug, Clone, PartialEq)]
pub struct PpmRow<'a> {
    pub player: &'a Player,
    pub ppm: f64,
}

fn by_ppm_desc(rows: &mut [PpmRow<'_>]) {
    rows.sort_by(|a, b| b.ppm.total_cmp(&a.ppm));
}

/// Squad players ranked by points per million, best first.
pub fn ppm_table<'a>(squad: &SquadSnapshot, bootstrap: &'a Bootstrap) -> Vec<PpmRow<'a>> {
    let ids: Vec<PlayerId> = squad.picks.iter().map(|p| p.element).collect();
    let mut rows: Vec<PpmRow<'a>> = squad_players(ids.into_iter(), bootstrap)
        .map(|player| PpmRow {
            player,
            ppm: points_per_million(player),
        })
        .collect();
    by_ppm_desc(&mut rows);
    rows
}

/// Squad players ranked by form, best first.
pub fn form_table<'a>(squad: &SquadSnapshot, bootstrap: &'a Bootstrap) -> Vec<&'a Player> {
    let ids: Vec<PlayerId> = squad.picks.iter().map(|p| p.element).collect();
    let mut rows: Vec<&Player> = squad_players(ids.into_iter(), bootstrap).collect();
    rows.sort_by(|a, b| b.form.total_cmp(&a.form));
    rows
}

/// Best points-per-million across the whole game, among players priced at
/// or below [`BEST_VALUE_MAX_PRICE`].
pub fn best_value(bootstrap: &Bootstrap, limit: usize) -> Vec<PpmRow<'_>> {
    let mut rows: Vec<PpmRow<'_>> = bootstrap
        .elements
        .iter()
        .filter(|p| p.now_cost <= BEST_VALUE_MAX_PRICE)
        .map(|player| PpmRow {
            player,
            ppm: points_per_million(player),
        })
        .collect();
    by_ppm_desc(&mut rows);
    rows.truncate(limit);
    rows
}

// ---------------------------------------------------------------------------
// Wildcard planning
// ---------------------------------------------------------------------------

/// Shape of the most-owned template: 3 GKP, 5 DEF, 5 MID, 3 FWD.
const TEMPLATE_SHAPE: [(Position, usize); 4] = [
    (Position::Goalkeeper, 3),
    (Position::Defender, 5),
    (Position::Midfielder, 5),
    (Position::Forward, 3),
];

/// The most-owned players per position, priced at or below
/// [`BEST_VALUE_MAX_PRICE`], most owned first. Equal ownership keeps the
/// game's player order.
pub fn template_team(bootstrap: &Bootstrap) -> Vec<(Position, Vec<&Player>)> {
    TEMPLATE_SHAPE
        .iter()
        .map(|&(position, count)| {
            let mut players: Vec<&Player> = bootstrap
                .elements
                .iter()
                .filter(|p| p.position == position && p.now_cost <= BEST_VALUE_MAX_PRICE)
                .collect();
            players.sort_by(|a, b| b.selected_by_percent.total_cmp(&a.selected_by_percent));
            players.truncate(count);
            (position, players)
        })
        .collect()
}

/// A throwaway wildcard squad drafted against a fixed budget.
///
/// Players are only added while the draft stays within budget and below a
/// full squad.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WildcardDraft {
    budget: i32,
    players: Vec<PlayerId>,
}

impl WildcardDraft {
    pub fn new(budget: i32) -> Self {
        Self {
            budget,
            players: Vec::new(),
        }
    }

    pub fn budget(&self) -> i32 {
        self.budget
    }

    pub fn players(&self) -> &[PlayerId] {
        &self.players
    }

    /// Current price of every drafted player; unknown players count 0.
    pub fn cost(&self, prices: &impl PriceLookup) -> i32 {
        self.players
            .iter()
            .map(|id| prices.price(*id).unwrap_or(0))
            .sum()
    }

    pub fn remaining(&self, prices: &impl PriceLookup) -> i32 {
        self.budget - self.cost(prices)
    }

    /// Draft `id` if it is known, not yet drafted, affordable and the squad
    /// is not full. Returns whether it was added.
    pub fn add(&mut self, id: PlayerId, prices: &impl PriceLookup) -> bool {
        let Some(price) = prices.price(id) else {
            return false;
        };
        if self.players.contains(&id)
            || self.players.len() >= SQUAD_SIZE
            || self.cost(prices) + price > self.budget
        {
            return false;
        }
        self.players.push(id);
        true
    }

    pub fn remove(&mut self, id: PlayerId) -> bool {
        let before = self.players.len();
        self.players.retain(|p| *p != id);
        self.players.len() != before
    }

    /// Remove `id` if drafted, otherwise try to add it. Returns whether it
    /// is drafted afterwards.
    pub fn toggle(&mut self, id: PlayerId, prices: &impl PriceLookup) -> bool {
        if self.remove(id) {
            return false;
        }
        self.add(id, prices)
    }
}

// ---------------------------------------------------------------------------
// Rotation risk
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RotationRisk {
    High,
    Medium,
    Low,
}

impl RotationRisk {
    pub fn from_average_minutes(avg: f64) -> Self {
        if avg < 60.0 {
            RotationRisk::High
        } else if avg < 75.0 {
            RotationRisk::Medium
        } else {
            RotationRisk::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RotationRisk::High => "High",
            RotationRisk::Medium => "Medium",
            RotationRisk::Low => "Low",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RotationRow<'a> {
    pub player: &'a Player,
    pub avg_minutes: f64,
    pub risk: RotationRisk,
}

/// Minutes-per-gameweek risk for the starting XI, highest risk first.
pub fn rotation_risk<'a>(squad: &SquadSnapshot, bootstrap: &'a Bootstrap) -> Vec<RotationRow<'a>> {
    let games = bootstrap.current_gameweek().max(1) as f64;
    let ids: Vec<PlayerId> = squad.starting().iter().map(|p| p.element).collect();
    let mut rows: Vec<RotationRow<'a>> = squad_players(ids.into_iter(), bootstrap)
        .map(|player| {
            let avg_minutes = player.minutes as f64 / games;
            RotationRow {
                player,
                avg_minutes,
                risk: RotationRisk::from_average_minutes(avg_minutes),
            }
        })
        .collect();
    rows.sort_by_key(|r| r.risk);
    rows
}

// ---------------------------------------------------------------------------
// Availability
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Red,
    Orange,
    Yellow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Fit,
    Doubtful,
    Suspended,
    Unavailable,
    Injured,
    Chance { percent: u32, severity: Severity },
}

impl Availability {
    pub fn of(player: &Player) -> Self {
        match player.status {
            PlayerStatus::Doubtful => return Availability::Doubtful,
            PlayerStatus::Suspended => return Availability::Suspended,
            PlayerStatus::Unavailable | PlayerStatus::NotInSquad => {
                return Availability::Unavailable
            }
            PlayerStatus::Injured => return Availability::Injured,
            PlayerStatus::Available | PlayerStatus::Unknown => {}
        }
        match player.chance_of_playing_next_round {
            Some(percent) if percent < 25 => Availability::Chance {
                percent,
                severity: Severity::Red,
            },
            Some(percent) if percent < 50 => Availability::Chance {
                percent,
                severity: Severity::Orange,
            },
            Some(percent) if percent < 100 => Availability::Chance {
                percent,
                severity: Severity::Yellow,
            },
            _ => Availability::Fit,
        }
    }

    pub fn label(&self) -> String {
        match self {
            Availability::Fit => "Fit".into(),
            Availability::Doubtful => "Doubtful".into(),
            Availability::Suspended => "Suspended".into(),
            Availability::Unavailable => "Unavailable".into(),
            Availability::Injured => "Injured".into(),
            Availability::Chance { percent, .. } => format!("{percent}% Likely"),
        }
    }

    pub fn severity(&self) -> Option<Severity> {
        match self {
            Availability::Fit => None,
            Availability::Doubtful => Some(Severity::Orange),
            Availability::Suspended | Availability::Unavailable | Availability::Injured => {
                Some(Severity::Red)
            }
            Availability::Chance { severity, .. } => Some(*severity),
        }
    }
}

/// Squad players who are not fully fit, with their availability flag.
pub fn availability_alerts<'a>(
    squad: &SquadSnapshot,
    bootstrap: &'a Bootstrap,
) -> Vec<(&'a Player, Availability)> {
    let ids: Vec<PlayerId> = squad.picks.iter().map(|p| p.element).collect();
    squad_players(ids.into_iter(), bootstrap)
        .map(|p| (p, Availability::of(p)))
        .filter(|(_, a)| *a != Availability::Fit)
        .collect()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// One club's view of a fixture.
#[derive(Debug, Clone, PartialEq)]
pub struct ClubFixture {
    pub opponent: ClubId,
    pub home: bool,
    pub difficulty: u8,
    pub kickoff: Option<DateTime<Utc>>,
}

/// Fixtures of gameweek `gw`, indexed by club. Clubs with a blank gameweek
/// are absent; clubs with a double gameweek have two entries.
pub fn fixtures_by_club(fixtures: &[Fixture], gw: Gameweek) -> HashMap<ClubId, Vec<ClubFixture>> {
    let mut map: HashMap<ClubId, Vec<ClubFixture>> = HashMap::new();
    for f in fixtures.iter().filter(|f| f.event == Some(gw)) {
        map.entry(f.team_h).or_default().push(ClubFixture {
            opponent: f.team_a,
            home: true,
            difficulty: f.team_h_difficulty,
            kickoff: f.kickoff_time,
        });
        map.entry(f.team_a).or_default().push(ClubFixture {
            opponent: f.team_h,
            home: false,
            difficulty: f.team_a_difficulty,
            kickoff: f.kickoff_time,
        });
    }
    map
}

/// Short `ARS (H)` style description of a club's fixtures in a gameweek.
pub fn describe_fixtures(bootstrap: &Bootstrap, fixtures: &[ClubFixture]) -> String {
    if fixtures.is_empty() {
        return "-".into();
    }
    fixtures
        .iter()
        .map(|f| {
            let opp = bootstrap
                .club(f.opponent)
                .map(|c| c.short_name.as_str())
                .unwrap_or("???");
            format!("{opp} ({})", if f.home { "H" } else { "A" })
        })
        .collect::<Vec<_>>()
        .join(", ")
}

// ---------------------------------------------------------------------------
// Captaincy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CaptainSuggestion<'a> {
    pub player: &'a Player,
    pub form: f64,
    /// Mean of `5 - difficulty` over the player's fixtures; 0 with no fixture.
    pub avg_ease: f64,
    pub score: f64,
}

/// Starting XI player with the best `form * 2 + ease * 1.5` score, if any
/// scores above zero.
pub fn suggest_captain<'a>(
    squad: &SquadSnapshot,
    bootstrap: &'a Bootstrap,
    by_club: &HashMap<ClubId, Vec<ClubFixture>>,
) -> Option<CaptainSuggestion<'a>> {
    squad
        .starting()
        .iter()
        .filter_map(|pick| bootstrap.player(pick.element))
        .map(|player| {
            let fixtures = by_club.get(&player.team).map(Vec::as_slice).unwrap_or(&[]);
            let avg_ease = if fixtures.is_empty() {
                0.0
            } else {
                fixtures
                    .iter()
                    .map(|f| 5.0 - f.difficulty as f64)
                    .sum::<f64>()
                    / fixtures.len() as f64
            };
            CaptainSuggestion {
                player,
                form: player.form,
                avg_ease,
                score: player.form * 2.0 + avg_ease * 1.5,
            }
        })
        .fold(None, |best: Option<CaptainSuggestion<'a>>, cand| match best {
            Some(b) if b.score >= cand.score => Some(b),
            _ => Some(cand),
        })
        .filter(|s| s.score > 0.0)
}

// ---------------------------------------------------------------------------
// Squad validation
// ---------------------------------------------------------------------------

/// Check a list of player ids against the squad composition rules. Returns
/// one message per broken rule; an empty list means the squad is legal.
pub fn validate_squad(ids: &[PlayerId], bootstrap: &Bootstrap) -> Vec<String> {
    let mut errors = Vec::new();
    if ids.len() != SQUAD_SIZE {
        errors.push(format!("Squad must have exactly {SQUAD_SIZE} players"));
    }

    let mut by_position: HashMap<Position, usize> = HashMap::new();
    let mut by_club: HashMap<ClubId, usize> = HashMap::new();
    for player in ids.iter().filter_map(|id| bootstrap.player(*id)) {
        *by_position.entry(player.position).or_default() += 1;
        *by_club.entry(player.team).or_default() += 1;
    }
    let count = |pos| by_position.get(&pos).copied().unwrap_or(0);

    if count(Position::Goalkeeper) != 2 {
        errors.push("Must have exactly 2 goalkeepers".into());
    }
    if !(3..=5).contains(&count(Position::Defender)) {
        errors.push("Must have 3-5 defenders".into());
    }
    if !(2..=5).contains(&count(Position::Midfielder)) {
        errors.push("Must have 2-5 midfielders".into());
    }
    if !(1..=3).contains(&count(Position::Forward)) {
        errors.push("Must have 1-3 forwards".into());
    }
    if by_club.values().any(|n| *n > MAX_PER_CLUB) {
        errors.push(format!("Maximum {MAX_PER_CLUB} players from the same team"));
    }
    errors
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

/// One labelled statistic across the compared players.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRow {
    pub label: &'static str,
    pub values: Vec<String>,
}

/// Side-by-side stats for up to `max` players. Unknown ids are dropped.
pub fn compare_players(ids: &[PlayerId], bootstrap: &Bootstrap, max: usize) -> Vec<ComparisonRow> {
    let players: Vec<&Player> = ids
        .iter()
        .filter_map(|id| bootstrap.player(*id))
        .take(max)
        .collect();
    if players.is_empty() {
        return Vec::new();
    }

    let row = |label: &'static str, f: &dyn Fn(&Player) -> String| ComparisonRow {
        label,
        values: players.iter().map(|&p| f(p)).collect(),
    };

    vec![
        row("Player", &|p| p.web_name.clone()),
        row("Club", &|p| bootstrap.club_short_name(p).to_string()),
        row("Position", &|p| p.position.to_string()),
        row("Price", &|p| format_price(p.now_cost)),
        row("Total", &|p| p.total_points.to_string()),
        row("Form", &|p| format!("{:.1}", p.form)),
        row("PPG", &|p| format!("{:.1}", p.points_per_game)),
        row("PPM", &|p| format!("{:.2}", points_per_million(p))),
        row("Minutes", &|p| p.minutes.to_string()),
        row("Goals", &|p| p.goals_scored.to_string()),
        row("Assists", &|p| p.assists.to_string()),
        row("Clean sheets", &|p| p.clean_sheets.to_string()),
        row("xG", &|p| format!("{:.2}", p.expected_goals)),
        row("xA", &|p| format!("{:.2}", p.expected_assists)),
        row("ICT", &|p| format!("{:.1}", p.ict_index)),
        row("Selected", &|p| format!("{:.1}%", p.selected_by_percent)),
    ]
}

// ---------------------------------------------------------------------------
// Transfer candidates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateFilter {
    pub position: Option<Position>,
    pub max_price: Option<i32>,
    /// Money available for the incoming player (bank plus the outgoing
    /// player's price). `None` ignores the budget.
    pub budget: Option<i32>,
    /// Case-insensitive match on player names and club names.
    pub query: String,
}

/// Players outside the squad matching `filter`, by total points descending.
pub fn transfer_candidates<'a>(
    bootstrap: &'a Bootstrap,
    squad: &SquadSnapshot,
    filter: &CandidateFilter,
) -> Vec<&'a Player> {
    let query = filter.query.trim().to_lowercase();
    let mut players: Vec<&Player> = bootstrap
        .elements
        .iter()
        .filter(|p| !squad.contains(p.id))
        .filter(|p| filter.position.is_none_or(|pos| p.position == pos))
        .filter(|p| filter.max_price.is_none_or(|max| p.now_cost <= max))
        .filter(|p| filter.budget.is_none_or(|b| p.now_cost <= b))
        .filter(|p| query.is_empty() || matches_query(bootstrap, p, &query))
        .collect();
    players.sort_by(|a, b| b.total_points.cmp(&a.total_points));
    players
}

fn matches_query(bootstrap: &Bootstrap, player: &Player, query: &str) -> bool {
    let name_hit = [&player.web_name, &player.first_name, &player.second_name]
        .iter()
        .any(|n| n.to_lowercase().contains(query));
    let club_hit = bootstrap.club(player.team).is_some_and(|c| {
        c.name.to_lowercase().contains(query) || c.short_name.to_lowercase().contains(query)
    });
    name_hit || club_hit
}

/// Up to three starters worth moving on: form below 2.0 or high rotation
/// risk, weakest form first.
pub fn transfer_out_suggestions<'a>(
    squad: &SquadSnapshot,
    bootstrap: &'a Bootstrap,
) -> Vec<&'a Player> {
    let mut weak: Vec<&Player> = rotation_risk(squad, bootstrap)
        .into_iter()
        .filter(|r| r.player.form < 2.0 || r.risk == RotationRisk::High)
        .map(|r| r.player)
        .collect();
    weak.sort_by(|a, b| a.form.total_cmp(&b.form));
    weak.truncate(3);
    weak
}

// ---------------------------------------------------------------------------
// Live summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveSummary {
    /// Gameweek points from live stats (captain doubled).
    pub live_total: i32,
    /// Season total with this gameweek's official points replaced by the
    /// live figure.
    pub overall_total: i32,
    pub top_performer: Option<(PlayerId, i32)>,
    pub worst_performer: Option<(PlayerId, i32)>,
    pub bench_points: i32,
}

pub fn live_summary(
    squad: &SquadSnapshot,
    live: &impl LivePoints,
    active_chip: Option<Chip>,
) -> LiveSummary {
    let live_total = compute_gameweek_points(squad, live, active_chip);
    let history = &squad.entry_history;
    let overall_total = history.total_points - history.points + live_total;

    let scored: Vec<(PlayerId, i32)> = squad
        .picks
        .iter()
        .map(|p| (p.element, live.points(p.element).unwrap_or(0)))
        .collect();
    let top_performer = scored
        .iter()
        .copied()
        .fold(None, |best: Option<(PlayerId, i32)>, c| match best {
            Some(b) if b.1 >= c.1 => Some(b),
            _ => Some(c),
        });
    let worst_performer = scored
        .iter()
        .copied()
        .fold(None, |worst: Option<(PlayerId, i32)>, c| match worst {
            Some(w) if w.1 <= c.1 => Some(w),
            _ => Some(c),
        });
    let bench_points = squad
        .bench()
        .iter()
        .map(|p| live.points(p.element).unwrap_or(0))
        .sum();

    LiveSummary {
        live_total,
        overall_total,
        top_performer,
        worst_performer,
        bench_points,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
