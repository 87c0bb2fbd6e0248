// The connected session: fetched API payloads, the plan book and what of it
// survives a restart.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use fplanner_core::db::Database;
use fplanner_core::model::{
    Bootstrap, Fixture, Gameweek, LiveGameweek, LiveStats, ManagerHistory, ManagerSummary,
    PlayerId, SquadSnapshot, MAX_GAMEWEEK,
};
use fplanner_core::plan::{PlanBook, TransferPlan};
use fplanner_core::projection::{
    compute_financials, compute_gameweek_points, resolve_squad, Financials,
};

const KEY_TEAM_ID: &str = "team_id";
const KEY_MANAGER: &str = "manager";
const KEY_LAST_FETCH: &str = "last_fetch";
const KEY_SELECTED_GAMEWEEK: &str = "selected_gameweek";

/// Default age after which a stored session is refetched on startup.
pub const DEFAULT_MAX_AGE_MINUTES: i64 = 30;

/// State of the dashboard's connection to one FPL team.
///
/// Bootstrap data and fixtures are shared with UI snapshots and survive a
/// disconnect. Official squad snapshots and live stats are kept per
/// gameweek until the next refresh.
#[derive(Debug, Default)]
pub struct SessionContext {
    pub team_id: Option<u32>,
    pub manager: Option<ManagerSummary>,
    pub history: Option<ManagerHistory>,
    pub bootstrap: Option<Arc<Bootstrap>>,
    pub fixtures: Arc<Vec<Fixture>>,
    pub plans: PlanBook,
    pub selected_gameweek: Option<Gameweek>,
    /// When the manager summary was last fetched.
    pub last_fetch: Option<DateTime<Utc>>,
    snapshots: BTreeMap<Gameweek, SquadSnapshot>,
    live: HashMap<Gameweek, Arc<LiveGameweek>>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore the persisted part of a session: team id, manager summary,
    /// fetch time, selected gameweek and the plan book.
    pub fn load(db: &Database) -> Result<Self> {
        let plans = PlanBook::from_parts(db.load_transfer_plans()?, db.load_chip_plans()?);
        let session = Self {
            team_id: load_value(db, KEY_TEAM_ID)?,
            manager: load_value(db, KEY_MANAGER)?,
            last_fetch: load_value(db, KEY_LAST_FETCH)?,
            selected_gameweek: load_value(db, KEY_SELECTED_GAMEWEEK)?,
            plans,
            ..Self::default()
        };
        info!(
            "Loaded session: team={:?}, {} transfer plans, {} chip plans",
            session.team_id,
            session.plans.transfers().len(),
            session.plans.chips().len()
        );
        Ok(session)
    }

    /// Persist the team id, manager summary and fetch time.
    pub fn save_connection(&self, db: &Database) -> Result<()> {
        save_value(db, KEY_TEAM_ID, &self.team_id)?;
        save_value(db, KEY_MANAGER, &self.manager)?;
        save_value(db, KEY_LAST_FETCH, &self.last_fetch)?;
        Ok(())
    }

    pub fn save_plans(&self, db: &Database) -> Result<()> {
        db.replace_transfer_plans(self.plans.transfers())
            .context("failed to save transfer plans")?;
        db.replace_chip_plans(self.plans.chips())
            .context("failed to save chip plans")?;
        Ok(())
    }

    pub fn save_selected_gameweek(&self, db: &Database) -> Result<()> {
        save_value(db, KEY_SELECTED_GAMEWEEK, &self.selected_gameweek)
    }

    /// Forget the connected team, its snapshots and every plan, in memory
    /// and on disk. Bootstrap data and fixtures are kept.
    pub fn clear(&mut self, db: &Database) -> Result<()> {
        db.clear_all().context("failed to clear stored session")?;
        self.team_id = None;
        self.manager = None;
        self.history = None;
        self.last_fetch = None;
        self.selected_gameweek = None;
        self.plans.clear();
        self.clear_fetched();
        Ok(())
    }

    /// Drop fetched per-gameweek snapshots and live stats so they are
    /// refetched.
    pub fn clear_fetched(&mut self) {
        self.snapshots.clear();
        self.live.clear();
    }

    /// True when no manager fetch is recorded or it is older than `max_age`.
    pub fn is_expired(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        match self.last_fetch {
            Some(at) => now - at > max_age,
            None => true,
        }
    }

    // -----------------------------------------------------------------------
    // Fetched data
    // -----------------------------------------------------------------------

    pub fn insert_snapshot(&mut self, snapshot: SquadSnapshot) {
        debug!("Storing squad snapshot for GW{}", snapshot.event());
        self.snapshots.insert(snapshot.event(), snapshot);
    }

    pub fn has_snapshot(&self, gw: Gameweek) -> bool {
        self.snapshots.contains_key(&gw)
    }

    pub fn insert_live(&mut self, gw: Gameweek, live: LiveGameweek) {
        self.live.insert(gw, Arc::new(live));
    }

    pub fn has_live(&self, gw: Gameweek) -> bool {
        self.live.contains_key(&gw)
    }

    pub fn live_for(&self, gw: Gameweek) -> Option<Arc<LiveGameweek>> {
        self.live.get(&gw).cloned()
    }

    // -----------------------------------------------------------------------
    // Derived views
    // -----------------------------------------------------------------------

    /// The gameweek flagged current by the game, falling back to the
    /// manager's current event and then 1.
    pub fn current_gameweek(&self) -> Gameweek {
        if let Some(bootstrap) = &self.bootstrap {
            return bootstrap.current_gameweek();
        }
        self.manager
            .as_ref()
            .and_then(|m| m.current_event)
            .unwrap_or(1)
    }

    /// The gameweek the dashboard is showing, within `1..=38`.
    pub fn selected(&self) -> Gameweek {
        self.selected_gameweek
            .unwrap_or_else(|| self.current_gameweek())
            .clamp(1, MAX_GAMEWEEK)
    }

    /// The official snapshot projections for `gw` start from: the snapshot
    /// of `gw` itself, else the latest one before it, else the snapshot of
    /// the current gameweek.
    fn base_snapshot(&self, gw: Gameweek) -> Option<&SquadSnapshot> {
        self.snapshots
            .range(..=gw)
            .next_back()
            .map(|(_, s)| s)
            .or_else(|| self.snapshots.get(&self.current_gameweek()))
    }

    /// The squad for `gw` with every applicable planned transfer applied.
    pub fn picks_for_gameweek(&self, gw: Gameweek) -> Option<SquadSnapshot> {
        let base = self.base_snapshot(gw)?;
        Some(resolve_squad(base, self.plans.transfers(), gw))
    }

    /// The squad for `gw` with every applicable plan applied except the one
    /// planned for `gw` itself. A new transfer for `gw` replaces that plan,
    /// so it is checked against this squad.
    pub fn picks_before_transfer(&self, gw: Gameweek) -> Option<SquadSnapshot> {
        let base = self.base_snapshot(gw)?;
        let others: Vec<TransferPlan> = self
            .plans
            .transfers()
            .iter()
            .filter(|t| t.gameweek != gw)
            .cloned()
            .collect();
        Some(resolve_squad(base, &others, gw))
    }

    /// Gameweek of the snapshot [`Self::picks_for_gameweek`] starts from.
    pub fn base_gameweek(&self, gw: Gameweek) -> Option<Gameweek> {
        self.base_snapshot(gw).map(SquadSnapshot::event)
    }

    /// Projected bank, squad value and total budget at `gw`.
    pub fn financial_status(&self, gw: Gameweek) -> Option<Financials> {
        let bootstrap = self.bootstrap.as_deref()?;
        let base = self.base_snapshot(gw)?;
        let resolved = resolve_squad(base, self.plans.transfers(), gw);
        Some(compute_financials(
            base,
            &resolved,
            self.plans.transfers(),
            gw,
            bootstrap,
        ))
    }

    /// Live points of the projected squad at `gw`. `None` when the gameweek
    /// has not started or its live stats are not loaded.
    ///
    /// The official active chip wins over a planned one.
    pub fn gameweek_points(&self, gw: Gameweek) -> Option<i32> {
        if !self.gameweek_started(gw) {
            return None;
        }
        let live = self.live.get(&gw)?;
        let squad = self.picks_for_gameweek(gw)?;
        let chip = squad.active_chip.or_else(|| self.plans.chip_for(gw));
        Some(compute_gameweek_points(&squad, &**live, chip))
    }

    /// A player's live stats for `gw`. Future gameweeks never have any.
    pub fn player_live_stats(&self, id: PlayerId, gw: Gameweek) -> Option<&LiveStats> {
        if !self.gameweek_started(gw) {
            return None;
        }
        self.live.get(&gw)?.stats_for(id)
    }

    fn gameweek_started(&self, gw: Gameweek) -> bool {
        self.bootstrap
            .as_ref()
            .is_some_and(|b| b.has_started(gw))
    }
}

fn load_value<T: DeserializeOwned>(db: &Database, key: &str) -> Result<Option<T>> {
    match db.load_state(key)? {
        Some(serde_json::Value::Null) | None => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .with_context(|| format!("failed to decode stored {key}")),
    }
}

fn save_value<T: Serialize>(db: &Database, key: &str, value: &Option<T>) -> Result<()> {
    match value {
        Some(v) => {
            let json = serde_json::to_value(v)
                .with_context(|| format!("failed to encode {key}"))?;
            db.save_state(key, &json)
        }
        None => db.delete_state(key),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixture_bootstrap, fixture_live, fixture_manager, fixture_picks};
    use fplanner_core::model::Chip;
    use fplanner_core::plan::{ChipPlan, TransferPlan};

    fn db() -> Database {
        Database::open(":memory:").expect("in-memory database")
    }

    fn connected() -> SessionContext {
        let mut session = SessionContext::new();
        session.bootstrap = Some(Arc::new(fixture_bootstrap()));
        session.team_id = Some(4242);
        session.manager = Some(fixture_manager());
        session.insert_snapshot(fixture_picks());
        session
    }

    fn transfer(gameweek: Gameweek, player_out: PlayerId, player_in: PlayerId) -> TransferPlan {
        TransferPlan {
            gameweek,
            player_out,
            player_in,
            cost: 0,
        }
    }

    #[test]
    fn current_gameweek_falls_back_to_manager_then_one() {
        let mut session = SessionContext::new();
        assert_eq!(session.current_gameweek(), 1);
        let mut manager = fixture_manager();
        manager.current_event = Some(7);
        session.manager = Some(manager);
        assert_eq!(session.current_gameweek(), 7);
        session.bootstrap = Some(Arc::new(fixture_bootstrap()));
        assert_eq!(session.current_gameweek(), 10);
        assert_eq!(session.selected(), 10);
    }

    #[test]
    fn picks_without_plans_are_the_snapshot() {
        let session = connected();
        assert_eq!(session.picks_for_gameweek(10), Some(fixture_picks()));
        assert_eq!(session.base_gameweek(10), Some(10));
    }

    #[test]
    fn future_gameweek_projects_from_latest_snapshot() {
        let mut session = connected();
        session.plans.upsert_transfer(transfer(11, 15, 17)).unwrap();
        session.plans.upsert_transfer(transfer(13, 14, 16)).unwrap();

        let gw11 = session.picks_for_gameweek(11).unwrap();
        assert!(gw11.contains(17));
        assert!(!gw11.contains(15));
        assert!(gw11.contains(14));

        let gw13 = session.picks_for_gameweek(13).unwrap();
        assert!(gw13.contains(16));
        assert_eq!(session.base_gameweek(13), Some(10));
    }

    #[test]
    fn past_gameweek_without_snapshot_uses_current() {
        let session = connected();
        assert_eq!(session.base_gameweek(3), Some(10));
        assert!(SessionContext::new().picks_for_gameweek(3).is_none());
    }

    #[test]
    fn financial_status_follows_plans() {
        let mut session = connected();
        let now = session.financial_status(10).unwrap();
        assert_eq!(now.bank, 15);
        assert_eq!(now.squad_value, 985);
        assert_eq!(now.total_budget, 1000);

        // Solanke (11.0) out, Wissa (7.0) in.
        session.plans.upsert_transfer(transfer(11, 15, 17)).unwrap();
        let next = session.financial_status(11).unwrap();
        assert_eq!(next.bank, 55);
        assert_eq!(next.squad_value, 945);
        assert_eq!(next.total_budget, 1000);
        assert_eq!(session.financial_status(10), Some(now));
    }

    #[test]
    fn financial_status_needs_bootstrap() {
        let mut session = connected();
        session.bootstrap = None;
        assert_eq!(session.financial_status(10), None);
    }

    #[test]
    fn gameweek_points_need_started_gameweek_and_live() {
        let mut session = connected();
        assert_eq!(session.gameweek_points(10), None);

        session.insert_live(10, fixture_live());
        assert_eq!(session.gameweek_points(10), Some(54));
        assert_eq!(session.gameweek_points(11), None);

        session.insert_live(11, fixture_live());
        assert_eq!(session.gameweek_points(11), None, "GW11 has not started");
    }

    #[test]
    fn planned_bench_boost_counts_bench() {
        let mut session = connected();
        session.insert_live(10, fixture_live());
        session.plans.assign_chip(10, Chip::BenchBoost).unwrap();
        assert_eq!(session.gameweek_points(10), Some(65));
    }

    #[test]
    fn player_live_stats_only_for_started_gameweeks() {
        let mut session = connected();
        session.insert_live(10, fixture_live());
        session.insert_live(12, fixture_live());
        assert_eq!(session.player_live_stats(8, 10).map(|s| s.total_points), Some(9));
        assert!(session.player_live_stats(8, 12).is_none());
        assert!(session.player_live_stats(999, 10).is_none());
    }

    #[test]
    fn save_and_load_round_trip() {
        let db = db();
        let mut session = connected();
        session.last_fetch = Some(Utc::now());
        session.selected_gameweek = Some(12);
        session.plans.upsert_transfer(transfer(11, 15, 17)).unwrap();
        session.plans.assign_chip(12, Chip::TripleCaptain).unwrap();

        session.save_connection(&db).unwrap();
        session.save_plans(&db).unwrap();
        session.save_selected_gameweek(&db).unwrap();

        let loaded = SessionContext::load(&db).unwrap();
        assert_eq!(loaded.team_id, Some(4242));
        assert_eq!(loaded.manager, session.manager);
        assert_eq!(loaded.last_fetch, session.last_fetch);
        assert_eq!(loaded.selected_gameweek, Some(12));
        assert_eq!(loaded.plans, session.plans);
        assert!(loaded.bootstrap.is_none());
        assert!(!loaded.has_snapshot(10));
    }

    #[test]
    fn load_from_empty_database() {
        let loaded = SessionContext::load(&db()).unwrap();
        assert_eq!(loaded.team_id, None);
        assert!(loaded.plans.is_empty());
        assert!(loaded.is_expired(Utc::now(), Duration::minutes(30)));
    }

    #[test]
    fn clear_forgets_team_and_plans_but_keeps_bootstrap() {
        let db = db();
        let mut session = connected();
        session.plans.upsert_transfer(transfer(11, 15, 17)).unwrap();
        session.save_connection(&db).unwrap();
        session.save_plans(&db).unwrap();

        session.clear(&db).unwrap();
        assert_eq!(session.team_id, None);
        assert!(session.plans.is_empty());
        assert!(session.picks_for_gameweek(10).is_none());
        assert!(session.bootstrap.is_some());
        assert_eq!(db.load_state(KEY_TEAM_ID).unwrap(), None);
        assert!(db.load_transfer_plans().unwrap().is_empty());
    }

    #[test]
    fn saving_none_removes_stored_value() {
        let db = db();
        let mut session = connected();
        session.selected_gameweek = Some(5);
        session.save_selected_gameweek(&db).unwrap();
        session.selected_gameweek = None;
        session.save_selected_gameweek(&db).unwrap();
        assert_eq!(db.load_state(KEY_SELECTED_GAMEWEEK).unwrap(), None);
    }

    #[test]
    fn expiry_after_max_age() {
        let mut session = SessionContext::new();
        let now = Utc::now();
        let max_age = Duration::minutes(DEFAULT_MAX_AGE_MINUTES);
        session.last_fetch = Some(now - Duration::minutes(29));
        assert!(!session.is_expired(now, max_age));
        session.last_fetch = Some(now - Duration::minutes(31));
        assert!(session.is_expired(now, max_age));
    }

    #[test]
    fn stored_chip_plans_keep_uniqueness() {
        let db = db();
        db.replace_chip_plans(&[
            ChipPlan { gameweek: 20, chip: Chip::Wildcard },
            ChipPlan { gameweek: 25, chip: Chip::FreeHit },
        ])
        .unwrap();
        let loaded = SessionContext::load(&db).unwrap();
        assert_eq!(loaded.plans.chip_for(20), Some(Chip::Wildcard));
        assert_eq!(loaded.plans.chip_for(25), Some(Chip::FreeHit));
    }
}
