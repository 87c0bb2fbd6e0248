// In-memory FplSource backed by the recorded API payloads.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use fplanner_api::{ApiError, FplSource, LeagueKind};
use fplanner_core::model::{
    Bootstrap, Fixture, Gameweek, LeagueStandings, LiveGameweek, ManagerHistory, ManagerLeagues,
    ManagerSummary, SquadSnapshot,
};

const BOOTSTRAP: &str = include_str!("../../fplanner-api/tests/fixtures/bootstrap.json");
const FIXTURES: &str = include_str!("../../fplanner-api/tests/fixtures/fixtures.json");
const ENTRY: &str = include_str!("../../fplanner-api/tests/fixtures/entry.json");
const HISTORY: &str = include_str!("../../fplanner-api/tests/fixtures/history.json");
const PICKS_GW10: &str = include_str!("../../fplanner-api/tests/fixtures/picks_gw10.json");
const LIVE_GW10: &str = include_str!("../../fplanner-api/tests/fixtures/live_gw10.json");
const STANDINGS: &str = include_str!("../../fplanner-api/tests/fixtures/standings_classic.json");

pub fn fixture_bootstrap() -> Bootstrap {
    serde_json::from_str(BOOTSTRAP).expect("bootstrap fixture")
}

pub fn fixture_fixtures() -> Vec<Fixture> {
    serde_json::from_str(FIXTURES).expect("fixtures fixture")
}

pub fn fixture_manager() -> ManagerSummary {
    serde_json::from_str(ENTRY).expect("entry fixture")
}

pub fn fixture_history() -> ManagerHistory {
    serde_json::from_str(HISTORY).expect("history fixture")
}

pub fn fixture_picks() -> SquadSnapshot {
    serde_json::from_str(PICKS_GW10).expect("picks fixture")
}

pub fn fixture_live() -> LiveGameweek {
    serde_json::from_str(LIVE_GW10).expect("live fixture")
}

pub fn fixture_standings() -> LeagueStandings {
    serde_json::from_str(STANDINGS).expect("standings fixture")
}

fn not_found(path: String) -> ApiError {
    ApiError::Http {
        status: 404,
        url: format!("fake://{path}"),
    }
}

/// Serves team 4242 with picks and live stats for GW10 only. Every other
/// team, gameweek or league answers 404. Calls are counted per endpoint.
pub struct FakeSource {
    pub team_id: u32,
    pub picks: Mutex<HashMap<Gameweek, SquadSnapshot>>,
    pub live: Mutex<HashMap<Gameweek, LiveGameweek>>,
    pub fail_bootstrap: bool,
    calls: Mutex<HashMap<&'static str, usize>>,
    cache_clears: AtomicUsize,
}

impl Default for FakeSource {
    fn default() -> Self {
        Self {
            team_id: 4242,
            picks: Mutex::new(HashMap::from([(10, fixture_picks())])),
            live: Mutex::new(HashMap::from([(10, fixture_live())])),
            fail_bootstrap: false,
            calls: Mutex::new(HashMap::new()),
            cache_clears: AtomicUsize::new(0),
        }
    }
}

impl FakeSource {
    /// Serves the same payloads under another team id.
    pub fn for_team(team_id: u32) -> Self {
        Self {
            team_id,
            ..Self::default()
        }
    }

    pub fn failing_bootstrap() -> Self {
        Self {
            fail_bootstrap: true,
            ..Self::default()
        }
    }

    pub fn calls(&self, endpoint: &str) -> usize {
        self.calls.lock().unwrap().get(endpoint).copied().unwrap_or(0)
    }

    pub fn cache_clears(&self) -> usize {
        self.cache_clears.load(Ordering::SeqCst)
    }

    fn record(&self, endpoint: &'static str) {
        *self.calls.lock().unwrap().entry(endpoint).or_default() += 1;
    }

    fn check_team(&self, team_id: u32) -> Result<(), ApiError> {
        if team_id == self.team_id {
            Ok(())
        } else {
            Err(not_found(format!("entry/{team_id}/")))
        }
    }
}

#[async_trait]
impl FplSource for FakeSource {
    async fn bootstrap(&self) -> Result<Bootstrap, ApiError> {
        self.record("bootstrap");
        if self.fail_bootstrap {
            return Err(ApiError::Http {
                status: 503,
                url: "fake://bootstrap-static/".into(),
            });
        }
        Ok(fixture_bootstrap())
    }

    async fn fixtures(&self) -> Result<Vec<Fixture>, ApiError> {
        self.record("fixtures");
        Ok(fixture_fixtures())
    }

    async fn manager(&self, team_id: u32) -> Result<ManagerSummary, ApiError> {
        self.record("manager");
        self.check_team(team_id)?;
        Ok(fixture_manager())
    }

    async fn picks(&self, team_id: u32, gw: Gameweek) -> Result<SquadSnapshot, ApiError> {
        self.record("picks");
        self.check_team(team_id)?;
        self.picks
            .lock()
            .unwrap()
            .get(&gw)
            .cloned()
            .ok_or_else(|| not_found(format!("entry/{team_id}/event/{gw}/picks/")))
    }

    async fn history(&self, team_id: u32) -> Result<ManagerHistory, ApiError> {
        self.record("history");
        self.check_team(team_id)?;
        Ok(fixture_history())
    }

    async fn live(&self, gw: Gameweek) -> Result<LiveGameweek, ApiError> {
        self.record("live");
        self.live
            .lock()
            .unwrap()
            .get(&gw)
            .cloned()
            .ok_or_else(|| not_found(format!("event/{gw}/live/")))
    }

    async fn manager_leagues(&self, team_id: u32) -> Result<ManagerLeagues, ApiError> {
        self.record("manager_leagues");
        self.check_team(team_id)?;
        Ok(fixture_manager().leagues.unwrap_or_default())
    }

    async fn standings(
        &self,
        league_id: u32,
        kind: LeagueKind,
        page: u32,
    ) -> Result<LeagueStandings, ApiError> {
        self.record("standings");
        let table = fixture_standings();
        if kind == LeagueKind::Classic && league_id == table.league.id && page == 1 {
            Ok(table)
        } else {
            Err(not_found(format!(
                "{}/{league_id}/standings/?page_standings={page}",
                kind.path_segment()
            )))
        }
    }

    fn clear_cache(&self) {
        self.cache_clears.fetch_add(1, Ordering::SeqCst);
    }
}
