// The seam between the orchestrator and wherever FPL data comes from.

use async_trait::async_trait;

use fplanner_core::model::{
    Bootstrap, Fixture, Gameweek, LeagueStandings, LiveGameweek, ManagerHistory, ManagerLeagues,
    ManagerSummary, SquadSnapshot,
};

use crate::error::ApiError;

/// Classic leagues rank by total points; head-to-head leagues by match
/// results. They live under different endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeagueKind {
    Classic,
    HeadToHead,
}

impl LeagueKind {
    pub fn path_segment(&self) -> &'static str {
        match self {
            LeagueKind::Classic => "leagues-classic",
            LeagueKind::HeadToHead => "leagues-h2h",
        }
    }
}

/// Every read the dashboard performs against the FPL API.
#[async_trait]
pub trait FplSource: Send + Sync {
    async fn bootstrap(&self) -> Result<Bootstrap, ApiError>;

    async fn fixtures(&self) -> Result<Vec<Fixture>, ApiError>;

    async fn manager(&self, team_id: u32) -> Result<ManagerSummary, ApiError>;

    async fn picks(&self, team_id: u32, gw: Gameweek) -> Result<SquadSnapshot, ApiError>;

    async fn history(&self, team_id: u32) -> Result<ManagerHistory, ApiError>;

    async fn live(&self, gw: Gameweek) -> Result<LiveGameweek, ApiError>;

    async fn manager_leagues(&self, team_id: u32) -> Result<ManagerLeagues, ApiError>;

    async fn standings(
        &self,
        league_id: u32,
        kind: LeagueKind,
        page: u32,
    ) -> Result<LeagueStandings, ApiError>;

    /// Drop any cached responses so the next reads hit the network.
    fn clear_cache(&self);
}
