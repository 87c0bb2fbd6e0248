// Application state and orchestration logic.
//
// The central event loop that turns user commands from the TUI into FPL API
// fetches, plan book mutations and session persistence. Owns the session
// and pushes a fresh snapshot to the TUI after every state change.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use fplanner_api::{FplSource, LeagueKind};
use fplanner_core::analytics::validate_squad;
use fplanner_core::config::Config;
use fplanner_core::db::Database;
use fplanner_core::model::{
    Chip, Gameweek, LeagueStandings, ManagerLeagues, PlayerId, SquadSnapshot, MAX_GAMEWEEK,
};
use fplanner_core::plan::TransferPlan;

use crate::protocol::{AppSnapshot, ConnectionStatus, GameweekOutlook, UiUpdate, UserCommand};
use crate::session::SessionContext;

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// The complete application state.
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub source: Arc<dyn FplSource>,
    pub session: SessionContext,
    pub connection: ConnectionStatus,
    pub leagues: Option<ManagerLeagues>,
    pub standings: Option<LeagueStandings>,
}

impl AppState {
    pub fn new(
        config: Config,
        db: Database,
        source: Arc<dyn FplSource>,
        session: SessionContext,
    ) -> Self {
        Self {
            config,
            db,
            source,
            session,
            connection: ConnectionStatus::Disconnected,
            leagues: None,
            standings: None,
        }
    }

    /// Build a full snapshot of the session for the TUI, projected to the
    /// selected gameweek.
    pub fn build_snapshot(&self) -> AppSnapshot {
        let session = &self.session;
        let gw = session.selected();
        let squad = session.picks_for_gameweek(gw);
        let validation = match (&squad, &session.bootstrap) {
            (Some(squad), Some(bootstrap)) => {
                let ids: Vec<PlayerId> = squad.picks.iter().map(|p| p.element).collect();
                validate_squad(&ids, bootstrap)
            }
            _ => Vec::new(),
        };

        AppSnapshot {
            team_id: session.team_id,
            manager: session.manager.clone(),
            history: session.history.clone(),
            connection: self.connection,
            current_gameweek: session.current_gameweek(),
            selected_gameweek: gw,
            bootstrap: session.bootstrap.clone(),
            fixtures: Arc::clone(&session.fixtures),
            base_gameweek: session.base_gameweek(gw),
            financials: session.financial_status(gw),
            gameweek_points: session.gameweek_points(gw),
            live: session.live_for(gw),
            squad,
            plans: session.plans.clone(),
            outlook: self.build_outlook(),
            max_compare: self.config.planner.max_compare,
            validation,
            leagues: self.leagues.clone(),
            standings: self.standings.clone(),
        }
    }

    /// Planner rows for `planner.horizon` gameweeks starting at the current
    /// one.
    fn build_outlook(&self) -> Vec<GameweekOutlook> {
        let session = &self.session;
        let first = session.current_gameweek();
        let last = (first + self.config.planner.horizon)
            .saturating_sub(1)
            .min(MAX_GAMEWEEK);
        (first..=last)
            .map(|gw| GameweekOutlook {
                gameweek: gw,
                deadline: session
                    .bootstrap
                    .as_ref()
                    .and_then(|b| b.gameweek(gw))
                    .and_then(|e| e.deadline_time),
                chip: session.plans.chip_for(gw),
                transfer: session.plans.transfer_for(gw).cloned(),
                financials: session.financial_status(gw),
            })
            .collect()
    }

    fn max_age(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.config.session.max_age_minutes)
    }

    async fn set_connection(&mut self, status: ConnectionStatus, ui_tx: &mpsc::Sender<UiUpdate>) {
        if self.connection != status {
            self.connection = status;
            let _ = ui_tx.send(UiUpdate::ConnectionStatus(status)).await;
        }
    }

    // -----------------------------------------------------------------------
    // Fetching
    // -----------------------------------------------------------------------

    /// Fetch bootstrap data and fixtures concurrently. A fixtures failure
    /// leaves the previous list in place.
    pub async fn load_static(&mut self) -> Result<()> {
        let (bootstrap, fixtures) = tokio::join!(self.source.bootstrap(), self.source.fixtures());
        let bootstrap = bootstrap.context("failed to load game data")?;
        info!(
            "Loaded game data: {} players, {} clubs, current GW{}",
            bootstrap.elements.len(),
            bootstrap.teams.len(),
            bootstrap.current_gameweek()
        );
        self.session.bootstrap = Some(Arc::new(bootstrap));
        match fixtures {
            Ok(list) => self.session.fixtures = Arc::new(list),
            Err(e) => warn!("Failed to load fixtures: {}", e),
        }
        Ok(())
    }

    /// Connect to `team_id`: fetch its summary, history and the squad for
    /// its current gameweek, select that gameweek and persist the session.
    pub async fn connect(&mut self, team_id: u32) -> Result<()> {
        if self.session.bootstrap.is_none() {
            self.load_static().await?;
        }

        let manager = self
            .source
            .manager(team_id)
            .await
            .with_context(|| format!("failed to connect team {team_id}"))?;
        let gw = manager
            .current_event
            .unwrap_or_else(|| self.session.current_gameweek())
            .clamp(1, MAX_GAMEWEEK);

        let (picks, history) = tokio::join!(
            self.source.picks(team_id, gw),
            self.source.history(team_id)
        );
        let picks = picks.with_context(|| format!("failed to load GW{gw} picks"))?;
        match self.session.team_id {
            Some(previous) if previous != team_id => self.switch_team(previous, team_id)?,
            Some(_) => {}
            None => {
                self.leagues = None;
                self.standings = None;
            }
        }
        match history {
            Ok(h) => self.session.history = Some(h),
            Err(e) => warn!("Failed to load history for team {}: {}", team_id, e),
        }
        info!("Connected team {} ({})", team_id, manager.name);
        self.session.team_id = Some(team_id);
        self.session.manager = Some(manager);
        self.session.last_fetch = Some(Utc::now());
        self.session.insert_snapshot(picks);
        self.session.selected_gameweek = Some(gw);
        self.session.save_connection(&self.db)?;
        self.session.save_selected_gameweek(&self.db)?;

        self.load_gameweek(gw).await;
        Ok(())
    }

    /// Forget everything that belonged to the previously connected team,
    /// including its stored plans.
    fn switch_team(&mut self, previous: u32, team_id: u32) -> Result<()> {
        info!("Switching team {} -> {}, dropping its plans", previous, team_id);
        self.session.clear_fetched();
        self.session.history = None;
        self.session.plans.clear();
        self.session.selected_gameweek = None;
        self.session.save_plans(&self.db)?;
        self.leagues = None;
        self.standings = None;
        Ok(())
    }

    /// Fetch whatever of `gw`'s picks and live stats is missing, in
    /// parallel. Neither is required: future gameweeks have no picks and
    /// unstarted ones no live stats.
    pub async fn load_gameweek(&mut self, gw: Gameweek) {
        let Some(team_id) = self.session.team_id else {
            return;
        };
        let need_picks = !self.session.has_snapshot(gw);
        let started = self
            .session
            .bootstrap
            .as_ref()
            .is_some_and(|b| b.has_started(gw));
        let need_live = started && !self.session.has_live(gw);
        if !need_picks && !need_live {
            return;
        }

        let source = Arc::clone(&self.source);
        let (picks, live) = tokio::join!(
            async {
                if need_picks {
                    Some(source.picks(team_id, gw).await)
                } else {
                    None
                }
            },
            async {
                if need_live {
                    Some(source.live(gw).await)
                } else {
                    None
                }
            }
        );

        match picks {
            Some(Ok(snapshot)) => self.session.insert_snapshot(snapshot),
            Some(Err(e)) if e.is_not_found() => debug!("No picks for GW{}", gw),
            Some(Err(e)) => warn!("Failed to fetch GW{} picks: {}", gw, e),
            None => {}
        }
        match live {
            Some(Ok(stats)) => self.session.insert_live(gw, stats),
            Some(Err(e)) => debug!("No live stats for GW{}: {}", gw, e),
            None => {}
        }
    }

    // -----------------------------------------------------------------------
    // Plans
    // -----------------------------------------------------------------------

    /// Plan a swap for `gameweek`, recording the current price delta.
    fn plan_transfer(
        &mut self,
        gameweek: Gameweek,
        player_out: PlayerId,
        player_in: PlayerId,
    ) -> Result<()> {
        // Checked against the squad without the plan being replaced.
        let squad: Option<SquadSnapshot> = self.session.picks_before_transfer(gameweek);
        if let Some(squad) = &squad {
            if !squad.contains(player_out) {
                anyhow::bail!("player {player_out} is not in the GW{gameweek} squad");
            }
            if squad.contains(player_in) {
                anyhow::bail!("player {player_in} is already in the GW{gameweek} squad");
            }
        }
        let price = |id| {
            self.session
                .bootstrap
                .as_ref()
                .and_then(|b| b.player(id))
                .map(|p| p.now_cost)
                .unwrap_or(0)
        };
        let plan = TransferPlan {
            gameweek,
            player_out,
            player_in,
            cost: price(player_in) - price(player_out),
        };
        self.session.plans.upsert_transfer(plan)?;
        info!("Planned GW{} transfer: {} -> {}", gameweek, player_out, player_in);
        self.session.save_plans(&self.db)
    }

    fn toggle_chip(&mut self, gameweek: Gameweek, chip: Chip) -> Result<bool> {
        let planned = self.session.plans.toggle_chip(gameweek, chip)?;
        info!(
            "{} {} for GW{}",
            if planned { "Planned" } else { "Unplanned" },
            chip.label(),
            gameweek
        );
        self.session.save_plans(&self.db)?;
        Ok(planned)
    }

    // -----------------------------------------------------------------------
    // Leagues
    // -----------------------------------------------------------------------

    /// The connected entry's leagues, from the stored summary when it has
    /// them, otherwise from the leagues endpoint.
    async fn load_leagues(&mut self) -> Result<()> {
        let Some(team_id) = self.session.team_id else {
            anyhow::bail!("No team connected");
        };
        let leagues = match self.session.manager.as_ref().and_then(|m| m.leagues.clone()) {
            Some(leagues) => leagues,
            None => self
                .source
                .manager_leagues(team_id)
                .await
                .context("failed to load leagues")?,
        };
        self.leagues = Some(leagues);
        Ok(())
    }

    async fn load_standings(&mut self, league_id: u32, kind: LeagueKind, page: u32) -> Result<()> {
        let table = self
            .source
            .standings(league_id, kind, page.max(1))
            .await
            .with_context(|| format!("failed to load standings for league {league_id}"))?;
        self.standings = Some(table);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Startup
// ---------------------------------------------------------------------------

/// Bring a freshly loaded session up to date: always fetch game data, then
/// reconnect a stored team whose session has expired, or just load the
/// selected gameweek of one that has not.
pub async fn startup(state: &mut AppState, ui_tx: &mpsc::Sender<UiUpdate>) {
    if let Err(e) = state.load_static().await {
        warn!("{:#}", e);
        let _ = ui_tx.send(UiUpdate::Error(format!("{e:#}"))).await;
    }

    if let Some(team_id) = state.session.team_id {
        if state.session.is_expired(Utc::now(), state.max_age()) {
            info!("Stored session for team {} expired, reconnecting", team_id);
            connect(state, team_id, ui_tx).await;
        } else {
            info!("Resuming stored session for team {}", team_id);
            state.set_connection(ConnectionStatus::Connected, ui_tx).await;
            let gw = state.session.selected();
            state.load_gameweek(gw).await;
        }
    }

    send_snapshot(state, ui_tx).await;
}

// ---------------------------------------------------------------------------
// Main event loop
// ---------------------------------------------------------------------------

/// Run the application event loop until a quit command arrives or the TUI
/// side of the command channel closes.
///
/// Pushes UI updates through `ui_tx` for the TUI render loop.
pub async fn run(
    mut cmd_rx: mpsc::Receiver<UserCommand>,
    ui_tx: mpsc::Sender<UiUpdate>,
    mut state: AppState,
) -> Result<()> {
    info!("Application event loop started");

    startup(&mut state, &ui_tx).await;

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UserCommand::Quit) => {
                        info!("Quit command received, shutting down");
                        break;
                    }
                    Some(cmd) => {
                        handle_user_command(&mut state, cmd, &ui_tx).await;
                    }
                    None => {
                        info!("Command channel closed, shutting down");
                        break;
                    }
                }
            }
            _ = ui_tx.closed() => {
                info!("UI channel closed, shutting down");
                break;
            }
        }
    }

    info!("Application event loop exiting");
    Ok(())
}

async fn send_snapshot(state: &AppState, ui_tx: &mpsc::Sender<UiUpdate>) {
    let snapshot = state.build_snapshot();
    let _ = ui_tx
        .send(UiUpdate::StateSnapshot(Box::new(snapshot)))
        .await;
}

async fn report(ui_tx: &mpsc::Sender<UiUpdate>, err: &anyhow::Error) {
    warn!("{:#}", err);
    let _ = ui_tx.send(UiUpdate::Error(format!("{err:#}"))).await;
}

async fn connect(state: &mut AppState, team_id: u32, ui_tx: &mpsc::Sender<UiUpdate>) {
    let previous = state.connection;
    state.set_connection(ConnectionStatus::Connecting, ui_tx).await;
    match state.connect(team_id).await {
        Ok(()) => {
            state.set_connection(ConnectionStatus::Connected, ui_tx).await;
        }
        Err(e) => {
            let fallback = if previous == ConnectionStatus::Connected {
                ConnectionStatus::Connected
            } else {
                ConnectionStatus::Disconnected
            };
            state.set_connection(fallback, ui_tx).await;
            report(ui_tx, &e).await;
        }
    }
}

/// Handle a user command from the TUI. Every command ends with a fresh
/// snapshot.
async fn handle_user_command(
    state: &mut AppState,
    cmd: UserCommand,
    ui_tx: &mpsc::Sender<UiUpdate>,
) {
    match cmd {
        UserCommand::Connect { team_id } => {
            info!("Connecting team {}", team_id);
            connect(state, team_id, ui_tx).await;
        }
        UserCommand::Refresh => match state.session.team_id {
            Some(team_id) => {
                info!("Refreshing data for team {}", team_id);
                state.source.clear_cache();
                state.session.clear_fetched();
                if let Err(e) = state.load_static().await {
                    report(ui_tx, &e).await;
                }
                connect(state, team_id, ui_tx).await;
            }
            None => {
                let _ = ui_tx
                    .send(UiUpdate::Error("No team connected".to_string()))
                    .await;
            }
        },
        UserCommand::Disconnect => {
            info!("Disconnecting team {:?}", state.session.team_id);
            if let Err(e) = state.session.clear(&state.db) {
                report(ui_tx, &e).await;
            }
            state.leagues = None;
            state.standings = None;
            state
                .set_connection(ConnectionStatus::Disconnected, ui_tx)
                .await;
        }
        UserCommand::SelectGameweek(gw) => {
            let gw = gw.clamp(1, MAX_GAMEWEEK);
            debug!("Selecting GW{}", gw);
            state.session.selected_gameweek = Some(gw);
            if let Err(e) = state.session.save_selected_gameweek(&state.db) {
                report(ui_tx, &e).await;
            }
            state.load_gameweek(gw).await;
        }
        UserCommand::PlanTransfer {
            gameweek,
            player_out,
            player_in,
        } => {
            if let Err(e) = state.plan_transfer(gameweek, player_out, player_in) {
                report(ui_tx, &e).await;
            }
        }
        UserCommand::RemoveTransfer { gameweek } => {
            if state.session.plans.remove_transfer(gameweek).is_some() {
                info!("Removed GW{} transfer plan", gameweek);
                if let Err(e) = state.session.save_plans(&state.db) {
                    report(ui_tx, &e).await;
                }
            }
        }
        UserCommand::ToggleChip { gameweek, chip } => {
            if let Err(e) = state.toggle_chip(gameweek, chip) {
                info!("Chip plan rejected: {}", e);
                let _ = ui_tx.send(UiUpdate::Notice(e.to_string())).await;
            }
        }
        UserCommand::RemoveChip { gameweek } => {
            if let Some(chip) = state.session.plans.remove_chip(gameweek) {
                info!("Removed {} from GW{}", chip.label(), gameweek);
                if let Err(e) = state.session.save_plans(&state.db) {
                    report(ui_tx, &e).await;
                }
            }
        }
        UserCommand::LoadLeagues => {
            if let Err(e) = state.load_leagues().await {
                report(ui_tx, &e).await;
            }
        }
        UserCommand::LoadStandings {
            league_id,
            kind,
            page,
        } => {
            if let Err(e) = state.load_standings(league_id, kind, page).await {
                report(ui_tx, &e).await;
            }
        }
        UserCommand::Quit => {
            // Handled in the main loop
        }
    }

    send_snapshot(state, ui_tx).await;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
