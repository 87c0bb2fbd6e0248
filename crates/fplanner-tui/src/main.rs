// fplanner entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, not terminal)
// 2. Load config
// 3. Open database, restore the stored session
// 4. Build the FPL API client
// 5. Create mpsc channels
// 6. Spawn app logic task
// 7. Run the TUI until the user quits
// 8. Cleanup on exit

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{error, info};

use fplanner_api::{FplClient, FplSource};
use fplanner_app::app;
use fplanner_app::session::SessionContext;
use fplanner_core::config;
use fplanner_core::db::Database;
use fplanner_tui::tui;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing (log to file, not terminal)
    init_tracing()?;
    info!("fplanner starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: api={}, planner horizon {} gameweeks",
        config.api.base_url, config.planner.horizon
    );

    // 3. Open database and restore the stored session
    let db_path = config
        .resolved_db_path()
        .context("failed to resolve database path")?;
    let db = Database::open(&db_path.to_string_lossy()).context("failed to open database")?;
    info!("Database opened at {}", db_path.display());

    let session = SessionContext::load(&db).context("failed to restore session")?;
    match session.team_id {
        Some(team_id) => info!("Restored session for team {}", team_id),
        None => info!("No stored session"),
    }

    // 4. Build the FPL API client
    let client = FplClient::from_config(&config).context("failed to build HTTP client")?;
    let source: Arc<dyn FplSource> = Arc::new(client);

    let app_state = app::AppState::new(config, db, source, session);

    // 5. Create mpsc channels
    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let (ui_tx, ui_rx) = mpsc::channel(256);

    // 6. Spawn app logic task
    let app_handle = tokio::spawn(async move {
        if let Err(e) = app::run(cmd_rx, ui_tx, app_state).await {
            error!("Application loop error: {}", e);
        }
    });

    // 7. Run the TUI event loop (blocking until user quits)
    info!("Application ready");
    if let Err(e) = tui::run(ui_rx, cmd_tx).await {
        error!("TUI error: {}", e);
    }

    // 8. Cleanup: wait for app task to finish (with timeout)
    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), async {
        let _ = app_handle.await;
    })
    .await;

    info!("fplanner shut down cleanly");
    Ok(())
}

/// Initialize tracing to log to a file (not the terminal, which is used by the TUI).
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("fplanner.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("fplanner=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
