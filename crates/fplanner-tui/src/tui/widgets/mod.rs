// TUI widget modules for each dashboard panel.

pub mod analytics;
pub mod budget;
pub mod checks;
pub mod gameweek_banner;
pub mod leagues;
pub mod overlay;
pub mod planner;
pub mod squad;
pub mod status_bar;
pub mod transfers;
