// Core library: FPL data model, plan book, projection engine, analytics,
// configuration and the SQLite session store.

pub mod analytics;
pub mod config;
pub mod db;
pub mod model;
pub mod plan;
pub mod projection;
