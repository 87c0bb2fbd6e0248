// Configuration loading and parsing (config/fplanner.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable that overrides `[api] base_url`.
pub const PROXY_ENV: &str = "FPL_PROXY_URL";

/// Name of the single configuration file under `config/` and `defaults/`.
pub const CONFIG_FILE: &str = "fplanner.toml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub cache: CacheConfig,
    pub session: SessionConfig,
    /// SQLite file path. Empty means the platform data directory.
    pub db_path: String,
    pub planner: PlannerConfig,
}

/// Raw deserialization target for fplanner.toml.
#[derive(Debug, Clone, Deserialize)]
struct ConfigFile {
    api: ApiConfig,
    cache: CacheConfig,
    session: SessionConfig,
    database: DatabaseSection,
    planner: PlannerConfig,
}

#[derive(Debug, Clone, Deserialize)]
struct DatabaseSection {
    path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default)]
    pub relay_prefixes: Vec<String>,
    pub timeout_secs: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    pub static_ttl_secs: u64,
    pub live_ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub max_age_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlannerConfig {
    pub horizon: u32,
    pub max_compare: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: "https://fantasy.premierleague.com/api".into(),
                relay_prefixes: Vec::new(),
                timeout_secs: 10,
                user_agent: "fplanner/0.1".into(),
            },
            cache: CacheConfig {
                static_ttl_secs: 300,
                live_ttl_secs: 30,
            },
            session: SessionConfig { max_age_minutes: 30 },
            db_path: String::new(),
            planner: PlannerConfig {
                horizon: 8,
                max_compare: 4,
            },
        }
    }
}

impl Config {
    /// Resolve the SQLite path: the configured one, or `fplanner.db` in the
    /// platform data directory.
    pub fn resolved_db_path(&self) -> Result<PathBuf, ConfigError> {
        if !self.db_path.trim().is_empty() {
            return Ok(PathBuf::from(&self.db_path));
        }
        let dirs = directories::ProjectDirs::from("", "", "fplanner").ok_or_else(|| {
            ConfigError::ValidationError {
                field: "database.path".into(),
                message: "empty and no home directory to fall back on".into(),
            }
        })?;
        let dir = dirs.data_dir();
        std::fs::create_dir_all(dir).map_err(|e| ConfigError::ValidationError {
            field: "database.path".into(),
            message: format!("cannot create {}: {e}", dir.display()),
        })?;
        Ok(dir.join("fplanner.db"))
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/fplanner.toml` relative to `base_dir`.
///
/// Does not copy defaults and ignores the environment; see `load_config()`.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = read_file(&path)?;
    let file: ConfigFile = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;

    let config = Config {
        api: file.api,
        cache: file.cache,
        session: file.session,
        db_path: file.database.path,
        planner: file.planner,
    };

    validate(&config)?;

    Ok(config)
}

/// Ensure all config files exist by copying missing ones from `defaults/`.
/// Returns the list of files that were copied. Skips `.example` files.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the project root or ensure defaults/ is present",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    let mut copied = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }
        let target = config_dir.join(file_name);

        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
                    message: format!("failed to read {}: {e}", path.display()),
                })?;
                std::io::Write::write_all(&mut dest, &content).map_err(|e| {
                    ConfigError::DefaultsCopyError {
                        message: format!("failed to write {}: {e}", target.display()),
                    }
                })?;
                tracing::info!("copied default config to {}", target.display());
                copied.push(target);
            }
            // Never overwrite the user's edits.
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        }
    }

    Ok(copied)
}

/// Load config relative to the current working directory, copying defaults
/// first and applying the `FPL_PROXY_URL` override.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    let mut config = load_config_from(&cwd)?;
    apply_proxy_override(&mut config, std::env::var(PROXY_ENV).ok());
    validate(&config)?;
    Ok(config)
}

/// Replace the API base URL with `proxy` when it is set and non-empty.
/// Relay prefixes only wrap the official API, so an override drops them.
pub fn apply_proxy_override(config: &mut Config, proxy: Option<String>) {
    if let Some(url) = proxy.map(|u| u.trim().trim_end_matches('/').to_string()) {
        if !url.is_empty() {
            tracing::info!("API base URL overridden by {PROXY_ENV}: {url}");
            config.api.base_url = url;
            config.api.relay_prefixes.clear();
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    let base = &config.api.base_url;
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        return Err(ConfigError::ValidationError {
            field: "api.base_url".into(),
            message: format!("must be an http(s) URL, got {base:?}"),
        });
    }

    for prefix in &config.api.relay_prefixes {
        if !(prefix.starts_with("http://") || prefix.starts_with("https://")) {
            return Err(ConfigError::ValidationError {
                field: "api.relay_prefixes".into(),
                message: format!("must be http(s) URLs, got {prefix:?}"),
            });
        }
    }

    let positive: &[(&str, u64)] = &[
        ("api.timeout_secs", config.api.timeout_secs),
        ("cache.static_ttl_secs", config.cache.static_ttl_secs),
        ("cache.live_ttl_secs", config.cache.live_ttl_secs),
    ];
    for (name, val) in positive {
        if *val == 0 {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: "must be > 0".into(),
            });
        }
    }

    if config.session.max_age_minutes <= 0 {
        return Err(ConfigError::ValidationError {
            field: "session.max_age_minutes".into(),
            message: format!("must be > 0, got {}", config.session.max_age_minutes),
        });
    }

    if !(1..=crate::model::MAX_GAMEWEEK).contains(&config.planner.horizon) {
        return Err(ConfigError::ValidationError {
            field: "planner.horizon".into(),
            message: format!("must be between 1 and 38, got {}", config.planner.horizon),
        });
    }

    if config.planner.max_compare == 0 {
        return Err(ConfigError::ValidationError {
            field: "planner.max_compare".into(),
            message: "must be > 0".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Workspace root holding `defaults/`, found from this crate's manifest.
    fn project_root() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .ancestors()
            .find(|p| p.join("defaults").join(CONFIG_FILE).exists())
            .map(Path::to_path_buf)
            .expect("cannot locate defaults/ above the crate")
    }

    /// Fresh temp dir with `config/fplanner.toml` holding `body`.
    fn temp_config(name: &str, body: &str) -> PathBuf {
        let tmp = std::env::temp_dir().join(format!("fplanner_config_{name}"));
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();
        fs::write(tmp.join("config").join(CONFIG_FILE), body).unwrap();
        tmp
    }

    fn defaults_text() -> String {
        fs::read_to_string(project_root().join("defaults").join(CONFIG_FILE)).unwrap()
    }

    #[test]
    fn defaults_file_loads() {
        let tmp = temp_config("defaults", &defaults_text());
        let config = load_config_from(&tmp).expect("defaults should load");

        assert_eq!(config.api.base_url, "https://fantasy.premierleague.com/api");
        assert_eq!(config.api.relay_prefixes.len(), 3);
        assert_eq!(config.api.timeout_secs, 10);
        assert_eq!(config.cache.static_ttl_secs, 300);
        assert_eq!(config.cache.live_ttl_secs, 30);
        assert_eq!(config.session.max_age_minutes, 30);
        assert_eq!(config.db_path, "");
        assert_eq!(config.planner.horizon, 8);
        assert_eq!(config.planner.max_compare, 4);

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_copies_once() {
        let tmp = std::env::temp_dir().join("fplanner_config_copy");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("defaults")).unwrap();
        fs::write(tmp.join("defaults").join(CONFIG_FILE), defaults_text()).unwrap();
        fs::write(tmp.join("defaults").join("local.toml.example"), "x").unwrap();

        let copied = ensure_config_files(&tmp).unwrap();
        assert_eq!(copied, vec![tmp.join("config").join(CONFIG_FILE)]);
        assert!(!tmp.join("config").join("local.toml.example").exists());

        // User edits survive a second pass.
        fs::write(tmp.join("config").join(CONFIG_FILE), "edited").unwrap();
        assert!(ensure_config_files(&tmp).unwrap().is_empty());
        assert_eq!(
            fs::read_to_string(tmp.join("config").join(CONFIG_FILE)).unwrap(),
            "edited"
        );

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn missing_defaults_and_config_is_an_error() {
        let tmp = std::env::temp_dir().join("fplanner_config_empty");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();
        assert!(matches!(
            ensure_config_files(&tmp),
            Err(ConfigError::DefaultsCopyError { .. })
        ));
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn missing_file_is_file_not_found() {
        let tmp = std::env::temp_dir().join("fplanner_config_missing");
        let _ = fs::remove_dir_all(&tmp);
        assert!(matches!(
            load_config_from(&tmp),
            Err(ConfigError::FileNotFound { .. })
        ));
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let tmp = temp_config("malformed", "[api\nbase_url = ");
        assert!(matches!(
            load_config_from(&tmp),
            Err(ConfigError::ParseError { .. })
        ));
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn zero_ttl_fails_validation() {
        let body = defaults_text().replace("live_ttl_secs = 30", "live_ttl_secs = 0");
        let tmp = temp_config("zero_ttl", &body);
        match load_config_from(&tmp) {
            Err(ConfigError::ValidationError { field, .. }) => {
                assert_eq!(field, "cache.live_ttl_secs")
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn bad_base_url_fails_validation() {
        let body = defaults_text().replace(
            "base_url = \"https://fantasy.premierleague.com/api\"",
            "base_url = \"fantasy.premierleague.com\"",
        );
        let tmp = temp_config("bad_url", &body);
        match load_config_from(&tmp) {
            Err(ConfigError::ValidationError { field, .. }) => assert_eq!(field, "api.base_url"),
            other => panic!("expected validation error, got {other:?}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn horizon_out_of_range_fails_validation() {
        let body = defaults_text().replace("horizon = 8", "horizon = 40");
        let tmp = temp_config("horizon", &body);
        assert!(matches!(
            load_config_from(&tmp),
            Err(ConfigError::ValidationError { .. })
        ));
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn proxy_override_replaces_base_url() {
        let mut config = Config::default();
        config.api.relay_prefixes = vec!["https://corsproxy.io/?".into()];
        apply_proxy_override(&mut config, Some("https://relay.example.com/fpl/".into()));
        assert_eq!(config.api.base_url, "https://relay.example.com/fpl");
        assert!(config.api.relay_prefixes.is_empty());

        apply_proxy_override(&mut config, Some("   ".into()));
        assert_eq!(config.api.base_url, "https://relay.example.com/fpl");

        apply_proxy_override(&mut config, None);
        assert_eq!(config.api.base_url, "https://relay.example.com/fpl");
    }

    #[test]
    fn explicit_db_path_is_used_verbatim() {
        let config = Config {
            db_path: "/tmp/fplanner-test.db".into(),
            ..Config::default()
        };
        assert_eq!(
            config.resolved_db_path().unwrap(),
            PathBuf::from("/tmp/fplanner-test.db")
        );
    }
}
