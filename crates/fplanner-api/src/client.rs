// FPL REST client: JSON over reqwest, cached per URL, with relay fallback.
//
// Static payloads (bootstrap, fixtures) are cached for `static_ttl`, live
// gameweek stats for `live_ttl`; manager-specific endpoints always hit the
// network. When a direct request fails the same URL is retried through each
// configured relay prefix in order.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde::de::{DeserializeOwned, IgnoredAny};
use tracing::{debug, warn};

use fplanner_core::config::Config;
use fplanner_core::model::{
    Bootstrap, Fixture, Gameweek, LeagueStandings, LiveGameweek, ManagerHistory, ManagerLeagues,
    ManagerSummary, SquadSnapshot,
};

use crate::cache::ResponseCache;
use crate::error::ApiError;
use crate::source::{FplSource, LeagueKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CachePolicy {
    Static,
    Live,
    Never,
}

// ---------------------------------------------------------------------------
// FplClient
// ---------------------------------------------------------------------------

pub struct FplClient {
    http: reqwest::Client,
    base_url: String,
    relay_prefixes: Vec<String>,
    cache: ResponseCache,
    static_ttl: Duration,
    live_ttl: Duration,
}

impl FplClient {
    /// Build a client from the `[api]` and `[cache]` config sections.
    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api.timeout_secs))
            .user_agent(config.api.user_agent.clone())
            .build()?;
        Ok(Self {
            http,
            base_url: config.api.base_url.trim_end_matches('/').to_string(),
            relay_prefixes: config.api.relay_prefixes.clone(),
            cache: ResponseCache::new(),
            static_ttl: Duration::from_secs(config.cache.static_ttl_secs),
            live_ttl: Duration::from_secs(config.cache.live_ttl_secs),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Number of cached responses (fresh or stale).
    #[cfg(test)]
    fn cached_responses(&self) -> usize {
        self.cache.len()
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn ttl(&self, policy: CachePolicy) -> Option<Duration> {
        match policy {
            CachePolicy::Static => Some(self.static_ttl),
            CachePolicy::Live => Some(self.live_ttl),
            CachePolicy::Never => None,
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, policy: CachePolicy) -> Result<T, ApiError> {
        let url = self.endpoint(path);

        if let Some(ttl) = self.ttl(policy) {
            if let Some(body) = self.cache.get(&url, ttl) {
                debug!(%url, "cache hit");
                return decode(&url, &body);
            }
        }

        let body = self.fetch_with_fallback(&url).await?;
        // Decode before caching so a bad body is never served twice.
        let value = decode(&url, &body)?;
        if policy != CachePolicy::Never {
            self.cache.put(&url, body);
        }
        Ok(value)
    }

    async fn fetch_with_fallback(&self, url: &str) -> Result<String, ApiError> {
        let err = match self.fetch_text(url).await {
            Ok(body) => return Ok(body),
            Err(err) => err,
        };
        if self.relay_prefixes.is_empty() {
            return Err(err);
        }

        warn!(%url, error = %err, "direct request failed, trying relays");
        for prefix in &self.relay_prefixes {
            let relayed = relay_url(prefix, url);
            match self.fetch_text(&relayed).await {
                // Relays answer with HTML error pages on upstream failure.
                Ok(body) if serde_json::from_str::<IgnoredAny>(&body).is_ok() => {
                    debug!(relay = %prefix, "relay succeeded");
                    return Ok(body);
                }
                Ok(_) => debug!(relay = %prefix, "relay returned non-JSON body"),
                Err(e) => debug!(relay = %prefix, error = %e, "relay failed"),
            }
        }
        Err(err)
    }

    async fn fetch_text(&self, url: &str) -> Result<String, ApiError> {
        let response = self
            .http
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl FplSource for FplClient {
    async fn bootstrap(&self) -> Result<Bootstrap, ApiError> {
        self.get("bootstrap-static/", CachePolicy::Static).await
    }

    async fn fixtures(&self) -> Result<Vec<Fixture>, ApiError> {
        self.get("fixtures/", CachePolicy::Static).await
    }

    async fn manager(&self, team_id: u32) -> Result<ManagerSummary, ApiError> {
        self.get(&format!("entry/{team_id}/"), CachePolicy::Never).await
    }

    async fn picks(&self, team_id: u32, gw: Gameweek) -> Result<SquadSnapshot, ApiError> {
        self.get(&format!("entry/{team_id}/event/{gw}/picks/"), CachePolicy::Never)
            .await
    }

    async fn history(&self, team_id: u32) -> Result<ManagerHistory, ApiError> {
        self.get(&format!("entry/{team_id}/history/"), CachePolicy::Never)
            .await
    }

    async fn live(&self, gw: Gameweek) -> Result<LiveGameweek, ApiError> {
        self.get(&format!("event/{gw}/live/"), CachePolicy::Live).await
    }

    async fn manager_leagues(&self, team_id: u32) -> Result<ManagerLeagues, ApiError> {
        self.get(&format!("entry/{team_id}/leagues/"), CachePolicy::Never)
            .await
    }

    async fn standings(
        &self,
        league_id: u32,
        kind: LeagueKind,
        page: u32,
    ) -> Result<LeagueStandings, ApiError> {
        let path = format!(
            "{}/{league_id}/standings/?page_standings={page}",
            kind.path_segment()
        );
        self.get(&path, CachePolicy::Never).await
    }

    fn clear_cache(&self) {
        self.cache.clear();
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn decode<T: DeserializeOwned>(url: &str, body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|source| ApiError::Decode {
        url: url.to_string(),
        source,
    })
}

/// Route `target` through a relay. Prefixes that end in a query marker
/// (`?` or `=`) take the target as an encoded parameter; others are
/// path-style and take it verbatim.
pub fn relay_url(prefix: &str, target: &str) -> String {
    if prefix.ends_with('?') || prefix.ends_with('=') {
        format!("{prefix}{}", encode_component(target))
    } else {
        format!("{prefix}{target}")
    }
}

/// Percent-encode everything outside the URI-component safe set.
fn encode_component(input: &str) -> String {
    let mut out = String::with_capacity(input.len() * 3);
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => out.push(byte as char),
            other => out.push_str(&format!("%{other:02X}")),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const BOOTSTRAP: &str = include_str!("../tests/fixtures/bootstrap.json");
    const PICKS: &str = include_str!("../tests/fixtures/picks_gw10.json");
    const LIVE: &str = include_str!("../tests/fixtures/live_gw10.json");
    const STANDINGS: &str = include_str!("../tests/fixtures/standings_classic.json");

    /// Canned response: status code and body for requests whose path starts
    /// with `prefix`.
    struct Route {
        prefix: &'static str,
        status: u16,
        body: &'static str,
    }

    /// Spawn a local HTTP server answering from `routes` (first match wins,
    /// 404 otherwise). Returns its base address and the request paths it saw.
    async fn mock_server(routes: Vec<Route>) -> (String, Arc<std::sync::Mutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let seen_srv = Arc::clone(&seen);
        let routes = Arc::new(routes);

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let routes = Arc::clone(&routes);
                let seen = Arc::clone(&seen_srv);
                tokio::spawn(async move {
                    let mut buf = vec![0u8; 8192];
                    let n = socket.read(&mut buf).await.unwrap_or(0);
                    let request = String::from_utf8_lossy(&buf[..n]).to_string();
                    let path = request
                        .lines()
                        .next()
                        .and_then(|line| line.split_whitespace().nth(1))
                        .unwrap_or("/")
                        .to_string();
                    seen.lock().unwrap().push(path.clone());

                    let (status, body) = routes
                        .iter()
                        .find(|r| path.starts_with(r.prefix))
                        .map(|r| (r.status, r.body))
                        .unwrap_or((404, "not found"));
                    let response = format!(
                        "HTTP/1.1 {status} X\r\nContent-Type: application/json\r\n\
                         Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                        body.len()
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.flush().await;
                });
            }
        });

        (format!("http://{addr}"), seen)
    }

    fn client_for(base: &str, relays: Vec<String>) -> FplClient {
        let mut config = Config::default();
        config.api.base_url = format!("{base}/api/");
        config.api.relay_prefixes = relays;
        config.api.timeout_secs = 5;
        FplClient::from_config(&config).unwrap()
    }

    #[test]
    fn relay_url_encodes_query_style_prefixes() {
        let target = "https://fantasy.premierleague.com/api/entry/1/?a=b";
        assert_eq!(
            relay_url("https://corsproxy.io/?", target),
            "https://corsproxy.io/?https%3A%2F%2Ffantasy.premierleague.com%2Fapi%2Fentry%2F1%2F%3Fa%3Db"
        );
        assert_eq!(
            relay_url("https://api.allorigins.win/raw?url=", "a b"),
            "https://api.allorigins.win/raw?url=a%20b"
        );
        assert_eq!(
            relay_url("https://cors.isomorphic-git.org/", target),
            format!("https://cors.isomorphic-git.org/{target}")
        );
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        let client = client_for("http://localhost:1", vec![]);
        assert_eq!(client.base_url(), "http://localhost:1/api");
        assert_eq!(
            client.endpoint("bootstrap-static/"),
            "http://localhost:1/api/bootstrap-static/"
        );
    }

    #[tokio::test]
    async fn bootstrap_is_cached() {
        let (base, seen) = mock_server(vec![Route {
            prefix: "/api/bootstrap-static/",
            status: 200,
            body: BOOTSTRAP,
        }])
        .await;
        let client = client_for(&base, vec![]);

        let first = client.bootstrap().await.unwrap();
        let second = client.bootstrap().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.current_gameweek(), 10);
        assert_eq!(seen.lock().unwrap().len(), 1);
        assert_eq!(client.cached_responses(), 1);

        client.clear_cache();
        client.bootstrap().await.unwrap();
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn manager_endpoints_are_not_cached() {
        let (base, seen) = mock_server(vec![Route {
            prefix: "/api/entry/4242/event/10/picks/",
            status: 200,
            body: PICKS,
        }])
        .await;
        let client = client_for(&base, vec![]);

        let picks = client.picks(4242, 10).await.unwrap();
        client.picks(4242, 10).await.unwrap();
        assert_eq!(picks.picks.len(), 15);
        assert_eq!(seen.lock().unwrap().len(), 2);
        assert_eq!(client.cached_responses(), 0);
    }

    #[tokio::test]
    async fn live_and_standings_paths() {
        let (base, seen) = mock_server(vec![
            Route {
                prefix: "/api/event/10/live/",
                status: 200,
                body: LIVE,
            },
            Route {
                prefix: "/api/leagues-classic/90210/standings/",
                status: 200,
                body: STANDINGS,
            },
        ])
        .await;
        let client = client_for(&base, vec![]);

        let live = client.live(10).await.unwrap();
        assert_eq!(live.stats_for(8).map(|s| s.total_points), Some(9));

        let table = client
            .standings(90210, LeagueKind::Classic, 2)
            .await
            .unwrap();
        assert_eq!(table.league.name, "Office League");
        assert!(seen
            .lock()
            .unwrap()
            .contains(&"/api/leagues-classic/90210/standings/?page_standings=2".to_string()));
    }

    #[tokio::test]
    async fn http_error_status_is_reported() {
        let (base, _) = mock_server(vec![]).await;
        let client = client_for(&base, vec![]);
        let err = client.manager(1).await.unwrap_err();
        assert!(err.is_not_found(), "unexpected error: {err}");
        match err {
            ApiError::Http { status, url } => {
                assert_eq!(status, 404);
                assert!(url.ends_with("/api/entry/1/"));
            }
            other => panic!("expected Http error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_body_is_decode_error_and_not_cached() {
        let (base, seen) = mock_server(vec![Route {
            prefix: "/api/fixtures/",
            status: 200,
            body: "{\"not\": \"a list\"}",
        }])
        .await;
        let client = client_for(&base, vec![]);
        assert!(matches!(
            client.fixtures().await,
            Err(ApiError::Decode { .. })
        ));
        assert!(client.fixtures().await.is_err());
        assert_eq!(seen.lock().unwrap().len(), 2);
        assert_eq!(client.cached_responses(), 0);
    }

    #[tokio::test]
    async fn failed_direct_request_falls_back_to_relays() {
        let (base, seen) = mock_server(vec![
            Route {
                prefix: "/api/",
                status: 503,
                body: "down",
            },
            Route {
                prefix: "/html-relay",
                status: 200,
                body: "<html>blocked</html>",
            },
            Route {
                prefix: "/relay",
                status: 200,
                body: BOOTSTRAP,
            },
        ])
        .await;
        let relays = vec![
            format!("{base}/html-relay?u="),
            format!("{base}/relay?url="),
        ];
        let client = client_for(&base, relays);

        let bootstrap = client.bootstrap().await.unwrap();
        assert_eq!(bootstrap.teams.len(), 6);

        let paths = seen.lock().unwrap().clone();
        assert_eq!(paths.len(), 3);
        assert_eq!(paths[0], "/api/bootstrap-static/");
        assert!(paths[2].starts_with("/relay?url=http%3A%2F%2F127.0.0.1"));

        // Served from cache afterwards.
        client.bootstrap().await.unwrap();
        assert_eq!(seen.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn all_relays_failing_returns_direct_error() {
        let (base, seen) = mock_server(vec![Route {
            prefix: "/api/",
            status: 500,
            body: "boom",
        }])
        .await;
        let client = client_for(&base, vec![format!("{base}/nowhere/")]);
        match client.bootstrap().await {
            Err(ApiError::Http { status, .. }) => assert_eq!(status, 500),
            other => panic!("expected direct Http error, got {other:?}"),
        }
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn cache_policy_ttls() {
        let client = client_for("http://localhost:1", vec![]);
        assert_eq!(client.ttl(CachePolicy::Static), Some(Duration::from_secs(300)));
        assert_eq!(client.ttl(CachePolicy::Live), Some(Duration::from_secs(30)));
        assert_eq!(client.ttl(CachePolicy::Never), None);
    }
}
