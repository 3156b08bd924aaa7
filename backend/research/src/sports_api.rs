//! Cricket statistics API client.
//!
//! The API follows the RapidAPI convention: every request carries an
//! `x-rapidapi-key` header and an `x-rapidapi-host` header naming the
//! configured host. Responses are passed on as raw JSON because their shape
//! varies between data vendors.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::{Client, Url};
use serde_json::Value;
use tracing::debug;

use sportsgpt_config::SportsApiConfig;
use sportsgpt_logging::redact_sensitive_data;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct SportsApiClient {
    client: Client,
    api_key: String,
    base_url: Url,
    host: String,
}

impl SportsApiClient {
    /// `host` is a base URL or a bare hostname (`https://` is assumed).
    pub fn new(api_key: impl Into<String>, host: &str) -> Result<Self> {
        let host = host.trim().trim_end_matches('/');
        let base = if host.contains("://") {
            host.to_string()
        } else {
            format!("https://{host}")
        };
        let base_url =
            Url::parse(&base).with_context(|| format!("Invalid sports API host '{host}'"))?;
        let hostname = base_url
            .host_str()
            .context("Sports API host has no hostname")?
            .to_string();
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build sports API HTTP client")?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url,
            host: hostname,
        })
    }

    /// `Ok(None)` unless both `SPORTS_API_KEY` and `SPORTS_API_HOST` are set.
    pub fn from_config(config: &SportsApiConfig) -> Result<Option<Self>> {
        match (config.api_key.as_deref(), config.host.as_deref()) {
            (Some(key), Some(host)) => Self::new(key, host).map(Some),
            _ => Ok(None),
        }
    }

    pub async fn live_matches(&self) -> Result<Value> {
        self.get(&["cricket", "matches", "live"], &[]).await
    }

    /// Players whose name matches `name`; results carry the ids the other lookups take.
    pub async fn search_players(&self, name: &str) -> Result<Value> {
        self.get(&["cricket", "players", "search"], &[("query", name)])
            .await
    }

    pub async fn player_stats(&self, player_id: &str) -> Result<Value> {
        self.get(&["cricket", "players", player_id, "stats"], &[])
            .await
    }

    pub async fn bowling_stats(&self, player_id: &str, tournament: Option<&str>) -> Result<Value> {
        let query: Vec<(&str, &str)> = tournament.map(|t| ("tournament", t)).into_iter().collect();
        self.get(&["cricket", "players", player_id, "bowling"], &query)
            .await
    }

    pub async fn match_details(&self, match_id: &str) -> Result<Value> {
        self.get(&["cricket", "matches", match_id], &[]).await
    }

    pub async fn match_scorecard(&self, match_id: &str) -> Result<Value> {
        self.get(&["cricket", "matches", match_id, "scorecard"], &[])
            .await
    }

    /// IPL season stats for a franchise.
    pub async fn team_stats(&self, team_id: &str) -> Result<Value> {
        self.get(&["cricket", "teams", team_id, "stats"], &[("league", "ipl")])
            .await
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("Sports API base URL cannot take a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Value> {
        let url = self.endpoint(segments)?;
        debug!(path = %url.path(), "Sports API request");

        let response = self
            .client
            .get(url.clone())
            .header("x-rapidapi-key", &self.api_key)
            .header("x-rapidapi-host", &self.host)
            .query(query)
            .send()
            .await
            .with_context(|| format!("Sports API request to {} failed", url.path()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!(
                "Sports API returned {} for {}: {}",
                status,
                url.path(),
                redact_sensitive_data(&body).replace(&self.api_key, "[REDACTED_KEY]")
            );
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse sports API response from {}", url.path()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> SportsApiClient {
        SportsApiClient::new("rapid-key", &server.uri()).unwrap()
    }

    #[tokio::test]
    async fn test_search_sends_rapidapi_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cricket/players/search"))
            .and(query_param("query", "Virat Kohli"))
            .and(header("x-rapidapi-key", "rapid-key"))
            .and(header("x-rapidapi-host", "127.0.0.1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "players": [{"id": "253802", "name": "Virat Kohli"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let found = client(&server).search_players("Virat Kohli").await.unwrap();
        assert_eq!(found["players"][0]["id"], "253802");
    }

    #[tokio::test]
    async fn test_bowling_stats_filters_by_tournament() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cricket/players/625383/bowling"))
            .and(query_param("tournament", "ipl"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"wickets": 165})))
            .mount(&server)
            .await;

        let stats = client(&server)
            .bowling_stats("625383", Some("ipl"))
            .await
            .unwrap();
        assert_eq!(stats["wickets"], 165);
    }

    #[tokio::test]
    async fn test_match_lookups() {
        let server = MockServer::start().await;
        Mock::given(path("/cricket/matches/live"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 91}])))
            .mount(&server)
            .await;
        Mock::given(path("/cricket/matches/91/scorecard"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"innings": []})))
            .mount(&server)
            .await;
        Mock::given(path("/cricket/teams/csk/stats"))
            .and(query_param("league", "ipl"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"titles": 5})))
            .mount(&server)
            .await;

        let api = client(&server);
        assert_eq!(api.live_matches().await.unwrap()[0]["id"], 91);
        assert!(api.match_scorecard("91").await.unwrap()["innings"].is_array());
        assert_eq!(api.team_stats("csk").await.unwrap()["titles"], 5);
    }

    #[tokio::test]
    async fn test_error_status_hides_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_string("key rapid-key is not subscribed"))
            .mount(&server)
            .await;

        let err = client(&server).match_details("1").await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("403"));
        assert!(!message.contains("rapid-key"));
    }

    #[test]
    fn test_bare_hostname() {
        let api = SportsApiClient::new("k", "cricbuzz-cricket.p.rapidapi.com/").unwrap();
        assert_eq!(api.host, "cricbuzz-cricket.p.rapidapi.com");
        assert_eq!(
            api.endpoint(&["cricket", "players", "a b"]).unwrap().as_str(),
            "https://cricbuzz-cricket.p.rapidapi.com/cricket/players/a%20b"
        );
    }

    #[test]
    fn test_from_config_needs_key_and_host() {
        let mut config = SportsApiConfig {
            api_key: Some("k".into()),
            host: None,
        };
        assert!(SportsApiClient::from_config(&config).unwrap().is_none());
        config.host = Some("stats.example.com".into());
        assert!(SportsApiClient::from_config(&config).unwrap().is_some());
        config.host = Some("http://".into());
        assert!(SportsApiClient::from_config(&config).is_err());
    }
}
