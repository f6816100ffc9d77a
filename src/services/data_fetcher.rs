use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::config::Config;
use crate::error::{ForecastError, Result};

const SOURCE: &str = "api-football";

// ── API-Football v3 structures ───────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub errors: Value,
    pub response: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TeamEntry {
    pub team: ApiTeam,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApiTeam {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixtureEntry {
    pub fixture: FixtureInfo,
    pub teams: FixtureTeams,
    pub goals: FixtureGoals,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixtureInfo {
    pub id: u64,
    pub date: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixtureTeams {
    pub home: SideTeam,
    pub away: SideTeam,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SideTeam {
    pub id: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixtureGoals {
    pub home: Option<u32>,
    pub away: Option<u32>,
}

// ── Provider ─────────────────────────────────────────────────────────────────

#[async_trait]
pub trait FootballProvider: Send + Sync {
    /// Teams whose name matches `name`, in provider order.
    async fn search_teams(&self, name: &str) -> Result<Vec<ApiTeam>>;

    /// Finished ("FT") fixtures of a team in one league season.
    async fn completed_fixtures(&self, team_id: u64, league: u32, season: u32) -> Result<Vec<FixtureEntry>>;

    /// Raw lineups body for a fixture. Decoding is left to the caller so a
    /// malformed lineup can be recovered from instead of aborting the run.
    async fn lineups(&self, fixture_id: u64) -> Result<Value>;
}

pub struct ApiFootballClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl ApiFootballClient {
    pub fn new(config: &Config) -> Result<Self> {
        let api_key = config.require_football_key()?.to_string();
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            api_key,
            base_url: config.football_base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        let response = self.client
            .get(format!("{}{}", self.base_url, path))
            .header("x-apisports-key", &self.api_key)
            .query(query)
            .send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ForecastError::unavailable(SOURCE, format!("{} error {}: {}", path, status, body)));
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn get_response<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<Vec<T>> {
        let raw = self.get_json(path, query).await?;
        decode_envelope(path, raw)
    }
}

/// Decodes an API-Football envelope, turning a populated `errors` field into
/// a data-source error (the API reports quota and auth problems that way).
pub fn decode_envelope<T: DeserializeOwned>(path: &str, raw: Value) -> Result<Vec<T>> {
    let envelope: Envelope<T> = serde_json::from_value(raw)?;
    if has_errors(&envelope.errors) {
        return Err(ForecastError::unavailable(SOURCE, format!("{} reported {}", path, envelope.errors)));
    }
    Ok(envelope.response)
}

fn has_errors(errors: &Value) -> bool {
    match errors {
        Value::Null => false,
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        _ => true,
    }
}

#[async_trait]
impl FootballProvider for ApiFootballClient {
    async fn search_teams(&self, name: &str) -> Result<Vec<ApiTeam>> {
        tracing::info!("Searching API-Football teams for '{}'…", name);
        let entries: Vec<TeamEntry> = self
            .get_response("/teams", &[("search", name.to_string())])
            .await?;
        Ok(entries.into_iter().map(|e| e.team).collect())
    }

    async fn completed_fixtures(&self, team_id: u64, league: u32, season: u32) -> Result<Vec<FixtureEntry>> {
        tracing::info!("Fetching FT fixtures for team {} (league {}, season {})…", team_id, league, season);
        let fixtures: Vec<FixtureEntry> = self
            .get_response("/fixtures", &[
                ("team", team_id.to_string()),
                ("league", league.to_string()),
                ("season", season.to_string()),
                ("status", "FT".to_string()),
            ])
            .await?;
        tracing::info!("Team {}: {} finished fixtures", team_id, fixtures.len());
        Ok(fixtures)
    }

    async fn lineups(&self, fixture_id: u64) -> Result<Value> {
        tracing::debug!("Fetching lineups for fixture {}", fixture_id);
        self.get_json("/fixtures/lineups", &[("fixture", fixture_id.to_string())]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decodes_team_search() {
        let raw = json!({
            "get": "teams",
            "errors": [],
            "results": 2,
            "response": [
                {"team": {"id": 50, "name": "Manchester City", "code": "MAC"}, "venue": {}},
                {"team": {"id": 33, "name": "Manchester United"}}
            ]
        });
        let entries: Vec<TeamEntry> = decode_envelope("/teams", raw).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].team.id, 50);
        assert_eq!(entries[1].team.name, "Manchester United");
    }

    #[test]
    fn test_decodes_fixtures() {
        let raw = json!({
            "errors": {},
            "response": [{
                "fixture": {"id": 1035037, "date": "2023-08-11T19:00:00+00:00", "status": {"short": "FT"}},
                "teams": {"home": {"id": 44, "name": "Burnley"}, "away": {"id": 50, "name": "Manchester City"}},
                "goals": {"home": 0, "away": 3}
            }]
        });
        let fixtures: Vec<FixtureEntry> = decode_envelope("/fixtures", raw).unwrap();
        assert_eq!(fixtures[0].fixture.id, 1035037);
        assert_eq!(fixtures[0].teams.away.id, 50);
        assert_eq!(fixtures[0].goals.away, Some(3));
    }

    #[test]
    fn test_populated_errors_are_unavailable() {
        let raw = json!({
            "errors": {"token": "Error/Missing application key."},
            "response": []
        });
        let result: Result<Vec<TeamEntry>> = decode_envelope("/teams", raw);
        assert!(matches!(result, Err(ForecastError::DataSourceUnavailable { .. })));
    }

    #[test]
    fn test_missing_response_is_malformed() {
        let result: Result<Vec<TeamEntry>> = decode_envelope("/teams", json!({"errors": []}));
        assert!(matches!(result, Err(ForecastError::Json(_))));
    }
}
