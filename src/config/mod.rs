use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{ForecastError, Result};

pub const DEFAULT_ODDS_BASE_URL: &str = "https://api.the-odds-api.com";
pub const DEFAULT_FOOTBALL_BASE_URL: &str = "https://v3.football.api-sports.io";
pub const DEFAULT_SPORT: &str = "soccer";
pub const DEFAULT_REGIONS: &str = "eu";
pub const DEFAULT_BOOKMAKERS: &str = "bet365,unibet,bwin";
pub const DEFAULT_LEAGUE: u32 = 39; // Premier League
pub const DEFAULT_SEASON: u32 = 2023;
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Runtime settings, read from the environment (and `.env`) once at start-up.
#[derive(Debug, Clone)]
pub struct Config {
    pub odds_api_key: Option<String>,
    pub football_api_key: Option<String>,
    pub odds_base_url: String,
    pub football_base_url: String,
    pub sport: String,
    pub regions: String,
    pub bookmakers: String,
    pub league: u32,
    pub season: u32,
    pub timeout: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            odds_api_key: get("ODDS_API_KEY"),
            football_api_key: get("API_FOOTBALL_KEY"),
            odds_base_url: get("ODDS_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_ODDS_BASE_URL.to_string()),
            football_base_url: get("API_FOOTBALL_BASE_URL")
                .unwrap_or_else(|| DEFAULT_FOOTBALL_BASE_URL.to_string()),
            sport: get("ODDS_SPORT").unwrap_or_else(|| DEFAULT_SPORT.to_string()),
            regions: get("ODDS_REGIONS").unwrap_or_else(|| DEFAULT_REGIONS.to_string()),
            bookmakers: get("ODDS_BOOKMAKERS").unwrap_or_else(|| DEFAULT_BOOKMAKERS.to_string()),
            league: parse_or(get("FORECAST_LEAGUE"), DEFAULT_LEAGUE, "FORECAST_LEAGUE"),
            season: parse_or(get("FORECAST_SEASON"), DEFAULT_SEASON, "FORECAST_SEASON"),
            timeout: Duration::from_secs(parse_or(
                get("HTTP_TIMEOUT_SECS"),
                DEFAULT_TIMEOUT_SECS,
                "HTTP_TIMEOUT_SECS",
            )),
        }
    }

    pub fn require_odds_key(&self) -> Result<&str> {
        self.odds_api_key
            .as_deref()
            .ok_or(ForecastError::MissingConfig("ODDS_API_KEY"))
    }

    pub fn require_football_key(&self) -> Result<&str> {
        self.football_api_key
            .as_deref()
            .ok_or(ForecastError::MissingConfig("API_FOOTBALL_KEY"))
    }
}

fn parse_or<T: FromStr + Copy + std::fmt::Display>(raw: Option<String>, default: T, key: &str) -> T {
    match raw {
        None => default,
        Some(value) => value.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring invalid {}='{}', using {}", key, value, default);
            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = config_from(&[]);
        assert_eq!(config.league, 39);
        assert_eq!(config.season, 2023);
        assert_eq!(config.sport, "soccer");
        assert_eq!(config.bookmakers, "bet365,unibet,bwin");
        assert_eq!(config.timeout, Duration::from_secs(20));
        assert!(config.odds_api_key.is_none());
    }

    #[test]
    fn test_overrides_and_invalid_numbers() {
        let config = config_from(&[
            ("ODDS_API_KEY", "abc"),
            ("FORECAST_LEAGUE", "140"),
            ("FORECAST_SEASON", "not-a-year"),
        ]);
        assert_eq!(config.require_odds_key().unwrap(), "abc");
        assert_eq!(config.league, 140);
        assert_eq!(config.season, 2023);
    }

    #[test]
    fn test_blank_key_is_missing() {
        let config = config_from(&[("API_FOOTBALL_KEY", "  ")]);
        assert!(matches!(
            config.require_football_key(),
            Err(ForecastError::MissingConfig("API_FOOTBALL_KEY"))
        ));
    }
}
