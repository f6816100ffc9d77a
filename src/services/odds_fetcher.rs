//! Fetches head-to-head odds from The Odds API and picks the match whose
//! collected prices give the highest margin deficit (`1 - Σ 1/price`).
//!
//! Prices are collected from the first market of every returned bookmaker.
//! Only events that end up with exactly three prices are eligible, which in
//! practice means events quoted by a single one of the requested books.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::config::Config;
use crate::error::{ForecastError, Result};
use crate::models::MatchPick;
use crate::utils::margin_deficit;

const SOURCE: &str = "the-odds-api";

// ── Odds API response types ───────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct OddsEvent {
    pub home_team: String,
    pub away_team: String,
    pub bookmakers: Vec<Bookmaker>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Bookmaker {
    #[allow(dead_code)]
    pub key: String,
    pub markets: Vec<Market>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Market {
    #[allow(dead_code)]
    pub key: String,
    pub outcomes: Vec<Outcome>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Outcome {
    #[allow(dead_code)]
    pub name: String,
    pub price: f64,
}

// ── Provider ──────────────────────────────────────────────────────────────────

#[async_trait]
pub trait OddsProvider: Send + Sync {
    async fn fetch_events(&self) -> Result<Vec<OddsEvent>>;
}

pub struct OddsApiClient {
    client: Client,
    api_key: String,
    base_url: String,
    sport: String,
    regions: String,
    bookmakers: String,
}

impl OddsApiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let api_key = config.require_odds_key()?.to_string();
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            api_key,
            base_url: config.odds_base_url.trim_end_matches('/').to_string(),
            sport: config.sport.clone(),
            regions: config.regions.clone(),
            bookmakers: config.bookmakers.clone(),
        })
    }
}

#[async_trait]
impl OddsProvider for OddsApiClient {
    async fn fetch_events(&self) -> Result<Vec<OddsEvent>> {
        let url = format!("{}/v4/sports/{}/odds/", self.base_url, self.sport);

        tracing::info!("Fetching {} odds from The Odds API ({})…", self.sport, self.bookmakers);

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("apiKey", self.api_key.as_str()),
                ("regions", self.regions.as_str()),
                ("markets", "h2h"),
                ("oddsFormat", "decimal"),
                ("bookmakers", self.bookmakers.as_str()),
            ])
            .send()
            .await?;

        let status = resp.status();
        if status == 401 {
            return Err(ForecastError::unavailable(SOURCE, "invalid API key (401)"));
        }
        if status == 422 {
            return Err(ForecastError::unavailable(
                SOURCE,
                format!("sport {} not in subscription (422)", self.sport),
            ));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ForecastError::unavailable(SOURCE, format!("HTTP {}: {}", status, body)));
        }

        let body = resp.text().await?;
        let events: Vec<OddsEvent> = serde_json::from_str(&body)?;
        tracing::info!("Odds: {} events received", events.len());
        Ok(events)
    }
}

// ── Selection ─────────────────────────────────────────────────────────────────

/// Prices from the first market of every bookmaker, in response order.
pub fn collected_prices(event: &OddsEvent) -> Vec<f64> {
    event
        .bookmakers
        .iter()
        .filter_map(|bk| bk.markets.first())
        .flat_map(|m| m.outcomes.iter().map(|o| o.price))
        .collect()
}

/// Scores an event, or `None` if it does not have exactly three prices.
pub fn score_event(event: &OddsEvent) -> Option<MatchPick> {
    let prices = collected_prices(event);
    if prices.len() != 3 {
        tracing::debug!(
            "Odds: skipping {} vs {} ({} prices collected)",
            event.home_team, event.away_team, prices.len()
        );
        return None;
    }
    Some(MatchPick {
        home_team: event.home_team.clone(),
        away_team: event.away_team.clone(),
        score: margin_deficit(&prices),
        prices,
    })
}

/// All eligible events with their scores, in response order.
pub fn scored_candidates(events: &[OddsEvent]) -> Vec<MatchPick> {
    events.iter().filter_map(score_event).collect()
}

/// Highest-scoring eligible event; the first one wins a tie.
pub fn select_best_match(events: &[OddsEvent]) -> Option<MatchPick> {
    let mut best: Option<MatchPick> = None;
    for pick in scored_candidates(events) {
        if best.as_ref().map_or(true, |b| pick.score > b.score) {
            best = Some(pick);
        }
    }
    best
}

/// Fetch odds and pick the best match. `None` means no suitable match.
pub async fn fetch_best_match(provider: &dyn OddsProvider) -> Result<Option<MatchPick>> {
    let events = provider.fetch_events().await?;
    let best = select_best_match(&events);
    match &best {
        Some(pick) => tracing::info!(
            "Odds: selected {} vs {} (score {:.4})",
            pick.home_team, pick.away_team, pick.score
        ),
        None => tracing::info!("Odds: no event with exactly three prices"),
    }
    Ok(best)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn event(home: &str, away: &str, books: &[Vec<f64>]) -> OddsEvent {
        OddsEvent {
            home_team: home.to_string(),
            away_team: away.to_string(),
            bookmakers: books
                .iter()
                .enumerate()
                .map(|(i, prices)| Bookmaker {
                    key: format!("book{}", i),
                    markets: vec![Market {
                        key: "h2h".to_string(),
                        outcomes: prices
                            .iter()
                            .map(|p| Outcome { name: "x".to_string(), price: *p })
                            .collect(),
                    }],
                })
                .collect(),
        }
    }

    /// Three equal prices giving the requested margin deficit.
    pub(crate) fn prices_for_score(score: f64) -> Vec<f64> {
        let p = 3.0 / (1.0 - score);
        vec![p, p, p]
    }

    pub(crate) struct StaticOdds(pub Vec<OddsEvent>);

    #[async_trait]
    impl OddsProvider for StaticOdds {
        async fn fetch_events(&self) -> Result<Vec<OddsEvent>> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_selects_highest_score() {
        let a = prices_for_score(0.01);
        let b = prices_for_score(0.05);
        let c = prices_for_score(0.03);
        let events = vec![
            event("A", "a", &[a]),
            event("B", "b", &[b]),
            event("C", "c", &[c]),
        ];
        let best = select_best_match(&events).unwrap();
        assert_eq!(best.home_team, "B");
        assert!((best.score - 0.05).abs() < 1e-9);
    }

    #[test]
    fn test_tie_keeps_first_seen() {
        let events = vec![
            event("First", "x", &[vec![3.0, 3.0, 3.0]]),
            event("Second", "y", &[vec![3.0, 3.0, 3.0]]),
        ];
        assert_eq!(select_best_match(&events).unwrap().home_team, "First");
    }

    #[test]
    fn test_no_three_price_event_is_no_match() {
        assert!(select_best_match(&[]).is_none());
        let events = vec![
            // three bookmakers -> nine prices
            event("A", "a", &[vec![2.0, 3.0, 4.0], vec![2.1, 3.1, 4.1], vec![2.2, 3.2, 4.2]]),
            event("B", "b", &[vec![1.5, 2.5]]),
            event("C", "c", &[]),
        ];
        assert!(select_best_match(&events).is_none());
    }

    #[test]
    fn test_prices_collected_across_bookmakers() {
        // two prices from one book, one from another: still three
        let events = vec![event("A", "a", &[vec![2.0, 4.0], vec![4.0]])];
        let best = select_best_match(&events).unwrap();
        assert_eq!(best.prices, vec![2.0, 4.0, 4.0]);
        assert!(best.score.abs() < 1e-12);
    }

    #[test]
    fn test_score_invariant_under_price_order() {
        let x = score_event(&event("A", "a", &[vec![2.2, 3.4, 3.1]])).unwrap();
        let y = score_event(&event("A", "a", &[vec![3.1, 2.2, 3.4]])).unwrap();
        assert!((x.score - y.score).abs() < 1e-12);
    }

    #[test]
    fn test_decodes_odds_api_payload() {
        let body = r#"[{
            "id": "e1",
            "sport_key": "soccer_epl",
            "commence_time": "2024-03-02T15:00:00Z",
            "home_team": "Arsenal",
            "away_team": "Chelsea",
            "bookmakers": [{
                "key": "bet365",
                "title": "Bet365",
                "markets": [{
                    "key": "h2h",
                    "outcomes": [
                        {"name": "Arsenal", "price": 1.9},
                        {"name": "Chelsea", "price": 4.2},
                        {"name": "Draw", "price": 3.4}
                    ]
                }]
            }]
        }]"#;
        let events: Vec<OddsEvent> = serde_json::from_str(body).unwrap();
        let best = select_best_match(&events).unwrap();
        assert_eq!(best.home_team, "Arsenal");
        assert_eq!(best.away_team, "Chelsea");
        assert_eq!(best.prices.len(), 3);
    }

    #[tokio::test]
    async fn test_fetch_best_match_with_provider() {
        let provider = StaticOdds(vec![event("Home", "Away", &[vec![2.5, 3.2, 2.9]])]);
        let best = fetch_best_match(&provider).await.unwrap().unwrap();
        assert_eq!(best.away_team, "Away");
    }
}
