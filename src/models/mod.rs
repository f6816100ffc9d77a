use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A match chosen from the odds feed, identified only by team display names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchPick {
    pub home_team: String,
    pub away_team: String,
    /// Prices collected across all bookmakers (always three for a pick).
    pub prices: Vec<f64>,
    /// `1 - Σ 1/price`
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: u64,
    pub name: String,
}

/// One row of a team's fixture table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureObservation {
    pub fixture_id: u64,
    pub kickoff: Option<DateTime<Utc>>,
    pub goals: u32,
    pub home: u8,    // 1 if the team played at home
    pub absence: u8, // 1 if fewer than 11 listed starters
    /// True when the lineup could not be read and `absence` fell back to 0.
    pub lineup_defaulted: bool,
}

#[cfg(test)]
impl FixtureObservation {
    pub fn new(goals: u32, home: u8, absence: u8) -> Self {
        Self {
            fixture_id: 0,
            kickoff: None,
            goals,
            home,
            absence,
            lineup_defaulted: false,
        }
    }
}

/// Fitted goals-scored regression for one team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamModel {
    pub coef_home: f64,
    pub coef_absence: f64,
    pub intercept: f64,
    /// Expected goals at home with a full-strength lineup.
    pub prediction: f64,
    pub observations: usize,
    /// Rows whose absence flag was defaulted because the lineup was unreadable.
    pub lineups_defaulted: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    HomeWin,
    AwayWin,
    Draw,
}

impl Verdict {
    pub fn from_predictions(home: f64, away: f64) -> Self {
        match home.partial_cmp(&away) {
            Some(std::cmp::Ordering::Greater) => Verdict::HomeWin,
            Some(std::cmp::Ordering::Less) => Verdict::AwayWin,
            _ => Verdict::Draw,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub pick: MatchPick,
    pub home: Team,
    pub away: Team,
    pub home_model: TeamModel,
    pub away_model: TeamModel,
    pub verdict: Verdict,
}

/// How a pipeline run ended. Everything but `Forecast` is a clean halt.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    NoSuitableMatch,
    TeamNotFound { pick: MatchPick, name: String },
    InsufficientHistory { pick: MatchPick, team: Team, rows: usize },
    Forecast(Box<Forecast>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_from_predictions() {
        assert_eq!(Verdict::from_predictions(1.80, 1.20), Verdict::HomeWin);
        assert_eq!(Verdict::from_predictions(1.20, 1.80), Verdict::AwayWin);
        assert_eq!(Verdict::from_predictions(1.50, 1.50), Verdict::Draw);
        assert_eq!(Verdict::from_predictions(f64::NAN, 1.0), Verdict::Draw);
    }
}
