use crate::error::{ForecastError, Result};
use crate::models::{Forecast, MatchPick, RunOutcome, Team, TeamModel, Verdict};
use crate::services::{fetch_best_match, fit_team_model, resolve_team, FootballProvider, OddsProvider, ResolutionPolicy};

#[derive(Debug, Clone, Copy)]
pub struct ForecastSettings {
    pub league: u32,
    pub season: u32,
    pub policy: ResolutionPolicy,
}

/// Runs the whole pipeline: pick a match from the odds feed, resolve both
/// teams, fit a goals model for each and compare the home predictions.
pub struct ForecastEngine<'a> {
    odds: &'a dyn OddsProvider,
    football: &'a dyn FootballProvider,
    settings: ForecastSettings,
}

impl<'a> ForecastEngine<'a> {
    pub fn new(odds: &'a dyn OddsProvider, football: &'a dyn FootballProvider, settings: ForecastSettings) -> Self {
        Self { odds, football, settings }
    }

    pub async fn run(&self) -> Result<RunOutcome> {
        let Some(pick) = fetch_best_match(self.odds).await? else {
            return Ok(RunOutcome::NoSuitableMatch);
        };

        let policy = self.settings.policy;
        let Some(home) = resolve_team(self.football, &pick.home_team, policy).await? else {
            let name = pick.home_team.clone();
            return Ok(RunOutcome::TeamNotFound { pick, name });
        };
        let Some(away) = resolve_team(self.football, &pick.away_team, policy).await? else {
            let name = pick.away_team.clone();
            return Ok(RunOutcome::TeamNotFound { pick, name });
        };

        tracing::info!("Training model for home side {}…", home.name);
        let home_model = match self.team_model(&home).await? {
            Ok(model) => model,
            Err(rows) => return Ok(RunOutcome::InsufficientHistory { pick, team: home, rows }),
        };
        tracing::info!("Training model for away side {}…", away.name);
        let away_model = match self.team_model(&away).await? {
            Ok(model) => model,
            Err(rows) => return Ok(RunOutcome::InsufficientHistory { pick, team: away, rows }),
        };

        Ok(RunOutcome::Forecast(Box::new(build_forecast(pick, home, away, home_model, away_model))))
    }

    /// Outer error is fatal; inner `Err` carries the row count of a team
    /// with too little history.
    async fn team_model(&self, team: &Team) -> Result<std::result::Result<TeamModel, usize>> {
        match fit_team_model(self.football, team.id, self.settings.league, self.settings.season).await {
            Ok(fit) => Ok(Ok(fit.model)),
            Err(ForecastError::InsufficientHistory { rows, .. }) => {
                tracing::warn!("{} has only {} usable fixtures", team.name, rows);
                Ok(Err(rows))
            }
            Err(e) => Err(e),
        }
    }
}

pub fn build_forecast(pick: MatchPick, home: Team, away: Team, home_model: TeamModel, away_model: TeamModel) -> Forecast {
    let verdict = Verdict::from_predictions(home_model.prediction, away_model.prediction);
    Forecast { pick, home, away, home_model, away_model, verdict }
}
