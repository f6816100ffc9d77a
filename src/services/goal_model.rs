use chrono::{DateTime, Utc};
use nalgebra::{DMatrix, DVector};
use serde_json::Value;

use crate::error::{ForecastError, Result};
use crate::models::{FixtureObservation, TeamModel};
use crate::services::{FixtureEntry, FootballProvider};

/// Fewest fixture rows a team model is fitted on.
pub const MIN_OBSERVATIONS: usize = 3;
const FULL_STARTING_XI: usize = 11;

/// A fitted model together with the rows it was fitted on.
#[derive(Debug, Clone)]
pub struct TeamFit {
    pub observations: Vec<FixtureObservation>,
    pub model: TeamModel,
}

/// Fetch a team's finished fixtures for a league season, build the feature
/// table (one lineup request per fixture) and fit the goals regression.
pub async fn fit_team_model(
    provider: &dyn FootballProvider,
    team_id: u64,
    league: u32,
    season: u32,
) -> Result<TeamFit> {
    let observations = collect_observations(provider, team_id, league, season).await?;
    let model = fit_goal_model(&observations)?;

    tracing::info!(
        "Team {}: fitted on {} fixtures, home {:.3}, absence {:.3}, intercept {:.3}, prediction {:.3}",
        team_id, model.observations, model.coef_home, model.coef_absence, model.intercept, model.prediction
    );

    Ok(TeamFit { observations, model })
}

pub async fn collect_observations(
    provider: &dyn FootballProvider,
    team_id: u64,
    league: u32,
    season: u32,
) -> Result<Vec<FixtureObservation>> {
    let fixtures = provider.completed_fixtures(team_id, league, season).await?;
    let mut rows = Vec::with_capacity(fixtures.len());

    for entry in &fixtures {
        let (home, goals) = side_and_goals(team_id, entry);
        let fixture_id = entry.fixture.id;
        let Some(goals) = goals else {
            tracing::warn!("Fixture {}: no goal count for team {}, skipping", fixture_id, team_id);
            continue;
        };

        let body = provider.lineups(fixture_id).await?;
        let (absence, lineup_defaulted) = match absence_from_lineups(team_id, fixture_id, &body) {
            Ok(absence) => (absence, false),
            Err(e) => {
                tracing::warn!("{}; assuming a full-strength lineup", e);
                (0, true)
            }
        };

        let row = FixtureObservation {
            fixture_id,
            kickoff: entry.fixture.date.as_deref().and_then(parse_kickoff),
            goals,
            home,
            absence,
            lineup_defaulted,
        };
        tracing::debug!("Fixture {}: goals {}, home {}, absence {}", fixture_id, goals, home, absence);
        rows.push(row);
    }

    Ok(rows)
}

/// Whether the team was at home (1) or away (0), and its goals in the fixture.
fn side_and_goals(team_id: u64, entry: &FixtureEntry) -> (u8, Option<u32>) {
    if entry.teams.home.id == team_id {
        (1, entry.goals.home)
    } else {
        (0, entry.goals.away)
    }
}

fn parse_kickoff(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|d| d.with_timezone(&Utc))
        .ok()
}

/// 1 if the team's listed starting XI has fewer than eleven players, else 0.
///
/// The team's entry is matched by `team.id`; without a match the first entry
/// is used. Any shape problem is reported as `LineupUnavailable`.
pub fn absence_from_lineups(team_id: u64, fixture_id: u64, body: &Value) -> Result<u8> {
    let unavailable = |reason: &str| ForecastError::LineupUnavailable {
        fixture_id,
        reason: reason.to_string(),
    };

    let entries = body
        .get("response")
        .and_then(Value::as_array)
        .ok_or_else(|| unavailable("response list missing"))?;
    let entry = entries
        .iter()
        .find(|e| e.pointer("/team/id").and_then(Value::as_u64) == Some(team_id))
        .or_else(|| entries.first())
        .ok_or_else(|| unavailable("no lineups published"))?;
    let starters = entry
        .get("startXI")
        .and_then(Value::as_array)
        .ok_or_else(|| unavailable("startXI missing"))?;

    Ok(if starters.len() < FULL_STARTING_XI { 1 } else { 0 })
}

/// Ordinary least squares of goals on [home, absence] with an intercept.
///
/// Features and target are centred and the slope is the minimum-norm SVD
/// solution, so a feature that never varies gets a zero coefficient.
pub fn fit_goal_model(rows: &[FixtureObservation]) -> Result<TeamModel> {
    if rows.len() < MIN_OBSERVATIONS {
        return Err(ForecastError::InsufficientHistory {
            rows: rows.len(),
            required: MIN_OBSERVATIONS,
        });
    }

    let n = rows.len();
    let mean = |f: fn(&FixtureObservation) -> f64| rows.iter().map(f).sum::<f64>() / n as f64;
    let mean_home = mean(|r| r.home as f64);
    let mean_absence = mean(|r| r.absence as f64);
    let mean_goals = mean(|r| r.goals as f64);

    let x = DMatrix::from_fn(n, 2, |i, j| match j {
        0 => rows[i].home as f64 - mean_home,
        _ => rows[i].absence as f64 - mean_absence,
    });
    let y = DVector::from_iterator(n, rows.iter().map(|r| r.goals as f64 - mean_goals));

    let svd = x.svd(true, true);
    let largest = svd.singular_values.iter().cloned().fold(0.0, f64::max);
    let eps = largest * f64::EPSILON * n as f64;
    let coef = svd.solve(&y, eps).map_err(|e| ForecastError::Fit(e.to_string()))?;

    let coef_home = coef[0];
    let coef_absence = coef[1];
    let intercept = mean_goals - coef_home * mean_home - coef_absence * mean_absence;

    Ok(TeamModel {
        coef_home,
        coef_absence,
        intercept,
        prediction: predict(intercept, coef_home, coef_absence, 1.0, 0.0),
        observations: n,
        lineups_defaulted: rows.iter().filter(|r| r.lineup_defaulted).count(),
    })
}

fn predict(intercept: f64, coef_home: f64, coef_absence: f64, home: f64, absence: f64) -> f64 {
    intercept + coef_home * home + coef_absence * absence
}
