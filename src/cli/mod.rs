use std::fmt::Write;

use anyhow::Result;

use crate::config::Config;
use crate::models::{MatchPick, RunOutcome, Team, TeamModel, Verdict};
use crate::services::{
    fit_team_model, resolve_team, scored_candidates, select_best_match, ApiFootballClient, ForecastEngine,
    ForecastSettings, OddsApiClient, OddsProvider, ResolutionPolicy, TeamFit, MIN_OBSERVATIONS,
};

pub async fn run_forecast(config: &Config, settings: ForecastSettings) -> Result<()> {
    let odds = OddsApiClient::new(config)?;
    let football = ApiFootballClient::new(config)?;

    println!("🔎 Looking for the best match by odds...");
    let outcome = ForecastEngine::new(&odds, &football, settings).run().await?;
    print!("{}", render_outcome(&outcome));
    Ok(())
}

pub async fn show_odds(config: &Config) -> Result<()> {
    let odds = OddsApiClient::new(config)?;
    let events = odds.fetch_events().await?;
    let candidates = scored_candidates(&events);

    println!("📊 {} events, {} with exactly three prices", events.len(), candidates.len());
    for pick in &candidates {
        println!("   • {} vs {}  score {:+.4}  prices {:?}", pick.home_team, pick.away_team, pick.score, pick.prices);
    }

    match select_best_match(&events) {
        Some(pick) => println!("\n🏟️ Best match: {} vs {} ({:+.4})", pick.home_team, pick.away_team, pick.score),
        None => println!("\nNo suitable match found."),
    }
    Ok(())
}

pub async fn query_team(config: &Config, name: &str, policy: ResolutionPolicy) -> Result<()> {
    let football = ApiFootballClient::new(config)?;

    println!("🔍 Searching for team: {}", name);
    match resolve_team(&football, name, policy).await? {
        Some(team) => println!("✅ {} (id {})", team.name, team.id),
        None => println!("❌ No team found matching '{}'", name),
    }
    Ok(())
}

pub async fn fit_model(config: &Config, team_id: u64, league: u32, season: u32) -> Result<()> {
    let football = ApiFootballClient::new(config)?;

    println!("📈 Training model for team {} (league {}, season {})...", team_id, league, season);
    let fit = fit_team_model(&football, team_id, league, season).await?;
    print!("{}", render_fit(team_id, &fit));
    Ok(())
}

// ── Rendering ────────────────────────────────────────────────────────────────

pub fn render_outcome(outcome: &RunOutcome) -> String {
    let mut out = String::new();
    match outcome {
        RunOutcome::NoSuitableMatch => {
            let _ = writeln!(out, "No suitable match found.");
        }
        RunOutcome::TeamNotFound { pick, name } => {
            render_pick(&mut out, pick);
            let _ = writeln!(out, "❌ Could not find a team id for '{}'.", name);
        }
        RunOutcome::InsufficientHistory { pick, team, rows } => {
            render_pick(&mut out, pick);
            let _ = writeln!(
                out,
                "❌ Could not train a model for {}: {} fixtures, need at least {}.",
                team.name, rows, MIN_OBSERVATIONS
            );
        }
        RunOutcome::Forecast(forecast) => {
            render_pick(&mut out, &forecast.pick);
            render_team(&mut out, "🔴", &forecast.home, &forecast.home_model);
            render_team(&mut out, "🔵", &forecast.away, &forecast.away_model);
            let _ = match forecast.verdict {
                Verdict::HomeWin => writeln!(out, "\n✅ Forecast: {} to win", forecast.pick.home_team),
                Verdict::AwayWin => writeln!(out, "\n✅ Forecast: {} to win", forecast.pick.away_team),
                Verdict::Draw => writeln!(out, "\n🤝 Forecast: draw"),
            };
        }
    }
    out
}

fn render_pick(out: &mut String, pick: &MatchPick) {
    let _ = writeln!(
        out,
        "\n🏟️ Suggested match: {} vs {} (margin deficit {:+.4})",
        pick.home_team, pick.away_team, pick.score
    );
}

fn render_team(out: &mut String, marker: &str, team: &Team, model: &TeamModel) {
    let _ = writeln!(out, "\n{} {}", marker, team.name);
    let _ = writeln!(
        out,
        "  Home: {:.2}, Absences: {:.2}, Intercept: {:.2}",
        model.coef_home, model.coef_absence, model.intercept
    );
    let _ = writeln!(out, "  🔮 Predicted goals: {:.2}", model.prediction);
    if model.lineups_defaulted > 0 {
        let _ = writeln!(
            out,
            "  ⚠️ {} of {} lineups unavailable, counted as full strength",
            model.lineups_defaulted, model.observations
        );
    }
}

pub fn render_fit(team_id: u64, fit: &TeamFit) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n{:<10} {:<17} {:>5} {:>5} {:>8}", "fixture", "kick-off", "goals", "home", "absence");
    for row in &fit.observations {
        let kickoff = row
            .kickoff
            .map(|k| k.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        let absence = if row.lineup_defaulted { format!("{}*", row.absence) } else { row.absence.to_string() };
        let _ = writeln!(out, "{:<10} {:<17} {:>5} {:>5} {:>8}", row.fixture_id, kickoff, row.goals, row.home, absence);
    }
    let team = Team { id: team_id, name: format!("Team {}", team_id) };
    render_team(&mut out, "📈", &team, &fit.model);
    out
}
