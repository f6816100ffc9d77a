mod cli;
mod config;
mod error;
mod models;
mod services;
mod utils;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::services::{ForecastSettings, ResolutionPolicy};

#[derive(Parser)]
#[command(name = "goal-forecast")]
#[command(about = "Pick a balanced match from bookmaker odds and forecast it from team goal models")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline: odds, team lookup, goal models, forecast
    Forecast {
        /// API-Football league id (defaults to FORECAST_LEAGUE or 39)
        #[arg(short, long)]
        league: Option<u32>,
        /// Season start year (defaults to FORECAST_SEASON or 2023)
        #[arg(short, long)]
        season: Option<u32>,
        /// How to pick among several team search results: first | closest
        #[arg(short, long, default_value = "first")]
        resolve: ResolutionPolicy,
    },
    /// Score every odds event and show the selected match
    Odds,
    /// Look up a team's API-Football id
    Team {
        #[arg(short, long)]
        name: String,
        #[arg(short, long, default_value = "first")]
        resolve: ResolutionPolicy,
    },
    /// Fit and print the goals model of one team
    Model {
        #[arg(short, long)]
        team_id: u64,
        #[arg(short, long)]
        league: Option<u32>,
        #[arg(short, long)]
        season: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing (stderr, so stdout carries only the report)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env();
    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Forecast { league, season, resolve }) => {
            let settings = ForecastSettings {
                league: league.unwrap_or(config.league),
                season: season.unwrap_or(config.season),
                policy: resolve,
            };
            tracing::info!("Forecasting (league {}, season {})", settings.league, settings.season);
            cli::run_forecast(&config, settings).await
        }
        Some(Commands::Odds) => cli::show_odds(&config).await,
        Some(Commands::Team { name, resolve }) => {
            tracing::info!("Querying team: {}", name);
            cli::query_team(&config, &name, resolve).await
        }
        Some(Commands::Model { team_id, league, season }) => {
            cli::fit_model(
                &config,
                team_id,
                league.unwrap_or(config.league),
                season.unwrap_or(config.season),
            )
            .await
        }
        None => {
            // Default to the full pipeline
            let settings = ForecastSettings {
                league: config.league,
                season: config.season,
                policy: ResolutionPolicy::default(),
            };
            cli::run_forecast(&config, settings).await
        }
    };

    if let Err(e) = &result {
        tracing::error!("Run failed: {:#}", e);
    }
    result
}
