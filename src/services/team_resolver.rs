use std::fmt;
use std::str::FromStr;

use crate::error::Result;
use crate::models::Team;
use crate::services::{ApiTeam, FootballProvider};
use crate::utils::name_similarity;

/// How to choose among several search results for one name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResolutionPolicy {
    /// Take the provider's first result.
    #[default]
    First,
    /// Take the result whose name is most similar to the query; earliest wins ties.
    Closest,
}

impl FromStr for ResolutionPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "first" => Ok(Self::First),
            "closest" => Ok(Self::Closest),
            other => Err(format!("unknown resolution policy '{}', use 'first' or 'closest'", other)),
        }
    }
}

impl fmt::Display for ResolutionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::First => "first",
            Self::Closest => "closest",
        })
    }
}

pub fn choose_team(query: &str, candidates: &[ApiTeam], policy: ResolutionPolicy) -> Option<Team> {
    let chosen = match policy {
        ResolutionPolicy::First => candidates.first()?,
        ResolutionPolicy::Closest => {
            let mut best = candidates.first()?;
            let mut best_score = name_similarity(query, &best.name);
            for candidate in &candidates[1..] {
                let score = name_similarity(query, &candidate.name);
                if score > best_score {
                    best = candidate;
                    best_score = score;
                }
            }
            best
        }
    };
    Some(Team { id: chosen.id, name: chosen.name.clone() })
}

/// Look a team up by display name. `None` means the search came back empty.
pub async fn resolve_team(
    provider: &dyn FootballProvider,
    name: &str,
    policy: ResolutionPolicy,
) -> Result<Option<Team>> {
    let candidates = provider.search_teams(name).await?;
    let team = choose_team(name, &candidates, policy);
    match &team {
        Some(t) => tracing::info!(
            "Resolved '{}' -> {} (id {}, {} candidates, policy {})",
            name, t.name, t.id, candidates.len(), policy
        ),
        None => tracing::warn!("No API-Football team found for '{}'", name),
    }
    Ok(team)
}
