//! Per-profile standings and the JSON summary.

use dashmap::DashMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::runner::MatchResult;

/// Totals for one bot profile across every seat it played
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProfileStanding {
    pub games: u32,
    pub wins: u32,
    pub draws: u32,
    pub unfinished: u32,
    pub total_points: u32,
}

impl ProfileStanding {
    pub fn win_rate(&self) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            self.wins as f64 / self.games as f64
        }
    }

    pub fn average_points(&self) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            self.total_points as f64 / self.games as f64
        }
    }
}

/// Standings shared by all running matches
pub struct Standings {
    profiles: DashMap<String, ProfileStanding>,
}

impl Standings {
    pub fn new() -> Self {
        Self {
            profiles: DashMap::new(),
        }
    }

    /// Fold one match into every seated profile's totals
    pub fn record(&self, result: &MatchResult) {
        for (seat, profile) in result.seats.iter().enumerate() {
            let mut entry = self.profiles.entry(profile.clone()).or_default();
            entry.games += 1;
            entry.total_points += result.scores.get(seat).copied().unwrap_or(0);

            if !result.finished {
                entry.unfinished += 1;
            } else {
                match result.winner {
                    Some(winner) if winner as usize == seat => entry.wins += 1,
                    Some(_) => {}
                    None => entry.draws += 1,
                }
            }
        }
    }

    /// Sorted copy of the current totals
    pub fn snapshot(&self) -> BTreeMap<String, ProfileStanding> {
        self.profiles
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }
}

impl Default for Standings {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Serialize)]
pub struct ProfileSummary {
    #[serde(flatten)]
    pub standing: ProfileStanding,
    pub win_rate: f64,
    pub average_points: f64,
}

/// Summary written at the end of a run
#[derive(Debug, Serialize)]
pub struct SimReport {
    pub games: usize,
    pub decided: usize,
    pub draws: usize,
    pub unfinished: usize,
    pub average_turns: f64,
    pub standings: BTreeMap<String, ProfileSummary>,
    pub matches: Vec<MatchResult>,
}

impl SimReport {
    pub fn build(standings: &Standings, matches: Vec<MatchResult>) -> Self {
        let games = matches.len();
        let unfinished = matches.iter().filter(|m| !m.finished).count();
        let decided = matches.iter().filter(|m| m.winner.is_some()).count();
        let total_turns: u64 = matches.iter().map(|m| u64::from(m.turns)).sum();
        let average_turns = if games == 0 {
            0.0
        } else {
            total_turns as f64 / games as f64
        };

        let standings = standings
            .snapshot()
            .into_iter()
            .map(|(name, standing)| {
                let summary = ProfileSummary {
                    win_rate: standing.win_rate(),
                    average_points: standing.average_points(),
                    standing,
                };
                (name, summary)
            })
            .collect();

        Self {
            games,
            decided,
            draws: games - decided - unfinished,
            unfinished,
            average_turns,
            standings,
            matches,
        }
    }

    /// Write the pretty JSON report to `path`, or stdout when unset
    pub async fn write(&self, path: Option<&Path>) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        match path {
            Some(path) => tokio::fs::write(path, json).await?,
            None => println!("{json}"),
        }
        Ok(())
    }
}
