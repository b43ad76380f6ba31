//! Simulation settings read from the environment.

use hexisle_core::BotProfile;
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_GAMES: u32 = 20;
const DEFAULT_PLAYERS: u8 = 4;
const DEFAULT_SEED: u64 = 1;
const DEFAULT_MAX_MOVES: usize = 10_000;
const DEFAULT_PROFILES: [&str; 4] = ["balanced", "aggressive", "defensive", "expansive"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{var} must be a number, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },

    #[error("Player count must be 2-4, got {0}")]
    InvalidPlayerCount(u8),

    #[error("Unknown bot profile: {0}")]
    UnknownProfile(String),

    #[error("SIM_GAMES must be at least 1")]
    NoGames,
}

/// Settings for one simulation run
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Number of matches to play
    pub games: u32,
    /// Seats per match
    pub players: u8,
    /// Base seed; match `i` uses `seed + i`
    pub seed: u64,
    /// Profiles rotated around the table between matches
    pub profiles: Vec<BotProfile>,
    /// Where to write the JSON report (stdout when unset)
    pub report: Option<PathBuf>,
    /// Moves after which a match is abandoned
    pub max_moves: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            games: DEFAULT_GAMES,
            players: DEFAULT_PLAYERS,
            seed: DEFAULT_SEED,
            profiles: DEFAULT_PROFILES
                .iter()
                .filter_map(|name| BotProfile::from_name(name))
                .collect(),
            report: None,
            max_moves: DEFAULT_MAX_MOVES,
        }
    }
}

impl SimConfig {
    /// Read `SIM_GAMES`, `SIM_PLAYERS`, `SIM_SEED`, `SIM_PROFILES` and `SIM_REPORT`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys keep their defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup("SIM_GAMES") {
            config.games = parse_number("SIM_GAMES", &value)?;
        }
        if let Some(value) = lookup("SIM_PLAYERS") {
            config.players = parse_number("SIM_PLAYERS", &value)?;
        }
        if let Some(value) = lookup("SIM_SEED") {
            config.seed = parse_number("SIM_SEED", &value)?;
        }
        if let Some(value) = lookup("SIM_PROFILES") {
            config.profiles = parse_profiles(&value)?;
        }
        if let Some(value) = lookup("SIM_REPORT").filter(|v| !v.trim().is_empty()) {
            config.report = Some(PathBuf::from(value));
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.games == 0 {
            return Err(ConfigError::NoGames);
        }
        if !(2..=4).contains(&self.players) {
            return Err(ConfigError::InvalidPlayerCount(self.players));
        }
        Ok(())
    }

    /// Profiles for each seat of match `game`, rotated so every profile
    /// takes every seat over a long run
    pub fn seating(&self, game: u32) -> Vec<BotProfile> {
        let count = self.profiles.len().max(1);
        (0..self.players as usize)
            .map(|seat| {
                self.profiles
                    .get((seat + game as usize) % count)
                    .cloned()
                    .unwrap_or_default()
            })
            .collect()
    }
}

fn parse_number<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidNumber {
        var,
        value: value.to_string(),
    })
}

/// Comma-separated preset names; an empty list falls back to the defaults
fn parse_profiles(value: &str) -> Result<Vec<BotProfile>, ConfigError> {
    let profiles = value
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| BotProfile::from_name(name).ok_or_else(|| ConfigError::UnknownProfile(name.to_string())))
        .collect::<Result<Vec<_>, _>>()?;

    if profiles.is_empty() {
        return Ok(SimConfig::default().profiles);
    }
    Ok(profiles)
}
