//! Headless bot-vs-bot matches.
//!
//! Every match owns its own `GameState` and RNGs and runs on a blocking task;
//! matches never share state beyond the standings they report into.

use hexisle_core::{Bot, BotProfile, GameConfig, GameError, GameState, PlayerId, SetupError};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::SimConfig;
use crate::report::Standings;

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("Game setup failed: {0}")]
    Setup(#[from] SetupError),

    #[error("Seat {0} has no bot")]
    MissingBot(PlayerId),

    #[error("Bot in seat {player} played an illegal move: {source}")]
    IllegalMove {
        player: PlayerId,
        #[source]
        source: GameError,
    },
}

/// Outcome of one match
#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    pub id: Uuid,
    pub seed: u64,
    /// Profile name per seat
    pub seats: Vec<String>,
    pub winner: Option<PlayerId>,
    /// Victory points per seat at the end
    pub scores: Vec<u32>,
    pub turns: u32,
    pub moves: usize,
    /// False when the move budget ran out before the game ended
    pub finished: bool,
}

impl MatchResult {
    pub fn winner_profile(&self) -> Option<&str> {
        self.winner
            .and_then(|seat| self.seats.get(seat as usize))
            .map(String::as_str)
    }
}

/// Play one seeded match to completion (or until `max_moves`)
pub fn play_match(
    id: Uuid,
    seed: u64,
    profiles: Vec<BotProfile>,
    max_moves: usize,
) -> Result<MatchResult, MatchError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let config = GameConfig::new(profiles.len() as u8);
    let mut game = GameState::new(config, &mut rng)?;

    let seats: Vec<String> = profiles.iter().map(|p| p.name.clone()).collect();
    let mut bots: Vec<Bot> = profiles
        .into_iter()
        .enumerate()
        .map(|(seat, profile)| {
            Bot::with_seed(seat as PlayerId, profile, seed.wrapping_add(seat as u64 + 1))
        })
        .collect();

    let mut moves = 0;
    while !game.is_finished() && moves < max_moves {
        let player = game.current_player;
        let bot = bots
            .get_mut(player as usize)
            .ok_or(MatchError::MissingBot(player))?;

        let Some(mv) = bot.choose_move(&game) else {
            warn!(%id, player, "Bot found no move, abandoning match");
            break;
        };
        game.apply_move(player, mv, &mut rng)
            .map_err(|source| MatchError::IllegalMove { player, source })?;
        moves += 1;
    }

    let result = MatchResult {
        id,
        seed,
        seats,
        winner: game.winner(),
        scores: game.players.iter().map(|p| p.victory_points).collect(),
        turns: game.turn_number,
        moves,
        finished: game.is_finished(),
    };
    debug!(%id, winner = ?result.winner_profile(), turns = result.turns, "Match finished");
    Ok(result)
}

/// Run every configured match concurrently, recording each into `standings`
pub async fn run_matches(config: &SimConfig, standings: Arc<Standings>) -> Vec<MatchResult> {
    let mut set = JoinSet::new();

    for game in 0..config.games {
        let id = Uuid::new_v4();
        let seed = config.seed.wrapping_add(game as u64);
        let profiles = config.seating(game);
        let max_moves = config.max_moves;
        let standings = Arc::clone(&standings);

        set.spawn_blocking(move || {
            let result = play_match(id, seed, profiles, max_moves);
            if let Ok(result) = &result {
                standings.record(result);
            }
            (id, result)
        });
    }

    let mut results = Vec::with_capacity(config.games as usize);
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((_, Ok(result))) => results.push(result),
            Ok((id, Err(e))) => error!(%id, "Match failed: {}", e),
            Err(e) => error!("Match task panicked: {}", e),
        }
    }

    results.sort_by_key(|r| r.seed);
    info!(played = results.len(), requested = config.games, "All matches complete");
    results
}
