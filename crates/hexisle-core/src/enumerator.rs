//! Legal move enumeration.
//!
//! A [`StageTable`] declares which move kinds each stage accepts. Known stages
//! have handlers that expand those kinds into concrete moves; a stage without a
//! handler that declares exactly one argument-free move falls back to it.

use crate::actions::{Move, MoveKind};
use crate::board::PlayerId;
use crate::game::{GameState, RollStatus, Stage};
use crate::mechanics::{calculate_trade, exchange_rates};
use crate::rules;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{error, warn};

/// Configuration problems found while enumerating
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum EnumerationError {
    #[error("No moves defined for stage: {0}")]
    UnknownStage(String),

    #[error("Stage {stage} has no handler and declares {declared} moves")]
    AmbiguousStage { stage: String, declared: usize },
}

/// Stage name to accepted move kinds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTable {
    stages: BTreeMap<String, Vec<MoveKind>>,
}

impl Default for StageTable {
    fn default() -> Self {
        Self {
            stages: Stage::ALL
                .iter()
                .map(|s| (s.name().to_string(), s.moves().to_vec()))
                .collect(),
        }
    }
}

impl StageTable {
    /// A table with no stages
    pub fn empty() -> Self {
        Self {
            stages: BTreeMap::new(),
        }
    }

    /// Add or replace a stage
    pub fn with_stage(mut self, name: impl Into<String>, moves: &[MoveKind]) -> Self {
        self.stages.insert(name.into(), moves.to_vec());
        self
    }

    pub fn moves_for(&self, stage: &str) -> Option<&[MoveKind]> {
        self.stages.get(stage).map(Vec::as_slice)
    }

    pub fn stage_names(&self) -> impl Iterator<Item = &str> {
        self.stages.keys().map(String::as_str)
    }
}

/// Expands the active stage of a player into concrete legal moves
#[derive(Debug, Clone, Default)]
pub struct MoveEnumerator {
    table: StageTable,
}

impl MoveEnumerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(table: StageTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &StageTable {
        &self.table
    }

    /// Legal moves for the player. Configuration errors are logged and yield no moves.
    pub fn enumerate(&self, state: &GameState, player: PlayerId) -> Vec<Move> {
        self.try_enumerate(state, player).unwrap_or_else(|e| {
            error!(player, error = %e, "Move enumeration failed");
            Vec::new()
        })
    }

    /// Legal moves for the player in their active stage (empty when it is not their move)
    pub fn try_enumerate(&self, state: &GameState, player: PlayerId) -> Result<Vec<Move>, EnumerationError> {
        if state.get_player(player).is_none() {
            return Ok(Vec::new());
        }
        match state.active_stage(player) {
            Some(stage) => self.try_enumerate_stage(state, player, stage.name()),
            None => Ok(Vec::new()),
        }
    }

    /// Legal moves for the player as if the named stage were active
    pub fn try_enumerate_stage(
        &self,
        state: &GameState,
        player: PlayerId,
        stage: &str,
    ) -> Result<Vec<Move>, EnumerationError> {
        let declared = self
            .table
            .moves_for(stage)
            .ok_or_else(|| EnumerationError::UnknownStage(stage.to_string()))?;

        let mut moves = match Stage::ALL.iter().find(|s| s.name() == stage) {
            Some(Stage::PlaceSettlement) => place_settlement_moves(state),
            Some(Stage::PlaceRoad) => place_road_moves(state, player),
            Some(Stage::Rolling) => rolling_moves(state),
            Some(Stage::Acting) => acting_moves(state, player),
            Some(Stage::Robber) => robber_moves(state, player),
            None => return fallback_moves(stage, declared),
        };

        moves.retain(|mv| declared.contains(&mv.kind()));
        Ok(moves)
    }
}

/// Legal moves for the player using the default stage table
pub fn enumerate(state: &GameState, player: PlayerId) -> Vec<Move> {
    MoveEnumerator::new().enumerate(state, player)
}

fn fallback_moves(stage: &str, declared: &[MoveKind]) -> Result<Vec<Move>, EnumerationError> {
    match declared {
        [] => Ok(Vec::new()),
        [kind] => {
            warn!(stage, move_kind = %kind, "No handler for stage, falling back to its only move");
            match kind.without_args() {
                Some(mv) => Ok(vec![mv]),
                None => {
                    warn!(stage, move_kind = %kind, "Fallback move needs arguments; nothing enumerated");
                    Ok(Vec::new())
                }
            }
        }
        _ => Err(EnumerationError::AmbiguousStage {
            stage: stage.to_string(),
            declared: declared.len(),
        }),
    }
}

// ==================== Stage Handlers ====================

fn place_settlement_moves(state: &GameState) -> Vec<Move> {
    let mut moves: Vec<Move> = rules::valid_setup_settlement_spots(&state.board)
        .into_iter()
        .map(Move::PlaceSettlement)
        .collect();
    if state.can_regenerate_board() {
        moves.push(Move::RegenerateBoard);
    }
    moves
}

fn place_road_moves(state: &GameState, player: PlayerId) -> Vec<Move> {
    rules::valid_setup_road_spots(&state.board, state.pending_setup_settlement(player))
        .into_iter()
        .map(Move::PlaceRoad)
        .collect()
}

fn rolling_moves(state: &GameState) -> Vec<Move> {
    match state.roll_status {
        RollStatus::Idle => vec![Move::RollDice],
        RollStatus::Rolling => vec![Move::ResolveRoll],
        RollStatus::Resolved => Vec::new(),
    }
}

fn acting_moves(state: &GameState, player: PlayerId) -> Vec<Move> {
    let Some(p) = state.get_player(player) else {
        return Vec::new();
    };
    let can = p.affordability();
    let board = &state.board;
    let mut moves = Vec::new();

    if can.settlement {
        moves.extend(
            rules::valid_settlement_spots(board, player)
                .into_iter()
                .map(Move::BuildSettlement),
        );
    }
    if can.city {
        moves.extend(rules::valid_city_spots(board, player).into_iter().map(Move::BuildCity));
    }
    if can.road {
        moves.extend(rules::valid_road_spots(board, player).into_iter().map(Move::BuildRoad));
    }

    let offer = calculate_trade(&p.resources, &exchange_rates(board, player));
    if offer.can_trade {
        moves.push(Move::TradeBank {
            give: offer.give,
            receive: offer.receive,
        });
    }

    moves.push(Move::EndTurn);
    moves
}

fn robber_moves(state: &GameState, player: PlayerId) -> Vec<Move> {
    let mut moves = Vec::new();
    for hex in rules::valid_robber_spots(&state.board, &state.robber) {
        let victims = rules::robber_victims(&state.board, &state.players, &hex, player);
        if victims.is_empty() {
            moves.push(Move::DismissRobber { hex, victim: None });
        } else {
            moves.extend(victims.into_iter().map(|v| Move::DismissRobber {
                hex,
                victim: Some(v),
            }));
        }
    }
    moves
}
