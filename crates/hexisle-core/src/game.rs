//! Core game state machine.
//!
//! This module contains the main `GameState` struct, the phase/stage model and
//! move dispatch. Every move is validated completely before anything is
//! mutated, so a rejected move leaves the state untouched.

use crate::actions::{GameEvent, Move, MoveKind};
use crate::board::{Board, PlayerId, Resource};
use crate::coach::{calculate_board_stats, BoardStats};
use crate::generator::{generate_board, GenerationReport};
use crate::hex::{CoordError, EdgeCoord, HexCoord, VertexCoord};
use crate::mechanics::{discard_half, distribute_resources, exchange_rates, DISCARD_LIMIT};
use crate::player::{costs, Player, ResourceHand};
use crate::rules::{self, BuildKind, RuleViolation};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use tracing::info;

/// Victory points needed to win
pub const DEFAULT_WINNING_SCORE: u32 = 10;

/// Player turns after which the game is declared a draw
pub const DEFAULT_TURN_LIMIT: u32 = 100;

/// Supported player counts
pub const MIN_PLAYERS: u8 = 2;
pub const MAX_PLAYERS: u8 = 4;

/// Options for a new game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Number of players (2-4)
    pub player_count: u8,
    /// Display names by seat; missing entries become "Player N"
    pub player_names: Vec<String>,
    /// Victory points needed to win
    pub winning_score: u32,
    /// Player turns before the game ends in a draw
    pub turn_limit: u32,
    /// Leave the dice pending after `rollDice` until `resolveRoll` (for animated hosts)
    pub two_step_roll: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            player_count: MAX_PLAYERS,
            player_names: Vec::new(),
            winning_score: DEFAULT_WINNING_SCORE,
            turn_limit: DEFAULT_TURN_LIMIT,
            two_step_roll: false,
        }
    }
}

impl GameConfig {
    /// Default options for the given number of players
    pub fn new(player_count: u8) -> Self {
        Self {
            player_count,
            ..Self::default()
        }
    }

    /// Name for a seat, falling back to "Player N"
    pub fn player_name(&self, id: PlayerId) -> String {
        self.player_names
            .get(id as usize)
            .filter(|n| !n.trim().is_empty())
            .cloned()
            .unwrap_or_else(|| format!("Player {}", id + 1))
    }

    pub fn validate(&self) -> Result<(), SetupError> {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&self.player_count) {
            return Err(SetupError::InvalidPlayerCount(self.player_count));
        }
        Ok(())
    }
}

/// Errors creating a game
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum SetupError {
    #[error("Player count must be between 2 and 4, got {0}")]
    InvalidPlayerCount(u8),
}

/// Named sub-step of a phase that decides which moves are open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Stage {
    PlaceSettlement,
    PlaceRoad,
    Rolling,
    Acting,
    Robber,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::PlaceSettlement,
        Stage::PlaceRoad,
        Stage::Rolling,
        Stage::Acting,
        Stage::Robber,
    ];

    /// Stage name as hosts see it
    pub fn name(&self) -> &'static str {
        match self {
            Stage::PlaceSettlement => "placeSettlement",
            Stage::PlaceRoad => "placeRoad",
            Stage::Rolling => "rolling",
            Stage::Acting => "acting",
            Stage::Robber => "robber",
        }
    }

    /// Moves accepted in this stage
    pub fn moves(&self) -> &'static [MoveKind] {
        match self {
            Stage::PlaceSettlement => &[MoveKind::PlaceSettlement, MoveKind::RegenerateBoard],
            Stage::PlaceRoad => &[MoveKind::PlaceRoad],
            Stage::Rolling => &[MoveKind::RollDice, MoveKind::ResolveRoll],
            Stage::Acting => &[
                MoveKind::BuildRoad,
                MoveKind::BuildSettlement,
                MoveKind::BuildCity,
                MoveKind::TradeBank,
                MoveKind::EndTurn,
            ],
            Stage::Robber => &[MoveKind::DismissRobber],
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Game phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Snake-draft placement of two settlements and two roads each
    Setup {
        /// Index into the setup order
        step: usize,
        /// Either `PlaceSettlement` or `PlaceRoad`
        stage: Stage,
    },

    /// Regular turns
    Gameplay {
        /// `Rolling`, `Acting` or `Robber`
        stage: Stage,
    },

    /// Game is over; `None` means the turn limit was hit
    GameOver { winner: Option<PlayerId> },
}

impl GamePhase {
    /// The active stage, if the game is still running
    pub fn stage(&self) -> Option<Stage> {
        match self {
            GamePhase::Setup { stage, .. } | GamePhase::Gameplay { stage } => Some(*stage),
            GamePhase::GameOver { .. } => None,
        }
    }
}

/// Progress of the current turn's dice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RollStatus {
    /// Not rolled yet this turn
    #[default]
    Idle,
    /// Dice thrown, outcome not applied
    Rolling,
    /// Outcome applied
    Resolved,
}

/// Errors that can occur when applying moves
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GameError {
    #[error("Game is over")]
    GameOver,

    #[error("Invalid player ID: {0}")]
    InvalidPlayer(PlayerId),

    #[error("Not your turn")]
    NotYourTurn,

    #[error("{mv} is not allowed during {stage}")]
    WrongStage { stage: Stage, mv: MoveKind },

    #[error("Dice have already been rolled this turn")]
    AlreadyRolled,

    #[error("There is no roll to resolve")]
    NoPendingRoll,

    #[error("Dice must show 1 to 6, got {0} and {1}")]
    InvalidDice(u8, u8),

    #[error("Unknown move: {0}")]
    UnknownMove(String),

    #[error("Wrong number of arguments for {0}")]
    InvalidArguments(MoveKind),

    #[error("Invalid input: {0}")]
    InvalidInput(#[from] CoordError),

    #[error(transparent)]
    Rule(#[from] RuleViolation),
}

/// Setup order for `n` players: forward, then reversed
pub fn snake_draft_order(n: u8) -> Vec<PlayerId> {
    (0..n).chain((0..n).rev()).collect()
}

/// The complete game state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// The game board
    pub board: Board,
    /// All players, indexed by id
    pub players: Vec<Player>,
    /// Hex the robber sits on
    pub robber: HexCoord,
    /// Player whose stage is active
    pub current_player: PlayerId,
    /// Current game phase
    pub phase: GamePhase,
    /// Seat order for setup placements
    pub setup_order: Vec<PlayerId>,
    /// Player turn count (0 during setup, 1 for the first regular turn)
    pub turn_number: u32,
    /// Last dice roll
    pub last_roll: Option<(u8, u8)>,
    /// What each player got from the last roll
    pub last_roll_rewards: BTreeMap<PlayerId, ResourceHand>,
    /// Dice progress this turn
    pub roll_status: RollStatus,
    /// Short human-readable summary of the last move
    pub notification: Option<String>,
    /// Board pip analysis
    pub board_stats: BoardStats,
    /// How the board was generated
    pub generation: GenerationReport,
    /// Options this game was created with
    pub config: GameConfig,
}

impl GameState {
    /// Create a new game on a freshly generated board
    pub fn new<R: Rng>(config: GameConfig, rng: &mut R) -> Result<Self, SetupError> {
        config.validate()?;

        let players = (0..config.player_count)
            .map(|id| Player::new(id, config.player_name(id)))
            .collect();
        let (board, generation) = generate_board(rng);
        let setup_order = snake_draft_order(config.player_count);

        let mut state = Self {
            robber: HexCoord::default(),
            board,
            players,
            current_player: setup_order[0],
            phase: GamePhase::Setup {
                step: 0,
                stage: Stage::PlaceSettlement,
            },
            setup_order,
            turn_number: 0,
            last_roll: None,
            last_roll_rewards: BTreeMap::new(),
            roll_status: RollStatus::Idle,
            notification: None,
            board_stats: BoardStats::default(),
            generation,
            config,
        };
        state.refresh_board();
        Ok(state)
    }

    /// Place the robber on the desert and recompute board stats
    fn refresh_board(&mut self) {
        self.robber = self.board.desert().unwrap_or_default();
        self.board_stats = calculate_board_stats(&self.board);
        if !self.generation.constraint_satisfied {
            self.board_stats.warnings.push(format!(
                "Board has adjacent 6/8 tokens after {} attempts",
                self.generation.attempts
            ));
        }
    }

    // ==================== Query Methods ====================

    /// Get the number of players
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Get a player by ID
    pub fn get_player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id as usize)
    }

    fn player_mut(&mut self, id: PlayerId) -> Result<&mut Player, GameError> {
        self.players
            .get_mut(id as usize)
            .ok_or(GameError::InvalidPlayer(id))
    }

    fn player_name(&self, id: PlayerId) -> &str {
        self.get_player(id).map(|p| p.name.as_str()).unwrap_or("Unknown")
    }

    /// Check if the game is finished
    pub fn is_finished(&self) -> bool {
        matches!(self.phase, GamePhase::GameOver { .. })
    }

    /// Get the winner if the game is finished with one
    pub fn winner(&self) -> Option<PlayerId> {
        match self.phase {
            GamePhase::GameOver { winner } => winner,
            _ => None,
        }
    }

    /// The stage a player may act in, if it is their move
    pub fn active_stage(&self, player: PlayerId) -> Option<Stage> {
        if player != self.current_player {
            return None;
        }
        self.phase.stage()
    }

    fn setup_step(&self) -> usize {
        match self.phase {
            GamePhase::Setup { step, .. } => step,
            _ => self.setup_order.len(),
        }
    }

    /// Whether the setup phase has reached round two (second settlements pay out)
    fn in_second_setup_round(&self, step: usize) -> bool {
        step >= self.player_count()
    }

    /// Whether the board may still be regenerated
    pub fn can_regenerate_board(&self) -> bool {
        matches!(
            self.phase,
            GamePhase::Setup {
                stage: Stage::PlaceSettlement,
                ..
            }
        ) && !self.board.has_pieces()
    }

    /// The settlement a setup road must attach to
    pub fn pending_setup_settlement(&self, player: PlayerId) -> Option<&VertexCoord> {
        match self.phase {
            GamePhase::Setup {
                stage: Stage::PlaceRoad,
                ..
            } => self.get_player(player)?.settlements.last(),
            _ => None,
        }
    }

    // ==================== Move Dispatch ====================

    /// Apply a move to the game state.
    ///
    /// Returns the events it produced. On error the state is unchanged.
    pub fn apply_move<R: Rng>(
        &mut self,
        player: PlayerId,
        mv: Move,
        rng: &mut R,
    ) -> Result<Vec<GameEvent>, GameError> {
        self.check_turn(player, mv.kind())?;

        let mut events = Vec::new();

        match mv {
            // ==================== Setup Phase ====================
            Move::PlaceSettlement(vertex) => self.place_setup_settlement(player, vertex, &mut events)?,
            Move::PlaceRoad(edge) => self.place_setup_road(player, edge, &mut events)?,
            Move::RegenerateBoard => {
                if !self.can_regenerate_board() {
                    return Err(RuleViolation::BoardLocked.into());
                }
                let (board, generation) = generate_board(rng);
                self.board = board;
                self.generation = generation;
                self.refresh_board();
                self.notification = Some("Board regenerated".to_string());
                events.push(GameEvent::BoardRegenerated);
            }

            // ==================== Rolling ====================
            Move::RollDice => {
                let dice = (rng.gen_range(1..=6), rng.gen_range(1..=6));
                events = self.record_roll(player, dice, rng)?;
            }
            Move::ResolveRoll => {
                if self.roll_status != RollStatus::Rolling {
                    return Err(GameError::NoPendingRoll);
                }
                self.resolve_roll(rng, &mut events);
            }

            // ==================== Acting ====================
            Move::BuildRoad(edge) => self.build_road(player, edge, &mut events)?,
            Move::BuildSettlement(vertex) => self.build_settlement(player, vertex, &mut events)?,
            Move::BuildCity(vertex) => self.build_city(player, vertex, &mut events)?,
            Move::TradeBank { give, receive } => self.trade_bank(player, give, receive, &mut events)?,
            Move::EndTurn => self.end_turn(player, &mut events),

            // ==================== Robber ====================
            Move::DismissRobber { hex, victim } => {
                self.dismiss_robber(player, hex, victim, rng, &mut events)?
            }
        }

        Ok(events)
    }

    /// Submit a roll made outside the engine (physical dice, replays)
    pub fn apply_roll<R: Rng>(
        &mut self,
        player: PlayerId,
        dice: (u8, u8),
        rng: &mut R,
    ) -> Result<Vec<GameEvent>, GameError> {
        self.check_turn(player, MoveKind::RollDice)?;
        self.record_roll(player, dice, rng)
    }

    /// Shared checks: game running, known player, their turn, move open in the stage
    fn check_turn(&self, player: PlayerId, kind: MoveKind) -> Result<(), GameError> {
        let stage = self.phase.stage().ok_or(GameError::GameOver)?;
        if self.get_player(player).is_none() {
            return Err(GameError::InvalidPlayer(player));
        }
        if player != self.current_player {
            return Err(GameError::NotYourTurn);
        }
        if !stage.moves().contains(&kind) {
            return Err(GameError::WrongStage { stage, mv: kind });
        }
        Ok(())
    }

    // ==================== Setup ====================

    fn place_setup_settlement(
        &mut self,
        player: PlayerId,
        vertex: VertexCoord,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), GameError> {
        rules::validate_settlement_location(&self.board, &vertex)?;
        let step = self.setup_step();

        let starting = if self.in_second_setup_round(step) {
            let mut hand = ResourceHand::new();
            for resource in self
                .board
                .hexes_at_vertex(&vertex)
                .iter()
                .filter_map(|h| h.resource())
            {
                hand.add(resource, 1);
            }
            Some(hand)
        } else {
            None
        };

        self.board.place_settlement(vertex, player);
        let p = self.player_mut(player)?;
        p.add_settlement(vertex);
        events.push(GameEvent::SettlementBuilt {
            player,
            location: vertex,
        });

        if let Some(hand) = starting {
            p.resources.add_hand(&hand);
            events.push(GameEvent::StartingResources {
                player,
                resources: hand,
            });
        }

        self.phase = GamePhase::Setup {
            step,
            stage: Stage::PlaceRoad,
        };
        self.notification = Some(format!("{} placed a settlement", self.player_name(player)));
        self.check_winner(player, events);
        Ok(())
    }

    fn place_setup_road(
        &mut self,
        player: PlayerId,
        edge: EdgeCoord,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), GameError> {
        rules::validate_setup_road(&self.board, &edge, self.pending_setup_settlement(player))?;
        let step = self.setup_step();

        self.board.place_road(edge, player);
        self.player_mut(player)?.add_road(edge);
        events.push(GameEvent::RoadBuilt {
            player,
            location: edge,
        });
        self.notification = Some(format!("{} placed a road", self.player_name(player)));

        let next = step + 1;
        match self.setup_order.get(next) {
            Some(&seat) => {
                self.current_player = seat;
                self.phase = GamePhase::Setup {
                    step: next,
                    stage: Stage::PlaceSettlement,
                };
            }
            None => {
                let first = self.setup_order.first().copied().unwrap_or(0);
                self.current_player = first;
                self.turn_number = 1;
                self.roll_status = RollStatus::Idle;
                self.phase = GamePhase::Gameplay {
                    stage: Stage::Rolling,
                };
                events.push(GameEvent::SetupCompleted {
                    first_player: first,
                });
            }
        }
        Ok(())
    }

    // ==================== Rolling ====================

    fn record_roll<R: Rng>(
        &mut self,
        player: PlayerId,
        dice: (u8, u8),
        rng: &mut R,
    ) -> Result<Vec<GameEvent>, GameError> {
        if self.roll_status != RollStatus::Idle {
            return Err(GameError::AlreadyRolled);
        }
        let (d1, d2) = dice;
        if !(1..=6).contains(&d1) || !(1..=6).contains(&d2) {
            return Err(GameError::InvalidDice(d1, d2));
        }

        let total = d1 + d2;
        self.last_roll = Some(dice);
        self.last_roll_rewards.clear();
        self.roll_status = RollStatus::Rolling;
        self.notification = Some(format!("{} rolled {total}", self.player_name(player)));

        let mut events = vec![GameEvent::DiceRolled {
            player,
            roll: dice,
            total,
        }];
        if !self.config.two_step_roll {
            self.resolve_roll(rng, &mut events);
        }
        Ok(events)
    }

    /// Apply the pending roll: discard and robber on a seven, production otherwise
    fn resolve_roll<R: Rng>(&mut self, rng: &mut R, events: &mut Vec<GameEvent>) {
        let total = self.last_roll.map(|(a, b)| a + b).unwrap_or(0);
        self.roll_status = RollStatus::Resolved;

        if total == 7 {
            for p in &mut self.players {
                if p.resources.total() > DISCARD_LIMIT {
                    let discarded = discard_half(&mut p.resources, rng);
                    events.push(GameEvent::CardsDiscarded {
                        player: p.id,
                        count: discarded.total(),
                    });
                }
            }
            self.notification = Some(format!(
                "{} rolled a 7 and must move the robber",
                self.player_name(self.current_player)
            ));
            self.phase = GamePhase::Gameplay {
                stage: Stage::Robber,
            };
            return;
        }

        let rewards = distribute_resources(&self.board, &self.robber, total);
        for (id, hand) in &rewards {
            if let Some(p) = self.players.get_mut(*id as usize) {
                p.resources.add_hand(hand);
            }
        }
        self.last_roll_rewards = rewards.clone();
        events.push(GameEvent::ResourcesDistributed { rewards });
        self.phase = GamePhase::Gameplay {
            stage: Stage::Acting,
        };
    }

    // ==================== Acting ====================

    fn pay(&mut self, player: PlayerId, kind: BuildKind) -> Result<(), GameError> {
        let cost = match kind {
            BuildKind::Road => costs::road(),
            BuildKind::Settlement => costs::settlement(),
            BuildKind::City => costs::city(),
        };
        if self.player_mut(player)?.resources.try_subtract(&cost) {
            Ok(())
        } else {
            Err(RuleViolation::CannotAfford(kind).into())
        }
    }

    fn can_afford(&self, player: PlayerId, kind: BuildKind) -> Result<(), GameError> {
        let p = self.get_player(player).ok_or(GameError::InvalidPlayer(player))?;
        let affordable = match kind {
            BuildKind::Road => p.affordability().road,
            BuildKind::Settlement => p.affordability().settlement,
            BuildKind::City => p.affordability().city,
        };
        if affordable {
            Ok(())
        } else {
            Err(RuleViolation::CannotAfford(kind).into())
        }
    }

    fn build_road(&mut self, player: PlayerId, edge: EdgeCoord, events: &mut Vec<GameEvent>) -> Result<(), GameError> {
        self.can_afford(player, BuildKind::Road)?;
        rules::validate_road(&self.board, player, &edge)?;

        self.pay(player, BuildKind::Road)?;
        self.board.place_road(edge, player);
        self.player_mut(player)?.add_road(edge);
        events.push(GameEvent::RoadBuilt {
            player,
            location: edge,
        });
        self.notification = Some(format!("{} built a road", self.player_name(player)));
        Ok(())
    }

    fn build_settlement(
        &mut self,
        player: PlayerId,
        vertex: VertexCoord,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), GameError> {
        self.can_afford(player, BuildKind::Settlement)?;
        rules::validate_settlement(&self.board, player, &vertex)?;

        self.pay(player, BuildKind::Settlement)?;
        self.board.place_settlement(vertex, player);
        self.player_mut(player)?.add_settlement(vertex);
        events.push(GameEvent::SettlementBuilt {
            player,
            location: vertex,
        });
        self.notification = Some(format!("{} built a settlement", self.player_name(player)));
        self.check_winner(player, events);
        Ok(())
    }

    fn build_city(&mut self, player: PlayerId, vertex: VertexCoord, events: &mut Vec<GameEvent>) -> Result<(), GameError> {
        self.can_afford(player, BuildKind::City)?;
        rules::validate_city(&self.board, player, &vertex)?;

        self.pay(player, BuildKind::City)?;
        self.board.upgrade_to_city(vertex, player);
        self.player_mut(player)?.upgrade_settlement(vertex);
        events.push(GameEvent::CityBuilt {
            player,
            location: vertex,
        });
        self.notification = Some(format!("{} built a city", self.player_name(player)));
        self.check_winner(player, events);
        Ok(())
    }

    fn trade_bank(
        &mut self,
        player: PlayerId,
        give: Resource,
        receive: Resource,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), GameError> {
        if give == receive {
            return Err(RuleViolation::SameResourceTrade(give).into());
        }
        let rate = exchange_rates(&self.board, player).get(give);
        let p = self.player_mut(player)?;
        if !p.resources.try_subtract(&ResourceHand::single(give, rate)) {
            return Err(RuleViolation::CannotAffordTrade {
                resource: give,
                rate,
            }
            .into());
        }
        p.resources.add(receive, 1);

        events.push(GameEvent::BankTradeCompleted {
            player,
            gave: give,
            gave_count: rate,
            received: receive,
        });
        self.notification = Some(format!(
            "{} traded {rate} {give} for 1 {receive}",
            self.player_name(player)
        ));
        Ok(())
    }

    fn end_turn(&mut self, player: PlayerId, events: &mut Vec<GameEvent>) {
        let next_player = ((player as usize + 1) % self.player_count()) as PlayerId;
        events.push(GameEvent::TurnEnded { player, next_player });

        self.turn_number += 1;
        if self.turn_number > self.config.turn_limit {
            info!(turn = self.turn_number, "Turn limit reached, game drawn");
            self.phase = GamePhase::GameOver { winner: None };
            self.notification = Some("Turn limit reached: the game is a draw".to_string());
            events.push(GameEvent::GameDrawn {
                turn: self.turn_number,
            });
            return;
        }

        self.current_player = next_player;
        self.roll_status = RollStatus::Idle;
        self.phase = GamePhase::Gameplay {
            stage: Stage::Rolling,
        };
        self.notification = Some(format!("{}'s turn", self.player_name(next_player)));
    }

    // ==================== Robber ====================

    fn dismiss_robber<R: Rng>(
        &mut self,
        player: PlayerId,
        hex: HexCoord,
        victim: Option<PlayerId>,
        rng: &mut R,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), GameError> {
        rules::validate_robber_move(&self.board, &self.players, &self.robber, &hex, player, victim)?;

        let from = self.robber;
        self.robber = hex;
        events.push(GameEvent::RobberMoved {
            player,
            from,
            to: hex,
        });
        self.notification = Some(format!("{} moved the robber", self.player_name(player)));

        if let Some(victim) = victim {
            let stolen = self.player_mut(victim)?.resources.steal_random(rng);
            if let Some(resource) = stolen {
                self.player_mut(player)?.resources.add(resource, 1);
            }
            events.push(GameEvent::ResourceStolen {
                thief: player,
                victim,
                resource: stolen,
            });
            self.notification = Some(format!(
                "{} stole from {}",
                self.player_name(player),
                self.player_name(victim)
            ));
        }

        self.phase = GamePhase::Gameplay {
            stage: Stage::Acting,
        };
        Ok(())
    }

    // ==================== Victory ====================

    fn check_winner(&mut self, player: PlayerId, events: &mut Vec<GameEvent>) {
        let Some(victory_points) = self.get_player(player).map(|p| p.victory_points) else {
            return;
        };
        if victory_points >= self.config.winning_score {
            info!(player, victory_points, "Game won");
            self.phase = GamePhase::GameOver {
                winner: Some(player),
            };
            self.notification = Some(format!("{} wins!", self.player_name(player)));
            events.push(GameEvent::GameWon {
                player,
                victory_points,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::VertexBuilding;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn new_game(players: u8, seed: u64) -> (GameState, StdRng) {
        let mut rng = StdRng::seed_from_u64(seed);
        let game = GameState::new(GameConfig::new(players), &mut rng).unwrap();
        (game, rng)
    }

    /// Place every setup piece on the first legal spot
    fn complete_setup(game: &mut GameState, rng: &mut StdRng) {
        while let GamePhase::Setup { stage, .. } = game.phase {
            let player = game.current_player;
            let mv = match stage {
                Stage::PlaceSettlement => Move::PlaceSettlement(rules::valid_setup_settlement_spots(&game.board)[0]),
                _ => Move::PlaceRoad(
                    rules::valid_setup_road_spots(&game.board, game.pending_setup_settlement(player))[0],
                ),
            };
            game.apply_move(player, mv, rng).unwrap();
        }
    }

    #[test]
    fn test_new_game_starts_in_setup() {
        let (game, _) = new_game(4, 1);
        assert_eq!(
            game.phase,
            GamePhase::Setup {
                step: 0,
                stage: Stage::PlaceSettlement
            }
        );
        assert_eq!(game.current_player, 0);
        assert_eq!(game.roll_status, RollStatus::Idle);
        assert_eq!(game.board.desert(), Some(game.robber));
    }

    #[test]
    fn test_player_count_bounds() {
        let mut rng = StdRng::seed_from_u64(0);
        for bad in [0, 1, 5] {
            assert_eq!(
                GameState::new(GameConfig::new(bad), &mut rng).unwrap_err(),
                SetupError::InvalidPlayerCount(bad)
            );
        }
        assert!(GameState::new(GameConfig::new(2), &mut rng).is_ok());
    }

    #[test]
    fn test_player_names() {
        let mut rng = StdRng::seed_from_u64(0);
        let config = GameConfig {
            player_count: 3,
            player_names: vec!["Ada".into(), "".into()],
            ..GameConfig::default()
        };
        let game = GameState::new(config, &mut rng).unwrap();
        let names: Vec<_> = game.players.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Ada", "Player 2", "Player 3"]);
    }

    #[test]
    fn test_snake_draft_order() {
        assert_eq!(snake_draft_order(3), vec![0, 1, 2, 2, 1, 0]);
        assert_eq!(snake_draft_order(4), vec![0, 1, 2, 3, 3, 2, 1, 0]);
    }

    #[test]
    fn test_occupied_vertex_leaves_state_unchanged() {
        let (mut game, mut rng) = new_game(3, 2);
        let vertex = rules::valid_setup_settlement_spots(&game.board)[0];
        game.apply_move(0, Move::PlaceSettlement(vertex), &mut rng).unwrap();
        let road = rules::valid_setup_road_spots(&game.board, Some(&vertex))[0];
        game.apply_move(0, Move::PlaceRoad(road), &mut rng).unwrap();

        let before = game.clone();
        let err = game
            .apply_move(1, Move::PlaceSettlement(vertex), &mut rng)
            .unwrap_err();
        assert_eq!(err, GameError::Rule(RuleViolation::VertexOccupied));
        assert_eq!(game, before);

        let neighbor = vertex
            .adjacent_vertices()
            .into_iter()
            .find(|v| game.board.is_land_vertex(v))
            .unwrap();
        let err = game
            .apply_move(1, Move::PlaceSettlement(neighbor), &mut rng)
            .unwrap_err();
        assert_eq!(err, GameError::Rule(RuleViolation::TooClose));
        assert_eq!(game, before);

        let off_island = vertex
            .adjacent_vertices()
            .into_iter()
            .find(|v| !game.board.is_land_vertex(v));
        if let Some(sea) = off_island {
            let err = game.apply_move(1, Move::PlaceSettlement(sea), &mut rng).unwrap_err();
            assert_eq!(err, GameError::Rule(RuleViolation::OffIsland));
            assert_eq!(game, before);
        }
    }

    #[test]
    fn test_turn_and_stage_checks() {
        let (mut game, mut rng) = new_game(2, 3);
        let vertex = rules::valid_setup_settlement_spots(&game.board)[0];

        assert_eq!(
            game.apply_move(1, Move::PlaceSettlement(vertex), &mut rng),
            Err(GameError::NotYourTurn)
        );
        assert_eq!(
            game.apply_move(0, Move::RollDice, &mut rng),
            Err(GameError::WrongStage {
                stage: Stage::PlaceSettlement,
                mv: MoveKind::RollDice
            })
        );
        assert_eq!(
            game.apply_move(9, Move::EndTurn, &mut rng),
            Err(GameError::InvalidPlayer(9))
        );
    }

    #[test]
    fn test_setup_follows_snake_order_and_pays_second_settlement() {
        let (mut game, mut rng) = new_game(3, 4);
        let mut seats = Vec::new();
        while let GamePhase::Setup { stage, .. } = game.phase {
            let player = game.current_player;
            if stage == Stage::PlaceSettlement {
                seats.push(player);
            }
            let mv = match stage {
                Stage::PlaceSettlement => Move::PlaceSettlement(rules::valid_setup_settlement_spots(&game.board)[0]),
                _ => Move::PlaceRoad(
                    rules::valid_setup_road_spots(&game.board, game.pending_setup_settlement(player))[0],
                ),
            };
            game.apply_move(player, mv, &mut rng).unwrap();
        }

        assert_eq!(seats, snake_draft_order(3));
        assert_eq!(
            game.phase,
            GamePhase::Gameplay {
                stage: Stage::Rolling
            }
        );
        assert_eq!(game.turn_number, 1);
        for p in &game.players {
            assert_eq!(p.settlements.len(), 2);
            assert_eq!(p.roads.len(), 2);
            assert_eq!(p.victory_points, 2);

            let second = p.settlements[1];
            let expected = game
                .board
                .hexes_at_vertex(&second)
                .iter()
                .filter(|h| h.resource().is_some())
                .count() as u32;
            assert_eq!(p.resources.total(), expected);
        }
    }

    #[test]
    fn test_regenerate_board_only_before_placement() {
        let (mut game, mut rng) = new_game(2, 5);
        let events = game.apply_move(0, Move::RegenerateBoard, &mut rng).unwrap();
        assert_eq!(events, vec![GameEvent::BoardRegenerated]);
        assert_eq!(game.board.desert(), Some(game.robber));

        let vertex = rules::valid_setup_settlement_spots(&game.board)[0];
        game.apply_move(0, Move::PlaceSettlement(vertex), &mut rng).unwrap();
        let road = rules::valid_setup_road_spots(&game.board, Some(&vertex))[0];
        game.apply_move(0, Move::PlaceRoad(road), &mut rng).unwrap();

        assert_eq!(
            game.apply_move(1, Move::RegenerateBoard, &mut rng),
            Err(GameError::Rule(RuleViolation::BoardLocked))
        );
    }

    #[test]
    fn test_seven_discards_and_moves_to_robber() {
        let (mut game, mut rng) = new_game(2, 6);
        complete_setup(&mut game, &mut rng);
        game.players[0].resources = ResourceHand::with_amounts(2, 2, 2, 1, 1);
        game.players[1].resources = ResourceHand::with_amounts(7, 0, 0, 0, 0);

        let events = game.apply_roll(0, (3, 4), &mut rng).unwrap();

        assert_eq!(game.players[0].resources.total(), 4);
        assert_eq!(game.players[1].resources.total(), 7);
        assert!(events.contains(&GameEvent::CardsDiscarded { player: 0, count: 4 }));
        assert_eq!(game.phase, GamePhase::Gameplay { stage: Stage::Robber });
        assert_eq!(game.roll_status, RollStatus::Resolved);
    }

    #[test]
    fn test_production_roll_moves_to_acting() {
        let (mut game, mut rng) = new_game(2, 7);
        complete_setup(&mut game, &mut rng);
        let before: u32 = game.players.iter().map(|p| p.resources.total()).sum();

        game.apply_roll(0, (4, 4), &mut rng).unwrap();

        let after: u32 = game.players.iter().map(|p| p.resources.total()).sum();
        let rewarded: u32 = game.last_roll_rewards.values().map(|h| h.total()).sum();
        assert_eq!(after, before + rewarded);
        assert_eq!(game.phase, GamePhase::Gameplay { stage: Stage::Acting });
        assert_eq!(
            game.apply_roll(0, (1, 1), &mut rng),
            Err(GameError::WrongStage {
                stage: Stage::Acting,
                mv: MoveKind::RollDice
            })
        );
    }

    #[test]
    fn test_two_step_roll() {
        let mut rng = StdRng::seed_from_u64(8);
        let config = GameConfig {
            player_count: 2,
            two_step_roll: true,
            ..GameConfig::default()
        };
        let mut game = GameState::new(config, &mut rng).unwrap();
        complete_setup(&mut game, &mut rng);

        assert_eq!(
            game.apply_move(0, Move::ResolveRoll, &mut rng),
            Err(GameError::NoPendingRoll)
        );
        game.apply_roll(0, (2, 3), &mut rng).unwrap();
        assert_eq!(game.roll_status, RollStatus::Rolling);
        assert_eq!(game.phase, GamePhase::Gameplay { stage: Stage::Rolling });
        assert_eq!(game.apply_roll(0, (2, 3), &mut rng), Err(GameError::AlreadyRolled));

        game.apply_move(0, Move::ResolveRoll, &mut rng).unwrap();
        assert_eq!(game.roll_status, RollStatus::Resolved);
        assert_eq!(game.phase, GamePhase::Gameplay { stage: Stage::Acting });
    }

    #[test]
    fn test_build_road_needs_resources_and_keeps_state() {
        let (mut game, mut rng) = new_game(2, 9);
        complete_setup(&mut game, &mut rng);
        game.apply_roll(0, (5, 5), &mut rng).unwrap();
        game.phase = GamePhase::Gameplay { stage: Stage::Acting };
        game.players[0].resources = ResourceHand::new();

        let road = rules::valid_road_spots(&game.board, 0)[0];
        let before = game.clone();
        assert_eq!(
            game.apply_move(0, Move::BuildRoad(road), &mut rng),
            Err(GameError::Rule(RuleViolation::CannotAfford(BuildKind::Road)))
        );
        assert_eq!(game, before);

        game.players[0].resources = ResourceHand::with_amounts(1, 1, 0, 0, 0);
        game.apply_move(0, Move::BuildRoad(road), &mut rng).unwrap();
        assert!(game.players[0].resources.is_empty());
        assert_eq!(game.board.get_edge(&road).owner(), Some(0));
    }

    #[test]
    fn test_city_upgrade_and_win() {
        let (mut game, mut rng) = new_game(2, 10);
        complete_setup(&mut game, &mut rng);
        game.phase = GamePhase::Gameplay { stage: Stage::Acting };
        game.players[0].victory_points = 9;
        game.players[0].resources = ResourceHand::with_amounts(0, 0, 0, 2, 3);

        let vertex = game.players[0].settlements[0];
        let events = game.apply_move(0, Move::BuildCity(vertex), &mut rng).unwrap();

        assert_eq!(game.board.get_vertex(&vertex), VertexBuilding::City(0));
        assert_eq!(game.winner(), Some(0));
        assert!(events.contains(&GameEvent::GameWon {
            player: 0,
            victory_points: 10
        }));
        assert_eq!(game.apply_move(0, Move::EndTurn, &mut rng), Err(GameError::GameOver));
    }

    #[test]
    fn test_trade_bank() {
        let (mut game, mut rng) = new_game(2, 11);
        complete_setup(&mut game, &mut rng);
        game.phase = GamePhase::Gameplay { stage: Stage::Acting };
        game.players[0].resources = ResourceHand::with_amounts(0, 0, 0, 0, 4);

        assert_eq!(
            game.apply_move(
                0,
                Move::TradeBank {
                    give: Resource::Ore,
                    receive: Resource::Ore
                },
                &mut rng
            ),
            Err(GameError::Rule(RuleViolation::SameResourceTrade(Resource::Ore)))
        );

        let rate = exchange_rates(&game.board, 0).get(Resource::Ore);
        game.apply_move(
            0,
            Move::TradeBank {
                give: Resource::Ore,
                receive: Resource::Wood,
            },
            &mut rng,
        )
        .unwrap();
        assert_eq!(game.players[0].resources.ore, 4 - rate);
        assert_eq!(game.players[0].resources.wood, 1);
    }

    #[test]
    fn test_end_turn_and_draw() {
        let mut rng = StdRng::seed_from_u64(12);
        let config = GameConfig {
            player_count: 2,
            turn_limit: 2,
            ..GameConfig::default()
        };
        let mut game = GameState::new(config, &mut rng).unwrap();
        complete_setup(&mut game, &mut rng);

        game.phase = GamePhase::Gameplay { stage: Stage::Acting };
        let events = game.apply_move(0, Move::EndTurn, &mut rng).unwrap();
        assert_eq!(events, vec![GameEvent::TurnEnded { player: 0, next_player: 1 }]);
        assert_eq!(game.current_player, 1);
        assert_eq!(game.turn_number, 2);
        assert_eq!(game.roll_status, RollStatus::Idle);
        assert_eq!(game.phase, GamePhase::Gameplay { stage: Stage::Rolling });

        game.phase = GamePhase::Gameplay { stage: Stage::Acting };
        let events = game.apply_move(1, Move::EndTurn, &mut rng).unwrap();
        assert!(events.contains(&GameEvent::GameDrawn { turn: 3 }));
        assert_eq!(game.phase, GamePhase::GameOver { winner: None });
    }

    #[test]
    fn test_dismiss_robber_steals() {
        let (mut game, mut rng) = new_game(2, 13);
        complete_setup(&mut game, &mut rng);
        game.phase = GamePhase::Gameplay { stage: Stage::Robber };
        game.players[0].resources = ResourceHand::new();
        game.players[1].resources = ResourceHand::with_amounts(0, 0, 1, 0, 0);

        let target = rules::valid_robber_spots(&game.board, &game.robber)[0];
        let spot = target
            .vertices()
            .into_iter()
            .find(|v| game.board.get_vertex(v) == VertexBuilding::Empty)
            .unwrap();
        game.board.place_settlement(spot, 1);

        let events = game
            .apply_move(
                0,
                Move::DismissRobber {
                    hex: target,
                    victim: Some(1),
                },
                &mut rng,
            )
            .unwrap();

        assert_eq!(game.robber, target);
        assert_eq!(game.players[0].resources.sheep, 1);
        assert!(game.players[1].resources.is_empty());
        assert!(events.contains(&GameEvent::ResourceStolen {
            thief: 0,
            victim: 1,
            resource: Some(Resource::Sheep)
        }));
        assert_eq!(game.phase, GamePhase::Gameplay { stage: Stage::Acting });
    }
}
