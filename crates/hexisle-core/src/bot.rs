//! AI bot players.
//!
//! A bot enumerates the legal moves, ranks them and plays the best one:
//! - Rolling and robber moves bypass weighted scoring
//! - Setup settlements follow the coach's best spots
//! - Everything else is weighted by the bot's [`BotProfile`], then the top
//!   bracket is refined with the coach's spatial scores

use crate::actions::{Move, MoveKind};
use crate::board::PlayerId;
use crate::coach::{Coach, CoachConfig};
use crate::enumerator::MoveEnumerator;
use crate::game::GameState;
use crate::hex::HexCoord;
use crate::mechanics::pip_value;
use crate::player::Affordability;
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

const ADVISED_BOOST: f64 = 1.5;
const AFFORDABLE_BOOST: f64 = 10.0;
const ROAD_FATIGUE_PENALTY: f64 = 0.01;
const TRADE_BOOST: f64 = 5.0;
const END_TURN_WEIGHT: f64 = 1.0;
const UNKNOWN_MOVE_WEIGHT: f64 = 0.5;

/// Moves within this share of the best weight form the top bracket
const TOP_BRACKET: f64 = 0.9;

/// Base weight per move type
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BotWeights {
    pub build_city: f64,
    pub build_settlement: f64,
    pub build_road: f64,
    pub trade_bank: f64,
}

/// Personality of a bot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotProfile {
    pub name: String,
    pub description: String,
    pub weights: BotWeights,
    /// 0..=1, how far ahead roads are worth building
    pub aggressiveness: f64,
    /// 0..=1, how much mixed-resource spots are favoured
    pub diversity_preference: f64,
    /// Break ties randomly instead of by enumeration order
    pub randomize: bool,
}

impl Default for BotProfile {
    fn default() -> Self {
        Self::balanced()
    }
}

impl BotProfile {
    /// Cities and settlements first, roads when needed
    pub fn balanced() -> Self {
        Self {
            name: "Balanced".to_string(),
            description: "Prioritizes cities and settlements, builds roads when needed.".to_string(),
            weights: BotWeights {
                build_city: 100.0,
                build_settlement: 80.0,
                build_road: 40.0,
                trade_bank: 20.0,
            },
            aggressiveness: 0.3,
            diversity_preference: 0.6,
            randomize: true,
        }
    }

    /// Expansion and cutting off opponents
    pub fn aggressive() -> Self {
        Self {
            name: "Aggressive".to_string(),
            description: "Prioritizes expansion and cutting off opponents.".to_string(),
            weights: BotWeights {
                build_city: 80.0,
                build_settlement: 90.0,
                build_road: 70.0,
                trade_bank: 15.0,
            },
            aggressiveness: 0.8,
            diversity_preference: 0.4,
            randomize: true,
        }
    }

    /// Upgrades what it has and trades carefully
    pub fn defensive() -> Self {
        Self {
            name: "Defensive".to_string(),
            description: "Upgrades existing settlements and avoids road sprawl.".to_string(),
            weights: BotWeights {
                build_city: 120.0,
                build_settlement: 70.0,
                build_road: 30.0,
                trade_bank: 30.0,
            },
            aggressiveness: 0.1,
            diversity_preference: 0.8,
            randomize: false,
        }
    }

    /// Settles wide before building up
    pub fn expansive() -> Self {
        Self {
            name: "Expansive".to_string(),
            description: "Spreads out quickly with roads and settlements.".to_string(),
            weights: BotWeights {
                build_city: 60.0,
                build_settlement: 110.0,
                build_road: 80.0,
                trade_bank: 25.0,
            },
            aggressiveness: 0.6,
            diversity_preference: 0.5,
            randomize: true,
        }
    }

    /// Look up a preset by name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "balanced" => Some(Self::balanced()),
            "aggressive" => Some(Self::aggressive()),
            "defensive" => Some(Self::defensive()),
            "expansive" => Some(Self::expansive()),
            _ => None,
        }
    }

    /// Vertex scoring weights tuned to this profile's taste for diversity
    pub fn coach_config(&self) -> CoachConfig {
        CoachConfig {
            diversity_multiplier: 1.0 + self.diversity_preference / 3.0,
            ..CoachConfig::default()
        }
    }

    fn base_weight(&self, kind: MoveKind) -> f64 {
        match kind {
            MoveKind::BuildCity => self.weights.build_city,
            MoveKind::BuildSettlement => self.weights.build_settlement,
            MoveKind::BuildRoad | MoveKind::PlaceRoad => self.weights.build_road,
            MoveKind::TradeBank => self.weights.trade_bank,
            MoveKind::EndTurn => END_TURN_WEIGHT,
            _ => UNKNOWN_MOVE_WEIGHT,
        }
    }
}

/// Per-decision facts the move scorer needs
#[derive(Debug, Clone)]
pub struct ScoringContext {
    pub advised: Vec<MoveKind>,
    pub affordable: Affordability,
    pub road_fatigued: bool,
    pub trade_safe: bool,
}

impl ScoringContext {
    /// Gather the context for a player from the coach
    pub fn for_player(coach: &Coach<'_>, state: &GameState, player: PlayerId) -> Option<Self> {
        let p = state.get_player(player)?;
        Some(Self {
            advised: coach.strategic_advice(player).recommended_moves,
            affordable: p.affordability(),
            road_fatigued: p.roads.len() > p.building_count() * 2 + 2,
            trade_safe: coach.evaluate_trade(player).is_safe,
        })
    }
}

/// Profile-weighted score of a move
pub fn weighted_score(profile: &BotProfile, mv: &Move, ctx: &ScoringContext) -> f64 {
    let kind = mv.kind();
    let mut weight = profile.base_weight(kind);

    if ctx.advised.contains(&kind) {
        weight *= ADVISED_BOOST;
    }

    match kind {
        MoveKind::BuildSettlement if ctx.affordable.settlement => weight *= AFFORDABLE_BOOST,
        MoveKind::BuildCity if ctx.affordable.city => weight *= AFFORDABLE_BOOST,
        MoveKind::BuildRoad if ctx.road_fatigued => weight *= ROAD_FATIGUE_PENALTY,
        MoveKind::TradeBank => {
            if !ctx.affordable.settlement {
                weight *= TRADE_BOOST;
            }
            if !ctx.trade_safe {
                weight = 0.0;
            }
        }
        _ => {}
    }

    weight
}

/// A bot player that can decide on moves
pub struct Bot {
    pub player_id: PlayerId,
    pub profile: BotProfile,
    enumerator: MoveEnumerator,
    rng: StdRng,
}

impl Bot {
    pub fn new(player_id: PlayerId, profile: BotProfile) -> Self {
        Self {
            player_id,
            profile,
            enumerator: MoveEnumerator::new(),
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(player_id: PlayerId, profile: BotProfile, seed: u64) -> Self {
        Self {
            player_id,
            profile,
            enumerator: MoveEnumerator::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Use a custom enumerator (for hosts with their own stage table)
    pub fn with_enumerator(mut self, enumerator: MoveEnumerator) -> Self {
        self.enumerator = enumerator;
        self
    }

    /// Choose the move to play, or `None` when the bot has nothing to do
    pub fn choose_move(&mut self, game: &GameState) -> Option<Move> {
        let moves = self.enumerator.enumerate(game, self.player_id);
        if moves.is_empty() {
            return None;
        }

        let ranked = self.rank_moves(game, &moves);
        let chosen = if ranked.is_empty() {
            moves.choose(&mut self.rng).cloned()
        } else {
            ranked.into_iter().next()
        };

        if let Some(mv) = &chosen {
            debug!(player = self.player_id, profile = %self.profile.name, mv = %mv, "Bot chose move");
        }
        chosen
    }

    /// Order legal moves best first
    pub fn rank_moves(&mut self, game: &GameState, moves: &[Move]) -> Vec<Move> {
        let player = self.player_id;
        if player != game.current_player {
            warn!(player, current = game.current_player, "Bot asked to move out of turn");
            return Vec::new();
        }
        if game.get_player(player).is_none() || moves.is_empty() {
            return Vec::new();
        }

        if moves
            .iter()
            .any(|m| matches!(m, Move::RollDice | Move::ResolveRoll))
        {
            return moves.to_vec();
        }
        if moves.iter().all(|m| matches!(m, Move::DismissRobber { .. })) {
            return self.rank_robber_moves(game, moves);
        }

        let coach = Coach::with_config(game, self.profile.coach_config());

        if moves.iter().any(|m| matches!(m, Move::PlaceSettlement(_))) {
            return self.rank_setup_settlements(&coach, moves);
        }

        let Some(ctx) = ScoringContext::for_player(&coach, game, player) else {
            return Vec::new();
        };

        let mut sorted: Vec<(Move, f64)> = moves
            .iter()
            .map(|m| (m.clone(), weighted_score(&self.profile, m, &ctx)))
            .collect();
        sorted.sort_by(|a, b| b.1.total_cmp(&a.1));

        let top_weight = sorted[0].1;
        let top: Vec<Move> = sorted
            .iter()
            .filter(|(_, w)| *w >= top_weight * TOP_BRACKET)
            .map(|(m, _)| m.clone())
            .collect();
        let sorted: Vec<Move> = sorted.into_iter().map(|(m, _)| m).collect();

        for kind in [
            MoveKind::BuildSettlement,
            MoveKind::BuildCity,
            MoveKind::BuildRoad,
            MoveKind::PlaceRoad,
        ] {
            if let Some(refined) = self.refine(&coach, &top, &sorted, kind) {
                return refined;
            }
        }

        let all_roads = top
            .iter()
            .all(|m| matches!(m.kind(), MoveKind::BuildRoad | MoveKind::PlaceRoad));
        if all_roads && self.profile.randomize {
            let mut shuffled = top.clone();
            shuffled.shuffle(&mut self.rng);
            let rest = sorted.into_iter().filter(|m| !top.contains(m));
            return shuffled.into_iter().chain(rest).collect();
        }

        sorted
    }

    /// Coach's best spots that are among the legal moves, falling back to every move
    fn rank_setup_settlements(&mut self, coach: &Coach<'_>, moves: &[Move]) -> Vec<Move> {
        let mut ranked: Vec<Move> = coach
            .best_settlement_spots(self.player_id)
            .into_iter()
            .map(|rec| Move::PlaceSettlement(rec.target))
            .filter(|m| moves.contains(m))
            .collect();

        if ranked.is_empty() {
            return moves.to_vec();
        }
        if self.profile.randomize {
            ranked.shuffle(&mut self.rng);
        }
        ranked
    }

    /// Promote the spatially best move of one kind within the top bracket
    fn refine(&mut self, coach: &Coach<'_>, top: &[Move], sorted: &[Move], kind: MoveKind) -> Option<Vec<Move>> {
        let mut candidates: Vec<&Move> = top.iter().filter(|m| m.kind() == kind).collect();
        if candidates.len() <= 1 {
            return None;
        }

        let player = self.player_id;
        let scores: HashMap<Move, f64> = match kind {
            MoveKind::BuildSettlement | MoveKind::BuildCity => {
                let vertices: Vec<_> = candidates.iter().filter_map(|m| m.vertex().copied()).collect();
                coach
                    .best_city_spots(player, &vertices)
                    .into_iter()
                    .map(|r| {
                        let mv = if kind == MoveKind::BuildCity {
                            Move::BuildCity(r.target)
                        } else {
                            Move::BuildSettlement(r.target)
                        };
                        (mv, r.score)
                    })
                    .collect()
            }
            _ => {
                let edges: Vec<_> = candidates.iter().filter_map(|m| m.edge().copied()).collect();
                coach
                    .best_road_spots(player, &edges, self.profile.aggressiveness)
                    .into_iter()
                    .map(|r| {
                        let mv = if kind == MoveKind::PlaceRoad {
                            Move::PlaceRoad(r.target)
                        } else {
                            Move::BuildRoad(r.target)
                        };
                        (mv, r.score)
                    })
                    .collect()
            }
        };

        if self.profile.randomize {
            candidates.shuffle(&mut self.rng);
        }

        let score_of = |m: &Move| scores.get(m).copied().unwrap_or(0.0);
        let best = candidates
            .iter()
            .copied()
            .reduce(|best, m| if score_of(m) > score_of(best) { m } else { best })?
            .clone();

        let mut refined = vec![best.clone()];
        refined.extend(sorted.iter().filter(|m| **m != best).cloned());
        Some(refined)
    }

    /// Robber moves ordered by damage to opponents (highest first)
    fn rank_robber_moves(&self, game: &GameState, moves: &[Move]) -> Vec<Move> {
        let mut scored: Vec<(Move, i32)> = moves
            .iter()
            .map(|m| {
                let score = match m {
                    Move::DismissRobber { hex, victim } => {
                        self.score_robber_spot(game, hex) + i32::from(victim.is_some())
                    }
                    _ => i32::MIN,
                };
                (m.clone(), score)
            })
            .collect();
        scored.sort_by(|a, b| b.1.cmp(&a.1));
        scored.into_iter().map(|(m, _)| m).collect()
    }

    /// Score robber placement
    fn score_robber_spot(&self, game: &GameState, hex: &HexCoord) -> i32 {
        let Some(tile) = game.board.get_hex(hex) else {
            return -100;
        };

        // Prefer high-value tiles
        let mut score = tile.token.map(pip_value).unwrap_or(0) as i32 * 2;

        // Prefer tiles with opponent buildings, avoid our own
        for owner in game.board.players_adjacent_to_hex(hex) {
            if owner == self.player_id {
                score -= 20;
            } else {
                score += 5;
            }
        }

        score
    }
}
