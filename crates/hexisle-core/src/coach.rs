//! Heuristic analysis used by bots and hint overlays.
//!
//! The coach reads a [`GameState`] and never mutates it:
//! - Board statistics (pips per resource, fairness, warnings)
//! - Vertex scores from pips, scarcity, diversity and economic need
//! - Road recommendations from a bounded search toward open spots and ports
//! - Stage-aware strategic advice and bank trade safety

use crate::actions::{Move, MoveKind};
use crate::board::{Board, PlayerId, PortKind, Resource};
use crate::game::{GameState, Stage};
use crate::hex::{EdgeCoord, VertexCoord};
use crate::mechanics::{calculate_trade, exchange_rates, pip_value};
use crate::rules;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

/// Share of board pips below which a resource counts as scarce
pub const SCARCITY_THRESHOLD: f64 = 0.10;
/// Share of board pips above which a resource counts as abundant
pub const ABUNDANCE_THRESHOLD: f64 = 0.30;
const SCARCITY_PENALTY: i32 = 20;
const ABUNDANCE_PENALTY: i32 = 10;

/// Trading ore away at or below this count is considered unsafe
pub const ORE_RESERVE_THRESHOLD: u32 = 6;

const EARLY_GAME_VP: u32 = 5;
const MID_GAME_VP: u32 = 7;
const VERTEX_SCORE_NORMALIZATION: f64 = 5.0;
const ADVISED_MOVE_MULTIPLIER: f64 = 1.5;

/// Road segments looked ahead when scoring a road
pub const ROAD_SEARCH_DEPTH: u32 = 6;
const GENERIC_PORT_MULTIPLIER: f64 = 0.5;
const SPECIFIC_PORT_MULTIPLIER: f64 = 2.0;

pub const ADVICE_SETUP_SETTLEMENT: &str =
    "Focus on high-pip spots with diverse resources (Wood/Brick for roads, Ore/Wheat for cities).";
pub const ADVICE_SETUP_ROAD: &str = "Point your road toward future expansion spots or the coast.";
pub const ADVICE_EARLY: &str =
    "Early Game: Focus on expansion. Prioritize Wood and Brick to build new settlements and roads.";
pub const ADVICE_MID: &str =
    "Mid Game: Consolidate power. Upgrade settlements to cities (Ore/Wheat) and block opponents.";
pub const ADVICE_LATE: &str =
    "Late Game: Push for victory! Buy Development Cards for VPs/Knights or connect roads for Longest Road.";
pub const ADVICE_DEFAULT: &str = "Observe the board and plan your next move.";
pub const ADVICE_INVALID_PLAYER: &str = "Invalid player ID.";

// ==================== Board Statistics ====================

/// Pip distribution of a board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardStats {
    /// Pips per resource (every resource present, zero if absent)
    pub total_pips: BTreeMap<Resource, u32>,
    pub total_board_pips: u32,
    /// 0..=100, higher is more balanced
    pub fairness_score: u32,
    pub warnings: Vec<String>,
}

impl Default for BoardStats {
    fn default() -> Self {
        Self {
            total_pips: Resource::ALL.iter().map(|r| (*r, 0)).collect(),
            total_board_pips: 0,
            fairness_score: 0,
            warnings: Vec::new(),
        }
    }
}

impl BoardStats {
    /// Share of board pips a resource holds
    pub fn share(&self, resource: Resource) -> f64 {
        if self.total_board_pips == 0 {
            return 0.0;
        }
        self.total_pips.get(&resource).copied().unwrap_or(0) as f64 / self.total_board_pips as f64
    }
}

/// Sum pips per resource and rate how evenly they are spread
pub fn calculate_board_stats(board: &Board) -> BoardStats {
    let mut stats = BoardStats::default();

    for hex in board.land_hexes() {
        let (Some(resource), Some(token)) = (hex.resource(), hex.token) else {
            continue;
        };
        let pips = pip_value(token);
        *stats.total_pips.entry(resource).or_default() += pips;
        stats.total_board_pips += pips;
    }

    if stats.total_board_pips == 0 {
        stats.warnings.push("No pips detected on board.".to_string());
        return stats;
    }

    let mut fairness = 100;
    for resource in Resource::ALL {
        let share = stats.share(resource);
        let percent = (share * 100.0).round() as u32;
        if share < SCARCITY_THRESHOLD {
            stats.warnings.push(format!("{resource} Scarcity detected ({percent}%)"));
            fairness -= SCARCITY_PENALTY;
        } else if share > ABUNDANCE_THRESHOLD {
            stats.warnings.push(format!("{resource} Abundance detected ({percent}%)"));
            fairness -= ABUNDANCE_PENALTY;
        }
    }
    stats.fairness_score = fairness.max(0) as u32;
    stats
}

/// Pips each player collects per resource (cities count double)
pub fn calculate_player_potential_pips(state: &GameState) -> BTreeMap<PlayerId, BTreeMap<Resource, u32>> {
    let mut result: BTreeMap<PlayerId, BTreeMap<Resource, u32>> = state
        .players
        .iter()
        .map(|p| (p.id, Resource::ALL.iter().map(|r| (*r, 0)).collect()))
        .collect();

    for (vertex, building) in state.board.buildings() {
        let Some(owner) = building.owner() else {
            continue;
        };
        let Some(pips) = result.get_mut(&owner) else {
            continue;
        };
        for hex in state.board.hexes_at_vertex(vertex) {
            if let (Some(resource), Some(token)) = (hex.resource(), hex.token) {
                *pips.entry(resource).or_default() += pip_value(token) * building.resource_multiplier();
            }
        }
    }

    result
}

// ==================== Coach Types ====================

/// Weights for vertex scoring
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoachConfig {
    pub scarcity_threshold: f64,
    pub scarcity_multiplier: f64,
    pub diversity_multiplier: f64,
    pub synergy_bonus: f64,
    pub need_bonus: f64,
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            scarcity_threshold: SCARCITY_THRESHOLD,
            scarcity_multiplier: 1.2,
            diversity_multiplier: 1.2,
            synergy_bonus: 2.0,
            need_bonus: 5.0,
        }
    }
}

/// Which bonuses contributed to a vertex score
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreDetails {
    pub pips: u32,
    pub scarcity_bonus: bool,
    pub scarce_resources: Vec<Resource>,
    pub diversity_bonus: bool,
    pub synergy_bonus: bool,
    pub needed_resources: Vec<Resource>,
}

/// A scored placement target with a human-readable reason
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation<T> {
    pub target: T,
    pub score: f64,
    pub reason: String,
    pub details: ScoreDetails,
}

/// Stage-aware hint text and the move kinds it favours
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategicAdvice {
    pub text: String,
    pub recommended_moves: Vec<MoveKind>,
}

impl StrategicAdvice {
    fn new(text: &str, recommended_moves: &[MoveKind]) -> Self {
        Self {
            text: text.to_string(),
            recommended_moves: recommended_moves.to_vec(),
        }
    }
}

/// Verdict on the bank trade a player would make
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeAdvice {
    pub is_safe: bool,
    pub reason: Option<String>,
}

impl TradeAdvice {
    fn unsafe_because(reason: &str) -> Self {
        Self {
            is_safe: false,
            reason: Some(reason.to_string()),
        }
    }
}

/// Per-player inputs shared by every vertex scored in one query
struct ScoringContext {
    scarce: BTreeSet<Resource>,
    existing: BTreeSet<Resource>,
    building_count: usize,
}

fn round_tenth(score: f64) -> f64 {
    (score * 10.0).round() / 10.0
}

/// Per-hop multiplier for road targets: more aggressive bots look further
pub fn road_decay_factor(aggressiveness: f64) -> f64 {
    0.7 + aggressiveness * 0.25
}

// ==================== Coach ====================

/// Read-only advisor over one game state
pub struct Coach<'a> {
    state: &'a GameState,
    config: CoachConfig,
}

impl<'a> Coach<'a> {
    pub fn new(state: &'a GameState) -> Self {
        Self::with_config(state, CoachConfig::default())
    }

    pub fn with_config(state: &'a GameState, config: CoachConfig) -> Self {
        Self { state, config }
    }

    pub fn config(&self) -> &CoachConfig {
        &self.config
    }

    fn scarce_resources(&self) -> BTreeSet<Resource> {
        let stats = &self.state.board_stats;
        if stats.total_board_pips == 0 {
            return BTreeSet::new();
        }
        Resource::ALL
            .into_iter()
            .filter(|r| stats.share(*r) < self.config.scarcity_threshold)
            .collect()
    }

    fn vertex_resources(&self, vertex: &VertexCoord) -> (Vec<Resource>, u32) {
        let mut resources = Vec::new();
        let mut pips = 0;
        for hex in self.state.board.hexes_at_vertex(vertex) {
            if let Some(resource) = hex.resource() {
                resources.push(resource);
                pips += hex.token.map(pip_value).unwrap_or(0);
            }
        }
        (resources, pips)
    }

    fn scoring_context(&self, player: PlayerId) -> Option<ScoringContext> {
        let p = self.state.get_player(player)?;
        let existing = p
            .settlements
            .iter()
            .chain(&p.cities)
            .flat_map(|v| self.vertex_resources(v).0)
            .collect();
        Some(ScoringContext {
            scarce: self.scarce_resources(),
            existing,
            building_count: p.building_count(),
        })
    }

    /// Score a vertex as a settlement spot for a player. `None` for unknown players.
    pub fn score_vertex(&self, vertex: &VertexCoord, player: PlayerId) -> Option<Recommendation<VertexCoord>> {
        let ctx = self.scoring_context(player)?;
        Some(self.score_vertex_with(vertex, &ctx))
    }

    fn score_vertex_with(&self, vertex: &VertexCoord, ctx: &ScoringContext) -> Recommendation<VertexCoord> {
        let (resources, pips) = self.vertex_resources(vertex);
        let unique: BTreeSet<Resource> = resources.iter().copied().collect();

        let mut score = pips as f64;
        let mut reasons = vec![format!("{pips} Pips")];
        let mut details = ScoreDetails {
            pips,
            ..Default::default()
        };

        details.scarce_resources = unique.intersection(&ctx.scarce).copied().collect();
        if !details.scarce_resources.is_empty() {
            details.scarcity_bonus = true;
            score *= self.config.scarcity_multiplier;
            reasons.push("Scarcity Bonus".to_string());
        }

        if unique.len() == 3 && resources.len() == 3 {
            details.diversity_bonus = true;
            score *= self.config.diversity_multiplier;
            reasons.push("Diversity Bonus".to_string());
        }

        if ctx.building_count == 0 {
            let has = |r| unique.contains(&r);
            if (has(Resource::Wood) && has(Resource::Brick)) || (has(Resource::Ore) && has(Resource::Wheat)) {
                details.synergy_bonus = true;
                score += self.config.synergy_bonus;
                reasons.push("Synergy".to_string());
            }
        } else {
            let needed: Vec<Resource> = unique.difference(&ctx.existing).copied().collect();
            if !needed.is_empty() {
                score += self.config.need_bonus * needed.len() as f64;
                let names: Vec<&str> = needed.iter().map(|r| r.name()).collect();
                reasons.push(format!("Balances Economy (Added {})", names.join(", ")));
                details.needed_resources = needed;
            }
        }

        Recommendation {
            target: *vertex,
            score: round_tenth(score),
            reason: reasons.join(", "),
            details,
        }
    }

    /// Scores for every open setup spot, in board order. Empty unless it is the player's turn.
    pub fn all_settlement_scores(&self, player: PlayerId) -> Vec<Recommendation<VertexCoord>> {
        if player != self.state.current_player {
            return Vec::new();
        }
        let Some(ctx) = self.scoring_context(player) else {
            return Vec::new();
        };
        rules::valid_setup_settlement_spots(&self.state.board)
            .iter()
            .map(|v| self.score_vertex_with(v, &ctx))
            .collect()
    }

    /// The three best open settlement spots, best first
    pub fn best_settlement_spots(&self, player: PlayerId) -> Vec<Recommendation<VertexCoord>> {
        let mut scores = self.all_settlement_scores(player);
        sort_by_score(&mut scores);
        scores.truncate(3);
        scores
    }

    /// Score candidate city upgrades, best first
    pub fn best_city_spots(&self, player: PlayerId, candidates: &[VertexCoord]) -> Vec<Recommendation<VertexCoord>> {
        if player != self.state.current_player {
            return Vec::new();
        }
        let Some(ctx) = self.scoring_context(player) else {
            return Vec::new();
        };
        let mut scores: Vec<_> = candidates.iter().map(|v| self.score_vertex_with(v, &ctx)).collect();
        sort_by_score(&mut scores);
        scores
    }

    /// Score candidate roads by the best spot or port they lead to, best first.
    ///
    /// Roads that lead nowhere useful are left out.
    pub fn best_road_spots(
        &self,
        player: PlayerId,
        candidates: &[EdgeCoord],
        aggressiveness: f64,
    ) -> Vec<Recommendation<EdgeCoord>> {
        let Some(ctx) = self.scoring_context(player) else {
            return Vec::new();
        };
        let production = calculate_player_potential_pips(self.state)
            .remove(&player)
            .unwrap_or_default();
        let decay = road_decay_factor(aggressiveness);

        let mut recommendations: Vec<_> = candidates
            .iter()
            .filter_map(|edge| {
                let (score, reason) = self.best_road_target(edge, player, &ctx, &production, decay);
                (score > 0.0).then(|| Recommendation {
                    target: *edge,
                    score,
                    reason,
                    details: ScoreDetails::default(),
                })
            })
            .collect();
        sort_by_score(&mut recommendations);
        recommendations
    }

    /// Breadth-first walk over empty edges from a candidate road
    fn best_road_target(
        &self,
        start: &EdgeCoord,
        player: PlayerId,
        ctx: &ScoringContext,
        production: &BTreeMap<Resource, u32>,
        decay: f64,
    ) -> (f64, String) {
        let board = &self.state.board;
        let mut best = 0.0;
        let mut best_reason = String::new();

        let mut queue: VecDeque<(VertexCoord, u32)> = VecDeque::new();
        let mut visited: HashSet<VertexCoord> = HashSet::new();
        for v in start.endpoints() {
            visited.insert(v);
            queue.push_back((v, 1));
        }

        while let Some((vertex, hops)) = queue.pop_front() {
            let owner = board.get_vertex(&vertex).owner();
            if owner.is_some_and(|o| o != player) {
                continue;
            }

            if owner.is_none() {
                let factor = decay.powi(hops as i32 - 1);
                let mut consider = |raw: f64, reason: &str| {
                    let decayed = raw * factor;
                    if decayed > best {
                        best = decayed;
                        let plural = if hops > 1 { "s" } else { "" };
                        best_reason = format!("{reason} ({hops} hop{plural})");
                    }
                };

                if let Some(port) = board.port_for_vertex(&vertex) {
                    match port.kind {
                        PortKind::Generic => {
                            let total: u32 = production.values().sum();
                            consider(total as f64 * GENERIC_PORT_MULTIPLIER, "Leads to 3:1 Port");
                        }
                        PortKind::Specific(resource) => {
                            let prod = production.get(&resource).copied().unwrap_or(0);
                            if prod > 0 {
                                consider(
                                    prod as f64 * SPECIFIC_PORT_MULTIPLIER,
                                    &format!("Leads to {resource} Port"),
                                );
                            }
                        }
                    }
                }

                if rules::validate_settlement_location(board, &vertex).is_ok() {
                    let rec = self.score_vertex_with(&vertex, ctx);
                    if rec.score > 0.0 {
                        consider(rec.score, &rec.reason);
                    }
                }
            }

            if hops >= ROAD_SEARCH_DEPTH {
                continue;
            }
            for edge in vertex.touching_edges() {
                if edge == *start || !board.is_land_edge(&edge) || board.get_edge(&edge).owner().is_some() {
                    continue;
                }
                let Some(next) = edge.endpoints().into_iter().find(|v| *v != vertex) else {
                    continue;
                };
                if visited.insert(next) {
                    queue.push_back((next, hops + 1));
                }
            }
        }

        (best, best_reason)
    }

    /// Hint text for the player's current stage
    pub fn strategic_advice(&self, player: PlayerId) -> StrategicAdvice {
        let Some(p) = self.state.get_player(player) else {
            return StrategicAdvice::new(ADVICE_INVALID_PLAYER, &[]);
        };
        let Some(stage) = self.state.active_stage(player) else {
            return StrategicAdvice::new(ADVICE_INVALID_PLAYER, &[]);
        };

        match stage {
            Stage::PlaceSettlement => StrategicAdvice::new(ADVICE_SETUP_SETTLEMENT, &[]),
            Stage::PlaceRoad => StrategicAdvice::new(ADVICE_SETUP_ROAD, &[]),
            Stage::Rolling | Stage::Acting => {
                if p.victory_points < EARLY_GAME_VP {
                    StrategicAdvice::new(ADVICE_EARLY, &[MoveKind::BuildRoad, MoveKind::BuildSettlement])
                } else if p.victory_points <= MID_GAME_VP {
                    StrategicAdvice::new(ADVICE_MID, &[MoveKind::BuildCity])
                } else {
                    StrategicAdvice::new(ADVICE_LATE, &[MoveKind::BuildRoad])
                }
            }
            Stage::Robber => StrategicAdvice::new(ADVICE_DEFAULT, &[]),
        }
    }

    /// Whether the bank trade the player would make keeps their economy intact
    pub fn evaluate_trade(&self, player: PlayerId) -> TradeAdvice {
        let Some(p) = self.state.get_player(player) else {
            return TradeAdvice::unsafe_because("Invalid Player");
        };

        let offer = calculate_trade(&p.resources, &exchange_rates(&self.state.board, player));
        if !offer.can_trade {
            return TradeAdvice::unsafe_because("Cannot Afford Trade");
        }
        if offer.give == Resource::Ore && p.resources.ore <= ORE_RESERVE_THRESHOLD {
            return TradeAdvice::unsafe_because("Ore Reserve Low");
        }

        TradeAdvice {
            is_safe: true,
            reason: None,
        }
    }

    /// Multiplier expressing how much the coach likes a move
    pub fn score_action(&self, player: PlayerId, mv: &Move) -> f64 {
        let advice = self.strategic_advice(player);
        let mut score = 1.0;

        if advice.recommended_moves.contains(&mv.kind()) {
            score *= ADVISED_MOVE_MULTIPLIER;
        }

        if let Move::PlaceSettlement(vertex) | Move::BuildSettlement(vertex) = mv {
            if let Some(rec) = self.score_vertex(vertex, player) {
                score *= 1.0 + rec.score / VERTEX_SCORE_NORMALIZATION;
            }
        }

        score
    }
}

/// Descending by score; equal scores keep their input order
fn sort_by_score<T>(recommendations: &mut [Recommendation<T>]) {
    recommendations.sort_by(|a, b| b.score.total_cmp(&a.score));
}
