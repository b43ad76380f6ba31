//! Placement legality.
//!
//! Every `validate_*` function returns the precise [`RuleViolation`] that blocks
//! a placement; every `valid_*` function lists the targets that pass. The state
//! machine and the move enumerator both go through these, so a move that is
//! enumerated is always accepted.

use crate::board::{Board, EdgeBuilding, PlayerId, Resource, VertexBuilding};
use crate::hex::{EdgeCoord, HexCoord, VertexCoord};
use crate::player::Player;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// Things a player can pay to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildKind {
    Road,
    Settlement,
    City,
}

impl BuildKind {
    /// Cost summary shown to players
    pub fn requirement(&self) -> &'static str {
        match self {
            BuildKind::Road => "Wood, Brick",
            BuildKind::Settlement => "Wood, Brick, Wheat, Sheep",
            BuildKind::City => "3 Ore, 2 Wheat",
        }
    }
}

impl fmt::Display for BuildKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BuildKind::Road => "road",
            BuildKind::Settlement => "settlement",
            BuildKind::City => "city",
        })
    }
}

/// Why a placement, build or robber move was refused
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum RuleViolation {
    #[error("Location is not on the island")]
    OffIsland,

    #[error("This vertex is already occupied")]
    VertexOccupied,

    #[error("Settlement is too close to another building")]
    TooClose,

    #[error("Settlement must connect to your own road")]
    SettlementNotConnected,

    #[error("No settlement exists at this location")]
    NoSettlement,

    #[error("Only settlements can be upgraded to cities")]
    AlreadyCity,

    #[error("You can only upgrade your own settlements")]
    NotYourSettlement,

    #[error("This edge is already occupied")]
    EdgeOccupied,

    #[error("Road must connect to your existing road or settlement")]
    RoadNotConnected,

    #[error("No active settlement found to connect to")]
    NoActiveSettlement,

    #[error("Road must connect to your just-placed settlement")]
    RoadNotAtSettlement,

    #[error("Not enough resources to build a {0} (requires {})", .0.requirement())]
    CannotAfford(BuildKind),

    #[error("Cannot trade {0} for itself")]
    SameResourceTrade(Resource),

    #[error("You need at least {rate} {resource} to trade")]
    CannotAffordTrade {
        resource: Resource,
        rate: u32,
    },

    #[error("Robber must move to a different hex")]
    RobberNotMoved,

    #[error("Robber can only be placed on a land hex")]
    RobberOffLand,

    #[error("Cannot steal from that player")]
    InvalidVictim,

    #[error("Board can only be regenerated before any piece is placed")]
    BoardLocked,
}

// ==================== Settlements ====================

/// Physical checks shared by setup and gameplay settlements: island, occupancy, distance
pub fn validate_settlement_location(board: &Board, vertex: &VertexCoord) -> Result<(), RuleViolation> {
    if !board.is_land_vertex(vertex) {
        return Err(RuleViolation::OffIsland);
    }
    if board.get_vertex(vertex) != VertexBuilding::Empty {
        return Err(RuleViolation::VertexOccupied);
    }
    if !board.satisfies_distance_rule(vertex) {
        return Err(RuleViolation::TooClose);
    }
    Ok(())
}

/// A gameplay settlement must additionally touch one of the player's roads
pub fn validate_settlement(
    board: &Board,
    player: PlayerId,
    vertex: &VertexCoord,
) -> Result<(), RuleViolation> {
    validate_settlement_location(board, vertex)?;
    let connected = vertex
        .touching_edges()
        .iter()
        .any(|e| board.get_edge(e).owner() == Some(player));
    if !connected {
        return Err(RuleViolation::SettlementNotConnected);
    }
    Ok(())
}

/// Only the owner's settlement can become a city
pub fn validate_city(board: &Board, player: PlayerId, vertex: &VertexCoord) -> Result<(), RuleViolation> {
    match board.get_vertex(vertex) {
        VertexBuilding::Empty => Err(RuleViolation::NoSettlement),
        VertexBuilding::City(_) => Err(RuleViolation::AlreadyCity),
        VertexBuilding::Settlement(owner) if owner != player => Err(RuleViolation::NotYourSettlement),
        VertexBuilding::Settlement(_) => Ok(()),
    }
}

/// Every legal setup settlement
pub fn valid_setup_settlement_spots(board: &Board) -> Vec<VertexCoord> {
    board
        .land_vertices()
        .into_iter()
        .filter(|v| validate_settlement_location(board, v).is_ok())
        .collect()
}

/// Every legal gameplay settlement for a player (ignores cost)
pub fn valid_settlement_spots(board: &Board, player: PlayerId) -> Vec<VertexCoord> {
    let candidates: BTreeSet<VertexCoord> = board
        .roads()
        .filter(|(_, road)| road.owner() == Some(player))
        .flat_map(|(edge, _)| edge.endpoints())
        .collect();
    candidates
        .into_iter()
        .filter(|v| validate_settlement(board, player, v).is_ok())
        .collect()
}

/// Every settlement the player could upgrade (ignores cost)
pub fn valid_city_spots(board: &Board, player: PlayerId) -> Vec<VertexCoord> {
    let mut spots: Vec<VertexCoord> = board
        .buildings()
        .filter(|(_, b)| **b == VertexBuilding::Settlement(player))
        .map(|(v, _)| *v)
        .collect();
    spots.sort();
    spots
}

// ==================== Roads ====================

/// A vertex lets a player's road network pass when it is theirs or empty with their road attached
fn road_continues_through(board: &Board, player: PlayerId, vertex: &VertexCoord, from: &EdgeCoord) -> bool {
    match board.get_vertex(vertex).owner() {
        Some(owner) => owner == player,
        None => vertex
            .touching_edges()
            .iter()
            .any(|e| e != from && board.get_edge(e).owner() == Some(player)),
    }
}

/// A gameplay road must touch the player's building, or their road through an unblocked vertex
pub fn validate_road(board: &Board, player: PlayerId, edge: &EdgeCoord) -> Result<(), RuleViolation> {
    if !board.is_land_edge(edge) {
        return Err(RuleViolation::OffIsland);
    }
    if board.get_edge(edge) != EdgeBuilding::Empty {
        return Err(RuleViolation::EdgeOccupied);
    }
    let connected = edge
        .endpoints()
        .iter()
        .any(|v| road_continues_through(board, player, v, edge));
    if !connected {
        return Err(RuleViolation::RoadNotConnected);
    }
    Ok(())
}

/// A setup road must touch the settlement placed just before it
pub fn validate_setup_road(
    board: &Board,
    edge: &EdgeCoord,
    last_settlement: Option<&VertexCoord>,
) -> Result<(), RuleViolation> {
    if !board.is_land_edge(edge) {
        return Err(RuleViolation::OffIsland);
    }
    if board.get_edge(edge) != EdgeBuilding::Empty {
        return Err(RuleViolation::EdgeOccupied);
    }
    let settlement = last_settlement.ok_or(RuleViolation::NoActiveSettlement)?;
    if !settlement.touching_edges().contains(edge) {
        return Err(RuleViolation::RoadNotAtSettlement);
    }
    Ok(())
}

/// Every legal setup road next to the given settlement
pub fn valid_setup_road_spots(board: &Board, last_settlement: Option<&VertexCoord>) -> Vec<EdgeCoord> {
    let Some(settlement) = last_settlement else {
        return Vec::new();
    };
    settlement
        .touching_edges()
        .into_iter()
        .filter(|e| validate_setup_road(board, e, Some(settlement)).is_ok())
        .collect()
}

/// Every legal gameplay road for a player (ignores cost)
pub fn valid_road_spots(board: &Board, player: PlayerId) -> Vec<EdgeCoord> {
    let mut frontier: BTreeSet<VertexCoord> = board
        .roads()
        .filter(|(_, r)| r.owner() == Some(player))
        .flat_map(|(e, _)| e.endpoints())
        .collect();
    frontier.extend(
        board
            .buildings()
            .filter(|(_, b)| b.owner() == Some(player))
            .map(|(v, _)| *v),
    );

    let candidates: BTreeSet<EdgeCoord> = frontier
        .iter()
        .flat_map(|v| v.touching_edges())
        .collect();
    candidates
        .into_iter()
        .filter(|e| validate_road(board, player, e).is_ok())
        .collect()
}

// ==================== Robber ====================

/// The robber must land on a different land hex
pub fn validate_robber(board: &Board, robber: &HexCoord, target: &HexCoord) -> Result<(), RuleViolation> {
    if target == robber {
        return Err(RuleViolation::RobberNotMoved);
    }
    if !board.is_land_hex(target) {
        return Err(RuleViolation::RobberOffLand);
    }
    Ok(())
}

/// Every hex the robber can move to
pub fn valid_robber_spots(board: &Board, robber: &HexCoord) -> Vec<HexCoord> {
    let mut spots: Vec<HexCoord> = board
        .land_hexes()
        .map(|h| h.coord)
        .filter(|c| c != robber)
        .collect();
    spots.sort();
    spots
}

/// Opponents with a building on the hex and at least one card
pub fn robber_victims(board: &Board, players: &[Player], hex: &HexCoord, thief: PlayerId) -> Vec<PlayerId> {
    board
        .players_adjacent_to_hex(hex)
        .into_iter()
        .filter(|p| *p != thief)
        .filter(|p| {
            players
                .get(*p as usize)
                .is_some_and(|victim| !victim.resources.is_empty())
        })
        .collect()
}

/// Validate a full robber move including the optional steal target
pub fn validate_robber_move(
    board: &Board,
    players: &[Player],
    robber: &HexCoord,
    target: &HexCoord,
    thief: PlayerId,
    victim: Option<PlayerId>,
) -> Result<(), RuleViolation> {
    validate_robber(board, robber, target)?;
    if let Some(victim) = victim {
        if !robber_victims(board, players, target, thief).contains(&victim) {
            return Err(RuleViolation::InvalidVictim);
        }
    }
    Ok(())
}
