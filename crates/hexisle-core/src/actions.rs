//! Moves that players can submit.
//!
//! This module defines every move in the game, the argument-free move kinds
//! used by stage tables, and the events that result from applying a move.

use crate::board::{PlayerId, Resource};
use crate::game::GameError;
use crate::hex::{EdgeCoord, HexCoord, VertexCoord};
use crate::player::ResourceHand;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// All possible moves a player can make.
///
/// Serializes as `{"move": "<name>", "args": ...}` using the host-facing move names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "move", content = "args", rename_all = "camelCase")]
pub enum Move {
    // ==================== Setup Phase ====================
    /// Place a free settlement during setup
    PlaceSettlement(VertexCoord),
    /// Place a free road touching the settlement just placed
    PlaceRoad(EdgeCoord),
    /// Reroll the board before anyone has placed a piece
    RegenerateBoard,

    // ==================== Rolling ====================
    /// Roll the dice (must be done at start of turn)
    RollDice,
    /// Apply the outcome of a roll that was left pending
    ResolveRoll,

    // ==================== Acting ====================
    /// Build a road at an edge
    BuildRoad(EdgeCoord),
    /// Build a settlement at a vertex
    BuildSettlement(VertexCoord),
    /// Upgrade a settlement to a city
    BuildCity(VertexCoord),
    /// Trade with the bank at the player's best rate for `give`
    TradeBank { give: Resource, receive: Resource },
    /// End your turn
    EndTurn,

    // ==================== Robber ====================
    /// Move the robber and optionally steal from a player on the new hex
    DismissRobber {
        hex: HexCoord,
        victim: Option<PlayerId>,
    },
}

impl Move {
    /// The argument-free kind of this move
    pub fn kind(&self) -> MoveKind {
        match self {
            Move::PlaceSettlement(_) => MoveKind::PlaceSettlement,
            Move::PlaceRoad(_) => MoveKind::PlaceRoad,
            Move::RegenerateBoard => MoveKind::RegenerateBoard,
            Move::RollDice => MoveKind::RollDice,
            Move::ResolveRoll => MoveKind::ResolveRoll,
            Move::BuildRoad(_) => MoveKind::BuildRoad,
            Move::BuildSettlement(_) => MoveKind::BuildSettlement,
            Move::BuildCity(_) => MoveKind::BuildCity,
            Move::TradeBank { .. } => MoveKind::TradeBank,
            Move::EndTurn => MoveKind::EndTurn,
            Move::DismissRobber { .. } => MoveKind::DismissRobber,
        }
    }

    /// The host-facing move name
    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Build a move from its host-facing name and string arguments.
    ///
    /// Ids are parsed strictly; malformed ids are rejected, never coerced.
    pub fn parse(name: &str, args: &[&str]) -> Result<Move, GameError> {
        let kind: MoveKind = name
            .parse()
            .map_err(|_| GameError::UnknownMove(name.chars().take(32).collect()))?;
        let wrong_args = || GameError::InvalidArguments(kind);

        let mv = match (kind, args) {
            (MoveKind::PlaceSettlement, [v]) => Move::PlaceSettlement(v.parse()?),
            (MoveKind::PlaceRoad, [e]) => Move::PlaceRoad(e.parse()?),
            (MoveKind::BuildSettlement, [v]) => Move::BuildSettlement(v.parse()?),
            (MoveKind::BuildCity, [v]) => Move::BuildCity(v.parse()?),
            (MoveKind::BuildRoad, [e]) => Move::BuildRoad(e.parse()?),
            (MoveKind::TradeBank, [give, receive]) => Move::TradeBank {
                give: give.parse().map_err(|_| wrong_args())?,
                receive: receive.parse().map_err(|_| wrong_args())?,
            },
            (MoveKind::DismissRobber, [hex]) => Move::DismissRobber {
                hex: hex.parse()?,
                victim: None,
            },
            (MoveKind::DismissRobber, [hex, victim]) => Move::DismissRobber {
                hex: hex.parse()?,
                victim: Some(victim.parse().map_err(|_| wrong_args())?),
            },
            (kind, []) => kind.without_args().ok_or_else(wrong_args)?,
            _ => return Err(wrong_args()),
        };
        Ok(mv)
    }

    /// The vertex a settlement or city move targets
    pub fn vertex(&self) -> Option<&VertexCoord> {
        match self {
            Move::PlaceSettlement(v) | Move::BuildSettlement(v) | Move::BuildCity(v) => Some(v),
            _ => None,
        }
    }

    /// The edge a road move targets
    pub fn edge(&self) -> Option<&EdgeCoord> {
        match self {
            Move::PlaceRoad(e) | Move::BuildRoad(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Move::PlaceSettlement(v) | Move::BuildSettlement(v) | Move::BuildCity(v) => {
                write!(f, "{}({v})", self.name())
            }
            Move::PlaceRoad(e) | Move::BuildRoad(e) => write!(f, "{}({e})", self.name()),
            Move::TradeBank { give, receive } => write!(f, "{}({give}, {receive})", self.name()),
            Move::DismissRobber { hex, victim: Some(v) } => {
                write!(f, "{}({hex}, {v})", self.name())
            }
            Move::DismissRobber { hex, victim: None } => write!(f, "{}({hex})", self.name()),
            _ => f.write_str(self.name()),
        }
    }
}

/// A move name without arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MoveKind {
    PlaceSettlement,
    PlaceRoad,
    RegenerateBoard,
    RollDice,
    ResolveRoll,
    BuildRoad,
    BuildSettlement,
    BuildCity,
    TradeBank,
    EndTurn,
    DismissRobber,
}

impl MoveKind {
    pub const ALL: [MoveKind; 11] = [
        MoveKind::PlaceSettlement,
        MoveKind::PlaceRoad,
        MoveKind::RegenerateBoard,
        MoveKind::RollDice,
        MoveKind::ResolveRoll,
        MoveKind::BuildRoad,
        MoveKind::BuildSettlement,
        MoveKind::BuildCity,
        MoveKind::TradeBank,
        MoveKind::EndTurn,
        MoveKind::DismissRobber,
    ];

    /// The host-facing move name
    pub fn name(&self) -> &'static str {
        match self {
            MoveKind::PlaceSettlement => "placeSettlement",
            MoveKind::PlaceRoad => "placeRoad",
            MoveKind::RegenerateBoard => "regenerateBoard",
            MoveKind::RollDice => "rollDice",
            MoveKind::ResolveRoll => "resolveRoll",
            MoveKind::BuildRoad => "buildRoad",
            MoveKind::BuildSettlement => "buildSettlement",
            MoveKind::BuildCity => "buildCity",
            MoveKind::TradeBank => "tradeBank",
            MoveKind::EndTurn => "endTurn",
            MoveKind::DismissRobber => "dismissRobber",
        }
    }

    /// The move itself, when this kind takes no arguments
    pub fn without_args(&self) -> Option<Move> {
        match self {
            MoveKind::RegenerateBoard => Some(Move::RegenerateBoard),
            MoveKind::RollDice => Some(Move::RollDice),
            MoveKind::ResolveRoll => Some(Move::ResolveRoll),
            MoveKind::EndTurn => Some(Move::EndTurn),
            _ => None,
        }
    }
}

impl fmt::Display for MoveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MoveKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MoveKind::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| format!("unknown move: {s}"))
    }
}

/// Events that occur as a result of moves
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A settlement was placed or built
    SettlementBuilt {
        player: PlayerId,
        location: VertexCoord,
    },

    /// A settlement was upgraded to a city
    CityBuilt {
        player: PlayerId,
        location: VertexCoord,
    },

    /// A road was placed or built
    RoadBuilt {
        player: PlayerId,
        location: EdgeCoord,
    },

    /// A second setup settlement paid out its neighbouring hexes
    StartingResources {
        player: PlayerId,
        resources: ResourceHand,
    },

    /// Setup is over and the first turn begins
    SetupCompleted { first_player: PlayerId },

    /// The board was regenerated before play
    BoardRegenerated,

    /// Dice were rolled
    DiceRolled {
        player: PlayerId,
        roll: (u8, u8),
        total: u8,
    },

    /// Resources were distributed after a dice roll
    ResourcesDistributed {
        rewards: BTreeMap<PlayerId, ResourceHand>,
    },

    /// Player had to discard cards
    CardsDiscarded { player: PlayerId, count: u32 },

    /// The robber was moved
    RobberMoved {
        player: PlayerId,
        from: HexCoord,
        to: HexCoord,
    },

    /// A resource was stolen
    ResourceStolen {
        thief: PlayerId,
        victim: PlayerId,
        resource: Option<Resource>,
    },

    /// Bank or port trade completed
    BankTradeCompleted {
        player: PlayerId,
        gave: Resource,
        gave_count: u32,
        received: Resource,
    },

    /// Turn ended
    TurnEnded {
        player: PlayerId,
        next_player: PlayerId,
    },

    /// A player won the game
    GameWon {
        player: PlayerId,
        victory_points: u32,
    },

    /// The turn limit was exceeded without a winner
    GameDrawn { turn: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_move_json_shape() {
        let edge = EdgeCoord::new(HexCoord::new(0, 0), HexCoord::new(0, 1)).unwrap();
        let value = serde_json::to_value(Move::BuildRoad(edge)).unwrap();
        assert_eq!(value, json!({"move": "buildRoad", "args": "0,0,0::0,1,-1"}));

        let value = serde_json::to_value(Move::EndTurn).unwrap();
        assert_eq!(value, json!({"move": "endTurn"}));

        let value = serde_json::to_value(Move::DismissRobber {
            hex: HexCoord::new(1, -1),
            victim: Some(2),
        })
        .unwrap();
        assert_eq!(
            value,
            json!({"move": "dismissRobber", "args": {"hex": "1,-1,0", "victim": 2}})
        );
    }

    #[test]
    fn test_move_parses_from_host_json() {
        let parsed: Move = serde_json::from_value(json!({
            "move": "tradeBank",
            "args": {"give": "ore", "receive": "wood"}
        }))
        .unwrap();
        assert_eq!(
            parsed,
            Move::TradeBank {
                give: Resource::Ore,
                receive: Resource::Wood
            }
        );

        let bad = serde_json::from_value::<Move>(json!({
            "move": "buildCity",
            "args": "0,0,0::not,a,hex"
        }));
        assert!(bad.is_err());
    }

    #[test]
    fn test_parse_from_name_and_args() {
        assert_eq!(
            Move::parse("buildCity", &["0,0,0::1,-1,0::1,0,-1"]),
            Ok(Move::BuildCity(
                "0,0,0::1,-1,0::1,0,-1".parse().unwrap()
            ))
        );
        assert_eq!(Move::parse("endTurn", &[]), Ok(Move::EndTurn));
        assert_eq!(
            Move::parse("dismissRobber", &["1,-1,0", "2"]),
            Ok(Move::DismissRobber {
                hex: HexCoord::new(1, -1),
                victim: Some(2)
            })
        );
        assert_eq!(
            Move::parse("tradeBank", &["wood", "ore"]),
            Ok(Move::TradeBank {
                give: Resource::Wood,
                receive: Resource::Ore
            })
        );
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!(
            Move::parse("fly", &[]),
            Err(GameError::UnknownMove("fly".into()))
        );
        assert_eq!(
            Move::parse("buildRoad", &[]),
            Err(GameError::InvalidArguments(MoveKind::BuildRoad))
        );
        assert_eq!(
            Move::parse("buildRoad", &["0,0,0::5,5,-10"]),
            Err(GameError::InvalidInput(crate::hex::CoordError::NotAdjacent))
        );
        assert_eq!(
            Move::parse("placeSettlement", &["1,2,3::0,0,0::0,1,-1"]),
            Err(GameError::InvalidInput(crate::hex::CoordError::NotCube))
        );
        assert_eq!(
            Move::parse("endTurn", &["extra"]),
            Err(GameError::InvalidArguments(MoveKind::EndTurn))
        );
    }

    #[test]
    fn test_move_kind_names() {
        for kind in MoveKind::ALL {
            assert_eq!(kind.name().parse::<MoveKind>(), Ok(kind));
        }
        assert!("teleport".parse::<MoveKind>().is_err());
        assert_eq!(Move::ResolveRoll.kind(), MoveKind::ResolveRoll);
        assert_eq!(MoveKind::EndTurn.without_args(), Some(Move::EndTurn));
        assert_eq!(MoveKind::BuildRoad.without_args(), None);
    }
}
