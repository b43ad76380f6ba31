//! Hexisle - rules and decision core for a hex-island settlement game
//!
//! This crate provides the core game logic for Hexisle, including:
//! - Cube-coordinate geometry with canonical hex, vertex and edge ids
//! - Constrained board generation with number tokens and ports
//! - Placement, road and robber rules with specific rejection reasons
//! - Resource production, discarding and bank trading
//! - A staged turn state machine with atomic move application
//! - Legal move enumeration, coach heuristics and profile-driven bots
//!
//! # Architecture
//!
//! The engine is synchronous and owns no randomness: every random operation
//! takes an explicit `Rng`, so a seed reproduces a whole game. It compiles to:
//! - Native Rust for headless simulation
//! - WebAssembly (feature `wasm`) for browser hosts
//!
//! # Modules
//!
//! - [`hex`]: Coordinate system for hexes, vertices and edges
//! - [`board`]: Board representation with buildings and ports
//! - [`generator`]: Random board generation
//! - [`rules`]: Placement validation and legal spot queries
//! - [`mechanics`]: Production, discards and trade rates
//! - [`game`]: Game state machine
//! - [`enumerator`]: Legal move lists per stage
//! - [`coach`]: Heuristic scoring and advice
//! - [`bot`]: AI players

pub mod actions;
pub mod board;
pub mod bot;
pub mod coach;
pub mod enumerator;
pub mod game;
pub mod generator;
pub mod hex;
pub mod mechanics;
pub mod player;
pub mod rules;
#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use actions::{GameEvent, Move, MoveKind};
pub use board::{Board, EdgeBuilding, Hex, PlayerId, Port, PortKind, Resource, Terrain, VertexBuilding};
pub use bot::{Bot, BotProfile};
pub use coach::{calculate_board_stats, calculate_player_potential_pips, BoardStats, Coach, CoachConfig};
pub use enumerator::{enumerate, EnumerationError, MoveEnumerator, StageTable};
pub use game::{GameConfig, GameError, GamePhase, GameState, RollStatus, SetupError, Stage};
pub use generator::{generate_board, GenerationReport};
pub use hex::{CoordError, EdgeCoord, HexCoord, VertexCoord};
pub use mechanics::{ExchangeRates, TradeOffer};
pub use player::{Player, PlayerColor, ResourceHand};
pub use rules::{BuildKind, RuleViolation};
