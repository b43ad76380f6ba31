//! Game board representation including hexes, buildings, and ports.
//!
//! This module contains:
//! - Resource and terrain types
//! - The hex map (land plus the surrounding sea ring)
//! - Building types (settlements, cities, roads)
//! - Trade ports
//! - Board query and mutation methods
//!
//! Legality of a placement is decided in [`crate::rules`]; the board only records
//! what is where.

use crate::hex::{EdgeCoord, HexCoord, VertexCoord};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

/// Player identifier (0-3)
pub type PlayerId = u8;

/// Resource types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Wood,
    Brick,
    Sheep,
    Wheat,
    Ore,
}

impl Resource {
    /// All resource types, in the fixed tie-breaking order
    pub const ALL: [Resource; 5] = [
        Resource::Wood,
        Resource::Brick,
        Resource::Sheep,
        Resource::Wheat,
        Resource::Ore,
    ];

    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            Resource::Wood => "Wood",
            Resource::Brick => "Brick",
            Resource::Sheep => "Sheep",
            Resource::Wheat => "Wheat",
            Resource::Ore => "Ore",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Resource {
    type Err = String;

    /// Accepts the display name in any case ("Wood", "wood")
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Resource::ALL
            .into_iter()
            .find(|r| r.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown resource: {s}"))
    }
}

/// Terrain of a hex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Terrain {
    Forest,
    Hills,
    Pasture,
    Fields,
    Mountains,
    Desert,
    /// Boundary ring around the island
    Sea,
}

impl Terrain {
    /// The resource this terrain produces, if any
    pub fn resource(&self) -> Option<Resource> {
        match self {
            Terrain::Forest => Some(Resource::Wood),
            Terrain::Hills => Some(Resource::Brick),
            Terrain::Pasture => Some(Resource::Sheep),
            Terrain::Fields => Some(Resource::Wheat),
            Terrain::Mountains => Some(Resource::Ore),
            Terrain::Desert | Terrain::Sea => None,
        }
    }

    /// Whether pieces may be built next to this terrain
    pub fn is_land(&self) -> bool {
        !matches!(self, Terrain::Sea)
    }
}

/// Port types for maritime trading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortKind {
    /// 3:1 on any resource
    Generic,
    /// 2:1 on one resource
    Specific(Resource),
}

impl PortKind {
    /// The exchange rate for this port
    pub fn rate(&self) -> u32 {
        match self {
            PortKind::Generic => 3,
            PortKind::Specific(_) => 2,
        }
    }
}

impl fmt::Display for PortKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortKind::Generic => f.write_str("3:1"),
            PortKind::Specific(resource) => write!(f, "{resource} 2:1"),
        }
    }
}

/// A single hex on the board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hex {
    /// Cube position
    pub coord: HexCoord,
    /// What the hex is made of
    pub terrain: Terrain,
    /// Number token that triggers production (2-12, None for desert/sea)
    pub token: Option<u8>,
}

impl Hex {
    /// Create a producing hex
    pub fn new(coord: HexCoord, terrain: Terrain, token: Option<u8>) -> Self {
        Self {
            coord,
            terrain,
            token,
        }
    }

    /// Create a sea hex
    pub fn sea(coord: HexCoord) -> Self {
        Self::new(coord, Terrain::Sea, None)
    }

    /// Get the resource this hex produces, if any
    pub fn resource(&self) -> Option<Resource> {
        self.terrain.resource()
    }
}

/// Occupant of a vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum VertexBuilding {
    /// Nothing built
    #[default]
    Empty,
    /// Settlement (1 VP, 1 resource per adjacent hex)
    Settlement(PlayerId),
    /// City (2 VP, 2 resources per adjacent hex)
    City(PlayerId),
}

impl VertexBuilding {
    pub fn owner(&self) -> Option<PlayerId> {
        match self {
            VertexBuilding::Empty => None,
            VertexBuilding::Settlement(p) | VertexBuilding::City(p) => Some(*p),
        }
    }

    /// Cards produced per matching roll
    pub fn resource_multiplier(&self) -> u32 {
        match self {
            VertexBuilding::Empty => 0,
            VertexBuilding::Settlement(_) => 1,
            VertexBuilding::City(_) => 2,
        }
    }
}

/// Occupant of an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum EdgeBuilding {
    /// Nothing built
    #[default]
    Empty,
    /// Road
    Road(PlayerId),
}

impl EdgeBuilding {
    pub fn owner(&self) -> Option<PlayerId> {
        match self {
            EdgeBuilding::Empty => None,
            EdgeBuilding::Road(p) => Some(*p),
        }
    }
}

/// A trade port on a coastal edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    /// The coastal edge where ships dock
    pub edge: EdgeCoord,
    /// Generic or resource-specific
    pub kind: PortKind,
    /// The two vertices that get access to the port
    pub vertices: [VertexCoord; 2],
}

impl Port {
    pub fn new(edge: EdgeCoord, kind: PortKind) -> Self {
        Self {
            edge,
            kind,
            vertices: edge.endpoints(),
        }
    }
}

/// Land hexes, the sea ring, ports and every placed piece
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Board {
    /// All hexes (land and sea) indexed by coordinate
    hexes: HashMap<HexCoord, Hex>,
    /// Buildings on vertices
    vertices: HashMap<VertexCoord, VertexBuilding>,
    /// Roads on edges
    edges: HashMap<EdgeCoord, EdgeBuilding>,
    /// Ports on coastal edges
    ports: HashMap<EdgeCoord, Port>,
}

impl Board {
    /// Create an empty board
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a board from land hexes, surrounding them with a ring of sea hexes
    pub fn from_land(land: Vec<Hex>) -> Self {
        let mut board = Self::new();
        for hex in land {
            board.hexes.insert(hex.coord, hex);
        }

        let mut sea = BTreeSet::new();
        for coord in board.hexes.keys() {
            for neighbor in coord.neighbors() {
                if !board.hexes.contains_key(&neighbor) {
                    sea.insert(neighbor);
                }
            }
        }
        for coord in sea {
            board.hexes.insert(coord, Hex::sea(coord));
        }

        board
    }

    /// Add a port (used by the generator)
    pub fn add_port(&mut self, port: Port) {
        self.ports.insert(port.edge, port);
    }

    // ==================== Queries ====================

    /// Get a hex by coordinate
    pub fn get_hex(&self, coord: &HexCoord) -> Option<&Hex> {
        self.hexes.get(coord)
    }

    /// All hexes including the sea ring
    pub fn hexes(&self) -> impl Iterator<Item = &Hex> {
        self.hexes.values()
    }

    /// Get all land hexes (non-sea)
    pub fn land_hexes(&self) -> impl Iterator<Item = &Hex> {
        self.hexes.values().filter(|h| h.terrain.is_land())
    }

    /// Whether a coordinate is a land hex of this board
    pub fn is_land_hex(&self, coord: &HexCoord) -> bool {
        self.hexes.get(coord).is_some_and(|h| h.terrain.is_land())
    }

    /// The desert hex, if the board has one
    pub fn desert(&self) -> Option<HexCoord> {
        self.land_hexes()
            .find(|h| h.terrain == Terrain::Desert)
            .map(|h| h.coord)
    }

    /// Occupant of a vertex (`Empty` when never built on)
    pub fn get_vertex(&self, coord: &VertexCoord) -> VertexBuilding {
        self.vertices.get(coord).copied().unwrap_or_default()
    }

    /// Get road at an edge
    pub fn get_edge(&self, coord: &EdgeCoord) -> EdgeBuilding {
        self.edges.get(coord).copied().unwrap_or_default()
    }

    /// All occupied vertices
    pub fn buildings(&self) -> impl Iterator<Item = (&VertexCoord, &VertexBuilding)> {
        self.vertices
            .iter()
            .filter(|(_, b)| **b != VertexBuilding::Empty)
    }

    /// All occupied edges
    pub fn roads(&self) -> impl Iterator<Item = (&EdgeCoord, &EdgeBuilding)> {
        self.edges.iter().filter(|(_, r)| **r != EdgeBuilding::Empty)
    }

    /// Whether anything has been built yet
    pub fn has_pieces(&self) -> bool {
        self.buildings().next().is_some() || self.roads().next().is_some()
    }

    /// All ports
    pub fn ports(&self) -> impl Iterator<Item = &Port> {
        self.ports.values()
    }

    /// Port on an edge, if any
    pub fn port_at(&self, edge: &EdgeCoord) -> Option<&Port> {
        self.ports.get(edge)
    }

    /// Port served by a vertex, if any
    pub fn port_for_vertex(&self, vertex: &VertexCoord) -> Option<&Port> {
        self.ports.values().find(|p| p.vertices.contains(vertex))
    }

    /// Get all vertices that are on land (adjacent to at least one land hex)
    pub fn land_vertices(&self) -> BTreeSet<VertexCoord> {
        self.land_hexes()
            .flat_map(|h| h.coord.vertices())
            .collect()
    }

    /// Edges touching at least one land hex
    pub fn land_edges(&self) -> BTreeSet<EdgeCoord> {
        self.land_hexes().flat_map(|h| h.coord.edges()).collect()
    }

    /// Get land hexes adjacent to a vertex
    pub fn hexes_at_vertex(&self, vertex: &VertexCoord) -> Vec<&Hex> {
        vertex
            .hexes()
            .iter()
            .filter_map(|h| self.hexes.get(h))
            .filter(|h| h.terrain.is_land())
            .collect()
    }

    /// Vertex touches at least one land hex
    pub fn is_land_vertex(&self, vertex: &VertexCoord) -> bool {
        vertex.hexes().iter().any(|h| self.is_land_hex(h))
    }

    /// Edge borders at least one land hex
    pub fn is_land_edge(&self, edge: &EdgeCoord) -> bool {
        edge.hexes().iter().any(|h| self.is_land_hex(h))
    }

    /// Check if a vertex satisfies the distance rule (no adjacent buildings)
    pub fn satisfies_distance_rule(&self, vertex: &VertexCoord) -> bool {
        vertex
            .adjacent_vertices()
            .iter()
            .all(|adj| self.get_vertex(adj).owner().is_none())
    }

    /// Get all ports a player has access to (through their buildings)
    pub fn player_ports(&self, player: PlayerId) -> Vec<PortKind> {
        self.ports
            .values()
            .filter(|port| {
                port.vertices
                    .iter()
                    .any(|v| self.get_vertex(v).owner() == Some(player))
            })
            .map(|port| port.kind)
            .collect()
    }

    /// Owners of buildings on the corners of `hex`
    pub fn players_adjacent_to_hex(&self, hex: &HexCoord) -> BTreeSet<PlayerId> {
        hex.vertices()
            .iter()
            .filter_map(|v| self.get_vertex(v).owner())
            .collect()
    }

    // ==================== Placement ====================

    /// Unchecked; callers validate first
    pub fn place_settlement(&mut self, vertex: VertexCoord, player: PlayerId) {
        self.vertices.insert(vertex, VertexBuilding::Settlement(player));
    }

    pub fn upgrade_to_city(&mut self, vertex: VertexCoord, player: PlayerId) {
        self.vertices.insert(vertex, VertexBuilding::City(player));
    }

    /// Place a road
    pub fn place_road(&mut self, edge: EdgeCoord, player: PlayerId) {
        self.edges.insert(edge, EdgeBuilding::Road(player));
    }
}
