//! Hex coordinate system using cube coordinates (q, r, s).
//!
//! This module provides the canonical addressing scheme for the island:
//! - `HexCoord`: identifies individual hexes, written `"q,r,s"`
//! - `VertexCoord`: a corner where three hexes meet, written as the three hex ids
//!   sorted by (q, r) and joined with `"::"`
//! - `EdgeCoord`: a side shared by two hexes, written the same way
//!
//! Vertices and edges are named by the hexes that touch them (sea hexes included),
//! so the same physical corner always produces the same id no matter which hex it
//! was reached from. Ids coming from outside the engine are parsed and validated
//! once, here; everything downstream works with the typed coordinates.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Largest coordinate magnitude accepted when parsing ids
pub const MAX_COORD: i32 = 100;

/// Longest id string accepted when parsing
pub const MAX_ID_LEN: usize = 64;

const ID_SEPARATOR: &str = "::";

/// Cube direction offsets (q, r, s), in neighbor order
pub const DIRECTIONS: [(i32, i32, i32); 6] = [
    (1, -1, 0),
    (1, 0, -1),
    (0, 1, -1),
    (-1, 1, 0),
    (-1, 0, 1),
    (0, -1, 1),
];

/// Errors produced while parsing or constructing coordinates
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum CoordError {
    #[error("Invalid ID format")]
    InvalidFormat,

    #[error("ID exceeds maximum length")]
    TooLong,

    #[error("Coordinate out of range")]
    OutOfRange,

    #[error("Cube coordinates must sum to zero")]
    NotCube,

    #[error("Hexes are not adjacent")]
    NotAdjacent,
}

/// Cube coordinate for a hex.
///
/// Only `q` and `r` are stored; `s` is always `-q - r`, so the cube invariant
/// cannot be broken once a value exists. Ordering is lexicographic by (q, r),
/// which is the order used to canonicalize vertex and edge ids.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct HexCoord {
    /// Column axis
    pub q: i32,
    /// Row axis
    pub r: i32,
}

impl HexCoord {
    /// Create a new hex coordinate
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// Create from all three cube components, checking the invariant and range
    pub fn from_cube(q: i32, r: i32, s: i32) -> Result<Self, CoordError> {
        if q + r + s != 0 {
            return Err(CoordError::NotCube);
        }
        let coord = Self::new(q, r);
        if !coord.in_range() {
            return Err(CoordError::OutOfRange);
        }
        Ok(coord)
    }

    /// The derived third coordinate (s = -q - r)
    pub const fn s(&self) -> i32 {
        -self.q - self.r
    }

    /// The six neighboring hexes, in `DIRECTIONS` order
    pub fn neighbors(&self) -> [HexCoord; 6] {
        DIRECTIONS.map(|(dq, dr, _)| HexCoord::new(self.q + dq, self.r + dr))
    }

    /// Distance to another hex (in hex steps)
    pub fn distance_to(&self, other: &HexCoord) -> u32 {
        let dq = (self.q - other.q).abs();
        let dr = (self.r - other.r).abs();
        let ds = (self.s() - other.s()).abs();
        ((dq + dr + ds) / 2) as u32
    }

    /// Whether two hexes share an edge
    pub fn is_adjacent(&self, other: &HexCoord) -> bool {
        self.distance_to(other) == 1
    }

    /// The six corners of this hex. Corner `i` is shared with neighbors `i` and `i + 1`.
    pub fn vertices(&self) -> [VertexCoord; 6] {
        let n = self.neighbors();
        std::array::from_fn(|i| VertexCoord::from_hexes([*self, n[i], n[(i + 1) % 6]]))
    }

    /// The six sides of this hex, one per neighbor
    pub fn edges(&self) -> [EdgeCoord; 6] {
        self.neighbors().map(|n| EdgeCoord::from_pair(*self, n))
    }

    /// Convert to pixel coordinates (center of hex), pointy-top orientation
    pub fn to_pixel(&self, hex_size: f64) -> (f64, f64) {
        let x = hex_size * (3.0_f64.sqrt() * self.q as f64 + 3.0_f64.sqrt() / 2.0 * self.r as f64);
        let y = hex_size * (3.0 / 2.0 * self.r as f64);
        (x, y)
    }

    fn in_range(&self) -> bool {
        self.q.abs() <= MAX_COORD && self.r.abs() <= MAX_COORD && self.s().abs() <= MAX_COORD
    }
}

impl fmt::Display for HexCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.q, self.r, self.s())
    }
}

impl FromStr for HexCoord {
    type Err = CoordError;

    fn from_str(id: &str) -> Result<Self, Self::Err> {
        if id.len() > MAX_ID_LEN {
            return Err(CoordError::TooLong);
        }
        let mut parts = id.split(',');
        let (Some(q), Some(r), Some(s), None) = (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(CoordError::InvalidFormat);
        };
        Self::from_cube(parse_component(q)?, parse_component(r)?, parse_component(s)?)
    }
}

/// Strict integer parsing: an optional minus sign followed by ASCII digits only.
fn parse_component(part: &str) -> Result<i32, CoordError> {
    let digits = part.strip_prefix('-').unwrap_or(part);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CoordError::InvalidFormat);
    }
    let value: i64 = part.parse().map_err(|_| CoordError::OutOfRange)?;
    if value.abs() > i64::from(MAX_COORD) {
        return Err(CoordError::OutOfRange);
    }
    Ok(value as i32)
}

impl TryFrom<String> for HexCoord {
    type Error = CoordError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HexCoord> for String {
    fn from(coord: HexCoord) -> Self {
        coord.to_string()
    }
}

/// Vertex coordinate - a corner where 3 hexes meet.
///
/// Settlements and cities are built on vertices. The three hexes are kept sorted,
/// which makes the derived `Eq`/`Hash` canonical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VertexCoord([HexCoord; 3]);

impl VertexCoord {
    /// Create a vertex from three hexes in any order. The hexes must be mutually adjacent.
    pub fn new(a: HexCoord, b: HexCoord, c: HexCoord) -> Result<Self, CoordError> {
        if !(a.is_adjacent(&b) && b.is_adjacent(&c) && c.is_adjacent(&a)) {
            return Err(CoordError::NotAdjacent);
        }
        Ok(Self::from_hexes([a, b, c]))
    }

    /// Canonicalize hexes already known to be mutually adjacent
    pub(crate) fn from_hexes(mut hexes: [HexCoord; 3]) -> Self {
        hexes.sort();
        Self(hexes)
    }

    /// The 3 hexes that touch this vertex, in canonical order
    pub fn hexes(&self) -> [HexCoord; 3] {
        self.0
    }

    /// The 3 edges that meet at this vertex
    pub fn touching_edges(&self) -> [EdgeCoord; 3] {
        let [a, b, c] = self.0;
        [
            EdgeCoord::from_pair(a, b),
            EdgeCoord::from_pair(b, c),
            EdgeCoord::from_pair(c, a),
        ]
    }

    /// The 3 vertices one edge away (for distance rule checking)
    pub fn adjacent_vertices(&self) -> [VertexCoord; 3] {
        self.touching_edges().map(|edge| {
            let [v1, v2] = edge.endpoints();
            if v1 == *self {
                v2
            } else {
                v1
            }
        })
    }
}

impl fmt::Display for VertexCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c] = self.0;
        write!(f, "{a}{ID_SEPARATOR}{b}{ID_SEPARATOR}{c}")
    }
}

impl FromStr for VertexCoord {
    type Err = CoordError;

    fn from_str(id: &str) -> Result<Self, Self::Err> {
        if id.len() > MAX_ID_LEN {
            return Err(CoordError::TooLong);
        }
        let parts: Vec<&str> = id.split(ID_SEPARATOR).collect();
        let [a, b, c] = parts.as_slice() else {
            return Err(CoordError::InvalidFormat);
        };
        Self::new(a.parse()?, b.parse()?, c.parse()?)
    }
}

impl TryFrom<String> for VertexCoord {
    type Error = CoordError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<VertexCoord> for String {
    fn from(coord: VertexCoord) -> Self {
        coord.to_string()
    }
}

/// Edge coordinate - the side shared by 2 adjacent hexes, where roads are built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EdgeCoord([HexCoord; 2]);

impl EdgeCoord {
    /// Create an edge from two hexes in any order. The hexes must be adjacent.
    pub fn new(a: HexCoord, b: HexCoord) -> Result<Self, CoordError> {
        if !a.is_adjacent(&b) {
            return Err(CoordError::NotAdjacent);
        }
        Ok(Self::from_pair(a, b))
    }

    pub(crate) fn from_pair(a: HexCoord, b: HexCoord) -> Self {
        if a <= b {
            Self([a, b])
        } else {
            Self([b, a])
        }
    }

    /// The 2 hexes that share this edge, in canonical order
    pub fn hexes(&self) -> [HexCoord; 2] {
        self.0
    }

    /// The 2 vertices at the ends of this edge.
    ///
    /// Each endpoint is the edge's two hexes plus one of the two hexes adjacent to both:
    /// `a` offset by the direction `a -> b` rotated 60 degrees either way.
    pub fn endpoints(&self) -> [VertexCoord; 2] {
        let [a, b] = self.0;
        let (dq, dr) = (b.q - a.q, b.r - a.r);
        let ds = -dq - dr;
        let clockwise = HexCoord::new(a.q - ds, a.r - dq);
        let counter_clockwise = HexCoord::new(a.q - dr, a.r - ds);
        [
            VertexCoord::from_hexes([a, b, clockwise]),
            VertexCoord::from_hexes([a, b, counter_clockwise]),
        ]
    }

    /// Edges that share a vertex with this edge (for road connectivity)
    pub fn adjacent_edges(&self) -> Vec<EdgeCoord> {
        let mut adjacent = Vec::with_capacity(4);
        for vertex in self.endpoints() {
            for edge in vertex.touching_edges() {
                if edge != *self && !adjacent.contains(&edge) {
                    adjacent.push(edge);
                }
            }
        }
        adjacent
    }

    /// Pixel position of the edge midpoint
    pub fn to_pixel(&self, hex_size: f64) -> (f64, f64) {
        let [a, b] = self.0;
        let (x1, y1) = a.to_pixel(hex_size);
        let (x2, y2) = b.to_pixel(hex_size);
        ((x1 + x2) / 2.0, (y1 + y2) / 2.0)
    }
}

impl fmt::Display for EdgeCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b] = self.0;
        write!(f, "{a}{ID_SEPARATOR}{b}")
    }
}

impl FromStr for EdgeCoord {
    type Err = CoordError;

    fn from_str(id: &str) -> Result<Self, Self::Err> {
        if id.len() > MAX_ID_LEN {
            return Err(CoordError::TooLong);
        }
        let parts: Vec<&str> = id.split(ID_SEPARATOR).collect();
        let [a, b] = parts.as_slice() else {
            return Err(CoordError::InvalidFormat);
        };
        Self::new(a.parse()?, b.parse()?)
    }
}

impl TryFrom<String> for EdgeCoord {
    type Error = CoordError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EdgeCoord> for String {
    fn from(coord: EdgeCoord) -> Self {
        coord.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_hex_neighbors() {
        let center = HexCoord::new(0, 0);
        let neighbors = center.neighbors();

        let unique: HashSet<_> = neighbors.iter().collect();
        assert_eq!(unique.len(), 6);

        for neighbor in &neighbors {
            assert_eq!(center.distance_to(neighbor), 1);
        }
        assert_eq!(neighbors[0], HexCoord::new(1, -1));
        assert_eq!(neighbors[4], HexCoord::new(-1, 0));
    }

    #[test]
    fn test_hex_distance() {
        let a = HexCoord::new(0, 0);
        assert_eq!(a.distance_to(&HexCoord::new(2, -1)), 2);
        assert_eq!(a.distance_to(&HexCoord::new(-3, 3)), 3);
    }

    #[test]
    fn test_hex_id_format() {
        assert_eq!(HexCoord::new(1, -1).to_string(), "1,-1,0");
        assert_eq!("-2,1,1".parse::<HexCoord>(), Ok(HexCoord::new(-2, 1)));
    }

    #[test]
    fn test_vertex_id_is_permutation_invariant() {
        let a = HexCoord::new(0, 0);
        let b = HexCoord::new(1, -1);
        let c = HexCoord::new(1, 0);

        let expected = VertexCoord::new(a, b, c).unwrap();
        for (x, y, z) in [(a, c, b), (b, a, c), (b, c, a), (c, a, b), (c, b, a)] {
            assert_eq!(VertexCoord::new(x, y, z).unwrap(), expected);
        }
        assert_eq!(expected.to_string(), "0,0,0::1,-1,0::1,0,-1");
    }

    #[test]
    fn test_vertex_shared_between_hexes() {
        let a = HexCoord::new(0, 0);
        let b = HexCoord::new(1, -1);
        let shared: Vec<_> = a
            .vertices()
            .into_iter()
            .filter(|v| b.vertices().contains(v))
            .collect();
        assert_eq!(shared.len(), 2, "Adjacent hexes share exactly two corners");
    }

    #[test]
    fn test_hex_vertices_and_edges_are_distinct() {
        let hex = HexCoord::new(0, 0);
        let vertices: HashSet<_> = hex.vertices().into_iter().collect();
        let edges: HashSet<_> = hex.edges().into_iter().collect();
        assert_eq!(vertices.len(), 6);
        assert_eq!(edges.len(), 6);
        for v in &vertices {
            assert!(v.hexes().contains(&hex));
        }
    }

    #[test]
    fn test_vertex_adjacent_vertices() {
        let v = HexCoord::new(0, 0).vertices()[0];
        let adjacent = v.adjacent_vertices();

        let unique: HashSet<_> = adjacent.iter().collect();
        assert_eq!(unique.len(), 3);
        for adj in &adjacent {
            assert_ne!(*adj, v);
            assert!(adj.adjacent_vertices().contains(&v));
        }
    }

    #[test]
    fn test_edge_canonical_equality() {
        let e1 = EdgeCoord::new(HexCoord::new(0, 0), HexCoord::new(1, 0)).unwrap();
        let e2 = EdgeCoord::new(HexCoord::new(1, 0), HexCoord::new(0, 0)).unwrap();
        assert_eq!(e1, e2);
    }

    #[test]
    fn test_edge_endpoints_touch_edge() {
        for edge in HexCoord::new(0, 0).edges() {
            let [v1, v2] = edge.endpoints();
            assert_ne!(v1, v2);
            assert!(v1.touching_edges().contains(&edge));
            assert!(v2.touching_edges().contains(&edge));
        }
    }

    #[test]
    fn test_edge_endpoints_are_corners_of_both_sides() {
        for center in [HexCoord::new(0, 0), HexCoord::new(2, -1), HexCoord::new(-3, 1)] {
            let corners = center.vertices();
            for (i, edge) in center.edges().into_iter().enumerate() {
                let mut endpoints = edge.endpoints();
                endpoints.sort();
                let mut expected = [corners[(i + 5) % 6], corners[i]];
                expected.sort();
                assert_eq!(endpoints, expected, "edge {edge}");
                for vertex in endpoints {
                    let [a, b, c] = vertex.hexes();
                    assert!(a.is_adjacent(&b) && b.is_adjacent(&c) && c.is_adjacent(&a));
                }
            }
        }
    }

    #[test]
    fn test_edge_adjacent_edges() {
        let e = HexCoord::new(0, 0).edges()[1];
        let adjacent = e.adjacent_edges();
        assert_eq!(adjacent.len(), 4);
        assert!(!adjacent.contains(&e));
    }

    #[test]
    fn test_rejects_malformed_ids() {
        assert_eq!("1,2".parse::<HexCoord>(), Err(CoordError::InvalidFormat));
        assert_eq!("a,b,c".parse::<HexCoord>(), Err(CoordError::InvalidFormat));
        assert_eq!("1,1,1".parse::<HexCoord>(), Err(CoordError::NotCube));
        assert_eq!("1.5,0,-1.5".parse::<HexCoord>(), Err(CoordError::InvalidFormat));
        assert_eq!("__proto__".parse::<HexCoord>(), Err(CoordError::InvalidFormat));
        assert_eq!("999,0,-999".parse::<HexCoord>(), Err(CoordError::OutOfRange));
        assert_eq!(
            "99999999999999999999,0,0".parse::<HexCoord>(),
            Err(CoordError::OutOfRange)
        );
        let long_id = vec!["0,0,0"; 12].join("::");
        assert_eq!(long_id.parse::<VertexCoord>(), Err(CoordError::TooLong));
        assert_eq!(
            "0,0,0::2,-2,0::1,0,-1".parse::<VertexCoord>(),
            Err(CoordError::NotAdjacent)
        );
        assert_eq!("0,0,0::1,-1,0".parse::<VertexCoord>(), Err(CoordError::InvalidFormat));
        assert_eq!("0,0,0::0,0,0".parse::<EdgeCoord>(), Err(CoordError::NotAdjacent));
    }

    #[test]
    fn test_parse_display_agree() {
        let v = HexCoord::new(-1, 2).vertices()[3];
        assert_eq!(v.to_string().parse::<VertexCoord>(), Ok(v));

        let e = HexCoord::new(2, -1).edges()[5];
        assert_eq!(e.to_string().parse::<EdgeCoord>(), Ok(e));
    }

    #[test]
    fn test_serde_uses_id_strings() {
        let e = EdgeCoord::new(HexCoord::new(0, 0), HexCoord::new(0, 1)).unwrap();
        let json = serde_json::to_string(&e).unwrap();
        assert_eq!(json, "\"0,0,0::0,1,-1\"");

        let bad: Result<HexCoord, _> = serde_json::from_str("\"1,1,1\"");
        assert!(bad.is_err());
    }
}
