//! Seats, hands and build costs.
//!
//! - [`ResourceHand`]: card counts per resource with atomic payment
//! - [`costs`]: the fixed price of every build type
//! - [`Player`]: a seat's hand, pieces and victory points

use crate::board::{PlayerId, Resource};
use crate::hex::{EdgeCoord, VertexCoord};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Seat colour shown by hosts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerColor {
    Red,
    Blue,
    Orange,
    Yellow,
}

impl PlayerColor {
    const SEATS: [PlayerColor; 4] = [
        PlayerColor::Red,
        PlayerColor::Blue,
        PlayerColor::Orange,
        PlayerColor::Yellow,
    ];

    pub fn for_player(id: PlayerId) -> Self {
        Self::SEATS[id as usize % Self::SEATS.len()]
    }
}

/// Resource cards held by one player
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceHand {
    pub wood: u32,
    pub brick: u32,
    pub sheep: u32,
    pub wheat: u32,
    pub ore: u32,
}

impl ResourceHand {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts in `Resource::ALL` order
    pub fn with_amounts(wood: u32, brick: u32, sheep: u32, wheat: u32, ore: u32) -> Self {
        Self {
            wood,
            brick,
            sheep,
            wheat,
            ore,
        }
    }

    pub fn single(resource: Resource, amount: u32) -> Self {
        let mut hand = Self::new();
        *hand.slot_mut(resource) += amount;
        hand
    }

    fn slot_mut(&mut self, resource: Resource) -> &mut u32 {
        match resource {
            Resource::Wood => &mut self.wood,
            Resource::Brick => &mut self.brick,
            Resource::Sheep => &mut self.sheep,
            Resource::Wheat => &mut self.wheat,
            Resource::Ore => &mut self.ore,
        }
    }

    pub fn get(&self, resource: Resource) -> u32 {
        match resource {
            Resource::Wood => self.wood,
            Resource::Brick => self.brick,
            Resource::Sheep => self.sheep,
            Resource::Wheat => self.wheat,
            Resource::Ore => self.ore,
        }
    }

    pub fn total(&self) -> u32 {
        Resource::ALL.iter().map(|r| self.get(*r)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn add(&mut self, resource: Resource, amount: u32) {
        *self.slot_mut(resource) += amount;
    }

    pub fn add_hand(&mut self, other: &ResourceHand) {
        for resource in Resource::ALL {
            self.add(resource, other.get(resource));
        }
    }

    /// True when every count covers the matching count in `cost`
    pub fn can_afford(&self, cost: &ResourceHand) -> bool {
        Resource::ALL.into_iter().all(|r| self.get(r) >= cost.get(r))
    }

    /// Pay `cost` in full, or change nothing and return false
    pub fn try_subtract(&mut self, cost: &ResourceHand) -> bool {
        if !self.can_afford(cost) {
            return false;
        }
        for resource in Resource::ALL {
            *self.slot_mut(resource) -= cost.get(resource);
        }
        true
    }

    /// One entry per card, grouped in `Resource::ALL` order
    pub fn cards(&self) -> Vec<Resource> {
        let mut cards = Vec::with_capacity(self.total() as usize);
        for resource in Resource::ALL {
            cards.extend(std::iter::repeat(resource).take(self.get(resource) as usize));
        }
        cards
    }

    /// Take one uniformly chosen card
    pub fn steal_random<R: Rng>(&mut self, rng: &mut R) -> Option<Resource> {
        let taken = *self.cards().choose(rng)?;
        *self.slot_mut(taken) -= 1;
        Some(taken)
    }
}

/// Build prices
pub mod costs {
    use super::ResourceHand;

    /// Wood + brick
    pub fn road() -> ResourceHand {
        ResourceHand::with_amounts(1, 1, 0, 0, 0)
    }

    /// Wood + brick + sheep + wheat
    pub fn settlement() -> ResourceHand {
        ResourceHand::with_amounts(1, 1, 1, 1, 0)
    }

    /// Two wheat + three ore
    pub fn city() -> ResourceHand {
        ResourceHand::with_amounts(0, 0, 0, 2, 3)
    }

    /// Sheep + wheat + ore
    pub fn dev_card() -> ResourceHand {
        ResourceHand::with_amounts(0, 0, 1, 1, 1)
    }
}

/// Which build types a hand covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Affordability {
    pub road: bool,
    pub settlement: bool,
    pub city: bool,
    pub dev_card: bool,
}

impl Affordability {
    pub fn of(hand: &ResourceHand) -> Self {
        Self {
            road: hand.can_afford(&costs::road()),
            settlement: hand.can_afford(&costs::settlement()),
            city: hand.can_afford(&costs::city()),
            dev_card: hand.can_afford(&costs::dev_card()),
        }
    }
}

/// One seat at the table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub color: PlayerColor,
    pub resources: ResourceHand,
    pub settlements: Vec<VertexCoord>,
    pub cities: Vec<VertexCoord>,
    pub roads: Vec<EdgeCoord>,
    /// Settlements count 1, cities 2
    pub victory_points: u32,
}

impl Player {
    pub fn new(id: PlayerId, name: String) -> Self {
        Self {
            id,
            name,
            color: PlayerColor::for_player(id),
            resources: ResourceHand::default(),
            settlements: Vec::new(),
            cities: Vec::new(),
            roads: Vec::new(),
            victory_points: 0,
        }
    }

    /// Settlements plus cities
    pub fn building_count(&self) -> usize {
        self.settlements.len() + self.cities.len()
    }

    pub fn affordability(&self) -> Affordability {
        Affordability::of(&self.resources)
    }

    pub fn add_settlement(&mut self, vertex: VertexCoord) {
        self.settlements.push(vertex);
        self.victory_points += 1;
    }

    /// Move a vertex from settlements to cities (+1 VP)
    pub fn upgrade_settlement(&mut self, vertex: VertexCoord) {
        self.settlements.retain(|v| *v != vertex);
        self.cities.push(vertex);
        self.victory_points += 1;
    }

    pub fn add_road(&mut self, edge: EdgeCoord) {
        self.roads.push(edge);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex::HexCoord;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_hand_counts() {
        let mut hand = ResourceHand::with_amounts(1, 2, 3, 4, 5);
        assert_eq!(hand.total(), 15);
        assert_eq!(hand.get(Resource::Sheep), 3);

        hand.add_hand(&ResourceHand::single(Resource::Ore, 2));
        assert_eq!(hand.get(Resource::Ore), 7);
    }

    #[test]
    fn test_payment_is_all_or_nothing() {
        let mut hand = ResourceHand::with_amounts(1, 0, 0, 0, 0);
        assert!(!hand.try_subtract(&costs::road()));
        assert_eq!(hand, ResourceHand::with_amounts(1, 0, 0, 0, 0));

        hand.add(Resource::Brick, 1);
        assert!(hand.try_subtract(&costs::road()));
        assert!(hand.is_empty());
    }

    #[test]
    fn test_price_list() {
        let prices = [
            (costs::road(), 2),
            (costs::settlement(), 4),
            (costs::city(), 5),
            (costs::dev_card(), 3),
        ];
        for (cost, cards) in prices {
            assert_eq!(cost.total(), cards);
        }
    }

    #[test]
    fn test_affordability() {
        assert_eq!(Affordability::of(&ResourceHand::new()), Affordability::default());

        let result = Affordability::of(&ResourceHand::with_amounts(0, 0, 1, 2, 3));
        assert_eq!(
            result,
            Affordability {
                road: false,
                settlement: false,
                city: true,
                dev_card: true,
            }
        );
    }

    #[test]
    fn test_city_upgrade_scores_one_more_point() {
        let mut player = Player::new(2, "Cara".to_string());
        assert_eq!(player.color, PlayerColor::Orange);

        let vertex = HexCoord::new(0, 0).vertices()[0];
        player.add_settlement(vertex);
        player.upgrade_settlement(vertex);
        assert_eq!(player.victory_points, 2);
        assert!(player.settlements.is_empty());
        assert_eq!(player.cities, vec![vertex]);
        assert_eq!(player.building_count(), 1);
    }

    #[test]
    fn test_steal_until_empty() {
        let mut hand = ResourceHand::with_amounts(0, 0, 0, 1, 0);
        let mut rng = StdRng::seed_from_u64(3);

        assert_eq!(hand.steal_random(&mut rng), Some(Resource::Wheat));
        assert!(hand.is_empty());
        assert_eq!(hand.steal_random(&mut rng), None);
    }

    #[test]
    fn test_cards_grouped_by_resource() {
        let hand = ResourceHand::with_amounts(1, 0, 2, 0, 1);
        assert_eq!(
            hand.cards(),
            vec![Resource::Wood, Resource::Sheep, Resource::Sheep, Resource::Ore]
        );
    }
}
