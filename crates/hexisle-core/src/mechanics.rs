//! Resource production, discarding and bank trading.
//!
//! These are pure functions over the board and hands; the state machine in
//! [`crate::game`] decides when they run and applies their results.

use crate::board::{Board, PlayerId, PortKind, Resource};
use crate::hex::HexCoord;
use crate::player::ResourceHand;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Bank rate without any port
pub const BANK_RATE: u32 = 4;

/// Hands larger than this lose half on a seven
pub const DISCARD_LIMIT: u32 = 7;

/// Dots printed under a number token: how many of the 36 dice outcomes produce it
pub fn pip_value(token: u8) -> u32 {
    match token {
        2 | 12 => 1,
        3 | 11 => 2,
        4 | 10 => 3,
        5 | 9 => 4,
        6 | 8 => 5,
        _ => 0,
    }
}

/// Resources every player receives for a roll.
///
/// A seven produces nothing and the hex under the robber is skipped. Cities
/// collect two cards per hex, settlements one.
pub fn distribute_resources(board: &Board, robber: &HexCoord, roll: u8) -> BTreeMap<PlayerId, ResourceHand> {
    let mut rewards: BTreeMap<PlayerId, ResourceHand> = BTreeMap::new();
    if roll == 7 {
        return rewards;
    }

    for hex in board.land_hexes() {
        if hex.coord == *robber || hex.token != Some(roll) {
            continue;
        }
        let Some(resource) = hex.resource() else {
            continue;
        };
        for vertex in hex.coord.vertices() {
            let building = board.get_vertex(&vertex);
            if let Some(owner) = building.owner() {
                rewards
                    .entry(owner)
                    .or_default()
                    .add(resource, building.resource_multiplier());
            }
        }
    }

    rewards
}

/// Discard floor(total / 2) cards chosen uniformly at random. Returns what was discarded.
pub fn discard_half<R: Rng>(hand: &mut ResourceHand, rng: &mut R) -> ResourceHand {
    let mut cards = hand.cards();
    cards.shuffle(rng);
    let kept = cards.split_off(cards.len() / 2);

    let mut discarded = ResourceHand::new();
    for resource in cards {
        discarded.add(resource, 1);
    }
    let mut remaining = ResourceHand::new();
    for resource in kept {
        remaining.add(resource, 1);
    }
    *hand = remaining;
    discarded
}

/// Per-resource trade rates for one player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRates(BTreeMap<Resource, u32>);

impl Default for ExchangeRates {
    fn default() -> Self {
        Self(Resource::ALL.iter().map(|r| (*r, BANK_RATE)).collect())
    }
}

impl ExchangeRates {
    /// How many of `resource` buy one card
    pub fn get(&self, resource: Resource) -> u32 {
        self.0.get(&resource).copied().unwrap_or(BANK_RATE)
    }

    fn improve(&mut self, resource: Resource, rate: u32) {
        let current = self.0.entry(resource).or_insert(BANK_RATE);
        *current = (*current).min(rate);
    }
}

/// Rates a player trades at: 4 by default, 3 with a generic port, 2 with a matching port
pub fn exchange_rates(board: &Board, player: PlayerId) -> ExchangeRates {
    let mut rates = ExchangeRates::default();
    for port in board.player_ports(player) {
        match port {
            PortKind::Generic => {
                for resource in Resource::ALL {
                    rates.improve(resource, port.rate());
                }
            }
            PortKind::Specific(resource) => rates.improve(resource, port.rate()),
        }
    }
    rates
}

/// A bank trade proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeOffer {
    pub give: Resource,
    pub receive: Resource,
    /// Cards handed over for the one received
    pub rate: u32,
    pub can_trade: bool,
}

/// "Most for least": give the most abundant resource for the scarcest other one.
///
/// Ties are broken by the fixed resource order (wood, brick, sheep, wheat, ore).
pub fn calculate_trade(hand: &ResourceHand, rates: &ExchangeRates) -> TradeOffer {
    let give = first_extreme(hand, Resource::ALL.into_iter(), |a, b| a > b).unwrap_or(Resource::Wood);
    let receive = first_extreme(hand, Resource::ALL.into_iter().filter(|r| *r != give), |a, b| a < b)
        .unwrap_or(Resource::Brick);
    let rate = rates.get(give);

    TradeOffer {
        give,
        receive,
        rate,
        can_trade: hand.get(give) >= rate,
    }
}

/// First resource (in iteration order) whose count beats every later one
fn first_extreme(
    hand: &ResourceHand,
    candidates: impl Iterator<Item = Resource>,
    beats: impl Fn(u32, u32) -> bool,
) -> Option<Resource> {
    candidates.fold(None, |best, resource| match best {
        Some(b) if !beats(hand.get(resource), hand.get(b)) => Some(b),
        _ => Some(resource),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Hex, Port, Terrain};
    use crate::hex::{EdgeCoord, VertexCoord};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Vertex touching the fields, mountains and desert hexes
    fn shared_vertex() -> VertexCoord {
        VertexCoord::new(HexCoord::new(0, 0), HexCoord::new(1, 0), HexCoord::new(0, 1)).unwrap()
    }

    fn small_board() -> Board {
        Board::from_land(vec![
            Hex::new(HexCoord::new(0, 0), Terrain::Fields, Some(8)),
            Hex::new(HexCoord::new(1, 0), Terrain::Mountains, Some(8)),
            Hex::new(HexCoord::new(0, 1), Terrain::Desert, None),
        ])
    }

    #[test]
    fn test_pip_values() {
        assert_eq!(pip_value(2), 1);
        assert_eq!(pip_value(6), 5);
        assert_eq!(pip_value(8), 5);
        assert_eq!(pip_value(11), 2);
        assert_eq!(pip_value(7), 0);
    }

    #[test]
    fn test_distribute_eight() {
        let mut board = small_board();
        let shared = shared_vertex();
        board.place_settlement(shared, 0);
        let city_spot = HexCoord::new(1, 0).vertices()[0];
        board.upgrade_to_city(city_spot, 1);

        let rewards = distribute_resources(&board, &HexCoord::new(0, 1), 8);
        assert_eq!(rewards[&0], ResourceHand::with_amounts(0, 0, 0, 1, 1));
        assert_eq!(rewards[&1].ore, 2);
    }

    #[test]
    fn test_distribute_skips_robber_and_seven() {
        let mut board = small_board();
        board.place_settlement(shared_vertex(), 0);

        let rewards = distribute_resources(&board, &HexCoord::new(0, 0), 8);
        assert_eq!(rewards[&0], ResourceHand::with_amounts(0, 0, 0, 0, 1));

        assert!(distribute_resources(&board, &HexCoord::new(0, 1), 7).is_empty());
    }

    #[test]
    fn test_discard_half_rounds_down() {
        let original = ResourceHand::with_amounts(3, 0, 2, 0, 4);
        for seed in 0..20 {
            let mut hand = original.clone();
            let discarded = discard_half(&mut hand, &mut StdRng::seed_from_u64(seed));

            assert_eq!(discarded.total(), 4);
            assert_eq!(hand.total(), 5);
            let mut rejoined = hand.clone();
            rejoined.add_hand(&discarded);
            assert_eq!(rejoined, original);
        }

        let mut single = ResourceHand::single(Resource::Ore, 1);
        let discarded = discard_half(&mut single, &mut StdRng::seed_from_u64(0));
        assert!(discarded.is_empty());
        assert_eq!(single, ResourceHand::single(Resource::Ore, 1));
    }

    #[test]
    fn test_discard_half() {
        let mut hand = ResourceHand::with_amounts(2, 2, 2, 1, 1);
        let mut rng = StdRng::seed_from_u64(11);
        let discarded = discard_half(&mut hand, &mut rng);

        assert_eq!(discarded.total(), 4);
        assert_eq!(hand.total(), 4);
        for resource in Resource::ALL {
            assert_eq!(
                hand.get(resource) + discarded.get(resource),
                ResourceHand::with_amounts(2, 2, 2, 1, 1).get(resource)
            );
        }
    }

    #[test]
    fn test_exchange_rates_with_ports() {
        let mut board = small_board();
        let edge = EdgeCoord::new(HexCoord::new(0, 0), HexCoord::new(-1, 0)).unwrap();
        board.add_port(Port::new(edge, PortKind::Specific(Resource::Wheat)));
        let generic = EdgeCoord::new(HexCoord::new(1, 0), HexCoord::new(2, 0)).unwrap();
        board.add_port(Port::new(generic, PortKind::Generic));

        assert_eq!(exchange_rates(&board, 0), ExchangeRates::default());

        board.place_settlement(edge.endpoints()[0], 0);
        let rates = exchange_rates(&board, 0);
        assert_eq!(rates.get(Resource::Wheat), 2);
        assert_eq!(rates.get(Resource::Ore), 4);

        board.place_settlement(generic.endpoints()[1], 0);
        let rates = exchange_rates(&board, 0);
        assert_eq!(rates.get(Resource::Wheat), 2);
        assert_eq!(rates.get(Resource::Ore), 3);
    }

    #[test]
    fn test_calculate_trade_most_for_least() {
        let hand = ResourceHand::with_amounts(1, 5, 0, 2, 0);
        let offer = calculate_trade(&hand, &ExchangeRates::default());
        assert_eq!(offer.give, Resource::Brick);
        assert_eq!(offer.receive, Resource::Sheep);
        assert!(offer.can_trade);
        assert_eq!(offer.rate, 4);
    }

    #[test]
    fn test_calculate_trade_ties_and_shortfall() {
        let hand = ResourceHand::with_amounts(3, 3, 3, 3, 3);
        let offer = calculate_trade(&hand, &ExchangeRates::default());
        assert_eq!(offer.give, Resource::Wood);
        assert_eq!(offer.receive, Resource::Brick);
        assert!(!offer.can_trade);
    }
}
