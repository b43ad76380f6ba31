//! WebAssembly bindings for the Hexisle engine.
//!
//! Everything crosses the boundary as JSON strings: state snapshots, move
//! lists, events and coach queries.

use wasm_bindgen::prelude::*;

use crate::actions::Move;
use crate::bot::{Bot, BotProfile};
use crate::coach::{calculate_player_potential_pips, Coach};
use crate::enumerator::enumerate;
use crate::game::{GameConfig, GameState};
use crate::rules;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

/// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(|e| JsValue::from_str(&format!("Serialization failed: {e}")))
}

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// WASM-exposed game wrapper
#[wasm_bindgen]
pub struct WasmGame {
    state: GameState,
    rng: StdRng,
}

#[wasm_bindgen]
impl WasmGame {
    /// Create a new game from a JSON `GameConfig` (missing fields take defaults)
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str, seed: u64) -> Result<WasmGame, JsValue> {
        let config: GameConfig = serde_json::from_str(config_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid config: {e}")))?;
        let mut rng = StdRng::seed_from_u64(seed);
        let state = GameState::new(config, &mut rng).map_err(js_error)?;
        Ok(WasmGame { state, rng })
    }

    /// Full state snapshot as JSON
    #[wasm_bindgen(js_name = getState)]
    pub fn get_state(&self) -> Result<String, JsValue> {
        to_json(&self.state)
    }

    #[wasm_bindgen(js_name = getCurrentPlayer)]
    pub fn get_current_player(&self) -> u8 {
        self.state.current_player
    }

    #[wasm_bindgen(js_name = isFinished)]
    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    #[wasm_bindgen(js_name = getWinner)]
    pub fn get_winner(&self) -> Option<u8> {
        self.state.winner()
    }

    /// Legal moves for a player as a JSON array
    #[wasm_bindgen(js_name = getValidMoves)]
    pub fn get_valid_moves(&self, player: u8) -> Result<String, JsValue> {
        to_json(&enumerate(&self.state, player))
    }

    /// Apply a move given as `{"move": ..., "args": ...}` JSON; returns the events
    #[wasm_bindgen(js_name = applyMove)]
    pub fn apply_move(&mut self, player: u8, move_json: &str) -> Result<String, JsValue> {
        let mv: Move =
            serde_json::from_str(move_json).map_err(|e| JsValue::from_str(&format!("Invalid move JSON: {e}")))?;
        let events = self.state.apply_move(player, mv, &mut self.rng).map_err(js_error)?;
        to_json(&events)
    }

    /// Apply a move by name with a JSON array of string arguments
    #[wasm_bindgen(js_name = submitMove)]
    pub fn submit_move(&mut self, player: u8, name: &str, args_json: &str) -> Result<String, JsValue> {
        let args: Vec<String> =
            serde_json::from_str(args_json).map_err(|e| JsValue::from_str(&format!("Invalid arguments: {e}")))?;
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let mv = Move::parse(name, &args).map_err(js_error)?;
        let events = self.state.apply_move(player, mv, &mut self.rng).map_err(js_error)?;
        to_json(&events)
    }

    /// Submit dice thrown outside the engine
    #[wasm_bindgen(js_name = applyRoll)]
    pub fn apply_roll(&mut self, player: u8, die1: u8, die2: u8) -> Result<String, JsValue> {
        let events = self
            .state
            .apply_roll(player, (die1, die2), &mut self.rng)
            .map_err(js_error)?;
        to_json(&events)
    }

    /// Which build types the player's hand covers, dev cards included
    #[wasm_bindgen(js_name = getAffordability)]
    pub fn get_affordability(&self, player: u8) -> Result<String, JsValue> {
        let p = self
            .state
            .get_player(player)
            .ok_or_else(|| JsValue::from_str(&format!("Invalid player: {player}")))?;
        to_json(&p.affordability())
    }

    #[wasm_bindgen(js_name = getStrategicAdvice)]
    pub fn get_strategic_advice(&self, player: u8) -> Result<String, JsValue> {
        to_json(&Coach::new(&self.state).strategic_advice(player))
    }

    #[wasm_bindgen(js_name = getBestSettlementSpots)]
    pub fn get_best_settlement_spots(&self, player: u8) -> Result<String, JsValue> {
        to_json(&Coach::new(&self.state).best_settlement_spots(player))
    }

    /// Rank the player's upgradable settlements
    #[wasm_bindgen(js_name = getBestCitySpots)]
    pub fn get_best_city_spots(&self, player: u8) -> Result<String, JsValue> {
        let candidates = rules::valid_city_spots(&self.state.board, player);
        to_json(&Coach::new(&self.state).best_city_spots(player, &candidates))
    }

    /// Rank the player's legal roads
    #[wasm_bindgen(js_name = getBestRoadSpots)]
    pub fn get_best_road_spots(&self, player: u8, aggressiveness: f64) -> Result<String, JsValue> {
        let candidates = match self.state.pending_setup_settlement(player) {
            Some(settlement) => rules::valid_setup_road_spots(&self.state.board, Some(settlement)),
            None => rules::valid_road_spots(&self.state.board, player),
        };
        to_json(&Coach::new(&self.state).best_road_spots(player, &candidates, aggressiveness))
    }

    #[wasm_bindgen(js_name = getPlayerPotentialPips)]
    pub fn get_player_potential_pips(&self) -> Result<String, JsValue> {
        to_json(&calculate_player_potential_pips(&self.state))
    }

    #[wasm_bindgen(js_name = getBoardStats)]
    pub fn get_board_stats(&self) -> Result<String, JsValue> {
        to_json(&self.state.board_stats)
    }

    /// A bot's suggested move for a player; `profile` is a preset name
    #[wasm_bindgen(js_name = getBotMove)]
    pub fn get_bot_move(&self, player: u8, profile: &str, seed: u64) -> Result<String, JsValue> {
        let profile = BotProfile::from_name(profile)
            .ok_or_else(|| JsValue::from_str(&format!("Unknown bot profile: {profile}")))?;
        let mut bot = Bot::with_seed(player, profile, seed);
        to_json(&bot.choose_move(&self.state))
    }
}
