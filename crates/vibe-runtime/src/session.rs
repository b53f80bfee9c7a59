//! Host-facing facade: one game, one ticker.

use crate::engine::{Game, GenerationOutcome, TickReport};
use crate::ticker::{lock_game, SharedGame, Ticker};
use crate::RuntimeError;
use rust_decimal::Decimal;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use vibe_core::{BusinessId, GameConfig, GameEvent, GameState, TimeView};

/// The operations the UI calls, each run to completion under the game lock.
pub struct Session {
    game: SharedGame,
    ticker: Ticker,
}

impl Session {
    pub fn new(game: Game) -> Self {
        Self {
            game: Arc::new(Mutex::new(game)),
            ticker: Ticker::new(),
        }
    }

    pub fn from_config(config: GameConfig) -> Result<Self, RuntimeError> {
        Game::from_config(config).map(Self::new)
    }

    /// Handle to the shared game, e.g. for a custom driver.
    pub fn game(&self) -> SharedGame {
        Arc::clone(&self.game)
    }

    /// Stop the ticker and reset to the starting state.
    pub fn initialize_game(&mut self) {
        self.ticker.stop(&self.game);
        lock_game(&self.game).initialize();
    }

    /// Start (or restart) periodic time steps at the configured interval.
    pub fn start_time_progression(&mut self) -> Result<(), RuntimeError> {
        let period = Duration::from_millis(lock_game(&self.game).config().tick_interval_ms);
        self.ticker.start(&self.game, period)
    }

    pub fn stop_time_progression(&mut self) {
        self.ticker.stop(&self.game);
    }

    pub fn is_time_progressing(&self) -> bool {
        self.ticker.is_running()
    }

    pub fn generate_business(&self) -> GenerationOutcome {
        lock_game(&self.game).generate_business()
    }

    pub fn update_business_price(&self, id: BusinessId, price: Decimal) -> bool {
        lock_game(&self.game).update_business_price(id, price)
    }

    pub fn shutdown_business(&self, id: BusinessId) -> bool {
        lock_game(&self.game).shutdown_business(id)
    }

    pub fn upgrade_ai_model(&self) {
        lock_game(&self.game).upgrade_ai_model();
    }

    pub fn process_time_step(&self) -> TickReport {
        lock_game(&self.game).process_time_step()
    }

    /// Copy of the full state for display.
    pub fn snapshot(&self) -> GameState {
        lock_game(&self.game).state().clone()
    }

    pub fn time_view(&self) -> TimeView {
        lock_game(&self.game).time_view()
    }

    pub fn drain_events(&self) -> Vec<GameEvent> {
        lock_game(&self.game).drain_events()
    }

    pub fn ticks(&self) -> u64 {
        lock_game(&self.game).ticks()
    }
}
