//! The transition engine: every mutation of [`GameState`] goes through [`Game`].

use crate::clock::{Clock, SystemClock};
use crate::factory::synthesize_business;
use crate::random::{ChaChaSource, RandomSource};
use crate::RuntimeError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, info, warn};
use vibe_core::{
    add_months, clamp_price, validate_config, BusinessId, GameConfig, GameEvent, GameState,
    TimeView,
};
use vibe_econ::{business_maus, settle, Settlement};

/// Result of a generation attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// Gated by the cooldown; nothing changed.
    CoolingDown { remaining: u32 },
    /// The model failed; the cooldown was still consumed.
    Failed,
    Created(BusinessId),
}

/// What a single time step did.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TickReport {
    pub at: DateTime<Utc>,
    /// Subscription fee charged by this step, if one was due.
    pub payment: Option<Decimal>,
    pub settlement: Settlement,
    pub cash: Decimal,
    pub generation_cooldown: u32,
}

/// Events kept for the host before the oldest are dropped.
pub const MAX_PENDING_EVENTS: usize = 256;

/// Game state plus the collaborators the transitions need.
pub struct Game {
    config: GameConfig,
    state: GameState,
    rng: Box<dyn RandomSource>,
    clock: Arc<dyn Clock>,
    events: VecDeque<GameEvent>,
    ticks: u64,
    ticker_epoch: u64,
}

impl Game {
    /// Build a game from a validated configuration and explicit collaborators.
    pub fn new(
        config: GameConfig,
        rng: Box<dyn RandomSource>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, RuntimeError> {
        validate_config(&config)?;
        let state = GameState::new(&config, clock.now());
        Ok(Self {
            config,
            state,
            rng,
            clock,
            events: VecDeque::new(),
            ticks: 0,
            ticker_epoch: 0,
        })
    }

    /// System clock and a ChaCha source seeded from `config.rng_seed` (entropy if unset).
    pub fn from_config(config: GameConfig) -> Result<Self, RuntimeError> {
        let rng = match config.rng_seed {
            Some(seed) => ChaChaSource::seeded(seed),
            None => ChaChaSource::from_entropy(),
        };
        Self::new(config, Box::new(rng), Arc::new(SystemClock))
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Number of time steps processed since the last initialization.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn time_view(&self) -> TimeView {
        self.state.time_view()
    }

    /// Take the events recorded since the previous drain.
    ///
    /// At most [`MAX_PENDING_EVENTS`] are kept; a host that drains rarely
    /// loses the oldest ones.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.events.drain(..).collect()
    }

    fn push_event(&mut self, event: GameEvent) {
        if self.events.len() == MAX_PENDING_EVENTS {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    pub(crate) fn ticker_epoch(&self) -> u64 {
        self.ticker_epoch
    }

    /// Invalidate any ticker task started under the current epoch.
    pub(crate) fn bump_ticker_epoch(&mut self) {
        self.ticker_epoch = self.ticker_epoch.wrapping_add(1);
    }

    /// Discard everything and start over from the configured starting state.
    pub fn initialize(&mut self) {
        let now = self.clock.now();
        self.state = GameState::new(&self.config, now);
        self.events.clear();
        self.ticks = 0;
        info!(cash = %self.state.cash, model = %self.state.current_ai_model.id, "game initialized");
    }

    /// Attempt to generate one business.
    pub fn generate_business(&mut self) -> GenerationOutcome {
        if self.state.generation_cooldown > 0 {
            debug!(remaining = self.state.generation_cooldown, "generation gated by cooldown");
            return GenerationOutcome::CoolingDown {
                remaining: self.state.generation_cooldown,
            };
        }
        let now = self.clock.now();
        let model = &self.state.current_ai_model;
        let failure_roll = self.rng.next_unit() * 100.0;
        let outcome = if failure_roll < f64::from(model.failure_rate) {
            debug!(failure_roll, failure_rate = model.failure_rate, "generation failed");
            self.push_event(GameEvent::GenerationFailed { at: now });
            GenerationOutcome::Failed
        } else {
            let business = synthesize_business(self.rng.as_mut(), model, now);
            let id = business.id;
            info!(%id, name = %business.name, maus = business.maus, "business generated");
            self.state.businesses.push(business);
            self.push_event(GameEvent::BusinessGenerated { business_id: id });
            GenerationOutcome::Created(id)
        };
        self.state.generation_cooldown = self.state.current_ai_model.cooldown_seconds;
        self.state.last_generation_time = now;
        outcome
    }

    /// Set a clamped price and recompute MAUs. Returns false for an unknown id.
    pub fn update_business_price(&mut self, id: BusinessId, requested: Decimal) -> bool {
        let price = clamp_price(requested);
        let quality_multiplier = self.state.current_ai_model.quality_multiplier();
        let Some(business) = self.state.business_mut(id) else {
            debug!(%id, "price update for unknown business ignored");
            return false;
        };
        business.price = price;
        business.maus = business_maus(business, quality_multiplier);
        let maus = business.maus;
        info!(%id, %price, maus, "price updated");
        self.push_event(GameEvent::PriceUpdated {
            business_id: id,
            price,
            maus,
        });
        true
    }

    /// Soft-delete a business. Returns false for an unknown id.
    pub fn shutdown_business(&mut self, id: BusinessId) -> bool {
        let Some(business) = self.state.business_mut(id) else {
            debug!(%id, "shutdown of unknown business ignored");
            return false;
        };
        if business.is_active {
            business.is_active = false;
            info!(%id, name = %business.name, "business shut down");
            self.push_event(GameEvent::BusinessShutdown { business_id: id });
        }
        true
    }

    /// Model upgrades are not available yet; this only reports that.
    pub fn upgrade_ai_model(&self) {
        warn!(model = %self.state.current_ai_model.id, "AI model upgrade is not implemented");
    }

    /// One settlement step at the clock's current instant.
    pub fn process_time_step(&mut self) -> TickReport {
        let now = self.clock.now();
        self.process_time_step_at(now)
    }

    /// One settlement step at `now`.
    ///
    /// At most one subscription payment is charged per call, however many
    /// cycles have elapsed.
    pub fn process_time_step_at(&mut self, now: DateTime<Utc>) -> TickReport {
        let mut cash = self.state.cash;
        let mut payment = None;
        if now >= self.state.next_payment_date {
            let amount = self.state.current_ai_model.monthly_cost;
            cash -= amount;
            self.state.last_payment_date = now;
            self.state.next_payment_date = add_months(now, self.config.payment_cycle_months);
            payment = Some(amount);
            info!(%amount, next = %self.state.next_payment_date, "subscription payment charged");
            self.push_event(GameEvent::PaymentProcessed { amount, at: now });
        }

        let settlement = settle(&self.state.businesses);
        cash += settlement.daily_profit;
        self.state.cash = cash.max(Decimal::ZERO);

        self.state.generation_cooldown = self.decayed_cooldown(now);
        self.state.current_date = now;
        self.ticks += 1;
        debug!(
            cash = %self.state.cash,
            daily_profit = %settlement.daily_profit,
            cooldown = self.state.generation_cooldown,
            "time step processed"
        );

        TickReport {
            at: now,
            payment,
            settlement,
            cash: self.state.cash,
            generation_cooldown: self.state.generation_cooldown,
        }
    }

    /// Remaining cooldown derived from whole seconds since the last attempt.
    ///
    /// This is `min(cooldown, cooldown_seconds - elapsed)`, not
    /// `cooldown - elapsed`: subtracting the full elapsed time from the
    /// already-decayed value would compound on every tick. The result never
    /// increases and does not depend on how often it is evaluated.
    fn decayed_cooldown(&self, now: DateTime<Utc>) -> u32 {
        let current = self.state.generation_cooldown;
        if current == 0 {
            return 0;
        }
        let elapsed = (now - self.state.last_generation_time).num_seconds().max(0);
        let elapsed = u32::try_from(elapsed).unwrap_or(u32::MAX);
        let remaining = self
            .state
            .current_ai_model
            .cooldown_seconds
            .saturating_sub(elapsed);
        current.min(remaining)
    }
}
