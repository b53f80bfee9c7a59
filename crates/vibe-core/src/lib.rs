#![deny(warnings)]

//! Core domain models and invariants for Vibe Coder.
//!
//! This crate defines the serializable game state shared by the economy
//! formulas and the transition engine, the fixed starting configuration, and
//! validation helpers that check the state invariants.

use chrono::{DateTime, Months, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Lowest price a business may charge.
pub const MIN_BUSINESS_PRICE: Decimal = Decimal::ONE;

/// Highest price a business may charge (one billion).
pub const MAX_BUSINESS_PRICE: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// Price assigned to every freshly generated business.
pub const STARTING_PRICE: Decimal = Decimal::from_parts(10, 0, 0, false, 0);

/// Cash balance at the start of a game.
pub const STARTING_CASH: Decimal = Decimal::from_parts(40, 0, 0, false, 0);

/// Nominal wall-clock period between time steps.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1_000;

/// The only AI model tier available in this version.
pub const SLOPPY_COPY_AI: AiModel = AiModel {
    id: Cow::Borrowed("sloppy-copy"),
    name: Cow::Borrowed("Sloppy Copy"),
    monthly_cost: Decimal::from_parts(10, 0, 0, false, 0),
    quality_level: 20,
    cooldown_seconds: 60,
    failure_rate: 30,
};

/// AI model used to generate businesses.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiModel {
    /// Stable identifier, e.g. "sloppy-copy".
    pub id: Cow<'static, str>,
    /// Display name.
    pub name: Cow<'static, str>,
    /// Subscription fee charged once per payment cycle.
    pub monthly_cost: Decimal,
    /// Quality level in [0, 100].
    pub quality_level: u8,
    /// Seconds required between generation attempts (> 0).
    pub cooldown_seconds: u32,
    /// Percent chance in [0, 100] that an attempt yields nothing.
    pub failure_rate: u8,
}

impl AiModel {
    /// Quality level scaled to [0, 1].
    pub fn quality_multiplier(&self) -> f64 {
        f64::from(self.quality_level) / 100.0
    }
}

impl Default for AiModel {
    fn default() -> Self {
        SLOPPY_COPY_AI
    }
}

/// Unique identifier of a generated business.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BusinessId(pub Uuid);

impl BusinessId {
    /// Fresh random identifier.
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for BusinessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A business produced by the AI model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Business {
    pub id: BusinessId,
    pub name: String,
    pub description: String,
    /// Usefulness score (> 0).
    pub usefulness: f64,
    /// Fun score (> 0).
    pub fun: f64,
    /// Monthly operating cost, fixed at creation.
    pub operating_cost: Decimal,
    /// Price in [MIN_BUSINESS_PRICE, MAX_BUSINESS_PRICE].
    pub price: Decimal,
    /// Monthly active users; recomputed whenever the price changes.
    pub maus: u64,
    pub created_at: DateTime<Utc>,
    /// Cleared on shutdown, never set again.
    pub is_active: bool,
}

/// Tunable starting parameters of a game.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Cash balance at initialization.
    pub starting_cash: Decimal,
    /// Months between subscription payments.
    pub payment_cycle_months: u32,
    /// Wall-clock period of the ticker.
    pub tick_interval_ms: u64,
    /// Seed for the deterministic RNG; entropy when absent.
    pub rng_seed: Option<u64>,
    /// AI model tier in use.
    pub ai_model: AiModel,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            starting_cash: STARTING_CASH,
            payment_cycle_months: 1,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            rng_seed: None,
            ai_model: SLOPPY_COPY_AI,
        }
    }
}

/// The single mutable aggregate of a running game.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// Cash balance, never negative.
    pub cash: Decimal,
    /// Instant of the latest time step.
    pub current_date: DateTime<Utc>,
    pub game_start_date: DateTime<Utc>,
    pub last_payment_date: DateTime<Utc>,
    /// Always `last_payment_date` plus one payment cycle.
    pub next_payment_date: DateTime<Utc>,
    pub current_ai_model: AiModel,
    /// Businesses in creation order.
    pub businesses: Vec<Business>,
    /// Seconds left before another generation attempt is allowed.
    pub generation_cooldown: u32,
    /// Instant of the latest generation attempt, successful or not.
    pub last_generation_time: DateTime<Utc>,
}

impl GameState {
    /// Fresh state from a starting configuration at `now`.
    pub fn new(config: &GameConfig, now: DateTime<Utc>) -> Self {
        Self {
            cash: config.starting_cash,
            current_date: now,
            game_start_date: now,
            last_payment_date: now,
            next_payment_date: add_months(now, config.payment_cycle_months),
            current_ai_model: config.ai_model.clone(),
            businesses: Vec::new(),
            generation_cooldown: 0,
            last_generation_time: now,
        }
    }

    pub fn business(&self, id: BusinessId) -> Option<&Business> {
        self.businesses.iter().find(|b| b.id == id)
    }

    pub fn business_mut(&mut self, id: BusinessId) -> Option<&mut Business> {
        self.businesses.iter_mut().find(|b| b.id == id)
    }

    /// Businesses that take part in settlement.
    pub fn active_businesses(&self) -> impl Iterator<Item = &Business> {
        self.businesses.iter().filter(|b| b.is_active)
    }

    pub fn can_generate(&self) -> bool {
        self.generation_cooldown == 0
    }

    /// Derived calendar and cooldown figures relative to `current_date`.
    pub fn time_view(&self) -> TimeView {
        let cooldown_max = self.current_ai_model.cooldown_seconds;
        let cooldown_progress = if self.generation_cooldown == 0 || cooldown_max == 0 {
            1.0
        } else {
            f64::from(cooldown_max.saturating_sub(self.generation_cooldown)) / f64::from(cooldown_max)
        };
        TimeView {
            days_since_start: (self.current_date - self.game_start_date).num_days(),
            days_since_last_payment: (self.current_date - self.last_payment_date).num_days(),
            days_until_next_payment: (self.next_payment_date - self.current_date)
                .num_days()
                .max(0),
            cooldown_remaining: self.generation_cooldown,
            can_generate: self.can_generate(),
            cooldown_progress,
        }
    }
}

/// Read-only calendar view for display.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeView {
    pub days_since_start: i64,
    pub days_since_last_payment: i64,
    pub days_until_next_payment: i64,
    pub cooldown_remaining: u32,
    pub can_generate: bool,
    /// Fraction of the cooldown already elapsed, 1.0 when ready.
    pub cooldown_progress: f64,
}

/// Notable state changes, drained by the host for feedback.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameEvent {
    BusinessGenerated { business_id: BusinessId },
    GenerationFailed { at: DateTime<Utc> },
    PriceUpdated {
        business_id: BusinessId,
        price: Decimal,
        maus: u64,
    },
    BusinessShutdown { business_id: BusinessId },
    PaymentProcessed { amount: Decimal, at: DateTime<Utc> },
}

/// Calendar-month addition; days past the end of the target month clamp to its last day.
pub fn add_months(at: DateTime<Utc>, months: u32) -> DateTime<Utc> {
    at.checked_add_months(Months::new(months))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Clamp a requested price into the allowed range.
pub fn clamp_price(requested: Decimal) -> Decimal {
    requested.clamp(MIN_BUSINESS_PRICE, MAX_BUSINESS_PRICE)
}

/// Validation errors for domain invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Quality level outside [0, 100].
    #[error("quality level {0} is out of range [0, 100]")]
    QualityOutOfRange(u8),
    /// Failure rate outside [0, 100].
    #[error("failure rate {0} is out of range [0, 100]")]
    FailureRateOutOfRange(u8),
    /// Model cooldown must be positive.
    #[error("cooldown must be > 0 seconds")]
    ZeroCooldown,
    /// Cash, prices and costs must be non-negative.
    #[error("negative monetary value is invalid")]
    NegativeMoney,
    /// Price outside [1, 1_000_000_000].
    #[error("price {0} is outside [1, 1000000000]")]
    PriceOutOfRange(Decimal),
    /// Scores must be finite and positive.
    #[error("attribute scores must be finite and > 0")]
    InvalidScore,
    /// Generation cooldown above the model cooldown.
    #[error("generation cooldown {cooldown}s exceeds model cooldown {max}s")]
    CooldownOutOfRange { cooldown: u32, max: u32 },
    /// `next_payment_date` is not one cycle after `last_payment_date`.
    #[error("next payment date does not follow last payment by one cycle")]
    PaymentScheduleBroken,
    /// Two businesses share an id.
    #[error("duplicate business id: {0}")]
    DuplicateBusiness(BusinessId),
    /// Payment cycle must be at least one month.
    #[error("payment cycle must be >= 1 month")]
    ZeroPaymentCycle,
    /// Ticker period must be positive.
    #[error("tick interval must be > 0 ms")]
    ZeroTickInterval,
}

/// Validate an AI model tier.
pub fn validate_ai_model(m: &AiModel) -> Result<(), ValidationError> {
    if m.quality_level > 100 {
        return Err(ValidationError::QualityOutOfRange(m.quality_level));
    }
    if m.failure_rate > 100 {
        return Err(ValidationError::FailureRateOutOfRange(m.failure_rate));
    }
    if m.cooldown_seconds == 0 {
        return Err(ValidationError::ZeroCooldown);
    }
    if m.monthly_cost < Decimal::ZERO {
        return Err(ValidationError::NegativeMoney);
    }
    Ok(())
}

/// Validate a starting configuration.
pub fn validate_config(c: &GameConfig) -> Result<(), ValidationError> {
    validate_ai_model(&c.ai_model)?;
    if c.starting_cash < Decimal::ZERO {
        return Err(ValidationError::NegativeMoney);
    }
    if c.payment_cycle_months == 0 {
        return Err(ValidationError::ZeroPaymentCycle);
    }
    if c.tick_interval_ms == 0 {
        return Err(ValidationError::ZeroTickInterval);
    }
    Ok(())
}

/// Validate a single business.
pub fn validate_business(b: &Business) -> Result<(), ValidationError> {
    if b.price < MIN_BUSINESS_PRICE || b.price > MAX_BUSINESS_PRICE {
        return Err(ValidationError::PriceOutOfRange(b.price));
    }
    if b.operating_cost < Decimal::ZERO {
        return Err(ValidationError::NegativeMoney);
    }
    if !(b.usefulness.is_finite() && b.fun.is_finite()) || b.usefulness <= 0.0 || b.fun <= 0.0 {
        return Err(ValidationError::InvalidScore);
    }
    Ok(())
}

/// Validate the whole game state, including the payment schedule.
pub fn validate_game_state(
    state: &GameState,
    payment_cycle_months: u32,
) -> Result<(), ValidationError> {
    validate_ai_model(&state.current_ai_model)?;
    if state.cash < Decimal::ZERO {
        return Err(ValidationError::NegativeMoney);
    }
    let max = state.current_ai_model.cooldown_seconds;
    if state.generation_cooldown > max {
        return Err(ValidationError::CooldownOutOfRange {
            cooldown: state.generation_cooldown,
            max,
        });
    }
    if state.next_payment_date != add_months(state.last_payment_date, payment_cycle_months) {
        return Err(ValidationError::PaymentScheduleBroken);
    }
    let mut ids = BTreeSet::new();
    for b in &state.businesses {
        validate_business(b)?;
        if !ids.insert(b.id) {
            return Err(ValidationError::DuplicateBusiness(b.id));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 31, 12, 0, 0).unwrap()
    }

    fn business(price: Decimal) -> Business {
        Business {
            id: BusinessId::new_v4(),
            name: "QuickHub".to_string(),
            description: "Experience the future of productivity with QuickHub".to_string(),
            usefulness: 60.0,
            fun: 60.0,
            operating_cost: Decimal::new(150, 0),
            price,
            maus: 108,
            created_at: t0(),
            is_active: true,
        }
    }

    #[test]
    fn initial_state_matches_starting_configuration() {
        let s = GameState::new(&GameConfig::default(), t0());
        assert_eq!(s.cash, Decimal::new(40, 0));
        assert!(s.businesses.is_empty());
        assert_eq!(s.generation_cooldown, 0);
        assert_eq!(s.current_ai_model, SLOPPY_COPY_AI);
        assert_eq!(s.game_start_date, t0());
        assert_eq!(s.last_payment_date, t0());
        assert_eq!(s.last_generation_time, t0());
        validate_game_state(&s, 1).unwrap();
    }

    #[test]
    fn add_months_clamps_to_month_end() {
        let next = add_months(t0(), 1);
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap());
    }

    #[test]
    fn sloppy_copy_constants() {
        assert_eq!(SLOPPY_COPY_AI.monthly_cost, Decimal::new(10, 0));
        assert_eq!(SLOPPY_COPY_AI.cooldown_seconds, 60);
        assert_eq!(SLOPPY_COPY_AI.failure_rate, 30);
        assert!((SLOPPY_COPY_AI.quality_multiplier() - 0.2).abs() < 1e-12);
        assert_eq!(MAX_BUSINESS_PRICE, Decimal::new(1_000_000_000, 0));
        validate_ai_model(&SLOPPY_COPY_AI).unwrap();
        validate_config(&GameConfig::default()).unwrap();
    }

    #[test]
    fn state_snapshot_roundtrip() {
        let mut s = GameState::new(&GameConfig::default(), t0());
        s.businesses.push(business(Decimal::new(10, 0)));
        let json = serde_json::to_string_pretty(&s).unwrap();
        let back: GameState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn partial_config_json_uses_defaults() {
        let c: GameConfig = serde_json::from_str(r#"{"rng_seed": 7}"#).unwrap();
        assert_eq!(c.rng_seed, Some(7));
        assert_eq!(c.starting_cash, STARTING_CASH);
        assert_eq!(c.ai_model, SLOPPY_COPY_AI);
    }

    #[test]
    fn validation_rejects_broken_invariants() {
        let mut s = GameState::new(&GameConfig::default(), t0());
        s.generation_cooldown = 61;
        assert_eq!(
            validate_game_state(&s, 1),
            Err(ValidationError::CooldownOutOfRange {
                cooldown: 61,
                max: 60
            })
        );

        let mut s = GameState::new(&GameConfig::default(), t0());
        s.next_payment_date = t0();
        assert_eq!(
            validate_game_state(&s, 1),
            Err(ValidationError::PaymentScheduleBroken)
        );

        let mut s = GameState::new(&GameConfig::default(), t0());
        let b = business(Decimal::new(10, 0));
        s.businesses.push(b.clone());
        s.businesses.push(b.clone());
        assert_eq!(
            validate_game_state(&s, 1),
            Err(ValidationError::DuplicateBusiness(b.id))
        );

        let mut s = GameState::new(&GameConfig::default(), t0());
        s.businesses.push(business(Decimal::ZERO));
        assert_eq!(
            validate_game_state(&s, 1),
            Err(ValidationError::PriceOutOfRange(Decimal::ZERO))
        );

        let bad = GameConfig {
            payment_cycle_months: 0,
            ..GameConfig::default()
        };
        assert_eq!(validate_config(&bad), Err(ValidationError::ZeroPaymentCycle));
    }

    #[test]
    fn time_view_reports_cooldown_progress() {
        let mut s = GameState::new(&GameConfig::default(), t0());
        let view = s.time_view();
        assert!(view.can_generate);
        assert_eq!(view.cooldown_progress, 1.0);
        assert_eq!(view.days_until_next_payment, 29);

        s.generation_cooldown = 45;
        s.current_date = t0() + chrono::Duration::days(3);
        let view = s.time_view();
        assert!(!view.can_generate);
        assert_eq!(view.cooldown_remaining, 45);
        assert!((view.cooldown_progress - 0.25).abs() < 1e-12);
        assert_eq!(view.days_since_start, 3);
        assert_eq!(view.days_since_last_payment, 3);
        assert_eq!(view.days_until_next_payment, 26);
    }

    proptest! {
        #[test]
        fn clamp_price_stays_in_bounds(mantissa in any::<i64>(), scale in 0u32..10) {
            let p = clamp_price(Decimal::new(mantissa, scale));
            prop_assert!(p >= MIN_BUSINESS_PRICE);
            prop_assert!(p <= MAX_BUSINESS_PRICE);
        }

        #[test]
        fn in_range_models_validate(q in 0u8..=100, f in 0u8..=100, cd in 1u32..3600) {
            let m = AiModel { quality_level: q, failure_rate: f, cooldown_seconds: cd, ..SLOPPY_COPY_AI };
            prop_assert!(validate_ai_model(&m).is_ok());
        }
    }
}
