#![deny(warnings)]

//! Economic formulas for Vibe Coder.
//!
//! This crate provides the pure numeric pieces of the simulation:
//! - MAU growth under price pressure and AI model quality
//! - Monthly settlement of revenue and operating costs over active businesses
//! - Price validation and per-business / portfolio metrics for display

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use vibe_core::{clamp_price, Business, MAX_BUSINESS_PRICE, MIN_BUSINESS_PRICE};

/// Fixed month length used to turn monthly profit into a daily accrual.
pub const SETTLEMENT_DAYS_PER_MONTH: u32 = 30;

/// Lowest fraction of growth a price can leave in place.
pub const PRICE_IMPACT_FLOOR: f64 = 0.1;

/// Errors produced by economic helpers.
#[derive(Debug, Error, PartialEq)]
pub enum EconError {
    /// Numeric conversion from floating point failed.
    #[error("non-finite numeric conversion")]
    NonFinite,
}

/// Growth suppression from price: `max(0.1, 1 - price/100)`.
///
/// Example:
/// assert_eq!(price_impact(Decimal::new(50, 0)), 0.5);
pub fn price_impact(price: Decimal) -> f64 {
    let p = price.to_f64().unwrap_or(f64::MAX);
    PRICE_IMPACT_FLOOR.max(1.0 - p / 100.0)
}

/// Monthly active users for the given attributes.
///
/// `floor((usefulness + fun) / 2 * price_impact * quality_multiplier * 10)`,
/// never negative, saturating at `u64::MAX`.
pub fn calculate_maus(usefulness: f64, fun: f64, price: Decimal, quality_multiplier: f64) -> u64 {
    let base_growth_rate = (usefulness + fun) / 2.0;
    let growth = base_growth_rate * price_impact(price) * quality_multiplier;
    let maus = (growth * 10.0).floor();
    if !maus.is_finite() || maus <= 0.0 {
        return 0;
    }
    if maus >= u64::MAX as f64 {
        return u64::MAX;
    }
    maus as u64
}

/// [`calculate_maus`] for an existing business at its current price.
pub fn business_maus(b: &Business, quality_multiplier: f64) -> u64 {
    calculate_maus(b.usefulness, b.fun, b.price, quality_multiplier)
}

/// Convert a host-supplied floating point price into a clamped decimal.
///
/// Out-of-range values are clamped; NaN and infinities are rejected.
pub fn price_from_f64(requested: f64) -> Result<Decimal, EconError> {
    if !requested.is_finite() {
        return Err(EconError::NonFinite);
    }
    let bounded = requested.clamp(1.0, 1_000_000_000.0);
    Decimal::from_f64(bounded)
        .map(clamp_price)
        .ok_or(EconError::NonFinite)
}

/// Aggregate figures for one settlement.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    pub monthly_revenue: Decimal,
    pub monthly_operating_cost: Decimal,
    /// Revenue minus operating cost, may be negative.
    pub monthly_profit: Decimal,
    pub daily_profit: Decimal,
    pub active_businesses: usize,
}

/// Settle revenue and costs over the active businesses in `businesses`.
///
/// Inactive businesses are skipped.
pub fn settle<'a, I>(businesses: I) -> Settlement
where
    I: IntoIterator<Item = &'a Business>,
{
    let mut s = Settlement::default();
    for b in businesses.into_iter().filter(|b| b.is_active) {
        let revenue = Decimal::from(b.maus).saturating_mul(b.price);
        s.monthly_revenue = s.monthly_revenue.saturating_add(revenue);
        s.monthly_operating_cost = s.monthly_operating_cost.saturating_add(b.operating_cost);
        s.active_businesses += 1;
    }
    s.monthly_profit = s.monthly_revenue.saturating_sub(s.monthly_operating_cost);
    s.daily_profit = s.monthly_profit / Decimal::from(SETTLEMENT_DAYS_PER_MONTH);
    s
}

/// Display metrics for a single business.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BusinessMetrics {
    pub monthly_revenue: Decimal,
    pub monthly_profit: Decimal,
    /// Average of usefulness and fun.
    pub growth_rate: f64,
    /// Profit over revenue; `None` without revenue.
    pub profit_margin: Option<Decimal>,
}

pub fn business_metrics(b: &Business) -> BusinessMetrics {
    let monthly_revenue = Decimal::from(b.maus).saturating_mul(b.price);
    let monthly_profit = monthly_revenue.saturating_sub(b.operating_cost);
    let profit_margin = if monthly_revenue.is_zero() {
        None
    } else {
        monthly_profit.checked_div(monthly_revenue)
    };
    BusinessMetrics {
        monthly_revenue,
        monthly_profit,
        growth_rate: (b.usefulness + b.fun) / 2.0,
        profit_margin,
    }
}

/// Outcome of checking a requested price without applying it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// The price that would actually be applied.
    pub suggested_price: Decimal,
    pub min: Decimal,
    pub max: Decimal,
}

/// Check a requested price against the allowed range and the growth floor.
pub fn validate_price(requested: Decimal) -> PriceValidation {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    if requested < MIN_BUSINESS_PRICE {
        errors.push(format!("price must be at least {MIN_BUSINESS_PRICE}"));
    }
    if requested > MAX_BUSINESS_PRICE {
        errors.push(format!("price must be at most {MAX_BUSINESS_PRICE}"));
    }
    let suggested_price = clamp_price(requested);
    if price_impact(suggested_price) <= PRICE_IMPACT_FLOOR {
        warnings.push("price is high enough that growth is at its floor".to_string());
    }
    PriceValidation {
        is_valid: errors.is_empty(),
        errors,
        warnings,
        suggested_price,
        min: MIN_BUSINESS_PRICE,
        max: MAX_BUSINESS_PRICE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;
    use vibe_core::BusinessId;

    fn business(maus: u64, price: i64, cost: i64, active: bool) -> Business {
        Business {
            id: BusinessId::new_v4(),
            name: "SmartLab".into(),
            description: "SmartLab makes complex workflows simple and efficient".into(),
            usefulness: 60.0,
            fun: 60.0,
            operating_cost: Decimal::new(cost, 0),
            price: Decimal::new(price, 0),
            maus,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            is_active: active,
        }
    }

    #[test]
    fn maus_for_reference_business() {
        assert_eq!(calculate_maus(60.0, 60.0, Decimal::new(10, 0), 0.2), 108);
    }

    #[test]
    fn price_impact_has_a_floor() {
        assert_eq!(price_impact(Decimal::new(50, 0)), 0.5);
        assert_eq!(price_impact(Decimal::new(95, 0)), PRICE_IMPACT_FLOOR);
        assert_eq!(price_impact(MAX_BUSINESS_PRICE), PRICE_IMPACT_FLOOR);
        assert_eq!(calculate_maus(60.0, 60.0, MAX_BUSINESS_PRICE, 1.0), 60);
    }

    #[test]
    fn zero_quality_means_no_users() {
        assert_eq!(calculate_maus(80.0, 80.0, Decimal::ONE, 0.0), 0);
    }

    #[test]
    fn settlement_skips_inactive_businesses() {
        let list = vec![
            business(100, 10, 150, true),
            business(500, 20, 90, false),
            business(20, 5, 40, true),
        ];
        let s = settle(&list);
        assert_eq!(s.active_businesses, 2);
        assert_eq!(s.monthly_revenue, Decimal::new(1100, 0));
        assert_eq!(s.monthly_operating_cost, Decimal::new(190, 0));
        assert_eq!(s.monthly_profit, Decimal::new(910, 0));
        assert_eq!(s.daily_profit, Decimal::new(910, 0) / Decimal::new(30, 0));
    }

    #[test]
    fn settlement_profit_may_be_negative() {
        let list = vec![business(0, 10, 300, true)];
        let s = settle(&list);
        assert_eq!(s.monthly_profit, Decimal::new(-300, 0));
        assert_eq!(s.daily_profit, Decimal::new(-10, 0));
    }

    #[test]
    fn empty_portfolio_settles_to_zero() {
        let s = settle(&Vec::<Business>::new());
        assert_eq!(s, Settlement::default());
    }

    #[test]
    fn metrics_margin() {
        let m = business_metrics(&business(100, 10, 500, true));
        assert_eq!(m.monthly_revenue, Decimal::new(1000, 0));
        assert_eq!(m.monthly_profit, Decimal::new(500, 0));
        assert_eq!(m.profit_margin, Some(Decimal::new(5, 1)));
        assert_eq!(m.growth_rate, 60.0);
        assert_eq!(business_metrics(&business(0, 10, 5, true)).profit_margin, None);
    }

    #[test]
    fn price_validation_reports_without_applying() {
        let v = validate_price(Decimal::new(-10, 0));
        assert!(!v.is_valid);
        assert_eq!(v.suggested_price, MIN_BUSINESS_PRICE);
        let v = validate_price(Decimal::new(25, 0));
        assert!(v.is_valid);
        assert!(v.warnings.is_empty());
        let v = validate_price(Decimal::new(2_000_000_000, 0));
        assert!(!v.is_valid);
        assert_eq!(v.suggested_price, MAX_BUSINESS_PRICE);
        assert_eq!(v.warnings.len(), 1);
    }

    #[test]
    fn float_prices_are_clamped_or_rejected() {
        assert_eq!(price_from_f64(-10.0), Ok(Decimal::ONE));
        assert_eq!(price_from_f64(25.0), Ok(Decimal::new(25, 0)));
        assert_eq!(price_from_f64(1e300), Ok(MAX_BUSINESS_PRICE));
        assert_eq!(price_from_f64(f64::NAN), Err(EconError::NonFinite));
        assert_eq!(price_from_f64(f64::INFINITY), Err(EconError::NonFinite));
    }

    proptest! {
        #[test]
        fn maus_non_increasing_in_price(u in 25.0f64..130.0, f in 25.0f64..130.0,
                                        p in 1i64..1_000_000, q in 0.0f64..=1.0) {
            let low = calculate_maus(u, f, Decimal::new(p, 0), q);
            let high = calculate_maus(u, f, Decimal::new(p + 1, 0), q);
            prop_assert!(high <= low);
        }

        #[test]
        fn daily_profit_is_a_thirtieth(maus in 0u64..10_000, price in 1i64..1_000, cost in 50i64..250) {
            let list = vec![business(maus, price, cost, true)];
            let s = settle(&list);
            let back = s.daily_profit * Decimal::from(SETTLEMENT_DAYS_PER_MONTH);
            prop_assert!((back - s.monthly_profit).abs() < Decimal::new(1, 20));
        }
    }
}
