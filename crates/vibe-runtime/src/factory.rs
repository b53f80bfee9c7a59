//! Synthesis of new businesses with randomized attributes and flavor text.

use crate::random::{pick, RandomSource};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use vibe_core::{AiModel, Business, BusinessId, STARTING_PRICE};
use vibe_econ::calculate_maus;

const NAME_PREFIXES: [&str; 8] = [
    "Quick", "Smart", "Easy", "Super", "Ultra", "Mega", "Pro", "Fast",
];
const NAME_SUFFIXES: [&str; 8] = ["Hub", "Pro", "Plus", "Max", "Zone", "Spot", "Lab", "Works"];
const DESCRIPTION_TEMPLATES: usize = 5;

/// Width and base of the usefulness/fun roll before the quality bonus.
const SCORE_SPREAD: f64 = 50.0;
const SCORE_BASE: f64 = 25.0;
const QUALITY_BONUS: f64 = 25.0;

/// Width and base of the operating cost roll.
const COST_SPREAD: f64 = 200.0;
const COST_BASE: u32 = 50;

/// Prefix + suffix, e.g. "QuickHub".
pub fn generate_name(rng: &mut dyn RandomSource) -> String {
    let prefix = pick(rng, &NAME_PREFIXES).copied().unwrap_or("Quick");
    let suffix = pick(rng, &NAME_SUFFIXES).copied().unwrap_or("Hub");
    format!("{prefix}{suffix}")
}

pub fn generate_description(rng: &mut dyn RandomSource, name: &str) -> String {
    let idx = (rng.next_unit() * DESCRIPTION_TEMPLATES as f64).floor() as usize;
    match idx {
        0 => format!("{name} revolutionizes how you manage your daily tasks"),
        1 => format!("Experience the future of productivity with {name}"),
        2 => format!("{name} makes complex workflows simple and efficient"),
        3 => format!("Transform your business operations with {name}"),
        _ => format!("{name} - the all-in-one solution for modern professionals"),
    }
}

fn roll_score(rng: &mut dyn RandomSource, quality_multiplier: f64) -> f64 {
    (rng.next_unit() * SCORE_SPREAD).floor() + SCORE_BASE + quality_multiplier * QUALITY_BONUS
}

/// Build a new active business at the starting price.
///
/// Draw order: name prefix, name suffix, description, usefulness, fun,
/// operating cost.
pub fn synthesize_business(
    rng: &mut dyn RandomSource,
    model: &AiModel,
    now: DateTime<Utc>,
) -> Business {
    let quality_multiplier = model.quality_multiplier();
    let name = generate_name(rng);
    let description = generate_description(rng, &name);
    let usefulness = roll_score(rng, quality_multiplier);
    let fun = roll_score(rng, quality_multiplier);
    let cost_roll = (rng.next_unit() * COST_SPREAD).floor() as u32;
    let price = STARTING_PRICE;
    Business {
        id: BusinessId::new_v4(),
        name,
        description,
        usefulness,
        fun,
        operating_cost: Decimal::from(cost_roll + COST_BASE),
        price,
        maus: calculate_maus(usefulness, fun, price, quality_multiplier),
        created_at: now,
        is_active: true,
    }
}
