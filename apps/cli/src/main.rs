#![deny(warnings)]

//! Headless driver: runs a game on a manual or real clock and reports KPIs.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;
use vibe_core::{validate_game_state, GameConfig, GameState};
use vibe_econ::{price_from_f64, settle};
use vibe_runtime::{ChaChaSource, Game, GenerationOutcome, ManualClock, Session};

#[derive(Debug, Default)]
struct Args {
    config: Option<String>,
    seed: Option<u64>,
    ticks: Option<u64>,
    realtime_secs: Option<u64>,
    autoplay_price: Option<f64>,
    json: bool,
}

fn parse_args() -> Args {
    let mut args = Args::default();
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" => args.config = it.next(),
            "--seed" => args.seed = it.next().and_then(|s| s.parse().ok()),
            "--ticks" => args.ticks = it.next().and_then(|s| s.parse().ok()),
            "--realtime-secs" => args.realtime_secs = it.next().and_then(|s| s.parse().ok()),
            "--autoplay-price" => args.autoplay_price = it.next().and_then(|s| s.parse().ok()),
            "--json" => args.json = true,
            _ => {}
        }
    }
    args
}

fn load_config(args: &Args) -> Result<GameConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {path}"))?;
            serde_json::from_str(&raw).with_context(|| format!("parsing config {path}"))?
        }
        None => GameConfig::default(),
    };
    if args.seed.is_some() {
        config.rng_seed = args.seed;
    }
    Ok(config)
}

/// Generate whenever the cooldown allows, repricing new businesses if asked.
fn autoplay(session: &Session, price: Option<f64>) -> Result<()> {
    if let GenerationOutcome::Created(id) = session.generate_business() {
        if let Some(p) = price {
            session.update_business_price(id, price_from_f64(p)?);
        }
    }
    Ok(())
}

/// Deterministic run on a manual clock, one tick interval per step.
fn run_headless(config: GameConfig, ticks: u64, price: Option<f64>) -> Result<Session> {
    let clock = ManualClock::new(chrono::Utc::now());
    let rng = ChaChaSource::seeded(config.rng_seed.unwrap_or(42));
    let step = chrono::Duration::milliseconds(i64::try_from(config.tick_interval_ms)?);
    let session = Session::new(Game::new(config, Box::new(rng), Arc::new(clock.clone()))?);
    for _ in 0..ticks {
        autoplay(&session, price)?;
        clock.advance(step);
        session.process_time_step();
    }
    Ok(session)
}

/// Real ticker on the system clock for `secs` seconds.
async fn run_realtime(config: GameConfig, secs: u64, price: Option<f64>) -> Result<Session> {
    let mut session = Session::from_config(config)?;
    session.start_time_progression()?;
    let deadline = tokio::time::Instant::now() + Duration::from_secs(secs);
    while tokio::time::Instant::now() < deadline {
        autoplay(&session, price)?;
        tokio::time::sleep(Duration::from_millis(250)).await;
    }
    session.stop_time_progression();
    Ok(session)
}

fn report(state: &GameState, ticks: u64) {
    let s = settle(&state.businesses);
    let total_maus: u64 = state.active_businesses().map(|b| b.maus).sum();
    println!(
        "KPI | ticks: {} | cash: ${} | businesses: {}/{} active | MAUs: {} | monthly profit: ${} | next payment: {}",
        ticks,
        state.cash.round_dp(2),
        s.active_businesses,
        state.businesses.len(),
        total_maus,
        s.monthly_profit.round_dp(2),
        state.next_payment_date.format("%Y-%m-%d"),
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::DEBUG)
        .init();

    let args = parse_args();
    info!(?args, "starting CLI");
    let config = load_config(&args)?;
    let cycle = config.payment_cycle_months;

    let session = match args.realtime_secs {
        Some(secs) => run_realtime(config, secs, args.autoplay_price).await?,
        None => run_headless(config, args.ticks.unwrap_or(0), args.autoplay_price)?,
    };

    let state = session.snapshot();
    validate_game_state(&state, cycle)?;
    for event in session.drain_events() {
        info!(?event, "event");
    }
    report(&state, session.ticks());
    if args.json {
        println!("{}", serde_json::to_string_pretty(&state)?);
    }
    Ok(())
}
