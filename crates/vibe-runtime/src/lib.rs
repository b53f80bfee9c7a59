#![deny(warnings)]

//! Transition engine and time progression for Vibe Coder.
//!
//! [`Game`] owns the [`vibe_core::GameState`] and applies the player
//! transitions (generate, reprice, shut down) and the periodic time step.
//! [`Session`] wraps a game for a host and drives the time step from a
//! repeating [`Ticker`].

pub mod clock;
pub mod engine;
pub mod factory;
pub mod random;
pub mod session;
pub mod ticker;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{Game, GenerationOutcome, TickReport};
pub use random::{ChaChaSource, RandomSource, ScriptedSource};
pub use session::Session;
pub use ticker::{SharedGame, Ticker};

use thiserror::Error;
use vibe_core::ValidationError;

/// Errors raised while setting up a game or its ticker.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ValidationError),
    /// Time progression needs an ambient tokio runtime.
    #[error("no tokio runtime available to drive time progression")]
    NoRuntime,
}
