//! Repeating wall-clock driver for the time step.

use crate::engine::Game;
use crate::RuntimeError;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// A game shared between the host and the ticker task.
pub type SharedGame = Arc<Mutex<Game>>;

/// Exclusive access for the duration of one transition.
///
/// Transitions write state atomically at their end, so a poisoned lock still
/// guards a consistent game.
pub(crate) fn lock_game(game: &SharedGame) -> MutexGuard<'_, Game> {
    game.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owns at most one repeating task that calls [`Game::process_time_step`].
#[derive(Debug, Default)]
pub struct Ticker {
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace any running task with a new one firing every `period`.
    ///
    /// The first step runs immediately; late ticks are delayed, never bunched.
    pub fn start(&mut self, game: &SharedGame, period: Duration) -> Result<(), RuntimeError> {
        let runtime = Handle::try_current().map_err(|_| RuntimeError::NoRuntime)?;
        self.stop(game);
        let epoch = lock_game(game).ticker_epoch();
        let shared = Arc::clone(game);
        self.handle = Some(runtime.spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let current = {
                    let mut g = lock_game(&shared);
                    if g.ticker_epoch() == epoch {
                        g.process_time_step();
                        true
                    } else {
                        false
                    }
                };
                if !current {
                    debug!(epoch, "stale ticker exiting");
                    break;
                }
            }
        }));
        info!(period_ms = period.as_millis() as u64, "time progression started");
        Ok(())
    }

    /// Cancel the running task, if any.
    ///
    /// The epoch is bumped under the game lock before aborting, so once this
    /// returns no further time step from the old task can run.
    pub fn stop(&mut self, game: &SharedGame) {
        lock_game(game).bump_ticker_epoch();
        if let Some(handle) = self.handle.take() {
            handle.abort();
            info!("time progression stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
