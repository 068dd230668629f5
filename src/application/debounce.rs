//! Trailing-edge debouncing for option edits.

use std::{future::Future, time::Duration};

use tokio::{task::JoinHandle, time::sleep};

/// Quiet period applied to option changes unless configured otherwise.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(800);

/// Runs only the last scheduled action once no new action has been scheduled
/// for `delay`.
///
/// The armed timer is an owned task handle. Scheduling again aborts it and arms
/// a fresh one, so a steady stream of changes faster than `delay` postpones the
/// action indefinitely. Owners must call [`Debouncer::cancel`] on teardown;
/// dropping the debouncer cancels as well.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Arm the timer for `action`, replacing any timer that has not fired yet.
    pub fn schedule<F>(&mut self, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            sleep(delay).await;
            action.await;
        }));
    }

    /// Clear the armed timer. Returns whether a timer was still waiting.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(handle) => {
                let armed = !handle.is_finished();
                handle.abort();
                armed
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
