//! Debouncing of the search input.
//!
//! [`QueryDebouncer`] is the timing state machine, driven by explicit
//! instants so it can be tested without a runtime. [`debounced`] drives it
//! from a stream of raw input values using tokio timers.

use std::future::pending;
use std::time::Duration;

use async_stream::stream;
use futures::{Stream, StreamExt};
use tokio::time::{Instant, sleep_until};
use tracing::trace;

/// Quiet period the input has to hold before it propagates.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Derives a value that only follows the input once the input has stopped
/// changing for `delay`.
///
/// Every input restarts the window. Only the latest input survives.
#[derive(Debug, Clone)]
pub struct QueryDebouncer {
    delay: Duration,
    pending: Option<(String, Instant)>,
    current: String,
}

impl QueryDebouncer {
    pub fn new(delay: Duration, initial: impl Into<String>) -> Self {
        Self {
            delay,
            pending: None,
            current: initial.into(),
        }
    }

    /// The debounced value, i.e. the last value that survived a full window.
    pub fn current(&self) -> &str {
        &self.current
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Record a new input value, (re)starting the window at `now`.
    pub fn input(&mut self, value: impl Into<String>, now: Instant) {
        self.pending = Some((value.into(), now + self.delay));
    }

    /// When the open window expires, if one is open.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, deadline)| *deadline)
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Close the window if it expired by `now`.
    ///
    /// Returns the new debounced value, or `None` if the window is still open,
    /// no window is open, or the surviving value equals the current one.
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        match self.pending {
            Some((_, deadline)) if deadline <= now => {},
            _ => return None,
        }
        let (value, _) = self.pending.take()?;
        if value == self.current {
            return None;
        }
        self.current = value.clone();
        Some(value)
    }
}

/// Debounce a stream of input values.
///
/// Yields exactly one value per expired window whose value differs from the
/// previously yielded one (or `initial`). When `inputs` ends with a window
/// open, the window is waited out before the stream ends.
pub fn debounced(
    inputs: impl Stream<Item = String>,
    delay: Duration,
    initial: impl Into<String>,
) -> impl Stream<Item = String> {
    let mut debouncer = QueryDebouncer::new(delay, initial);

    stream! {
        futures::pin_mut!(inputs);
        let mut inputs_done = false;

        loop {
            let deadline = debouncer.deadline();
            if inputs_done && deadline.is_none() {
                break;
            }

            let tick = tokio::select! {
                input = inputs.next(), if !inputs_done => Tick::Input(input),
                () = wait_until(deadline) => Tick::Expired,
            };

            match tick {
                Tick::Input(Some(value)) => {
                    trace!(value = %value, "debounce window restarted");
                    debouncer.input(value, Instant::now());
                },
                Tick::Input(None) => inputs_done = true,
                Tick::Expired => {
                    if let Some(value) = debouncer.poll(Instant::now()) {
                        yield value;
                    }
                },
            }
        }
    }
}

enum Tick {
    Input(Option<String>),
    Expired,
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => pending().await,
    }
}
