//! Timer jitter noise source.
//!
//! Two clocks driven from unsynchronized oscillators drift against each
//! other. A periodic alarm on the slow clock samples a free-running counter
//! on the fast clock; the low nibble of each reading carries the jitter.
//!
//! # State machine
//!
//! ```text
//!            sample(buf)                       remaining == 0
//!   Idle ─────────────────▶ Sampling ─────────────────────────▶ Idle
//!                            │    ▲
//!                            └────┘ alarm: read nibble, restart counter
//! ```
//!
//! Each measurement yields 4 bits, so a request for `len` bytes takes
//! `2 * len` alarms. Alarms run in interrupt (or timer thread) context; the
//! caller blocks on a condition variable until the last one completes or
//! the optional timeout elapses. An alarm that cannot be armed ends the
//! session at once with the clock's error.

mod hosted;

pub use hosted::{MonotonicCounter, ThreadAlarm};

use super::{NoiseSource, SourceError};
use crate::config::TimerJitterConfig;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};
use zeroize::Zeroize;

/// Callback invoked when an alarm fires.
pub type AlarmCallback = Box<dyn FnOnce() + Send + 'static>;

/// The slow clock: a tick counter with a one-shot alarm.
pub trait AlarmClock: Send + Sync {
    /// Current tick count.
    fn now(&self) -> u32;

    /// Largest tick value before the counter wraps.
    fn max_value(&self) -> u32 {
        u32::MAX
    }

    /// Schedules `callback` at tick `at`, replacing any pending alarm.
    ///
    /// Must not run `callback` on the calling thread. An error means the
    /// alarm will never fire.
    fn set_alarm(&self, at: u32, callback: AlarmCallback) -> Result<(), SourceError>;

    /// Cancels any pending alarm.
    fn clear_alarm(&self);
}

/// The fast clock: a counter running from an independent oscillator.
pub trait FreeRunningCounter: Send + Sync {
    /// Reads the current counter value.
    fn read(&self) -> u32;

    /// Restarts counting from zero.
    fn restart(&self);
}

/// Sampling phase of the timer jitter source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JitterPhase {
    Idle,
    Sampling,
}

struct Session {
    phase: JitterPhase,
    generation: u64,
    remaining: usize,
    byte: usize,
    pool: Vec<u8>,
    failure: Option<SourceError>,
}

impl Session {
    fn is_sampling(&self, generation: u64) -> bool {
        self.phase == JitterPhase::Sampling && self.generation == generation
    }

    fn abandon(&mut self) {
        self.phase = JitterPhase::Idle;
        self.pool.zeroize();
    }

    fn fail(&mut self, error: SourceError) {
        self.abandon();
        self.failure = Some(error);
    }
}

struct Shared {
    alarm: Arc<dyn AlarmClock>,
    counter: Arc<dyn FreeRunningCounter>,
    wait_ticks: AtomicU32,
    session: Mutex<Session>,
    done: Condvar,
}

impl Shared {
    /// Arms the next alarm for `generation`.
    ///
    /// Called with the session locked, so a session abandoned on timeout
    /// can never re-arm over its successor's alarm.
    fn arm(self: &Arc<Self>, session: &mut Session, generation: u64) {
        let wait = self.wait_ticks.load(Ordering::Relaxed);
        let at = self.alarm.now().wrapping_add(wait) & self.alarm.max_value();
        let shared = Arc::clone(self);

        if let Err(e) = self
            .alarm
            .set_alarm(at, Box::new(move || shared.on_alarm(generation)))
        {
            tracing::warn!(error = %e, "Failed to arm timer jitter alarm");
            session.fail(e);
        }
    }

    fn on_alarm(self: &Arc<Self>, generation: u64) {
        let Ok(mut session) = self.session.lock() else {
            return;
        };
        // left over from an abandoned session
        if !session.is_sampling(generation) {
            return;
        }

        let time = self.counter.read();
        let shift = if session.remaining & 1 == 1 { 4 } else { 0 };
        let idx = session.byte;
        let nibble = (time & 0x0F) as u8;
        session.pool[idx] = (session.pool[idx] & !(0x0Fu8 << shift)) | (nibble << shift);
        session.remaining -= 1;
        if shift == 4 {
            session.byte += 1;
        }
        self.counter.restart();

        tracing::trace!(
            value = nibble,
            remaining = session.remaining,
            byte = idx,
            upper = shift == 4,
            "Timer jitter measurement"
        );

        if session.remaining == 0 {
            session.phase = JitterPhase::Idle;
            self.alarm.clear_alarm();
            tracing::trace!("Timer jitter gathering finished");
        } else {
            self.arm(&mut session, generation);
        }

        let finished = !session.is_sampling(generation);
        drop(session);
        if finished {
            self.done.notify_all();
        }
    }
}

/// Noise source sampling jitter between two clock domains.
///
/// Not reentrant: concurrent callers are serialized.
pub struct TimerJitterSource {
    shared: Arc<Shared>,
    exclusive: Mutex<()>,
    timeout: Option<Duration>,
}

impl TimerJitterSource {
    /// Ticks between alarms when not configured otherwise.
    pub const DEFAULT_WAIT_TICKS: u32 = 10;

    /// Creates a source from the two clock capabilities.
    ///
    /// Without a timeout, `sample` blocks until every alarm has fired.
    pub fn new(alarm: Arc<dyn AlarmClock>, counter: Arc<dyn FreeRunningCounter>) -> Self {
        Self {
            shared: Arc::new(Shared {
                alarm,
                counter,
                wait_ticks: AtomicU32::new(Self::DEFAULT_WAIT_TICKS),
                session: Mutex::new(Session {
                    phase: JitterPhase::Idle,
                    generation: 0,
                    remaining: 0,
                    byte: 0,
                    pool: Vec::new(),
                    failure: None,
                }),
                done: Condvar::new(),
            }),
            exclusive: Mutex::new(()),
            timeout: None,
        }
    }

    /// Builds a source on the host's thread timer and monotonic clock.
    pub fn hosted(config: &TimerJitterConfig) -> Self {
        let alarm = Arc::new(ThreadAlarm::new(config.alarm_hz));
        let counter = Arc::new(MonotonicCounter::new(config.counter_hz));
        Self::new(alarm, counter)
            .with_wait_ticks(config.wait_ticks)
            .with_timeout(config.timeout())
    }

    /// Sets the number of slow-clock ticks between measurements.
    pub fn with_wait_ticks(self, wait_ticks: u32) -> Self {
        self.shared
            .wait_ticks
            .store(wait_ticks.max(1), Ordering::Relaxed);
        self
    }

    /// Bounds how long a single `sample` call may block.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the current sampling phase.
    pub fn phase(&self) -> JitterPhase {
        self.shared
            .session
            .lock()
            .map(|s| s.phase)
            .unwrap_or(JitterPhase::Idle)
    }
}

fn poisoned<T>(_: T) -> SourceError {
    SourceError::Unavailable("timer jitter state poisoned".into())
}

impl NoiseSource for TimerJitterSource {
    fn sample(&self, buf: &mut [u8]) -> Result<usize, SourceError> {
        let _exclusive = self.exclusive.lock().map_err(poisoned)?;

        if buf.is_empty() {
            return Ok(0);
        }

        let started = Instant::now();
        let mut session = self.shared.session.lock().map_err(poisoned)?;
        session.generation = session.generation.wrapping_add(1);
        session.phase = JitterPhase::Sampling;
        // one byte takes two measurements of 4 bits each
        session.remaining = buf.len() * 2;
        session.byte = 0;
        session.pool = vec![0u8; buf.len()];
        session.failure = None;
        let generation = session.generation;

        self.shared.counter.restart();
        self.shared.arm(&mut session, generation);

        let mut session = match self.timeout {
            None => self
                .shared
                .done
                .wait_while(session, |s| s.is_sampling(generation))
                .map_err(poisoned)?,
            Some(timeout) => {
                let (mut session, _) = self
                    .shared
                    .done
                    .wait_timeout_while(session, timeout, |s| s.is_sampling(generation))
                    .map_err(poisoned)?;

                if session.is_sampling(generation) {
                    let remaining = session.remaining;
                    session.abandon();
                    drop(session);
                    self.shared.alarm.clear_alarm();

                    tracing::warn!(
                        remaining,
                        timeout_ms = timeout.as_millis() as u64,
                        "Timer jitter sampling timed out"
                    );
                    return Err(SourceError::Timeout {
                        elapsed_ms: started.elapsed().as_millis() as u64,
                        remaining,
                    });
                }
                session
            }
        };

        if let Some(error) = session.failure.take() {
            return Err(error);
        }

        buf.copy_from_slice(&session.pool);
        session.pool.zeroize();

        tracing::debug!(
            bytes = buf.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "Timer jitter sample complete"
        );

        Ok(buf.len())
    }

    fn name(&self) -> &str {
        "timer-jitter"
    }
}
