//! Clock capabilities backed by the host operating system.
//!
//! The alarm sleeps on a helper thread, so its wake-up time is subject to
//! scheduler latency; the counter is derived from the monotonic clock. The
//! two are not synchronized, which is what the jitter source relies on.

use super::{AlarmCallback, AlarmClock, FreeRunningCounter};
use crate::sources::SourceError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Alarm clock that fires callbacks from a sleeping helper thread.
#[derive(Debug)]
pub struct ThreadAlarm {
    epoch: Instant,
    hz: u32,
    armed: Arc<AtomicU64>,
}

impl ThreadAlarm {
    /// Creates an alarm clock ticking at `hz`.
    pub fn new(hz: u32) -> Self {
        Self {
            epoch: Instant::now(),
            hz: hz.max(1),
            armed: Arc::new(AtomicU64::new(0)),
        }
    }

    fn ticks_to_duration(&self, ticks: u32) -> Duration {
        let nanos = u128::from(ticks) * NANOS_PER_SEC / u128::from(self.hz);
        Duration::from_nanos(nanos as u64)
    }
}

impl AlarmClock for ThreadAlarm {
    fn now(&self) -> u32 {
        let ticks = self.epoch.elapsed().as_nanos() * u128::from(self.hz) / NANOS_PER_SEC;
        // wraps like a hardware tick register
        ticks as u32
    }

    fn set_alarm(&self, at: u32, callback: AlarmCallback) -> Result<(), SourceError> {
        let token = self.armed.fetch_add(1, Ordering::AcqRel) + 1;
        let ahead = at.wrapping_sub(self.now());
        // a deadline already in the past fires immediately
        let delay = if ahead > u32::MAX / 2 {
            Duration::ZERO
        } else {
            self.ticks_to_duration(ahead)
        };
        let armed = Arc::clone(&self.armed);

        let spawned = std::thread::Builder::new()
            .name("entropy-alarm".into())
            .spawn(move || {
                std::thread::sleep(delay);
                if armed.load(Ordering::Acquire) == token {
                    callback();
                }
            });

        spawned
            .map(|_| ())
            .map_err(|e| SourceError::Unavailable(format!("cannot spawn alarm thread: {e}")))
    }

    fn clear_alarm(&self) {
        self.armed.fetch_add(1, Ordering::AcqRel);
    }
}

/// Free-running counter derived from the monotonic clock.
#[derive(Debug)]
pub struct MonotonicCounter {
    started: Mutex<Instant>,
    hz: u32,
}

impl MonotonicCounter {
    /// Creates a counter ticking at `hz`.
    pub fn new(hz: u32) -> Self {
        Self {
            started: Mutex::new(Instant::now()),
            hz: hz.max(1),
        }
    }
}

impl FreeRunningCounter for MonotonicCounter {
    fn read(&self) -> u32 {
        let started = *self.started.lock().unwrap_or_else(|e| e.into_inner());
        let ticks = started.elapsed().as_nanos() * u128::from(self.hz) / NANOS_PER_SEC;
        ticks as u32
    }

    fn restart(&self) {
        *self.started.lock().unwrap_or_else(|e| e.into_inner()) = Instant::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_alarm_fires_callback() {
        let alarm = ThreadAlarm::new(10_000);
        let (tx, rx) = mpsc::channel();

        alarm.set_alarm(alarm.now().wrapping_add(5), Box::new(move || {
            let _ = tx.send(());
        }))
        .unwrap();

        assert!(rx.recv_timeout(Duration::from_secs(2)).is_ok());
    }

    #[test]
    fn test_cleared_alarm_does_not_fire() {
        let alarm = ThreadAlarm::new(1_000);
        let (tx, rx) = mpsc::channel();

        alarm.set_alarm(alarm.now().wrapping_add(20), Box::new(move || {
            let _ = tx.send(());
        }))
        .unwrap();
        alarm.clear_alarm();

        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    }

    #[test]
    fn test_counter_restart() {
        let counter = MonotonicCounter::new(1_000_000);
        std::thread::sleep(Duration::from_millis(5));
        let before = counter.read();

        counter.restart();
        let after = counter.read();

        assert!(before >= 5_000);
        assert!(after < before);
    }
}
