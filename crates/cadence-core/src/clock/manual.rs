use super::{Clock, ClockStatus, Tick};

/// A clock with no timer resource: ticks happen when the caller says so.
#[derive(Debug, Clone)]
pub struct ManualClock {
    status: ClockStatus,
    seq: u64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            status: ClockStatus::Idle,
            seq: 0,
        }
    }

    /// Produce the next tick, or `None` unless the clock is running.
    pub fn fire(&mut self) -> Option<Tick> {
        if self.status != ClockStatus::Running {
            return None;
        }
        self.seq += 1;
        Some(Tick { seq: self.seq })
    }

    /// Ticks fired since the last `start()`.
    pub fn fired(&self) -> u64 {
        self.seq
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn start(&mut self) {
        match self.status {
            ClockStatus::Idle | ClockStatus::Stopped => {
                self.status = ClockStatus::Running;
                self.seq = 0;
            }
            ClockStatus::Running | ClockStatus::Paused => {}
        }
    }

    fn pause(&mut self) {
        if self.status == ClockStatus::Running {
            self.status = ClockStatus::Paused;
        }
    }

    fn resume(&mut self) {
        if self.status == ClockStatus::Paused {
            self.status = ClockStatus::Running;
        }
    }

    fn stop(&mut self) {
        if self.status != ClockStatus::Idle {
            self.status = ClockStatus::Stopped;
        }
    }

    fn status(&self) -> ClockStatus {
        self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_only_while_running() {
        let mut clock = ManualClock::new();
        assert!(clock.fire().is_none());

        clock.start();
        assert_eq!(clock.fire(), Some(Tick { seq: 1 }));

        clock.pause();
        assert!(clock.fire().is_none());

        clock.resume();
        assert_eq!(clock.fire(), Some(Tick { seq: 2 }));

        clock.stop();
        assert!(clock.fire().is_none());
        assert_eq!(clock.status(), ClockStatus::Stopped);
    }

    #[test]
    fn start_is_idempotent() {
        let mut clock = ManualClock::new();
        clock.start();
        clock.fire();
        clock.start();
        assert_eq!(clock.fired(), 1);
    }

    #[test]
    fn stop_on_stopped_is_noop() {
        let mut clock = ManualClock::new();
        clock.stop();
        assert_eq!(clock.status(), ClockStatus::Idle);
        clock.start();
        clock.stop();
        clock.stop();
        clock.pause();
        assert_eq!(clock.status(), ClockStatus::Stopped);
    }

    #[test]
    fn restart_after_stop_counts_from_one() {
        let mut clock = ManualClock::new();
        clock.start();
        clock.fire();
        clock.fire();
        clock.stop();
        clock.start();
        assert_eq!(clock.fire(), Some(Tick { seq: 1 }));
    }
}
