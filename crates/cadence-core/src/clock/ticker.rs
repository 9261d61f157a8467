//! Tokio-backed tick source.
//!
//! The ticker owns one spawned task per run. The task drives a
//! `tokio::time::interval` and hands ticks over a capacity-1 channel, so it
//! never runs more than one tick ahead of the consumer. Pausing remembers
//! how far into the current period the clock was and resumes from there.
//!
//! Every `pause()` starts a new epoch. The task stamps each tick with the
//! last epoch it has seen, and `next_tick` drops ticks from older epochs, so
//! a tick fired before a pause is never observed after the resume.

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, trace};

use super::{Clock, ClockStatus, Tick};

const DEFAULT_PERIOD: Duration = Duration::from_secs(1);
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// State published to the ticker task.
#[derive(Debug, Clone, Copy)]
struct Control {
    status: ClockStatus,
    epoch: u64,
}

#[derive(Debug)]
struct Stamped {
    epoch: u64,
    tick: Tick,
}

/// Real-time clock: one [`Tick`] per period while running.
///
/// `start()` must be called from within a tokio runtime; elsewhere it logs
/// an error and the clock stays where it was.
pub struct Ticker {
    period: Duration,
    status: ClockStatus,
    epoch: u64,
    control: Option<watch::Sender<Control>>,
    ticks: Option<mpsc::Receiver<Stamped>>,
    task: Option<JoinHandle<()>>,
}

impl Ticker {
    /// A ticker firing once per second.
    pub fn new() -> Self {
        Self::with_period(DEFAULT_PERIOD)
    }

    pub fn with_period(period: Duration) -> Self {
        Self {
            period: period.max(MIN_PERIOD),
            status: ClockStatus::Idle,
            epoch: 0,
            control: None,
            ticks: None,
            task: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Wait for the next tick.
    ///
    /// Returns `None` once the ticker is stopped (or was never started).
    /// Ticks fired before the most recent `pause()` are discarded rather
    /// than delivered late after `resume()`.
    pub async fn next_tick(&mut self) -> Option<Tick> {
        loop {
            let stamped = self.ticks.as_mut()?.recv().await?;
            if self.status == ClockStatus::Running && stamped.epoch == self.epoch {
                return Some(stamped.tick);
            }
            trace!(
                seq = stamped.tick.seq,
                epoch = stamped.epoch,
                "dropping tick from before the last pause"
            );
        }
    }

    fn signal(&self, status: ClockStatus) {
        if let Some(control) = &self.control {
            // The task may already be gone; nothing to tell it then.
            let _ = control.send(Control {
                status,
                epoch: self.epoch,
            });
        }
    }

    fn shutdown(&mut self) {
        self.signal(ClockStatus::Stopped);
        self.control = None;
        self.ticks = None;
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Default for Ticker {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for Ticker {
    fn start(&mut self) {
        if matches!(self.status, ClockStatus::Running | ClockStatus::Paused) {
            return;
        }
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                error!("ticker started outside a tokio runtime: {e}");
                return;
            }
        };

        self.epoch = 0;
        let (control_tx, control_rx) = watch::channel(Control {
            status: ClockStatus::Running,
            epoch: self.epoch,
        });
        let (tick_tx, tick_rx) = mpsc::channel(1);
        let period = self.period;
        self.task = Some(handle.spawn(run(period, control_rx, tick_tx)));
        self.control = Some(control_tx);
        self.ticks = Some(tick_rx);
        self.status = ClockStatus::Running;
        debug!(period_ms = period.as_millis() as u64, "ticker started");
    }

    fn pause(&mut self) {
        if self.status == ClockStatus::Running {
            self.status = ClockStatus::Paused;
            self.epoch += 1;
            self.signal(ClockStatus::Paused);
        }
    }

    fn resume(&mut self) {
        if self.status == ClockStatus::Paused {
            self.status = ClockStatus::Running;
            self.signal(ClockStatus::Running);
        }
    }

    fn stop(&mut self) {
        if matches!(self.status, ClockStatus::Running | ClockStatus::Paused) {
            self.status = ClockStatus::Stopped;
            self.shutdown();
            debug!("ticker stopped");
        }
    }

    fn status(&self) -> ClockStatus {
        self.status
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn run(
    period: Duration,
    mut control: watch::Receiver<Control>,
    ticks: mpsc::Sender<Stamped>,
) {
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_fire = Instant::now();
    let mut epoch = control.borrow_and_update().epoch;
    let mut seq = 0u64;

    loop {
        tokio::select! {
            fired_at = interval.tick() => {
                last_fire = fired_at;
                seq += 1;
                let stamped = Stamped { epoch, tick: Tick { seq } };
                if ticks.send(stamped).await.is_err() {
                    break;
                }
            }
            changed = control.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *control.borrow_and_update();
                epoch = current.epoch;
                match current.status {
                    ClockStatus::Running => continue,
                    ClockStatus::Idle | ClockStatus::Stopped => break,
                    ClockStatus::Paused => {}
                }

                let into_period = Instant::now()
                    .saturating_duration_since(last_fire)
                    .min(period);
                match wait_for_resume(&mut control).await {
                    Some(resumed) => epoch = resumed,
                    None => break,
                }
                let resumed_at = Instant::now();
                last_fire = resumed_at.checked_sub(into_period).unwrap_or(resumed_at);
                interval.reset_at(resumed_at + (period - into_period));
            }
        }
    }
    trace!(seq, "ticker task finished");
}

/// The epoch to resume in, or `None` if the ticker was stopped (or dropped)
/// while paused.
async fn wait_for_resume(control: &mut watch::Receiver<Control>) -> Option<u64> {
    loop {
        control.changed().await.ok()?;
        let current = *control.borrow_and_update();
        match current.status {
            ClockStatus::Running => return Some(current.epoch),
            ClockStatus::Paused => continue,
            ClockStatus::Idle | ClockStatus::Stopped => return None,
        }
    }
}
