//! Randomized tick scheduling
//!
//! By default each tick is spawned as its own task and the next delay is
//! armed right after dispatch, so a slow tick can overlap the next one. The
//! ticks do not coordinate; two overlapping ticks may both reply to the same
//! thread. `serialize_ticks` removes the overlap by waiting for each tick to
//! finish before arming the next delay.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinError, JoinSet};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::client::MailService;
use crate::config::{IntervalMode, ScheduleConfig};
use crate::engine::ReplyEngine;
use crate::models::TickReport;

/// Draw a delay uniformly from `[min, max)` at millisecond resolution
///
/// Returns `min` when the range is empty.
pub fn draw_tick_delay<R: Rng + ?Sized>(rng: &mut R, min: Duration, max: Duration) -> Duration {
    let min_ms = min.as_millis() as u64;
    let max_ms = max.as_millis() as u64;
    if max_ms <= min_ms {
        return min;
    }
    Duration::from_millis(rng.gen_range(min_ms..max_ms))
}

pub struct Scheduler<C> {
    engine: Arc<ReplyEngine<C>>,
    min_interval: Duration,
    max_interval: Duration,
    interval_mode: IntervalMode,
    serialize_ticks: bool,
    rng_seed: Option<u64>,
}

impl<C> Scheduler<C>
where
    C: MailService + 'static,
{
    pub fn new(engine: Arc<ReplyEngine<C>>, schedule: &ScheduleConfig) -> Self {
        Self {
            engine,
            min_interval: schedule.min_interval(),
            max_interval: schedule.max_interval(),
            interval_mode: schedule.interval_mode,
            serialize_ticks: schedule.serialize_ticks,
            rng_seed: None,
        }
    }

    /// Use sub-second bounds, mainly for tests
    pub fn with_bounds(mut self, min_interval: Duration, max_interval: Duration) -> Self {
        self.min_interval = min_interval;
        self.max_interval = max_interval;
        self
    }

    /// Make the delay sequence reproducible
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    /// Dispatch ticks forever
    pub async fn run(&self) {
        self.run_ticks(None).await;
    }

    /// Dispatch `limit` ticks (or forever when `None`)
    ///
    /// With a limit, waits for every dispatched tick and returns their
    /// reports in completion order. Without one, reports are only logged.
    pub async fn run_ticks(&self, limit: Option<usize>) -> Vec<TickReport> {
        let mut rng = match self.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let keep_reports = limit.is_some();

        // Fixed mode draws once and reuses the delay for the process lifetime
        let mut fixed_interval = match self.interval_mode {
            IntervalMode::Fixed => {
                let delay = draw_tick_delay(&mut rng, self.min_interval, self.max_interval);
                info!("Ticking every {:?}", delay);
                let mut interval = tokio::time::interval_at(Instant::now() + delay, delay);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                Some(interval)
            }
            IntervalMode::PerTick => None,
        };

        let mut in_flight: JoinSet<TickReport> = JoinSet::new();
        let mut reports = Vec::new();
        let mut dispatched = 0usize;

        info!("Processing messages...");
        while limit.map_or(true, |limit| dispatched < limit) {
            match fixed_interval.as_mut() {
                Some(interval) => {
                    interval.tick().await;
                }
                None => {
                    let delay = draw_tick_delay(&mut rng, self.min_interval, self.max_interval);
                    debug!("Next tick in {:?}", delay);
                    tokio::time::sleep(delay).await;
                }
            }
            dispatched += 1;

            if self.serialize_ticks {
                let report = self.engine.run_tick().await;
                if keep_reports {
                    reports.push(report);
                }
            } else {
                let engine = Arc::clone(&self.engine);
                in_flight.spawn(async move { engine.run_tick().await });
            }

            while let Some(result) = in_flight.try_join_next() {
                collect(result, keep_reports, &mut reports);
            }
        }

        while let Some(result) = in_flight.join_next().await {
            collect(result, keep_reports, &mut reports);
        }

        reports
    }
}

fn collect(
    result: std::result::Result<TickReport, JoinError>,
    keep_reports: bool,
    reports: &mut Vec<TickReport>,
) {
    match result {
        Ok(report) => {
            if keep_reports {
                reports.push(report);
            }
        }
        Err(e) => error!("Tick task failed: {}", e),
    }
}
