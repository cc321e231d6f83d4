use std::time::Duration;

/// Maximum ticks per frame to prevent a spiral of death after a stall
pub const MAX_SUBSTEPS: u32 = 8;

/// Accumulates wall-clock time and hands out whole fixed ticks
#[derive(Debug, Clone)]
pub struct FixedStep {
    interval: Duration,
    accumulator: Duration,
}

impl FixedStep {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            accumulator: Duration::ZERO,
        }
    }

    /// Add `elapsed` and return how many ticks are due. Time beyond
    /// `MAX_SUBSTEPS` ticks is dropped.
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        self.accumulator += elapsed;

        let mut ticks = 0;
        while self.accumulator >= self.interval && ticks < MAX_SUBSTEPS {
            self.accumulator -= self.interval;
            ticks += 1;
        }
        if ticks == MAX_SUBSTEPS && self.accumulator >= self.interval {
            log::debug!("Dropping {:?} of simulation time", self.accumulator);
            self.accumulator = Duration::ZERO;
        }
        ticks
    }

    /// Same as `advance`, for millisecond timestamps from the browser
    pub fn advance_ms(&mut self, elapsed_ms: f64) -> u32 {
        self.advance(Duration::from_secs_f64(elapsed_ms.max(0.0) / 1000.0))
    }
}
