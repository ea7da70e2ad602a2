use crate::net::protocol::MAX_STEPS_PER_FRAME;

/// Fixed-step accumulator decoupling simulation ticks from real frames.
///
/// Leftover fractional time carries over between frames so the tick cadence
/// stays deterministic. When a real frame falls too far behind (more than
/// `MAX_STEPS_PER_FRAME` steps owed, e.g. after a debugger pause), the
/// accumulator resets instead of death-spiraling through catch-up work.
pub struct FixedTimestep {
    dt: f32,
    accumulator: f32,
    max_steps: u32,
}

impl FixedTimestep {
    pub fn new(tick_rate: u32) -> Self {
        Self {
            dt: 1.0 / tick_rate as f32,
            accumulator: 0.0,
            max_steps: MAX_STEPS_PER_FRAME,
        }
    }

    pub fn dt(&self) -> f32 {
        self.dt
    }

    pub fn accumulator(&self) -> f32 {
        self.accumulator
    }

    pub fn accumulate(&mut self, delta: f32) {
        self.accumulator += delta;
    }

    /// Number of simulation steps owed for the accumulated time.
    ///
    /// Consumes `steps * dt` from the accumulator, or caps at `max_steps`
    /// and resets to zero when overloaded.
    pub fn drain_steps(&mut self) -> u32 {
        let due = (self.accumulator / self.dt) as u32;
        if due == 0 {
            return 0;
        }
        if due <= self.max_steps {
            self.accumulator -= due as f32 * self.dt;
            due
        } else {
            self.accumulator = 0.0;
            self.max_steps
        }
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}
