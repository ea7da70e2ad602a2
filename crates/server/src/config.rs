#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub tick_rate: u32,
    pub status_interval_secs: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            tick_rate: hopper::DEFAULT_TICK_RATE,
            status_interval_secs: 10,
        }
    }
}
