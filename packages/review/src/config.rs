use recall_algo::SchedulerParams;

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub desired_retention: f64,
    pub queue_limit: usize,
    pub max_interval_days: u32,
    pub enable_fuzz: bool,
    pub fuzz_seed: u64,
}

impl Config {
    pub fn from_env() -> Self {
        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let desired_retention = std::env::var("RECALL_DESIRED_RETENTION")
            .ok()
            .and_then(|value| value.parse::<f64>().ok())
            .map(|value| value.clamp(0.5, 0.99))
            .unwrap_or(0.9);

        let queue_limit = std::env::var("RECALL_QUEUE_LIMIT")
            .ok()
            .and_then(|value| value.parse::<usize>().ok())
            .map(|value| value.clamp(1, 100))
            .unwrap_or(20);

        let max_interval_days = std::env::var("RECALL_MAX_INTERVAL_DAYS")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(36_500);

        let enable_fuzz = std::env::var("RECALL_INTERVAL_FUZZ")
            .map(|value| value == "true" || value == "1")
            .unwrap_or(false);

        let fuzz_seed = std::env::var("RECALL_FUZZ_SEED")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(0);

        Self {
            log_level,
            desired_retention,
            queue_limit,
            max_interval_days,
            enable_fuzz,
            fuzz_seed,
        }
    }

    /// Scheduler parameters with this config's overrides applied.
    pub fn scheduler_params(&self) -> SchedulerParams {
        SchedulerParams {
            desired_retention: self.desired_retention,
            max_interval_days: self.max_interval_days,
            enable_fuzz: self.enable_fuzz,
            fuzz_seed: self.fuzz_seed,
            ..Default::default()
        }
    }
}
