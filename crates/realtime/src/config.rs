//! Configuration for real-time runs.

/// Configuration for a real-time run.
#[derive(Clone, Debug, PartialEq)]
pub struct RealtimeConfig {
    /// Virtual seconds per wall-clock second.
    ///
    /// 2.0 runs the simulation twice as fast as real time.
    pub time_scale: f64,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RealtimeConfig {
    /// Real time, unscaled.
    pub fn new() -> Self {
        Self { time_scale: 1.0 }
    }

    /// Set the time scale.
    pub fn with_time_scale(mut self, time_scale: f64) -> Self {
        self.time_scale = time_scale;
        self
    }

    /// Build from an optional command-line argument.
    ///
    /// A missing or unparsable argument means real time.
    pub fn from_arg(arg: Option<&str>) -> Self {
        Self::new().with_time_scale(parse_time_scale(arg))
    }
}

/// Parse a time scale argument, falling back to 1.0.
pub fn parse_time_scale(arg: Option<&str>) -> f64 {
    arg.and_then(|s| s.trim().parse::<f64>().ok())
        .unwrap_or(1.0)
}
