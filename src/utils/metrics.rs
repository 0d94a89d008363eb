use prometheus::{
    CounterVec, Encoder, Histogram, HistogramOpts, HistogramVec, Registry, TextEncoder,
};

/// Prometheus Metrics für Invocations, Step-Dauer und Notifications
pub struct Metrics {
    pub registry: Registry,
    pub invocations: CounterVec,
    pub step_duration: HistogramVec,
    pub failover_duration: Histogram,
    pub notifications: CounterVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let invocations = CounterVec::new(
            prometheus::Opts::new("dr_invocations_total", "Total DR invocations"),
            &["event", "status_code"],
        )
        .expect("Failed to create invocations metric");

        let step_duration = HistogramVec::new(
            HistogramOpts::new(
                "dr_step_duration_seconds",
                "Duration of individual recovery steps in seconds",
            ),
            &["step"],
        )
        .expect("Failed to create step_duration metric");

        let failover_duration = Histogram::with_opts(
            HistogramOpts::new(
                "dr_failover_duration_seconds",
                "Duration of completed failovers in seconds",
            )
            .buckets(vec![30.0, 60.0, 120.0, 300.0, 600.0, 900.0, 1800.0, 3600.0]),
        )
        .expect("Failed to create failover_duration metric");

        let notifications = CounterVec::new(
            prometheus::Opts::new("dr_notifications_total", "Notifications sent"),
            &["severity", "outcome"],
        )
        .expect("Failed to create notifications metric");

        registry.register(Box::new(invocations.clone())).ok();
        registry.register(Box::new(step_duration.clone())).ok();
        registry.register(Box::new(failover_duration.clone())).ok();
        registry.register(Box::new(notifications.clone())).ok();

        Self {
            registry,
            invocations,
            step_duration,
            failover_duration,
            notifications,
        }
    }

    /// Exportiere alle Metriken im Prometheus Text-Format
    pub fn render(&self) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
