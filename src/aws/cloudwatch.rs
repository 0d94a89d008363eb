use anyhow::Result;
use async_trait::async_trait;
use aws_sdk_cloudwatch::primitives::DateTime;
use aws_sdk_cloudwatch::types::{Datapoint, Dimension, MetricAlarm, StateValue, Statistic};
use aws_sdk_cloudwatch::Client;

use super::{HealthStatus, RegionHealth, RegionHealthReport};

/// Zeitfenster für die Replication Lag Abfrage
const LAG_WINDOW_SECONDS: i64 = 600;

/// Lag des cross-region Read Replica Clusters gegenüber seiner Quelle
const REPLICA_LAG_METRIC: &str = "AuroraBinlogReplicaLag";

/// CloudWatch Alarme der Primary Region plus Binlog Replica Lag der DR Region
pub struct CloudWatchHealth {
    primary: Client,
    standby: Client,
    alarms: Vec<String>,
    db_cluster: String,
}

impl CloudWatchHealth {
    pub fn new(primary: Client, standby: Client, alarms: Vec<String>, db_cluster: String) -> Self {
        Self {
            primary,
            standby,
            alarms,
            db_cluster,
        }
    }
}

#[async_trait]
impl RegionHealth for CloudWatchHealth {
    async fn primary_health(&self) -> Result<RegionHealthReport> {
        if self.alarms.is_empty() {
            return Ok(RegionHealthReport::new(
                HealthStatus::Unknown,
                "No primary health alarms configured",
            ));
        }

        let response = self
            .primary
            .describe_alarms()
            .set_alarm_names(Some(self.alarms.clone()))
            .send()
            .await?;

        Ok(classify_alarms(response.metric_alarms()))
    }

    async fn replication_lag_seconds(&self) -> Result<Option<f64>> {
        let now = chrono::Utc::now().timestamp();

        let response = self
            .standby
            .get_metric_statistics()
            .namespace("AWS/RDS")
            .metric_name(REPLICA_LAG_METRIC)
            .dimensions(
                Dimension::builder()
                    .name("DBClusterIdentifier")
                    .value(&self.db_cluster)
                    .build(),
            )
            .start_time(DateTime::from_secs(now - LAG_WINDOW_SECONDS))
            .end_time(DateTime::from_secs(now))
            .period(60)
            .statistics(Statistic::Maximum)
            .send()
            .await?;

        Ok(latest_lag(response.datapoints()))
    }
}

/// Jüngster Datenpunkt zählt; die Metrik ist bereits in Sekunden
fn latest_lag(datapoints: &[Datapoint]) -> Option<f64> {
    datapoints
        .iter()
        .filter_map(|dp| Some((dp.timestamp()?.secs(), dp.maximum()?)))
        .max_by_key(|(ts, _)| *ts)
        .map(|(_, lag)| lag)
}

fn classify_alarms(alarms: &[MetricAlarm]) -> RegionHealthReport {
    if alarms.is_empty() {
        return RegionHealthReport::new(
            HealthStatus::Unknown,
            "None of the configured health alarms exist",
        );
    }

    let names_in = |state: StateValue| {
        alarms
            .iter()
            .filter(|a| a.state_value() == Some(&state))
            .map(|a| a.alarm_name().unwrap_or("<unnamed>"))
            .collect::<Vec<_>>()
    };

    let firing = names_in(StateValue::Alarm);
    if !firing.is_empty() {
        return RegionHealthReport::new(
            HealthStatus::Unhealthy,
            format!("Alarms firing: {}", firing.join(", ")),
        );
    }

    let missing_data = names_in(StateValue::InsufficientData);
    if !missing_data.is_empty() {
        return RegionHealthReport::new(
            HealthStatus::Unknown,
            format!("Insufficient data: {}", missing_data.join(", ")),
        );
    }

    RegionHealthReport::new(HealthStatus::Healthy, "All services operational")
}
