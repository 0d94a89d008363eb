//! Schnittstellen zu den externen Systemen (ECS, RDS, Route53, SNS,
//! CloudWatch, HTTP Health Check) und ihre AWS SDK Implementierungen.

pub mod cloudwatch;
pub mod ecs;
pub mod probe;
pub mod rds;
pub mod route53;
pub mod sns;

use anyhow::Result;
use async_trait::async_trait;
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::recovery::notification::Notification;
use crate::recovery::Services;
use crate::utils::Config;

pub use cloudwatch::CloudWatchHealth;
pub use ecs::EcsCompute;
pub use probe::HttpProbe;
pub use rds::RdsDatabase;
pub use route53::Route53Router;
pub use sns::SnsNotifier;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterInfo {
    pub name: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceInfo {
    pub name: String,
    pub status: String,
    pub desired_count: i32,
    pub running_count: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatabaseInfo {
    pub identifier: String,
    pub status: String,
    /// true solange der Cluster noch Read Replica einer Quelle ist
    pub is_replica: bool,
    /// Unix-Timestamp des letzten wiederherstellbaren Zeitpunkts
    pub latest_restorable_at: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
    Unknown,
}

impl HealthStatus {
    pub fn as_str(&self) -> &str {
        match self {
            HealthStatus::Healthy => "HEALTHY",
            HealthStatus::Unhealthy => "UNHEALTHY",
            HealthStatus::Unknown => "UNKNOWN",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionHealthReport {
    pub status: HealthStatus,
    pub details: String,
}

impl RegionHealthReport {
    pub fn new(status: HealthStatus, details: impl Into<String>) -> Self {
        Self {
            status,
            details: details.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProbeResult {
    pub status_code: u16,
    pub latency_ms: u64,
}

/// ECS Cluster und Service in der DR Region
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ComputeCluster: Send + Sync {
    async fn describe_cluster(&self) -> Result<Option<ClusterInfo>>;
    async fn describe_service(&self) -> Result<Option<ServiceInfo>>;
    async fn set_desired_count(&self, count: i32) -> Result<()>;
}

/// Standby Datenbank Cluster in der DR Region
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DatabaseCluster: Send + Sync {
    async fn describe(&self) -> Result<Option<DatabaseInfo>>;
    async fn promote(&self) -> Result<()>;
}

/// DNS Record über den der Traffic geroutet wird
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DnsRouter: Send + Sync {
    async fn current_target(&self) -> Result<Option<String>>;
    /// Setzt den Record auf `target` und gibt die Change-ID zurück
    async fn point_to(&self, target: &str) -> Result<String>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn publish(&self, notification: &Notification) -> Result<()>;
    async fn check_topic(&self) -> Result<()>;
}

/// Health der Primary Region und Replikationsverzögerung
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RegionHealth: Send + Sync {
    async fn primary_health(&self) -> Result<RegionHealthReport>;
    /// Replication Lag in Sekunden, None wenn keine Datenpunkte vorliegen
    async fn replication_lag_seconds(&self) -> Result<Option<f64>>;
}

/// HTTP Health Check gegen den promoteten Stack
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EndpointProbe: Send + Sync {
    async fn probe(&self) -> Result<ProbeResult>;
}

async fn sdk_config(region: &str, timeout: Duration) -> SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .timeout_config(
            TimeoutConfig::builder()
                .operation_timeout(timeout)
                .build(),
        )
        .load()
        .await
}

/// Erstelle alle AWS Clients anhand der Config
pub async fn connect(config: &Config) -> Result<Services> {
    let timeout = config.call_timeout();
    let primary = sdk_config(&config.primary_region, timeout).await;
    let backup = sdk_config(&config.backup_region, timeout).await;

    tracing::info!(
        primary_region = %config.primary_region,
        backup_region = %config.backup_region,
        "AWS clients configured"
    );

    Ok(Services {
        compute: Arc::new(EcsCompute::new(
            aws_sdk_ecs::Client::new(&backup),
            config.dr_cluster_name.clone(),
            config.dr_service_name.clone(),
        )),
        database: Arc::new(RdsDatabase::new(
            aws_sdk_rds::Client::new(&backup),
            config.database_cluster_identifier.clone(),
        )),
        dns: Arc::new(Route53Router::new(
            aws_sdk_route53::Client::new(&backup),
            config.hosted_zone_id.clone(),
            config.dns_record_name.clone(),
            config.dns_ttl_seconds,
        )),
        notifier: Arc::new(SnsNotifier::new(
            aws_sdk_sns::Client::new(&backup),
            config.sns_topic_arn.clone(),
        )),
        health: Arc::new(CloudWatchHealth::new(
            aws_sdk_cloudwatch::Client::new(&primary),
            aws_sdk_cloudwatch::Client::new(&backup),
            config.primary_health_alarms.clone(),
            config.database_cluster_identifier.clone(),
        )),
        probe: Arc::new(HttpProbe::new(config.health_check_url.clone(), timeout)?),
    })
}
