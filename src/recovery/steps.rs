//! Die einzelnen Recovery Steps. Jeder Step prüft zuerst den Ist-Zustand und
//! ist damit wiederholbar: ein bereits erreichter Zielzustand liefert
//! `UNCHANGED` statt die Aktion erneut auszuführen.

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

use super::checks;
use super::models::StepRecord;
use super::RecoveryContext;
use crate::aws::route53::normalize;
use crate::aws::HealthStatus;
use crate::utils::Config;

#[derive(Debug, Error)]
pub enum StepError {
    #[error("{0}")]
    Precondition(String),
    #[error("timed out after {0}s; outcome unknown")]
    Timeout(u64),
    #[error("{0:#}")]
    Collaborator(#[from] anyhow::Error),
}

/// Ein Schritt in einer Failover- oder Failback-Sequenz
#[async_trait]
pub trait FailoverStep: Send + Sync {
    /// Lesbarer Name für Reports und Notifications
    fn name(&self) -> &'static str;
    /// Schlüssel im Response-Body (`services.<key>`)
    fn key(&self) -> &'static str;
    async fn attempt(&self, ctx: &RecoveryContext) -> Result<StepRecord, StepError>;
}

/// Richtung in die Traffic und Kapazität bewegt werden
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Failover,
    Failback,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Failover => "failover",
            Direction::Failback => "failback",
        }
    }

    fn dns_target<'a>(&self, config: &'a Config) -> &'a str {
        match self {
            Direction::Failover => &config.standby_endpoint,
            Direction::Failback => &config.primary_endpoint,
        }
    }

    fn capacity(&self, config: &Config) -> i32 {
        match self {
            Direction::Failover => config.dr_min_capacity,
            Direction::Failback => config.dr_standby_capacity,
        }
    }

    /// Failover: mindestens `desired`; Failback: exakt `desired`
    fn capacity_satisfied(&self, current: i32, desired: i32) -> bool {
        match self {
            Direction::Failover => current >= desired,
            Direction::Failback => current == desired,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Step 1: DR Region bereit (Cluster aktiv, Backups vorhanden)
pub struct VerifyReadiness;

#[async_trait]
impl FailoverStep for VerifyReadiness {
    fn name(&self) -> &'static str {
        "Verifying DR region readiness"
    }

    fn key(&self) -> &'static str {
        "readiness"
    }

    async fn attempt(&self, ctx: &RecoveryContext) -> Result<StepRecord, StepError> {
        let readiness = checks::dr_readiness(ctx).await;
        if !readiness.ready {
            return Err(StepError::Precondition(format!(
                "DR region not ready: {}",
                readiness.reason
            )));
        }
        Ok(StepRecord::success(readiness.reason))
    }
}

/// Step 2: Read Replica zum Primary promoten
pub struct PromoteDatabase;

#[async_trait]
impl FailoverStep for PromoteDatabase {
    fn name(&self) -> &'static str {
        "Promoting read replica to primary"
    }

    fn key(&self) -> &'static str {
        "database"
    }

    async fn attempt(&self, ctx: &RecoveryContext) -> Result<StepRecord, StepError> {
        let database = &ctx.services.database;

        match database.describe().await? {
            None => Err(StepError::Precondition(format!(
                "Database cluster {} not found",
                ctx.config.database_cluster_identifier
            ))),
            Some(info) if !info.is_replica => Ok(StepRecord::unchanged(format!(
                "Database cluster {} is already primary",
                info.identifier
            ))),
            Some(_) => {
                database.promote().await?;
                Ok(StepRecord::success("Database promoted successfully"))
            }
        }
    }
}

/// Step 3 in beiden Sequenzen: Desired Count des DR Service setzen
pub struct ScaleService {
    direction: Direction,
}

impl ScaleService {
    pub fn new(direction: Direction) -> Self {
        Self { direction }
    }
}

#[async_trait]
impl FailoverStep for ScaleService {
    fn name(&self) -> &'static str {
        match self.direction {
            Direction::Failover => "Scaling up DR application services",
            Direction::Failback => "Scaling down DR application services",
        }
    }

    fn key(&self) -> &'static str {
        "application"
    }

    async fn attempt(&self, ctx: &RecoveryContext) -> Result<StepRecord, StepError> {
        let compute = &ctx.services.compute;
        let desired = self.direction.capacity(&ctx.config);

        let Some(service) = compute.describe_service().await? else {
            return Err(StepError::Precondition(format!(
                "ECS service {} not found",
                ctx.config.dr_service_name
            )));
        };

        if self
            .direction
            .capacity_satisfied(service.desired_count, desired)
        {
            return Ok(StepRecord::unchanged(format!(
                "Service already at {} desired tasks",
                service.desired_count
            )));
        }

        compute.set_desired_count(desired).await?;
        Ok(StepRecord::success(format!(
            "Application scaled from {} to {} desired tasks",
            service.desired_count, desired
        )))
    }
}

/// Step 4 (Failover) bzw. 2 (Failback): DNS auf die Zielregion umstellen
pub struct UpdateDns {
    direction: Direction,
}

impl UpdateDns {
    pub fn new(direction: Direction) -> Self {
        Self { direction }
    }
}

#[async_trait]
impl FailoverStep for UpdateDns {
    fn name(&self) -> &'static str {
        match self.direction {
            Direction::Failover => "Updating DNS routing",
            Direction::Failback => "Restoring DNS routing to primary",
        }
    }

    fn key(&self) -> &'static str {
        "dns"
    }

    async fn attempt(&self, ctx: &RecoveryContext) -> Result<StepRecord, StepError> {
        let dns = &ctx.services.dns;
        let target = self.direction.dns_target(&ctx.config);

        let current = dns.current_target().await?;
        if current
            .as_deref()
            .is_some_and(|c| normalize(c) == normalize(target))
        {
            return Ok(StepRecord::unchanged(format!(
                "DNS already routed to {target}"
            )));
        }

        let change_id = dns.point_to(target).await?;
        Ok(StepRecord::success(format!(
            "DNS updated for {} ({} -> {}, change {})",
            self.direction, ctx.config.dns_record_name, target, change_id
        )))
    }
}

/// Step 5: Health Endpoint des promoteten Stacks antwortet mit 2xx
pub struct VerifyHealth;

#[async_trait]
impl FailoverStep for VerifyHealth {
    fn name(&self) -> &'static str {
        "Verifying service availability"
    }

    fn key(&self) -> &'static str {
        "health_check"
    }

    async fn attempt(&self, ctx: &RecoveryContext) -> Result<StepRecord, StepError> {
        let result = ctx.services.probe.probe().await?;

        if (200..300).contains(&result.status_code) {
            Ok(StepRecord::success(format!(
                "All services responding (HTTP {} in {}ms)",
                result.status_code, result.latency_ms
            )))
        } else {
            Err(StepError::Precondition(format!(
                "Health check {} returned HTTP {}",
                ctx.config.health_check_url, result.status_code
            )))
        }
    }
}

/// Failback Step 1: Primary Region muss gesund sein
pub struct VerifyPrimaryHealthy;

#[async_trait]
impl FailoverStep for VerifyPrimaryHealthy {
    fn name(&self) -> &'static str {
        "Verifying primary region health"
    }

    fn key(&self) -> &'static str {
        "primary_health"
    }

    async fn attempt(&self, ctx: &RecoveryContext) -> Result<StepRecord, StepError> {
        let report = ctx.services.health.primary_health().await?;

        if report.status == HealthStatus::Healthy {
            Ok(StepRecord::success(report.details))
        } else {
            Err(StepError::Precondition(format!(
                "Primary region not healthy ({}): {}",
                report.status.as_str(),
                report.details
            )))
        }
    }
}

/// Readiness, Promotion, Scale-up, DNS, Health Check
pub fn failover_sequence() -> Vec<Box<dyn FailoverStep>> {
    vec![
        Box::new(VerifyReadiness),
        Box::new(PromoteDatabase),
        Box::new(ScaleService::new(Direction::Failover)),
        Box::new(UpdateDns::new(Direction::Failover)),
        Box::new(VerifyHealth),
    ]
}

/// DNS wird vor dem Scale-down umgestellt, damit kein Traffic auf einen
/// leeren Service zeigt.
pub fn failback_sequence() -> Vec<Box<dyn FailoverStep>> {
    vec![
        Box::new(VerifyPrimaryHealthy),
        Box::new(UpdateDns::new(Direction::Failback)),
        Box::new(ScaleService::new(Direction::Failback)),
    ]
}
