//! Read-only Checks, die von Readiness-Step, DR Test und Status Check
//! gemeinsam genutzt werden. Keiner dieser Checks verändert Infrastruktur.

use chrono::Utc;

use super::models::{CheckResult, LagStatus, Readiness, ReplicationLagReport};
use super::RecoveryContext;

/// Prüfe ob ECS Cluster aktiv und Backups vorhanden sind.
/// Fehler der Collaborators werden zu "nicht bereit".
pub async fn dr_readiness(ctx: &RecoveryContext) -> Readiness {
    let cluster = match ctx.services.compute.describe_cluster().await {
        Ok(Some(cluster)) => cluster,
        Ok(None) => return Readiness::not_ready("ECS cluster not found"),
        Err(e) => return Readiness::not_ready(format!("Error checking DR readiness: {e:#}")),
    };

    if cluster.status != "ACTIVE" {
        return Readiness::not_ready(format!("ECS cluster status: {}", cluster.status));
    }

    if !database_backups(ctx).await.passed() {
        return Readiness::not_ready("Database backups not available");
    }

    Readiness::ready("DR region is ready")
}

/// Letzter wiederherstellbarer Zeitpunkt muss innerhalb des RPO liegen
pub async fn database_backups(ctx: &RecoveryContext) -> CheckResult {
    let identifier = &ctx.config.database_cluster_identifier;
    let rpo = ctx.config.rpo_target_seconds;

    let info = match ctx.services.database.describe().await {
        Ok(Some(info)) => info,
        Ok(None) => return CheckResult::fail(format!("Database cluster {identifier} not found")),
        Err(e) => return CheckResult::fail(format!("{e:#}")),
    };

    let Some(latest) = info.latest_restorable_at else {
        return CheckResult::fail("No restorable backup point available");
    };

    let age = (Utc::now().timestamp() - latest).max(0);
    if age as u64 <= rpo {
        CheckResult::pass(format!(
            "Recent backups available (latest restorable point {age}s ago)"
        ))
    } else {
        CheckResult::fail(format!(
            "Latest restorable point {age}s ago exceeds RPO target of {rpo}s"
        ))
    }
}

/// DR Cluster aktiv und DR Service vorhanden
pub async fn dr_capacity(ctx: &RecoveryContext) -> CheckResult {
    let compute = &ctx.services.compute;

    match compute.describe_cluster().await {
        Ok(Some(cluster)) if cluster.status == "ACTIVE" => {}
        Ok(Some(cluster)) => {
            return CheckResult::fail(format!("ECS cluster status: {}", cluster.status))
        }
        Ok(None) => return CheckResult::fail("ECS cluster not found"),
        Err(e) => return CheckResult::fail(format!("{e:#}")),
    }

    match compute.describe_service().await {
        Ok(Some(service)) => CheckResult::pass(format!(
            "Service {} {} ({} desired, {} running, scales to {})",
            service.name,
            service.status,
            service.desired_count,
            service.running_count,
            ctx.config.dr_min_capacity
        )),
        Ok(None) => CheckResult::fail(format!(
            "ECS service {} not found",
            ctx.config.dr_service_name
        )),
        Err(e) => CheckResult::fail(format!("{e:#}")),
    }
}

/// Replication Lag innerhalb des RPO
pub async fn replication(ctx: &RecoveryContext) -> CheckResult {
    match ctx.services.health.replication_lag_seconds().await {
        Ok(lag) => {
            let report = ReplicationLagReport::evaluate(lag, ctx.config.rpo_target_seconds);
            match (report.lag_seconds, report.status) {
                (Some(lag), LagStatus::Acceptable) => {
                    CheckResult::pass(format!("Replication up to date ({lag:.1}s lag)"))
                }
                (Some(lag), _) => CheckResult::fail(format!(
                    "Replication lag {lag:.1}s exceeds RPO target of {}s",
                    ctx.config.rpo_target_seconds
                )),
                (None, _) => CheckResult::fail("No replication lag datapoints available"),
            }
        }
        Err(e) => CheckResult::fail(format!("{e:#}")),
    }
}

/// DNS Record und Notification Topic, die der Failover braucht, sind erreichbar
pub async fn automation(ctx: &RecoveryContext) -> CheckResult {
    let record = &ctx.config.dns_record_name;

    let target = match ctx.services.dns.current_target().await {
        Ok(Some(target)) => target,
        Ok(None) => return CheckResult::fail(format!("DNS record {record} not found")),
        Err(e) => return CheckResult::fail(format!("DNS lookup failed: {e:#}")),
    };

    if let Err(e) = ctx.services.notifier.check_topic().await {
        return CheckResult::fail(format!("Notification topic unreachable: {e:#}"));
    }

    CheckResult::pass(format!("DNS record {record} -> {target}, notification topic reachable"))
}
