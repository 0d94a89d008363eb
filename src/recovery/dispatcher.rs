use chrono::Utc;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use thiserror::Error;
use tokio::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use super::checks;
use super::event::{DrEvent, RawEvent, MANUAL_FAILOVER_TOKEN};
use super::models::{CheckResult, ReplicationLagReport};
use super::notification::{Notification, Severity};
use super::response::InvocationResponse;
use super::runner::{run_sequence, CompletedStep, SequenceOutcome};
use super::steps::{failback_sequence, failover_sequence};
use super::RecoveryContext;
use crate::aws::HealthStatus;
use crate::utils::Metrics;

/// Fehler die aus einem Handler entkommen und beim Dispatcher als 500 enden
#[derive(Debug, Error)]
#[error("{context}: {source:#}")]
pub struct DrError {
    context: &'static str,
    #[source]
    source: anyhow::Error,
}

impl DrError {
    fn wrap(context: &'static str) -> impl FnOnce(anyhow::Error) -> Self {
        move |source| Self { context, source }
    }
}

type HandlerResult = Result<InvocationResponse, DrError>;

/// Nimmt ein Event entgegen und ruft genau einen Handler auf
pub struct Dispatcher {
    ctx: RecoveryContext,
    metrics: Arc<Metrics>,
}

impl Dispatcher {
    pub fn new(ctx: RecoveryContext, metrics: Arc<Metrics>) -> Self {
        Self { ctx, metrics }
    }

    pub async fn dispatch(&self, raw: RawEvent) -> InvocationResponse {
        let event = DrEvent::classify(&raw);
        let invocation_id = Uuid::new_v4();
        let span = tracing::info_span!("invocation", %invocation_id, event = event.kind());

        async {
            tracing::info!(source = ?raw.source, action = ?raw.action, "DR event received");

            let result = match &event {
                DrEvent::AlarmTrigger { alarm_name } => {
                    tracing::warn!(alarm = ?alarm_name, "Automated failover triggered by alarm");
                    self.handle_automated_failover().await
                }
                DrEvent::ManualFailover { confirmation_token } => {
                    self.handle_manual_failover(confirmation_token.as_deref()).await
                }
                DrEvent::Failback => self.handle_failback().await,
                DrEvent::Test => self.handle_dr_test().await,
                DrEvent::StatusQuery => self.handle_status_check().await,
            };

            let response = match result {
                Ok(response) => response,
                Err(e) => {
                    tracing::error!(error = %e, "DR invocation failed");
                    let message = format!("Disaster Recovery Orchestrator Error: {e}");
                    self.notify(Severity::Critical, message.clone()).await;
                    InvocationResponse::server_error(json!({
                        "status": "error",
                        "message": message,
                        "timestamp": Utc::now().to_rfc3339(),
                    }))
                }
            };

            let status_code = response.status_code.to_string();
            self.metrics
                .invocations
                .with_label_values(&[event.kind(), status_code.as_str()])
                .inc();
            tracing::info!(status_code = response.status_code, "DR event handled");

            response
        }
        .instrument(span)
        .await
    }

    /// Pre-Check der Primary Region, danach die fünf Failover Steps
    async fn handle_automated_failover(&self) -> HandlerResult {
        let started_at = Utc::now();
        let clock = Instant::now();

        let primary = self
            .ctx
            .services
            .health
            .primary_health()
            .await
            .map_err(DrError::wrap("primary region health check failed"))?;

        // Nur ein eindeutig UNHEALTHY Primary rechtfertigt den Failover
        if primary.status != HealthStatus::Unhealthy {
            tracing::warn!(
                status = primary.status.as_str(),
                details = %primary.details,
                "Primary region not unhealthy, failover cancelled"
            );
            self.notify(
                Severity::Warning,
                format!(
                    "False alarm: Primary region appears healthy. Failover cancelled.\n\n\
                     Primary status: {} ({})",
                    primary.status.as_str(),
                    primary.details
                ),
            )
            .await;

            return Ok(InvocationResponse::ok(json!({
                "status": "cancelled",
                "reason": "primary_healthy",
                "primary_health": primary,
                "timestamp": Utc::now().to_rfc3339(),
            })));
        }

        let steps = failover_sequence();
        match run_sequence(&steps, &self.ctx, &self.metrics).await {
            SequenceOutcome::Completed(completed) => {
                let duration = clock.elapsed().as_secs_f64();
                let completed_at = Utc::now();
                let rto_target = self.ctx.config.rto_target_seconds;
                let rto_met = duration <= rto_target as f64;

                self.metrics.failover_duration.observe(duration);
                tracing::info!(duration_seconds = duration, rto_met, "Failover completed");

                self.notify(
                    Severity::Success,
                    failover_success_message(duration, rto_target, rto_met, &completed),
                )
                .await;

                Ok(InvocationResponse::ok(json!({
                    "status": "success",
                    "failover_duration_seconds": duration,
                    "rto_target_seconds": rto_target,
                    "rto_met": rto_met,
                    "services": services_map(&completed),
                    "started_at": started_at.to_rfc3339(),
                    "timestamp": completed_at.to_rfc3339(),
                })))
            }
            SequenceOutcome::FailedAt {
                index,
                name,
                cause,
                completed,
            } => {
                self.notify(
                    Severity::Critical,
                    step_failure_message("DISASTER RECOVERY FAILED", index, name, &cause),
                )
                .await;

                Ok(InvocationResponse::server_error(json!({
                    "status": "failed",
                    "failed_step": index,
                    "failed_operation": name,
                    "error": cause,
                    "completed_steps": completed,
                    "timestamp": Utc::now().to_rfc3339(),
                })))
            }
        }
    }

    /// Ohne exaktes Token passiert nichts, auch keine Notification
    async fn handle_manual_failover(&self, confirmation_token: Option<&str>) -> HandlerResult {
        if confirmation_token != Some(MANUAL_FAILOVER_TOKEN) {
            tracing::warn!("Manual failover rejected: missing or wrong confirmation token");
            return Ok(InvocationResponse::bad_request(json!({
                "status": "error",
                "message": format!(
                    "Manual failover requires confirmation token: {MANUAL_FAILOVER_TOKEN}"
                ),
            })));
        }

        self.notify(
            Severity::Warning,
            "Manual disaster recovery failover initiated by administrator.",
        )
        .await;

        self.handle_automated_failover().await
    }

    async fn handle_failback(&self) -> HandlerResult {
        let steps = failback_sequence();
        match run_sequence(&steps, &self.ctx, &self.metrics).await {
            SequenceOutcome::Completed(completed) => {
                self.notify(
                    Severity::Success,
                    format!(
                        "Failback operation completed. Traffic restored to primary region.\n\n\
                         Services Status:\n{}\n\n\
                         Database replication from primary must be re-established manually.",
                        step_summary(&completed)
                    ),
                )
                .await;

                Ok(InvocationResponse::ok(json!({
                    "status": "success",
                    "operation": "failback",
                    "services": services_map(&completed),
                    "timestamp": Utc::now().to_rfc3339(),
                })))
            }
            SequenceOutcome::FailedAt {
                index,
                name,
                cause,
                completed,
            } => {
                self.notify(
                    Severity::Critical,
                    step_failure_message("FAILBACK FAILED", index, name, &cause),
                )
                .await;

                Ok(InvocationResponse::server_error(json!({
                    "status": "failed",
                    "operation": "failback",
                    "failed_step": index,
                    "failed_operation": name,
                    "error": cause,
                    "completed_steps": completed,
                    "timestamp": Utc::now().to_rfc3339(),
                })))
            }
        }
    }

    /// Nur lesende Checks, keine Promotion, kein Scaling, keine DNS Änderung
    async fn handle_dr_test(&self) -> HandlerResult {
        let results = [
            ("database_backup_status", checks::database_backups(&self.ctx).await),
            ("dr_capacity_available", checks::dr_capacity(&self.ctx).await),
            ("cross_region_replication", checks::replication(&self.ctx).await),
            ("automation_scripts", checks::automation(&self.ctx).await),
        ];

        let test_passed = results.iter().all(|(_, result)| result.passed());
        tracing::info!(test_passed, "DR test finished");

        self.notify(Severity::Info, test_report_message(test_passed, &results))
            .await;

        let test_results: Map<String, Value> = results
            .iter()
            .map(|(name, result)| (name.to_string(), json!(result)))
            .collect();

        Ok(InvocationResponse::ok(json!({
            "status": "success",
            "test_passed": test_passed,
            "test_results": test_results,
            "timestamp": Utc::now().to_rfc3339(),
        })))
    }

    async fn handle_status_check(&self) -> HandlerResult {
        let health = &self.ctx.services.health;

        let primary = health
            .primary_health()
            .await
            .map_err(DrError::wrap("primary region health check failed"))?;
        let readiness = checks::dr_readiness(&self.ctx).await;
        let backups = checks::database_backups(&self.ctx).await;
        let lag = health
            .replication_lag_seconds()
            .await
            .map_err(DrError::wrap("replication lag query failed"))?;

        Ok(InvocationResponse::ok(json!({
            "status": "success",
            "dr_status": {
                "primary_region_health": primary,
                "dr_region_readiness": readiness,
                "backup_status": backups,
                "replication_lag": ReplicationLagReport::evaluate(
                    lag,
                    self.ctx.config.rpo_target_seconds,
                ),
            },
            "timestamp": Utc::now().to_rfc3339(),
        })))
    }

    /// Notification Fehler werden geloggt, ändern aber nie die Response
    async fn notify(&self, severity: Severity, message: impl Into<String>) {
        let notification = Notification::new(severity, message);

        let outcome = match self.ctx.services.notifier.publish(&notification).await {
            Ok(()) => "sent",
            Err(e) => {
                tracing::error!(
                    severity = %severity,
                    error = %format!("{e:#}"),
                    "Failed to send notification"
                );
                "failed"
            }
        };

        self.metrics
            .notifications
            .with_label_values(&[severity.as_str(), outcome])
            .inc();
    }
}

fn services_map(completed: &[CompletedStep]) -> Map<String, Value> {
    completed
        .iter()
        .map(|step| (step.key.to_string(), json!(step.record)))
        .collect()
}

fn step_summary(completed: &[CompletedStep]) -> String {
    completed
        .iter()
        .map(|step| {
            format!(
                "- {}: {} ({})",
                step.name,
                step.record.status.as_str(),
                step.record.details
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn failover_success_message(
    duration: f64,
    rto_target: u64,
    rto_met: bool,
    completed: &[CompletedStep],
) -> String {
    format!(
        "DISASTER RECOVERY COMPLETED SUCCESSFULLY\n\n\
         Failover Duration: {duration:.1} seconds\n\
         RTO Target: {rto_target} seconds\n\
         RTO Status: {}\n\n\
         Services Status:\n{}\n\n\
         Next Steps:\n\
         1. Monitor service performance in DR region\n\
         2. Investigate primary region failure\n\
         3. Plan failback when primary region is restored",
        if rto_met { "✅ MET" } else { "❌ EXCEEDED" },
        step_summary(completed),
    )
}

fn step_failure_message(headline: &str, index: usize, name: &str, cause: &str) -> String {
    format!(
        "{headline}\n\n\
         Failed at Step {index}: {name}\n\
         Error: {cause}\n\n\
         MANUAL INTERVENTION REQUIRED\n\
         Contact on-call engineer immediately."
    )
}

fn test_report_message(test_passed: bool, results: &[(&str, CheckResult)]) -> String {
    let lines = results
        .iter()
        .map(|(name, result)| {
            format!("{}: {} ({})", name, result.status.as_str(), result.details)
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "DR TEST RESULTS: {}\n\n{}\n\n{}",
        if test_passed { "✅ PASSED" } else { "❌ FAILED" },
        lines,
        if test_passed {
            ""
        } else {
            "ISSUES FOUND - REVIEW REQUIRED"
        },
    )
}
