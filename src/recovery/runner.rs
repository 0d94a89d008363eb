use serde::Serialize;
use std::time::Instant;

use super::models::StepRecord;
use super::steps::{FailoverStep, StepError};
use super::RecoveryContext;
use crate::utils::Metrics;

/// Ein Step macht höchstens so viele externe Aufrufe; das Zeitbudget pro Step
/// ist entsprechend ein Vielfaches des Call-Timeouts.
const CALLS_PER_STEP: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletedStep {
    pub index: usize,
    pub key: &'static str,
    pub name: &'static str,
    #[serde(flatten)]
    pub record: StepRecord,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceOutcome {
    Completed(Vec<CompletedStep>),
    /// `index` ist 1-basiert; `completed` enthält die Steps davor
    FailedAt {
        index: usize,
        name: &'static str,
        cause: String,
        completed: Vec<CompletedStep>,
    },
}

/// Führe die Steps strikt nacheinander aus und stoppe beim ersten Fehler.
/// Kein Retry, kein Rollback.
pub async fn run_sequence(
    steps: &[Box<dyn FailoverStep>],
    ctx: &RecoveryContext,
    metrics: &Metrics,
) -> SequenceOutcome {
    let budget = ctx.config.call_timeout() * CALLS_PER_STEP;
    let mut completed = Vec::with_capacity(steps.len());

    for (position, step) in steps.iter().enumerate() {
        let index = position + 1;
        tracing::info!(step = index, name = step.name(), "Starting recovery step");

        let started = Instant::now();
        let attempt = tokio::time::timeout(budget, step.attempt(ctx))
            .await
            .unwrap_or_else(|_| Err(StepError::Timeout(budget.as_secs())));
        let elapsed = started.elapsed();

        metrics
            .step_duration
            .with_label_values(&[step.key()])
            .observe(elapsed.as_secs_f64());

        match attempt {
            Ok(record) => {
                tracing::info!(
                    step = index,
                    name = step.name(),
                    status = record.status.as_str(),
                    duration_ms = elapsed.as_millis() as u64,
                    "Recovery step finished"
                );
                completed.push(CompletedStep {
                    index,
                    key: step.key(),
                    name: step.name(),
                    record,
                });
            }
            Err(e) => {
                tracing::error!(
                    step = index,
                    name = step.name(),
                    error = %e,
                    duration_ms = elapsed.as_millis() as u64,
                    "Recovery step failed"
                );
                return SequenceOutcome::FailedAt {
                    index,
                    name: step.name(),
                    cause: e.to_string(),
                    completed,
                };
            }
        }
    }

    SequenceOutcome::Completed(completed)
}
