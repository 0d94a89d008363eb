use serde::Serialize;

/// Ergebnis eines einzelnen Recovery Steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StepStatus {
    Success,
    /// Zielzustand war bereits erreicht, es wurde nichts verändert
    Unchanged,
}

impl StepStatus {
    pub fn as_str(&self) -> &str {
        match self {
            StepStatus::Success => "SUCCESS",
            StepStatus::Unchanged => "UNCHANGED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    pub status: StepStatus,
    pub details: String,
}

impl StepRecord {
    pub fn success(details: impl Into<String>) -> Self {
        Self {
            status: StepStatus::Success,
            details: details.into(),
        }
    }

    pub fn unchanged(details: impl Into<String>) -> Self {
        Self {
            status: StepStatus::Unchanged,
            details: details.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CheckStatus {
    Pass,
    Fail,
}

impl CheckStatus {
    pub fn as_str(&self) -> &str {
        match self {
            CheckStatus::Pass => "PASS",
            CheckStatus::Fail => "FAIL",
        }
    }
}

/// PASS/FAIL Ergebnis eines read-only Checks
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    pub status: CheckStatus,
    pub details: String,
}

impl CheckResult {
    pub fn pass(details: impl Into<String>) -> Self {
        Self {
            status: CheckStatus::Pass,
            details: details.into(),
        }
    }

    pub fn fail(details: impl Into<String>) -> Self {
        Self {
            status: CheckStatus::Fail,
            details: details.into(),
        }
    }

    pub fn passed(&self) -> bool {
        self.status == CheckStatus::Pass
    }
}

/// Bereitschaft der DR Region für einen Failover
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Readiness {
    pub ready: bool,
    pub reason: String,
}

impl Readiness {
    pub fn ready(reason: impl Into<String>) -> Self {
        Self {
            ready: true,
            reason: reason.into(),
        }
    }

    pub fn not_ready(reason: impl Into<String>) -> Self {
        Self {
            ready: false,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LagStatus {
    Acceptable,
    Exceeded,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplicationLagReport {
    pub lag_seconds: Option<f64>,
    pub status: LagStatus,
}

impl ReplicationLagReport {
    /// Bewertet den Lag gegen das RPO Target
    pub fn evaluate(lag_seconds: Option<f64>, rpo_target_seconds: u64) -> Self {
        let status = match lag_seconds {
            Some(lag) if lag <= rpo_target_seconds as f64 => LagStatus::Acceptable,
            Some(_) => LagStatus::Exceeded,
            None => LagStatus::Unknown,
        };
        Self {
            lag_seconds,
            status,
        }
    }
}
