use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

pub const SYSTEM_NAME: &str = "1001 Stories Disaster Recovery";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Success,
    Warning,
    Critical,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &str {
        match self {
            Severity::Success => "SUCCESS",
            Severity::Warning => "WARNING",
            Severity::Critical => "CRITICAL",
            Severity::Info => "INFO",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Alert der über den Notifier (SNS) an die Operatoren geht
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub severity: Severity,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            created_at: Utc::now(),
        }
    }

    pub fn subject(&self) -> String {
        format!("1001 Stories DR Alert - {}", self.severity)
    }

    pub fn body(&self) -> String {
        format!(
            "{}\n\nTimestamp: {}\nSeverity: {}\nSystem: {}\n",
            self.message.trim(),
            self.created_at.to_rfc3339(),
            self.severity,
            SYSTEM_NAME,
        )
    }
}
