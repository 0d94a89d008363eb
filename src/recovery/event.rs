use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Source-Feld eines EventBridge Events für CloudWatch Alarm State Changes
pub const CLOUDWATCH_SOURCE: &str = "aws.cloudwatch";

/// Token das ein manueller Failover exakt mitliefern muss
pub const MANUAL_FAILOVER_TOKEN: &str = "CONFIRM_MANUAL_FAILOVER";

/// Eingehendes Event wie es von Lambda/EventBridge geliefert wird
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    pub source: Option<String>,
    pub action: Option<String>,
    pub confirmation_token: Option<String>,
    pub detail: Option<Value>,
}

impl RawEvent {
    pub fn with_action(action: &str) -> Self {
        Self {
            action: Some(action.to_string()),
            ..Default::default()
        }
    }
}

/// Klassifiziertes DR Event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrEvent {
    AlarmTrigger { alarm_name: Option<String> },
    ManualFailover { confirmation_token: Option<String> },
    Failback,
    Test,
    StatusQuery,
}

impl DrEvent {
    /// Ordnet ein Event genau einem Handler zu. Der Source-Check hat Vorrang
    /// vor `action`; unbekannte Actions landen beim Status Check.
    pub fn classify(raw: &RawEvent) -> Self {
        if raw.source.as_deref() == Some(CLOUDWATCH_SOURCE) {
            let alarm_name = raw
                .detail
                .as_ref()
                .and_then(|d| d.get("alarmName"))
                .and_then(Value::as_str)
                .map(str::to_string);
            return DrEvent::AlarmTrigger { alarm_name };
        }

        match raw.action.as_deref() {
            Some("failover") => DrEvent::ManualFailover {
                confirmation_token: raw.confirmation_token.clone(),
            },
            Some("failback") => DrEvent::Failback,
            Some("test") => DrEvent::Test,
            _ => DrEvent::StatusQuery,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            DrEvent::AlarmTrigger { .. } => "alarm_trigger",
            DrEvent::ManualFailover { .. } => "manual_failover",
            DrEvent::Failback => "failback",
            DrEvent::Test => "test",
            DrEvent::StatusQuery => "status",
        }
    }
}
