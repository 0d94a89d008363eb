use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Fehler beim Laden oder Validieren der Konfiguration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Load(#[from] ::config::ConfigError),
    #[error("missing required setting {0}")]
    Missing(&'static str),
    #[error("invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Rohwerte wie sie aus Datei/Environment kommen, noch nicht validiert
#[derive(Debug, Default, Deserialize)]
struct Settings {
    primary_region: Option<String>,
    backup_region: Option<String>,
    dr_cluster_name: Option<String>,
    dr_service_name: Option<String>,
    database_cluster_identifier: Option<String>,
    sns_topic_arn: Option<String>,
    rto_target_seconds: Option<u64>,
    rpo_target_seconds: Option<u64>,
    hosted_zone_id: Option<String>,
    dns_record_name: Option<String>,
    primary_endpoint: Option<String>,
    standby_endpoint: Option<String>,
    health_check_url: Option<String>,
    primary_health_alarms: Option<String>,
    dr_min_capacity: i32,
    dr_standby_capacity: i32,
    dns_ttl_seconds: i64,
    call_timeout_seconds: u64,
    server_port: u16,
}

/// Hauptkonfiguration für den DR Orchestrator.
///
/// Wird einmal beim Start geladen und validiert und danach unverändert an den
/// Dispatcher übergeben.
#[derive(Debug, Clone)]
pub struct Config {
    pub primary_region: String,
    pub backup_region: String,
    pub dr_cluster_name: String,
    pub dr_service_name: String,
    pub database_cluster_identifier: String,
    pub sns_topic_arn: String,
    pub rto_target_seconds: u64,
    pub rpo_target_seconds: u64,
    pub hosted_zone_id: String,
    pub dns_record_name: String,
    pub primary_endpoint: String,
    pub standby_endpoint: String,
    pub health_check_url: String,
    /// CloudWatch Alarme, die den Zustand der Primary Region abbilden
    pub primary_health_alarms: Vec<String>,
    /// Desired Count für den DR Service nach Failover
    pub dr_min_capacity: i32,
    /// Desired Count für den DR Service nach Failback
    pub dr_standby_capacity: i32,
    pub dns_ttl_seconds: i64,
    pub call_timeout_seconds: u64,
    pub server_port: u16,
}

impl Config {
    /// Lade Config aus optionaler TOML Datei und Environment Variablen
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::build(path, true)
    }

    fn build(path: Option<&Path>, with_env: bool) -> Result<Self, ConfigError> {
        let mut builder = ::config::Config::builder()
            .set_default("dr_min_capacity", 5_i64)?
            .set_default("dr_standby_capacity", 0_i64)?
            .set_default("dns_ttl_seconds", 60_i64)?
            .set_default("call_timeout_seconds", 30_i64)?
            .set_default("server_port", 8080_i64)?;

        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path).required(true));
        }
        if with_env {
            builder = builder.add_source(::config::Environment::default());
        }

        let settings: Settings = builder.build()?.try_deserialize()?;
        Self::from_settings(settings)
    }

    fn from_settings(s: Settings) -> Result<Self, ConfigError> {
        let config = Self {
            primary_region: required(s.primary_region, "PRIMARY_REGION")?,
            backup_region: required(s.backup_region, "BACKUP_REGION")?,
            dr_cluster_name: required(s.dr_cluster_name, "DR_CLUSTER_NAME")?,
            dr_service_name: required(s.dr_service_name, "DR_SERVICE_NAME")?,
            database_cluster_identifier: required(
                s.database_cluster_identifier,
                "DATABASE_CLUSTER_IDENTIFIER",
            )?,
            sns_topic_arn: required(s.sns_topic_arn, "SNS_TOPIC_ARN")?,
            rto_target_seconds: s
                .rto_target_seconds
                .ok_or(ConfigError::Missing("RTO_TARGET_SECONDS"))?,
            rpo_target_seconds: s
                .rpo_target_seconds
                .ok_or(ConfigError::Missing("RPO_TARGET_SECONDS"))?,
            hosted_zone_id: required(s.hosted_zone_id, "HOSTED_ZONE_ID")?,
            dns_record_name: required(s.dns_record_name, "DNS_RECORD_NAME")?,
            primary_endpoint: required(s.primary_endpoint, "PRIMARY_ENDPOINT")?,
            standby_endpoint: required(s.standby_endpoint, "STANDBY_ENDPOINT")?,
            health_check_url: required(s.health_check_url, "HEALTH_CHECK_URL")?,
            primary_health_alarms: s
                .primary_health_alarms
                .as_deref()
                .unwrap_or_default()
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect(),
            dr_min_capacity: s.dr_min_capacity,
            dr_standby_capacity: s.dr_standby_capacity,
            dns_ttl_seconds: s.dns_ttl_seconds,
            call_timeout_seconds: s.call_timeout_seconds,
            server_port: s.server_port,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.primary_region == self.backup_region {
            return Err(invalid(
                "BACKUP_REGION",
                "must differ from PRIMARY_REGION",
            ));
        }
        if self.rto_target_seconds == 0 {
            return Err(invalid("RTO_TARGET_SECONDS", "must be greater than zero"));
        }
        if self.rpo_target_seconds == 0 {
            return Err(invalid("RPO_TARGET_SECONDS", "must be greater than zero"));
        }
        if self.dr_min_capacity <= 0 {
            return Err(invalid("DR_MIN_CAPACITY", "must be greater than zero"));
        }
        if self.dr_standby_capacity < 0 {
            return Err(invalid("DR_STANDBY_CAPACITY", "must not be negative"));
        }
        if self.dns_ttl_seconds <= 0 {
            return Err(invalid("DNS_TTL_SECONDS", "must be greater than zero"));
        }
        if self.call_timeout_seconds == 0 {
            return Err(invalid("CALL_TIMEOUT_SECONDS", "must be greater than zero"));
        }

        let url = reqwest::Url::parse(&self.health_check_url)
            .map_err(|e| invalid("HEALTH_CHECK_URL", &e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid("HEALTH_CHECK_URL", "scheme must be http or https"));
        }

        // Ohne Alarme ist die Primary Health immer UNKNOWN und kein Failover läuft
        if self.primary_health_alarms.is_empty() {
            return Err(ConfigError::Missing("PRIMARY_HEALTH_ALARMS"));
        }

        Ok(())
    }

    /// Timeout pro externem Aufruf (AWS, Health Check)
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_seconds)
    }

    #[cfg(test)]
    pub fn sample() -> Self {
        Self {
            primary_region: "us-east-1".to_string(),
            backup_region: "us-west-2".to_string(),
            dr_cluster_name: "stories-dr".to_string(),
            dr_service_name: "stories-app".to_string(),
            database_cluster_identifier: "stories-db-replica".to_string(),
            sns_topic_arn: "arn:aws:sns:us-west-2:123456789012:stories-dr-alerts".to_string(),
            rto_target_seconds: 900,
            rpo_target_seconds: 300,
            hosted_zone_id: "Z0123456789ABC".to_string(),
            dns_record_name: "app.1001stories.org".to_string(),
            primary_endpoint: "primary-alb.us-east-1.elb.amazonaws.com".to_string(),
            standby_endpoint: "dr-alb.us-west-2.elb.amazonaws.com".to_string(),
            health_check_url: "https://dr-alb.us-west-2.elb.amazonaws.com/api/health".to_string(),
            primary_health_alarms: vec!["stories-primary-5xx".to_string()],
            dr_min_capacity: 5,
            dr_standby_capacity: 0,
            dns_ttl_seconds: 60,
            call_timeout_seconds: 5,
            server_port: 8080,
        }
    }
}

fn required(value: Option<String>, key: &'static str) -> Result<String, ConfigError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(ConfigError::Missing(key)),
    }
}

fn invalid(key: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        key,
        reason: reason.to_string(),
    }
}
