//! Disaster Recovery Kern: Event-Klassifizierung, Failover-Sequenz und die
//! fünf Handler hinter dem Dispatcher.

pub mod checks;
pub mod dispatcher;
pub mod event;
pub mod models;
pub mod notification;
pub mod response;
pub mod runner;
pub mod steps;

#[cfg(test)]
pub mod tests_support;

use std::sync::Arc;

use crate::aws::{ComputeCluster, DatabaseCluster, DnsRouter, EndpointProbe, Notifier, RegionHealth};
use crate::utils::Config;

pub use dispatcher::Dispatcher;
pub use event::RawEvent;
pub use response::InvocationResponse;

/// Externe Systeme, die der Orchestrator anspricht
#[derive(Clone)]
pub struct Services {
    pub compute: Arc<dyn ComputeCluster>,
    pub database: Arc<dyn DatabaseCluster>,
    pub dns: Arc<dyn DnsRouter>,
    pub notifier: Arc<dyn Notifier>,
    pub health: Arc<dyn RegionHealth>,
    pub probe: Arc<dyn EndpointProbe>,
}

/// Alles was Handler und Steps während einer Invocation brauchen
pub struct RecoveryContext {
    pub config: Config,
    pub services: Services,
}

impl RecoveryContext {
    pub fn new(config: Config, services: Services) -> Self {
        Self { config, services }
    }
}
