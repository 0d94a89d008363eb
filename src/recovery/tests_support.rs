//! Mock-Aufbau für Tests des Recovery Kerns

use std::sync::{Arc, Mutex};

use chrono::Utc;

use super::notification::Notification;
use super::Services;
use crate::aws::{
    ClusterInfo, DatabaseInfo, HealthStatus, MockComputeCluster, MockDatabaseCluster,
    MockDnsRouter, MockEndpointProbe, MockNotifier, MockRegionHealth, ProbeResult,
    RegionHealthReport, ServiceInfo,
};

pub struct Mocks {
    pub compute: MockComputeCluster,
    pub database: MockDatabaseCluster,
    pub dns: MockDnsRouter,
    pub notifier: MockNotifier,
    pub health: MockRegionHealth,
    pub probe: MockEndpointProbe,
}

impl Mocks {
    pub fn new() -> Self {
        Self {
            compute: MockComputeCluster::new(),
            database: MockDatabaseCluster::new(),
            dns: MockDnsRouter::new(),
            notifier: MockNotifier::new(),
            health: MockRegionHealth::new(),
            probe: MockEndpointProbe::new(),
        }
    }

    pub fn into_services(self) -> Services {
        Services {
            compute: Arc::new(self.compute),
            database: Arc::new(self.database),
            dns: Arc::new(self.dns),
            notifier: Arc::new(self.notifier),
            health: Arc::new(self.health),
            probe: Arc::new(self.probe),
        }
    }

    /// Jede Notification wird aufgezeichnet
    pub fn record_notifications(&mut self) -> Arc<Mutex<Vec<Notification>>> {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let sink = sent.clone();
        self.notifier.expect_publish().returning(move |n| {
            sink.lock().unwrap().push(n.clone());
            Ok(())
        });
        sent
    }

    pub fn primary(&mut self, status: HealthStatus) {
        self.health
            .expect_primary_health()
            .returning(move || Ok(RegionHealthReport::new(status, "mocked primary health")));
    }

    /// DR Cluster ACTIVE, Replica mit frischem Restore-Point
    pub fn standby_ready(&mut self) {
        self.compute.expect_describe_cluster().returning(|| {
            Ok(Some(ClusterInfo {
                name: "stories-dr".to_string(),
                status: "ACTIVE".to_string(),
            }))
        });
        self.database
            .expect_describe()
            .returning(|| Ok(Some(replica(true))));
    }

    pub fn service_at(&mut self, desired_count: i32) {
        self.compute
            .expect_describe_service()
            .returning(move || Ok(Some(service(desired_count))));
    }

    pub fn probe_status(&mut self, status_code: u16) {
        self.probe.expect_probe().returning(move || {
            Ok(ProbeResult {
                status_code,
                latency_ms: 12,
            })
        });
    }
}

impl Default for Mocks {
    fn default() -> Self {
        Self::new()
    }
}

pub fn replica(is_replica: bool) -> DatabaseInfo {
    DatabaseInfo {
        identifier: "stories-db-replica".to_string(),
        status: "available".to_string(),
        is_replica,
        latest_restorable_at: Some(Utc::now().timestamp() - 60),
    }
}

pub fn service(desired_count: i32) -> ServiceInfo {
    ServiceInfo {
        name: "stories-app".to_string(),
        status: "ACTIVE".to_string(),
        desired_count,
        running_count: desired_count,
    }
}

/// Mocks ohne Expectations: jeder Aufruf lässt den Test fehlschlagen
pub fn services_without_expectations() -> Services {
    Mocks::new().into_services()
}
