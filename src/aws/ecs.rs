use anyhow::Result;
use async_trait::async_trait;
use aws_sdk_ecs::Client;

use super::{ClusterInfo, ComputeCluster, ServiceInfo};

/// ECS Zugriff auf den DR Cluster und Service
pub struct EcsCompute {
    client: Client,
    cluster: String,
    service: String,
}

impl EcsCompute {
    pub fn new(client: Client, cluster: String, service: String) -> Self {
        Self {
            client,
            cluster,
            service,
        }
    }
}

#[async_trait]
impl ComputeCluster for EcsCompute {
    async fn describe_cluster(&self) -> Result<Option<ClusterInfo>> {
        let response = self
            .client
            .describe_clusters()
            .clusters(&self.cluster)
            .send()
            .await?;

        Ok(response.clusters().first().map(|cluster| ClusterInfo {
            name: cluster
                .cluster_name()
                .unwrap_or(self.cluster.as_str())
                .to_string(),
            status: cluster.status().unwrap_or("UNKNOWN").to_string(),
        }))
    }

    async fn describe_service(&self) -> Result<Option<ServiceInfo>> {
        let response = self
            .client
            .describe_services()
            .cluster(&self.cluster)
            .services(&self.service)
            .send()
            .await?;

        Ok(response.services().first().map(|service| ServiceInfo {
            name: service
                .service_name()
                .unwrap_or(self.service.as_str())
                .to_string(),
            status: service.status().unwrap_or("UNKNOWN").to_string(),
            desired_count: service.desired_count(),
            running_count: service.running_count(),
        }))
    }

    async fn set_desired_count(&self, count: i32) -> Result<()> {
        self.client
            .update_service()
            .cluster(&self.cluster)
            .service(&self.service)
            .desired_count(count)
            .send()
            .await?;

        tracing::info!(
            cluster = %self.cluster,
            service = %self.service,
            desired_count = count,
            "ECS service desired count updated"
        );

        Ok(())
    }
}
