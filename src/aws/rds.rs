use anyhow::Result;
use async_trait::async_trait;
use aws_sdk_rds::Client;

use super::{DatabaseCluster, DatabaseInfo};

/// RDS Zugriff auf den Standby Datenbank Cluster
pub struct RdsDatabase {
    client: Client,
    identifier: String,
}

impl RdsDatabase {
    pub fn new(client: Client, identifier: String) -> Self {
        Self { client, identifier }
    }
}

#[async_trait]
impl DatabaseCluster for RdsDatabase {
    async fn describe(&self) -> Result<Option<DatabaseInfo>> {
        let response = match self
            .client
            .describe_db_clusters()
            .db_cluster_identifier(&self.identifier)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e)
                if e.as_service_error()
                    .map(|se| se.is_db_cluster_not_found_fault())
                    .unwrap_or(false) =>
            {
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        Ok(response.db_clusters().first().map(|cluster| DatabaseInfo {
            identifier: cluster
                .db_cluster_identifier()
                .unwrap_or(self.identifier.as_str())
                .to_string(),
            status: cluster.status().unwrap_or("unknown").to_string(),
            is_replica: cluster.replication_source_identifier().is_some(),
            latest_restorable_at: cluster.latest_restorable_time().map(|t| t.secs()),
        }))
    }

    async fn promote(&self) -> Result<()> {
        self.client
            .promote_read_replica_db_cluster()
            .db_cluster_identifier(&self.identifier)
            .send()
            .await?;

        tracing::warn!(cluster = %self.identifier, "Read replica promotion requested");

        Ok(())
    }
}
