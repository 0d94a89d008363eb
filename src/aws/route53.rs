use anyhow::Result;
use async_trait::async_trait;
use aws_sdk_route53::types::{
    Change, ChangeAction, ChangeBatch, ResourceRecord, ResourceRecordSet, RrType,
};
use aws_sdk_route53::Client;

use super::DnsRouter;

/// Route53 CNAME über den der Traffic zwischen den Regionen umgeschaltet wird
pub struct Route53Router {
    client: Client,
    hosted_zone_id: String,
    record_name: String,
    ttl: i64,
}

impl Route53Router {
    pub fn new(client: Client, hosted_zone_id: String, record_name: String, ttl: i64) -> Self {
        Self {
            client,
            hosted_zone_id,
            record_name,
            ttl,
        }
    }
}

#[async_trait]
impl DnsRouter for Route53Router {
    async fn current_target(&self) -> Result<Option<String>> {
        let response = self
            .client
            .list_resource_record_sets()
            .hosted_zone_id(&self.hosted_zone_id)
            .start_record_name(&self.record_name)
            .start_record_type(RrType::Cname)
            .max_items(1)
            .send()
            .await?;

        let wanted = normalize(&self.record_name);
        let target = response
            .resource_record_sets()
            .iter()
            .find(|set| normalize(set.name()) == wanted && *set.r#type() == RrType::Cname)
            .and_then(|set| set.resource_records().first())
            .map(|record| record.value().trim_end_matches('.').to_string());

        Ok(target)
    }

    async fn point_to(&self, target: &str) -> Result<String> {
        let record_set = ResourceRecordSet::builder()
            .name(&self.record_name)
            .r#type(RrType::Cname)
            .ttl(self.ttl)
            .resource_records(ResourceRecord::builder().value(target).build()?)
            .build()?;

        let batch = ChangeBatch::builder()
            .comment(format!("1001 Stories DR: route {} to {}", self.record_name, target))
            .changes(
                Change::builder()
                    .action(ChangeAction::Upsert)
                    .resource_record_set(record_set)
                    .build()?,
            )
            .build()?;

        let response = self
            .client
            .change_resource_record_sets()
            .hosted_zone_id(&self.hosted_zone_id)
            .change_batch(batch)
            .send()
            .await?;

        let change_id = response
            .change_info()
            .map(|info| info.id().to_string())
            .unwrap_or_default();

        tracing::warn!(
            record = %self.record_name,
            target = %target,
            change_id = %change_id,
            "DNS record updated"
        );

        Ok(change_id)
    }
}

/// Route53 liefert Namen mit abschließendem Punkt
pub fn normalize(name: &str) -> String {
    name.trim_end_matches('.').to_ascii_lowercase()
}
