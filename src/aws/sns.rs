use anyhow::Result;
use async_trait::async_trait;
use aws_sdk_sns::Client;

use super::Notifier;
use crate::recovery::notification::Notification;

/// SNS Topic für DR Alerts
pub struct SnsNotifier {
    client: Client,
    topic_arn: String,
}

impl SnsNotifier {
    pub fn new(client: Client, topic_arn: String) -> Self {
        Self { client, topic_arn }
    }
}

#[async_trait]
impl Notifier for SnsNotifier {
    async fn publish(&self, notification: &Notification) -> Result<()> {
        self.client
            .publish()
            .topic_arn(&self.topic_arn)
            .subject(notification.subject())
            .message(notification.body())
            .send()
            .await?;

        Ok(())
    }

    async fn check_topic(&self) -> Result<()> {
        self.client
            .get_topic_attributes()
            .topic_arn(&self.topic_arn)
            .send()
            .await?;

        Ok(())
    }
}
