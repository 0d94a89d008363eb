use anyhow::Result;
use async_trait::async_trait;
use std::time::{Duration, Instant};

use super::{EndpointProbe, ProbeResult};

/// HTTP GET gegen den Health Endpoint des DR Stacks
pub struct HttpProbe {
    client: reqwest::Client,
    url: String,
}

impl HttpProbe {
    pub fn new(url: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(1)
            .build()?;

        Ok(Self { client, url })
    }
}

#[async_trait]
impl EndpointProbe for HttpProbe {
    async fn probe(&self) -> Result<ProbeResult> {
        let start = Instant::now();
        let response = self.client.get(&self.url).send().await?;

        Ok(ProbeResult {
            status_code: response.status().as_u16(),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}
