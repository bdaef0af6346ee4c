//! HTTP client for the coordinator.

use crate::consts::http::COORDINATOR_TIMEOUT_SECS;
use crate::coordinator::error::CoordinatorError;
use crate::coordinator::types::{
    BindRequest, BindResponse, ClaimRequest, ClaimResponse, NodeState, ShareReceipt,
    ShareSubmission,
};
use crate::coordinator::Coordinator;
use crate::job::{Job, JobOutcome};
use log::debug;
use reqwest::{Client, ClientBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct CoordinatorClient {
    client: Client,
    base_url: String,
}

impl CoordinatorClient {
    /// Create a new coordinator client against the given base address.
    pub fn new(base_url: &str) -> Self {
        Self {
            client: ClientBuilder::new()
                .timeout(Duration::from_secs(COORDINATOR_TIMEOUT_SECS))
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn build_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    async fn handle_response_status(response: Response) -> Result<Response, CoordinatorError> {
        if !response.status().is_success() {
            return Err(CoordinatorError::from_response(response).await);
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, CoordinatorError> {
        let url = self.build_url(endpoint);
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        let response = Self::handle_response_status(response).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn post_json<B, T>(&self, endpoint: &str, body: &B) -> Result<T, CoordinatorError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = self.build_url(endpoint);
        debug!("POST {}", url);
        let response = self.client.post(url).json(body).send().await?;
        let response = Self::handle_response_status(response).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait::async_trait]
impl Coordinator for CoordinatorClient {
    async fn bind(&self, request: &BindRequest) -> Result<BindResponse, CoordinatorError> {
        // A refusal (`bound: false`) is a normal wait state, so the response
        // is returned as-is rather than mapped to an error.
        self.post_json("v1/devices/bind", request).await
    }

    async fn node_state(&self, host_id: &str) -> Result<NodeState, CoordinatorError> {
        let host = urlencoding::encode(host_id).into_owned();
        self.get_json(&format!("v1/hosts/{}/state", host)).await
    }

    async fn submit_share(
        &self,
        share: &ShareSubmission,
    ) -> Result<ShareReceipt, CoordinatorError> {
        let receipt: ShareReceipt = self.post_json("v1/shares", share).await?;
        if !receipt.ok {
            return Err(CoordinatorError::Rejected(
                receipt
                    .error
                    .unwrap_or_else(|| "share not credited".to_string()),
            ));
        }
        Ok(receipt)
    }

    async fn claim_job(
        &self,
        host_id: &str,
        device_id: &str,
    ) -> Result<Option<Job>, CoordinatorError> {
        let request = ClaimRequest {
            host_id: host_id.to_string(),
            device_id: device_id.to_string(),
        };
        let response: ClaimResponse = self.post_json("v1/jobs/claim", &request).await?;
        if !response.ok {
            return Err(CoordinatorError::Rejected(
                response.error.unwrap_or_else(|| "claim refused".to_string()),
            ));
        }
        Ok(response.job)
    }

    async fn submit_job_result(
        &self,
        job_id: &str,
        outcome: &JobOutcome,
    ) -> Result<(), CoordinatorError> {
        let id = urlencoding::encode(job_id).into_owned();
        let url = self.build_url(&format!("v1/jobs/{}/result", id));
        debug!("POST {}", url);
        let response = self.client.post(url).json(outcome).send().await?;
        Self::handle_response_status(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_url_normalizes_slashes() {
        let client = CoordinatorClient::new("http://127.0.0.1:8080/");
        assert_eq!(
            client.build_url("/v1/devices/bind"),
            "http://127.0.0.1:8080/v1/devices/bind"
        );
        assert_eq!(
            client.build_url("v1/shares"),
            "http://127.0.0.1:8080/v1/shares"
        );
    }

    #[test]
    fn job_ids_are_path_encoded() {
        let client = CoordinatorClient::new("http://127.0.0.1:8080");
        let id = urlencoding::encode("job/7 a").into_owned();
        assert_eq!(
            client.build_url(&format!("v1/jobs/{}/result", id)),
            "http://127.0.0.1:8080/v1/jobs/job%2F7%20a/result"
        );
    }
}

#[cfg(test)]
/// These are ignored by default since they require a live coordinator to run.
mod live_coordinator_tests {
    use super::*;

    #[tokio::test]
    #[ignore] // This test requires a live coordinator instance.
    async fn bind_round_trips_against_a_local_coordinator() {
        let client = CoordinatorClient::new("http://127.0.0.1:8080");
        let request = BindRequest {
            host_id: "gridlink-host".to_string(),
            device_id: "test-device".to_string(),
            wallet: "0x1234567890abcdef1234567890abcdef12345678".to_string(),
            gpu_model: None,
        };
        match client.bind(&request).await {
            Ok(response) => println!("bound: {}", response.is_bound()),
            Err(e) => panic!("Failed to bind: {}", e),
        }
    }

    #[tokio::test]
    #[ignore] // This test requires a live coordinator instance.
    async fn state_query_returns_the_host_snapshot() {
        let client = CoordinatorClient::new("http://127.0.0.1:8080");
        match client.node_state("gridlink-host").await {
            Ok(state) => println!("enabled: {}", state.enabled),
            Err(e) => panic!("Failed to query state: {}", e),
        }
    }
}
