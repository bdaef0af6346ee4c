//! Wire types for the coordinator API.
//!
//! Field names follow the coordinator's camelCase JSON. Response flags are
//! defaulted so a sparse body still decodes; absent means negative.

use crate::job::Job;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BindRequest {
    pub host_id: String,
    pub device_id: String,
    pub wallet: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gpu_model: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub bound: Option<bool>,
    #[serde(default)]
    pub error: Option<String>,
}

impl BindResponse {
    pub fn is_bound(&self) -> bool {
        self.ok && self.bound.unwrap_or(false)
    }
}

/// Gate snapshot for one host. Only meaningful once the device is bound.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeState {
    pub host_id: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub wallet: Option<String>,
    #[serde(default)]
    pub gpu_reported_model: Option<String>,
    #[serde(default)]
    pub gpu_verified: Option<bool>,
}

impl NodeState {
    pub fn is_verified(&self) -> bool {
        self.gpu_verified.unwrap_or(false)
    }
}

/// One unit of claimed work. Carries the difficulty value only; the
/// coordinator keeps the running totals.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShareSubmission {
    pub wallet: String,
    pub host_id: String,
    pub device_id: String,
    pub difficulty: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareReceipt {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimRequest {
    pub host_id: String,
    pub device_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub job: Option<Job>,
    #[serde(default)]
    pub error: Option<String>,
}
