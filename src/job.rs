//! Inference job.
//!
//! Jobs are owned by the coordinator; the agent reads one at a time via a
//! claim and writes back exactly one terminal [`JobOutcome`] for it.

use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Submitted as the result text when the backend fails outright, so the
/// coordinator always receives a non-empty result alongside the error.
pub const FALLBACK_RESULT: &str = "inference failed";

/// One coordinator-queued inference request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    pub wallet: String,
    /// Logical model identifier; routed to a backend model name on execution.
    pub model_id: String,
    pub prompt: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Display for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "job {} (model {}, prompt {} chars)",
            self.id,
            self.model_id,
            self.prompt.len()
        )
    }
}

/// The terminal report for a claimed job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct JobOutcome {
    pub result: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobOutcome {
    pub fn success(result: String) -> Self {
        JobOutcome {
            result,
            error: None,
        }
    }

    pub fn failure(error: String) -> Self {
        JobOutcome {
            result: FALLBACK_RESULT.to_string(),
            error: Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jobs_parse_from_coordinator_json() {
        let job: Job = serde_json::from_str(
            r#"{
                "id": "job-42",
                "wallet": "0xabc",
                "modelId": "deepseek-chat",
                "prompt": "hello",
                "status": "claimed"
            }"#,
        )
        .unwrap();
        assert_eq!(job.id, "job-42");
        assert_eq!(job.model_id, "deepseek-chat");
        assert!(job.result.is_none());
    }

    #[test]
    fn failure_outcomes_keep_a_nonempty_result() {
        let outcome = JobOutcome::failure("backend unreachable".to_string());
        assert_eq!(outcome.result, FALLBACK_RESULT);
        assert_eq!(outcome.error.as_deref(), Some("backend unreachable"));
    }
}
