//! Error handling for the coordinator module.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[allow(non_snake_case)] // used for json parsing
#[derive(Serialize, Deserialize)]
struct RawError {
    name: String,
    message: String,
    httpCode: u16,
}

#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// Reqwest error, typically related to network issues or request failures.
    #[error("request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    /// The coordinator answered with a non-success status.
    #[error("HTTP error with status {status}: {message}")]
    Http { status: u16, message: String },

    /// A 2xx body that does not decode as the expected shape.
    #[error("malformed response: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A well-formed response whose `ok` flag is false.
    #[error("rejected by coordinator: {0}")]
    Rejected(String),
}

impl CoordinatorError {
    pub async fn from_response(response: reqwest::Response) -> CoordinatorError {
        let status = response.status().as_u16();
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read response text".to_string());

        CoordinatorError::Http { status, message }
    }

    /// Pretty-print the coordinator's structured error body, if it is one.
    pub fn to_pretty(&self) -> Option<String> {
        match self {
            Self::Http { status: _, message: msg } => {
                if let Ok(parsed) = serde_json::from_str::<RawError>(msg) {
                    if let Ok(stringified) = serde_json::to_string_pretty(&parsed) {
                        return Some(stringified);
                    }
                }

                None
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_error_bodies_pretty_print() {
        let error = CoordinatorError::Http {
            status: 403,
            message: r#"{"name":"Forbidden","message":"device not enabled","httpCode":403}"#
                .to_string(),
        };
        let pretty = error.to_pretty().unwrap();
        assert!(pretty.contains("device not enabled"));
    }

    #[test]
    fn unstructured_error_bodies_do_not() {
        let error = CoordinatorError::Http {
            status: 500,
            message: "internal server error".to_string(),
        };
        assert!(error.to_pretty().is_none());
    }
}
