//! Response payloads
//!
//! Acknowledgements and failures in the `{message|error, status}` shape the
//! service layer hands to its clients.

use serde::{Deserialize, Serialize};

use crate::error::AtlasError;

/// Outcome status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Success,
    Failed,
}

/// Successful mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub message: String,
    pub status: Status,
}

impl Ack {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: Status::Success,
        }
    }
}

/// Failed operation, e.g. `{"error": "No Data Found for ID: x", "status": "FAILED"}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub error: String,
    pub status: Status,
}

impl Failure {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            status: Status::Failed,
        }
    }
}

impl From<&AtlasError> for Failure {
    fn from(err: &AtlasError) -> Self {
        Failure::new(err.to_string())
    }
}

impl From<AtlasError> for Failure {
    fn from(err: AtlasError) -> Self {
        Failure::from(&err)
    }
}
