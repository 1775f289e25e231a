//! Error types for the pipeline client.
//!
//! - `GatewayError`: the external deal API rejected or failed a call
//! - `ValidationError`: client-side checks blocked a submission, no call issued
//! - `TransitionError`: a stage command could not be issued or failed remotely
//! - `PageError`: anything surfaced by the deals page orchestrator

use thiserror::Error;

use crate::stage::DealStage;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown deal stage: {0}")]
    UnknownStage(String),
    #[error("unknown loss reason: {0}")]
    UnknownLossReason(String),
    #[error("unsupported currency: {0}")]
    UnknownCurrency(String),
}

#[derive(Debug, Error)]
pub enum GatewayError {
    /// The session is missing or expired; the caller should send the user to `redirect_to`.
    #[error("Unauthorized")]
    Unauthorized { redirect_to: &'static str },

    #[error("Failed to {operation}: {message}")]
    Status {
        operation: &'static str,
        status: u16,
        message: String,
    },

    #[error("Failed to {operation}: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to {operation}: invalid response body: {message}")]
    Decode {
        operation: &'static str,
        message: String,
    },
}

impl GatewayError {
    pub fn status(operation: &'static str, status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            operation,
            status,
            message: message.into(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, GatewayError::Unauthorized { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please select a reason")]
    MissingLossReason,
    #[error("{} field(s) need attention", .0.len())]
    Fields(Vec<FieldError>),
}

impl ValidationError {
    /// Message for a single field, if that field failed.
    pub fn field(&self, name: &str) -> Option<&str> {
        match self {
            ValidationError::Fields(errors) => errors
                .iter()
                .find(|e| e.field == name)
                .map(|e| e.message.as_str()),
            ValidationError::MissingLossReason => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("moving a deal to {to} requires additional input")]
    MissingPayload { to: DealStage },
    #[error("payload does not match the {to} transition")]
    PayloadMismatch { to: DealStage },
    #[error("no archive transition is pending")]
    NothingPending,
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

#[derive(Debug, Error)]
pub enum PageError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("no {0} dialog is open")]
    NoModal(&'static str),
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to access settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
