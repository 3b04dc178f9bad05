use crate::shipment::ShipmentId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Shipment not found: {id}")]
    NotFound { id: ShipmentId },
    #[error("Shipment already exists: {id}")]
    AlreadyExists { id: ShipmentId },
    #[error("Network error: {message}")]
    Network { message: String },
    #[error("Shipment service timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },
    #[error("Shipment service returned HTTP {status}: {message}")]
    Http { status: u16, message: String },
    #[error("Invalid response from shipment service: {message}")]
    InvalidResponse { message: String },
    #[error("Shipment store I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl ServiceError {
    /// Transient failures worth another attempt: network trouble, timeouts,
    /// rate limiting and server-side errors.
    pub fn is_retryable(&self) -> bool {
        match self {
            ServiceError::Network { .. } | ServiceError::Timeout { .. } => true,
            ServiceError::Http { status, .. } => *status == 429 || *status >= 500,
            ServiceError::NotFound { .. }
            | ServiceError::AlreadyExists { .. }
            | ServiceError::InvalidResponse { .. }
            | ServiceError::Io { .. } => false,
        }
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::InvalidResponse {
            message: err.to_string(),
        }
    }
}
