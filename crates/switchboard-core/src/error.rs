//! Error types and result handling for call routing.
//!
//! Defines a structured error taxonomy with stable codes for client
//! disambiguation and HTTP status mapping. Covers request validation,
//! authentication, routing, and startup configuration failures.

use std::path::PathBuf;

use thiserror::Error;

use crate::models::EmployeeId;

/// Result type alias using `RouterError`.
pub type Result<T> = std::result::Result<T, RouterError>;

/// Switchboard error types with stable codes.
#[derive(Debug, Error)]
pub enum RouterError {
    // Request errors (E1001-E1002)
    /// Missing or mismatched `X-API-Key` header (E1001).
    #[error("[E1001] Unauthorized: API key {}", presence_label(.header_present))]
    Unauthorized {
        /// Whether the request carried the header at all
        header_present: bool,
    },

    /// Body is not valid JSON or has the wrong shape (E1002).
    #[error("[E1002] Malformed request: {reason}")]
    MalformedRequest {
        /// Human-readable description of what was wrong
        reason: String,
    },

    // Startup errors (E3001-E3004)
    /// Directory file could not be read (E3001).
    #[error("[E3001] Directory unavailable: failed to read {}", .path.display())]
    DirectoryUnreadable {
        /// Path that was opened
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// Directory file is not a valid directory document (E3002).
    #[error("[E3002] Directory invalid: {0}")]
    DirectoryInvalid(#[from] serde_json::Error),

    /// Two directory records share an id (E3003).
    #[error("[E3003] Duplicate employee id {id} in directory")]
    DuplicateEmployee {
        /// The repeated id
        id: EmployeeId,
    },

    /// Configured fallback employee cannot receive calls (E3004).
    #[error("[E3004] Fallback employee {id} is not a routable directory entry")]
    InvalidFallback {
        /// The configured fallback id
        id: EmployeeId,
    },

    /// Generic error for wrapping other errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn presence_label(header_present: &bool) -> &'static str {
    if *header_present {
        "mismatch"
    } else {
        "missing"
    }
}

impl RouterError {
    /// Creates a malformed request error from any displayable reason.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedRequest { reason: reason.into() }
    }

    /// Returns the error code (E1001-E9999).
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized { .. } => "E1001",
            Self::MalformedRequest { .. } => "E1002",
            Self::DirectoryUnreadable { .. } => "E3001",
            Self::DirectoryInvalid(_) => "E3002",
            Self::DuplicateEmployee { .. } => "E3003",
            Self::InvalidFallback { .. } => "E3004",
            Self::Other(_) => "E9999",
        }
    }

    /// Returns the short error kind exposed in HTTP error bodies.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Unauthorized { .. } => "Unauthorized",
            Self::MalformedRequest { .. } => "MalformedRequest",
            Self::DirectoryUnreadable { .. }
            | Self::DirectoryInvalid(_)
            | Self::DuplicateEmployee { .. }
            | Self::InvalidFallback { .. } => "StartupConfigurationFailure",
            Self::Other(_) => "InternalError",
        }
    }

    /// Returns whether this error prevents the service from starting.
    pub const fn is_startup_failure(&self) -> bool {
        matches!(
            self,
            Self::DirectoryUnreadable { .. }
                | Self::DirectoryInvalid(_)
                | Self::DuplicateEmployee { .. }
                | Self::InvalidFallback { .. }
        )
    }

    /// Message that is safe to return to callers.
    ///
    /// Startup and internal failures never expose paths or sources.
    pub fn public_message(&self) -> String {
        match self {
            Self::Unauthorized { .. } | Self::MalformedRequest { .. } => self.to_string(),
            Self::Other(_) => "Internal error".to_string(),
            _ => "Service misconfigured".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(RouterError::Unauthorized { header_present: false }.code(), "E1001");
        assert_eq!(RouterError::malformed("bad").code(), "E1002");
        assert_eq!(RouterError::DuplicateEmployee { id: EmployeeId(1) }.code(), "E3003");
        assert_eq!(RouterError::InvalidFallback { id: EmployeeId(9) }.code(), "E3004");
    }

    #[test]
    fn unauthorized_message_distinguishes_missing_header() {
        let missing = RouterError::Unauthorized { header_present: false }.to_string();
        let mismatch = RouterError::Unauthorized { header_present: true }.to_string();

        assert!(missing.contains("missing"));
        assert!(mismatch.contains("mismatch"));
    }

    #[test]
    fn startup_failures_hide_paths_from_callers() {
        let err = RouterError::DirectoryUnreadable {
            path: PathBuf::from("/etc/secret/company_directory.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };

        assert!(err.is_startup_failure());
        assert_eq!(err.kind(), "StartupConfigurationFailure");
        assert!(!err.public_message().contains("/etc/secret"));
        assert!(err.to_string().contains("company_directory.json"));
    }

    #[test]
    fn request_errors_are_not_startup_failures() {
        assert!(!RouterError::malformed("x").is_startup_failure());
        assert!(!RouterError::Unauthorized { header_present: true }.is_startup_failure());
    }
}
