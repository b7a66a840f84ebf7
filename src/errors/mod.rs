//! Error handling module for the CRM core.
//!
//! Provides centralized error types with mapping to user-facing notices.
//! Nothing in this core is fatal: every failure degrades to a dismissible
//! notice plus an unchanged data state.

use serde::{Deserialize, Serialize};

use crate::notify::{Notice, NoticeLevel};

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const INVARIANT_VIOLATION: &str = "INVARIANT_VIOLATION";
    pub const EXTERNAL_FAILURE: &str = "EXTERNAL_FAILURE";
    pub const NOT_FOUND: &str = "NOT_FOUND";
}

/// A single field-level validation failure, rendered inline by the form.
/// Field names use the wire spelling (`estimatedValue`) so the shell can key
/// them straight onto inputs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Application error type.
///
/// Dangling display references (an advisor id missing from the directory, a
/// soft-deleted lead-source parent) are deliberately not errors; lookups
/// resolve them to "Unknown" or `None` at the call site.
#[derive(Debug, Clone)]
pub enum CrmError {
    /// A validation gate failed; the operation was not applied
    Validation(String),
    /// Form-level validation failed on one or more fields
    FieldValidation(Vec<FieldError>),
    /// A domain invariant would be violated; nothing was mutated
    Invariant(String),
    /// An external collaborator call failed and was caught at the call site
    External { service: String, message: String },
    /// A record this operation requires does not exist
    NotFound(String),
}

impl CrmError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            CrmError::Validation(_) => codes::VALIDATION_ERROR,
            CrmError::FieldValidation(_) => codes::VALIDATION_ERROR,
            CrmError::Invariant(_) => codes::INVARIANT_VIOLATION,
            CrmError::External { .. } => codes::EXTERNAL_FAILURE,
            CrmError::NotFound(_) => codes::NOT_FOUND,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> String {
        match self {
            CrmError::Validation(msg) => msg.clone(),
            CrmError::FieldValidation(fields) => fields
                .iter()
                .map(|f| f.message.as_str())
                .collect::<Vec<_>>()
                .join("; "),
            CrmError::Invariant(msg) => msg.clone(),
            CrmError::External { service, message } => format!("{}: {}", service, message),
            CrmError::NotFound(msg) => msg.clone(),
        }
    }

    /// Notice severity for this error. External failures leave local state
    /// usable and only warn; everything else blocks the attempted action.
    pub fn level(&self) -> NoticeLevel {
        match self {
            CrmError::External { .. } => NoticeLevel::Warning,
            _ => NoticeLevel::Error,
        }
    }

    /// Convert into the user-facing notice envelope. Total: every error in
    /// the core has a dismissible representation.
    pub fn to_notice(&self) -> Notice {
        let details = match self {
            CrmError::FieldValidation(fields) => serde_json::to_value(fields).ok(),
            _ => None,
        };

        Notice {
            level: self.level(),
            code: Some(self.error_code().to_string()),
            message: self.message(),
            details,
        }
    }
}

impl std::fmt::Display for CrmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_code(), self.message())
    }
}

impl std::error::Error for CrmError {}

impl From<Vec<FieldError>> for CrmError {
    fn from(fields: Vec<FieldError>) -> Self {
        CrmError::FieldValidation(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_code() {
        let err = CrmError::Invariant("Lead is already Won".to_string());
        assert_eq!(err.to_string(), "INVARIANT_VIOLATION: Lead is already Won");
    }

    #[test]
    fn test_field_validation_notice_carries_details() {
        let err = CrmError::FieldValidation(vec![
            FieldError::new("name", "Name is required"),
            FieldError::new("estimatedValue", "Estimated value must be greater than zero"),
        ]);

        let notice = err.to_notice();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(notice.code.as_deref(), Some(codes::VALIDATION_ERROR));
        assert!(notice.message.contains("Name is required"));

        let details = notice.details.unwrap();
        assert_eq!(details[0]["field"], "name");
        assert_eq!(details[1]["field"], "estimatedValue");
    }

    #[test]
    fn test_external_failures_warn_instead_of_block() {
        let err = CrmError::External {
            service: "ai-suggestions".to_string(),
            message: "timed out".to_string(),
        };

        assert_eq!(err.level(), NoticeLevel::Warning);
        assert_eq!(err.to_notice().message, "ai-suggestions: timed out");
    }
}
