use thiserror::Error;

#[derive(Debug, Error)]
pub enum BonusError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Configuration error: {field} — {reason}")]
    ConfigurationError { field: String, reason: String },

    #[error("Validation error: record '{record}', field {field} — {reason}")]
    ValidationError {
        record: String,
        field: String,
        reason: String,
    },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Export error: {0}")]
    ExportError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl BonusError {
    pub(crate) fn config(field: &str, reason: impl Into<String>) -> Self {
        BonusError::ConfigurationError {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Arithmetic left the decimal range while computing `field`.
    pub(crate) fn overflow(field: &str, expression: String) -> Self {
        BonusError::InvalidInput {
            field: field.into(),
            reason: format!("{expression} overflows the decimal range"),
        }
    }

    /// Prefix an `InvalidInput` field with the business line it belongs to.
    pub(crate) fn on_line(self, line: &str) -> Self {
        match self {
            BonusError::InvalidInput { field, reason } => BonusError::InvalidInput {
                field: format!("{line}_{field}"),
                reason,
            },
            other => other,
        }
    }

    /// Name the record an `InvalidInput` failure came from.
    pub(crate) fn in_record(self, record: &str) -> Self {
        match self {
            BonusError::InvalidInput { field, reason } => BonusError::InvalidInput {
                field,
                reason: format!("{record}: {reason}"),
            },
            other => other,
        }
    }

    pub(crate) fn validation(record: &str, field: &str, reason: impl Into<String>) -> Self {
        BonusError::ValidationError {
            record: record.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for BonusError {
    fn from(e: serde_json::Error) -> Self {
        BonusError::SerializationError(e.to_string())
    }
}

#[cfg(feature = "export")]
impl From<csv::Error> for BonusError {
    fn from(e: csv::Error) -> Self {
        BonusError::ExportError(e.to_string())
    }
}
