use rust_decimal::Decimal;

use crate::domain::EntityKind;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("{kind} `{key}` not found")]
    NotFound { kind: EntityKind, key: String },
    #[error("insufficient balance in {kind} `{key}`: available {available}, required {required}")]
    InsufficientBalance {
        kind: EntityKind,
        key: String,
        available: Decimal,
        required: Decimal,
    },
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },
    #[error("{kind} `{key}` changed while the operation ran; nothing was applied")]
    ConflictAbort { kind: EntityKind, key: String },
}

impl EngineError {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Whether retrying the same operation may succeed.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::ConflictAbort { .. })
    }
}
