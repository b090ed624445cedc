use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use thiserror::Error;
use tracing::warn;

use crate::SkuFinanceResult;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SkuFinanceError {
    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Unknown parameter path '{path}': {reason}")]
    UnknownParameter { path: String, reason: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Arithmetic overflow in {context}")]
    Overflow { context: String },

    #[error("Batch cancelled before completion")]
    Cancelled,

    #[error("Computation aborted in {context}: {message}")]
    Aborted { context: String, message: String },

    #[error("Worker pool error: {0}")]
    ThreadPool(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl SkuFinanceError {
    /// Stable label for the error kind, used in batch error envelopes and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            SkuFinanceError::InvalidInput { .. } => "invalid_input",
            SkuFinanceError::UnknownParameter { .. } => "unknown_parameter",
            SkuFinanceError::InsufficientData(_) => "insufficient_data",
            SkuFinanceError::DivisionByZero { .. } => "division_by_zero",
            SkuFinanceError::Overflow { .. } => "overflow",
            SkuFinanceError::Cancelled => "cancelled",
            SkuFinanceError::Aborted { .. } => "aborted",
            SkuFinanceError::ThreadPool(_) => "thread_pool",
            SkuFinanceError::SerializationError(_) => "serialization",
        }
    }
}

/// Run `f` and turn a panic into `Aborted`, so one broken run cannot
/// unwind through its caller.
pub fn catch_abort<R>(
    context: &str,
    f: impl FnOnce() -> SkuFinanceResult<R>,
) -> SkuFinanceResult<R> {
    panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
        let message = panic_message(payload.as_ref());
        warn!(context, %message, "run aborted");
        Err(SkuFinanceError::Aborted {
            context: context.to_string(),
            message,
        })
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl From<serde_json::Error> for SkuFinanceError {
    fn from(e: serde_json::Error) -> Self {
        SkuFinanceError::SerializationError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catch_abort_passes_results_through() {
        assert_eq!(catch_abort("ok", || Ok(3)), Ok(3));
        assert_eq!(
            catch_abort::<()>("err", || Err(SkuFinanceError::Cancelled)),
            Err(SkuFinanceError::Cancelled)
        );
    }

    #[test]
    fn test_catch_abort_turns_panic_into_error() {
        let err = catch_abort::<()>("calculate", || panic!("Multiplication overflowed"))
            .unwrap_err();
        assert_eq!(err.kind(), "aborted");
        assert_eq!(
            err.to_string(),
            "Computation aborted in calculate: Multiplication overflowed"
        );
    }
}
