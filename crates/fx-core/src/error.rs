use thiserror::Error;

/// Errors surfaced by the engine core.
///
/// Only [`FxError::ContextCreation`] is expected to reach the embedding page;
/// everything else is either clamped (configuration) or swallowed as a no-op
/// (operations on released resources).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FxError {
    #[error("no GPU context available: {0}")]
    ContextCreation(String),

    #[error("option `{field}` = {value} outside [{min}, {max}]; clamped")]
    Configuration {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("resource already released")]
    AlreadyReleased,

    #[error("frame scheduling failed: {0}")]
    Scheduler(String),

    #[error("listener wiring failed: {0}")]
    Listener(String),
}

/// Outcome of a failed tick.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TickError {
    /// The tick is skipped; the loop keeps running.
    #[error("transient tick failure: {0}")]
    Transient(String),
    /// The instance's scheduler is stopped.
    #[error("fatal tick failure: {0}")]
    Fatal(String),
}

impl TickError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, TickError::Fatal(_))
    }
}

pub type FxResult<T> = Result<T, FxError>;
