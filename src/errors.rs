use crate::model::PoolState;
use thiserror::Error;

/// Ошибки пула. Паника внутри задачи не роняет воркер, она превращается в
/// [`PoolError::WorkItemFailure`].
#[derive(Error, Debug)]
pub enum PoolError {
    #[error("cannot {operation} while pool is {state:?}")]
    InvalidState {
        operation: &'static str,
        state: PoolState,
    },

    #[error("cannot retire {requested} workers, only {available} available")]
    InvalidArgument { requested: usize, available: usize },

    #[error("work item failed: {0}")]
    WorkItemFailure(String),

    /// Задача была выброшена из очереди вызовом `stop()`.
    #[error("work item abandoned before execution")]
    Abandoned,

    #[error("failed to spawn thread: {0}")]
    Spawn(#[from] std::io::Error),
}
