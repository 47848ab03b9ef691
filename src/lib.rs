//! Пул потоков с приоритетной очередью задач
//!
//! # Features
//! - Приоритетная очередь: больший приоритет выполняется раньше
//! - Изменение числа воркеров на лету (`grow` / `shrink`)
//! - Фоновый координатор, освобождающий потоки вышедших воркеров
//! - Graceful shutdown: дождаться пустой очереди, затем остановиться
//! - Перехват паник в задачах без потери воркера
//! - Диагностический снимок состояния

mod coordinator;
mod worker;

pub mod errors;
pub mod handle;
pub mod model;
pub mod pool;
pub mod queue;
pub mod result;

pub use errors::PoolError;
pub use handle::{JoinHandle, WorkItem};
pub use model::{PoolSnapshot, PoolState, WorkerState};
pub use pool::{Config, ThreadPool};
pub use queue::Priority;
pub use result::PoolResult;
