/// Жизненный цикл пула: `Created -> Running -> Draining -> Stopped`.
/// Остановленный пул повторно не запускается.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    Created,
    Running,
    Draining,
    Stopped,
}

impl PoolState {
    /// Воркеры продолжают забирать задачи в этих состояниях.
    #[inline]
    pub fn is_serving(self) -> bool {
        matches!(self, PoolState::Running | PoolState::Draining)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Executing,
    Retiring,
    Exited,
}

/// Диагностический снимок пула.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolSnapshot {
    pub target_workers: usize,
    pub queued: usize,
    pub executing: usize,
    pub pending_retirements: usize,
    pub completed: usize,
    pub failed: usize,
}

impl PoolSnapshot {
    pub fn utilization(&self) -> f64 {
        if self.target_workers == 0 {
            return 0.0;
        }
        self.executing as f64 / self.target_workers as f64
    }

    pub fn success_rate(&self) -> f64 {
        let total = self.completed + self.failed;
        if total == 0 {
            return 1.0;
        }
        self.completed as f64 / total as f64
    }

    /// Короткая форма `{target, queued, executing}`.
    #[inline]
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.target_workers, self.queued, self.executing)
    }
}
