use super::{
    coordinator::{self, Signal},
    errors::PoolError,
    handle::{JoinHandle, WorkItem},
    model::{PoolSnapshot, PoolState, WorkerState},
    queue::{Priority, PriorityQueue},
    result::PoolResult,
    worker::{self, WorkerRecord},
};
use std::{
    sync::{atomic::AtomicUsize, Arc},
    thread,
};
use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::{Condvar, Mutex};


/// Конфигурация пула потоков
#[derive(Debug, Clone)]
pub struct Config {
    pub num_threads: usize,
    pub thread_name_prefix: String,
    pub stack_size: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            num_threads: num_cpus::get(),
            thread_name_prefix: "prio-pool".to_string(),
            stack_size: None,
        }
    }
}

impl Config {
    pub fn cpu_bound() -> Self {
        Self::default()
    }

    pub fn io_bound() -> Self {
        Self {
            num_threads: num_cpus::get() * 2, // Для I/O-bound задач
            ..Default::default()
        }
    }

    pub fn with_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads;
        self
    }

    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    pub fn with_stack_size(mut self, stack_size: usize) -> Self {
        self.stack_size = Some(stack_size);
        self
    }
}


/// Состояние под монитором пула. Изменение состояния и соответствующий
/// `notify` всегда делаются под одним захватом `core`.
pub(crate) struct Core {
    pub(crate) queue: PriorityQueue,
    pub(crate) state: PoolState,
    /// Целевое число воркеров; уменьшается только координатором.
    pub(crate) thread_size: usize,
    pub(crate) executing: usize,
    /// Билеты на выход, ещё не взятые воркерами.
    pub(crate) pending_retirements: usize,
    /// Воркеры, взявшие билет, но ещё не освобождённые координатором.
    pub(crate) retiring: usize,
    pub(crate) completed: usize,
    pub(crate) failed: usize,
}

impl Core {
    fn new() -> Self {
        Self {
            queue: PriorityQueue::new(),
            state: PoolState::Created,
            thread_size: 0,
            executing: 0,
            pending_retirements: 0,
            retiring: 0,
            completed: 0,
            failed: 0,
        }
    }

    /// Воркеры, которые ещё не назначены на выход.
    #[inline]
    fn available_workers(&self) -> usize {
        self.thread_size
            .saturating_sub(self.pending_retirements + self.retiring)
    }

    fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot {
            target_workers: self.thread_size,
            queued: self.queue.len(),
            executing: self.executing,
            pending_retirements: self.pending_retirements,
            completed: self.completed,
            failed: self.failed,
        }
    }

    fn require(&self, expected: PoolState, operation: &'static str) -> PoolResult<()> {
        if self.state != expected {
            return Err(PoolError::InvalidState { operation, state: self.state });
        }
        Ok(())
    }
}

/// Общее состояние, которое делят контроллер, воркеры и координатор.
///
/// Порядок захвата блокировок: `stop_gate -> workers -> core`.
pub(crate) struct PoolInner {
    pub(crate) core: Mutex<Core>,
    pub(crate) has_work: Condvar,
    pub(crate) became_empty: Condvar,
    pub(crate) workers: Mutex<Vec<WorkerRecord>>,
    pub(crate) reaper_tx: Sender<Signal>,
    pub(crate) next_worker_id: AtomicUsize,
    pub(crate) config: Config,
}


/// Пул потоков с приоритетной очередью и изменяемым числом воркеров.
///
/// Одноразовый: `new -> start -> (drain_and_stop | stop)`. При `Drop`
/// вызывается `stop()`, задачи из очереди выбрасываются.
pub struct ThreadPool {
    inner: Arc<PoolInner>,
    reaper_rx: Mutex<Option<Receiver<Signal>>>,
    coordinator: Mutex<Option<thread::JoinHandle<()>>>,
    stop_gate: Mutex<()>,
}

impl ThreadPool {
    pub fn new(num_threads: usize) -> Self {
        Self::with_config(Config::default().with_threads(num_threads))
    }

    pub fn with_config(config: Config) -> Self {
        let (reaper_tx, reaper_rx) = channel::unbounded();
        let inner = Arc::new(PoolInner {
            core: Mutex::new(Core::new()),
            has_work: Condvar::new(),
            became_empty: Condvar::new(),
            workers: Mutex::new(Vec::with_capacity(config.num_threads)),
            reaper_tx,
            next_worker_id: AtomicUsize::new(0),
            config,
        });

        Self {
            inner,
            reaper_rx: Mutex::new(Some(reaper_rx)),
            coordinator: Mutex::new(None),
            stop_gate: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn state(&self) -> PoolState {
        self.inner.core.lock().state
    }

    /// Запустить координатора и начальный набор воркеров.
    pub fn start(&self) -> PoolResult<()> {
        let mut workers = self.inner.workers.lock();
        {
            let mut core = self.inner.core.lock();
            core.require(PoolState::Created, "start")?;
            core.state = PoolState::Running;
        }

        if let Some(signals) = self.reaper_rx.lock().take() {
            let handle = coordinator::spawn(Arc::clone(&self.inner), signals)?;
            *self.coordinator.lock() = Some(handle);
        }

        let n = self.inner.config.num_threads;
        self.spawn_workers(&mut workers, n)?;
        tracing::info!(workers = n, "thread pool started");
        Ok(())
    }

    /// Поставить задачу в очередь. Больший `priority` выполняется раньше.
    pub fn submit<F>(&self, priority: Priority, f: F) -> PoolResult<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.push(priority, WorkItem::new(f))
    }

    /// Как `submit`, но возвращает handle на результат замыкания.
    pub fn submit_with_handle<T, F>(&self, priority: Priority, f: F) -> PoolResult<JoinHandle<T>>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let (item, handle) = WorkItem::with_handle(f);
        self.push(priority, item)?;
        Ok(handle)
    }

    #[inline]
    fn push(&self, priority: Priority, item: WorkItem) -> PoolResult<()> {
        let mut core = self.inner.core.lock();
        core.require(PoolState::Running, "submit")?;
        core.queue.push(priority, item);
        self.inner.has_work.notify_one();
        Ok(())
    }

    /// Добавить `n` воркеров.
    pub fn grow(&self, n: usize) -> PoolResult<()> {
        let mut workers = self.inner.workers.lock();
        self.inner.core.lock().require(PoolState::Running, "grow")?;
        self.spawn_workers(&mut workers, n)?;
        tracing::debug!(added = n, target_workers = self.inner.core.lock().thread_size, "pool grown");
        Ok(())
    }

    /// Попросить `n` воркеров выйти. Какие именно выйдут, не определено:
    /// билеты забирают те, кто первым дойдёт до точки проверки.
    pub fn shrink(&self, n: usize) -> PoolResult<()> {
        let mut core = self.inner.core.lock();
        core.require(PoolState::Running, "shrink")?;

        let available = core.available_workers();
        if n > available {
            return Err(PoolError::InvalidArgument { requested: n, available });
        }
        if n == 0 {
            return Ok(());
        }

        core.pending_retirements += n;
        self.inner.has_work.notify_all();
        tracing::debug!(
            retiring = n,
            pending_retirements = core.pending_retirements,
            "pool shrink requested"
        );
        Ok(())
    }

    /// Дождаться опустошения очереди и остановить пул. Пока идёт ожидание,
    /// новые задачи отклоняются с `InvalidState`.
    pub fn drain_and_stop(&self) -> PoolResult<()> {
        {
            let mut core = self.inner.core.lock();
            match core.state {
                PoolState::Running => {}
                PoolState::Stopped => return Ok(()),
                state => return Err(PoolError::InvalidState { operation: "drain", state }),
            }
            if !core.queue.is_empty() && core.available_workers() == 0 {
                return Err(PoolError::InvalidState {
                    operation: "drain with no workers left",
                    state: core.state,
                });
            }

            core.state = PoolState::Draining;
            tracing::info!(queued = core.queue.len(), "draining thread pool");

            while !core.queue.is_empty() && core.state == PoolState::Draining {
                self.inner.became_empty.wait(&mut core);
            }
        }

        self.stop();
        Ok(())
    }

    /// Немедленная остановка: задачи в очереди выбрасываются, выполняющиеся
    /// дорабатывают до конца. Повторный вызов ничего не делает.
    pub fn stop(&self) {
        let _gate = self.stop_gate.lock();

        let abandoned = {
            let mut core = self.inner.core.lock();
            if core.state == PoolState::Stopped {
                return;
            }
            core.state = PoolState::Stopped;
            core.pending_retirements = 0;
            self.inner.has_work.notify_all();
            self.inner.became_empty.notify_all();
            std::mem::take(&mut core.queue)
        };
        if !abandoned.is_empty() {
            tracing::warn!(abandoned = abandoned.len(), "discarding queued work items");
        }
        drop(abandoned);

        let _ = self.inner.reaper_tx.send(Signal::Shutdown);
        if let Some(handle) = self.coordinator.lock().take() {
            if handle.join().is_err() {
                tracing::warn!("retirement coordinator panicked");
            }
        }

        let records = std::mem::take(&mut *self.inner.workers.lock());
        let mut joined = 0;
        for record in records {
            // stop() из задачи: свой поток не ждём, он выйдет, увидев Stopped.
            if record.is_current_thread() {
                continue;
            }
            record.join();
            joined += 1;
        }

        let mut core = self.inner.core.lock();
        core.thread_size = 0;
        core.retiring = 0;
        tracing::info!(joined, completed = core.completed, failed = core.failed, "thread pool stopped");
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        self.inner.core.lock().snapshot()
    }

    /// Записать снимок пула в лог.
    pub fn log_snapshot(&self) {
        let snapshot = self.snapshot();
        tracing::info!(
            target_workers = snapshot.target_workers,
            queued = snapshot.queued,
            executing = snapshot.executing,
            pending_retirements = snapshot.pending_retirements,
            completed = snapshot.completed,
            failed = snapshot.failed,
            "thread pool snapshot"
        );
    }

    /// Состояния живых (ещё не освобождённых) воркеров.
    pub fn worker_states(&self) -> Vec<WorkerState> {
        self.inner
            .workers
            .lock()
            .iter()
            .map(WorkerRecord::state)
            .collect()
    }

    /// `thread_size` резервируется до запуска потоков, чтобы
    /// `executing <= thread_size` держалось всегда.
    fn spawn_workers(&self, workers: &mut Vec<WorkerRecord>, n: usize) -> PoolResult<()> {
        self.inner.core.lock().thread_size += n;

        let mut spawned = 0;
        let mut outcome = Ok(());
        for _ in 0..n {
            match worker::spawn(&self.inner) {
                Ok(record) => {
                    workers.push(record);
                    spawned += 1;
                }
                Err(err) => {
                    outcome = Err(err);
                    break;
                }
            }
        }

        if spawned < n {
            self.inner.core.lock().thread_size -= n - spawned;
            tracing::warn!(requested = n, spawned, "failed to spawn all workers");
        }
        outcome
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.stop();
    }
}
