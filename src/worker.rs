use super::{
    coordinator::Signal,
    handle::WorkItem,
    model::WorkerState,
    pool::PoolInner,
    queue::QueueEntry,
    result::PoolResult,
};
use std::{
    sync::{atomic::Ordering, Arc},
    thread,
};
use crossbeam::atomic::AtomicCell;


/// Запись о воркере: handle потока и флаг живости, который воркер
/// обновляет сам.
pub(crate) struct WorkerRecord {
    id: usize,
    status: Arc<AtomicCell<WorkerState>>,
    handle: thread::JoinHandle<()>,
}

impl WorkerRecord {
    #[inline]
    pub(crate) fn state(&self) -> WorkerState {
        self.status.load()
    }

    #[inline]
    pub(crate) fn id(&self) -> usize {
        self.id
    }

    #[inline]
    pub(crate) fn is_current_thread(&self) -> bool {
        self.handle.thread().id() == thread::current().id()
    }

    /// Дождаться завершения потока и освободить handle.
    pub(crate) fn join(self) {
        if self.handle.join().is_err() {
            tracing::warn!(worker = self.id, "worker thread panicked outside of a work item");
        }
    }
}

enum Claim {
    Run(QueueEntry),
    Retire,
    Stop,
}

pub(crate) fn spawn(pool: &Arc<PoolInner>) -> PoolResult<WorkerRecord> {
    let id = pool.next_worker_id.fetch_add(1, Ordering::Relaxed);
    let status = Arc::new(AtomicCell::new(WorkerState::Idle));

    let mut builder = thread::Builder::new()
        .name(format!("{}-{}", pool.config.thread_name_prefix, id));
    if let Some(size) = pool.config.stack_size {
        builder = builder.stack_size(size);
    }

    let pool_clone = Arc::clone(pool);
    let status_clone = Arc::clone(&status);
    let handle = builder.spawn(move || worker_loop(id, &pool_clone, &status_clone))?;

    Ok(WorkerRecord { id, status, handle })
}

fn worker_loop(id: usize, pool: &PoolInner, status: &AtomicCell<WorkerState>) {
    tracing::trace!(worker = id, "worker started");

    loop {
        match claim(pool, status) {
            Claim::Run(entry) => {
                let priority = entry.priority;
                status.store(WorkerState::Executing);
                let ok = execute(id, priority, entry.item);
                status.store(WorkerState::Idle);
                finish(pool, ok);
            }
            Claim::Retire => {
                tracing::debug!(worker = id, "worker retiring");
                // Exited ставится последним: после него воркер не трогает пул.
                status.store(WorkerState::Exited);
                let _ = pool.reaper_tx.send(Signal::Retired);
                return;
            }
            Claim::Stop => break,
        }
    }

    tracing::trace!(worker = id, "worker stopped");
}

/// Точка проверки между задачами: сначала билет на выход, потом очередь.
fn claim(pool: &PoolInner, status: &AtomicCell<WorkerState>) -> Claim {
    let mut core = pool.core.lock();
    loop {
        if !core.state.is_serving() {
            return Claim::Stop;
        }

        if core.pending_retirements > 0 {
            core.pending_retirements -= 1;
            core.retiring += 1;
            status.store(WorkerState::Retiring);
            // Передать пробуждение дальше, чтобы задача не зависла в очереди.
            if !core.queue.is_empty() {
                pool.has_work.notify_one();
            }
            return Claim::Retire;
        }

        if let Some(entry) = core.queue.pop_highest() {
            core.executing += 1;
            if core.queue.is_empty() {
                pool.became_empty.notify_all();
            }
            return Claim::Run(entry);
        }

        pool.has_work.wait(&mut core);
    }
}

fn execute(id: usize, priority: i64, item: WorkItem) -> bool {
    match item.run() {
        Ok(()) => true,
        Err(err) => {
            tracing::error!(worker = id, priority, error = %err, "work item failed");
            false
        }
    }
}

fn finish(pool: &PoolInner, ok: bool) {
    let mut core = pool.core.lock();
    core.executing -= 1;
    if ok {
        core.completed += 1;
    } else {
        core.failed += 1;
    }
}
