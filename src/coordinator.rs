//! Фоновый поток, который забирает handle воркеров, вышедших по `shrink`.
//!
//! Воркер сам ставит себе `Exited` и будит координатора. Координатор ищет
//! в наборе воркеров записи с этой меткой, ждёт их потоки и уменьшает
//! `thread_size`. Живёт до остановки пула.

use super::{
    model::WorkerState,
    pool::PoolInner,
    worker::WorkerRecord,
};
use std::{
    io,
    sync::Arc,
    thread,
};
use crossbeam::channel::Receiver;


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Signal {
    Retired,
    Shutdown,
}

pub(crate) fn spawn(
    pool: Arc<PoolInner>,
    signals: Receiver<Signal>,
) -> io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name(format!("{}-reaper", pool.config.thread_name_prefix))
        .spawn(move || run(&pool, &signals))
}

fn run(pool: &PoolInner, signals: &Receiver<Signal>) {
    tracing::trace!("retirement coordinator started");

    for signal in signals.iter() {
        match signal {
            Signal::Retired => {
                // Несколько сигналов подряд обрабатываются одним проходом.
                let mut shutdown = false;
                for pending in signals.try_iter() {
                    if pending == Signal::Shutdown {
                        shutdown = true;
                    }
                }
                reclaim(pool);
                if shutdown {
                    break;
                }
            }
            Signal::Shutdown => break,
        }
    }

    tracing::trace!("retirement coordinator stopped");
}

/// Освободить ресурсы всех воркеров с меткой `Exited`.
fn reclaim(pool: &PoolInner) -> usize {
    let exited: Vec<WorkerRecord> = {
        let mut workers = pool.workers.lock();
        let (exited, live): (Vec<_>, Vec<_>) = std::mem::take(&mut *workers)
            .into_iter()
            .partition(|record| record.state() == WorkerState::Exited);
        *workers = live;
        exited
    };

    if exited.is_empty() {
        return 0;
    }

    let count = exited.len();
    for record in exited {
        let id = record.id();
        record.join();
        tracing::trace!(worker = id, "reclaimed retired worker");
    }

    let mut core = pool.core.lock();
    core.thread_size = core.thread_size.saturating_sub(count);
    core.retiring = core.retiring.saturating_sub(count);
    tracing::debug!(
        reclaimed = count,
        target_workers = core.thread_size,
        "retired workers reclaimed"
    );
    count
}
