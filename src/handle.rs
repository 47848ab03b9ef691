use super::{
    errors::PoolError,
    result::PoolResult,
};
use std::{
    any::Any,
    fmt,
    future::Future,
    panic::{self, AssertUnwindSafe},
    pin::Pin,
    task::{Context, Poll},
};
use tokio::sync::oneshot;


type Job = Box<dyn FnOnce() + Send + 'static>;

/// Единица отложенной работы. Выполняется ровно один раз, повторов нет.
pub struct WorkItem {
    job: Job,
}

impl WorkItem {
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self { job: Box::new(f) }
    }

    /// Выполнить задачу, перехватив панику на границе воркера.
    #[inline]
    pub fn run(self) -> PoolResult<()> {
        panic::catch_unwind(AssertUnwindSafe(self.job))
            .map_err(|payload| PoolError::WorkItemFailure(panic_message(payload.as_ref())))
    }

    /// Обернуть замыкание с результатом: значение уходит в [`JoinHandle`],
    /// паника сначала доставляется в handle, затем пробрасывается дальше,
    /// чтобы пул учёл её как сбой.
    pub(crate) fn with_handle<T, F>(f: F) -> (Self, JoinHandle<T>)
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let (tx, rx) = oneshot::channel::<PoolResult<T>>();
        let item = Self::new(move || {
            match panic::catch_unwind(AssertUnwindSafe(f)) {
                Ok(value) => {
                    let _ = tx.send(Ok(value));
                }
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    let _ = tx.send(Err(PoolError::WorkItemFailure(message)));
                    panic::resume_unwind(payload);
                }
            }
        });
        (item, JoinHandle::new(rx))
    }
}

impl fmt::Debug for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkItem").finish_non_exhaustive()
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}


/// Handle на результат задачи, отправленной через `submit_with_handle`.
/// Отмены нет: задача либо выполнится, либо будет выброшена `stop()`.
pub struct JoinHandle<T> {
    receiver: oneshot::Receiver<PoolResult<T>>,
}

impl<T> JoinHandle<T> {
    fn new(receiver: oneshot::Receiver<PoolResult<T>>) -> Self {
        Self { receiver }
    }

    /// Блокирующее ожидание для синхронного кода.
    pub fn join(self) -> PoolResult<T> {
        futures::executor::block_on(self)
    }
}

impl<T> Future for JoinHandle<T> {
    type Output = PoolResult<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.receiver).poll(cx) {
            Poll::Ready(res) => Poll::Ready(res.unwrap_or(Err(PoolError::Abandoned))),
            Poll::Pending => Poll::Pending,
        }
    }
}
