//! # Pending result handle.
//!
//! [`PendingResult`] is returned by [`Dispatcher::submit`](crate::Dispatcher::submit)
//! and bound 1:1 to the submitted task. It resolves exactly once, with the task's
//! value or with the [`TaskError`] it failed with.
//!
//! Three access patterns are supported:
//! - `.await` it (it is a [`Future`]),
//! - block on it from synchronous code with [`PendingResult::wait_blocking`],
//! - attach a completion reaction with [`PendingResult::on_complete`].

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::{sync::oneshot, task::JoinHandle};

use crate::error::TaskError;

/// Caller-side handle of a submitted task.
///
/// If the runtime drops the task before it resolves (e.g. the runtime shuts down
/// while tasks are still queued), the handle resolves to [`TaskError::Abandoned`].
#[must_use = "a pending result does nothing unless awaited or waited on"]
#[derive(Debug)]
pub struct PendingResult<R> {
    seq: u64,
    name: Arc<str>,
    rx: oneshot::Receiver<Result<R, TaskError>>,
}

impl<R> PendingResult<R> {
    pub(crate) fn new(
        seq: u64,
        name: Arc<str>,
        rx: oneshot::Receiver<Result<R, TaskError>>,
    ) -> Self {
        Self { seq, name, rx }
    }

    /// Submission index of the task.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Task name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Blocks the current thread until the task resolves.
    ///
    /// Intended for synchronous callers. Panics if called from within an async
    /// execution context (use `.await` there).
    pub fn wait_blocking(self) -> Result<R, TaskError> {
        self.rx.blocking_recv().unwrap_or(Err(TaskError::Abandoned))
    }

    /// Runs `f` with the outcome once the task resolves, without blocking the caller.
    ///
    /// Must be called inside a tokio runtime.
    pub fn on_complete<F>(self, f: F) -> JoinHandle<()>
    where
        R: Send + 'static,
        F: FnOnce(Result<R, TaskError>) + Send + 'static,
    {
        tokio::spawn(async move { f(self.await) })
    }
}

impl<R> Future for PendingResult<R> {
    type Output = Result<R, TaskError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        Pin::new(&mut this.rx)
            .poll(cx)
            .map(|res| res.unwrap_or(Err(TaskError::Abandoned)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolves_with_sent_value() {
        let (tx, rx) = oneshot::channel();
        let pending = PendingResult::new(7, Arc::from("t"), rx);
        assert_eq!(pending.seq(), 7);
        tx.send(Ok(42)).unwrap();
        assert_eq!(pending.await, Ok(42));
    }

    #[tokio::test]
    async fn dropped_sender_means_abandoned() {
        let (tx, rx) = oneshot::channel::<Result<u8, TaskError>>();
        drop(tx);
        let pending = PendingResult::new(0, Arc::from("t"), rx);
        assert_eq!(pending.await, Err(TaskError::Abandoned));
    }

    #[tokio::test]
    async fn on_complete_receives_outcome() {
        let (tx, rx) = oneshot::channel();
        let (done_tx, done_rx) = oneshot::channel();
        let pending = PendingResult::new(0, Arc::from("t"), rx);
        pending.on_complete(move |res: Result<&str, TaskError>| {
            let _ = done_tx.send(res);
        });
        tx.send(Err(TaskError::fail("nope"))).unwrap();
        assert_eq!(done_rx.await.unwrap(), Err(TaskError::fail("nope")));
    }

    #[test]
    fn wait_blocking_from_sync_code() {
        let (tx, rx) = oneshot::channel();
        let pending = PendingResult::new(0, Arc::from("t"), rx);
        let sender = std::thread::spawn(move || tx.send(Ok("ready")).unwrap());
        assert_eq!(pending.wait_blocking(), Ok("ready"));
        sender.join().unwrap();
    }
}
