//! Single-assignment results with queue-aware continuations
//!
//! A [`Task`] is the read end of a value that is filled exactly once through
//! its [`Deferred`]. Work started by [`Task::on`], [`Task::spawn`] and every
//! combinator taking an [`Executor`] runs whether or not the task is ever
//! awaited. Dropping a task only discards its result.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::runtime::Handle;
use tokio::sync::oneshot;

use crate::error::Error;
use crate::queue::Executor;

/// Write end of a [`Task`]
pub struct Deferred<T> {
    sender: oneshot::Sender<Result<T, Error>>,
}

impl<T> Deferred<T> {
    /// Fill the paired task
    ///
    /// Returns `false` if the task was already dropped. A deferred dropped
    /// without being filled resolves its task with [`Error::Abandoned`].
    pub fn fill(self, result: Result<T, Error>) -> bool {
        self.sender.send(result).is_ok()
    }
}

impl<T> fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("closed", &self.sender.is_closed())
            .finish()
    }
}

/// Eventual `Result<T, Error>`
#[must_use = "a task does nothing with its result unless awaited or chained"]
pub struct Task<T> {
    inner: BoxFuture<'static, Result<T, Error>>,
}

impl<T> fmt::Debug for Task<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task").finish_non_exhaustive()
    }
}

impl<T> Future for Task<T> {
    type Output = Result<T, Error>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.as_mut().poll(cx)
    }
}

impl<T> Task<T>
where
    T: Send + 'static,
{
    /// Unfilled task and its write end
    pub fn deferred() -> (Deferred<T>, Self) {
        let (sender, receiver) = oneshot::channel();
        let task = Self::from_future(async move {
            match receiver.await {
                Ok(result) => result,
                Err(_) => Err(Error::Abandoned),
            }
        });
        (Deferred { sender }, task)
    }

    /// Already resolved task
    pub fn ready(result: Result<T, Error>) -> Self {
        Self::from_future(futures::future::ready(result))
    }

    /// Wrap a future. The future only makes progress while the task is polled.
    pub fn from_future<F>(future: F) -> Self
    where
        F: Future<Output = Result<T, Error>> + Send + 'static,
    {
        Self {
            inner: future.boxed(),
        }
    }

    /// Drive `future` on `runtime` right away
    pub fn spawn<F>(runtime: &Handle, future: F) -> Self
    where
        F: Future<Output = Result<T, Error>> + Send + 'static,
    {
        let (deferred, task) = Self::deferred();
        runtime.spawn(async move {
            deferred.fill(future.await);
        });
        task
    }

    /// Run `work` on `executor` right away
    pub fn on<E, F>(executor: &E, work: F) -> Self
    where
        E: Executor + ?Sized,
        F: FnOnce() -> Result<T, Error> + Send + 'static,
    {
        let (deferred, task) = Self::deferred();
        executor.execute(Box::new(move || {
            deferred.fill(work());
        }));
        task
    }

    /// Chain `next` on `executor` once this task succeeds
    ///
    /// A failure skips `next` and is forwarded unchanged.
    pub fn and_then<U, E, F>(self, executor: &E, next: F) -> Task<U>
    where
        U: Send + 'static,
        E: Executor + Clone + 'static,
        F: FnOnce(T) -> Task<U> + Send + 'static,
    {
        let (deferred, task) = Task::deferred();
        let target = executor.clone();
        executor.runtime().spawn(async move {
            let result = match self.await {
                Ok(value) => match Task::on(&target, move || Ok(next(value))).await {
                    Ok(chained) => chained.await,
                    Err(err) => Err(err),
                },
                Err(err) => Err(err),
            };
            deferred.fill(result);
        });
        task
    }

    /// Transform the success value on `executor`
    pub fn map<U, E, F>(self, executor: &E, transform: F) -> Task<U>
    where
        U: Send + 'static,
        E: Executor + Clone + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        self.and_then(executor, move |value| Task::ready(Ok(transform(value))))
    }

    /// Hand the outcome to `callback` on `executor`
    ///
    /// Bridges a task to callback-style hosts.
    pub fn upon<E, F>(self, executor: &E, callback: F)
    where
        E: Executor + Clone + 'static,
        F: FnOnce(Result<T, Error>) + Send + 'static,
    {
        let target = executor.clone();
        executor.runtime().spawn(async move {
            let result = self.await;
            target.execute(Box::new(move || callback(result)));
        });
    }
}

/// Wait for both tasks
///
/// Fails with the first task's error if both fail.
pub fn both<A, B>(first: Task<A>, second: Task<B>) -> Task<(A, B)>
where
    A: Send + 'static,
    B: Send + 'static,
{
    Task::from_future(async move {
        let (first, second) = futures::join!(first, second);
        Ok((first?, second?))
    })
}

/// Start `second` from a borrow of `first`'s value, then wait for both
pub fn both_serially<A, B, E, F>(first: Task<A>, executor: &E, second: F) -> Task<(A, B)>
where
    A: Send + 'static,
    B: Send + 'static,
    E: Executor + Clone + 'static,
    F: FnOnce(&A) -> Task<B> + Send + 'static,
{
    first.and_then(executor, move |value| {
        let next = second(&value);
        Task::from_future(async move { Ok((value, next.await?)) })
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::error::ErrorKind;
    use crate::queue::{Background, MainQueue, SerialQueue};

    fn thread_name() -> Option<String> {
        thread::current().name().map(str::to_owned)
    }

    #[tokio::test]
    async fn test_deferred_fill() {
        let (deferred, task) = Task::deferred();
        assert!(deferred.fill(Ok(7)));
        assert_eq!(task.await.expect("Filled"), 7);
    }

    #[tokio::test]
    async fn test_dropped_deferred_abandons_task() {
        let (deferred, task) = Task::<u8>::deferred();
        drop(deferred);
        assert!(matches!(task.await, Err(Error::Abandoned)));
    }

    #[tokio::test]
    async fn test_fill_after_task_dropped() {
        let (deferred, task) = Task::deferred();
        drop(task);
        assert!(!deferred.fill(Ok(())));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_on_runs_on_executor() {
        let queue = SerialQueue::new("task-on", Handle::current()).expect("Worker spawns");
        let name = Task::on(&queue, || Ok(thread_name())).await.expect("Ran");
        assert_eq!(name.as_deref(), Some("task-on"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_and_then_runs_continuation_on_executor() {
        let queue = SerialQueue::new("task-chain", Handle::current()).expect("Worker spawns");
        let background = Background::current().expect("Inside a runtime");

        let task = Task::on(&background, || Ok(20))
            .and_then(&queue, |value| Task::ready(Ok((value + 1, thread_name()))));

        let (value, name) = task.await.expect("Chain succeeds");
        assert_eq!(value, 21);
        assert_eq!(name.as_deref(), Some("task-chain"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_and_then_skips_continuation_on_error() {
        let background = Background::current().expect("Inside a runtime");
        let called = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&called);
        let task = Task::<u8>::ready(Err(ErrorKind::Forbidden.into())).and_then(
            &background,
            move |value| {
                flag.store(true, Ordering::SeqCst);
                Task::ready(Ok(value))
            },
        );

        let err = task.await.expect_err("Error is forwarded");
        assert_eq!(err.kind(), Some(ErrorKind::Forbidden));
        assert!(!called.load(Ordering::SeqCst));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_chain_runs_without_being_awaited() {
        let background = Background::current().expect("Inside a runtime");
        let (done, observed) = Task::<()>::deferred();

        let task = Task::ready(Ok(())).and_then(&background, move |()| {
            done.fill(Ok(()));
            Task::ready(Ok(()))
        });
        drop(task);

        observed.await.expect("Continuation ran");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_map() {
        let background = Background::current().expect("Inside a runtime");
        let task = Task::ready(Ok("courier")).map(&background, str::len);
        assert_eq!(task.await.expect("Mapped"), 7);
    }

    #[tokio::test]
    async fn test_both() {
        let (a, b) = both(Task::ready(Ok(1)), Task::ready(Ok("two")))
            .await
            .expect("Both succeed");
        assert_eq!((a, b), (1, "two"));
    }

    #[tokio::test]
    async fn test_both_prefers_first_error() {
        let err = both::<u8, u8>(
            Task::ready(Err(ErrorKind::BadRequest.into())),
            Task::ready(Err(ErrorKind::ServerUnavailable.into())),
        )
        .await
        .expect_err("Both fail");
        assert_eq!(err.kind(), Some(ErrorKind::BadRequest));

        let err = both::<u8, u8>(
            Task::ready(Ok(1)),
            Task::ready(Err(ErrorKind::ServerUnavailable.into())),
        )
        .await
        .expect_err("Second fails");
        assert_eq!(err.kind(), Some(ErrorKind::ServerUnavailable));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_both_serially() {
        let background = Background::current().expect("Inside a runtime");
        let (id, name) = both_serially(Task::ready(Ok(42u32)), &background, |id| {
            let id = *id;
            Task::ready(Ok(format!("user-{id}")))
        })
        .await
        .expect("Both succeed");

        assert_eq!(id, 42);
        assert_eq!(name, "user-42");
    }

    #[test]
    fn test_upon_delivers_on_main_loop() {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .build()
            .expect("Runtime builds");
        let (main, main_loop) = MainQueue::new(runtime.handle().clone());
        let (tx, rx) = std::sync::mpsc::channel();

        Task::spawn(runtime.handle(), async { Ok(5) }).upon(&main, move |result| {
            let _ = tx.send((result.ok(), thread::current().id()));
        });

        assert!(main_loop.run_once());
        let (value, id) = rx.recv().expect("Callback ran");
        assert_eq!(value, Some(5));
        assert_eq!(id, thread::current().id());
    }
}
