//! Single attempt execution
//!
//! Bridges the transport's completion callback into an awaitable outcome and
//! races it against the attempt timeout and the call's cancellation.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use uni_request_spec::RequestError;

use crate::registry::Registration;
use crate::transport::{Completion, TaskHandle};

/// Issue one transport operation and wait for whichever comes first:
/// cancellation, the transport's completion, or the timeout.
///
/// The task is attached to `registration` while in flight so it can be
/// aborted by request id. On timeout, or when the returned future is dropped
/// before the attempt settles, the task is aborted here.
pub(crate) async fn run_attempt<T, F>(
    registration: &Registration<'_>,
    timeout: Option<Duration>,
    issue: F,
) -> Result<T, RequestError>
where
    T: Send + 'static,
    F: FnOnce(Completion<T>) -> Arc<dyn TaskHandle>,
{
    if registration.is_cancelled() {
        return Err(RequestError::cancelled(registration.request_id()));
    }

    let (tx, rx) = oneshot::channel();
    let task = issue(Box::new(move |outcome| {
        // The receiver is gone once the attempt was cancelled or timed out.
        let _ = tx.send(outcome);
    }));
    registration.attach(task.clone());
    let mut in_flight = AbortOnDrop(Some(task.clone()));

    let outcome = tokio::select! {
        biased;
        _ = registration.cancelled() => Err(RequestError::cancelled(registration.request_id())),
        settled = rx => settled.unwrap_or_else(|_| {
            Err(RequestError::transport("request:fail task dropped without completing"))
        }),
        after = expire(timeout) => {
            task.abort();
            Err(RequestError::timeout(after))
        }
    };

    in_flight.disarm();
    registration.detach();
    outcome
}

/// Aborts the task if the attempt future is dropped before it settles.
struct AbortOnDrop(Option<Arc<dyn TaskHandle>>);

impl AbortOnDrop {
    fn disarm(&mut self) {
        self.0 = None;
    }
}

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        if let Some(task) = self.0.take() {
            task.abort();
        }
    }
}

/// Completes after `timeout`, or never when there is none.
async fn expire(timeout: Option<Duration>) -> Duration {
    match timeout {
        Some(after) => {
            tokio::time::sleep(after).await;
            after
        }
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TaskRegistry;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct StubTask {
        aborts: AtomicUsize,
    }

    impl TaskHandle for StubTask {
        fn abort(&self) {
            self.aborts.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn resolves_from_completion() {
        let registry = TaskRegistry::new();
        let registration = registry.register("req");

        let value = run_attempt(&registration, Some(Duration::from_secs(1)), |complete| {
            complete(Ok(7));
            Arc::new(StubTask::default()) as Arc<dyn TaskHandle>
        })
        .await
        .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_and_aborts_task() {
        let registry = TaskRegistry::new();
        let registration = registry.register("req");
        let task = Arc::new(StubTask::default());
        let parked: Arc<Mutex<Option<Completion<u8>>>> = Arc::default();

        let t: Arc<dyn TaskHandle> = task.clone();
        let p = parked.clone();
        let err = run_attempt(&registration, Some(Duration::from_millis(5000)), move |complete| {
            *p.lock().unwrap() = Some(complete);
            t
        })
        .await
        .unwrap_err();

        assert!(err.is_timeout());
        assert_eq!(err.err_msg, "request:fail timeout");
        assert_eq!(task.aborts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_settles_pending_attempt() {
        let registry = TaskRegistry::new();
        let registration = registry.register("req");
        let task = Arc::new(StubTask::default());
        let parked: Arc<Mutex<Option<Completion<u8>>>> = Arc::default();

        let t: Arc<dyn TaskHandle> = task.clone();
        let p = parked.clone();
        let attempt = run_attempt(&registration, None, move |complete| {
            *p.lock().unwrap() = Some(complete);
            t
        });
        let cancel = async {
            tokio::task::yield_now().await;
            assert!(registry.cancel("req"));
        };

        let (outcome, ()) = tokio::join!(attempt, cancel);
        assert!(outcome.unwrap_err().is_cancelled());
        assert_eq!(task.aborts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_attempt_aborts_task() {
        let registry = TaskRegistry::new();
        let registration = registry.register("req");
        let task = Arc::new(StubTask::default());
        let parked: Arc<Mutex<Option<Completion<u8>>>> = Arc::default();

        let t: Arc<dyn TaskHandle> = task.clone();
        let p = parked.clone();
        let attempt = run_attempt(&registration, None, move |complete| {
            *p.lock().unwrap() = Some(complete);
            t
        });
        let outcome = tokio::time::timeout(Duration::from_millis(10), attempt).await;

        assert!(outcome.is_err());
        assert_eq!(task.aborts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn settled_attempt_leaves_task_alone() {
        let registry = TaskRegistry::new();
        let registration = registry.register("req");
        let task = Arc::new(StubTask::default());

        let t: Arc<dyn TaskHandle> = task.clone();
        run_attempt(&registration, None, move |complete| {
            complete(Ok(1u8));
            t
        })
        .await
        .unwrap();
        assert_eq!(task.aborts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn dropped_completion_is_a_transport_error() {
        let registry = TaskRegistry::new();
        let registration = registry.register("req");

        let err = run_attempt::<u8, _>(&registration, None, |complete| {
            drop(complete);
            Arc::new(StubTask::default()) as Arc<dyn TaskHandle>
        })
        .await
        .unwrap_err();
        assert_eq!(err.kind, uni_request_spec::ErrorKind::Transport);
    }

    #[tokio::test]
    async fn already_cancelled_call_skips_transport() {
        let registry = TaskRegistry::new();
        let registration = registry.register("req");
        registry.cancel("req");

        let err = run_attempt::<u8, _>(&registration, None, |_| {
            panic!("transport must not be invoked")
        })
        .await
        .unwrap_err();
        assert!(err.is_cancelled());
    }
}
