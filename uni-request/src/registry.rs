//! Task registry
//!
//! Maps request ids to the live logical call registered under them so callers
//! can cancel by id. An entry lives from dispatch until the call settles; the
//! abortable task inside it is swapped on every attempt.
//!
//! Registering an id that is still live supersedes the older call: its task is
//! aborted and it settles with a cancellation error. Each registration carries
//! a ticket so the superseded call's cleanup never removes the newer entry.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

use crate::transport::TaskHandle;
use crate::utils::lock;

const LOG_TARGET: &str = "uni_request::http";

/// Generate a unique request id.
pub fn generate_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

struct PendingRequest {
    ticket: u64,
    token: CancellationToken,
    task: Option<Arc<dyn TaskHandle>>,
}

impl PendingRequest {
    fn abort(self) {
        if let Some(task) = self.task {
            task.abort();
        }
        self.token.cancel();
    }
}

/// Live calls of one client, keyed by request id.
#[derive(Default)]
pub struct TaskRegistry {
    entries: Mutex<HashMap<String, PendingRequest>>,
    next_ticket: AtomicU64,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a logical call under `request_id`.
    ///
    /// The entry is removed when the returned [`Registration`] is dropped.
    pub fn register(&self, request_id: impl Into<String>) -> Registration<'_> {
        let request_id = request_id.into();
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();

        let superseded = lock(&self.entries).insert(
            request_id.clone(),
            PendingRequest {
                ticket,
                token: token.clone(),
                task: None,
            },
        );
        if let Some(previous) = superseded {
            tracing::debug!(
                target: LOG_TARGET,
                request_id = %request_id,
                "superseding live request with the same id"
            );
            previous.abort();
        }

        Registration {
            registry: self,
            request_id,
            ticket,
            token,
        }
    }

    /// Abort the live call registered under `request_id`.
    ///
    /// Returns `false` when no such call is live.
    pub fn cancel(&self, request_id: &str) -> bool {
        let entry = lock(&self.entries).remove(request_id);
        match entry {
            Some(entry) => {
                tracing::debug!(target: LOG_TARGET, request_id = %request_id, "cancelling request");
                entry.abort();
                true
            }
            None => false,
        }
    }

    /// Abort every live call.
    pub fn cancel_all(&self) {
        let drained: Vec<PendingRequest> = lock(&self.entries).drain().map(|(_, e)| e).collect();
        if !drained.is_empty() {
            tracing::debug!(target: LOG_TARGET, count = drained.len(), "cancelling all requests");
        }
        for entry in drained {
            entry.abort();
        }
    }

    /// Stop tracking `request_id` without aborting it.
    ///
    /// The call keeps running but can no longer be cancelled by id.
    pub fn unregister(&self, request_id: &str) -> bool {
        lock(&self.entries).remove(request_id).is_some()
    }

    pub fn contains(&self, request_id: &str) -> bool {
        lock(&self.entries).contains_key(request_id)
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.entries).is_empty()
    }

    fn attach(
        &self,
        request_id: &str,
        ticket: u64,
        task: Arc<dyn TaskHandle>,
    ) -> Option<Arc<dyn TaskHandle>> {
        match lock(&self.entries).get_mut(request_id) {
            Some(entry) if entry.ticket == ticket => {
                entry.task = Some(task);
                None
            }
            _ => Some(task),
        }
    }

    fn detach(&self, request_id: &str, ticket: u64) {
        if let Some(entry) = lock(&self.entries).get_mut(request_id) {
            if entry.ticket == ticket {
                entry.task = None;
            }
        }
    }

    fn release(&self, request_id: &str, ticket: u64) {
        let mut entries = lock(&self.entries);
        if entries.get(request_id).is_some_and(|e| e.ticket == ticket) {
            entries.remove(request_id);
        }
    }
}

impl std::fmt::Debug for TaskRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskRegistry")
            .field("live", &self.len())
            .finish()
    }
}

/// A logical call's claim on its registry entry.
pub struct Registration<'a> {
    registry: &'a TaskRegistry,
    request_id: String,
    ticket: u64,
    token: CancellationToken,
}

impl Registration<'_> {
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Make `task` the one aborted if this call is cancelled.
    ///
    /// If the call was already cancelled the task is aborted right away.
    pub fn attach(&self, task: Arc<dyn TaskHandle>) {
        let rejected = self.registry.attach(&self.request_id, self.ticket, task);
        if let Some(task) = rejected {
            if self.token.is_cancelled() {
                task.abort();
            }
        }
    }

    /// Forget the current task once its attempt has settled.
    pub fn detach(&self) {
        self.registry.detach(&self.request_id, self.ticket);
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the call is cancelled by id or superseded.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        self.registry.release(&self.request_id, self.ticket);
    }
}
