//! Workflow events and the per-client event bus.
//!
//! Conversions notify observers through a side channel of named events:
//! `start`, `progress`, `status`, `complete`, `error`. Events describe
//! progress; they are never used for control flow, never persisted and
//! never retried.
//!
//! # Why a tagged union instead of a key/value bag?
//!
//! Each event kind carries a distinct, compile-time-checked payload
//! ([`Event::Start`] has a file name, [`Event::Status`] has an attempt
//! counter, and so on). Handlers still dispatch on [`EventKind`], so the
//! "one handler per event name" model survives, but a typo in a field
//! name is now a compile error instead of a silent `None`.
//!
//! # Registry semantics
//!
//! The registry is owned by the client instance, not the process: two
//! clients never see each other's handlers. Within one client the
//! registry holds at most one handler per kind; re-registering replaces
//! the previous handler silently (last writer wins). Handlers run
//! synchronously on the emitting task, in emission order, and a handler
//! panic propagates to the caller of `convert` — a broken observer
//! should be noticed during development, not swallowed.
//!
//! Conversions running concurrently through one shared client also share
//! its handlers; disambiguate via the `job_id` carried in the payloads,
//! or use one client per conversion.

use crate::api::JobStatus;
use crate::output::ConversionResult;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

/// The five workflow steps reported through [`Event::Progress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStep {
    RequestingUploadUrl,
    Uploading,
    Confirming,
    Converting,
    Downloading,
}

impl ProgressStep {
    /// The wire-compatible step name, as the other Convertorio SDKs
    /// report it.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressStep::RequestingUploadUrl => "requesting-upload-url",
            ProgressStep::Uploading => "uploading",
            ProgressStep::Confirming => "confirming",
            ProgressStep::Converting => "converting",
            ProgressStep::Downloading => "downloading",
        }
    }
}

/// A named occurrence in the conversion workflow.
#[derive(Debug, Clone)]
pub enum Event {
    /// The workflow is about to start (validation already passed).
    Start {
        file_name: String,
        source_format: String,
        target_format: String,
        file_size: u64,
    },
    /// A workflow step is beginning. `job_id` is `None` only for the
    /// first step, before the server has assigned one; `status` is only
    /// carried by [`ProgressStep::Converting`].
    Progress {
        step: ProgressStep,
        job_id: Option<String>,
        status: Option<JobStatus>,
    },
    /// One polling attempt completed. Attempts are 1-indexed and
    /// strictly increasing up to `max_attempts`.
    Status {
        job_id: String,
        status: JobStatus,
        attempt: u32,
        max_attempts: u32,
    },
    /// The conversion finished and the artifact is on disk.
    Complete(ConversionResult),
    /// A step failed; the same error is about to propagate to the
    /// caller of `convert`.
    Error {
        message: String,
        input_path: PathBuf,
        target_format: String,
    },
}

impl Event {
    /// The kind used for handler dispatch.
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Start { .. } => EventKind::Start,
            Event::Progress { .. } => EventKind::Progress,
            Event::Status { .. } => EventKind::Status,
            Event::Complete(_) => EventKind::Complete,
            Event::Error { .. } => EventKind::Error,
        }
    }
}

/// Dispatch key for [`EventBus`] handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Start,
    Progress,
    Status,
    Complete,
    Error,
}

type Handler = Box<dyn Fn(&Event) + Send + Sync>;

/// In-process registry of one handler per event kind.
#[derive(Default)]
pub(crate) struct EventBus {
    handlers: RwLock<HashMap<EventKind, Handler>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `kind`, replacing any previous handler.
    pub fn on<F>(&self, kind: EventKind, handler: F)
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.lock_write().insert(kind, Box::new(handler));
    }

    /// Invoke the handler registered for the event's kind, if any.
    ///
    /// Runs synchronously on the calling task. A handler panic
    /// propagates upward.
    pub fn emit(&self, event: &Event) {
        if let Some(handler) = self.lock_read().get(&event.kind()) {
            handler(event);
        }
    }

    // A handler that panicked while the lock was held poisons it; the
    // map itself is still consistent, so later conversions through the
    // same client keep working.
    fn lock_read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<EventKind, Handler>> {
        self.handlers.read().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<EventKind, Handler>> {
        self.handlers.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn start_event() -> Event {
        Event::Start {
            file_name: "photo.png".into(),
            source_format: "png".into(),
            target_format: "webp".into(),
            file_size: 1024,
        }
    }

    #[test]
    fn emit_without_handler_is_a_noop() {
        let bus = EventBus::new();
        bus.emit(&start_event());
    }

    #[test]
    fn handler_receives_matching_kind_only() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        bus.on(EventKind::Start, move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });

        bus.emit(&start_event());
        bus.emit(&Event::Error {
            message: "boom".into(),
            input_path: "in.png".into(),
            target_format: "webp".into(),
        });

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn reregistering_replaces_the_previous_handler() {
        let bus = EventBus::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let f = Arc::clone(&first);
        bus.on(EventKind::Start, move |_| {
            f.fetch_add(1, Ordering::SeqCst);
        });
        let s = Arc::clone(&second);
        bus.on(EventKind::Start, move |_| {
            s.fetch_add(1, Ordering::SeqCst);
        });

        bus.emit(&start_event());

        assert_eq!(first.load(Ordering::SeqCst), 0, "replaced handler must not fire");
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn progress_step_wire_names() {
        assert_eq!(ProgressStep::RequestingUploadUrl.as_str(), "requesting-upload-url");
        assert_eq!(ProgressStep::Converting.as_str(), "converting");
    }

    #[test]
    fn event_kind_dispatch() {
        assert_eq!(start_event().kind(), EventKind::Start);
        let status = Event::Status {
            job_id: "j1".into(),
            status: JobStatus::Queued,
            attempt: 1,
            max_attempts: 60,
        };
        assert_eq!(status.kind(), EventKind::Status);
    }
}
