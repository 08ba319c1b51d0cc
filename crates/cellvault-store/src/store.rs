//! The document store.
//!
//! Owns one [`DocumentState`] and is its only mutation path. Components that
//! need the document get a [`SharedDocumentStore`] passed in.
//!
//! # Concurrency Model
//!
//! - One `parking_lot::RwLock` around the state and its counters
//! - `dispatch` reduces under the write lock, so observers never see half an
//!   action and actions apply in call order
//! - Events are broadcast after the lock is released

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tokio::sync::broadcast;

use cellvault_types::DocumentState;

use crate::action::{Action, ActionKind};
use crate::reducer;

/// Source of "now" for reductions, in Unix millis.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> u64;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        cellvault_types::now_millis()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicU64,
}

impl ManualClock {
    pub fn new(start: u64) -> Self {
        Self {
            millis: AtomicU64::new(start),
        }
    }

    pub fn set(&self, millis: u64) {
        self.millis.store(millis, Ordering::SeqCst);
    }

    pub fn advance(&self, millis: u64) {
        self.millis.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.millis.load(Ordering::SeqCst)
    }
}

/// Events broadcast after a dispatch changed something.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreEvent {
    /// An incremental action was applied.
    Changed { kind: ActionKind, revision: u64 },
    /// The document was replaced wholesale.
    Replaced { revision: u64, generation: u64 },
}

struct Inner {
    state: DocumentState,
    /// Bumped on every applied change.
    revision: u64,
    /// Bumped on every wholesale replacement.
    generation: u64,
}

/// Holds one document and applies actions to it.
pub struct DocumentStore {
    inner: RwLock<Inner>,
    clock: Arc<dyn Clock>,
    event_tx: broadcast::Sender<StoreEvent>,
}

/// Thread-safe shared reference to a document store.
pub type SharedDocumentStore = Arc<DocumentStore>;

/// Create a new shared store holding `state`.
pub fn shared_document_store(state: DocumentState) -> SharedDocumentStore {
    Arc::new(DocumentStore::new(state))
}

impl DocumentStore {
    /// Create a store using the system clock.
    pub fn new(state: DocumentState) -> Self {
        Self::with_clock(state, Arc::new(SystemClock))
    }

    pub fn with_clock(state: DocumentState, clock: Arc<dyn Clock>) -> Self {
        let (event_tx, _) = broadcast::channel(1024);
        Self {
            inner: RwLock::new(Inner {
                state,
                revision: 0,
                generation: 0,
            }),
            clock,
            event_tx,
        }
    }

    /// Subscribe to change events.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.event_tx.subscribe()
    }

    /// Current time according to the store's clock.
    pub fn now(&self) -> u64 {
        self.clock.now_millis()
    }

    /// Apply an action. Returns whether the document changed.
    pub fn dispatch(&self, action: Action) -> bool {
        self.dispatch_inner(None, action).unwrap_or(false)
    }

    /// Apply an action only if no replacement happened since `generation`.
    ///
    /// Returns `None` when the generation has moved on; the action is dropped.
    pub fn dispatch_if_generation(&self, generation: u64, action: Action) -> Option<bool> {
        self.dispatch_inner(Some(generation), action)
    }

    fn dispatch_inner(&self, expected_generation: Option<u64>, action: Action) -> Option<bool> {
        let kind = action.kind();
        let now = self.clock.now_millis();

        let (changed, event) = {
            let mut inner = self.inner.write();
            if expected_generation.is_some_and(|g| g != inner.generation) {
                return None;
            }
            let changed = reducer::apply(&mut inner.state, &action, now);
            if kind.is_replacement() {
                inner.generation += 1;
            }
            if !changed && !kind.is_replacement() {
                (false, None)
            } else {
                inner.revision += 1;
                let event = if kind.is_replacement() {
                    StoreEvent::Replaced {
                        revision: inner.revision,
                        generation: inner.generation,
                    }
                } else {
                    StoreEvent::Changed {
                        kind,
                        revision: inner.revision,
                    }
                };
                (changed, Some(event))
            }
        };

        match event {
            Some(event) => {
                tracing::trace!(action = %kind, ?event, "dispatched");
                // No receivers is fine.
                let _ = self.event_tx.send(event);
            }
            None => tracing::debug!(action = %kind, "action left document unchanged"),
        }
        Some(changed)
    }

    /// Clone of the current document.
    pub fn snapshot(&self) -> DocumentState {
        self.inner.read().state.clone()
    }

    /// Current document and generation, read together.
    pub fn snapshot_with_generation(&self) -> (DocumentState, u64) {
        let inner = self.inner.read();
        (inner.state.clone(), inner.generation)
    }

    /// Borrow the current document for the duration of `f`.
    pub fn read<R>(&self, f: impl FnOnce(&DocumentState) -> R) -> R {
        f(&self.inner.read().state)
    }

    pub fn revision(&self) -> u64 {
        self.inner.read().revision
    }

    pub fn generation(&self) -> u64 {
        self.inner.read().generation
    }
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new(DocumentState::default())
    }
}

impl std::fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("DocumentStore")
            .field("document_id", &inner.state.document_id)
            .field("revision", &inner.revision)
            .field("generation", &inner.generation)
            .finish()
    }
}
