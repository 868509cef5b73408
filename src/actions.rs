//! Deferred cross-thread mutation batching.
//!
//! `collect` is the one operation in this crate that is safe from any
//! thread: producers enqueue an [`Action`] and the UI context drains the
//! queue once per cycle through [`ActionCoordinator::flush`]. Unordered
//! actions coalesce per (target, key) with last-write-wins semantics;
//! ordered actions are never dropped and flush in submission order.

use std::collections::HashMap;
use std::fmt;
use std::mem;
use std::sync::Mutex;

use mooring_core::{EventPayload, NodeId};
use tracing::trace;

use crate::host::{DataUpdate, FlushCtx};

/// Do-function executed when an action flushes.
pub type ActionFn = Box<dyn FnOnce(&mut FlushCtx<'_>) + Send + 'static>;

/// Coalescing behavior of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// Coalesces by (target, key): a later submission before the next flush
    /// replaces an earlier one.
    Unordered,
    /// Never dropped; flushes in submission order relative to other ordered
    /// actions.
    Ordered,
}

/// One deferred mutation: a target node, a coalescing key, and the
/// do-function to run on the UI context.
pub struct Action {
    target: NodeId,
    key: String,
    kind: ActionKind,
    run: ActionFn,
}

impl Action {
    /// Creates an unordered (coalescing) action.
    pub fn unordered(
        target: NodeId,
        key: impl Into<String>,
        run: impl FnOnce(&mut FlushCtx<'_>) + Send + 'static,
    ) -> Self {
        Self {
            target,
            key: key.into(),
            kind: ActionKind::Unordered,
            run: Box::new(run),
        }
    }

    /// Creates an ordered (never-dropped) action.
    pub fn ordered(
        target: NodeId,
        key: impl Into<String>,
        run: impl FnOnce(&mut FlushCtx<'_>) + Send + 'static,
    ) -> Self {
        Self {
            target,
            key: key.into(),
            kind: ActionKind::Ordered,
            run: Box::new(run),
        }
    }

    /// Creates the unordered action delivering a named event to the
    /// application layer, keyed by the event name so repeats of the same
    /// event coalesce before flush.
    #[must_use]
    pub fn post_event(target: NodeId, name: impl Into<String>, payload: EventPayload) -> Self {
        let name = name.into();
        let key = name.clone();
        Self::unordered(target, key, move |ctx| {
            if ctx.is_attached(target) {
                ctx.deliver_event(target, &name, &payload);
            }
        })
    }

    /// Creates the unordered action pushing a data update to the
    /// application layer, keyed by the data field's identifier.
    #[must_use]
    pub fn update_data(target: NodeId, update: DataUpdate) -> Self {
        Self::unordered(target, update.key(), move |ctx| {
            if ctx.is_attached(target) {
                ctx.deliver_data(target, &update);
            }
        })
    }

    /// Returns the node this action targets.
    #[must_use]
    pub const fn target(&self) -> NodeId {
        self.target
    }

    /// Returns the coalescing key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the coalescing behavior.
    #[must_use]
    pub const fn kind(&self) -> ActionKind {
        self.kind
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("target", &self.target)
            .field("key", &self.key)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
struct Queue {
    slots: Vec<Option<Action>>,
    unordered: HashMap<(NodeId, String), usize>,
}

impl Queue {
    fn push(&mut self, action: Action) {
        match action.kind {
            ActionKind::Ordered => self.slots.push(Some(action)),
            ActionKind::Unordered => {
                let key = (action.target, action.key.clone());
                if let Some(&slot) = self.unordered.get(&key) {
                    // Replacement keeps the first submission's queue position.
                    self.slots[slot] = Some(action);
                } else {
                    self.unordered.insert(key, self.slots.len());
                    self.slots.push(Some(action));
                }
            }
        }
    }

    fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }
}

/// Per-tree queue of deferred actions, shared between the production and
/// UI contexts.
///
/// The coordinator is created when the tree root binds and dropped when it
/// unbinds, taking any pending entries with it.
#[derive(Debug, Default)]
pub struct ActionCoordinator {
    queue: Mutex<Queue>,
}

impl ActionCoordinator {
    /// Creates an empty coordinator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues an action. Safe to call from any thread.
    pub fn collect(&self, action: Action) {
        trace!(target_node = action.target.index(), key = %action.key, "collect action");
        self.queue
            .lock()
            .expect("action queue lock poisoned")
            .push(action);
    }

    /// Returns the number of actions currently pending.
    ///
    /// Racy by nature when producers are active; meaningful on the UI
    /// context between flushes.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue
            .lock()
            .expect("action queue lock poisoned")
            .len()
    }

    /// Runs every queued do-function exactly once, then clears the queue.
    ///
    /// The queue contents are taken atomically before execution, so a
    /// do-function that collects new actions feeds the *next* flush, never
    /// the current one. Flushing an empty queue is a no-op.
    pub fn flush(&self, ctx: &mut FlushCtx<'_>) {
        let drained = {
            let mut queue = self.queue.lock().expect("action queue lock poisoned");
            mem::take(&mut *queue)
        };
        if drained.slots.is_empty() {
            return;
        }
        trace!(count = drained.len(), "flush actions");
        for action in drained.slots.into_iter().flatten() {
            (action.run)(ctx);
        }
    }
}
