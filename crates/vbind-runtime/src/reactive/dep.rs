#![forbid(unsafe_code)]

//! Per-field dependency registry.
//!
//! A [`Dep`] remembers which subscribers read its field and updates them
//! when the field is written. Subscribers are referenced weakly (a `Dep`
//! never keeps a binding alive) and deduplicated by [`SubscriberId`].
//!
//! # Invariants
//!
//! 1. A subscriber appears at most once, however often it re-evaluates.
//! 2. `notify()` updates subscribers in registration order.
//! 3. No internal borrow is held while a subscriber runs, so a subscriber
//!    may register with this same `Dep` or write through it re-entrantly.
//! 4. Dead subscribers are pruned during `notify()`.
//!
//! # Failure Modes
//!
//! - A subscriber's `update()` fails: later subscribers still run, the
//!   failure is logged, and the first error is returned from `notify()`.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use ahash::AHashSet;
use vbind_core::{BindError, Result};

/// Identity of a subscriber, unique for the life of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Allocate a fresh identity.
    #[must_use]
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

/// Something a [`Dep`] can update.
pub trait Subscriber {
    fn id(&self) -> SubscriberId;

    /// Re-evaluate after a dependency changed.
    fn update(&self) -> Result<()>;
}

/// Handle passed to evaluation so that every field read registers the
/// evaluating subscriber.
#[derive(Clone)]
pub struct Tracker {
    id: SubscriberId,
    subscriber: Weak<dyn Subscriber>,
}

impl Tracker {
    #[must_use]
    pub fn new(id: SubscriberId, subscriber: Weak<dyn Subscriber>) -> Self {
        Self { id, subscriber }
    }

    /// Tracker for an already-shared subscriber.
    #[must_use]
    pub fn for_subscriber(subscriber: &Rc<dyn Subscriber>) -> Self {
        Self {
            id: subscriber.id(),
            subscriber: Rc::downgrade(subscriber),
        }
    }

    #[must_use]
    pub fn id(&self) -> SubscriberId {
        self.id
    }
}

impl fmt::Debug for Tracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracker").field("id", &self.id).finish()
    }
}

#[derive(Default)]
struct DepState {
    entries: Vec<(SubscriberId, Weak<dyn Subscriber>)>,
    seen: AHashSet<SubscriberId>,
}

/// Subscriber set for one reactive field.
#[derive(Default)]
pub struct Dep {
    state: RefCell<DepState>,
}

impl Dep {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the tracked subscriber. Returns `false` if it was already
    /// registered.
    pub fn depend(&self, tracker: &Tracker) -> bool {
        let mut state = self.state.borrow_mut();
        if !state.seen.insert(tracker.id) {
            return false;
        }
        state
            .entries
            .push((tracker.id, Weak::clone(&tracker.subscriber)));
        tracing::trace!(subscriber = %tracker.id, "dependency registered");
        true
    }

    /// Update every live subscriber in registration order.
    pub fn notify(&self) -> Result<()> {
        let live: Vec<Rc<dyn Subscriber>> = {
            let mut state = self.state.borrow_mut();
            let DepState { entries, seen } = &mut *state;
            let mut live = Vec::with_capacity(entries.len());
            entries.retain(|(id, weak)| match weak.upgrade() {
                Some(sub) => {
                    live.push(sub);
                    true
                }
                None => {
                    seen.remove(id);
                    false
                }
            });
            live
        };

        let mut first: Option<BindError> = None;
        for sub in live {
            if let Err(err) = sub.update() {
                tracing::warn!(subscriber = %sub.id(), error = %err, "subscriber update failed");
                first.get_or_insert(err);
            }
        }
        first.map_or(Ok(()), Err)
    }

    /// Number of registered subscribers (including not-yet-pruned dead ones).
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.borrow().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn contains(&self, id: SubscriberId) -> bool {
        self.state.borrow().seen.contains(&id)
    }
}

impl fmt::Debug for Dep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dep")
            .field("subscribers", &self.len())
            .finish()
    }
}
