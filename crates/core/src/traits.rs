//! Core traits for Blueprint Studio
//!
//! `Validatable` gives model types a uniform consistency check.
//! `RemovalListener` is the only channel through which one store learns that
//! a record owned by another store has been destroyed.

use crate::error::EngineResult;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use uuid::Uuid;

// ============================================================================
// Validatable Trait
// ============================================================================

/// Trait for types that can be validated
///
/// Types implementing this trait can check their internal consistency
/// and return validation errors if the state is invalid.
pub trait Validatable {
    /// Validate the current state of the object
    ///
    /// Returns `Ok(())` if valid, or an `EngineError` describing the problem.
    fn validate(&self) -> EngineResult<()>;

    /// Check if the object is valid without returning error details
    fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Get all validation errors (for types that can have multiple errors)
    fn validation_errors(&self) -> Vec<String> {
        match self.validate() {
            Ok(()) => vec![],
            Err(e) => vec![e.to_string()],
        }
    }
}

// ============================================================================
// RemovalListener Trait
// ============================================================================

/// Receives "record removed" notifications from an upstream store.
///
/// Listeners are invoked synchronously from inside the upstream removal, so
/// by the time that removal returns every dependent store is already
/// consistent. Implementations must not call back into the notifying store.
pub trait RemovalListener {
    /// The record with this id no longer exists upstream
    fn notify_removed(&self, id: Uuid);
}

/// A store that drops its own records when an upstream record disappears.
///
/// Every `RefCell` around a `CascadeTarget` is a `RemovalListener`, so a store
/// handle (`Rc<RefCell<S>>`, or a `Weak` to one) can be registered directly.
pub trait CascadeTarget {
    /// Remove everything that references `id`
    fn cascade_removed(&mut self, id: Uuid);
}

impl<T: CascadeTarget> RemovalListener for RefCell<T> {
    fn notify_removed(&self, id: Uuid) {
        self.borrow_mut().cascade_removed(id);
    }
}

impl<L: RemovalListener + ?Sized> RemovalListener for Weak<L> {
    fn notify_removed(&self, id: Uuid) {
        if let Some(listener) = self.upgrade() {
            listener.notify_removed(id);
        }
    }
}

impl<L: RemovalListener + ?Sized> RemovalListener for Rc<L> {
    fn notify_removed(&self, id: Uuid) {
        (**self).notify_removed(id);
    }
}

/// Fans one notification out to several listeners, in registration order.
///
/// A store owns a single listener slot; when more than one downstream store
/// depends on it, the assembly code registers a chain.
#[derive(Default)]
pub struct ListenerChain {
    listeners: Vec<Box<dyn RemovalListener>>,
}

impl ListenerChain {
    /// Create an empty chain
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a listener
    pub fn with(mut self, listener: impl RemovalListener + 'static) -> Self {
        self.listeners.push(Box::new(listener));
        self
    }

    /// Number of registered listeners
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Check if the chain has no listeners
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl RemovalListener for ListenerChain {
    fn notify_removed(&self, id: Uuid) {
        for listener in &self.listeners {
            listener.notify_removed(id);
        }
    }
}

impl std::fmt::Debug for ListenerChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerChain")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        seen: RefCell<Vec<Uuid>>,
    }

    impl RemovalListener for Recorder {
        fn notify_removed(&self, id: Uuid) {
            self.seen.borrow_mut().push(id);
        }
    }

    #[test]
    fn test_chain_notifies_in_order() {
        let first = Rc::new(Recorder::default());
        let second = Rc::new(Recorder::default());
        let chain = ListenerChain::new()
            .with(Rc::clone(&first))
            .with(Rc::clone(&second));
        assert_eq!(chain.len(), 2);

        let id = Uuid::new_v4();
        chain.notify_removed(id);

        assert_eq!(*first.seen.borrow(), vec![id]);
        assert_eq!(*second.seen.borrow(), vec![id]);
    }

    #[test]
    fn test_weak_listener_is_silent_after_drop() {
        let recorder = Rc::new(Recorder::default());
        let weak = Rc::downgrade(&recorder);
        let chain = ListenerChain::new().with(weak);

        chain.notify_removed(Uuid::new_v4());
        assert_eq!(recorder.seen.borrow().len(), 1);

        drop(recorder);
        // Must not panic once the target is gone
        chain.notify_removed(Uuid::new_v4());
    }

    #[derive(Default)]
    struct Owned {
        ids: Vec<Uuid>,
    }

    impl CascadeTarget for Owned {
        fn cascade_removed(&mut self, id: Uuid) {
            self.ids.retain(|x| *x != id);
        }
    }

    #[test]
    fn test_refcell_cascade_target() {
        let keep = Uuid::new_v4();
        let gone = Uuid::new_v4();
        let store = Rc::new(RefCell::new(Owned {
            ids: vec![keep, gone],
        }));
        let chain = ListenerChain::new().with(Rc::downgrade(&store));

        chain.notify_removed(gone);
        assert_eq!(store.borrow().ids, vec![keep]);
    }

    #[test]
    fn test_empty_chain() {
        let chain = ListenerChain::new();
        assert!(chain.is_empty());
        chain.notify_removed(Uuid::new_v4());
    }
}
