//! Typed back-reference from a long-lived resource to its backend object
//!
//! Each loadable resource owns exactly one slot. The slot is filled by the
//! command processor when it executes the resource's Load command and emptied
//! when it executes the matching Unload, both on the render thread. Every other
//! thread only ever observes the slot.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

/// Process-unique identity of a render resource.
///
/// Used for sort keys and load tracking; identities are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceId(u64);

impl ResourceId {
    /// Allocate the next identity
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Optional backend handle owned by a resource
#[derive(Debug)]
pub struct BackendSlot<H: Copy> {
    handle: Mutex<Option<H>>,
}

impl<H: Copy> BackendSlot<H> {
    /// Create an empty slot
    pub fn new() -> Self {
        Self {
            handle: Mutex::new(None),
        }
    }

    /// Current backend handle, if the resource is loaded
    pub fn get(&self) -> Option<H> {
        *self.handle.lock()
    }

    /// Whether a backend object is attached
    pub fn is_loaded(&self) -> bool {
        self.handle.lock().is_some()
    }

    /// Attach the backend object created by a Load command.
    ///
    /// # Panics
    /// Loading an already-loaded resource means the command stream emitted two
    /// Loads without an Unload in between.
    pub(crate) fn attach(&self, handle: H) {
        let mut slot = self.handle.lock();
        assert!(slot.is_none(), "Resource loaded twice without an unload in between");
        *slot = Some(handle);
    }

    /// Detach the backend object for an Unload command
    pub(crate) fn detach(&self) -> Option<H> {
        self.handle.lock().take()
    }
}

impl<H: Copy> Default for BackendSlot<H> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_ids_are_unique_and_increasing() {
        let a = ResourceId::next();
        let b = ResourceId::next();
        assert!(b > a);
    }

    #[test]
    fn test_slot_attach_detach() {
        let slot: BackendSlot<u64> = BackendSlot::new();
        assert!(!slot.is_loaded());

        slot.attach(42);
        assert_eq!(slot.get(), Some(42));

        assert_eq!(slot.detach(), Some(42));
        assert_eq!(slot.get(), None);
        assert_eq!(slot.detach(), None);
    }

    #[test]
    #[should_panic(expected = "loaded twice")]
    fn test_slot_double_attach_panics() {
        let slot: BackendSlot<u64> = BackendSlot::new();
        slot.attach(1);
        slot.attach(2);
    }
}
