//! One-permit gate around render prep
//!
//! At most one snapshot may be in prep at a time. A caller takes the permit
//! with [`RenderPrepGate::wait_then_start_render_prep`], blocking while
//! another prep is running, and releases it by dropping the returned
//! [`RenderPrepPermit`]. The permit is `Send` so it can be moved into the
//! background task that does the work.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

/// Mutex and condition variable guarding the prep stage
#[derive(Debug, Default)]
pub struct RenderPrepGate {
    in_prep: Mutex<bool>,
    changed: Condvar,
}

impl RenderPrepGate {
    /// Create an open gate
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Block until no prep is running, then take the permit
    pub fn wait_then_start_render_prep(self: &Arc<Self>) -> RenderPrepPermit {
        let mut in_prep = self.in_prep.lock();
        while *in_prep {
            self.changed.wait(&mut in_prep);
        }
        *in_prep = true;

        RenderPrepPermit { gate: Arc::clone(self) }
    }

    /// Take the permit only if no prep is running
    pub fn try_start_render_prep(self: &Arc<Self>) -> Option<RenderPrepPermit> {
        let mut in_prep = self.in_prep.lock();
        if *in_prep {
            return None;
        }
        *in_prep = true;

        Some(RenderPrepPermit { gate: Arc::clone(self) })
    }

    /// Whether a prep is running
    pub fn is_in_prep(&self) -> bool {
        *self.in_prep.lock()
    }

    /// Block until no prep is running without taking the permit
    pub fn wait_until_idle(&self) {
        let mut in_prep = self.in_prep.lock();
        while *in_prep {
            self.changed.wait(&mut in_prep);
        }
    }

    /// Like [`wait_until_idle`](Self::wait_until_idle) with a timeout; returns
    /// whether the gate became idle
    pub fn wait_until_idle_for(&self, timeout: Duration) -> bool {
        let mut in_prep = self.in_prep.lock();
        while *in_prep {
            if self.changed.wait_for(&mut in_prep, timeout).timed_out() {
                return !*in_prep;
            }
        }
        true
    }

    fn end_render_prep(&self) {
        let mut in_prep = self.in_prep.lock();
        debug_assert!(*in_prep, "Render prep ended without being started");
        *in_prep = false;
        self.changed.notify_all();
    }
}

/// Proof that the holder owns the prep stage; dropping it ends prep
#[derive(Debug)]
#[must_use = "dropping the permit immediately ends render prep"]
pub struct RenderPrepPermit {
    gate: Arc<RenderPrepGate>,
}

impl Drop for RenderPrepPermit {
    fn drop(&mut self) {
        self.gate.end_render_prep();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;

    #[test]
    fn test_permit_is_exclusive() {
        let gate = RenderPrepGate::new();
        let permit = gate.wait_then_start_render_prep();
        assert!(gate.is_in_prep());
        assert!(gate.try_start_render_prep().is_none());

        drop(permit);
        assert!(!gate.is_in_prep());
        assert!(gate.try_start_render_prep().is_some());
    }

    #[test]
    fn test_second_caller_blocks_until_release() {
        let gate = RenderPrepGate::new();
        let permit = gate.wait_then_start_render_prep();
        let acquired = Arc::new(AtomicBool::new(false));

        let waiter = {
            let gate = gate.clone();
            let acquired = acquired.clone();
            thread::spawn(move || {
                let _permit = gate.wait_then_start_render_prep();
                acquired.store(true, Ordering::SeqCst);
            })
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!acquired.load(Ordering::SeqCst));

        drop(permit);
        waiter.join().unwrap();
        assert!(acquired.load(Ordering::SeqCst));
    }

    #[test]
    fn test_wait_until_idle_times_out_while_held() {
        let gate = RenderPrepGate::new();
        let _permit = gate.wait_then_start_render_prep();
        assert!(!gate.wait_until_idle_for(Duration::from_millis(10)));
    }
}
