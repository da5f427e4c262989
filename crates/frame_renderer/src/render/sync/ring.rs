//! Bounded FIFO handing compiled command buffers to the render thread

use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::render::commands::RenderCommandBuffer;

/// Maximum number of compiled buffers waiting for execution
pub const COMMAND_BUFFER_RING_DEPTH: usize = 2;

/// Depth-limited blocking queue between prep and render.
///
/// Buffers come out in the order they went in; nothing is dropped or
/// duplicated.
#[derive(Debug)]
pub struct CommandBufferRing {
    buffers: Mutex<VecDeque<RenderCommandBuffer>>,
    not_full: Condvar,
    not_empty: Condvar,
    capacity: usize,
}

impl CommandBufferRing {
    /// Create a ring of [`COMMAND_BUFFER_RING_DEPTH`]
    pub fn new() -> Self {
        Self::with_capacity(COMMAND_BUFFER_RING_DEPTH)
    }

    /// Create a ring with a custom depth
    ///
    /// # Panics
    /// The depth must be at least one.
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "Command buffer ring needs a depth of at least one");
        Self {
            buffers: Mutex::new(VecDeque::with_capacity(capacity)),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
            capacity,
        }
    }

    /// Block while the ring is full, then enqueue
    pub fn wait_then_push(&self, buffer: RenderCommandBuffer) {
        let mut buffers = self.buffers.lock();
        while buffers.len() >= self.capacity {
            self.not_full.wait(&mut buffers);
        }
        buffers.push_back(buffer);
        self.not_empty.notify_one();
    }

    /// Block while the ring is empty, then dequeue the oldest buffer
    pub fn wait_then_pop(&self) -> RenderCommandBuffer {
        let mut buffers = self.buffers.lock();
        loop {
            if let Some(buffer) = buffers.pop_front() {
                self.not_full.notify_one();
                return buffer;
            }
            self.not_empty.wait(&mut buffers);
        }
    }

    /// Like [`wait_then_pop`](Self::wait_then_pop) but gives up after `timeout`
    pub fn wait_then_pop_timeout(&self, timeout: Duration) -> Option<RenderCommandBuffer> {
        let mut buffers = self.buffers.lock();
        loop {
            if let Some(buffer) = buffers.pop_front() {
                self.not_full.notify_one();
                return Some(buffer);
            }
            if self.not_empty.wait_for(&mut buffers, timeout).timed_out() {
                let buffer = buffers.pop_front();
                if buffer.is_some() {
                    self.not_full.notify_one();
                }
                return buffer;
            }
        }
    }

    /// Number of queued buffers
    pub fn len(&self) -> usize {
        self.buffers.lock().len()
    }

    /// Whether no buffers are queued
    pub fn is_empty(&self) -> bool {
        self.buffers.lock().is_empty()
    }

    /// Maximum number of queued buffers
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for CommandBufferRing {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;

    fn buffer(frame_index: u64) -> RenderCommandBuffer {
        RenderCommandBuffer::new(frame_index, Vec::new(), Vec::new())
    }

    #[test]
    fn test_fifo_order() {
        let ring = CommandBufferRing::new();
        ring.wait_then_push(buffer(1));
        ring.wait_then_push(buffer(2));

        assert_eq!(ring.len(), 2);
        assert_eq!(ring.wait_then_pop().frame_index(), 1);
        assert_eq!(ring.wait_then_pop().frame_index(), 2);
        assert!(ring.is_empty());
    }

    #[test]
    fn test_third_push_blocks_until_pop() {
        let ring = Arc::new(CommandBufferRing::new());
        ring.wait_then_push(buffer(1));
        ring.wait_then_push(buffer(2));

        let pushed = Arc::new(AtomicBool::new(false));
        let producer = {
            let ring = ring.clone();
            let pushed = pushed.clone();
            thread::spawn(move || {
                ring.wait_then_push(buffer(3));
                pushed.store(true, Ordering::SeqCst);
            })
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!pushed.load(Ordering::SeqCst));
        assert_eq!(ring.len(), 2);

        assert_eq!(ring.wait_then_pop().frame_index(), 1);
        producer.join().unwrap();
        assert!(pushed.load(Ordering::SeqCst));

        assert_eq!(ring.wait_then_pop().frame_index(), 2);
        assert_eq!(ring.wait_then_pop().frame_index(), 3);
    }

    #[test]
    fn test_pop_blocks_until_push() {
        let ring = Arc::new(CommandBufferRing::new());
        let consumer = {
            let ring = ring.clone();
            thread::spawn(move || ring.wait_then_pop().frame_index())
        };

        thread::sleep(Duration::from_millis(20));
        ring.wait_then_push(buffer(9));
        assert_eq!(consumer.join().unwrap(), 9);
    }

    #[test]
    fn test_pop_timeout_on_empty_ring() {
        let ring = CommandBufferRing::new();
        assert!(ring.wait_then_pop_timeout(Duration::from_millis(10)).is_none());
    }
}
