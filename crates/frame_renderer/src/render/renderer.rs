//! # Renderer
//!
//! Entry point tying the pipeline stages together.
//!
//! ## Threads
//!
//! - The producer calls [`Renderer::process_render_snapshot`]. It blocks only
//!   while the previous snapshot is still in prep, then hands the snapshot to
//!   a background task and returns.
//! - The prep task compiles passes and commands and pushes the finished
//!   buffer into the ring. It releases the prep permit once the push is done.
//! - The render thread calls [`Renderer::process_render_command_buffer`],
//!   which pops one buffer and replays it through the processor.
//!
//! Backpressure comes from the ring: with two buffers waiting the prep task
//! blocks on the push, which keeps the gate closed, which blocks the producer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::core::config::RendererConfig;
use crate::render::api::GraphicsDevice;
use crate::render::commands::RenderCommandCompiler;
use crate::render::passes::{ForwardRenderPassCompiler, RenderFrame, RenderPassCompiler};
use crate::render::processor::{ProcessorStats, RenderCommandProcessor};
use crate::render::snapshot::RenderSnapshot;
use crate::render::sync::{CommandBufferRing, RenderPrepGate};
use crate::render::{RenderError, RenderResult};

const SHUTDOWN_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// State shared with the prep task
#[derive(Debug)]
struct Shared {
    gate: Arc<RenderPrepGate>,
    ring: CommandBufferRing,
    command_compiler: Mutex<RenderCommandCompiler>,
}

/// Drives snapshots through prep and hands command buffers to the render thread
pub struct Renderer {
    shared: Arc<Shared>,
    pass_compiler: Arc<dyn RenderPassCompiler>,
    pool: rayon::ThreadPool,
    config: RendererConfig,
    next_frame_index: AtomicU64,
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("config", &self.config)
            .field("next_frame_index", &self.next_frame_index)
            .field("queued_buffers", &self.shared.ring.len())
            .finish_non_exhaustive()
    }
}

impl Renderer {
    /// Create a renderer with a custom pass compiler
    ///
    /// # Errors
    /// Fails when the configuration is invalid or the worker pool cannot start.
    pub fn new(config: RendererConfig, pass_compiler: Arc<dyn RenderPassCompiler>) -> RenderResult<Self> {
        config
            .validate()
            .map_err(|e| RenderError::InitializationFailed(format!("Invalid renderer config: {e}")))?;

        let pool = build_thread_pool(config.worker_threads)?;
        log::info!(
            "Renderer created with {} prep worker threads",
            pool.current_num_threads()
        );

        Ok(Self {
            shared: Arc::new(Shared {
                gate: RenderPrepGate::new(),
                ring: CommandBufferRing::new(),
                command_compiler: Mutex::new(RenderCommandCompiler::new()),
            }),
            pass_compiler,
            pool,
            config,
            next_frame_index: AtomicU64::new(0),
        })
    }

    /// Create a renderer using [`ForwardRenderPassCompiler`]
    ///
    /// # Errors
    /// See [`Renderer::new`].
    pub fn with_forward_compiler(config: RendererConfig) -> RenderResult<Self> {
        Self::new(config, Arc::new(ForwardRenderPassCompiler))
    }

    /// Configuration the renderer was built with
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Create a processor for `device` using this renderer's limits
    pub fn create_processor<D: GraphicsDevice>(&self, device: D) -> RenderCommandProcessor<D> {
        RenderCommandProcessor::new(device, &self.config)
    }

    /// Hand a snapshot to the prep stage.
    ///
    /// Blocks while a previous snapshot is still in prep, then schedules the
    /// compile and returns without waiting for it.
    pub fn process_render_snapshot(&self, mut snapshot: RenderSnapshot) {
        let permit = self.shared.gate.wait_then_start_render_prep();
        let frame_index = self.next_frame_index.fetch_add(1, Ordering::Relaxed);

        let shared = Arc::clone(&self.shared);
        let pass_compiler = Arc::clone(&self.pass_compiler);
        let frustum_culling = self.config.enable_frustum_culling;

        self.pool.spawn(move || {
            let frame = RenderFrame::from_snapshot(&mut snapshot, frustum_culling);
            let target_groups = pass_compiler.compile_target_render_pass_groups(&frame);
            log::trace!("Frame {}: {} target groups", frame_index, target_groups.len());

            let dynamic_meshes = snapshot.claim_dynamic_meshes();
            let pre = snapshot.claim_pre_render_command_list();
            let post = snapshot.claim_post_render_command_list();

            let buffer = shared.command_compiler.lock().compile_render_command_buffer(
                frame_index,
                &target_groups,
                dynamic_meshes,
                pre,
                post,
            );
            drop(target_groups);
            drop(frame);

            shared.ring.wait_then_push(buffer);
            drop(permit);
        });
    }

    /// Pop the next command buffer and execute it, blocking until one is ready.
    ///
    /// # Errors
    /// Propagates processor initialisation failures.
    pub fn process_render_command_buffer<D: GraphicsDevice>(
        &self,
        processor: &mut RenderCommandProcessor<D>,
    ) -> RenderResult<ProcessorStats> {
        let buffer = self.shared.ring.wait_then_pop();
        processor.process(&buffer)
    }

    /// Like [`process_render_command_buffer`](Self::process_render_command_buffer)
    /// but returns `Ok(None)` if no buffer arrives within `timeout`
    ///
    /// # Errors
    /// Propagates processor initialisation failures.
    pub fn process_render_command_buffer_timeout<D: GraphicsDevice>(
        &self,
        processor: &mut RenderCommandProcessor<D>,
        timeout: Duration,
    ) -> RenderResult<Option<ProcessorStats>> {
        match self.shared.ring.wait_then_pop_timeout(timeout) {
            Some(buffer) => processor.process(&buffer).map(Some),
            None => Ok(None),
        }
    }

    /// Whether a snapshot is in prep
    pub fn is_preparing(&self) -> bool {
        self.shared.gate.is_in_prep()
    }

    /// Number of compiled buffers waiting for the render thread
    pub fn queued_command_buffers(&self) -> usize {
        self.shared.ring.len()
    }

    /// Block until the prep stage is idle
    pub fn wait_for_idle_prep(&self) {
        self.shared.gate.wait_until_idle();
    }

    /// Execute everything still queued, then unload every resource the
    /// compiler has loaded.
    ///
    /// Call from the render thread once the producer has stopped. A prep task
    /// blocked on a full ring is drained rather than waited on.
    ///
    /// # Errors
    /// Propagates processor initialisation failures.
    pub fn shutdown<D: GraphicsDevice>(&self, processor: &mut RenderCommandProcessor<D>) -> RenderResult<()> {
        loop {
            // Read before popping: an idle gate means every push has landed.
            let preparing = self.shared.gate.is_in_prep();
            match self.shared.ring.wait_then_pop_timeout(SHUTDOWN_POLL_INTERVAL) {
                Some(buffer) => {
                    processor.process(&buffer)?;
                }
                None if !preparing => break,
                None => {}
            }
        }

        let frame_index = self.next_frame_index.fetch_add(1, Ordering::Relaxed);
        let unload_all = self.shared.command_compiler.lock().compile_unload_all(frame_index);
        processor.process(&unload_all)?;
        log::info!("Renderer shut down after {} frames", frame_index);
        Ok(())
    }
}

fn build_thread_pool(threads: Option<usize>) -> RenderResult<rayon::ThreadPool> {
    let mut builder = rayon::ThreadPoolBuilder::new().thread_name(|i| format!("render-prep-{i}"));
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| RenderError::InitializationFailed(format!("Failed to build prep thread pool: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Colour, Resolution};
    use crate::render::backends::RecordingDevice;
    use crate::render::objects::RenderCamera;

    fn empty_snapshot() -> RenderSnapshot {
        RenderSnapshot::new(
            Resolution::new(64, 64),
            Colour::BLACK,
            RenderCamera::from_view_projection(crate::foundation::math::Mat4::identity()),
        )
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = RendererConfig::new().with_max_texture_units(0);
        let result = Renderer::with_forward_compiler(config);
        assert!(matches!(result, Err(RenderError::InitializationFailed(_))));
    }

    #[test]
    fn test_frames_arrive_in_order() {
        let renderer = Renderer::with_forward_compiler(RendererConfig::new().with_worker_threads(1)).unwrap();
        let mut processor = renderer.create_processor(RecordingDevice::new());

        renderer.process_render_snapshot(empty_snapshot());
        renderer.process_render_command_buffer(&mut processor).unwrap();
        renderer.process_render_snapshot(empty_snapshot());
        let stats = renderer.process_render_command_buffer(&mut processor).unwrap();

        // Begin and End of the main target group
        assert_eq!(stats.commands, 2);
        assert!(!renderer.is_preparing());
    }

    #[test]
    fn test_shutdown_drains_prep_blocked_on_full_ring() {
        let renderer = Arc::new(Renderer::with_forward_compiler(RendererConfig::new().with_worker_threads(2)).unwrap());
        let mut processor = renderer.create_processor(RecordingDevice::new());

        // Two buffers fill the ring and the third prep holds the gate while it waits to push.
        for _ in 0..3 {
            renderer.process_render_snapshot(empty_snapshot());
        }
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(renderer.queued_command_buffers(), 2);
        assert!(renderer.is_preparing());

        let (done_tx, done_rx) = std::sync::mpsc::channel();
        let shutdown = {
            let renderer = Arc::clone(&renderer);
            std::thread::spawn(move || {
                let result = renderer.shutdown(&mut processor);
                let _ = done_tx.send(());
                result.map(|()| processor)
            })
        };

        done_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("shutdown did not return with a prep task blocked on the ring");
        let processor = shutdown.join().unwrap().unwrap();

        assert_eq!(renderer.queued_command_buffers(), 0);
        assert!(!renderer.is_preparing());
        // Three frames of Begin/End, then an empty unload-all buffer.
        assert_eq!(processor.last_stats().commands, 0);
        assert_eq!(
            processor
                .device()
                .calls()
                .iter()
                .filter(|call| matches!(call, crate::render::backends::DeviceCall::BindFramebuffer(None)))
                .count(),
            3
        );
    }

    #[test]
    fn test_timeout_without_snapshot() {
        let renderer = Renderer::with_forward_compiler(RendererConfig::new()).unwrap();
        let mut processor = renderer.create_processor(RecordingDevice::new());
        let result = renderer
            .process_render_command_buffer_timeout(&mut processor, Duration::from_millis(10))
            .unwrap();
        assert!(result.is_none());
    }
}
