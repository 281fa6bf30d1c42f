//! Multi-pass frame orchestration
//!
//! [`FrameOrchestrator::render`] runs one frame: entity pre-render hooks,
//! light uniform refresh, a single render queue build, then the configured
//! passes in order. Each pass resolves its overrides, clears, and draws the
//! queue entries whose layer mask intersects its own.
//!
//! Effect, camera and render target overrides lock their axis for the
//! duration of the pass, so renderables asking for a different effect or
//! camera are ignored. Camera and render target overrides are sticky: the
//! binding active before a run of overriding passes is remembered on the
//! first pass of the run and restored once a pass without that override
//! comes along, or at the end of the frame. The material override is
//! last-writer-wins and never sticky.
//!
//! When a frame returns, every lock is free and no restore is outstanding.

use log::{debug, trace};

use crate::entity::EntityManager;
use crate::events::FrameSignals;
use crate::render::context::{Binding, OverrideLock, RenderContext, RenderTargetBinding, StickyRestore};
use crate::render::render_pass::RenderPass;
use crate::render::resources::CameraId;
use crate::scene::{RenderQueue, SceneGraph};

/// Counters from one rendered frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Passes executed
    pub passes: usize,
    /// Entries in the render queue
    pub queued: usize,
    /// Renderable draws issued across all passes
    pub drawn: usize,
}

/// Sticky restore state of one frame
#[derive(Default)]
struct PendingRestores {
    camera: StickyRestore<Binding<CameraId>>,
    render_target: StickyRestore<RenderTargetBinding>,
}

/// Owns the pass list and drives the pass loop
#[derive(Debug, Clone, Default)]
pub struct FrameOrchestrator {
    passes: Vec<RenderPass>,
    frames_rendered: u64,
}

impl FrameOrchestrator {
    /// Create an orchestrator with an initial pass list
    pub fn new(passes: Vec<RenderPass>) -> Self {
        Self {
            passes,
            frames_rendered: 0,
        }
    }

    /// Configured passes in execution order
    pub fn passes(&self) -> &[RenderPass] {
        &self.passes
    }

    /// Mutable pass list, e.g. to insert a shadow-map pass before the main one
    pub fn passes_mut(&mut self) -> &mut Vec<RenderPass> {
        &mut self.passes
    }

    /// Number of frames rendered so far
    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Render one frame
    pub fn render(
        &mut self,
        frame_time: f64,
        scene: &SceneGraph,
        entities: &mut EntityManager,
        signals: &mut FrameSignals,
        ctx: &mut RenderContext<'_>,
    ) -> FrameStats {
        entities.pre_render_all();

        scene.traverse(scene.root(), |_, node| {
            for light in node.lights() {
                light.update_uniforms(ctx.uniforms());
            }
        });

        // The first pass must re-apply its effect and camera unconditionally
        ctx.bindings_mut().forget_names();
        if ctx.bindings().camera().handle().is_some() {
            ctx.activate_current_camera();
        } else {
            ctx.upload_builtin_uniforms();
        }

        let queue = RenderQueue::build(scene, scene.root());
        let mut restores = PendingRestores::default();
        let mut stats = FrameStats {
            passes: self.passes.len(),
            queued: queue.len(),
            drawn: 0,
        };

        for (index, pass) in self.passes.iter().enumerate() {
            let pass_index = u32::try_from(index).unwrap_or(u32::MAX);
            signals.pass_begin.emit(pass_index);
            debug!("Render pass {} ({:?})", pass_index, pass.sfx);

            ctx.bindings_mut().set_pass_sfx(pass.sfx);
            Self::resolve_overrides(pass, ctx, &mut restores);

            if !pass.clear_flags.is_empty() {
                ctx.device().clear(pass.clear_flags);
            }

            for entry in &queue {
                if !pass.accepts(entry.renderable.layer_mask()) {
                    continue;
                }
                entry.renderable.pre_render(frame_time, pass_index, ctx);
                ctx.upload_model_matrix(&entry.model);
                entry.renderable.draw(frame_time, pass_index, ctx);
                stats.drawn += 1;
            }
            trace!("Render pass {} finished", pass_index);

            signals.pass_end.emit(pass_index);
        }

        *ctx.bindings_mut().locks_mut() = Default::default();
        Self::restore_render_target(ctx, &mut restores.render_target);
        Self::restore_camera(ctx, &mut restores.camera);

        entities.post_render_all();
        self.frames_rendered += 1;
        stats
    }

    fn resolve_overrides(pass: &RenderPass, ctx: &mut RenderContext<'_>, restores: &mut PendingRestores) {
        if pass.override_effect.is_empty() {
            ctx.bindings_mut().locks_mut().effect = OverrideLock::Free;
        } else {
            ctx.bindings_mut().locks_mut().effect = OverrideLock::Free;
            ctx.change_effect(&pass.override_effect, false);
            ctx.bindings_mut().locks_mut().effect = OverrideLock::Locked;
        }

        if pass.override_camera.is_empty() {
            ctx.bindings_mut().locks_mut().camera = OverrideLock::Free;
            Self::restore_camera(ctx, &mut restores.camera);
        } else {
            if !restores.camera.is_pending() {
                let snapshot = ctx.bindings().camera_snapshot(ctx.resources());
                restores.camera = StickyRestore::Pending(snapshot);
            }
            ctx.bindings_mut().locks_mut().camera = OverrideLock::Free;
            ctx.change_camera(&pass.override_camera, false);
            ctx.bindings_mut().locks_mut().camera = OverrideLock::Locked;
        }

        if pass.override_render_target.is_empty() {
            ctx.bindings_mut().locks_mut().render_target = OverrideLock::Free;
            Self::restore_render_target(ctx, &mut restores.render_target);
        } else {
            if !restores.render_target.is_pending() {
                let snapshot = ctx.bindings().render_target_snapshot(ctx.resources());
                restores.render_target = StickyRestore::Pending(snapshot);
            }
            ctx.bindings_mut().locks_mut().render_target = OverrideLock::Free;
            ctx.set_framebuffer(&pass.override_render_target, false, 0);
            ctx.bindings_mut().locks_mut().render_target = OverrideLock::Locked;
        }

        let material = (!pass.override_material.is_empty()).then(|| pass.override_material.clone());
        ctx.bindings_mut().set_override_material(material);
    }

    fn restore_camera(ctx: &mut RenderContext<'_>, restore: &mut StickyRestore<Binding<CameraId>>) {
        let Some(saved) = restore.take() else {
            return;
        };
        if saved.handle().is_some() {
            ctx.bind_camera(saved);
        } else {
            debug!("No camera was active before the override run, nothing to restore");
        }
    }

    fn restore_render_target(ctx: &mut RenderContext<'_>, restore: &mut StickyRestore<RenderTargetBinding>) {
        let Some(saved) = restore.take() else {
            return;
        };
        if saved.framebuffer.handle().is_some() {
            ctx.bind_framebuffer(saved.framebuffer, saved.viewport);
        } else {
            debug!("No render target was bound before the override run, nothing to restore");
        }
    }
}
