//! Active bindings and the context handed to renderables
//!
//! [`ActiveBindings`] records which effect, camera, framebuffer and viewport
//! are current, together with the per-axis override locks. A
//! [`RenderContext`] borrows the bindings, the resources, the state manager
//! and the device for the duration of a call and offers the "change X"
//! entry points. Every entry point consults the matching lock and silently
//! does nothing while a pass override holds it.

use log::{debug, error, trace, warn};

use crate::config::ResourceNames;
use crate::foundation::math::Mat4;
use crate::render::backend::{GeometryHandle, GraphicsDevice};
use crate::render::render_pass::SfxPass;
use crate::render::render_state::RenderState;
use crate::render::render_state_manager::RenderStateManager;
use crate::render::resources::{CameraId, EffectId, FramebufferId, ResourceManager};
use crate::render::uniforms::BuiltinUniforms;

/// Name and handle of the resource bound on one axis
///
/// The name is the one the resource was requested by; it is cleared at the
/// start of every frame so the first request re-applies unconditionally,
/// while the handle keeps pointing at what is actually bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding<K> {
    name: String,
    handle: Option<K>,
}

impl<K> Default for Binding<K> {
    fn default() -> Self {
        Self {
            name: String::new(),
            handle: None,
        }
    }
}

impl<K: Copy> Binding<K> {
    fn bound(name: impl Into<String>, handle: K) -> Self {
        Self {
            name: name.into(),
            handle: Some(handle),
        }
    }

    /// Requested name, empty if unknown
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bound handle
    pub fn handle(&self) -> Option<K> {
        self.handle
    }

    fn forget_name(&mut self) {
        self.name.clear();
    }
}

/// Cooperative guard on one override axis
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum OverrideLock {
    /// Changes are applied
    #[default]
    Free,
    /// A pass override owns the axis; changes are ignored
    Locked,
}

impl OverrideLock {
    /// Whether the axis is held by an override
    pub fn is_locked(self) -> bool {
        self == Self::Locked
    }
}

/// Lock state of the three lockable axes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct OverrideLocks {
    /// Effect axis
    pub effect: OverrideLock,
    /// Camera axis
    pub camera: OverrideLock,
    /// Render target axis
    pub render_target: OverrideLock,
}

impl OverrideLocks {
    /// Whether no axis is locked
    pub fn all_free(&self) -> bool {
        *self == Self::default()
    }
}

/// Binding remembered across a run of overriding passes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StickyRestore<S> {
    /// Nothing to restore
    #[default]
    Idle,
    /// Restore this binding once the run of overriding passes ends
    Pending(S),
}

impl<S> StickyRestore<S> {
    /// Whether a restore is outstanding
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    /// Take the remembered binding, leaving [`StickyRestore::Idle`]
    pub fn take(&mut self) -> Option<S> {
        match std::mem::take(self) {
            Self::Pending(saved) => Some(saved),
            Self::Idle => None,
        }
    }
}

/// Framebuffer binding together with its viewport index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderTargetBinding {
    /// Bound framebuffer
    pub framebuffer: Binding<FramebufferId>,
    /// Viewport index within the framebuffer
    pub viewport: usize,
}

/// Current bindings and override state
#[derive(Debug, Clone, Default)]
pub struct ActiveBindings {
    effect: Binding<EffectId>,
    camera: Binding<CameraId>,
    framebuffer: Binding<FramebufferId>,
    viewport: usize,
    locks: OverrideLocks,
    override_material: Option<String>,
    pass_sfx: SfxPass,
    names: ResourceNames,
}

impl ActiveBindings {
    /// Create empty bindings using `names` for the fallback resources
    pub fn new(names: ResourceNames) -> Self {
        Self {
            names,
            ..Self::default()
        }
    }

    /// Current effect
    pub fn effect(&self) -> &Binding<EffectId> {
        &self.effect
    }

    /// Current camera
    pub fn camera(&self) -> &Binding<CameraId> {
        &self.camera
    }

    /// Current framebuffer
    pub fn framebuffer(&self) -> &Binding<FramebufferId> {
        &self.framebuffer
    }

    /// Current viewport index within the framebuffer
    pub fn viewport(&self) -> usize {
        self.viewport
    }

    /// Override lock state
    pub fn locks(&self) -> OverrideLocks {
        self.locks
    }

    /// Material forced by the current pass
    pub fn override_material(&self) -> Option<&str> {
        self.override_material.as_deref()
    }

    /// Fallback resource names
    pub fn names(&self) -> &ResourceNames {
        &self.names
    }

    pub(crate) fn locks_mut(&mut self) -> &mut OverrideLocks {
        &mut self.locks
    }

    pub(crate) fn set_override_material(&mut self, material: Option<String>) {
        self.override_material = material;
    }

    pub(crate) fn set_pass_sfx(&mut self, sfx: SfxPass) {
        self.pass_sfx = sfx;
    }

    /// Forget the effect and camera names so the next request re-applies
    pub(crate) fn forget_names(&mut self) {
        self.effect.forget_name();
        self.camera.forget_name();
    }

    /// Camera binding to restore after an override run
    ///
    /// The name falls back to the alphabetically first registered alias of
    /// the bound camera when the requested name is unknown.
    pub(crate) fn camera_snapshot(&self, resources: &ResourceManager) -> Binding<CameraId> {
        let mut snapshot = self.camera.clone();
        if snapshot.name.is_empty() {
            if let Some(name) = snapshot.handle.and_then(|handle| resources.cameras.query_name(handle)) {
                snapshot.name = name.to_string();
            }
        }
        snapshot
    }

    /// Render target binding to restore after an override run
    pub(crate) fn render_target_snapshot(&self, resources: &ResourceManager) -> RenderTargetBinding {
        let mut snapshot = self.framebuffer.clone();
        if snapshot.name.is_empty() {
            if let Some(name) = snapshot.handle.and_then(|handle| resources.framebuffers.query_name(handle)) {
                snapshot.name = name.to_string();
            }
        }
        RenderTargetBinding {
            framebuffer: snapshot,
            viewport: self.viewport,
        }
    }

    /// Drop every binding, keeping the fallback names
    pub(crate) fn reset(&mut self) {
        *self = Self::new(std::mem::take(&mut self.names));
    }
}

/// Borrowed view of everything needed to change bindings and draw
pub struct RenderContext<'a> {
    device: &'a mut dyn GraphicsDevice,
    states: &'a mut RenderStateManager,
    resources: &'a mut ResourceManager,
    bindings: &'a mut ActiveBindings,
    uniforms: &'a mut BuiltinUniforms,
}

impl<'a> RenderContext<'a> {
    /// Bundle the borrowed parts
    pub fn new(
        device: &'a mut dyn GraphicsDevice,
        states: &'a mut RenderStateManager,
        resources: &'a mut ResourceManager,
        bindings: &'a mut ActiveBindings,
        uniforms: &'a mut BuiltinUniforms,
    ) -> Self {
        Self {
            device,
            states,
            resources,
            bindings,
            uniforms,
        }
    }

    /// The graphics device
    pub fn device(&mut self) -> &mut dyn GraphicsDevice {
        &mut *self.device
    }

    /// Current bindings
    pub fn bindings(&self) -> &ActiveBindings {
        &*self.bindings
    }

    /// Registered resources
    pub fn resources(&self) -> &ResourceManager {
        &*self.resources
    }

    /// Builtin uniform block
    pub fn uniforms(&mut self) -> &mut BuiltinUniforms {
        &mut *self.uniforms
    }

    /// Pipeline state manager
    pub fn states(&self) -> &RenderStateManager {
        &*self.states
    }

    /// Special-effect kind of the pass being drawn
    pub fn pass_sfx(&self) -> SfxPass {
        self.bindings.pass_sfx
    }

    /// Apply a pipeline state through the diffing cache
    pub fn apply_state(&mut self, state: RenderState) {
        state.apply(self.states, &mut *self.device, false);
    }

    /// Save the pipeline state
    pub fn push_state(&mut self) {
        self.states.push_state();
    }

    /// Restore the last saved pipeline state
    pub fn pop_state(&mut self) -> bool {
        self.states.pop_state(&mut *self.device)
    }

    pub(crate) fn bindings_mut(&mut self) -> &mut ActiveBindings {
        &mut *self.bindings
    }

    /// Make an effect current
    ///
    /// An empty or unknown name selects the fallback effect. Nothing happens
    /// while the effect axis is locked, or when the resolved effect is already
    /// current under the same name and `force` is false. Returns whether an
    /// effect was bound.
    pub fn change_effect(&mut self, name: &str, force: bool) -> bool {
        if self.bindings.locks.effect.is_locked() {
            trace!("Effect '{}' ignored: effect is locked by a pass override", name);
            return false;
        }
        let fallback = self.bindings.names.fallback_effect.clone();
        let requested = if name.is_empty() { fallback.as_str() } else { name };

        let (resolved, handle) = match self.resources.effects.find(requested) {
            Some(handle) => (requested, handle),
            None => {
                if requested != fallback {
                    warn!("Effect '{}' not found, using '{}'", requested, fallback);
                }
                match self.resources.effects.find(&fallback) {
                    Some(handle) => (fallback.as_str(), handle),
                    None => {
                        error!("Fallback effect '{}' is not registered", fallback);
                        return false;
                    }
                }
            }
        };
        if !force && self.bindings.effect.name == resolved && self.bindings.effect.handle == Some(handle) {
            return false;
        }
        let Some(effect) = self.resources.effects.get(handle) else {
            return false;
        };

        for state in &effect.render_states {
            state.apply(self.states, &mut *self.device, false);
        }
        self.device.bind_program(effect.program);
        self.bindings.effect = Binding::bound(resolved, handle);
        debug!("Effect changed to '{}'", resolved);

        // The new program needs the camera uniforms too
        if let Some(camera) = self.bindings.camera.handle.and_then(|id| self.resources.cameras.get(id)) {
            camera.activate(self.uniforms, &mut *self.device);
        }
        true
    }

    /// Make a camera current
    ///
    /// Nothing happens while the camera axis is locked, for an empty name,
    /// or when `name` still resolves to the bound camera and `force` is
    /// false. An unknown name leaves the previous camera active.
    pub fn change_camera(&mut self, name: &str, force: bool) -> bool {
        if self.bindings.locks.camera.is_locked() {
            trace!("Camera '{}' ignored: camera is locked by a pass override", name);
            return false;
        }
        if name.is_empty() {
            return false;
        }
        let Some(handle) = self.resources.cameras.find(name) else {
            warn!("Camera '{}' not found, keeping the active camera", name);
            return false;
        };
        // A re-registered name resolves to a new handle and must rebind
        if !force && self.bindings.camera.name == name && self.bindings.camera.handle == Some(handle) {
            return false;
        }
        self.bind_camera(Binding::bound(name, handle))
    }

    /// Make a framebuffer current and select one of its viewports
    ///
    /// Same locking and naming rules as [`change_camera`](Self::change_camera).
    pub fn set_framebuffer(&mut self, name: &str, force: bool, viewport: usize) -> bool {
        if self.bindings.locks.render_target.is_locked() {
            trace!("Render target '{}' ignored: render target is locked by a pass override", name);
            return false;
        }
        if name.is_empty() {
            return false;
        }
        let Some(handle) = self.resources.framebuffers.find(name) else {
            warn!("Framebuffer '{}' not found, keeping the active render target", name);
            return false;
        };
        if !force && self.bindings.framebuffer.name == name && self.bindings.framebuffer.handle == Some(handle) {
            return false;
        }
        self.bind_framebuffer(Binding::bound(name, handle), viewport)
    }

    /// Select a viewport of the current framebuffer
    ///
    /// The current camera adapts its projection to the new viewport. An
    /// out-of-range index is ignored.
    pub fn set_viewport(&mut self, index: usize) -> bool {
        let Some(framebuffer) = self
            .bindings
            .framebuffer
            .handle
            .and_then(|id| self.resources.framebuffers.get(id))
        else {
            warn!("set_viewport({}) without a bound framebuffer", index);
            return false;
        };
        let Some(viewport) = framebuffer.viewport(index) else {
            warn!(
                "Viewport {} out of range, framebuffer has {}",
                index,
                framebuffer.viewport_count()
            );
            return false;
        };

        viewport.activate(self.uniforms, &mut *self.device);
        let (width, height) = (viewport.width(), viewport.height());
        self.bindings.viewport = index;

        if let Some(camera) = self.bindings.camera.handle.and_then(|id| self.resources.cameras.get_mut(id)) {
            camera.on_size(width, height);
            camera.activate(self.uniforms, &mut *self.device);
        }
        true
    }

    /// Upload a model matrix for the next draw
    pub fn upload_model_matrix(&mut self, model: &Mat4) {
        self.device.upload_model_matrix(model);
    }

    /// Upload a material and draw geometry with it
    ///
    /// A pass material override wins over `material`; an unknown material
    /// falls back to the fallback material. Returns false, without drawing,
    /// when not even the fallback exists.
    pub fn draw_geometry(&mut self, geometry: GeometryHandle, material: &str) -> bool {
        let requested = self.bindings.override_material.as_deref().unwrap_or(material);
        let fallback = self.bindings.names.fallback_material.as_str();

        let resolved = if self.resources.materials.contains(requested) {
            requested
        } else {
            if !requested.is_empty() {
                warn!("Material '{}' not found, using '{}'", requested, fallback);
            }
            fallback
        };
        let Some(params) = self.resources.materials.get_by_name(resolved) else {
            error!("Fallback material '{}' is not registered, skipping draw", fallback);
            return false;
        };

        self.device.upload_material(resolved, params);
        self.device.draw_geometry(geometry);
        true
    }

    /// Upload the builtin uniform block as it stands
    pub(crate) fn upload_builtin_uniforms(&mut self) {
        self.device.upload_builtin_uniforms(&*self.uniforms);
    }

    /// Re-upload the current camera, if any
    pub(crate) fn activate_current_camera(&mut self) {
        if let Some(camera) = self.bindings.camera.handle.and_then(|id| self.resources.cameras.get(id)) {
            camera.activate(self.uniforms, &mut *self.device);
        }
    }

    /// Bind a camera by handle, bypassing lock and name checks
    pub(crate) fn bind_camera(&mut self, binding: Binding<CameraId>) -> bool {
        let Some(handle) = binding.handle else {
            return false;
        };
        let size = self.current_viewport_size();
        let Some(camera) = self.resources.cameras.get_mut(handle) else {
            warn!("Camera '{}' was released", binding.name);
            return false;
        };
        if let Some((width, height)) = size {
            camera.on_size(width, height);
        }
        camera.activate(self.uniforms, &mut *self.device);
        debug!("Camera changed to '{}'", binding.name);
        self.bindings.camera = binding;
        true
    }

    /// Bind a framebuffer by handle, bypassing lock and name checks
    pub(crate) fn bind_framebuffer(&mut self, binding: Binding<FramebufferId>, viewport: usize) -> bool {
        let Some(handle) = binding.handle else {
            return false;
        };
        let Some(framebuffer) = self.resources.framebuffers.get(handle) else {
            warn!("Framebuffer '{}' was released", binding.name);
            return false;
        };
        framebuffer.bind(&mut *self.device);
        debug!("Render target changed to '{}'", binding.name);
        self.bindings.framebuffer = binding;
        self.set_viewport(viewport);
        true
    }

    fn current_viewport_size(&self) -> Option<(u32, u32)> {
        let framebuffer = self.resources.framebuffers.get(self.bindings.framebuffer.handle?)?;
        let viewport = framebuffer.viewport(self.bindings.viewport)?;
        Some((viewport.width(), viewport.height()))
    }
}
