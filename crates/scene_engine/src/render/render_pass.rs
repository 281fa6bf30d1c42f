//! Render pass description
//!
//! A [`RenderPass`] is a plain declarative record: which layers take part,
//! which buffers are cleared first, and which effect, camera, render target
//! or material the pass forces for its duration. The frame orchestrator walks
//! the pass list in order once per frame.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::config::ResourceNames;

/// Default depth-only effect name, see [`ResourceNames::depth_effect`]
pub const DEPTH_EFFECT: &str = "engine:effect:depthmap";

/// Default shadow-map effect name, see [`ResourceNames::shadowmap_effect`]
pub const SHADOWMAP_EFFECT: &str = "engine:effect:shadowmap";

/// Default shadow-map render target name, see [`ResourceNames::shadowmap_target`]
pub const SHADOWMAP_TARGET: &str = "engine:rt:shadowmap";

bitflags! {
    /// Layer membership shared by renderables and passes
    ///
    /// A renderable is drawn in a pass only when the two masks intersect.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct LayerMask: u32 {
        /// Layer 0
        const LAYER_0 = 1 << 0;
        /// Layer 1
        const LAYER_1 = 1 << 1;
        /// Layer 2
        const LAYER_2 = 1 << 2;
        /// Layer 3
        const LAYER_3 = 1 << 3;
        /// Layer 4
        const LAYER_4 = 1 << 4;
        /// Layer 5
        const LAYER_5 = 1 << 5;
        /// Layer 6
        const LAYER_6 = 1 << 6;
        /// Layer 7
        const LAYER_7 = 1 << 7;
        /// Layer 8
        const LAYER_8 = 1 << 8;
        /// Layer 9
        const LAYER_9 = 1 << 9;
        /// Layer 10
        const LAYER_10 = 1 << 10;
        /// Layer 11
        const LAYER_11 = 1 << 11;
        /// Layer 12
        const LAYER_12 = 1 << 12;
        /// Layer 13
        const LAYER_13 = 1 << 13;
        /// Layer 14
        const LAYER_14 = 1 << 14;
        /// Layer 15
        const LAYER_15 = 1 << 15;
        /// Objects that cast shadows
        const CAST_SHADOW = 1 << 16;
        /// Every regular layer; does not include [`LayerMask::CAST_SHADOW`]
        const ALL = 0xFFFF;
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        Self::ALL
    }
}

bitflags! {
    /// Buffers cleared at the start of a pass
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ClearFlags: u32 {
        /// Depth buffer
        const DEPTH = 0x1;
        /// Color buffer
        const COLOR = 0x2;
        /// Depth and color
        const ALL = Self::DEPTH.bits() | Self::COLOR.bits();
    }
}

impl Default for ClearFlags {
    fn default() -> Self {
        Self::ALL
    }
}

/// Special-effect kind of a pass
///
/// Informative only; the orchestrator does not branch on it, but renderables
/// and effects may.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SfxPass {
    /// Regular shading
    #[default]
    None,
    /// Depth-only rendering
    Depth,
    /// Shadow-map generation
    ShadowMap,
    /// High dynamic range rendering
    Hdr,
}

/// One configured iteration of the draw loop
///
/// Override fields hold resource names; an empty string means the pass
/// inherits whatever is currently active.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderPass {
    /// Layers drawn by this pass
    pub layer_mask: LayerMask,
    /// Special-effect kind
    pub sfx: SfxPass,
    /// Buffers cleared before drawing
    pub clear_flags: ClearFlags,
    /// Effect forced for the whole pass
    pub override_effect: String,
    /// Camera forced for the whole pass
    pub override_camera: String,
    /// Framebuffer forced for the whole pass
    pub override_render_target: String,
    /// Material forced for every draw in the pass
    pub override_material: String,
}

impl RenderPass {
    /// Create a pass drawing every layer and clearing both buffers
    pub fn new() -> Self {
        Self::default()
    }

    /// Depth-only pass into `render_target` drawing layer 0 with `names.depth_effect`
    pub fn depth_pass(names: &ResourceNames, render_target: impl Into<String>) -> Self {
        Self {
            layer_mask: LayerMask::LAYER_0,
            sfx: SfxPass::Depth,
            override_effect: names.depth_effect.clone(),
            override_render_target: render_target.into(),
            ..Self::default()
        }
    }

    /// Shadow-map pass drawing the shadow casters
    ///
    /// Renders with `names.shadowmap_effect` into `names.shadowmap_target`.
    pub fn shadowmap_pass(names: &ResourceNames) -> Self {
        Self {
            layer_mask: LayerMask::CAST_SHADOW,
            sfx: SfxPass::ShadowMap,
            override_effect: names.shadowmap_effect.clone(),
            override_render_target: names.shadowmap_target.clone(),
            ..Self::default()
        }
    }

    /// Set the layer mask (builder pattern)
    pub fn with_layers(mut self, layer_mask: LayerMask) -> Self {
        self.layer_mask = layer_mask;
        self
    }

    /// Set the clear flags (builder pattern)
    pub fn with_clear(mut self, clear_flags: ClearFlags) -> Self {
        self.clear_flags = clear_flags;
        self
    }

    /// Set the effect override (builder pattern)
    pub fn with_effect(mut self, name: impl Into<String>) -> Self {
        self.override_effect = name.into();
        self
    }

    /// Set the camera override (builder pattern)
    pub fn with_camera(mut self, name: impl Into<String>) -> Self {
        self.override_camera = name.into();
        self
    }

    /// Set the render target override (builder pattern)
    pub fn with_render_target(mut self, name: impl Into<String>) -> Self {
        self.override_render_target = name.into();
        self
    }

    /// Set the material override (builder pattern)
    pub fn with_material(mut self, name: impl Into<String>) -> Self {
        self.override_material = name.into();
        self
    }

    /// Whether a renderable with `mask` takes part in this pass
    pub fn accepts(&self, mask: LayerMask) -> bool {
        self.layer_mask.intersects(mask)
    }
}
