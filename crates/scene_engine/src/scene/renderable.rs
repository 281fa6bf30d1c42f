//! Draw contract for objects attached to scene nodes

use crate::render::backend::GeometryHandle;
use crate::render::context::RenderContext;
use crate::render::render_pass::{LayerMask, SfxPass};

/// Queue id for opaque geometry
pub const QUEUE_OPAQUE: i16 = 0;

/// Queue id for transparent geometry, drawn after opaque
pub const QUEUE_TRANSPARENT: i16 = 1024;

/// Something the frame orchestrator can draw
///
/// Renderables are shared (`Rc`) between the scene graph and the per-frame
/// render queue. Implementations that need per-draw mutation use interior
/// mutability.
pub trait Renderable {
    /// Sort key; lower ids draw first
    fn queue_id(&self) -> i16 {
        QUEUE_OPAQUE
    }

    /// Layers this renderable belongs to
    fn layer_mask(&self) -> LayerMask {
        LayerMask::LAYER_0
    }

    /// Prepare for a draw in the given pass, typically selecting an effect
    fn pre_render(&self, _frame_time: f64, _pass_index: u32, _ctx: &mut RenderContext<'_>) {}

    /// Issue draw calls; the model matrix has already been uploaded
    fn draw(&self, frame_time: f64, pass_index: u32, ctx: &mut RenderContext<'_>);
}

/// A list of geometry chunks drawn with one effect
///
/// Each chunk names its material. In shadow-map passes the shadow-map effect
/// is selected instead of the regular one when present.
#[derive(Debug, Clone)]
pub struct MeshRenderable {
    queue_id: i16,
    layer_mask: LayerMask,
    effect: String,
    shadowmap_effect: Option<String>,
    chunks: Vec<(GeometryHandle, String)>,
}

impl MeshRenderable {
    /// Create an opaque renderable on layer 0 using `effect`
    pub fn new(effect: impl Into<String>) -> Self {
        Self {
            queue_id: QUEUE_OPAQUE,
            layer_mask: LayerMask::LAYER_0,
            effect: effect.into(),
            shadowmap_effect: None,
            chunks: Vec::new(),
        }
    }

    /// Set the queue id (builder pattern)
    pub fn with_queue_id(mut self, queue_id: i16) -> Self {
        self.queue_id = queue_id;
        self
    }

    /// Set the layer mask (builder pattern)
    pub fn with_layers(mut self, layer_mask: LayerMask) -> Self {
        self.layer_mask = layer_mask;
        self
    }

    /// Set the effect used in shadow-map passes (builder pattern)
    pub fn with_shadowmap_effect(mut self, effect: impl Into<String>) -> Self {
        self.shadowmap_effect = Some(effect.into());
        self
    }

    /// Add a geometry chunk drawn with `material` (builder pattern)
    pub fn with_chunk(mut self, geometry: GeometryHandle, material: impl Into<String>) -> Self {
        self.chunks.push((geometry, material.into()));
        self
    }

    /// Number of geometry chunks
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }
}

impl Renderable for MeshRenderable {
    fn queue_id(&self) -> i16 {
        self.queue_id
    }

    fn layer_mask(&self) -> LayerMask {
        self.layer_mask
    }

    fn pre_render(&self, _frame_time: f64, _pass_index: u32, ctx: &mut RenderContext<'_>) {
        let effect = match (ctx.pass_sfx(), &self.shadowmap_effect) {
            (SfxPass::ShadowMap, Some(shadowmap)) => shadowmap.as_str(),
            _ => self.effect.as_str(),
        };
        ctx.change_effect(effect, false);
    }

    fn draw(&self, _frame_time: f64, _pass_index: u32, ctx: &mut RenderContext<'_>) {
        for (geometry, material) in &self.chunks {
            ctx.draw_geometry(*geometry, material);
        }
    }
}
