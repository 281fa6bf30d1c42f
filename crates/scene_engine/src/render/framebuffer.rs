//! Framebuffers and viewports

use log::warn;

use crate::foundation::math::Vec2;
use crate::render::backend::{FramebufferTarget, GraphicsDevice};
use crate::render::uniforms::BuiltinUniforms;

/// How a viewport's rectangle follows its framebuffer's size
#[derive(Debug, Clone, Copy, PartialEq)]
enum ViewportLayout {
    /// Fractions of the framebuffer size
    Ratio { left: f32, bottom: f32, width: f32, height: f32 },
    /// Fixed pixel rectangle
    Absolute,
}

/// A rectangular region of a framebuffer
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    layout: ViewportLayout,
    left: u32,
    bottom: u32,
    width: u32,
    height: u32,
}

impl Viewport {
    /// Viewport covering the whole framebuffer
    pub fn full() -> Self {
        Self::from_ratios(0.0, 0.0, 1.0, 1.0)
    }

    /// Viewport defined as fractions of the framebuffer size
    pub fn from_ratios(left: f32, bottom: f32, width: f32, height: f32) -> Self {
        Self {
            layout: ViewportLayout::Ratio { left, bottom, width, height },
            left: 0,
            bottom: 0,
            width: 0,
            height: 0,
        }
    }

    /// Viewport with a fixed pixel rectangle
    pub fn absolute(left: u32, bottom: u32, width: u32, height: u32) -> Self {
        Self {
            layout: ViewportLayout::Absolute,
            left,
            bottom,
            width,
            height,
        }
    }

    /// Recompute the pixel rectangle for a framebuffer size
    pub fn on_size(&mut self, fb_width: u32, fb_height: u32) {
        if let ViewportLayout::Ratio { left, bottom, width, height } = self.layout {
            let scale = |ratio: f32, extent: u32| (ratio * extent as f32).round() as u32;
            self.left = scale(left, fb_width);
            self.bottom = scale(bottom, fb_height);
            self.width = scale(width, fb_width);
            self.height = scale(height, fb_height);
        }
    }

    /// Make this viewport current on the device
    pub fn activate<D: GraphicsDevice + ?Sized>(&self, uniforms: &mut BuiltinUniforms, device: &mut D) {
        device.set_viewport(self.left, self.bottom, self.width, self.height);
        uniforms.viewport_size = Vec2::new(self.width as f32, self.height as f32);
    }

    /// Pixel rectangle as `(left, bottom, width, height)`
    pub fn rect(&self) -> (u32, u32, u32, u32) {
        (self.left, self.bottom, self.width, self.height)
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }
}

/// A render target with one or more viewports
#[derive(Debug, Clone, PartialEq)]
pub struct Framebuffer {
    target: FramebufferTarget,
    width: u32,
    height: u32,
    viewports: Vec<Viewport>,
}

impl Framebuffer {
    /// The window surface, with one full-size viewport
    ///
    /// Its size is unknown until the host reports it through
    /// [`set_external_params`](Framebuffer::set_external_params) or a resize.
    pub fn screen() -> Self {
        Self::with_target(FramebufferTarget::Screen { fbo: 0 }, 0, 0)
    }

    /// An offscreen render target with one full-size viewport
    pub fn offscreen(id: u32, width: u32, height: u32) -> Self {
        Self::with_target(FramebufferTarget::Offscreen(id), width, height)
    }

    fn with_target(target: FramebufferTarget, width: u32, height: u32) -> Self {
        let mut framebuffer = Self {
            target,
            width,
            height,
            viewports: vec![Viewport::full()],
        };
        framebuffer.on_size(width, height);
        framebuffer
    }

    /// Point a screen framebuffer at a host-owned framebuffer object
    pub fn set_external_params(&mut self, fbo: u32, width: u32, height: u32) {
        match self.target {
            FramebufferTarget::Screen { .. } => {
                self.target = FramebufferTarget::Screen { fbo };
                self.on_size(width, height);
            }
            FramebufferTarget::Offscreen(id) => {
                warn!("Ignoring external parameters for offscreen framebuffer {}", id);
            }
        }
    }

    /// Resize, recomputing every viewport
    pub fn on_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        for viewport in &mut self.viewports {
            viewport.on_size(width, height);
        }
    }

    /// Add a viewport and return its index
    pub fn add_viewport(&mut self, mut viewport: Viewport) -> usize {
        viewport.on_size(self.width, self.height);
        self.viewports.push(viewport);
        self.viewports.len() - 1
    }

    /// Get a viewport by index
    pub fn viewport(&self, index: usize) -> Option<&Viewport> {
        self.viewports.get(index)
    }

    /// Number of viewports
    pub fn viewport_count(&self) -> usize {
        self.viewports.len()
    }

    /// Device target this framebuffer binds
    pub fn target(&self) -> FramebufferTarget {
        self.target
    }

    /// Size in pixels as `(width, height)`
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Whether this is the screen framebuffer
    pub fn is_screen(&self) -> bool {
        matches!(self.target, FramebufferTarget::Screen { .. })
    }

    /// Bind this framebuffer on the device
    pub fn bind<D: GraphicsDevice + ?Sized>(&self, device: &mut D) {
        device.bind_framebuffer(self.target);
    }
}
