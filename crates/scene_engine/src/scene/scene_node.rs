//! A node in the transform hierarchy

use std::fmt;
use std::rc::Rc;

use crate::foundation::math::{model_matrix, rbt_translation, Quat, Rbt, Translation3, Vec3, Mat4};
use crate::render::resources::CameraId;
use crate::scene::light::Light;
use crate::scene::renderable::Renderable;

slotmap::new_key_type! {
    /// Stable handle to a node in a [`SceneGraph`](crate::scene::SceneGraph)
    pub struct NodeId;
}

/// Transform, attachments and tree links of a single node
///
/// The local transform is a rigid-body transform plus a separate
/// non-uniform scale. The world values are a cache written by
/// [`SceneGraph::update_subtree_world_transforms`](crate::scene::SceneGraph::update_subtree_world_transforms);
/// local setters never touch them.
pub struct SceneNode {
    name: String,
    rbt: Rbt,
    scale: Vec3,
    world_rbt: Rbt,
    world_scale: Vec3,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    renderables: Vec<Rc<dyn Renderable>>,
    lights: Vec<Box<dyn Light>>,
    cameras: Vec<CameraId>,
}

impl SceneNode {
    /// Create a detached node with identity transform and unit scale
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rbt: Rbt::identity(),
            scale: Vec3::repeat(1.0),
            world_rbt: Rbt::identity(),
            world_scale: Vec3::repeat(1.0),
            parent: None,
            children: Vec::new(),
            renderables: Vec::new(),
            lights: Vec::new(),
            cameras: Vec::new(),
        }
    }

    /// Node name; not required to be unique
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the node
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Local rigid-body transform
    pub fn rbt(&self) -> &Rbt {
        &self.rbt
    }

    /// Replace the local rigid-body transform
    pub fn set_rbt(&mut self, rbt: Rbt) {
        self.rbt = rbt;
    }

    /// Local translation
    pub fn position(&self) -> Vec3 {
        rbt_translation(&self.rbt)
    }

    /// Set the local translation
    pub fn set_position(&mut self, position: Vec3) {
        self.rbt.translation = Translation3::from(position);
    }

    /// Local rotation
    pub fn rotation(&self) -> &Quat {
        &self.rbt.rotation
    }

    /// Set the local rotation
    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rbt.rotation = rotation;
    }

    /// Local non-uniform scale
    pub fn scale(&self) -> &Vec3 {
        &self.scale
    }

    /// Set the local non-uniform scale
    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
    }

    /// Cached world rigid-body transform
    pub fn world_rbt(&self) -> &Rbt {
        &self.world_rbt
    }

    /// Cached world scale
    pub fn world_scale(&self) -> &Vec3 {
        &self.world_scale
    }

    /// Cached world position
    pub fn world_position(&self) -> Vec3 {
        rbt_translation(&self.world_rbt)
    }

    /// Model matrix built from the cached world values
    pub fn model_matrix(&self) -> Mat4 {
        model_matrix(&self.world_rbt, &self.world_scale)
    }

    pub(crate) fn set_world(&mut self, world_rbt: Rbt, world_scale: Vec3) {
        self.world_rbt = world_rbt;
        self.world_scale = world_scale;
    }

    /// Parent node, `None` for the root and detached nodes
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in link order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Attach a renderable
    pub fn add_renderable(&mut self, renderable: Rc<dyn Renderable>) {
        self.renderables.push(renderable);
    }

    /// Attached renderables in attachment order
    pub fn renderables(&self) -> &[Rc<dyn Renderable>] {
        &self.renderables
    }

    /// Detach every renderable
    pub fn clear_renderables(&mut self) {
        self.renderables.clear();
    }

    /// Attach a light
    pub fn add_light(&mut self, light: Box<dyn Light>) {
        self.lights.push(light);
    }

    /// Attached lights
    pub fn lights(&self) -> &[Box<dyn Light>] {
        &self.lights
    }

    pub(crate) fn lights_mut(&mut self) -> &mut [Box<dyn Light>] {
        &mut self.lights
    }

    /// Attach a camera; its view matrix follows this node from now on
    pub fn attach_camera(&mut self, camera: CameraId) {
        if !self.cameras.contains(&camera) {
            self.cameras.push(camera);
        }
    }

    /// Detach a camera
    pub fn detach_camera(&mut self, camera: CameraId) -> bool {
        let before = self.cameras.len();
        self.cameras.retain(|&attached| attached != camera);
        self.cameras.len() != before
    }

    /// Attached cameras
    pub fn cameras(&self) -> &[CameraId] {
        &self.cameras
    }
}

impl fmt::Debug for SceneNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneNode")
            .field("name", &self.name)
            .field("rbt", &self.rbt)
            .field("scale", &self.scale)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("renderables", &self.renderables.len())
            .field("lights", &self.lights.len())
            .field("cameras", &self.cameras)
            .finish()
    }
}
