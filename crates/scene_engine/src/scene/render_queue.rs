//! Per-frame draw list
//!
//! Flattens the scene graph into `(model matrix, renderable)` pairs and
//! orders them by queue id. The sort is stable, so renderables sharing a
//! queue id keep their traversal order (parents before children, children
//! and attachments in list order).

use std::rc::Rc;

use crate::foundation::math::Mat4;
use crate::scene::renderable::Renderable;
use crate::scene::scene_graph::SceneGraph;
use crate::scene::scene_node::NodeId;

/// One draw in the queue
#[derive(Clone)]
pub struct QueueEntry {
    /// Model matrix from the owning node's cached world state
    pub model: Mat4,
    /// What to draw
    pub renderable: Rc<dyn Renderable>,
}

/// Ordered draw list for one frame
#[derive(Clone, Default)]
pub struct RenderQueue {
    entries: Vec<QueueEntry>,
}

impl RenderQueue {
    /// Build the queue for the subtree at `root`
    ///
    /// Reads the cached world transforms only; the tree is not modified.
    pub fn build(scene: &SceneGraph, root: NodeId) -> Self {
        let mut entries = Vec::new();
        scene.traverse(root, |_, node| {
            if node.renderables().is_empty() {
                return;
            }
            let model = node.model_matrix();
            entries.extend(node.renderables().iter().map(|renderable| QueueEntry {
                model,
                renderable: Rc::clone(renderable),
            }));
        });
        entries.sort_by_key(|entry| entry.renderable.queue_id());
        Self { entries }
    }

    /// Entries in draw order
    pub fn entries(&self) -> &[QueueEntry] {
        &self.entries
    }

    /// Iterate over entries in draw order
    pub fn iter(&self) -> std::slice::Iter<'_, QueueEntry> {
        self.entries.iter()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a RenderQueue {
    type Item = &'a QueueEntry;
    type IntoIter = std::slice::Iter<'a, QueueEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
