//! Scene graph arena and world-transform propagation
//!
//! Nodes live in a slot map keyed by [`NodeId`]. Children are owned through
//! the parent's ordered child list, and the parent link is a plain handle, so
//! the tree has exactly one owner per node and no reference cycles.

use log::{debug, warn};
use slotmap::SlotMap;

use crate::foundation::math::{divide_by_scale, rbt_from_parts, rbt_translation, Mat4, Rbt, Vec3};
use crate::render::resources::CameraId;
use crate::scene::scene_node::{NodeId, SceneNode};

/// Structural scene graph errors
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    /// The handle does not refer to a live node
    #[error("Scene node not found: {0:?}")]
    NodeNotFound(NodeId),

    /// The operation needs a parent with valid world state
    #[error("Scene node {0:?} has no parent")]
    NoParent(NodeId),

    /// Linking would make a node its own ancestor
    #[error("Linking {child:?} under {parent:?} would create a cycle")]
    CyclicLink {
        /// Node being moved
        child: NodeId,
        /// Requested parent
        parent: NodeId,
    },

    /// The root node cannot be re-parented or destroyed
    #[error("The scene root cannot be re-parented or destroyed")]
    RootNode,
}

/// Receiver of camera view matrices during the world-transform refresh
pub trait CameraSink {
    /// Set a camera's world-to-view matrix
    fn set_view_matrix(&mut self, camera: CameraId, view: Mat4);
}

/// Discards camera updates, for refreshes of camera-less scenes
impl CameraSink for () {
    fn set_view_matrix(&mut self, _camera: CameraId, _view: Mat4) {}
}

/// Hierarchical transform tree with a permanent root
pub struct SceneGraph {
    nodes: SlotMap<NodeId, SceneNode>,
    root: NodeId,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    /// Create a graph containing only the root
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(SceneNode::new("root"));
        Self { nodes, root }
    }

    /// The root node
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes, including the root and detached nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false; the root is permanent
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether a handle refers to a live node
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Get a node
    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id)
    }

    /// Get a node mutably
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id)
    }

    /// Create a detached node
    pub fn create_node(&mut self, name: impl Into<String>) -> NodeId {
        self.nodes.insert(SceneNode::new(name))
    }

    /// Create a node and append it to `parent`
    pub fn add_child(&mut self, parent: NodeId, name: impl Into<String>) -> Result<NodeId, SceneError> {
        if !self.nodes.contains_key(parent) {
            return Err(SceneError::NodeNotFound(parent));
        }
        let child = self.create_node(name);
        self.try_link_to(child, Some(parent))?;
        Ok(child)
    }

    /// Move `child` under `parent`, or detach it when `parent` is `None`
    ///
    /// The child is removed from its current parent first and appended at
    /// the end of the new parent's child list.
    pub fn try_link_to(&mut self, child: NodeId, parent: Option<NodeId>) -> Result<(), SceneError> {
        if !self.nodes.contains_key(child) {
            return Err(SceneError::NodeNotFound(child));
        }
        if child == self.root {
            return Err(SceneError::RootNode);
        }
        if let Some(parent) = parent {
            if !self.nodes.contains_key(parent) {
                return Err(SceneError::NodeNotFound(parent));
            }
            if self.is_ancestor_or_self(child, parent) {
                return Err(SceneError::CyclicLink { child, parent });
            }
        }

        self.detach(child);
        if let Some(parent) = parent {
            self.nodes[parent].children.push(child);
            self.nodes[child].parent = Some(parent);
        }
        Ok(())
    }

    /// Same as [`try_link_to`](Self::try_link_to), logging and returning
    /// false instead of failing
    pub fn link_to(&mut self, child: NodeId, parent: Option<NodeId>) -> bool {
        match self.try_link_to(child, parent) {
            Ok(()) => true,
            Err(err) => {
                warn!("link_to ignored: {}", err);
                false
            }
        }
    }

    /// Remove `child` from `parent`'s children, leaving it detached
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        let Some(node) = self.nodes.get_mut(parent) else {
            return false;
        };
        let Some(index) = node.children.iter().position(|&c| c == child) else {
            return false;
        };
        node.children.remove(index);
        if let Some(removed) = self.nodes.get_mut(child) {
            removed.parent = None;
        }
        true
    }

    /// Remove the child at `index`, returning it detached
    pub fn remove_child_at(&mut self, parent: NodeId, index: usize) -> Option<NodeId> {
        let node = self.nodes.get_mut(parent)?;
        if index >= node.children.len() {
            return None;
        }
        let child = node.children.remove(index);
        if let Some(removed) = self.nodes.get_mut(child) {
            removed.parent = None;
        }
        Some(child)
    }

    /// Detach every child of `parent`, returning how many were removed
    pub fn remove_children(&mut self, parent: NodeId) -> usize {
        let Some(node) = self.nodes.get_mut(parent) else {
            return 0;
        };
        let children = std::mem::take(&mut node.children);
        for &child in &children {
            if let Some(removed) = self.nodes.get_mut(child) {
                removed.parent = None;
            }
        }
        children.len()
    }

    /// Detach a node and free it together with all of its descendants
    pub fn destroy_subtree(&mut self, id: NodeId) -> Result<usize, SceneError> {
        if id == self.root {
            return Err(SceneError::RootNode);
        }
        if !self.nodes.contains_key(id) {
            return Err(SceneError::NodeNotFound(id));
        }
        self.detach(id);

        let mut doomed = Vec::new();
        self.traverse(id, |node_id, _| doomed.push(node_id));
        for &node_id in &doomed {
            self.nodes.remove(node_id);
        }
        debug!("Destroyed {} scene nodes", doomed.len());
        Ok(doomed.len())
    }

    /// Drop every node and start over with a fresh root
    pub fn reset(&mut self) {
        self.nodes.clear();
        self.root = self.nodes.insert(SceneNode::new("root"));
    }

    /// Whether `ancestor` is `node` or one of its ancestors
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.nodes.get(id).and_then(SceneNode::parent);
        }
        false
    }

    fn detach(&mut self, child: NodeId) {
        if let Some(old_parent) = self.nodes.get(child).and_then(SceneNode::parent) {
            self.remove_child(old_parent, child);
        }
    }

    /// Set a node's local transform from a desired world transform
    ///
    /// Uses the parent's cached world state, so the parent must have been
    /// refreshed. The node's cached world transform is set to `world`.
    pub fn set_world_rbt(&mut self, id: NodeId, world: Rbt) -> Result<(), SceneError> {
        let node = self.nodes.get(id).ok_or(SceneError::NodeNotFound(id))?;
        let parent_id = node.parent().ok_or(SceneError::NoParent(id))?;
        let parent = self.nodes.get(parent_id).ok_or(SceneError::NodeNotFound(parent_id))?;

        let local = parent.world_rbt().inverse() * world;
        let translation = divide_by_scale(&rbt_translation(&local), parent.world_scale());
        let local = rbt_from_parts(translation, local.rotation);

        let node = &mut self.nodes[id];
        node.set_rbt(local);
        let world_scale = *node.world_scale();
        node.set_world(world, world_scale);
        Ok(())
    }

    /// Recompute cached world transforms for `start` and its subtree
    ///
    /// Parents are visited before their children. A node with a parent
    /// composes with the parent's cached world state; a node without one takes
    /// its local values. Attached lights receive the new world transform and
    /// attached cameras receive its inverse as their view matrix.
    pub fn update_subtree_world_transforms(
        &mut self,
        start: NodeId,
        cameras: &mut dyn CameraSink,
    ) -> Result<(), SceneError> {
        if !self.nodes.contains_key(start) {
            return Err(SceneError::NodeNotFound(start));
        }

        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            let parent_world = self
                .nodes[id]
                .parent()
                .and_then(|parent| self.nodes.get(parent))
                .map(|parent| (*parent.world_rbt(), *parent.world_scale()));

            let node = &mut self.nodes[id];
            let (world_rbt, world_scale) = match parent_world {
                Some((parent_rbt, parent_scale)) => {
                    let translation = parent_scale.component_mul(&node.position());
                    let local = rbt_from_parts(translation, *node.rotation());
                    (parent_rbt * local, parent_scale.component_mul(node.scale()))
                }
                None => (*node.rbt(), *node.scale()),
            };
            node.set_world(world_rbt, world_scale);

            for light in node.lights_mut() {
                light.update_light_transform(&world_rbt);
            }
            if !node.cameras().is_empty() {
                let view = world_rbt.inverse().to_homogeneous();
                for &camera in node.cameras() {
                    cameras.set_view_matrix(camera, view);
                }
            }

            stack.extend(node.children.iter().rev().copied());
        }
        Ok(())
    }

    /// Visit `start` and its subtree, parents before children
    pub fn traverse(&self, start: NodeId, mut visitor: impl FnMut(NodeId, &SceneNode)) {
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            visitor(id, node);
            stack.extend(node.children.iter().rev().copied());
        }
    }

    /// First node in traversal order matching `predicate`
    pub fn find_if(&self, start: NodeId, mut predicate: impl FnMut(&SceneNode) -> bool) -> Option<NodeId> {
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            if predicate(node) {
                return Some(id);
            }
            stack.extend(node.children.iter().rev().copied());
        }
        None
    }

    /// First node in traversal order named `name`
    pub fn find_node_by_name(&self, name: &str, start: NodeId) -> Option<NodeId> {
        self.find_if(start, |node| node.name() == name)
    }

    /// World position of a node from the cache
    pub fn world_position(&self, id: NodeId) -> Option<Vec3> {
        self.nodes.get(id).map(SceneNode::world_position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{constants, Quat};
    use crate::scene::light::{Light, PointDirLight};
    use approx::assert_relative_eq;
    use slotmap::SlotMap;

    fn refresh(graph: &mut SceneGraph) {
        let root = graph.root();
        graph.update_subtree_world_transforms(root, &mut ()).unwrap();
    }

    #[test]
    fn test_worked_example() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let a = graph.add_child(root, "A").unwrap();
        let b = graph.add_child(a, "B").unwrap();
        graph.node_mut(a).unwrap().set_position(Vec3::new(1.0, 0.0, 0.0));
        let node_b = graph.node_mut(b).unwrap();
        node_b.set_position(Vec3::new(0.0, 1.0, 0.0));
        node_b.set_scale(Vec3::repeat(2.0));

        refresh(&mut graph);

        let node_a = graph.node(a).unwrap();
        assert_relative_eq!(node_a.world_position(), Vec3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(*node_a.world_scale(), Vec3::repeat(1.0));
        let node_b = graph.node(b).unwrap();
        assert_relative_eq!(node_b.world_position(), Vec3::new(1.0, 1.0, 0.0));
        assert_relative_eq!(*node_b.world_scale(), Vec3::repeat(2.0));
    }

    #[test]
    fn test_composition_law_with_rotation_and_scale() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let a = graph.add_child(root, "A").unwrap();
        let b = graph.add_child(a, "B").unwrap();

        let node_a = graph.node_mut(a).unwrap();
        node_a.set_position(Vec3::new(2.0, 0.0, 0.0));
        node_a.set_rotation(Quat::from_axis_angle(&Vec3::z_axis(), constants::HALF_PI));
        node_a.set_scale(Vec3::new(2.0, 3.0, 1.0));
        let node_b = graph.node_mut(b).unwrap();
        node_b.set_position(Vec3::new(1.0, 1.0, 0.0));
        node_b.set_scale(Vec3::new(0.5, 2.0, 4.0));

        refresh(&mut graph);

        let node_a = graph.node(a).unwrap();
        let node_b = graph.node(b).unwrap();
        let expected = node_a.world_rbt()
            * rbt_from_parts(node_a.world_scale().component_mul(&node_b.position()), *node_b.rotation());
        assert_relative_eq!(node_b.world_rbt().to_homogeneous(), expected.to_homogeneous(), epsilon = 1e-5);
        assert_relative_eq!(*node_b.world_scale(), Vec3::new(1.0, 6.0, 4.0));
        // Scaled offset (2,3,0) rotated 90 degrees about Z is (-3,2,0)
        assert_relative_eq!(node_b.world_position(), Vec3::new(-1.0, 2.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_local_setters_do_not_touch_world_cache() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let a = graph.add_child(root, "A").unwrap();
        refresh(&mut graph);

        graph.node_mut(a).unwrap().set_position(Vec3::new(5.0, 0.0, 0.0));
        assert_relative_eq!(graph.world_position(a).unwrap(), Vec3::zeros());

        refresh(&mut graph);
        assert_relative_eq!(graph.world_position(a).unwrap(), Vec3::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn test_relink_moves_child() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let a1 = graph.add_child(root, "A1").unwrap();
        let a2 = graph.add_child(root, "A2").unwrap();
        let b = graph.add_child(a1, "B").unwrap();

        assert!(graph.link_to(b, Some(a2)));

        assert!(!graph.node(a1).unwrap().children().contains(&b));
        assert_eq!(graph.node(a2).unwrap().children().iter().filter(|&&c| c == b).count(), 1);
        assert_eq!(graph.node(b).unwrap().parent(), Some(a2));
    }

    #[test]
    fn test_link_rejects_cycles_and_root() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let a = graph.add_child(root, "A").unwrap();
        let b = graph.add_child(a, "B").unwrap();

        assert_eq!(graph.try_link_to(a, Some(b)), Err(SceneError::CyclicLink { child: a, parent: b }));
        assert_eq!(graph.try_link_to(a, Some(a)), Err(SceneError::CyclicLink { child: a, parent: a }));
        assert_eq!(graph.try_link_to(root, Some(a)), Err(SceneError::RootNode));
        assert_eq!(graph.node(b).unwrap().parent(), Some(a));
    }

    #[test]
    fn test_link_stale_child_is_noop() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let a = graph.add_child(root, "A").unwrap();
        graph.destroy_subtree(a).unwrap();

        assert!(!graph.link_to(a, Some(root)));
        assert!(graph.node(root).unwrap().children().is_empty());
    }

    #[test]
    fn test_remove_child_clears_parent() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let a = graph.add_child(root, "A").unwrap();
        let b = graph.add_child(root, "B").unwrap();

        assert!(graph.remove_child(root, a));
        assert_eq!(graph.node(a).unwrap().parent(), None);
        assert_eq!(graph.remove_child_at(root, 0), Some(b));
        assert_eq!(graph.node(b).unwrap().parent(), None);
        assert!(graph.node(root).unwrap().children().is_empty());
        assert!(!graph.remove_child(root, a));
    }

    #[test]
    fn test_remove_children_and_destroy_subtree() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let a = graph.add_child(root, "A").unwrap();
        graph.add_child(a, "B").unwrap();
        graph.add_child(a, "C").unwrap();

        assert_eq!(graph.destroy_subtree(a), Ok(3));
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.destroy_subtree(root), Err(SceneError::RootNode));

        let d = graph.add_child(root, "D").unwrap();
        graph.add_child(root, "E").unwrap();
        assert_eq!(graph.remove_children(root), 2);
        assert_eq!(graph.node(d).unwrap().parent(), None);
    }

    #[test]
    fn test_set_world_rbt_round_trip() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let parent = graph.add_child(root, "parent").unwrap();
        let child = graph.add_child(parent, "child").unwrap();
        let node = graph.node_mut(parent).unwrap();
        node.set_position(Vec3::new(1.0, 2.0, 3.0));
        node.set_rotation(Quat::from_axis_angle(&Vec3::y_axis(), 0.7));
        node.set_scale(Vec3::new(2.0, 2.0, 4.0));
        refresh(&mut graph);

        let target = rbt_from_parts(
            Vec3::new(-4.0, 0.5, 2.0),
            Quat::from_axis_angle(&Vec3::x_axis(), 0.3),
        );
        graph.set_world_rbt(child, target).unwrap();
        assert_relative_eq!(graph.node(child).unwrap().world_rbt().to_homogeneous(), target.to_homogeneous());

        refresh(&mut graph);
        let world = *graph.node(child).unwrap().world_rbt();
        assert_relative_eq!(world.to_homogeneous(), target.to_homogeneous(), epsilon = 1e-5);
    }

    #[test]
    fn test_set_world_rbt_requires_parent() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        assert_eq!(graph.set_world_rbt(root, Rbt::identity()), Err(SceneError::NoParent(root)));
    }

    #[test]
    fn test_update_unknown_node_fails() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let a = graph.add_child(root, "A").unwrap();
        graph.destroy_subtree(a).unwrap();

        assert_eq!(graph.update_subtree_world_transforms(a, &mut ()), Err(SceneError::NodeNotFound(a)));
    }

    #[test]
    fn test_find_node_by_name_uses_traversal_order() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let a = graph.add_child(root, "A").unwrap();
        let first = graph.add_child(a, "target").unwrap();
        let b = graph.add_child(root, "B").unwrap();
        graph.add_child(b, "target").unwrap();

        assert_eq!(graph.find_node_by_name("target", root), Some(first));
        assert_eq!(graph.find_node_by_name("missing", root), None);
        assert_eq!(graph.find_if(b, |node| node.name() == "B"), Some(b));
    }

    #[test]
    fn test_traverse_is_preorder() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let a = graph.add_child(root, "A").unwrap();
        graph.add_child(a, "A1").unwrap();
        graph.add_child(root, "B").unwrap();

        let mut names = Vec::new();
        graph.traverse(root, |_, node| names.push(node.name().to_string()));
        assert_eq!(names, ["root", "A", "A1", "B"]);
    }

    #[test]
    fn test_refresh_pushes_light_and_camera_transforms() {
        struct Views(Vec<(CameraId, Mat4)>);
        impl CameraSink for Views {
            fn set_view_matrix(&mut self, camera: CameraId, view: Mat4) {
                self.0.push((camera, view));
            }
        }

        let mut camera_keys: SlotMap<CameraId, ()> = SlotMap::with_key();
        let camera = camera_keys.insert(());

        let mut graph = SceneGraph::new();
        let root = graph.root();
        let holder = graph.add_child(root, "holder").unwrap();
        let node = graph.node_mut(holder).unwrap();
        node.set_position(Vec3::new(0.0, 0.0, 5.0));
        node.attach_camera(camera);
        node.add_light(Box::new(PointDirLight::new(0, Vec3::repeat(1.0))));

        let mut views = Views(Vec::new());
        graph.update_subtree_world_transforms(root, &mut views).unwrap();

        assert_eq!(views.0.len(), 1);
        assert_relative_eq!(views.0[0].1, Mat4::new_translation(&Vec3::new(0.0, 0.0, -5.0)));

        let mut uniforms = crate::render::uniforms::BuiltinUniforms::default();
        graph.node(holder).unwrap().lights()[0].update_uniforms(&mut uniforms);
        assert_relative_eq!(uniforms.light_pos[0], Vec3::new(0.0, 0.0, 5.0));
    }

    #[test]
    fn test_reset_keeps_a_root() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        graph.add_child(root, "A").unwrap();
        graph.reset();

        assert_eq!(graph.len(), 1);
        assert_eq!(graph.node(graph.root()).map(SceneNode::name), Some("root"));
        assert!(graph.node(graph.root()).unwrap().children().is_empty());
    }
}
