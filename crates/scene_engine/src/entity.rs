//! Entity lifecycle hooks
//!
//! Entities are the behaviour layer on top of the scene graph: each one is
//! called at fixed points of the frame and typically animates the nodes it
//! owns during [`Entity::frame_move`].

use log::debug;

use crate::foundation::collections::{new_key_type, Registry};
use crate::scene::SceneGraph;

new_key_type! {
    /// Handle to a registered entity
    pub struct EntityId;
}

/// Per-frame behaviour hooks; every hook defaults to a no-op
pub trait Entity {
    /// Called once by [`Engine::start`](crate::Engine::start)
    fn start(&mut self, _scene: &mut SceneGraph) {}

    /// Called in the update step, before world transforms are refreshed
    fn frame_move(&mut self, _scene: &mut SceneGraph, _time: f64, _delta_time: f64) {}

    /// Called before the pass loop of every frame
    fn pre_render(&mut self) {}

    /// Called after the pass loop of every frame
    fn post_render(&mut self) {}

    /// Called when the entity is removed or the engine is released
    fn destroy(&mut self) {}
}

/// Named collection of entities
#[derive(Default)]
pub struct EntityManager {
    entities: Registry<EntityId, Box<dyn Entity>>,
}

impl EntityManager {
    /// Create an empty manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity; an entity already using `name` is destroyed
    pub fn add(&mut self, name: impl Into<String>, entity: Box<dyn Entity>) -> EntityId {
        let name = name.into();
        self.remove(&name);
        self.entities.add(name, entity)
    }

    /// Destroy and remove an entity
    pub fn remove(&mut self, name: &str) -> bool {
        match self.entities.remove(name) {
            Some(mut entity) => {
                entity.destroy();
                true
            }
            None => false,
        }
    }

    /// Look up an entity by name
    pub fn find(&self, name: &str) -> Option<EntityId> {
        self.entities.find(name)
    }

    /// Get an entity mutably
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut (dyn Entity + 'static)> {
        self.entities.get_mut(id).map(|entity| entity.as_mut())
    }

    /// Number of entities
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether there are no entities
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Run every entity's start hook
    pub fn start_all(&mut self, scene: &mut SceneGraph) {
        for (_, entity) in self.entities.iter_mut() {
            entity.start(scene);
        }
    }

    /// Run every entity's update hook
    pub fn frame_move_all(&mut self, scene: &mut SceneGraph, time: f64, delta_time: f64) {
        for (_, entity) in self.entities.iter_mut() {
            entity.frame_move(scene, time, delta_time);
        }
    }

    /// Run every entity's pre-render hook
    pub fn pre_render_all(&mut self) {
        for (_, entity) in self.entities.iter_mut() {
            entity.pre_render();
        }
    }

    /// Run every entity's post-render hook
    pub fn post_render_all(&mut self) {
        for (_, entity) in self.entities.iter_mut() {
            entity.post_render();
        }
    }

    /// Destroy and drop every entity
    pub fn destroy_all(&mut self) {
        for (_, entity) in self.entities.iter_mut() {
            entity.destroy();
        }
        debug!("Destroyed {} entities", self.entities.len());
        self.entities.clear();
    }
}
