//! The space every body lives in.
//!
//! Wraps the hecs world with reference frames, proximity queries, deferred
//! body removal and the dense body index used by save files.

use std::collections::BTreeMap;

use glam::DVec3;
use hecs::{Entity, World};
use tracing::{debug, warn};

use stardrift_core::components::{Body, Dead};
use stardrift_core::constants::NO_BODY_INDEX;
use stardrift_core::error::CorruptSaveError;
use stardrift_core::serial::BodyIndexer;
use stardrift_core::types::FrameId;

/// Bodies in spawn order. Save indices are 1-based positions in this list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BodyIndex {
    order: Vec<Entity>,
}

impl BodyIndex {
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.order.iter().copied()
    }

    fn push(&mut self, entity: Entity) {
        self.order.push(entity);
    }

    fn remove(&mut self, entity: Entity) {
        self.order.retain(|e| *e != entity);
    }
}

impl BodyIndexer for BodyIndex {
    fn index_for_body(&self, body: Option<Entity>) -> i64 {
        body.and_then(|b| self.order.iter().position(|e| *e == b))
            .map(|i| i as i64 + 1)
            .unwrap_or(NO_BODY_INDEX)
    }

    fn body_by_index(&self, index: i64) -> Result<Option<Entity>, CorruptSaveError> {
        if index == NO_BODY_INDEX {
            return Ok(None);
        }
        usize::try_from(index - 1)
            .ok()
            .and_then(|i| self.order.get(i).copied())
            .map(Some)
            .ok_or(CorruptSaveError::BadBodyIndex(index))
    }
}

pub struct Space {
    pub world: World,
    index: BodyIndex,
    /// Frame origins relative to the root frame.
    frames: BTreeMap<FrameId, DVec3>,
    removal_queue: Vec<Entity>,
}

impl Default for Space {
    fn default() -> Self {
        Self::new()
    }
}

impl Space {
    pub fn new() -> Self {
        let mut frames = BTreeMap::new();
        frames.insert(FrameId::ROOT, DVec3::ZERO);
        Self {
            world: World::new(),
            index: BodyIndex::default(),
            frames,
            removal_queue: Vec::new(),
        }
    }

    /// Add a frame whose origin sits at `origin` in the root frame.
    pub fn add_frame(&mut self, origin: DVec3) -> FrameId {
        let id = self
            .frames
            .keys()
            .next_back()
            .map(|f| FrameId(f.0 + 1))
            .unwrap_or(FrameId::ROOT);
        self.frames.insert(id, origin);
        id
    }

    /// Register a frame under a known id, as when loading a save.
    pub fn insert_frame(&mut self, id: FrameId, origin: DVec3) {
        self.frames.insert(id, origin);
    }

    pub fn frames(&self) -> impl Iterator<Item = (FrameId, DVec3)> + '_ {
        self.frames.iter().map(|(id, origin)| (*id, *origin))
    }

    pub fn frame_origin(&self, frame: FrameId) -> DVec3 {
        match self.frames.get(&frame) {
            Some(origin) => *origin,
            None => {
                warn!(%frame, "unknown frame, using root origin");
                DVec3::ZERO
            }
        }
    }

    /// Spawn a body with extra components. The body joins the save index.
    pub fn spawn(&mut self, body: Body, extra: impl hecs::DynamicBundle) -> Entity {
        let entity = self.world.spawn(extra);
        // Inserting into a just-spawned entity cannot fail.
        let _ = self.world.insert_one(entity, body);
        self.index.push(entity);
        entity
    }

    pub fn index(&self) -> &BodyIndex {
        &self.index
    }

    /// Split borrow: the world mutably, the body index shared.
    pub fn world_and_index(&mut self) -> (&mut World, &BodyIndex) {
        (&mut self.world, &self.index)
    }

    /// A body is alive until it is killed, even before its removal.
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.world.contains(entity) && self.world.get::<&Dead>(entity).is_err()
    }

    /// Position of a body in root-frame coordinates.
    pub fn absolute_position(&self, entity: Entity) -> Option<DVec3> {
        let body = self.world.get::<&Body>(entity).ok()?;
        Some(self.frame_origin(body.frame) + body.position)
    }

    /// Candidates within `radius` of a root-frame point. Includes the
    /// caller's own body and bodies of any frame; dead bodies are skipped.
    pub fn bodies_maybe_near(&self, center: DVec3, radius: f64) -> Vec<Entity> {
        let mut near = Vec::new();
        for (entity, body) in self.world.query::<&Body>().without::<&Dead>().iter() {
            let pos = self.frame_origin(body.frame) + body.position;
            if pos.distance(center) <= radius {
                near.push(entity);
            }
        }
        near
    }

    /// Mark a body dead. It stays in the world until `process_removals`.
    pub fn kill_body(&mut self, entity: Entity) {
        if !self.is_alive(entity) {
            return;
        }
        if self.world.insert_one(entity, Dead).is_ok() {
            debug!(?entity, "body killed");
            self.removal_queue.push(entity);
        }
    }

    /// Despawn every body killed since the last call, returning them in
    /// kill order so listeners can be notified.
    pub fn process_removals(&mut self) -> Vec<Entity> {
        let removed: Vec<Entity> = std::mem::take(&mut self.removal_queue);
        for &entity in &removed {
            let _ = self.world.despawn(entity);
            self.index.remove(entity);
        }
        removed
    }

    pub fn pending_removals(&self) -> usize {
        self.removal_queue.len()
    }
}
