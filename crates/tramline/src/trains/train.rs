use engine::{AdvanceOutcome, PathFollower, TextureHandle, Vec2};

use super::TrainType;

/// Where and how large a new train appears before its path takes over.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SpawnTemplate {
    pub(crate) position: Vec2,
    pub(crate) size: Vec2,
    pub(crate) velocity: Vec2,
}

impl Default for SpawnTemplate {
    fn default() -> Self {
        Self {
            position: Vec2::new(512.0, 512.0),
            size: Vec2::new(64.0, 64.0),
            velocity: Vec2::new(50.0, 50.0),
        }
    }
}

/// A path follower bound to a sprite.
#[derive(Debug, Clone)]
pub(crate) struct Train {
    follower: PathFollower,
    texture: TextureHandle,
    train_name: String,
    train_type: TrainType,
    size: Vec2,
    rotation_degrees: f32,
    degenerate_reported: bool,
}

impl Train {
    pub(crate) fn new(
        texture: TextureHandle,
        train_name: &str,
        train_type: TrainType,
        spawn: &SpawnTemplate,
    ) -> Self {
        Self {
            follower: PathFollower::new(spawn.position, spawn.velocity),
            texture,
            train_name: train_name.to_string(),
            train_type,
            size: spawn.size,
            rotation_degrees: 0.0,
            degenerate_reported: false,
        }
    }

    pub(crate) fn set_path(&mut self, path: &[Vec2]) {
        self.follower.set_path(path);
        self.degenerate_reported = false;
        self.refresh_rotation();
    }

    pub(crate) fn advance(&mut self, dt_seconds: f32) -> AdvanceOutcome {
        let outcome = self.follower.advance(dt_seconds);
        if matches!(
            outcome,
            AdvanceOutcome::SegmentCompleted | AdvanceOutcome::TurnedAround
        ) {
            self.refresh_rotation();
        }
        outcome
    }

    /// Returns true the first time only, so a stuck train is reported once.
    pub(crate) fn take_degenerate_report(&mut self) -> bool {
        !std::mem::replace(&mut self.degenerate_reported, true)
    }

    pub(crate) fn follower(&self) -> &PathFollower {
        &self.follower
    }

    pub(crate) fn position(&self) -> Vec2 {
        self.follower.position()
    }

    pub(crate) fn texture(&self) -> TextureHandle {
        self.texture
    }

    pub(crate) fn train_name(&self) -> &str {
        &self.train_name
    }

    pub(crate) fn train_type(&self) -> TrainType {
        self.train_type
    }

    pub(crate) fn size(&self) -> Vec2 {
        self.size
    }

    pub(crate) fn rotation_degrees(&self) -> f32 {
        self.rotation_degrees
    }

    fn refresh_rotation(&mut self) {
        if let Some(heading) = self.follower.heading() {
            self.rotation_degrees = heading.y.atan2(heading.x).to_degrees();
        }
    }
}
