use std::fmt;

use tracing::{debug, info, warn};

use super::event::Event;
use super::rendering::SpriteRenderer;
use super::view::MapView;

/// One independently updated and rendered slice of the frame. Layers higher in the stack
/// see events first and render last.
pub trait Layer {
    fn name(&self) -> &'static str;

    /// Mark `event` handled to stop it reaching the layers below.
    fn on_event(&mut self, _event: &mut Event, _view: &mut MapView) {}

    fn on_update(&mut self, _dt_seconds: f32, _view: &MapView) -> LayerCommand {
        LayerCommand::None
    }

    fn on_render(&mut self, _renderer: &mut dyn SpriteRenderer) {}

    /// Called once when the layer leaves the stack.
    fn on_detach(&mut self) {}
}

/// Stack change requested by a layer during update. Applied by
/// [`LayerStack::apply_pending`], never while the stack is being iterated.
pub enum LayerCommand {
    None,
    /// Replace the requesting layer in place.
    TransitionTo(Box<dyn Layer>),
    /// Push a new layer on top of the stack.
    Push(Box<dyn Layer>),
    /// Remove the requesting layer.
    Pop,
}

impl fmt::Debug for LayerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerCommand::None => write!(f, "None"),
            LayerCommand::TransitionTo(layer) => write!(f, "TransitionTo({})", layer.name()),
            LayerCommand::Push(layer) => write!(f, "Push({})", layer.name()),
            LayerCommand::Pop => write!(f, "Pop"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub u64);

#[derive(Debug, Default)]
struct LayerIdAllocator {
    next: u64,
}

impl LayerIdAllocator {
    fn allocate(&mut self) -> LayerId {
        let id = LayerId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

enum PendingChange {
    Replace { target: LayerId, layer: Box<dyn Layer> },
    Remove { target: LayerId },
    Push { layer: Box<dyn Layer> },
}

struct LayerEntry {
    id: LayerId,
    layer: Box<dyn Layer>,
}

/// Ordered layers, bottom first.
#[derive(Default)]
pub struct LayerStack {
    entries: Vec<LayerEntry>,
    pending: Vec<PendingChange>,
    ids: LayerIdAllocator,
}

impl LayerStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Layer names bottom to top.
    pub fn layer_names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|entry| entry.layer.name()).collect()
    }

    pub fn layer_ids(&self) -> Vec<LayerId> {
        self.entries.iter().map(|entry| entry.id).collect()
    }

    /// Pushes immediately. Only call between frames.
    pub fn push_layer(&mut self, layer: Box<dyn Layer>) -> LayerId {
        let id = self.ids.allocate();
        info!(layer = layer.name(), id = id.0, "layer_pushed");
        self.entries.push(LayerEntry { id, layer });
        id
    }

    /// Offers `event` to each layer from the top down, stopping as soon as one marks it
    /// handled. Returns whether it was handled.
    pub fn raise_event(&mut self, event: &mut Event, view: &mut MapView) -> bool {
        for entry in self.entries.iter_mut().rev() {
            if event.is_handled() {
                break;
            }
            entry.layer.on_event(event, view);
            if event.is_handled() {
                debug!(layer = entry.layer.name(), event = %event, "event_handled");
            }
        }
        event.is_handled()
    }

    pub fn update(&mut self, dt_seconds: f32, view: &MapView) {
        for entry in &mut self.entries {
            match entry.layer.on_update(dt_seconds, view) {
                LayerCommand::None => {}
                LayerCommand::TransitionTo(layer) => self.pending.push(PendingChange::Replace {
                    target: entry.id,
                    layer,
                }),
                LayerCommand::Push(layer) => self.pending.push(PendingChange::Push { layer }),
                LayerCommand::Pop => self.pending.push(PendingChange::Remove { target: entry.id }),
            }
        }
    }

    pub fn render(&mut self, renderer: &mut dyn SpriteRenderer) {
        for entry in &mut self.entries {
            entry.layer.on_render(renderer);
        }
    }

    /// One frame: `ticks` fixed updates, then `present` draws the stack through the callback it
    /// is given, then queued changes are applied. Layers replaced during this frame still
    /// render in it. Returns how many changes took effect; a failed present applies nothing.
    pub fn run_frame<E>(
        &mut self,
        ticks: u32,
        dt_seconds: f32,
        view: &MapView,
        present: impl FnOnce(&mut dyn FnMut(&mut dyn SpriteRenderer)) -> Result<(), E>,
    ) -> Result<usize, E> {
        for _ in 0..ticks {
            self.update(dt_seconds, view);
        }
        present(&mut |renderer: &mut dyn SpriteRenderer| self.render(renderer))?;
        Ok(self.apply_pending())
    }

    /// Applies queued changes in the order they were requested. Returns how many took effect.
    pub fn apply_pending(&mut self) -> usize {
        let mut applied = 0;
        for change in std::mem::take(&mut self.pending) {
            match change {
                PendingChange::Replace { target, layer } => {
                    let Some(index) = self.position_of(target) else {
                        warn!(target = target.0, next = layer.name(), "layer_transition_target_gone");
                        continue;
                    };
                    let id = self.ids.allocate();
                    let mut previous =
                        std::mem::replace(&mut self.entries[index], LayerEntry { id, layer });
                    previous.layer.on_detach();
                    info!(
                        from = previous.layer.name(),
                        to = self.entries[index].layer.name(),
                        id = id.0,
                        "layer_transitioned"
                    );
                    applied += 1;
                }
                PendingChange::Remove { target } => {
                    let Some(index) = self.position_of(target) else {
                        warn!(target = target.0, "layer_pop_target_gone");
                        continue;
                    };
                    let mut removed = self.entries.remove(index);
                    removed.layer.on_detach();
                    info!(layer = removed.layer.name(), id = target.0, "layer_popped");
                    applied += 1;
                }
                PendingChange::Push { layer } => {
                    self.push_layer(layer);
                    applied += 1;
                }
            }
        }
        applied
    }

    /// Detaches every layer, top first.
    pub fn clear(&mut self) {
        self.pending.clear();
        while let Some(mut entry) = self.entries.pop() {
            entry.layer.on_detach();
        }
    }

    fn position_of(&self, id: LayerId) -> Option<usize> {
        self.entries.iter().position(|entry| entry.id == id)
    }
}
