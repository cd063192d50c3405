use engine::event::{Event, EventDispatcher, KeyCode, KeyPressed, WindowResized};
use engine::{Layer, LayerBuildContext, LayerCommand, MapView, ResourceError, SpriteRenderer};
use tracing::{debug, error, info, warn};

use crate::trains::{TrainHandler, TrainHandlerConfig};

const PERSIST_KEY: KeyCode = KeyCode::F5;
const EXTEND_SERVICE_KEY: KeyCode = KeyCode::KeyN;

/// Drives the train registry: moves trains every tick and draws them above the map.
#[derive(Debug)]
pub(crate) struct TrainLayer {
    handler: TrainHandler,
}

impl TrainLayer {
    /// Missing textures abort startup. Definitions that cannot be read are logged and the layer
    /// starts with no trains.
    pub(crate) fn build(
        context: &mut LayerBuildContext<'_>,
        config: TrainHandlerConfig,
    ) -> Result<Self, ResourceError> {
        let mut handler = TrainHandler::new(config);
        handler.load_textures(context.resources)?;
        if let Err(err) = handler.load_definitions() {
            error!(error = %err, "train_definitions_load_failed");
        }
        info!(
            trains = handler.len(),
            records = handler.definitions().trains.len(),
            "train_layer_ready"
        );
        Ok(Self::new(handler))
    }

    pub(crate) fn new(handler: TrainHandler) -> Self {
        Self { handler }
    }

    #[cfg(test)]
    pub(crate) fn handler(&self) -> &TrainHandler {
        &self.handler
    }

    fn on_key_pressed(&mut self, event: &KeyPressed) -> bool {
        if event.repeat {
            return false;
        }
        match event.key {
            PERSIST_KEY => {
                if let Err(err) = self.handler.persist() {
                    error!(error = %err, "train_definitions_persist_failed");
                }
                true
            }
            EXTEND_SERVICE_KEY => {
                self.extend_first_service();
                true
            }
            _ => false,
        }
    }

    /// Runs another train on the route of the first listed one.
    fn extend_first_service(&mut self) {
        if self.handler.is_empty() {
            info!("extend_service_without_trains");
            return;
        }
        let Some((train_name, route)) = self
            .handler
            .trains()
            .next()
            .map(|(_, train)| (train.train_name().to_string(), train.follower().path().to_vec()))
        else {
            return;
        };
        match self.handler.extend_service(&train_name, &route) {
            Ok(name) => info!(
                name = name.as_str(),
                train_type = ?self.handler.train_type_of(&train_name),
                start = ?self.handler.train(&name).map(|train| train.position()),
                train_count = self.handler.len(),
                "service_extended"
            ),
            Err(err) => warn!(error = %err, "service_extend_failed"),
        }
    }

    fn on_window_resized(&mut self, event: &WindowResized) -> bool {
        debug!(width = event.width, height = event.height, "train_layer_resized");
        false
    }
}

impl Layer for TrainLayer {
    fn name(&self) -> &'static str {
        "trains"
    }

    fn on_event(&mut self, event: &mut Event, _view: &mut MapView) {
        let mut dispatcher = EventDispatcher::new(event);
        dispatcher.dispatch::<KeyPressed>(|pressed| self.on_key_pressed(pressed));
        dispatcher.dispatch::<WindowResized>(|resized| self.on_window_resized(resized));
    }

    fn on_update(&mut self, dt_seconds: f32, _view: &MapView) -> LayerCommand {
        self.handler.update(dt_seconds);
        LayerCommand::None
    }

    fn on_render(&mut self, renderer: &mut dyn SpriteRenderer) {
        self.handler.draw(renderer);
    }

    fn on_detach(&mut self) {
        info!(train_count = self.handler.len(), "train_layer_detached");
    }
}
