use std::path::Path;

use engine::event::{
    Event, EventDispatcher, MouseButton, MouseButtonPressed, MouseButtonReleased, MouseMoved,
    MouseScrolled,
};
use engine::{Layer, LayerBuildContext, MapView, ResourceError, SpriteRenderer, TextureHandle, Vec2};
use tracing::info;

const BACKGROUND_TEXTURE: &str = "images/background.png";
const DRAG_SENSITIVITY: f32 = 0.9;
const MAP_SCALE: f32 = 2.0;

#[derive(Debug, Default, Clone, Copy)]
struct DragState {
    dragging: bool,
    last_cursor: Vec2,
    cached_cursor: Vec2,
}

/// The map image. Left-drag pans it, the wheel zooms it.
#[derive(Debug)]
pub(crate) struct BackgroundLayer {
    texture: TextureHandle,
    map_size: Vec2,
    drag: DragState,
}

impl BackgroundLayer {
    /// The map covers twice the initial window in each direction.
    pub(crate) fn build(context: &mut LayerBuildContext<'_>) -> Result<Self, ResourceError> {
        let texture = context
            .resources
            .load_texture(Path::new(BACKGROUND_TEXTURE), "background")?;
        let viewport = context.view.viewport();
        let map_size = Vec2::new(
            viewport.width as f32 * MAP_SCALE,
            viewport.height as f32 * MAP_SCALE,
        );
        context.view.set_map_size(map_size);
        info!(width = map_size.x, height = map_size.y, "background_ready");
        Ok(Self::new(texture, map_size))
    }

    pub(crate) fn new(texture: TextureHandle, map_size: Vec2) -> Self {
        Self {
            texture,
            map_size,
            drag: DragState::default(),
        }
    }

    fn on_mouse_pressed(&mut self, event: &MouseButtonPressed) -> bool {
        if event.button != MouseButton::Left {
            return false;
        }
        self.drag.dragging = true;
        self.drag.last_cursor = self.drag.cached_cursor;
        true
    }

    /// Window coordinates grow downwards; the map's grow upwards.
    fn on_mouse_moved(&mut self, event: &MouseMoved, view: &mut MapView) -> bool {
        let cursor = Vec2::new(event.x, view.viewport().height as f32 - event.y);
        self.drag.cached_cursor = cursor;
        if !self.drag.dragging {
            return false;
        }

        let delta = cursor - self.drag.last_cursor;
        view.pan_by_screen_delta(delta * DRAG_SENSITIVITY);
        self.drag.last_cursor = cursor;
        true
    }

    fn on_mouse_released(&mut self, event: &MouseButtonReleased) -> bool {
        if event.button == MouseButton::Left {
            self.drag.dragging = false;
        }
        true
    }

    fn on_mouse_scrolled(event: &MouseScrolled, view: &mut MapView) -> bool {
        view.apply_zoom_steps(event.y_offset);
        true
    }
}

impl Layer for BackgroundLayer {
    fn name(&self) -> &'static str {
        "background"
    }

    fn on_event(&mut self, event: &mut Event, view: &mut MapView) {
        let mut dispatcher = EventDispatcher::new(event);
        dispatcher.dispatch::<MouseButtonPressed>(|pressed| self.on_mouse_pressed(pressed));
        dispatcher.dispatch::<MouseMoved>(|moved| self.on_mouse_moved(moved, view));
        dispatcher.dispatch::<MouseButtonReleased>(|released| self.on_mouse_released(released));
        dispatcher.dispatch::<MouseScrolled>(|scrolled| Self::on_mouse_scrolled(scrolled, view));
    }

    fn on_render(&mut self, renderer: &mut dyn SpriteRenderer) {
        renderer.draw_sprite(self.texture, Vec2::ZERO, self.map_size, 0.0);
    }
}

#[cfg(test)]
mod tests {
    use engine::{ResourceManager, Texture, Viewport};

    use super::*;

    fn layer_and_view() -> (BackgroundLayer, MapView) {
        let mut resources = ResourceManager::new("assets".into());
        let texture = resources
            .insert_texture("background", Texture::solid(2, 2, [0, 0, 0, 255]).expect("texture"))
            .expect("insert");
        let mut view = MapView::new(Viewport {
            width: 1024,
            height: 1024,
        });
        view.set_map_size(Vec2::new(2048.0, 2048.0));
        (BackgroundLayer::new(texture, Vec2::new(2048.0, 2048.0)), view)
    }

    fn raise(layer: &mut BackgroundLayer, view: &mut MapView, event: impl Into<Event>) -> bool {
        let mut event = event.into();
        layer.on_event(&mut event, view);
        event.is_handled()
    }

    #[test]
    fn moving_without_drag_is_not_handled() {
        let (mut layer, mut view) = layer_and_view();
        assert!(!raise(&mut layer, &mut view, MouseMoved { x: 10.0, y: 10.0 }));
        assert_eq!(view.pan(), Vec2::ZERO);
    }

    #[test]
    fn only_left_button_starts_a_drag() {
        let (mut layer, mut view) = layer_and_view();
        assert!(!raise(
            &mut layer,
            &mut view,
            MouseButtonPressed {
                button: MouseButton::Right
            }
        ));
        assert!(raise(
            &mut layer,
            &mut view,
            MouseButtonPressed {
                button: MouseButton::Left
            }
        ));
    }

    #[test]
    fn left_drag_pans_with_sensitivity() {
        let (mut layer, mut view) = layer_and_view();
        raise(&mut layer, &mut view, MouseMoved { x: 500.0, y: 500.0 });
        raise(
            &mut layer,
            &mut view,
            MouseButtonPressed {
                button: MouseButton::Left,
            },
        );

        // Drag the map left and down, which reveals more of its right and top.
        assert!(raise(&mut layer, &mut view, MouseMoved { x: 400.0, y: 600.0 }));

        let pan = view.pan();
        assert!((pan.x - 90.0).abs() < 0.01);
        assert!((pan.y - 90.0).abs() < 0.01);
    }

    #[test]
    fn release_always_handled_and_ends_drag() {
        let (mut layer, mut view) = layer_and_view();
        raise(
            &mut layer,
            &mut view,
            MouseButtonPressed {
                button: MouseButton::Left,
            },
        );
        assert!(raise(
            &mut layer,
            &mut view,
            MouseButtonReleased {
                button: MouseButton::Middle
            }
        ));
        assert!(raise(
            &mut layer,
            &mut view,
            MouseButtonReleased {
                button: MouseButton::Left
            }
        ));
        assert!(!raise(&mut layer, &mut view, MouseMoved { x: 0.0, y: 0.0 }));
    }

    #[test]
    fn scroll_zooms_within_limits() {
        let (mut layer, mut view) = layer_and_view();
        assert!(raise(
            &mut layer,
            &mut view,
            MouseScrolled {
                x_offset: 0.0,
                y_offset: 1.0
            }
        ));
        assert!((view.zoom() - 1.1).abs() < 0.0001);

        raise(
            &mut layer,
            &mut view,
            MouseScrolled {
                x_offset: 0.0,
                y_offset: -30.0,
            },
        );
        assert_eq!(view.zoom(), engine::app::ZOOM_MIN);
    }
}
