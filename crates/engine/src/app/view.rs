use crate::math::Vec2;

pub const ZOOM_DEFAULT: f32 = 1.0;
pub const ZOOM_MIN: f32 = 0.5;
pub const ZOOM_MAX: f32 = 1.5;
pub const ZOOM_STEP: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// World-to-screen mapping for one frame. World space is y-up with the map origin at the
/// bottom-left; screen space is y-down pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub pan: Vec2,
    pub zoom: f32,
    pub viewport: Viewport,
}

impl Projection {
    pub fn identity(viewport: Viewport) -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: ZOOM_DEFAULT,
            viewport,
        }
    }

    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        Vec2 {
            x: (world.x - self.pan.x) * self.zoom,
            y: self.viewport.height as f32 - (world.y - self.pan.y) * self.zoom,
        }
    }

    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        let zoom = self.zoom.max(f32::EPSILON);
        Vec2 {
            x: screen.x / zoom + self.pan.x,
            y: (self.viewport.height as f32 - screen.y) / zoom + self.pan.y,
        }
    }
}

/// The single owner of pan, zoom and viewport size. Layers read their projection from here
/// so they never disagree about where the map is.
#[derive(Debug, Clone, PartialEq)]
pub struct MapView {
    pan: Vec2,
    zoom: f32,
    viewport: Viewport,
    map_size: Option<Vec2>,
}

impl MapView {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: ZOOM_DEFAULT,
            viewport,
            map_size: None,
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn pan(&self) -> Vec2 {
        self.pan
    }

    pub fn map_size(&self) -> Option<Vec2> {
        self.map_size
    }

    /// Bounds panning so the map keeps covering the viewport.
    pub fn set_map_size(&mut self, size: Vec2) {
        self.map_size = Some(size);
        self.clamp_pan();
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.viewport = Viewport { width, height };
        self.clamp_pan();
    }

    pub fn set_zoom_clamped(&mut self, zoom: f32) {
        if !zoom.is_finite() {
            return;
        }
        self.zoom = zoom.clamp(ZOOM_MIN, ZOOM_MAX);
        self.clamp_pan();
    }

    pub fn apply_zoom_steps(&mut self, steps: f32) {
        self.set_zoom_clamped(self.zoom + steps * ZOOM_STEP);
    }

    /// `delta` is in screen pixels with y pointing up; dragging right/up moves the map with the
    /// cursor, which shifts the view the other way.
    pub fn pan_by_screen_delta(&mut self, delta: Vec2) {
        let zoom = self.zoom.max(f32::EPSILON);
        self.pan = self.pan - delta * zoom.recip();
        self.clamp_pan();
    }

    pub fn projection(&self) -> Projection {
        Projection {
            pan: self.pan,
            zoom: self.zoom,
            viewport: self.viewport,
        }
    }

    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        self.projection().screen_to_world(screen)
    }

    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        self.projection().world_to_screen(world)
    }

    fn clamp_pan(&mut self) {
        let Some(map_size) = self.map_size else {
            return;
        };
        let visible_width = self.viewport.width as f32 / self.zoom;
        let visible_height = self.viewport.height as f32 / self.zoom;
        let max_x = (map_size.x - visible_width).max(0.0);
        let max_y = (map_size.y - visible_height).max(0.0);
        self.pan.x = self.pan.x.clamp(0.0, max_x);
        self.pan.y = self.pan.y.clamp(0.0, max_y);
    }
}
