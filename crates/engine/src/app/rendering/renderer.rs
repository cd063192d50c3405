use std::collections::HashSet;
use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture};
use winit::window::Window;

use crate::app::resources::{ResourceManager, TextureHandle};
use crate::app::view::{Projection, Viewport};

use super::{FrameCanvas, SpriteRenderer};

/// Owns the window surface and presents one CPU-rasterized frame per call to
/// [`Renderer::render_frame`].
pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    viewport: Viewport,
    clear_color: [u8; 4],
    warned_missing_textures: HashSet<TextureHandle>,
}

impl Renderer {
    pub fn new(window: Arc<Window>, clear_color: [u8; 4]) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            viewport: Viewport {
                width: size.width,
                height: size.height,
            },
            clear_color,
            warned_missing_textures: HashSet::new(),
        })
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        self.viewport = Viewport { width, height };
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width, height, surface)
    }

    /// Clears, applies `projection`, lets `draw` issue sprites, then presents.
    pub fn render_frame(
        &mut self,
        resources: &ResourceManager,
        projection: Projection,
        draw: impl FnOnce(&mut dyn SpriteRenderer),
    ) -> Result<(), Error> {
        {
            let frame = self.pixels.frame_mut();
            let mut canvas = FrameCanvas::new(
                frame,
                self.viewport,
                resources,
                &mut self.warned_missing_textures,
            );
            canvas.clear(self.clear_color);
            canvas.set_projection(projection);
            draw(&mut canvas);
        }
        self.pixels.render()
    }
}
