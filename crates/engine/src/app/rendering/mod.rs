mod canvas;
mod renderer;

pub use canvas::FrameCanvas;
pub use renderer::Renderer;

use crate::app::resources::TextureHandle;
use crate::app::view::Projection;
use crate::math::Vec2;

pub const CLEAR_COLOR: [u8; 4] = [20, 22, 28, 255];

/// Draw target handed to layers during render.
pub trait SpriteRenderer {
    fn set_projection(&mut self, projection: Projection);

    fn projection(&self) -> Projection;

    /// `position` is the bottom-left corner of the sprite in world units; rotation is
    /// counter-clockwise around the sprite centre.
    fn draw_sprite(
        &mut self,
        texture: TextureHandle,
        position: Vec2,
        size: Vec2,
        rotation_degrees: f32,
    );
}
