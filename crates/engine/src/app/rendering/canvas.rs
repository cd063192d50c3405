use std::collections::HashSet;

use tracing::warn;

use crate::app::resources::{ResourceManager, Texture, TextureHandle};
use crate::app::view::{Projection, Viewport};
use crate::math::Vec2;

use super::SpriteRenderer;

const PLACEHOLDER_COLOR: [u8; 4] = [220, 220, 240, 255];

/// Software sprite rasterizer over an RGBA8 frame buffer.
pub struct FrameCanvas<'a> {
    frame: &'a mut [u8],
    viewport: Viewport,
    resources: &'a ResourceManager,
    projection: Projection,
    warned_missing_textures: &'a mut HashSet<TextureHandle>,
}

impl<'a> FrameCanvas<'a> {
    pub fn new(
        frame: &'a mut [u8],
        viewport: Viewport,
        resources: &'a ResourceManager,
        warned_missing_textures: &'a mut HashSet<TextureHandle>,
    ) -> Self {
        Self {
            frame,
            viewport,
            resources,
            projection: Projection::identity(viewport),
            warned_missing_textures,
        }
    }

    pub fn clear(&mut self, color: [u8; 4]) {
        for pixel in self.frame.chunks_exact_mut(4) {
            pixel.copy_from_slice(&color);
        }
    }

    fn draw_texture(
        &mut self,
        texture: &Texture,
        position: Vec2,
        size: Vec2,
        rotation_degrees: f32,
    ) {
        let zoom = self.projection.zoom;
        let half_w = size.x * zoom * 0.5;
        let half_h = size.y * zoom * 0.5;
        if !(half_w > 0.0 && half_h > 0.0) {
            return;
        }

        let center = self
            .projection
            .world_to_screen(position + size * 0.5);
        let theta = if rotation_degrees.is_finite() {
            rotation_degrees.to_radians()
        } else {
            0.0
        };
        let (sin, cos) = theta.sin_cos();
        let extent_x = (half_w * cos).abs() + (half_h * sin).abs();
        let extent_y = (half_w * sin).abs() + (half_h * cos).abs();

        let width = self.viewport.width as i32;
        let height = self.viewport.height as i32;
        let left = ((center.x - extent_x).floor() as i32).max(0);
        let right = ((center.x + extent_x).ceil() as i32).min(width);
        let top = ((center.y - extent_y).floor() as i32).max(0);
        let bottom = ((center.y + extent_y).ceil() as i32).min(height);
        if left >= right || top >= bottom {
            return;
        }

        let tex_w = texture.width();
        let tex_h = texture.height();
        for y in top..bottom {
            for x in left..right {
                // Screen y points down; flip to y-up before undoing the rotation.
                let dx = x as f32 + 0.5 - center.x;
                let dy = center.y - (y as f32 + 0.5);
                let local_x = dx * cos + dy * sin;
                let local_y = -dx * sin + dy * cos;
                if local_x.abs() > half_w || local_y.abs() > half_h {
                    continue;
                }

                let u = (local_x / (2.0 * half_w) + 0.5).clamp(0.0, 1.0);
                let v = (0.5 - local_y / (2.0 * half_h)).clamp(0.0, 1.0);
                let src_x = ((u * tex_w as f32) as u32).min(tex_w - 1);
                let src_y = ((v * tex_h as f32) as u32).min(tex_h - 1);
                if let Some(color) = texture.pixel(src_x, src_y) {
                    blend_pixel_clipped(self.frame, self.viewport.width as usize, x, y, color);
                }
            }
        }
    }

    fn draw_placeholder(&mut self, position: Vec2, size: Vec2) {
        let bottom_left = self.projection.world_to_screen(position);
        let top_right = self.projection.world_to_screen(position + size);
        let left = bottom_left.x.min(top_right.x).round() as i32;
        let right = bottom_left.x.max(top_right.x).round() as i32;
        let top = bottom_left.y.min(top_right.y).round() as i32;
        let bottom = bottom_left.y.max(top_right.y).round() as i32;
        let width = self.viewport.width as usize;

        for x in left..=right {
            write_pixel_rgba_clipped(self.frame, width, x, top, PLACEHOLDER_COLOR);
            write_pixel_rgba_clipped(self.frame, width, x, bottom, PLACEHOLDER_COLOR);
        }
        for y in top..=bottom {
            write_pixel_rgba_clipped(self.frame, width, left, y, PLACEHOLDER_COLOR);
            write_pixel_rgba_clipped(self.frame, width, right, y, PLACEHOLDER_COLOR);
        }
    }
}

impl SpriteRenderer for FrameCanvas<'_> {
    fn set_projection(&mut self, projection: Projection) {
        self.projection = projection;
    }

    fn projection(&self) -> Projection {
        self.projection
    }

    fn draw_sprite(
        &mut self,
        texture: TextureHandle,
        position: Vec2,
        size: Vec2,
        rotation_degrees: f32,
    ) {
        let resources = self.resources;
        match resources.texture(texture) {
            Some(loaded) => self.draw_texture(loaded, position, size, rotation_degrees),
            None => {
                if self.warned_missing_textures.insert(texture) {
                    warn!(
                        texture = texture.index(),
                        "renderer_texture_missing_using_placeholder"
                    );
                }
                self.draw_placeholder(position, size);
            }
        }
    }
}

fn blend_pixel_clipped(frame: &mut [u8], width: usize, x: i32, y: i32, color: [u8; 4]) {
    let alpha = color[3];
    if alpha == 0 {
        return;
    }
    if alpha == u8::MAX {
        write_pixel_rgba_clipped(frame, width, x, y, color);
        return;
    }
    let Some(range) = pixel_range(frame.len(), width, x, y) else {
        return;
    };
    let dst = &mut frame[range];
    let a = alpha as u32;
    for channel in 0..3 {
        let blended = (color[channel] as u32 * a + dst[channel] as u32 * (255 - a)) / 255;
        dst[channel] = blended as u8;
    }
    dst[3] = u8::MAX;
}

fn write_pixel_rgba_clipped(frame: &mut [u8], width: usize, x: i32, y: i32, color: [u8; 4]) {
    if let Some(range) = pixel_range(frame.len(), width, x, y) {
        frame[range].copy_from_slice(&color);
    }
}

fn pixel_range(frame_len: usize, width: usize, x: i32, y: i32) -> Option<std::ops::Range<usize>> {
    if x < 0 || y < 0 || x as usize >= width {
        return None;
    }
    let pixel_offset = (y as usize).checked_mul(width)?.checked_add(x as usize)?;
    let byte_offset = pixel_offset.checked_mul(4)?;
    let end = byte_offset.checked_add(4)?;
    (end <= frame_len).then_some(byte_offset..end)
}
