use crate::glm;
use std::mem;

#[derive(Default, Clone, Copy, Debug, PartialEq)]
#[repr(C)]
/// data for a single batch vertex (tightly packed, 8 floats)
pub struct Vertex {
    pub position: glm::Vec2,
    pub uv_coords: glm::Vec2,
    pub color: glm::Vec4,
}

impl Vertex {
    /// number of floats per vertex
    pub const FLOATS: usize = 8;
    /// byte stride between two vertices
    pub const STRIDE: usize = mem::size_of::<Vertex>();
    /// byte offset of the position attribute
    pub const POSITION_OFFSET: usize = mem::offset_of!(Vertex, position);
    /// byte offset of the texture coordinate attribute
    pub const UV_OFFSET: usize = mem::offset_of!(Vertex, uv_coords);
    /// byte offset of the tint attribute
    pub const COLOR_OFFSET: usize = mem::offset_of!(Vertex, color);

    /// creates a new vertex
    #[inline]
    pub fn new(x: f32, y: f32, u: f32, v: f32, color: &glm::Vec4) -> Self {
        Self {
            position: glm::vec2(x, y),
            uv_coords: glm::vec2(u, v),
            color: *color,
        }
    }
}

/// A normalized region of a texture, `(u1, v1)` is the top left and `(u2, v2)` the bottom right corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvRect {
    pub u1: f32,
    pub v1: f32,
    pub u2: f32,
    pub v2: f32,
}

impl UvRect {
    /// the whole texture
    pub const FULL: UvRect = UvRect {
        u1: 0.0,
        v1: 0.0,
        u2: 1.0,
        v2: 1.0,
    };

    /// creates a new uv rect from its corners
    pub fn new(u1: f32, v1: f32, u2: f32, v2: f32) -> Self {
        Self { u1, v1, u2, v2 }
    }

    /// converts a rectangle in texture pixel space into normalized coordinates
    pub fn from_pixels(x: f32, y: f32, width: f32, height: f32, tex_size: (u32, u32)) -> Self {
        let (tex_width, tex_height) = (tex_size.0 as f32, tex_size.1 as f32);
        Self {
            u1: x / tex_width,
            v1: y / tex_height,
            u2: (x + width) / tex_width,
            v2: (y + height) / tex_height,
        }
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.u2 - self.u1
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.v2 - self.v1
    }
}

impl Default for UvRect {
    fn default() -> Self {
        Self::FULL
    }
}

/// Per-call transform of a textured quad. Defaults: no rotation, unit scale, top left pivot, full texture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadParams {
    /// rotation in radians around the pivot
    pub rotation: f32,
    pub scale: glm::Vec2,
    /// normalized anchor in ``[0, 1]`` on both axes
    pub pivot: glm::Vec2,
    pub uv: UvRect,
}

impl QuadParams {
    /// creates the default parameter set
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, sx: f32, sy: f32) -> Self {
        self.scale = glm::vec2(sx, sy);
        self
    }

    pub fn with_pivot(mut self, px: f32, py: f32) -> Self {
        self.pivot = glm::vec2(px, py);
        self
    }

    pub fn with_uv(mut self, uv: UvRect) -> Self {
        self.uv = uv;
        self
    }
}

impl Default for QuadParams {
    fn default() -> Self {
        Self {
            rotation: 0.0,
            scale: glm::vec2(1.0, 1.0),
            pivot: glm::vec2(0.0, 0.0),
            uv: UvRect::FULL,
        }
    }
}

/// Stroke settings of a line strip. Defaults: 1 pixel thick, open.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineParams {
    pub thickness: f32,
    /// connects the last point back to the first one
    pub closed: bool,
}

impl LineParams {
    pub fn new(thickness: f32, closed: bool) -> Self {
        Self { thickness, closed }
    }
}

impl Default for LineParams {
    fn default() -> Self {
        Self {
            thickness: 1.0,
            closed: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_layout_is_tightly_packed() {
        assert_eq!(Vertex::STRIDE, Vertex::FLOATS * size_of::<f32>());
        assert_eq!(Vertex::POSITION_OFFSET, 0);
        assert_eq!(Vertex::UV_OFFSET, 8);
        assert_eq!(Vertex::COLOR_OFFSET, 16);
    }

    #[test]
    fn uv_rect_from_pixels() {
        let uv = UvRect::from_pixels(16.0, 32.0, 16.0, 32.0, (64, 128));
        assert_eq!(uv, UvRect::new(0.25, 0.25, 0.5, 0.5));
        assert_eq!(uv.width(), 0.25);
        assert_eq!(uv.height(), 0.25);
    }
}
