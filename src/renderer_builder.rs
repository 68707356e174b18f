use crate::glm;
use crate::rendering::shader::ShaderDialect;
use crate::rendering::texture::FilterMode;
use crate::utils::constants::*;

/// Configuration of a [`BatchRenderer`](crate::rendering::batch_renderer::BatchRenderer).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RendererAttributes {
    pub(crate) max_vertices: usize,
    pub(crate) max_indices: usize,
    pub(crate) surface_size: (u32, u32),
    pub(crate) circle_segments: u32,
    pub(crate) default_filter: FilterMode,
    pub(crate) clear_color: glm::Vec4,
    pub(crate) shader_dialect: ShaderDialect,
}

impl RendererAttributes {
    /// creates the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the vertex capacity of the batch. Values beyond the 16 bit index range are clamped.
    pub fn with_max_vertices(mut self, max_vertices: usize) -> Self {
        if max_vertices > MAX_VERTEX_CAPACITY {
            log::warn!(
                "vertex capacity {max_vertices} exceeds the 16 bit index range, using {MAX_VERTEX_CAPACITY}"
            );
        }
        self.max_vertices = max_vertices.min(MAX_VERTEX_CAPACITY);
        self
    }

    /// sets the index capacity of the batch
    pub fn with_max_indices(mut self, max_indices: usize) -> Self {
        self.max_indices = max_indices;
        self
    }

    /// sets the size of the default surface in pixels
    pub fn with_surface_size(mut self, width: u32, height: u32) -> Self {
        self.surface_size = (width, height);
        self
    }

    /// sets the default segment count of circles
    pub fn with_circle_segments(mut self, segments: u32) -> Self {
        self.circle_segments = segments;
        self
    }

    /// sets the filter of textures the renderer creates itself
    pub fn with_default_filter(mut self, filter: FilterMode) -> Self {
        self.default_filter = filter;
        self
    }

    pub fn with_clear_color(mut self, r: f32, g: f32, b: f32, a: f32) -> Self {
        self.clear_color = glm::vec4(r, g, b, a);
        self
    }

    /// selects the GLSL dialect of the built-in program, it has to match the context
    pub fn with_shader_dialect(mut self, dialect: ShaderDialect) -> Self {
        self.shader_dialect = dialect;
        self
    }

    #[inline]
    pub fn max_vertices(&self) -> usize {
        self.max_vertices
    }

    #[inline]
    pub fn max_indices(&self) -> usize {
        self.max_indices
    }

    #[inline]
    pub fn surface_size(&self) -> (u32, u32) {
        self.surface_size
    }

    #[inline]
    pub fn circle_segments(&self) -> u32 {
        self.circle_segments
    }

    #[inline]
    pub fn default_filter(&self) -> FilterMode {
        self.default_filter
    }

    #[inline]
    pub fn clear_color(&self) -> glm::Vec4 {
        self.clear_color
    }

    #[inline]
    pub fn shader_dialect(&self) -> ShaderDialect {
        self.shader_dialect
    }
}

impl Default for RendererAttributes {
    fn default() -> Self {
        Self {
            max_vertices: DEFAULT_MAX_VERTICES,
            max_indices: DEFAULT_MAX_INDICES,
            surface_size: (DEFAULT_WIN_WIDTH, DEFAULT_WIN_HEIGHT),
            circle_segments: DEFAULT_CIRCLE_SEGMENTS,
            default_filter: FilterMode::Nearest,
            clear_color: glm::vec4(0.0, 0.0, 0.0, 1.0),
            shader_dialect: ShaderDialect::Core,
        }
    }
}
