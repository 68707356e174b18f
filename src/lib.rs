pub mod error;
pub mod renderer_builder;
pub mod rendering;
pub mod utils;

pub use env_logger;
pub use fontdue;
pub use gl;
pub use itertools;
pub use log;
pub use nalgebra_glm as glm;
pub use stb_image;
pub use winit;

/// All features that are very common to use.
pub mod prelude {
    pub use crate::error::*;
    pub use crate::glm;
    pub use crate::glm::vec2;
    pub use crate::glm::vec4;
    pub use crate::glm::Mat4;
    pub use crate::glm::Vec2;
    pub use crate::glm::Vec4;
    pub use crate::itertools::Itertools;
    pub use crate::log;
    pub use crate::renderer_builder::RendererAttributes;
    pub use crate::rendering::batch_renderer::BatchRenderer;
    pub use crate::rendering::context::{GlContext, GraphicsContext, SharedContext};
    pub use crate::rendering::data::{LineParams, QuadParams, UvRect, Vertex};
    pub use crate::rendering::glyph_atlas::{FontAtlas, GlyphAtlas, GlyphRect};
    pub use crate::rendering::recording::RecordingContext;
    pub use crate::rendering::render_target::RenderTarget;
    pub use crate::rendering::shader::{ShaderDialect, ShaderProgram, ShaderStage};
    pub use crate::rendering::texture::{
        FilterMode, Liveness, PixelData, PixelSource, Sampled, Texture, TextureLoad,
    };
    pub use crate::utils::constants::*;
    pub use crate::utils::tools::*;
    pub use gl::types::*;
}
