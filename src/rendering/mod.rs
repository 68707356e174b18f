pub mod batch_renderer;
pub mod context;
pub mod data;
pub mod glyph_atlas;
pub mod recording;
pub mod render_target;
pub mod shader;
pub mod texture;
