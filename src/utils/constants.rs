pub const WIN_TITLE: &str = "Leaf Batch";
pub const DEFAULT_WIN_WIDTH: u32 = 800;
pub const DEFAULT_WIN_HEIGHT: u32 = 450;

/// default vertex capacity of the batch
pub const DEFAULT_MAX_VERTICES: usize = 4096;
/// default index capacity of the batch
pub const DEFAULT_MAX_INDICES: usize = 6144;
/// the largest vertex capacity addressable with 16 bit indices
pub const MAX_VERTEX_CAPACITY: usize = u16::MAX as usize + 1;
/// default number of perimeter segments of a circle
pub const DEFAULT_CIRCLE_SEGMENTS: u32 = 32;

// required names of the batch shader interface
pub const ATTR_POSITION: &str = "a_position";
pub const ATTR_TEXCOORDS: &str = "a_texcoords";
pub const ATTR_COLOR: &str = "a_color";
pub const UNIF_PROJ: &str = "u_proj";
pub const UNIF_TEXTURE: &str = "u_texture";

/// texture coordinate used for all untextured shapes (the center of the white pixel)
pub const WHITE_UV: f32 = 0.5;

/// lines shorter than this do not define a direction
pub const MIN_SEGMENT_LENGTH: f32 = 0.001;

/// the characters rasterized into a font atlas if nothing else is requested
pub const DEFAULT_CHARS: &str = concat!(
    " !\"#$%&'()*+,-./0123456789:;",
    "@ABCDEFGHIJKLMNOPQRSTUVWXYZ",
    "[\\]^_`abcdefghijklmnopqrstuvwxyz{|}~",
    "áàâäãåçéèêëíìîïñóòôöõúùûüýÿÁÀÂÄÃÅÇÉÈÊËÍÌÎÏÑÓÒÔÖÕÚÙÛÜÝ"
);

/// the widest atlas texture that is ever created
pub const MAX_ATLAS_WIDTH: u32 = 2048;
/// extra pixels around every glyph cell, horizontally
pub const GLYPH_PADDING_X: u32 = 2;
/// extra pixels around every glyph cell, vertically
pub const GLYPH_PADDING_Y: u32 = 4;
