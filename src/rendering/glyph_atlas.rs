use crate::error::ResourceError;
use crate::rendering::context::SharedContext;
use crate::rendering::texture::{FilterMode, PixelData, Sampled, Texture};
use crate::utils::constants::{GLYPH_PADDING_X, GLYPH_PADDING_Y, MAX_ATLAS_WIDTH};
use fontdue::{Font, FontSettings};
use itertools::Itertools;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// region of one glyph in atlas texture pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GlyphRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// A texture packing many glyphs, looked up by character.
pub trait GlyphAtlas {
    /// the exact region of a character, if it was packed
    fn lookup(&self, ch: char) -> Option<GlyphRect>;

    /// the texture all regions refer to
    fn texture(&self) -> &Texture;

    /// vertical advance of a line break
    fn line_height(&self) -> f32;

    /// looks up a character and falls back to the space glyph
    fn glyph(&self, ch: char) -> Option<GlyphRect> {
        self.lookup(ch).or_else(|| self.lookup(' '))
    }
}

/// Result of laying out glyph cells in rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphLayout {
    pub width: u32,
    pub height: u32,
    pub rects: HashMap<char, GlyphRect>,
}

/// Packs cells of a shared height into rows of an atlas that is roughly square but never wider than the maximum.
/// The atlas is exactly as high as the rows that are used.
pub fn pack_glyphs(cells: &[(char, u32)], cell_height: u32) -> GlyphLayout {
    let total_width: u64 = cells.iter().map(|&(_, width)| width as u64).sum();
    let widest = cells.iter().map(|&(_, width)| width).max().unwrap_or(0);
    let square = ((total_width * cell_height as u64) as f64).sqrt().ceil() as u32;
    let width = square.min(MAX_ATLAS_WIDTH).max(widest).max(1);

    let mut rects = HashMap::with_capacity(cells.len());
    let (mut x, mut y) = (0, 0);
    for &(ch, cell_width) in cells {
        if x + cell_width > width {
            x = 0;
            y += cell_height;
        }
        rects.insert(
            ch,
            GlyphRect {
                x,
                y,
                width: cell_width,
                height: cell_height,
            },
        );
        x += cell_width;
    }
    let height = if cells.is_empty() { 1 } else { y + cell_height };
    GlyphLayout {
        width,
        height,
        rects,
    }
}

/// A glyph atlas rasterized from a TrueType/OpenType font with ``fontdue``.
///
/// Glyphs are white with their coverage in the alpha channel so the tint color applies directly.
#[derive(Debug)]
pub struct FontAtlas {
    texture: Texture,
    rects: HashMap<char, GlyphRect>,
    font_size: f32,
}

impl FontAtlas {
    /// rasterizes the given characters of a font file
    pub fn from_file(
        context: &SharedContext,
        path: impl AsRef<Path>,
        font_size: f32,
        filter: FilterMode,
        chars: &str,
    ) -> Result<Self, ResourceError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|err| ResourceError::Load {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        Self::from_bytes(context, &bytes, font_size, filter, chars)
    }

    /// rasterizes the given characters of an in-memory font
    pub fn from_bytes(
        context: &SharedContext,
        font_bytes: &[u8],
        font_size: f32,
        filter: FilterMode,
        chars: &str,
    ) -> Result<Self, ResourceError> {
        let font = Font::from_bytes(font_bytes, FontSettings::default())
            .map_err(|reason| ResourceError::Font {
                reason: reason.to_string(),
            })?;

        let cell_height = font_size.ceil() as u32 + GLYPH_PADDING_Y;
        let cells: Vec<(char, u32)> = chars
            .chars()
            .unique()
            .map(|ch| {
                let advance = font.metrics(ch, font_size).advance_width;
                (ch, advance.ceil().max(0.0) as u32 + GLYPH_PADDING_X)
            })
            .collect();
        let layout = pack_glyphs(&cells, cell_height);

        let ascent = font
            .horizontal_line_metrics(font_size)
            .map_or(font_size, |metrics| metrics.ascent);
        let mut pixels = PixelData::filled(layout.width, layout.height, [255, 255, 255, 0]);
        for (&ch, rect) in layout.rects.iter() {
            let (metrics, bitmap) = font.rasterize(ch, font_size);
            // the glyph origin sits one pixel in and two pixels down from the cell corner
            let left = rect.x as i32 + 1 + metrics.xmin;
            let baseline = rect.y as f32 + 2.0 + ascent;
            let top = baseline.round() as i32 - metrics.ymin - metrics.height as i32;
            blit_coverage(&mut pixels, rect, left, top, metrics.width, &bitmap);
        }

        let texture = Texture::new(context, &pixels, filter)?;
        log::debug!(
            "created font atlas with {} glyphs ({}x{})",
            layout.rects.len(),
            layout.width,
            layout.height
        );
        Ok(Self {
            texture,
            rects: layout.rects,
            font_size,
        })
    }

    #[inline]
    pub fn font_size(&self) -> f32 {
        self.font_size
    }

    /// Sums the advances of all characters that would be drawn, the height is one line.
    pub fn measure_text(&self, text: &str) -> (f32, f32) {
        let width = text
            .chars()
            .filter(|&ch| ch != '\n')
            .filter_map(|ch| self.glyph(ch))
            .map(|rect| rect.width as f32)
            .sum();
        (width, self.font_size)
    }

    /// the atlas size in pixels
    pub fn size(&self) -> (u32, u32) {
        (self.texture.width(), self.texture.height())
    }
}

impl GlyphAtlas for FontAtlas {
    fn lookup(&self, ch: char) -> Option<GlyphRect> {
        self.rects.get(&ch).copied()
    }

    fn texture(&self) -> &Texture {
        &self.texture
    }

    fn line_height(&self) -> f32 {
        self.font_size
    }
}

/// writes glyph coverage into the alpha channel, clipped to the glyph cell
fn blit_coverage(
    pixels: &mut PixelData,
    cell: &GlyphRect,
    left: i32,
    top: i32,
    glyph_width: usize,
    coverage: &[u8],
) {
    if glyph_width == 0 {
        return;
    }
    let atlas_width = pixels.width as i32;
    let (cell_left, cell_top) = (cell.x as i32, cell.y as i32);
    let (cell_right, cell_bottom) = (cell_left + cell.width as i32, cell_top + cell.height as i32);
    for (row, line) in coverage.chunks(glyph_width).enumerate() {
        let y = top + row as i32;
        if y < cell_top || y >= cell_bottom {
            continue;
        }
        for (column, &alpha) in line.iter().enumerate() {
            let x = left + column as i32;
            if x < cell_left || x >= cell_right {
                continue;
            }
            let index = ((y * atlas_width + x) * 4 + 3) as usize;
            pixels.data[index] = alpha;
        }
    }
}
