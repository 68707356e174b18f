use super::context::SharedContext;
use super::data::{LineParams, QuadParams, UvRect, Vertex};
use super::glyph_atlas::GlyphAtlas;
use super::render_target::RenderTarget;
use super::shader::ShaderProgram;
use super::texture::{Liveness, PixelData, Sampled, Texture};
use crate::error::{ConfigurationError, RenderResult, ResourceError, ValidationError};
use crate::glm;
use crate::renderer_builder::RendererAttributes;
use crate::utils::constants::{MIN_SEGMENT_LENGTH, UNIF_PROJ, WHITE_UV};
use crate::utils::tools::{ortho_projection, rotate_translate};
use gl::types::*;
use itertools::Itertools;
use std::f32::consts::TAU;
use std::rc::Rc;

/// the framebuffer currently drawn into, if it is not the default surface
#[derive(Debug, Clone)]
struct BoundTarget {
    framebuffer: GLuint,
    width: u32,
    height: u32,
    liveness: Liveness,
}

/// the texture the current batch samples from
#[derive(Debug, Clone)]
struct BoundTexture {
    id: GLuint,
    liveness: Liveness,
}

impl BoundTexture {
    fn of(texture: &impl Sampled) -> Self {
        Self {
            id: texture.texture_id(),
            liveness: texture.liveness(),
        }
    }

    fn is_alive(&self) -> bool {
        self.id != 0 && self.liveness.is_alive()
    }

    fn same_as(&self, other: &Self) -> bool {
        self.id == other.id && self.liveness.same_resource(&other.liveness)
    }
}

/// everything the next draw call depends on
#[derive(Debug)]
struct BindingState {
    texture: Option<BoundTexture>,
    shader: Option<Rc<ShaderProgram>>,
    target: Option<BoundTarget>,
    projection: glm::Mat4,
}

/// Batching 2D renderer: accumulates primitives in staging buffers and submits them in as few draw calls as possible.
///
/// A batch is flushed whenever the texture, shader or render target changes, when the staging buffers would
/// overflow and at the end of a frame. Draw order is always preserved.
pub struct BatchRenderer {
    context: SharedContext,
    vbo: GLuint,
    ibo: GLuint,
    vertices: Vec<Vertex>,
    indices: Vec<GLushort>,
    max_vertices: usize,
    max_indices: usize,
    binding: BindingState,
    color: glm::Vec4,
    surface_size: (u32, u32),
    circle_segments: u32,
    white_texture: Texture,
    default_shader: Rc<ShaderProgram>,
    draw_calls: usize,
}

impl BatchRenderer {
    /// Creates a new renderer with the built-in shader and the white pixel texture bound.
    pub fn new(context: &SharedContext, attributes: RendererAttributes) -> RenderResult<Self> {
        let default_shader = Rc::new(ShaderProgram::default_program_for(
            context,
            attributes.shader_dialect(),
        )?);
        let white_texture = Texture::new(
            context,
            &PixelData::white_pixel(),
            attributes.default_filter(),
        )?;
        let (width, height) = attributes.surface_size();
        let mut renderer = Self {
            context: context.clone(),
            vbo: context.create_buffer(),
            ibo: context.create_buffer(),
            vertices: Vec::with_capacity(attributes.max_vertices()),
            indices: Vec::with_capacity(attributes.max_indices()),
            max_vertices: attributes.max_vertices(),
            max_indices: attributes.max_indices(),
            binding: BindingState {
                texture: None,
                shader: None,
                target: None,
                projection: ortho_projection(width, height),
            },
            color: glm::vec4(1.0, 1.0, 1.0, 1.0),
            surface_size: (width, height),
            circle_segments: attributes.circle_segments(),
            white_texture,
            default_shader,
            draw_calls: 0,
        };
        renderer.set_shader_program(None)?;
        renderer.binding.texture = Some(BoundTexture::of(&renderer.white_texture));
        log::debug!(
            "created batch renderer ({} vertices, {} indices)",
            renderer.max_vertices,
            renderer.max_indices
        );
        Ok(renderer)
    }

    /// enables alpha blending, disables face culling and resets the draw call counter
    pub fn begin_frame(&mut self) {
        self.context.enable_alpha_blending();
        self.context.disable_face_culling();
        self.draw_calls = 0;
    }

    /// submits everything that is still pending
    pub fn end_frame(&mut self) -> RenderResult<()> {
        self.flush()
    }

    /// Clears the currently bound surface. Pending geometry is submitted first so it is not wiped.
    pub fn clear(&mut self, r: f32, g: f32, b: f32, a: f32) -> RenderResult<()> {
        self.flush()?;
        self.context.clear([r, g, b, a]);
        Ok(())
    }

    /// sets the tint of all following vertices
    pub fn set_color(&mut self, r: f32, g: f32, b: f32, a: f32) {
        self.color = glm::vec4(r, g, b, a);
    }

    /// Samples from another texture from now on. Switching to a different texture submits the current batch.
    pub fn set_texture(&mut self, texture: &impl Sampled) -> RenderResult<()> {
        self.bind_texture(BoundTexture::of(texture))
    }

    fn bind_texture(&mut self, texture: BoundTexture) -> RenderResult<()> {
        if !texture.is_alive() {
            return Err(ResourceError::Destroyed.into());
        }
        let unchanged = self
            .binding
            .texture
            .as_ref()
            .is_some_and(|current| current.same_as(&texture));
        if !unchanged {
            self.flush()?;
            self.binding.texture = Some(texture);
        }
        Ok(())
    }

    /// Uses another shader program from now on, ``None`` selects the built-in one.
    /// Programs that failed to build are refused. Geometry a program without the batch layout could not draw
    /// is handed over to the new program.
    pub fn set_shader_program(&mut self, shader: Option<&Rc<ShaderProgram>>) -> RenderResult<()> {
        let shader = shader.unwrap_or(&self.default_shader).clone();
        if !shader.is_usable() {
            log::error!("attempted to bind an unusable shader program");
            return Err(ResourceError::Unusable.into());
        }
        let unchanged = self
            .binding
            .shader
            .as_ref()
            .is_some_and(|current| Rc::ptr_eq(current, &shader));
        if !unchanged {
            let outgoing_drawable = self
                .binding
                .shader
                .as_ref()
                .is_none_or(|current| current.batch_attribs().is_ok());
            if outgoing_drawable {
                self.flush()?;
            } else if !self.indices.is_empty() {
                log::warn!(
                    "handing {} pending vertices over to the next shader program",
                    self.vertices.len()
                );
            }
            self.binding.shader = Some(shader);
            self.upload_projection();
        }
        Ok(())
    }

    /// Draws into an offscreen target from now on, ``None`` selects the default surface.
    /// The current batch is submitted to the previous target first.
    pub fn set_render_target(&mut self, target: Option<&RenderTarget>) -> RenderResult<()> {
        let next = match target {
            Some(target) => {
                let (width, height) = target.size();
                Some(BoundTarget {
                    framebuffer: target.framebuffer()?,
                    width,
                    height,
                    liveness: target.liveness(),
                })
            }
            None => None,
        };
        self.flush()?;

        match next {
            Some(ref bound) => {
                self.context.bind_framebuffer(bound.framebuffer);
                self.context.viewport(bound.width, bound.height);
                self.binding.projection = ortho_projection(bound.width, bound.height);
                log::debug!(
                    "bound render target {} ({}x{})",
                    bound.framebuffer,
                    bound.width,
                    bound.height
                );
            }
            None => {
                let (width, height) = self.surface_size;
                if self.binding.target.is_some() {
                    self.context.bind_framebuffer(0);
                    self.context.viewport(width, height);
                    log::debug!("bound default surface ({width}x{height})");
                }
                self.binding.projection = ortho_projection(width, height);
            }
        }
        self.binding.target = next;
        self.upload_projection();
        Ok(())
    }

    /// Updates the size of the default surface, e.g. after the window was resized.
    pub fn resize_surface(&mut self, width: u32, height: u32) -> RenderResult<()> {
        self.flush()?;
        self.surface_size = (width, height);
        log::trace!("resized default surface to {width}x{height}");
        if self.binding.target.is_none() {
            self.context.viewport(width, height);
            self.binding.projection = ortho_projection(width, height);
            self.upload_projection();
        }
        Ok(())
    }

    /// uploads the current projection to the bound shader
    fn upload_projection(&self) {
        let Some(shader) = self.binding.shader.as_ref() else {
            return;
        };
        let Some(program) = shader.id() else {
            return;
        };
        self.context.use_program(program);
        if let Some(location) = shader.get_unif(UNIF_PROJ) {
            self.context.uniform_matrix4(location, &self.binding.projection);
        }
    }

    /// Submits all pending geometry in one draw call. Fails without touching the batch if the bound shader does
    /// not provide the vertex layout or the bound texture or target was destroyed.
    pub fn flush(&mut self) -> RenderResult<()> {
        if self.indices.is_empty() {
            return Ok(());
        }
        let (Some(texture), Some(shader)) = (self.binding.texture.as_ref(), self.binding.shader.as_ref()) else {
            return Ok(());
        };
        let target_alive = self
            .binding
            .target
            .as_ref()
            .is_none_or(|target| target.liveness.is_alive());
        if !texture.is_alive() || !target_alive {
            log::error!("pending geometry refers to a destroyed texture or render target");
            return Err(ResourceError::Destroyed.into());
        }
        let texture = texture.id;
        let Some(program) = shader.id() else {
            return Err(ResourceError::Unusable.into());
        };
        let [position, uv, color] = shader
            .batch_attribs()
            .map_err(|missing| ConfigurationError::MissingAttributes { missing })?;

        self.context.use_program(program);
        self.context.upload_vertices(self.vbo, &self.vertices);
        self.context.upload_indices(self.ibo, &self.indices);
        self.context
            .vertex_attrib_pointer(position, 2, Vertex::STRIDE, Vertex::POSITION_OFFSET);
        self.context
            .vertex_attrib_pointer(uv, 2, Vertex::STRIDE, Vertex::UV_OFFSET);
        self.context
            .vertex_attrib_pointer(color, 4, Vertex::STRIDE, Vertex::COLOR_OFFSET);
        self.context.bind_texture(texture);
        self.context.draw_indexed_triangles(self.indices.len());
        log::trace!(
            "flushed {} vertices, {} indices",
            self.vertices.len(),
            self.indices.len()
        );

        self.vertices.clear();
        self.indices.clear();
        self.draw_calls += 1;
        Ok(())
    }

    /// Throws away all pending geometry. Bindings of destroyed resources fall back to the white texture and
    /// the default surface, so drawing can continue afterwards.
    pub fn discard(&mut self) {
        if !self.indices.is_empty() {
            log::warn!("discarded {} pending vertices", self.vertices.len());
        }
        self.vertices.clear();
        self.indices.clear();

        if !self.binding.texture.as_ref().is_some_and(BoundTexture::is_alive) {
            self.binding.texture = Some(BoundTexture::of(&self.white_texture));
        }
        let target_dead = self
            .binding
            .target
            .as_ref()
            .is_some_and(|target| !target.liveness.is_alive());
        if target_dead {
            let (width, height) = self.surface_size;
            self.binding.target = None;
            self.context.bind_framebuffer(0);
            self.context.viewport(width, height);
            self.binding.projection = ortho_projection(width, height);
            self.upload_projection();
            log::debug!("render target was destroyed, bound default surface ({width}x{height})");
        }
    }

    /// submits the batch if the given amount of geometry would not fit anymore
    fn ensure_space(&mut self, num_vertices: usize, num_indices: usize) -> RenderResult<()> {
        if self.vertices.len() + num_vertices > self.max_vertices
            || self.indices.len() + num_indices > self.max_indices
        {
            self.flush()?;
        }
        Ok(())
    }

    /// rejects primitives that could never fit into the staging buffers
    fn check_capacity(&self, num_vertices: usize, num_indices: usize) -> RenderResult<()> {
        if num_vertices > self.max_vertices || num_indices > self.max_indices {
            return Err(ValidationError::PrimitiveTooLarge {
                vertices: num_vertices,
                indices: num_indices,
                max_vertices: self.max_vertices,
                max_indices: self.max_indices,
            }
            .into());
        }
        Ok(())
    }

    /// selects the texture and makes room for a primitive
    fn prepare(&mut self, texture: BoundTexture, num_vertices: usize, num_indices: usize) -> RenderResult<()> {
        self.check_capacity(num_vertices, num_indices)?;
        self.bind_texture(texture)?;
        self.ensure_space(num_vertices, num_indices)
    }

    #[inline]
    fn white(&self) -> BoundTexture {
        BoundTexture::of(&self.white_texture)
    }

    /// index of the next vertex that is written
    #[inline]
    fn base_index(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    fn push_vertex(&mut self, position: glm::Vec2, u: f32, v: f32) {
        self.vertices
            .push(Vertex::new(position.x, position.y, u, v, &self.color));
    }

    #[inline]
    fn push_indices(&mut self, base: usize, offsets: &[usize]) {
        self.indices
            .extend(offsets.iter().map(|offset| (base + offset) as GLushort));
    }

    /// writes four corners as two triangles
    fn push_quad(&mut self, corners: [glm::Vec2; 4], uv: &UvRect) {
        let base = self.base_index();
        let uvs = [
            (uv.u1, uv.v1),
            (uv.u2, uv.v1),
            (uv.u2, uv.v2),
            (uv.u1, uv.v2),
        ];
        for (corner, (u, v)) in corners.into_iter().zip(uvs) {
            self.push_vertex(corner, u, v);
        }
        self.push_indices(base, &[0, 1, 2, 0, 2, 3]);
    }

    /// Draws a textured quad at ``(x, y)``. Its size is the size of the sampled region times the scale,
    /// rotation and scale happen around the pivot.
    pub fn draw_texture(
        &mut self,
        texture: &impl Sampled,
        x: f32,
        y: f32,
        params: &QuadParams,
    ) -> RenderResult<()> {
        self.prepare(BoundTexture::of(texture), 4, 6)?;
        let width = texture.width() as f32 * params.uv.width() * params.scale.x;
        let height = texture.height() as f32 * params.uv.height() * params.scale.y;
        let corners = quad_corners(
            glm::vec2(x, y),
            width,
            height,
            params.pivot,
            params.rotation,
        );
        self.push_quad(corners, &params.uv);
        Ok(())
    }

    /// Fills a rectangle in the current color, rotated around its top left corner.
    pub fn fill_rect(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        rotation: f32,
    ) -> RenderResult<()> {
        self.prepare(self.white(), 4, 6)?;
        let corners = quad_corners(glm::vec2(x, y), width, height, glm::vec2(0.0, 0.0), rotation);
        self.push_quad(corners, &UvRect::new(WHITE_UV, WHITE_UV, WHITE_UV, WHITE_UV));
        Ok(())
    }

    /// fills a circle with the configured number of segments
    pub fn draw_circle(&mut self, x: f32, y: f32, radius: f32) -> RenderResult<()> {
        self.draw_circle_segments(x, y, radius, self.circle_segments)
    }

    /// Fills a circle as a triangle fan around its center.
    pub fn draw_circle_segments(
        &mut self,
        x: f32,
        y: f32,
        radius: f32,
        segments: u32,
    ) -> RenderResult<()> {
        if segments == 0 {
            return Err(ValidationError::ZeroSegments.into());
        }
        let segments = segments as usize;
        self.prepare(self.white(), segments + 1, segments * 3)?;

        let base = self.base_index();
        self.push_vertex(glm::vec2(x, y), WHITE_UV, WHITE_UV);
        for i in 0..segments {
            let angle = i as f32 / segments as f32 * TAU;
            let point = glm::vec2(x + angle.cos() * radius, y + angle.sin() * radius);
            self.push_vertex(point, WHITE_UV, WHITE_UV);
        }
        for i in 0..segments {
            self.push_indices(base, &[0, 1 + i, 1 + (i + 1) % segments]);
        }
        Ok(())
    }

    /// Fills a polygon given as ``[x0, y0, x1, y1, ...]`` by fanning out from the first point.
    /// Only convex polygons are tessellated correctly.
    pub fn draw_polygon(&mut self, points: &[f32]) -> RenderResult<()> {
        let points = parse_points("polygon", points, 3)?;
        let count = points.len();
        self.prepare(self.white(), count, (count - 2) * 3)?;

        let base = self.base_index();
        for &point in points.iter() {
            self.push_vertex(point, WHITE_UV, WHITE_UV);
        }
        for i in 1..count - 1 {
            self.push_indices(base, &[0, i, i + 1]);
        }
        Ok(())
    }

    /// Strokes a line strip given as ``[x0, y0, x1, y1, ...]`` with a constant thickness.
    pub fn draw_lines(&mut self, points: &[f32], params: &LineParams) -> RenderResult<()> {
        let points = parse_points("line", points, 2)?;
        let count = points.len();
        let num_segments = if params.closed { count } else { count - 1 };
        self.prepare(self.white(), count * 2, num_segments * 6)?;

        let half = params.thickness / 2.0;
        let base = self.base_index();
        for (i, &point) in points.iter().enumerate() {
            let normal = line_normal(&points, i, params.closed) * half;
            self.push_vertex(point + normal, WHITE_UV, WHITE_UV);
            self.push_vertex(point - normal, WHITE_UV, WHITE_UV);
        }
        for i in 0..num_segments {
            let curr = i * 2;
            let next = (i + 1) % count * 2;
            self.push_indices(base, &[curr, curr + 1, next, curr + 1, next + 1, next]);
        }
        Ok(())
    }

    /// Draws a string with its top left corner at ``(x, y)``. Line breaks start a new line at ``x``,
    /// characters without a glyph use the space glyph or are skipped.
    pub fn draw_text(
        &mut self,
        atlas: &impl GlyphAtlas,
        text: &str,
        x: f32,
        y: f32,
    ) -> RenderResult<()> {
        let texture = atlas.texture();
        self.check_capacity(4, 6)?;
        self.set_texture(texture)?;

        let tex_size = (texture.width(), texture.height());
        let (mut cursor_x, mut cursor_y) = (x, y);
        for ch in text.chars() {
            if ch == '\n' {
                cursor_x = x;
                cursor_y += atlas.line_height();
                continue;
            }
            let Some(rect) = atlas.glyph(ch) else {
                continue;
            };
            let (width, height) = (rect.width as f32, rect.height as f32);
            let uv = UvRect::from_pixels(rect.x as f32, rect.y as f32, width, height, tex_size);
            self.ensure_space(4, 6)?;
            let corners = quad_corners(
                glm::vec2(cursor_x, cursor_y),
                width,
                height,
                glm::vec2(0.0, 0.0),
                0.0,
            );
            self.push_quad(corners, &uv);
            cursor_x += width;
        }
        Ok(())
    }

    /// the number of vertices waiting for the next flush
    #[inline]
    pub fn pending_vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// the number of indices waiting for the next flush
    #[inline]
    pub fn pending_index_count(&self) -> usize {
        self.indices.len()
    }

    /// the projection of the currently bound surface
    #[inline]
    pub fn projection(&self) -> &glm::Mat4 {
        &self.binding.projection
    }

    #[inline]
    pub fn color(&self) -> glm::Vec4 {
        self.color
    }

    /// the texture used for untextured shapes
    #[inline]
    pub fn white_texture(&self) -> &Texture {
        &self.white_texture
    }

    /// the program used when no shader is selected
    #[inline]
    pub fn default_shader(&self) -> &Rc<ShaderProgram> {
        &self.default_shader
    }

    /// the texture the current batch samples from
    #[inline]
    pub fn current_texture(&self) -> Option<GLuint> {
        self.binding.texture.as_ref().map(|bound| bound.id)
    }

    /// the size of the default surface
    #[inline]
    pub fn surface_size(&self) -> (u32, u32) {
        self.surface_size
    }

    #[inline]
    pub fn max_vertices(&self) -> usize {
        self.max_vertices
    }

    #[inline]
    pub fn max_indices(&self) -> usize {
        self.max_indices
    }

    /// the number of draw calls issued since the frame began
    #[inline]
    pub fn draw_calls(&self) -> usize {
        self.draw_calls
    }
}

impl Drop for BatchRenderer {
    fn drop(&mut self) {
        self.context.delete_buffer(self.vbo);
        self.context.delete_buffer(self.ibo);
        log::debug!("deleted batch renderer");
    }
}

/// corners of a rectangle with its pivot at ``position``, clockwise from the top left
fn quad_corners(
    position: glm::Vec2,
    width: f32,
    height: f32,
    pivot: glm::Vec2,
    rotation: f32,
) -> [glm::Vec2; 4] {
    let (sin, cos) = rotation.sin_cos();
    let x1 = -pivot.x * width;
    let y1 = -pivot.y * height;
    [
        glm::vec2(x1, y1),
        glm::vec2(x1 + width, y1),
        glm::vec2(x1 + width, y1 + height),
        glm::vec2(x1, y1 + height),
    ]
    .map(|corner| rotate_translate(corner, cos, sin, position))
}

/// converts flat coordinates into points and validates their count
fn parse_points(
    primitive: &'static str,
    values: &[f32],
    required: usize,
) -> RenderResult<Vec<glm::Vec2>> {
    if values.len() % 2 != 0 {
        return Err(ValidationError::OddCoordinateCount {
            primitive,
            given: values.len(),
        }
        .into());
    }
    if values.len() < required * 2 {
        return Err(ValidationError::TooFewPoints {
            primitive,
            required,
            given: values.len(),
        }
        .into());
    }
    Ok(values
        .iter()
        .copied()
        .tuples()
        .map(|(x, y)| glm::vec2(x, y))
        .collect())
}

/// unit normal of the segment from ``from`` to ``to``, pointing up for degenerate segments
fn segment_normal(from: glm::Vec2, to: glm::Vec2) -> glm::Vec2 {
    let delta = to - from;
    let length = delta.norm();
    if length > MIN_SEGMENT_LENGTH {
        glm::vec2(-delta.y / length, delta.x / length)
    } else {
        glm::vec2(0.0, 1.0)
    }
}

/// Offset direction of one point of a line strip. Closed loops blend the adjacent segments,
/// open strips use the outgoing segment and the incoming one at the end.
fn line_normal(points: &[glm::Vec2], i: usize, closed: bool) -> glm::Vec2 {
    let count = points.len();
    if closed {
        let outgoing = segment_normal(points[i], points[(i + 1) % count]);
        let incoming = segment_normal(points[(i + count - 1) % count], points[i]);
        let blended = incoming + outgoing;
        let length = blended.norm();
        if length > MIN_SEGMENT_LENGTH {
            blended / length
        } else {
            outgoing
        }
    } else if i + 1 < count {
        segment_normal(points[i], points[i + 1])
    } else {
        segment_normal(points[i - 1], points[i])
    }
}
