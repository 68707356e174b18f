use crate::glm;
use crate::rendering::data::Vertex;
use crate::rendering::shader::ShaderStage;
use crate::rendering::texture::{TextureDescriptor, WrapMode};
use gl::types::*;
use std::ffi::{CStr, CString};
use std::ptr;
use std::rc::Rc;

/// shared handle to the GPU context used by all resources of one renderer
pub type SharedContext = Rc<dyn GraphicsContext>;

/// The GPU capabilities the renderer and its resources need.
///
/// All handles are plain GL object names, ``0`` is never a valid object (and means the default framebuffer).
/// Implementations are expected to be used from the thread that owns the context only.
pub trait GraphicsContext {
    /// Compiles one shader stage. On failure the shader object is already deleted and the info log is returned.
    fn compile_shader(&self, stage: ShaderStage, source: &str) -> Result<GLuint, String>;
    /// Links two compiled stages. On failure the program object is already deleted and the info log is returned.
    fn link_program(&self, vertex: GLuint, fragment: GLuint) -> Result<GLuint, String>;
    fn delete_shader(&self, shader: GLuint);
    fn delete_program(&self, program: GLuint);
    /// all active uniforms of a linked program with their locations
    fn active_uniforms(&self, program: GLuint) -> Vec<(String, GLint)>;
    /// all active vertex attributes of a linked program with their locations
    fn active_attributes(&self, program: GLuint) -> Vec<(String, GLint)>;
    fn use_program(&self, program: GLuint);
    /// uploads a column major 4x4 matrix to the currently used program
    fn uniform_matrix4(&self, location: GLint, matrix: &glm::Mat4);

    /// allocates a 2D RGBA8 texture, uninitialized if no pixels are given
    fn create_texture(&self, descriptor: &TextureDescriptor, pixels: Option<&[u8]>) -> GLuint;
    fn bind_texture(&self, texture: GLuint);
    fn delete_texture(&self, texture: GLuint);

    /// Creates a framebuffer with the texture as its color attachment and returns it with its completeness status.
    /// The previously bound framebuffer stays bound.
    fn create_framebuffer(&self, color_attachment: GLuint) -> (GLuint, GLenum);
    fn bind_framebuffer(&self, framebuffer: GLuint);
    fn delete_framebuffer(&self, framebuffer: GLuint);
    fn viewport(&self, width: u32, height: u32);
    fn clear(&self, color: [f32; 4]);
    /// straight alpha blending (src alpha, one minus src alpha)
    fn enable_alpha_blending(&self);
    fn disable_face_culling(&self);

    fn create_buffer(&self) -> GLuint;
    fn delete_buffer(&self, buffer: GLuint);
    fn upload_vertices(&self, buffer: GLuint, vertices: &[Vertex]);
    fn upload_indices(&self, buffer: GLuint, indices: &[GLushort]);
    /// enables the attribute and points it into the currently bound vertex buffer
    fn vertex_attrib_pointer(&self, location: GLuint, components: GLint, stride: usize, offset: usize);
    /// draws ``count`` indices of the bound index buffer as a triangle list
    fn draw_indexed_triangles(&self, count: usize);
}

/// [`GraphicsContext`] backed by the loaded OpenGL functions.
#[derive(Debug)]
pub struct GlContext {
    vao: GLuint,
}

impl GlContext {
    /// Wraps the current OpenGL context. Requires ``gl::load_with`` to have been called with a current context.
    pub fn new() -> Self {
        let mut vao = 0;
        // core profiles refuse to draw without a bound vertex array, ES 2.0 and GL 2.1 have none
        if gl::GenVertexArrays::is_loaded() {
            unsafe {
                gl::GenVertexArrays(1, &mut vao);
                gl::BindVertexArray(vao);
            }
        }
        log::debug!("created gl context wrapper (vao {vao})");
        Self { vao }
    }

    /// wraps the context and shares it
    pub fn shared() -> SharedContext {
        Rc::new(Self::new())
    }
}

impl Default for GlContext {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for GlContext {
    fn drop(&mut self) {
        if self.vao != 0 {
            unsafe { gl::DeleteVertexArrays(1, &self.vao) };
        }
    }
}

impl GraphicsContext for GlContext {
    fn compile_shader(&self, stage: ShaderStage, source: &str) -> Result<GLuint, String> {
        let c_str = CString::new(source.as_bytes()).map_err(|err| err.to_string())?;
        unsafe {
            let shader = gl::CreateShader(stage.to_gl());
            gl::ShaderSource(shader, 1, &c_str.as_ptr(), ptr::null());
            gl::CompileShader(shader);

            let mut status = gl::FALSE as GLint;
            gl::GetShaderiv(shader, gl::COMPILE_STATUS, &mut status);

            if status != (gl::TRUE as GLint) {
                let mut len = 0;
                gl::GetShaderiv(shader, gl::INFO_LOG_LENGTH, &mut len);
                let mut buf = vec![0u8; len.max(1) as usize];
                gl::GetShaderInfoLog(
                    shader,
                    len,
                    ptr::null_mut(),
                    buf.as_mut_ptr() as *mut GLchar,
                );
                gl::DeleteShader(shader);
                return Err(info_log_to_string(buf));
            }
            Ok(shader)
        }
    }

    fn link_program(&self, vertex: GLuint, fragment: GLuint) -> Result<GLuint, String> {
        unsafe {
            let program = gl::CreateProgram();
            gl::AttachShader(program, vertex);
            gl::AttachShader(program, fragment);
            gl::LinkProgram(program);

            gl::DetachShader(program, fragment);
            gl::DetachShader(program, vertex);

            let mut status = gl::FALSE as GLint;
            gl::GetProgramiv(program, gl::LINK_STATUS, &mut status);

            if status != (gl::TRUE as GLint) {
                let mut len: GLint = 0;
                gl::GetProgramiv(program, gl::INFO_LOG_LENGTH, &mut len);
                let mut buf = vec![0u8; len.max(1) as usize];
                gl::GetProgramInfoLog(
                    program,
                    len,
                    ptr::null_mut(),
                    buf.as_mut_ptr() as *mut GLchar,
                );
                gl::DeleteProgram(program);
                return Err(info_log_to_string(buf));
            }
            Ok(program)
        }
    }

    fn delete_shader(&self, shader: GLuint) {
        unsafe { gl::DeleteShader(shader) };
    }

    fn delete_program(&self, program: GLuint) {
        unsafe { gl::DeleteProgram(program) };
    }

    fn active_uniforms(&self, program: GLuint) -> Vec<(String, GLint)> {
        unsafe {
            active_resources(
                program,
                gl::ACTIVE_UNIFORMS,
                gl::ACTIVE_UNIFORM_MAX_LENGTH,
                |index, max_len, name| {
                    let (mut size, mut ty) = (0, 0);
                    gl::GetActiveUniform(
                        program,
                        index,
                        max_len,
                        ptr::null_mut(),
                        &mut size,
                        &mut ty,
                        name,
                    );
                },
                |name| gl::GetUniformLocation(program, name.as_ptr()),
            )
        }
    }

    fn active_attributes(&self, program: GLuint) -> Vec<(String, GLint)> {
        unsafe {
            active_resources(
                program,
                gl::ACTIVE_ATTRIBUTES,
                gl::ACTIVE_ATTRIBUTE_MAX_LENGTH,
                |index, max_len, name| {
                    let (mut size, mut ty) = (0, 0);
                    gl::GetActiveAttrib(
                        program,
                        index,
                        max_len,
                        ptr::null_mut(),
                        &mut size,
                        &mut ty,
                        name,
                    );
                },
                |name| gl::GetAttribLocation(program, name.as_ptr()),
            )
        }
    }

    fn use_program(&self, program: GLuint) {
        unsafe { gl::UseProgram(program) };
    }

    fn uniform_matrix4(&self, location: GLint, matrix: &glm::Mat4) {
        unsafe { gl::UniformMatrix4fv(location, 1, gl::FALSE, &matrix[0]) };
    }

    fn create_texture(&self, descriptor: &TextureDescriptor, pixels: Option<&[u8]>) -> GLuint {
        let mut tex_id = 0;
        let filter = descriptor.filter.to_gl() as GLint;
        let wrap = match descriptor.wrap {
            WrapMode::Repeat => gl::REPEAT,
            WrapMode::ClampToEdge => gl::CLAMP_TO_EDGE,
        } as GLint;
        unsafe {
            gl::GenTextures(1, &mut tex_id);
            gl::BindTexture(gl::TEXTURE_2D, tex_id);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MIN_FILTER, filter);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MAG_FILTER, filter);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_S, wrap);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_T, wrap);
            gl::TexImage2D(
                gl::TEXTURE_2D,
                0,
                gl::RGBA as GLint,
                descriptor.width as GLsizei,
                descriptor.height as GLsizei,
                0,
                gl::RGBA,
                gl::UNSIGNED_BYTE,
                pixels.map_or(ptr::null(), |data| data.as_ptr() as *const GLvoid),
            );
            if descriptor.mipmaps {
                gl::GenerateMipmap(gl::TEXTURE_2D);
            }
            gl::BindTexture(gl::TEXTURE_2D, 0);
        }
        tex_id
    }

    fn bind_texture(&self, texture: GLuint) {
        unsafe {
            gl::ActiveTexture(gl::TEXTURE0);
            gl::BindTexture(gl::TEXTURE_2D, texture);
        }
    }

    fn delete_texture(&self, texture: GLuint) {
        unsafe { gl::DeleteTextures(1, &texture) };
    }

    fn create_framebuffer(&self, color_attachment: GLuint) -> (GLuint, GLenum) {
        let mut fbo = 0;
        let mut previous: GLint = 0;
        unsafe {
            gl::GetIntegerv(gl::FRAMEBUFFER_BINDING, &mut previous);
            gl::GenFramebuffers(1, &mut fbo);
            gl::BindFramebuffer(gl::FRAMEBUFFER, fbo);
            gl::FramebufferTexture2D(
                gl::FRAMEBUFFER,
                gl::COLOR_ATTACHMENT0,
                gl::TEXTURE_2D,
                color_attachment,
                0,
            );
            let status = gl::CheckFramebufferStatus(gl::FRAMEBUFFER);
            gl::BindFramebuffer(gl::FRAMEBUFFER, previous as GLuint);
            (fbo, status)
        }
    }

    fn bind_framebuffer(&self, framebuffer: GLuint) {
        unsafe { gl::BindFramebuffer(gl::FRAMEBUFFER, framebuffer) };
    }

    fn delete_framebuffer(&self, framebuffer: GLuint) {
        unsafe { gl::DeleteFramebuffers(1, &framebuffer) };
    }

    fn viewport(&self, width: u32, height: u32) {
        unsafe { gl::Viewport(0, 0, width as GLsizei, height as GLsizei) };
    }

    fn clear(&self, color: [f32; 4]) {
        unsafe {
            gl::ClearColor(color[0], color[1], color[2], color[3]);
            gl::Clear(gl::COLOR_BUFFER_BIT);
        }
    }

    fn enable_alpha_blending(&self) {
        unsafe {
            gl::Enable(gl::BLEND);
            gl::BlendFunc(gl::SRC_ALPHA, gl::ONE_MINUS_SRC_ALPHA);
        }
    }

    fn disable_face_culling(&self) {
        unsafe { gl::Disable(gl::CULL_FACE) };
    }

    fn create_buffer(&self) -> GLuint {
        let mut buffer = 0;
        unsafe { gl::GenBuffers(1, &mut buffer) };
        buffer
    }

    fn delete_buffer(&self, buffer: GLuint) {
        unsafe { gl::DeleteBuffers(1, &buffer) };
    }

    fn upload_vertices(&self, buffer: GLuint, vertices: &[Vertex]) {
        unsafe {
            gl::BindBuffer(gl::ARRAY_BUFFER, buffer);
            gl::BufferData(
                gl::ARRAY_BUFFER,
                size_of_val(vertices) as GLsizeiptr,
                vertices.as_ptr() as *const GLvoid,
                gl::DYNAMIC_DRAW,
            );
        }
    }

    fn upload_indices(&self, buffer: GLuint, indices: &[GLushort]) {
        unsafe {
            gl::BindBuffer(gl::ELEMENT_ARRAY_BUFFER, buffer);
            gl::BufferData(
                gl::ELEMENT_ARRAY_BUFFER,
                size_of_val(indices) as GLsizeiptr,
                indices.as_ptr() as *const GLvoid,
                gl::DYNAMIC_DRAW,
            );
        }
    }

    fn vertex_attrib_pointer(&self, location: GLuint, components: GLint, stride: usize, offset: usize) {
        unsafe {
            gl::EnableVertexAttribArray(location);
            gl::VertexAttribPointer(
                location,
                components,
                gl::FLOAT,
                gl::FALSE as GLboolean,
                stride as GLsizei,
                offset as *const GLvoid,
            );
        }
    }

    fn draw_indexed_triangles(&self, count: usize) {
        unsafe {
            gl::DrawElements(
                gl::TRIANGLES,
                count as GLsizei,
                gl::UNSIGNED_SHORT,
                ptr::null(),
            );
        }
    }
}

/// enumerates active program resources of one kind and resolves their locations
unsafe fn active_resources(
    program: GLuint,
    count_param: GLenum,
    max_len_param: GLenum,
    name_at: impl Fn(GLuint, GLsizei, *mut GLchar),
    location_of: impl Fn(&CStr) -> GLint,
) -> Vec<(String, GLint)> {
    let mut count: GLint = 0;
    let mut max_len: GLint = 0;
    gl::GetProgramiv(program, count_param, &mut count);
    gl::GetProgramiv(program, max_len_param, &mut max_len);

    (0..count.max(0) as GLuint)
        .filter_map(|index| {
            let mut buf = vec![0u8; max_len.max(1) as usize];
            name_at(index, max_len.max(1), buf.as_mut_ptr() as *mut GLchar);
            let name = CStr::from_bytes_until_nul(&buf).ok()?;
            let location = location_of(name);
            Some((name.to_string_lossy().into_owned(), location))
        })
        .collect()
}

/// converts a nul terminated gl info log
fn info_log_to_string(mut buf: Vec<u8>) -> String {
    if let Some(end) = buf.iter().position(|&byte| byte == 0) {
        buf.truncate(end);
    }
    String::from_utf8_lossy(&buf).trim_end().to_string()
}

/// retrieves a string value from gl
pub fn gl_string(variant: GLenum) -> Option<&'static CStr> {
    unsafe {
        let s = gl::GetString(variant);
        (!s.is_null()).then(|| CStr::from_ptr(s.cast()))
    }
}

/// prints info about the used gl renderer
pub fn log_gl_config() {
    if let Some(renderer) = gl_string(gl::RENDERER) {
        log::info!("Running on {}", renderer.to_string_lossy());
    }
    if let Some(version) = gl_string(gl::VERSION) {
        log::info!("OpenGL Version {}", version.to_string_lossy());
    }
    if let Some(shaders_version) = gl_string(gl::SHADING_LANGUAGE_VERSION) {
        log::info!("Shaders version on {}", shaders_version.to_string_lossy());
    }
}
