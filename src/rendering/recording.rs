use crate::glm;
use crate::rendering::context::GraphicsContext;
use crate::rendering::data::Vertex;
use crate::rendering::shader::ShaderStage;
use crate::rendering::texture::TextureDescriptor;
use gl::types::*;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

/// one call made into a [`RecordingContext`]
#[derive(Debug, Clone, PartialEq)]
pub enum GpuCommand {
    CompileShader { id: GLuint, stage: ShaderStage },
    LinkProgram { id: GLuint },
    DeleteShader(GLuint),
    DeleteProgram(GLuint),
    UseProgram(GLuint),
    UniformMatrix4 { program: GLuint, location: GLint, matrix: glm::Mat4 },
    CreateTexture { id: GLuint, descriptor: TextureDescriptor, has_pixels: bool },
    BindTexture(GLuint),
    DeleteTexture(GLuint),
    CreateFramebuffer { id: GLuint, attachment: GLuint, status: GLenum },
    BindFramebuffer(GLuint),
    DeleteFramebuffer(GLuint),
    Viewport { width: u32, height: u32 },
    Clear([f32; 4]),
    EnableAlphaBlending,
    DisableFaceCulling,
    CreateBuffer(GLuint),
    DeleteBuffer(GLuint),
    UploadVertices { buffer: GLuint, count: usize },
    UploadIndices { buffer: GLuint, count: usize },
    VertexAttribPointer { location: GLuint, components: GLint, stride: usize, offset: usize },
    DrawIndexedTriangles { count: usize },
}

/// A single draw submission with the state that was bound when it was issued.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub program: GLuint,
    pub texture: GLuint,
    pub framebuffer: GLuint,
    /// the contents of the vertex buffer at draw time
    pub vertices: Vec<Vertex>,
    /// the drawn part of the index buffer
    pub indices: Vec<GLushort>,
}

#[derive(Debug)]
struct ShaderInfo {
    uniforms: Vec<String>,
    attributes: Vec<String>,
}

#[derive(Debug)]
struct ProgramInfo {
    uniforms: Vec<(String, GLint)>,
    attributes: Vec<(String, GLint)>,
}

#[derive(Debug)]
struct RecorderState {
    next_id: GLuint,
    commands: Vec<GpuCommand>,
    draw_calls: Vec<DrawCall>,
    shaders: HashMap<GLuint, ShaderInfo>,
    programs: HashMap<GLuint, ProgramInfo>,
    textures: HashMap<GLuint, TextureDescriptor>,
    framebuffers: HashSet<GLuint>,
    buffers: HashSet<GLuint>,
    vertex_data: HashMap<GLuint, Vec<Vertex>>,
    index_data: HashMap<GLuint, Vec<GLushort>>,
    uniform_values: HashMap<(GLuint, GLint), glm::Mat4>,
    bound_program: GLuint,
    bound_texture: GLuint,
    bound_framebuffer: GLuint,
    bound_vertex_buffer: GLuint,
    bound_index_buffer: GLuint,
    viewport: Option<(u32, u32)>,
    compile_failure: Option<String>,
    link_failure: Option<String>,
    framebuffer_complete: bool,
}

impl RecorderState {
    fn new() -> Self {
        Self {
            next_id: 1,
            commands: Vec::new(),
            draw_calls: Vec::new(),
            shaders: HashMap::new(),
            programs: HashMap::new(),
            textures: HashMap::new(),
            framebuffers: HashSet::new(),
            buffers: HashSet::new(),
            vertex_data: HashMap::new(),
            index_data: HashMap::new(),
            uniform_values: HashMap::new(),
            bound_program: 0,
            bound_texture: 0,
            bound_framebuffer: 0,
            bound_vertex_buffer: 0,
            bound_index_buffer: 0,
            viewport: None,
            compile_failure: None,
            link_failure: None,
            framebuffer_complete: true,
        }
    }

    fn gen_id(&mut self) -> GLuint {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

/// A headless [`GraphicsContext`] that records every call instead of talking to a GPU.
///
/// Shader sources are scanned for ``attribute``/``in`` and ``uniform`` declarations so linked programs
/// report realistic active resources. Empty sources fail to compile. Failures of the next compile or link
/// and incomplete framebuffers can be requested explicitly.
#[derive(Debug)]
pub struct RecordingContext {
    state: RefCell<RecorderState>,
}

impl RecordingContext {
    pub fn new() -> Self {
        Self {
            state: RefCell::new(RecorderState::new()),
        }
    }

    /// makes the next shader compilation fail with the given log
    pub fn fail_compile(&self, log: &str) {
        self.state.borrow_mut().compile_failure = Some(log.to_string());
    }

    /// makes the next program link fail with the given log
    pub fn fail_link(&self, log: &str) {
        self.state.borrow_mut().link_failure = Some(log.to_string());
    }

    /// controls the status reported for newly created framebuffers
    pub fn set_framebuffer_complete(&self, complete: bool) {
        self.state.borrow_mut().framebuffer_complete = complete;
    }

    /// all recorded commands in call order
    pub fn commands(&self) -> Vec<GpuCommand> {
        self.state.borrow().commands.clone()
    }

    /// forgets the recorded commands and draw calls, resource state is kept
    pub fn clear_commands(&self) {
        let mut state = self.state.borrow_mut();
        state.commands.clear();
        state.draw_calls.clear();
    }

    pub fn draw_calls(&self) -> Vec<DrawCall> {
        self.state.borrow().draw_calls.clone()
    }

    pub fn draw_call_count(&self) -> usize {
        self.state.borrow().draw_calls.len()
    }

    /// the last matrix uploaded to the named uniform of a program
    pub fn uniform_matrix(&self, program: GLuint, name: &str) -> Option<glm::Mat4> {
        let state = self.state.borrow();
        let location = state
            .programs
            .get(&program)?
            .uniforms
            .iter()
            .find(|(uniform, _)| uniform == name)?
            .1;
        state.uniform_values.get(&(program, location)).copied()
    }

    /// the descriptor a live texture was created with
    pub fn texture_descriptor(&self, texture: GLuint) -> Option<TextureDescriptor> {
        self.state.borrow().textures.get(&texture).copied()
    }

    pub fn bound_program(&self) -> GLuint {
        self.state.borrow().bound_program
    }

    pub fn bound_texture(&self) -> GLuint {
        self.state.borrow().bound_texture
    }

    pub fn bound_framebuffer(&self) -> GLuint {
        self.state.borrow().bound_framebuffer
    }

    /// the last viewport size that was set
    pub fn viewport_size(&self) -> Option<(u32, u32)> {
        self.state.borrow().viewport
    }

    pub fn live_shaders(&self) -> usize {
        self.state.borrow().shaders.len()
    }

    pub fn live_programs(&self) -> usize {
        self.state.borrow().programs.len()
    }

    pub fn live_textures(&self) -> usize {
        self.state.borrow().textures.len()
    }

    pub fn live_framebuffers(&self) -> usize {
        self.state.borrow().framebuffers.len()
    }

    pub fn live_buffers(&self) -> usize {
        self.state.borrow().buffers.len()
    }

    fn record(&self, command: GpuCommand) {
        self.state.borrow_mut().commands.push(command);
    }
}

impl Default for RecordingContext {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicsContext for RecordingContext {
    fn compile_shader(&self, stage: ShaderStage, source: &str) -> Result<GLuint, String> {
        let mut state = self.state.borrow_mut();
        if let Some(log) = state.compile_failure.take() {
            return Err(log);
        }
        if source.trim().is_empty() {
            return Err("empty shader source".to_string());
        }
        let id = state.gen_id();
        let (uniforms, attributes) = scan_declarations(stage, source);
        state.shaders.insert(id, ShaderInfo { uniforms, attributes });
        state.commands.push(GpuCommand::CompileShader { id, stage });
        Ok(id)
    }

    fn link_program(&self, vertex: GLuint, fragment: GLuint) -> Result<GLuint, String> {
        let mut state = self.state.borrow_mut();
        if let Some(log) = state.link_failure.take() {
            return Err(log);
        }
        let (Some(vs), Some(fs)) = (state.shaders.get(&vertex), state.shaders.get(&fragment)) else {
            return Err("invalid shader object".to_string());
        };
        let mut uniform_names: Vec<&String> = Vec::new();
        for name in vs.uniforms.iter().chain(&fs.uniforms) {
            if !uniform_names.contains(&name) {
                uniform_names.push(name);
            }
        }
        let uniforms = located(uniform_names);
        let attributes = located(vs.attributes.iter().collect());
        let id = state.gen_id();
        state.programs.insert(id, ProgramInfo { uniforms, attributes });
        state.commands.push(GpuCommand::LinkProgram { id });
        Ok(id)
    }

    fn delete_shader(&self, shader: GLuint) {
        let mut state = self.state.borrow_mut();
        state.shaders.remove(&shader);
        state.commands.push(GpuCommand::DeleteShader(shader));
    }

    fn delete_program(&self, program: GLuint) {
        let mut state = self.state.borrow_mut();
        state.programs.remove(&program);
        state.uniform_values.retain(|(owner, _), _| *owner != program);
        if state.bound_program == program {
            state.bound_program = 0;
        }
        state.commands.push(GpuCommand::DeleteProgram(program));
    }

    fn active_uniforms(&self, program: GLuint) -> Vec<(String, GLint)> {
        self.state
            .borrow()
            .programs
            .get(&program)
            .map(|info| info.uniforms.clone())
            .unwrap_or_default()
    }

    fn active_attributes(&self, program: GLuint) -> Vec<(String, GLint)> {
        self.state
            .borrow()
            .programs
            .get(&program)
            .map(|info| info.attributes.clone())
            .unwrap_or_default()
    }

    fn use_program(&self, program: GLuint) {
        let mut state = self.state.borrow_mut();
        state.bound_program = program;
        state.commands.push(GpuCommand::UseProgram(program));
    }

    fn uniform_matrix4(&self, location: GLint, matrix: &glm::Mat4) {
        let mut state = self.state.borrow_mut();
        let program = state.bound_program;
        state.uniform_values.insert((program, location), *matrix);
        state.commands.push(GpuCommand::UniformMatrix4 {
            program,
            location,
            matrix: *matrix,
        });
    }

    fn create_texture(&self, descriptor: &TextureDescriptor, pixels: Option<&[u8]>) -> GLuint {
        let mut state = self.state.borrow_mut();
        let id = state.gen_id();
        state.textures.insert(id, *descriptor);
        state.commands.push(GpuCommand::CreateTexture {
            id,
            descriptor: *descriptor,
            has_pixels: pixels.is_some(),
        });
        id
    }

    fn bind_texture(&self, texture: GLuint) {
        let mut state = self.state.borrow_mut();
        state.bound_texture = texture;
        state.commands.push(GpuCommand::BindTexture(texture));
    }

    fn delete_texture(&self, texture: GLuint) {
        let mut state = self.state.borrow_mut();
        state.textures.remove(&texture);
        if state.bound_texture == texture {
            state.bound_texture = 0;
        }
        state.commands.push(GpuCommand::DeleteTexture(texture));
    }

    fn create_framebuffer(&self, color_attachment: GLuint) -> (GLuint, GLenum) {
        let mut state = self.state.borrow_mut();
        let id = state.gen_id();
        let status = if state.framebuffer_complete && state.textures.contains_key(&color_attachment) {
            gl::FRAMEBUFFER_COMPLETE
        } else {
            gl::FRAMEBUFFER_INCOMPLETE_ATTACHMENT
        };
        state.framebuffers.insert(id);
        state.commands.push(GpuCommand::CreateFramebuffer {
            id,
            attachment: color_attachment,
            status,
        });
        (id, status)
    }

    fn bind_framebuffer(&self, framebuffer: GLuint) {
        let mut state = self.state.borrow_mut();
        state.bound_framebuffer = framebuffer;
        state.commands.push(GpuCommand::BindFramebuffer(framebuffer));
    }

    fn delete_framebuffer(&self, framebuffer: GLuint) {
        let mut state = self.state.borrow_mut();
        state.framebuffers.remove(&framebuffer);
        // deleting the bound framebuffer reverts to the default one
        if state.bound_framebuffer == framebuffer {
            state.bound_framebuffer = 0;
        }
        state.commands.push(GpuCommand::DeleteFramebuffer(framebuffer));
    }

    fn viewport(&self, width: u32, height: u32) {
        let mut state = self.state.borrow_mut();
        state.viewport = Some((width, height));
        state.commands.push(GpuCommand::Viewport { width, height });
    }

    fn clear(&self, color: [f32; 4]) {
        self.record(GpuCommand::Clear(color));
    }

    fn enable_alpha_blending(&self) {
        self.record(GpuCommand::EnableAlphaBlending);
    }

    fn disable_face_culling(&self) {
        self.record(GpuCommand::DisableFaceCulling);
    }

    fn create_buffer(&self) -> GLuint {
        let mut state = self.state.borrow_mut();
        let id = state.gen_id();
        state.buffers.insert(id);
        state.commands.push(GpuCommand::CreateBuffer(id));
        id
    }

    fn delete_buffer(&self, buffer: GLuint) {
        let mut state = self.state.borrow_mut();
        state.buffers.remove(&buffer);
        state.vertex_data.remove(&buffer);
        state.index_data.remove(&buffer);
        state.commands.push(GpuCommand::DeleteBuffer(buffer));
    }

    fn upload_vertices(&self, buffer: GLuint, vertices: &[Vertex]) {
        let mut state = self.state.borrow_mut();
        state.bound_vertex_buffer = buffer;
        state.vertex_data.insert(buffer, vertices.to_vec());
        state.commands.push(GpuCommand::UploadVertices {
            buffer,
            count: vertices.len(),
        });
    }

    fn upload_indices(&self, buffer: GLuint, indices: &[GLushort]) {
        let mut state = self.state.borrow_mut();
        state.bound_index_buffer = buffer;
        state.index_data.insert(buffer, indices.to_vec());
        state.commands.push(GpuCommand::UploadIndices {
            buffer,
            count: indices.len(),
        });
    }

    fn vertex_attrib_pointer(&self, location: GLuint, components: GLint, stride: usize, offset: usize) {
        self.record(GpuCommand::VertexAttribPointer {
            location,
            components,
            stride,
            offset,
        });
    }

    fn draw_indexed_triangles(&self, count: usize) {
        let mut state = self.state.borrow_mut();
        let vertices = state
            .vertex_data
            .get(&state.bound_vertex_buffer)
            .cloned()
            .unwrap_or_default();
        let indices = state
            .index_data
            .get(&state.bound_index_buffer)
            .map(|indices| indices[..count.min(indices.len())].to_vec())
            .unwrap_or_default();
        let call = DrawCall {
            program: state.bound_program,
            texture: state.bound_texture,
            framebuffer: state.bound_framebuffer,
            vertices,
            indices,
        };
        state.draw_calls.push(call);
        state.commands.push(GpuCommand::DrawIndexedTriangles { count });
    }
}

/// assigns consecutive locations in declaration order
fn located(names: Vec<&String>) -> Vec<(String, GLint)> {
    names
        .into_iter()
        .enumerate()
        .map(|(location, name)| (name.clone(), location as GLint))
        .collect()
}

/// Finds the uniform and vertex input names declared in a GLSL source.
fn scan_declarations(stage: ShaderStage, source: &str) -> (Vec<String>, Vec<String>) {
    let mut uniforms = Vec::new();
    let mut attributes = Vec::new();
    for statement in source.split(';') {
        let tokens: Vec<&str> = statement
            .split(|c: char| c.is_whitespace() || c == '(' || c == ')')
            .filter(|token| !token.is_empty())
            .collect();
        let Some(name) = tokens.last() else {
            continue;
        };
        let name = name.split('[').next().unwrap_or_default().to_string();
        if tokens.contains(&"uniform") {
            uniforms.push(name);
        } else if stage == ShaderStage::Vertex
            && (tokens.contains(&"attribute") || tokens.contains(&"in"))
        {
            attributes.push(name);
        }
    }
    (uniforms, attributes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_both_glsl_dialects() {
        let legacy = "attribute vec2 a_position;\nuniform mat4 u_proj;\nvarying vec2 v_uv;";
        assert_eq!(
            scan_declarations(ShaderStage::Vertex, legacy),
            (vec!["u_proj".to_string()], vec!["a_position".to_string()])
        );
        let modern = "layout(location = 0) in vec2 a_position;\nuniform highp mat4 u_proj;";
        assert_eq!(
            scan_declarations(ShaderStage::Vertex, modern),
            (vec!["u_proj".to_string()], vec!["a_position".to_string()])
        );
        // fragment inputs are varyings, not attributes
        let fragment = "in vec2 v_uv;\nuniform sampler2D u_texture;";
        assert_eq!(
            scan_declarations(ShaderStage::Fragment, fragment),
            (vec!["u_texture".to_string()], vec![])
        );
    }

    #[test]
    fn draw_calls_capture_bound_state() {
        let recorder = RecordingContext::new();
        let buffer = recorder.create_buffer();
        let index_buffer = recorder.create_buffer();
        recorder.use_program(7);
        recorder.bind_texture(3);
        recorder.upload_vertices(buffer, &[Vertex::default(); 3]);
        recorder.upload_indices(index_buffer, &[0, 1, 2, 0, 2, 3]);
        recorder.draw_indexed_triangles(3);

        let calls = recorder.draw_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program, 7);
        assert_eq!(calls[0].texture, 3);
        assert_eq!(calls[0].framebuffer, 0);
        assert_eq!(calls[0].vertices.len(), 3);
        assert_eq!(calls[0].indices, vec![0, 1, 2]);
    }

    #[test]
    fn requested_failures_apply_once() {
        let recorder = RecordingContext::new();
        recorder.fail_compile("syntax error");
        assert_eq!(
            recorder.compile_shader(ShaderStage::Vertex, "void main() {}"),
            Err("syntax error".to_string())
        );
        assert!(recorder
            .compile_shader(ShaderStage::Vertex, "void main() {}")
            .is_ok());
    }
}
