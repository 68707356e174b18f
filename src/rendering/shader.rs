use crate::error::ResourceError;
use crate::rendering::context::SharedContext;
use crate::utils::constants::{ATTR_COLOR, ATTR_POSITION, ATTR_TEXCOORDS};
use crate::utils::file::{BATCH_B_FRAG, BATCH_B_VERT, BATCH_L_FRAG, BATCH_L_VERT};
use std::borrow::Cow;
use gl::types::*;
use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};
use std::fs::read_to_string;
use std::path::Path;

/// pipeline stage of a single shader object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub(crate) fn to_gl(self) -> GLenum {
        match self {
            ShaderStage::Vertex => gl::VERTEX_SHADER,
            ShaderStage::Fragment => gl::FRAGMENT_SHADER,
        }
    }
}

impl Display for ShaderStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// GLSL flavor of the built-in program, it has to match the created context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ShaderDialect {
    /// desktop OpenGL 3.3 core profile
    #[default]
    Core,
    /// OpenGL ES 2.0 and newer
    Gles,
    /// desktop OpenGL 2.1
    Legacy,
}

impl ShaderDialect {
    /// the vertex and fragment sources of the built-in program
    pub fn batch_sources(self) -> (Cow<'static, str>, Cow<'static, str>) {
        let header = match self {
            ShaderDialect::Core => {
                return (Cow::Borrowed(BATCH_B_VERT), Cow::Borrowed(BATCH_B_FRAG));
            }
            ShaderDialect::Gles => "#version 100\nprecision mediump float;\n",
            ShaderDialect::Legacy => "#version 120\n",
        };
        (
            Cow::Owned(format!("{header}{BATCH_L_VERT}")),
            Cow::Owned(format!("{header}{BATCH_L_FRAG}")),
        )
    }
}

/// A linked shader program with the locations of all its active uniforms and attributes.
///
/// A program whose compilation or linking failed is inert: it holds no GPU object, [`ShaderProgram::is_usable`]
/// returns false and the renderer refuses to bind it.
pub struct ShaderProgram {
    id: Option<GLuint>,
    uniform_locations: HashMap<String, GLint>,
    attrib_locations: HashMap<String, GLint>,
    context: SharedContext,
}

impl ShaderProgram {
    /// Compiles and links a program from sources. Failures are logged and yield an inert program.
    pub fn new(context: &SharedContext, vertex_src: &str, fragment_src: &str) -> Self {
        match Self::build(context, vertex_src, fragment_src) {
            Ok(program) => program,
            Err(err) => {
                log::error!("{err}");
                Self::inert(context)
            }
        }
    }

    /// Compiles and links a program from sources and reports the first failure.
    pub fn build(
        context: &SharedContext,
        vertex_src: &str,
        fragment_src: &str,
    ) -> Result<Self, ResourceError> {
        let vs = compile_shader(context, ShaderStage::Vertex, vertex_src)?;
        let fs = match compile_shader(context, ShaderStage::Fragment, fragment_src) {
            Ok(fs) => fs,
            Err(err) => {
                context.delete_shader(vs);
                return Err(err);
            }
        };
        let linked = context.link_program(vs, fs);
        // the stages are not needed anymore after linking, whatever the outcome
        context.delete_shader(vs);
        context.delete_shader(fs);
        let id = linked.map_err(|log| ResourceError::Link { log })?;

        let mut program = Self {
            id: Some(id),
            uniform_locations: HashMap::new(),
            attrib_locations: HashMap::new(),
            context: context.clone(),
        };
        program.cache_locations();
        log::debug!(
            "linked shader program {id} ({} uniforms, {} attributes)",
            program.uniform_locations.len(),
            program.attrib_locations.len()
        );
        Ok(program)
    }

    /// loads the shader sources from files and builds the program
    pub fn from_files(
        context: &SharedContext,
        vertex_file: impl AsRef<Path>,
        fragment_file: impl AsRef<Path>,
    ) -> Result<Self, ResourceError> {
        let vs_file = read_source(vertex_file.as_ref())?;
        let fs_file = read_source(fragment_file.as_ref())?;
        Self::build(context, &vs_file, &fs_file)
    }

    /// builds the built-in textured and tinted 2D program for a core profile context
    pub fn default_program(context: &SharedContext) -> Result<Self, ResourceError> {
        Self::default_program_for(context, ShaderDialect::Core)
    }

    /// builds the built-in program in the GLSL dialect of the context
    pub fn default_program_for(
        context: &SharedContext,
        dialect: ShaderDialect,
    ) -> Result<Self, ResourceError> {
        let (vertex_src, fragment_src) = dialect.batch_sources();
        Self::build(context, &vertex_src, &fragment_src)
    }

    /// a program that failed to build
    fn inert(context: &SharedContext) -> Self {
        Self {
            id: None,
            uniform_locations: HashMap::new(),
            attrib_locations: HashMap::new(),
            context: context.clone(),
        }
    }

    /// stores the locations of every active uniform and attribute
    fn cache_locations(&mut self) {
        let Some(id) = self.id else {
            return;
        };
        self.uniform_locations = self.context.active_uniforms(id).into_iter().collect();
        self.attrib_locations = self.context.active_attributes(id).into_iter().collect();
    }

    /// the gl program handle, `None` if the program failed to build
    #[inline]
    pub fn id(&self) -> Option<GLuint> {
        self.id
    }

    /// checks if the program was built and can be used for drawing
    #[inline]
    pub fn is_usable(&self) -> bool {
        self.id.is_some()
    }

    /// gets an uniform location, logs an error and yields `None` if it is not an active uniform
    pub fn get_unif(&self, name: &str) -> Option<GLint> {
        let location = self.uniform_locations.get(name).copied();
        if location.is_none() {
            log::error!("uniform not found or inactive: {name}");
        }
        location
    }

    /// gets an attrib location, logs an error and yields `-1` if it is not an active attribute
    pub fn get_attr(&self, name: &str) -> GLint {
        match self.attrib_locations.get(name) {
            Some(&location) if location >= 0 => location,
            _ => {
                log::error!("attribute not found or inactive: {name}");
                -1
            }
        }
    }

    /// Resolves the position, texture coordinate and tint attributes of the batch vertex layout.
    /// Yields the names of the missing ones on failure.
    pub(crate) fn batch_attribs(&self) -> Result<[GLuint; 3], Vec<String>> {
        let names = [ATTR_POSITION, ATTR_TEXCOORDS, ATTR_COLOR];
        let locations = names.map(|name| self.get_attr(name));
        let missing: Vec<String> = names
            .iter()
            .zip(locations)
            .filter(|(_, location)| *location < 0)
            .map(|(name, _)| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(missing);
        }
        Ok(locations.map(|location| location as GLuint))
    }
}

impl fmt::Debug for ShaderProgram {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShaderProgram")
            .field("id", &self.id)
            .field("uniform_locations", &self.uniform_locations)
            .field("attrib_locations", &self.attrib_locations)
            .finish()
    }
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        if let Some(id) = self.id.take() {
            self.context.delete_program(id);
        }
    }
}

/// compiles a gl shader
fn compile_shader(
    context: &SharedContext,
    stage: ShaderStage,
    src: &str,
) -> Result<GLuint, ResourceError> {
    context
        .compile_shader(stage, src)
        .map_err(|log| ResourceError::Compile { stage, log })
}

/// reads a shader source file
fn read_source(path: &Path) -> Result<String, ResourceError> {
    read_to_string(path).map_err(|err| ResourceError::Load {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })
}
