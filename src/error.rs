use crate::rendering::shader::ShaderStage;
use gl::types::GLenum;
use std::path::PathBuf;
use thiserror::Error;

/// result type of all fallible renderer operations
pub type RenderResult<T> = Result<T, RenderError>;

/// all errors the renderer reports to its caller
#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Resource(#[from] ResourceError),
}

impl RenderError {
    /// checks if this is a malformed-input error
    pub fn is_validation(&self) -> bool {
        matches!(self, RenderError::Validation(_))
    }

    /// checks if this is a fatal configuration error
    pub fn is_configuration(&self) -> bool {
        matches!(self, RenderError::Configuration(_))
    }
}

/// The bound shader cannot be used with the fixed batch vertex layout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("shader is missing required vertex attributes: {}", .missing.join(", "))]
    MissingAttributes { missing: Vec<String> },
}

/// Malformed primitive input. Nothing was written to the batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{primitive} requires at least {required} points ({} values), got {given} values", .required * 2)]
    TooFewPoints {
        primitive: &'static str,
        required: usize,
        given: usize,
    },
    #[error("{primitive} coordinates must come in (x, y) pairs, got {given} values")]
    OddCoordinateCount {
        primitive: &'static str,
        given: usize,
    },
    #[error("a circle needs at least one segment")]
    ZeroSegments,
    #[error("primitive needs {vertices} vertices and {indices} indices, the batch holds {max_vertices} and {max_indices}")]
    PrimitiveTooLarge {
        vertices: usize,
        indices: usize,
        max_vertices: usize,
        max_indices: usize,
    },
}

/// A GPU resource could not be created or is no longer usable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceError {
    #[error("error compiling {stage} shader: {log}")]
    Compile { stage: ShaderStage, log: String },
    #[error("error linking program: {log}")]
    Link { log: String },
    #[error("framebuffer is not complete (status {status:#x})")]
    IncompleteFramebuffer { status: GLenum },
    #[error("failed to load {}: {reason}", .path.display())]
    Load { path: PathBuf, reason: String },
    #[error("failed to parse font: {reason}")]
    Font { reason: String },
    #[error("pixel data holds {given} bytes, expected {width}x{height} RGBA8 pixels")]
    InvalidPixelData { width: u32, height: u32, given: usize },
    #[error("resource was already destroyed")]
    Destroyed,
    #[error("shader program failed to build and cannot be used")]
    Unusable,
}
