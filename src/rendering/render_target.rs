use crate::error::ResourceError;
use crate::rendering::context::SharedContext;
use crate::rendering::texture::{FilterMode, Liveness, Sampled, Texture};
use crate::utils::tools::ortho_projection;
use crate::glm;
use gl::types::*;
use std::fmt;

/// An offscreen color target: an empty texture attached to a framebuffer object.
///
/// The target owns both GPU objects and releases them on [`RenderTarget::destroy`] or when dropped.
pub struct RenderTarget {
    fbo: GLuint,
    texture: Option<Texture>,
    width: u32,
    height: u32,
    status: GLenum,
    context: SharedContext,
}

impl RenderTarget {
    /// creates a new render target with linear filtering
    pub fn new(context: &SharedContext, width: u32, height: u32) -> Self {
        Self::with_filter(context, width, height, FilterMode::Linear)
    }

    /// Creates a new render target. An incomplete framebuffer is logged, the target stays usable.
    pub fn with_filter(
        context: &SharedContext,
        width: u32,
        height: u32,
        filter: FilterMode,
    ) -> Self {
        let texture = Texture::empty(context, width, height, filter);
        let (fbo, status) = context.create_framebuffer(texture.id());
        if status != gl::FRAMEBUFFER_COMPLETE {
            log::warn!("{}", ResourceError::IncompleteFramebuffer { status });
        }
        log::debug!("created render target {fbo} ({width}x{height})");
        Self {
            fbo,
            texture: Some(texture),
            width,
            height,
            status,
            context: context.clone(),
        }
    }

    /// the completeness status reported at creation
    pub fn check_status(&self) -> Result<(), ResourceError> {
        if self.status == gl::FRAMEBUFFER_COMPLETE {
            Ok(())
        } else {
            Err(ResourceError::IncompleteFramebuffer {
                status: self.status,
            })
        }
    }

    /// Releases the framebuffer and its texture. Calling this again has no effect.
    pub fn destroy(&mut self) {
        if self.fbo != 0 {
            log::debug!("destroyed render target {}", self.fbo);
            self.context.delete_framebuffer(self.fbo);
            self.fbo = 0;
        }
        self.texture = None;
    }

    #[inline]
    pub fn is_destroyed(&self) -> bool {
        self.fbo == 0
    }

    /// the framebuffer handle, fails after the target was destroyed
    pub fn framebuffer(&self) -> Result<GLuint, ResourceError> {
        if self.is_destroyed() {
            return Err(ResourceError::Destroyed);
        }
        Ok(self.fbo)
    }

    /// the color attachment, ``None`` after the target was destroyed
    pub fn texture(&self) -> Option<&Texture> {
        self.texture.as_ref()
    }

    #[inline]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// the projection used while drawing into this target
    pub fn projection(&self) -> glm::Mat4 {
        ortho_projection(self.width, self.height)
    }
}

impl Sampled for RenderTarget {
    fn texture_id(&self) -> GLuint {
        self.texture.as_ref().map_or(0, Texture::id)
    }

    fn liveness(&self) -> Liveness {
        self.texture
            .as_ref()
            .map_or_else(Liveness::revoked, Sampled::liveness)
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }
}

impl fmt::Debug for RenderTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderTarget")
            .field("fbo", &self.fbo)
            .field("texture", &self.texture)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("status", &self.status)
            .finish()
    }
}

impl Drop for RenderTarget {
    fn drop(&mut self) {
        self.destroy();
    }
}
