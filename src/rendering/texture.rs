use crate::error::ResourceError;
use crate::rendering::context::SharedContext;
use crate::utils::tools::is_power_of_two;
use gl::types::*;
use stb_image::image::{Image, LoadResult};
use std::cell::Cell;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::task::Poll;
use std::thread;

/// sampling filter of a texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterMode {
    #[default]
    Nearest,
    Linear,
}

impl FilterMode {
    pub(crate) fn to_gl(self) -> GLenum {
        match self {
            FilterMode::Nearest => gl::NEAREST,
            FilterMode::Linear => gl::LINEAR,
        }
    }
}

/// behavior of texture coordinates outside of ``[0, 1]``
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WrapMode {
    Repeat,
    ClampToEdge,
}

/// everything needed to allocate a 2D RGBA texture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureDescriptor {
    pub width: u32,
    pub height: u32,
    pub filter: FilterMode,
    pub wrap: WrapMode,
    pub mipmaps: bool,
}

impl TextureDescriptor {
    /// Derives the wrap mode from the size: power of two textures repeat and get a full mip chain,
    /// all others clamp to the edge without mips.
    pub fn for_image(width: u32, height: u32, filter: FilterMode) -> Self {
        let is_base2 = is_power_of_two(width) && is_power_of_two(height);
        Self {
            width,
            height,
            filter,
            wrap: if is_base2 {
                WrapMode::Repeat
            } else {
                WrapMode::ClampToEdge
            },
            mipmaps: is_base2,
        }
    }

    /// an attachment-style texture: always clamped, never mipmapped
    pub fn for_attachment(width: u32, height: u32, filter: FilterMode) -> Self {
        Self {
            width,
            height,
            filter,
            wrap: WrapMode::ClampToEdge,
            mipmaps: false,
        }
    }
}

/// Shared flag that tells whether a GPU resource still exists. Clones observe the same resource.
#[derive(Debug, Clone)]
pub struct Liveness(Rc<Cell<bool>>);

impl Liveness {
    pub(crate) fn new() -> Self {
        Self(Rc::new(Cell::new(true)))
    }

    /// a token of a resource that is already gone
    pub(crate) fn revoked() -> Self {
        Self(Rc::new(Cell::new(false)))
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.0.get()
    }

    pub(crate) fn revoke(&self) {
        self.0.set(false);
    }

    /// checks if both tokens belong to the same resource, gl names alone can be reused
    #[inline]
    pub fn same_resource(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// Anything that can be sampled by the renderer: a GPU texture with a known size.
pub trait Sampled {
    /// the gl texture name, ``0`` if the backing texture is gone
    fn texture_id(&self) -> GLuint;
    /// the token that is revoked once the backing texture is deleted
    fn liveness(&self) -> Liveness;
    fn width(&self) -> u32;
    fn height(&self) -> u32;
}

/// Image-like source of RGBA8 pixels, rows top to bottom.
pub trait PixelSource {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn pixels(&self) -> &[u8];
}

/// owned RGBA8 pixel data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelData {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl PixelData {
    /// creates pixel data from raw RGBA8 bytes
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data,
        }
    }

    /// an image filled with one color
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let data = rgba
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self::new(width, height, data)
    }

    /// the 1x1 opaque white image used for untextured shapes
    pub fn white_pixel() -> Self {
        Self::filled(1, 1, [255; 4])
    }

    /// decodes an image file into RGBA8 pixels
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ResourceError> {
        let path = path.as_ref();
        match stb_image::image::load_with_depth(path, 4, false) {
            LoadResult::ImageU8(image) => Ok(Self::new(
                image.width as u32,
                image.height as u32,
                image.data,
            )),
            LoadResult::ImageF32(_) => Err(ResourceError::Load {
                path: path.to_path_buf(),
                reason: "floating point images are not supported".to_string(),
            }),
            LoadResult::Error(reason) => Err(ResourceError::Load {
                path: path.to_path_buf(),
                reason,
            }),
        }
    }
}

impl PixelSource for PixelData {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn pixels(&self) -> &[u8] {
        &self.data
    }
}

impl PixelSource for Image<u8> {
    fn width(&self) -> u32 {
        self.width as u32
    }

    fn height(&self) -> u32 {
        self.height as u32
    }

    fn pixels(&self) -> &[u8] {
        &self.data
    }
}

/// A 2D RGBA texture on the GPU. The texture is deleted when dropped.
pub struct Texture {
    id: GLuint,
    width: u32,
    height: u32,
    liveness: Liveness,
    context: SharedContext,
}

impl Texture {
    /// uploads the pixels of the source into a new texture
    pub fn new(
        context: &SharedContext,
        source: &impl PixelSource,
        filter: FilterMode,
    ) -> Result<Self, ResourceError> {
        let (width, height) = (source.width(), source.height());
        let pixels = source.pixels();
        if width == 0 || height == 0 || pixels.len() != width as usize * height as usize * 4 {
            return Err(ResourceError::InvalidPixelData {
                width,
                height,
                given: pixels.len(),
            });
        }
        let descriptor = TextureDescriptor::for_image(width, height, filter);
        let id = context.create_texture(&descriptor, Some(pixels));
        log::debug!(
            "created texture {id} ({width}x{height}, {:?}, {:?})",
            descriptor.filter,
            descriptor.wrap
        );
        Ok(Self {
            id,
            width,
            height,
            liveness: Liveness::new(),
            context: context.clone(),
        })
    }

    /// allocates an uninitialized texture, used as a render target attachment
    pub fn empty(context: &SharedContext, width: u32, height: u32, filter: FilterMode) -> Self {
        let descriptor = TextureDescriptor::for_attachment(width, height, filter);
        let id = context.create_texture(&descriptor, None);
        log::debug!("created empty texture {id} ({width}x{height})");
        Self {
            id,
            width,
            height,
            liveness: Liveness::new(),
            context: context.clone(),
        }
    }

    /// decodes and uploads an image file synchronously
    pub fn from_file(
        context: &SharedContext,
        path: impl AsRef<Path>,
        filter: FilterMode,
    ) -> Result<Self, ResourceError> {
        Self::new(context, &PixelData::from_file(path)?, filter)
    }

    /// Starts decoding an image file on a worker thread. The GPU upload happens once the load is polled
    /// to completion on the context thread.
    pub fn load_from_file(path: impl Into<PathBuf>, filter: FilterMode) -> TextureLoad {
        let path = path.into();
        let (sender, receiver) = mpsc::channel();
        let worker_path = path.clone();
        thread::spawn(move || {
            // the receiver might be gone already, nothing to do then
            let _ = sender.send(PixelData::from_file(&worker_path));
        });
        log::debug!("started loading texture {}", path.display());
        TextureLoad {
            path,
            filter,
            receiver: Some(receiver),
        }
    }

    #[inline]
    pub fn id(&self) -> GLuint {
        self.id
    }

    #[inline]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl Sampled for Texture {
    fn texture_id(&self) -> GLuint {
        self.id
    }

    fn liveness(&self) -> Liveness {
        self.liveness.clone()
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }
}

impl fmt::Debug for Texture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Texture")
            .field("id", &self.id)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        log::debug!("deleted texture {}", self.id);
        self.liveness.revoke();
        self.context.delete_texture(self.id);
    }
}

/// A texture that is being decoded in the background. Resolves exactly once to either the texture or the load error.
#[derive(Debug)]
pub struct TextureLoad {
    path: PathBuf,
    filter: FilterMode,
    receiver: Option<Receiver<Result<PixelData, ResourceError>>>,
}

impl TextureLoad {
    /// the file that is being loaded
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Checks for completion without blocking. ``Ready`` is yielded exactly once, a terminated load stays ``Pending``.
    pub fn poll(&mut self, context: &SharedContext) -> Poll<Result<Texture, ResourceError>> {
        let Some(receiver) = self.receiver.as_ref() else {
            return Poll::Pending;
        };
        let decoded = match receiver.try_recv() {
            Ok(decoded) => decoded,
            Err(TryRecvError::Empty) => return Poll::Pending,
            Err(TryRecvError::Disconnected) => Err(self.worker_died()),
        };
        self.receiver = None;
        Poll::Ready(self.finish(context, decoded))
    }

    /// checks if the load already yielded its result
    #[inline]
    pub fn is_terminated(&self) -> bool {
        self.receiver.is_none()
    }

    /// Blocks until the image is decoded and uploads it. Waiting on a terminated load is a caller error and
    /// yields a ``Load`` error.
    pub fn wait(mut self, context: &SharedContext) -> Result<Texture, ResourceError> {
        let Some(receiver) = self.receiver.take() else {
            return Err(self.already_resolved());
        };
        let decoded = receiver.recv().unwrap_or_else(|_| Err(self.worker_died()));
        self.finish(context, decoded)
    }

    /// uploads the decoded image on the context thread
    fn finish(
        &self,
        context: &SharedContext,
        decoded: Result<PixelData, ResourceError>,
    ) -> Result<Texture, ResourceError> {
        let result = decoded.and_then(|pixels| Texture::new(context, &pixels, self.filter));
        if let Err(err) = &result {
            log::error!("{err}");
        }
        result
    }

    fn worker_died(&self) -> ResourceError {
        ResourceError::Load {
            path: self.path.clone(),
            reason: "decoder thread stopped unexpectedly".to_string(),
        }
    }

    fn already_resolved(&self) -> ResourceError {
        ResourceError::Load {
            path: self.path.clone(),
            reason: "load was already resolved".to_string(),
        }
    }
}
