//! Texture handles and GPU textures.
//!
//! A [`TextureHandle`] is what materials hold: a shared slot that starts out
//! pending, is filled in once the asset loader has decoded the image, and
//! carries the sampling parameters and colour-space tag that the GPU upload
//! needs. [`Texture`] is the uploaded wgpu resource.

use std::{cell::RefCell, fmt, rc::Rc};

use image::RgbaImage;

/// How the texel values of an image are to be interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColourSpace {
    /// Colour maps authored in sRGB; decoded to linear by the sampler.
    Srgb,
    /// Data maps (normals, roughness, heights...) read as-is.
    Linear,
}

impl ColourSpace {
    pub fn texture_format(&self) -> wgpu::TextureFormat {
        match self {
            ColourSpace::Srgb => wgpu::TextureFormat::Rgba8UnormSrgb,
            ColourSpace::Linear => wgpu::TextureFormat::Rgba8Unorm,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Wrap {
    #[default]
    ClampToEdge,
    Repeat,
    MirroredRepeat,
}

impl From<Wrap> for wgpu::AddressMode {
    fn from(wrap: Wrap) -> Self {
        match wrap {
            Wrap::ClampToEdge => wgpu::AddressMode::ClampToEdge,
            Wrap::Repeat => wgpu::AddressMode::Repeat,
            Wrap::MirroredRepeat => wgpu::AddressMode::MirrorRepeat,
        }
    }
}

/// Sampling parameters: uv repeat factors and wrap mode per axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sampling {
    pub repeat: [f32; 2],
    pub wrap_s: Wrap,
    pub wrap_t: Wrap,
}

impl Default for Sampling {
    fn default() -> Self {
        Self {
            repeat: [1.0, 1.0],
            wrap_s: Wrap::ClampToEdge,
            wrap_t: Wrap::ClampToEdge,
        }
    }
}

#[derive(Debug)]
pub enum TextureStatus {
    Pending,
    Ready(RgbaImage),
    Failed(String),
}

#[derive(Debug)]
struct TextureSource {
    url: String,
    colour_space: ColourSpace,
    sampling: Sampling,
    status: TextureStatus,
    version: u64,
}

/// Shared, single-threaded handle to a texture that may still be loading.
///
/// Cloning the handle shares the slot: every material holding a clone sees
/// the image as soon as it is resolved.
#[derive(Clone)]
pub struct TextureHandle(Rc<RefCell<TextureSource>>);

impl TextureHandle {
    pub fn new(url: &str, colour_space: ColourSpace) -> Self {
        Self(Rc::new(RefCell::new(TextureSource {
            url: url.to_string(),
            colour_space,
            sampling: Sampling::default(),
            status: TextureStatus::Pending,
            version: 0,
        })))
    }

    pub fn url(&self) -> String {
        self.0.borrow().url.clone()
    }

    pub fn colour_space(&self) -> ColourSpace {
        self.0.borrow().colour_space
    }

    pub fn sampling(&self) -> Sampling {
        self.0.borrow().sampling
    }

    /// Bumped whenever the image or its sampling parameters change.
    pub fn version(&self) -> u64 {
        self.0.borrow().version
    }

    pub fn set_repeat(&self, x: f32, y: f32) -> &Self {
        let mut source = self.0.borrow_mut();
        source.sampling.repeat = [x, y];
        source.version += 1;
        drop(source);
        self
    }

    pub fn set_wrap(&self, wrap_s: Wrap, wrap_t: Wrap) -> &Self {
        let mut source = self.0.borrow_mut();
        source.sampling.wrap_s = wrap_s;
        source.sampling.wrap_t = wrap_t;
        source.version += 1;
        drop(source);
        self
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.0.borrow().status, TextureStatus::Ready(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.0.borrow().status, TextureStatus::Failed(_))
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.0.borrow().status, TextureStatus::Pending)
    }

    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.with_image(|img| img.dimensions())
    }

    /// Runs `f` on the decoded image, if there is one.
    pub fn with_image<R>(&self, f: impl FnOnce(&RgbaImage) -> R) -> Option<R> {
        match &self.0.borrow().status {
            TextureStatus::Ready(img) => Some(f(img)),
            _ => None,
        }
    }

    /// Stores the outcome of a load. Returns whether the texture is usable.
    pub(crate) fn resolve(&self, result: &anyhow::Result<RgbaImage>) -> bool {
        let mut source = self.0.borrow_mut();
        source.status = match result {
            Ok(img) => TextureStatus::Ready(img.clone()),
            Err(e) => TextureStatus::Failed(e.to_string()),
        };
        source.version += 1;
        matches!(source.status, TextureStatus::Ready(_))
    }

    pub fn ptr_eq(&self, other: &TextureHandle) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Identity of the shared slot, used as a GPU cache key.
    pub(crate) fn key(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }
}

impl fmt::Debug for TextureHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = self.0.borrow();
        let status = match source.status {
            TextureStatus::Pending => "pending",
            TextureStatus::Ready(_) => "ready",
            TextureStatus::Failed(_) => "failed",
        };
        f.debug_struct("TextureHandle")
            .field("url", &source.url)
            .field("status", &status)
            .field("version", &source.version)
            .finish()
    }
}

/// A GPU texture with a view and optional sampler.
#[derive(Clone, Debug)]
pub struct Texture {
    #[allow(unused)]
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: Option<wgpu::Sampler>,
}

impl Texture {
    /// Standard depth buffer texture format (32-bit float).
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Create a depth texture for depth-testing during rendering.
    ///
    /// * `size` is [width, height] of the texture in pixels
    /// * `label` is used as a debug label for the GPU resource
    pub fn create_depth_texture(device: &wgpu::Device, size: [u32; 2], label: &str) -> Self {
        let size = wgpu::Extent3d {
            width: size[0].max(1),
            height: size[1].max(1),
            depth_or_array_layers: 1,
        };
        let desc = wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[Self::DEPTH_FORMAT],
        };
        let texture = device.create_texture(&desc);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            texture,
            view,
            sampler: None,
        }
    }

    /// A 1x1 texture of a single colour.
    ///
    /// Used in place of absent material maps so the shader can always sample:
    /// white leaves colour/alpha/occlusion/roughness untouched, black means no
    /// displacement and (127, 127, 255) is the flat tangent-space normal.
    pub fn create_solid(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        rgba: [u8; 4],
        colour_space: ColourSpace,
        label: &str,
    ) -> Self {
        let img = RgbaImage::from_pixel(1, 1, image::Rgba(rgba));
        Self::from_image(device, queue, &img, Some(label), colour_space, &Sampling::default())
    }

    pub fn from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        img: &RgbaImage,
        label: Option<&str>,
        colour_space: ColourSpace,
        sampling: &Sampling,
    ) -> Self {
        let dimensions = img.dimensions();
        let size = wgpu::Extent3d {
            width: dimensions.0,
            height: dimensions.1,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label,
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: colour_space.texture_format(),
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            img.as_raw(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * dimensions.0),
                rows_per_image: Some(dimensions.1),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = Some(create_sampler(device, sampling));

        Self {
            texture,
            view,
            sampler,
        }
    }
}

pub fn create_sampler(device: &wgpu::Device, sampling: &Sampling) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("material sampler"),
        address_mode_u: sampling.wrap_s.into(),
        address_mode_v: sampling.wrap_t.into(),
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    })
}
