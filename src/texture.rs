//! GPU textures and lazily-fetched image sources.

use std::sync::OnceLock;

use crate::gpu::GpuContext;

/// A GPU texture that can be bound to shaders.
pub struct Texture {
    #[allow(dead_code)]
    pub(crate) texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
    pub(crate) sampler: wgpu::Sampler,
    pub width: u32,
    pub height: u32,
}

impl Texture {
    /// Create a texture from raw RGBA data.
    pub fn from_rgba(gpu: &GpuContext, data: &[u8], width: u32, height: u32, label: &str) -> Self {
        use wgpu::util::DeviceExt;

        let texture = gpu.device.create_texture_with_data(
            &gpu.queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            data,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{} Sampler", label)),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
            width,
            height,
        }
    }

    /// Create a 1x1 solid white texture, used as the flat-color fallback.
    pub fn white(gpu: &GpuContext) -> Self {
        Self::from_rgba(gpu, &[255, 255, 255, 255], 1, 1, "Default White Texture")
    }
}

/// Errors from resolving an image source.
#[derive(Debug)]
pub enum FetchError {
    /// The source scheme cannot be fetched from a native process.
    UnsupportedSource(String),
    /// The image could not be read or decoded.
    Image(image::ImageError),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::UnsupportedSource(source) => {
                write!(f, "unsupported image source: '{}'", source)
            }
            FetchError::Image(e) => write!(f, "image error: {}", e),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Image(e) => Some(e),
            _ => None,
        }
    }
}

impl From<image::ImageError> for FetchError {
    fn from(e: image::ImageError) -> Self {
        FetchError::Image(e)
    }
}

/// A reference to an image, fetched and decoded on first use.
///
/// Accepts `file://` URLs and plain filesystem paths. The decoded pixels are
/// cached for the lifetime of the source, so a rune shared across many
/// renders fetches once.
#[derive(Debug)]
pub struct ImageSource {
    source: String,
    decoded: OnceLock<Result<image::RgbaImage, FetchError>>,
}

impl ImageSource {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            decoded: OnceLock::new(),
        }
    }

    /// The URL or path this source was created from.
    pub fn url(&self) -> &str {
        &self.source
    }

    /// Resolves the image, fetching and decoding it on the first call.
    pub fn fetch(&self) -> Result<&image::RgbaImage, &FetchError> {
        self.decoded
            .get_or_init(|| {
                log::debug!("fetching texture image from '{}'", self.source);
                load(&self.source)
            })
            .as_ref()
    }
}

fn load(source: &str) -> Result<image::RgbaImage, FetchError> {
    let path = if let Some(rest) = source.strip_prefix("file://") {
        rest
    } else if source.starts_with("http://") || source.starts_with("https://") {
        log::warn!("refusing remote image source '{}'", source);
        return Err(FetchError::UnsupportedSource(source.to_string()));
    } else {
        source
    };
    Ok(image::open(path)?.to_rgba8())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_sources_are_rejected() {
        let source = ImageSource::new("https://example.org/rune.png");
        match source.fetch() {
            Err(FetchError::UnsupportedSource(s)) => assert!(s.contains("example.org")),
            Err(e) => panic!("expected UnsupportedSource, got {e}"),
            Ok(_) => panic!("expected UnsupportedSource, got an image"),
        }
    }

    #[test]
    fn missing_file_is_an_image_error() {
        let source = ImageSource::new("file:///definitely/not/here.png");
        assert!(matches!(source.fetch(), Err(FetchError::Image(_))));
    }

    #[test]
    fn fetch_failure_is_cached() {
        let source = ImageSource::new("https://example.org/rune.png");
        assert!(source.fetch().is_err());
        // Second call hits the cache; still the same error.
        assert!(source.fetch().is_err());
    }
}
