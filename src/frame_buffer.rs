//! Off-screen render targets.

use crate::gpu::GpuContext;

/// An off-screen render target: a color texture that can also be sampled,
/// paired with a depth buffer for the rune pass's depth testing.
///
/// Ownership follows the pass that creates it: the anaglyph compositor
/// creates two per compositing call and drops them with the call, while a
/// hollusion session retains one per baked frame until the session ends.
pub struct FrameBuffer {
    /// Color texture written by a rune pass and sampled by combine/blit
    /// passes.
    pub texture: wgpu::Texture,
    /// View for render-pass attachment or shader sampling.
    pub view: wgpu::TextureView,
    /// Depth buffer backing the pass's depth test.
    pub depth_texture: wgpu::Texture,
    /// View for depth attachment.
    pub depth_view: wgpu::TextureView,
    width: u32,
    height: u32,
}

impl FrameBuffer {
    /// Creates a frame buffer matching the current surface dimensions and
    /// format.
    pub fn new(gpu: &GpuContext, label: &str) -> Self {
        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: gpu.width(),
                height: gpu.height(),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: gpu.config.format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let depth_texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&format!("{} Depth", label)),
            size: wgpu::Extent3d {
                width: gpu.width(),
                height: gpu.height(),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Depth32Float,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let depth_view = depth_texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            texture,
            view,
            depth_texture,
            depth_view,
            width: gpu.width(),
            height: gpu.height(),
        }
    }

    /// Dimensions this buffer was created with.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
