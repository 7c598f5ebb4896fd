//! The single-pass rune renderer.
//!
//! [`RunePass`] turns an ordered [`DrawnRune`] list into GPU draw calls
//! against one color/depth target, under one view matrix and one pass tint.
//! Primitives are drawn in list order with depth testing enabled (nearer
//! wins), so the front-first ordering produced by `overlay_frac` doubles as
//! an early-out for the depth test.
//!
//! The pass clears its color target to transparent, not to an opaque
//! background; compositors that need an opaque result pad the scene with a
//! white backing rune first.

use glam::Mat4;

use crate::camera::Camera;
use crate::color::Color;
use crate::geometry::Vertex;
use crate::gpu::GpuContext;
use crate::rune::DrawnRune;
use crate::texture::Texture;

/// wgpu clip-space z spans [0, 1] while rune depth lives in [0, -1];
/// negating z maps the front of that range to depth 0 under a Less compare.
const DEPTH_REMAP: Mat4 = Mat4::from_cols_array(&[
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, -1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
]);

/// Per-pass uniforms: the combined view matrix and the pass tint.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct PassUniforms {
    view: [[f32; 4]; 4],
    tint: [f32; 4],
}

/// Per-primitive uniforms: world transform, resolved color, texture switch.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct ModelUniforms {
    transform: [[f32; 4]; 4],
    color: [f32; 4],
    use_texture: f32,
    _padding: [f32; 3],
}

/// Errors raised while rendering a resolved primitive list.
///
/// A render error aborts the single invocation that raised it; the source
/// rune graph is untouched and remains valid for later attempts.
#[derive(Debug)]
pub enum RenderError {
    /// A primitive's vertex list is not a whole number of triangles.
    MalformedGeometry {
        /// Vertex count found on the offending primitive.
        vertices: usize,
    },
    /// A texture source could not be fetched or decoded.
    Texture {
        /// The URL or path of the source.
        source: String,
        /// The underlying fetch failure.
        reason: String,
    },
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderError::MalformedGeometry { vertices } => {
                write!(f, "geometry with {vertices} vertices is not a triangle list")
            }
            RenderError::Texture { source, reason } => {
                write!(f, "texture '{source}' failed: {reason}")
            }
        }
    }
}

impl std::error::Error for RenderError {}

/// GPU resources prepared for one primitive before the pass begins.
struct PreparedDraw {
    vertex_buffer: wgpu::Buffer,
    vertex_count: u32,
    model_bind_group: wgpu::BindGroup,
    texture_bind_group: wgpu::BindGroup,
}

/// Renders resolved rune lists with depth testing and tinting.
///
/// Owns the pipeline, the bind group layouts, the default white texture
/// bound for flat-color primitives, and a depth buffer for passes that
/// target the screen (off-screen targets carry their own depth in
/// [`FrameBuffer`](crate::frame_buffer::FrameBuffer)).
pub struct RunePass {
    pipeline: wgpu::RenderPipeline,
    pass_bind_group_layout: wgpu::BindGroupLayout,
    model_bind_group_layout: wgpu::BindGroupLayout,
    texture_bind_group_layout: wgpu::BindGroupLayout,
    default_texture: Texture,
    /// Depth view for screen-targeted passes.
    pub(crate) depth_view: wgpu::TextureView,
    depth_size: (u32, u32),
}

impl RunePass {
    pub fn new(gpu: &GpuContext) -> Self {
        let device = &gpu.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Rune Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/rune.wgsl").into()),
        });

        let uniform_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let pass_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Rune Pass Bind Group Layout"),
                entries: &[uniform_entry(0)],
            });

        let model_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Rune Model Bind Group Layout"),
                entries: &[uniform_entry(0)],
            });

        let texture_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Rune Texture Bind Group Layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        let default_texture = Texture::white(gpu);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Rune Pipeline Layout"),
            bind_group_layouts: &[
                &pass_bind_group_layout,
                &model_bind_group_layout,
                &texture_bind_group_layout,
            ],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Rune Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs"),
                buffers: &[Vertex::LAYOUT],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.config.format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                // Flips mirror the winding, so both faces must draw.
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: wgpu::TextureFormat::Depth32Float,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let depth_view = Self::create_depth_view(gpu);

        Self {
            pipeline,
            pass_bind_group_layout,
            model_bind_group_layout,
            texture_bind_group_layout,
            default_texture,
            depth_view,
            depth_size: (gpu.width(), gpu.height()),
        }
    }

    fn create_depth_view(gpu: &GpuContext) -> wgpu::TextureView {
        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Rune Screen Depth Texture"),
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
        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    /// Recreates the screen depth buffer after a window resize.
    pub fn ensure_depth_size(&mut self, gpu: &GpuContext) {
        if self.depth_size != (gpu.width(), gpu.height()) {
            self.depth_view = Self::create_depth_view(gpu);
            self.depth_size = (gpu.width(), gpu.height());
        }
    }

    /// Uploads every primitive's GPU resources up front.
    ///
    /// Validation happens here, before any render pass is begun, so a bad
    /// primitive aborts the invocation without a half-written target.
    fn prepare(
        &self,
        gpu: &GpuContext,
        drawn: &[DrawnRune],
    ) -> Result<Vec<PreparedDraw>, RenderError> {
        use wgpu::util::DeviceExt;

        let mut prepared = Vec::with_capacity(drawn.len());
        for rune in drawn {
            let vertices = &rune.geometry.vertices;
            if vertices.len() % 3 != 0 {
                return Err(RenderError::MalformedGeometry {
                    vertices: vertices.len(),
                });
            }
            if vertices.is_empty() {
                continue;
            }

            let vertex_buffer = gpu
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Rune Vertex Buffer"),
                    contents: bytemuck::cast_slice(vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                });

            let model = ModelUniforms {
                transform: rune.world_transform.to_cols_array_2d(),
                color: rune.color.to_array(),
                use_texture: if rune.texture.is_some() { 1.0 } else { 0.0 },
                _padding: [0.0; 3],
            };
            let model_buffer = gpu
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Rune Model Uniforms"),
                    contents: bytemuck::cast_slice(&[model]),
                    usage: wgpu::BufferUsages::UNIFORM,
                });
            let model_bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Rune Model Bind Group"),
                layout: &self.model_bind_group_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: model_buffer.as_entire_binding(),
                }],
            });

            let texture = match &rune.texture {
                Some(source) => {
                    let img = source.fetch().map_err(|e| RenderError::Texture {
                        source: source.url().to_string(),
                        reason: e.to_string(),
                    })?;
                    let (width, height) = img.dimensions();
                    Some(Texture::from_rgba(gpu, img, width, height, source.url()))
                }
                None => None,
            };
            let bound = texture.as_ref().unwrap_or(&self.default_texture);
            let texture_bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Rune Texture Bind Group"),
                layout: &self.texture_bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&bound.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(&bound.sampler),
                    },
                ],
            });

            prepared.push(PreparedDraw {
                vertex_buffer,
                vertex_count: vertices.len() as u32,
                model_bind_group,
                texture_bind_group,
            });
        }
        Ok(prepared)
    }

    /// Renders `drawn` in list order into `color_view`/`depth_view`.
    ///
    /// The color target is cleared to transparent and the depth buffer to
    /// the far plane. `tint` combines with every fragment as
    /// `color * tint + (1 - tint)`: a full-white tint is the identity, while
    /// the stereo filters keep their own channels and saturate the rest.
    /// GPU binding state is scoped to the pass and not preserved for the
    /// caller.
    pub fn render(
        &self,
        gpu: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        color_view: &wgpu::TextureView,
        depth_view: &wgpu::TextureView,
        camera: &Camera,
        tint: Color,
        drawn: &[DrawnRune],
    ) -> Result<(), RenderError> {
        use wgpu::util::DeviceExt;

        let prepared = self.prepare(gpu, drawn)?;

        let pass_uniforms = PassUniforms {
            view: (DEPTH_REMAP * camera.view_matrix()).to_cols_array_2d(),
            tint: tint.to_array(),
        };
        let pass_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Rune Pass Uniforms"),
                contents: bytemuck::cast_slice(&[pass_uniforms]),
                usage: wgpu::BufferUsages::UNIFORM,
            });
        let pass_bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Rune Pass Bind Group"),
            layout: &self.pass_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: pass_buffer.as_entire_binding(),
            }],
        });

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Rune Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &pass_bind_group, &[]);

        for draw in &prepared {
            render_pass.set_bind_group(1, &draw.model_bind_group, &[]);
            render_pass.set_bind_group(2, &draw.texture_bind_group, &[]);
            render_pass.set_vertex_buffer(0, draw.vertex_buffer.slice(..));
            render_pass.draw(0..draw.vertex_count, 0..1);
        }

        Ok(())
    }
}
