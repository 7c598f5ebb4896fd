//! Anaglyph presentation: red/cyan stereo from two simultaneous eye passes.
//!
//! The scene is rendered twice into two transient [`FrameBuffer`]s, once per
//! eye, with the camera offset a half-eye distance left and right of a
//! shared look-at target and the pass tinted to isolate each eye's color
//! channels. A final combine pass sums both textures and subtracts one,
//! reconstructing the original color where the eyes agree and leaving the
//! disparity visible as red/cyan fringing for filter glasses.
//!
//! Both eye buffers are scoped to a single [`AnaglyphRenderer::draw`] call;
//! the encoder ordering guarantees both eye passes are fully written before
//! the combine pass samples them.

use crate::camera::Camera;
use crate::color::Color;
use crate::frame_buffer::FrameBuffer;
use crate::gpu::GpuContext;
use crate::presenter::padded_scene;
use crate::rune::Rune;
use crate::rune_pass::{RenderError, RunePass};

/// Half the distance between the stereo eyes, in rune-space units.
pub const HALF_EYE_DISTANCE: f32 = 0.03;

/// Renders a rune composition as a red/cyan stereo image.
pub struct AnaglyphRenderer {
    scene: Rune,
    rune_pass: RunePass,
    combine_pipeline: wgpu::RenderPipeline,
    combine_bind_group_layout: wgpu::BindGroupLayout,
    combine_sampler: wgpu::Sampler,
}

impl AnaglyphRenderer {
    pub fn new(gpu: &GpuContext, scene: Rune) -> Self {
        let device = &gpu.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Anaglyph Combine Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/combine.wgsl").into()),
        });

        let combine_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Anaglyph Combine Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };

        let combine_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Anaglyph Combine Bind Group Layout"),
                entries: &[
                    texture_entry(0),
                    texture_entry(1),
                    wgpu::BindGroupLayoutEntry {
                        binding: 2,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Anaglyph Combine Pipeline Layout"),
            bind_group_layouts: &[&combine_bind_group_layout],
            push_constant_ranges: &[],
        });

        let combine_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Anaglyph Combine Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            scene,
            rune_pass: RunePass::new(gpu),
            combine_pipeline,
            combine_bind_group_layout,
            combine_sampler,
        }
    }

    /// Renders both eye passes and the combine pass, presenting the result.
    ///
    /// The composition is flattened fresh on every call; the two eye
    /// framebuffers live only for the duration of this call.
    pub fn draw(&mut self, gpu: &GpuContext) -> Result<(), RenderError> {
        let drawn = padded_scene(&self.scene).flatten();
        log::debug!("anaglyph pass over {} primitives", drawn.len());

        let left_eye = FrameBuffer::new(gpu, "Anaglyph Left Eye");
        let right_eye = FrameBuffer::new(gpu, "Anaglyph Right Eye");

        let output = gpu.surface.get_current_texture().unwrap();
        let screen_view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Anaglyph Encoder"),
            });

        self.rune_pass.render(
            gpu,
            &mut encoder,
            &left_eye.view,
            &left_eye.depth_view,
            &Camera::offset_x(-HALF_EYE_DISTANCE),
            Color::RED_FILTER,
            &drawn,
        )?;
        self.rune_pass.render(
            gpu,
            &mut encoder,
            &right_eye.view,
            &right_eye.depth_view,
            &Camera::offset_x(HALF_EYE_DISTANCE),
            Color::CYAN_FILTER,
            &drawn,
        )?;

        let combine_bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Anaglyph Combine Bind Group"),
            layout: &self.combine_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&left_eye.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&right_eye.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.combine_sampler),
                },
            ],
        });

        {
            let mut combine_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Anaglyph Combine Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &screen_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            combine_pass.set_pipeline(&self.combine_pipeline);
            combine_pass.set_bind_group(0, &combine_bind_group, &[]);
            combine_pass.draw(0..3, 0..1);
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}
