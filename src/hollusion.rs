//! Hollusion presentation: motion parallax on a flat display.
//!
//! A playback session is created in two phases. The bake phase renders the
//! scene once per sample with the camera swept left and right across the
//! scene's declared parallax magnitude, retaining one [`FrameBuffer`] per
//! sample. The playback phase is then O(1) per displayed frame: pick the
//! baked frame for the host-supplied time and blit it, with no 3-D draws at
//! all.
//!
//! The session owns no timer. The host's display-refresh driver calls
//! [`HollusionPlayback::render`] with a monotonic millisecond clock, and
//! stopping the calls is the only cancellation. The retained framebuffers
//! are released when the session is dropped.

use std::time::Instant;

use crate::camera::Camera;
use crate::color::Color;
use crate::frame_buffer::FrameBuffer;
use crate::gpu::GpuContext;
use crate::presenter::padded_scene;
use crate::rune::Rune;
use crate::rune_pass::{RenderError, RunePass};

/// Length of one full camera sweep, in milliseconds.
pub const PERIOD_MS: f64 = 2000.0;

/// Number of baked parallax samples per period (about 25 fps).
pub const FRAME_COUNT: usize = 50;

/// Parallax magnitude used when the scene declares none.
const DEFAULT_MAGNITUDE: f32 = 0.1;

/// Horizontal camera offset for sample `index`.
///
/// The sample time is folded around the half period into a ping-pong ramp,
/// then mapped linearly onto `[-magnitude, magnitude]`.
fn camera_shift(index: usize, magnitude: f32) -> f32 {
    let step = PERIOD_MS / FRAME_COUNT as f64;
    let mut raw = (index as f64 * step) % PERIOD_MS;
    if raw > PERIOD_MS / 2.0 {
        raw = PERIOD_MS - raw;
    }
    magnitude * (2.0 * (2.0 * raw / PERIOD_MS) as f32 - 1.0)
}

/// The baked frame shown at `time_ms`. Periodic in `PERIOD_MS`.
fn frame_index(time_ms: f64) -> usize {
    let step = PERIOD_MS / FRAME_COUNT as f64;
    ((time_ms / step).floor() as i64).rem_euclid(FRAME_COUNT as i64) as usize
}

/// Whether a playback call at `now_ms` should draw, given the last drawn
/// time. Calls arriving faster than the bake cadence are dropped.
fn should_render(last_ms: Option<f64>, now_ms: f64) -> bool {
    let step = PERIOD_MS / FRAME_COUNT as f64;
    match last_ms {
        Some(last) => now_ms - last >= step,
        None => true,
    }
}

/// A hollusion playback session holding the baked parallax frames.
pub struct HollusionPlayback {
    frames: Vec<FrameBuffer>,
    blit_pipeline: wgpu::RenderPipeline,
    blit_bind_group_layout: wgpu::BindGroupLayout,
    blit_sampler: wgpu::Sampler,
    last_invoked_ms: Option<f64>,
}

impl HollusionPlayback {
    /// Bakes all parallax frames for `scene` and returns the playback
    /// session.
    ///
    /// This is a synchronous cost paid once per session, proportional to
    /// `FRAME_COUNT` times the scene's primitive count; large scenes make
    /// this call proportionally slow.
    pub fn bake(gpu: &GpuContext, scene: &Rune) -> Result<Self, RenderError> {
        let started = Instant::now();
        let magnitude = scene.hollusion_distance().unwrap_or(DEFAULT_MAGNITUDE);
        let drawn = padded_scene(scene).flatten();

        // The rune pass is a bake-phase resource; playback only ever blits.
        let rune_pass = RunePass::new(gpu);

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Hollusion Bake Encoder"),
            });

        let mut frames = Vec::with_capacity(FRAME_COUNT);
        for index in 0..FRAME_COUNT {
            let frame = FrameBuffer::new(gpu, &format!("Hollusion Frame {index}"));
            rune_pass.render(
                gpu,
                &mut encoder,
                &frame.view,
                &frame.depth_view,
                &Camera::offset_x(camera_shift(index, magnitude)),
                Color::WHITE,
                &drawn,
            )?;
            frames.push(frame);
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
        log::info!(
            "baked {} hollusion frames ({} primitives, magnitude {}) in {:?}",
            FRAME_COUNT,
            drawn.len(),
            magnitude,
            started.elapsed()
        );

        let device = &gpu.device;
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Hollusion Blit Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/blit.wgsl").into()),
        });

        let blit_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Hollusion Blit Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let blit_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Hollusion Blit Bind Group Layout"),
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

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Hollusion Blit Pipeline Layout"),
            bind_group_layouts: &[&blit_bind_group_layout],
            push_constant_ranges: &[],
        });

        let blit_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Hollusion Blit Pipeline"),
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

        Ok(Self {
            frames,
            blit_pipeline,
            blit_bind_group_layout,
            blit_sampler,
            last_invoked_ms: None,
        })
    }

    /// Displays the baked frame for `time_ms`.
    ///
    /// Intended to be invoked on every display refresh; calls arriving
    /// faster than the bake cadence are ignored. The screen is cleared to
    /// opaque white before the frame is blitted.
    pub fn render(&mut self, gpu: &GpuContext, time_ms: f64) {
        if !should_render(self.last_invoked_ms, time_ms) {
            return;
        }
        self.last_invoked_ms = Some(time_ms);

        let frame = &self.frames[frame_index(time_ms)];

        let output = gpu.surface.get_current_texture().unwrap();
        let screen_view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Hollusion Blit Bind Group"),
            layout: &self.blit_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&frame.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.blit_sampler),
                },
            ],
        });

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Hollusion Playback Encoder"),
            });
        {
            let mut blit_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Hollusion Blit Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &screen_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::WHITE),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            blit_pass.set_pipeline(&self.blit_pipeline);
            blit_pass.set_bind_group(0, &bind_group, &[]);
            blit_pass.draw(0..3, 0..1);
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }

    /// Number of baked frames held by this session.
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_index_is_periodic() {
        for t in [0.0, 13.0, 499.9, 1000.0, 1999.9] {
            assert_eq!(frame_index(t), frame_index(t + PERIOD_MS));
            assert_eq!(frame_index(t), frame_index(t + 3.0 * PERIOD_MS));
        }
    }

    #[test]
    fn frame_index_advances_with_the_bake_cadence() {
        let step = PERIOD_MS / FRAME_COUNT as f64;
        assert_eq!(frame_index(0.0), 0);
        assert_eq!(frame_index(step), 1);
        assert_eq!(frame_index(step * (FRAME_COUNT as f64 - 1.0)), FRAME_COUNT - 1);
        assert_eq!(frame_index(step * FRAME_COUNT as f64), 0);
    }

    #[test]
    fn camera_shift_ping_pongs_within_magnitude() {
        let magnitude = 0.25;
        for index in 0..FRAME_COUNT {
            let shift = camera_shift(index, magnitude);
            assert!(shift.abs() <= magnitude + 1e-6);
        }
        // Endpoints of the sweep.
        assert!((camera_shift(0, magnitude) + magnitude).abs() < 1e-6);
        assert!((camera_shift(FRAME_COUNT / 2, magnitude) - magnitude).abs() < 1e-6);
    }

    #[test]
    fn camera_shift_is_symmetric_about_the_half_period() {
        let magnitude = 0.1;
        for index in 1..FRAME_COUNT / 2 {
            let up = camera_shift(index, magnitude);
            let down = camera_shift(FRAME_COUNT - index, magnitude);
            assert!((up - down).abs() < 1e-6, "index {index}: {up} vs {down}");
        }
    }

    #[test]
    fn playback_throttles_to_the_bake_cadence() {
        let step = PERIOD_MS / FRAME_COUNT as f64;
        assert!(should_render(None, 0.0));
        assert!(!should_render(Some(100.0), 100.0 + step * 0.5));
        assert!(should_render(Some(100.0), 100.0 + step));
        assert!(should_render(Some(100.0), 100.0 + step * 3.0));
    }
}
