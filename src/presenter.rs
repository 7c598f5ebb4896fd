//! Presentation-mode dispatch.
//!
//! Each presentation style is one variant of the closed [`Presenter`] enum,
//! selected at construction time; the host drives all of them through the
//! single [`Presenter::frame`] contract with a monotonic millisecond clock.

use crate::anaglyph::AnaglyphRenderer;
use crate::camera::Camera;
use crate::color::Color;
use crate::combinators::{overlay_frac_clamped, scale, square, white};
use crate::gpu::GpuContext;
use crate::hollusion::HollusionPlayback;
use crate::rune::Rune;
use crate::rune_pass::{RenderError, RunePass};

/// How a composition should be presented.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderMode {
    /// A plain head-on draw.
    Normal,
    /// Red/cyan stereo for filter glasses.
    Anaglyph,
    /// Motion-parallax playback.
    Hollusion,
}

/// Pads a scene with an enlarged opaque white backing rune in the far depth
/// slice.
///
/// The rune pass clears to transparent, so an unpadded scene would show
/// gaps wherever nothing is drawn. The near-unit z-scale of the front slice
/// keeps the scene's own depth intact, which the parallax presentations
/// depend on.
pub(crate) fn padded_scene(rune: &Rune) -> Rune {
    overlay_frac_clamped(1.0 - 1e-6, rune.clone(), white(scale(2.2, square())))
}

/// A plain single-pass presentation with a head-on camera.
pub struct NormalRenderer {
    scene: Rune,
    rune_pass: RunePass,
}

impl NormalRenderer {
    pub fn new(gpu: &GpuContext, scene: Rune) -> Self {
        Self {
            scene,
            rune_pass: RunePass::new(gpu),
        }
    }

    /// Flattens and draws the scene straight to the screen.
    pub fn draw(&mut self, gpu: &GpuContext) -> Result<(), RenderError> {
        self.rune_pass.ensure_depth_size(gpu);
        let drawn = padded_scene(&self.scene).flatten();

        let output = gpu.surface.get_current_texture().unwrap();
        let screen_view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Normal Encoder"),
            });

        let depth_view = &self.rune_pass.depth_view;
        self.rune_pass.render(
            gpu,
            &mut encoder,
            &screen_view,
            depth_view,
            &Camera::front(),
            Color::WHITE,
            &drawn,
        )?;

        gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

/// A presentation session: one variant per output style, one frame contract.
pub enum Presenter {
    Normal(NormalRenderer),
    Anaglyph(AnaglyphRenderer),
    Hollusion(HollusionPlayback),
}

impl Presenter {
    /// Creates a presenter for `mode`.
    ///
    /// Hollusion bakes its frames here, synchronously, before returning.
    pub fn new(gpu: &GpuContext, scene: Rune, mode: RenderMode) -> Result<Self, RenderError> {
        match mode {
            RenderMode::Normal => Ok(Presenter::Normal(NormalRenderer::new(gpu, scene))),
            RenderMode::Anaglyph => Ok(Presenter::Anaglyph(AnaglyphRenderer::new(gpu, scene))),
            RenderMode::Hollusion => {
                Ok(Presenter::Hollusion(HollusionPlayback::bake(gpu, &scene)?))
            }
        }
    }

    /// Draws one frame for the host's clock.
    ///
    /// Static presentations redraw from the graph; hollusion selects and
    /// blits a baked frame (and throttles itself against `time_ms`).
    pub fn frame(&mut self, gpu: &GpuContext, time_ms: f64) -> Result<(), RenderError> {
        match self {
            Presenter::Normal(renderer) => renderer.draw(gpu),
            Presenter::Anaglyph(renderer) => renderer.draw(gpu),
            Presenter::Hollusion(playback) => {
                playback.render(gpu, time_ms);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rune::flatten;

    #[test]
    fn padded_scene_prepends_nothing_and_appends_backing() {
        // The scene's primitives come first (front slice), the white
        // backing square last.
        let drawn = flatten(&padded_scene(&crate::combinators::red(square())));
        assert_eq!(drawn.len(), 2);
        assert_eq!(drawn[0].color, Color::RED);
        assert_eq!(drawn[1].color, Color::WHITE);
    }

    #[test]
    fn padding_preserves_scene_depth() {
        use glam::Vec3;
        let scene = crate::combinators::overlay(square(), square());
        let bare = flatten(&scene);
        let padded = flatten(&padded_scene(&scene));

        // Scene depth survives padding to within the overlay clamp.
        for (b, p) in bare.iter().zip(&padded) {
            let bz = b.world_transform.transform_point3(Vec3::ZERO).z;
            let pz = p.world_transform.transform_point3(Vec3::ZERO).z;
            assert!((bz - pz).abs() < 1e-5);
        }

        // The backing sits behind the whole scene.
        let backing_z = padded
            .last()
            .unwrap()
            .world_transform
            .transform_point3(Vec3::ZERO)
            .z;
        assert!(backing_z < -0.999);
    }
}
