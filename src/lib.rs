//! # Runic
//!
//! **Declarative rune graphics for Rust.**
//!
//! Build shapes out of pure combinators, then present the composition flat,
//! as a red/cyan stereo image, or as a motion-parallax illusion, all through
//! one GPU pipeline.
//!
//! ## Quick Start
//!
//! ```no_run
//! use runic::*;
//!
//! fn main() {
//!     let scene = make_cross(overlay(red(heart()), blue(circle())));
//!     run(scene, RenderMode::Anaglyph);
//! }
//! ```
//!
//! ## Model
//!
//! - **Runes are immutable.** Every combinator wraps its inputs in a new
//!   node, so any rune can appear in several places of a composition and
//!   the graph is safely shared.
//! - **Flatten resolves.** [`flatten`] walks the graph once per render and
//!   produces an ordered list of primitives with fully composed world
//!   transforms and inherited colors/textures.
//! - **Passes compose.** A single depth-tested pass draws a resolved list
//!   under one view matrix and one tint; the anaglyph and hollusion
//!   presentations orchestrate several such passes over off-screen
//!   framebuffers.

mod anaglyph;
mod app;
mod camera;
mod color;
mod combinators;
mod frame_buffer;
mod geometry;
mod gpu;
mod hollusion;
mod presenter;
mod rune;
mod rune_pass;
mod texture;

pub use anaglyph::{AnaglyphRenderer, HALF_EYE_DISTANCE};
pub use app::{AppConfig, run, run_with_config};
pub use camera::{Camera, LOOK_AT_TARGET};
pub use color::{Color, PALETTE, named_color};
pub use combinators::*;
pub use frame_buffer::FrameBuffer;
pub use geometry::{RawGeometry, Vertex};
pub use gpu::GpuContext;
pub use hollusion::{FRAME_COUNT, HollusionPlayback, PERIOD_MS};
pub use presenter::{NormalRenderer, Presenter, RenderMode};
pub use rune::{DrawnRune, Rune, flatten};
pub use rune_pass::{RenderError, RunePass};
pub use texture::{FetchError, ImageSource, Texture};

// Re-export glam math types for convenience
pub use glam::{Mat4, Vec3};
