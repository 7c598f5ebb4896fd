//! Pure combinators for building rune compositions.
//!
//! Every function here returns a new [`Rune`] wrapping its input(s); nothing
//! is ever mutated, so runes can be reused freely in several places of a
//! composition. Runes live in the unit space: x and y span `[-1, 1]` with
//! positive y pointing up on screen, and depth spans `[0, -1]` toward the
//! back (assigned by [`overlay_frac`]).
//!
//! ```no_run
//! use runic::*;
//!
//! let scene = stack(
//!     red(heart()),
//!     overlay(blue(circle()), yellow(square())),
//! );
//! let drawn = flatten(&scene);
//! assert_eq!(drawn.len(), 3);
//! ```

use std::f32::consts::{FRAC_PI_2, PI};

use glam::{Mat4, Vec3};
use rand::Rng;

use crate::color::{Color, PALETTE};
use crate::geometry::RawGeometry;
use crate::rune::Rune;
use crate::texture::ImageSource;

/// Errors produced by combinator argument validation.
#[derive(Debug, Clone, PartialEq)]
pub enum RuneError {
    /// A proportional-split fraction fell outside `[0, 1]`.
    InvalidFraction {
        /// The operation that rejected the fraction.
        op: &'static str,
        /// The offending value.
        frac: f32,
    },
}

impl std::fmt::Display for RuneError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuneError::InvalidFraction { op, frac } => {
                write!(f, "{op} can only take a fraction in [0, 1], got {frac}")
            }
        }
    }
}

impl std::error::Error for RuneError {}

fn check_fraction(op: &'static str, frac: f32) -> Result<(), RuneError> {
    if (0.0..=1.0).contains(&frac) {
        Ok(())
    } else {
        Err(RuneError::InvalidFraction { op, frac })
    }
}

// ============================================================================
// Primitive runes
// ============================================================================

/// The empty rune. Draws nothing but composes like any other.
pub fn blank() -> Rune {
    Rune::primitive(RawGeometry::blank())
}

/// A square filling the rune space.
pub fn square() -> Rune {
    Rune::primitive(RawGeometry::square())
}

/// A circle inscribed in the rune space.
pub fn circle() -> Rune {
    Rune::primitive(RawGeometry::circle())
}

/// An upward-pointing triangle.
pub fn triangle() -> Rune {
    Rune::primitive(RawGeometry::triangle())
}

/// A triangle tucked into the upper-right corner.
pub fn corner() -> Rune {
    Rune::primitive(RawGeometry::corner())
}

/// A sail-shaped right triangle.
pub fn sail() -> Rune {
    Rune::primitive(RawGeometry::sail())
}

/// A square ring.
pub fn rcross() -> Rune {
    Rune::primitive(RawGeometry::rcross())
}

/// A four-pointed star.
pub fn nova() -> Rune {
    Rune::primitive(RawGeometry::nova())
}

/// A heart.
pub fn heart() -> Rune {
    Rune::primitive(RawGeometry::heart())
}

/// A square rune textured with an image fetched lazily from `url`.
///
/// The image is fetched and decoded on first render; a fetch failure
/// surfaces as a render error, not here. `file://` URLs and plain
/// filesystem paths are supported.
pub fn from_url(url: &str) -> Rune {
    Rune::textured(RawGeometry::square(), ImageSource::new(url))
}

// ============================================================================
// Transforms
// ============================================================================

/// Scales a rune by independent horizontal and vertical ratios.
pub fn scale_independent(ratio_x: f32, ratio_y: f32, rune: Rune) -> Rune {
    Rune::wrap_transform(Mat4::from_scale(Vec3::new(ratio_x, ratio_y, 1.0)), rune)
}

/// Scales a rune uniformly.
pub fn scale(ratio: f32, rune: Rune) -> Rune {
    scale_independent(ratio, ratio, rune)
}

/// Translates a rune. Positive `y` moves the rune downward, matching the
/// stacking convention; the sign is flipped internally.
pub fn translate(x: f32, y: f32, rune: Rune) -> Rune {
    Rune::wrap_transform(Mat4::from_translation(Vec3::new(x, -y, 0.0)), rune)
}

/// Rotates a rune about the z axis. Positive `rad` turns anticlockwise.
pub fn rotate(rad: f32, rune: Rune) -> Rune {
    Rune::wrap_transform(Mat4::from_rotation_z(rad), rune)
}

/// Turns a rune a quarter turn clockwise.
pub fn quarter_turn_right(rune: Rune) -> Rune {
    rotate(-FRAC_PI_2, rune)
}

/// Turns a rune a quarter turn anticlockwise.
pub fn quarter_turn_left(rune: Rune) -> Rune {
    rotate(FRAC_PI_2, rune)
}

/// Turns a rune upside down.
pub fn turn_upside_down(rune: Rune) -> Rune {
    rotate(PI, rune)
}

/// Mirrors a rune about the horizontal axis.
pub fn flip_vert(rune: Rune) -> Rune {
    scale_independent(1.0, -1.0, rune)
}

/// Mirrors a rune about the vertical axis.
pub fn flip_horiz(rune: Rune) -> Rune {
    scale_independent(-1.0, 1.0, rune)
}

// ============================================================================
// Proportional composition
// ============================================================================

fn stack_frac_unchecked(frac: f32, rune1: Rune, rune2: Rune) -> Rune {
    let upper = translate(0.0, -(1.0 - frac), scale_independent(1.0, frac, rune1));
    let lower = translate(0.0, frac, scale_independent(1.0, 1.0 - frac, rune2));
    Rune::compose(vec![upper, lower])
}

/// Stacks `rune1` over `rune2`, giving `rune1` the top `frac` of the
/// height. Fails when `frac` is outside `[0, 1]`.
pub fn stack_frac(frac: f32, rune1: Rune, rune2: Rune) -> Result<Rune, RuneError> {
    check_fraction("stack_frac", frac)?;
    Ok(stack_frac_unchecked(frac, rune1, rune2))
}

/// Stacks two runes in equal halves.
pub fn stack(rune1: Rune, rune2: Rune) -> Rune {
    stack_frac_unchecked(0.5, rune1, rune2)
}

/// Stacks `n` copies of a rune vertically. `n` of 1 (or 0) is the rune
/// itself.
pub fn stackn(n: u32, rune: Rune) -> Rune {
    if n <= 1 {
        return rune;
    }
    stack_frac_unchecked(1.0 / n as f32, rune.clone(), stackn(n - 1, rune))
}

fn beside_frac_unchecked(frac: f32, rune1: Rune, rune2: Rune) -> Rune {
    let left = translate(-(1.0 - frac), 0.0, scale_independent(frac, 1.0, rune1));
    let right = translate(frac, 0.0, scale_independent(1.0 - frac, 1.0, rune2));
    Rune::compose(vec![left, right])
}

/// Places `rune1` beside `rune2`, giving `rune1` the left `frac` of the
/// width. Fails when `frac` is outside `[0, 1]`.
pub fn beside_frac(frac: f32, rune1: Rune, rune2: Rune) -> Result<Rune, RuneError> {
    check_fraction("beside_frac", frac)?;
    Ok(beside_frac_unchecked(frac, rune1, rune2))
}

/// Places two runes side by side in equal halves.
pub fn beside(rune1: Rune, rune2: Rune) -> Rune {
    beside_frac_unchecked(0.5, rune1, rune2)
}

/// Effective fraction bounds for [`overlay_frac`]. An exact 0 or 1 would
/// put both children on the same depth plane and z-fight.
const MIN_OVERLAY_FRAC: f32 = 1e-6;

pub(crate) fn overlay_frac_clamped(frac: f32, rune1: Rune, rune2: Rune) -> Rune {
    let frac = frac.clamp(MIN_OVERLAY_FRAC, 1.0 - MIN_OVERLAY_FRAC);

    // The depth range [0, -1] is split: rune1 keeps the front slice
    // [0, -frac], rune2 is squeezed into [-frac, -1].
    let front = Rune::wrap_transform(Mat4::from_scale(Vec3::new(1.0, 1.0, frac)), rune1);
    let back = Rune::wrap_transform(
        Mat4::from_translation(Vec3::new(0.0, 0.0, -frac))
            * Mat4::from_scale(Vec3::new(1.0, 1.0, 1.0 - frac)),
        rune2,
    );

    // Front listed first: the paint order favors it should the planes ever
    // coincide exactly.
    Rune::compose(vec![front, back])
}

/// Shows `rune1` in front of `rune2`, giving `rune1` the front `frac` of
/// the depth range.
///
/// The input is validated against `[0, 1]` first; the effective value is
/// then clamped to `[1e-6, 1 - 1e-6]` so the two slices never collapse onto
/// one depth plane.
pub fn overlay_frac(frac: f32, rune1: Rune, rune2: Rune) -> Result<Rune, RuneError> {
    check_fraction("overlay_frac", frac)?;
    Ok(overlay_frac_clamped(frac, rune1, rune2))
}

/// Shows `rune1` in front of `rune2` with an even depth split.
pub fn overlay(rune1: Rune, rune2: Rune) -> Rune {
    overlay_frac_clamped(0.5, rune1, rune2)
}

/// The classic cross: quarter-turned and rotated copies of a rune arranged
/// in four quadrants.
pub fn make_cross(rune: Rune) -> Rune {
    stack(
        beside(quarter_turn_right(rune.clone()), rotate(PI, rune.clone())),
        beside(rune.clone(), rotate(FRAC_PI_2, rune)),
    )
}

/// Applies `pattern` to `initial` `n` times. `n` of 0 returns `initial`
/// unchanged.
pub fn repeat_pattern<F>(n: u32, pattern: F, initial: Rune) -> Rune
where
    F: Fn(Rune) -> Rune,
{
    let mut rune = initial;
    for _ in 0..n {
        rune = pattern(rune);
    }
    rune
}

// ============================================================================
// Appearance
// ============================================================================

/// Colors a rune with an explicit RGB value (alpha fixed at 1).
pub fn color(rune: Rune, r: f32, g: f32, b: f32) -> Rune {
    Rune::wrap_color(Color::rgb(r, g, b), rune)
}

/// Colors a rune with a random color from the named palette.
pub fn random_color(rune: Rune) -> Rune {
    let (_, picked) = PALETTE[rand::thread_rng().gen_range(0..PALETTE.len())];
    Rune::wrap_color(picked, rune)
}

pub fn red(rune: Rune) -> Rune {
    Rune::wrap_color(Color::RED, rune)
}

pub fn pink(rune: Rune) -> Rune {
    Rune::wrap_color(Color::PINK, rune)
}

pub fn purple(rune: Rune) -> Rune {
    Rune::wrap_color(Color::PURPLE, rune)
}

pub fn indigo(rune: Rune) -> Rune {
    Rune::wrap_color(Color::INDIGO, rune)
}

pub fn blue(rune: Rune) -> Rune {
    Rune::wrap_color(Color::BLUE, rune)
}

pub fn green(rune: Rune) -> Rune {
    Rune::wrap_color(Color::GREEN, rune)
}

pub fn yellow(rune: Rune) -> Rune {
    Rune::wrap_color(Color::YELLOW, rune)
}

pub fn orange(rune: Rune) -> Rune {
    Rune::wrap_color(Color::ORANGE, rune)
}

pub fn brown(rune: Rune) -> Rune {
    Rune::wrap_color(Color::BROWN, rune)
}

pub fn black(rune: Rune) -> Rune {
    Rune::wrap_color(Color::BLACK, rune)
}

pub fn white(rune: Rune) -> Rune {
    Rune::wrap_color(Color::WHITE, rune)
}

/// Declares the parallax magnitude the hollusion presentation sweeps the
/// camera across for this scene (default 0.1 when never declared).
pub fn hollusion_magnitude(distance: f32, rune: Rune) -> Rune {
    Rune::wrap_hollusion(distance, rune)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rune::flatten;

    fn assert_mat4_approx(a: Mat4, b: Mat4) {
        let (a, b) = (a.to_cols_array(), b.to_cols_array());
        for i in 0..16 {
            assert!(
                (a[i] - b[i]).abs() < 1e-5,
                "matrices differ at element {i}: {} vs {}",
                a[i],
                b[i]
            );
        }
    }

    #[test]
    fn scale_one_preserves_world_transforms() {
        let plain = flatten(&make_cross(square()));
        let scaled = flatten(&scale(1.0, make_cross(square())));
        assert_eq!(plain.len(), scaled.len());
        for (p, s) in plain.iter().zip(&scaled) {
            assert_mat4_approx(p.world_transform, s.world_transform);
        }
    }

    #[test]
    fn translate_round_trips() {
        let moved = translate(-0.7, 0.3, translate(0.7, -0.3, square()));
        let drawn = flatten(&moved);
        assert_eq!(drawn.len(), 1);
        assert_mat4_approx(drawn[0].world_transform, Mat4::IDENTITY);
    }

    #[test]
    fn stack_frac_places_vertical_halves() {
        let drawn = flatten(&stack_frac(0.5, square(), square()).unwrap());
        assert_eq!(drawn.len(), 2);

        // Unit-square corners through each world transform: the first rune
        // occupies y in [0, 1], the second y in [-1, 0].
        let corner_ys = |m: Mat4| {
            let lo = m.transform_point3(Vec3::new(-1.0, -1.0, 0.0)).y;
            let hi = m.transform_point3(Vec3::new(1.0, 1.0, 0.0)).y;
            (lo, hi)
        };
        let (lo, hi) = corner_ys(drawn[0].world_transform);
        assert!((lo - 0.0).abs() < 1e-6 && (hi - 1.0).abs() < 1e-6);
        let (lo, hi) = corner_ys(drawn[1].world_transform);
        assert!((lo - -1.0).abs() < 1e-6 && (hi - 0.0).abs() < 1e-6);
    }

    #[test]
    fn beside_frac_places_horizontal_halves() {
        let drawn = flatten(&beside_frac(0.5, square(), square()).unwrap());
        let x_at = |m: Mat4, x: f32| m.transform_point3(Vec3::new(x, 0.0, 0.0)).x;
        assert!((x_at(drawn[0].world_transform, -1.0) - -1.0).abs() < 1e-6);
        assert!((x_at(drawn[0].world_transform, 1.0) - 0.0).abs() < 1e-6);
        assert!((x_at(drawn[1].world_transform, -1.0) - 0.0).abs() < 1e-6);
        assert!((x_at(drawn[1].world_transform, 1.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn overlay_splits_depth_front_first() {
        let drawn = flatten(&overlay(red(square()), blue(square())));
        assert_eq!(drawn.len(), 2);
        assert_eq!(drawn[0].color, Color::RED);
        assert_eq!(drawn[1].color, Color::BLUE);

        let z_of = |m: Mat4| m.transform_point3(Vec3::ZERO).z;
        assert!((z_of(drawn[0].world_transform) - 0.0).abs() < 1e-6);
        assert!((z_of(drawn[1].world_transform) - -0.5).abs() < 1e-6);
    }

    #[test]
    fn overlay_frac_clamp_is_noop_at_boundary() {
        let at_zero = flatten(&overlay_frac(0.0, square(), square()).unwrap());
        let at_eps = flatten(&overlay_frac(1e-6, square(), square()).unwrap());
        for (a, b) in at_zero.iter().zip(&at_eps) {
            assert_mat4_approx(a.world_transform, b.world_transform);
        }
    }

    #[test]
    fn fraction_combinators_reject_out_of_range() {
        for frac in [-0.1, 1.1] {
            let err = stack_frac(frac, square(), square()).unwrap_err();
            assert!(err.to_string().contains("stack_frac"));
            let err = beside_frac(frac, square(), square()).unwrap_err();
            assert!(err.to_string().contains("beside_frac"));
            let err = overlay_frac(frac, square(), square()).unwrap_err();
            assert!(err.to_string().contains("overlay_frac"));
        }
    }

    #[test]
    fn repeat_pattern_zero_is_identity() {
        let drawn = flatten(&repeat_pattern(0, |r| scale(0.5, r), square()));
        assert_eq!(drawn.len(), 1);
        assert_mat4_approx(drawn[0].world_transform, Mat4::IDENTITY);
    }

    #[test]
    fn repeat_pattern_composes_n_times() {
        let repeated = flatten(&repeat_pattern(3, |r| translate(1.0, 0.0, r), square()));
        let explicit = flatten(&translate(
            1.0,
            0.0,
            translate(1.0, 0.0, translate(1.0, 0.0, square())),
        ));
        assert_eq!(repeated.len(), explicit.len());
        for (a, b) in repeated.iter().zip(&explicit) {
            assert_mat4_approx(a.world_transform, b.world_transform);
        }
    }

    #[test]
    fn stack_of_squares_yields_two_halved_squares() {
        let drawn = flatten(&stack(square(), square()));
        assert_eq!(drawn.len(), 2);
        for d in &drawn {
            assert_eq!(d.geometry.triangle_count(), 2);
            // Vertical scale is one half.
            let tall = d
                .world_transform
                .transform_vector3(Vec3::new(0.0, 1.0, 0.0));
            assert!((tall.y - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn make_cross_yields_four_quadrants() {
        let drawn = flatten(&make_cross(square()));
        assert_eq!(drawn.len(), 4);

        // Leaf centers land in the four quadrant centers, in declaration
        // order: top-left, top-right, bottom-left, bottom-right.
        let centers: Vec<Vec3> = drawn
            .iter()
            .map(|d| d.world_transform.transform_point3(Vec3::ZERO))
            .collect();
        let expected = [
            Vec3::new(-0.5, 0.5, 0.0),
            Vec3::new(0.5, 0.5, 0.0),
            Vec3::new(-0.5, -0.5, 0.0),
            Vec3::new(0.5, -0.5, 0.0),
        ];
        for (center, want) in centers.iter().zip(expected) {
            assert!((*center - want).length() < 1e-5, "{center:?} vs {want:?}");
        }
    }

    #[test]
    fn stackn_reuses_the_same_leaf() {
        let drawn = flatten(&stackn(3, square()));
        assert_eq!(drawn.len(), 3);
        assert!(std::sync::Arc::ptr_eq(&drawn[0].geometry, &drawn[1].geometry));
        assert!(std::sync::Arc::ptr_eq(&drawn[1].geometry, &drawn[2].geometry));
        // Distinct vertical bands, top to bottom.
        let tops: Vec<f32> = drawn
            .iter()
            .map(|d| d.world_transform.transform_point3(Vec3::new(0.0, 1.0, 0.0)).y)
            .collect();
        assert!((tops[0] - 1.0).abs() < 1e-5);
        assert!(tops[0] > tops[1] && tops[1] > tops[2]);
    }

    #[test]
    fn coloring_a_composite_reaches_uncolored_leaves_only() {
        let composite = stack(green(square()), square());
        let drawn = flatten(&red(composite));
        assert_eq!(drawn[0].color, Color::GREEN);
        assert_eq!(drawn[1].color, Color::RED);
    }

    #[test]
    fn quarter_turns_invert_each_other() {
        let drawn = flatten(&quarter_turn_left(quarter_turn_right(square())));
        assert_mat4_approx(drawn[0].world_transform, Mat4::IDENTITY);
    }

    #[test]
    fn from_url_carries_a_texture() {
        let drawn = flatten(&from_url("file://does/not/matter.png"));
        assert_eq!(drawn.len(), 1);
        assert!(drawn[0].texture.is_some());
    }
}
