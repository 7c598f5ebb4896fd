//! The rune scene graph and its resolution into drawable primitives.
//!
//! A [`Rune`] is an immutable node in a composition graph. Combinators never
//! mutate their inputs; they wrap them in new nodes, so the same node may be
//! shared by any number of parents (the graph is a DAG, not necessarily a
//! tree). Cycles cannot form because every combinator strictly adds a layer
//! above its arguments.
//!
//! [`flatten`] resolves a graph into an ordered list of [`DrawnRune`]s, each
//! carrying the fully composed world transform and inherited appearance for
//! one occurrence of a primitive leaf. The traversal carries its own context
//! value and never touches node state, so a subgraph reached via two paths
//! correctly resolves twice with different transforms.

use std::sync::Arc;

use glam::Mat4;

use crate::color::Color;
use crate::geometry::RawGeometry;
use crate::texture::ImageSource;

/// An immutable scene-graph node: either a primitive leaf or a composite.
///
/// Cloning a `Rune` is cheap; it shares the underlying node.
#[derive(Clone, Debug)]
pub struct Rune(Arc<RuneNode>);

#[derive(Debug)]
struct RuneNode {
    /// Local transform applied to this node's subtree. Identity by default.
    transform: Mat4,
    /// Explicit color; overrides inherited color for the subtree.
    color: Option<Color>,
    /// Explicit texture; same inheritance as color, wins over color on a leaf.
    texture: Option<Arc<ImageSource>>,
    /// Parallax magnitude tag consumed by the hollusion compositor.
    hollusion_distance: Option<f32>,
    /// Ordered children; empty for primitive leaves.
    children: Vec<Rune>,
    /// Present only on primitive leaves.
    geometry: Option<Arc<RawGeometry>>,
}

impl Rune {
    /// Creates a primitive leaf from geometry.
    pub(crate) fn primitive(geometry: RawGeometry) -> Self {
        Self(Arc::new(RuneNode {
            transform: Mat4::IDENTITY,
            color: None,
            texture: None,
            hollusion_distance: None,
            children: Vec::new(),
            geometry: Some(Arc::new(geometry)),
        }))
    }

    /// Creates a textured primitive leaf.
    pub(crate) fn textured(geometry: RawGeometry, source: ImageSource) -> Self {
        Self(Arc::new(RuneNode {
            transform: Mat4::IDENTITY,
            color: None,
            texture: Some(Arc::new(source)),
            hollusion_distance: None,
            children: Vec::new(),
            geometry: Some(Arc::new(geometry)),
        }))
    }

    /// Creates a composite node over ordered children.
    pub(crate) fn compose(children: Vec<Rune>) -> Self {
        Self(Arc::new(RuneNode {
            transform: Mat4::IDENTITY,
            color: None,
            texture: None,
            hollusion_distance: None,
            children,
            geometry: None,
        }))
    }

    /// Wraps `child` under a local transform.
    pub(crate) fn wrap_transform(transform: Mat4, child: Rune) -> Self {
        Self(Arc::new(RuneNode {
            transform,
            color: None,
            texture: None,
            hollusion_distance: None,
            children: vec![child],
            geometry: None,
        }))
    }

    /// Wraps `child` with an explicit color.
    pub(crate) fn wrap_color(color: Color, child: Rune) -> Self {
        Self(Arc::new(RuneNode {
            transform: Mat4::IDENTITY,
            color: Some(color),
            texture: None,
            hollusion_distance: None,
            children: vec![child],
            geometry: None,
        }))
    }

    /// Wraps `child` with a hollusion parallax magnitude tag.
    pub(crate) fn wrap_hollusion(distance: f32, child: Rune) -> Self {
        Self(Arc::new(RuneNode {
            transform: Mat4::IDENTITY,
            color: None,
            texture: None,
            hollusion_distance: Some(distance),
            children: vec![child],
            geometry: None,
        }))
    }

    /// True for primitive leaves (geometry present, no children).
    pub fn is_primitive(&self) -> bool {
        self.0.geometry.is_some()
    }

    /// The parallax magnitude declared at this node, if any.
    pub fn hollusion_distance(&self) -> Option<f32> {
        self.0.hollusion_distance
    }

    /// Resolves this graph into drawable primitives. See [`flatten`].
    pub fn flatten(&self) -> Vec<DrawnRune> {
        flatten(self)
    }
}

/// One resolved occurrence of a primitive leaf, ready to draw.
#[derive(Clone)]
pub struct DrawnRune {
    /// Geometry handle from the originating leaf.
    pub geometry: Arc<RawGeometry>,
    /// Composition of all ancestor transforms, root-to-leaf order.
    pub world_transform: Mat4,
    /// Nearest explicit ancestor color; black when none was ever set.
    pub color: Color,
    /// Nearest explicit ancestor texture; wins over `color` when present.
    pub texture: Option<Arc<ImageSource>>,
    /// Nearest hollusion magnitude tag on the path, if any.
    pub hollusion_distance: Option<f32>,
}

/// Context accumulated along one root-to-leaf path.
///
/// Always passed by value: children of a node receive the same context, and
/// sibling traversals cannot observe each other.
#[derive(Clone)]
struct FlattenContext {
    world: Mat4,
    color: Option<Color>,
    texture: Option<Arc<ImageSource>>,
    hollusion: Option<f32>,
}

/// Resolves every primitive leaf reachable from `rune` into an ordered
/// [`DrawnRune`] list.
///
/// The output order is the depth-first declaration order of children at
/// every level. That order is the paint order: `overlay_frac` relies on the
/// front slice being listed first.
pub fn flatten(rune: &Rune) -> Vec<DrawnRune> {
    let mut out = Vec::new();
    collect(
        rune,
        FlattenContext {
            world: Mat4::IDENTITY,
            color: None,
            texture: None,
            hollusion: None,
        },
        &mut out,
    );
    out
}

fn collect(rune: &Rune, inherited: FlattenContext, out: &mut Vec<DrawnRune>) {
    let node = &rune.0;
    // Child-local coordinates see the node's own matrix first, then
    // everything above it; the node's explicit appearance shadows what was
    // inherited.
    let ctx = FlattenContext {
        world: inherited.world * node.transform,
        color: node.color.or(inherited.color),
        texture: node.texture.clone().or(inherited.texture),
        hollusion: node.hollusion_distance.or(inherited.hollusion),
    };

    if let Some(geometry) = &node.geometry {
        out.push(DrawnRune {
            geometry: Arc::clone(geometry),
            world_transform: ctx.world,
            color: ctx.color.unwrap_or(Color::BLACK),
            texture: ctx.texture,
            hollusion_distance: ctx.hollusion,
        });
    } else {
        for child in &node.children {
            collect(child, ctx.clone(), out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn leaf() -> Rune {
        Rune::primitive(RawGeometry::square())
    }

    #[test]
    fn flatten_preserves_declaration_order() {
        let a = Rune::wrap_color(Color::rgb(1.0, 0.0, 0.0), leaf());
        let b = Rune::wrap_color(Color::rgb(0.0, 1.0, 0.0), leaf());
        let c = Rune::wrap_color(Color::rgb(0.0, 0.0, 1.0), leaf());
        let drawn = flatten(&Rune::compose(vec![a, Rune::compose(vec![b, c])]));

        assert_eq!(drawn.len(), 3);
        assert_eq!(drawn[0].color, Color::rgb(1.0, 0.0, 0.0));
        assert_eq!(drawn[1].color, Color::rgb(0.0, 1.0, 0.0));
        assert_eq!(drawn[2].color, Color::rgb(0.0, 0.0, 1.0));
    }

    #[test]
    fn uncolored_leaf_defaults_to_black() {
        let drawn = flatten(&leaf());
        assert_eq!(drawn.len(), 1);
        assert_eq!(drawn[0].color, Color::BLACK);
        assert_eq!(drawn[0].world_transform, Mat4::IDENTITY);
    }

    #[test]
    fn nearest_explicit_color_wins() {
        let inner = Rune::wrap_color(Color::rgb(0.0, 0.0, 1.0), leaf());
        let outer = Rune::wrap_color(Color::rgb(1.0, 0.0, 0.0), Rune::compose(vec![inner, leaf()]));
        let drawn = flatten(&outer);

        assert_eq!(drawn.len(), 2);
        // The leaf under the inner color keeps it; the bare leaf inherits
        // the outer one.
        assert_eq!(drawn[0].color, Color::rgb(0.0, 0.0, 1.0));
        assert_eq!(drawn[1].color, Color::rgb(1.0, 0.0, 0.0));
    }

    #[test]
    fn shared_subgraph_resolves_per_path() {
        let shared = leaf();
        let left = Rune::wrap_transform(Mat4::from_translation(Vec3::new(-1.0, 0.0, 0.0)), shared.clone());
        let right = Rune::wrap_transform(Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0)), shared);
        let drawn = flatten(&Rune::compose(vec![left, right]));

        assert_eq!(drawn.len(), 2);
        // Same leaf allocation, different resolved transforms.
        assert!(Arc::ptr_eq(&drawn[0].geometry, &drawn[1].geometry));
        assert_ne!(drawn[0].world_transform, drawn[1].world_transform);
    }

    #[test]
    fn transforms_compose_root_to_leaf() {
        let scale = Mat4::from_scale(Vec3::new(0.5, 0.5, 1.0));
        let shift = Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0));
        // Outer translate over inner scale: a leaf point is scaled first,
        // then translated.
        let rune = Rune::wrap_transform(shift, Rune::wrap_transform(scale, leaf()));
        let drawn = flatten(&rune);

        let p = drawn[0].world_transform.transform_point3(Vec3::new(1.0, 1.0, 0.0));
        assert!((p - Vec3::new(1.5, 0.5, 0.0)).length() < 1e-6);
    }

    #[test]
    fn hollusion_tag_reaches_leaves() {
        let tagged = Rune::wrap_hollusion(0.25, Rune::compose(vec![leaf(), leaf()]));
        let drawn = flatten(&tagged);
        assert_eq!(drawn.len(), 2);
        assert_eq!(drawn[0].hollusion_distance, Some(0.25));
        assert_eq!(tagged.hollusion_distance(), Some(0.25));
        assert_eq!(leaf().hollusion_distance(), None);
    }
}
