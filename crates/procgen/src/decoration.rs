//! Island decorations: block trees, rocks and the team flag.

use glam::{IVec3, Vec2, Vec3};
use rand::prelude::*;
use std::f32::consts::{PI, TAU};

/// Height of the island top above sea level.
pub const ISLAND_TOP: f32 = 3.0;

/// Surface height at island-local `(x, z)`: the island top inside the
/// radius, sea level outside.
pub fn surface_height(x: f32, z: f32, radius: f32) -> f32 {
    if (x * x + z * z).sqrt() <= radius {
        ISLAND_TOP
    } else {
        0.0
    }
}

/// Convert a `0xRRGGBB` colour to linear-ish RGBA floats.
pub fn color_from_hex(hex: u32) -> [f32; 4] {
    [
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
        1.0,
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeKind {
    Oak,
    Pine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrownShape {
    /// Hollow 5x5 box, thinning toward the corners.
    Cube,
    /// Diamond layers shrinking upward.
    Pyramid,
}

impl TreeKind {
    /// Inclusive trunk height range in blocks.
    pub fn trunk_heights(self) -> std::ops::RangeInclusive<u32> {
        match self {
            TreeKind::Oak => 4..=6,
            TreeKind::Pine => 6..=9,
        }
    }

    pub fn crown_size(self) -> i32 {
        match self {
            TreeKind::Oak => 3,
            TreeKind::Pine => 4,
        }
    }

    pub fn crown_shape(self) -> CrownShape {
        match self {
            TreeKind::Oak => CrownShape::Cube,
            TreeKind::Pine => CrownShape::Pyramid,
        }
    }

    pub fn trunk_color(self) -> [f32; 4] {
        match self {
            TreeKind::Oak => color_from_hex(0x8b4513),
            TreeKind::Pine => color_from_hex(0x6b4423),
        }
    }

    pub fn leaf_color(self) -> [f32; 4] {
        match self {
            TreeKind::Oak => color_from_hex(0x2d5a27),
            TreeKind::Pine => color_from_hex(0x1b4a1b),
        }
    }
}

/// A stack of trunk blocks with a sparse crown of leaf blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    pub kind: TreeKind,
    /// Island-local base position, on the surface.
    pub position: Vec3,
    pub yaw: f32,
    pub trunk_height: u32,
    /// Leaf block offsets relative to the tree base.
    pub leaves: Vec<IVec3>,
}

impl Tree {
    /// Trunk block offsets relative to the tree base.
    pub fn trunk_blocks(&self) -> impl Iterator<Item = IVec3> {
        (0..self.trunk_height as i32).map(|y| IVec3::new(0, y, 0))
    }

    pub fn block_count(&self) -> usize {
        self.trunk_height as usize + self.leaves.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rock {
    /// Island-local centre; rests on the surface.
    pub position: Vec3,
    pub radius: f32,
    /// Euler rotation (x, y, z) in radians.
    pub rotation: Vec3,
}

impl Rock {
    pub const COLOR: u32 = 0x808080;
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decoration {
    Tree(Tree),
    Rock(Rock),
}

impl Decoration {
    pub fn position(&self) -> Vec3 {
        match self {
            Decoration::Tree(tree) => tree.position,
            Decoration::Rock(rock) => rock.position,
        }
    }
}

/// Team flag planted at the island centre.
#[derive(Debug, Clone, PartialEq)]
pub struct Flag {
    /// Island-local pole base.
    pub pole_base: Vec3,
    pub pole_height: f32,
    /// Banner centre relative to the pole base.
    pub banner_offset: Vec3,
    pub banner_size: Vec2,
    pub color: [f32; 4],
}

impl Flag {
    pub fn new(color: [f32; 4]) -> Self {
        Self {
            pole_base: Vec3::new(0.0, ISLAND_TOP, 0.0),
            pole_height: 10.0,
            banner_offset: Vec3::new(2.0, 8.0, 0.0),
            banner_size: Vec2::new(4.0, 2.0),
            color,
        }
    }

    /// Island-local banner centre.
    pub fn banner_position(&self) -> Vec3 {
        self.pole_base + self.banner_offset
    }
}

/// Grow a tree of `kind` at island-local `(x, z)`.
pub fn generate_tree(rng: &mut impl Rng, kind: TreeKind, x: f32, z: f32, radius: f32) -> Tree {
    let trunk_height = rng.gen_range(kind.trunk_heights());
    let crown_y = trunk_height as i32 - 1;
    let size = kind.crown_size();
    let mut leaves = Vec::new();

    match kind.crown_shape() {
        CrownShape::Cube => {
            for y in 0..size {
                for lx in -2..=2i32 {
                    for lz in -2..=2i32 {
                        let shell = lx.abs() == 2 || lz.abs() == 2 || y == 0 || y == size - 1;
                        if !shell {
                            continue;
                        }
                        let dist = ((lx * lx + lz * lz) as f32).sqrt();
                        if rng.gen::<f32>() < 1.0 - dist / 3.0 {
                            leaves.push(IVec3::new(lx, crown_y + y, lz));
                        }
                    }
                }
            }
        }
        CrownShape::Pyramid => {
            for y in 0..size {
                let layer = size - y;
                for lx in -layer..=layer {
                    for lz in -layer..=layer {
                        let dist = ((lx * lx + lz * lz) as f32).sqrt();
                        if dist <= layer as f32 && rng.gen::<f32>() < 0.8 {
                            leaves.push(IVec3::new(lx, crown_y + y, lz));
                        }
                    }
                }
            }
        }
    }

    Tree {
        kind,
        position: Vec3::new(x, surface_height(x, z, radius), z),
        yaw: rng.gen_range(0.0..TAU),
        trunk_height,
        leaves,
    }
}

/// Place a rock at island-local `(x, z)`.
pub fn generate_rock(rng: &mut impl Rng, x: f32, z: f32, island_radius: f32) -> Rock {
    let radius = rng.gen_range(0.5..1.5);
    Rock {
        position: Vec3::new(x, surface_height(x, z, island_radius) + radius, z),
        radius,
        rotation: Vec3::new(
            rng.gen_range(0.0..PI),
            rng.gen_range(0.0..PI),
            rng.gen_range(0.0..PI),
        ),
    }
}

pub const RING_TREES: usize = 12;
pub const SCATTER_TREES: usize = 8;
pub const SCATTER_ROCKS: usize = 15;

fn polar(angle: f32, r: f32) -> (f32, f32) {
    (angle.cos() * r, angle.sin() * r)
}

/// Ring, scattered trees and rocks for an island of `radius`.
///
/// Positions are sampled uniformly in angle and radius, so they cluster
/// toward the centre.
pub fn decorate_island(rng: &mut impl Rng, radius: f32) -> Vec<Decoration> {
    let mut decorations = Vec::with_capacity(RING_TREES + SCATTER_TREES + SCATTER_ROCKS);

    let ring = (radius - 2.0).max(0.0);
    for i in 0..RING_TREES {
        let angle = i as f32 / RING_TREES as f32 * TAU;
        let (x, z) = polar(angle, ring);
        let kind = if i % 2 == 0 { TreeKind::Oak } else { TreeKind::Pine };
        decorations.push(Decoration::Tree(generate_tree(rng, kind, x, z, radius)));
    }

    // [5, 25) on the standard 30-unit island.
    let inner = radius / 6.0;
    let outer = radius * 5.0 / 6.0;
    for _ in 0..SCATTER_TREES {
        let angle = rng.gen_range(0.0..TAU);
        let r = if outer > inner { rng.gen_range(inner..outer) } else { inner };
        let (x, z) = polar(angle, r);
        let kind = if rng.gen::<f32>() < 0.7 { TreeKind::Oak } else { TreeKind::Pine };
        decorations.push(Decoration::Tree(generate_tree(rng, kind, x, z, radius)));
    }

    for _ in 0..SCATTER_ROCKS {
        let angle = rng.gen_range(0.0..TAU);
        let r = if radius > 0.0 { rng.gen_range(0.0..radius) } else { 0.0 };
        let (x, z) = polar(angle, r);
        decorations.push(Decoration::Rock(generate_rock(rng, x, z, radius)));
    }

    decorations
}
