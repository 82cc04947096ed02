//! Island layout: one decorated island per team, ringed around a centre island.

use crate::decoration::{color_from_hex, decorate_island, Decoration, Flag, ISLAND_TOP};
use glam::{Vec2, Vec3};
use rand::prelude::*;
use std::f32::consts::TAU;

pub const ISLAND_RADIUS: f32 = 30.0;

/// Team palette; island `i` takes entry `i % 6`.
pub const TEAM_COLORS: [u32; 6] = [0xf2d16b, 0xff6b6b, 0x6bff6b, 0x6b6bff, 0xff6bff, 0x6bffff];

pub fn team_color(team: usize) -> [f32; 4] {
    color_from_hex(TEAM_COLORS[team % TEAM_COLORS.len()])
}

/// How many islands to build and how far apart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IslandLayout {
    pub player_count: u32,
    pub players_per_island: u32,
    /// Distance from the centre island to each ring island.
    pub spacing: f32,
    pub radius: f32,
}

impl Default for IslandLayout {
    fn default() -> Self {
        Self {
            player_count: 12,
            players_per_island: 6,
            spacing: 300.0,
            radius: ISLAND_RADIUS,
        }
    }
}

impl IslandLayout {
    /// `max(1, ceil(players / players_per_island))`.
    pub fn island_count(&self) -> usize {
        let per = self.players_per_island.max(1);
        (self.player_count.div_ceil(per) as usize).max(1)
    }

    /// Centre of island `index` among `count`.
    pub fn island_position(&self, index: usize, count: usize) -> Vec3 {
        if index == 0 || count < 2 {
            return Vec3::ZERO;
        }
        let angle = (index - 1) as f32 / (count - 1) as f32 * TAU;
        Vec3::new(angle.cos() * self.spacing, 0.0, angle.sin() * self.spacing)
    }
}

/// A team's island. Positions of decorations and flag are island-local.
#[derive(Debug, Clone)]
pub struct Island {
    pub team: usize,
    pub position: Vec3,
    pub radius: f32,
    pub color: [f32; 4],
    pub decorations: Vec<Decoration>,
    pub flag: Flag,
}

impl Island {
    /// Height of the top surface above sea level.
    pub fn top(&self) -> f32 {
        self.position.y + ISLAND_TOP
    }

    /// Distance to `point` ignoring height.
    pub fn horizontal_distance(&self, point: Vec3) -> f32 {
        Vec2::new(point.x - self.position.x, point.z - self.position.z).length()
    }

    /// Whether `point` is over land.
    pub fn contains(&self, point: Vec3) -> bool {
        self.horizontal_distance(point) <= self.radius
    }

    pub fn world_position(&self, local: Vec3) -> Vec3 {
        self.position + local
    }
}

/// Lay out and decorate islands for `layout`.
pub fn layout_islands(layout: &IslandLayout, seed: u64) -> Vec<Island> {
    if layout.players_per_island == 0 {
        log::warn!("players_per_island is 0, treating as 1");
    }
    let count = layout.island_count();
    log::info!(
        "Generating {} islands for {} players",
        count,
        layout.player_count
    );

    (0..count)
        .map(|i| {
            let island_seed = seed.wrapping_add((i as u64 + 1).wrapping_mul(104729));
            let mut rng = StdRng::seed_from_u64(island_seed);
            let position = layout.island_position(i, count);
            let color = team_color(i);
            log::debug!("Island {} at ({:.1}, {:.1}, {:.1})", i, position.x, position.y, position.z);
            Island {
                team: i,
                position,
                radius: layout.radius,
                color,
                decorations: decorate_island(&mut rng, layout.radius),
                flag: Flag::new(color),
            }
        })
        .collect()
}

/// The island closest to `position`; ties go to the lower index.
pub fn find_nearest_island(islands: &[Island], position: Vec3) -> Option<(usize, &Island)> {
    islands.iter().enumerate().min_by(|(_, a), (_, b)| {
        a.position
            .distance_squared(position)
            .partial_cmp(&b.position.distance_squared(position))
            .unwrap_or(std::cmp::Ordering::Equal)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(players: u32) -> IslandLayout {
        IslandLayout {
            player_count: players,
            ..Default::default()
        }
    }

    #[test]
    fn twelve_players_make_two_islands() {
        let islands = layout_islands(&layout(12), 0);
        assert_eq!(islands.len(), 2);
        assert_eq!(islands[0].position, Vec3::ZERO);
        assert!(islands[1].position.distance(Vec3::new(300.0, 0.0, 0.0)) < 1e-3);
        assert_eq!(islands[1].color, team_color(1));
    }

    #[test]
    fn island_count_rounds_up_and_never_hits_zero() {
        assert_eq!(layout(0).island_count(), 1);
        assert_eq!(layout(1).island_count(), 1);
        assert_eq!(layout(7).island_count(), 2);
        assert_eq!(layout(36).island_count(), 6);
        let zero_per = IslandLayout {
            player_count: 3,
            players_per_island: 0,
            ..Default::default()
        };
        assert_eq!(zero_per.island_count(), 3);
    }

    #[test]
    fn ring_islands_sit_at_spacing_without_overlap() {
        for players in 1..=48 {
            let islands = layout_islands(&layout(players), 2);
            assert_eq!(islands.len(), layout(players).island_count());
            assert_eq!(islands[0].position, Vec3::ZERO);
            for island in &islands[1..] {
                assert!((island.position.length() - 300.0).abs() < 1e-2);
            }
            for (i, a) in islands.iter().enumerate() {
                for b in &islands[i + 1..] {
                    assert!(a.position.distance(b.position) >= 2.0 * ISLAND_RADIUS);
                }
            }
        }
    }

    #[test]
    fn layout_is_reproducible_per_seed() {
        let a = layout_islands(&layout(18), 77);
        let b = layout_islands(&layout(18), 77);
        let c = layout_islands(&layout(18), 78);
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.decorations, y.decorations);
        }
        assert_ne!(a[0].decorations, c[0].decorations);
        // Each island draws from its own stream.
        assert_ne!(a[0].decorations, a[1].decorations);
    }

    #[test]
    fn team_colors_cycle() {
        let islands = layout_islands(&layout(42), 0);
        assert_eq!(islands.len(), 7);
        assert_eq!(islands[6].color, islands[0].color);
        assert_eq!(islands[6].flag.color, team_color(0));
    }

    #[test]
    fn nearest_island_is_the_unique_minimum() {
        let islands = layout_islands(&layout(24), 0);
        let (index, island) = find_nearest_island(&islands, Vec3::new(280.0, 7.0, 10.0)).unwrap();
        assert_eq!(index, 1);
        assert_eq!(island.team, 1);
        let (index, _) = find_nearest_island(&islands, Vec3::new(20.0, 0.0, -5.0)).unwrap();
        assert_eq!(index, 0);
        assert!(find_nearest_island(&[], Vec3::ZERO).is_none());
    }

    #[test]
    fn containment_ignores_height() {
        let islands = layout_islands(&layout(6), 0);
        assert!(islands[0].contains(Vec3::new(29.0, 50.0, 0.0)));
        assert!(!islands[0].contains(Vec3::new(31.0, 0.0, 0.0)));
        assert_eq!(islands[0].top(), 3.0);
    }
}
