//! Collision groups and filtering.

use rapier3d::prelude::*;

/// Collision groups for the things a ray can hit.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionGroup {
    /// Island platforms
    Island = 1 << 0,
    /// Boat hulls
    Boat = 1 << 1,
}

impl CollisionGroup {
    /// Membership/filter pair for a collider of this group.
    pub fn interaction(self) -> InteractionGroups {
        InteractionGroups::new(Group::from_bits_retain(self as u32), Group::ALL)
    }

    /// Query groups for a ray that stops on any of `groups`.
    pub fn query(groups: &[CollisionGroup]) -> InteractionGroups {
        let bits = groups.iter().fold(0u32, |acc, g| acc | *g as u32);
        InteractionGroups::new(Group::ALL, Group::from_bits_retain(bits))
    }
}
