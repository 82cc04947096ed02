//! Collision queries using Rapier3D.
//!
//! Nothing here is simulated: islands and boats are parentless colliders
//! whose poses the game pushes in every tick, and the world answers ray
//! queries against them.

pub mod collision;
pub mod physics_world;
pub mod raycast;

pub use collision::*;
pub use physics_world::*;
pub use raycast::*;

// Re-export Rapier for downstream crates
pub use rapier3d;

// Re-export common Rapier types
pub use rapier3d::prelude::ColliderHandle;
