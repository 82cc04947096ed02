//! Core engine types shared by the archipelago crates.
//!
//! This crate provides the foundational pieces every system leans on:
//! - Transform and upload-ready instance data
//! - Frame and fixed-step time management
//! - The scene graph the simulation pushes transforms into

pub mod scene;
pub mod time;
pub mod transform;

pub use scene::*;
pub use time::*;
pub use transform::*;

// Re-export commonly used types
pub use glam::{Mat4, Quat, UVec3, Vec2, Vec3, Vec4};
