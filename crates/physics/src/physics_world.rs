//! Collider bookkeeping with Rapier3D.

use crate::collision::CollisionGroup;
use engine_core::{Transform, Vec3};
use rapier3d::na::{Isometry3, UnitQuaternion, Vector3};
use rapier3d::prelude::*;

/// Query-only physics world.
pub struct PhysicsWorld {
    pub rigid_body_set: RigidBodySet,
    pub collider_set: ColliderSet,
    pub island_manager: IslandManager,
    pub query_pipeline: QueryPipeline,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

fn isometry(position: Vec3, rotation_y_rad: f32) -> Isometry<Real> {
    let tra = vector![position.x, position.y, position.z];
    let axisangle = Vector3::y_axis().into_inner() * (rotation_y_rad as Real);
    Isometry3::new(tra, axisangle)
}

impl PhysicsWorld {
    pub fn new() -> Self {
        Self {
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            island_manager: IslandManager::new(),
            query_pipeline: QueryPipeline::new(),
        }
    }

    /// Update query pipeline for raycasting. Call after moving colliders.
    pub fn update_query_pipeline(&mut self) {
        self.query_pipeline.update(&self.collider_set);
    }

    /// Add an island platform: a vertical cylinder whose base sits at `center.y`.
    pub fn add_island_collider(&mut self, center: Vec3, radius: f32, height: f32) -> ColliderHandle {
        let half_height = height * 0.5;
        let collider = ColliderBuilder::cylinder(half_height, radius)
            .position(isometry(center + Vec3::Y * half_height, 0.0))
            .collision_groups(CollisionGroup::Island.interaction())
            .build();
        self.collider_set.insert(collider)
    }

    /// Add a boat hull box. `half_extents` are in the hull's local frame.
    pub fn add_boat_collider(&mut self, position: Vec3, yaw: f32, half_extents: Vec3) -> ColliderHandle {
        let collider = ColliderBuilder::cuboid(
            half_extents.x as Real,
            half_extents.y as Real,
            half_extents.z as Real,
        )
        .position(isometry(position, yaw))
        .collision_groups(CollisionGroup::Boat.interaction())
        .build();
        self.collider_set.insert(collider)
    }

    /// Move a collider to a new pose (position + full rotation).
    pub fn set_collider_transform(&mut self, handle: ColliderHandle, transform: &Transform) {
        if let Some(collider) = self.collider_set.get_mut(handle) {
            let p = transform.position;
            let q = transform.rotation;
            let rotation = UnitQuaternion::from_quaternion(rapier3d::na::Quaternion::new(q.w, q.x, q.y, q.z));
            collider.set_position(Isometry3::from_parts(vector![p.x, p.y, p.z].into(), rotation));
        }
    }

    /// Get the pose of a collider.
    pub fn collider_transform(&self, handle: ColliderHandle) -> Option<Transform> {
        self.collider_set.get(handle).map(|collider| {
            let pos = collider.translation();
            let rot = collider.rotation();
            Transform {
                position: Vec3::new(pos.x, pos.y, pos.z),
                rotation: glam::Quat::from_xyzw(rot.i, rot.j, rot.k, rot.w),
                scale: Vec3::ONE,
            }
        })
    }

    /// Remove a collider by its handle.
    pub fn remove_collider(&mut self, handle: ColliderHandle) {
        self.collider_set.remove(
            handle,
            &mut self.island_manager,
            &mut self.rigid_body_set,
            true,
        );
    }

    pub fn collider_count(&self) -> usize {
        self.collider_set.len()
    }
}
