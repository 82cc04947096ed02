//! Raycasting for pointer picks.

use crate::collision::CollisionGroup;
use crate::PhysicsWorld;
use engine_core::Vec3;
use rapier3d::prelude::*;

/// Result of a raycast query.
#[derive(Debug, Clone, Copy)]
pub struct RaycastHit {
    /// The collider that was hit.
    pub collider: ColliderHandle,
    /// Distance along the ray to the hit point.
    pub distance: f32,
    /// World position of the hit.
    pub point: Vec3,
    /// Surface normal at the hit point.
    pub normal: Vec3,
}

fn ray(origin: Vec3, direction: Vec3) -> Ray {
    Ray::new(
        point![origin.x, origin.y, origin.z],
        vector![direction.x, direction.y, direction.z],
    )
}

fn to_hit(ray: &Ray, collider: ColliderHandle, intersection: RayIntersection) -> RaycastHit {
    let point = ray.point_at(intersection.time_of_impact);
    RaycastHit {
        collider,
        distance: intersection.time_of_impact,
        point: Vec3::new(point.x, point.y, point.z),
        normal: Vec3::new(
            intersection.normal.x,
            intersection.normal.y,
            intersection.normal.z,
        ),
    }
}

impl PhysicsWorld {
    /// Cast a ray and return the first hit among colliders in `groups`.
    /// `direction` should be normalized so distances are in world units.
    pub fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        groups: &[CollisionGroup],
    ) -> Option<RaycastHit> {
        let ray = ray(origin, direction);
        let filter = QueryFilter::default().groups(CollisionGroup::query(groups));

        self.query_pipeline
            .cast_ray_and_get_normal(
                &self.rigid_body_set,
                &self.collider_set,
                &ray,
                max_distance,
                true,
                filter,
            )
            .map(|(collider, intersection)| to_hit(&ray, collider, intersection))
    }

    /// Cast a ray and return all hits up to max_distance, nearest first.
    pub fn raycast_all(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        groups: &[CollisionGroup],
    ) -> Vec<RaycastHit> {
        let ray = ray(origin, direction);
        let filter = QueryFilter::default().groups(CollisionGroup::query(groups));
        let mut hits = Vec::new();

        self.query_pipeline.intersections_with_ray(
            &self.rigid_body_set,
            &self.collider_set,
            &ray,
            max_distance,
            true,
            filter,
            |collider, intersection: RayIntersection| {
                hits.push(to_hit(&ray, collider, intersection));
                true // Continue searching
            },
        );

        // Sort by distance (use unwrap_or to avoid panic on NaN)
        hits.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(std::cmp::Ordering::Equal));
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::Transform;

    fn world_with_boat_and_island() -> (PhysicsWorld, ColliderHandle, ColliderHandle) {
        let mut world = PhysicsWorld::new();
        let island = world.add_island_collider(Vec3::ZERO, 30.0, 3.0);
        let boat = world.add_boat_collider(Vec3::new(32.0, 2.0, 0.0), 0.0, Vec3::new(1.5, 0.5, 3.0));
        world.update_query_pipeline();
        (world, island, boat)
    }

    #[test]
    fn ray_hits_boat_hull_at_expected_distance() {
        let (world, _, boat) = world_with_boat_and_island();
        let hit = world
            .raycast(Vec3::new(40.0, 2.0, 0.0), -Vec3::X, 100.0, &[CollisionGroup::Boat])
            .expect("ray should hit the hull");
        assert_eq!(hit.collider, boat);
        assert!((hit.distance - 6.5).abs() < 1e-3);
        assert!((hit.point.x - 33.5).abs() < 1e-3);
    }

    #[test]
    fn island_in_front_blocks_the_pick() {
        let (world, island, boat) = world_with_boat_and_island();
        // From the far side of the island, looking through it at the boat.
        let origin = Vec3::new(-40.0, 2.0, 0.0);
        let first = world
            .raycast(origin, Vec3::X, 200.0, &[CollisionGroup::Island, CollisionGroup::Boat])
            .unwrap();
        assert_eq!(first.collider, island);

        let all = world.raycast_all(origin, Vec3::X, 200.0, &[CollisionGroup::Island, CollisionGroup::Boat]);
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].collider, boat);
        assert!(all[0].distance < all[1].distance);
    }

    #[test]
    fn moved_collider_is_found_at_new_pose() {
        let (mut world, _, boat) = world_with_boat_and_island();
        world.set_collider_transform(boat, &Transform::from_position(Vec3::new(100.0, 2.0, 50.0)));
        world.update_query_pipeline();
        assert!(world
            .raycast(Vec3::new(40.0, 2.0, 0.0), -Vec3::X, 100.0, &[CollisionGroup::Boat])
            .is_none());
        let hit = world.raycast(Vec3::new(100.0, 20.0, 50.0), -Vec3::Y, 100.0, &[CollisionGroup::Boat]);
        assert!(hit.is_some());
        let pose = world.collider_transform(boat).unwrap();
        assert!(pose.position.distance(Vec3::new(100.0, 2.0, 50.0)) < 1e-4);

        world.remove_collider(boat);
        assert_eq!(world.collider_count(), 1);
    }
}
