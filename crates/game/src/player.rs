//! On-foot movement: walking, jumping and staying out of the sea.

use crate::camera::Camera;
use engine_core::Vec3;
use input::MovementIntent;
use procgen::{find_nearest_island, Island};

/// Eye height above sea level while standing on an island.
pub const EYE_HEIGHT: f32 = 7.0;

/// Movement constants, in world units per tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerSettings {
    pub walk_speed: f32,
    pub run_speed: f32,
    pub jump_impulse: f32,
    pub gravity: f32,
    pub eye_height: f32,
    /// How far the player is shoved back when stepping off the island.
    pub water_pushback: f32,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            walk_speed: 0.15,
            run_speed: 0.3,
            jump_impulse: 0.4,
            gravity: 0.015,
            eye_height: EYE_HEIGHT,
            water_pushback: 2.0,
        }
    }
}

/// What happened during an on-foot tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FootStep {
    pub landed: bool,
    /// The player tried to walk into the sea and was pushed back.
    pub pushed_back: bool,
}

/// Kinematic first-person controller. The camera is the player's body.
#[derive(Debug, Clone)]
pub struct PlayerController {
    pub velocity: Vec3,
    pub on_ground: bool,
    pub settings: PlayerSettings,
}

impl Default for PlayerController {
    fn default() -> Self {
        Self::new(PlayerSettings::default())
    }
}

impl PlayerController {
    pub fn new(settings: PlayerSettings) -> Self {
        Self {
            velocity: Vec3::ZERO,
            on_ground: false,
            settings,
        }
    }

    /// Clear vertical motion, e.g. after being set down from a boat.
    pub fn land(&mut self) {
        self.velocity = Vec3::ZERO;
        self.on_ground = true;
    }

    /// Advance one tick.
    pub fn update(
        &mut self,
        camera: &mut Camera,
        intent: MovementIntent,
        jump: bool,
        islands: &[Island],
    ) -> FootStep {
        let mut step = FootStep::default();
        let s = self.settings;

        if jump && self.on_ground {
            self.velocity.y = s.jump_impulse;
            self.on_ground = false;
        }

        // Vertical
        self.velocity.y -= s.gravity;
        let mut position = camera.position();
        position.y += self.velocity.y;

        // Ground clamp, with the sea off limits
        if position.y < s.eye_height {
            if let Some((_, island)) = find_nearest_island(islands, position) {
                if !island.contains(position) {
                    let dir = Vec3::new(
                        position.x - island.position.x,
                        0.0,
                        position.z - island.position.z,
                    )
                    .normalize_or_zero();
                    position -= dir * s.water_pushback;
                    step.pushed_back = true;
                    log::debug!("Pushed back from the water toward island {}", island.team);
                }
            }
            position.y = s.eye_height;
            self.velocity.y = 0.0;
            step.landed = !self.on_ground;
            self.on_ground = true;
        }

        // Horizontal
        let speed = if intent.run { s.run_speed } else { s.walk_speed };
        let axis = intent.axis();
        let (forward, right) = camera.flat_axes();
        let direction = (forward * axis.y + right * axis.x).normalize_or_zero();
        position += direction * speed;

        camera.set_position(position);
        step
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use procgen::{layout_islands, IslandLayout};

    fn home() -> Vec<Island> {
        layout_islands(
            &IslandLayout {
                player_count: 1,
                ..Default::default()
            },
            0,
        )
    }

    fn grounded_at(position: Vec3) -> (PlayerController, Camera) {
        let mut player = PlayerController::default();
        player.land();
        (player, Camera::new(position))
    }

    #[test]
    fn walks_forward_along_flattened_view() {
        let islands = home();
        let (mut player, mut camera) = grounded_at(Vec3::new(0.0, EYE_HEIGHT, 0.0));
        camera.set_yaw_pitch(0.0, -0.5);
        player.update(&mut camera, MovementIntent::forward(), false, &islands);
        assert!(camera.position().distance(Vec3::new(0.0, EYE_HEIGHT, -0.15)) < 1e-5);

        let run = MovementIntent {
            run: true,
            ..MovementIntent::forward()
        };
        player.update(&mut camera, run, false, &islands);
        assert!((camera.position().z + 0.45).abs() < 1e-5);
    }

    #[test]
    fn jump_rises_then_lands() {
        let islands = home();
        let (mut player, mut camera) = grounded_at(Vec3::new(0.0, EYE_HEIGHT, 0.0));
        player.update(&mut camera, MovementIntent::default(), true, &islands);
        assert!((camera.position().y - (EYE_HEIGHT + 0.4 - 0.015)).abs() < 1e-5);
        assert!(!player.on_ground);

        // Jumping mid-air does nothing.
        player.update(&mut camera, MovementIntent::default(), true, &islands);
        assert!(player.velocity.y < 0.4 - 0.015);

        let mut landed = false;
        for _ in 0..120 {
            landed |= player
                .update(&mut camera, MovementIntent::default(), false, &islands)
                .landed;
        }
        assert!(landed);
        assert!(player.on_ground);
        assert_eq!(camera.position().y, EYE_HEIGHT);
    }

    #[test]
    fn sea_pushes_player_back_toward_island() {
        let islands = home();
        let (mut player, mut camera) = grounded_at(Vec3::new(31.0, EYE_HEIGHT, 0.0));
        let step = player.update(&mut camera, MovementIntent::default(), false, &islands);
        assert!(step.pushed_back);
        assert!((camera.position().x - 29.0).abs() < 1e-5);

        let step = player.update(&mut camera, MovementIntent::default(), false, &islands);
        assert!(!step.pushed_back);
    }
}
