//! Boats: boarding, piloting, wave bobbing and arrival at islands.
//!
//! One [`BoatController`] owns every boat. Each tick it takes a [`BoatInput`]
//! snapshot and the shared camera, moves whichever boat is piloted, and
//! reports what happened as [`BoatEvent`]s. Sound, scene nodes and messages
//! are the session's business.

use crate::camera::Camera;
use crate::messages::InteractPrompt;
use crate::player::EYE_HEIGHT;
use engine_core::{Quat, Transform, Vec3};
use input::MovementIntent;
use procgen::{find_nearest_island, Island};
use serde::{Deserialize, Serialize};

/// Hull half extents (width, height, length) used for pointer picks.
pub const HULL_HALF_EXTENTS: Vec3 = Vec3::new(1.5, 0.5, 3.0);

/// Height of a moored boat's origin above sea level.
const MOORING_HEIGHT: f32 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoatState {
    Idle,
    Boardable,
    Piloting,
}

/// How a piloted boat moves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoatMode {
    /// Steered with the movement keys; arrives when it reaches another island.
    FreeDrive,
    /// Carried from `start` to `end` over `duration_ms`, then put ashore.
    ScriptedJourney { start: Vec3, end: Vec3, duration_ms: f32 },
}

/// What the player does to get on board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoardTrigger {
    /// Interact key while in range.
    Interact,
    /// Click on the boat (or anywhere, when close enough).
    Pointer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CameraFollow {
    /// Offsets turn with the boat.
    OrientationAware,
    /// Offsets stay fixed in world space.
    FixedWorld,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoatConfig {
    pub mode: BoatMode,
    pub board_trigger: BoardTrigger,
    pub camera_follow: CameraFollow,
    pub interaction_distance: f32,
    /// Horizontal distance to an island centre that counts as arrival.
    pub collision_threshold: f32,
    /// Units per tick.
    pub speed: f32,
    /// Radians per tick.
    pub rotation_speed: f32,
    pub waves_intensity: f32,
    pub wave_frequency: f32,
    /// Board/exit requests are dropped for this long after a transition.
    pub transition_ms: f32,
    /// Bob unpiloted boats on the session clock.
    pub idle_bobbing: bool,
    pub camera_offset: Vec3,
    pub look_offset: Vec3,
    pub camera_lerp: f32,
    /// Where the rider lands relative to the boat on an explicit exit.
    pub exit_offset: Vec3,
}

impl Default for BoatConfig {
    fn default() -> Self {
        Self {
            mode: BoatMode::FreeDrive,
            board_trigger: BoardTrigger::Interact,
            camera_follow: CameraFollow::OrientationAware,
            interaction_distance: 10.0,
            collision_threshold: 35.0,
            speed: 0.3,
            rotation_speed: 0.02,
            waves_intensity: 0.2,
            wave_frequency: 2.0,
            transition_ms: 250.0,
            idle_bobbing: true,
            camera_offset: Vec3::new(0.0, 4.0, -8.0),
            look_offset: Vec3::new(0.0, 2.0, 4.0),
            camera_lerp: 0.1,
            exit_offset: Vec3::new(0.0, 0.0, 5.0),
        }
    }
}

impl BoatConfig {
    /// Journey between the home mooring and a point out at sea.
    pub fn scripted_journey() -> Self {
        Self {
            mode: BoatMode::ScriptedJourney {
                start: Vec3::new(32.0, 0.0, 0.0),
                end: Vec3::new(200.0, 0.0, 0.0),
                duration_ms: 20_000.0,
            },
            board_trigger: BoardTrigger::Pointer,
            camera_follow: CameraFollow::FixedWorld,
            ..Default::default()
        }
    }
}

/// Vertical wave offset at clock `t_ms`.
#[inline]
pub fn wave_offset(t_ms: f32, frequency: f32, intensity: f32) -> f32 {
    (t_ms * 0.002 * frequency).sin() * intensity
}

#[derive(Debug, Clone, PartialEq)]
pub struct Boat {
    /// Rendered position: `rest` plus the wave offset.
    pub position: Vec3,
    /// Position on calm water. Steering moves this.
    pub rest: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
    pub state: BoatState,
    pub home_island: usize,
    /// Island the boat is leaving, ignored for arrival until cleared.
    departure: Option<usize>,
}

impl Boat {
    pub fn new(rest: Vec3, yaw: f32, home_island: usize) -> Self {
        Self {
            position: rest,
            rest,
            yaw,
            pitch: 0.0,
            roll: 0.0,
            state: BoatState::Idle,
            home_island,
            departure: None,
        }
    }

    /// Unit heading; +Z at yaw 0.
    pub fn forward(&self) -> Vec3 {
        Vec3::new(self.yaw.sin(), 0.0, self.yaw.cos())
    }

    pub fn transform(&self) -> Transform {
        Transform::from_position_euler(self.position, self.yaw, self.pitch, self.roll)
    }

    pub fn departure(&self) -> Option<usize> {
        self.departure
    }

    fn bob(&mut self, t_ms: f32, config: &BoatConfig) {
        let wave = wave_offset(t_ms, config.wave_frequency, config.waves_intensity);
        self.position = self.rest + Vec3::Y * wave;
        self.pitch = wave * 0.2;
        self.roll = (t_ms * 0.001).sin() * 0.1;
    }

    fn settle(&mut self) {
        self.position = self.rest;
        self.pitch = 0.0;
        self.roll = 0.0;
    }
}

/// One boat moored just off the shore of each island, on its +X side.
pub fn moored_boats(islands: &[Island]) -> Vec<Boat> {
    islands
        .iter()
        .enumerate()
        .map(|(i, island)| {
            let rest = island.position + Vec3::new(island.radius + 2.0, MOORING_HEIGHT, 0.0);
            Boat::new(rest, 0.0, i)
        })
        .collect()
}

/// A pointer ray that hit a boat hull.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerPick {
    pub boat: usize,
    pub distance: f32,
}

/// Everything the controller reads in one tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoatInput {
    /// Session clock, used for idle bobbing.
    pub elapsed_ms: f32,
    pub delta_ms: f32,
    pub intent: MovementIntent,
    pub interact_pressed: bool,
    pub click_pressed: bool,
    /// Boat hit by this tick's click ray, if any.
    pub pick: Option<PointerPick>,
    pub controls_locked: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BoatEvent {
    Boarded { boat: usize },
    Exited { boat: usize },
    Arrived { boat: usize, island: usize },
    JourneyComplete { boat: usize },
    PromptChanged(Option<String>),
}

pub struct BoatController {
    config: BoatConfig,
    boats: Vec<Boat>,
    piloted: Option<usize>,
    /// Nearest boardable boat.
    target: Option<usize>,
    /// Milliseconds since boarding.
    journey_ms: f32,
    transition_remaining_ms: f32,
    prompt: Option<String>,
}

impl BoatController {
    pub fn new(config: BoatConfig, boats: Vec<Boat>) -> Self {
        log::info!("Boat controller ready with {} boats ({:?})", boats.len(), config.mode);
        Self {
            config,
            boats,
            piloted: None,
            target: None,
            journey_ms: 0.0,
            transition_remaining_ms: 0.0,
            prompt: None,
        }
    }

    pub fn boats(&self) -> &[Boat] {
        &self.boats
    }

    pub fn config(&self) -> &BoatConfig {
        &self.config
    }

    pub fn piloted(&self) -> Option<usize> {
        self.piloted
    }

    pub fn is_piloting(&self) -> bool {
        self.piloted.is_some()
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition_remaining_ms > 0.0
    }

    pub fn prompt(&self) -> Option<&str> {
        self.prompt.as_deref()
    }

    pub fn journey_ms(&self) -> f32 {
        self.journey_ms
    }

    /// Journey completion in `[0, 1]`; always 0 in free drive.
    pub fn journey_progress(&self) -> f32 {
        match self.config.mode {
            BoatMode::ScriptedJourney { duration_ms, .. } if duration_ms > 0.0 => {
                (self.journey_ms / duration_ms).min(1.0)
            }
            BoatMode::ScriptedJourney { .. } => 1.0,
            BoatMode::FreeDrive => 0.0,
        }
    }

    /// Pose of the figure sitting in the piloted boat.
    pub fn rider_pose(&self) -> Option<Transform> {
        let boat = &self.boats[self.piloted?];
        let t = self.journey_ms;
        let seat = Quat::from_rotation_y(boat.yaw) * Vec3::new(0.0, 2.5, 0.5);
        let pitch = (t * 0.001).sin() * 0.03;
        let roll = (t * 0.002).sin() * 0.05;
        Some(Transform::from_position_euler(boat.position + seat, boat.yaw, pitch, roll).with_scale(0.8))
    }

    /// Advance one tick.
    pub fn update(&mut self, input: &BoatInput, islands: &[Island], camera: &mut Camera) -> Vec<BoatEvent> {
        let mut events = Vec::new();
        self.transition_remaining_ms = (self.transition_remaining_ms - input.delta_ms).max(0.0);

        for (i, boat) in self.boats.iter_mut().enumerate() {
            if Some(i) == self.piloted {
                continue;
            }
            if self.config.idle_bobbing {
                boat.bob(input.elapsed_ms, &self.config);
            } else {
                boat.settle();
            }
        }

        match self.piloted {
            Some(index) => {
                if input.interact_pressed {
                    if self.is_transitioning() {
                        log::debug!("Exit request dropped during transition");
                    } else {
                        log::info!("Left boat {}", index);
                        self.step_off(index, camera);
                        self.exit(index, &mut events);
                    }
                }
                if self.piloted.is_some() {
                    self.pilot(index, input, islands, camera, &mut events);
                }
            }
            None => {
                self.update_proximity(input, camera);
                if let Some(index) = self.board_request(input) {
                    if self.is_transitioning() {
                        log::debug!("Board request dropped during transition");
                    } else {
                        self.board(index, islands, &mut events);
                    }
                }
            }
        }

        if self.piloted.is_some() {
            self.target = None;
        }
        let prompt = self.current_prompt();
        if prompt != self.prompt {
            self.prompt = prompt.clone();
            events.push(BoatEvent::PromptChanged(prompt));
        }
        events
    }

    fn update_proximity(&mut self, input: &BoatInput, camera: &Camera) {
        let player = camera.position();
        let mut nearest: Option<(usize, f32)> = None;
        for (i, boat) in self.boats.iter_mut().enumerate() {
            let distance = player.distance(boat.position);
            if input.controls_locked && distance <= self.config.interaction_distance {
                boat.state = BoatState::Boardable;
                if nearest.map_or(true, |(_, d)| distance < d) {
                    nearest = Some((i, distance));
                }
            } else {
                boat.state = BoatState::Idle;
            }
        }
        self.target = nearest.map(|(i, _)| i);
    }

    /// Which boat this tick's input asks to board, if any.
    fn board_request(&self, input: &BoatInput) -> Option<usize> {
        if !input.controls_locked {
            return None;
        }
        match self.config.board_trigger {
            BoardTrigger::Interact => input.interact_pressed.then_some(self.target).flatten(),
            BoardTrigger::Pointer => {
                if !input.click_pressed {
                    return None;
                }
                match input.pick {
                    Some(pick) if pick.distance <= self.config.interaction_distance => Some(pick.boat),
                    Some(pick) => {
                        log::debug!("Boat {} too far to board ({:.1})", pick.boat, pick.distance);
                        None
                    }
                    // No hull under the cursor: being close enough still counts.
                    None => self.target,
                }
            }
        }
    }

    fn board(&mut self, index: usize, islands: &[Island], events: &mut Vec<BoatEvent>) {
        let threshold = self.config.collision_threshold;
        if index >= self.boats.len() {
            return;
        }
        // Proximity is not tracked while sailing.
        for other in &mut self.boats {
            other.state = BoatState::Idle;
        }
        let boat = &mut self.boats[index];
        boat.state = BoatState::Piloting;
        boat.departure = find_nearest_island(islands, boat.rest)
            .filter(|(_, island)| island.horizontal_distance(boat.rest) < threshold)
            .map(|(i, _)| i);

        self.piloted = Some(index);
        self.journey_ms = 0.0;
        self.transition_remaining_ms = self.config.transition_ms;
        log::info!("Boarded boat {}", index);
        events.push(BoatEvent::Boarded { boat: index });
    }

    /// Release the boat. The caller has already placed the rider.
    fn exit(&mut self, index: usize, events: &mut Vec<BoatEvent>) {
        let boat = &mut self.boats[index];
        boat.state = BoatState::Idle;
        boat.departure = None;
        self.piloted = None;
        self.transition_remaining_ms = self.config.transition_ms;
        events.push(BoatEvent::Exited { boat: index });
    }

    /// Set the rider down next to the boat, looking straight ahead.
    fn step_off(&self, index: usize, camera: &mut Camera) {
        let mut landing = self.boats[index].rest + self.config.exit_offset;
        landing.y = EYE_HEIGHT;
        camera.set_position(landing);
        camera.set_yaw_pitch(0.0, 0.0);
    }

    /// Stand the rider on `island`'s shore on the side facing the boat.
    fn put_ashore(&self, index: usize, island: &Island, camera: &mut Camera) {
        let boat = &self.boats[index];
        let toward_boat = Vec3::new(
            boat.rest.x - island.position.x,
            0.0,
            boat.rest.z - island.position.z,
        )
        .normalize_or(Vec3::X);
        let mut landing = island.position + toward_boat * (island.radius - 2.0).max(0.0);
        landing.y = EYE_HEIGHT;
        camera.set_position(landing);
        camera.look_at(Vec3::new(boat.position.x, EYE_HEIGHT, boat.position.z));
    }

    fn pilot(
        &mut self,
        index: usize,
        input: &BoatInput,
        islands: &[Island],
        camera: &mut Camera,
        events: &mut Vec<BoatEvent>,
    ) {
        self.journey_ms += input.delta_ms;
        let t = self.journey_ms;
        let config = self.config.clone();
        let boat = &mut self.boats[index];

        let mut journey_done = false;
        match config.mode {
            BoatMode::FreeDrive => {
                let intent = input.intent;
                if intent.left {
                    boat.yaw += config.rotation_speed;
                }
                if intent.right {
                    boat.yaw -= config.rotation_speed;
                }
                let forward = boat.forward();
                if intent.forward {
                    boat.rest += forward * config.speed;
                }
                if intent.backward {
                    boat.rest -= forward * config.speed * 0.5;
                }
            }
            BoatMode::ScriptedJourney { start, end, duration_ms } => {
                let progress = if duration_ms > 0.0 { (t / duration_ms).min(1.0) } else { 1.0 };
                boat.rest = start.lerp(end, progress);
                boat.yaw = (end.x - start.x).atan2(end.z - start.z);
                journey_done = progress >= 1.0;
            }
        }
        boat.bob(t, &config);

        if journey_done {
            log::info!("Journey complete");
            events.push(BoatEvent::JourneyComplete { boat: index });
            self.step_off(index, camera);
            self.exit(index, events);
            return;
        }

        if matches!(config.mode, BoatMode::FreeDrive) {
            if let Some(departure) = boat.departure {
                let gone = islands
                    .get(departure)
                    .map_or(true, |island| island.horizontal_distance(boat.rest) >= config.collision_threshold);
                if gone {
                    boat.departure = None;
                }
            }
            let arrived = islands.iter().enumerate().find(|(i, island)| {
                Some(*i) != boat.departure && island.horizontal_distance(boat.rest) < config.collision_threshold
            });
            if let Some((island_index, island)) = arrived {
                log::info!("Boat {} arrived at island {}", index, island_index);
                events.push(BoatEvent::Arrived { boat: index, island: island_index });
                self.put_ashore(index, island, camera);
                self.exit(index, events);
                return;
            }
        }

        self.follow(index, camera);
    }

    fn follow(&self, index: usize, camera: &mut Camera) {
        let boat = &self.boats[index];
        let config = &self.config;
        let turn = match config.camera_follow {
            CameraFollow::OrientationAware => Quat::from_rotation_y(boat.yaw),
            CameraFollow::FixedWorld => Quat::IDENTITY,
        };
        let wave = wave_offset(self.journey_ms, config.wave_frequency, config.waves_intensity);
        let target = boat.position + turn * config.camera_offset + Vec3::Y * wave;
        camera.lerp_toward(target, config.camera_lerp);
        camera.look_at(boat.position + turn * config.look_offset);
    }

    fn current_prompt(&self) -> Option<String> {
        if self.piloted.is_some() {
            return Some(InteractPrompt::new("E", "Leave boat").display_text());
        }
        self.target?;
        let key = match self.config.board_trigger {
            BoardTrigger::Interact => "E",
            BoardTrigger::Pointer => "Click",
        };
        Some(InteractPrompt::new(key, "Board boat").display_text())
    }
}
