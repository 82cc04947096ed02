//! One play session: the world, its simulation state and the per-tick update.

use crate::boat::{moored_boats, BoatController, BoatEvent, BoatInput, BoatMode, PointerPick, HULL_HALF_EXTENTS};
use crate::camera::Camera;
use crate::config::GameConfig;
use crate::messages::GameMessages;
use crate::player::{PlayerController, PlayerSettings, EYE_HEIGHT};
use audio::{LoadState, PlaybackSettings, SoundBackend, SoundId};
use engine_core::{NodeId, Quat, SceneError, SceneGraph, SceneTree, Transform, Vec3};
use input::InputState;
use physics::{ColliderHandle, CollisionGroup, PhysicsWorld};
use procgen::{layout_islands, CloudField, Decoration, Island, ISLAND_TOP};
use std::collections::HashMap;

/// Where the player first stands: on the home island, facing its centre.
const SPAWN: Vec3 = Vec3::new(0.0, EYE_HEIGHT, 20.0);

/// Longest click ray, in world units.
const PICK_RANGE: f32 = 100.0;

struct SceneNodes {
    boats: Vec<NodeId>,
    rider: NodeId,
    sky: NodeId,
    clouds: Vec<NodeId>,
}

pub struct Session<S: SceneGraph = SceneTree> {
    config: GameConfig,
    clock_ms: f32,
    islands: Vec<Island>,
    clouds: CloudField,
    boats: BoatController,
    player: PlayerController,
    camera: Camera,
    messages: GameMessages,
    physics: PhysicsWorld,
    boat_colliders: Vec<ColliderHandle>,
    collider_boats: HashMap<ColliderHandle, usize>,
    scene: S,
    nodes: SceneNodes,
    audio: Box<dyn SoundBackend>,
    wave_sound: SoundId,
}

impl<S: SceneGraph> Session<S> {
    pub fn new(config: GameConfig, mut scene: S, mut audio: Box<dyn SoundBackend>) -> Self {
        let seed = config.world.seed;
        let islands = layout_islands(&config.world.layout(), seed);
        let clouds = CloudField::new(config.clouds.to_config(seed));
        let boats = BoatController::new(config.boat.to_config(), moored_boats(&islands));

        let mut physics = PhysicsWorld::new();
        for island in &islands {
            physics.add_island_collider(island.position, island.radius, ISLAND_TOP);
        }
        let mut boat_colliders = Vec::with_capacity(boats.boats().len());
        let mut collider_boats = HashMap::new();
        for (i, boat) in boats.boats().iter().enumerate() {
            let handle = physics.add_boat_collider(boat.position, boat.yaw, HULL_HALF_EXTENTS);
            boat_colliders.push(handle);
            collider_boats.insert(handle, i);
        }
        physics.update_query_pipeline();

        let nodes = match build_scene(&mut scene, &islands, &boats, &clouds) {
            Ok(nodes) => nodes,
            Err(e) => {
                log::warn!("Scene setup incomplete: {}", e);
                SceneNodes {
                    boats: Vec::new(),
                    rider: scene.create_node("rider"),
                    sky: scene.create_node("sky"),
                    clouds: Vec::new(),
                }
            }
        };

        let wave_sound = audio.load_sound("waves", &config.audio.wave_sound_path);

        let mut camera = Camera::new(SPAWN).with_sensitivity(config.sensitivity);
        camera.look_at(Vec3::new(0.0, EYE_HEIGHT, 0.0));
        let mut player = PlayerController::new(PlayerSettings::default());
        player.land();

        log::info!(
            "Session ready: {} islands, {} boats, {} clouds",
            islands.len(),
            boats.boats().len(),
            clouds.clouds().len()
        );

        let mut session = Self {
            config,
            clock_ms: 0.0,
            islands,
            clouds,
            boats,
            player,
            camera,
            messages: GameMessages::new(),
            physics,
            boat_colliders,
            collider_boats,
            scene,
            nodes,
            audio,
            wave_sound,
        };
        session.sync_scene();
        session
    }

    /// Run one fixed simulation step of `dt_ms` milliseconds.
    pub fn tick(&mut self, input: &InputState, dt_ms: f32) -> Vec<BoatEvent> {
        self.clock_ms += dt_ms;
        self.audio.poll();

        self.clouds.update(self.clock_ms);
        if self.clouds.maybe_refresh(self.clock_ms) {
            self.rebuild_clouds();
        }

        let was_piloting = self.boats.is_piloting();
        if !was_piloting && input.is_cursor_locked() {
            let delta = input.mouse_delta();
            self.camera.process_mouse(delta.x, delta.y);
        }

        let click = input.is_click_pressed();
        let boat_input = BoatInput {
            elapsed_ms: self.clock_ms,
            delta_ms: dt_ms,
            intent: input.movement_intent(),
            interact_pressed: input.is_interact_pressed(),
            click_pressed: click,
            pick: if click && !was_piloting { self.pick_boat() } else { None },
            controls_locked: input.is_cursor_locked(),
        };
        let events = self.boats.update(&boat_input, &self.islands, &mut self.camera);

        // Only one of boat or legs moves the viewpoint in a tick.
        if !was_piloting && !self.boats.is_piloting() {
            let step = self.player.update(
                &mut self.camera,
                boat_input.intent,
                input.is_jump_pressed(),
                &self.islands,
            );
            if step.pushed_back {
                self.messages.warning("You can't swim! Use a boat.");
            }
        }

        for event in &events {
            self.handle_event(event);
        }

        self.messages.update(dt_ms / 1000.0);
        self.sync_scene();
        events
    }

    fn handle_event(&mut self, event: &BoatEvent) {
        match event {
            BoatEvent::Boarded { .. } => {
                self.start_waves();
            }
            BoatEvent::Exited { .. } => {
                self.audio.stop(self.wave_sound);
                self.player.land();
            }
            BoatEvent::Arrived { island, .. } => {
                self.messages.info(format!("Arrived at island {}", island + 1));
            }
            BoatEvent::JourneyComplete { .. } => {
                self.messages.info("Journey complete");
            }
            BoatEvent::PromptChanged(_) => {}
        }
    }

    fn start_waves(&mut self) {
        match self.audio.load_state(self.wave_sound) {
            LoadState::Ready => {
                let settings = PlaybackSettings {
                    looped: true,
                    volume: self.config.audio.wave_volume,
                };
                if let Err(e) = self.audio.play(self.wave_sound, settings) {
                    log::warn!("Could not play wave sound: {}", e);
                }
            }
            state => log::warn!("Wave sound not available ({:?}), sailing without it", state),
        }
    }

    /// Cast the click ray from the eye; islands in front block it.
    fn pick_boat(&self) -> Option<PointerPick> {
        let hit = self.physics.raycast(
            self.camera.position(),
            self.camera.forward(),
            PICK_RANGE,
            &[CollisionGroup::Island, CollisionGroup::Boat],
        )?;
        let boat = *self.collider_boats.get(&hit.collider)?;
        Some(PointerPick {
            boat,
            distance: hit.distance,
        })
    }

    /// Push authoritative state into the scene graph and pick colliders.
    pub fn sync_scene(&mut self) {
        if let Err(e) = self.try_sync_scene() {
            log::warn!("Scene sync failed: {}", e);
        }
    }

    fn try_sync_scene(&mut self) -> Result<(), SceneError> {
        for ((boat, &node), &handle) in self
            .boats
            .boats()
            .iter()
            .zip(&self.nodes.boats)
            .zip(&self.boat_colliders)
        {
            let transform = boat.transform();
            self.physics.set_collider_transform(handle, &transform);
            self.scene.set_transform(node, transform)?;
        }
        self.physics.update_query_pipeline();

        match self.boats.rider_pose() {
            Some(pose) => {
                self.scene.set_transform(self.nodes.rider, pose)?;
                self.scene.set_visible(self.nodes.rider, true)?;
            }
            None => self.scene.set_visible(self.nodes.rider, false)?,
        }

        for (cloud, &node) in self.clouds.clouds().iter().zip(&self.nodes.clouds) {
            self.scene.set_transform(node, Transform::from_position(cloud.position))?;
        }
        Ok(())
    }

    fn rebuild_clouds(&mut self) {
        for node in self.nodes.clouds.drain(..) {
            if let Err(e) = self.scene.remove_node(node) {
                log::warn!("Could not remove cloud node: {}", e);
            }
        }
        match build_clouds(&mut self.scene, self.nodes.sky, &self.clouds) {
            Ok(nodes) => self.nodes.clouds = nodes,
            Err(e) => log::warn!("Could not rebuild clouds: {}", e),
        }
    }

    /// Text for the window title: the prompt, else the newest message.
    /// Scripted journeys also show how far along they are.
    pub fn status(&self) -> Option<String> {
        let status = self.boats.prompt().or_else(|| self.messages.latest())?;
        match self.boats.config().mode {
            BoatMode::ScriptedJourney { .. } if self.boats.is_piloting() => Some(format!(
                "{} ({:.0}%)",
                status,
                self.boats.journey_progress() * 100.0
            )),
            _ => Some(status.to_string()),
        }
    }

    pub fn clock_ms(&self) -> f32 {
        self.clock_ms
    }

    pub fn islands(&self) -> &[Island] {
        &self.islands
    }

    pub fn clouds(&self) -> &CloudField {
        &self.clouds
    }

    pub fn boats(&self) -> &BoatController {
        &self.boats
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn messages(&self) -> &GameMessages {
        &self.messages
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

}

fn attach<S: SceneGraph>(
    scene: &mut S,
    parent: NodeId,
    name: &str,
    transform: Transform,
) -> Result<NodeId, SceneError> {
    let node = scene.create_node(name);
    scene.set_transform(node, transform)?;
    scene.add_child(parent, node)?;
    Ok(node)
}

fn build_scene<S: SceneGraph>(
    scene: &mut S,
    islands: &[Island],
    boats: &BoatController,
    clouds: &CloudField,
) -> Result<SceneNodes, SceneError> {
    let root = scene.root();

    for (i, island) in islands.iter().enumerate() {
        let node = attach(scene, root, &format!("island-{}", i), Transform::from_position(island.position))?;
        attach(
            scene,
            node,
            "platform",
            Transform::from_position(Vec3::Y * ISLAND_TOP * 0.5),
        )?;
        for decoration in &island.decorations {
            match decoration {
                Decoration::Tree(tree) => {
                    let tree_node = attach(
                        scene,
                        node,
                        "tree",
                        Transform::from_position_rotation(tree.position, Quat::from_rotation_y(tree.yaw)),
                    )?;
                    for block in tree.trunk_blocks() {
                        attach(scene, tree_node, "trunk", Transform::from_position(block.as_vec3()))?;
                    }
                    for leaf in &tree.leaves {
                        attach(scene, tree_node, "leaves", Transform::from_position(leaf.as_vec3()))?;
                    }
                }
                Decoration::Rock(rock) => {
                    let r = rock.rotation;
                    attach(
                        scene,
                        node,
                        "rock",
                        Transform::from_position_euler(rock.position, r.y, r.x, r.z).with_scale(rock.radius),
                    )?;
                }
            }
        }
        let flag = &island.flag;
        let pole = attach(scene, node, "flag", Transform::from_position(flag.pole_base))?;
        attach(
            scene,
            pole,
            "banner",
            Transform::from_position_rotation(
                flag.banner_offset,
                Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
            ),
        )?;
    }

    let mut boat_nodes = Vec::with_capacity(boats.boats().len());
    for (i, boat) in boats.boats().iter().enumerate() {
        boat_nodes.push(attach(scene, root, &format!("boat-{}", i), boat.transform())?);
    }
    let rider = attach(scene, root, "rider", Transform::default())?;
    scene.set_visible(rider, false)?;

    let sky = attach(scene, root, "sky", Transform::default())?;
    let cloud_nodes = build_clouds(scene, sky, clouds)?;

    Ok(SceneNodes {
        boats: boat_nodes,
        rider,
        sky,
        clouds: cloud_nodes,
    })
}

/// One node per cloud with a child per filled voxel.
fn build_clouds<S: SceneGraph>(scene: &mut S, sky: NodeId, clouds: &CloudField) -> Result<Vec<NodeId>, SceneError> {
    let mut nodes = Vec::with_capacity(clouds.clouds().len());
    for (i, cloud) in clouds.clouds().iter().enumerate() {
        let node = attach(scene, sky, &format!("cloud-{}", i), Transform::from_position(cloud.position))?;
        for voxel in cloud.occupied_voxels() {
            attach(scene, node, "cloud-voxel", Transform::from_position(voxel.as_vec3()))?;
        }
        nodes.push(node);
    }
    Ok(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use input::{ElementState, KeyCode, MouseButton};
    use std::cell::RefCell;
    use std::path::Path;
    use std::rc::Rc;

    const TICK: f32 = 1000.0 / 60.0;

    /// Records playback calls. The load finishes after `ready_after` polls,
    /// or fails when that is `None`.
    #[derive(Default)]
    struct Recorded {
        ready_after: Option<u32>,
        polls: u32,
        played: Vec<(SoundId, PlaybackSettings)>,
        stopped: Vec<SoundId>,
    }

    struct RecordingAudio(Rc<RefCell<Recorded>>);

    impl SoundBackend for RecordingAudio {
        fn load_sound(&mut self, _name: &str, _path: &Path) -> SoundId {
            SoundId(0)
        }
        fn poll(&mut self) {
            self.0.borrow_mut().polls += 1;
        }
        fn load_state(&self, _id: SoundId) -> LoadState {
            let rec = self.0.borrow();
            match rec.ready_after {
                Some(n) if rec.polls >= n => LoadState::Ready,
                Some(_) => LoadState::Pending,
                None => LoadState::Failed,
            }
        }
        fn play(&mut self, id: SoundId, settings: PlaybackSettings) -> Result<()> {
            if self.load_state(id) != LoadState::Ready {
                return Err(anyhow!("not loaded"));
            }
            self.0.borrow_mut().played.push((id, settings));
            Ok(())
        }
        fn stop(&mut self, id: SoundId) {
            self.0.borrow_mut().stopped.push(id);
        }
        fn is_playing(&self, _id: SoundId) -> bool {
            !self.0.borrow().played.is_empty()
        }
    }

    fn session_with(config: GameConfig, ready_after: Option<u32>) -> (Session, Rc<RefCell<Recorded>>) {
        let recorded = Rc::new(RefCell::new(Recorded {
            ready_after,
            ..Default::default()
        }));
        let audio = Box::new(RecordingAudio(recorded.clone()));
        (Session::new(config, SceneTree::new(), audio), recorded)
    }

    fn session(ready_after: Option<u32>) -> (Session, Rc<RefCell<Recorded>>) {
        session_with(GameConfig::default(), ready_after)
    }

    fn locked_input() -> InputState {
        let mut input = InputState::new();
        input.set_cursor_locked(true);
        input
    }

    fn press(input: &mut InputState, key: KeyCode) {
        input.process_keyboard(key, ElementState::Pressed);
        input.process_keyboard(key, ElementState::Released);
    }

    /// Stand the player next to the home boat, at eye height.
    fn walk_to_home_boat(session: &mut Session) {
        let boat = session.boats().boats()[0].rest;
        session.camera_mut().set_position(Vec3::new(boat.x - 4.0, EYE_HEIGHT, boat.z));
    }

    #[test]
    fn builds_islands_boats_and_clouds() {
        let (session, _) = session(Some(1));
        assert_eq!(session.islands().len(), 2);
        assert_eq!(session.boats().boats().len(), 2);
        assert_eq!(session.clouds().clouds().len(), 15);
        // Two islands, two boats, the rider and the sky.
        let root_children = session.scene().children(session.scene().root());
        assert_eq!(root_children.len(), 6);
        assert!(!session.scene().is_visible(session.nodes.rider));
        let sky = session.scene().children(session.nodes.sky);
        assert_eq!(sky.len(), 15);
        assert_eq!(session.camera().position(), SPAWN);
    }

    #[test]
    fn boarding_plays_waves_and_exit_stops_them() {
        let (mut session, recorded) = session(Some(1));
        walk_to_home_boat(&mut session);

        let mut input = locked_input();
        press(&mut input, KeyCode::KeyE);
        let events = session.tick(&input, TICK);
        input.end_tick();
        assert!(events.contains(&BoatEvent::Boarded { boat: 0 }));
        assert_eq!(recorded.borrow().played.len(), 1);
        assert!(recorded.borrow().played[0].1.looped);
        assert_eq!(recorded.borrow().played[0].1.volume, 0.5);
        assert_eq!(session.status().as_deref(), Some("[E] Leave boat"));

        for _ in 0..30 {
            session.tick(&input, TICK);
        }
        press(&mut input, KeyCode::KeyE);
        let events = session.tick(&input, TICK);
        assert!(events.contains(&BoatEvent::Exited { boat: 0 }));
        assert_eq!(recorded.borrow().stopped, vec![session.wave_sound]);
    }

    #[test]
    fn missing_audio_still_boards() {
        let (mut session, recorded) = session(None);
        walk_to_home_boat(&mut session);
        let mut input = locked_input();
        press(&mut input, KeyCode::KeyE);
        let events = session.tick(&input, TICK);
        assert!(events.contains(&BoatEvent::Boarded { boat: 0 }));
        assert!(session.boats().is_piloting());
        assert!(recorded.borrow().played.is_empty());
    }

    #[test]
    fn boarding_before_the_sound_loads_sails_silently() {
        let (mut session, recorded) = session(Some(10));
        walk_to_home_boat(&mut session);
        let mut input = locked_input();
        press(&mut input, KeyCode::KeyE);
        let events = session.tick(&input, TICK);
        input.end_tick();
        assert!(events.contains(&BoatEvent::Boarded { boat: 0 }));
        assert!(session.boats().is_piloting());
        assert!(recorded.borrow().played.is_empty());

        // Still silent once the load lands mid-trip.
        for _ in 0..20 {
            session.tick(&input, TICK);
        }
        assert!(recorded.borrow().polls >= 10);
        assert!(recorded.borrow().played.is_empty());

        // The next boarding gets the loop.
        press(&mut input, KeyCode::KeyE);
        let events = session.tick(&input, TICK);
        input.end_tick();
        assert!(events.contains(&BoatEvent::Exited { boat: 0 }));
        walk_to_home_boat(&mut session);
        for _ in 0..20 {
            session.tick(&input, TICK);
        }
        press(&mut input, KeyCode::KeyE);
        let events = session.tick(&input, TICK);
        assert!(events.contains(&BoatEvent::Boarded { boat: 0 }));
        assert_eq!(recorded.borrow().played.len(), 1);
    }

    #[test]
    fn scripted_journey_status_shows_progress() {
        let mut config = GameConfig::default();
        config.boat.mode = crate::config::BoatModeSetting::ScriptedJourney;
        let (mut session, _) = session_with(config, Some(1));
        walk_to_home_boat(&mut session);

        let mut input = locked_input();
        press(&mut input, KeyCode::KeyE);
        session.tick(&input, TICK);
        input.end_tick();
        assert_eq!(session.status().as_deref(), Some("[E] Leave boat (0%)"));

        for _ in 0..60 {
            session.tick(&input, TICK);
        }
        assert_eq!(session.status().as_deref(), Some("[E] Leave boat (5%)"));
    }

    #[test]
    fn on_foot_movement_pauses_while_piloting() {
        let (mut session, _) = session(Some(1));
        walk_to_home_boat(&mut session);
        let mut input = locked_input();
        press(&mut input, KeyCode::KeyE);
        session.tick(&input, TICK);
        input.end_tick();

        // Jump would lift the on-foot player; on board it must not.
        press(&mut input, KeyCode::Space);
        let before = session.camera().position();
        session.tick(&input, TICK);
        let boat = session.boats().boats()[0].position;
        let after = session.camera().position();
        // The follow camera only closes in on its target behind the boat.
        let target = boat + Vec3::new(0.0, 4.0, -8.0);
        assert!(after.distance(target) < before.distance(target) + 1e-4);
    }

    #[test]
    fn scene_tracks_boat_and_rider() {
        let (mut session, _) = session(Some(1));
        walk_to_home_boat(&mut session);
        let rider = session.nodes.rider;
        assert!(!session.scene().is_visible(rider));

        let mut input = locked_input();
        press(&mut input, KeyCode::KeyE);
        session.tick(&input, TICK);
        input.end_tick();
        input.process_keyboard(KeyCode::KeyW, ElementState::Pressed);
        for _ in 0..20 {
            session.tick(&input, TICK);
            input.end_tick();
        }

        assert!(session.scene().is_visible(rider));
        let boat = &session.boats().boats()[0];
        let node = session.nodes.boats[0];
        let placed = session.scene().transform(node).unwrap();
        assert!(placed.position.distance(boat.position) < 1e-5);

        // The pick collider moved with the hull.
        let collider = session.physics.collider_transform(session.boat_colliders[0]).unwrap();
        assert!(collider.position.distance(boat.position) < 1e-4);
    }

    #[test]
    fn click_on_hull_boards_in_pointer_mode() {
        let mut config = GameConfig::default();
        config.boat.board_trigger = crate::boat::BoardTrigger::Pointer;
        let audio = Box::new(RecordingAudio(Rc::new(RefCell::new(Recorded::default()))));
        let mut session = Session::new(config, SceneTree::new(), audio);

        let boat = session.boats().boats()[0].position;
        // Seaward side, so the island does not block the ray.
        let eye = Vec3::new(boat.x + 6.0, EYE_HEIGHT, boat.z);
        session.camera_mut().set_position(eye);
        session.camera_mut().look_at(boat);

        let mut input = locked_input();
        input.process_mouse_button(MouseButton::Left, ElementState::Pressed);
        let pick = session.pick_boat().expect("hull under the cursor");
        assert_eq!(pick.boat, 0);
        assert!(pick.distance < 10.0);

        let events = session.tick(&input, TICK);
        assert!(events.contains(&BoatEvent::Boarded { boat: 0 }));
    }

    #[test]
    fn cloud_refresh_replaces_sky_nodes() {
        let mut config = GameConfig::default();
        config.clouds.refresh_interval_ms = Some(50.0);
        let audio = Box::new(RecordingAudio(Rc::new(RefCell::new(Recorded::default()))));
        let mut session = Session::new(config, SceneTree::new(), audio);
        let before = session.scene().children(session.nodes.sky);

        let input = InputState::new();
        for _ in 0..4 {
            session.tick(&input, TICK);
        }
        assert_eq!(session.clouds().generation(), 2);
        let after = session.scene().children(session.nodes.sky);
        assert_eq!(after.len(), 15);
        assert!(before.iter().all(|node| !session.scene().contains(*node)));

        let cloud = &session.clouds().clouds()[0];
        let placed = session.scene().transform(after[0]).unwrap();
        assert_eq!(placed.position, cloud.position);
    }

    #[test]
    fn walking_into_the_sea_posts_a_message() {
        let (mut session, _) = session(Some(1));
        session.camera_mut().set_position(Vec3::new(0.0, EYE_HEIGHT, 31.0));
        let input = locked_input();
        session.tick(&input, TICK);
        assert_eq!(session.messages().latest(), Some("You can't swim! Use a boat."));
        assert!(session.camera().position().z < 30.0);
    }
}
