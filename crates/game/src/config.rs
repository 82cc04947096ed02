//! Game configuration (window, world, clouds, boats, audio). Loaded from config.ron at startup.

use crate::boat::{BoardTrigger, BoatConfig, BoatMode, CameraFollow};
use engine_core::{UVec3, Vec2, Vec3};
use procgen::{CloudConfig, IslandLayout};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Persistent game settings. Loaded from `config.ron` in the current directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Window width in logical pixels.
    #[serde(default = "default_window_width")]
    pub window_width: u32,
    /// Window height in logical pixels.
    #[serde(default = "default_window_height")]
    pub window_height: u32,
    /// Mouse sensitivity multiplier (1.0 = default).
    #[serde(default = "default_sensitivity")]
    pub sensitivity: f32,
    #[serde(default)]
    pub world: WorldSettings,
    #[serde(default)]
    pub clouds: CloudSettings,
    #[serde(default)]
    pub boat: BoatSettings,
    #[serde(default)]
    pub audio: AudioSettings,
}

fn default_window_width() -> u32 {
    1280
}
fn default_window_height() -> u32 {
    720
}
fn default_sensitivity() -> f32 {
    1.0
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            window_width: default_window_width(),
            window_height: default_window_height(),
            sensitivity: default_sensitivity(),
            world: WorldSettings::default(),
            clouds: CloudSettings::default(),
            boat: BoatSettings::default(),
            audio: AudioSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldSettings {
    pub seed: u64,
    pub player_count: u32,
    pub players_per_island: u32,
    pub island_spacing: f32,
    pub island_radius: f32,
}

impl Default for WorldSettings {
    fn default() -> Self {
        let layout = IslandLayout::default();
        Self {
            seed: 42,
            player_count: layout.player_count,
            players_per_island: layout.players_per_island,
            island_spacing: layout.spacing,
            island_radius: layout.radius,
        }
    }
}

impl WorldSettings {
    pub fn layout(&self) -> IslandLayout {
        IslandLayout {
            player_count: self.player_count,
            players_per_island: self.players_per_island,
            spacing: self.island_spacing,
            radius: self.island_radius,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudSettings {
    pub num_clouds: usize,
    pub min_height: f32,
    pub max_height: f32,
    pub noise_scale: f64,
    pub threshold: f64,
    pub size: [u32; 3],
    pub bounds: [f32; 2],
    pub drift_rate: f32,
    pub drift_speed: f32,
    pub refresh_interval_ms: Option<f32>,
}

impl Default for CloudSettings {
    fn default() -> Self {
        let scene = CloudConfig::scene(0);
        Self {
            num_clouds: scene.num_clouds,
            min_height: scene.min_height,
            max_height: scene.max_height,
            noise_scale: scene.noise_scale,
            threshold: scene.threshold,
            size: scene.size.to_array(),
            bounds: scene.bounds.to_array(),
            drift_rate: scene.drift_rate,
            drift_speed: scene.drift_speed,
            refresh_interval_ms: scene.refresh_interval_ms,
        }
    }
}

impl CloudSettings {
    pub fn to_config(&self, seed: u64) -> CloudConfig {
        CloudConfig {
            num_clouds: self.num_clouds,
            min_height: self.min_height,
            max_height: self.max_height,
            noise_scale: self.noise_scale,
            threshold: self.threshold,
            size: UVec3::from_array(self.size),
            bounds: Vec2::from_array(self.bounds),
            drift_rate: self.drift_rate,
            drift_speed: self.drift_speed,
            seed,
            refresh_interval_ms: self.refresh_interval_ms,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoatModeSetting {
    FreeDrive,
    ScriptedJourney,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoatSettings {
    pub mode: BoatModeSetting,
    pub board_trigger: BoardTrigger,
    pub camera_follow: CameraFollow,
    pub interaction_distance: f32,
    pub collision_threshold: f32,
    pub speed: f32,
    pub rotation_speed: f32,
    pub waves_intensity: f32,
    pub wave_frequency: f32,
    pub transition_ms: f32,
    pub idle_bobbing: bool,
    pub journey_start: [f32; 3],
    pub journey_end: [f32; 3],
    pub journey_duration_ms: f32,
}

impl Default for BoatSettings {
    fn default() -> Self {
        let boat = BoatConfig::default();
        Self {
            mode: BoatModeSetting::FreeDrive,
            board_trigger: boat.board_trigger,
            camera_follow: boat.camera_follow,
            interaction_distance: boat.interaction_distance,
            collision_threshold: boat.collision_threshold,
            speed: boat.speed,
            rotation_speed: boat.rotation_speed,
            waves_intensity: boat.waves_intensity,
            wave_frequency: boat.wave_frequency,
            transition_ms: boat.transition_ms,
            idle_bobbing: boat.idle_bobbing,
            journey_start: [32.0, 0.0, 0.0],
            journey_end: [200.0, 0.0, 0.0],
            journey_duration_ms: 20_000.0,
        }
    }
}

impl BoatSettings {
    pub fn to_config(&self) -> BoatConfig {
        let mode = match self.mode {
            BoatModeSetting::FreeDrive => BoatMode::FreeDrive,
            BoatModeSetting::ScriptedJourney => BoatMode::ScriptedJourney {
                start: Vec3::from_array(self.journey_start),
                end: Vec3::from_array(self.journey_end),
                duration_ms: self.journey_duration_ms,
            },
        };
        BoatConfig {
            mode,
            board_trigger: self.board_trigger,
            camera_follow: self.camera_follow,
            interaction_distance: self.interaction_distance,
            collision_threshold: self.collision_threshold,
            speed: self.speed,
            rotation_speed: self.rotation_speed,
            waves_intensity: self.waves_intensity,
            wave_frequency: self.wave_frequency,
            transition_ms: self.transition_ms,
            idle_bobbing: self.idle_bobbing,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    pub wave_sound_path: PathBuf,
    /// Linear volume, 0.0 to 1.0.
    pub wave_volume: f64,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            wave_sound_path: PathBuf::from("assets/sounds/waves.mp3"),
            wave_volume: 0.5,
        }
    }
}

impl GameConfig {
    /// Load config from `config.ron`. If the file is invalid, returns default config;
    /// if it is missing, also writes the defaults there for editing.
    pub fn load() -> Self {
        let path = config_path();
        if !path.exists() {
            let config = Self::default();
            config.save();
            log::info!("Wrote default config to {:?}", path);
            return config;
        }
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Self {
        if let Ok(data) = std::fs::read_to_string(path) {
            match ron::from_str::<GameConfig>(&data) {
                Ok(c) => return c.sanitized(),
                Err(e) => log::warn!("Invalid config at {:?}: {}, using defaults", path, e),
            }
        }
        Self::default()
    }

    /// Save current config to `config.ron`. Logs on error.
    pub fn save(&self) {
        self.save_to(&config_path());
    }

    pub fn save_to(&self, path: &Path) {
        if let Ok(s) = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default()) {
            if let Err(e) = std::fs::write(path, s) {
                log::warn!("Could not write config to {:?}: {}", path, e);
            }
        }
    }

    /// Clamp values that would break the simulation.
    fn sanitized(mut self) -> Self {
        if self.world.players_per_island == 0 {
            log::warn!("players_per_island must be at least 1, clamping");
            self.world.players_per_island = 1;
        }
        if self.clouds.min_height > self.clouds.max_height {
            log::warn!(
                "Cloud min_height {} above max_height {}, clamping",
                self.clouds.min_height,
                self.clouds.max_height
            );
            self.clouds.max_height = self.clouds.min_height;
        }
        if !(self.sensitivity > 0.0) {
            log::warn!("Sensitivity {} is not positive, using 1.0", self.sensitivity);
            self.sensitivity = default_sensitivity();
        }
        self.audio.wave_volume = self.audio.wave_volume.clamp(0.0, 1.0);
        self
    }
}

fn config_path() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")).join("config.ron")
}
