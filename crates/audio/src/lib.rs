//! Audio playback using Kira.
//!
//! Sounds are decoded on a worker thread. Completion comes back over a
//! channel that [`SoundBackend::poll`] drains on the frame-loop thread, so
//! readiness is an explicit [`LoadState`] rather than a callback.

use anyhow::{anyhow, Result};
use kira::{
    manager::{backend::DefaultBackend, AudioManager, AudioManagerSettings},
    sound::static_sound::{StaticSoundData, StaticSoundHandle, StaticSoundSettings},
    tween::Tween,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};

/// Handle to a sound registered with a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SoundId(pub usize);

/// Where an asynchronous load currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Pending,
    Ready,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackSettings {
    pub looped: bool,
    /// Linear amplitude, 0.0 to 1.0.
    pub volume: f64,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            looped: false,
            volume: 1.0,
        }
    }
}

/// What the game needs from an audio device.
pub trait SoundBackend {
    /// Start loading a sound. Returns immediately; see [`SoundBackend::load_state`].
    fn load_sound(&mut self, name: &str, path: &Path) -> SoundId;
    /// Apply finished loads. Call once per tick.
    fn poll(&mut self);
    fn load_state(&self, id: SoundId) -> LoadState;
    /// Start playback. Errors when the sound is not ready or the device refuses.
    fn play(&mut self, id: SoundId, settings: PlaybackSettings) -> Result<()>;
    /// Stop every playing instance of the sound. No-op when nothing is playing.
    fn stop(&mut self, id: SoundId);
    fn is_playing(&self, id: SoundId) -> bool;
}

enum Slot {
    Pending,
    Ready(StaticSoundData),
    Failed,
}

type LoadResult = (SoundId, std::result::Result<StaticSoundData, String>);

/// Kira-backed audio device.
pub struct AudioSystem {
    manager: AudioManager,
    names: HashMap<String, SoundId>,
    slots: Vec<Slot>,
    active_sounds: HashMap<SoundId, Vec<StaticSoundHandle>>,
    loaded_tx: Sender<LoadResult>,
    loaded_rx: Receiver<LoadResult>,
}

impl AudioSystem {
    /// Open the default output device.
    pub fn new() -> Result<Self> {
        let manager = AudioManager::<DefaultBackend>::new(AudioManagerSettings::default())?;
        let (loaded_tx, loaded_rx) = mpsc::channel();
        Ok(Self {
            manager,
            names: HashMap::new(),
            slots: Vec::new(),
            active_sounds: HashMap::new(),
            loaded_tx,
            loaded_rx,
        })
    }

    /// Look up a sound registered under `name`.
    pub fn sound(&self, name: &str) -> Option<SoundId> {
        self.names.get(name).copied()
    }

    /// Drop handles of sounds that have finished playing.
    pub fn cleanup(&mut self) {
        for handles in self.active_sounds.values_mut() {
            handles.retain(|handle| handle.state() != kira::sound::PlaybackState::Stopped);
        }
        self.active_sounds.retain(|_, handles| !handles.is_empty());
    }

    /// Set master volume (0.0 to 1.0).
    pub fn set_master_volume(&mut self, volume: f64) {
        let _ = self.manager.main_track().set_volume(volume, Tween::default());
    }
}

impl SoundBackend for AudioSystem {
    fn load_sound(&mut self, name: &str, path: &Path) -> SoundId {
        if let Some(id) = self.sound(name) {
            return id;
        }
        let id = SoundId(self.slots.len());
        self.slots.push(Slot::Pending);
        self.names.insert(name.to_string(), id);

        let tx = self.loaded_tx.clone();
        let path = path.to_path_buf();
        std::thread::spawn(move || {
            let result = StaticSoundData::from_file(&path)
                .map_err(|e| format!("{}: {}", path.display(), e));
            // The receiver only disappears with the AudioSystem itself.
            let _ = tx.send((id, result));
        });
        id
    }

    fn poll(&mut self) {
        while let Ok((id, result)) = self.loaded_rx.try_recv() {
            let Some(slot) = self.slots.get_mut(id.0) else {
                continue;
            };
            *slot = match result {
                Ok(data) => {
                    log::info!("Sound {:?} loaded", id);
                    Slot::Ready(data)
                }
                Err(e) => {
                    log::error!("Failed to load sound: {}", e);
                    Slot::Failed
                }
            };
        }
        self.cleanup();
    }

    fn load_state(&self, id: SoundId) -> LoadState {
        match self.slots.get(id.0) {
            Some(Slot::Pending) => LoadState::Pending,
            Some(Slot::Ready(_)) => LoadState::Ready,
            Some(Slot::Failed) | None => LoadState::Failed,
        }
    }

    fn play(&mut self, id: SoundId, settings: PlaybackSettings) -> Result<()> {
        let Some(Slot::Ready(data)) = self.slots.get(id.0) else {
            return Err(anyhow!("sound {:?} is not loaded", id));
        };
        let mut sound_settings = StaticSoundSettings::new().volume(settings.volume);
        if settings.looped {
            sound_settings = sound_settings.loop_region(0.0..);
        }
        let handle = self.manager.play(data.clone().with_settings(sound_settings))?;
        self.active_sounds.entry(id).or_default().push(handle);
        Ok(())
    }

    fn stop(&mut self, id: SoundId) {
        if let Some(handles) = self.active_sounds.remove(&id) {
            for mut handle in handles {
                let _ = handle.stop(Tween::default());
            }
        }
    }

    fn is_playing(&self, id: SoundId) -> bool {
        self.active_sounds
            .get(&id)
            .is_some_and(|handles| !handles.is_empty())
    }
}

/// Stand-in used when no output device is available. Every load fails, so
/// callers take their "no sound" path.
#[derive(Debug, Default)]
pub struct SilentAudio {
    names: HashMap<String, SoundId>,
}

impl SilentAudio {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SoundBackend for SilentAudio {
    fn load_sound(&mut self, name: &str, path: &Path) -> SoundId {
        let next = SoundId(self.names.len());
        let id = *self.names.entry(name.to_string()).or_insert(next);
        log::warn!("No audio output; {} ({}) will not play", name, path.display());
        id
    }

    fn poll(&mut self) {}

    fn load_state(&self, _id: SoundId) -> LoadState {
        LoadState::Failed
    }

    fn play(&mut self, id: SoundId, _settings: PlaybackSettings) -> Result<()> {
        Err(anyhow!("no audio output for {:?}", id))
    }

    fn stop(&mut self, _id: SoundId) {}

    fn is_playing(&self, _id: SoundId) -> bool {
        false
    }
}

/// Open the real device, falling back to [`SilentAudio`] when there is none.
pub fn open_default() -> Box<dyn SoundBackend> {
    match AudioSystem::new() {
        Ok(system) => Box::new(system),
        Err(e) => {
            log::warn!("Audio unavailable ({}), continuing without sound", e);
            Box::new(SilentAudio::new())
        }
    }
}

// Re-export for convenience
pub use kira;
