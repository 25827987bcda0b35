// SoundManager: registry of named sounds, each driven by a PlaybackController
//
// Single Responsibility: sound lookup and routing of play/stop/output-device
// commands to the right controller

use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use futures::task::LocalSpawn;

use crate::config::AppConfig;
use crate::diagnostics::{self, DiagnosticSink};
use crate::playback::{AudioElement, ElementProps, MediaSource, PlaybackController};

struct SoundEntry {
    controller: PlaybackController,
    ready: Rc<Cell<bool>>,
}

/// Manages the sounds an application can play by id
///
/// This manager handles:
/// - Registering sounds with their props (source, loop flag)
/// - Mounting and unmounting the platform element behind each sound
/// - Tracking readiness through the controller's element-change hook
/// - Applying the selected output device to every sound, including sounds
///   mounted after the selection
///
/// Commands for unknown ids are logged and ignored. Commands for sounds
/// whose element is not mounted yet are silent no-ops.
///
/// # Example
/// ```ignore
/// let mut sounds = SoundManager::new(Rc::new(pool.spawner()));
/// sounds.register("RINGING", ElementProps::new("sounds/ring.wav").looping(true));
/// if let Some(props) = sounds.props("RINGING").cloned() {
///     sounds.mount("RINGING", Box::new(CpalElement::open(&props)?));
/// }
/// sounds.play("RINGING");
/// ```
pub struct SoundManager {
    sounds: HashMap<String, SoundEntry>,
    spawner: Rc<dyn LocalSpawn>,
    diagnostics: Rc<dyn DiagnosticSink>,
    sink_id: Option<String>,
}

impl SoundManager {
    /// Create an empty manager reporting to the global diagnostic log
    pub fn new(spawner: Rc<dyn LocalSpawn>) -> Self {
        Self {
            sounds: HashMap::new(),
            spawner,
            diagnostics: Rc::new(diagnostics::hub()),
            sink_id: None,
        }
    }

    /// Report failures to `sink`, including those of sounds already
    /// registered (for example by [`SoundManager::from_config`])
    pub fn with_diagnostics(mut self, sink: Rc<dyn DiagnosticSink>) -> Self {
        for entry in self.sounds.values_mut() {
            entry.controller.set_diagnostics(Rc::clone(&sink));
        }
        self.diagnostics = sink;
        self
    }

    /// Build a manager with every sound listed in `config`
    ///
    /// Sounds without their own loop flag use `playback.loop_sounds`; the
    /// configured default sink becomes the initial output device.
    pub fn from_config(config: &AppConfig, spawner: Rc<dyn LocalSpawn>) -> Self {
        let mut manager = Self::new(spawner);
        manager.sink_id = config.playback.default_sink_id.clone();

        for sound in &config.sounds {
            let loop_playback = sound.loop_playback.unwrap_or(config.playback.loop_sounds);
            manager.register(
                &sound.id,
                ElementProps::new(MediaSource::parse(&sound.src)).looping(loop_playback),
            );
        }

        manager
    }

    /// Register a sound under `id`
    ///
    /// # Returns
    /// * `true` - Sound registered
    /// * `false` - `id` already registered; the existing sound is kept
    pub fn register(&mut self, id: &str, props: ElementProps) -> bool {
        if self.sounds.contains_key(id) {
            log::warn!("[SoundManager] Sound '{}' already registered", id);
            return false;
        }

        let ready = Rc::new(Cell::new(false));
        let flag = Rc::clone(&ready);
        let controller = PlaybackController::new(props, Rc::clone(&self.spawner))
            .with_diagnostics(Rc::clone(&self.diagnostics))
            .with_element_change(move |current| flag.set(current.is_some()));

        self.sounds
            .insert(id.to_string(), SoundEntry { controller, ready });
        true
    }

    /// Remove a sound, detaching its element first
    pub fn unregister(&mut self, id: &str) -> Option<ElementProps> {
        let mut entry = self.sounds.remove(id)?;
        if entry.controller.is_attached() {
            entry.controller.detach();
        }
        Some(entry.controller.props().clone())
    }

    /// Props an owner needs to create the element for `id`
    pub fn props(&self, id: &str) -> Option<&ElementProps> {
        self.sounds.get(id).map(|entry| entry.controller.props())
    }

    /// Attach the platform element for `id`
    ///
    /// The current output device, if one was selected, is applied right away.
    pub fn mount(&mut self, id: &str, element: Box<dyn AudioElement>) -> bool {
        let Some(entry) = self.sounds.get_mut(id) else {
            log::warn!("[SoundManager] Mount for unknown sound '{}'", id);
            return false;
        };

        entry.controller.attach(element);
        if let Some(sink_id) = &self.sink_id {
            entry.controller.set_sink_id(sink_id);
        }
        true
    }

    pub fn unmount(&mut self, id: &str) -> bool {
        match self.sounds.get_mut(id) {
            Some(entry) => {
                entry.controller.detach();
                true
            }
            None => {
                log::warn!("[SoundManager] Unmount for unknown sound '{}'", id);
                false
            }
        }
    }

    pub fn is_ready(&self, id: &str) -> bool {
        self.sounds
            .get(id)
            .map(|entry| entry.ready.get())
            .unwrap_or(false)
    }

    pub fn play(&self, id: &str) {
        match self.sounds.get(id) {
            Some(entry) => entry.controller.play(),
            None => log::warn!("[SoundManager] PlaySound: no sound found for id: {}", id),
        }
    }

    pub fn stop(&self, id: &str) {
        match self.sounds.get(id) {
            Some(entry) => entry.controller.stop(),
            None => log::warn!("[SoundManager] StopSound: no sound found for id: {}", id),
        }
    }

    /// Route every sound to `sink_id`, now and on future mounts
    pub fn set_output_device(&mut self, sink_id: &str) {
        self.sink_id = Some(sink_id.to_string());
        for entry in self.sounds.values() {
            entry.controller.set_sink_id(sink_id);
        }
    }

    pub fn output_device(&self) -> Option<&str> {
        self.sink_id.as_deref()
    }

    /// Registered ids, sorted
    pub fn sound_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.sounds.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}
