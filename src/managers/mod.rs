// Managers Module
//
// Owner-side managers built on top of the playback controller.
//
// - SoundManager: named sounds, mount lifecycle and output-device routing

pub mod sound_manager;

pub use sound_manager::SoundManager;
