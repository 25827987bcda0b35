//! Playback module housing the audio element abstraction.
//!
//! This module exposes trait-based element backends (`backend`), the
//! `PlaybackController` that owners drive (`controller`), media sources and
//! props (`source`) and local task spawning (`spawn`).

pub mod backend;
pub mod controller;
pub mod source;
pub mod spawn;

pub use backend::{
    list_output_devices, AudioElement, CpalElement, ElementCall, SinkFuture, SinkResolver,
    SinkSelector, SinkSupport, StubElement,
};
pub use controller::{ElementChangeCallback, ElementState, PlaybackController, SINK_ERROR_MESSAGE};
pub use source::{ElementProps, MediaSource, PcmClip};
pub use spawn::TokioLocalSpawner;
