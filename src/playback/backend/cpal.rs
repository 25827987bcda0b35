//! CPAL-based audio element for desktop and mobile hosts
//!
//! Decodes the whole clip up front and renders it from the output callback.
//! Transport state (playing flag, position, pending seek) is shared with the
//! callback through atomics; the stream itself stays on the UI thread.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use futures::FutureExt;

use crate::error::{log_audio_error, AudioError};
use crate::playback::source::{ElementProps, PcmClip};

use super::{AudioElement, SinkFuture, SinkSelector};

/// Sentinel for "no seek pending".
const NO_SEEK: u64 = u64::MAX;

/// Transport state shared with the output callback.
struct Transport {
    playing: AtomicBool,
    /// Position in clip frames, stored as `f64` bits.
    position: AtomicU64,
    /// Position requested from the UI thread, applied by the next callback.
    seek: AtomicU64,
    looping: bool,
}

impl Transport {
    fn new(looping: bool) -> Self {
        Self {
            playing: AtomicBool::new(false),
            position: AtomicU64::new(0f64.to_bits()),
            seek: AtomicU64::new(NO_SEEK),
            looping,
        }
    }

    fn position(&self) -> f64 {
        f64::from_bits(self.position.load(Ordering::Acquire))
    }

    fn request_seek(&self, frame: f64) {
        self.position.store(frame.to_bits(), Ordering::Release);
        self.seek.store(frame.to_bits(), Ordering::Release);
    }

    /// Resume playback; a finished non-looping clip restarts from the top.
    fn start(&self, frames: usize) {
        if !self.looping && self.position() >= frames as f64 {
            self.request_seek(0.0);
        }
        self.playing.store(true, Ordering::Release);
    }

    fn take_seek(&self) -> Option<f64> {
        match self.seek.swap(NO_SEEK, Ordering::AcqRel) {
            NO_SEEK => None,
            bits => Some(f64::from_bits(bits)),
        }
    }
}

type StreamSlot = Rc<RefCell<Option<cpal::Stream>>>;

/// Audio element backed by a cpal output stream.
pub struct CpalElement {
    clip: PcmClip,
    transport: Arc<Transport>,
    stream: StreamSlot,
}

impl CpalElement {
    /// Decode `props.src` and open a paused stream on the host's default
    /// output device.
    pub fn open(props: &ElementProps) -> Result<Self, AudioError> {
        let clip = PcmClip::load(&props.src)?;
        let transport = Arc::new(Transport::new(props.loop_playback));

        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| AudioError::StreamOpenFailed {
                reason: "no default output device".to_string(),
            })?;
        let stream = build_stream(&device, &clip, &transport)?;

        log::info!(
            "[CpalElement] Opened {} ({} frames @ {} Hz, loop={})",
            props.src.describe(),
            clip.frames(),
            clip.sample_rate,
            props.loop_playback
        );

        Ok(Self {
            clip,
            transport,
            stream: Rc::new(RefCell::new(Some(stream))),
        })
    }

    pub fn duration(&self) -> f64 {
        self.clip.duration_secs()
    }

    pub fn is_playing(&self) -> bool {
        self.transport.playing.load(Ordering::Acquire)
    }

    fn with_stream(&self, context: &str, f: impl FnOnce(&cpal::Stream) -> Result<(), AudioError>) {
        if let Some(stream) = self.stream.borrow().as_ref() {
            if let Err(err) = f(stream) {
                log_audio_error(&err, context);
            }
        }
    }
}

impl AudioElement for CpalElement {
    fn play(&self) {
        self.transport.start(self.clip.frames());
        self.with_stream("play", |stream| stream.play().map_err(stream_error));
    }

    fn pause(&self) {
        self.transport.playing.store(false, Ordering::Release);
        self.with_stream("pause", |stream| stream.pause().map_err(stream_error));
    }

    fn stop(&self) {
        self.transport.playing.store(false, Ordering::Release);
        self.transport.request_seek(0.0);
        self.with_stream("stop", |stream| stream.pause().map_err(stream_error));
    }

    fn current_time(&self) -> f64 {
        self.transport.position() / self.clip.sample_rate as f64
    }

    fn set_current_time(&self, seconds: f64) {
        let frame = (seconds.max(0.0) * self.clip.sample_rate as f64).min(self.clip.frames() as f64);
        self.transport.request_seek(frame);
    }

    fn sink_selector(&self) -> Option<&dyn SinkSelector> {
        Some(self)
    }
}

impl SinkSelector for CpalElement {
    fn set_sink_id(&self, sink_id: &str) -> SinkFuture {
        let slot: Weak<RefCell<Option<cpal::Stream>>> = Rc::downgrade(&self.stream);
        let clip = self.clip.clone();
        let transport = Arc::clone(&self.transport);
        let sink_id = sink_id.to_string();

        async move {
            let device = find_output_device(&sink_id)?;
            let slot = slot.upgrade().ok_or(AudioError::ElementReleased)?;

            let stream = build_stream(&device, &clip, &transport)?;
            if transport.playing.load(Ordering::Acquire) {
                stream.play().map_err(|err| AudioError::SinkSelectionFailed {
                    device_id: sink_id.clone(),
                    reason: err.to_string(),
                })?;
            }

            // Dropping the previous stream releases the old device.
            slot.borrow_mut().replace(stream);
            log::info!("[CpalElement] Output routed to '{}'", sink_id);
            Ok::<(), AudioError>(())
        }
        .boxed_local()
    }
}

/// Names of the host's output devices, in host order.
pub fn list_output_devices() -> Result<Vec<String>, AudioError> {
    let host = cpal::default_host();
    let devices = host.output_devices().map_err(|err| AudioError::HardwareError {
        details: err.to_string(),
    })?;
    Ok(devices.filter_map(|device| device.name().ok()).collect())
}

fn find_output_device(sink_id: &str) -> Result<cpal::Device, AudioError> {
    let host = cpal::default_host();
    let mut devices = host.output_devices().map_err(|err| AudioError::HardwareError {
        details: err.to_string(),
    })?;
    devices
        .find(|device| device.name().map(|name| name == sink_id).unwrap_or(false))
        .ok_or_else(|| AudioError::DeviceNotFound {
            device_id: sink_id.to_string(),
        })
}

fn stream_error(err: impl std::fmt::Display) -> AudioError {
    AudioError::HardwareError {
        details: err.to_string(),
    }
}

fn build_stream(
    device: &cpal::Device,
    clip: &PcmClip,
    transport: &Arc<Transport>,
) -> Result<cpal::Stream, AudioError> {
    let supported = device
        .default_output_config()
        .map_err(|err| AudioError::StreamOpenFailed {
            reason: err.to_string(),
        })?;
    let config: cpal::StreamConfig = supported.config();

    let stream = match supported.sample_format() {
        cpal::SampleFormat::F32 => build_typed::<f32>(device, &config, clip, transport)?,
        cpal::SampleFormat::I16 => build_typed::<i16>(device, &config, clip, transport)?,
        cpal::SampleFormat::U16 => build_typed::<u16>(device, &config, clip, transport)?,
        format => {
            return Err(AudioError::StreamOpenFailed {
                reason: format!("unsupported sample format {:?}", format),
            })
        }
    };

    // Some hosts start streams on creation.
    let _ = stream.pause();
    Ok(stream)
}

fn build_typed<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    clip: &PcmClip,
    transport: &Arc<Transport>,
) -> Result<cpal::Stream, AudioError>
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    let out_channels = config.channels as usize;
    let step = clip.sample_rate as f64 / config.sample_rate.0 as f64;
    let clip = clip.clone();
    let transport = Arc::clone(transport);

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                render(data, out_channels, step, &clip, &transport);
            },
            move |err| {
                log::error!("[CpalElement] Output stream error: {}", err);
            },
            None,
        )
        .map_err(|err| AudioError::StreamOpenFailed {
            reason: err.to_string(),
        })
}

fn render<T>(data: &mut [T], out_channels: usize, step: f64, clip: &PcmClip, transport: &Transport)
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    let silence = T::from_sample(0.0f32);
    if let Some(frame) = transport.take_seek() {
        transport.position.store(frame.to_bits(), Ordering::Release);
    }
    if !transport.playing.load(Ordering::Acquire) || out_channels == 0 {
        data.iter_mut().for_each(|sample| *sample = silence);
        return;
    }

    let frames = clip.frames();
    let clip_channels = clip.channels as usize;
    let mut position = transport.position();
    let mut ended = false;

    for frame in data.chunks_mut(out_channels) {
        if !ended && position as usize >= frames {
            if transport.looping && frames > 0 {
                position %= frames as f64;
            } else {
                ended = true;
            }
        }
        if ended {
            frame.iter_mut().for_each(|sample| *sample = silence);
            continue;
        }

        let base = position as usize * clip_channels;
        for (channel, sample) in frame.iter_mut().enumerate() {
            let value = clip.samples[base + channel.min(clip_channels - 1)];
            *sample = T::from_sample(value);
        }
        position += step;
    }

    if ended {
        transport.playing.store(false, Ordering::Release);
        position = frames as f64;
    }
    transport.position.store(position.to_bits(), Ordering::Release);
}
