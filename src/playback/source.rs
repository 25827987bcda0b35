//! Media sources and the props an owner hands to a controller.

use std::fmt;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::AudioError;

/// What an audio element plays.
#[derive(Clone, PartialEq)]
pub enum MediaSource {
    /// Remote resource; only backends with network access can open it.
    Url(String),
    /// Local file.
    File(PathBuf),
    /// Bundled resource handed over as raw bytes.
    Embedded(Arc<[u8]>),
}

impl MediaSource {
    pub fn parse(src: &str) -> Self {
        if let Some(path) = src.strip_prefix("file://") {
            return MediaSource::File(PathBuf::from(path));
        }
        match src.find("://") {
            Some(idx) if idx > 0 && src[..idx].chars().all(|c| c.is_ascii_alphanumeric()) => {
                MediaSource::Url(src.to_string())
            }
            _ => MediaSource::File(PathBuf::from(src)),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            MediaSource::Url(url) => url.clone(),
            MediaSource::File(path) => path.display().to_string(),
            MediaSource::Embedded(bytes) => format!("<embedded {} bytes>", bytes.len()),
        }
    }
}

impl fmt::Debug for MediaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaSource::Url(url) => f.debug_tuple("Url").field(url).finish(),
            MediaSource::File(path) => f.debug_tuple("File").field(path).finish(),
            MediaSource::Embedded(bytes) => f.debug_tuple("Embedded").field(&bytes.len()).finish(),
        }
    }
}

impl From<&str> for MediaSource {
    fn from(src: &str) -> Self {
        Self::parse(src)
    }
}

impl From<PathBuf> for MediaSource {
    fn from(path: PathBuf) -> Self {
        MediaSource::File(path)
    }
}

/// Construction parameters for a controller, fixed for one mount cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementProps {
    pub src: MediaSource,
    pub loop_playback: bool,
}

impl ElementProps {
    pub fn new(src: impl Into<MediaSource>) -> Self {
        Self {
            src: src.into(),
            loop_playback: false,
        }
    }

    pub fn looping(mut self, loop_playback: bool) -> Self {
        self.loop_playback = loop_playback;
        self
    }
}

/// Decoded interleaved PCM ready for an output stream.
#[derive(Debug, Clone)]
pub struct PcmClip {
    pub samples: Arc<[f32]>,
    pub channels: u16,
    pub sample_rate: u32,
}

impl PcmClip {
    /// Decode a WAV source.
    ///
    /// Remote URLs are rejected; fetching is the host platform's job.
    pub fn load(source: &MediaSource) -> Result<Self, AudioError> {
        match source {
            MediaSource::Url(url) => Err(AudioError::SourceUnavailable {
                source: url.clone(),
                reason: "remote sources are not supported by this backend".to_string(),
            }),
            MediaSource::File(path) => {
                let reader =
                    hound::WavReader::open(path).map_err(|err| AudioError::SourceUnavailable {
                        source: path.display().to_string(),
                        reason: err.to_string(),
                    })?;
                Self::decode(reader)
            }
            MediaSource::Embedded(bytes) => {
                let reader = hound::WavReader::new(Cursor::new(bytes.clone()))?;
                Self::decode(reader)
            }
        }
    }

    fn decode<R: std::io::Read>(reader: hound::WavReader<R>) -> Result<Self, AudioError> {
        let spec = reader.spec();
        let samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .into_samples::<f32>()
                .collect::<Result<_, _>>()?,
            hound::SampleFormat::Int => {
                let scale = (1_i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
                reader
                    .into_samples::<i32>()
                    .map(|sample| sample.map(|value| value as f32 / scale))
                    .collect::<Result<_, _>>()?
            }
        };

        if spec.channels == 0 {
            return Err(AudioError::UnsupportedFormat {
                reason: "zero channels".to_string(),
            });
        }

        Ok(Self {
            samples: samples.into(),
            channels: spec.channels,
            sample_rate: spec.sample_rate,
        })
    }

    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }
}
