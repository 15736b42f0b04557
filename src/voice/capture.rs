//! Audio capture from microphone

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleRate, Stream, StreamConfig};

use super::AudioSink;
use crate::{Error, Result};

/// Sample rate for audio capture (16kHz for speech)
pub const SAMPLE_RATE: u32 = 16000;

/// Something that can feed captured audio to a recognizer
///
/// Implementations need not be `Send`; platform streams are often tied to the
/// thread that opened them.
pub trait AudioSource {
    /// Start delivering audio buffers to `sink`
    ///
    /// # Errors
    ///
    /// Returns error if the audio engine cannot start
    fn start(&mut self, sink: AudioSink) -> Result<()>;

    /// Stop delivering audio
    fn stop(&mut self);

    /// Whether audio is being delivered
    fn is_running(&self) -> bool;
}

/// Captures audio from the default input device
pub struct MicrophoneCapture {
    device: Device,
    config: StreamConfig,
    stream: Option<Stream>,
}

impl MicrophoneCapture {
    /// Open the default input device
    ///
    /// # Errors
    ///
    /// Returns error if audio device cannot be opened
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or_else(|| Error::Audio("no input device available".to_string()))?;

        let supported_config = device
            .supported_input_configs()
            .map_err(|e| Error::Audio(e.to_string()))?
            .find(|c| {
                c.channels() == 1
                    && c.min_sample_rate() <= SampleRate(SAMPLE_RATE)
                    && c.max_sample_rate() >= SampleRate(SAMPLE_RATE)
            })
            .ok_or_else(|| Error::Audio("no suitable audio config found".to_string()))?;

        let config = supported_config
            .with_sample_rate(SampleRate(SAMPLE_RATE))
            .config();

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = SAMPLE_RATE,
            channels = config.channels,
            "microphone opened"
        );

        Ok(Self {
            device,
            config,
            stream: None,
        })
    }
}

impl AudioSource for MicrophoneCapture {
    fn start(&mut self, sink: AudioSink) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        let stream = self
            .device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| sink(data),
                |err| {
                    tracing::error!(error = %err, "audio capture error");
                },
                None,
            )
            .map_err(|e| Error::Audio(e.to_string()))?;

        stream.play().map_err(|e| Error::Audio(e.to_string()))?;
        self.stream = Some(stream);

        tracing::debug!("audio capture started");
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            drop(stream);
            tracing::debug!("audio capture stopped");
        }
    }

    fn is_running(&self) -> bool {
        self.stream.is_some()
    }
}

/// Audio source that delivers nothing, for headless sessions
#[derive(Debug, Default)]
pub struct SilentSource {
    running: bool,
}

impl AudioSource for SilentSource {
    fn start(&mut self, _sink: AudioSink) -> Result<()> {
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) {
        self.running = false;
    }

    fn is_running(&self) -> bool {
        self.running
    }
}

/// Running loudness of captured audio
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputLevel {
    sum_squares: f64,
    samples: usize,
    /// Largest absolute sample seen
    pub peak: f32,
}

impl InputLevel {
    /// Fold a buffer of samples into the level
    pub fn record(&mut self, data: &[f32]) {
        for &sample in data {
            self.sum_squares += f64::from(sample) * f64::from(sample);
            self.peak = self.peak.max(sample.abs());
        }
        self.samples += data.len();
    }

    /// Root mean square of everything recorded, zero when empty
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    pub fn rms(&self) -> f32 {
        if self.samples == 0 {
            return 0.0;
        }
        (self.sum_squares / self.samples as f64).sqrt() as f32
    }

    /// Number of samples recorded
    #[must_use]
    pub const fn samples(&self) -> usize {
        self.samples
    }
}
