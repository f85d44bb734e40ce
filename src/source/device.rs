//! CPAL device wrapper for audio capture.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig as CpalStreamConfig};
use ringbuf::traits::{Producer, Split};
use ringbuf::HeapRb;

use crate::config::DspFlags;
use crate::event::{CaptureEvent, EventCallback};
use crate::format::i16_to_f32;
use crate::source::SourceId;
use crate::CaptureError;

/// Configuration for opening a capture stream on one device.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// Target sample rate in Hz. The device may capture at a different
    /// native rate; the bridge resamples downstream.
    pub sample_rate: u32,
    /// Number of channels (1 = mono, 2 = stereo).
    pub channels: u16,
    /// Ring buffer capacity in samples.
    pub buffer_capacity: usize,
    /// Requested DSP behavior for this stream.
    ///
    /// CPAL exposes no portable toggle for OS-level echo cancellation or
    /// noise suppression, so these are recorded and logged rather than
    /// applied. Echo cancellation itself runs in-process downstream.
    pub dsp: DspFlags,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            sample_rate: 24_000,
            channels: 1,
            // 30 seconds at 24kHz mono
            buffer_capacity: 24_000 * 30,
            dsp: DspFlags::disabled(),
        }
    }
}

/// Wrapper around a CPAL audio input device.
///
/// Handles device selection and stream setup, and hands the ring buffer
/// producer to the audio callback. Samples cross the callback boundary as
/// `f32` regardless of the device's native sample format.
#[must_use]
pub struct AudioDevice {
    device: Device,
    config: DeviceConfig,
}

impl AudioDevice {
    /// Opens the default input device.
    ///
    /// # Errors
    ///
    /// Returns `NoDefaultDevice` if no default input device is configured.
    pub fn open_default() -> Result<Self, CaptureError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(CaptureError::NoDefaultDevice)?;

        Ok(Self {
            device,
            config: DeviceConfig::default(),
        })
    }

    /// Opens a specific input device by name.
    ///
    /// # Errors
    ///
    /// Returns `DeviceNotFound` if no device with the given name exists.
    pub fn open_by_name(name: &str) -> Result<Self, CaptureError> {
        let host = cpal::default_host();
        let devices = host
            .input_devices()
            .map_err(|e| CaptureError::Backend(e.to_string()))?;

        for device in devices {
            if let Ok(device_name) = device.name() {
                if device_name == name {
                    return Ok(Self {
                        device,
                        config: DeviceConfig::default(),
                    });
                }
            }
        }

        Err(CaptureError::DeviceNotFound {
            name: name.to_string(),
        })
    }

    /// Sets the device configuration.
    pub fn with_config(mut self, config: DeviceConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the device name.
    pub fn name(&self) -> String {
        self.device.name().unwrap_or_else(|_| "unknown".to_string())
    }

    /// Returns the current configuration.
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Returns the device's native capture format (sample rate, channels).
    ///
    /// This may differ from the requested format; the bridge resamples and
    /// downmixes downstream.
    ///
    /// # Errors
    ///
    /// Returns an error if the device's default config cannot be queried.
    pub fn native_config(&self) -> Result<(u32, u16), CaptureError> {
        let config = self
            .device
            .default_input_config()
            .map_err(|e| map_config_error(&self.name(), e))?;
        Ok((config.sample_rate().0, config.channels()))
    }

    /// Starts capturing audio and returns a running stream.
    ///
    /// The returned `CaptureStream` must be kept alive for capture to
    /// continue. Samples land in the returned ring buffer consumer.
    /// When the consumer falls behind and the ring fills, dropped audio
    /// is reported as [`CaptureEvent::BufferOverflow`] through `events`.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream cannot be built or started.
    pub fn start_capture(
        &self,
        source_id: SourceId,
        events: Option<EventCallback>,
    ) -> Result<(CaptureStream, ringbuf::HeapCons<f32>), CaptureError> {
        let ring_buffer = HeapRb::<f32>::new(self.config.buffer_capacity);
        let (producer, consumer) = ring_buffer.split();

        let supported_config = self
            .device
            .default_input_config()
            .map_err(|e| map_config_error(&self.name(), e))?;

        let sample_format = supported_config.sample_format();
        let cpal_config: CpalStreamConfig = supported_config.into();

        tracing::info!(
            device = %self.name(),
            rate = cpal_config.sample_rate.0,
            channels = cpal_config.channels,
            echo_cancellation = self.config.dsp.echo_cancellation,
            noise_suppression = self.config.dsp.noise_suppression,
            auto_gain_control = self.config.dsp.auto_gain_control,
            "opening capture stream"
        );

        let meter = OverflowMeter::new(cpal_config.sample_rate.0, cpal_config.channels);
        let reporter = OverflowReporter {
            meter,
            source_id,
            events,
        };

        let stream = match sample_format {
            SampleFormat::F32 => self.build_f32_stream(&cpal_config, producer, reporter)?,
            SampleFormat::I16 => self.build_i16_stream(&cpal_config, producer, reporter)?,
            format => {
                return Err(CaptureError::UnsupportedFormat {
                    format: format!("{format:?}"),
                });
            }
        };

        stream
            .play()
            .map_err(|e| CaptureError::Backend(e.to_string()))?;

        Ok((CaptureStream { _stream: stream }, consumer))
    }

    fn build_f32_stream(
        &self,
        config: &CpalStreamConfig,
        mut producer: ringbuf::HeapProd<f32>,
        mut reporter: OverflowReporter,
    ) -> Result<Stream, CaptureError> {
        let name = self.name();
        let stream = self
            .device
            .build_input_stream(
                config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    // Non-blocking push - drops samples if buffer is full
                    let pushed = producer.push_slice(data);
                    reporter.record((data.len() - pushed) as u64);
                },
                |err| {
                    tracing::error!("Audio stream error: {}", err);
                },
                None,
            )
            .map_err(|e| map_build_error(&name, e))?;

        Ok(stream)
    }

    fn build_i16_stream(
        &self,
        config: &CpalStreamConfig,
        mut producer: ringbuf::HeapProd<f32>,
        mut reporter: OverflowReporter,
    ) -> Result<Stream, CaptureError> {
        let name = self.name();
        let stream = self
            .device
            .build_input_stream(
                config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    // Inline conversion to keep the audio callback allocation-free
                    let mut lost: u64 = 0;
                    for &sample in data {
                        if producer.try_push(i16_to_f32(sample)).is_err() {
                            lost += 1;
                        }
                    }
                    reporter.record(lost);
                },
                |err| {
                    tracing::error!("Audio stream error: {}", err);
                },
                None,
            )
            .map_err(|e| map_build_error(&name, e))?;

        Ok(stream)
    }
}

fn map_build_error(name: &str, error: cpal::BuildStreamError) -> CaptureError {
    match error {
        cpal::BuildStreamError::DeviceNotAvailable => CaptureError::DeviceUnavailable {
            name: name.to_string(),
            reason: "device disconnected".to_string(),
        },
        cpal::BuildStreamError::BackendSpecific { err }
            if err.description.to_lowercase().contains("permission") =>
        {
            CaptureError::PermissionDenied
        }
        other => CaptureError::Backend(other.to_string()),
    }
}

fn map_config_error(name: &str, error: cpal::DefaultStreamConfigError) -> CaptureError {
    match error {
        cpal::DefaultStreamConfigError::DeviceNotAvailable => CaptureError::DeviceUnavailable {
            name: name.to_string(),
            reason: "device disconnected".to_string(),
        },
        other => CaptureError::Backend(other.to_string()),
    }
}

/// Accumulates dropped-sample counts inside the audio callback.
///
/// Overflow is reported in batches of at least 100 ms of lost audio so a
/// saturated ring doesn't emit an event per callback.
struct OverflowMeter {
    samples_per_ms: u64,
    dropped: u64,
}

impl OverflowMeter {
    fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            samples_per_ms: (u64::from(sample_rate) * u64::from(channels) / 1000).max(1),
            dropped: 0,
        }
    }

    /// Adds `lost` dropped samples. Returns the accumulated drop duration
    /// in milliseconds once it reaches 100 ms, resetting the accumulator.
    fn record(&mut self, lost: u64) -> Option<u64> {
        if lost == 0 {
            return None;
        }
        self.dropped += lost;
        if self.dropped >= self.samples_per_ms * 100 {
            let dropped_ms = self.dropped / self.samples_per_ms;
            self.dropped = 0;
            Some(dropped_ms)
        } else {
            None
        }
    }
}

/// Turns batched overflow reports into log lines and events.
struct OverflowReporter {
    meter: OverflowMeter,
    source_id: SourceId,
    events: Option<EventCallback>,
}

impl OverflowReporter {
    fn record(&mut self, lost: u64) {
        if let Some(dropped_ms) = self.meter.record(lost) {
            tracing::warn!(
                source = %self.source_id,
                dropped_ms,
                "capture ring buffer overflow"
            );
            if let Some(ref events) = self.events {
                events(CaptureEvent::BufferOverflow {
                    source_id: self.source_id.clone(),
                    dropped_ms,
                });
            }
        }
    }
}

/// A running audio capture stream.
///
/// Audio capture continues while this struct is held. When dropped, the
/// CPAL stream is stopped and resources are released.
pub struct CaptureStream {
    /// The underlying CPAL stream. Dropping this stops capture.
    _stream: Stream,
}
