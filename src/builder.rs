//! Builder for configuring and starting capture sessions.

use std::sync::{Arc, Mutex};

use crate::aec::{AecEngine, EchoCanceller};
use crate::config::{CaptureConfig, DspFlags};
use crate::device::{detect_virtual_loopback, list_input_devices, DeviceClass};
use crate::event::{CaptureEvent, EventCallback};
use crate::pipeline::{spawn_mic_bridge, spawn_system_bridge, BridgeConfig, MicBridge, SystemBridge};
use crate::reference::ReferenceBuffer;
use crate::session::{Session, SessionState};
use crate::source::{AudioDevice, CaptureSource, CaptureStream, DeviceConfig, SourceId};
use crate::tokens::TokenBudgetTracker;
use crate::transport::{Transport, TranscriptionSink};
use crate::CaptureError;

/// Factory for echo canceller backends, so sessions are restartable.
pub type BackendFactory = Arc<dyn Fn() -> Box<dyn EchoCanceller> + Send + Sync>;

/// Builder for capture sessions.
///
/// Configure sources, sinks, and behavior, then call
/// [`start()`](CaptureBuilder::start) to begin capturing.
///
/// # Source selection
///
/// The microphone is the primary source: if it cannot be opened,
/// `start()` fails. System audio is secondary: a missing loopback
/// device or a failed open degrades the session to mic-only and emits
/// [`CaptureEvent::ReducedCapability`] instead of erroring.
///
/// # Example
///
/// ```ignore
/// let (tx, mut rx) = tokio::sync::mpsc::channel(100);
/// let session = CaptureBuilder::new()
///     .add_sink(ChannelTranscriptionSink::new(tx))
///     .on_event(|event| tracing::info!(?event, "capture event"))
///     .start()
///     .await?;
/// ```
#[derive(Clone)]
pub struct CaptureBuilder {
    config: CaptureConfig,
    mic_device: Option<String>,
    system_device: Option<String>,
    system_audio_enabled: bool,
    sinks: Vec<Arc<dyn TranscriptionSink>>,
    event_callback: Option<EventCallback>,
    backend_factory: Option<BackendFactory>,
}

impl CaptureBuilder {
    /// Creates a builder with default configuration.
    pub fn new() -> Self {
        Self {
            config: CaptureConfig::default(),
            mic_device: None,
            system_device: None,
            system_audio_enabled: true,
            sinks: Vec::new(),
            event_callback: None,
            backend_factory: None,
        }
    }

    /// Sets the capture configuration.
    pub fn with_config(mut self, config: CaptureConfig) -> Self {
        self.config = config;
        self
    }

    /// Uses a specific input device as the microphone instead of the
    /// system default.
    pub fn microphone_device(mut self, name: impl Into<String>) -> Self {
        self.mic_device = Some(name.into());
        self
    }

    /// Uses a specific device for system audio instead of running
    /// loopback detection.
    pub fn system_device(mut self, name: impl Into<String>) -> Self {
        self.system_device = Some(name.into());
        self
    }

    /// Disables the system-audio path entirely.
    pub fn without_system_audio(mut self) -> Self {
        self.system_audio_enabled = false;
        self
    }

    /// Declares a capture source explicitly.
    ///
    /// Equivalent to the [`microphone_device`](Self::microphone_device) /
    /// [`system_device`](Self::system_device) shorthands; useful when the
    /// source set comes from configuration rather than code.
    pub fn add_source(mut self, source: CaptureSource) -> Self {
        match source {
            CaptureSource::DefaultMicrophone => self.mic_device = None,
            CaptureSource::Microphone { device_name } => self.mic_device = Some(device_name),
            CaptureSource::VirtualDevice { device_name } => {
                self.system_device = Some(device_name);
                self.system_audio_enabled = true;
            }
            CaptureSource::SystemLoopback => {
                self.system_device = None;
                self.system_audio_enabled = true;
            }
        }
        self
    }

    /// Adds a transcription sink.
    pub fn add_sink<S: TranscriptionSink + 'static>(mut self, sink: S) -> Self {
        self.sinks.push(Arc::new(sink));
        self
    }

    /// Registers a callback for runtime events.
    pub fn on_event<F>(mut self, callback: F) -> Self
    where
        F: Fn(CaptureEvent) + Send + Sync + 'static,
    {
        self.event_callback = Some(Arc::new(callback));
        self
    }

    /// Supplies an echo canceller factory instead of the built-in
    /// backend selection. Used to inject mock backends in tests.
    pub fn backend_factory(mut self, factory: BackendFactory) -> Self {
        self.backend_factory = Some(factory);
        self
    }

    fn validate(&self) -> Result<(), CaptureError> {
        if self.sinks.is_empty() {
            return Err(CaptureError::NoSinksConfigured);
        }
        Ok(())
    }

    /// Starts capturing.
    ///
    /// Opens the microphone (and the system-audio device when one is
    /// available), builds the echo canceller or its bypass fallback, and
    /// spawns the bridge tasks.
    ///
    /// # Errors
    ///
    /// Fails when no sinks are configured, the microphone cannot be
    /// opened, or a sink's `on_start` hook fails. System-audio and
    /// canceller failures degrade instead of erroring.
    pub async fn start(self) -> Result<Session, CaptureError> {
        self.validate()?;

        let state = Arc::new(SessionState::new());
        let reference = Arc::new(ReferenceBuffer::new(self.config.reference_capacity));
        let transport = Arc::new(Transport::new(
            self.sinks.clone(),
            self.event_callback.clone(),
        ));
        let tokens = Arc::new(Mutex::new(TokenBudgetTracker::new()));

        transport
            .start()
            .await
            .map_err(|e| CaptureError::Backend(e.to_string()))?;

        let mut streams: Vec<CaptureStream> = Vec::new();
        let mut handles = Vec::new();

        // Resolve the system-audio device first: its availability decides
        // the microphone's DSP flags
        let system_pick = self.resolve_system_device();

        // Primary path: failures here abort startup
        let mic = self.open_microphone(system_pick.is_some())?;
        let (mic_rate, mic_channels) = mic.native_config()?;
        let (mic_stream, mic_ring) =
            mic.start_capture(SourceId::new("mic"), self.event_callback.clone())?;
        streams.push(mic_stream);
        self.emit(CaptureEvent::SourceStarted {
            source_id: SourceId::new("mic"),
        });

        // Secondary path: failures degrade to mic-only
        if let Some((device_name, gate_threshold)) = system_pick {
            match self.open_system_device(&device_name) {
                Ok((device, rate, channels)) => match device
                    .start_capture(SourceId::new("system-audio"), self.event_callback.clone())
                {
                    Ok((stream, ring)) => {
                        streams.push(stream);
                        let bridge_config = BridgeConfig {
                            device_sample_rate: rate,
                            device_channels: channels,
                            source_id: SourceId::new("system-audio"),
                            capture: self.config.clone(),
                        };
                        let bridge = SystemBridge::new(
                            ring,
                            &bridge_config,
                            gate_threshold,
                            Arc::clone(&reference),
                            Arc::clone(&transport),
                            Arc::clone(&state),
                        );
                        handles.push(spawn_system_bridge(bridge));
                        self.emit(CaptureEvent::SourceStarted {
                            source_id: SourceId::new("system-audio"),
                        });
                    }
                    Err(e) => self.disable_system_path(&device_name, &e),
                },
                Err(e) => self.disable_system_path(&device_name, &e),
            }
        }

        let engine = self.build_engine();
        let mic_bridge_config = BridgeConfig {
            device_sample_rate: mic_rate,
            device_channels: mic_channels,
            source_id: SourceId::new("mic"),
            capture: self.config.clone(),
        };
        let bridge = MicBridge::new(
            mic_ring,
            &mic_bridge_config,
            engine,
            Arc::clone(&reference),
            Arc::clone(&transport),
            Arc::clone(&state),
            tokens,
            self.event_callback.clone(),
        );
        handles.push(spawn_mic_bridge(bridge));

        tracing::info!(
            sinks = transport.sink_count(),
            streams = streams.len(),
            "capture session started"
        );
        Ok(Session::new(state, transport, reference, handles, streams))
    }

    /// Picks the system-audio device name and gate threshold, or `None`
    /// for mic-only operation.
    fn resolve_system_device(&self) -> Option<(String, f32)> {
        if !self.system_audio_enabled {
            return None;
        }

        if let Some(ref name) = self.system_device {
            let gate = if crate::device::classify_label(name) == DeviceClass::VirtualLoopback {
                self.config.virtual_device_gate
            } else {
                self.config.silence_gate
            };
            return Some((name.clone(), gate));
        }

        let devices = match list_input_devices() {
            Ok(devices) => devices,
            Err(e) => {
                tracing::warn!(error = %e, "device enumeration failed");
                return None;
            }
        };

        let detection = detect_virtual_loopback(&devices);
        if detection.found {
            return detection
                .label
                .map(|label| (label, self.config.virtual_device_gate));
        }

        let mut detail = "no virtual loopback device; capturing microphone only".to_string();
        if let Some(url) = detection.install_url {
            detail.push_str(&format!(" (install one from {url})"));
        }
        tracing::warn!("{detail}");
        self.emit(CaptureEvent::ReducedCapability { detail });
        None
    }

    fn open_microphone(&self, has_system_audio: bool) -> Result<AudioDevice, CaptureError> {
        // With an in-process canceller fed by system audio, the OS DSP
        // must stay out of the way; without one, let the OS help
        let dsp = if has_system_audio {
            DspFlags::disabled()
        } else {
            DspFlags::standalone_mic()
        };
        let device_config = DeviceConfig {
            sample_rate: self.config.sample_rate,
            channels: 1,
            buffer_capacity: self.ring_capacity(),
            dsp,
        };

        let device = match self.mic_device {
            Some(ref name) => AudioDevice::open_by_name(name)?,
            None => AudioDevice::open_default()?,
        };
        Ok(device.with_config(device_config))
    }

    fn open_system_device(&self, name: &str) -> Result<(AudioDevice, u32, u16), CaptureError> {
        let device = AudioDevice::open_by_name(name)?.with_config(DeviceConfig {
            sample_rate: self.config.sample_rate,
            channels: 1,
            buffer_capacity: self.ring_capacity(),
            dsp: DspFlags::disabled(),
        });
        let (rate, channels) = device.native_config()?;
        Ok((device, rate, channels))
    }

    fn disable_system_path(&self, device_name: &str, error: &CaptureError) {
        tracing::warn!(device = device_name, error = %error, "system audio disabled");
        self.emit(CaptureEvent::SourceDisabled {
            source_id: SourceId::new("system-audio"),
            reason: error.to_string(),
        });
        self.emit(CaptureEvent::ReducedCapability {
            detail: format!("system audio unavailable: {error}"),
        });
    }

    fn build_engine(&self) -> AecEngine {
        if let Some(ref factory) = self.backend_factory {
            return AecEngine::with_backend(self.config.aec, factory());
        }
        match AecEngine::new(self.config.aec) {
            Ok(engine) => engine,
            Err(e) => {
                tracing::warn!(error = %e, "falling back to echo cancellation bypass");
                self.emit(CaptureEvent::ReducedCapability {
                    detail: format!("echo cancellation disabled: {e}"),
                });
                AecEngine::bypass(self.config.aec)
            }
        }
    }

    fn ring_capacity(&self) -> usize {
        (f64::from(self.config.sample_rate) * self.config.ring_buffer_duration.as_secs_f64())
            as usize
    }

    fn emit(&self, event: CaptureEvent) {
        if let Some(ref callback) = self.event_callback {
            callback(event);
        }
    }
}

impl Default for CaptureBuilder {
    fn default() -> Self {
        Self::new()
    }
}
