//! Audio source abstraction and CPAL device wrapper.
//!
//! This module sits between CPAL's low-level capture callbacks and the
//! rest of the pipeline. A capture session runs one source per role: the
//! near (microphone) path and, when available, the far (system audio)
//! path through a virtual-loopback device.

mod device;
mod mock;
mod source_id;

pub use device::{AudioDevice, CaptureStream, DeviceConfig};
pub use mock::MockSource;
pub use source_id::SourceId;

/// The role a source plays in the capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceRole {
    /// The user's voice. Primary source; failure to open aborts startup.
    Microphone,
    /// System playback captured through a virtual-loopback driver.
    /// Secondary; failure degrades the session instead of aborting.
    SystemAudio,
}

/// A capture source requested by the builder.
#[derive(Debug, Clone)]
pub enum CaptureSource {
    /// The default microphone.
    DefaultMicrophone,
    /// A specific input device by name, used as the microphone path.
    Microphone {
        /// Device name as reported by the backend.
        device_name: String,
    },
    /// System audio through a specific virtual-loopback device.
    VirtualDevice {
        /// Device name of the loopback driver.
        device_name: String,
    },
    /// System audio through whatever loopback device detection finds.
    SystemLoopback,
}

impl CaptureSource {
    /// The role this source plays in the pipeline.
    pub fn role(&self) -> SourceRole {
        match self {
            Self::DefaultMicrophone | Self::Microphone { .. } => SourceRole::Microphone,
            Self::VirtualDevice { .. } | Self::SystemLoopback => SourceRole::SystemAudio,
        }
    }

    /// Stable identifier for chunks produced by this source.
    pub fn id(&self) -> SourceId {
        match self.role() {
            SourceRole::Microphone => SourceId::new("mic"),
            SourceRole::SystemAudio => SourceId::new("system-audio"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_roles() {
        assert_eq!(
            CaptureSource::DefaultMicrophone.role(),
            SourceRole::Microphone
        );
        assert_eq!(
            CaptureSource::SystemLoopback.role(),
            SourceRole::SystemAudio
        );
        assert_eq!(
            CaptureSource::VirtualDevice {
                device_name: "BlackHole 2ch".to_string()
            }
            .role(),
            SourceRole::SystemAudio
        );
    }

    #[test]
    fn test_source_ids_by_role() {
        assert_eq!(CaptureSource::DefaultMicrophone.id().as_str(), "mic");
        assert_eq!(CaptureSource::SystemLoopback.id().as_str(), "system-audio");
    }
}
