//! Audio input device enumeration and classification.
//!
//! Devices are classified by label into physical microphones and
//! virtual-loopback drivers (BlackHole, Loopback Audio, Soundflower).
//! Classification is a pure function over descriptors so the selection
//! policy can be tested against mocked device lists without hardware.

use cpal::traits::{DeviceTrait, HostTrait};

use crate::CaptureError;

/// Where users can get a virtual-loopback driver when none is installed.
pub const LOOPBACK_INSTALL_URL: &str = "https://existential.audio/blackhole/";

/// Known virtual-loopback device label patterns, most specific first.
/// Matched case-insensitively as substrings.
const PRIMARY_LOOPBACK_PATTERNS: &[&str] = &[
    "blackhole 2ch",
    "blackhole 16ch",
    "blackhole 64ch",
    "blackhole",
];

/// Alternative virtual drivers that also expose system output as an input.
const ALTERNATIVE_LOOPBACK_PATTERNS: &[&str] = &["loopback audio", "soundflower"];

/// How a capture strategy should treat an input device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    /// A real microphone (or something indistinguishable from one).
    PhysicalMic,
    /// A virtual driver exposing system playback as a capturable input.
    VirtualLoopback,
    /// Couldn't tell from the label.
    Unknown,
}

/// An enumerated audio input endpoint.
#[derive(Debug, Clone)]
pub struct DeviceDescriptor {
    /// Backend device identifier (cpal uses the name as the id).
    pub id: String,
    /// Human-readable label.
    pub label: String,
    /// Label-based classification.
    pub classification: DeviceClass,
}

impl DeviceDescriptor {
    /// Creates a descriptor, classifying it from its label.
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        let label = label.into();
        let classification = classify_label(&label);
        Self {
            id: id.into(),
            label,
            classification,
        }
    }
}

/// Result of scanning the device list for a virtual-loopback driver.
#[derive(Debug, Clone)]
pub struct LoopbackDetection {
    /// Whether any virtual-loopback device was found.
    pub found: bool,
    /// Backend id of the matched device.
    pub device_id: Option<String>,
    /// Label of the matched device.
    pub label: Option<String>,
    /// True when the match was an alternative driver (Loopback Audio,
    /// Soundflower) rather than BlackHole.
    pub is_alternative: bool,
    /// Install hint shown when nothing was found.
    pub install_url: Option<&'static str>,
}

impl LoopbackDetection {
    fn hit(device: &DeviceDescriptor, is_alternative: bool) -> Self {
        Self {
            found: true,
            device_id: Some(device.id.clone()),
            label: Some(device.label.clone()),
            is_alternative,
            install_url: None,
        }
    }

    fn miss() -> Self {
        Self {
            found: false,
            device_id: None,
            label: None,
            is_alternative: false,
            install_url: Some(LOOPBACK_INSTALL_URL),
        }
    }
}

/// Classifies an input device label.
pub fn classify_label(label: &str) -> DeviceClass {
    let lower = label.to_lowercase();
    let all_patterns = PRIMARY_LOOPBACK_PATTERNS
        .iter()
        .chain(ALTERNATIVE_LOOPBACK_PATTERNS);
    for pattern in all_patterns {
        if lower.contains(pattern) {
            return DeviceClass::VirtualLoopback;
        }
    }
    if lower.contains("microphone") || lower.contains("mic") {
        return DeviceClass::PhysicalMic;
    }
    DeviceClass::Unknown
}

/// Scans a device list for a virtual-loopback driver.
///
/// BlackHole variants win over the alternative drivers; within each group
/// the first enumerated match is taken. A miss carries the install hint.
pub fn detect_virtual_loopback(devices: &[DeviceDescriptor]) -> LoopbackDetection {
    for pattern in PRIMARY_LOOPBACK_PATTERNS {
        if let Some(device) = devices
            .iter()
            .find(|d| d.label.to_lowercase().contains(pattern))
        {
            tracing::info!(label = %device.label, "virtual loopback device found");
            return LoopbackDetection::hit(device, false);
        }
    }

    for pattern in ALTERNATIVE_LOOPBACK_PATTERNS {
        if let Some(device) = devices
            .iter()
            .find(|d| d.label.to_lowercase().contains(pattern))
        {
            tracing::info!(label = %device.label, "alternative loopback device found");
            return LoopbackDetection::hit(device, true);
        }
    }

    tracing::info!("no virtual loopback device found");
    LoopbackDetection::miss()
}

/// Lists all available input devices as classified descriptors.
///
/// # Errors
///
/// Returns an error if the audio host cannot be accessed.
pub fn list_input_devices() -> Result<Vec<DeviceDescriptor>, CaptureError> {
    let host = cpal::default_host();
    let devices = host
        .input_devices()
        .map_err(|e| CaptureError::Backend(e.to_string()))?;

    Ok(devices
        .filter_map(|d| d.name().ok())
        .map(|name| DeviceDescriptor::new(name.clone(), name))
        .collect())
}

/// Gets the name of the default input device, if any.
pub fn default_input_device_name() -> Option<String> {
    cpal::default_host()
        .default_input_device()
        .and_then(|d| d.name().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock_devices(labels: &[&str]) -> Vec<DeviceDescriptor> {
        labels
            .iter()
            .enumerate()
            .map(|(i, label)| DeviceDescriptor::new(format!("dev-{i}"), *label))
            .collect()
    }

    #[test]
    fn test_classify_blackhole() {
        assert_eq!(classify_label("BlackHole 2ch"), DeviceClass::VirtualLoopback);
        assert_eq!(classify_label("blackhole 64ch"), DeviceClass::VirtualLoopback);
    }

    #[test]
    fn test_classify_alternatives() {
        assert_eq!(classify_label("Loopback Audio"), DeviceClass::VirtualLoopback);
        assert_eq!(classify_label("Soundflower (2ch)"), DeviceClass::VirtualLoopback);
    }

    #[test]
    fn test_classify_physical_mic() {
        assert_eq!(
            classify_label("MacBook Pro Microphone"),
            DeviceClass::PhysicalMic
        );
        assert_eq!(classify_label("USB Mic"), DeviceClass::PhysicalMic);
    }

    #[test]
    fn test_classify_unknown() {
        assert_eq!(classify_label("Aggregate Device"), DeviceClass::Unknown);
    }

    #[test]
    fn test_detect_finds_blackhole() {
        let devices = mock_devices(&["MacBook Pro Microphone", "BlackHole 2ch", "USB Mic"]);
        let detection = detect_virtual_loopback(&devices);

        assert!(detection.found);
        assert_eq!(detection.device_id.as_deref(), Some("dev-1"));
        assert_eq!(detection.label.as_deref(), Some("BlackHole 2ch"));
        assert!(!detection.is_alternative);
        assert!(detection.install_url.is_none());
    }

    #[test]
    fn test_detect_prefers_blackhole_over_alternatives() {
        let devices = mock_devices(&["Soundflower (2ch)", "BlackHole 16ch"]);
        let detection = detect_virtual_loopback(&devices);

        assert!(detection.found);
        assert_eq!(detection.label.as_deref(), Some("BlackHole 16ch"));
        assert!(!detection.is_alternative);
    }

    #[test]
    fn test_detect_alternative_flagged() {
        let devices = mock_devices(&["MacBook Pro Microphone", "Loopback Audio"]);
        let detection = detect_virtual_loopback(&devices);

        assert!(detection.found);
        assert!(detection.is_alternative);
        assert_eq!(detection.label.as_deref(), Some("Loopback Audio"));
    }

    #[test]
    fn test_detect_miss_carries_install_hint() {
        let devices = mock_devices(&["MacBook Pro Microphone", "USB Mic"]);
        let detection = detect_virtual_loopback(&devices);

        assert!(!detection.found);
        assert!(detection.device_id.is_none());
        assert_eq!(detection.install_url, Some(LOOPBACK_INSTALL_URL));
    }

    #[test]
    fn test_detect_case_insensitive() {
        let devices = mock_devices(&["BLACKHOLE 2CH"]);
        assert!(detect_virtual_loopback(&devices).found);
    }

    #[test]
    fn test_list_devices_doesnt_panic() {
        // May return an empty list in CI, but shouldn't panic
        let _ = list_input_devices();
    }
}
