//! Per-model device capabilities and value translation
//!
//! The speakers report raw values in API units (volume 0..=30, source
//! function codes like `soundshare`). A [`DeviceProfile`] holds what the
//! API does not report itself and converts between API and user units.

use serde::Serialize;

use crate::error::{ApiError, Result};

/// TCP port every speaker listens on
pub const DEFAULT_PORT: u16 = 55001;

/// Highest volume step the API accepts
pub const DEFAULT_MAX_API_VOLUME: u32 = 30;

const BT_WIFI_TV: &[&str] = &["Bluetooth", "Wi-Fi", "TV SoundConnect"];
const BT_WIFI_AUX_TV: &[&str] = &["Bluetooth", "Wi-Fi", "AUX", "TV SoundConnect"];
const SOUNDBAR: &[&str] = &["Bluetooth", "Wi-Fi", "AUX", "HDMI", "Optical", "TV SoundConnect"];
const SOUNDBAR_USB: &[&str] = &[
    "Bluetooth", "Wi-Fi", "AUX", "HDMI", "Optical", "TV SoundConnect", "USB",
];
const SOUNDBAR_DUAL_HDMI: &[&str] = &[
    "Bluetooth", "Wi-Fi", "AUX", "HDMI 1", "HDMI 2", "Optical", "TV SoundConnect",
];
const SOUNDBAR_NO_AUX: &[&str] = &["Bluetooth", "Wi-Fi", "HDMI", "Optical", "TV SoundConnect"];
const SOUNDBAR_NO_AUX_DUAL_HDMI: &[&str] = &[
    "Bluetooth", "Wi-Fi", "HDMI 1", "HDMI 2", "Optical", "TV SoundConnect",
];

/// Known models: (model, display name, sources, sources a group master can share)
const MODELS: &[(&str, &str, &[&str], &[&str])] = &[
    ("SPK-WAM350", "Shape M3", BT_WIFI_TV, &["Wi-Fi"]),
    ("SPK-WAM351", "Shape M3", BT_WIFI_TV, &["Wi-Fi"]),
    ("SPK-WAM550", "Shape M5", BT_WIFI_TV, &["Wi-Fi"]),
    ("SPK-WAM551", "Shape M5", BT_WIFI_TV, &["Wi-Fi"]),
    ("SPK-WAM750", "Shape M7", BT_WIFI_AUX_TV, &["Wi-Fi", "AUX"]),
    ("SPK-WAM751", "Shape M7", BT_WIFI_AUX_TV, &["Wi-Fi", "AUX"]),
    ("SPK-WAM1400", "Wireless Audio 360 - R1 Lite", BT_WIFI_TV, &["Wi-Fi"]),
    ("SPK-WAM1401", "Wireless Audio 360 - R1 Lite", BT_WIFI_TV, &["Wi-Fi"]),
    ("SPK-WAM1500", "Wireless Audio 360 - R1", BT_WIFI_TV, &["Wi-Fi"]),
    ("SPK-WAM1501", "Wireless Audio 360 - R1", BT_WIFI_TV, &["Wi-Fi"]),
    ("SPK-WAM3500", "Wireless Audio 360 - R3", BT_WIFI_TV, &["Wi-Fi"]),
    ("SPK-WAM3501", "Wireless Audio 360 - R3", BT_WIFI_TV, &["Wi-Fi"]),
    ("SPK-WAM5500", "Wireless Audio 360 - R5", BT_WIFI_TV, &["Wi-Fi"]),
    ("SPK-WAM5501", "Wireless Audio 360 - R5", BT_WIFI_TV, &["Wi-Fi"]),
    ("SPK-WAM6500", "Wireless Audio 360 - R6", BT_WIFI_TV, &["Wi-Fi"]),
    ("SPK-WAM6501", "Wireless Audio 360 - R6", BT_WIFI_TV, &["Wi-Fi"]),
    ("SPK-WAM7500", "Wireless Audio 360 - R7", BT_WIFI_TV, &["Wi-Fi"]),
    ("SPK-WAM7501", "Wireless Audio 360 - R7", BT_WIFI_TV, &["Wi-Fi"]),
    (
        "SPK-WAM270",
        "Multi room Link Mate",
        &["Bluetooth", "Wi-Fi", "AUX", "Optical", "Coaxial", "TV SoundConnect"],
        &["Wi-Fi", "AUX", "Optical", "Coaxial"],
    ),
    ("HW-H750", "4.1 Ch Soundbar H750", SOUNDBAR_USB, &["Wi-Fi"]),
    ("HW-J650", "Wireless Smart Soundbar with HD Audio", SOUNDBAR_USB, &["Wi-Fi"]),
    ("HW-J651", "Wireless Smart Soundbar with HD Audio", SOUNDBAR, &["Wi-Fi"]),
    ("HW-J660", "4.1 Ch Soundbar J660", SOUNDBAR, &["Wi-Fi"]),
    ("HW-J6510R", "2.1 Ch Curved Soundbar J6510R", SOUNDBAR, &["Wi-Fi"]),
    ("HW-J6512", "6.1 Ch Curved Soundbar J6512", SOUNDBAR, &["Wi-Fi"]),
    ("HW-J7500", "55\" Curved Wireless Soundbar", SOUNDBAR_USB, &["Wi-Fi"]),
    ("HW-J7510", "8.1 Ch Soundbar J7510", SOUNDBAR, &["Wi-Fi"]),
    ("HW-J7511R", "4.1 Ch Curved Soundbar J7511R", SOUNDBAR, &["Wi-Fi"]),
    ("HW-J8500", "65\" Curved Wireless Soundbar", SOUNDBAR_USB, &["Wi-Fi"]),
    ("HW-J8510", "9.1 Ch Curved Soundbar J8510", SOUNDBAR, &["Wi-Fi"]),
    ("HW-J8511R", "5.1 Ch Curved Soundbar J8511R", SOUNDBAR, &["Wi-Fi"]),
    ("HW-K650", "K650 Soundbar", SOUNDBAR_USB, &["Wi-Fi"]),
    ("HW-K860", "Cinematic Soundbar K8", SOUNDBAR_DUAL_HDMI, &["Wi-Fi"]),
    ("HW-K950", "Cinematic Soundbar K9", SOUNDBAR_DUAL_HDMI, &["Wi-Fi"]),
    ("HW-K960", "Cinematic Soundbar K9", SOUNDBAR_DUAL_HDMI, &["Wi-Fi"]),
    ("HW-MS560", "All-in-One Flat Soundbar Sound+ MS5", SOUNDBAR, &["Wi-Fi"]),
    ("HW-MS650", "Sound+ HW-MS650", SOUNDBAR, &["Wi-Fi"]),
    ("HW-MS660", "All-in-One Flat Soundbar Sound+ MS6", SOUNDBAR, &["Wi-Fi"]),
    ("HW-MS661", "All-in-One Flat Soundbar Sound+ MS6", SOUNDBAR, &["Wi-Fi"]),
    ("HW-MS750", "Sound+ HW-MS750 Smart Soundbar", SOUNDBAR_DUAL_HDMI, &["Wi-Fi"]),
    ("HW-MS760", "All-in-One Flat Soundbar Sound+ MS7", SOUNDBAR_DUAL_HDMI, &["Wi-Fi"]),
    ("HW-MS761", "All-in-One Flat Soundbar Sound+ MS7", SOUNDBAR_DUAL_HDMI, &["Wi-Fi"]),
    ("HW-MS6500", "Sound+ HW-MS6500 Wireless Curved Smart Soundbar", SOUNDBAR, &["Wi-Fi"]),
    ("HW-MS6510", "All-in-One Curved Soundbar Sound+ MS6", SOUNDBAR, &["Wi-Fi"]),
    ("HW-MS7500", "HW-J7500R Curved Soundbar", SOUNDBAR_DUAL_HDMI, &["Wi-Fi"]),
    ("HW-N400", "HW-N400 All in One Soundbar", SOUNDBAR, &["Wi-Fi"]),
    (
        "HW-N850",
        "HW-N850 Samsung Harman/Kardon Soundbar with Dolby Atmos",
        SOUNDBAR_NO_AUX_DUAL_HDMI,
        &["Wi-Fi"],
    ),
    ("HW-N960", "7.1.4ch Cinematic Soundbar N9", SOUNDBAR_NO_AUX_DUAL_HDMI, &["Wi-Fi"]),
    ("HW-Q70R", "HW-Q70R Samsung Harman Kardon Soundbar", SOUNDBAR_NO_AUX, &["Wi-Fi"]),
    ("HW-Q76R", "HW-Q76R Dolby Atmos Soundbar", SOUNDBAR_NO_AUX, &["Wi-Fi"]),
    (
        "HW-Q80R",
        "HW-Q80R Samsung Harman Kardon 5.1.2ch Soundbar with Dolby Atmos",
        SOUNDBAR_NO_AUX_DUAL_HDMI,
        &["Wi-Fi"],
    ),
    ("HW-Q86R", "HW-Q86R 5.1.2ch Dolby Atmos Soundbar", SOUNDBAR_NO_AUX_DUAL_HDMI, &["Wi-Fi"]),
    (
        "HW-Q90R",
        "HW-Q90R Samsung Harman Kardon 7.1.4ch Soundbar with Dolby Atmos",
        SOUNDBAR_NO_AUX_DUAL_HDMI,
        &["Wi-Fi"],
    ),
    ("HW-Q96R", "HW-Q96R 7.1.4ch Dolby Atmos Soundbar", SOUNDBAR_NO_AUX_DUAL_HDMI, &["Wi-Fi"]),
    ("HW-Q800T", "HW-Q800T Dolby Atmos Soundbar", SOUNDBAR_NO_AUX, &["Wi-Fi"]),
    ("HW-R550", "HW-R550 Soundbar", SOUNDBAR_NO_AUX, &["Wi-Fi"]),
];

/// Source display names and the API function code for each
const SOURCES: &[(&str, &str)] = &[
    ("AUX", "aux"),
    ("Bluetooth", "bt"),
    ("Coaxial", "coaxial"),
    ("HDMI", "hdmi"),
    ("HDMI 1", "hdmi1"),
    ("HDMI 2", "hdmi2"),
    ("Optical", "optical"),
    ("TV SoundConnect", "soundshare"),
    ("USB", "usb"),
    ("Wi-Fi", "wifi"),
];

/// What a speaker model supports and how its values translate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceProfile {
    /// Model identifier as reported in `MainInfo`, if known
    pub model: Option<String>,
    /// Human readable model name
    pub name: String,
    /// Selectable input sources, by display name
    pub sources: Vec<String>,
    /// Sources a group master can share with its slaves
    pub master_sources: Vec<String>,
    pub max_api_volume: u32,
    pub port: u16,
}

impl Default for DeviceProfile {
    fn default() -> Self {
        Self {
            model: None,
            name: "Unknown model".to_string(),
            sources: BT_WIFI_TV.iter().map(|s| s.to_string()).collect(),
            master_sources: vec!["Wi-Fi".to_string()],
            max_api_volume: DEFAULT_MAX_API_VOLUME,
            port: DEFAULT_PORT,
        }
    }
}

impl DeviceProfile {
    /// Profile for a model identifier, falling back to a generic profile
    pub fn for_model(model: &str) -> Self {
        match MODELS.iter().find(|(id, ..)| *id == model) {
            Some((id, name, sources, master_sources)) => Self {
                model: Some(id.to_string()),
                name: name.to_string(),
                sources: sources.iter().map(|s| s.to_string()).collect(),
                master_sources: master_sources.iter().map(|s| s.to_string()).collect(),
                ..Self::default()
            },
            None => {
                tracing::debug!("No profile for model '{}', using generic profile", model);
                Self::default()
            }
        }
    }

    pub fn is_known(&self) -> bool {
        self.model.is_some()
    }

    /// User volume (0..=100) to API volume
    pub fn encode_volume(&self, volume: u32) -> u32 {
        scale(volume, self.max_api_volume, 100).min(self.max_api_volume)
    }

    /// API volume to user volume (0..=100)
    pub fn decode_volume(&self, volume: u32) -> u32 {
        if self.max_api_volume == 0 {
            return 0;
        }
        scale(volume, 100, self.max_api_volume).min(100)
    }

    /// Validate and encode a user volume
    pub fn checked_volume(&self, volume: u32) -> Result<u32> {
        if volume > 100 {
            return Err(ApiError::range_error("volume", 0, 100, volume));
        }
        Ok(self.encode_volume(volume))
    }

    /// API function code for a source display name supported by this model
    pub fn encode_source(&self, source: &str) -> Result<&'static str> {
        if !self.sources.iter().any(|s| s == source) {
            return Err(ApiError::UnknownSource(source.to_string()));
        }
        encode_source(source).ok_or_else(|| ApiError::UnknownSource(source.to_string()))
    }
}

/// `value * numerator / denominator` without overflowing on device input
fn scale(value: u32, numerator: u32, denominator: u32) -> u32 {
    let scaled = u64::from(value) * u64::from(numerator) / u64::from(denominator.max(1));
    u32::try_from(scaled).unwrap_or(u32::MAX)
}

/// API function code for a source display name
pub fn encode_source(source: &str) -> Option<&'static str> {
    SOURCES
        .iter()
        .find(|(name, _)| *name == source)
        .map(|(_, function)| *function)
}

/// Display name for an API function code, `Unknown` when unrecognised
pub fn decode_source(function: &str) -> &'static str {
    SOURCES
        .iter()
        .find(|(_, code)| *code == function)
        .map(|(name, _)| *name)
        .unwrap_or("Unknown")
}
