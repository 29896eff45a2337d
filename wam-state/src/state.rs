//! User facing speaker state
//!
//! [`SpeakerState`] is what subscribers see: volumes on a 0-100 scale,
//! display names for sources, typed booleans and numbers. It is derived from
//! [`DeviceAttributes`] and a [`DeviceProfile`] and never stored.

use std::collections::BTreeMap;

use serde::Serialize;
use wam_api::{device, DeviceProfile};

use crate::attributes::{DeviceAttributes, Record};

/// Service name the speaker uses for TuneIn presets
pub const TUNEIN: &str = "TuneIn";

/// Equalizer preset stored on the speaker
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EqualizerPreset {
    /// Value to pass when selecting the preset
    pub index: u32,
    pub name: String,
}

impl EqualizerPreset {
    fn from_record(record: &Record) -> Option<Self> {
        Some(Self {
            index: record.get("presetindex")?.parse().ok()?,
            name: record.get("presetname")?.clone(),
        })
    }
}

/// Seven band equalizer setting, each band `-6..=6`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EqualizerValues {
    pub hz_150: i32,
    pub hz_300: i32,
    pub hz_600: i32,
    pub hz_1200: i32,
    pub hz_2500: i32,
    pub hz_5000: i32,
    pub hz_10000: i32,
}

impl EqualizerValues {
    pub fn from_array(values: [i32; 7]) -> Self {
        let [hz_150, hz_300, hz_600, hz_1200, hz_2500, hz_5000, hz_10000] = values;
        Self {
            hz_150,
            hz_300,
            hz_600,
            hz_1200,
            hz_2500,
            hz_5000,
            hz_10000,
        }
    }

    /// Bands from lowest to highest frequency
    pub fn values(&self) -> [i32; 7] {
        [
            self.hz_150,
            self.hz_300,
            self.hz_600,
            self.hz_1200,
            self.hz_2500,
            self.hz_5000,
            self.hz_10000,
        ]
    }

    fn parse(raw: &[Option<String>; 7]) -> Option<Self> {
        let mut values = [0i32; 7];
        for (value, raw) in values.iter_mut().zip(raw) {
            *value = raw.as_deref()?.trim().parse().ok()?;
        }
        Some(Self::from_array(values))
    }
}

/// Favourite station or channel stored for a streaming service
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaPreset {
    pub app: String,
    /// `my` for the first three slots, `speaker` after that
    pub kind: String,
    pub title: String,
    pub description: String,
    pub thumbnail: String,
    /// Position in the preset list, used to play the preset
    pub contentid: String,
    /// Id on the streaming service
    pub mediaid: String,
}

impl MediaPreset {
    fn from_record(app: &str, record: &Record) -> Self {
        let field = |key: &str| record.get(key).cloned().unwrap_or_default();
        Self {
            app: app.to_string(),
            kind: field("kind"),
            title: field("title"),
            description: field("description"),
            thumbnail: field("thumbnail"),
            contentid: field("contentid"),
            mediaid: field("mediaid"),
        }
    }
}

/// Translated speaker state
///
/// Field names are the keys of diff notifications.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SpeakerState {
    pub name: Option<String>,
    pub mac: Option<String>,
    pub model: Option<String>,
    pub device_id: Option<String>,
    pub bt_mac: Option<String>,
    pub software_version: Option<String>,
    pub connection_type: Option<String>,
    pub wifi_channel: Option<String>,
    pub wifi_rssi: Option<String>,
    pub wifi_ssid: Option<String>,
    /// Connected clients, IP address to client identity
    pub clients: Option<BTreeMap<String, String>>,
    pub is_master: Option<bool>,
    pub is_slave: Option<bool>,
    pub group_name: Option<String>,
    /// Only reported while this speaker is a slave
    pub master_ip: Option<String>,
    pub master_mac: Option<String>,
    pub number_of_speakers: Option<u32>,
    /// 0-100
    pub volume: Option<u32>,
    pub muted: Option<bool>,
    /// `play`, `pause`, `stop` or `resume`
    pub state: Option<String>,
    pub repeat_mode: Option<String>,
    pub shuffle_mode: Option<bool>,
    pub source_list: Vec<String>,
    pub source: Option<String>,
    pub app_name: Option<String>,
    pub media_title: Option<String>,
    pub media_artist: Option<String>,
    pub media_album_name: Option<String>,
    pub media_image_url: Option<String>,
    /// Seconds
    pub media_duration: Option<u64>,
    pub sound_mode_list: Vec<EqualizerPreset>,
    pub sound_mode: Option<String>,
    pub equalizer_values: Option<EqualizerValues>,
    pub tunein_presets: Vec<MediaPreset>,
}

impl SpeakerState {
    pub fn from_attributes(attributes: &DeviceAttributes, profile: &DeviceProfile) -> Self {
        let a = attributes;
        let is_slave = flag(&a.grouptype, "S");

        Self {
            name: a.spkname.clone(),
            mac: a.spkmacaddr.clone(),
            model: if profile.is_known() {
                Some(profile.name.clone())
            } else {
                a.spkmodelname.clone()
            },
            device_id: a.device_id.clone(),
            bt_mac: a.btmacaddr.clone(),
            software_version: a.displayversion.clone(),
            connection_type: a.connectiontype.clone(),
            wifi_channel: a.ch.clone(),
            wifi_rssi: a.rssi.clone(),
            wifi_ssid: a.ssid.clone(),
            clients: clients(a.iptable.as_deref()),
            is_master: flag(&a.grouptype, "M"),
            is_slave,
            group_name: a.groupname.clone(),
            master_ip: is_slave.filter(|slave| *slave).and(a.groupmainip.clone()),
            master_mac: is_slave.filter(|slave| *slave).and(a.groupmainmacaddr.clone()),
            number_of_speakers: parse(&a.groupspknum),
            volume: parse(&a.volume).map(|volume| profile.decode_volume(volume)),
            muted: flag(&a.mute, "on"),
            state: a.playstatus.clone(),
            repeat_mode: a.repeat.clone(),
            shuffle_mode: flag(&a.shuffle, "on"),
            source_list: profile.sources.clone(),
            source: non_empty(&a.function).map(|function| device::decode_source(function).to_string()),
            app_name: app_name(a),
            media_title: non_empty(&a.title).or(non_empty(&a.devicename)).map(String::from),
            media_artist: non_empty(&a.artist).or(non_empty(&a.description)).map(String::from),
            media_album_name: a.album.clone(),
            media_image_url: a
                .thumbnail
                .clone()
                .filter(|url| url.starts_with("http")),
            media_duration: parse(&a.tracklength),
            sound_mode_list: a
                .eq_presets
                .iter()
                .flatten()
                .filter_map(EqualizerPreset::from_record)
                .collect(),
            sound_mode: a.presetname.clone(),
            equalizer_values: EqualizerValues::parse(&a.eqvalues),
            tunein_presets: a
                .media_presets
                .get(TUNEIN)
                .into_iter()
                .flatten()
                .map(|record| MediaPreset::from_record(TUNEIN, record))
                .collect(),
        }
    }

    /// True when grouped with at least one other speaker
    pub fn is_grouped(&self) -> Option<bool> {
        let speakers = self.number_of_speakers?;
        let role = self.is_master.zip(self.is_slave)?;
        Some(speakers > 1 && (role.0 || role.1))
    }

    /// Top level fields as a JSON object, the form diffs are computed on
    pub fn to_fields(&self) -> serde_json::Map<String, serde_json::Value> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(fields)) => fields,
            _ => serde_json::Map::new(),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.is_empty())
}

/// `Some(value == expected)` for a reported flag, `None` when unknown
fn flag(value: &Option<String>, expected: &str) -> Option<bool> {
    non_empty(value).map(|value| value == expected)
}

fn parse<T: std::str::FromStr>(value: &Option<String>) -> Option<T> {
    value.as_deref()?.trim().parse().ok()
}

fn clients(iptable: Option<&[Record]>) -> Option<BTreeMap<String, String>> {
    let iptable = iptable.filter(|table| !table.is_empty())?;
    Some(
        iptable
            .iter()
            .map(|client| {
                (
                    client.get("ip").cloned().unwrap_or_else(|| "unknown".to_string()),
                    client.get("@uuid").cloned().unwrap_or_default(),
                )
            })
            .collect(),
    )
}

/// Which app is playing, only meaningful on the Wi-Fi input
fn app_name(a: &DeviceAttributes) -> Option<String> {
    if a.function.as_deref() != Some("wifi") {
        return None;
    }
    match a.submode.as_deref()? {
        "cp" => a.cpname.clone(),
        "dlna" => Some("DLNA".to_string()),
        "url" => Some("URL Playback".to_string()),
        _ => None,
    }
}
