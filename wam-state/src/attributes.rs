//! Raw device attributes
//!
//! Values are kept exactly as the speaker reported them. Translation to
//! user facing values happens in [`crate::SpeakerState`], so a handler never
//! has to know about volume scales or source names.

use std::collections::BTreeMap;

use chrono::{DateTime, Local};
use serde::Serialize;

/// One entry of a list the speaker reports, e.g. a preset or a client
pub type Record = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DeviceAttributes {
    // Speaker
    pub spkname: Option<String>,
    pub spkmacaddr: Option<String>,
    pub spkmodelname: Option<String>,
    pub device_id: Option<String>,
    pub btmacaddr: Option<String>,
    pub displayversion: Option<String>,
    /// `ethernet` or `wireless`
    pub connectiontype: Option<String>,
    /// Wi-Fi channel, `0` on ethernet
    pub ch: Option<String>,
    pub rssi: Option<String>,
    pub ssid: Option<String>,
    /// Clients connected to the speaker, each with `ip` and `@uuid`
    pub iptable: Option<Vec<Record>>,

    // Grouping
    /// `M`, `S` or `N` for master, slave and ungrouped
    pub grouptype: Option<String>,
    pub groupname: Option<String>,
    pub groupmainip: Option<String>,
    pub groupmainmacaddr: Option<String>,
    pub groupspknum: Option<String>,

    // Player
    /// API volume, `0..=max_api_volume`
    pub volume: Option<String>,
    /// `on` when muted
    pub mute: Option<String>,
    /// `play`, `pause`, `stop` or `resume`
    pub playstatus: Option<String>,
    /// `one`, `all` or `off`
    pub repeat: Option<String>,
    pub shuffle: Option<String>,

    // Source
    pub function: Option<String>,
    /// `cp`, `dlna`, `url` or `subdevice`
    pub submode: Option<String>,
    /// Bluetooth connection state
    pub connection: Option<String>,
    /// Name of a connected Bluetooth device
    pub devicename: Option<String>,
    /// Streaming service playing on the speaker
    pub cpname: Option<String>,

    // Media
    pub title: Option<String>,
    pub description: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub thumbnail: Option<String>,
    /// Track length in whole seconds
    pub tracklength: Option<String>,

    // Equalizer
    pub eq_presets: Option<Vec<Record>>,
    pub presetname: Option<String>,
    /// Seven band values from 150 Hz to 10 kHz, each `-6..=6`
    pub eqvalues: [Option<String>; 7],

    /// Media presets keyed by service name
    pub media_presets: BTreeMap<String, Vec<Record>>,

    /// When the speaker last sent a successful message
    pub last_seen: Option<DateTime<Local>>,
}

impl DeviceAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget which input is selected
    pub fn reset_source_info(&mut self) {
        self.function = None;
        self.submode = None;
        self.connection = None;
        self.devicename = None;
        self.cpname = None;
    }

    /// Forget what is playing
    pub fn reset_media_info(&mut self) {
        self.cpname = None;
        self.playstatus = None;
        self.title = None;
        self.description = None;
        self.artist = None;
        self.album = None;
        self.thumbnail = None;
        self.tracklength = None;
    }

    /// True while a URL started by this SDK is playing
    ///
    /// The speaker reports such streams as an `Unknown` service, which
    /// would otherwise wipe the synthetic media info.
    pub fn is_url_playback(&self) -> bool {
        self.submode.as_deref() == Some("url")
    }
}
