//! Per-method message handlers
//!
//! Each handler folds one message type into [`DeviceAttributes`] and reports
//! whether the message carried state worth diffing. Acknowledgements and
//! messages this SDK does not track are registered as no-ops so they are not
//! mistaken for unknown methods.

mod equalizer;
mod group;
mod media;
mod player;
mod speaker;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use wam_api::{AttributeValue, Envelope};

use crate::attributes::{DeviceAttributes, Record};

/// Folds a message into the attributes, returning true when it carries state
pub type Handler = Arc<dyn Fn(&Envelope, &mut DeviceAttributes) -> bool + Send + Sync>;

/// Messages the speaker sends that carry nothing tracked here
const ACKNOWLEDGEMENTS: &[&str] = &[
    "AcmMode",
    "AddCustomEQMode",
    "AddSongsToMultiQueueResult",
    "AlarmInfo",
    "AlarmOnOff",
    "AlarmSoundList",
    "AllAlarmInfo",
    "AudioUI",
    "AutoUpdate",
    "AvSourceAddedEvent",
    "AvSourceAll",
    "AvSourceDeletedEvent",
    "BatteryStatus",
    "ChVolMultich",
    "CpChanged",
    "CpInfo",
    "CpList",
    "DMSAddedEvent",
    "DMSDeletedEvent",
    "DelAlarm",
    "DelCustomEQMode",
    "DelSongsFromMultiQueueResult",
    "DmsList",
    "EQDrc",
    "EQMode",
    "GlobalSearch",
    "KPIValue",
    "LastMusicEvent",
    "LedStatus",
    "LocaleChange",
    "MediaBufferEndEvent",
    "MediaBufferStartEvent",
    "MultiHopInfo",
    "MultiQueueList",
    "MultichGroup",
    "MultispkGroupStartEvent",
    "MusicList",
    "MusicPlayTime",
    "QueryList",
    "RadioList",
    "RadioSelected",
    "RequestDeviceInfo",
    "Reset7bandEQValue",
    "SavePreset",
    "SleepTime",
    "SpeakerBuyer",
    "SpeakerTime",
    "SpeakerWifiRegion",
    "StationData",
    "SubSoftwareVersion",
    "UniversalSearchMusicList",
    "ValidAppVersion",
];

/// Method name to handler lookup
#[derive(Clone, Default)]
pub struct HandlerTable {
    handlers: HashMap<String, Handler>,
}

impl HandlerTable {
    /// Empty table; every message will be treated as unknown
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with every handler this crate knows about
    pub fn standard() -> Self {
        let mut table = Self::new();
        speaker::register(&mut table);
        player::register(&mut table);
        media::register(&mut table);
        group::register(&mut table);
        equalizer::register(&mut table);
        for method in ACKNOWLEDGEMENTS {
            table.register_fn(method, |_, _| false);
        }
        table
    }

    /// Add or replace the handler for `method`
    pub fn register(&mut self, method: &str, handler: Handler) {
        if self.handlers.insert(method.to_string(), handler).is_some() {
            tracing::debug!("Replaced handler for '{}'", method);
        }
    }

    pub(crate) fn register_fn(
        &mut self,
        method: &str,
        handler: impl Fn(&Envelope, &mut DeviceAttributes) -> bool + Send + Sync + 'static,
    ) {
        self.register(method, Arc::new(handler));
    }

    pub fn get(&self, method: &str) -> Option<&Handler> {
        self.handlers.get(method)
    }

    pub fn contains(&self, method: &str) -> bool {
        self.handlers.contains_key(method)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for HandlerTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        methods.sort_unstable();
        f.debug_struct("HandlerTable").field("methods", &methods).finish()
    }
}

/// Text field of the payload, `None` when missing or not text
fn text(envelope: &Envelope, key: &str) -> Option<String> {
    envelope.get_str(key).map(String::from)
}

/// Overwrite `target` only when the message carries `key`
fn update(target: &mut Option<String>, envelope: &Envelope, key: &str) {
    if let Some(value) = text(envelope, key) {
        *target = Some(value);
    }
}

/// List under `key/subkey` as records, `None` when the list is absent
fn records(envelope: &Envelope, key: &str, subkey: &str) -> Option<Vec<Record>> {
    envelope.get_subkey(key, subkey).map(|value| {
        value
            .items()
            .into_iter()
            .map(AttributeValue::text_fields)
            .collect()
    })
}
