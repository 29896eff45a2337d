//! Volume, playback status and input selection

use wam_api::Envelope;

use super::{text, update, HandlerTable};
use crate::attributes::DeviceAttributes;

pub(super) fn register(table: &mut HandlerTable) {
    table.register_fn("VolumeLevel", |envelope, attributes| {
        attributes.volume = text(envelope, "volume");
        true
    });
    table.register_fn("MuteStatus", |envelope, attributes| {
        attributes.mute = text(envelope, "mute");
        true
    });
    table.register_fn("RepeatMode", |envelope, attributes| {
        attributes.repeat = text(envelope, "repeat");
        true
    });
    table.register_fn("ShuffleMode", |envelope, attributes| {
        attributes.shuffle = text(envelope, "shuffle");
        true
    });

    for (method, status) in [
        ("StartPlaybackEvent", "play"),
        ("PausePlaybackEvent", "pause"),
        ("StopPlaybackEvent", "stop"),
        ("EndPlaybackEvent", "stop"),
    ] {
        table.register_fn(method, move |_, attributes| {
            attributes.playstatus = Some(status.to_string());
            true
        });
    }

    table.register_fn("PlayStatus", play_status);
    table.register_fn("PlaybackStatus", play_status);
    table.register_fn("CurrentFunc", current_func);
    table.register_fn("ConnectionStatus", connection_status);
}

/// Switch to a streaming service, dropping media info from the previous one
pub(super) fn select_service(attributes: &mut DeviceAttributes, cpname: Option<String>) {
    if cpname != attributes.cpname {
        attributes.reset_media_info();
        attributes.function = Some("wifi".to_string());
        attributes.submode = Some("cp".to_string());
        attributes.cpname = cpname;
    }
}

/// Whether a service report is the speaker's view of our own URL playback
pub(super) fn masks_url_playback(envelope: &Envelope, attributes: &DeviceAttributes) -> bool {
    envelope.get_str("cpname") == Some("Unknown") && attributes.is_url_playback()
}

fn play_status(envelope: &Envelope, attributes: &mut DeviceAttributes) -> bool {
    if masks_url_playback(envelope, attributes) {
        return false;
    }
    update(&mut attributes.playstatus, envelope, "playstatus");
    update(&mut attributes.function, envelope, "function");
    update(&mut attributes.submode, envelope, "submode");
    select_service(attributes, text(envelope, "cpname"));
    true
}

fn current_func(envelope: &Envelope, attributes: &mut DeviceAttributes) -> bool {
    // The speaker reports URL playback as a cp submode
    if envelope.get_str("submode") == Some("cp") && attributes.is_url_playback() {
        return false;
    }

    let function = text(envelope, "function");
    if function != attributes.function {
        attributes.reset_media_info();
        attributes.function = function;
    }
    attributes.submode = text(envelope, "submode");
    attributes.connection = text(envelope, "connection");
    attributes.devicename = text(envelope, "devicename");
    true
}

/// Bluetooth device connected or disconnected
fn connection_status(envelope: &Envelope, attributes: &mut DeviceAttributes) -> bool {
    attributes.reset_source_info();
    attributes.reset_media_info();
    attributes.devicename = text(envelope, "devicename");
    attributes.connection = text(envelope, "connection");
    attributes.function = text(envelope, "function");
    true
}
