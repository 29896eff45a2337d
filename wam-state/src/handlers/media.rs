//! Now playing metadata and media presets

use wam_api::Envelope;

use super::player::{masks_url_playback, select_service};
use super::{records, text, update, HandlerTable};
use crate::attributes::DeviceAttributes;

pub(super) fn register(table: &mut HandlerTable) {
    table.register_fn("MusicInfo", music_info);
    table.register_fn("RadioInfo", radio_info);
    table.register_fn("UrlPlayback", url_playback);
    table.register_fn("PresetList", preset_list);
    table.register_fn("SelectCpService", select_cp_service);
}

/// Local playback such as DLNA
fn music_info(envelope: &Envelope, attributes: &mut DeviceAttributes) -> bool {
    update(&mut attributes.album, envelope, "album");
    update(&mut attributes.artist, envelope, "artist");
    update(&mut attributes.thumbnail, envelope, "thumbnail");
    update(&mut attributes.title, envelope, "title");
    let length = envelope.get_str("timelength").map_or(0, timelength_to_secs);
    attributes.tracklength = Some(length.to_string());
    true
}

/// Streaming service playback (TuneIn, Spotify, ...)
fn radio_info(envelope: &Envelope, attributes: &mut DeviceAttributes) -> bool {
    if masks_url_playback(envelope, attributes) {
        return false;
    }
    select_service(attributes, text(envelope, "cpname"));
    update(&mut attributes.playstatus, envelope, "playstatus");
    update(&mut attributes.album, envelope, "album");
    update(&mut attributes.artist, envelope, "artist");
    update(&mut attributes.description, envelope, "description");
    update(&mut attributes.thumbnail, envelope, "thumbnail");
    update(&mut attributes.title, envelope, "title");
    update(&mut attributes.tracklength, envelope, "tracklength");
    true
}

fn url_playback(_: &Envelope, attributes: &mut DeviceAttributes) -> bool {
    attributes.reset_source_info();
    attributes.reset_media_info();
    attributes.function = Some("wifi".to_string());
    attributes.submode = Some("url".to_string());
    attributes.playstatus = Some("play".to_string());
    attributes.cpname = Some("Unknown".to_string());
    true
}

fn preset_list(envelope: &Envelope, attributes: &mut DeviceAttributes) -> bool {
    let Some(cpname) = text(envelope, "cpname") else {
        return false;
    };
    match records(envelope, "presetlist", "preset") {
        Some(presets) if !presets.is_empty() => {
            attributes.media_presets.insert(cpname, presets);
            true
        }
        _ => false,
    }
}

/// A service was selected for browsing; only relevant if it is playing
fn select_cp_service(envelope: &Envelope, attributes: &mut DeviceAttributes) -> bool {
    if text(envelope, "cpname") != attributes.cpname {
        return false;
    }
    if envelope.get_str("signinstatus") == Some("0") {
        attributes.reset_media_info();
    }
    true
}

/// `HH:MM:SS.mmm` to whole seconds, 0 when unparsable
pub(crate) fn timelength_to_secs(timelength: &str) -> u64 {
    let parts: Vec<&str> = timelength.split([':', '.']).collect();
    let weights = [3600.0, 60.0, 1.0, 0.001];
    let mut total = 0.0;
    for (part, weight) in parts.iter().zip(weights) {
        match part.trim().parse::<u64>() {
            Ok(value) => total += value as f64 * weight,
            Err(_) => return 0,
        }
    }
    total as u64
}
