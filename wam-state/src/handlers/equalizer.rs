//! Seven band equalizer

use wam_api::Envelope;

use super::{records, text, HandlerTable};
use crate::attributes::DeviceAttributes;

const BANDS: [&str; 7] = [
    "eqvalue1", "eqvalue2", "eqvalue3", "eqvalue4", "eqvalue5", "eqvalue6", "eqvalue7",
];

pub(super) fn register(table: &mut HandlerTable) {
    table.register_fn("7BandEQList", |envelope, attributes| {
        attributes.eq_presets = records(envelope, "presetlist", "preset");
        true
    });
    table.register_fn("CurrentEQMode", eq_mode);
    table.register_fn("7bandEQMode", eq_mode);
    table.register_fn("7bandEQValue", eq_value);
}

/// Active preset and its values
fn eq_mode(envelope: &Envelope, attributes: &mut DeviceAttributes) -> bool {
    attributes.presetname = text(envelope, "presetname");
    attributes.eqvalues = BANDS.map(|band| text(envelope, band));
    true
}

/// Custom values that do not belong to a preset
fn eq_value(envelope: &Envelope, attributes: &mut DeviceAttributes) -> bool {
    attributes.presetname = None;
    attributes.eqvalues = BANDS.map(|band| text(envelope, band));
    true
}
