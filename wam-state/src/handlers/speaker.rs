//! Speaker identity and network

use wam_api::Envelope;

use super::{records, text, update, HandlerTable};
use crate::attributes::DeviceAttributes;

pub(super) fn register(table: &mut HandlerTable) {
    table.register_fn("SpkName", spk_name);
    table.register_fn("SoftwareVersion", software_version);
    table.register_fn("DeviceId", device_id);
    table.register_fn("MainInfo", main_info);
    table.register_fn("ApInfo", ap_info);
    table.register_fn("IpInfo", ip_info);
}

fn spk_name(envelope: &Envelope, attributes: &mut DeviceAttributes) -> bool {
    attributes.spkname = text(envelope, "spkname");
    true
}

fn software_version(envelope: &Envelope, attributes: &mut DeviceAttributes) -> bool {
    attributes.displayversion = text(envelope, "displayversion");
    true
}

fn device_id(envelope: &Envelope, attributes: &mut DeviceAttributes) -> bool {
    attributes.device_id = text(envelope, "device_id");
    true
}

/// Second reply to `GetMainInfo`; fields are only present for some roles
fn main_info(envelope: &Envelope, attributes: &mut DeviceAttributes) -> bool {
    update(&mut attributes.spkmacaddr, envelope, "spkmacaddr");
    update(&mut attributes.spkmodelname, envelope, "spkmodelname");
    update(&mut attributes.btmacaddr, envelope, "btmacaddr");
    update(&mut attributes.groupmainip, envelope, "groupmainip");
    update(&mut attributes.groupmainmacaddr, envelope, "groupmainmacaddr");
    update(&mut attributes.groupspknum, envelope, "groupspknum");
    update(&mut attributes.grouptype, envelope, "grouptype");
    true
}

fn ap_info(envelope: &Envelope, attributes: &mut DeviceAttributes) -> bool {
    attributes.ch = text(envelope, "ch");
    attributes.connectiontype = text(envelope, "connectiontype");
    attributes.rssi = text(envelope, "rssi");
    attributes.ssid = text(envelope, "ssid");
    true
}

fn ip_info(envelope: &Envelope, attributes: &mut DeviceAttributes) -> bool {
    attributes.iptable = records(envelope, "iptablelist", "iptable");
    true
}
