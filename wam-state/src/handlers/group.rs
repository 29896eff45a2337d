//! Multiroom grouping

use wam_api::Envelope;

use super::{text, HandlerTable};
use crate::attributes::DeviceAttributes;

pub(super) fn register(table: &mut HandlerTable) {
    table.register_fn("GroupName", |envelope, attributes| {
        attributes.groupname = text(envelope, "groupname");
        true
    });
    table.register_fn("MultispkGroup", multispk_group);
    table.register_fn("Ungroup", ungroup);
}

/// Slaves are not told the group name here and must ask with `GetGroupName`
fn multispk_group(envelope: &Envelope, attributes: &mut DeviceAttributes) -> bool {
    attributes.groupmainip = text(envelope, "groupmainip");
    attributes.groupmainmacaddr = text(envelope, "groupmainmacaddr");
    attributes.groupspknum = text(envelope, "spknum");
    attributes.grouptype = text(envelope, "grouptype");
    attributes.groupname = text(envelope, "groupname");
    true
}

fn ungroup(_: &Envelope, attributes: &mut DeviceAttributes) -> bool {
    attributes.groupmainip = Some("0.0.0.0".to_string());
    attributes.groupmainmacaddr = Some("00:00:00:00:00:00".to_string());
    attributes.groupspknum = Some("1".to_string());
    attributes.grouptype = Some("N".to_string());
    attributes.groupname = Some(String::new());
    true
}
