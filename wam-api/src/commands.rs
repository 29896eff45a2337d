//! Catalogue of device commands
//!
//! Each function returns a ready-to-send [`Command`]. The namespace, power-on
//! flag, expected reply and timeout multiple follow what the speakers
//! actually answer with.

use crate::command::{Arg, Command};

// Speaker information

pub fn get_software_version() -> Command {
    Command::uic("GetSoftwareVersion").expecting("SoftwareVersion")
}

pub fn get_spk_name() -> Command {
    Command::uic("GetSpkName").expecting("SpkName")
}

pub fn set_spk_name(name: &str) -> Command {
    Command::uic("SetSpkName")
        .with_arg(Arg::cdata("spkname", name))
        .expecting("SpkName")
}

/// Model, MAC addresses and group membership
pub fn get_main_info() -> Command {
    Command::uic("GetMainInfo").expecting("MainInfo")
}

pub fn get_device_id() -> Command {
    Command::cpm("GetDeviceId").expecting("DeviceId")
}

/// Wi-Fi access point the speaker is connected to
pub fn get_ap_info() -> Command {
    Command::uic("GetApInfo").expecting("ApInfo")
}

// Player

pub fn get_volume() -> Command {
    Command::uic("GetVolume").expecting("VolumeLevel")
}

/// Set volume in API units (see [`crate::DeviceProfile::encode_volume`])
pub fn set_volume(volume: u32) -> Command {
    Command::uic("SetVolume")
        .with_power_on()
        .with_arg(Arg::dec("volume", i64::from(volume)))
        .expecting("VolumeLevel")
}

pub fn get_mute() -> Command {
    Command::uic("GetMute").expecting("MuteStatus")
}

pub fn set_mute(mute: bool) -> Command {
    Command::uic("SetMute")
        .with_power_on()
        .with_arg(Arg::str("mute", on_off(mute)))
        .expecting("MuteStatus")
}

pub fn get_shuffle_mode() -> Command {
    Command::uic("GetShuffleMode").expecting("ShuffleMode")
}

pub fn set_shuffle_mode(shuffle: bool) -> Command {
    Command::uic("SetShuffleMode")
        .with_arg(Arg::str("shufflemode", on_off(shuffle)))
        .expecting("ShuffleMode")
}

pub fn get_repeat_mode() -> Command {
    Command::uic("GetRepeatMode").expecting("RepeatMode")
}

/// `mode` is one of `one`, `all` or `off`
pub fn set_repeat_mode(mode: &str) -> Command {
    Command::uic("SetRepeatMode")
        .with_arg(Arg::str("repeatmode", mode))
        .expecting("RepeatMode")
}

/// Content provider selected for CPM operations
pub fn get_cp_info() -> Command {
    Command::cpm("GetCpInfo").expecting("CpInfo")
}

/// Select input source by API function code (`wifi`, `bt`, `aux`...)
pub fn set_func(function: &str) -> Command {
    Command::uic("SetFunc")
        .with_power_on()
        .with_arg(Arg::str("function", function))
        .expecting("CurrentFunc")
}

pub fn get_func() -> Command {
    Command::uic("GetFunc").expecting("CurrentFunc")
}

/// Playback control for DLNA and URL playback, `resume` or `pause`
pub fn set_uic_playback_control(action: &str) -> Command {
    Command::uic("SetPlaybackControl")
        .with_power_on()
        .with_arg(Arg::str("playbackcontrol", action))
        .expecting("PlaybackStatus")
}

/// Playback control for content provider apps, `play`, `pause` or `stop`
pub fn set_cpm_playback_control(action: &str) -> Command {
    Command::cpm("SetPlaybackControl")
        .with_power_on()
        .with_arg(Arg::str("playbackcontrol", action))
        .expecting("PlaybackStatus")
        .with_timeout_multiple(5)
}

/// `next` or `previous`; the device sends no dedicated reply
pub fn set_trick_mode(mode: &str) -> Command {
    Command::uic("SetTrickMode")
        .with_power_on()
        .with_arg(Arg::str("trickmode", mode))
}

pub fn get_radio_info() -> Command {
    Command::cpm("GetRadioInfo").expecting("RadioInfo")
}

pub fn get_music_info() -> Command {
    Command::uic("GetMusicInfo").expecting("MusicInfo")
}

/// Play an audio file or stream from a URL
pub fn set_url_playback(url: &str, buffer_size: i64, seek_time: i64, resume: bool) -> Command {
    Command::uic("SetUrlPlayback")
        .with_arg(Arg::cdata("url", url))
        .with_arg(Arg::dec("buffersize", buffer_size))
        .with_arg(Arg::dec("seektime", seek_time))
        .with_arg(Arg::dec("resume", i64::from(resume)))
        .expecting("UrlPlayback")
        .with_timeout_multiple(5)
}

// Presets

/// Select TuneIn before sending TuneIn commands
pub fn set_select_radio() -> Command {
    Command::cpm("SetSelectRadio").expecting("RadioSelected")
}

pub fn get_preset_list(start_index: i64, list_count: i64) -> Command {
    Command::cpm("GetPresetList")
        .with_arg(Arg::dec("startindex", start_index))
        .with_arg(Arg::dec("listcount", list_count))
        .expecting("PresetList")
}

/// `preset_type` is 1 for speaker presets, 0 for "my" presets
pub fn set_play_preset(preset_type: i64, preset_index: i64) -> Command {
    Command::cpm("SetPlayPreset")
        .with_arg(Arg::dec("presettype", preset_type))
        .with_arg(Arg::dec("presetindex", preset_index))
        .expecting("RadioInfo")
        .with_timeout_multiple(5)
}

/// Play one or several items from a browsed content list
pub fn set_play_select(item_ids: &[i64]) -> Command {
    let arg = match item_ids {
        [single] => Arg::dec("selectitemid", *single),
        many => Arg::dec_array("selectitemids", many.to_vec()),
    };
    Command::cpm("SetPlaySelect").with_arg(arg)
}

// Grouping

pub fn get_group_name() -> Command {
    Command::uic("GetGroupName").expecting("GroupName")
}

/// Address of a speaker joining a group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupMember {
    pub ip: String,
    pub mac: String,
}

/// Sent to the speaker that becomes group master
pub fn set_multispk_group_main(
    name: &str,
    speaker_count: i64,
    source_mac: &str,
    source_name: &str,
    members: &[GroupMember],
) -> Command {
    let mut command = Command::uic("SetMultispkGroup")
        .with_power_on()
        .with_arg(Arg::cdata("name", name))
        .with_arg(Arg::dec("index", 1))
        .with_arg(Arg::str("type", "main"))
        .with_arg(Arg::dec("spknum", speaker_count))
        .with_arg(Arg::str("audiosourcemacaddr", source_mac))
        .with_arg(Arg::cdata("audiosourcename", source_name))
        .with_arg(Arg::str("audiosourcetype", "speaker"));
    for member in members {
        command = command
            .with_arg(Arg::str("subspkip", member.ip.as_str()))
            .with_arg(Arg::str("subspkmacaddr", member.mac.as_str()));
    }
    command.expecting("MultispkGroup").with_timeout_multiple(3)
}

/// Sent to each slave of a new group
pub fn set_multispk_group_sub(
    name: &str,
    speaker_count: i64,
    main_ip: &str,
    main_mac: &str,
) -> Command {
    Command::uic("SetMultispkGroup")
        .with_power_on()
        .with_arg(Arg::cdata("name", name))
        .with_arg(Arg::dec("index", 1))
        .with_arg(Arg::str("type", "sub"))
        .with_arg(Arg::dec("spknum", speaker_count))
        .with_arg(Arg::str("mainspkip", main_ip))
        .with_arg(Arg::str("mainspkmacaddr", main_mac))
        .with_timeout_multiple(3)
}

pub fn set_ungroup() -> Command {
    Command::uic("SetUngroup").expecting("Ungroup")
}

// Equalizer

pub fn get_current_eq_mode() -> Command {
    Command::uic("GetCurrentEQMode").expecting("CurrentEQMode")
}

pub fn get_7band_eq_list() -> Command {
    Command::uic("Get7BandEQList").expecting("7BandEQList")
}

pub fn set_7band_eq_mode(preset_index: i64) -> Command {
    Command::uic("Set7bandEQMode")
        .with_arg(Arg::dec("presetindex", preset_index))
        .expecting("7bandEQMode")
}

/// Band values range from -6 to 6, lowest band (150 Hz) first
pub fn set_7band_eq_value(preset_index: i64, bands: [i64; 7]) -> Command {
    let mut command =
        Command::uic("Set7bandEQValue").with_arg(Arg::dec("presetindex", preset_index));
    for (n, value) in bands.iter().enumerate() {
        command = command.with_arg(Arg::dec(&format!("eqvalue{}", n + 1), *value));
    }
    command.expecting("7bandEQValue")
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{ArgValue, Namespace};

    #[test]
    fn test_set_volume() {
        let command = set_volume(15);
        assert_eq!(command.namespace(), Namespace::Uic);
        assert!(command.power_on());
        assert_eq!(command.expected_reply(), Some("VolumeLevel"));
        assert!(command.markup().contains(r#"<p type="dec" name="volume" val="15"/>"#));
    }

    #[test]
    fn test_set_mute_encodes_on_off() {
        assert!(set_mute(true).markup().contains(r#"val="on""#));
        assert!(set_mute(false).markup().contains(r#"val="off""#));
    }

    #[test]
    fn test_cpm_commands() {
        assert_eq!(get_device_id().namespace(), Namespace::Cpm);
        assert_eq!(get_radio_info().namespace(), Namespace::Cpm);
        assert_eq!(set_cpm_playback_control("stop").timeout_multiple(), 5);
    }

    #[test]
    fn test_trick_mode_expects_nothing() {
        assert_eq!(set_trick_mode("next").expected_reply(), None);
    }

    #[test]
    fn test_url_playback() {
        let command = set_url_playback("http://example.com/a.mp3", 0, 0, false);
        assert_eq!(command.timeout_multiple(), 5);
        assert_eq!(command.args()[0].value, ArgValue::Cdata("http://example.com/a.mp3".to_string()));
        assert_eq!(command.args()[3].value, ArgValue::Dec(0));
    }

    #[test]
    fn test_play_select_single_and_many() {
        let single = set_play_select(&[4]);
        assert_eq!(single.args()[0].name, "selectitemid");

        let many = set_play_select(&[4, 5]);
        assert_eq!(many.args()[0].name, "selectitemids");
        assert_eq!(many.args()[0].value, ArgValue::DecArray(vec![4, 5]));
    }

    #[test]
    fn test_group_main_lists_members() {
        let members = vec![
            GroupMember { ip: "10.0.0.2".to_string(), mac: "aa".to_string() },
            GroupMember { ip: "10.0.0.3".to_string(), mac: "bb".to_string() },
        ];
        let command = set_multispk_group_main("Downstairs", 3, "cc", "Kitchen", &members);
        let sub_ips: Vec<_> = command
            .args()
            .iter()
            .filter(|arg| arg.name == "subspkip")
            .map(|arg| arg.value.clone())
            .collect();

        assert_eq!(
            sub_ips,
            vec![
                ArgValue::Str("10.0.0.2".to_string()),
                ArgValue::Str("10.0.0.3".to_string())
            ]
        );
        assert_eq!(command.timeout_multiple(), 3);
        assert_eq!(command.expected_reply(), Some("MultispkGroup"));
    }

    #[test]
    fn test_eq_values() {
        let command = set_7band_eq_value(2, [1, 2, 3, 0, -1, -2, -3]);
        assert_eq!(command.args().len(), 8);
        assert!(command.markup().contains(r#"name="eqvalue7" val="-3""#));
    }
}
