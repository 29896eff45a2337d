//! Integration tests for wam-state driven by device messages as the
//! speaker sends them.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::json;
use wam_api::{DeviceProfile, Envelope};
use wam_state::{DetailLevel, Notification, StateDiff, StateSynchronizer};

fn uic(method: &str, content: &str) -> Envelope {
    Envelope::decode(&format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><UIC><method>{method}</method><version>1.0</version><speakerip>192.168.1.100</speakerip><user_identifier>public</user_identifier><response result="ok">{content}</response></UIC>"#
    ))
}

fn cpm(method: &str, content: &str) -> Envelope {
    Envelope::decode(&format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><CPM><method>{method}</method><version>0.1</version><speakerip>192.168.1.100</speakerip><user_identifier></user_identifier><response result="ok">{content}</response></CPM>"#
    ))
}

fn record_diffs(sync: &StateSynchronizer) -> Arc<Mutex<Vec<StateDiff>>> {
    let diffs = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&diffs);
    sync.subscribe(
        DetailLevel::Diff,
        Arc::new(move |notification: Notification<'_>| {
            if let Notification::Diff(diff) = notification {
                sink.lock().push(diff.clone());
            }
        }),
    );
    diffs
}

#[test]
fn test_update_sequence_builds_state() {
    let sync = StateSynchronizer::default();

    sync.receive(&uic("SpkName", "<spkname><![CDATA[Kitchen]]></spkname>"));
    sync.receive(&uic(
        "MainInfo",
        "<party>off</party><spkmacaddr>aa:bb:cc:dd:ee:ff</spkmacaddr><spkmodelname>SPK-WAM750</spkmodelname><btmacaddr>11:22:33:44:55:66</btmacaddr><groupmode>none</groupmode><grouptype>N</grouptype><groupspknum>1</groupspknum>",
    ));
    sync.set_profile(DeviceProfile::for_model("SPK-WAM750"));
    sync.receive(&uic("VolumeLevel", "<volume>15</volume>"));
    sync.receive(&uic("MuteStatus", "<mute>off</mute>"));
    sync.receive(&uic(
        "CurrentFunc",
        "<function>wifi</function><submode>cp</submode><connection></connection><devicename></devicename>",
    ));
    sync.receive(&cpm(
        "RadioInfo",
        "<cpname>TuneIn</cpname><root>Favorites</root><presetindex>0</presetindex><title>Jazz FM</title><description>Smooth</description><thumbnail>http://example.com/logo.png</thumbnail><playstatus>play</playstatus>",
    ));

    let state = sync.state();
    assert_eq!(state.name.as_deref(), Some("Kitchen"));
    assert_eq!(state.model.as_deref(), Some("Shape M7"));
    assert!(state.source_list.contains(&"AUX".to_string()));
    assert_eq!(state.volume, Some(50));
    assert_eq!(state.muted, Some(false));
    assert_eq!(state.source.as_deref(), Some("Wi-Fi"));
    assert_eq!(state.app_name.as_deref(), Some("TuneIn"));
    assert_eq!(state.media_title.as_deref(), Some("Jazz FM"));
    assert_eq!(state.media_artist.as_deref(), Some("Smooth"));
    assert_eq!(state.media_image_url.as_deref(), Some("http://example.com/logo.png"));
    assert_eq!(state.state.as_deref(), Some("play"));
    assert_eq!(state.is_grouped(), Some(false));
    assert!(sync.attributes().last_seen.is_some());
}

#[test]
fn test_volume_diff_is_translated() {
    let sync = StateSynchronizer::default();
    sync.receive(&uic("VolumeLevel", "<volume>3</volume>"));
    let diffs = record_diffs(&sync);

    sync.receive(&uic("VolumeLevel", "<volume>6</volume>"));

    let expected = json!({"volume": 20}).as_object().cloned().unwrap();
    assert_eq!(*diffs.lock(), vec![expected]);
}

#[test]
fn test_url_playback_survives_service_reports() {
    let sync = StateSynchronizer::default();
    sync.receive(&uic("UrlPlayback", ""));
    sync.apply_synthetic("play url", |attributes| {
        attributes.title = Some("Doorbell".to_string());
        attributes.tracklength = Some("0".to_string());
    });
    let diffs = record_diffs(&sync);

    // While a URL plays the speaker reports an unknown service, which must
    // not replace the synthetic media info
    sync.receive(&cpm("RadioInfo", "<cpname>Unknown</cpname><playstatus>stop</playstatus>"));
    sync.receive(&uic("PlayStatus", "<cpname>Unknown</cpname><playstatus>stop</playstatus>"));
    sync.receive(&uic("CurrentFunc", "<function>wifi</function><submode>cp</submode>"));

    let state = sync.state();
    assert_eq!(state.app_name.as_deref(), Some("URL Playback"));
    assert_eq!(state.media_title.as_deref(), Some("Doorbell"));
    assert_eq!(state.state.as_deref(), Some("play"));
    assert!(diffs.lock().is_empty());

    sync.receive(&uic("StopPlaybackEvent", "<playtime>1200</playtime>"));
    assert_eq!(sync.state().state.as_deref(), Some("stop"));
    assert_eq!(diffs.lock().len(), 1);
}

#[test]
fn test_grouping_lifecycle() {
    let sync = StateSynchronizer::default();
    let pings = Arc::new(Mutex::new(0usize));
    let counter = Arc::clone(&pings);
    sync.subscribe(
        DetailLevel::Ping,
        Arc::new(move |_: Notification<'_>| *counter.lock() += 1),
    );

    sync.receive(&uic(
        "MultispkGroup",
        "<groupname>Downstairs</groupname><groupmainip>192.168.1.10</groupmainip><groupmainmacaddr>aa:aa:aa:aa:aa:aa</groupmainmacaddr><grouptype>S</grouptype><spknum>2</spknum>",
    ));
    let grouped = sync.state();
    assert_eq!(grouped.is_slave, Some(true));
    assert_eq!(grouped.master_ip.as_deref(), Some("192.168.1.10"));
    assert_eq!(grouped.group_name.as_deref(), Some("Downstairs"));
    assert_eq!(grouped.number_of_speakers, Some(2));

    sync.receive(&uic("Ungroup", ""));
    let single = sync.state();
    assert_eq!(single.is_slave, Some(false));
    assert_eq!(single.master_ip, None);
    assert_eq!(single.is_grouped(), Some(false));

    assert_eq!(*pings.lock(), 2);
}

#[test]
fn test_presets_and_equalizer() {
    let sync = StateSynchronizer::default();

    sync.receive(&cpm(
        "PresetList",
        r#"<cpname>TuneIn</cpname><listcount>2</listcount><presetlisttype>1</presetlisttype><presetlist><preset><kind>my</kind><title>Jazz FM</title><description>Smooth</description><thumbnail>http://a/1.png</thumbnail><contentid>0</contentid><mediaid>s1</mediaid></preset><preset><kind>speaker</kind><title>News</title><description>Talk</description><thumbnail>http://a/2.png</thumbnail><contentid>3</contentid><mediaid>s2</mediaid></preset></presetlist>"#,
    ));
    sync.receive(&uic(
        "7BandEQList",
        r#"<listcount>1</listcount><presetlistcount>4</presetlistcount><presetlist><preset index="0"><presetindex>0</presetindex><presetname>None</presetname></preset></presetlist>"#,
    ));
    sync.receive(&uic(
        "CurrentEQMode",
        "<presetindex>0</presetindex><presetname>None</presetname><eqvalue1>0</eqvalue1><eqvalue2>0</eqvalue2><eqvalue3>0</eqvalue3><eqvalue4>0</eqvalue4><eqvalue5>0</eqvalue5><eqvalue6>0</eqvalue6><eqvalue7>0</eqvalue7>",
    ));

    let state = sync.state();
    assert_eq!(state.tunein_presets.len(), 2);
    assert_eq!(state.tunein_presets[1].kind, "speaker");
    assert_eq!(state.tunein_presets[1].contentid, "3");
    assert_eq!(state.sound_mode_list.len(), 1);
    assert_eq!(state.sound_mode.as_deref(), Some("None"));
    assert_eq!(state.equalizer_values.map(|eq| eq.values()), Some([0; 7]));
}
