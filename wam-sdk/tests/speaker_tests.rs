//! End-to-end tests for the `Speaker` handle against a simulated speaker.
//!
//! Covers the update sequence, translated setters and getters, synthetic
//! state after URL playback and feature gating.


use std::time::Duration;

use test_helpers::{arg, init_tracing, Device, MockSpeaker};
use tokio::sync::mpsc;
use wam_client::ClientConfig;
use wam_sdk::{
    DetailLevel, Feature, Notification, SdkError, Speaker, SpeakerConfig, StateDiff, UrlMediaItem,
};

fn config(mock: &MockSpeaker) -> SpeakerConfig {
    SpeakerConfig::new().with_client(
        ClientConfig::new()
            .with_port(mock.port())
            .with_user("test-user")
            .with_request_timeout(Duration::from_secs(5)),
    )
}

async fn connected(device: Device) -> (MockSpeaker, Speaker) {
    init_tracing();
    let mock = MockSpeaker::start(device).await;
    let speaker = Speaker::new("127.0.0.1", config(&mock)).unwrap();
    speaker.connect().await.unwrap();
    (mock, speaker)
}

async fn updated(device: Device) -> (MockSpeaker, Speaker) {
    let (mock, speaker) = connected(device).await;
    speaker.update().await.unwrap();
    (mock, speaker)
}

fn diff_channel(speaker: &Speaker) -> mpsc::UnboundedReceiver<StateDiff> {
    let (tx, rx) = mpsc::unbounded_channel();
    speaker.subscribe(DetailLevel::Diff, move |notification: Notification<'_>| {
        if let Notification::Diff(diff) = notification {
            let _ = tx.send(diff.clone());
        }
    });
    rx
}

async fn next_diff(rx: &mut mpsc::UnboundedReceiver<StateDiff>) -> StateDiff {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("no notification")
        .expect("channel closed")
}

#[tokio::test]
async fn test_update_populates_state() {
    let (mock, speaker) = updated(Device::default()).await;
    let state = speaker.state();

    assert_eq!(state.name.as_deref(), Some("Kitchen"));
    assert_eq!(state.model.as_deref(), Some("Shape M7"));
    assert_eq!(state.mac.as_deref(), Some("aa:bb:cc:dd:ee:ff"));
    assert_eq!(state.software_version.as_deref(), Some("1002.0"));
    assert_eq!(state.wifi_ssid.as_deref(), Some("Home"));
    assert_eq!(state.is_master, Some(false));
    assert_eq!(state.is_slave, Some(false));
    assert_eq!(state.volume, Some(50));
    assert_eq!(state.muted, Some(false));
    assert_eq!(state.source.as_deref(), Some("Wi-Fi"));
    assert_eq!(state.app_name.as_deref(), Some("TuneIn"));
    assert_eq!(state.media_title.as_deref(), Some("News"));
    assert_eq!(state.sound_mode.as_deref(), Some("Pop"));
    assert_eq!(state.sound_mode_list.len(), 3);
    assert_eq!(state.tunein_presets.len(), 2);
    assert!(speaker.profile().is_known());

    let methods = mock.methods();
    assert_eq!(methods.first().map(String::as_str), Some("GetMainInfo"));
    assert!(!methods.contains(&"GetGroupName".to_string()));
    assert!(methods.contains(&"GetRadioInfo".to_string()));
    assert!(!methods.contains(&"GetMusicInfo".to_string()));
}

#[tokio::test]
async fn test_learned_model_is_announced() {
    let (_mock, speaker) = connected(Device::default()).await;
    let mut diffs = diff_channel(&speaker);

    speaker.update().await.unwrap();

    let mut last = None;
    while let Ok(diff) = diffs.try_recv() {
        last = Some(diff);
    }
    let last = last.unwrap();
    assert_eq!(last["model"], "Shape M7");
    assert!(last["source_list"]
        .as_array()
        .unwrap()
        .iter()
        .any(|source| source == "AUX"));
}

#[tokio::test]
async fn test_grouped_speaker_asks_for_group_name() {
    let device = Device {
        grouptype: "M".to_string(),
        ..Device::default()
    };
    let (mock, speaker) = updated(device).await;

    assert!(mock.methods().contains(&"GetGroupName".to_string()));
    assert_eq!(speaker.state().group_name.as_deref(), Some("Downstairs"));
    assert!(!speaker.supported_features().contains(&Feature::SetName));
}

#[tokio::test]
async fn test_set_volume_uses_api_scale() {
    let (mock, speaker) = updated(Device::default()).await;

    let reply = speaker.set_volume(80).await.unwrap();

    assert_eq!(reply.method, "VolumeLevel");
    assert_eq!(mock.device().volume, 24);
    assert_eq!(speaker.state().volume, Some(80));
    assert_eq!(speaker.get_volume().await.unwrap(), 80);
}

#[tokio::test]
async fn test_pushed_volume_notifies_diff_subscribers() {
    let (mock, speaker) = updated(Device::default()).await;
    let mut diffs = diff_channel(&speaker);

    mock.push("VolumeLevel", "<volume>6</volume>");

    let diff = next_diff(&mut diffs).await;
    assert_eq!(diff.len(), 1);
    assert_eq!(diff["volume"], 20);
}

#[tokio::test]
async fn test_play_url_applies_item_and_unmutes() {
    let device = Device {
        muted: true,
        ..Device::default()
    };
    let (mock, speaker) = updated(device).await;
    assert_eq!(speaker.state().muted, Some(true));
    let mut diffs = diff_channel(&speaker);

    let item = UrlMediaItem::new("http://stream.example.com/live/morning.mp3")
        .with_title("Morning show")
        .with_duration(90)
        .with_thumbnail("http://img.example.com/m.png");
    speaker.play_url(&item).await.unwrap();

    let state = speaker.state();
    assert_eq!(state.app_name.as_deref(), Some("URL Playback"));
    assert_eq!(state.media_title.as_deref(), Some("Morning show"));
    assert_eq!(state.media_artist.as_deref(), Some("morning.mp3"));
    assert_eq!(state.media_duration, Some(90));
    assert_eq!(state.media_image_url.as_deref(), Some("http://img.example.com/m.png"));
    assert_eq!(state.muted, Some(false));
    assert!(!mock.device().muted);

    let playback = mock
        .requests()
        .into_iter()
        .find(|markup| markup.contains("SetUrlPlayback"))
        .unwrap();
    assert_eq!(arg(&playback, "url"), item.url);

    let mut saw_title = false;
    while let Ok(diff) = diffs.try_recv() {
        saw_title |= diff.get("media_title").and_then(|v| v.as_str()) == Some("Morning show");
    }
    assert!(saw_title);
}

#[tokio::test]
async fn test_pause_during_url_playback_reports_stop() {
    let (mock, speaker) = updated(Device::default()).await;
    speaker
        .play_url(&UrlMediaItem::new("http://stream.example.com/a.mp3"))
        .await
        .unwrap();

    speaker.cmd_pause().await.unwrap();

    let state = speaker.state();
    assert_eq!(state.state.as_deref(), Some("stop"));
    assert_eq!(state.app_name.as_deref(), Some("Unknown"));
    assert_eq!(state.muted, Some(true));

    let pause = mock
        .requests()
        .into_iter()
        .rfind(|markup| markup.contains("SetPlaybackControl"))
        .unwrap();
    assert_eq!(arg(&pause, "playbackcontrol"), "pause");
}

#[tokio::test]
async fn test_getters_read_from_speaker() {
    let (_mock, speaker) = connected(Device::default()).await;

    assert_eq!(speaker.get_name().await.unwrap(), "Kitchen");
    assert_eq!(speaker.get_model().await.unwrap(), "Shape M7");
    assert_eq!(speaker.get_source().await.unwrap(), "Wi-Fi");
    assert_eq!(speaker.get_speaker_id().await.unwrap(), "ABCD1234");
    assert!(!speaker.get_mute().await.unwrap());

    let presets = speaker.get_tunein_presets().await.unwrap();
    let titles: Vec<&str> = presets.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, ["Jazz FM", "News 24"]);
}

#[tokio::test]
async fn test_set_name_and_select_source() {
    let (mock, speaker) = updated(Device::default()).await;

    speaker.set_name("Living Room").await.unwrap();
    assert_eq!(speaker.state().name.as_deref(), Some("Living Room"));
    assert_eq!(mock.device().name, "Living Room");

    speaker.select_source("Bluetooth").await.unwrap();
    assert_eq!(mock.device().function, "bt");
    assert_eq!(speaker.state().source.as_deref(), Some("Bluetooth"));
    assert_eq!(speaker.state().media_title, None);

    // Shape M7 has no HDMI input
    assert!(matches!(
        speaker.select_source("HDMI").await,
        Err(SdkError::ApiError(_))
    ));
}

#[tokio::test]
async fn test_play_preset() {
    let (mock, speaker) = updated(Device::default()).await;
    let presets = speaker.state().tunein_presets;

    speaker.play_preset(&presets[1]).await.unwrap();
    let play = mock
        .requests()
        .into_iter()
        .find(|markup| markup.contains("SetPlayPreset"))
        .unwrap();
    assert_eq!(arg(&play, "presettype"), "1");
    assert_eq!(arg(&play, "presetindex"), "3");
    assert_eq!(speaker.state().media_title.as_deref(), Some("Jazz FM"));

    let mut missing = presets[0].clone();
    missing.title = "Gone".to_string();
    let before = mock.methods().len();
    assert!(matches!(
        speaker.play_preset(&missing).await,
        Err(SdkError::InvalidArgument(_))
    ));
    assert_eq!(&mock.methods()[before..], ["SetSelectRadio", "GetPresetList"]);
}

#[tokio::test]
async fn test_select_sound_mode() {
    let (_mock, speaker) = updated(Device::default()).await;
    let rock = speaker
        .state()
        .sound_mode_list
        .into_iter()
        .find(|preset| preset.name == "Rock")
        .unwrap();

    speaker.select_sound_mode(&rock).await.unwrap();

    let state = speaker.state();
    assert_eq!(state.sound_mode.as_deref(), Some("Rock"));
    assert_eq!(state.equalizer_values.map(|eq| eq.hz_10000), Some(3));
}

#[tokio::test]
async fn test_commands_follow_supported_features() {
    let (mock, speaker) = updated(Device::default()).await;

    // TuneIn can play but not skip
    assert!(matches!(
        speaker.cmd_next().await,
        Err(SdkError::FeatureNotSupported(Feature::Next))
    ));

    let mut diffs = diff_channel(&speaker);
    mock.push("CurrentFunc", "<function>wifi</function><submode>dlna</submode>");
    next_diff(&mut diffs).await;
    assert_eq!(speaker.state().app_name.as_deref(), Some("DLNA"));

    // SetTrickMode has no reply, so this returns as soon as it is sent
    tokio::time::timeout(Duration::from_secs(1), speaker.cmd_next())
        .await
        .unwrap()
        .unwrap();

    // The mock records a command once it has read it to the end
    let recorded = async {
        while mock.methods().last().map(String::as_str) != Some("SetTrickMode") {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    };
    tokio::time::timeout(Duration::from_secs(2), recorded)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_hang_up_ends_connection() {
    let (mock, speaker) = connected(Device::default()).await;
    assert!(speaker.is_connected());

    mock.close();

    tokio::time::timeout(Duration::from_secs(2), speaker.closed())
        .await
        .unwrap();
    assert!(!speaker.is_connected());
    assert!(matches!(
        speaker.get_volume().await,
        Err(SdkError::ClientError(_))
    ));
}
