//! Which commands the speaker accepts in its current mode
//!
//! A group slave follows its master and takes no playback commands. What a
//! master or ungrouped speaker accepts depends on the streaming service
//! playing and on the selected source.

use std::fmt;

use serde::Serialize;
use wam_state::SpeakerState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Feature {
    Next,
    Pause,
    Play,
    Previous,
    Stop,
    PlayPreset,
    PlayUrl,
    SetName,
    SetRepeat,
    SetShuffle,
    SelectSource,
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let description = match self {
            Feature::Next => "Next",
            Feature::Pause => "Pause",
            Feature::Play => "Play",
            Feature::Previous => "Previous",
            Feature::Stop => "Stop",
            Feature::PlayPreset => "Playing presets",
            Feature::PlayUrl => "Playing a URL",
            Feature::SetName => "Changing speaker name",
            Feature::SetRepeat => "Repeat mode",
            Feature::SetShuffle => "Shuffle mode",
            Feature::SelectSource => "Selecting source",
        };
        f.write_str(description)
    }
}

const PLAY_STOP: &[Feature] = &[Feature::Stop, Feature::Play];

const APP_FEATURES: &[(&str, &[Feature])] = &[
    ("7digital", PLAY_STOP),
    ("8tracks", PLAY_STOP),
    ("Amazon", PLAY_STOP),
    ("AmazonPrime", PLAY_STOP),
    ("Anghami", PLAY_STOP),
    ("BugsMusic", PLAY_STOP),
    (
        "DLNA",
        &[
            Feature::Play,
            Feature::Previous,
            Feature::Next,
            Feature::SetShuffle,
            Feature::SetRepeat,
        ],
    ),
    ("Deezer", PLAY_STOP),
    ("JB HI-FI Now", PLAY_STOP),
    ("JUKE", PLAY_STOP),
    ("MTV Music", PLAY_STOP),
    ("MelOn", PLAY_STOP),
    ("Milk Music", PLAY_STOP),
    ("Milk Music Radio", PLAY_STOP),
    ("Murfie", PLAY_STOP),
    ("Napster", PLAY_STOP),
    ("Pandora", PLAY_STOP),
    ("Qobuz", PLAY_STOP),
    ("Rdio", PLAY_STOP),
    ("Rhapsody", PLAY_STOP),
    ("SiriusXM", PLAY_STOP),
    ("Spotify", &[Feature::Play]),
    ("Stitcher", PLAY_STOP),
    ("Tidal HiFi", PLAY_STOP),
    ("TuneIn", &[Feature::Play]),
    ("URL Playback", &[]),
    ("Unknown", &[Feature::Stop]),
    ("iHeartRadio", PLAY_STOP),
];

const SOURCE_FEATURES: &[(&str, &[Feature])] =
    &[("Wi-Fi", &[Feature::PlayUrl, Feature::PlayPreset])];

fn lookup(table: &[(&str, &'static [Feature])], key: Option<&str>) -> &'static [Feature] {
    key.and_then(|key| table.iter().find(|(name, _)| *name == key))
        .map(|(_, features)| *features)
        .unwrap_or(&[])
}

/// Commands the speaker accepts given its translated state
pub fn supported_features(state: &SpeakerState) -> Vec<Feature> {
    if state.is_slave == Some(true) {
        return Vec::new();
    }

    let mut features = vec![Feature::Pause];

    let Some(is_master) = state.is_master else {
        return features;
    };
    if state.source.is_none() {
        return features;
    }

    features.extend_from_slice(lookup(APP_FEATURES, state.app_name.as_deref()));
    features.extend_from_slice(lookup(SOURCE_FEATURES, state.source.as_deref()));

    if !is_master {
        features.extend([Feature::SelectSource, Feature::SetName]);
    }

    features
}
