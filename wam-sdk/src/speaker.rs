//! Speaker handle
//!
//! Wires a [`WamClient`] to a [`StateSynchronizer`]: every message the
//! speaker pushes updates the state, and commands sent through the handle
//! are answered by those same messages.

use std::sync::Arc;

use wam_api::{commands, Command, DeviceProfile, Envelope};
use wam_client::WamClient;
use wam_state::{
    DetailLevel, DeviceAttributes, EqualizerPreset, MediaPreset, Notification, SpeakerState,
    StateSynchronizer, SubscriptionId, TUNEIN,
};

use crate::config::SpeakerConfig;
use crate::error::{Result, SdkError};
use crate::feature::{supported_features, Feature};
use crate::media::UrlMediaItem;

/// Presets requested per `GetPresetList`
const PRESET_PAGE: i64 = 30;

/// Handle to one speaker
///
/// ```rust,no_run
/// use wam_sdk::{Speaker, SpeakerConfig};
///
/// # async fn example() -> Result<(), wam_sdk::SdkError> {
/// let speaker = Speaker::new("192.168.1.100", SpeakerConfig::new())?;
/// speaker.connect().await?;
/// speaker.update().await?;
///
/// speaker.set_volume(40).await?;
/// println!("{:?}", speaker.state().media_title);
///
/// speaker.disconnect().await;
/// # Ok(())
/// # }
/// ```
pub struct Speaker {
    client: WamClient,
    state: Arc<StateSynchronizer>,
    /// Model fixed by configuration; stops `update` from replacing the profile
    pinned_model: bool,
}

impl Speaker {
    pub fn new(ip: impl Into<String>, config: SpeakerConfig) -> Result<Self> {
        config.validate()?;

        let state = Arc::new(StateSynchronizer::new(config.profile()));
        let client = WamClient::new(ip, config.client);

        let sync = Arc::clone(&state);
        client.add_listener(Arc::new(move |envelope: &Envelope| sync.receive(envelope)));

        Ok(Self {
            client,
            state,
            pinned_model: config.model.is_some(),
        })
    }

    pub fn ip(&self) -> &str {
        self.client.ip()
    }

    pub fn port(&self) -> u16 {
        self.client.port()
    }

    /// Identity token sent with every command
    pub fn user(&self) -> &str {
        self.client.user()
    }

    // ========================================================================
    // Connection
    // ========================================================================

    /// Open the listen connection and start receiving state
    pub async fn connect(&self) -> Result<()> {
        self.client.connect().await?;
        self.client.start_listening().await?;
        tracing::info!("Speaker {} ready", self.ip());
        Ok(())
    }

    pub async fn disconnect(&self) {
        self.client.disconnect().await
    }

    pub fn is_connected(&self) -> bool {
        self.client.is_connected()
    }

    /// Resolves when the speaker connection ends
    pub async fn closed(&self) {
        self.client.closed().await
    }

    /// Send any command and wait for its reply
    pub async fn request(&self, command: &Command) -> Result<Envelope> {
        Ok(self.client.request(command).await?)
    }

    // ========================================================================
    // State
    // ========================================================================

    pub fn state(&self) -> SpeakerState {
        self.state.state()
    }

    pub fn attributes(&self) -> DeviceAttributes {
        self.state.attributes()
    }

    pub fn profile(&self) -> DeviceProfile {
        self.state.profile()
    }

    pub fn supported_features(&self) -> Vec<Feature> {
        supported_features(&self.state.state())
    }

    pub fn subscribe(
        &self,
        level: DetailLevel,
        callback: impl Fn(Notification<'_>) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.state.subscribe(level, Arc::new(callback))
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> Result<()> {
        Ok(self.state.unsubscribe(id)?)
    }

    fn ensure_supported(&self, feature: Feature) -> Result<()> {
        if self.supported_features().contains(&feature) {
            Ok(())
        } else {
            Err(SdkError::FeatureNotSupported(feature))
        }
    }

    // ========================================================================
    // Update
    // ========================================================================

    /// Ask the speaker for everything it knows
    ///
    /// Call once after [`Speaker::connect`]; afterwards the speaker keeps
    /// the state current by itself. Steps run in order because later ones
    /// depend on what earlier ones reported.
    pub async fn update(&self) -> Result<()> {
        self.update_speaker_info().await?;
        self.update_player_info().await?;
        self.update_media_info().await?;
        self.update_speaker_settings().await?;
        self.refine_profile();
        Ok(())
    }

    pub async fn update_speaker_info(&self) -> Result<()> {
        self.request(&commands::get_main_info()).await?;
        self.request(&commands::get_spk_name()).await?;
        if self.state.attributes().grouptype.as_deref() != Some("N") {
            self.request(&commands::get_group_name()).await?;
        }
        self.request(&commands::get_software_version()).await?;
        self.request(&commands::get_ap_info()).await?;
        Ok(())
    }

    pub async fn update_player_info(&self) -> Result<()> {
        self.request(&commands::get_func()).await?;
        self.request(&commands::get_volume()).await?;
        self.request(&commands::get_mute()).await?;
        self.request(&commands::get_shuffle_mode()).await?;
        self.request(&commands::get_repeat_mode()).await?;
        self.request(&commands::get_current_eq_mode()).await?;
        Ok(())
    }

    pub async fn update_media_info(&self) -> Result<()> {
        let attributes = self.state.attributes();
        if attributes.function.as_deref() != Some("wifi") {
            return Ok(());
        }
        match attributes.submode.as_deref() {
            Some("cp") => {
                self.request(&commands::get_radio_info()).await?;
            }
            Some("dlna") => {
                self.request(&commands::get_music_info()).await?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Presets and equalizer settings
    pub async fn update_speaker_settings(&self) -> Result<()> {
        self.request_tunein_presets().await?;
        self.request(&commands::get_7band_eq_list()).await?;
        Ok(())
    }

    fn refine_profile(&self) {
        if self.pinned_model || self.state.profile().is_known() {
            return;
        }
        let Some(model) = self.state.attributes().spkmodelname else {
            return;
        };
        let profile = DeviceProfile::for_model(&model);
        if profile.is_known() {
            tracing::debug!("Speaker {} is a {}", self.ip(), profile.name);
            self.state.set_profile(profile);
        }
    }

    async fn request_tunein_presets(&self) -> Result<Envelope> {
        self.request(&commands::set_select_radio()).await?;
        self.request(&commands::get_preset_list(0, PRESET_PAGE)).await
    }

    // ========================================================================
    // Commands
    // ========================================================================

    pub async fn cmd_next(&self) -> Result<()> {
        self.ensure_supported(Feature::Next)?;
        self.request(&commands::set_trick_mode("next")).await?;
        Ok(())
    }

    pub async fn cmd_previous(&self) -> Result<()> {
        self.ensure_supported(Feature::Previous)?;
        self.request(&commands::set_trick_mode("previous")).await?;
        Ok(())
    }

    pub async fn cmd_play(&self) -> Result<()> {
        self.ensure_supported(Feature::Play)?;
        match self.state.attributes().submode.as_deref() {
            Some("cp") => {
                self.request(&commands::set_cpm_playback_control("play")).await?;
            }
            Some("dlna") => {
                self.request(&commands::set_uic_playback_control("resume")).await?;
            }
            other => tracing::debug!("Play ignored in submode {:?}", other),
        }
        Ok(())
    }

    /// Pause playback
    ///
    /// URL playback cannot be resumed once paused, so it is paused, the
    /// speaker muted and the stream reported as stopped.
    pub async fn cmd_pause(&self) -> Result<()> {
        self.ensure_supported(Feature::Pause)?;
        match self.state.attributes().submode.as_deref() {
            Some("cp") => {
                self.request(&commands::set_cpm_playback_control("pause")).await?;
            }
            Some("dlna") => {
                self.request(&commands::set_uic_playback_control("pause")).await?;
            }
            Some("url") | Some("Unknown") => {
                let pause = self.request(&commands::set_uic_playback_control("pause")).await?;
                if !pause.success {
                    return Ok(());
                }
                let mute = self.request(&commands::set_mute(true)).await?;
                if mute.success {
                    self.state.apply_synthetic("url playback paused", |attributes| {
                        attributes.playstatus = Some("stop".to_string());
                        attributes.cpname = Some("Unknown".to_string());
                        attributes.submode = Some("cp".to_string());
                    });
                }
            }
            other => tracing::debug!("Pause ignored in submode {:?}", other),
        }
        Ok(())
    }

    pub async fn cmd_stop(&self) -> Result<()> {
        self.ensure_supported(Feature::Stop)?;
        self.request(&commands::set_cpm_playback_control("stop")).await?;
        Ok(())
    }

    // ========================================================================
    // Play
    // ========================================================================

    /// Play a TuneIn preset stored on the speaker
    ///
    /// An unknown preset refreshes the preset list before failing, so a
    /// retry with a current preset can succeed.
    pub async fn play_preset(&self, preset: &MediaPreset) -> Result<()> {
        self.ensure_supported(Feature::PlayPreset)?;

        let known = self
            .state
            .state()
            .tunein_presets
            .iter()
            .any(|p| p.title == preset.title && p.contentid == preset.contentid);
        if !known {
            self.request_tunein_presets().await?;
            return Err(SdkError::InvalidArgument(format!(
                "Preset '{}' could not be found on the speaker",
                preset.title
            )));
        }
        if preset.app != TUNEIN {
            return Err(SdkError::InvalidArgument(format!(
                "Only {TUNEIN} presets can be played, not {}",
                preset.app
            )));
        }

        let preset_type = if preset.kind == "speaker" { 1 } else { 0 };
        let preset_index: i64 = preset.contentid.parse().map_err(|_| {
            SdkError::InvalidArgument(format!("Preset content id '{}' is not a number", preset.contentid))
        })?;

        let result = self
            .request(&commands::set_play_preset(preset_type, preset_index))
            .await?;
        if result.success {
            self.unmute_if_muted().await?;
        }
        Ok(())
    }

    /// Play a stream or file from a URL
    ///
    /// The speaker reports nothing about what it plays, so the item's title,
    /// description, duration and thumbnail are applied to the state here.
    pub async fn play_url(&self, item: &UrlMediaItem) -> Result<()> {
        self.ensure_supported(Feature::PlayUrl)?;

        let result = self
            .request(&commands::set_url_playback(&item.url, 0, 0, false))
            .await?;
        if !result.success {
            tracing::warn!("Speaker {} refused to play {}", self.ip(), item.url);
            return Ok(());
        }

        let (title, description) = (item.title(), item.description());
        self.state.apply_synthetic("url playback", |attributes| {
            attributes.title = Some(title);
            attributes.description = Some(description);
            attributes.tracklength = item.duration.map(|seconds| seconds.to_string());
            attributes.thumbnail = item.thumbnail.clone();
        });

        self.unmute_if_muted().await
    }

    async fn unmute_if_muted(&self) -> Result<()> {
        if self.state.state().muted == Some(true) {
            self.set_mute(false).await?;
        }
        Ok(())
    }

    // ========================================================================
    // Set
    // ========================================================================

    /// Set volume on a 0-100 scale
    pub async fn set_volume(&self, volume: u32) -> Result<Envelope> {
        let volume = self.state.profile().checked_volume(volume)?;
        self.request(&commands::set_volume(volume)).await
    }

    pub async fn set_mute(&self, mute: bool) -> Result<Envelope> {
        self.request(&commands::set_mute(mute)).await
    }

    pub async fn set_name(&self, name: &str) -> Result<Envelope> {
        self.ensure_supported(Feature::SetName)?;
        validate_name(name)?;
        self.request(&commands::set_spk_name(name)).await
    }

    /// `one`, `all` or `off`
    pub async fn set_repeat_mode(&self, mode: &str) -> Result<Envelope> {
        self.ensure_supported(Feature::SetRepeat)?;
        if !matches!(mode, "one" | "all" | "off") {
            return Err(SdkError::InvalidArgument(format!(
                "Repeat mode '{mode}' is not one of one, all, off"
            )));
        }
        self.request(&commands::set_repeat_mode(mode)).await
    }

    pub async fn set_shuffle(&self, shuffle: bool) -> Result<Envelope> {
        self.ensure_supported(Feature::SetShuffle)?;
        self.request(&commands::set_shuffle_mode(shuffle)).await
    }

    // ========================================================================
    // Select
    // ========================================================================

    /// Select an input by display name, e.g. `Bluetooth`
    pub async fn select_source(&self, source: &str) -> Result<()> {
        self.ensure_supported(Feature::SelectSource)?;
        let function = self.state.profile().encode_source(source)?;
        self.request(&commands::set_func(function)).await?;
        Ok(())
    }

    pub async fn select_sound_mode(&self, preset: &EqualizerPreset) -> Result<()> {
        let sound_modes = self.state.state().sound_mode_list;
        if sound_modes.is_empty() {
            return Err(SdkError::InvalidArgument(
                "No sound modes are known for the speaker".to_string(),
            ));
        }
        if !sound_modes.contains(preset) {
            return Err(SdkError::InvalidArgument(format!(
                "Sound mode '{}' could not be found on the speaker",
                preset.name
            )));
        }
        self.request(&commands::set_7band_eq_mode(i64::from(preset.index)))
            .await?;
        Ok(())
    }

    // ========================================================================
    // Get
    // ========================================================================

    /// Volume on a 0-100 scale, read from the speaker
    pub async fn get_volume(&self) -> Result<u32> {
        let reply = self.request(&commands::get_volume()).await?;
        let volume: u32 = reply
            .get_str("volume")
            .and_then(|volume| volume.trim().parse().ok())
            .ok_or_else(|| SdkError::unexpected_reply("VolumeLevel", "volume"))?;
        Ok(self.state.profile().decode_volume(volume))
    }

    pub async fn get_mute(&self) -> Result<bool> {
        let reply = self.request(&commands::get_mute()).await?;
        reply
            .get_str("mute")
            .map(|mute| mute == "on")
            .ok_or_else(|| SdkError::unexpected_reply("MuteStatus", "mute"))
    }

    pub async fn get_name(&self) -> Result<String> {
        let reply = self.request(&commands::get_spk_name()).await?;
        required(&reply, "SpkName", "spkname")
    }

    /// Model display name, or the raw model identifier for unknown models
    pub async fn get_model(&self) -> Result<String> {
        let reply = self.request(&commands::get_main_info()).await?;
        let model = required(&reply, "MainInfo", "spkmodelname")?;
        let profile = DeviceProfile::for_model(&model);
        Ok(if profile.is_known() { profile.name } else { model })
    }

    /// Selected input by display name
    pub async fn get_source(&self) -> Result<String> {
        let reply = self.request(&commands::get_func()).await?;
        let function = required(&reply, "CurrentFunc", "function")?;
        Ok(wam_api::decode_source(&function).to_string())
    }

    pub async fn get_speaker_id(&self) -> Result<String> {
        let reply = self.request(&commands::get_device_id()).await?;
        required(&reply, "DeviceId", "device_id")
    }

    pub async fn get_tunein_presets(&self) -> Result<Vec<MediaPreset>> {
        let reply = self.request_tunein_presets().await?;
        let is_tunein = reply
            .get_str("cpname")
            .is_some_and(|name| name.eq_ignore_ascii_case(TUNEIN));
        if !is_tunein {
            return Err(SdkError::unexpected_reply("PresetList", "cpname"));
        }
        Ok(self.state.state().tunein_presets)
    }
}

impl std::fmt::Debug for Speaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Speaker")
            .field("ip", &self.ip())
            .field("state", &self.client.state())
            .finish()
    }
}

fn required(reply: &Envelope, method: &str, field: &str) -> Result<String> {
    reply
        .get_str(field)
        .filter(|value| !value.is_empty())
        .map(String::from)
        .ok_or_else(|| SdkError::unexpected_reply(method, field))
}

/// Names are 1 to 64 printable characters
fn validate_name(name: &str) -> Result<()> {
    let length = name.chars().count();
    if !(1..=64).contains(&length) {
        return Err(SdkError::InvalidArgument(format!(
            "Speaker name must be 1 to 64 characters, got {length}"
        )));
    }
    if name.chars().any(char::is_control) {
        return Err(SdkError::InvalidArgument(
            "Speaker name contains unprintable characters".to_string(),
        ));
    }
    Ok(())
}
