//! # WAM SDK - control Samsung Wireless Audio Multiroom speakers
//!
//! A [`Speaker`] keeps one connection to a speaker open, folds everything
//! the speaker pushes into a [`SpeakerState`] and sends commands on your
//! behalf:
//!
//! ```rust,no_run
//! use wam_sdk::{DetailLevel, Notification, Speaker, SpeakerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), wam_sdk::SdkError> {
//!     let speaker = Speaker::new("192.168.1.100", SpeakerConfig::new())?;
//!     speaker.connect().await?;
//!     speaker.update().await?;
//!
//!     speaker.subscribe(DetailLevel::Diff, |notification: Notification<'_>| {
//!         if let Notification::Diff(changed) = notification {
//!             println!("changed: {:?}", changed);
//!         }
//!     });
//!
//!     speaker.set_volume(35).await?;
//!     speaker.closed().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! wam-sdk    (Speaker handle, feature gating)
//!     ↓
//! wam-state  (handlers, translated state, subscribers)
//!     ↓
//! wam-client (connection, framing, request/reply correlation)
//!     ↓
//! wam-api    (commands, message decoding, device profiles)
//! ```
//!
//! State is only ever changed by messages from the speaker, with two
//! exceptions the speaker never reports: media info for URL playback and
//! the stopped state after pausing it.

mod config;
mod error;
mod feature;
mod media;
mod speaker;

pub use config::SpeakerConfig;
pub use error::{Result, SdkError};
pub use feature::{supported_features, Feature};
pub use media::UrlMediaItem;
pub use speaker::Speaker;

pub use wam_api::{Command, DeviceProfile, Envelope};
pub use wam_client::{ClientConfig, ClientError};
pub use wam_state::{
    init_logging, init_logging_from_env, DetailLevel, DeviceAttributes, EqualizerPreset,
    EqualizerValues, LoggingMode, MediaPreset, Notification, SpeakerState, StateDiff,
    SubscriptionId,
};
