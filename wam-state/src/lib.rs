//! Device state for Samsung Wireless Audio Multiroom speakers
//!
//! A [`StateSynchronizer`] keeps everything known about one speaker. Feed
//! it every [`wam_api::Envelope`] the speaker pushes and it maintains:
//!
//! - [`DeviceAttributes`], the values exactly as the speaker reported them
//! - [`SpeakerState`], the translated view (0-100 volume, source names, ...)
//! - subscribers, notified at the [`DetailLevel`] they asked for
//!
//! ```rust
//! use std::sync::Arc;
//! use wam_api::{DeviceProfile, Envelope};
//! use wam_state::{DetailLevel, Notification, StateSynchronizer};
//!
//! let sync = StateSynchronizer::new(DeviceProfile::default());
//! sync.subscribe(DetailLevel::Diff, Arc::new(|notification: Notification<'_>| {
//!     if let Notification::Diff(changed) = notification {
//!         println!("changed: {:?}", changed);
//!     }
//! }));
//!
//! sync.receive(&Envelope::decode(
//!     r#"<UIC><method>VolumeLevel</method><response result="ok"><volume>15</volume></response></UIC>"#,
//! ));
//! assert_eq!(sync.state().volume, Some(50));
//! ```

pub mod attributes;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod state;
pub mod synchronizer;

pub use attributes::{DeviceAttributes, Record};
pub use error::{Result, StateError};
pub use handlers::{Handler, HandlerTable};
pub use logging::{init_logging, init_logging_from_env, LoggingError, LoggingMode};
pub use state::{EqualizerPreset, EqualizerValues, MediaPreset, SpeakerState, TUNEIN};
pub use synchronizer::{
    DetailLevel, Notification, StateDiff, StateSynchronizer, Subscriber, SubscriptionId,
};
