//! Typed commands and message decoding for Samsung Wireless Audio Multiroom speakers
//!
//! This crate has no I/O. It describes what is sent to a speaker and how
//! what comes back is understood:
//!
//! - [`Command`] values and their percent-encoded request target
//! - [`commands`], the catalogue of known device calls
//! - [`Envelope`], a decoded pushed message with its [`AttributeValue`] payload
//! - [`DeviceProfile`], per-model capabilities and volume/source translation
//!
//! ```rust
//! use wam_api::{commands, Envelope};
//!
//! let command = commands::set_volume(15);
//! assert!(command.url().starts_with("/UIC?cmd="));
//!
//! let envelope = Envelope::decode(
//!     r#"<UIC><method>VolumeLevel</method><response result="ok"><volume>15</volume></response></UIC>"#,
//! );
//! assert_eq!(envelope.get_str("volume"), Some("15"));
//! ```

pub mod command;
pub mod commands;
pub mod device;
pub mod envelope;
pub mod error;
pub mod tree;

pub use command::{Arg, ArgValue, Command, Namespace};
pub use device::{decode_source, encode_source, DeviceProfile, DEFAULT_MAX_API_VOLUME, DEFAULT_PORT};
pub use envelope::{Envelope, EnvelopeKind};
pub use error::{ApiError, Result};
pub use tree::{AttributeMap, AttributeValue};
