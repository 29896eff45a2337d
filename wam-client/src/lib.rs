//! Connection management and request multiplexing for Samsung Wireless Audio speakers
//!
//! A speaker pushes every state change, and every reply to a command, on
//! one long-lived TCP connection. This crate keeps that connection open,
//! recovers messages from the byte stream ([`framer`]), decodes them into
//! [`wam_api::Envelope`]s and hands each one to registered listeners. Commands
//! are written on short-lived connections and correlated with their reply
//! by [`WamClient::request`].

pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod framer;
pub mod wire;

pub use client::{EnvelopeListener, ListenerId, WamClient};
pub use config::ClientConfig;
pub use connection::{Connection, ConnectionState, MessageHandler};
pub use error::{ClientError, Result};
pub use framer::{frame, ByteBuffer, FramedMessage};
