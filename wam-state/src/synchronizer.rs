//! Folds device messages into state and notifies subscribers
//!
//! ```text
//! Envelope ──► HandlerTable ──► DeviceAttributes ──► SpeakerState diff ──► subscribers
//! ```
//!
//! Every successful message goes through its method's handler. If the
//! handler reports that the message carried state, the translated state is
//! compared with what subscribers saw last and changed fields are delivered
//! once to every diff and ping subscriber. Raw subscribers see every
//! successful message whether it changed anything or not.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Local;
use parking_lot::{Mutex, RwLock};
use serde_json::{Map, Value};
use wam_api::{DeviceProfile, Envelope};

use crate::attributes::DeviceAttributes;
use crate::error::{Result, StateError};
use crate::handlers::{Handler, HandlerTable};
use crate::state::SpeakerState;

/// Changed top level fields of [`SpeakerState`] with their new values
pub type StateDiff = Map<String, Value>;

/// How much a subscriber wants to be told
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetailLevel {
    /// Called without data when state changed
    Ping,
    /// Called with the changed fields
    Diff,
    /// Called with every successful message
    Raw,
}

/// What a subscriber receives, matching its [`DetailLevel`]
#[derive(Debug, Clone, Copy)]
pub enum Notification<'a> {
    Changed,
    Diff(&'a StateDiff),
    Raw(&'a Envelope),
}

pub type Subscriber = Arc<dyn Fn(Notification<'_>) + Send + Sync>;

/// Handle returned by [`StateSynchronizer::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub fn from_raw(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "subscriber #{}", self.0)
    }
}

struct Core {
    attributes: DeviceAttributes,
    profile: DeviceProfile,
    /// Translated state as last delivered to diff and ping subscribers
    notified: StateDiff,
}

impl Core {
    fn state(&self) -> SpeakerState {
        SpeakerState::from_attributes(&self.attributes, &self.profile)
    }

    /// Fields changed since the last notification, remembering the new state
    fn take_diff(&mut self) -> Option<StateDiff> {
        let current = self.state().to_fields();
        let diff: StateDiff = current
            .iter()
            .filter(|(key, value)| self.notified.get(*key) != Some(*value))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        if diff.is_empty() {
            return None;
        }
        self.notified = current;
        Some(diff)
    }
}

/// State of one speaker
///
/// Readers get copies through [`state`](Self::state) and
/// [`attributes`](Self::attributes). Subscribers run after the internal lock
/// is released, so they may read state or unsubscribe from inside a callback.
pub struct StateSynchronizer {
    core: Mutex<Core>,
    handlers: RwLock<HandlerTable>,
    subscribers: RwLock<Vec<(SubscriptionId, DetailLevel, Subscriber)>>,
    next_id: AtomicU64,
}

impl StateSynchronizer {
    pub fn new(profile: DeviceProfile) -> Self {
        Self::with_handlers(profile, HandlerTable::standard())
    }

    pub fn with_handlers(profile: DeviceProfile, handlers: HandlerTable) -> Self {
        let attributes = DeviceAttributes::default();
        let notified = SpeakerState::from_attributes(&attributes, &profile).to_fields();
        Self {
            core: Mutex::new(Core {
                attributes,
                profile,
                notified,
            }),
            handlers: RwLock::new(handlers),
            subscribers: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Fold one message from the speaker
    pub fn receive(&self, envelope: &Envelope) {
        // A failed reply carries no state and must not blank out what is known
        if !envelope.success {
            tracing::debug!(method = %envelope.method, "Ignoring unsuccessful message");
            return;
        }

        let Some(handler) = self.handler(&envelope.method) else {
            tracing::info!(
                method = %envelope.method,
                ip = %envelope.source_ip,
                "No handler for message"
            );
            return;
        };

        let diff = {
            let mut core = self.core.lock();
            let used = handler(envelope, &mut core.attributes);
            core.attributes.last_seen = Some(Local::now());
            if used {
                core.take_diff()
            } else {
                None
            }
        };

        if let Some(diff) = &diff {
            tracing::debug!(method = %envelope.method, fields = diff.len(), "State changed");
        }
        self.notify(Some(envelope), diff.as_ref());
    }

    /// Change attributes locally, for state the speaker never confirms
    ///
    /// Diff and ping subscribers are notified exactly as for a device
    /// message. Raw subscribers are not, since there is no message.
    pub fn apply_synthetic(&self, reason: &str, update: impl FnOnce(&mut DeviceAttributes)) {
        let diff = {
            let mut core = self.core.lock();
            update(&mut core.attributes);
            core.take_diff()
        };
        tracing::debug!(reason, changed = diff.is_some(), "Applied synthetic update");
        self.notify(None, diff.as_ref());
    }

    pub fn reset_source_info(&self) {
        self.apply_synthetic("reset source info", DeviceAttributes::reset_source_info);
    }

    pub fn reset_media_info(&self) {
        self.apply_synthetic("reset media info", DeviceAttributes::reset_media_info);
    }

    fn handler(&self, method: &str) -> Option<Handler> {
        self.handlers.read().get(method).cloned()
    }

    fn notify(&self, envelope: Option<&Envelope>, diff: Option<&StateDiff>) {
        let subscribers: Vec<(SubscriptionId, DetailLevel, Subscriber)> = self
            .subscribers
            .read()
            .iter()
            .map(|(id, level, callback)| (*id, *level, Arc::clone(callback)))
            .collect();

        for (id, level, callback) in subscribers {
            let notification = match (level, envelope, diff) {
                (DetailLevel::Raw, Some(envelope), _) => Notification::Raw(envelope),
                (DetailLevel::Diff, _, Some(diff)) => Notification::Diff(diff),
                (DetailLevel::Ping, _, Some(_)) => Notification::Changed,
                _ => continue,
            };
            if catch_unwind(AssertUnwindSafe(|| callback(notification))).is_err() {
                tracing::error!("{} panicked while handling a notification", id);
            }
        }
    }

    /// Register a callback; see [`DetailLevel`] for what it receives
    pub fn subscribe(&self, level: DetailLevel, callback: Subscriber) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers.write().push((id, level, callback));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> Result<()> {
        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|(existing, ..)| *existing != id);
        if subscribers.len() == before {
            return Err(StateError::UnknownSubscriber(id));
        }
        Ok(())
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Add or replace the handler for a method
    pub fn register_handler(&self, method: &str, handler: Handler) {
        self.handlers.write().register(method, handler);
    }

    /// Copy of the translated state
    pub fn state(&self) -> SpeakerState {
        self.core.lock().state()
    }

    /// Copy of the raw attributes
    pub fn attributes(&self) -> DeviceAttributes {
        self.core.lock().attributes.clone()
    }

    pub fn profile(&self) -> DeviceProfile {
        self.core.lock().profile.clone()
    }

    /// Replace the translation profile, e.g. once the model is known
    ///
    /// Fields whose translation changes are delivered to subscribers like
    /// any other change.
    pub fn set_profile(&self, profile: DeviceProfile) {
        let diff = {
            let mut core = self.core.lock();
            core.profile = profile;
            core.take_diff()
        };
        tracing::debug!(changed = diff.is_some(), "Replaced profile");
        self.notify(None, diff.as_ref());
    }
}

impl Default for StateSynchronizer {
    fn default() -> Self {
        Self::new(DeviceProfile::default())
    }
}

impl fmt::Debug for StateSynchronizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateSynchronizer")
            .field("profile", &self.core.lock().profile.name)
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
