//! Configuration for a [`crate::Speaker`]

use wam_api::DeviceProfile;
use wam_client::ClientConfig;

use crate::error::Result;

/// Connection settings plus what is already known about the speaker
#[derive(Debug, Clone, Default)]
pub struct SpeakerConfig {
    pub client: ClientConfig,

    /// Model identifier as reported in `MainInfo`, e.g. `SPK-WAM750`
    /// Default: None, learned during [`crate::Speaker::update`]
    pub model: Option<String>,
}

impl SpeakerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(mut self, client: ClientConfig) -> Self {
        self.client = client;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.client.validate()?;
        Ok(())
    }

    /// Profile to start with; generic until the model is known
    pub fn profile(&self) -> DeviceProfile {
        self.model
            .as_deref()
            .map(DeviceProfile::for_model)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_default_profile_is_generic() {
        let config = SpeakerConfig::new();
        assert!(config.validate().is_ok());
        assert!(!config.profile().is_known());
    }

    #[test]
    fn test_known_model_selects_profile() {
        let config = SpeakerConfig::new().with_model("SPK-WAM750");
        assert_eq!(config.profile().name, "Shape M7");
    }

    #[test]
    fn test_validate_checks_client_config() {
        let config = SpeakerConfig::new()
            .with_client(ClientConfig::new().with_request_timeout(Duration::from_secs(1)));
        assert!(config.validate().is_err());
    }
}
