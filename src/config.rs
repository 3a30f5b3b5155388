//! Configuration types for the SOAP auth gateway.

use crate::error::GatewayError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration for the gateway.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Upstream SOAP identity service
    pub upstream: UpstreamConfig,

    /// Inbound HTTP listener
    pub server: ServerConfig,
}

impl GatewayConfig {
    /// Parse a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self, GatewayError> {
        serde_yaml::from_str(yaml).map_err(|e| GatewayError::Config(e.to_string()))
    }

    /// Check the settings that would make every upstream call fail.
    pub fn validate(&self) -> Result<(), GatewayError> {
        self.upstream.validate()
    }
}

/// Upstream SOAP service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// SOAP endpoint URL
    pub endpoint: String,

    /// Namespace of the action elements, also used in the SOAPAction header
    pub namespace: String,

    /// Send a `SOAPAction: "<namespace>#<action>"` header
    pub use_soap_action_header: bool,

    /// Whole-request timeout in seconds
    pub timeout_secs: f64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://isapi.mekashron.com/icu-tech/icutech-test.dll/soap/IICUTech"
                .to_string(),
            namespace: "urn:ICUTech.Intf-IICUTech".to_string(),
            use_soap_action_header: true,
            timeout_secs: 15.0,
        }
    }
}

impl UpstreamConfig {
    /// Timeout as a [`Duration`].
    pub fn timeout(&self) -> Result<Duration, GatewayError> {
        if self.timeout_secs <= 0.0 {
            return Err(GatewayError::Config(format!(
                "timeout_secs must be positive, got {}",
                self.timeout_secs
            )));
        }
        Duration::try_from_secs_f64(self.timeout_secs)
            .map_err(|e| GatewayError::Config(format!("invalid timeout_secs: {e}")))
    }

    fn validate(&self) -> Result<(), GatewayError> {
        if self.endpoint.trim().is_empty() {
            return Err(GatewayError::Config(
                "SOAP endpoint is not configured".to_string(),
            ));
        }
        reqwest::Url::parse(self.endpoint.trim()).map_err(|e| {
            GatewayError::Config(format!("invalid SOAP endpoint '{}': {e}", self.endpoint))
        })?;
        if self.namespace.trim().is_empty() {
            return Err(GatewayError::Config(
                "SOAP namespace is not configured".to_string(),
            ));
        }
        self.timeout()?;
        Ok(())
    }
}

/// Inbound HTTP settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8080".to_string(),
        }
    }
}
