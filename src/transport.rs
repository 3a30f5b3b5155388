//! HTTP transport to the upstream SOAP service.

use crate::config::UpstreamConfig;
use crate::error::GatewayError;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::{debug, warn};

/// Content type of outgoing envelopes.
pub const SOAP_CONTENT_TYPE: &str = "text/xml; charset=utf-8";

/// Header naming the invoked SOAP action.
pub const SOAP_ACTION_HEADER: &str = "SOAPAction";

/// Delivers an envelope and returns the raw response body.
///
/// Implementations must report non-2xx answers and network failures as
/// errors. Dropping the returned future abandons the request.
#[async_trait]
pub trait SoapTransport: Send + Sync {
    async fn send(&self, action: &str, envelope: String) -> Result<String, GatewayError>;
}

/// `SOAPAction` header value: `"<namespace>#<action>"`, quotes included.
pub fn soap_action_value(namespace: &str, action: &str) -> String {
    format!("\"{namespace}#{action}\"")
}

/// [`SoapTransport`] over `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpSoapTransport {
    client: Client,
    endpoint: String,
    namespace: String,
    use_soap_action_header: bool,
}

impl HttpSoapTransport {
    /// Build a transport; the client timeout covers the whole exchange.
    pub fn new(config: &UpstreamConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout()?)
            .build()
            .map_err(|e| GatewayError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim().to_string(),
            namespace: config.namespace.clone(),
            use_soap_action_header: config.use_soap_action_header,
        })
    }
}

#[async_trait]
impl SoapTransport for HttpSoapTransport {
    async fn send(&self, action: &str, envelope: String) -> Result<String, GatewayError> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, SOAP_CONTENT_TYPE)
            .body(envelope);

        if self.use_soap_action_header {
            request = request.header(
                SOAP_ACTION_HEADER,
                soap_action_value(&self.namespace, action),
            );
        }

        debug!(action = %action, endpoint = %self.endpoint, "Sending SOAP request");

        let transport_error = |source: reqwest::Error| {
            warn!(action = %action, error = %source, "SOAP request could not be completed");
            GatewayError::Transport {
                action: action.to_string(),
                source,
            }
        };

        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|e| {
                debug!(action = %action, error = %e, "Failed to read error response body");
                String::new()
            });
            warn!(
                action = %action,
                status = status.as_u16(),
                body = %body,
                "SOAP action failed"
            );
            return Err(GatewayError::SoapRequest {
                action: action.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        response.text().await.map_err(transport_error)
    }
}
