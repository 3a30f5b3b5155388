//! Login and registration against the upstream SOAP identity service.
//!
//! Each operation is one sequential exchange: build envelope, one round trip,
//! extract the result text, interpret it.

use crate::config::UpstreamConfig;
use crate::envelope::build_envelope;
use crate::error::GatewayError;
use crate::interpreter::{interpret_payload, InterpretedResult};
use crate::models::{normalize_ip, LoginResult, RegisterResult, RegistrationInput};
use crate::parser::extract_result_payload;
use crate::transport::{HttpSoapTransport, SoapTransport};
use std::sync::Arc;
use tracing::debug;

/// Upstream action for logins.
pub const LOGIN_ACTION: &str = "Login";

/// Upstream action for registrations.
pub const REGISTER_ACTION: &str = "RegisterNewCustomer";

/// Auth gateway over a [`SoapTransport`].
#[derive(Clone)]
pub struct AuthGateway {
    namespace: String,
    transport: Arc<dyn SoapTransport>,
}

impl AuthGateway {
    /// Create a gateway that talks to the upstream over HTTP.
    pub fn from_config(config: &UpstreamConfig) -> Result<Self, GatewayError> {
        let transport = HttpSoapTransport::new(config)?;
        Ok(Self::new(config.namespace.clone(), Arc::new(transport)))
    }

    /// Create a gateway over any transport.
    pub fn new(namespace: impl Into<String>, transport: Arc<dyn SoapTransport>) -> Self {
        Self {
            namespace: namespace.into(),
            transport,
        }
    }

    /// Authenticate a user.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        ip_address: Option<&str>,
    ) -> Result<LoginResult, GatewayError> {
        let params = [
            ("UserName", username.to_string()),
            ("Password", password.to_string()),
            ("IPs", normalize_ip(ip_address)),
        ];

        let result = self.call(LOGIN_ACTION, &params).await?;
        Ok(result.into())
    }

    /// Register a new customer.
    pub async fn register(&self, input: &RegistrationInput) -> Result<RegisterResult, GatewayError> {
        let params = [
            ("Email", input.email.clone()),
            ("Password", input.password.clone()),
            ("FirstName", input.first_name.clone()),
            ("LastName", input.last_name.clone()),
            ("Mobile", input.mobile.clone()),
            ("CountryID", input.country_id.to_string()),
            ("aID", input.affiliate_id.to_string()),
            ("SignupIP", normalize_ip(Some(&input.signup_ip))),
        ];

        let result = self.call(REGISTER_ACTION, &params).await?;
        Ok(result.into())
    }

    async fn call(
        &self,
        action: &str,
        params: &[(&str, String)],
    ) -> Result<InterpretedResult, GatewayError> {
        let envelope = build_envelope(action, &self.namespace, params);
        let response = self.transport.send(action, envelope).await?;
        let payload = extract_result_payload(&response);
        let result = interpret_payload(&payload);

        debug!(
            action = %action,
            success = result.success,
            code = ?result.code,
            "SOAP action interpreted"
        );

        Ok(result)
    }
}
