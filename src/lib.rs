//! SOAP auth gateway.
//!
//! Exposes login and registration over HTTP and forwards them to a SOAP
//! identity service, normalizing its loosely typed answers.
//!
//! # Pipeline
//!
//! - Envelope construction with escaped parameters
//! - HTTP POST with optional `SOAPAction` header and timeout
//! - Result extraction (`*Result` element, then `return`, then raw body)
//! - JSON interpretation into success, code, message and flattened details
//!
//! # Example
//!
//! ```ignore
//! use soap_auth_gateway::{AuthGateway, GatewayConfig};
//!
//! let config = GatewayConfig::default();
//! let gateway = AuthGateway::from_config(&config.upstream)?;
//! let result = gateway.login("user", "password", None).await?;
//! println!("{}: {}", result.success, result.message);
//! ```

pub mod config;
pub mod envelope;
pub mod error;
pub mod gateway;
pub mod interpreter;
pub mod models;
pub mod parser;
pub mod server;
pub mod transport;

pub use config::GatewayConfig;
pub use error::{ErrorKind, GatewayError};
pub use gateway::AuthGateway;
pub use interpreter::{DetailEntry, InterpretedResult};
pub use models::{LoginResult, RegisterResult, RegistrationInput};
