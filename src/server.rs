//! Inbound HTTP API.
//!
//! Thin boundary over [`AuthGateway`]: validates and trims input, resolves
//! the caller's IP and maps gateway errors onto HTTP statuses.

use crate::error::{ErrorKind, GatewayError};
use crate::gateway::AuthGateway;
use crate::models::{normalize_ip, LoginRequest, LoginResult, RegisterRequest, RegistrationInput};
use axum::extract::rejection::JsonRejection;
use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, warn};
use validator::{Validate, ValidationErrors};

/// Message returned for failures that must not leak internals.
pub const UNEXPECTED_ERROR_MESSAGE: &str = "Unexpected error while contacting the SOAP service.";

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<AuthGateway>,
}

/// Build the router.
pub fn router(gateway: Arc<AuthGateway>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/account/login", post(login))
        .route("/api/account/register", post(register))
        .with_state(AppState { gateway })
}

/// Key reported when the body itself cannot be decoded.
pub const BODY_KEY: &str = "body";

/// Handler-level errors.
#[derive(Debug)]
pub enum ApiError {
    Validation(ValidationErrors),
    InvalidBody(String),
    Gateway(GatewayError),
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        Self::Gateway(err)
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(err: ValidationErrors) -> Self {
        Self::Validation(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidBody(rejection.body_text())
    }
}

/// One invalid request field.
#[derive(Debug, Serialize)]
pub struct FieldError {
    pub key: String,
    pub message: String,
}

/// Wire name of a request field: `country_id` becomes `countryId`.
fn wire_key(field: &str) -> String {
    let mut key = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = !key.is_empty();
        } else if upper {
            key.extend(c.to_uppercase());
            upper = false;
        } else {
            key.push(c);
        }
    }
    key
}

fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut fields: Vec<FieldError> = errors
        .field_errors()
        .into_iter()
        .filter_map(|(key, errs)| {
            errs.first().map(|e| FieldError {
                key: wire_key(key),
                message: e
                    .message
                    .as_ref()
                    .map_or_else(|| e.code.to_string(), ToString::to_string),
            })
        })
        .collect();
    fields.sort_by(|a, b| a.key.cmp(&b.key));
    fields
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "success": false,
                    "errors": field_errors(&errors),
                })),
            )
                .into_response(),
            Self::InvalidBody(message) => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "success": false,
                    "errors": [FieldError { key: BODY_KEY.to_string(), message }],
                })),
            )
                .into_response(),
            Self::Gateway(err) => match err.kind() {
                ErrorKind::TransportFailure => {
                    warn!(error = %err, "SOAP request failed");
                    (
                        StatusCode::BAD_GATEWAY,
                        Json(json!({
                            "success": false,
                            "code": err.kind().as_str(),
                            "message": err.to_string(),
                        })),
                    )
                        .into_response()
                }
                ErrorKind::UnexpectedFailure => {
                    error!(error = %err, "Unexpected gateway error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({
                            "success": false,
                            "code": err.kind().as_str(),
                            "message": UNEXPECTED_ERROR_MESSAGE,
                        })),
                    )
                        .into_response()
                }
            },
        }
    }
}

/// Caller IP: socket peer, else first `X-Forwarded-For` entry, else loopback.
pub fn client_ip(peer: Option<SocketAddr>, headers: &HeaderMap) -> String {
    let forwarded = || {
        headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    let ip = peer.map(|addr| addr.ip().to_string()).or_else(forwarded);
    normalize_ip(ip.as_deref())
}

async fn health() -> impl IntoResponse {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn login(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResult>, ApiError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let ip = client_ip(connect_info.map(|ConnectInfo(addr)| addr), &headers);
    let result = state
        .gateway
        .login(payload.username.trim(), payload.password.trim(), Some(&ip))
        .await?;

    Ok(Json(result))
}

async fn register(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let ip = client_ip(connect_info.map(|ConnectInfo(addr)| addr), &headers);
    let input = RegistrationInput::from_request(&payload, Some(&ip));
    let result = state.gateway.register(&input).await?;

    Ok(Json(json!({
        "success": result.success,
        "resultCode": result.result_code,
        "message": result.message,
        "raw": result.raw,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::SoapTransport;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use std::sync::Mutex;
    use tower::ServiceExt;

    enum Reply {
        Body(String),
        Status(u16),
        Broken,
    }

    struct StubTransport {
        reply: Reply,
        envelopes: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SoapTransport for StubTransport {
        async fn send(&self, action: &str, envelope: String) -> Result<String, GatewayError> {
            self.envelopes.lock().unwrap().push(envelope);
            match &self.reply {
                Reply::Body(body) => Ok(body.clone()),
                Reply::Status(status) => Err(GatewayError::SoapRequest {
                    action: action.to_string(),
                    status: *status,
                    body: "Service Unavailable".to_string(),
                }),
                Reply::Broken => Err(GatewayError::Unexpected("secret internal detail".to_string())),
            }
        }
    }

    fn app(reply: Reply) -> (Router, Arc<StubTransport>) {
        let transport = Arc::new(StubTransport {
            reply,
            envelopes: Mutex::new(Vec::new()),
        });
        let gateway = Arc::new(AuthGateway::new("urn:x", transport.clone()));
        (router(gateway), transport)
    }

    fn result_body(json: &str) -> Reply {
        Reply::Body(format!(
            "<Envelope><Body><LoginResult>{}</LoginResult></Body></Envelope>",
            quick_xml::escape::escape(json)
        ))
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .header("x-forwarded-for", "203.0.113.9, 10.0.0.1")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_client_ip() {
        let mut headers = HeaderMap::new();
        assert_eq!(client_ip(None, &headers), "127.0.0.1");

        headers.insert("x-forwarded-for", " 198.51.100.4 , 10.0.0.1".parse().unwrap());
        assert_eq!(client_ip(None, &headers), "198.51.100.4");

        let peer: SocketAddr = "192.0.2.10:5555".parse().unwrap();
        assert_eq!(client_ip(Some(peer), &headers), "192.0.2.10");
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app(Reply::Body(String::new()));
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_login_ok() {
        let (app, transport) = app(result_body(r#"{"ResultCode":1,"Name":"Bob"}"#));
        let (status, body) = post_json(
            app,
            "/api/account/login",
            json!({"username": " bob ", "password": " pw "}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["resultCode"], 1);
        assert_eq!(body["message"], "Operation completed");
        assert_eq!(body["details"][0]["label"], "Name");
        assert_eq!(body["details"][0]["value"], "Bob");

        let envelope = transport.envelopes.lock().unwrap()[0].clone();
        assert!(envelope.contains("<UserName>bob</UserName><Password>pw</Password>"));
        assert!(envelope.contains("<IPs>203.0.113.9</IPs>"));
    }

    #[tokio::test]
    async fn test_login_requires_fields() {
        let (app, transport) = app(result_body("{}"));
        let (status, body) =
            post_json(app, "/api/account/login", json!({"username": "", "password": ""})).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["errors"][0]["key"], "password");
        assert_eq!(body["errors"][1]["key"], "username");
        assert!(transport.envelopes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_blank_credentials_rejected() {
        for (uri, body) in [
            ("/api/account/login", json!({"username": " ", "password": " "})),
            ("/api/account/register", json!({"username": "   ", "password": "      "})),
        ] {
            let (app, transport) = app(result_body("{}"));
            let (status, body) = post_json(app, uri, body).await;

            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body["success"], false);
            assert_eq!(body["errors"][0]["key"], "password");
            assert_eq!(body["errors"][1]["key"], "username");
            assert!(transport.envelopes.lock().unwrap().is_empty(), "{uri}");
        }
    }

    #[tokio::test]
    async fn test_missing_field_is_validation_error() {
        let (app, transport) = app(result_body("{}"));
        let (status, body) =
            post_json(app, "/api/account/register", json!({"password": "secret1"})).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["errors"].as_array().unwrap().len(), 1);
        assert_eq!(body["errors"][0]["key"], "username");
        assert!(transport.envelopes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_undecodable_body_is_bad_request() {
        let (app, _) = app(result_body("{}"));
        let (status, body) = post_json(
            app,
            "/api/account/register",
            json!({"username": "annie", "password": "secret1", "countryId": "x"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["errors"][0]["key"], "body");
        assert!(body["errors"][0]["message"].as_str().unwrap().contains("countryId"));

        let (app, _) = self::app(result_body("{}"));
        let request = Request::builder()
            .method("POST")
            .uri("/api/account/login")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["errors"][0]["key"], "body");
    }

    #[test]
    fn test_wire_key() {
        assert_eq!(wire_key("username"), "username");
        assert_eq!(wire_key("country_id"), "countryId");
        assert_eq!(wire_key("signup_ip"), "signupIp");
        assert_eq!(wire_key("_private"), "private");
    }

    #[tokio::test]
    async fn test_register_ok_without_details() {
        let (app, transport) =
            app(result_body(r#"{"ResultCode":0,"ResultMessage":"Created","Id":9}"#));
        let (status, body) = post_json(
            app,
            "/api/account/register",
            json!({"username": "ann@example.com", "password": "secret1", "mobile": "555"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["resultCode"], 0);
        assert_eq!(body["message"], "Created");
        assert!(body.get("details").is_none());

        let envelope = transport.envelopes.lock().unwrap()[0].clone();
        assert!(envelope.contains("<FirstName>ann@example.com</FirstName>"));
        assert!(envelope.contains("<Mobile>555</Mobile>"));
        assert!(envelope.contains("<SignupIP>203.0.113.9</SignupIP>"));
    }

    #[tokio::test]
    async fn test_register_validation_errors() {
        let (app, _) = app(result_body("{}"));
        let (status, body) = post_json(
            app,
            "/api/account/register",
            json!({"username": "ab", "password": "123", "countryId": 0}),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        let keys: Vec<&str> = body["errors"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["key"].as_str().unwrap())
            .collect();
        assert_eq!(keys, vec!["countryId", "password", "username"]);
    }

    #[tokio::test]
    async fn test_transport_failure_is_bad_gateway() {
        let (app, _) = app(Reply::Status(503));
        let (status, body) = post_json(
            app,
            "/api/account/register",
            json!({"username": "ann@example.com", "password": "secret1"}),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "TRANSPORT_FAILURE");
        assert_eq!(
            body["message"],
            "SOAP action 'RegisterNewCustomer' failed with status 503. Response body: Service Unavailable"
        );
    }

    #[tokio::test]
    async fn test_unexpected_failure_hides_details() {
        let (app, _) = app(Reply::Broken);
        let (status, body) = post_json(
            app,
            "/api/account/login",
            json!({"username": "bob", "password": "pw"}),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "UNEXPECTED_FAILURE");
        assert_eq!(body["message"], UNEXPECTED_ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn test_unparseable_payload_is_ok_response() {
        let (app, _) = app(Reply::Body("plain text".to_string()));
        let (status, body) = post_json(
            app,
            "/api/account/login",
            json!({"username": "bob", "password": "pw"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], false);
        assert_eq!(body["details"][0]["label"], "raw");
        assert_eq!(body["details"][0]["value"], "plain text");
    }
}
