//! Request and result types exchanged with the gateway.

use crate::interpreter::{DetailEntry, InterpretedResult};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use validator::{Validate, ValidationError};

/// Address used when the caller's IP is unknown.
pub const DEFAULT_IP: &str = "127.0.0.1";

/// Mobile number sent when the registrant gives none.
pub const DEFAULT_MOBILE: &str = "0000000000";

pub const DEFAULT_COUNTRY_ID: i32 = 1;
pub const DEFAULT_AFFILIATE_ID: i32 = 0;

/// Blank or missing IPs become [`DEFAULT_IP`]; others are trimmed.
pub fn normalize_ip(ip: Option<&str>) -> String {
    match ip.map(str::trim) {
        Some(ip) if !ip.is_empty() => ip.to_string(),
        _ => DEFAULT_IP.to_string(),
    }
}

/// Rejects values that are empty once trimmed.
fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank")
            .with_message(Cow::Borrowed("The field is required and must not be blank.")));
    }
    Ok(())
}

/// Login request body. Missing credentials deserialize as empty and fail
/// validation.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(
        length(min = 1, message = "The Username field is required."),
        custom(function = "not_blank")
    )]
    pub username: String,

    #[serde(default)]
    #[validate(
        length(min = 1, message = "The Password field is required."),
        custom(function = "not_blank")
    )]
    pub password: String,
}

/// Registration request body.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(
        length(min = 3, message = "Username must be at least 3 characters."),
        custom(function = "not_blank")
    )]
    pub username: String,

    #[serde(default)]
    #[validate(
        length(min = 6, message = "Password must be at least 6 characters."),
        custom(function = "not_blank")
    )]
    pub password: String,

    pub first_name: Option<String>,

    pub last_name: Option<String>,

    pub mobile: Option<String>,

    #[serde(default = "default_country_id")]
    #[validate(range(min = 1, message = "CountryId must be a positive number."))]
    pub country_id: i32,

    #[serde(default)]
    #[validate(range(min = 0, message = "AffiliateId must not be negative."))]
    pub affiliate_id: i32,

    pub signup_ip: Option<String>,
}

fn default_country_id() -> i32 {
    DEFAULT_COUNTRY_ID
}

/// Registration data as sent upstream. Built once per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationInput {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub mobile: String,
    pub country_id: i32,
    pub affiliate_id: i32,
    pub signup_ip: String,
}

impl RegistrationInput {
    /// Apply the registration defaults to a request.
    ///
    /// Blank names fall back to the username, a blank mobile to
    /// [`DEFAULT_MOBILE`] and a blank signup IP to `client_ip`.
    pub fn from_request(request: &RegisterRequest, client_ip: Option<&str>) -> Self {
        let username = request.username.trim().to_string();

        Self {
            email: username.clone(),
            password: request.password.trim().to_string(),
            first_name: non_blank(request.first_name.as_deref()).unwrap_or_else(|| username.clone()),
            last_name: non_blank(request.last_name.as_deref()).unwrap_or_else(|| username.clone()),
            mobile: non_blank(request.mobile.as_deref())
                .unwrap_or_else(|| DEFAULT_MOBILE.to_string()),
            country_id: if request.country_id <= 0 {
                DEFAULT_COUNTRY_ID
            } else {
                request.country_id
            },
            affiliate_id: request.affiliate_id.max(DEFAULT_AFFILIATE_ID),
            signup_ip: non_blank(request.signup_ip.as_deref())
                .unwrap_or_else(|| normalize_ip(client_ip)),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Outcome of a login call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResult {
    pub success: bool,
    pub message: String,
    pub result_code: Option<i32>,
    pub details: Vec<DetailEntry>,
    pub raw: String,
}

impl From<InterpretedResult> for LoginResult {
    fn from(result: InterpretedResult) -> Self {
        Self {
            success: result.success,
            message: result.message,
            result_code: result.code,
            details: result.details,
            raw: result.raw,
        }
    }
}

/// Outcome of a registration call. Carries no details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResult {
    pub success: bool,
    pub message: String,
    pub result_code: Option<i32>,
    pub raw: String,
}

impl From<InterpretedResult> for RegisterResult {
    fn from(result: InterpretedResult) -> Self {
        Self {
            success: result.success,
            message: result.message,
            result_code: result.code,
            raw: result.raw,
        }
    }
}
