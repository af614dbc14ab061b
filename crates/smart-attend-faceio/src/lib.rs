#![warn(missing_docs)]
//! # smart-attend-faceio
//!
//! ## Purpose
//! Defines the contract with the third-party face-recognition SDK that runs
//! inside the embedded web content.
//!
//! ## Responsibilities
//! - Hold the one error-code table used by both the authentication and the
//!   registration widget.
//! - Describe the option objects passed to `authenticate()` and `enroll()`.
//! - Parse SDK resolution values into typed results.
//!
//! ## Data flow
//! SDK promise settles in the browser engine -> raw JSON value crosses the
//! bridge -> [`parse_authenticate_result`] / [`parse_enroll_result`] or
//! [`describe_error`] -> host callbacks receive plain strings.
//!
//! ## Ownership and lifetimes
//! Parsed values own their strings; nothing borrows from the message buffer.
//!
//! ## Error model
//! Malformed resolutions and missing identifier fields return [`FaceIoError`].
//! Whether a missing roll number is fatal is decided by the caller.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Locale passed to every SDK call.
pub const SDK_LOCALE_AUTO: &str = "auto";

/// Marker stored in the enrolment payload for self-service registrations.
pub const REGISTERED_BY_STUDENT: &str = "student";

/// Error enumeration documented by the SDK (`fioErrCode`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    /// Camera access refused by the end user.
    PermissionRefused,
    /// No face in front of the camera.
    NoFacesDetected,
    /// Face not present in the application's facial index.
    UnrecognizedFace,
    /// More than one face in frame.
    ManyFaces,
    /// Face already enrolled.
    FaceDuplication,
    /// Minor detected during enrolment.
    MinorsNotAllowed,
    /// Presentation (spoof) attack detected.
    PadAttack,
    /// Facial vectors of the enrolling user do not match.
    FaceMismatch,
    /// Wrong PIN supplied.
    WrongPinCode,
    /// Server-side processing error.
    ProcessingErr,
    /// Application not allowed to perform the operation.
    Unauthorized,
    /// Terms and conditions rejected.
    TermsNotAccepted,
    /// Widget could not be injected into the DOM.
    UiNotReady,
    /// Client session expired.
    SessionExpired,
    /// Operation timed out.
    Timeout,
    /// Freemium instantiation rate exceeded.
    TooManyRequests,
    /// Origin/Referer header missing.
    EmptyOrigin,
    /// Origin not allowed to load the SDK.
    ForbiddenOrigin,
    /// Country not allowed to load the SDK.
    ForbiddenCountry,
    /// Another session is already in progress.
    SessionInProgress,
    /// Network failure talking to the processing node.
    NetworkIo,
}

/// One row of the shared error-code table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ErrorCodeEntry {
    /// Typed code.
    #[serde(skip)]
    pub code: ErrorCode,
    /// Numeric value reported by the SDK.
    pub value: u8,
    /// Symbolic name used by the SDK (`fioErrCode.<symbol>`).
    pub symbol: &'static str,
    /// User-facing description.
    pub message: &'static str,
}

const fn entry(
    code: ErrorCode,
    value: u8,
    symbol: &'static str,
    message: &'static str,
) -> ErrorCodeEntry {
    ErrorCodeEntry {
        code,
        value,
        symbol,
        message,
    }
}

/// The SDK error table, ordered by numeric value.
pub const ERROR_CODE_TABLE: [ErrorCodeEntry; 21] = [
    entry(
        ErrorCode::PermissionRefused,
        1,
        "PERMISSION_REFUSED",
        "Access to the Camera stream was denied by the end user",
    ),
    entry(
        ErrorCode::NoFacesDetected,
        2,
        "NO_FACES_DETECTED",
        "No faces were detected during the enroll or authentication process",
    ),
    entry(
        ErrorCode::UnrecognizedFace,
        3,
        "UNRECOGNIZED_FACE",
        "Unrecognized face on this application's Facial Index",
    ),
    entry(
        ErrorCode::ManyFaces,
        4,
        "MANY_FACES",
        "Two or more faces were detected during the scan process",
    ),
    entry(
        ErrorCode::FaceDuplication,
        5,
        "FACE_DUPLICATION",
        "User enrolled previously (facial features already recorded). Cannot enroll again!",
    ),
    entry(
        ErrorCode::MinorsNotAllowed,
        6,
        "MINORS_NOT_ALLOWED",
        "Minors are not allowed to enroll on this application!",
    ),
    entry(
        ErrorCode::PadAttack,
        7,
        "PAD_ATTACK",
        "Presentation (Spoof) Attack (PAD) detected during the scan process",
    ),
    entry(
        ErrorCode::FaceMismatch,
        8,
        "FACE_MISMATCH",
        "Calculated Facial Vectors of the user being enrolled do not matches",
    ),
    entry(
        ErrorCode::WrongPinCode,
        9,
        "WRONG_PIN_CODE",
        "Wrong PIN code supplied by the user being authenticated",
    ),
    entry(
        ErrorCode::ProcessingErr,
        10,
        "PROCESSING_ERR",
        "Server side error",
    ),
    entry(
        ErrorCode::Unauthorized,
        11,
        "UNAUTHORIZED",
        "Your application is not allowed to perform the requested operation",
    ),
    entry(
        ErrorCode::TermsNotAccepted,
        12,
        "TERMS_NOT_ACCEPTED",
        "Terms & Conditions rejected by the end user",
    ),
    entry(
        ErrorCode::UiNotReady,
        13,
        "UI_NOT_READY",
        "The FACEIO Widget could not be injected onto the client DOM",
    ),
    entry(
        ErrorCode::SessionExpired,
        14,
        "SESSION_EXPIRED",
        "Client session expired",
    ),
    entry(
        ErrorCode::Timeout,
        15,
        "TIMEOUT",
        "Ongoing operation timed out",
    ),
    entry(
        ErrorCode::TooManyRequests,
        16,
        "TOO_MANY_REQUESTS",
        "Widget instantiation requests exceeded for freemium applications",
    ),
    entry(
        ErrorCode::EmptyOrigin,
        17,
        "EMPTY_ORIGIN",
        "Origin or Referer HTTP request header is empty or missing",
    ),
    entry(
        ErrorCode::ForbiddenOrigin,
        18,
        "FORBIDDDEN_ORIGIN",
        "Domain origin is forbidden from instantiating fio.js",
    ),
    entry(
        ErrorCode::ForbiddenCountry,
        19,
        "FORBIDDDEN_COUNTRY",
        "Country ISO-3166-1 Code is forbidden from instantiating fio.js",
    ),
    entry(
        ErrorCode::SessionInProgress,
        20,
        "SESSION_IN_PROGRESS",
        "Another authentication or enrollment session is in progress",
    ),
    entry(
        ErrorCode::NetworkIo,
        21,
        "NETWORK_IO",
        "Error while establishing network connection with the target FACEIO processing node",
    ),
];

impl ErrorCode {
    /// Returns the table row for this code.
    pub fn entry(self) -> &'static ErrorCodeEntry {
        // Table rows are ordered by enum declaration.
        &ERROR_CODE_TABLE[self as usize]
    }

    /// Looks up a code by its numeric SDK value.
    pub fn from_value(value: i64) -> Option<Self> {
        ERROR_CODE_TABLE
            .iter()
            .find(|row| i64::from(row.value) == value)
            .map(|row| row.code)
    }

    /// Looks up a code by its SDK symbol, case-insensitively.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let symbol = symbol.trim();
        ERROR_CODE_TABLE
            .iter()
            .find(|row| row.symbol.eq_ignore_ascii_case(symbol))
            .map(|row| row.code)
    }

    /// User-facing description.
    pub fn message(self) -> &'static str {
        self.entry().message
    }

    /// Numeric SDK value.
    pub fn value(self) -> u8 {
        self.entry().value
    }
}

/// Raw SDK rejection value as received over the bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawErrorCode {
    /// Numeric `fioErrCode` value.
    Numeric(i64),
    /// Symbolic name or stringified number.
    Text(String),
}

impl RawErrorCode {
    /// Resolves the raw value against the shared table.
    pub fn resolve(&self) -> Option<ErrorCode> {
        match self {
            Self::Numeric(value) => ErrorCode::from_value(*value),
            Self::Text(text) => text
                .trim()
                .parse::<i64>()
                .ok()
                .and_then(ErrorCode::from_value)
                .or_else(|| ErrorCode::from_symbol(text)),
        }
    }
}

impl std::fmt::Display for RawErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Numeric(value) => write!(f, "{value}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

/// How to describe codes missing from the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownCodePolicy {
    /// Treat the code as a network failure (authentication widget).
    TreatAsNetworkError,
    /// Report the raw code back to the user (registration widget).
    ReportCode,
}

impl UnknownCodePolicy {
    /// Fixed text shown for unknown codes, or `None` when the code itself
    /// is reported.
    pub fn fallback_message(self) -> Option<&'static str> {
        match self {
            Self::TreatAsNetworkError => Some(ErrorCode::NetworkIo.message()),
            Self::ReportCode => None,
        }
    }
}

/// Maps a raw SDK rejection value to the user-facing message.
pub fn describe_error(raw: &RawErrorCode, policy: UnknownCodePolicy) -> String {
    match raw.resolve() {
        Some(code) => code.message().to_string(),
        None => policy
            .fallback_message()
            .map(str::to_string)
            .unwrap_or_else(|| format!("Unknown error occurred (Code: {raw})")),
    }
}

/// Serializes the table as a JSON object keyed by numeric value.
///
/// The embedded content uses this to render status text; the host uses
/// [`describe_error`] for the message it delivers to callbacks.
pub fn error_table_json() -> String {
    let table: serde_json::Map<String, Value> = ERROR_CODE_TABLE
        .iter()
        .map(|row| (row.value.to_string(), Value::String(row.message.to_string())))
        .collect();
    Value::Object(table).to_string()
}

/// Options passed to `faceio.authenticate()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthenticateOptions {
    /// UI locale.
    pub locale: String,
}

impl Default for AuthenticateOptions {
    fn default() -> Self {
        Self {
            locale: SDK_LOCALE_AUTO.to_string(),
        }
    }
}

/// Metadata stored with a new enrolment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollPayload {
    /// Student roll number.
    pub roll_number: String,
    /// Who initiated the enrolment.
    pub registered_by: String,
    /// ISO-8601 timestamp; stamped by the embedded content at call time when
    /// absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_date: Option<String>,
}

/// Options passed to `faceio.enroll()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollOptions {
    /// UI locale.
    pub locale: String,
    /// Metadata stored with the facial index entry.
    pub payload: EnrollPayload,
    /// Whether the SDK shows its own consent screen.
    pub user_consent: bool,
    /// Seconds the intro screen stays visible.
    pub enroll_intro_timeout: u32,
    /// Skips the boarding-pass (PIN) step.
    pub no_boarding_pass: bool,
}

impl EnrollOptions {
    /// Builds the self-registration options for one student.
    pub fn for_student(roll_number: impl Into<String>) -> Self {
        Self {
            locale: SDK_LOCALE_AUTO.to_string(),
            payload: EnrollPayload {
                roll_number: roll_number.into(),
                registered_by: REGISTERED_BY_STUDENT.to_string(),
                registration_date: None,
            },
            user_consent: false,
            enroll_intro_timeout: 1,
            no_boarding_pass: true,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AuthenticateResolution {
    #[serde(default)]
    payload: Option<AuthenticatePayload>,
    #[serde(default, rename = "facialId")]
    facial_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthenticatePayload {
    #[serde(default)]
    roll_number: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnrollResolution {
    #[serde(default)]
    facial_id: Option<Value>,
}

/// User identified by `authenticate()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// Roll number from the enrolment payload.
    pub roll_number: String,
    /// Facial identifier, when the SDK reports one.
    pub facial_id: Option<String>,
}

/// Parses an `authenticate()` resolution value.
///
/// # Errors
/// Returns [`FaceIoError::Decode`] when the value is not an object and
/// [`FaceIoError::MissingField`] when `payload.rollNumber` is absent or blank.
pub fn parse_authenticate_result(value: &Value) -> Result<AuthenticatedUser, FaceIoError> {
    let resolution: AuthenticateResolution =
        serde_json::from_value(value.clone()).map_err(FaceIoError::Decode)?;

    let roll_number = resolution
        .payload
        .and_then(|payload| payload.roll_number)
        .and_then(|raw| scalar_to_string(&raw))
        .ok_or(FaceIoError::MissingField("payload.rollNumber"))?;

    Ok(AuthenticatedUser {
        roll_number,
        facial_id: resolution.facial_id.filter(|id| !id.trim().is_empty()),
    })
}

/// Parses an `enroll()` resolution value into the facial identifier.
///
/// # Errors
/// Returns [`FaceIoError::Decode`] when the value is not an object and
/// [`FaceIoError::MissingField`] when `facialId` is absent or blank.
pub fn parse_enroll_result(value: &Value) -> Result<String, FaceIoError> {
    let resolution: EnrollResolution =
        serde_json::from_value(value.clone()).map_err(FaceIoError::Decode)?;

    resolution
        .facial_id
        .and_then(|raw| scalar_to_string(&raw))
        .ok_or(FaceIoError::MissingField("facialId"))
}

fn scalar_to_string(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// SDK contract errors.
#[derive(Debug, Error)]
pub enum FaceIoError {
    /// Resolution value did not have the expected shape.
    #[error("sdk result decode failure: {0}")]
    Decode(#[from] serde_json::Error),
    /// Required identifier field is absent or blank.
    #[error("sdk result missing field: {0}")]
    MissingField(&'static str),
}
