#![warn(missing_docs)]
//! # smart-attend-core
//!
//! ## Purpose
//! Defines the pure data model shared across the `smart-attend` workspace.
//!
//! ## Responsibilities
//! - Represent the terminal outcomes of one face-authentication or
//!   face-registration session.
//! - Represent attendance confirmations handed to the UI for display.
//! - Represent the student profile captured on the login screen.
//! - Name the failure taxonomy used for logging and UI routing.
//!
//! ## Data flow
//! The bridge crate turns embedded-content messages into [`AuthResult`] /
//! [`RegistrationResult`] values and hands them to the UI thread. Screens
//! tag camera refusals and user cancellations with a [`FailureKind`].
//! Attendance collaborators produce [`AttendanceSuccessData`], which screens
//! only display.
//!
//! ## Ownership and lifetimes
//! All values own their strings so they can cross the browser-engine thread
//! and the UI thread without borrowing from transient message buffers.
//!
//! ## Error model
//! Parse and codec failures return [`CoreError`].
//!
//! ## Example
//! ```rust
//! use smart_attend_core::{AttendanceSuccessData, SessionType};
//!
//! let record = AttendanceSuccessData::new("21BCE1234", "Asha", "CS301", "AB1", SessionType::Lab)
//!     .with_timestamp_ms(0);
//! assert_eq!(record.recorded_at_rfc3339().unwrap(), "1970-01-01T00:00:00Z");
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Outcome of one face-authentication session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthResult {
    /// Face recognised; carries the roll number stored with the enrolment.
    Authenticated {
        /// Roll number extracted from the SDK payload.
        roll_number: String,
    },
    /// Authentication attempt failed with a user-facing message.
    Failed {
        /// Human-readable failure text.
        error_message: String,
    },
}

impl AuthResult {
    /// Returns `true` for the single success outcome.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }
}

/// Outcome of one face-registration session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistrationResult {
    /// Face enrolled; carries the SDK facial identifier.
    Registered {
        /// Facial identifier returned by the SDK.
        face_id: String,
    },
    /// Enrolment attempt failed with a user-facing message.
    Failed {
        /// Human-readable failure text.
        error_message: String,
    },
    /// User closed the registration widget.
    Cancelled,
}

impl RegistrationResult {
    /// Returns `true` for the single success outcome.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Registered { .. })
    }
}

/// Failure taxonomy shared by bridge, host, and screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    /// SDK construction threw inside the embedded content.
    InitializationFailure,
    /// SDK rejected an authenticate/enroll call with a documented code.
    ScanFailure,
    /// A host-side callback failed while handling a bridge call.
    BridgeInvocationFailure,
    /// Host-level camera permission was refused.
    PermissionDenied,
    /// User closed the registration widget.
    UserCancelled,
}

impl FailureKind {
    /// Returns `true` when the user may retry without leaving the screen.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::ScanFailure | Self::BridgeInvocationFailure | Self::PermissionDenied
        )
    }
}

/// Class session type attached to an attendance record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionType {
    /// Lecture (`lect`).
    #[serde(rename = "lect")]
    Lecture,
    /// Laboratory (`lab`).
    #[serde(rename = "lab")]
    Lab,
    /// Tutorial (`tut`).
    #[serde(rename = "tut")]
    Tutorial,
}

impl SessionType {
    /// Wire code used by attendance collaborators.
    pub fn code(self) -> &'static str {
        match self {
            Self::Lecture => "lect",
            Self::Lab => "lab",
            Self::Tutorial => "tut",
        }
    }

    /// Display label for attendance confirmations.
    pub fn label(self) -> &'static str {
        match self {
            Self::Lecture => "Lecture",
            Self::Lab => "Lab",
            Self::Tutorial => "Tutorial",
        }
    }
}

impl FromStr for SessionType {
    type Err = CoreError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "lect" => Ok(Self::Lecture),
            "lab" => Ok(Self::Lab),
            "tut" => Ok(Self::Tutorial),
            other => Err(CoreError::InvalidSessionType(other.to_string())),
        }
    }
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Attendance confirmation shown after a successful authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceSuccessData {
    /// Student roll number.
    pub roll_number: String,
    /// Student display name.
    pub student_name: String,
    /// Subject code or name.
    pub subject: String,
    /// Room name without the beacon digits.
    pub room: String,
    /// Lecture, lab, or tutorial.
    #[serde(rename = "type")]
    pub session_type: SessionType,
    /// Full BLE device name including digits.
    #[serde(default)]
    pub device_room: String,
    /// Identifier assigned by the attendance store.
    #[serde(default)]
    pub attendance_id: String,
    /// Unix epoch milliseconds when attendance was recorded.
    pub timestamp_ms: u64,
}

impl AttendanceSuccessData {
    /// Creates a record stamped with the current wall-clock time.
    pub fn new(
        roll_number: impl Into<String>,
        student_name: impl Into<String>,
        subject: impl Into<String>,
        room: impl Into<String>,
        session_type: SessionType,
    ) -> Self {
        Self {
            roll_number: roll_number.into(),
            student_name: student_name.into(),
            subject: subject.into(),
            room: room.into(),
            session_type,
            device_room: String::new(),
            attendance_id: String::new(),
            timestamp_ms: now_epoch_ms(),
        }
    }

    /// Sets the full beacon device name.
    pub fn with_device_room(mut self, device_room: impl Into<String>) -> Self {
        self.device_room = device_room.into();
        self
    }

    /// Sets the attendance identifier.
    pub fn with_attendance_id(mut self, attendance_id: impl Into<String>) -> Self {
        self.attendance_id = attendance_id.into();
        self
    }

    /// Overrides the record timestamp.
    pub fn with_timestamp_ms(mut self, timestamp_ms: u64) -> Self {
        self.timestamp_ms = timestamp_ms;
        self
    }

    /// Formats the record timestamp as RFC 3339 in UTC.
    ///
    /// # Errors
    /// Returns [`CoreError::Timestamp`] when the value is outside the
    /// representable calendar range.
    pub fn recorded_at_rfc3339(&self) -> Result<String, CoreError> {
        let nanos = i128::from(self.timestamp_ms) * 1_000_000;
        let instant = OffsetDateTime::from_unix_timestamp_nanos(nanos)
            .map_err(|error| CoreError::Timestamp(error.to_string()))?;
        instant
            .format(&Rfc3339)
            .map_err(|error| CoreError::Timestamp(error.to_string()))
    }

    /// Returns the label/value rows rendered on the confirmation card.
    pub fn display_rows(&self) -> Vec<(&'static str, String)> {
        let mut rows = vec![
            ("Roll Number", self.roll_number.clone()),
            ("Name", self.student_name.clone()),
            ("Subject", self.subject.clone()),
            ("Room", self.room.clone()),
            ("Type", self.session_type.label().to_string()),
        ];
        if !self.device_room.is_empty() {
            rows.push(("Device", self.device_room.clone()));
        }
        if !self.attendance_id.is_empty() {
            rows.push(("Attendance ID", self.attendance_id.clone()));
        }
        rows
    }

    /// Serializes the record to compact JSON bytes.
    ///
    /// # Errors
    /// Returns [`CoreError::Codec`] when JSON serialization fails.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, CoreError> {
        serde_json::to_vec(self).map_err(CoreError::Codec)
    }

    /// Deserializes a record from JSON bytes.
    ///
    /// # Errors
    /// Returns [`CoreError::Codec`] when JSON decoding fails.
    pub fn from_json_bytes(raw: &[u8]) -> Result<Self, CoreError> {
        serde_json::from_slice(raw).map_err(CoreError::Codec)
    }
}

/// Student profile persisted by the profile collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileData {
    /// Full name.
    pub name: String,
    /// Roll number.
    pub roll_number: String,
    /// Class code, stored upper-case.
    pub class_name: String,
}

impl ProfileData {
    /// Returns `true` when name, roll number, and class are all non-blank.
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty()
            && !self.roll_number.trim().is_empty()
            && !self.class_name.trim().is_empty()
    }

    /// One-line summary used in debug logs.
    pub fn summary(&self) -> String {
        format!(
            "Profile: name='{}', rollNumber='{}', className='{}'",
            self.name, self.roll_number, self.class_name
        )
    }
}

/// Returns the current Unix time in milliseconds.
pub fn now_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// Error type for core model parsing and codec failures.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Session type code is not one of `lect`, `lab`, `tut`.
    #[error("invalid session type: {0}")]
    InvalidSessionType(String),
    /// Timestamp cannot be represented as a calendar date.
    #[error("invalid timestamp: {0}")]
    Timestamp(String),
    /// JSON encoding/decoding error.
    #[error("record codec failure: {0}")]
    Codec(#[from] serde_json::Error),
}
