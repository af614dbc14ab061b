#![warn(missing_docs)]
//! # smart-attend-app
//!
//! ## Purpose
//! Wires configuration, the widget host, the screens, and the collaborators
//! into the attendance and face-registration flows.
//!
//! ## Responsibilities
//! - Load [`AppConfig`] from `SMART_ATTEND_*` environment variables.
//! - Mount widgets through [`WidgetHost`] and route bridge callbacks into
//!   the screen controllers on the UI thread.
//! - Turn an authenticated roll number plus the detected classroom into an
//!   attendance record through an [`AttendanceRecorder`].
//! - Provide log redaction for anything that looks like a credential.
//!
//! ## Data flow
//! Env -> [`AppConfig`] -> [`WidgetHost`] -> mounted widget -> bridge ->
//! callback queue -> screen -> command -> collaborator -> screen.
//!
//! ## Ownership and lifetimes
//! Controllers own the mounted widget and the screen. Callback closures
//! share a single-threaded queue with their controller, so controllers stay
//! on the UI thread.
//!
//! ## Error model
//! Subsystem failures are wrapped in [`AppError`]. Malformed configuration
//! values fall back to defaults with a warning.
//!
//! ## Security and privacy notes
//! - Widget URLs must be HTTPS; validation happens before any mount.
//! - [`redact_sensitive`] strips token/credential values from log lines.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::sync::mpsc::Sender;

use log::{debug, info, warn};
use smart_attend_ble::{BleRepository, BleViewModel};
use smart_attend_bridge::{
    AuthenticationCallbacks, BridgeError, BridgeOptions, DEFAULT_UNKNOWN_ROLL_PLACEHOLDER,
    HostCallbacks, RegistrationCallbacks, UiWaker,
};
use smart_attend_core::{AttendanceSuccessData, ProfileData, SessionType};
use smart_attend_profile::ProfileError;
use smart_attend_ui::{
    AttendanceCommand, AttendanceScreen, FaceRegistrationScreen, RegistrationCommand,
};
use smart_attend_webview::{
    BrowserView, DEFAULT_BASE_URL, DEFAULT_FACEIO_APP_ID, DEFAULT_SDK_SCRIPT_URL, HostError,
    MountedWidget, WidgetDocumentConfig, WidgetHost, WidgetKind, WidgetTiming,
};
use thiserror::Error;

/// Build-time application version loaded from root `VERSION` file.
pub const APP_VERSION: &str = env!("SMART_ATTEND_VERSION");

/// Returns the app version sourced from root `VERSION`.
pub fn app_version() -> &'static str {
    APP_VERSION
}

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// SDK application id.
    pub faceio_app_id: String,
    /// SDK script URL.
    pub sdk_script_url: String,
    /// Synthetic origin of the widget documents.
    pub base_url: String,
    /// Widget pacing delays.
    pub timing: WidgetTiming,
    /// Roll number used when an authentication payload lacks one.
    pub unknown_roll_placeholder: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            faceio_app_id: DEFAULT_FACEIO_APP_ID.to_string(),
            sdk_script_url: DEFAULT_SDK_SCRIPT_URL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timing: WidgetTiming::default(),
            unknown_roll_placeholder: DEFAULT_UNKNOWN_ROLL_PLACEHOLDER.to_string(),
        }
    }
}

impl AppConfig {
    /// Reads `SMART_ATTEND_*` variables from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`; absent keys keep defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let text = |key: &str, fallback: String| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .unwrap_or(fallback)
        };
        let millis = |key: &str, fallback: u64| match lookup(key) {
            None => fallback,
            Some(raw) => raw.trim().parse::<u64>().unwrap_or_else(|_| {
                warn!("ignoring malformed {key}={raw:?}, using {fallback}");
                fallback
            }),
        };

        let timing = WidgetTiming {
            init_delay_ms: millis("SMART_ATTEND_INIT_DELAY_MS", defaults.timing.init_delay_ms),
            trigger_delay_ms: millis(
                "SMART_ATTEND_TRIGGER_DELAY_MS",
                defaults.timing.trigger_delay_ms,
            ),
            auth_callback_delay_ms: millis(
                "SMART_ATTEND_AUTH_CALLBACK_DELAY_MS",
                defaults.timing.auth_callback_delay_ms,
            ),
            registration_callback_delay_ms: millis(
                "SMART_ATTEND_REGISTRATION_CALLBACK_DELAY_MS",
                defaults.timing.registration_callback_delay_ms,
            ),
            default_callback_delay_ms: millis(
                "SMART_ATTEND_DEFAULT_CALLBACK_DELAY_MS",
                defaults.timing.default_callback_delay_ms,
            ),
        };

        Self {
            faceio_app_id: text("SMART_ATTEND_FACEIO_APP_ID", defaults.faceio_app_id),
            sdk_script_url: text("SMART_ATTEND_SDK_SCRIPT_URL", defaults.sdk_script_url),
            base_url: text("SMART_ATTEND_BASE_URL", defaults.base_url),
            timing,
            unknown_roll_placeholder: text(
                "SMART_ATTEND_UNKNOWN_ROLL_PLACEHOLDER",
                defaults.unknown_roll_placeholder,
            ),
        }
    }

    /// Validated document configuration.
    ///
    /// # Errors
    /// Returns [`AppError::Host`] when a URL is not HTTPS or the app id is
    /// blank.
    pub fn document_config(&self) -> Result<WidgetDocumentConfig, AppError> {
        Ok(WidgetDocumentConfig::new(
            self.faceio_app_id.clone(),
            &self.sdk_script_url,
            &self.base_url,
            self.timing,
        )?)
    }

    /// Bridge translation options.
    pub fn bridge_options(&self) -> BridgeOptions {
        BridgeOptions {
            unknown_roll_placeholder: self.unknown_roll_placeholder.clone(),
        }
    }

    /// Widget host built from this configuration.
    ///
    /// # Errors
    /// Same as [`AppConfig::document_config`].
    pub fn widget_host(&self) -> Result<WidgetHost, AppError> {
        Ok(WidgetHost::new(self.document_config()?).with_bridge_options(self.bridge_options()))
    }
}

const SECRET_KEYS: [&str; 5] = ["password", "token", "authorization", "bearer", "secret"];

/// Masks every `key=value` / `key: value` pair whose key names a secret.
pub fn redact_sensitive(input: &str) -> String {
    let mut output = Vec::new();
    let mut mask_next = false;
    for word in input.split(' ') {
        let lower = word.to_ascii_lowercase();
        if mask_next && !word.is_empty() {
            if lower == "bearer" {
                output.push(word.to_string());
            } else {
                output.push("<redacted>".to_string());
                mask_next = false;
            }
            continue;
        }

        let Some(key) = SECRET_KEYS.iter().find(|key| lower.contains(*key)) else {
            output.push(word.to_string());
            continue;
        };

        match word.find(['=', ':']) {
            Some(split) if split + 1 < word.len() => {
                output.push(format!("{}<redacted>", &word[..=split]));
                mask_next = &lower[split + 1..] == "bearer";
            }
            Some(_) => {
                output.push(word.to_string());
                mask_next = true;
            }
            None if lower == *key => {
                output.push(word.to_string());
                mask_next = true;
            }
            None => output.push(word.to_string()),
        }
    }
    output.join(" ")
}

/// [`UiWaker`] that posts a unit message to the UI loop.
#[derive(Debug)]
pub struct ChannelWaker {
    sender: Mutex<Sender<()>>,
}

impl ChannelWaker {
    /// Wraps the UI loop's sender.
    pub fn new(sender: Sender<()>) -> Self {
        Self {
            sender: Mutex::new(sender),
        }
    }
}

impl UiWaker for ChannelWaker {
    fn wake(&self) {
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if sender.send(()).is_err() {
            debug!("ui loop gone, wake dropped");
        }
    }
}

/// Everything needed to record one attendance entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceRequest {
    /// Authenticated roll number.
    pub roll_number: String,
    /// Student display name.
    pub student_name: String,
    /// Subject code advertised by the classroom beacon.
    pub subject: String,
    /// Room name without beacon digits.
    pub room: String,
    /// Full beacon device name.
    pub device_room: String,
    /// Lecture, lab, or tutorial.
    pub session_type: SessionType,
}

impl AttendanceRequest {
    /// Builds a request from the authenticated roll number, the stored
    /// profile, and the beacon the scanner detected.
    ///
    /// # Errors
    /// Returns [`AppError::NoClassroomDetected`] when no beacon has been
    /// seen.
    pub fn from_presence<R: BleRepository>(
        roll_number: &str,
        profile: &ProfileData,
        ble: &BleViewModel<R>,
        session_type: SessionType,
    ) -> Result<Self, AppError> {
        let (Some(device_room), Some(room)) =
            (ble.get_detected_device_room(), ble.get_detected_room_name())
        else {
            return Err(AppError::NoClassroomDetected);
        };

        Ok(Self {
            roll_number: roll_number.to_string(),
            student_name: profile.name.clone(),
            subject: ble.get_detected_subject_code().unwrap_or_default(),
            room,
            device_room,
            session_type,
        })
    }
}

/// Attendance store.
pub trait AttendanceRecorder {
    /// Records one entry.
    ///
    /// # Errors
    /// Returns [`AppError::AttendanceRejected`] when the store refuses it.
    fn mark_attendance(
        &mut self,
        request: &AttendanceRequest,
    ) -> Result<AttendanceSuccessData, AppError>;
}

/// Attendance store kept in process memory; refuses duplicate
/// roll/subject pairs.
#[derive(Debug, Default)]
pub struct InMemoryAttendanceRecorder {
    records: Vec<AttendanceSuccessData>,
}

impl InMemoryAttendanceRecorder {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded entries, oldest first.
    pub fn records(&self) -> &[AttendanceSuccessData] {
        &self.records
    }
}

impl AttendanceRecorder for InMemoryAttendanceRecorder {
    fn mark_attendance(
        &mut self,
        request: &AttendanceRequest,
    ) -> Result<AttendanceSuccessData, AppError> {
        let duplicate = self.records.iter().any(|record| {
            record.roll_number == request.roll_number && record.subject == request.subject
        });
        if duplicate {
            return Err(AppError::AttendanceRejected(format!(
                "Attendance already marked for {}",
                request.subject
            )));
        }

        let record = AttendanceSuccessData::new(
            request.roll_number.clone(),
            request.student_name.clone(),
            request.subject.clone(),
            request.room.clone(),
            request.session_type,
        )
        .with_device_room(request.device_room.clone())
        .with_attendance_id(format!("att-{}", self.records.len() + 1));
        self.records.push(record.clone());
        Ok(record)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AuthEvent {
    Authenticated(String),
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum EnrollEvent {
    Registered(String),
    Error(String),
    Closed,
}

type EventQueue<T> = Rc<RefCell<VecDeque<T>>>;

fn enqueue<T>(queue: &EventQueue<T>, event: T) {
    queue.borrow_mut().push_back(event);
}

/// Drives the attendance screen and its authentication widget.
pub struct AttendanceController<V: BrowserView> {
    host: WidgetHost,
    waker: Arc<dyn UiWaker>,
    screen: AttendanceScreen,
    widget: Option<MountedWidget<V>>,
    events: EventQueue<AuthEvent>,
}

impl<V: BrowserView> AttendanceController<V> {
    /// Creates the controller; nothing is mounted until the camera is
    /// granted.
    pub fn new(host: WidgetHost, waker: Arc<dyn UiWaker>) -> Self {
        Self {
            host,
            waker,
            screen: AttendanceScreen::new(),
            widget: None,
            events: Rc::new(RefCell::new(VecDeque::new())),
        }
    }

    /// Screen state.
    pub fn screen(&self) -> &AttendanceScreen {
        &self.screen
    }

    /// Mounted widget, if any.
    pub fn widget(&self) -> Option<&MountedWidget<V>> {
        self.widget.as_ref()
    }

    /// Records the permission answer and mounts the widget into `view`
    /// when granted.
    ///
    /// # Errors
    /// Returns [`AppError::Host`] when mounting fails.
    pub fn on_permission_result(&mut self, granted: bool, view: V) -> Result<(), AppError> {
        self.screen.on_permission_result(granted);
        if granted {
            self.mount(view)?;
        }
        Ok(())
    }

    fn mount(&mut self, view: V) -> Result<(), AppError> {
        self.widget = None;
        let (authenticated, failed) = (Rc::clone(&self.events), Rc::clone(&self.events));
        let callbacks = HostCallbacks::Authentication(AuthenticationCallbacks::new(
            move |roll_number| {
                enqueue(&authenticated, AuthEvent::Authenticated(roll_number));
                Ok(())
            },
            move |message| {
                enqueue(&failed, AuthEvent::Error(message));
                Ok(())
            },
        ));
        let widget = self.host.mount(
            view,
            WidgetKind::Authentication,
            callbacks,
            Arc::clone(&self.waker),
        )?;
        self.widget = Some(widget);
        Ok(())
    }

    /// Drains bridge events into the screen and returns the commands the
    /// caller must act on.
    pub fn pump(&mut self, now_ms: u64) -> Vec<AttendanceCommand> {
        if let Some(widget) = self.widget.as_mut() {
            let report = widget.pump();
            if report.failed > 0 {
                warn!("{} attendance callbacks failed", report.failed);
            }
        }

        let mut commands = Vec::new();
        let pending: Vec<AuthEvent> = self.events.borrow_mut().drain(..).collect();
        for event in pending {
            match event {
                AuthEvent::Authenticated(roll_number) => {
                    commands.extend(self.screen.on_authenticated(&roll_number));
                }
                AuthEvent::Error(message) => self.screen.on_error(&message, now_ms),
            }
        }
        self.screen.on_tick(now_ms);
        commands
    }

    /// Applies the attendance store's answer. A refusal remounts a fresh
    /// widget into `fresh_view`.
    ///
    /// # Errors
    /// Returns [`AppError::Host`] when the remount fails.
    pub fn complete(
        &mut self,
        outcome: Result<AttendanceSuccessData, AppError>,
        now_ms: u64,
        fresh_view: V,
    ) -> Result<(), AppError> {
        match outcome {
            Ok(record) => {
                info!("attendance confirmed for subject {}", record.subject);
                self.widget = None;
                self.screen.on_attendance_recorded(record);
                Ok(())
            }
            Err(error) => {
                let message = match error {
                    AppError::AttendanceRejected(message) => message,
                    other => other.to_string(),
                };
                self.screen.on_attendance_failed(&message, now_ms);
                self.mount(fresh_view)
            }
        }
    }
}

/// Drives the face registration screen and its registration widget.
pub struct RegistrationController<V: BrowserView> {
    screen: FaceRegistrationScreen,
    widget: Option<MountedWidget<V>>,
    events: EventQueue<EnrollEvent>,
}

impl<V: BrowserView> RegistrationController<V> {
    /// Creates the controller for `roll_number`.
    pub fn new(roll_number: impl Into<String>) -> Self {
        Self {
            screen: FaceRegistrationScreen::new(roll_number),
            widget: None,
            events: Rc::new(RefCell::new(VecDeque::new())),
        }
    }

    /// Screen state.
    pub fn screen(&self) -> &FaceRegistrationScreen {
        &self.screen
    }

    /// Mounted widget, if any.
    pub fn widget(&self) -> Option<&MountedWidget<V>> {
        self.widget.as_ref()
    }

    /// Records the permission answer and mounts the widget when granted.
    ///
    /// # Errors
    /// Returns [`AppError::Host`] when mounting fails.
    pub fn on_permission_result(
        &mut self,
        granted: bool,
        host: &WidgetHost,
        view: V,
        waker: Arc<dyn UiWaker>,
    ) -> Result<(), AppError> {
        self.screen.on_permission_result(granted);
        if !granted {
            return Ok(());
        }

        let (registered, failed, closed) = (
            Rc::clone(&self.events),
            Rc::clone(&self.events),
            Rc::clone(&self.events),
        );
        let callbacks = HostCallbacks::Registration(RegistrationCallbacks::new(
            move |face_id| {
                enqueue(&registered, EnrollEvent::Registered(face_id));
                Ok(())
            },
            move |message| {
                enqueue(&failed, EnrollEvent::Error(message));
                Ok(())
            },
            move || {
                enqueue(&closed, EnrollEvent::Closed);
                Ok(())
            },
        ));
        let kind = WidgetKind::Registration {
            roll_number: self.screen.roll_number().to_string(),
        };
        self.widget = Some(host.mount(view, kind, callbacks, waker)?);
        Ok(())
    }

    /// Drains bridge events into the screen and returns the commands for
    /// the parent screen.
    pub fn pump(&mut self, now_ms: u64) -> Vec<RegistrationCommand> {
        if let Some(widget) = self.widget.as_mut() {
            widget.pump();
        }

        let mut commands = Vec::new();
        let pending: Vec<EnrollEvent> = self.events.borrow_mut().drain(..).collect();
        for event in pending {
            match event {
                EnrollEvent::Registered(face_id) => {
                    if let Some(command) = self.screen.on_face_registered(&face_id) {
                        commands.push(command);
                        self.screen.on_success_handled(now_ms);
                        self.widget = None;
                    }
                }
                EnrollEvent::Error(message) => {
                    commands.push(self.screen.on_registration_error(&message, now_ms));
                }
                EnrollEvent::Closed => commands.push(self.screen.on_widget_closed()),
            }
        }
        commands.extend(self.screen.on_tick(now_ms));
        commands
    }
}

/// App integration error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Widget host or configuration error.
    #[error("widget host error: {0}")]
    Host(#[from] HostError),
    /// Bridge envelope error.
    #[error("bridge error: {0}")]
    Bridge(#[from] BridgeError),
    /// Profile store error.
    #[error("profile error: {0}")]
    Profile(#[from] ProfileError),
    /// No classroom beacon has been detected yet.
    #[error("No classroom detected. Move closer to the classroom beacon")]
    NoClassroomDetected,
    /// Attendance store refused the entry.
    #[error("{0}")]
    AttendanceRejected(String),
}
