#![warn(missing_docs)]
//! # smart-attend-ui
//!
//! ## Purpose
//! Screen-level controllers for the face registration, login, and
//! attendance flows.
//!
//! ## Responsibilities
//! - Gate the widget screens behind the host camera permission.
//! - Adapt widget callbacks into navigation and business commands.
//! - Validate the login form with the exact user-facing messages.
//! - Expire transient messages and schedule navigation with deadlines.
//!
//! ## Data flow
//! Bridge callbacks and user actions -> screen methods (with `now_ms`) ->
//! screen state + returned command -> app orchestration. `on_tick(now_ms)`
//! expires overlays and fires scheduled navigation.
//!
//! ## Ownership and lifetimes
//! Screens own their strings. The login screen owns the profile view model
//! and the nested registration screen while it is shown.
//!
//! ## Error model
//! User-visible failures are state (overlay text), not `Result`s.

use log::{debug, error, info, warn};
use smart_attend_core::{AttendanceSuccessData, FailureKind};
use smart_attend_profile::{ProfileRepository, ProfileViewModel};

/// Error overlay lifetime on the registration screen.
pub const REGISTRATION_ERROR_DISMISS_MS: u64 = 5_000;
/// Delay between registration success and navigating back.
pub const REGISTRATION_NAVIGATE_DELAY_MS: u64 = 3_000;
/// Error banner lifetime on the login screen.
pub const LOGIN_ERROR_DISMISS_MS: u64 = 3_000;
/// Delay between a successful sign-in and leaving the login screen.
pub const LOGIN_NAVIGATE_DELAY_MS: u64 = 1_500;
/// Error overlay lifetime on the attendance screen.
pub const ATTENDANCE_ERROR_DISMISS_MS: u64 = 5_000;
/// Minimum roll-number length accepted by the login form.
pub const MIN_ROLL_NUMBER_LEN: usize = 4;
/// Minimum name length accepted by the login form.
pub const MIN_NAME_LEN: usize = 2;

/// Text shown until a deadline passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransientMessage {
    /// Message text.
    pub text: String,
    /// Epoch milliseconds after which the message is hidden.
    pub expires_at_ms: u64,
}

impl TransientMessage {
    /// Creates a message visible for `lifetime_ms` from `now_ms`.
    pub fn new(text: impl Into<String>, now_ms: u64, lifetime_ms: u64) -> Self {
        Self {
            text: text.into(),
            expires_at_ms: now_ms.saturating_add(lifetime_ms),
        }
    }

    /// Returns `true` once `now_ms` reaches the deadline.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at_ms
    }
}

fn expire(message: &mut Option<TransientMessage>, now_ms: u64) {
    if message.as_ref().is_some_and(|message| message.is_expired(now_ms)) {
        *message = None;
    }
}

/// Host-level camera permission as seen by a screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraPermission {
    /// Request outstanding.
    Requesting,
    /// User granted the camera.
    Granted,
    /// User refused the camera.
    Denied,
}

/// App lifecycle transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// App came to the foreground.
    Resumed,
    /// App left the foreground.
    Paused,
    /// Any other transition.
    Other,
}

/// Routes lifecycle transitions to resume/pause handlers.
pub struct LifecycleObserver {
    on_resumed: Box<dyn FnMut()>,
    on_paused: Box<dyn FnMut()>,
}

impl LifecycleObserver {
    /// Observer with a resume handler and a no-op pause handler.
    pub fn new(on_resumed: impl FnMut() + 'static) -> Self {
        Self {
            on_resumed: Box::new(on_resumed),
            on_paused: Box::new(|| {}),
        }
    }

    /// Sets the pause handler.
    pub fn with_on_paused(mut self, on_paused: impl FnMut() + 'static) -> Self {
        self.on_paused = Box::new(on_paused);
        self
    }

    /// Dispatches `event`.
    pub fn dispatch(&mut self, event: LifecycleEvent) {
        match event {
            LifecycleEvent::Resumed => {
                debug!("app resumed, re-checking permissions");
                (self.on_resumed)();
            }
            LifecycleEvent::Paused => {
                debug!("app paused");
                (self.on_paused)();
            }
            LifecycleEvent::Other => {}
        }
    }
}

/// What the registration screen shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationView {
    /// Waiting for the camera permission answer.
    RequestingPermission,
    /// Retry/cancel prompt after a refusal.
    PermissionDenied,
    /// Registration widget mounted.
    Widget,
    /// Success being handed to the parent.
    Processing,
    /// Success card.
    Complete {
        /// Card text.
        message: String,
        /// Registered roll number.
        roll_number: String,
    },
}

/// Action requested by the registration screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationCommand {
    /// Ask the platform for the camera again.
    RequestCameraPermission,
    /// Registration succeeded with this facial id.
    Succeeded {
        /// Facial identifier.
        face_id: String,
    },
    /// Registration failed with this message.
    Failed {
        /// User-facing message.
        message: String,
    },
    /// Leave the screen.
    NavigateBack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RegistrationPhase {
    Widget,
    Processing,
    Complete,
}

/// Face registration screen controller.
#[derive(Debug, Clone)]
pub struct FaceRegistrationScreen {
    roll_number: String,
    permission: CameraPermission,
    phase: RegistrationPhase,
    face_id: Option<String>,
    error: Option<TransientMessage>,
    failure: Option<FailureKind>,
    navigate_at_ms: Option<u64>,
}

impl FaceRegistrationScreen {
    /// Creates the screen for `roll_number`, waiting on the camera.
    pub fn new(roll_number: impl Into<String>) -> Self {
        let roll_number = roll_number.into();
        debug!("face registration screen opened");
        Self {
            roll_number,
            permission: CameraPermission::Requesting,
            phase: RegistrationPhase::Widget,
            face_id: None,
            error: None,
            failure: None,
            navigate_at_ms: None,
        }
    }

    /// Roll number being registered.
    pub fn roll_number(&self) -> &str {
        &self.roll_number
    }

    /// Records the platform permission answer.
    pub fn on_permission_result(&mut self, granted: bool) {
        self.permission = if granted {
            debug!("camera permission granted for face registration");
            self.failure = None;
            CameraPermission::Granted
        } else {
            warn!(
                "{:?}: camera refused for face registration",
                FailureKind::PermissionDenied
            );
            self.failure = Some(FailureKind::PermissionDenied);
            CameraPermission::Denied
        };
    }

    /// Retry button on the denied prompt.
    pub fn retry_permission(&mut self) -> RegistrationCommand {
        self.permission = CameraPermission::Requesting;
        self.failure = None;
        RegistrationCommand::RequestCameraPermission
    }

    /// Cancel button on the denied prompt.
    pub fn cancel_permission(&self) -> RegistrationCommand {
        RegistrationCommand::NavigateBack
    }

    /// Current view.
    pub fn view(&self) -> RegistrationView {
        match (self.permission, self.phase) {
            (CameraPermission::Denied, _) => RegistrationView::PermissionDenied,
            (CameraPermission::Requesting, _) => RegistrationView::RequestingPermission,
            (CameraPermission::Granted, RegistrationPhase::Processing) => {
                RegistrationView::Processing
            }
            (CameraPermission::Granted, RegistrationPhase::Complete) => {
                RegistrationView::Complete {
                    message: "Face registered successfully!".to_string(),
                    roll_number: self.roll_number.clone(),
                }
            }
            (CameraPermission::Granted, RegistrationPhase::Widget) => RegistrationView::Widget,
        }
    }

    /// Widget reported a facial id. Duplicates are ignored.
    pub fn on_face_registered(&mut self, face_id: &str) -> Option<RegistrationCommand> {
        if self.phase != RegistrationPhase::Widget {
            warn!("registration already being processed, ignoring duplicate");
            return None;
        }

        self.phase = RegistrationPhase::Processing;
        self.face_id = Some(face_id.to_string());
        info!("face registration succeeded");
        Some(RegistrationCommand::Succeeded {
            face_id: face_id.to_string(),
        })
    }

    /// Parent finished handling the success; shows the success card and
    /// schedules navigation.
    pub fn on_success_handled(&mut self, now_ms: u64) {
        if self.phase == RegistrationPhase::Processing {
            self.phase = RegistrationPhase::Complete;
            self.navigate_at_ms = Some(now_ms.saturating_add(REGISTRATION_NAVIGATE_DELAY_MS));
        }
    }

    /// Widget reported an error.
    pub fn on_registration_error(&mut self, message: &str, now_ms: u64) -> RegistrationCommand {
        error!("face registration failed: {message}");
        self.error = Some(TransientMessage::new(
            message,
            now_ms,
            REGISTRATION_ERROR_DISMISS_MS,
        ));
        RegistrationCommand::Failed {
            message: message.to_string(),
        }
    }

    /// Widget close control.
    pub fn on_widget_closed(&mut self) -> RegistrationCommand {
        self.cancel();
        RegistrationCommand::NavigateBack
    }

    /// Top-bar close control.
    pub fn on_close_pressed(&mut self) -> Option<RegistrationCommand> {
        if !self.close_enabled() {
            return None;
        }
        self.cancel();
        Some(RegistrationCommand::NavigateBack)
    }

    fn cancel(&mut self) {
        if self.phase == RegistrationPhase::Widget {
            info!("{:?}: registration closed by user", FailureKind::UserCancelled);
            self.failure = Some(FailureKind::UserCancelled);
        }
    }

    /// Failure that blocked or ended the flow: a refused camera or a user
    /// cancellation.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.failure
    }

    /// `false` while a success is being processed.
    pub fn close_enabled(&self) -> bool {
        self.phase != RegistrationPhase::Processing
    }

    /// Facial id once registered.
    pub fn face_id(&self) -> Option<&str> {
        self.face_id.as_deref()
    }

    /// Visible error overlay text.
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|message| message.text.as_str())
    }

    /// Expires overlays and fires the scheduled navigation once.
    pub fn on_tick(&mut self, now_ms: u64) -> Option<RegistrationCommand> {
        expire(&mut self.error, now_ms);
        match self.navigate_at_ms {
            Some(deadline) if now_ms >= deadline => {
                self.navigate_at_ms = None;
                Some(RegistrationCommand::NavigateBack)
            }
            _ => None,
        }
    }
}

/// Action requested by the login screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginCommand {
    /// Open the registration sub-flow for this roll number.
    OpenFaceRegistration {
        /// Roll number to register.
        roll_number: String,
    },
    /// Profile saved; leave the login screen.
    LoginSucceeded,
}

/// Login screen controller.
pub struct LoginScreen<R: ProfileRepository> {
    profile: ProfileViewModel<R>,
    has_already_registered_face: bool,
    face_registration_completed: bool,
    registered_face_id: Option<String>,
    face_registration: Option<FaceRegistrationScreen>,
    error: Option<TransientMessage>,
    show_success: bool,
    navigate_at_ms: Option<u64>,
}

impl<R: ProfileRepository> LoginScreen<R> {
    /// Creates the screen around `profile`.
    pub fn new(profile: ProfileViewModel<R>) -> Self {
        Self {
            profile,
            has_already_registered_face: false,
            face_registration_completed: false,
            registered_face_id: None,
            face_registration: None,
            error: None,
            show_success: false,
            navigate_at_ms: None,
        }
    }

    /// Profile view model.
    pub fn profile(&self) -> &ProfileViewModel<R> {
        &self.profile
    }

    /// Updates the name field.
    pub fn update_name(&mut self, name: impl Into<String>) {
        self.profile.update_name_input(name);
    }

    /// Updates the roll-number field.
    pub fn update_roll_number(&mut self, roll_number: impl Into<String>) {
        self.profile.update_roll_number_input(roll_number);
    }

    /// Updates the class field.
    pub fn update_class(&mut self, class_name: impl Into<String>) {
        self.profile.update_class_name_input(class_name);
    }

    /// "I have already registered my face" toggle.
    pub fn set_already_registered(&mut self, already_registered: bool) {
        self.has_already_registered_face = already_registered;
        if already_registered {
            self.face_registration_completed = false;
            self.error = None;
        }
    }

    /// Toggle state.
    pub fn has_already_registered_face(&self) -> bool {
        self.has_already_registered_face
    }

    /// `true` once the sub-flow reported success.
    pub fn face_registration_completed(&self) -> bool {
        self.face_registration_completed
    }

    /// Facial id from the sub-flow.
    pub fn registered_face_id(&self) -> Option<&str> {
        self.registered_face_id.as_deref()
    }

    /// `false` while saving or after success.
    pub fn inputs_enabled(&self) -> bool {
        !self.profile.is_saving() && !self.show_success
    }

    /// Register button is shown only while the toggle is off.
    pub fn register_button_visible(&self) -> bool {
        !self.has_already_registered_face
    }

    /// Register button is disabled after a completed registration.
    pub fn register_button_enabled(&self) -> bool {
        self.inputs_enabled() && !self.face_registration_completed
    }

    /// Sign-in button label.
    pub fn sign_in_label(&self) -> &'static str {
        if self.profile.is_saving() {
            "Signing In..."
        } else if self.show_success {
            "✓ Success"
        } else {
            "Sign In"
        }
    }

    /// `true` after a successful save.
    pub fn show_success(&self) -> bool {
        self.show_success
    }

    /// Success banner text after a successful save.
    pub fn success_message(&self) -> Option<&'static str> {
        self.show_success
            .then_some("Login successful! Welcome to Smart Attend")
    }

    /// Visible error banner text.
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|message| message.text.as_str())
    }

    fn show_error(&mut self, text: impl Into<String>, now_ms: u64) {
        self.error = Some(TransientMessage::new(text, now_ms, LOGIN_ERROR_DISMISS_MS));
    }

    /// Register button.
    pub fn start_face_registration(&mut self, now_ms: u64) -> Option<LoginCommand> {
        let name = self.profile.name_input().to_string();
        let roll_number = self.profile.roll_number_input().to_string();

        let problem = if name.trim().is_empty() {
            Some("Please enter your full name first")
        } else if roll_number.trim().is_empty() {
            Some("Please enter your roll number first")
        } else if roll_number.chars().count() < MIN_ROLL_NUMBER_LEN {
            Some("Roll number must be at least 4 characters")
        } else {
            None
        };
        if let Some(problem) = problem {
            self.show_error(problem, now_ms);
            return None;
        }

        self.error = None;
        debug!("starting face registration sub-flow");
        self.face_registration = Some(FaceRegistrationScreen::new(roll_number.clone()));
        Some(LoginCommand::OpenFaceRegistration { roll_number })
    }

    /// Nested registration screen while shown.
    pub fn face_registration(&self) -> Option<&FaceRegistrationScreen> {
        self.face_registration.as_ref()
    }

    /// Mutable nested registration screen while shown.
    pub fn face_registration_mut(&mut self) -> Option<&mut FaceRegistrationScreen> {
        self.face_registration.as_mut()
    }

    /// Applies a command emitted by the nested registration screen.
    pub fn handle_registration_command(&mut self, command: RegistrationCommand, now_ms: u64) {
        match command {
            RegistrationCommand::Succeeded { face_id } => {
                info!("face registration complete");
                self.registered_face_id = Some(face_id);
                self.face_registration_completed = true;
                self.has_already_registered_face = false;
                self.face_registration = None;
                self.error = None;
            }
            RegistrationCommand::Failed { message } => {
                self.show_error(format!("Face registration failed: {message}"), now_ms);
                self.face_registration = None;
            }
            RegistrationCommand::NavigateBack => {
                debug!("back from face registration");
                self.face_registration = None;
            }
            RegistrationCommand::RequestCameraPermission => {}
        }
    }

    /// Sign-in button.
    pub fn sign_in(&mut self, now_ms: u64) {
        if !self.inputs_enabled() {
            return;
        }

        let name = self.profile.name_input().to_string();
        let roll_number = self.profile.roll_number_input().to_string();
        let class_name = self.profile.class_name_input().to_string();

        let problem = if name.trim().is_empty() {
            Some("Please enter your full name")
        } else if name.chars().count() < MIN_NAME_LEN {
            Some("Name must be at least 2 characters")
        } else if roll_number.trim().is_empty() {
            Some("Please enter your roll number")
        } else if roll_number.chars().count() < MIN_ROLL_NUMBER_LEN {
            Some("Roll number must be at least 4 characters")
        } else if class_name.trim().is_empty() {
            Some("Please enter your class")
        } else if !self.has_already_registered_face && !self.face_registration_completed {
            Some("Please complete face registration or toggle 'I have already registered my face'")
        } else {
            None
        };
        if let Some(problem) = problem {
            self.show_error(problem, now_ms);
            return;
        }

        self.error = None;
        let face_status = if self.has_already_registered_face {
            "previously registered"
        } else {
            "newly registered"
        };
        debug!("login attempt, face {face_status}");

        match self
            .profile
            .save_profile_with_class(&name, &roll_number, &class_name)
        {
            Ok(()) => {
                info!("profile saved, showing success");
                self.show_success = true;
                self.navigate_at_ms = Some(now_ms.saturating_add(LOGIN_NAVIGATE_DELAY_MS));
            }
            Err(save_error) => {
                error!("profile save failed: {save_error}");
                self.show_error(save_error.to_string(), now_ms);
            }
        }
    }

    /// Clear-form button.
    pub fn clear_form(&mut self) {
        if !self.inputs_enabled() {
            return;
        }
        self.profile.update_name_input("");
        self.profile.update_roll_number_input("");
        self.profile.update_class_name_input("");
        self.face_registration_completed = false;
        self.registered_face_id = None;
        self.has_already_registered_face = false;
        self.error = None;
    }

    /// Expires the banner and fires the scheduled navigation once.
    pub fn on_tick(&mut self, now_ms: u64) -> Option<LoginCommand> {
        expire(&mut self.error, now_ms);
        match self.navigate_at_ms {
            Some(deadline) if now_ms >= deadline => {
                self.navigate_at_ms = None;
                Some(LoginCommand::LoginSucceeded)
            }
            _ => None,
        }
    }
}

/// What the attendance screen shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttendanceView {
    /// Waiting for the camera permission answer.
    RequestingPermission,
    /// Retry/cancel prompt after a refusal.
    PermissionDenied,
    /// Authentication widget mounted.
    Scanning,
    /// Recording attendance for this roll number.
    Processing {
        /// Authenticated roll number.
        roll_number: String,
    },
    /// Confirmation card.
    Success(AttendanceSuccessData),
}

/// Action requested by the attendance screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttendanceCommand {
    /// Ask the platform for the camera again.
    RequestCameraPermission,
    /// Record attendance for this roll number.
    MarkAttendance {
        /// Authenticated roll number.
        roll_number: String,
    },
    /// Mount a fresh authentication widget.
    RemountWidget,
    /// Leave the screen.
    NavigateBack,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttendancePhase {
    Scanning,
    Processing(String),
    Success(Box<AttendanceSuccessData>),
}

/// Attendance authentication screen controller.
#[derive(Debug, Clone)]
pub struct AttendanceScreen {
    permission: CameraPermission,
    phase: AttendancePhase,
    error: Option<TransientMessage>,
    failure: Option<FailureKind>,
}

impl Default for AttendanceScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl AttendanceScreen {
    /// Creates the screen, waiting on the camera.
    pub fn new() -> Self {
        Self {
            permission: CameraPermission::Requesting,
            phase: AttendancePhase::Scanning,
            error: None,
            failure: None,
        }
    }

    /// Records the platform permission answer.
    pub fn on_permission_result(&mut self, granted: bool) {
        self.permission = if granted {
            self.failure = None;
            CameraPermission::Granted
        } else {
            warn!("{:?}: camera refused for attendance", FailureKind::PermissionDenied);
            self.failure = Some(FailureKind::PermissionDenied);
            CameraPermission::Denied
        };
    }

    /// Retry button on the denied prompt.
    pub fn retry_permission(&mut self) -> AttendanceCommand {
        self.permission = CameraPermission::Requesting;
        self.failure = None;
        AttendanceCommand::RequestCameraPermission
    }

    /// Re-checks the camera after the app resumes.
    pub fn on_resumed(&mut self) -> Option<AttendanceCommand> {
        (self.permission != CameraPermission::Granted).then(|| self.retry_permission())
    }

    /// Current view.
    pub fn view(&self) -> AttendanceView {
        match (&self.permission, &self.phase) {
            (CameraPermission::Denied, _) => AttendanceView::PermissionDenied,
            (CameraPermission::Requesting, _) => AttendanceView::RequestingPermission,
            (CameraPermission::Granted, AttendancePhase::Scanning) => AttendanceView::Scanning,
            (CameraPermission::Granted, AttendancePhase::Processing(roll_number)) => {
                AttendanceView::Processing {
                    roll_number: roll_number.clone(),
                }
            }
            (CameraPermission::Granted, AttendancePhase::Success(record)) => {
                AttendanceView::Success(record.as_ref().clone())
            }
        }
    }

    /// Widget authenticated a face.
    pub fn on_authenticated(&mut self, roll_number: &str) -> Option<AttendanceCommand> {
        if self.phase != AttendancePhase::Scanning {
            warn!("attendance already being processed, ignoring duplicate");
            return None;
        }
        self.phase = AttendancePhase::Processing(roll_number.to_string());
        Some(AttendanceCommand::MarkAttendance {
            roll_number: roll_number.to_string(),
        })
    }

    /// Widget reported an error; the widget stays mounted for retry.
    pub fn on_error(&mut self, message: &str, now_ms: u64) {
        error!("attendance authentication error: {message}");
        self.error = Some(TransientMessage::new(
            message,
            now_ms,
            ATTENDANCE_ERROR_DISMISS_MS,
        ));
    }

    /// Attendance collaborator recorded the entry.
    pub fn on_attendance_recorded(&mut self, record: AttendanceSuccessData) {
        info!("attendance recorded");
        self.phase = AttendancePhase::Success(Box::new(record));
    }

    /// Attendance collaborator failed; a fresh widget is needed because the
    /// previous session already delivered its success.
    pub fn on_attendance_failed(&mut self, message: &str, now_ms: u64) -> AttendanceCommand {
        self.on_error(message, now_ms);
        self.phase = AttendancePhase::Scanning;
        AttendanceCommand::RemountWidget
    }

    /// Done button on the confirmation card.
    pub fn on_done(&self) -> AttendanceCommand {
        AttendanceCommand::NavigateBack
    }

    /// Visible error overlay text.
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|message| message.text.as_str())
    }

    /// [`FailureKind::PermissionDenied`] while the camera is refused.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.failure
    }

    /// Expires the overlay.
    pub fn on_tick(&mut self, now_ms: u64) {
        expire(&mut self.error, now_ms);
    }
}
