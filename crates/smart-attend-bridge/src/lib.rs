#![warn(missing_docs)]
//! # smart-attend-bridge
//!
//! ## Purpose
//! Implements the only trusted boundary between the embedded face widget and
//! host application logic.
//!
//! ## Responsibilities
//! - Define the enumerated wire messages the embedded content may post.
//! - Own one [`BridgeSession`] per document load with a one-shot terminal
//!   slot (success or cancellation) and an observable state machine.
//! - Translate accepted messages into [`AuthResult`] / [`RegistrationResult`]
//!   values wrapped in [`HostEvent`] and move them from the browser-engine
//!   thread to the UI thread over a channel.
//! - Invoke host callbacks on the UI thread, containing their failures.
//!
//! ## Data flow
//! Script `postMessage(json)` -> [`BridgeEndpoint::deliver_raw`] (engine
//! thread: parse, session check, dedup, SDK result parsing) -> `mpsc` channel
//! -> [`UiWaker::wake`] -> [`HostReceiver::drain`] (UI thread) -> callbacks.
//!
//! ## Ownership and lifetimes
//! The endpoint half is `Send + Sync + Clone` and lives with the browser
//! binding. The receiver half owns the callbacks and never leaves the UI
//! thread. Both share the session through an `Arc`.
//!
//! ## Error model
//! Nothing escapes the bridge as an error. Malformed, stale, duplicate, or
//! misrouted messages are dropped and logged; callback failures and panics are
//! caught and logged. [`BridgeError`] names the reasons.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use smart_attend_bridge::{
//!     open_bridge, AuthenticationCallbacks, BridgeOptions, Delivery, HostCallbacks, NoopWaker,
//!     SessionId,
//! };
//!
//! let callbacks = HostCallbacks::Authentication(AuthenticationCallbacks::new(
//!     |_roll_number| Ok(()),
//!     |_message| Ok(()),
//! ));
//! let (endpoint, mut receiver) = open_bridge(
//!     SessionId::from("s-1"),
//!     callbacks,
//!     BridgeOptions::default(),
//!     Arc::new(NoopWaker),
//! );
//! let raw = r#"{"session_id":"s-1","kind":"authenticated","result":{"payload":{"rollNumber":"21BCE1234"}}}"#;
//! assert_eq!(endpoint.deliver_raw(raw), Delivery::Forwarded);
//! assert_eq!(receiver.drain().delivered, 1);
//! ```

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use smart_attend_core::{AuthResult, FailureKind, RegistrationResult};
use smart_attend_faceio::{
    RawErrorCode, UnknownCodePolicy, describe_error, parse_authenticate_result,
    parse_enroll_result,
};
use thiserror::Error;

/// Name under which the bridge is installed in the script context.
pub const BRIDGE_BINDING_NAME: &str = "AttendanceBridge";

/// Log target for messages forwarded by the embedded content.
pub const JS_LOG_TARGET: &str = "smart_attend::webview::js";

/// Roll number reported when the SDK payload lacks one.
pub const DEFAULT_UNKNOWN_ROLL_PLACEHOLDER: &str = "Unknown";

/// Error text delivered when an enrolment resolves without a facial id.
pub const MISSING_FACIAL_ID_MESSAGE: &str = "Registration result did not include a facial id";

/// Prefix for SDK construction failures.
pub const INITIALIZATION_FAILED_PREFIX: &str = "Initialization failed: ";

/// Which widget a bridge instance serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BridgeVariant {
    /// Attendance face authentication.
    Authentication,
    /// Student face registration.
    Registration,
}

impl BridgeVariant {
    /// How unknown SDK error codes are described for this widget.
    pub fn unknown_code_policy(self) -> UnknownCodePolicy {
        match self {
            Self::Authentication => UnknownCodePolicy::TreatAsNetworkError,
            Self::Registration => UnknownCodePolicy::ReportCode,
        }
    }

    /// Returns `true` when `message` is part of this variant's surface.
    pub fn accepts(self, message: &BridgeMessage) -> bool {
        match message {
            BridgeMessage::Authenticated { .. } => self == Self::Authentication,
            BridgeMessage::FaceRegistered { .. } | BridgeMessage::Close => {
                self == Self::Registration
            }
            _ => true,
        }
    }

    /// Short label used in log lines.
    pub fn label(self) -> &'static str {
        match self {
            Self::Authentication => "auth",
            Self::Registration => "registration",
        }
    }
}

/// Opaque identifier tying a document load to its bridge instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Generates a fresh random identifier (16 bytes, hex encoded).
    pub fn generate() -> Self {
        let mut bytes = [0_u8; 16];
        StdRng::from_os_rng().fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// Returns the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Messages the embedded content may post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BridgeMessage {
    /// SDK constructed; the start control is visible.
    Ready,
    /// SDK construction threw.
    InitFailed {
        /// Exception text.
        message: String,
    },
    /// User pressed the start control.
    ScanStarted,
    /// `authenticate()` resolved with `result`.
    Authenticated {
        /// Raw resolution value.
        result: Value,
    },
    /// `enroll()` resolved with `result`.
    FaceRegistered {
        /// Raw resolution value.
        result: Value,
    },
    /// SDK call rejected with `code`.
    ScanFailed {
        /// Raw rejection value.
        code: RawErrorCode,
    },
    /// Free-form script-side error.
    Error {
        /// Error text.
        message: String,
    },
    /// User pressed the close control.
    Close,
    /// Diagnostic line.
    Log {
        /// Log text.
        message: String,
    },
}

impl BridgeMessage {
    /// Wire `kind` value.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::InitFailed { .. } => "init_failed",
            Self::ScanStarted => "scan_started",
            Self::Authenticated { .. } => "authenticated",
            Self::FaceRegistered { .. } => "face_registered",
            Self::ScanFailed { .. } => "scan_failed",
            Self::Error { .. } => "error",
            Self::Close => "close",
            Self::Log { .. } => "log",
        }
    }
}

/// One posted message with its session tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeEnvelope {
    /// Session the sending document was rendered for.
    pub session_id: String,
    /// Message body.
    #[serde(flatten)]
    pub message: BridgeMessage,
}

impl BridgeEnvelope {
    /// Creates an envelope for `session`.
    pub fn new(session: &SessionId, message: BridgeMessage) -> Self {
        Self {
            session_id: session.as_str().to_string(),
            message,
        }
    }

    /// Parses one posted JSON string.
    ///
    /// # Errors
    /// Returns [`BridgeError::Decode`] for invalid JSON or unknown kinds.
    pub fn parse(raw: &str) -> Result<Self, BridgeError> {
        serde_json::from_str(raw).map_err(BridgeError::Decode)
    }

    /// Encodes the envelope as the script would post it.
    ///
    /// # Errors
    /// Returns [`BridgeError::Decode`] when serialization fails.
    pub fn to_json(&self) -> Result<String, BridgeError> {
        serde_json::to_string(self).map_err(BridgeError::Decode)
    }
}

/// Lifecycle of one bridge instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Bridge created, document not loaded yet.
    Idle,
    /// Document loading; SDK not constructed yet.
    Initializing,
    /// Start control enabled.
    Ready,
    /// SDK call in flight.
    Scanning,
    /// Success delivered. No further transition.
    Succeeded,
    /// User closed the registration widget.
    Cancelled,
    /// SDK construction failed; the start control never appears.
    Unavailable,
}

/// Inputs driving [`SessionState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionEvent {
    /// Host started loading the document.
    DocumentLoaded,
    /// SDK constructed.
    SdkReady,
    /// SDK construction threw.
    InitFailed,
    /// Start control pressed.
    ScanStarted,
    /// SDK call rejected or script reported an error.
    ScanFailed,
    /// Success accepted by the guard.
    Succeeded,
    /// Close control pressed.
    Cancelled,
}

impl SessionState {
    /// Returns the next state, or `None` for an illegal transition.
    pub fn next(self, event: SessionEvent, variant: BridgeVariant) -> Option<Self> {
        use SessionEvent as E;

        match (self, event) {
            (Self::Idle, E::DocumentLoaded) => Some(Self::Initializing),
            (Self::Initializing, E::SdkReady) => Some(Self::Ready),
            (Self::Initializing, E::InitFailed) => Some(Self::Unavailable),
            (Self::Ready, E::ScanStarted) => Some(Self::Scanning),
            (Self::Ready | Self::Scanning, E::ScanFailed) => Some(Self::Ready),
            (Self::Scanning, E::Succeeded) => Some(Self::Succeeded),
            (Self::Idle | Self::Initializing | Self::Ready | Self::Unavailable, E::Cancelled)
                if variant == BridgeVariant::Registration =>
            {
                Some(Self::Cancelled)
            }
            _ => None,
        }
    }

    /// Returns `true` for [`SessionState::Succeeded`] and
    /// [`SessionState::Cancelled`], the states with no outgoing transition.
    pub fn is_final(self) -> bool {
        matches!(self, Self::Succeeded | Self::Cancelled)
    }
}

/// One-shot outcome slot of a session. Leaves [`Terminal::Open`] at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Terminal {
    /// No success or cancellation accepted yet.
    Open,
    /// A success was accepted.
    Succeeded,
    /// The user closed the registration widget.
    Cancelled,
}

#[derive(Debug)]
struct SessionSlots {
    state: SessionState,
    terminal: Terminal,
}

/// Per-load session: identity, one-shot terminal slot, and state.
///
/// The slot and the state share one lock. Endpoints enqueue host events while
/// holding it, so nothing can be queued behind a terminal event.
#[derive(Debug)]
pub struct BridgeSession {
    id: SessionId,
    variant: BridgeVariant,
    slots: Mutex<SessionSlots>,
}

impl BridgeSession {
    /// Creates an idle session.
    pub fn new(id: SessionId, variant: BridgeVariant) -> Self {
        Self {
            id,
            variant,
            slots: Mutex::new(SessionSlots {
                state: SessionState::Idle,
                terminal: Terminal::Open,
            }),
        }
    }

    /// Session identifier.
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Widget variant.
    pub fn variant(&self) -> BridgeVariant {
        self.variant
    }

    /// Returns `true` once a success has been accepted.
    pub fn has_fired(&self) -> bool {
        self.terminal() == Terminal::Succeeded
    }

    /// Current terminal slot.
    pub fn terminal(&self) -> Terminal {
        self.lock().terminal
    }

    /// Returns `true` once a success or a cancellation has been accepted.
    pub fn is_terminal(&self) -> bool {
        self.terminal() != Terminal::Open
    }

    /// Current state snapshot.
    pub fn state(&self) -> SessionState {
        self.lock().state
    }

    /// Claims the slot for a success. Exactly one claim ever gets `true`.
    pub fn try_fire(&self) -> bool {
        self.settle(Terminal::Succeeded, || ()).is_some()
    }

    /// Claims the slot for a cancellation. Fails once any claim succeeded.
    pub fn try_cancel(&self) -> bool {
        self.settle(Terminal::Cancelled, || ()).is_some()
    }

    /// Applies `event`; illegal transitions are logged and ignored.
    pub fn apply(&self, event: SessionEvent) -> SessionState {
        let mut slots = self.lock();
        self.transition(&mut slots, event);
        slots.state
    }

    /// Runs `action` under the session lock if the slot is still open.
    fn while_open<R>(&self, event: SessionEvent, action: impl FnOnce() -> R) -> Option<R> {
        let mut slots = self.lock();
        if slots.terminal != Terminal::Open {
            return None;
        }
        self.transition(&mut slots, event);
        Some(action())
    }

    /// Claims the slot for `outcome` and runs `action` before releasing the
    /// lock. Returns `None` when the slot was already taken.
    fn settle<R>(&self, outcome: Terminal, action: impl FnOnce() -> R) -> Option<R> {
        let mut slots = self.lock();
        if slots.terminal != Terminal::Open {
            return None;
        }

        let state = match outcome {
            Terminal::Succeeded => SessionState::Succeeded,
            Terminal::Cancelled => SessionState::Cancelled,
            Terminal::Open => slots.state,
        };
        if slots.state.next(outcome_event(outcome), self.variant) != Some(state) {
            debug!(
                "bridge[{}] {}: {outcome:?} accepted in state {:?}",
                self.variant.label(),
                self.id,
                slots.state
            );
        }
        slots.terminal = outcome;
        slots.state = state;
        Some(action())
    }

    fn transition(&self, slots: &mut SessionSlots, event: SessionEvent) {
        match slots.state.next(event, self.variant) {
            Some(next) => {
                debug!(
                    "bridge[{}] {}: {:?} -> {:?}",
                    self.variant.label(),
                    self.id,
                    slots.state,
                    next
                );
                slots.state = next;
            }
            None => warn!(
                "bridge[{}] {}: ignoring {:?} in state {:?}",
                self.variant.label(),
                self.id,
                event,
                slots.state
            ),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionSlots> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn outcome_event(outcome: Terminal) -> SessionEvent {
    match outcome {
        Terminal::Cancelled => SessionEvent::Cancelled,
        Terminal::Open | Terminal::Succeeded => SessionEvent::Succeeded,
    }
}

/// Event handed to the UI thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// Outcome reported by the authentication widget.
    Authentication(AuthResult),
    /// Outcome reported by the registration widget.
    Registration(RegistrationResult),
}

impl HostEvent {
    fn failure(variant: BridgeVariant, error_message: String) -> Self {
        match variant {
            BridgeVariant::Authentication => {
                Self::Authentication(AuthResult::Failed { error_message })
            }
            BridgeVariant::Registration => {
                Self::Registration(RegistrationResult::Failed { error_message })
            }
        }
    }
}

/// Wakes the UI thread after an event was queued.
pub trait UiWaker: Send + Sync {
    /// Schedules a [`HostReceiver::drain`] on the UI thread.
    fn wake(&self);
}

/// Waker for hosts that poll the receiver on their own cadence.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopWaker;

impl UiWaker for NoopWaker {
    fn wake(&self) {}
}

/// Tunables for message translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeOptions {
    /// Roll number used when an authentication payload lacks one.
    pub unknown_roll_placeholder: String,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            unknown_roll_placeholder: DEFAULT_UNKNOWN_ROLL_PLACEHOLDER.to_string(),
        }
    }
}

/// Why a message did not reach the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Not valid JSON or not a known kind.
    Malformed,
    /// Sent by a different document load.
    StaleSession,
    /// Not part of this variant's surface.
    WrongVariant,
    /// A success was already delivered.
    AlreadyCompleted,
    /// The UI side was torn down.
    HostGone,
}

/// Result of one call into the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Queued for the UI thread.
    Forwarded,
    /// State updated; nothing for the host.
    Observed,
    /// Written to the log only.
    Logged,
    /// Ignored.
    Dropped(DropReason),
}

/// Engine-side half of the bridge.
#[derive(Clone)]
pub struct BridgeEndpoint {
    session: Arc<BridgeSession>,
    events: Sender<HostEvent>,
    waker: Arc<dyn UiWaker>,
    options: Arc<BridgeOptions>,
}

impl fmt::Debug for BridgeEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeEndpoint")
            .field("session", &self.session)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl BridgeEndpoint {
    /// Shared session.
    pub fn session(&self) -> &Arc<BridgeSession> {
        &self.session
    }

    /// Records that the host started loading the document.
    pub fn mark_document_loaded(&self) {
        self.session.apply(SessionEvent::DocumentLoaded);
    }

    /// Handles one raw `postMessage` payload. Safe to call from any thread.
    pub fn deliver_raw(&self, raw: &str) -> Delivery {
        match BridgeEnvelope::parse(raw) {
            Ok(envelope) => self.deliver(envelope),
            Err(error) => {
                warn!(
                    "bridge[{}] {}: dropping malformed message: {error}",
                    self.session.variant.label(),
                    self.session.id
                );
                Delivery::Dropped(DropReason::Malformed)
            }
        }
    }

    /// Handles one parsed envelope.
    pub fn deliver(&self, envelope: BridgeEnvelope) -> Delivery {
        if let Err(error) = self.admit(&envelope) {
            warn!(
                "bridge[{}] {}: dropping {}: {error}",
                self.session.variant.label(),
                self.session.id,
                envelope.message.kind()
            );
            return Delivery::Dropped(match error {
                BridgeError::WrongVariant { .. } => DropReason::WrongVariant,
                _ => DropReason::StaleSession,
            });
        }

        if let BridgeMessage::Log { message } = &envelope.message {
            debug!(target: JS_LOG_TARGET, "[{}] {message}", self.session.variant.label());
            return Delivery::Logged;
        }

        if self.session.is_terminal() {
            debug!(
                "bridge[{}] {}: already completed, ignoring {}",
                self.session.variant.label(),
                self.session.id,
                envelope.message.kind()
            );
            return Delivery::Dropped(DropReason::AlreadyCompleted);
        }

        match envelope.message {
            BridgeMessage::Ready => {
                self.session.apply(SessionEvent::SdkReady);
                Delivery::Observed
            }
            BridgeMessage::ScanStarted => {
                self.session.apply(SessionEvent::ScanStarted);
                Delivery::Observed
            }
            BridgeMessage::InitFailed { message } => self.forward_error(
                SessionEvent::InitFailed,
                FailureKind::InitializationFailure,
                format!("{INITIALIZATION_FAILED_PREFIX}{message}"),
            ),
            BridgeMessage::Authenticated { result } => {
                let roll_number = match parse_authenticate_result(&result) {
                    Ok(user) => user.roll_number,
                    Err(error) => {
                        warn!(
                            "bridge[auth] {}: {error}; reporting '{}'",
                            self.session.id, self.options.unknown_roll_placeholder
                        );
                        self.options.unknown_roll_placeholder.clone()
                    }
                };
                self.forward_success(HostEvent::Authentication(AuthResult::Authenticated {
                    roll_number,
                }))
            }
            BridgeMessage::FaceRegistered { result } => match parse_enroll_result(&result) {
                Ok(face_id) => self.forward_success(HostEvent::Registration(
                    RegistrationResult::Registered { face_id },
                )),
                Err(error) => {
                    warn!("bridge[registration] {}: {error}", self.session.id);
                    self.forward_error(
                        SessionEvent::ScanFailed,
                        FailureKind::ScanFailure,
                        MISSING_FACIAL_ID_MESSAGE.to_string(),
                    )
                }
            },
            BridgeMessage::ScanFailed { code } => {
                info!(
                    "bridge[{}] {}: sdk rejected with code {code}",
                    self.session.variant.label(),
                    self.session.id
                );
                let message =
                    describe_error(&code, self.session.variant.unknown_code_policy());
                self.forward_error(SessionEvent::ScanFailed, FailureKind::ScanFailure, message)
            }
            BridgeMessage::Error { message } => {
                self.forward_error(SessionEvent::ScanFailed, FailureKind::ScanFailure, message)
            }
            BridgeMessage::Close => self.forward_close(),
            BridgeMessage::Log { .. } => Delivery::Logged,
        }
    }

    fn admit(&self, envelope: &BridgeEnvelope) -> Result<(), BridgeError> {
        if envelope.session_id != self.session.id.as_str() {
            return Err(BridgeError::StaleSession {
                expected: self.session.id.to_string(),
                actual: envelope.session_id.clone(),
            });
        }

        if !self.session.variant.accepts(&envelope.message) {
            return Err(BridgeError::WrongVariant {
                variant: self.session.variant,
                kind: envelope.message.kind(),
            });
        }

        Ok(())
    }

    fn forward_success(&self, event: HostEvent) -> Delivery {
        let sent = self
            .session
            .settle(Terminal::Succeeded, || self.events.send(event).is_ok());
        if sent.is_some() {
            info!(
                "bridge[{}] {}: success accepted",
                self.session.variant.label(),
                self.session.id
            );
        }
        self.conclude(sent)
    }

    fn forward_close(&self) -> Delivery {
        let event = HostEvent::Registration(RegistrationResult::Cancelled);
        let sent = self
            .session
            .settle(Terminal::Cancelled, || self.events.send(event).is_ok());
        if sent.is_some() {
            info!(
                "bridge[registration] {}: {:?}: closed by user",
                self.session.id,
                FailureKind::UserCancelled
            );
        }
        self.conclude(sent)
    }

    fn forward_error(
        &self,
        transition: SessionEvent,
        kind: FailureKind,
        message: String,
    ) -> Delivery {
        let event = HostEvent::failure(self.session.variant, message.clone());
        let sent = self
            .session
            .while_open(transition, || self.events.send(event).is_ok());
        if sent.is_some() {
            error!(
                "bridge[{}] {}: {kind:?}: {message}",
                self.session.variant.label(),
                self.session.id
            );
        }
        self.conclude(sent)
    }

    /// Maps the outcome of a guarded send; wakes the UI outside the lock.
    fn conclude(&self, sent: Option<bool>) -> Delivery {
        match sent {
            None => {
                debug!(
                    "bridge[{}] {}: already completed, event suppressed",
                    self.session.variant.label(),
                    self.session.id
                );
                Delivery::Dropped(DropReason::AlreadyCompleted)
            }
            Some(false) => {
                warn!(
                    "bridge[{}] {}: host receiver is gone",
                    self.session.variant.label(),
                    self.session.id
                );
                Delivery::Dropped(DropReason::HostGone)
            }
            Some(true) => {
                self.waker.wake();
                Delivery::Forwarded
            }
        }
    }
}

/// Error returned by a host callback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct CallbackError(pub String);

impl CallbackError {
    /// Creates a callback error with `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Result type of host callbacks.
pub type CallbackResult = Result<(), CallbackError>;

type StringCallback = Box<dyn FnMut(String) -> CallbackResult>;
type UnitCallback = Box<dyn FnMut() -> CallbackResult>;

/// Callbacks supplied by an authentication host.
pub struct AuthenticationCallbacks {
    on_authenticated: StringCallback,
    on_error: StringCallback,
}

impl AuthenticationCallbacks {
    /// Bundles success and error callbacks.
    pub fn new(
        on_authenticated: impl FnMut(String) -> CallbackResult + 'static,
        on_error: impl FnMut(String) -> CallbackResult + 'static,
    ) -> Self {
        Self {
            on_authenticated: Box::new(on_authenticated),
            on_error: Box::new(on_error),
        }
    }
}

/// Callbacks supplied by a registration host.
pub struct RegistrationCallbacks {
    on_face_registered: StringCallback,
    on_error: StringCallback,
    on_close: UnitCallback,
}

impl RegistrationCallbacks {
    /// Bundles success, error, and close callbacks.
    pub fn new(
        on_face_registered: impl FnMut(String) -> CallbackResult + 'static,
        on_error: impl FnMut(String) -> CallbackResult + 'static,
        on_close: impl FnMut() -> CallbackResult + 'static,
    ) -> Self {
        Self {
            on_face_registered: Box::new(on_face_registered),
            on_error: Box::new(on_error),
            on_close: Box::new(on_close),
        }
    }
}

/// Host callbacks for either widget.
pub enum HostCallbacks {
    /// Authentication widget callbacks.
    Authentication(AuthenticationCallbacks),
    /// Registration widget callbacks.
    Registration(RegistrationCallbacks),
}

impl HostCallbacks {
    /// Widget variant implied by the callback set.
    pub fn variant(&self) -> BridgeVariant {
        match self {
            Self::Authentication(_) => BridgeVariant::Authentication,
            Self::Registration(_) => BridgeVariant::Registration,
        }
    }
}

/// Outcome of one [`HostReceiver::drain`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Callbacks that completed normally.
    pub delivered: usize,
    /// Callbacks that returned an error or panicked.
    pub failed: usize,
    /// The endpoint side has been dropped.
    pub disconnected: bool,
}

/// UI-thread half of the bridge.
pub struct HostReceiver {
    session: Arc<BridgeSession>,
    events: Receiver<HostEvent>,
    callbacks: HostCallbacks,
}

impl fmt::Debug for HostReceiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostReceiver")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl HostReceiver {
    /// Shared session.
    pub fn session(&self) -> &Arc<BridgeSession> {
        &self.session
    }

    /// Runs every queued event through the callbacks. Call on the UI thread.
    pub fn drain(&mut self) -> DrainReport {
        let mut report = DrainReport::default();
        loop {
            match self.events.try_recv() {
                Ok(event) => {
                    if self.dispatch(event) {
                        report.delivered += 1;
                    } else {
                        report.failed += 1;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    report.disconnected = true;
                    break;
                }
            }
        }
        report
    }

    fn dispatch(&mut self, event: HostEvent) -> bool {
        let label = self.session.variant.label();
        let outcome = match (&mut self.callbacks, event) {
            (
                HostCallbacks::Authentication(callbacks),
                HostEvent::Authentication(AuthResult::Authenticated { roll_number }),
            ) => {
                debug!("bridge[{label}] invoking success callback for {roll_number}");
                invoke(|| (callbacks.on_authenticated)(roll_number))
            }
            (
                HostCallbacks::Authentication(callbacks),
                HostEvent::Authentication(AuthResult::Failed { error_message }),
            ) => invoke(|| (callbacks.on_error)(error_message)),
            (
                HostCallbacks::Registration(callbacks),
                HostEvent::Registration(RegistrationResult::Registered { face_id }),
            ) => {
                debug!("bridge[{label}] invoking success callback for {face_id}");
                invoke(|| (callbacks.on_face_registered)(face_id))
            }
            (
                HostCallbacks::Registration(callbacks),
                HostEvent::Registration(RegistrationResult::Failed { error_message }),
            ) => invoke(|| (callbacks.on_error)(error_message)),
            (
                HostCallbacks::Registration(callbacks),
                HostEvent::Registration(RegistrationResult::Cancelled),
            ) => invoke(|| (callbacks.on_close)()),
            (_, event) => Err(format!("no callback for {event:?}")),
        };

        match outcome {
            Ok(()) => true,
            Err(reason) => {
                error!(
                    "bridge[{label}] {}: {:?}: {reason}",
                    self.session.id,
                    FailureKind::BridgeInvocationFailure
                );
                false
            }
        }
    }
}

fn invoke(callback: impl FnOnce() -> CallbackResult) -> Result<(), String> {
    match catch_unwind(AssertUnwindSafe(callback)) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(error)) => Err(format!("callback failed: {error}")),
        Err(payload) => {
            let detail = payload
                .downcast_ref::<&str>()
                .map(|text| (*text).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_string());
            Err(format!("callback panicked: {detail}"))
        }
    }
}

/// Creates both halves of a bridge for one document load.
pub fn open_bridge(
    session_id: SessionId,
    callbacks: HostCallbacks,
    options: BridgeOptions,
    waker: Arc<dyn UiWaker>,
) -> (BridgeEndpoint, HostReceiver) {
    let session = Arc::new(BridgeSession::new(session_id, callbacks.variant()));
    let (events_tx, events_rx) = mpsc::channel();

    let endpoint = BridgeEndpoint {
        session: Arc::clone(&session),
        events: events_tx,
        waker,
        options: Arc::new(options),
    };
    let receiver = HostReceiver {
        session,
        events: events_rx,
        callbacks,
    };
    (endpoint, receiver)
}

/// Bridge-level rejection reasons.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Posted payload is not a valid envelope.
    #[error("bridge message decode failure: {0}")]
    Decode(#[from] serde_json::Error),
    /// Envelope belongs to another document load.
    #[error("stale session: expected {expected}, got {actual}")]
    StaleSession {
        /// Current session id.
        expected: String,
        /// Session id carried by the message.
        actual: String,
    },
    /// Message kind is not part of the variant's surface.
    #[error("{kind} is not accepted by the {variant:?} bridge")]
    WrongVariant {
        /// Receiving bridge variant.
        variant: BridgeVariant,
        /// Offending message kind.
        kind: &'static str,
    },
}
