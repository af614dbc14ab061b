#![warn(missing_docs)]
//! # smart-attend-webview
//!
//! ## Purpose
//! Hosts the embedded face widget: generates its document, configures the
//! browser view, installs the bridge, and owns teardown.
//!
//! ## Responsibilities
//! - Render the authentication and registration documents with the session
//!   id, shared error table, SDK options, and pacing delays injected as JSON.
//! - Describe the fixed browser-view configuration and camera permission
//!   policy.
//! - Mount exactly one bridge per document load behind the [`BrowserView`]
//!   seam and destroy the view on unmount.
//!
//! ## Data flow
//! [`WidgetHost::mount`] -> session id + [`render_document`] -> `open_bridge`
//! -> [`BrowserView::apply_settings`] -> [`BrowserView::install_binding`] ->
//! [`BrowserView::load_document`] -> [`MountedWidget`] (UI thread pumps
//! events with [`MountedWidget::pump`]).
//!
//! ## Ownership and lifetimes
//! A [`MountedWidget`] exclusively owns its view, bridge endpoint, and host
//! receiver. Dropping it destroys the view, after which the endpoint held by
//! the embedding has no receiver and drops every message.
//!
//! ## Error model
//! Invalid URLs, callback/variant mismatches, rendering failures, and view
//! failures return [`HostError`]. A failed mount destroys the view before
//! returning.
//!
//! ## Security and privacy notes
//! Every value injected into the document is JSON-encoded with `<` escaped,
//! so student-supplied text cannot close the script element. The SDK script
//! and the synthetic base origin must be HTTPS.

use std::sync::Arc;

use log::{debug, info, warn};
use serde::Serialize;
use serde_json::Value;
use smart_attend_bridge::{
    BRIDGE_BINDING_NAME, BridgeEndpoint, BridgeOptions, BridgeVariant, Delivery, DrainReport,
    HostCallbacks, HostReceiver, SessionId, SessionState, UiWaker, open_bridge,
};
use smart_attend_faceio::{AuthenticateOptions, EnrollOptions, error_table_json};
use thiserror::Error;
use url::Url;

/// Synthetic origin the document is loaded under.
pub const DEFAULT_BASE_URL: &str = "https://localhost";

/// Location of the third-party SDK script.
pub const DEFAULT_SDK_SCRIPT_URL: &str = "https://cdn.faceio.net/fio.js";

/// Public application id registered with the SDK vendor.
pub const DEFAULT_FACEIO_APP_ID: &str = "fioa3e64";

/// MIME type of the generated document.
pub const HTML_MIME_TYPE: &str = "text/html";

/// Encoding of the generated document.
pub const DOCUMENT_ENCODING: &str = "UTF-8";

/// Log target for browser console output.
pub const CONSOLE_LOG_TARGET: &str = "smart_attend::webview::console";

/// Mixed-content handling of the browser view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MixedContentMode {
    /// Load insecure subresources from secure origins.
    AlwaysAllow,
    /// Engine default heuristics.
    CompatibilityMode,
    /// Block insecure subresources.
    NeverAllow,
}

/// Browser-view configuration applied before the document loads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebViewSettings {
    /// Script execution.
    pub javascript_enabled: bool,
    /// `localStorage` / `sessionStorage`.
    pub dom_storage_enabled: bool,
    /// Whether media needs a user gesture before it plays.
    pub media_playback_requires_user_gesture: bool,
    /// `file://` access.
    pub allow_file_access: bool,
    /// Content-provider access.
    pub allow_content_access: bool,
    /// Script in `file://` documents may read other `file://` URLs.
    pub allow_file_access_from_file_urls: bool,
    /// Script in `file://` documents may read any origin.
    pub allow_universal_access_from_file_urls: bool,
    /// Mixed-content policy.
    pub mixed_content: MixedContentMode,
}

impl WebViewSettings {
    /// The configuration the face SDK needs to run inside the widget.
    pub fn hardened_for_widget() -> Self {
        Self {
            javascript_enabled: true,
            dom_storage_enabled: true,
            media_playback_requires_user_gesture: false,
            allow_file_access: true,
            allow_content_access: true,
            allow_file_access_from_file_urls: true,
            allow_universal_access_from_file_urls: true,
            mixed_content: MixedContentMode::AlwaysAllow,
        }
    }
}

/// Capability requested by embedded content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermissionResource {
    /// Camera.
    VideoCapture,
    /// Microphone.
    AudioCapture,
    /// Protected media identifier.
    ProtectedMediaId,
    /// MIDI system-exclusive messages.
    MidiSysex,
}

/// Answers permission prompts raised inside the widget.
///
/// The host gates the screen behind its own camera permission, so camera
/// requests are granted silently and narrowed to the camera alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PermissionPolicy;

impl PermissionPolicy {
    /// Returns the resources to grant for `requested`.
    pub fn decide(&self, requested: &[PermissionResource]) -> Vec<PermissionResource> {
        if requested.contains(&PermissionResource::VideoCapture) {
            debug!("granting camera to embedded widget");
            vec![PermissionResource::VideoCapture]
        } else {
            requested.to_vec()
        }
    }
}

/// Pacing delays used by the embedded content, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WidgetTiming {
    /// Wait after `load` before constructing the SDK.
    pub init_delay_ms: u64,
    /// Wait after the start control is pressed before calling the SDK.
    pub trigger_delay_ms: u64,
    /// Posting delay for authentication outcomes and registration errors.
    pub auth_callback_delay_ms: u64,
    /// Posting delay for a registration success.
    pub registration_callback_delay_ms: u64,
    /// Posting delay for everything else.
    pub default_callback_delay_ms: u64,
}

impl Default for WidgetTiming {
    fn default() -> Self {
        Self {
            init_delay_ms: 2_000,
            trigger_delay_ms: 500,
            auth_callback_delay_ms: 200,
            registration_callback_delay_ms: 500,
            default_callback_delay_ms: 100,
        }
    }
}

/// Static inputs to document rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetDocumentConfig {
    /// SDK application id.
    pub app_id: String,
    /// SDK script location (HTTPS).
    pub sdk_script_url: Url,
    /// Synthetic document origin (HTTPS).
    pub base_url: Url,
    /// Pacing delays.
    pub timing: WidgetTiming,
}

impl WidgetDocumentConfig {
    /// Builds a config after validating both URLs.
    ///
    /// # Errors
    /// Returns [`HostError::InvalidUrl`] when a URL does not parse or is not
    /// HTTPS, and [`HostError::EmptyAppId`] for a blank app id.
    pub fn new(
        app_id: impl Into<String>,
        sdk_script_url: &str,
        base_url: &str,
        timing: WidgetTiming,
    ) -> Result<Self, HostError> {
        let app_id = app_id.into();
        if app_id.trim().is_empty() {
            return Err(HostError::EmptyAppId);
        }

        Ok(Self {
            app_id,
            sdk_script_url: validate_https_url(sdk_script_url)?,
            base_url: validate_https_url(base_url)?,
            timing,
        })
    }

    /// Config built from the default app id, SDK script, base URL, and timing.
    ///
    /// # Errors
    /// Returns [`HostError::InvalidUrl`] if a default URL fails validation.
    pub fn from_defaults() -> Result<Self, HostError> {
        Self::new(
            DEFAULT_FACEIO_APP_ID,
            DEFAULT_SDK_SCRIPT_URL,
            DEFAULT_BASE_URL,
            WidgetTiming::default(),
        )
    }
}

/// Parses `raw` and requires the `https` scheme.
///
/// # Errors
/// Returns [`HostError::InvalidUrl`] on parse failure or a non-HTTPS scheme.
pub fn validate_https_url(raw: &str) -> Result<Url, HostError> {
    let parsed = Url::parse(raw)
        .map_err(|error| HostError::InvalidUrl(format!("{raw}: {error}")))?;

    if parsed.scheme() != "https" {
        return Err(HostError::InvalidUrl(format!("{raw}: must use https")));
    }

    Ok(parsed)
}

/// Which widget to render and mount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetKind {
    /// Attendance authentication.
    Authentication,
    /// Self-service registration for one student.
    Registration {
        /// Roll number stored with the enrolment.
        roll_number: String,
    },
}

impl WidgetKind {
    /// Bridge variant serving this widget.
    pub fn variant(&self) -> BridgeVariant {
        match self {
            Self::Authentication => BridgeVariant::Authentication,
            Self::Registration { .. } => BridgeVariant::Registration,
        }
    }
}

/// Inline document handed to the browser view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentLoad {
    /// Synthetic origin.
    pub base_url: String,
    /// Full HTML text.
    pub html: String,
    /// Always [`HTML_MIME_TYPE`].
    pub mime_type: &'static str,
    /// Always [`DOCUMENT_ENCODING`].
    pub encoding: &'static str,
}

impl DocumentLoad {
    /// Wraps `html` for loading under `base_url`.
    pub fn new(base_url: &Url, html: String) -> Self {
        Self {
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
            html,
            mime_type: HTML_MIME_TYPE,
            encoding: DOCUMENT_ENCODING,
        }
    }
}

#[derive(Serialize)]
struct WidgetBootstrap<'a> {
    session_id: &'a str,
    variant: &'static str,
    binding: &'static str,
    app_id: &'a str,
    error_messages: Value,
    unknown_error_message: Option<&'static str>,
    timing: WidgetTiming,
    sdk_options: Value,
}

/// Renders the authentication document for `session`.
///
/// # Errors
/// Returns [`HostError::Render`] when the bootstrap data cannot be encoded.
pub fn render_authentication_document(
    session: &SessionId,
    config: &WidgetDocumentConfig,
) -> Result<String, HostError> {
    render_document(session, &WidgetKind::Authentication, config)
}

/// Renders the registration document for `session` and `roll_number`.
///
/// # Errors
/// Returns [`HostError::Render`] when the bootstrap data cannot be encoded.
pub fn render_registration_document(
    session: &SessionId,
    roll_number: &str,
    config: &WidgetDocumentConfig,
) -> Result<String, HostError> {
    render_document(
        session,
        &WidgetKind::Registration {
            roll_number: roll_number.to_string(),
        },
        config,
    )
}

/// Renders the document for `kind`.
///
/// # Errors
/// Returns [`HostError::Render`] when the bootstrap data cannot be encoded.
pub fn render_document(
    session: &SessionId,
    kind: &WidgetKind,
    config: &WidgetDocumentConfig,
) -> Result<String, HostError> {
    let (variant, sdk_options) = match kind {
        WidgetKind::Authentication => (
            "authentication",
            serde_json::to_value(AuthenticateOptions::default())?,
        ),
        WidgetKind::Registration { roll_number } => (
            "registration",
            serde_json::to_value(EnrollOptions::for_student(roll_number.as_str()))?,
        ),
    };

    let bootstrap = WidgetBootstrap {
        session_id: session.as_str(),
        variant,
        binding: BRIDGE_BINDING_NAME,
        app_id: &config.app_id,
        error_messages: serde_json::from_str(&error_table_json())?,
        unknown_error_message: kind.variant().unknown_code_policy().fallback_message(),
        timing: config.timing,
        sdk_options,
    };
    let bootstrap = js_literal(&bootstrap)?;
    let script_url = html_escape(config.sdk_script_url.as_str());

    let (title, heading, info, extra) = match kind {
        WidgetKind::Authentication => (
            "Attendance Verification",
            "Attendance Verification",
            "Look at the camera to mark attendance",
            String::new(),
        ),
        WidgetKind::Registration { roll_number } => (
            "Face Registration",
            "Student Face Registration",
            "Position your face in the camera frame to register",
            format!(
                r#"<div class="roll-number">Roll Number: {}</div>"#,
                html_escape(roll_number)
            ),
        ),
    };
    let (start_label, close_button) = match kind {
        WidgetKind::Authentication => ("Start Face Scan", ""),
        WidgetKind::Registration { .. } => (
            "Start Face Registration",
            r#"<button id="closeButton" class="close-button" style="display: none;">Cancel Registration</button>"#,
        ),
    };

    Ok(format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>{WIDGET_CSS}</style>
</head>
<body>
    <div id="faceio-modal"></div>
    <div class="container">
        <h2>{heading}</h2>
        {extra}
        <p class="info">{info}</p>
        <div id="status" class="status loading">Initializing Face.io...</div>
        <button id="startButton" class="button" style="display: none;">{start_label}</button>
        {close_button}
    </div>
    <script src="{script_url}"></script>
    <script type="text/javascript">
        const WIDGET = {bootstrap};
{WIDGET_SCRIPT}
    </script>
</body>
</html>"#
    ))
}

/// Encodes `value` as a JSON literal safe to embed in a `<script>` element.
///
/// # Errors
/// Returns [`HostError::Render`] when serialization fails.
pub fn js_literal<T: Serialize + ?Sized>(value: &T) -> Result<String, HostError> {
    let encoded = serde_json::to_string(value)?;
    Ok(encoded
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029"))
}

fn html_escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for character in raw.chars() {
        match character {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

const WIDGET_CSS: &str = r#"
body { margin: 0; padding: 20px; font-family: Arial, sans-serif; display: flex; flex-direction: column; align-items: center; justify-content: center; min-height: 100vh; background: linear-gradient(135deg, #007AFF 0%, #5856D6 100%); }
.container { text-align: center; background: white; padding: 30px; border-radius: 15px; box-shadow: 0 10px 30px rgba(0,0,0,0.2); max-width: 400px; width: 100%; }
h2 { color: #333; margin-bottom: 10px; }
.info { color: #666; margin-bottom: 20px; }
.roll-number { background: #f0f4ff; color: #007AFF; padding: 10px; border-radius: 8px; margin-bottom: 15px; font-weight: bold; }
.status { margin: 20px 0; padding: 15px; border-radius: 8px; font-size: 16px; }
.status.loading { background: #e3f2fd; color: #1976d2; }
.status.success { background: #e8f5e9; color: #2e7d32; }
.status.error { background: #ffebee; color: #c62828; }
.button { background: #007AFF; color: white; border: none; padding: 15px 30px; border-radius: 8px; font-size: 16px; cursor: pointer; width: 100%; margin-top: 10px; }
.button:disabled { background: #ccc; cursor: not-allowed; }
.close-button { background: transparent; color: #666; border: 1px solid #ccc; padding: 12px 30px; border-radius: 8px; font-size: 14px; cursor: pointer; width: 100%; margin-top: 10px; }
"#;

const WIDGET_SCRIPT: &str = r#"
        (function () {
            const registration = WIDGET.variant === 'registration';
            const statusDiv = document.getElementById('status');
            const startButton = document.getElementById('startButton');
            const closeButton = document.getElementById('closeButton');
            let faceio = null;
            let busy = false;
            let completed = false;

            function post(kind, fields) {
                const envelope = Object.assign({ session_id: WIDGET.session_id, kind: kind }, fields || {});
                const bridge = window[WIDGET.binding];
                if (!bridge || !bridge.postMessage) {
                    console.error('bridge unavailable for ' + kind);
                    return;
                }
                try {
                    bridge.postMessage(JSON.stringify(envelope));
                } catch (error) {
                    console.error('bridge call failed: ' + error);
                }
            }

            function postLater(kind, fields, delay) {
                setTimeout(function () { post(kind, fields); }, delay);
            }

            function log(message) {
                console.log(message);
                post('log', { message: String(message) });
            }

            function setStatus(text, className) {
                statusDiv.textContent = text;
                statusDiv.className = 'status ' + className;
            }

            function setControlsVisible(visible) {
                startButton.style.display = visible ? 'block' : 'none';
                if (closeButton) {
                    closeButton.style.display = visible ? 'block' : 'none';
                }
            }

            function normalizeCode(code) {
                return (typeof code === 'number' || typeof code === 'string') ? code : String(code);
            }

            function describe(code) {
                return WIDGET.error_messages[code]
                    || WIDGET.unknown_error_message
                    || ('Unknown error occurred (Code: ' + code + ')');
            }

            if (closeButton) {
                closeButton.addEventListener('click', function () {
                    log('user closed registration');
                    postLater('close', {}, WIDGET.timing.default_callback_delay_ms);
                });
            }

            window.addEventListener('load', function () {
                log('page loaded, initializing ' + WIDGET.variant + ' widget');
                setTimeout(function () {
                    try {
                        faceio = new faceIO(WIDGET.app_id);
                    } catch (error) {
                        setStatus('Failed to initialize Face.io: ' + error.message, 'error');
                        postLater('init_failed', { message: String(error.message) }, WIDGET.timing.default_callback_delay_ms);
                        return;
                    }
                    setStatus(registration
                        ? 'Face.io ready. Click button to start registration.'
                        : 'Face.io ready. Click button to scan face.', 'loading');
                    setControlsVisible(true);
                    startButton.addEventListener('click', start);
                    post('ready');
                }, WIDGET.timing.init_delay_ms);
            });

            function start() {
                if (busy || completed) {
                    return;
                }
                busy = true;
                startButton.disabled = true;
                setControlsVisible(false);
                setStatus(registration ? 'Starting face enrollment...' : 'Scanning face...', 'loading');
                post('scan_started');
                setTimeout(registration ? enroll : authenticate, WIDGET.timing.trigger_delay_ms);
            }

            function fail(code, delay) {
                if (completed) {
                    log('ignoring rejection after completion');
                    return;
                }
                const normalized = normalizeCode(code);
                log('sdk rejected with code ' + normalized);
                setStatus('Error: ' + describe(normalized), 'error');
                busy = false;
                startButton.disabled = false;
                startButton.textContent = 'Try Again';
                setControlsVisible(true);
                postLater('scan_failed', { code: normalized }, delay);
            }

            function succeed(kind, result, text, delay) {
                if (completed) {
                    log('ignoring duplicate ' + kind);
                    return;
                }
                completed = true;
                busy = false;
                setStatus(text, 'success');
                startButton.disabled = true;
                postLater(kind, { result: result }, delay);
            }

            function authenticate() {
                faceio.authenticate(WIDGET.sdk_options).then(function (userData) {
                    succeed('authenticated', userData, 'Face recognized! Processing attendance...', WIDGET.timing.auth_callback_delay_ms);
                }).catch(function (code) {
                    fail(code, WIDGET.timing.auth_callback_delay_ms);
                });
            }

            function enroll() {
                const options = JSON.parse(JSON.stringify(WIDGET.sdk_options));
                options.payload.registrationDate = new Date().toISOString();
                faceio.enroll(options).then(function (userInfo) {
                    succeed('face_registered', userInfo, 'Face registered successfully!', WIDGET.timing.registration_callback_delay_ms);
                }).catch(function (code) {
                    fail(code, WIDGET.timing.auth_callback_delay_ms);
                });
            }
        })();
"#;

/// Severity of a browser console message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleLevel {
    /// `console.debug` / `console.log`.
    Log,
    /// `console.warn`.
    Warning,
    /// `console.error`.
    Error,
}

/// Re-emits a console line from the browser view under [`CONSOLE_LOG_TARGET`].
pub fn forward_console_message(level: ConsoleLevel, message: &str) {
    match level {
        ConsoleLevel::Log => debug!(target: CONSOLE_LOG_TARGET, "{message}"),
        ConsoleLevel::Warning => warn!(target: CONSOLE_LOG_TARGET, "{message}"),
        ConsoleLevel::Error => log::error!(target: CONSOLE_LOG_TARGET, "{message}"),
    }
}

/// Platform browser view the widget is mounted into.
pub trait BrowserView {
    /// Applies `settings` before anything loads.
    ///
    /// # Errors
    /// Returns [`HostError::View`] when the platform rejects a setting.
    fn apply_settings(&mut self, settings: &WebViewSettings) -> Result<(), HostError>;

    /// Exposes `endpoint` to the script context as `window.<name>.postMessage`.
    ///
    /// # Errors
    /// Returns [`HostError::View`] when the binding cannot be installed.
    fn install_binding(&mut self, name: &str, endpoint: BridgeEndpoint) -> Result<(), HostError>;

    /// Loads the inline document.
    ///
    /// # Errors
    /// Returns [`HostError::View`] when the platform refuses the load.
    fn load_document(&mut self, load: &DocumentLoad) -> Result<(), HostError>;

    /// Releases the view and its script context.
    fn destroy(&mut self);
}

/// Call recorded by [`RecordingBrowserView`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewCall {
    /// `apply_settings`.
    ApplySettings(WebViewSettings),
    /// `install_binding` with the binding name.
    InstallBinding(String),
    /// `load_document`.
    LoadDocument(DocumentLoad),
    /// `destroy`.
    Destroy,
}

/// In-memory [`BrowserView`] that records calls and lets tests post
/// messages through the installed binding.
#[derive(Debug, Default)]
pub struct RecordingBrowserView {
    calls: Vec<ViewCall>,
    binding: Option<BridgeEndpoint>,
    fail_load: bool,
}

impl RecordingBrowserView {
    /// Creates a view that accepts every call.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a view whose `load_document` fails.
    pub fn failing_load() -> Self {
        Self {
            fail_load: true,
            ..Self::default()
        }
    }

    /// Calls recorded so far.
    pub fn calls(&self) -> &[ViewCall] {
        &self.calls
    }

    /// Last loaded document, if any.
    pub fn loaded_document(&self) -> Option<&DocumentLoad> {
        self.calls.iter().rev().find_map(|call| match call {
            ViewCall::LoadDocument(load) => Some(load),
            _ => None,
        })
    }

    /// Returns `true` once `destroy` ran.
    pub fn is_destroyed(&self) -> bool {
        self.calls.contains(&ViewCall::Destroy)
    }

    /// Simulates `window.AttendanceBridge.postMessage(raw)` from script.
    pub fn post(&self, raw: &str) -> Option<Delivery> {
        if self.is_destroyed() {
            return None;
        }
        self.binding.as_ref().map(|endpoint| endpoint.deliver_raw(raw))
    }
}

impl BrowserView for RecordingBrowserView {
    fn apply_settings(&mut self, settings: &WebViewSettings) -> Result<(), HostError> {
        self.calls.push(ViewCall::ApplySettings(settings.clone()));
        Ok(())
    }

    fn install_binding(&mut self, name: &str, endpoint: BridgeEndpoint) -> Result<(), HostError> {
        self.calls.push(ViewCall::InstallBinding(name.to_string()));
        self.binding = Some(endpoint);
        Ok(())
    }

    fn load_document(&mut self, load: &DocumentLoad) -> Result<(), HostError> {
        if self.fail_load {
            return Err(HostError::View("document load refused".to_string()));
        }
        self.calls.push(ViewCall::LoadDocument(load.clone()));
        Ok(())
    }

    fn destroy(&mut self) {
        self.binding = None;
        self.calls.push(ViewCall::Destroy);
    }
}

/// Mounts widgets into browser views.
#[derive(Debug, Clone)]
pub struct WidgetHost {
    settings: WebViewSettings,
    policy: PermissionPolicy,
    config: WidgetDocumentConfig,
    options: BridgeOptions,
}

impl WidgetHost {
    /// Creates a host rendering documents with `config`.
    pub fn new(config: WidgetDocumentConfig) -> Self {
        Self {
            settings: WebViewSettings::hardened_for_widget(),
            policy: PermissionPolicy,
            config,
            options: BridgeOptions::default(),
        }
    }

    /// Overrides bridge translation options.
    pub fn with_bridge_options(mut self, options: BridgeOptions) -> Self {
        self.options = options;
        self
    }

    /// Document config in use.
    pub fn config(&self) -> &WidgetDocumentConfig {
        &self.config
    }

    /// Creates one bridge, installs it into `view`, and loads the document.
    ///
    /// # Errors
    /// Returns [`HostError::VariantMismatch`] when `callbacks` do not match
    /// `kind`, or any error raised by rendering or by the view. The view is
    /// destroyed before a view error is returned.
    pub fn mount<V: BrowserView>(
        &self,
        mut view: V,
        kind: WidgetKind,
        callbacks: HostCallbacks,
        waker: Arc<dyn UiWaker>,
    ) -> Result<MountedWidget<V>, HostError> {
        if callbacks.variant() != kind.variant() {
            return Err(HostError::VariantMismatch {
                widget: kind.variant(),
                callbacks: callbacks.variant(),
            });
        }

        let session_id = SessionId::generate();
        let html = render_document(&session_id, &kind, &self.config)?;
        let load = DocumentLoad::new(&self.config.base_url, html);
        let (endpoint, receiver) = open_bridge(session_id, callbacks, self.options.clone(), waker);

        if let Err(error) = install(&mut view, &self.settings, &endpoint, &load) {
            warn!("widget mount failed: {error}");
            view.destroy();
            return Err(error);
        }

        info!(
            "mounted {:?} widget, session {}",
            kind.variant(),
            endpoint.session().id()
        );
        Ok(MountedWidget {
            view: Some(view),
            endpoint,
            receiver,
            policy: self.policy,
            destroyed: false,
        })
    }
}

fn install<V: BrowserView>(
    view: &mut V,
    settings: &WebViewSettings,
    endpoint: &BridgeEndpoint,
    load: &DocumentLoad,
) -> Result<(), HostError> {
    view.apply_settings(settings)?;
    view.install_binding(BRIDGE_BINDING_NAME, endpoint.clone())?;
    endpoint.mark_document_loaded();
    view.load_document(load)
}

/// One mounted widget: view, bridge endpoint, and UI-thread receiver.
pub struct MountedWidget<V: BrowserView> {
    view: Option<V>,
    endpoint: BridgeEndpoint,
    receiver: HostReceiver,
    policy: PermissionPolicy,
    destroyed: bool,
}

impl<V: BrowserView> MountedWidget<V> {
    /// Runs queued bridge events through the host callbacks.
    pub fn pump(&mut self) -> DrainReport {
        self.receiver.drain()
    }

    /// Session id embedded in the loaded document.
    pub fn session_id(&self) -> &SessionId {
        self.endpoint.session().id()
    }

    /// Current bridge state.
    pub fn state(&self) -> SessionState {
        self.endpoint.session().state()
    }

    /// Engine-side endpoint.
    pub fn endpoint(&self) -> &BridgeEndpoint {
        &self.endpoint
    }

    /// The mounted view; `None` only after [`MountedWidget::unmount`]
    /// took it.
    pub fn view(&self) -> Option<&V> {
        self.view.as_ref()
    }

    /// Answers a permission prompt from the embedded content.
    pub fn on_permission_request(&self, requested: &[PermissionResource]) -> Vec<PermissionResource> {
        self.policy.decide(requested)
    }

    /// Forwards a browser console line to the log.
    pub fn on_console_message(&self, level: ConsoleLevel, message: &str) {
        forward_console_message(level, message);
    }

    /// Destroys the view and hands it back to the caller.
    pub fn unmount(mut self) -> Option<V> {
        self.teardown();
        self.view.take()
    }

    fn teardown(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        if let Some(view) = self.view.as_mut() {
            view.destroy();
        }
        debug!(
            "destroyed widget view for session {}",
            self.endpoint.session().id()
        );
    }
}

impl<V: BrowserView> Drop for MountedWidget<V> {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Host controller errors.
#[derive(Debug, Error)]
pub enum HostError {
    /// URL does not parse or is not HTTPS.
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    /// SDK app id is blank.
    #[error("sdk app id must be non-empty")]
    EmptyAppId,
    /// Bootstrap data could not be encoded.
    #[error("document render failure: {0}")]
    Render(#[from] serde_json::Error),
    /// Callback set does not match the widget kind.
    #[error("{callbacks:?} callbacks cannot serve a {widget:?} widget")]
    VariantMismatch {
        /// Widget variant.
        widget: BridgeVariant,
        /// Callback variant.
        callbacks: BridgeVariant,
    },
    /// Platform view failure.
    #[error("browser view failure: {0}")]
    View(String),
}
