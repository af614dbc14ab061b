//! Shared fixtures for app integration tests.

use std::sync::Arc;

use serde_json::{Value, json};
use smart_attend_app::AppConfig;
use smart_attend_bridge::{BridgeEnvelope, BridgeMessage, Delivery, NoopWaker, UiWaker};
use smart_attend_webview::{MountedWidget, RecordingBrowserView, WidgetHost};

/// Host built from default configuration.
#[allow(dead_code)]
pub fn host() -> WidgetHost {
    AppConfig::default()
        .widget_host()
        .expect("default config should be valid")
}

/// Waker that does nothing; tests pump explicitly.
#[allow(dead_code)]
pub fn waker() -> Arc<dyn UiWaker> {
    Arc::new(NoopWaker)
}

/// Posts `message` through the recording view of `widget`.
#[allow(dead_code)]
pub fn post(widget: &MountedWidget<RecordingBrowserView>, message: BridgeMessage) -> Delivery {
    let raw = BridgeEnvelope::new(widget.session_id(), message)
        .to_json()
        .expect("fixture envelope should encode");
    widget
        .view()
        .and_then(|view| view.post(&raw))
        .expect("view should hold a live binding")
}

/// `authenticate()` resolution carrying `roll_number`.
#[allow(dead_code)]
pub fn auth_result(roll_number: &str) -> Value {
    json!({ "facialId": "F-7", "payload": { "rollNumber": roll_number } })
}

