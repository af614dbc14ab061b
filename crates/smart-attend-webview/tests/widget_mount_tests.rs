//! Integration tests for mounting widgets into a browser view.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use serde_json::json;
use smart_attend_bridge::{
    AuthenticationCallbacks, BRIDGE_BINDING_NAME, BridgeEnvelope, BridgeMessage, Delivery,
    HostCallbacks, NoopWaker, RegistrationCallbacks, SessionState,
};
use smart_attend_webview::{
    ConsoleLevel, HostError, PermissionResource, RecordingBrowserView, ViewCall,
    WebViewSettings, WidgetDocumentConfig, WidgetHost, WidgetKind,
};

fn host() -> WidgetHost {
    WidgetHost::new(WidgetDocumentConfig::from_defaults().expect("defaults should validate"))
}

fn auth_callbacks(log: &Rc<RefCell<Vec<String>>>) -> HostCallbacks {
    let success = Rc::clone(log);
    let failure = Rc::clone(log);
    HostCallbacks::Authentication(AuthenticationCallbacks::new(
        move |roll_number| {
            success.borrow_mut().push(format!("ok:{roll_number}"));
            Ok(())
        },
        move |message| {
            failure.borrow_mut().push(format!("err:{message}"));
            Ok(())
        },
    ))
}

#[test]
fn widget_mount_tests_configures_view_in_order() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let widget = host()
        .mount(
            RecordingBrowserView::new(),
            WidgetKind::Authentication,
            auth_callbacks(&log),
            Arc::new(NoopWaker),
        )
        .expect("mount should succeed");

    let view = widget.view().expect("view should be mounted");
    let calls = view.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(
        calls[0],
        ViewCall::ApplySettings(WebViewSettings::hardened_for_widget())
    );
    assert_eq!(
        calls[1],
        ViewCall::InstallBinding(BRIDGE_BINDING_NAME.to_string())
    );
    let load = view.loaded_document().expect("document should load");
    assert_eq!(load.base_url, "https://localhost");
    assert_eq!(load.mime_type, "text/html");
    assert_eq!(load.encoding, "UTF-8");
    assert!(load.html.contains(widget.session_id().as_str()));
    assert_eq!(widget.state(), SessionState::Initializing);
}

#[test]
fn widget_mount_tests_script_posts_reach_callbacks_after_pump() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut widget = host()
        .mount(
            RecordingBrowserView::new(),
            WidgetKind::Authentication,
            auth_callbacks(&log),
            Arc::new(NoopWaker),
        )
        .expect("mount should succeed");

    let raw = BridgeEnvelope::new(
        widget.session_id(),
        BridgeMessage::Authenticated {
            result: json!({ "payload": { "rollNumber": "21BCE1234" } }),
        },
    )
    .to_json()
    .expect("envelope should encode");
    let view = widget.view().expect("view should be mounted");
    assert_eq!(view.post(&raw), Some(Delivery::Forwarded));
    assert_eq!(
        view.post(&raw),
        Some(Delivery::Dropped(
            smart_attend_bridge::DropReason::AlreadyCompleted
        ))
    );

    assert_eq!(widget.pump().delivered, 1);
    assert_eq!(*log.borrow(), vec!["ok:21BCE1234".to_string()]);
}

#[test]
fn widget_mount_tests_each_mount_gets_fresh_session() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let host = host();
    let first = host
        .mount(
            RecordingBrowserView::new(),
            WidgetKind::Authentication,
            auth_callbacks(&log),
            Arc::new(NoopWaker),
        )
        .expect("first mount");
    let second = host
        .mount(
            RecordingBrowserView::new(),
            WidgetKind::Authentication,
            auth_callbacks(&log),
            Arc::new(NoopWaker),
        )
        .expect("second mount");

    assert_ne!(first.session_id(), second.session_id());

    let stale = BridgeEnvelope::new(first.session_id(), BridgeMessage::Ready)
        .to_json()
        .expect("envelope should encode");
    assert_eq!(
        second.view().expect("mounted").post(&stale),
        Some(Delivery::Dropped(smart_attend_bridge::DropReason::StaleSession))
    );
}

#[test]
fn widget_mount_tests_unmount_destroys_view() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let widget = host()
        .mount(
            RecordingBrowserView::new(),
            WidgetKind::Authentication,
            auth_callbacks(&log),
            Arc::new(NoopWaker),
        )
        .expect("mount should succeed");

    let view = widget.unmount().expect("view should be returned");
    assert!(view.is_destroyed());
    assert_eq!(
        view.calls().iter().filter(|call| **call == ViewCall::Destroy).count(),
        1
    );
    assert_eq!(view.post("{}"), None);
}

#[test]
fn widget_mount_tests_failed_load_destroys_view() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let result = host().mount(
        RecordingBrowserView::failing_load(),
        WidgetKind::Authentication,
        auth_callbacks(&log),
        Arc::new(NoopWaker),
    );

    assert!(matches!(result, Err(HostError::View(_))));
}

#[test]
fn widget_mount_tests_rejects_mismatched_callbacks() {
    let callbacks = HostCallbacks::Registration(RegistrationCallbacks::new(
        |_face_id| Ok(()),
        |_message| Ok(()),
        || Ok(()),
    ));

    let result = host().mount(
        RecordingBrowserView::new(),
        WidgetKind::Authentication,
        callbacks,
        Arc::new(NoopWaker),
    );

    assert!(matches!(result, Err(HostError::VariantMismatch { .. })));
}

#[test]
fn widget_mount_tests_camera_prompt_is_auto_granted() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let widget = host()
        .mount(
            RecordingBrowserView::new(),
            WidgetKind::Authentication,
            auth_callbacks(&log),
            Arc::new(NoopWaker),
        )
        .expect("mount should succeed");

    assert_eq!(
        widget.on_permission_request(&[
            PermissionResource::VideoCapture,
            PermissionResource::AudioCapture
        ]),
        vec![PermissionResource::VideoCapture]
    );
    widget.on_console_message(ConsoleLevel::Error, "faceIO is not defined");
}
