//! Integration tests for one-shot success delivery.

mod common;

use common::{Call, auth_bridge, auth_result, enroll_result, post, registration_bridge};
use smart_attend_bridge::{BridgeMessage, Delivery, DropReason, SessionState, Terminal};
use smart_attend_faceio::RawErrorCode;

#[test]
fn single_fire_tests_duplicate_success_reaches_host_once() {
    let (endpoint, mut receiver, recorder, _waker) = auth_bridge();
    let raw = post(BridgeMessage::Authenticated {
        result: auth_result("21BCE1234"),
    });

    assert_eq!(endpoint.deliver_raw(&raw), Delivery::Forwarded);
    for _ in 0..5 {
        assert_eq!(
            endpoint.deliver_raw(&raw),
            Delivery::Dropped(DropReason::AlreadyCompleted)
        );
    }

    let report = receiver.drain();
    assert_eq!(report.delivered, 1);
    assert_eq!(
        recorder.borrow().calls,
        vec![Call::Success("21BCE1234".to_string())]
    );
}

#[test]
fn single_fire_tests_calls_after_success_are_silent() {
    let (endpoint, mut receiver, recorder, _waker) = auth_bridge();
    endpoint.deliver_raw(&post(BridgeMessage::Authenticated {
        result: auth_result("21BCE1234"),
    }));

    assert_eq!(
        endpoint.deliver_raw(&post(BridgeMessage::ScanFailed {
            code: RawErrorCode::Numeric(2),
        })),
        Delivery::Dropped(DropReason::AlreadyCompleted)
    );
    assert_eq!(
        endpoint.deliver_raw(&post(BridgeMessage::Log {
            message: "late".to_string(),
        })),
        Delivery::Logged
    );
    endpoint.deliver_raw(&post(BridgeMessage::Authenticated {
        result: auth_result("OTHER"),
    }));

    receiver.drain();
    assert_eq!(
        recorder.borrow().calls,
        vec![Call::Success("21BCE1234".to_string())]
    );
    assert_eq!(endpoint.session().state(), SessionState::Succeeded);
}

#[test]
fn single_fire_tests_errors_are_not_deduplicated() {
    let (endpoint, mut receiver, recorder, _waker) = auth_bridge();
    let raw = post(BridgeMessage::ScanFailed {
        code: RawErrorCode::Numeric(3),
    });

    assert_eq!(endpoint.deliver_raw(&raw), Delivery::Forwarded);
    assert_eq!(endpoint.deliver_raw(&raw), Delivery::Forwarded);

    assert_eq!(receiver.drain().delivered, 2);
    let calls = recorder.borrow().calls.clone();
    assert_eq!(calls.len(), 2);
    assert!(matches!(&calls[0], Call::Error(message) if message.contains("Unrecognized face")));
    assert!(!endpoint.session().has_fired());
}

#[test]
fn single_fire_tests_retry_after_error_can_still_succeed() {
    let (endpoint, mut receiver, recorder, _waker) = auth_bridge();
    endpoint.mark_document_loaded();
    endpoint.deliver_raw(&post(BridgeMessage::Ready));
    endpoint.deliver_raw(&post(BridgeMessage::ScanStarted));
    endpoint.deliver_raw(&post(BridgeMessage::ScanFailed {
        code: RawErrorCode::Numeric(2),
    }));
    assert_eq!(endpoint.session().state(), SessionState::Ready);

    endpoint.deliver_raw(&post(BridgeMessage::ScanStarted));
    endpoint.deliver_raw(&post(BridgeMessage::Authenticated {
        result: auth_result("21BCE1234"),
    }));

    receiver.drain();
    let calls = recorder.borrow().calls.clone();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1], Call::Success("21BCE1234".to_string()));
    assert_eq!(endpoint.session().state(), SessionState::Succeeded);
}

#[test]
fn single_fire_tests_double_enroll_resolution_fires_once() {
    let (endpoint, mut receiver, recorder) = registration_bridge();
    let raw = post(BridgeMessage::FaceRegistered {
        result: enroll_result("F-998"),
    });

    assert_eq!(endpoint.deliver_raw(&raw), Delivery::Forwarded);
    assert_eq!(
        endpoint.deliver_raw(&raw),
        Delivery::Dropped(DropReason::AlreadyCompleted)
    );

    receiver.drain();
    assert_eq!(recorder.borrow().calls, vec![Call::Success("F-998".to_string())]);
}

#[test]
fn single_fire_tests_close_after_success_is_noop() {
    let (endpoint, mut receiver, recorder) = registration_bridge();
    endpoint.deliver_raw(&post(BridgeMessage::FaceRegistered {
        result: enroll_result("F-998"),
    }));

    assert_eq!(
        endpoint.deliver_raw(&post(BridgeMessage::Close)),
        Delivery::Dropped(DropReason::AlreadyCompleted)
    );

    receiver.drain();
    assert_eq!(recorder.borrow().calls, vec![Call::Success("F-998".to_string())]);
}

#[test]
fn single_fire_tests_close_without_activity_reaches_host_once() {
    let (endpoint, mut receiver, recorder) = registration_bridge();

    assert_eq!(
        endpoint.deliver_raw(&post(BridgeMessage::Close)),
        Delivery::Forwarded
    );

    assert_eq!(receiver.drain().delivered, 1);
    assert_eq!(recorder.borrow().calls, vec![Call::Close]);
    assert_eq!(endpoint.session().state(), SessionState::Cancelled);
}

#[test]
fn single_fire_tests_success_after_close_is_dropped() {
    let (endpoint, mut receiver, recorder) = registration_bridge();
    endpoint.mark_document_loaded();
    endpoint.deliver_raw(&post(BridgeMessage::Ready));

    assert_eq!(
        endpoint.deliver_raw(&post(BridgeMessage::Close)),
        Delivery::Forwarded
    );
    assert_eq!(
        endpoint.deliver_raw(&post(BridgeMessage::FaceRegistered {
            result: enroll_result("F-998"),
        })),
        Delivery::Dropped(DropReason::AlreadyCompleted)
    );
    assert_eq!(
        endpoint.deliver_raw(&post(BridgeMessage::ScanFailed {
            code: RawErrorCode::Numeric(2),
        })),
        Delivery::Dropped(DropReason::AlreadyCompleted)
    );
    assert_eq!(
        endpoint.deliver_raw(&post(BridgeMessage::Close)),
        Delivery::Dropped(DropReason::AlreadyCompleted)
    );

    receiver.drain();
    assert_eq!(recorder.borrow().calls, vec![Call::Close]);
    assert_eq!(endpoint.session().state(), SessionState::Cancelled);
    assert_eq!(endpoint.session().terminal(), Terminal::Cancelled);
    assert!(!endpoint.session().has_fired());
}
