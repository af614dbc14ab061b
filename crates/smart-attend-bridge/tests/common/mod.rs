//! Shared fixtures for bridge integration tests.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::{self, ThreadId};

use serde_json::{Value, json};
use smart_attend_bridge::{
    AuthenticationCallbacks, BridgeEndpoint, BridgeEnvelope, BridgeMessage, BridgeOptions,
    HostCallbacks, HostReceiver, RegistrationCallbacks, SessionId, UiWaker, open_bridge,
};

/// Session id used by every fixture bridge.
#[allow(dead_code)]
pub const SESSION: &str = "0123456789abcdef0123456789abcdef";

/// One observed callback invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(dead_code)]
pub enum Call {
    Success(String),
    Error(String),
    Close,
}

/// Callback log plus the thread each callback ran on.
#[derive(Debug, Default)]
#[allow(dead_code)]
pub struct Recorder {
    pub calls: Vec<Call>,
    pub threads: Vec<ThreadId>,
}

/// Shared handle to a [`Recorder`] captured by callback closures.
#[allow(dead_code)]
pub type SharedRecorder = Rc<RefCell<Recorder>>;

/// Counts wake-ups requested by the endpoint.
#[derive(Debug, Default)]
#[allow(dead_code)]
pub struct CountingWaker {
    pub wakes: AtomicUsize,
}

impl UiWaker for CountingWaker {
    fn wake(&self) {
        self.wakes.fetch_add(1, Ordering::SeqCst);
    }
}

#[allow(dead_code)]
impl CountingWaker {
    pub fn count(&self) -> usize {
        self.wakes.load(Ordering::SeqCst)
    }
}

fn record(recorder: &SharedRecorder, call: Call) {
    let mut recorder = recorder.borrow_mut();
    recorder.calls.push(call);
    recorder.threads.push(thread::current().id());
}

/// Opens an authentication bridge whose callbacks append to a recorder.
#[allow(dead_code)]
pub fn auth_bridge() -> (BridgeEndpoint, HostReceiver, SharedRecorder, Arc<CountingWaker>) {
    let recorder = SharedRecorder::default();
    let on_success = Rc::clone(&recorder);
    let on_error = Rc::clone(&recorder);
    let callbacks = HostCallbacks::Authentication(AuthenticationCallbacks::new(
        move |roll_number| {
            record(&on_success, Call::Success(roll_number));
            Ok(())
        },
        move |message| {
            record(&on_error, Call::Error(message));
            Ok(())
        },
    ));
    let waker = Arc::new(CountingWaker::default());
    let (endpoint, receiver) = open_bridge(
        SessionId::from(SESSION),
        callbacks,
        BridgeOptions::default(),
        waker.clone(),
    );
    (endpoint, receiver, recorder, waker)
}

/// Opens a registration bridge whose callbacks append to a recorder.
#[allow(dead_code)]
pub fn registration_bridge() -> (BridgeEndpoint, HostReceiver, SharedRecorder) {
    let recorder = SharedRecorder::default();
    let on_success = Rc::clone(&recorder);
    let on_error = Rc::clone(&recorder);
    let on_close = Rc::clone(&recorder);
    let callbacks = HostCallbacks::Registration(RegistrationCallbacks::new(
        move |face_id| {
            record(&on_success, Call::Success(face_id));
            Ok(())
        },
        move |message| {
            record(&on_error, Call::Error(message));
            Ok(())
        },
        move || {
            record(&on_close, Call::Close);
            Ok(())
        },
    ));
    let (endpoint, receiver) = open_bridge(
        SessionId::from(SESSION),
        callbacks,
        BridgeOptions::default(),
        Arc::new(smart_attend_bridge::NoopWaker),
    );
    (endpoint, receiver, recorder)
}

/// Serializes `message` for the fixture session as the script would post it.
#[allow(dead_code)]
pub fn post(message: BridgeMessage) -> String {
    BridgeEnvelope::new(&SessionId::from(SESSION), message)
        .to_json()
        .expect("fixture envelope should encode")
}

/// `authenticate()` resolution carrying `roll_number`.
#[allow(dead_code)]
pub fn auth_result(roll_number: &str) -> Value {
    json!({ "facialId": "F-1", "payload": { "rollNumber": roll_number } })
}

/// `enroll()` resolution carrying `facial_id`.
#[allow(dead_code)]
pub fn enroll_result(facial_id: &str) -> Value {
    json!({ "facialId": facial_id, "timestamp": "2024-01-01T00:00:00Z" })
}
