#![warn(missing_docs)]
//! # smart-attend-app binary
//!
//! Headless entry point: prints the version and effective configuration,
//! then drives one attendance flow against the recording browser view and
//! the synthetic beacon scanner.

use std::sync::Arc;
use std::sync::mpsc;

use log::{error, info};
use serde_json::json;
use smart_attend_app::{
    AppConfig, AppError, AttendanceController, AttendanceRecorder, AttendanceRequest,
    ChannelWaker, InMemoryAttendanceRecorder, app_version, redact_sensitive,
};
use smart_attend_ble::{BleViewModel, SyntheticBleRepository};
use smart_attend_bridge::{BridgeEnvelope, BridgeMessage, UiWaker};
use smart_attend_core::{SessionType, now_epoch_ms};
use smart_attend_profile::{InMemoryProfileRepository, ProfileViewModel};
use smart_attend_ui::{AttendanceCommand, AttendanceView};
use smart_attend_webview::RecordingBrowserView;

const DEMO_ROOM: &str = "AB";
const DEMO_BEACON: &str = "AB1203";
const DEMO_SUBJECT: &str = "CS301";

/// CLI entry point.
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(error) = run() {
        error!("smart-attend failed: {error}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), AppError> {
    let config = AppConfig::from_env();
    println!("smart-attend-app {}", app_version());
    println!(
        "faceio_app_id={} sdk_script_url={} base_url={}",
        config.faceio_app_id, config.sdk_script_url, config.base_url
    );
    let host = config.widget_host()?;

    let (wake_sender, wake_receiver) = mpsc::channel();
    let waker: Arc<dyn UiWaker> = Arc::new(ChannelWaker::new(wake_sender));

    let mut profile = ProfileViewModel::new(InMemoryProfileRepository::new());
    profile.save_profile_with_class("Demo Student", "21BCE0001", "2s12")?;
    info!("{}", redact_sensitive(&profile.profile_summary()));

    let mut ble = BleViewModel::new(SyntheticBleRepository::new());
    ble.start_scanning_for_room(DEMO_ROOM);
    ble.repository_mut().advertise(DEMO_BEACON, DEMO_SUBJECT);

    let mut controller = AttendanceController::new(host, waker);
    controller.on_permission_result(true, RecordingBrowserView::new())?;

    if let Some(widget) = controller.widget() {
        let roll_number = profile.profile_data().roll_number;
        let raw = BridgeEnvelope::new(
            widget.session_id(),
            BridgeMessage::Authenticated {
                result: json!({ "facialId": "demo", "payload": { "rollNumber": roll_number } }),
            },
        )
        .to_json()?;
        let delivery = widget.view().and_then(|view| view.post(&raw));
        info!("simulated authentication: {delivery:?}");
    }

    let mut recorder = InMemoryAttendanceRecorder::new();
    while wake_receiver.try_recv().is_ok() {
        let now_ms = now_epoch_ms();
        for command in controller.pump(now_ms) {
            if let AttendanceCommand::MarkAttendance { roll_number } = command {
                let outcome = AttendanceRequest::from_presence(
                    &roll_number,
                    &profile.profile_data(),
                    &ble,
                    SessionType::Lecture,
                )
                .and_then(|request| recorder.mark_attendance(&request));
                controller.complete(outcome, now_ms, RecordingBrowserView::new())?;
            }
        }
    }

    match controller.screen().view() {
        AttendanceView::Success(record) => {
            for (label, value) in record.display_rows() {
                println!("{label}: {value}");
            }
        }
        other => println!("attendance not recorded: {other:?}"),
    }
    Ok(())
}
