//! Integration tests for the attendance authentication screen.

use smart_attend_core::{AttendanceSuccessData, FailureKind, SessionType};
use smart_attend_ui::{
    ATTENDANCE_ERROR_DISMISS_MS, AttendanceCommand, AttendanceScreen, AttendanceView,
    LifecycleEvent, LifecycleObserver,
};

fn record() -> AttendanceSuccessData {
    AttendanceSuccessData::new("21BCE1234", "Asha Rao", "CS301", "AB", SessionType::Lecture)
        .with_device_room("AB1203")
        .with_timestamp_ms(1_700_000_000_000)
}

#[test]
fn attendance_flow_tests_authenticated_roll_number_becomes_mark_command() {
    let mut screen = AttendanceScreen::new();
    screen.on_permission_result(true);
    assert_eq!(screen.view(), AttendanceView::Scanning);

    assert_eq!(
        screen.on_authenticated("21BCE1234"),
        Some(AttendanceCommand::MarkAttendance {
            roll_number: "21BCE1234".to_string()
        })
    );
    assert_eq!(
        screen.view(),
        AttendanceView::Processing {
            roll_number: "21BCE1234".to_string()
        }
    );
    assert_eq!(screen.on_authenticated("21BCE1234"), None);

    screen.on_attendance_recorded(record());
    assert_eq!(screen.view(), AttendanceView::Success(record()));
    assert_eq!(screen.on_done(), AttendanceCommand::NavigateBack);
}

#[test]
fn attendance_flow_tests_failed_recording_requests_fresh_widget() {
    let mut screen = AttendanceScreen::new();
    screen.on_permission_result(true);
    screen.on_authenticated("21BCE1234");

    let command = screen.on_attendance_failed("Attendance already marked", 1_000);

    assert_eq!(command, AttendanceCommand::RemountWidget);
    assert_eq!(screen.view(), AttendanceView::Scanning);
    assert_eq!(screen.error_message(), Some("Attendance already marked"));
    screen.on_tick(1_000 + ATTENDANCE_ERROR_DISMISS_MS);
    assert_eq!(screen.error_message(), None);
}

#[test]
fn attendance_flow_tests_resume_rechecks_missing_permission() {
    let mut screen = AttendanceScreen::new();
    screen.on_permission_result(false);
    assert_eq!(screen.view(), AttendanceView::PermissionDenied);
    assert_eq!(screen.failure_kind(), Some(FailureKind::PermissionDenied));

    let mut observer = LifecycleObserver::new(|| {});
    observer.dispatch(LifecycleEvent::Paused);

    assert_eq!(
        screen.on_resumed(),
        Some(AttendanceCommand::RequestCameraPermission)
    );
    screen.on_permission_result(true);
    assert_eq!(screen.on_resumed(), None);
    assert_eq!(screen.failure_kind(), None);
}
