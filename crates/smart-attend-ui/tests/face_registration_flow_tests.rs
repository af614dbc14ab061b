//! Integration tests for the face registration screen and its login hand-off.

use smart_attend_core::FailureKind;
use smart_attend_profile::{InMemoryProfileRepository, ProfileViewModel};
use smart_attend_ui::{
    FaceRegistrationScreen, LoginCommand, LoginScreen, REGISTRATION_ERROR_DISMISS_MS,
    REGISTRATION_NAVIGATE_DELAY_MS, RegistrationCommand, RegistrationView,
};

fn granted_screen() -> FaceRegistrationScreen {
    let mut screen = FaceRegistrationScreen::new("21BCE1234");
    screen.on_permission_result(true);
    screen
}

#[test]
fn face_registration_flow_tests_denied_permission_offers_retry_and_cancel() {
    let mut screen = FaceRegistrationScreen::new("21BCE1234");
    assert_eq!(screen.view(), RegistrationView::RequestingPermission);

    screen.on_permission_result(false);
    assert_eq!(screen.view(), RegistrationView::PermissionDenied);
    assert_eq!(screen.failure_kind(), Some(FailureKind::PermissionDenied));
    assert_eq!(screen.cancel_permission(), RegistrationCommand::NavigateBack);

    assert_eq!(
        screen.retry_permission(),
        RegistrationCommand::RequestCameraPermission
    );
    assert_eq!(screen.view(), RegistrationView::RequestingPermission);
    assert_eq!(screen.failure_kind(), None);
    screen.on_permission_result(true);
    assert_eq!(screen.view(), RegistrationView::Widget);
}

#[test]
fn face_registration_flow_tests_closing_widget_records_cancellation() {
    let mut screen = granted_screen();
    assert_eq!(screen.failure_kind(), None);

    assert_eq!(screen.on_widget_closed(), RegistrationCommand::NavigateBack);
    assert_eq!(screen.failure_kind(), Some(FailureKind::UserCancelled));
    assert!(!screen.failure_kind().is_some_and(FailureKind::is_retryable));
}

#[test]
fn face_registration_flow_tests_close_after_success_is_not_a_cancellation() {
    let mut screen = granted_screen();
    screen.on_face_registered("face-1");
    screen.on_success_handled(0);

    assert_eq!(
        screen.on_close_pressed(),
        Some(RegistrationCommand::NavigateBack)
    );
    assert_eq!(screen.failure_kind(), None);
}

#[test]
fn face_registration_flow_tests_duplicate_success_is_ignored_while_processing() {
    let mut screen = granted_screen();

    assert_eq!(
        screen.on_face_registered("face-1"),
        Some(RegistrationCommand::Succeeded {
            face_id: "face-1".to_string()
        })
    );
    assert_eq!(screen.view(), RegistrationView::Processing);
    assert!(!screen.close_enabled());
    assert_eq!(screen.on_close_pressed(), None);
    assert_eq!(screen.on_face_registered("face-2"), None);
    assert_eq!(screen.face_id(), Some("face-1"));
}

#[test]
fn face_registration_flow_tests_navigates_back_after_completion_delay() {
    let mut screen = granted_screen();
    screen.on_face_registered("face-1");
    screen.on_success_handled(5_000);

    assert_eq!(
        screen.view(),
        RegistrationView::Complete {
            message: "Face registered successfully!".to_string(),
            roll_number: "21BCE1234".to_string(),
        }
    );
    assert!(screen.close_enabled());
    assert_eq!(screen.on_tick(5_000 + REGISTRATION_NAVIGATE_DELAY_MS - 1), None);
    assert_eq!(
        screen.on_tick(5_000 + REGISTRATION_NAVIGATE_DELAY_MS),
        Some(RegistrationCommand::NavigateBack)
    );
    assert_eq!(screen.on_tick(60_000), None);
}

#[test]
fn face_registration_flow_tests_error_overlay_dismisses_after_five_seconds() {
    let mut screen = granted_screen();
    let command = screen.on_registration_error("No faces were detected", 100);

    assert_eq!(
        command,
        RegistrationCommand::Failed {
            message: "No faces were detected".to_string()
        }
    );
    assert_eq!(screen.error_message(), Some("No faces were detected"));
    screen.on_tick(100 + REGISTRATION_ERROR_DISMISS_MS);
    assert_eq!(screen.error_message(), None);
    assert_eq!(screen.view(), RegistrationView::Widget);
}

#[test]
fn face_registration_flow_tests_login_records_success_and_enables_sign_in() {
    let mut login = LoginScreen::new(ProfileViewModel::new(InMemoryProfileRepository::new()));
    login.update_name("Asha Rao");
    login.update_roll_number("21BCE1234");
    login.update_class("2S12");
    assert!(matches!(
        login.start_face_registration(0),
        Some(LoginCommand::OpenFaceRegistration { .. })
    ));

    let flow = login.face_registration_mut().expect("sub-flow should be open");
    flow.on_permission_result(true);
    let command = flow.on_face_registered("face-42").expect("first success");
    login.handle_registration_command(command, 10);

    assert!(login.face_registration().is_none());
    assert!(login.face_registration_completed());
    assert_eq!(login.registered_face_id(), Some("face-42"));
    assert!(!login.register_button_enabled());

    login.sign_in(20);
    assert!(login.show_success());
}

#[test]
fn face_registration_flow_tests_login_wraps_registration_error() {
    let mut login = LoginScreen::new(ProfileViewModel::new(InMemoryProfileRepository::new()));
    login.update_name("Asha Rao");
    login.update_roll_number("21BCE1234");
    login.start_face_registration(0);

    let flow = login.face_registration_mut().expect("sub-flow should be open");
    let command = flow.on_registration_error("Camera unavailable", 5);
    login.handle_registration_command(command, 5);

    assert!(login.face_registration().is_none());
    assert_eq!(
        login.error_message(),
        Some("Face registration failed: Camera unavailable")
    );
    assert!(!login.face_registration_completed());
}

#[test]
fn face_registration_flow_tests_toggle_clears_completion_and_error() {
    let mut login = LoginScreen::new(ProfileViewModel::new(InMemoryProfileRepository::new()));
    login.update_name("Asha Rao");
    login.update_roll_number("21BCE1234");
    login.start_face_registration(0);
    login.handle_registration_command(
        RegistrationCommand::Succeeded {
            face_id: "face-1".to_string(),
        },
        1,
    );
    login.sign_in(2);
    assert!(login.error_message().is_some());

    login.set_already_registered(true);
    assert!(!login.face_registration_completed());
    assert_eq!(login.error_message(), None);
}
