//! Integration tests for log redaction.

use smart_attend_app::redact_sensitive;

#[test]
fn log_redaction_tests_masks_bearer_credentials() {
    let redacted = redact_sensitive("sync failed authorization=Bearer abc123");

    assert!(redacted.contains("<redacted>"));
    assert!(!redacted.contains("abc123"));
    assert!(redacted.starts_with("sync failed "));
}

#[test]
fn log_redaction_tests_masks_value_after_separated_key() {
    let redacted = redact_sensitive("password: hunter2 for roll 21BCE1234");

    assert_eq!(redacted, "password: <redacted> for roll 21BCE1234");
}

#[test]
fn log_redaction_tests_leaves_profile_summary_intact() {
    let summary = "Profile: name='Asha', rollNumber='21BCE1234', className='2S12'";
    assert_eq!(redact_sensitive(summary), summary);
}
