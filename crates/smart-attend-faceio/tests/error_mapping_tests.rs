//! Tests SDK rejection code mapping through the shared table.

use serde_json::{Value, json};
use smart_attend_faceio::{
    ERROR_CODE_TABLE, ErrorCode, RawErrorCode, UnknownCodePolicy, describe_error,
    error_table_json,
};

#[test]
fn error_mapping_tests_numeric_and_symbolic_codes_agree() {
    let numeric = RawErrorCode::Numeric(1);
    let symbolic = RawErrorCode::Text("PERMISSION_REFUSED".to_string());
    let stringified = RawErrorCode::Text(" 1 ".to_string());

    for raw in [numeric, symbolic, stringified] {
        assert_eq!(raw.resolve(), Some(ErrorCode::PermissionRefused));
        assert_eq!(
            describe_error(&raw, UnknownCodePolicy::ReportCode),
            "Access to the Camera stream was denied by the end user"
        );
    }
}

#[test]
fn error_mapping_tests_unknown_code_follows_policy() {
    let raw = RawErrorCode::Numeric(999);

    assert_eq!(
        describe_error(&raw, UnknownCodePolicy::ReportCode),
        "Unknown error occurred (Code: 999)"
    );
    assert_eq!(
        describe_error(&raw, UnknownCodePolicy::TreatAsNetworkError),
        ErrorCode::NetworkIo.message()
    );
}

#[test]
fn error_mapping_tests_table_json_has_every_row() {
    let table: Value = serde_json::from_str(&error_table_json()).expect("table should be json");
    let object = table.as_object().expect("table should be an object");

    assert_eq!(object.len(), ERROR_CODE_TABLE.len());
    assert_eq!(
        object.get("2"),
        Some(&json!(
            "No faces were detected during the enroll or authentication process"
        ))
    );
}

#[test]
fn error_mapping_tests_raw_code_decodes_from_either_json_type() {
    let numeric: RawErrorCode = serde_json::from_value(json!(3)).expect("number decodes");
    let text: RawErrorCode = serde_json::from_value(json!("TIMEOUT")).expect("text decodes");

    assert_eq!(numeric, RawErrorCode::Numeric(3));
    assert_eq!(text.resolve(), Some(ErrorCode::Timeout));
}
