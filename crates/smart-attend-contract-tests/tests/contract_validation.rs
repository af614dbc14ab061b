//! Validates bridge message fixtures against the frozen JSON schema and
//! against the host-side decoder.

use jsonschema::JSONSchema;
use serde_json::Value;
use smart_attend_bridge::{BridgeEnvelope, BridgeMessage, SessionId};
use smart_attend_faceio::RawErrorCode;

const SCHEMA: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../contracts/bridge-message.schema.json"
);
const FIXTURES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../contracts/fixtures");

const VALID: [&str; 6] = [
    "authenticated",
    "face-registered",
    "scan-failed",
    "scan-failed-text",
    "init-failed",
    "close",
];
const INVALID: [&str; 3] = ["unknown-kind", "missing-result", "bad-session"];

fn read_fixture(name: &str, validity: &str) -> String {
    let path = format!("{FIXTURES}/bridge-message.{name}.{validity}.json");
    std::fs::read_to_string(&path).unwrap_or_else(|error| panic!("{path}: {error}"))
}

fn compile_validator() -> JSONSchema {
    let raw = std::fs::read_to_string(SCHEMA).expect("schema should be readable");
    let schema: Value = serde_json::from_str(&raw).expect("schema should be valid json");
    JSONSchema::compile(&schema).expect("schema should compile")
}

#[test]
fn valid_fixtures_match_schema() {
    let validator = compile_validator();
    for name in VALID {
        let fixture: Value =
            serde_json::from_str(&read_fixture(name, "valid")).expect("fixture should be json");
        assert!(validator.is_valid(&fixture), "{name} should validate");
    }
}

#[test]
fn invalid_fixtures_are_rejected_by_schema() {
    let validator = compile_validator();
    for name in INVALID {
        let fixture: Value =
            serde_json::from_str(&read_fixture(name, "invalid")).expect("fixture should be json");
        assert!(!validator.is_valid(&fixture), "{name} should not validate");
    }
}

#[test]
fn valid_fixtures_decode_on_the_host() {
    for name in VALID {
        let envelope = BridgeEnvelope::parse(&read_fixture(name, "valid"))
            .unwrap_or_else(|error| panic!("{name} should decode: {error}"));
        assert_eq!(envelope.session_id, "0f3c5a9e1b2d4c6f8a7e9d0c1b2a3f4e");
    }

    let envelope = BridgeEnvelope::parse(&read_fixture("scan-failed-text", "valid"))
        .expect("text code should decode");
    assert!(matches!(
        envelope.message,
        BridgeMessage::ScanFailed {
            code: RawErrorCode::Text(_)
        }
    ));
}

#[test]
fn unknown_kind_is_rejected_by_host_decoder() {
    assert!(BridgeEnvelope::parse(&read_fixture("unknown-kind", "invalid")).is_err());
}

#[test]
fn host_encoded_envelopes_match_schema() {
    let validator = compile_validator();
    let session = SessionId::from("0f3c5a9e1b2d4c6f8a7e9d0c1b2a3f4e");
    for message in [
        BridgeMessage::Ready,
        BridgeMessage::ScanStarted,
        BridgeMessage::Log {
            message: "init".to_string(),
        },
        BridgeMessage::ScanFailed {
            code: RawErrorCode::Numeric(20),
        },
    ] {
        let encoded = BridgeEnvelope::new(&session, message)
            .to_json()
            .expect("envelope should encode");
        let value: Value = serde_json::from_str(&encoded).expect("encoded json");
        assert!(validator.is_valid(&value), "{encoded} should validate");
    }
}
