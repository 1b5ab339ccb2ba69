//! End-to-end invocation scenarios

use callgate_core::InvokeError;
use callgate_registry::CallableError;
use callgate_types::{Payload, PayloadKind};
use serde_json::json;

use crate::common::{Fixture, decode};

#[tokio::test]
async fn greet_returns_encoded_string() {
    let fixture = Fixture::new();
    let out = fixture
        .invoker
        .invoke("greet", Some("{}"), Some(r#"{"name":"world"}"#))
        .await
        .unwrap();
    assert_eq!(out, r#""hello world""#);
}

#[tokio::test]
async fn async_add_returns_encoded_number() {
    let fixture = Fixture::new();
    let out = fixture
        .invoker
        .invoke("add", Some("{}"), Some(r#"{"a":2,"b":3}"#))
        .await
        .unwrap();
    assert_eq!(out, "5");
}

#[tokio::test]
async fn unknown_function_fails() {
    let fixture = Fixture::new();
    let err = fixture
        .invoker
        .invoke("doesNotExist", Some("{}"), Some("{}"))
        .await
        .unwrap_err();
    assert!(matches!(err, InvokeError::Resolution { .. }));
}

#[tokio::test]
async fn malformed_arguments_fail_without_calling() {
    let fixture = Fixture::new();
    let err = fixture
        .invoker
        .invoke("record", Some("{}"), Some("not-json"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        InvokeError::Decode {
            kind: PayloadKind::Arguments,
            ..
        }
    ));
    assert_eq!(fixture.record_calls(), 0);
}

#[tokio::test]
async fn result_round_trips_through_the_callable() {
    let fixture = Fixture::new();
    let cases = [
        json!({}),
        json!({"nested": {"list": [1, 2.5, "three", null, true]}}),
        json!([1, 2, 3]),
        json!("plain string"),
        json!(null),
        json!(-17),
    ];
    for args in cases {
        let text = args.to_string();
        let out = fixture
            .invoker
            .invoke("record", Some("{}"), Some(text.as_str()))
            .await
            .unwrap();
        assert_eq!(decode(&out), args);
    }
    assert_eq!(fixture.record_calls(), 6);
}

#[tokio::test]
async fn environment_reaches_the_callable() {
    let fixture = Fixture::new();
    let out = fixture
        .invoker
        .invoke(
            "env_get",
            Some(r#"{"tenant":"acme"}"#),
            Some(r#"{"key":"tenant"}"#),
        )
        .await
        .unwrap();
    assert_eq!(decode(&out), json!("acme"));
}

#[tokio::test]
async fn omitted_payloads_match_explicit_empty_objects() {
    let fixture = Fixture::new();
    let omitted = fixture.invoker.invoke("echo", None, None).await.unwrap();
    let explicit = fixture
        .invoker
        .invoke_payloads(
            "echo",
            Payload::new(PayloadKind::Environment, "{}"),
            Payload::new(PayloadKind::Arguments, "{}"),
        )
        .await
        .unwrap();
    assert_eq!(omitted, explicit);
}

#[tokio::test]
async fn missing_required_argument_is_rejected_by_schema() {
    let fixture = Fixture::new();
    let err = fixture
        .invoker
        .invoke("greet", None, Some(r#"{"nom":"world"}"#))
        .await
        .unwrap_err();
    assert!(matches!(err, InvokeError::ArgumentsRejected(CallableError::BadArgs { .. })));
    assert!(!err.callable_ran());
}
