//! Config file driven invoker behavior

use callgate_config::CallgateConfig;
use callgate_core::InvokeError;
use callgate_registry::CallableError;

use crate::common::Fixture;

fn load(toml: &str) -> CallgateConfig {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, toml).unwrap();
    CallgateConfig::load_from(&path).unwrap().unwrap()
}

#[tokio::test]
async fn denied_function_is_refused_and_not_listed() {
    let fixture = Fixture::with_config(&load("[policy]\ndeny = [\"rec*\"]\n"));
    let err = fixture
        .invoker
        .invoke("record", None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, InvokeError::Denied { .. }));
    assert_eq!(fixture.record_calls(), 0);
    assert!(
        fixture
            .invoker
            .definitions()
            .iter()
            .all(|def| def.name != "record")
    );
}

#[tokio::test]
async fn allow_list_limits_invocable_names() {
    let fixture = Fixture::with_config(&load("[policy]\nallow = [\"greet\"]\n"));
    assert!(
        fixture
            .invoker
            .invoke("greet", None, Some(r#"{"name":"a"}"#))
            .await
            .is_ok()
    );
    let err = fixture
        .invoker
        .invoke("add", None, Some(r#"{"a":1,"b":1}"#))
        .await
        .unwrap_err();
    assert!(matches!(err, InvokeError::Denied { .. }));
}

#[tokio::test]
async fn disabled_validation_lets_the_callable_decide() {
    let fixture = Fixture::with_config(&load("[invoker]\nvalidate_arguments = false\n"));
    let err = fixture
        .invoker
        .invoke("greet", None, Some("{}"))
        .await
        .unwrap_err();
    // Rejected by the callable's own argument parsing instead of the schema.
    assert!(matches!(err, InvokeError::Callable(CallableError::BadArgs { .. })));
    assert!(err.callable_ran());
    assert!(err.to_string().contains("missing field"));
}

#[tokio::test]
async fn payload_limit_comes_from_config() {
    let fixture = Fixture::with_config(&load("[invoker]\nmax_payload_bytes = 4\n"));
    let err = fixture
        .invoker
        .invoke("record", None, Some(r#"{"too":"big"}"#))
        .await
        .unwrap_err();
    assert!(matches!(err, InvokeError::PayloadTooLarge { max: 4, .. }));
    assert_eq!(fixture.record_calls(), 0);
}
