//! ---
//! tp_section: "15-testing-qa-runbook"
//! tp_subsection: "integration-tests"
//! tp_type: "source"
//! tp_scope: "code"
//! tp_description: "Integration and validation tests for the twinproto stack."
//! tp_version: "v0.0.0-prealpha"
//! tp_owner: "tbd"
//! ---
use std::fs;

use serde_json::json;
use tempfile::tempdir;
use twinproto_adapter::SignalAdapterRegistry;
use twinproto_common::AdapterConfig;
use twinproto_model::signal::ErrorResponse;
use twinproto_model::{Adaptable, HttpStatus, Signal};

const CONFIG: &str = r#"
[headers]
pass_unknown = false

[headers.declared.x-tenant]
read_from_external = true
write_to_external = false

[errors.codes]
"things:thing.notfound" = 404
"acme:quota.exceeded" = 429

[protocol]
schema_version = 2
"#;

fn registry() -> SignalAdapterRegistry {
    let dir = tempdir().unwrap();
    let path = dir.path().join("twinproto.toml");
    fs::write(&path, CONFIG).unwrap();
    let config = AdapterConfig::from_path(&path).unwrap();
    SignalAdapterRegistry::from_config(&config)
}

#[test]
fn configured_headers_are_filtered() {
    let registry = registry();
    let adaptable = Adaptable::from_json(&json!({
        "topic": "org.acme/lamp/things/twin/commands/retrieve",
        "path": "/attributes",
        "headers": {
            "correlation-id": "c-3",
            "x-tenant": "acme",
            "x-debug": "1"
        }
    }))
    .unwrap();

    let signal = registry.from_adaptable(&adaptable).unwrap();
    assert_eq!(signal.headers().get("x-tenant"), Some("acme"));
    assert_eq!(signal.headers().get("x-debug"), None);
    assert_eq!(signal.correlation_id(), Some("c-3"));

    let outbound = registry.to_adaptable_on_own_channel(&signal).unwrap();
    assert_eq!(outbound.headers().get("x-tenant"), None);
    assert_eq!(outbound.headers().correlation_id(), Some("c-3"));
}

#[test]
fn configured_error_codes_supply_the_status() {
    let registry = registry();
    let adaptable = Adaptable::from_json(&json!({
        "topic": "org.acme/lamp/things/twin/errors",
        "path": "/",
        "value": {"error": "acme:quota.exceeded", "message": "Too many requests."}
    }))
    .unwrap();

    let Signal::ErrorResponse(ErrorResponse { error, .. }) =
        registry.from_adaptable(&adaptable).unwrap()
    else {
        panic!("expected an error response");
    };
    assert_eq!(error.status, HttpStatus::new(429).unwrap());
    assert_eq!(error.message, "Too many requests.");
}

#[test]
fn invalid_config_is_rejected() {
    let bad = "[protocol]\nschema_version = 9\n";
    assert!(bad.parse::<AdapterConfig>().is_err());
}
