//! Version query and collector invocations against a scripted runner.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::Path;
use std::time::Duration;

use nest_cli::application::ports::ArtifactCollector;
use nest_cli::application::services::artifact_runtime::ArtifactRuntime;
use nest_cli::domain::config::RuntimeConfig;
use nest_cli::domain::error::ArtifactError;

use crate::mocks::{ScriptedRunner, err_output, ok_output};

const ARTIFACT: &str = "/var/lib/nest/current.bin";

#[test]
fn version_returns_trimmed_stdout() {
    let runner = ScriptedRunner::new(vec![ok_output(b"3.4.7-1+8c1e2f0\n")]);
    let config = RuntimeConfig::default();
    let runtime = ArtifactRuntime::new(&runner, &config, Path::new(ARTIFACT), None);

    assert_eq!(runtime.version(true, true).unwrap(), "3.4.7-1+8c1e2f0");
}

#[test]
fn version_invokes_interpreter_with_artifact_on_search_path() {
    let runner = ScriptedRunner::new(vec![ok_output(b"3.4.7\n")]);
    let config = RuntimeConfig::default();
    let runtime = ArtifactRuntime::new(&runner, &config, Path::new(ARTIFACT), Some("/opt/site"));

    runtime.version(false, false).unwrap();

    let calls = runner.invocations.borrow();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].program, "python3");
    assert_eq!(
        calls[0].args,
        ["-c", "import insights; print(insights.package_info['VERSION'])"]
    );
    assert_eq!(
        calls[0].env,
        [(
            "PYTHONPATH".to_string(),
            format!("{ARTIFACT}:/opt/site")
        )]
    );
    assert_eq!(calls[0].timeout, Some(Duration::from_secs(300)));
}

#[test]
fn version_expression_adds_release_and_commit() {
    let runner = ScriptedRunner::new(vec![ok_output(b"x")]);
    let config = RuntimeConfig::default();
    let runtime = ArtifactRuntime::new(&runner, &config, Path::new(ARTIFACT), None);

    runtime.version(true, true).unwrap();

    let expr = &runner.invocations.borrow()[0].args[1];
    assert!(expr.contains("['RELEASE']"), "got: {expr}");
    assert!(expr.contains("['COMMIT']"), "got: {expr}");
}

#[test]
fn nonzero_exit_is_a_hard_failure() {
    let runner = ScriptedRunner::new(vec![err_output(1, b"ModuleNotFoundError: insights")]);
    let config = RuntimeConfig::default();
    let runtime = ArtifactRuntime::new(&runner, &config, Path::new(ARTIFACT), None);

    let err = runtime.version(true, true).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ArtifactError>(),
        Some(ArtifactError::RuntimeFailed { code: 1 })
    ));
}

#[test]
fn collector_output_is_parsed_as_json() {
    let runner = ScriptedRunner::new(vec![ok_output(br#"{"fqdn": "web01"}"#)]);
    let config = RuntimeConfig::default();
    let runtime = ArtifactRuntime::new(&runner, &config, Path::new(ARTIFACT), None);

    let facts = runtime.collect("canonical-facts").unwrap();

    assert_eq!(facts["fqdn"], "web01");
    assert_eq!(
        runner.invocations.borrow()[0].args,
        ["-m", "insights.anchor.v1", "canonical-facts"]
    );
}

#[test]
fn collector_garbage_is_reported() {
    let runner = ScriptedRunner::new(vec![ok_output(b"Traceback (most recent call last)")]);
    let config = RuntimeConfig::default();
    let runtime = ArtifactRuntime::new(&runner, &config, Path::new(ARTIFACT), None);

    let err = runtime.collect("advisor").unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ArtifactError>(),
        Some(ArtifactError::CollectorOutput { .. })
    ));
}

#[test]
fn client_app_gets_input_on_stdin() {
    let runner = ScriptedRunner::new(vec![ok_output(b"- hosts: all\n")]);
    let config = RuntimeConfig::default();
    let runtime = ArtifactRuntime::new(&runner, &config, Path::new(ARTIFACT), None);

    let stdout = runtime
        .run_app("ansible.playbook_verifier", b"- hosts: all\n")
        .unwrap();

    assert_eq!(stdout, "- hosts: all\n");
    let calls = runner.invocations.borrow();
    assert_eq!(
        calls[0].args,
        [
            "-m",
            "insights.client.apps.ansible.playbook_verifier",
            "--quiet",
            "--payload",
            "noop",
            "--content-type",
            "noop",
        ]
    );
    assert_eq!(calls[0].input.as_deref(), Some(&b"- hosts: all\n"[..]));
    assert_eq!(calls[0].env[0].1, ARTIFACT);
}

#[test]
fn client_app_rejection_is_a_runtime_failure() {
    let runner = ScriptedRunner::new(vec![err_output(1, b"signature mismatch")]);
    let config = RuntimeConfig::default();
    let runtime = ArtifactRuntime::new(&runner, &config, Path::new(ARTIFACT), None);

    let err = runtime.run_app("ansible.playbook_verifier", b"x").unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ArtifactError>(),
        Some(ArtifactError::RuntimeFailed { code: 1 })
    ));
}

#[test]
fn rejected_playbook_is_reported_as_such() {
    let runner = ScriptedRunner::new(vec![err_output(1, b"")]);
    let config = RuntimeConfig::default();
    let runtime = ArtifactRuntime::new(&runner, &config, Path::new(ARTIFACT), None);

    let err = runtime.verify_playbook(b"- hosts: all\n").unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ArtifactError>(),
        Some(ArtifactError::PlaybookRejected { code: 1 })
    ));
    assert_eq!(err.to_string(), "Playbook verification failed.");
}
