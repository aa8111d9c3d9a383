// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Behavioral tests for the step orchestrator and full runs

use super::*;
use crate::{ExecutionConfig, Repo, Ttp};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast;

struct Harness {
    ctx: ExecutionContext,
    shutdown: broadcast::Sender<()>,
    stdout: Arc<Mutex<Vec<u8>>>,
    _dir: tempfile::TempDir,
    // Kept alive so `shutdown.send(())` has a receiver even before the
    // run subscribes its own.
    _shutdown_rx: broadcast::Receiver<()>,
}

fn harness() -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let stdout = Arc::new(Mutex::new(Vec::new()));
    let cfg = ExecutionConfig {
        stdout: stdout.clone(),
        stderr: Arc::new(Mutex::new(Vec::new())),
        repo: Arc::new(Repo::new(vec![dir.path().to_path_buf()])),
        ..ExecutionConfig::default()
    };
    let (tx, rx) = broadcast::channel(8);
    let ctx = ExecutionContext::new(cfg, dir.path().to_path_buf(), tx.clone());
    Harness {
        ctx,
        shutdown: tx,
        stdout,
        _dir: dir,
        _shutdown_rx: rx,
    }
}

fn parse_steps(steps_yaml: &str) -> Vec<Step> {
    let doc = format!("name: under-test\nsteps:\n{steps_yaml}");
    Ttp::parse(&doc).unwrap().steps
}

fn read_log(dir: &Path) -> Vec<String> {
    let content = std::fs::read_to_string(dir.join("order.log")).unwrap_or_default();
    content.lines().map(str::to_string).collect()
}

#[tokio::test]
async fn cleanups_unwind_in_reverse_for_exactly_the_recorded_steps() {
    let mut h = harness();
    let mut steps = parse_steps(concat!(
        "  - name: s1\n    inline: echo one\n",
        "    cleanup:\n      inline: echo c1 >> order.log\n",
        "  - name: s2\n    inline: echo two\n",
        "    cleanup:\n      inline: echo c2 >> order.log\n",
        "  - name: s3\n    inline: echo three\n",
        "    cleanup:\n      inline: echo c3 >> order.log\n",
        "  - name: s4\n    inline: \"false\"\n",
        "    cleanup:\n      inline: echo c4 >> order.log\n",
    ));
    let report = run_ttp(&mut h.ctx, &mut steps).await;

    assert_eq!(
        report.error.as_ref().map(ToString::to_string),
        Some("exit status 1".to_string())
    );
    assert!(report.cleanup_failures.is_empty());
    // s4 failed, so its cleanup must not run; the rest unwind in reverse.
    assert_eq!(read_log(&h.ctx.vars.work_dir), vec!["c3", "c2", "c1"]);
}

#[tokio::test]
async fn failed_step_records_nothing_successes_record_once() {
    let mut h = harness();
    let mut steps = parse_steps(concat!(
        "  - name: good\n    inline: echo fine\n",
        "  - name: bad\n    inline: \"false\"\n",
        "  - name: never\n    inline: echo unreached\n",
    ));
    let report = run_ttp(&mut h.ctx, &mut steps).await;

    assert!(report.error.is_some());
    assert_eq!(h.ctx.record.len(), 1);
    assert!(h.ctx.record.contains("good"));
    assert!(!h.ctx.record.contains("bad"));
    assert!(!h.ctx.record.contains("never"));
}

#[tokio::test]
async fn stdout_of_a_step_round_trips_through_a_reference() {
    let mut h = harness();
    let mut steps = parse_steps(concat!(
        "  - name: step1\n    inline: echo hello\n",
        "  - name: step2\n    inline: echo $forge.steps.step1.stdout\n",
    ));
    let report = run_ttp(&mut h.ctx, &mut steps).await;

    assert!(report.success(), "{report:?}");
    assert_eq!(h.ctx.record.get("step1").unwrap().stdout, "hello\n");
    assert_eq!(h.ctx.record.get("step2").unwrap().stdout, "hello\n");
}

#[tokio::test]
async fn outputs_flow_between_steps() {
    let mut h = harness();
    let mut steps = parse_steps(concat!(
        "  - name: emit\n",
        "    inline: \"echo '{\\\"foo\\\":{\\\"bar\\\":\\\"baz\\\"}}'\"\n",
        "    outputs:\n",
        "      first:\n",
        "        filters:\n",
        "          - json_path: foo.bar\n",
        "  - name: consume\n",
        "    print_str: got $forge.steps.emit.outputs.first\n",
    ));
    let report = run_ttp(&mut h.ctx, &mut steps).await;

    assert!(report.success(), "{report:?}");
    let emit = h.ctx.record.get("emit").unwrap();
    assert_eq!(emit.stdout, "{\"foo\":{\"bar\":\"baz\"}}\n");
    assert_eq!(emit.outputs.get("first").map(String::as_str), Some("baz"));
    assert_eq!(h.ctx.record.get("consume").unwrap().stdout, "got baz\n");
    assert!(String::from_utf8_lossy(&h.stdout.lock()).contains("got baz"));
}

#[tokio::test]
async fn outputvar_feeds_the_template_pass_of_later_steps() {
    let mut h = harness();
    let mut steps = parse_steps(concat!(
        "  - name: capture\n    inline: echo captured-value\n    outputvar: v\n",
        "  - name: use\n    inline: \"echo {[{stepvars.v}]}\"\n",
    ));
    let report = run_ttp(&mut h.ctx, &mut steps).await;

    assert!(report.success(), "{report:?}");
    assert_eq!(h.ctx.record.get("use").unwrap().stdout, "captured-value\n");
}

#[tokio::test]
async fn template_failure_aborts_before_execution() {
    let mut h = harness();
    let mut steps = parse_steps(concat!(
        "  - name: trap\n",
        "    inline: \"touch ran.marker && echo {[{stepvars.unset}]}\"\n",
    ));
    let report = run_ttp(&mut h.ctx, &mut steps).await;

    assert!(matches!(report.error, Some(ExecError::Template(_))));
    assert!(h.ctx.record.is_empty());
    // template() failed, so execute() never ran
    assert!(!h.ctx.vars.work_dir.join("ran.marker").exists());
}

#[tokio::test]
async fn escaped_reference_stays_literal_through_a_run() {
    let mut h = harness();
    let mut steps = parse_steps(
        "  - name: literal\n    print_str: \"$$forge.steps.foo.stdout\"\n",
    );
    let report = run_ttp(&mut h.ctx, &mut steps).await;

    assert!(report.success(), "{report:?}");
    assert_eq!(
        h.ctx.record.get("literal").unwrap().stdout,
        "$forge.steps.foo.stdout\n"
    );
}

#[tokio::test]
async fn dry_run_records_empty_results_and_executes_nothing() {
    let mut h = harness();
    h.ctx.cfg.dry_run = true;
    let mut steps = parse_steps(concat!(
        "  - name: s1\n    inline: touch dry.marker\n",
        "    cleanup:\n      inline: echo c1 >> order.log\n",
        "  - name: s2\n    print_str: hi\n",
    ));
    let report = run_ttp(&mut h.ctx, &mut steps).await;

    assert!(report.success(), "{report:?}");
    assert_eq!(h.ctx.record.len(), 2);
    assert_eq!(h.ctx.record.get("s1").unwrap().stdout, "");
    assert!(!h.ctx.vars.work_dir.join("dry.marker").exists());
    assert!(read_log(&h.ctx.vars.work_dir).is_empty());
}

#[tokio::test]
async fn validation_failure_aborts_the_run() {
    let mut h = harness();
    let mut steps = parse_steps(
        "  - name: req\n    http_request: https://example.com\n    type: BREW\n",
    );
    let report = run_ttp(&mut h.ctx, &mut steps).await;
    assert!(matches!(report.error, Some(ExecError::Validation(_))));
}

#[tokio::test]
async fn shutdown_stops_the_run_before_the_next_step() {
    let mut h = harness();
    h.shutdown.send(()).unwrap();
    let mut steps = parse_steps("  - name: s1\n    inline: touch ran.marker\n");
    let report = run_ttp(&mut h.ctx, &mut steps).await;

    assert!(matches!(report.error, Some(ExecError::Shutdown)));
    assert!(h.ctx.record.is_empty());
    assert!(!h.ctx.vars.work_dir.join("ran.marker").exists());
}

#[tokio::test]
async fn sub_ttp_runs_in_a_derived_context_and_defers_cleanup() {
    let mut h = harness();
    let log = h.ctx.vars.work_dir.join("order.log");
    let child = format!(
        concat!(
            "name: child\n",
            "steps:\n",
            "  - name: c1\n    inline: echo child-one\n",
            "    cleanup:\n      inline: echo child-c1 >> {log}\n",
            "  - name: c2\n    inline: echo child-two\n",
            "    cleanup:\n      inline: echo child-c2 >> {log}\n",
        ),
        log = log.display()
    );
    std::fs::write(h.ctx.vars.work_dir.join("child.yaml"), child).unwrap();

    let parent = format!(
        concat!(
            "  - name: p1\n    inline: echo parent-one\n",
            "    cleanup:\n      inline: echo parent-c1 >> {log}\n",
            "  - name: nested\n    ttp: child.yaml\n",
        ),
        log = log.display()
    );
    let mut steps = parse_steps(&parent);
    let report = run_ttp(&mut h.ctx, &mut steps).await;

    assert!(report.success(), "{report:?}");
    // Parent record holds the sub-ttp as one step; the parent's own step
    // vars are untouched by the child.
    assert_eq!(h.ctx.record.len(), 2);
    assert!(h.ctx.record.contains("nested"));
    // Unwind order: nested child cleanups (reverse), then the parent's.
    assert_eq!(
        read_log(&h.ctx.vars.work_dir),
        vec!["child-c2", "child-c1", "parent-c1"]
    );
}

#[tokio::test]
async fn sub_ttp_failure_unwinds_the_child_immediately() {
    let mut h = harness();
    let log = h.ctx.vars.work_dir.join("order.log");
    let child = format!(
        concat!(
            "name: child\n",
            "steps:\n",
            "  - name: c1\n    inline: echo one\n",
            "    cleanup:\n      inline: echo child-c1 >> {log}\n",
            "  - name: boom\n    inline: \"false\"\n",
        ),
        log = log.display()
    );
    std::fs::write(h.ctx.vars.work_dir.join("child.yaml"), child).unwrap();

    let parent = format!(
        concat!(
            "  - name: p1\n    inline: echo parent\n",
            "    cleanup:\n      inline: echo parent-c1 >> {log}\n",
            "  - name: nested\n    ttp: child.yaml\n",
        ),
        log = log.display()
    );
    let mut steps = parse_steps(&parent);
    let report = run_ttp(&mut h.ctx, &mut steps).await;

    assert!(report.error.is_some());
    assert!(!h.ctx.record.contains("nested"));
    // Child unwound at failure time, then the parent's cleanup.
    assert_eq!(
        read_log(&h.ctx.vars.work_dir),
        vec!["child-c1", "parent-c1"]
    );
}

#[tokio::test]
async fn sub_ttp_binds_arguments_into_child_step_vars() {
    let mut h = harness();
    let child = concat!(
        "name: child\n",
        "args:\n  - name: greeting\n",
        "steps:\n",
        "  - name: say\n    inline: \"echo {[{stepvars.greeting}]}\"\n",
    );
    std::fs::write(h.ctx.vars.work_dir.join("child.yaml"), child).unwrap();

    let mut steps = parse_steps(concat!(
        "  - name: nested\n",
        "    ttp: child.yaml\n",
        "    args:\n      greeting: salve\n",
    ));
    let report = run_ttp(&mut h.ctx, &mut steps).await;
    assert!(report.success(), "{report:?}");
    assert!(String::from_utf8_lossy(&h.stdout.lock()).contains("salve"));
}
