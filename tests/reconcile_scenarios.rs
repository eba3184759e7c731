//! End-to-end reconciliation against an on-disk layout.

mod common;

use common::{bundle, Harness};

use alertmanager_config_controller::fragment::intent::{
    ANNOTATION_CONFIG, ANNOTATION_INHIBIT_RULE, ANNOTATION_KEY, ANNOTATION_RECEIVER,
    ANNOTATION_ROUTE,
};
use alertmanager_config_controller::ReconcileOutcome;

const ROUTE: &str = "- match:\n    severity: critical\n  receiver: x";

#[tokio::test]
async fn test_route_waits_in_backlog_for_its_receiver() {
    let mut h = Harness::new().await;

    let route = bundle("1", ANNOTATION_ROUTE, "pager", "r1", ROUTE);
    let outcome = h.reconciler.create(&route).await;
    assert!(matches!(outcome, ReconcileOutcome::Rejected { .. }));

    let parked = h.stored("backup-routes", "monitoring-pager-r1").unwrap();
    assert!(parked.contains("continue: true"));
    assert!(h.stored("routes", "monitoring-pager-r1").is_none());
    assert!(h.output().is_none());
    assert_eq!(h.reload.calls(), 0);

    let receiver = bundle("1", ANNOTATION_RECEIVER, "pager", "x", "- name: x\n");
    let outcome = h.reconciler.create(&receiver).await;
    assert!(matches!(outcome, ReconcileOutcome::Applied { reloaded: true, .. }));

    assert!(h.stored("routes", "monitoring-pager-r1").is_some());
    assert!(h.stored("backup-routes", "monitoring-pager-r1").is_none());
    let output = h.output().unwrap();
    assert!(output.contains("receiver: x"));
    assert!(output.contains("- name: x"));
    assert_eq!(h.reload.calls(), 1);
}

#[tokio::test]
async fn test_identical_update_does_nothing() {
    let mut h = Harness::new().await;
    let receiver = bundle("1", ANNOTATION_RECEIVER, "team", "x", "- name: x\n");
    h.reconciler.create(&receiver).await;
    let calls = h.reload.calls();

    let outcome = h.reconciler.update(&receiver, &receiver.clone()).await;
    assert_eq!(outcome, ReconcileOutcome::Unchanged);
    assert_eq!(h.reload.calls(), calls);
}

#[tokio::test]
async fn test_other_instance_leaves_no_trace() {
    let mut h = Harness::new().await;

    for flag in [ANNOTATION_ROUTE, ANNOTATION_RECEIVER, ANNOTATION_INHIBIT_RULE] {
        let foreign = bundle("2", flag, "foreign", "k", "- name: y\n");
        assert_eq!(h.reconciler.create(&foreign).await, ReconcileOutcome::Skipped);
    }

    assert!(!h.path("routes").exists());
    assert!(!h.path("receivers").exists());
    assert!(!h.path("inhibit-rules").exists());
    assert!(!h.path("backup-routes").exists());
    assert!(h.output().is_none());
    assert_eq!(h.reload.calls(), 0);
}

#[tokio::test]
async fn test_replayed_create_is_idempotent() {
    let mut h = Harness::new().await;
    let receiver = bundle("1", ANNOTATION_RECEIVER, "team", "x", "- name: x\n");

    h.reconciler.create(&receiver).await;
    let stored = h.stored("receivers", "monitoring-team-x");
    let output = h.output();

    h.reconciler.create(&receiver).await;
    assert_eq!(h.stored("receivers", "monitoring-team-x"), stored);
    assert_eq!(h.output(), output);
}

#[tokio::test]
async fn test_rejected_fragment_keeps_previous_output() {
    let mut h = Harness::new().await;
    h.reconciler
        .create(&bundle("1", ANNOTATION_RECEIVER, "a", "x", "- name: x\n"))
        .await;
    let before = h.output().unwrap();

    let duplicate = bundle("1", ANNOTATION_RECEIVER, "b", "x", "- name: x\n");
    let outcome = h.reconciler.create(&duplicate).await;
    match outcome {
        ReconcileOutcome::Rejected { quarantined, .. } => {
            assert_eq!(quarantined, vec!["monitoring-b-x".to_string()])
        }
        other => panic!("unexpected outcome {other:?}"),
    }

    assert_eq!(h.output().unwrap(), before);
    assert!(h.stored("receivers", "monitoring-b-x").is_none());
    assert!(h.stored("backup-receivers", "monitoring-b-x").is_some());
}

#[tokio::test]
async fn test_fragments_render_in_name_order() {
    let mut h = Harness::new().await;
    h.reconciler
        .create(&bundle("1", ANNOTATION_RECEIVER, "zeta", "k", "- name: zeta\n"))
        .await;
    h.reconciler
        .create(&bundle("1", ANNOTATION_RECEIVER, "alpha", "k", "- name: alpha\n"))
        .await;

    let output = h.output().unwrap();
    let alpha = output.find("- name: alpha").unwrap();
    let zeta = output.find("- name: zeta").unwrap();
    assert!(alpha < zeta);
}

#[tokio::test]
async fn test_base_config_needs_matching_key() {
    let mut h = Harness::new().await;
    let template = "route:\n  receiver: ops\n  routes:\n  {{ .Routes }}\nreceivers:\n- name: ops\n{{ .Receivers }}\n";

    let wrong = bundle("1", ANNOTATION_CONFIG, "base", "alertmanager.tmpl", template)
        .with_annotation(ANNOTATION_KEY, "guess");
    assert_eq!(h.reconciler.create(&wrong).await, ReconcileOutcome::Skipped);

    let right = wrong.clone().with_annotation(ANNOTATION_KEY, "secret");
    assert!(h.reconciler.create(&right).await.is_applied());
    assert!(h.output().unwrap().contains("- name: ops"));
}

#[tokio::test]
async fn test_delete_cleans_active_and_backlog() {
    let mut h = Harness::new().await;
    let route = bundle("1", ANNOTATION_ROUTE, "pager", "r1", ROUTE);
    h.reconciler.create(&route).await;
    assert!(h.stored("backup-routes", "monitoring-pager-r1").is_some());

    assert!(h.reconciler.delete(&route).await.is_applied());
    assert!(h.stored("backup-routes", "monitoring-pager-r1").is_none());
    assert_eq!(h.reload.calls(), 1);
}

#[tokio::test]
async fn test_replayed_create_of_parked_route_lands_in_one_place() {
    let mut h = Harness::new().await;
    for name in ["a", "b", "c"] {
        let route = bundle("1", ANNOTATION_ROUTE, name, "r", "- receiver: x\n");
        h.reconciler.create(&route).await;
    }
    assert_eq!(h.listed("backup-routes").len(), 3);

    let receiver = bundle("1", ANNOTATION_RECEIVER, "team", "x", "- name: x\n");
    h.reconciler.create(&receiver).await;
    assert!(h.stored("routes", "monitoring-a-r").is_some());

    let replay = bundle("1", ANNOTATION_ROUTE, "c", "r", "- receiver: x\n");
    assert!(h.reconciler.create(&replay).await.is_applied());

    let active = h.listed("routes");
    for file in h.listed("backup-routes") {
        assert!(!active.contains(&file), "{file} is both active and parked");
    }
    assert!(h.stored("routes", "monitoring-c-r").is_some());
    assert!(h.stored("backup-routes", "monitoring-c-r").is_none());
}

#[tokio::test]
async fn test_update_to_valid_payload_empties_backlog() {
    let mut h = Harness::new().await;
    let parked = bundle("1", ANNOTATION_ROUTE, "pager", "r1", ROUTE);
    h.reconciler.create(&parked).await;
    assert!(h.stored("backup-routes", "monitoring-pager-r1").is_some());

    let fixed = bundle("1", ANNOTATION_ROUTE, "pager", "r1", "- receiver: default\n");
    let outcome = h.reconciler.update(&parked, &fixed).await;
    assert!(matches!(outcome, ReconcileOutcome::Applied { reloaded: true, .. }));

    assert!(h.listed("backup-routes").is_empty());
    assert!(h.stored("routes", "monitoring-pager-r1").is_some());
    assert!(h.output().unwrap().contains("receiver: default"));
}

#[tokio::test]
async fn test_foreign_update_and_delete_leave_no_trace() {
    let mut h = Harness::new().await;
    let old = bundle("2", ANNOTATION_ROUTE, "foreign", "r1", "- receiver: default\n");
    let new = bundle("2", ANNOTATION_ROUTE, "foreign", "r1", "- receiver: other\n");

    assert_eq!(h.reconciler.update(&old, &new).await, ReconcileOutcome::Skipped);
    assert_eq!(h.reconciler.delete(&new).await, ReconcileOutcome::Skipped);

    assert!(!h.path("routes").exists());
    assert!(!h.path("receivers").exists());
    assert!(!h.path("backup-routes").exists());
    assert!(h.output().is_none());
    assert_eq!(h.reload.calls(), 0);
}

#[tokio::test]
async fn test_update_moving_to_other_instance_removes_fragment() {
    let mut h = Harness::new().await;
    let mine = bundle("1", ANNOTATION_RECEIVER, "team", "x", "- name: x\n");
    h.reconciler.create(&mine).await;
    assert!(h.stored("receivers", "monitoring-team-x").is_some());

    let theirs = bundle("2", ANNOTATION_RECEIVER, "team", "x", "- name: x\n");
    assert!(h.reconciler.update(&mine, &theirs).await.is_applied());

    assert!(h.listed("receivers").is_empty());
    assert!(h.listed("backup-receivers").is_empty());
    assert!(!h.output().unwrap().contains("- name: x"));
    assert_eq!(h.reload.calls(), 2);
}

#[tokio::test]
async fn test_update_moving_to_this_instance_writes_fragment() {
    let mut h = Harness::new().await;
    let theirs = bundle("2", ANNOTATION_RECEIVER, "team", "x", "- name: x\n");
    let mine = bundle("1", ANNOTATION_RECEIVER, "team", "x", "- name: x\n");

    let outcome = h.reconciler.update(&theirs, &mine).await;
    assert!(matches!(outcome, ReconcileOutcome::Applied { reloaded: true, .. }));

    assert!(h.stored("receivers", "monitoring-team-x").is_some());
    assert!(h.output().unwrap().contains("- name: x"));
    assert_eq!(h.reload.calls(), 1);
}
