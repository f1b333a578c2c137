//! Scan-cycle properties: idempotence, control/badge correctness, and the
//! report/delete workflows.

mod harness;

use harness::{
    attached_count, badge_present, control_count, control_kind, control_node, entries, host,
    host_with_prompt,
};
use triage::dom::NodeSnapshot;
use triage_protocol::{ControlKind, IssueId, KnownIssue};
use triage_test_utils::{failure_row, passing_row, report_document, report_snapshot, ScriptedPrompt};

fn timeout_issue() -> KnownIssue {
    KnownIssue::new(1, "timeout")
}

#[tokio::test]
async fn scenario_a_matched_entry_gets_delete_control_and_badge() {
    let host = host(
        report_document(vec![failure_row(
            "Iteration 12: FAIL",
            "Connection timeout after 30s",
        )]),
        vec![timeout_issue()],
    );

    let summary = host.orchestrator.run_scan().await.expect("scan ran");
    assert_eq!(summary.entries, 1);
    assert_eq!(summary.matched, 1);

    let entry = &entries(&host)[0];
    assert_eq!(control_kind(&host, entry.row), Some(ControlKind::Delete));
    assert!(badge_present(&host, entry.error_node));
}

#[tokio::test]
async fn scenario_b_deleting_pattern_reverts_annotations_on_rescan() {
    let host = host(
        report_document(vec![failure_row(
            "Iteration 12: FAIL",
            "Connection timeout after 30s",
        )]),
        vec![timeout_issue()],
    );
    host.orchestrator.run_scan().await.expect("scan ran");

    use triage_client::PatternStore;
    host.store.delete(IssueId::new(1)).await.expect("delete");
    host.orchestrator.run_scan().await.expect("rescan ran");

    let entry = &entries(&host)[0];
    assert_eq!(control_kind(&host, entry.row), Some(ControlKind::Report));
    assert!(!badge_present(&host, entry.error_node));
}

#[tokio::test]
async fn scenario_c_invalid_pattern_does_not_break_classification() {
    let host = host(
        report_document(vec![failure_row(
            "Iteration 3: FAIL",
            "Connection timeout after 30s",
        )]),
        vec![KnownIssue::new(2, "("), KnownIssue::new(3, "timeout")],
    );

    let summary = host.orchestrator.run_scan().await.expect("scan ran");
    assert_eq!(summary.matched, 1);

    let entry = &entries(&host)[0];
    assert_eq!(control_kind(&host, entry.row), Some(ControlKind::Delete));
    assert!(badge_present(&host, entry.error_node));
}

#[tokio::test]
async fn reconciliation_is_idempotent() {
    let host = host(
        report_document(vec![
            failure_row("Iteration 1: FAIL", "Connection timeout after 30s"),
            failure_row("Iteration 2: FAIL", "assertion failed: totals differ"),
            passing_row("Iteration 3: PASS"),
        ]),
        vec![timeout_issue()],
    );

    let first = host.orchestrator.run_scan().await.expect("first scan");
    assert!(first.writes > 0);
    let nodes_after_first = attached_count(&host);

    let second = host.orchestrator.run_scan().await.expect("second scan");
    assert_eq!(second.writes, 0);
    assert_eq!(attached_count(&host), nodes_after_first);
}

#[tokio::test]
async fn exactly_one_control_per_entry_across_verdict_flips() {
    let host = host(
        report_document(vec![failure_row(
            "Iteration 1: FAIL",
            "Connection timeout after 30s",
        )]),
        vec![timeout_issue()],
    );

    // match -> no match -> match again
    host.orchestrator.run_scan().await.expect("scan");
    use triage_client::PatternStore;
    host.store.delete(IssueId::new(1)).await.expect("delete");
    host.orchestrator.run_scan().await.expect("scan");
    host.store.create("timeout").await.expect("create");
    host.orchestrator.run_scan().await.expect("scan");

    let entry = &entries(&host)[0];
    assert_eq!(control_count(&host, entry.row), 1);
    assert_eq!(control_kind(&host, entry.row), Some(ControlKind::Delete));
}

#[tokio::test]
async fn badges_cover_error_containers_outside_scanned_rows() {
    // An error container in a summary section: no failure row around it,
    // but its text matches a stored pattern.
    let stray = NodeSnapshot::element("div").with_child(
        NodeSnapshot::element("code")
            .with_child(NodeSnapshot::element("strong").with_text("timeout in teardown")),
    );
    let snapshot = report_snapshot(vec![failure_row(
        "Iteration 1: FAIL",
        "Connection timeout after 30s",
    )])
    .with_child(stray);
    let document = triage::dom::Document::from_snapshot("http://reports.local/run/2", &snapshot);
    let host = host(document, vec![timeout_issue()]);

    host.orchestrator.run_scan().await.expect("scan ran");

    let doc = host.doc.lock();
    let error_selector = triage::config::MatcherConfig::default().validate().unwrap().error;
    let error_nodes = doc.query_selector_all(&error_selector);
    assert_eq!(error_nodes.len(), 2);
    for node in error_nodes {
        assert!(
            doc.child_with_class(node, triage_protocol::defaults::BADGE_CLASS)
                .is_some(),
            "every matching error container carries a badge"
        );
    }
}

#[tokio::test]
async fn list_failure_degrades_to_empty_set() {
    let host = host(
        report_document(vec![failure_row(
            "Iteration 1: FAIL",
            "Connection timeout after 30s",
        )]),
        vec![timeout_issue()],
    );
    host.orchestrator.run_scan().await.expect("scan");
    let entry = &entries(&host)[0];
    assert!(badge_present(&host, entry.error_node));

    host.store.fail_list(true);
    let summary = host.orchestrator.run_scan().await.expect("degraded scan");
    assert_eq!(summary.matched, 0);

    // Everything renders report-eligible, badges clear.
    assert_eq!(control_kind(&host, entry.row), Some(ControlKind::Report));
    assert!(!badge_present(&host, entry.error_node));
}

#[tokio::test]
async fn report_workflow_stores_escaped_pattern_and_resyncs() {
    let host = host_with_prompt(
        report_document(vec![failure_row(
            "Iteration 1: FAIL",
            "Expected [1] but got (2)",
        )]),
        vec![],
        ScriptedPrompt::accepting_default(),
    );
    host.orchestrator.run_scan().await.expect("scan");

    let entry = &entries(&host)[0];
    assert_eq!(control_kind(&host, entry.row), Some(ControlKind::Report));
    let control = control_node(&host, entry.row).expect("control present");

    host.orchestrator.dispatch_action(control).await;

    // The prompt was shown the escaped literal as its default.
    let seen = host.prompt.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].1, regex::escape("Expected [1] but got (2)"));

    // The store gained the pattern and the rescan flipped the control.
    assert_eq!(host.store.issues().len(), 1);
    assert_eq!(control_kind(&host, entry.row), Some(ControlKind::Delete));
    assert!(badge_present(&host, entry.error_node));
}

#[tokio::test]
async fn report_workflow_cancel_leaves_store_untouched() {
    let host = host_with_prompt(
        report_document(vec![failure_row("Iteration 1: FAIL", "boom")]),
        vec![],
        ScriptedPrompt::cancelling(),
    );
    host.orchestrator.run_scan().await.expect("scan");
    let entry = &entries(&host)[0];
    let control = control_node(&host, entry.row).expect("control present");

    host.orchestrator.dispatch_action(control).await;

    assert!(host.store.issues().is_empty());
    assert_eq!(control_kind(&host, entry.row), Some(ControlKind::Report));
    assert!(host.notifier.messages().is_empty());
}

#[tokio::test]
async fn delete_workflow_removes_pattern_via_click() {
    let host = host(
        report_document(vec![failure_row(
            "Iteration 1: FAIL",
            "Connection timeout after 30s",
        )]),
        vec![timeout_issue()],
    );
    host.orchestrator.run_scan().await.expect("scan");
    let entry = &entries(&host)[0];
    let control = control_node(&host, entry.row).expect("delete control");

    host.orchestrator.dispatch_action(control).await;

    assert!(host.store.issues().is_empty());
    assert_eq!(control_kind(&host, entry.row), Some(ControlKind::Report));
    assert!(!badge_present(&host, entry.error_node));
}

#[tokio::test]
async fn delete_failure_notifies_and_leaves_document_unchanged() {
    let host = host(
        report_document(vec![failure_row(
            "Iteration 1: FAIL",
            "Connection timeout after 30s",
        )]),
        vec![timeout_issue()],
    );
    host.orchestrator.run_scan().await.expect("scan");
    let entry = &entries(&host)[0];
    let control = control_node(&host, entry.row).expect("delete control");

    host.store.fail_delete(true);
    host.orchestrator.dispatch_action(control).await;

    assert_eq!(host.notifier.messages().len(), 1);
    assert!(host.notifier.messages()[0].contains("Failed to delete"));
    assert_eq!(control_kind(&host, entry.row), Some(ControlKind::Delete));
    assert!(badge_present(&host, entry.error_node));
}

#[tokio::test]
async fn create_failure_notifies_user() {
    let host = host_with_prompt(
        report_document(vec![failure_row("Iteration 1: FAIL", "boom")]),
        vec![],
        ScriptedPrompt::submitting("boom"),
    );
    host.orchestrator.run_scan().await.expect("scan");
    let entry = &entries(&host)[0];
    let control = control_node(&host, entry.row).expect("report control");

    host.store.fail_create(true);
    host.orchestrator.dispatch_action(control).await;

    assert_eq!(host.notifier.messages().len(), 1);
    assert!(host.notifier.messages()[0].contains("Failed to save"));
    assert_eq!(control_kind(&host, entry.row), Some(ControlKind::Report));
}
