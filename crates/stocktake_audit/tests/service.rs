//! Session lifecycle through the service API.

mod common;

use std::time::{Duration, Instant};

use common::{asset, scenario_inventory, FakeInventory, FakeStore};
use stocktake_audit::{
    AuditError, AuditOptions, AuditService, ClosedState, IgnoreReason, ReportStatus,
    ScanClassification, ScanOutcome, SessionId,
};

fn service(inventory: FakeInventory, store: FakeStore) -> AuditService<FakeInventory, FakeStore> {
    AuditService::new(inventory, store)
}

#[tokio::test]
async fn test_scenario_partial_report() {
    let mut svc = service(
        FakeInventory::with_assets(scenario_inventory()),
        FakeStore::default(),
    );
    let id = svc.start_session("L", false).await.unwrap();

    let classes = [
        svc.submit_scan(&id, "a ").await.unwrap(),
        svc.submit_scan(&id, "A").await.unwrap(),
        svc.submit_scan(&id, "Z").await.unwrap(),
        svc.submit_scan(&id, "D").await.unwrap(),
    ]
    .iter()
    .map(|outcome| outcome.classification().unwrap())
    .collect::<Vec<_>>();
    assert_eq!(
        classes,
        vec![
            ScanClassification::Confirmed,
            ScanClassification::Duplicate,
            ScanClassification::Unknown,
            ScanClassification::Intruder,
        ]
    );

    let finished = svc.finish_session(&id).await.unwrap();
    let report = finished.report;
    assert_eq!(report.expected_count, 3);
    assert_eq!(report.found_count, 1);
    assert_eq!(report.missing_tags, vec!["B", "C"]);
    assert_eq!(report.intruder_tags.len(), 1);
    assert_eq!(report.intruder_tags[0].tag, "D");
    assert_eq!(report.intruder_tags[0].location, "M");
    assert_eq!(report.status, ReportStatus::Partial);
    assert_eq!(report.scan_count, 4);

    assert_eq!(svc.store().saved_count(), 1);
    assert_eq!(svc.provider().stamps(), vec!["A"]);
}

#[tokio::test]
async fn test_empty_location_needs_confirmation() {
    let mut svc = service(
        FakeInventory::with_assets(scenario_inventory()),
        FakeStore::default(),
    );

    let err = svc.start_session("Storage", false).await.unwrap_err();
    assert!(matches!(err, AuditError::EmptyLocation(ref loc) if loc == "Storage"));

    let id = svc.start_session("Storage", true).await.unwrap();
    let projection = svc.projection(&id).unwrap();
    assert_eq!(projection.progress_percent, 0);

    let report = svc.finish_session(&id).await.unwrap().report;
    assert_eq!(report.expected_count, 0);
    assert_eq!(report.found_count, 0);
    assert!(report.missing_tags.is_empty());
    assert!(report.intruder_tags.is_empty());
    assert_eq!(report.status, ReportStatus::Complete);
}

#[tokio::test]
async fn test_empty_location_allowed_when_configured() {
    let options = AuditOptions {
        require_confirm_empty: false,
        ..AuditOptions::default()
    };
    let mut svc = AuditService::with_options(
        FakeInventory::with_assets(Vec::new()),
        FakeStore::default(),
        options,
    );
    assert!(svc.start_session("Anywhere", false).await.is_ok());
}

#[tokio::test]
async fn test_complete_when_everything_confirmed() {
    let mut svc = service(
        FakeInventory::with_assets(scenario_inventory()),
        FakeStore::default(),
    );
    let id = svc.start_session("L", false).await.unwrap();
    for code in ["A", "b", " c "] {
        svc.submit_scan(&id, code).await.unwrap();
    }
    assert_eq!(svc.projection(&id).unwrap().progress_percent, 100);

    let report = svc.finish_session(&id).await.unwrap().report;
    assert_eq!(report.status, ReportStatus::Complete);
}

#[tokio::test]
async fn test_intruder_rescan_has_no_side_effects() {
    let mut svc = service(
        FakeInventory::with_assets(scenario_inventory()),
        FakeStore::default(),
    );
    let id = svc.start_session("L", false).await.unwrap();

    for _ in 0..3 {
        let outcome = svc.submit_scan(&id, "D").await.unwrap();
        assert_eq!(outcome.classification(), Some(ScanClassification::Intruder));
        assert!(outcome.effects().is_empty());
    }

    let session = svc.session(&id).unwrap();
    assert_eq!(session.seen_tags().len(), 1);
    assert_eq!(session.events().len(), 3);
    assert!(svc.provider().stamps().is_empty());
    assert_eq!(svc.projection(&id).unwrap().intruder_tags.len(), 1);
}

#[tokio::test]
async fn test_stamp_failure_keeps_confirmation() {
    let inventory = FakeInventory {
        fail_stamps: true,
        ..FakeInventory::with_assets(scenario_inventory())
    };
    let mut svc = service(inventory, FakeStore::default());
    let id = svc.start_session("L", false).await.unwrap();

    let outcome = svc.submit_scan(&id, "A").await.unwrap();
    assert_eq!(outcome.classification(), Some(ScanClassification::Confirmed));
    assert_eq!(svc.provider().stamps(), vec!["A"]);
    assert_eq!(svc.projection(&id).unwrap().found_tags, vec!["A"]);

    let summary = svc.perform_effects(outcome.effects()).await;
    assert_eq!(summary.applied, 0);
    assert_eq!(summary.failed, 1);
}

#[tokio::test]
async fn test_persist_failure_leaves_session_open() {
    let mut svc = service(
        FakeInventory::with_assets(scenario_inventory()),
        FakeStore::failing(1),
    );
    let id = svc.start_session("L", false).await.unwrap();
    svc.submit_scan(&id, "A").await.unwrap();

    let err = svc.finish_session(&id).await.unwrap_err();
    assert!(matches!(err, AuditError::Persist(_)));
    assert!(!err.is_integrity_violation());
    assert_eq!(svc.projection(&id).unwrap().found_tags, vec!["A"]);

    let finished = svc.finish_session(&id).await.unwrap();
    assert_eq!(finished.report.found_count, 1);
    assert_eq!(svc.store().saved_count(), 1);
}

#[tokio::test]
async fn test_closed_sessions_fail_loudly() {
    let mut svc = service(
        FakeInventory::with_assets(scenario_inventory()),
        FakeStore::default(),
    );

    let finished = svc.start_session("L", false).await.unwrap();
    svc.finish_session(&finished).await.unwrap();

    let err = svc.finish_session(&finished).await.unwrap_err();
    assert!(matches!(
        err,
        AuditError::SessionClosed {
            state: ClosedState::Finished,
            ..
        }
    ));
    assert!(err.is_integrity_violation());
    assert!(svc.submit_scan(&finished, "A").await.is_err());
    assert_eq!(svc.store().saved_count(), 1);

    let abandoned = svc.start_session("L", false).await.unwrap();
    svc.submit_scan(&abandoned, "A").await.unwrap();
    svc.abandon_session(&abandoned).unwrap();
    let err = svc.record_scan(&abandoned, "B").unwrap_err();
    assert!(matches!(
        err,
        AuditError::SessionClosed {
            state: ClosedState::Abandoned,
            ..
        }
    ));
    assert!(svc.abandon_session(&abandoned).is_err());
    assert_eq!(svc.store().saved_count(), 1);

    let stranger = SessionId::new();
    assert!(matches!(
        svc.projection(&stranger).unwrap_err(),
        AuditError::UnknownSession(_)
    ));
}

#[tokio::test]
async fn test_closed_history_is_bounded() {
    let options = AuditOptions {
        closed_history: 2,
        ..AuditOptions::default()
    };
    let mut svc = AuditService::with_options(
        FakeInventory::with_assets(scenario_inventory()),
        FakeStore::default(),
        options,
    );

    let mut ids = Vec::new();
    for _ in 0..3 {
        let id = svc.start_session("L", false).await.unwrap();
        svc.abandon_session(&id).unwrap();
        ids.push(id);
    }

    // The oldest handle has been forgotten; the newer two still fail as closed.
    assert!(matches!(
        svc.record_scan(&ids[0], "A").unwrap_err(),
        AuditError::UnknownSession(_)
    ));
    for id in &ids[1..] {
        assert!(matches!(
            svc.record_scan(id, "A").unwrap_err(),
            AuditError::SessionClosed {
                state: ClosedState::Abandoned,
                ..
            }
        ));
    }

    let live = svc.start_session("L", false).await.unwrap();
    assert_eq!(
        svc.record_scan(&live, "A").unwrap().classification(),
        Some(ScanClassification::Confirmed)
    );
    assert_eq!(svc.active_sessions().count(), 1);
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let mut assets = scenario_inventory();
    assets.push(asset("M1", "M"));
    let mut svc = service(FakeInventory::with_assets(assets), FakeStore::default());

    let l = svc.start_session("L", false).await.unwrap();
    let m = svc.start_session("M", false).await.unwrap();
    assert_eq!(svc.active_sessions().count(), 2);

    svc.submit_scan(&l, "A").await.unwrap();
    let outcome = svc.submit_scan(&m, "A").await.unwrap();
    assert_eq!(outcome.classification(), Some(ScanClassification::Intruder));

    assert_eq!(svc.projection(&l).unwrap().found_tags, vec!["A"]);
    assert!(svc.projection(&m).unwrap().found_tags.is_empty());
    assert_eq!(svc.event_log(&l).unwrap().len(), 1);
    assert_eq!(svc.event_log(&m).unwrap().len(), 1);
}

#[tokio::test]
async fn test_camera_frames_are_debounced() {
    let mut svc = service(
        FakeInventory::with_assets(scenario_inventory()),
        FakeStore::default(),
    );
    let id = svc.start_session("L", false).await.unwrap();
    let t0 = Instant::now();

    let first = svc.submit_frame(&id, "A", t0).await.unwrap();
    assert_eq!(first.classification(), Some(ScanClassification::Confirmed));

    let echo = svc
        .submit_frame(&id, "a", t0 + Duration::from_millis(300))
        .await
        .unwrap();
    assert_eq!(echo, ScanOutcome::Ignored(IgnoreReason::Debounced));

    let later = svc
        .submit_frame(&id, "A", t0 + Duration::from_millis(2000))
        .await
        .unwrap();
    assert_eq!(later.classification(), Some(ScanClassification::Duplicate));

    // Manual entry is never debounced.
    let manual = svc.submit_scan(&id, "A").await.unwrap();
    assert_eq!(manual.classification(), Some(ScanClassification::Duplicate));

    assert_eq!(svc.event_log(&id).unwrap().len(), 3);
    assert_eq!(svc.provider().stamps(), vec!["A"]);
}

#[tokio::test]
async fn test_blank_input_records_nothing() {
    let mut svc = service(
        FakeInventory::with_assets(scenario_inventory()),
        FakeStore::default(),
    );
    let id = svc.start_session("L", false).await.unwrap();

    assert_eq!(
        svc.submit_scan(&id, "   ").await.unwrap(),
        ScanOutcome::Ignored(IgnoreReason::Blank)
    );
    assert_eq!(
        svc.submit_frame(&id, "\n", Instant::now()).await.unwrap(),
        ScanOutcome::Ignored(IgnoreReason::Blank)
    );
    assert!(svc.event_log(&id).unwrap().is_empty());
}

#[tokio::test]
async fn test_refresh_catalogue_resolves_new_assets() {
    let mut svc = service(
        FakeInventory::with_assets(scenario_inventory()),
        FakeStore::default(),
    );
    let id = svc.start_session("L", false).await.unwrap();
    assert_eq!(
        svc.submit_scan(&id, "N").await.unwrap().classification(),
        Some(ScanClassification::Unknown)
    );

    svc.provider().assets.lock().unwrap().push(asset("N", "M"));
    svc.refresh_catalogue(&id).await.unwrap();

    assert_eq!(
        svc.submit_scan(&id, "N").await.unwrap().classification(),
        Some(ScanClassification::Intruder)
    );
    assert_eq!(svc.session(&id).unwrap().expected().len(), 3);
}

#[tokio::test]
async fn test_snapshot_failure_surfaces() {
    let inventory = FakeInventory {
        fail_listing: true,
        ..FakeInventory::default()
    };
    let mut svc = service(inventory, FakeStore::default());
    assert!(matches!(
        svc.start_session("L", true).await.unwrap_err(),
        AuditError::Snapshot(_)
    ));
    assert!(svc.location_summaries().await.is_err());
}

#[tokio::test]
async fn test_location_summaries() {
    let svc = service(
        FakeInventory::with_assets(scenario_inventory()),
        FakeStore::default(),
    );
    let summaries = svc.location_summaries().await.unwrap();
    let l = summaries.iter().find(|s| s.location == "L").unwrap();
    assert_eq!(l.auditable_count, 3);
    assert_eq!(l.excluded_count, 1);
    let m = summaries.iter().find(|s| s.location == "M").unwrap();
    assert_eq!(m.auditable_count, 1);
    assert_eq!(m.excluded_count, 1);
}
