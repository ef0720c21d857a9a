//! Integration tests for the CSV case store

use std::sync::Arc;

use tokio::task::JoinSet;

use domain_cases::{
    CaseError, CaseQuery, CaseStatus, CaseStore, CaseStorePort, CaseUpdate, DepartmentDirectory,
    FinalDecision, Handler,
};
use infra_store::{export_csv, schema, CaseRecord, COLUMNS};
use proptest::prelude::*;
use test_utils::{
    assert_history_extends, note_strategy, DepartmentFixtures, TempCsvStore, TestCaseBuilder,
};

mod adapter_tests {
    use super::*;

    #[tokio::test]
    async fn test_open_creates_file_with_header() {
        let tmp = TempCsvStore::new().await.unwrap();
        let contents = tmp.contents().await.unwrap();
        assert_eq!(contents.trim_end(), COLUMNS.join(","));
    }

    #[tokio::test]
    async fn test_open_creates_missing_parent_directories() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("data").join("claims.csv");
        infra_store::CsvCaseStore::open(&path).await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_insert_and_reopen() {
        let tmp = TempCsvStore::new().await.unwrap();
        let case = TestCaseBuilder::new().with_lot_id("LOT-1").build();
        tmp.store.insert(case.clone(), None).await.unwrap();

        let reopened = tmp.reopen().await.unwrap();
        let found = reopened.find_latest_by_lot("LOT-1").await.unwrap().unwrap();
        assert_eq!(found.id, case.id);
        assert_eq!(found.action_history, case.action_history);
        assert_eq!(found.current_handler, case.current_handler);
    }

    #[tokio::test]
    async fn test_latest_by_lot_is_last_row() {
        let tmp = TempCsvStore::new().await.unwrap();
        let first = TestCaseBuilder::new().with_lot_id("LOT-X").build();
        let second = TestCaseBuilder::new()
            .with_lot_id("LOT-X")
            .with_complaint("second complaint")
            .build();
        tmp.store.insert(first, None).await.unwrap();
        tmp.store.insert(second.clone(), None).await.unwrap();

        let found = tmp.store.find_latest_by_lot("LOT-X").await.unwrap().unwrap();
        assert_eq!(found.id, second.id);
    }

    #[tokio::test]
    async fn test_stale_save_is_rejected() {
        let tmp = TempCsvStore::new().await.unwrap();
        let case = tmp
            .store
            .insert(TestCaseBuilder::new().build(), None)
            .await
            .unwrap();

        let saved = tmp.store.save(case.clone(), 0, None).await.unwrap();
        assert_eq!(saved.revision, 1);

        let stale = tmp.store.save(case, 0, None).await;
        assert!(stale.unwrap_err().is_conflict());
    }

    #[tokio::test]
    async fn test_save_unknown_case_is_not_found() {
        let tmp = TempCsvStore::new().await.unwrap();
        let result = tmp.store.save(TestCaseBuilder::new().build(), 0, None).await;
        assert!(result.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_list_filters_and_keeps_order() {
        let tmp = TempCsvStore::new().await.unwrap();
        for (lot, dept) in [
            ("LOT-1", DepartmentFixtures::qc()),
            ("LOT-2", DepartmentFixtures::qa()),
            ("LOT-3", DepartmentFixtures::qc()),
        ] {
            let case = TestCaseBuilder::new().with_lot_id(lot).assigned_to(dept).build();
            tmp.store.insert(case, None).await.unwrap();
        }

        let qc = tmp
            .store
            .list(CaseQuery::open_for(Some(Handler::Department(DepartmentFixtures::qc()))))
            .await
            .unwrap();
        let lots: Vec<_> = qc.iter().map(|c| c.lot_id.as_str()).collect();
        assert_eq!(lots, vec!["LOT-1", "LOT-3"]);
    }

    #[tokio::test]
    async fn test_clear_leaves_header_only() {
        let tmp = TempCsvStore::new().await.unwrap();
        tmp.store.insert(TestCaseBuilder::new().build(), None).await.unwrap();

        assert_eq!(tmp.store.clear().await.unwrap(), 1);
        assert!(tmp.store.list(CaseQuery::default()).await.unwrap().is_empty());
        assert_eq!(tmp.contents().await.unwrap().lines().count(), 1);
    }

    #[tokio::test]
    async fn test_health_check_reports_file_adapter() {
        use core_kernel::{AdapterType, HealthCheckable};

        let tmp = TempCsvStore::new().await.unwrap();
        let health = tmp.store.health_check().await;
        assert!(health.is_operational());
        assert_eq!(health.adapter_type, AdapterType::File);
    }
}

mod migration_tests {
    use super::*;

    const LEGACY: &str = "\
Lot_ID,Date,Complaint,Department,Status,Estimated_Days,Current_Handler,Action_History
LOT-7,2025-11-04 08:30,Rust spots,QC,Assigned to QC,5.0,System,[2025-11-04 08:30] Case Created -> AI Assigned to QC
LOT-8,2025-11-05 10:00,Late truck,MCS,Investigation Complete,2,MCS,[2025-11-05 10:00] Case Created -> AI Assigned to MCS || [2025-11-05 11:00] QC: checked
LOT-9,2025-11-06 09:10,Wrong grade on label,QA,Assigned to QA,1,nan,[2025-11-06 09:10] Case Created -> AI Assigned to QA
";

    #[tokio::test]
    async fn test_legacy_file_is_migrated_on_open() {
        let tmp = TempCsvStore::with_contents(Some(LEGACY)).await.unwrap();

        let contents = tmp.contents().await.unwrap();
        assert!(contents.starts_with(&COLUMNS.join(",")));

        let case = tmp.store.find_latest_by_lot("LOT-7").await.unwrap().unwrap();
        assert_eq!(case.current_handler, Handler::Department(DepartmentFixtures::qc()));
        assert_eq!(case.estimated_days, 5);

        let forwarded = tmp.store.find_latest_by_lot("LOT-8").await.unwrap().unwrap();
        assert_eq!(forwarded.action_history.len(), 2);
        assert_eq!(forwarded.action_history.last().unwrap().note, "QC: checked");

        let placeholder = tmp.store.find_latest_by_lot("LOT-9").await.unwrap().unwrap();
        assert_eq!(placeholder.current_handler, Handler::Department(DepartmentFixtures::qa()));
        assert!(!contents.contains(",nan,"));
    }

    #[tokio::test]
    async fn test_migration_is_stable() {
        let tmp = TempCsvStore::with_contents(Some(LEGACY)).await.unwrap();
        let first = tmp.contents().await.unwrap();

        tmp.reopen().await.unwrap();
        assert_eq!(tmp.contents().await.unwrap(), first);
    }

    #[tokio::test]
    async fn test_unusable_row_fails_open() {
        let broken = "Lot_ID,Date,Department\nLOT-1,not a date,QC\n";
        let result = TempCsvStore::with_contents(Some(broken)).await;
        assert!(matches!(result, Err(infra_store::StoreError::MalformedRow { .. })));
    }
}

mod service_tests {
    use super::*;

    #[tokio::test]
    async fn test_case_store_over_csv_file() {
        let tmp = TempCsvStore::new().await.unwrap();
        let store = CaseStore::new(Arc::new(tmp.store.clone()), DepartmentDirectory::default());

        let created = store
            .create("LOT-1", "crack, near edge", DepartmentFixtures::mcs(), 2)
            .await
            .unwrap();
        let closed = store
            .update(
                "LOT-1",
                CaseUpdate::new(CaseStatus::Closed, "MCS: Reject")
                    .with_next_handler(Handler::Completed)
                    .with_final_decision(FinalDecision::Reject)
                    .with_resolution_note("within tolerance, see report"),
            )
            .await
            .unwrap();
        assert_history_extends(&created, &closed);

        let reopened = CaseStore::new(Arc::new(tmp.reopen().await.unwrap()), DepartmentDirectory::default());
        let closed_list = reopened.list_closed().await.unwrap();
        assert_eq!(closed_list.len(), 1);
        assert_eq!(closed_list[0].final_decision, Some(FinalDecision::Reject));
        assert_eq!(
            closed_list[0].resolution_note.as_deref(),
            Some("within tolerance, see report")
        );
        assert_eq!(closed_list[0].current_handler, Handler::Completed);
    }

    #[tokio::test]
    async fn test_two_handles_cannot_lose_updates() {
        let tmp = TempCsvStore::new().await.unwrap();
        let a = CaseStore::new(Arc::new(tmp.store.clone()), DepartmentDirectory::default());
        let b = CaseStore::new(Arc::new(tmp.reopen().await.unwrap()), DepartmentDirectory::default());

        a.create("LOT-1", "dent", DepartmentFixtures::qc(), 5).await.unwrap();
        let seen_by_a = a.find_latest("LOT-1").await.unwrap().unwrap();
        let seen_by_b = b.find_latest("LOT-1").await.unwrap().unwrap();

        a.apply(seen_by_a, CaseUpdate::new(CaseStatus::InvestigationComplete, "QC: a"), None)
            .await
            .unwrap();
        let lost = b
            .apply(seen_by_b, CaseUpdate::new(CaseStatus::InvestigationComplete, "QC: b"), None)
            .await;
        assert!(matches!(lost, Err(CaseError::StoreWriteConflict(_))));

        let stored = a.find_latest("LOT-1").await.unwrap().unwrap();
        assert_eq!(stored.action_history.last().unwrap().note, "QC: a");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_inserts_across_handles_are_all_kept() {
        let tmp = TempCsvStore::new().await.unwrap();
        let handles = [tmp.store.clone(), tmp.reopen().await.unwrap()];

        let mut tasks = JoinSet::new();
        for i in 0..40 {
            let store = handles[i % 2].clone();
            tasks.spawn(async move {
                let case = TestCaseBuilder::new().with_lot_id(format!("LOT-{}", i)).build();
                store.insert(case, None).await.map(|c| c.id)
            });
        }

        let mut acknowledged = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            acknowledged.push(joined.unwrap().unwrap());
        }
        assert_eq!(acknowledged.len(), 40);

        let stored = tmp.reopen().await.unwrap().list(CaseQuery::default()).await.unwrap();
        assert_eq!(stored.len(), 40);
        for id in &acknowledged {
            assert!(stored.iter().any(|c| &c.id == id), "acknowledged insert {} was lost", id);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_updates_and_creates_keep_acknowledged_writes() {
        let tmp = TempCsvStore::new().await.unwrap();
        let a = CaseStore::new(Arc::new(tmp.store.clone()), DepartmentDirectory::default());
        let b = CaseStore::new(Arc::new(tmp.reopen().await.unwrap()), DepartmentDirectory::default());
        a.create("LOT-1", "dent", DepartmentFixtures::qc(), 5).await.unwrap();

        let mut tasks = JoinSet::new();
        for i in 0..24 {
            let store = if i % 2 == 0 { a.clone() } else { b.clone() };
            tasks.spawn(async move {
                if i % 4 < 2 {
                    let update = CaseUpdate::new(CaseStatus::InvestigationComplete, format!("QC: note {}", i));
                    store.update("LOT-1", update).await.map(|_| true)
                } else {
                    store
                        .create(&format!("LOT-{}", 100 + i), "scratch", DepartmentFixtures::qc(), 5)
                        .await
                        .map(|_| false)
                }
            });
        }

        let (mut updates, mut creates) = (0, 0);
        while let Some(joined) = tasks.join_next().await {
            match joined.unwrap() {
                Ok(true) => updates += 1,
                Ok(false) => creates += 1,
                Err(CaseError::StoreWriteConflict(_)) => {}
                Err(other) => panic!("unexpected failure: {}", other),
            }
        }
        assert_eq!(creates, 12);
        assert!(updates >= 1);

        let check = CaseStore::new(Arc::new(tmp.reopen().await.unwrap()), DepartmentDirectory::default());
        assert_eq!(check.all().await.unwrap().len(), 1 + creates);
        let case = check.find_latest("LOT-1").await.unwrap().unwrap();
        assert_eq!(case.action_history.len(), 1 + updates);
        assert_eq!(case.revision, updates as u64);
    }

    #[tokio::test]
    async fn test_export_matches_store_layout() {
        let tmp = TempCsvStore::new().await.unwrap();
        tmp.store.insert(TestCaseBuilder::new().build(), None).await.unwrap();

        let cases = tmp.store.list(CaseQuery::default()).await.unwrap();
        let exported = String::from_utf8(export_csv(&cases).unwrap()).unwrap();
        assert_eq!(exported, tmp.contents().await.unwrap());
    }
}

proptest! {
    #[test]
    fn prop_history_order_survives_the_file(notes in prop::collection::vec(note_strategy(), 1..8)) {
        let mut builder = TestCaseBuilder::new();
        for note in &notes {
            builder = builder.with_note(note.clone());
        }
        let case = builder.build();

        let bytes = schema::write_records(&[CaseRecord::from_case(&case)]).unwrap();
        let (records, _) = schema::read_records(&bytes).unwrap();
        let back = records[0].clone().into_case(2).unwrap();

        prop_assert_eq!(back.action_history.len(), notes.len() + 1);
        prop_assert_eq!(back.action_history, case.action_history);
    }
}
