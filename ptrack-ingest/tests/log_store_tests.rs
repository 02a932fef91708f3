//! Attendance log persistence: merge, bootstrap, manual resolution

mod helpers;

use helpers::{create_legacy_db, create_test_db, placement, roster, stray_event};
use ptrack_common::{Error, MatchStatus, RawEvent};
use ptrack_ingest::db::{DedupMode, LogStore, RosterStore};
use ptrack_ingest::services::{ingest, IngestionPipeline};
use ptrack_ingest::sources::CsvEventSource;
use std::sync::Arc;
use uuid::Uuid;

#[tokio::test]
async fn test_fresh_log_is_empty_and_not_initialized() {
    let (_dir, pool) = create_test_db().await;
    let store = LogStore::new(pool);

    assert!(!store.exists().await.unwrap());
    assert!(store.load().await.unwrap().is_empty());
    assert_eq!(store.dedup_mode().await.unwrap(), DedupMode::Fingerprint);
}

#[tokio::test]
async fn test_merge_same_batch_twice_is_idempotent() {
    let (_dir, pool) = create_test_db().await;
    let store = LogStore::new(pool);
    let batch = vec![placement("Acme"), placement("Globex"), stray_event()];

    let first = store.merge(&ingest(&batch, &roster())).await.unwrap();
    assert_eq!(first.appended, 3);
    assert_eq!(first.total, 3);

    let second = store.merge(&ingest(&batch, &roster())).await.unwrap();
    assert_eq!(second.appended, 0);
    assert_eq!(second.duplicates_dropped, 3);
    assert_eq!(second.total, 3);

    assert!(store.exists().await.unwrap());
}

#[tokio::test]
async fn test_merge_keeps_history_first_and_preserves_order() {
    let (_dir, pool) = create_test_db().await;
    let store = LogStore::new(pool);

    let history = ingest(&[placement("Acme")], &roster());
    store.merge(&history).await.unwrap();
    store
        .merge(&ingest(&[placement("Globex"), placement("Acme")], &roster()))
        .await
        .unwrap();

    let log = store.load().await.unwrap();
    let companies: Vec<_> = log.iter().map(|e| e.company.clone().unwrap()).collect();
    assert_eq!(companies, vec!["Acme", "Globex"]);
    assert_eq!(log[0].attendance_id, history[0].attendance_id);
}

#[tokio::test]
async fn test_merge_empty_batch_does_not_initialize_log() {
    let (_dir, pool) = create_test_db().await;
    let store = LogStore::new(pool);

    let outcome = store.merge(&[]).await.unwrap();
    assert_eq!(outcome.total, 0);
    assert!(!store.exists().await.unwrap());
}

#[tokio::test]
async fn test_manual_resolution_survives_reingest() {
    let (_dir, pool) = create_test_db().await;
    let store = LogStore::new(pool);

    let entries = ingest(&[stray_event()], &roster());
    store.merge(&entries).await.unwrap();

    let resolved = store
        .resolve_manually(entries[0].attendance_id, "S2", &roster())
        .await
        .unwrap();
    assert_eq!(resolved.match_status, MatchStatus::Manual);
    assert_eq!(resolved.match_score, 100);
    assert_eq!(resolved.student_id.as_deref(), Some("S2"));
    assert_eq!(resolved.class_id.as_deref(), Some("C1"));
    assert!(resolved.matched);

    // Same upload again: the manual decision is kept, nothing is appended
    let outcome = store.merge(&ingest(&[stray_event()], &roster())).await.unwrap();
    assert_eq!(outcome.appended, 0);

    let log = store.load().await.unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].match_status, MatchStatus::Manual);
    assert_eq!(log[0].student_id.as_deref(), Some("S2"));
}

#[tokio::test]
async fn test_resolve_on_empty_log() {
    let (_dir, pool) = create_test_db().await;
    let store = LogStore::new(pool);

    let err = store
        .resolve_manually(Uuid::new_v4(), "S1", &roster())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::EmptyLog));
}

#[tokio::test]
async fn test_resolve_unknown_attendance_id_leaves_log_unchanged() {
    let (_dir, pool) = create_test_db().await;
    let store = LogStore::new(pool);
    store.merge(&ingest(&[stray_event()], &roster())).await.unwrap();
    let before = store.load().await.unwrap();

    let err = store
        .resolve_manually(Uuid::new_v4(), "S1", &roster())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
    assert_eq!(store.load().await.unwrap(), before);
}

#[tokio::test]
async fn test_resolve_unknown_student_leaves_log_unchanged() {
    let (_dir, pool) = create_test_db().await;
    let store = LogStore::new(pool);
    let entries = ingest(&[stray_event()], &roster());
    store.merge(&entries).await.unwrap();
    let before = store.load().await.unwrap();

    let err = store
        .resolve_manually(entries[0].attendance_id, "S99", &roster())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UnknownStudent(ref id) if id == "S99"));
    assert_eq!(err.to_string(), "No student found with student_id=S99");
    assert_eq!(store.load().await.unwrap(), before);
}

#[tokio::test]
async fn test_bootstrap_runs_once() {
    let (_dir, pool) = create_test_db().await;
    RosterStore::new(pool.clone())
        .replace_roster(&roster())
        .await
        .unwrap();

    let source = Arc::new(vec![placement("Acme"), stray_event()]);
    let store = LogStore::new(pool).with_bootstrap_source(source);

    let first = store.load().await.unwrap();
    assert_eq!(first.len(), 2);
    assert_eq!(first[0].match_status, MatchStatus::MatchedById);
    assert_eq!(first[1].match_status, MatchStatus::Unmatched);
    assert!(store.exists().await.unwrap());

    // Ids are stable once persisted: a second load reads, it does not re-run
    let second = store.load().await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_empty_bootstrap_is_not_persisted() {
    let (_dir, pool) = create_test_db().await;
    let store = LogStore::new(pool).with_bootstrap_source(Arc::new(Vec::<RawEvent>::new()));

    assert!(store.load().await.unwrap().is_empty());
    assert!(!store.exists().await.unwrap());
}

#[tokio::test]
async fn test_legacy_table_falls_back_to_whole_row_dedup() {
    let (_dir, pool) = create_legacy_db().await;
    let store = LogStore::new(pool);

    assert_eq!(store.dedup_mode().await.unwrap(), DedupMode::WholeRow);

    let entries = IngestionPipeline::new(&roster())
        .run(&[placement("Acme"), stray_event()])
        .entries;
    let outcome = store.merge(&entries).await.unwrap();
    assert_eq!(outcome.appended, 2);

    let log = store.load().await.unwrap();
    assert_eq!(log.len(), 2);
    assert!(log.iter().all(|e| e.fingerprint_hash.is_empty()));
    assert_eq!(log[0].attendance_id, entries[0].attendance_id);

    // Re-merging the exact rows read back drops them as whole-row repeats
    let outcome = store.merge(&log).await.unwrap();
    assert_eq!(outcome.appended, 0);
    assert_eq!(outcome.total, 2);
}

#[tokio::test]
async fn test_missing_bootstrap_file_is_empty_bootstrap() {
    let (dir, pool) = create_test_db().await;
    let source = Arc::new(CsvEventSource::new(dir.path().join("absent_events.csv")));
    let store = LogStore::new(pool).with_bootstrap_source(source);

    assert!(store.load().await.unwrap().is_empty());
    assert!(!store.exists().await.unwrap());
}
