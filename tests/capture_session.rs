//! Capture sessions persisted through an on-disk store

mod common;

use common::{couple_page, profile, reversed_page};
use pedigraph::{
    capture_page, AppConfig, Bundle, CaptureStatus, CaptureStore, ExportMeta, OpenStore, ParseConfig, SegmentIndex,
    SegmentRecord, Session, SqliteStore,
};

fn profiles() -> Vec<pedigraph::ProfileRecord> {
    vec![
        profile("A1", "Jane Q Public", "/tree/a1"),
        profile("B2", "No Tree", ""),
        profile("C3", "Sam Doe", "https://gedmatch.com/tree/c3"),
    ]
}

#[test]
fn session_survives_reopening_the_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("captures.db");
    let config = AppConfig::default();

    {
        let store = SqliteStore::open(&path).unwrap();
        let mut session = Session::from_profiles(profiles(), &config.parse.links);
        assert_eq!(session.profiles.len(), 2);

        let first = session.next_profile().unwrap().tree_url.clone();
        assert_eq!(first, "https://pro.gedmatch.com/tree/a1");
        store.save_session(&session).unwrap();
    }

    let store = SqliteStore::open(&path).unwrap();
    let mut session = store.load_session().unwrap().expect("session");
    assert_eq!(session.focused_kit.as_deref(), Some("A1"));
    assert_eq!(
        session.next_profile().map(|p| p.tree_url.clone()).as_deref(),
        Some("https://pro.gedmatch.com/tree/c3")
    );
}

#[test]
fn capture_finalize_and_discard() {
    let store = SqliteStore::open_in_memory().unwrap();
    let config = AppConfig::default();
    let records = profiles();
    let mut session = Session::from_profiles(records.clone(), &config.parse.links);

    let segments = SegmentIndex::from_records(&[SegmentRecord {
        primary_kit: "A1".into(),
        matched_kit: "Z9".into(),
        chr: "3".into(),
        cm: "22.1".into(),
        ..Default::default()
    }]);
    let meta = ExportMeta::for_kit("A1", &records, &segments, &config.export);
    let capture = capture_page("A1", &couple_page(), &ParseConfig::default(), &meta)
        .with_source_url(session.profile("A1").unwrap().tree_url.clone());

    assert_eq!(capture.stats.person_rows, 2);
    assert_eq!(capture.stats.connector_rows, 1);
    assert!(capture.gedcom.contains("1 NAME Jane Q /Public/\n"));
    assert!(capture.gedcom.contains("2 _OM_MATCH_KIT Z9\n"));

    store.save_capture(&capture).unwrap();
    session.set_status("A1", CaptureStatus::Captured).unwrap();
    session.set_status("A1", CaptureStatus::Finalized).unwrap();
    store.save_session(&session).unwrap();

    let stored = store.load_capture("A1").unwrap().unwrap();
    assert_eq!(stored, capture);
    assert_eq!(store.load_session().unwrap().unwrap().status("A1").color(), "green");

    // a second kit, then discard it
    let other = capture_page("C3", &reversed_page(), &ParseConfig::default(), &ExportMeta::default());
    store.save_capture(&other).unwrap();
    session.set_status("C3", CaptureStatus::Captured).unwrap();

    let listed = store.list_captures().unwrap();
    assert_eq!(listed.iter().map(|c| c.kit.as_str()).collect::<Vec<_>>(), vec!["A1", "C3"]);
    assert_eq!(listed[1].people, 3);

    assert!(store.delete_capture("C3").unwrap());
    session.set_status("C3", CaptureStatus::Pending).unwrap();
    assert_eq!(session.pending_kits(), vec!["C3".to_string()]);
    assert!(store.load_capture("C3").unwrap().is_none());
}

#[test]
fn clearing_the_session_keeps_captures() {
    let store = SqliteStore::open_in_memory().unwrap();
    let session = Session::from_profiles(profiles(), &AppConfig::default().parse.links);
    store.save_session(&session).unwrap();
    store
        .save_capture(&capture_page("A1", &couple_page(), &ParseConfig::default(), &ExportMeta::default()))
        .unwrap();

    assert!(store.clear_session().unwrap());
    assert!(store.load_session().unwrap().is_none());
    assert_eq!(store.list_captures().unwrap().len(), 1);
}

#[test]
fn bundle_collects_the_session_and_every_capture() {
    let store = SqliteStore::open_in_memory().unwrap();
    let config = AppConfig::default();
    let mut session = Session::from_profiles(profiles(), &config.parse.links);

    let parse = ParseConfig::default();
    for (kit, page) in [("C3", reversed_page()), ("A1", couple_page())] {
        store
            .save_capture(&capture_page(kit, &page, &parse, &ExportMeta::default()))
            .unwrap();
        session.set_status(kit, CaptureStatus::Captured).unwrap();
    }
    session.set_status("A1", CaptureStatus::Finalized).unwrap();
    store.save_session(&session).unwrap();

    let session = store.load_session().unwrap().unwrap();
    let bundle = Bundle::from_store(&session, &store, config.export.site_label.clone()).unwrap();

    assert_eq!(bundle.source.site, "GEDmatch");
    assert_eq!(bundle.profiles, session.profiles);
    let kits: Vec<_> = bundle.captures.iter().map(|c| c.kit.as_str()).collect();
    assert_eq!(kits, vec!["A1", "C3"]);
    assert_eq!(bundle.captures[0], store.load_capture("A1").unwrap().unwrap());
    assert_eq!(bundle.status_by_kit["A1"], CaptureStatus::Finalized);

    let json = serde_json::to_string_pretty(&bundle).unwrap();
    assert!(json.contains("\"exportedAt\""));
    assert!(json.contains("0 @F1@ FAM"));
    let back: Bundle = serde_json::from_str(&json).unwrap();
    assert_eq!(back, bundle);
}

#[test]
fn bundle_of_a_fresh_session_has_no_captures() {
    let store = SqliteStore::open_in_memory().unwrap();
    let session = Session::from_profiles(profiles(), &AppConfig::default().parse.links);
    let bundle = Bundle::from_store(&session, &store, "GEDmatch").unwrap();
    assert_eq!(bundle.profiles.len(), 2);
    assert!(bundle.captures.is_empty());
}
