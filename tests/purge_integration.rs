use std::fs;
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use tempfile::TempDir;

use quote_intake::model::{NewQuote, QuoteId, ServiceType};
use quote_intake::records::sqlite_store::SQLiteRecordStore;
use quote_intake::service::purge::{PurgeJob, PurgeOutcome, PurgeRequest};
use quote_intake::service::quote_service::{ImageUpload, QuoteService};
use quote_intake::storage::local_store::LocalFileStorage;
use quote_intake::storage::UploadLayout;

struct Fixture {
    _temp: TempDir,
    layout: UploadLayout,
    service: Arc<QuoteService>,
    job: PurgeJob,
}

fn fixture() -> Fixture {
    let temp = TempDir::new().unwrap();
    let layout = UploadLayout::new(temp.path().join("media"), "quotes");
    let storage = Arc::new(LocalFileStorage::new(layout.clone()).unwrap());
    let records = Arc::new(SQLiteRecordStore::open(&temp.path().join("quotes.db"), false).unwrap());
    fs::create_dir_all(layout.root()).unwrap();
    let service = Arc::new(QuoteService::new(records, storage, &layout));
    let job = PurgeJob::new(service.clone(), layout.clone());
    Fixture { _temp: temp, layout, service, job }
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap()
}

fn submit(fixture: &Fixture, name: &str, created_at: DateTime<Utc>, image: Option<&str>) -> QuoteId {
    let quote = NewQuote {
        first_name: name.to_string(),
        last_name: "Customer".to_string(),
        email: "someone@example.com".to_string(),
        phone: Some("555-0123".to_string()),
        service_address: "7 Elm St".to_string(),
        service_type: ServiceType::Construction,
        description: "Bricks".to_string(),
    };
    let upload = image.map(|name| ImageUpload::new(name, name.as_bytes().to_vec()));
    fixture.service.submit_at(&quote, upload.as_ref(), created_at).unwrap().id
}

fn remaining(fixture: &Fixture) -> Vec<QuoteId> {
    let mut ids: Vec<_> = fixture.service.list().unwrap().into_iter().map(|q| q.id).collect();
    ids.sort();
    ids
}

#[test]
fn test_days_cutoff_keeps_newer_records() {
    let fixture = fixture();
    let three_days = submit(&fixture, "Old", now() - Duration::days(3), Some("old.jpg"));
    let one_day = submit(&fixture, "Recent", now() - Duration::days(1), None);
    let today = submit(&fixture, "Today", now(), None);

    let outcome = fixture.job.run_at(&PurgeRequest::new(Some(2), None), now()).unwrap();

    assert_eq!(outcome, PurgeOutcome::deleted(1));
    assert_eq!(remaining(&fixture), vec![one_day, today]);
    assert!(fixture.service.records().find(three_days).unwrap().is_none());
    assert!(!fixture.layout.root().join("2024").exists());
}

#[test]
fn test_missing_cutoff_is_reported_not_executed() {
    let fixture = fixture();
    let ancient = submit(&fixture, "Ancient", now() - Duration::days(400), Some("a.jpg"));

    let outcome = fixture.job.run_at(&PurgeRequest::default(), now()).unwrap();

    assert_eq!(outcome, PurgeOutcome::no_cutoff());
    assert_eq!(
        serde_json::to_string(&outcome).unwrap(),
        r#"{"deleted":0,"reason":"no_cutoff_provided"}"#
    );
    assert_eq!(remaining(&fixture), vec![ancient]);
}

#[test]
fn test_days_and_minutes_add_up() {
    let fixture = fixture();
    let older = submit(&fixture, "TwentyFive", now() - Duration::hours(25), None);
    let newer = submit(&fixture, "TwentyThree", now() - Duration::hours(23), None);

    let outcome = fixture.job.run_at(&PurgeRequest::new(Some(1), Some(30)), now()).unwrap();

    assert_eq!(outcome, PurgeOutcome::deleted(1));
    assert_eq!(remaining(&fixture), vec![newer]);
    assert!(fixture.service.records().find(older).unwrap().is_none());
}

#[test]
fn test_boundary_record_is_purged() {
    let fixture = fixture();
    let at_cutoff = submit(&fixture, "Edge", now() - Duration::minutes(90), None);
    let just_after = submit(&fixture, "Inside", now() - Duration::minutes(89), None);

    let outcome = fixture.job.run_at(&PurgeRequest::new(None, Some(90)), now()).unwrap();

    assert_eq!(outcome, PurgeOutcome::deleted(1));
    assert_eq!(remaining(&fixture), vec![just_after]);
    assert!(fixture.service.records().find(at_cutoff).unwrap().is_none());
}

#[test]
fn test_purge_removes_images_and_emptied_directories() {
    let fixture = fixture();
    let root = fixture.layout.root();
    let march = Utc.with_ymd_and_hms(2024, 3, 5, 8, 0, 0).unwrap();
    let april = Utc.with_ymd_and_hms(2024, 4, 5, 8, 0, 0).unwrap();

    submit(&fixture, "MarchA", march, Some("a.jpg"));
    submit(&fixture, "MarchB", march + Duration::hours(2), Some("b.jpg"));
    submit(&fixture, "April", april, Some("c.jpg"));
    let keeper = submit(&fixture, "Keeper", now(), Some("d.jpg"));

    assert!(root.join("2024/03").is_dir());
    assert!(root.join("2024/04").is_dir());

    let outcome = fixture.job.run_at(&PurgeRequest::new(Some(30), None), now()).unwrap();

    assert_eq!(outcome, PurgeOutcome::deleted(3));
    assert_eq!(remaining(&fixture), vec![keeper]);
    assert!(!root.join("2024/03").exists());
    assert!(!root.join("2024/04").exists());
    assert!(root.join("2024/06").is_dir(), "directory of the kept image must stay");
    assert!(root.is_dir());
}

#[test]
fn test_purge_tolerates_already_missing_files_and_directories() {
    let fixture = fixture();
    let root = fixture.layout.root();
    let may = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();

    submit(&fixture, "Gone", may, Some("gone.jpg"));
    submit(&fixture, "AlsoGone", may, Some("also.jpg"));
    fs::remove_dir_all(root.join("2024")).unwrap();

    let outcome = fixture.job.run_at(&PurgeRequest::new(Some(7), None), now()).unwrap();

    assert_eq!(outcome, PurgeOutcome::deleted(2));
    assert!(remaining(&fixture).is_empty());
    assert!(root.is_dir());
}

#[test]
fn test_second_run_is_a_no_op() {
    let fixture = fixture();
    submit(&fixture, "Once", now() - Duration::days(10), Some("once.jpg"));

    let request = PurgeRequest::new(Some(5), None);
    assert_eq!(fixture.job.run_at(&request, now()).unwrap(), PurgeOutcome::deleted(1));
    assert_eq!(fixture.job.run_at(&request, now()).unwrap(), PurgeOutcome::deleted(0));
}
