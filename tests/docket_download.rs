//! End-to-end docket downloads against an in-memory bucket

mod common;

use std::sync::Arc;

use common::*;
use docket_dl::{Dataset, Error, GroupTally, PreconditionError};
use tempfile::tempdir;

fn dataset() -> Dataset {
    Dataset::new(AGENCY, DOCKET_ID).unwrap()
}

#[tokio::test]
async fn scenario_downloads_every_text_and_derived_file() {
    let dir = tempdir().unwrap();
    let shape = DocketShape::scenario();
    let store = Arc::new(docket_store(shape));
    let (downloader, output) =
        create_test_downloader(store.clone(), test_config(dir.path(), false));

    let summary = downloader.download(&dataset()).await.unwrap();

    assert_eq!(summary.text, GroupTally { done: 14, total: 14 });
    assert_eq!(summary.binary, None);
    assert_eq!(summary.workers, 8);
    assert_eq!(store.fetched(), 14);

    let docket_dir = dir.path().join(DOCKET_ID);
    assert_eq!(files_under(&docket_dir).len(), shape.text_total());
    assert_eq!(count_files(&docket_dir, "raw-data/docket"), 3);
    assert_eq!(count_files(&docket_dir, "raw-data/documents"), 5);
    assert_eq!(count_files(&docket_dir, "raw-data/comments"), 2);
    assert_eq!(count_files(&docket_dir, "derived-data"), 4);
    assert_file_contents(
        &docket_dir.join(format!("raw-data/documents/{DOCKET_ID}-0004.json")),
        "{\"document\": 4}",
    );

    let console = output.contents();
    assert!(console.starts_with("Preparing download lists...\n"));
    for line in ["docket: 3\n", "documents: 5\n", "comments: 2\n", "derived: 4\n"] {
        assert!(console.contains(line), "missing {line:?} in {console:?}");
    }
    assert!(console.contains("Download finished. Text: 14/14\n"));
    assert!(console.contains(&format!("All files for docket {DOCKET_ID} have been downloaded to")));
    assert!(summary.output_dir.is_absolute());
    assert!(summary.output_dir.ends_with(DOCKET_ID));
}

#[tokio::test]
async fn include_binary_without_binary_data_matches_text_only_run() {
    let dir = tempdir().unwrap();
    let store = Arc::new(docket_store(DocketShape::scenario()));
    let (downloader, output) = create_test_downloader(store.clone(), test_config(dir.path(), true));

    let summary = downloader.download(&dataset()).await.unwrap();

    assert_eq!(summary.text, GroupTally { done: 14, total: 14 });
    assert_eq!(summary.binary, None);
    assert_eq!(files_under(&dir.path().join(DOCKET_ID)).len(), 14);
    assert!(!output.contents().contains("Bin:"));
}

#[tokio::test]
async fn binary_attachments_are_downloaded_when_requested() {
    let dir = tempdir().unwrap();
    let shape = DocketShape {
        binary: 6,
        ..DocketShape::scenario()
    };
    let store = Arc::new(docket_store(shape));
    let (downloader, output) = create_test_downloader(store.clone(), test_config(dir.path(), true));

    let summary = downloader.download(&dataset()).await.unwrap();

    assert_eq!(summary.binary, Some(GroupTally { done: 6, total: 6 }));
    assert_eq!(summary.files(), 20);

    let docket_dir = dir.path().join(DOCKET_ID);
    assert_eq!(
        count_files(&docket_dir, &format!("raw-data/binary-{DOCKET_ID}/comments_attachments")),
        6
    );

    let console = output.contents();
    assert!(console.contains("binary: 6\n"));
    assert!(console.contains("Download finished. Text: 14/14 | Bin: 6/6\n"));
}

#[tokio::test]
async fn one_failed_transfer_fails_the_run() {
    let dir = tempdir().unwrap();
    let bad = format!("raw-data/{AGENCY}/{DOCKET_ID}/text-{DOCKET_ID}/documents/{DOCKET_ID}-0002.json");
    let store = Arc::new(docket_store(DocketShape::scenario()).fail_on(bad.clone()));
    let (downloader, output) = create_test_downloader(store, test_config(dir.path(), false));

    let err = downloader.download(&dataset()).await.unwrap_err();

    match &err {
        Error::Transfer { key, .. } => assert_eq!(key, &bad),
        other => panic!("expected a transfer error, got {other:?}"),
    }
    assert!(err.to_string().contains(&bad));
    assert!(!output.contents().contains("Download finished"));
    assert!(!dir
        .path()
        .join(DOCKET_ID)
        .join(format!("raw-data/documents/{DOCKET_ID}-0002.json"))
        .exists());
}

#[tokio::test]
async fn missing_output_tree_is_created_on_demand() {
    let dir = tempdir().unwrap();
    let nested = dir.path().join("does/not/exist/yet");
    let store = Arc::new(docket_store(DocketShape::scenario()));
    let (downloader, _output) = create_test_downloader(store, test_config(&nested, false));

    let summary = downloader.download(&dataset()).await.unwrap();

    assert_eq!(summary.text.done, 14);
    assert_eq!(files_under(&nested.join(DOCKET_ID)).len(), 14);
}

#[tokio::test]
async fn rerunning_overwrites_in_place() {
    let dir = tempdir().unwrap();
    let store = Arc::new(docket_store(DocketShape::scenario()));
    let (downloader, _output) = create_test_downloader(store.clone(), test_config(dir.path(), false));

    downloader.download(&dataset()).await.unwrap();
    downloader.download(&dataset()).await.unwrap();

    assert_eq!(store.fetched(), 28);
    assert_eq!(files_under(&dir.path().join(DOCKET_ID)).len(), 14);
}

#[tokio::test]
async fn unknown_docket_is_a_precondition_failure() {
    let dir = tempdir().unwrap();
    let store = Arc::new(docket_store(DocketShape::scenario()));
    let (downloader, output) = create_test_downloader(store, test_config(dir.path(), false));

    let other = Dataset::new(AGENCY, "EPA-HQ-OW-1999-9999").unwrap();
    let err = downloader.download(&other).await.unwrap_err();

    assert!(matches!(
        err,
        Error::Precondition(PreconditionError::DocketNotFound { .. })
    ));
    assert_eq!(
        err.to_string(),
        "Docket EPA-HQ-OW-1999-9999 for agency EPA not found in S3 bucket."
    );
    assert!(output.contents().is_empty());
    assert!(files_under(dir.path()).is_empty());
}

#[tokio::test]
async fn docket_without_derived_data_is_rejected() {
    let dir = tempdir().unwrap();
    let shape = DocketShape {
        derived: 0,
        ..DocketShape::scenario()
    };
    let store = Arc::new(docket_store(shape));
    let (downloader, _output) = create_test_downloader(store.clone(), test_config(dir.path(), false));

    let err = downloader.download(&dataset()).await.unwrap_err();

    assert!(matches!(
        err,
        Error::Precondition(PreconditionError::DerivedDataNotFound { .. })
    ));
    assert_eq!(store.fetched(), 0);
}
