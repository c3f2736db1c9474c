//! Integration tests for the capture pass
//!
//! Drives full passes (lock, capture, dedup, rollback, eviction) through the
//! public daemon API with an in-memory clipboard, then inspects the cache
//! directory on disk.

mod helpers;

use clipcache::daemon::CaptureOutcome;
use clipcache::history::{summary, Selection};
use helpers::fakes::{blob_ids, summaries, test_daemon};

#[tokio::test]
async fn test_new_content_produces_one_blob_and_one_line() {
    let (mut daemon, _temp) = test_daemon(|_| {});
    daemon.clipboard().set("clipboard", "first clip");

    let report = daemon.run_pass().await.unwrap();
    assert_eq!(report.stored(), 1);

    let lines = summaries(&daemon, "clipboard");
    assert_eq!(lines, vec!["first clip"]);

    let blobs = blob_ids(daemon.config().cache_dir());
    assert_eq!(blobs, vec![summary::blob_id("first clip")]);
    assert_eq!(
        std::fs::read(daemon.cache().store().path(&blobs[0])).unwrap(),
        b"first clip"
    );
}

#[tokio::test]
async fn test_repeated_content_is_idempotent() {
    let (mut daemon, _temp) = test_daemon(|_| {});
    daemon.clipboard().set("clipboard", "again");

    daemon.run_pass().await.unwrap();
    let report = daemon.run_pass().await.unwrap();

    assert_eq!(
        report.outcome(&Selection::clipboard()),
        Some(&CaptureOutcome::Unchanged)
    );
    assert_eq!(summaries(&daemon, "clipboard").len(), 1);
    assert_eq!(blob_ids(daemon.config().cache_dir()).len(), 1);
}

#[tokio::test]
async fn test_prefix_capture_rolls_back_fragment() {
    let (mut daemon, _temp) = test_daemon(|_| {});

    daemon.clipboard().set("clipboard", "ab");
    daemon.run_pass().await.unwrap();
    let fragment_blob = summary::blob_id("ab");
    assert!(daemon.cache().store().exists(&fragment_blob));

    daemon.clipboard().set("clipboard", "abc");
    daemon.run_pass().await.unwrap();

    assert_eq!(summaries(&daemon, "clipboard"), vec!["abc"]);
    assert!(!daemon.cache().store().exists(&fragment_blob));
    assert_eq!(
        blob_ids(daemon.config().cache_dir()),
        vec![summary::blob_id("abc")]
    );
}

#[tokio::test]
async fn test_max_clips_evicts_oldest() {
    let (mut daemon, _temp) = test_daemon(|config| {
        config.max_clips = 3;
        config.selections = vec![Selection::clipboard()];
    });

    for clip in ["one", "two", "three", "four", "five"] {
        daemon.clipboard().set("clipboard", clip);
        daemon.run_pass().await.unwrap();
    }

    assert_eq!(
        summaries(&daemon, "clipboard"),
        vec!["three", "four", "five"]
    );

    let mut expected: Vec<String> = ["three", "four", "five"]
        .iter()
        .map(|s| summary::blob_id(s))
        .collect();
    expected.sort();
    assert_eq!(blob_ids(daemon.config().cache_dir()), expected);
}

#[tokio::test]
async fn test_unlimited_history_keeps_everything() {
    let (mut daemon, _temp) = test_daemon(|config| {
        config.max_clips = 0;
        config.selections = vec![Selection::clipboard()];
    });

    for i in 0..20 {
        daemon.clipboard().set("clipboard", &format!("clip number {}", i));
        let report = daemon.run_pass().await.unwrap();
        assert_eq!(report.evicted, 0);
    }
    assert_eq!(summaries(&daemon, "clipboard").len(), 20);
}

#[tokio::test]
async fn test_same_content_on_two_selections_stored_once() {
    let (mut daemon, _temp) = test_daemon(|_| {});
    daemon.clipboard().set("clipboard", "broadcast");
    daemon.clipboard().set("primary", "broadcast");

    let report = daemon.run_pass().await.unwrap();

    assert!(matches!(
        report.outcome(&Selection::clipboard()),
        Some(CaptureOutcome::Stored { .. })
    ));
    assert!(matches!(
        report.outcome(&Selection::primary()),
        Some(CaptureOutcome::Duplicate { .. })
    ));
    assert_eq!(summaries(&daemon, "clipboard"), vec!["broadcast"]);
    assert!(summaries(&daemon, "primary").is_empty());
    assert_eq!(blob_ids(daemon.config().cache_dir()).len(), 1);
}

#[tokio::test]
async fn test_processing_order_decides_owner_of_shared_content() {
    let (mut daemon, _temp) = test_daemon(|config| {
        config.selections = vec![Selection::primary(), Selection::clipboard()];
    });
    daemon.clipboard().set("clipboard", "broadcast");
    daemon.clipboard().set("primary", "broadcast");

    daemon.run_pass().await.unwrap();

    assert_eq!(summaries(&daemon, "primary"), vec!["broadcast"]);
    assert!(summaries(&daemon, "clipboard").is_empty());
}

#[tokio::test]
async fn test_blank_content_never_recorded() {
    let (mut daemon, _temp) = test_daemon(|_| {});

    daemon.clipboard().set("clipboard", "real");
    daemon.run_pass().await.unwrap();

    for blank in ["", "   ", "\n\n\t"] {
        daemon.clipboard().set("clipboard", blank);
        daemon.clipboard().set("primary", blank);
        let report = daemon.run_pass().await.unwrap();
        assert_eq!(
            report.outcome(&Selection::clipboard()),
            Some(&CaptureOutcome::Blank)
        );
    }

    assert_eq!(summaries(&daemon, "clipboard"), vec!["real"]);
    assert!(summaries(&daemon, "primary").is_empty());
    assert_eq!(blob_ids(daemon.config().cache_dir()).len(), 1);
}

#[tokio::test]
async fn test_end_to_end_hello_world() {
    let (mut daemon, _temp) = test_daemon(|config| {
        config.max_clips = 1000;
        config.selections = vec![Selection::clipboard(), Selection::primary()];
    });

    daemon.clipboard().set("clipboard", "hello");
    daemon.run_pass().await.unwrap();
    assert_eq!(summaries(&daemon, "clipboard"), vec!["hello"]);
    assert_eq!(blob_ids(daemon.config().cache_dir()).len(), 1);

    daemon.clipboard().set("clipboard", "hello world");
    let report = daemon.run_pass().await.unwrap();
    assert!(report
        .outcome(&Selection::clipboard())
        .is_some_and(|o| o.rolled_back()));

    assert_eq!(summaries(&daemon, "clipboard"), vec!["hello world"]);
    assert_eq!(
        blob_ids(daemon.config().cache_dir()),
        vec![summary::blob_id("hello world")]
    );
}

#[tokio::test]
async fn test_multiline_summary_and_index_line_format() {
    let (mut daemon, _temp) = test_daemon(|_| {});
    daemon
        .clipboard()
        .set("clipboard", "\n  \nfn main() {\n    println!(\"hi\");\n}\n");
    daemon.run_pass().await.unwrap();

    let log = daemon.cache().log(&Selection::clipboard()).unwrap();
    let raw = std::fs::read_to_string(log.path()).unwrap();
    let (timestamp, rest) = raw.split_once(' ').unwrap();
    assert!(timestamp.parse::<u64>().is_ok());
    assert_eq!(rest, "fn main() { (5 lines)\n");
}

#[tokio::test]
async fn test_eviction_deletes_blob_of_cr_terminated_clip() {
    let (mut daemon, _temp) = test_daemon(|config| {
        config.max_clips = 1;
        config.selections = vec![Selection::clipboard()];
    });

    daemon.clipboard().set("clipboard", "abc\r");
    daemon.run_pass().await.unwrap();
    daemon.clipboard().set("clipboard", "xyz");
    daemon.run_pass().await.unwrap();

    assert_eq!(summaries(&daemon, "clipboard"), vec!["xyz"]);
    assert_eq!(
        blob_ids(daemon.config().cache_dir()),
        vec![summary::blob_id("xyz")]
    );
}
