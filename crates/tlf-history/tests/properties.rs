//! Property-based tests for the history merge.
//!
//! These tests verify:
//!  - Order independence: batching and interleaving do not change the result
//!  - Idempotence: re-delivered notifications do not change the result
//!  - Bounds: limits hold and under-filled writers are always reported

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tlf_history::{TlfHistory, MAX_EDITS_PER_WRITER, MAX_WRITERS_PER_HISTORY};
use tlf_notify::{codec, NotificationMessage, NotificationOpType, Revision};

const WRITERS: [&str; 4] = ["alice", "bob", "carol", "dave"];

#[derive(Clone, Debug)]
struct Event {
    writer: usize,
    op: NotificationOpType,
    file: usize,
    other_file: usize,
}

fn event_strategy() -> impl Strategy<Value = Event> {
    let op = prop_oneof![
        4 => Just(NotificationOpType::Create),
        3 => Just(NotificationOpType::Modify),
        1 => Just(NotificationOpType::Rename),
        1 => Just(NotificationOpType::Delete),
    ];
    (0..WRITERS.len(), op, 0usize..8, 0usize..8).prop_map(|(writer, op, file, other_file)| Event {
        writer,
        op,
        file,
        other_file,
    })
}

/// Revisions are groups of events by one writer; returns (writer, batch).
fn encode_revisions(revisions: &[Vec<Event>]) -> Vec<(&'static str, String)> {
    revisions
        .iter()
        .enumerate()
        .filter(|(_, events)| !events.is_empty())
        .map(|(i, events)| {
            let rev = i as Revision + 1;
            let writer = WRITERS[events[0].writer];
            let ts = Utc.timestamp_opt(1_600_000_000 + rev, 0).unwrap();
            let batch: Vec<NotificationMessage> = events
                .iter()
                .map(|e| {
                    let msg = NotificationMessage::new(rev, format!("f{}", e.file), e.op, "tlf", writer, ts);
                    if e.op == NotificationOpType::Rename {
                        msg.with_rename_from(format!("f{}", e.other_file))
                    } else {
                        msg
                    }
                })
                .collect();
            (writer, codec::encode(&batch).unwrap())
        })
        .collect()
}

fn revisions_strategy() -> impl Strategy<Value = Vec<Vec<Event>>> {
    prop::collection::vec(prop::collection::vec(event_strategy(), 1..4), 1..40).prop_map(|revs| {
        // Every event in a revision belongs to the revision's first writer.
        revs.into_iter()
            .map(|events| {
                let writer = events[0].writer;
                events.into_iter().map(|e| Event { writer, ..e }).collect()
            })
            .collect()
    })
}

fn ingest_per_writer(batches: &[(&'static str, String)]) -> TlfHistory {
    let th = TlfHistory::new();
    for writer in WRITERS {
        let mine: Vec<&String> = batches
            .iter()
            .filter(|(w, _)| *w == writer)
            .map(|(_, b)| b)
            .collect();
        th.ingest(writer, &mine).unwrap();
    }
    th
}

proptest! {
    #[test]
    fn merge_is_order_independent(revisions in revisions_strategy(), seed in any::<u64>()) {
        let batches = encode_revisions(&revisions);
        let baseline = ingest_per_writer(&batches);
        let baseline_needs = baseline.recompute();

        let mut shuffled = batches.clone();
        shuffled.shuffle(&mut StdRng::seed_from_u64(seed));
        let th = TlfHistory::new();
        for (writer, batch) in &shuffled {
            th.ingest(writer, &[batch]).unwrap();
        }
        let needs = th.recompute();

        let merged = th.get_history();
        let expected = baseline.get_history();
        prop_assert_eq!(&*merged, &*expected);
        prop_assert_eq!(needs, baseline_needs);
    }

    #[test]
    fn redelivery_is_idempotent(revisions in revisions_strategy()) {
        let batches = encode_revisions(&revisions);
        let th = ingest_per_writer(&batches);
        th.recompute();
        let before = th.get_history();

        for (writer, batch) in &batches {
            th.ingest(writer, &[batch]).unwrap();
        }
        th.recompute();
        let after = th.get_history();
        prop_assert_eq!(&*after, &*before);
    }

    #[test]
    fn limits_and_backfill_signal_hold(revisions in revisions_strategy()) {
        let batches = encode_revisions(&revisions);
        let th = ingest_per_writer(&batches);
        let needs = th.recompute();
        let history = th.get_history();

        prop_assert!(history.len() <= MAX_WRITERS_PER_HISTORY);
        for writer in history.iter() {
            prop_assert!(!writer.edits.is_empty());
            prop_assert!(writer.edits.len() <= MAX_EDITS_PER_WRITER);
            if writer.edits.len() < MAX_EDITS_PER_WRITER {
                prop_assert!(needs.contains(&writer.writer_name));
            }
            // Newest first, one entry per file.
            for pair in writer.edits.windows(2) {
                prop_assert!(pair[0].sort_key() > pair[1].sort_key());
            }
            let mut names: Vec<&str> = writer.edits.iter().map(|n| n.filename.as_str()).collect();
            names.sort();
            names.dedup();
            prop_assert_eq!(names.len(), writer.edits.len());
        }
        for pair in history.windows(2) {
            prop_assert!(pair[0].edits[0].sort_key() >= pair[1].edits[0].sort_key());
        }
    }
}

#[test]
fn deleted_files_never_surface() {
    let ts = Utc.timestamp_opt(1_600_000_000, 0).unwrap();
    let th = TlfHistory::new();
    for (rev, writer) in [(1, "alice"), (2, "bob"), (3, "carol")] {
        let create = NotificationMessage::new(rev, "shared", NotificationOpType::Create, "tlf", writer, ts);
        th.ingest(writer, &[codec::encode(&[create]).unwrap()]).unwrap();
    }
    let delete = NotificationMessage::new(4, "shared", NotificationOpType::Delete, "tlf", "dave", ts);
    th.ingest("dave", &[codec::encode(&[delete]).unwrap()]).unwrap();

    let needs = th.recompute();
    assert!(th.get_history().is_empty());
    assert_eq!(needs.len(), 4);
}
