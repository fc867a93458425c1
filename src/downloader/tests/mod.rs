use super::test_helpers::*;
use super::*;
use crate::types::{CollectionOutcome, DownloadSummary, SkipReason};

mod updates;

/// Unwrap a completed outcome
fn completed(outcome: CollectionOutcome) -> DownloadSummary {
    match outcome {
        CollectionOutcome::Completed(summary) => summary,
        other => panic!("expected a completed collection, got {:?}", other),
    }
}
