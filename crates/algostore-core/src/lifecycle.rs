//! Algorithm status state machine
//!
//! Recomputes an algorithm's status from its full sibling set of reviews.
//! Pure functions: the review service feeds them a fresh read of the
//! sibling set at decision time (never a cached count), so concurrent
//! verdicts by distinct reviewers converge to the same final status
//! regardless of interleaving.
//!
//! Transition table:
//!
//! | Event          | Condition                           | New status                 |
//! |----------------|-------------------------------------|----------------------------|
//! | review created | review not finished                 | UnderReview                |
//! | approved       | all non-Dropped siblings Approved   | Approved (digest frozen)   |
//! | approved       | a sibling still UnderReview         | unchanged                  |
//! | rejected       | —                                   | Rejected, siblings Dropped |
//! | deleted        | it was the only review              | AwaitingReviewerAssignment |
//! | deleted        | remaining all Approved              | Approved                   |
//! | deleted        | otherwise                           | unchanged                  |
//! | deleted        | algorithm already Approved          | error, no mutation         |

use algostore_state::{AlgorithmStatus, ReviewRecord, ReviewStatus};

/// Consensus check: every non-Dropped review is Approved and at least one
/// review carries an approval.
pub fn all_reviews_approved(reviews: &[ReviewRecord]) -> bool {
    let mut any_approved = false;
    for review in reviews {
        match review.status {
            ReviewStatus::Approved => any_approved = true,
            ReviewStatus::Dropped => {}
            ReviewStatus::UnderReview | ReviewStatus::Rejected => return false,
        }
    }
    any_approved
}

/// Status an unfinished algorithm takes after one of its reviews is
/// deleted, given the remaining sibling set. `None` means unchanged.
pub fn status_after_delete(remaining: &[ReviewRecord]) -> Option<AlgorithmStatus> {
    if remaining.is_empty() {
        // the only review was deleted, new reviewers must be assigned
        Some(AlgorithmStatus::AwaitingReviewerAssignment)
    } else if remaining
        .iter()
        .all(|r| r.status == ReviewStatus::Approved)
    {
        // the deleted review was the last one blocking approval
        Some(AlgorithmStatus::Approved)
    } else {
        None
    }
}

/// Sibling reviews that must be dropped when one review rejects: every
/// other pending or approved review. A rejected algorithm keeps no live
/// sibling verdicts, so a later action on them cannot reopen the decision.
pub fn reviews_to_drop<'a>(
    siblings: &'a [ReviewRecord],
    rejected: &ReviewRecord,
) -> Vec<&'a ReviewRecord> {
    siblings
        .iter()
        .filter(|r| {
            r.id != rejected.id
                && matches!(
                    r.status,
                    ReviewStatus::UnderReview | ReviewStatus::Approved
                )
        })
        .collect()
}
