//! Review lifecycle integration tests
//!
//! Drives the review service against the in-memory stores and verifies the
//! consensus state machine: who may review what and when, and how the
//! algorithm status follows review create/approve/reject/delete events.

use std::sync::Arc;

use algostore_core::{
    AlgorithmRecord, AlgorithmStatus, Principal, ReviewService, ReviewStatus, StoreConfig,
    StoreError,
};
use algostore_state::fakes::{MemoryAlgorithmStore, MemoryReviewStore};
use algostore_state::{AlgorithmStore, ImageDigest, ReviewFilter, ReviewStore};

struct Fixture {
    algorithms: Arc<MemoryAlgorithmStore>,
    reviews: Arc<MemoryReviewStore>,
    service: ReviewService,
}

fn fixture() -> Fixture {
    fixture_with_config(StoreConfig::default())
}

fn fixture_with_config(config: StoreConfig) -> Fixture {
    let algorithms = Arc::new(MemoryAlgorithmStore::new());
    let reviews = Arc::new(MemoryReviewStore::new());
    let service = ReviewService::new(algorithms.clone(), reviews.clone(), config);
    Fixture {
        algorithms,
        reviews,
        service,
    }
}

/// Register an algorithm whose digest has already been resolved.
async fn registered_algorithm(fx: &Fixture, developer: &Principal) -> AlgorithmRecord {
    let mut record = AlgorithmRecord::new("registry.example.com/demo/average:v1", developer.id.clone());
    record.digest = Some(ImageDigest::from_bytes(b"resolved manifest"));
    fx.algorithms.save(&record).await.unwrap();
    record
}

/// Register an algorithm whose digest resolution has not completed yet.
async fn unresolved_algorithm(fx: &Fixture, developer: &Principal) -> AlgorithmRecord {
    let record = AlgorithmRecord::new("registry.example.com/demo/average:v1", developer.id.clone());
    fx.algorithms.save(&record).await.unwrap();
    record
}

// ===========================================================================
// Review creation preconditions
// ===========================================================================

#[tokio::test]
async fn create_review_moves_algorithm_under_review() {
    let fx = fixture();
    let dev = Principal::new("dev");
    let algorithm = registered_algorithm(&fx, &dev).await;

    let review = fx
        .service
        .create_review(&algorithm.id, &Principal::reviewer("r1"))
        .await
        .unwrap();

    assert_eq!(review.status, ReviewStatus::UnderReview);
    let algorithm = fx.algorithms.get(&algorithm.id).await.unwrap().unwrap();
    assert_eq!(algorithm.status, AlgorithmStatus::UnderReview);
}

#[tokio::test]
async fn create_review_rejects_non_reviewer() {
    let fx = fixture();
    let algorithm = registered_algorithm(&fx, &Principal::new("dev")).await;

    let err = fx
        .service
        .create_review(&algorithm.id, &Principal::new("not-a-reviewer"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::ReviewConflict(_)));

    // no mutation happened
    let algorithm = fx.algorithms.get(&algorithm.id).await.unwrap().unwrap();
    assert_eq!(algorithm.status, AlgorithmStatus::AwaitingReviewerAssignment);
    assert!(fx
        .reviews
        .list(&ReviewFilter::for_algorithm(&algorithm.id))
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn create_review_rejects_developer_self_review() {
    let fx = fixture();
    let dev = Principal::reviewer("dev");
    let algorithm = registered_algorithm(&fx, &dev).await;

    let err = fx
        .service
        .create_review(&algorithm.id, &dev)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::ReviewConflict(_)));
}

#[tokio::test]
async fn self_review_allowed_with_override_flag() {
    let fx = fixture_with_config(StoreConfig::default().with_review_own_algorithm(true));
    let dev = Principal::reviewer("dev");
    let algorithm = registered_algorithm(&fx, &dev).await;

    assert!(fx.service.create_review(&algorithm.id, &dev).await.is_ok());
}

#[tokio::test]
async fn create_review_rejects_duplicate_reviewer() {
    let fx = fixture();
    let algorithm = registered_algorithm(&fx, &Principal::new("dev")).await;
    let reviewer = Principal::reviewer("r1");

    fx.service
        .create_review(&algorithm.id, &reviewer)
        .await
        .unwrap();
    let err = fx
        .service
        .create_review(&algorithm.id, &reviewer)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::ReviewConflict(_)));
}

#[tokio::test]
async fn create_review_rejects_finished_algorithm() {
    let fx = fixture();
    let algorithm = registered_algorithm(&fx, &Principal::new("dev")).await;
    let r1 = Principal::reviewer("r1");

    let review = fx.service.create_review(&algorithm.id, &r1).await.unwrap();
    fx.service
        .approve_review(&review.id, &r1, None)
        .await
        .unwrap();

    let err = fx
        .service
        .create_review(&algorithm.id, &Principal::reviewer("r2"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::AlgorithmAlreadyReviewed(_)));
}

// ===========================================================================
// Approvals
// ===========================================================================

#[tokio::test]
async fn sole_approval_approves_algorithm() {
    let fx = fixture();
    let algorithm = registered_algorithm(&fx, &Principal::new("dev")).await;
    let r1 = Principal::reviewer("r1");

    let review = fx.service.create_review(&algorithm.id, &r1).await.unwrap();
    let review = fx
        .service
        .approve_review(&review.id, &r1, Some("looks good".to_string()))
        .await
        .unwrap();

    assert_eq!(review.status, ReviewStatus::Approved);
    assert_eq!(review.comment.as_deref(), Some("looks good"));
    let algorithm = fx.algorithms.get(&algorithm.id).await.unwrap().unwrap();
    assert_eq!(algorithm.status, AlgorithmStatus::Approved);
    // approved entries always carry a content identity
    assert!(algorithm.digest.is_some());
}

#[tokio::test]
async fn partial_approval_stays_under_review() {
    let fx = fixture();
    let algorithm = registered_algorithm(&fx, &Principal::new("dev")).await;
    let r1 = Principal::reviewer("r1");
    let r2 = Principal::reviewer("r2");

    let first = fx.service.create_review(&algorithm.id, &r1).await.unwrap();
    fx.service.create_review(&algorithm.id, &r2).await.unwrap();
    fx.service.approve_review(&first.id, &r1, None).await.unwrap();

    let algorithm = fx.algorithms.get(&algorithm.id).await.unwrap().unwrap();
    assert_eq!(algorithm.status, AlgorithmStatus::UnderReview);
}

#[tokio::test]
async fn approval_order_does_not_matter() {
    // approving N assigned reviews in any order yields Approved
    for order in [[0usize, 1, 2], [2, 0, 1], [1, 2, 0]] {
        let fx = fixture();
        let algorithm = registered_algorithm(&fx, &Principal::new("dev")).await;
        let reviewers = [
            Principal::reviewer("r1"),
            Principal::reviewer("r2"),
            Principal::reviewer("r3"),
        ];
        let mut review_ids = Vec::new();
        for reviewer in &reviewers {
            let review = fx
                .service
                .create_review(&algorithm.id, reviewer)
                .await
                .unwrap();
            review_ids.push(review.id);
        }

        for &idx in &order {
            fx.service
                .approve_review(&review_ids[idx], &reviewers[idx], None)
                .await
                .unwrap();
        }

        let algorithm = fx.algorithms.get(&algorithm.id).await.unwrap().unwrap();
        assert_eq!(algorithm.status, AlgorithmStatus::Approved);
    }
}

#[tokio::test]
async fn approval_requires_assignment() {
    let fx = fixture();
    let algorithm = registered_algorithm(&fx, &Principal::new("dev")).await;
    let r1 = Principal::reviewer("r1");

    let review = fx.service.create_review(&algorithm.id, &r1).await.unwrap();
    let err = fx
        .service
        .approve_review(&review.id, &Principal::reviewer("someone-else"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::ReviewConflict(_)));
}

#[tokio::test]
async fn finished_review_cannot_be_approved_again() {
    let fx = fixture();
    let algorithm = registered_algorithm(&fx, &Principal::new("dev")).await;
    let r1 = Principal::reviewer("r1");

    let review = fx.service.create_review(&algorithm.id, &r1).await.unwrap();
    fx.service.approve_review(&review.id, &r1, None).await.unwrap();
    let err = fx
        .service
        .approve_review(&review.id, &r1, None)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::ReviewConflict(_)));
}

#[tokio::test]
async fn final_approval_refused_while_digest_unresolved() {
    let fx = fixture();
    let algorithm = unresolved_algorithm(&fx, &Principal::new("dev")).await;
    let r1 = Principal::reviewer("r1");

    let review = fx.service.create_review(&algorithm.id, &r1).await.unwrap();
    let err = fx
        .service
        .approve_review(&review.id, &r1, None)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::DigestUnresolved(_)));

    // all-or-nothing: the review itself was not mutated either
    let review = fx.reviews.get(&review.id).await.unwrap().unwrap();
    assert_eq!(review.status, ReviewStatus::UnderReview);
}

// ===========================================================================
// Rejections
// ===========================================================================

#[tokio::test]
async fn rejection_closes_algorithm_and_drops_siblings() {
    // R1 approves, R2 rejects: algorithm Rejected, R1's review Dropped
    let fx = fixture();
    let algorithm = registered_algorithm(&fx, &Principal::new("dev")).await;
    let r1 = Principal::reviewer("r1");
    let r2 = Principal::reviewer("r2");

    let first = fx.service.create_review(&algorithm.id, &r1).await.unwrap();
    let second = fx.service.create_review(&algorithm.id, &r2).await.unwrap();

    fx.service.approve_review(&first.id, &r1, None).await.unwrap();
    fx.service
        .reject_review(&second.id, &r2, Some("unsafe image".to_string()))
        .await
        .unwrap();

    let algorithm = fx.algorithms.get(&algorithm.id).await.unwrap().unwrap();
    assert_eq!(algorithm.status, AlgorithmStatus::Rejected);
    assert!(algorithm.invalidated_at.is_some());

    let first = fx.reviews.get(&first.id).await.unwrap().unwrap();
    assert_eq!(first.status, ReviewStatus::Dropped);
    let second = fx.reviews.get(&second.id).await.unwrap().unwrap();
    assert_eq!(second.status, ReviewStatus::Rejected);
    assert_eq!(second.comment.as_deref(), Some("unsafe image"));

    // no sibling is left under review on a rejected algorithm
    let siblings = fx
        .reviews
        .list(&ReviewFilter::for_algorithm(&algorithm.id))
        .await
        .unwrap();
    assert!(siblings
        .iter()
        .all(|r| matches!(r.status, ReviewStatus::Rejected | ReviewStatus::Dropped)));
}

#[tokio::test]
async fn dropped_review_cannot_reopen_decision() {
    let fx = fixture();
    let algorithm = registered_algorithm(&fx, &Principal::new("dev")).await;
    let r1 = Principal::reviewer("r1");
    let r2 = Principal::reviewer("r2");

    let first = fx.service.create_review(&algorithm.id, &r1).await.unwrap();
    let second = fx.service.create_review(&algorithm.id, &r2).await.unwrap();
    fx.service.reject_review(&second.id, &r2, None).await.unwrap();

    // r1's dropped review can no longer be approved
    let err = fx
        .service
        .approve_review(&first.id, &r1, None)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::ReviewConflict(_)));
    let algorithm = fx.algorithms.get(&algorithm.id).await.unwrap().unwrap();
    assert_eq!(algorithm.status, AlgorithmStatus::Rejected);
}

// ===========================================================================
// Deletions
// ===========================================================================

#[tokio::test]
async fn deleting_sole_review_reverts_to_awaiting_assignment() {
    let fx = fixture();
    let algorithm = registered_algorithm(&fx, &Principal::new("dev")).await;
    let r1 = Principal::reviewer("r1");

    let review = fx.service.create_review(&algorithm.id, &r1).await.unwrap();
    fx.service.delete_review(&review.id).await.unwrap();

    let algorithm = fx.algorithms.get(&algorithm.id).await.unwrap().unwrap();
    assert_eq!(algorithm.status, AlgorithmStatus::AwaitingReviewerAssignment);
    assert!(fx.reviews.get(&review.id).await.unwrap().is_none());
}

#[tokio::test]
async fn deleting_last_pending_review_finishes_approval() {
    let fx = fixture();
    let algorithm = registered_algorithm(&fx, &Principal::new("dev")).await;
    let r1 = Principal::reviewer("r1");
    let r2 = Principal::reviewer("r2");

    let first = fx.service.create_review(&algorithm.id, &r1).await.unwrap();
    let second = fx.service.create_review(&algorithm.id, &r2).await.unwrap();
    fx.service.approve_review(&first.id, &r1, None).await.unwrap();

    fx.service.delete_review(&second.id).await.unwrap();

    let algorithm = fx.algorithms.get(&algorithm.id).await.unwrap().unwrap();
    assert_eq!(algorithm.status, AlgorithmStatus::Approved);
}

#[tokio::test]
async fn deleting_with_other_pending_reviews_is_neutral() {
    let fx = fixture();
    let algorithm = registered_algorithm(&fx, &Principal::new("dev")).await;
    let r1 = Principal::reviewer("r1");
    let r2 = Principal::reviewer("r2");

    let first = fx.service.create_review(&algorithm.id, &r1).await.unwrap();
    fx.service.create_review(&algorithm.id, &r2).await.unwrap();

    fx.service.delete_review(&first.id).await.unwrap();

    let algorithm = fx.algorithms.get(&algorithm.id).await.unwrap().unwrap();
    assert_eq!(algorithm.status, AlgorithmStatus::UnderReview);
}

#[tokio::test]
async fn deleting_review_of_approved_algorithm_is_refused() {
    let fx = fixture();
    let algorithm = registered_algorithm(&fx, &Principal::new("dev")).await;
    let r1 = Principal::reviewer("r1");

    let review = fx.service.create_review(&algorithm.id, &r1).await.unwrap();
    fx.service.approve_review(&review.id, &r1, None).await.unwrap();

    let err = fx.service.delete_review(&review.id).await.unwrap_err();
    assert!(matches!(err, StoreError::ReviewConflict(_)));

    // no field changed
    let algorithm = fx.algorithms.get(&algorithm.id).await.unwrap().unwrap();
    assert_eq!(algorithm.status, AlgorithmStatus::Approved);
    let review = fx.reviews.get(&review.id).await.unwrap().unwrap();
    assert_eq!(review.status, ReviewStatus::Approved);
}

#[tokio::test]
async fn deleting_review_of_rejected_algorithm_is_allowed() {
    // only approved algorithms are protected from review deletion
    let fx = fixture();
    let algorithm = registered_algorithm(&fx, &Principal::new("dev")).await;
    let r1 = Principal::reviewer("r1");

    let review = fx.service.create_review(&algorithm.id, &r1).await.unwrap();
    fx.service.reject_review(&review.id, &r1, None).await.unwrap();

    fx.service.delete_review(&review.id).await.unwrap();
    let algorithm = fx.algorithms.get(&algorithm.id).await.unwrap().unwrap();
    // the closed decision stands
    assert_eq!(algorithm.status, AlgorithmStatus::Rejected);
}
