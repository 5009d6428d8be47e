//! Review lifecycle service
//!
//! Governs review creation, verdicts and deletion, and mutates the owning
//! algorithm's status as a side effect through the `lifecycle` state
//! machine. All validation happens before any write; a rejected request
//! has no effect on storage.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use algostore_state::{
    AlgorithmId, AlgorithmRecord, AlgorithmStatus, AlgorithmStore, ReviewFilter, ReviewId,
    ReviewRecord, ReviewStatus, ReviewStore,
};

use crate::auth::Principal;
use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::lifecycle;

/// Service applying review lifecycle events to the entity stores.
#[derive(Clone)]
pub struct ReviewService {
    algorithms: Arc<dyn AlgorithmStore>,
    reviews: Arc<dyn ReviewStore>,
    config: StoreConfig,
}

impl ReviewService {
    pub fn new(
        algorithms: Arc<dyn AlgorithmStore>,
        reviews: Arc<dyn ReviewStore>,
        config: StoreConfig,
    ) -> Self {
        ReviewService {
            algorithms,
            reviews,
            config,
        }
    }

    async fn get_algorithm(&self, id: &AlgorithmId) -> Result<AlgorithmRecord> {
        self.algorithms
            .get(id)
            .await?
            .ok_or_else(|| StoreError::AlgorithmNotFound(id.clone()))
    }

    async fn get_review(&self, id: &ReviewId) -> Result<ReviewRecord> {
        self.reviews
            .get(id)
            .await?
            .ok_or_else(|| StoreError::ReviewNotFound(id.clone()))
    }

    /// Fresh read of the full sibling set of an algorithm's reviews.
    async fn sibling_reviews(&self, algorithm_id: &AlgorithmId) -> Result<Vec<ReviewRecord>> {
        Ok(self
            .reviews
            .list(&ReviewFilter::for_algorithm(algorithm_id))
            .await?)
    }

    /// Assign a reviewer to an algorithm, creating a pending review.
    ///
    /// Preconditions, all checked before any write:
    /// - the algorithm exists and its review is not finished
    /// - the assigned reviewer holds the reviewer capability
    /// - the reviewer is not the algorithm's developer, unless the
    ///   `review_own_algorithm` override is set
    /// - the reviewer has no existing non-Dropped review on this algorithm
    pub async fn create_review(
        &self,
        algorithm_id: &AlgorithmId,
        reviewer: &Principal,
    ) -> Result<ReviewRecord> {
        let mut algorithm = self.get_algorithm(algorithm_id).await?;
        if algorithm.status.is_finished() {
            return Err(StoreError::AlgorithmAlreadyReviewed(algorithm_id.clone()));
        }

        if !reviewer.is_reviewer() {
            return Err(StoreError::ReviewConflict(format!(
                "user '{}' is not allowed to review algorithms",
                reviewer.id
            )));
        }
        if reviewer.id == algorithm.developer && !self.config.review_own_algorithm {
            return Err(StoreError::ReviewConflict(
                "the developer of an algorithm cannot review their own algorithm".to_string(),
            ));
        }
        let existing = self
            .reviews
            .list(&ReviewFilter {
                algorithm_id: Some(algorithm_id.clone()),
                reviewer: Some(reviewer.id.clone()),
                ..Default::default()
            })
            .await?;
        if existing.iter().any(|r| r.status != ReviewStatus::Dropped) {
            return Err(StoreError::ReviewConflict(format!(
                "reviewer '{}' already has a review on this algorithm",
                reviewer.id
            )));
        }

        // all checks OK, create the review and move the algorithm under review
        let review = ReviewRecord::new(algorithm_id.clone(), reviewer.id.clone());
        self.reviews.save(&review).await?;

        algorithm.status = AlgorithmStatus::UnderReview;
        self.algorithms.save(&algorithm).await?;

        info!(
            "Review {} created: algorithm {} assigned to reviewer {}",
            review.id, algorithm_id, reviewer.id
        );
        Ok(review)
    }

    /// Approve a review. When every non-Dropped sibling is approved as
    /// well, the algorithm itself is approved and its digest frozen.
    pub async fn approve_review(
        &self,
        review_id: &ReviewId,
        actor: &Principal,
        comment: Option<String>,
    ) -> Result<ReviewRecord> {
        let mut review = self.get_review(review_id).await?;
        self.check_verdict_allowed(&review, actor, "approved")?;

        let algorithm = self.get_algorithm(&review.algorithm_id).await?;

        // if this approval would finish the review, the digest must have
        // been resolved: an approved entry always carries a content identity
        let siblings = self.sibling_reviews(&review.algorithm_id).await?;
        let others_approved = siblings
            .iter()
            .filter(|r| r.id != review.id)
            .all(|r| matches!(r.status, ReviewStatus::Approved | ReviewStatus::Dropped));
        if others_approved && algorithm.digest.is_none() {
            return Err(StoreError::DigestUnresolved(review.algorithm_id.clone()));
        }

        review.status = ReviewStatus::Approved;
        if comment.is_some() {
            review.comment = comment;
        }
        self.reviews.save(&review).await?;

        // recompute from a fresh read of the full sibling set, so concurrent
        // approvals converge regardless of interleaving
        let siblings = self.sibling_reviews(&review.algorithm_id).await?;
        if lifecycle::all_reviews_approved(&siblings) {
            let mut algorithm = self.get_algorithm(&review.algorithm_id).await?;
            algorithm.status = AlgorithmStatus::Approved;
            self.algorithms.save(&algorithm).await?;
            info!("Algorithm {} approved", review.algorithm_id);
        }

        info!("Review {} has been approved", review_id);
        Ok(review)
    }

    /// Reject a review. The algorithm is rejected and invalidated, and all
    /// live sibling reviews (pending or approved) are dropped so that no
    /// later action on them can reopen the decision.
    pub async fn reject_review(
        &self,
        review_id: &ReviewId,
        actor: &Principal,
        comment: Option<String>,
    ) -> Result<ReviewRecord> {
        let mut review = self.get_review(review_id).await?;
        self.check_verdict_allowed(&review, actor, "rejected")?;
        let mut algorithm = self.get_algorithm(&review.algorithm_id).await?;

        review.status = ReviewStatus::Rejected;
        if comment.is_some() {
            review.comment = comment;
        }
        self.reviews.save(&review).await?;

        algorithm.status = AlgorithmStatus::Rejected;
        algorithm.invalidated_at = Some(Utc::now());
        self.algorithms.save(&algorithm).await?;

        let siblings = self.sibling_reviews(&review.algorithm_id).await?;
        for sibling in lifecycle::reviews_to_drop(&siblings, &review) {
            let mut dropped = sibling.clone();
            dropped.status = ReviewStatus::Dropped;
            self.reviews.save(&dropped).await?;
        }

        info!(
            "Review {} has been rejected, algorithm {} invalidated",
            review_id, review.algorithm_id
        );
        Ok(review)
    }

    /// Delete a review.
    ///
    /// Reviews of approved algorithms may not be deleted. For algorithms
    /// still under review the status is recomputed from the remaining
    /// siblings: no reviews left reverts to awaiting assignment, all
    /// remaining approved finishes the approval.
    pub async fn delete_review(&self, review_id: &ReviewId) -> Result<()> {
        let review = self.get_review(review_id).await?;
        let mut algorithm = self.get_algorithm(&review.algorithm_id).await?;

        if algorithm.status == AlgorithmStatus::Approved {
            return Err(StoreError::ReviewConflict(
                "reviews of approved algorithms may not be deleted".to_string(),
            ));
        }

        if !algorithm.status.is_finished() {
            let siblings = self.sibling_reviews(&review.algorithm_id).await?;
            let remaining: Vec<ReviewRecord> = siblings
                .into_iter()
                .filter(|r| r.id != review.id)
                .collect();
            if let Some(new_status) = lifecycle::status_after_delete(&remaining) {
                if new_status == AlgorithmStatus::Approved && algorithm.digest.is_none() {
                    return Err(StoreError::DigestUnresolved(review.algorithm_id.clone()));
                }
                algorithm.status = new_status;
                self.algorithms.save(&algorithm).await?;
            }
        }

        self.reviews.delete(review_id).await?;
        info!("Review {} deleted", review_id);
        Ok(())
    }

    /// Common guards for approve/reject: the actor must be the assigned
    /// reviewer and the review must still be pending.
    fn check_verdict_allowed(
        &self,
        review: &ReviewRecord,
        actor: &Principal,
        verdict: &str,
    ) -> Result<()> {
        if review.reviewer != actor.id {
            return Err(StoreError::ReviewConflict(format!(
                "user '{}' is not assigned to review {}",
                actor.id, review.id
            )));
        }
        if review.status != ReviewStatus::UnderReview {
            return Err(StoreError::ReviewConflict(format!(
                "review {} has status {:?} so it can no longer be {}",
                review.id, review.status, verdict
            )));
        }
        Ok(())
    }
}
