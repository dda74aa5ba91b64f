use crate::error::{Rejection, Result};
use crate::models::{NewReview, Profile, Rating, Review};
use crate::store::{PropertyStore, ReviewStore};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Whether a submission created a review or replaced the user's earlier one
#[derive(Debug, Clone, PartialEq)]
pub enum ReviewOutcome {
    Created(Review),
    Updated(Review),
}

impl ReviewOutcome {
    pub fn review(&self) -> &Review {
        match self {
            Self::Created(review) | Self::Updated(review) => review,
        }
    }

    pub fn into_review(self) -> Review {
        match self {
            Self::Created(review) | Self::Updated(review) => review,
        }
    }
}

/// One review per user and property
pub struct ReviewService<S: ?Sized> {
    store: Arc<S>,
}

impl<S> ReviewService<S>
where
    S: PropertyStore + ReviewStore + ?Sized,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn submit(
        &self,
        author: &Profile,
        property_id: Uuid,
        rating: u8,
        comment: Option<String>,
    ) -> Result<ReviewOutcome> {
        if author.is_provider() {
            return Err(Rejection::ProvidersCannotReview.into());
        }
        let rating = Rating::try_from(rating).map_err(Rejection::InvalidRating)?;
        if self.store.get_property(property_id).await?.is_none() {
            return Err(Rejection::PropertyNotFound(property_id).into());
        }

        let comment = comment
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        match self.store.find_review(author.id, property_id).await? {
            Some(existing) => {
                let review = self.store.update_review(existing.id, rating, comment).await?;
                info!(review_id = %review.id, %property_id, "Review updated");
                Ok(ReviewOutcome::Updated(review))
            }
            None => {
                let review = self
                    .store
                    .insert_review(NewReview {
                        property_id,
                        user_id: author.id,
                        rating,
                        comment,
                    })
                    .await?;
                info!(review_id = %review.id, %property_id, "Review created");
                Ok(ReviewOutcome::Created(review))
            }
        }
    }

    /// Newest first
    pub async fn reviews_for_property(&self, property_id: Uuid) -> Result<Vec<Review>> {
        Ok(self.store.reviews_for_property(property_id).await?)
    }
}
