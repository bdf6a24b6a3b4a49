use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::{
    db::{Database, Subscription},
    errors::AppResult,
    models::domain::Submission,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    /// Persist a completed submission; the repository assigns the id.
    async fn create(&self, submission: Submission) -> AppResult<Submission>;
    /// All submissions for one assessment, newest first.
    async fn list_by_assessment(&self, assessment_id: &str) -> AppResult<Vec<Submission>>;
    /// Live view of `list_by_assessment`, until unsubscribed.
    async fn watch_by_assessment(&self, assessment_id: &str)
        -> AppResult<Subscription<Submission>>;
}

pub struct MongoSubmissionRepository {
    collection: Collection<Submission>,
}

impl MongoSubmissionRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("submissions");
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for submissions collection");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        let assessment_index = IndexModel::builder()
            .keys(doc! { "assessment_id": 1, "submitted_at": -1 })
            .options(
                IndexOptions::builder()
                    .name("assessment_submitted".to_string())
                    .build(),
            )
            .build();

        // Hook for at-most-one-attempt enforcement: make this unique if the
        // deployment wants a per-user attempt limit at the store boundary.
        let user_assessment_index = IndexModel::builder()
            .keys(doc! { "user_id": 1, "assessment_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("user_assessment".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(id_index).await?;
        self.collection.create_index(assessment_index).await?;
        self.collection.create_index(user_assessment_index).await?;

        log::info!("Successfully created indexes for submissions collection");
        Ok(())
    }
}

async fn query_by_assessment(
    collection: &Collection<Submission>,
    assessment_id: &str,
) -> AppResult<Vec<Submission>> {
    let items = collection
        .find(doc! { "assessment_id": assessment_id })
        .sort(doc! { "submitted_at": -1 })
        .await?
        .try_collect()
        .await?;
    Ok(items)
}

#[async_trait]
impl SubmissionRepository for MongoSubmissionRepository {
    async fn create(&self, mut submission: Submission) -> AppResult<Submission> {
        submission.id = Some(Uuid::new_v4().to_string());
        self.collection.insert_one(&submission).await?;
        Ok(submission)
    }

    async fn list_by_assessment(&self, assessment_id: &str) -> AppResult<Vec<Submission>> {
        query_by_assessment(&self.collection, assessment_id).await
    }

    async fn watch_by_assessment(
        &self,
        assessment_id: &str,
    ) -> AppResult<Subscription<Submission>> {
        let collection = self.collection.clone();
        let assessment_id = assessment_id.to_string();
        let (tx, rx) = mpsc::channel(8);

        let task = tokio::spawn(async move {
            match query_by_assessment(&collection, &assessment_id).await {
                Ok(items) => {
                    if tx.send(items).await.is_err() {
                        return;
                    }
                }
                Err(err) => {
                    log::warn!("submission subscription initial query failed: {}", err);
                    return;
                }
            }

            let mut change_stream = match collection.watch().await {
                Ok(stream) => stream,
                Err(err) => {
                    log::warn!("submission change stream unavailable: {}", err);
                    return;
                }
            };

            while let Some(event) = change_stream.next().await {
                if let Err(err) = event {
                    log::warn!("submission change stream ended: {}", err);
                    break;
                }
                match query_by_assessment(&collection, &assessment_id).await {
                    Ok(items) => {
                        if tx.send(items).await.is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        log::warn!("submission subscription requery failed: {}", err);
                        break;
                    }
                }
            }
        });

        Ok(Subscription::new(rx, task))
    }
}
