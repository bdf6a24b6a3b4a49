use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::{
    db::{Database, Subscription},
    errors::AppResult,
    models::domain::{Assessment, AssessmentStatus},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssessmentRepository: Send + Sync {
    /// Persist a new assessment; the repository assigns the id.
    async fn create(&self, assessment: Assessment) -> AppResult<Assessment>;
    async fn find_by_id(&self, id: &str) -> AppResult<Option<Assessment>>;
    /// All assessments authored by `owner_id`, newest first.
    async fn list_by_owner(&self, owner_id: &str) -> AppResult<Vec<Assessment>>;
    /// All assessments in the given status, newest first.
    async fn list_by_status(&self, status: AssessmentStatus) -> AppResult<Vec<Assessment>>;
    async fn update(&self, assessment: Assessment) -> AppResult<Assessment>;
    async fn delete(&self, id: &str) -> AppResult<bool>;
    /// Live view of `list_by_owner`: pushes a fresh result set whenever the
    /// collection changes, until unsubscribed.
    async fn watch_by_owner(&self, owner_id: &str) -> AppResult<Subscription<Assessment>>;
}

pub struct MongoAssessmentRepository {
    collection: Collection<Assessment>,
}

impl MongoAssessmentRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("assessments");
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for assessments collection");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        let owner_index = IndexModel::builder()
            .keys(doc! { "owner_id": 1, "created_at": -1 })
            .options(
                IndexOptions::builder()
                    .name("owner_created".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(id_index).await?;
        self.collection.create_index(owner_index).await?;

        log::info!("Successfully created indexes for assessments collection");
        Ok(())
    }
}

async fn query_by_owner(
    collection: &Collection<Assessment>,
    owner_id: &str,
) -> AppResult<Vec<Assessment>> {
    let items = collection
        .find(doc! { "owner_id": owner_id })
        .sort(doc! { "created_at": -1 })
        .await?
        .try_collect()
        .await?;
    Ok(items)
}

#[async_trait]
impl AssessmentRepository for MongoAssessmentRepository {
    async fn create(&self, mut assessment: Assessment) -> AppResult<Assessment> {
        assessment.id = Some(Uuid::new_v4().to_string());
        self.collection.insert_one(&assessment).await?;
        Ok(assessment)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Assessment>> {
        let assessment = self.collection.find_one(doc! { "id": id }).await?;
        Ok(assessment)
    }

    async fn list_by_owner(&self, owner_id: &str) -> AppResult<Vec<Assessment>> {
        query_by_owner(&self.collection, owner_id).await
    }

    async fn list_by_status(&self, status: AssessmentStatus) -> AppResult<Vec<Assessment>> {
        let items = self
            .collection
            .find(doc! { "status": status.as_str() })
            .sort(doc! { "created_at": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(items)
    }

    async fn update(&self, assessment: Assessment) -> AppResult<Assessment> {
        let id = assessment.id.clone().unwrap_or_default();
        self.collection
            .replace_one(doc! { "id": &id }, &assessment)
            .await?;
        Ok(assessment)
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        let result = self.collection.delete_one(doc! { "id": id }).await?;
        Ok(result.deleted_count > 0)
    }

    async fn watch_by_owner(&self, owner_id: &str) -> AppResult<Subscription<Assessment>> {
        let collection = self.collection.clone();
        let owner_id = owner_id.to_string();
        let (tx, rx) = mpsc::channel(8);

        let task = tokio::spawn(async move {
            // Initial snapshot, then a requery per change event.
            match query_by_owner(&collection, &owner_id).await {
                Ok(items) => {
                    if tx.send(items).await.is_err() {
                        return;
                    }
                }
                Err(err) => {
                    log::warn!("assessment subscription initial query failed: {}", err);
                    return;
                }
            }

            let mut change_stream = match collection.watch().await {
                Ok(stream) => stream,
                Err(err) => {
                    log::warn!("assessment change stream unavailable: {}", err);
                    return;
                }
            };

            while let Some(event) = change_stream.next().await {
                if let Err(err) = event {
                    log::warn!("assessment change stream ended: {}", err);
                    break;
                }
                match query_by_owner(&collection, &owner_id).await {
                    Ok(items) => {
                        if tx.send(items).await.is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        log::warn!("assessment subscription requery failed: {}", err);
                        break;
                    }
                }
            }
        });

        Ok(Subscription::new(rx, task))
    }
}
