use mongodb::{
    bson::doc,
    options::{ClientOptions, ServerApi, ServerApiVersion},
    Client, Collection,
};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::{config::Config, errors::AppResult};

#[derive(Clone)]
pub struct Database {
    client: Client,
    db_name: String,
}

impl Database {
    pub async fn connect(config: &Config) -> AppResult<Self> {
        let mut client_options = ClientOptions::parse(&config.mongo_conn_string).await?;

        let server_api = ServerApi::builder().version(ServerApiVersion::V1).build();
        client_options.server_api = Some(server_api);
        client_options.max_pool_size = Some(10);
        client_options.min_pool_size = Some(2);
        client_options.connect_timeout = Some(Duration::from_secs(5));
        client_options.server_selection_timeout = Some(Duration::from_secs(5));

        let client = Client::with_options(client_options)?;

        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;

        log::info!("Connected to MongoDB database '{}'", config.mongo_db_name);

        Ok(Self {
            client,
            db_name: config.mongo_db_name.clone(),
        })
    }

    pub fn get_collection<T>(&self, collection_name: &str) -> Collection<T>
    where
        T: Send + Sync,
    {
        self.client
            .database(&self.db_name)
            .collection(collection_name)
    }

    pub async fn health_check(&self) -> AppResult<()> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(())
    }
}

/// A live query subscription: the receiver yields a fresh result set whenever
/// matching documents change, until the subscription is dropped or explicitly
/// unsubscribed.
pub struct Subscription<T> {
    receiver: mpsc::Receiver<Vec<T>>,
    task: JoinHandle<()>,
}

impl<T> Subscription<T> {
    pub fn new(receiver: mpsc::Receiver<Vec<T>>, task: JoinHandle<()>) -> Self {
        Self { receiver, task }
    }

    /// Wait for the next result set. Returns `None` once the feeding task has
    /// stopped and all buffered result sets were consumed.
    pub async fn next(&mut self) -> Option<Vec<T>> {
        self.receiver.recv().await
    }

    /// Cancel the subscription and stop the feeding task.
    pub fn unsubscribe(self) {
        self.task.abort();
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}
