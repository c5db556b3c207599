//! Demo binary: walks the repository operations against the in-memory
//! store provider. The first add runs against an unprovisioned
//! collection and heals it.

use std::sync::Arc;

use docstore::{DocumentRepository, Entity, QueryParameters};
use docstore_memory::{CollectionConfig, MemoryStoreProvider};
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Task {
    id: String,
    bucket: String,
    title: String,
    done: bool,
}

impl Task {
    fn new(title: &str) -> Self {
        Self {
            id: String::new(),
            bucket: String::new(),
            title: title.to_string(),
            done: false,
        }
    }
}

/// Routing bucket derived from the identifier, so point reads can
/// resolve it again without the document.
fn bucket_for(id: &str) -> String {
    let bucket = id.as_bytes().first().copied().unwrap_or(0) % 4;
    format!("bucket-{}", bucket)
}

impl Entity for Task {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.bucket = bucket_for(&id);
        self.id = id;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let provider = Arc::new(MemoryStoreProvider::with_collections([
        CollectionConfig::new("tasks").partitioned_by("bucket"),
    ]));
    let repo = DocumentRepository::new(Arc::clone(&provider), "tasks")
        .with_partition_key(|id| Some(bucket_for(id)));

    let groceries = repo.add(Task::new("buy groceries")).await?;
    info!(id = %groceries.id(), bucket = %groceries.bucket, "Added task");

    let laundry = repo.add(Task::new("do laundry")).await?;
    info!(id = %laundry.id(), bucket = %laundry.bucket, "Added task");

    let fetched = repo.get_by_id(groceries.id()).await?;
    info!(title = %fetched.title, "Fetched task by id");

    let mut finished = fetched;
    finished.done = true;
    let updated = repo.update(&finished).await?;
    info!(id = %updated.id(), done = updated.done, "Updated task");

    let open = repo
        .query(
            "t",
            "t.done = @done",
            QueryParameters::new().bind("@done", false),
        )
        .await?;
    info!(count = open.len(), "Open tasks");

    let everything = repo.get_all().await?;
    info!(count = everything.len(), "All tasks");

    repo.delete(&laundry).await?;
    info!(id = %laundry.id(), "Deleted task");

    let remaining = provider.len("tasks").await;
    let ensure_calls = provider.ensure_calls().await;
    info!(remaining, ensure_calls, "Demo finished");

    Ok(())
}
