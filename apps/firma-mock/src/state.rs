//! In-memory request registry

use shared_types::SignatureRequestRecord;
use tokio::sync::RwLock;

/// Records kept in creation order
#[derive(Debug, Default)]
pub struct AppState {
    requests: RwLock<Vec<SignatureRequestRecord>>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, record: SignatureRequestRecord) {
        self.requests.write().await.push(record);
    }

    pub async fn list(&self) -> Vec<SignatureRequestRecord> {
        self.requests.read().await.clone()
    }

    /// Apply `f` to the record with `id` and return a copy of the result
    pub async fn update<F>(&self, id: &str, f: F) -> Option<SignatureRequestRecord>
    where
        F: FnOnce(&mut SignatureRequestRecord),
    {
        let mut requests = self.requests.write().await;
        let record = requests.iter_mut().find(|r| r.id == id)?;
        f(record);
        Some(record.clone())
    }

    pub async fn get(&self, id: &str) -> Option<SignatureRequestRecord> {
        self.requests
            .read()
            .await
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }
}
