use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::TryStreamExt;
use mongodb::{Client, Collection, options::ClientOptions, bson::doc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::StoreError;
use crate::kv::KeyValueStore;

const DATABASE: &str = "arbolitos";
const COLLECTION: &str = "plant_histories";

/// One stored key, as a MongoDB document.
#[derive(Serialize, Deserialize, Debug)]
pub struct Entry {
    #[serde(rename = "_id")]
    pub key: String,
    pub value: String,
}

/// Key/value store on a MongoDB collection, one document per key.
#[derive(Debug, Clone)]
pub struct MongoStore {
    collection: Collection<Entry>,
}

impl MongoStore {
    /// Connects and pings the server so a bad URI fails here and not on
    /// the first read.
    pub async fn connect(uri: &str) -> Result<Self, StoreError> {
        let mut client_options = ClientOptions::parse(uri).await?;
        client_options.server_selection_timeout = Some(Duration::from_secs(10));
        let client = Client::with_options(client_options)?;

        let db = client
            .default_database()
            .unwrap_or_else(|| client.database(DATABASE));
        db.run_command(doc! { "ping": 1 }).await?;
        info!(database = db.name(), "connected to MongoDB");

        Ok(MongoStore::new(db.collection::<Entry>(COLLECTION)))
    }

    pub fn new(collection: Collection<Entry>) -> Self {
        MongoStore { collection }
    }
}

#[async_trait]
impl KeyValueStore for MongoStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entry = self.collection.find_one(doc! { "_id": key }).await?;
        Ok(entry.map(|e| e.value))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let entry = Entry {
            key: key.to_string(),
            value: value.to_string(),
        };
        self.collection
            .replace_one(doc! { "_id": key }, entry)
            .upsert(true)
            .await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool, StoreError> {
        let result = self.collection.delete_one(doc! { "_id": key }).await?;
        Ok(result.deleted_count > 0)
    }

    async fn keys(&self) -> Result<Vec<String>, StoreError> {
        let mut cursor = self.collection.find(doc! {}).await?;
        let mut keys = vec![];
        while let Some(entry) = cursor.try_next().await? {
            keys.push(entry.key);
        }
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::{from_document, to_document, Bson};

    #[test]
    fn entry_is_keyed_by_id() {
        let entry = Entry {
            key: "plant_p1".to_string(),
            value: r#"{"plant_id":"p1","analyses":[]}"#.to_string(),
        };

        let document = to_document(&entry).unwrap();
        assert_eq!(document.get("_id"), Some(&Bson::String("plant_p1".into())));
        assert_eq!(document.get_str("value").unwrap(), entry.value);
        assert!(document.get("key").is_none());

        let back: Entry = from_document(document).unwrap();
        assert_eq!(back.key, entry.key);
        assert_eq!(back.value, entry.value);
    }

    #[test]
    fn reads_plain_document() {
        let document = doc! { "_id": "plant_rosa", "value": "{}" };
        let entry: Entry = from_document(document).unwrap();
        assert_eq!(entry.key, "plant_rosa");
        assert_eq!(entry.value, "{}");
    }
}
