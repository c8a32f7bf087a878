//! MongoDB-backed remote store
//!
//! Connection handling follows the short server-selection timeout pattern so
//! an unreachable server classifies quickly instead of hanging the caller.

use async_trait::async_trait;
use bson::{doc, Document};
use futures_util::StreamExt;
use mongodb::Client;
use serde_json::Value as JsonValue;
use tracing::{error, info};

use crate::model::ORGANIZATION_COLLECTION;
use crate::types::{RemoteError, RemoteResult};

use super::{FieldFilter, RemoteStore};

/// Remote store adapter over a MongoDB database.
#[derive(Clone)]
pub struct MongoRemoteStore {
    client: Client,
    db_name: String,
}

impl MongoRemoteStore {
    /// Connect and verify the database responds to a ping.
    pub async fn connect(uri: &str, db_name: &str) -> RemoteResult<Self> {
        info!(db = db_name, "Connecting to remote document store");

        // serverSelectionTimeoutMS keeps an unreachable server from hanging us
        let timeout_uri = if uri.contains('?') {
            format!("{uri}&serverSelectionTimeoutMS=3000&connectTimeoutMS=3000")
        } else {
            format!("{uri}?serverSelectionTimeoutMS=3000&connectTimeoutMS=3000")
        };

        let client = Client::with_uri_str(&timeout_uri)
            .await
            .map_err(|e| RemoteError::Unreachable(format!("connect failed: {e}")))?;

        client
            .database(db_name)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| classify("ping", &e))?;

        info!(db = db_name, "Remote document store connected");
        Ok(Self {
            client,
            db_name: db_name.to_string(),
        })
    }

    fn collection(&self, name: &str) -> mongodb::Collection<Document> {
        self.client.database(&self.db_name).collection(name)
    }
}

/// Map a driver error onto the adapter error taxonomy. Authorization
/// failures mean the service responded; everything else counts as
/// unreachable.
fn classify(context: &str, err: &mongodb::error::Error) -> RemoteError {
    use mongodb::error::ErrorKind;
    match err.kind.as_ref() {
        ErrorKind::Authentication { .. } => {
            RemoteError::PermissionDenied(format!("{context}: {err}"))
        }
        // Code 13: Unauthorized
        ErrorKind::Command(command) if command.code == 13 => {
            RemoteError::PermissionDenied(format!("{context}: {err}"))
        }
        _ => RemoteError::Unreachable(format!("{context}: {err}")),
    }
}

fn to_document(doc: &JsonValue) -> RemoteResult<Document> {
    bson::to_document(doc).map_err(|e| RemoteError::Malformed(format!("encode failed: {e}")))
}

fn to_json(mut document: Document) -> RemoteResult<JsonValue> {
    // The store key is transport detail; the logical id lives in "id".
    document.remove("_id");
    serde_json::to_value(&document).map_err(|e| RemoteError::Malformed(format!("decode failed: {e}")))
}

#[async_trait]
impl RemoteStore for MongoRemoteStore {
    async fn probe(&self) -> RemoteResult<()> {
        self.collection(ORGANIZATION_COLLECTION)
            .find_one(doc! {})
            .await
            .map_err(|e| classify("probe", &e))?;
        Ok(())
    }

    async fn list(
        &self,
        collection: &str,
        filter: Option<&FieldFilter>,
    ) -> RemoteResult<Vec<JsonValue>> {
        let filter_doc = match filter {
            Some(f) => doc! { f.field.as_str(): f.value.as_str() },
            None => doc! {},
        };

        let mut cursor = self
            .collection(collection)
            .find(filter_doc)
            .await
            .map_err(|e| classify("list", &e))?;

        let mut results = Vec::new();
        while let Some(next) = cursor.next().await {
            match next {
                Ok(document) => results.push(to_json(document)?),
                Err(e) => {
                    error!(collection = collection, error = %e, "Error reading document");
                }
            }
        }
        Ok(results)
    }

    async fn get(&self, collection: &str, id: &str) -> RemoteResult<Option<JsonValue>> {
        let found = self
            .collection(collection)
            .find_one(doc! { "_id": id })
            .await
            .map_err(|e| classify("get", &e))?;
        found.map(to_json).transpose()
    }

    async fn put(&self, collection: &str, id: &str, doc: JsonValue) -> RemoteResult<()> {
        let mut document = to_document(&doc)?;
        document.insert("_id", id);
        self.collection(collection)
            .replace_one(bson::doc! { "_id": id }, document)
            .upsert(true)
            .await
            .map_err(|e| classify("put", &e))?;
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, fields: JsonValue) -> RemoteResult<()> {
        let fields_doc = to_document(&fields)?;
        let result = self
            .collection(collection)
            .update_one(doc! { "_id": id }, doc! { "$set": fields_doc })
            .await
            .map_err(|e| classify("update", &e))?;
        if result.matched_count == 0 {
            return Err(RemoteError::NotFound(format!("{collection}/{id}")));
        }
        Ok(())
    }

    async fn append(&self, collection: &str, doc: JsonValue) -> RemoteResult<String> {
        let document = to_document(&doc)?;
        let result = self
            .collection(collection)
            .insert_one(document)
            .await
            .map_err(|e| classify("append", &e))?;
        let key = match result.inserted_id.as_object_id() {
            Some(oid) => oid.to_hex(),
            None => result.inserted_id.to_string(),
        };
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    // Exercising MongoRemoteStore needs a running MongoDB; the adapter
    // contract is covered against MemoryRemoteStore and the service-level
    // scenarios in tests/.
}
