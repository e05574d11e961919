// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Document store backed by the Appwrite databases REST API.

use crate::client::AppwriteClient;
use crate::db::{DocumentList, DocumentStore, Query};
use crate::error::AppError;
use reqwest::Method;
use serde_json::{json, Value};

/// Appwrite database client.
#[derive(Clone)]
pub struct AppwriteDb {
    client: AppwriteClient,
    database_id: String,
}

impl AppwriteDb {
    pub fn new(client: AppwriteClient, database_id: &str) -> Self {
        Self {
            client,
            database_id: database_id.to_string(),
        }
    }

    fn documents_path(&self, collection: &str) -> String {
        format!(
            "/databases/{}/collections/{}/documents",
            urlencoding::encode(&self.database_id),
            urlencoding::encode(collection)
        )
    }

    fn document_path(&self, collection: &str, id: &str) -> String {
        format!(
            "{}/{}",
            self.documents_path(collection),
            urlencoding::encode(id)
        )
    }
}

#[async_trait::async_trait]
impl DocumentStore for AppwriteDb {
    async fn list_documents(
        &self,
        collection: &str,
        queries: &[Query],
    ) -> Result<DocumentList, AppError> {
        let params: Vec<(&str, String)> = queries
            .iter()
            .map(|q| ("queries[]", q.to_json_string()))
            .collect();

        let request = self
            .client
            .request(Method::GET, &self.documents_path(collection))
            .await
            .query(&params);

        self.client.execute_json(request).await
    }

    async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Value>, AppError> {
        let request = self
            .client
            .request(Method::GET, &self.document_path(collection, id))
            .await;

        match self.client.execute_json(request).await {
            Ok(doc) => Ok(Some(doc)),
            Err(AppError::Backend { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn create_document(&self, collection: &str, data: Value) -> Result<Value, AppError> {
        let body = json!({
            "documentId": "unique()",
            "data": data,
        });

        let request = self
            .client
            .request(Method::POST, &self.documents_path(collection))
            .await
            .json(&body);

        let created: Value = self.client.execute_json(request).await?;
        tracing::debug!(collection, id = ?created.get("$id"), "Document created");
        Ok(created)
    }

    async fn update_document(
        &self,
        collection: &str,
        id: &str,
        data: Value,
    ) -> Result<Value, AppError> {
        let request = self
            .client
            .request(Method::PATCH, &self.document_path(collection, id))
            .await
            .json(&json!({ "data": data }));

        self.client.execute_json(request).await
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<(), AppError> {
        let request = self
            .client
            .request(Method::DELETE, &self.document_path(collection, id))
            .await;

        self.client.execute(request).await?;
        tracing::debug!(collection, id, "Document deleted");
        Ok(())
    }
}
