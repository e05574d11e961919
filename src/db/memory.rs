// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process document store.
//!
//! Evaluates the same query predicates as the hosted backend so services can
//! run offline and in tests.

use crate::db::{fields, DocumentList, DocumentStore, Query};
use crate::error::AppError;
use crate::time_utils::format_utc_rfc3339;
use dashmap::DashMap;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

/// Page size the backend applies when no limit is given.
const DEFAULT_LIMIT: usize = 25;

/// In-memory document store. Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryDb {
    collections: Arc<DashMap<String, Vec<Value>>>,
    /// Total operations issued, for tests asserting on call counts
    operations: Arc<AtomicU64>,
    writes: Arc<AtomicU64>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a document verbatim (metadata included), bypassing ID assignment.
    pub fn insert_raw(&self, collection: &str, document: Value) {
        self.collections
            .entry(collection.to_string())
            .or_default()
            .push(document);
    }

    /// All documents currently in a collection, in insertion order.
    pub fn documents(&self, collection: &str) -> Vec<Value> {
        self.collections
            .get(collection)
            .map(|docs| docs.clone())
            .unwrap_or_default()
    }

    pub fn count(&self, collection: &str) -> usize {
        self.collections
            .get(collection)
            .map(|docs| docs.len())
            .unwrap_or(0)
    }

    /// Number of create/update/delete calls so far.
    pub fn write_count(&self) -> u64 {
        self.writes.load(AtomicOrdering::SeqCst)
    }

    pub fn operation_count(&self) -> u64 {
        self.operations.load(AtomicOrdering::SeqCst)
    }

    fn record(&self, write: bool) {
        self.operations.fetch_add(1, AtomicOrdering::SeqCst);
        if write {
            self.writes.fetch_add(1, AtomicOrdering::SeqCst);
        }
    }
}

#[async_trait::async_trait]
impl DocumentStore for MemoryDb {
    async fn list_documents(
        &self,
        collection: &str,
        queries: &[Query],
    ) -> Result<DocumentList, AppError> {
        self.record(false);

        let mut matched: Vec<Value> = self
            .documents(collection)
            .into_iter()
            .filter(|doc| queries.iter().all(|q| matches(doc, q)))
            .collect();

        // Apply orderings last-to-first so the first one is the primary key
        for query in queries.iter().rev() {
            match query {
                Query::OrderAsc(field) => {
                    matched.sort_by(|a, b| compare_values(a.get(field), b.get(field)))
                }
                Query::OrderDesc(field) => {
                    matched.sort_by(|a, b| compare_values(b.get(field), a.get(field)))
                }
                _ => {}
            }
        }

        let total = matched.len() as u64;
        let offset = queries
            .iter()
            .rev()
            .find_map(|q| match q {
                Query::Offset(n) => Some(*n as usize),
                _ => None,
            })
            .unwrap_or(0);
        let limit = queries
            .iter()
            .rev()
            .find_map(|q| match q {
                Query::Limit(n) => Some(*n as usize),
                _ => None,
            })
            .unwrap_or(DEFAULT_LIMIT);

        let documents = matched.into_iter().skip(offset).take(limit).collect();
        Ok(DocumentList { total, documents })
    }

    async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Value>, AppError> {
        self.record(false);
        Ok(self
            .documents(collection)
            .into_iter()
            .find(|doc| doc.get(fields::ID).and_then(Value::as_str) == Some(id)))
    }

    async fn create_document(&self, collection: &str, data: Value) -> Result<Value, AppError> {
        self.record(true);

        let Value::Object(mut object) = data else {
            return Err(AppError::BadRequest(
                "Document data must be a JSON object".to_string(),
            ));
        };

        let now = format_utc_rfc3339(chrono::Utc::now());
        let id = uuid::Uuid::new_v4().simple().to_string();
        object.insert(fields::ID.to_string(), Value::String(id));
        object.insert(fields::CREATED_AT.to_string(), Value::String(now.clone()));
        object.insert(fields::UPDATED_AT.to_string(), Value::String(now));

        let document = Value::Object(object);
        self.insert_raw(collection, document.clone());
        Ok(document)
    }

    async fn update_document(
        &self,
        collection: &str,
        id: &str,
        data: Value,
    ) -> Result<Value, AppError> {
        self.record(true);

        let Value::Object(patch) = data else {
            return Err(AppError::BadRequest(
                "Document data must be a JSON object".to_string(),
            ));
        };

        let mut docs = self
            .collections
            .get_mut(collection)
            .ok_or_else(|| AppError::NotFound(format!("Document {} not found", id)))?;

        let doc = docs
            .iter_mut()
            .find(|doc| doc.get(fields::ID).and_then(Value::as_str) == Some(id))
            .ok_or_else(|| AppError::NotFound(format!("Document {} not found", id)))?;

        if let Value::Object(existing) = doc {
            merge(existing, patch);
            existing.insert(
                fields::UPDATED_AT.to_string(),
                Value::String(format_utc_rfc3339(chrono::Utc::now())),
            );
        }

        Ok(doc.clone())
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<(), AppError> {
        self.record(true);

        let mut docs = self
            .collections
            .get_mut(collection)
            .ok_or_else(|| AppError::NotFound(format!("Document {} not found", id)))?;

        let before = docs.len();
        docs.retain(|doc| doc.get(fields::ID).and_then(Value::as_str) != Some(id));
        if docs.len() == before {
            return Err(AppError::NotFound(format!("Document {} not found", id)));
        }
        Ok(())
    }
}

fn merge(existing: &mut Map<String, Value>, patch: Map<String, Value>) {
    for (key, value) in patch {
        existing.insert(key, value);
    }
}

fn matches(doc: &Value, query: &Query) -> bool {
    match query {
        Query::Equal(field, expected) => {
            let actual = doc.get(field);
            match expected {
                Value::Array(options) => options.iter().any(|o| actual == Some(o)),
                single => actual == Some(single),
            }
        }
        Query::GreaterThanEqual(field, bound) => {
            doc.get(field).is_some() && compare_values(doc.get(field), Some(bound)) != Ordering::Less
        }
        Query::LessThan(field, bound) => {
            doc.get(field).is_some() && compare_values(doc.get(field), Some(bound)) == Ordering::Less
        }
        _ => true,
    }
}

/// Order numbers numerically and strings lexically; missing values sort first.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (None, Some(_)) | (Some(Value::Null), Some(_)) => Ordering::Less,
        (Some(_), None) | (Some(_), Some(Value::Null)) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}
