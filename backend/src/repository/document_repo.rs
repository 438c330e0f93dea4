//! Document Repository
//!
//! SQLite-backed documents, scoped to one collection and one owner.

use async_trait::async_trait;
use rusqlite::{params, OptionalExtension, Row};
use serde_json::{Map, Value};

use super::db::SharedConnection;
use super::traits::Repository;
use crate::domain::{CollectionSchema, Document, DocumentId, DomainError, DomainResult};

/// Repository over `documents` for a single (collection, owner) pair
pub struct CollectionRepository {
    conn: SharedConnection,
    schema: CollectionSchema,
    owner_id: String,
}

impl CollectionRepository {
    pub fn new(conn: SharedConnection, schema: CollectionSchema, owner_id: &str) -> Self {
        Self {
            conn,
            schema,
            owner_id: owner_id.to_string(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.schema.name
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }
}

#[async_trait]
impl Repository<Document> for CollectionRepository {
    async fn create(&self, entity: &Document) -> DomainResult<Document> {
        self.schema.validate(&entity.body)?;

        let now = chrono::Utc::now().timestamp_millis();
        let created = Document {
            id: DocumentId::generate(),
            collection: self.schema.name.clone(),
            owner_id: self.owner_id.clone(),
            body: entity.body.clone(),
            created_at: now,
            updated_at: now,
        };

        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO documents (id, collection, owner_id, body, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                created.id.as_str(),
                created.collection,
                created.owner_id,
                serde_json::to_string(&created.body)?,
                created.created_at,
                created.updated_at
            ],
        )?;

        log::debug!("Created {}/{} for {}", created.collection, created.id, created.owner_id);
        Ok(created)
    }

    async fn find_by_id(&self, id: &DocumentId) -> DomainResult<Option<Document>> {
        let conn = self.conn.lock().await;
        let found = conn
            .query_row(
                "SELECT id, collection, owner_id, body, created_at, updated_at FROM documents WHERE id = ?1 AND collection = ?2 AND owner_id = ?3",
                params![id.as_str(), self.schema.name, self.owner_id],
                row_to_raw,
            )
            .optional()?;

        found.map(RawDocument::into_document).transpose()
    }

    async fn list(&self) -> DomainResult<Vec<Document>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT id, collection, owner_id, body, created_at, updated_at FROM documents WHERE collection = ?1 AND owner_id = ?2 ORDER BY created_at ASC, id ASC",
        )?;
        let rows = stmt.query_map(params![self.schema.name, self.owner_id], row_to_raw)?;

        let mut documents = Vec::new();
        for raw in rows {
            documents.push(raw?.into_document()?);
        }
        Ok(documents)
    }

    async fn update(&self, entity: &Document) -> DomainResult<Document> {
        self.schema.validate(&entity.body)?;

        let existing = self
            .find_by_id(&entity.id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("{}/{}", self.schema.name, entity.id)))?;

        let updated = Document {
            body: entity.body.clone(),
            updated_at: chrono::Utc::now().timestamp_millis().max(existing.created_at),
            ..existing
        };

        let conn = self.conn.lock().await;
        conn.execute(
            "UPDATE documents SET body = ?1, updated_at = ?2 WHERE id = ?3 AND collection = ?4 AND owner_id = ?5",
            params![
                serde_json::to_string(&updated.body)?,
                updated.updated_at,
                updated.id.as_str(),
                self.schema.name,
                self.owner_id
            ],
        )?;

        Ok(updated)
    }

    async fn delete(&self, id: &DocumentId) -> DomainResult<()> {
        let conn = self.conn.lock().await;
        let affected = conn.execute(
            "DELETE FROM documents WHERE id = ?1 AND collection = ?2 AND owner_id = ?3",
            params![id.as_str(), self.schema.name, self.owner_id],
        )?;

        if affected == 0 {
            return Err(DomainError::NotFound(format!("{}/{}", self.schema.name, id)));
        }
        Ok(())
    }
}

/// Row as stored, before the body is parsed
struct RawDocument {
    id: String,
    collection: String,
    owner_id: String,
    body: String,
    created_at: i64,
    updated_at: i64,
}

impl RawDocument {
    fn into_document(self) -> DomainResult<Document> {
        let body: Map<String, Value> = serde_json::from_str(&self.body)
            .map_err(|e| DomainError::Internal(format!("Corrupt body for {}: {}", self.id, e)))?;
        Ok(Document {
            id: DocumentId::parse(&self.id)?,
            collection: self.collection,
            owner_id: self.owner_id,
            body,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn row_to_raw(row: &Row<'_>) -> rusqlite::Result<RawDocument> {
    Ok(RawDocument {
        id: row.get(0)?,
        collection: row.get(1)?,
        owner_id: row.get(2)?,
        body: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}
