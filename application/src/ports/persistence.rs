//! Document persistence port
//!
//! The writer hands finished content to a [`DocumentStore`]. Storage is
//! optional: when no store is wired in, content is still returned to the
//! caller but nothing is saved.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use docuforge_domain::{SessionId, StructuredContent};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// A saved document as returned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: String,
    pub title: String,
    pub document_type: String,
    pub status: String,
    pub content: StructuredContent,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredDocument {
    pub fn word_count(&self) -> usize {
        self.content.word_count()
    }

    pub fn sections_count(&self) -> usize {
        self.content.sections.len()
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Replace the document for `session` with `content`.
    async fn save_content(
        &self,
        session: &SessionId,
        content: &StructuredContent,
    ) -> Result<StoredDocument, PersistenceError>;
}
