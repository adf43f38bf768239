//! One JSON file per session under a documents directory.

use async_trait::async_trait;
use chrono::Utc;
use docuforge_application::{DocumentStore, PersistenceError, StoredDocument};
use docuforge_domain::{SessionId, StructuredContent};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const DRAFT: &str = "draft";

pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File for a session.
    ///
    /// Bytes outside `[A-Za-z0-9-]` are written as `_xx` (lowercase hex),
    /// `_` included, so distinct ids never share a file.
    pub fn path_for(&self, session: &SessionId) -> PathBuf {
        let mut name = String::with_capacity(session.as_str().len());
        for byte in session.as_str().bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'-' {
                name.push(byte as char);
            } else {
                name.push_str(&format!("_{byte:02x}"));
            }
        }
        self.dir.join(format!("{name}.json"))
    }

    /// Load the saved document for a session, if any.
    pub async fn load(&self, session: &SessionId) -> Result<Option<StoredDocument>, PersistenceError> {
        let path = self.path_for(session);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(PersistenceError::Storage(format!("{}: {}", path.display(), e))),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| PersistenceError::Serialization(e.to_string()))
    }
}

#[async_trait]
impl DocumentStore for JsonFileStore {
    async fn save_content(
        &self,
        session: &SessionId,
        content: &StructuredContent,
    ) -> Result<StoredDocument, PersistenceError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| PersistenceError::Storage(format!("{}: {}", self.dir.display(), e)))?;

        let now = Utc::now();
        let created_at = match self.load(session).await {
            Ok(Some(existing)) => existing.created_at,
            _ => now,
        };

        let document = StoredDocument {
            id: session.as_str().to_string(),
            title: content.title.clone(),
            document_type: content.document_type.clone(),
            status: DRAFT.to_string(),
            content: content.clone(),
            created_at,
            updated_at: now,
        };

        let json = serde_json::to_vec_pretty(&document)
            .map_err(|e| PersistenceError::Serialization(e.to_string()))?;

        // Write then rename so readers never see a half-written file
        let path = self.path_for(session);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| PersistenceError::Storage(format!("{}: {}", tmp.display(), e)))?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            if let Err(cleanup) = tokio::fs::remove_file(&tmp).await {
                warn!(path = %tmp.display(), "Failed to remove temporary file: {}", cleanup);
            }
            return Err(PersistenceError::Storage(format!("{}: {}", path.display(), e)));
        }

        debug!(session = %session, path = %path.display(), words = document.word_count(), "Document saved");
        Ok(document)
    }
}
