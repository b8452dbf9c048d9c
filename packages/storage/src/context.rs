// ABOUTME: Per-identity conversation history as one JSON file per identity
// ABOUTME: Best-effort storage, concurrent writers to one identity are last-write-wins

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, error, warn};

use promptforge_core::ContextMessage;

use crate::error::StorageResult;
use crate::STORAGE_VERSION;

#[derive(Debug, Serialize, Deserialize)]
struct ContextRecord {
    version: String,
    identity: String,
    messages: Vec<ContextMessage>,
}

impl ContextRecord {
    fn new(identity: &str) -> Self {
        Self {
            version: STORAGE_VERSION.to_string(),
            identity: identity.to_string(),
            messages: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ContextStats {
    pub identities: usize,
    pub total_messages: usize,
}

/// Conversation history store. Records are read at pipeline start and
/// appended at pipeline end; nothing here is transactional and a torn race
/// between two writers to one identity loses the earlier write.
pub struct ContextStore {
    dir: PathBuf,
}

impl ContextStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Loads the ordered message history for an identity; missing or
    /// corrupt files degrade to an empty history.
    pub async fn load(&self, identity: &str) -> StorageResult<Vec<ContextMessage>> {
        let path = self.record_path(identity);
        if fs::metadata(&path).await.is_err() {
            return Ok(Vec::new());
        }

        match fs::read_to_string(&path).await {
            Ok(content) => match serde_json::from_str::<ContextRecord>(&content) {
                Ok(record) => {
                    debug!(
                        identity,
                        messages = record.messages.len(),
                        "Loaded context history"
                    );
                    Ok(record.messages)
                }
                Err(e) => {
                    error!(identity, "Failed to parse context record: {}", e);
                    warn!(identity, "Using empty history");
                    Ok(Vec::new())
                }
            },
            Err(e) => {
                error!(identity, "Failed to read context record: {}", e);
                warn!(identity, "Using empty history");
                Ok(Vec::new())
            }
        }
    }

    /// Appends a message to the identity's history and persists it.
    pub async fn append(&self, identity: &str, message: ContextMessage) -> StorageResult<()> {
        let path = self.record_path(identity);
        fs::create_dir_all(&self.dir).await?;

        let mut record = match fs::read_to_string(&path).await {
            Ok(content) => serde_json::from_str::<ContextRecord>(&content)
                .unwrap_or_else(|_| ContextRecord::new(identity)),
            Err(_) => ContextRecord::new(identity),
        };

        record.messages.push(message);
        let json = serde_json::to_string_pretty(&record)?;
        fs::write(&path, json).await?;

        debug!(
            identity,
            messages = record.messages.len(),
            "Appended context message"
        );
        Ok(())
    }

    pub async fn stats(&self) -> StorageResult<ContextStats> {
        let mut identities = 0;
        let mut total_messages = 0;

        if fs::metadata(&self.dir).await.is_ok() {
            let mut entries = fs::read_dir(&self.dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                if entry.path().extension().is_some_and(|e| e == "json") {
                    identities += 1;
                    if let Ok(content) = fs::read_to_string(entry.path()).await {
                        if let Ok(record) = serde_json::from_str::<ContextRecord>(&content) {
                            total_messages += record.messages.len();
                        }
                    }
                }
            }
        }

        Ok(ContextStats {
            identities,
            total_messages,
        })
    }

    fn record_path(&self, identity: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_identity(identity)))
    }
}

/// Maps an arbitrary identity onto a safe file name. Bytes outside
/// `[A-Za-z0-9_-]` are percent-encoded, so distinct identities never
/// collide and nothing can escape the storage directory.
fn sanitize_identity(identity: &str) -> String {
    use std::fmt::Write;

    let mut out = String::with_capacity(identity.len());
    for byte in identity.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_' | b'-' => out.push(byte as char),
            other => {
                let _ = write!(out, "%{:02X}", other);
            }
        }
    }
    if out.is_empty() {
        out.push_str("anonymous");
    }
    out
}
