// Data models — Rust structs that map to database rows.
//
// These are the types that flow through the application. They're separate
// from the database queries so other modules can use them without depending
// on rusqlite directly.

use serde::{Deserialize, Serialize};

use crate::engine::{KeywordSet, TranscriptSegment};

/// A project row: the tenant-ish unit that owns conversations and keyword
/// sets. `builder_name` scopes keyword sets within a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub builder_name: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// A recorded call tied to a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub conversation_id: String,
    pub agent_id: Option<String>,
    pub project_id: i64,
}

/// A stored transcript: the flat text plus the diarized segment list the
/// engine consumes. Segments are stored as a JSON column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredTranscript {
    pub transcription_id: String,
    pub conversation_id: String,
    pub transcript_text: String,
    pub segments: Vec<TranscriptSegment>,
}

/// A keyword set row for a (project, builder) pair, with audit columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordSetRecord {
    pub project_id: i64,
    pub builder_name: String,
    pub keywords: KeywordSet,
    pub created_on: String,
    pub created_by: Option<String>,
    pub updated_on: String,
    pub updated_by: Option<String>,
}

/// API key metadata — everything except the key itself, which is stored
/// only as a SHA-256 hash and shown in full exactly once at creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeyInfo {
    pub key_id: String,
    pub owner_name: String,
    pub owner_email: Option<String>,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub last_used: Option<String>,
}
