// Database trait — backend-agnostic async interface for all DB operations.
//
// Implementor: SqliteDatabase (wraps rusqlite). All methods are async so a
// native async backend could sit behind the same interface later without
// touching callers.
//
// The trait mirrors the queries.rs function signatures, so callers work
// against `Arc<dyn Database>` and never see a Connection.

use anyhow::Result;
use async_trait::async_trait;

use crate::engine::{KeywordSet, TranscriptSegment};

use super::models::{ApiKeyInfo, Conversation, KeywordSetRecord, Project, StoredTranscript};

#[async_trait]
pub trait Database: Send + Sync {
    // --- Lifecycle ---

    /// Count the number of user-created tables in the database.
    async fn table_count(&self) -> Result<i64>;

    // --- Projects ---

    /// Create a project and return its id.
    async fn insert_project(
        &self,
        name: &str,
        builder_name: &str,
        location: Option<&str>,
        description: Option<&str>,
    ) -> Result<i64>;

    /// Get a project by id.
    async fn get_project(&self, id: i64) -> Result<Option<Project>>;

    /// Get a project by id only if the builder name matches exactly.
    async fn get_project_for_builder(
        &self,
        id: i64,
        builder_name: &str,
    ) -> Result<Option<Project>>;

    // --- Conversations ---

    /// Insert or update a conversation.
    async fn upsert_conversation(
        &self,
        conversation_id: &str,
        agent_id: Option<&str>,
        project_id: i64,
    ) -> Result<()>;

    /// Get a conversation by id.
    async fn get_conversation(&self, conversation_id: &str) -> Result<Option<Conversation>>;

    /// All conversation ids for a project, in insertion order.
    async fn list_conversation_ids(&self, project_id: i64) -> Result<Vec<String>>;

    // --- Transcripts ---

    /// Store a transcript with its diarized segments.
    async fn save_transcript(
        &self,
        transcription_id: &str,
        conversation_id: &str,
        transcript_text: &str,
        segments: &[TranscriptSegment],
    ) -> Result<()>;

    /// Load the transcript for a conversation.
    async fn get_transcript(&self, conversation_id: &str) -> Result<Option<StoredTranscript>>;

    // --- Keyword sets ---

    /// Replace the keyword set for a (project, builder) pair.
    /// Returns true if an existing set was replaced.
    async fn replace_keywords(
        &self,
        project_id: i64,
        builder_name: &str,
        keywords: &KeywordSet,
        actor: Option<&str>,
    ) -> Result<bool>;

    /// Load the keyword set for a (project, builder) pair.
    async fn get_keywords(
        &self,
        project_id: i64,
        builder_name: &str,
    ) -> Result<Option<KeywordSetRecord>>;

    // --- API keys ---

    /// Store a new API key record (hash only).
    async fn insert_api_key(
        &self,
        key_id: &str,
        key_hash: &str,
        owner_name: &str,
        owner_email: Option<&str>,
        description: Option<&str>,
    ) -> Result<()>;

    /// Authenticate by key hash; touches last_used on success.
    async fn authenticate_api_key(&self, key_hash: &str) -> Result<Option<ApiKeyInfo>>;

    /// All key metadata, newest first.
    async fn list_api_keys(&self) -> Result<Vec<ApiKeyInfo>>;

    /// Activate or deactivate a key. Returns false if it doesn't exist.
    async fn set_api_key_active(&self, key_id: &str, active: bool) -> Result<bool>;

    // --- Stats ---

    /// Row counts for the status display: (projects, conversations, keyword sets).
    async fn stats(&self) -> Result<(i64, i64, i64)>;
}
