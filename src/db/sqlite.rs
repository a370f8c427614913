// SqliteDatabase — rusqlite backend implementing the Database trait.
//
// The Connection is wrapped in tokio::sync::Mutex because Connection is !Send.
// Trait methods lock the mutex, do synchronous rusqlite work, and return.
// The lock is never held across .await points — Rust enforces this because
// MutexGuard is !Send.
//
// The free functions in queries.rs remain directly testable against a
// Connection, so this file stays a thin forwarding layer.

use anyhow::Result;
use async_trait::async_trait;
use rusqlite::Connection;
use tokio::sync::Mutex;

use crate::engine::{KeywordSet, TranscriptSegment};

use super::models::{ApiKeyInfo, Conversation, KeywordSetRecord, Project, StoredTranscript};
use super::traits::Database;

pub struct SqliteDatabase {
    conn: Mutex<Connection>,
}

impl SqliteDatabase {
    /// Wrap an already-opened rusqlite Connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

#[async_trait]
impl Database for SqliteDatabase {
    async fn table_count(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::schema::table_count(&conn)
    }

    async fn insert_project(
        &self,
        name: &str,
        builder_name: &str,
        location: Option<&str>,
        description: Option<&str>,
    ) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::queries::insert_project(&conn, name, builder_name, location, description)
    }

    async fn get_project(&self, id: i64) -> Result<Option<Project>> {
        let conn = self.conn.lock().await;
        super::queries::get_project(&conn, id)
    }

    async fn get_project_for_builder(
        &self,
        id: i64,
        builder_name: &str,
    ) -> Result<Option<Project>> {
        let conn = self.conn.lock().await;
        super::queries::get_project_for_builder(&conn, id, builder_name)
    }

    async fn upsert_conversation(
        &self,
        conversation_id: &str,
        agent_id: Option<&str>,
        project_id: i64,
    ) -> Result<()> {
        let conn = self.conn.lock().await;
        super::queries::upsert_conversation(&conn, conversation_id, agent_id, project_id)
    }

    async fn get_conversation(&self, conversation_id: &str) -> Result<Option<Conversation>> {
        let conn = self.conn.lock().await;
        super::queries::get_conversation(&conn, conversation_id)
    }

    async fn list_conversation_ids(&self, project_id: i64) -> Result<Vec<String>> {
        let conn = self.conn.lock().await;
        super::queries::list_conversation_ids(&conn, project_id)
    }

    async fn save_transcript(
        &self,
        transcription_id: &str,
        conversation_id: &str,
        transcript_text: &str,
        segments: &[TranscriptSegment],
    ) -> Result<()> {
        let conn = self.conn.lock().await;
        super::queries::save_transcript(
            &conn,
            transcription_id,
            conversation_id,
            transcript_text,
            segments,
        )
    }

    async fn get_transcript(&self, conversation_id: &str) -> Result<Option<StoredTranscript>> {
        let conn = self.conn.lock().await;
        super::queries::get_transcript(&conn, conversation_id)
    }

    async fn replace_keywords(
        &self,
        project_id: i64,
        builder_name: &str,
        keywords: &KeywordSet,
        actor: Option<&str>,
    ) -> Result<bool> {
        let conn = self.conn.lock().await;
        super::queries::replace_keywords(&conn, project_id, builder_name, keywords, actor)
    }

    async fn get_keywords(
        &self,
        project_id: i64,
        builder_name: &str,
    ) -> Result<Option<KeywordSetRecord>> {
        let conn = self.conn.lock().await;
        super::queries::get_keywords(&conn, project_id, builder_name)
    }

    async fn insert_api_key(
        &self,
        key_id: &str,
        key_hash: &str,
        owner_name: &str,
        owner_email: Option<&str>,
        description: Option<&str>,
    ) -> Result<()> {
        let conn = self.conn.lock().await;
        super::queries::insert_api_key(&conn, key_id, key_hash, owner_name, owner_email, description)
    }

    async fn authenticate_api_key(&self, key_hash: &str) -> Result<Option<ApiKeyInfo>> {
        let conn = self.conn.lock().await;
        super::queries::authenticate_api_key(&conn, key_hash)
    }

    async fn list_api_keys(&self) -> Result<Vec<ApiKeyInfo>> {
        let conn = self.conn.lock().await;
        super::queries::list_api_keys(&conn)
    }

    async fn set_api_key_active(&self, key_id: &str, active: bool) -> Result<bool> {
        let conn = self.conn.lock().await;
        super::queries::set_api_key_active(&conn, key_id, active)
    }

    async fn stats(&self) -> Result<(i64, i64, i64)> {
        let conn = self.conn.lock().await;
        Ok((
            super::queries::project_count(&conn)?,
            super::queries::conversation_count(&conn)?,
            super::queries::keyword_set_count(&conn)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::create_tables;

    async fn test_db() -> SqliteDatabase {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        SqliteDatabase::new(conn)
    }

    #[tokio::test]
    async fn test_trait_table_count() {
        let db = test_db().await;
        assert_eq!(db.table_count().await.unwrap(), 6);
    }

    #[tokio::test]
    async fn test_trait_project_and_conversation() {
        let db = test_db().await;
        let id = db
            .insert_project("Support Line", "acme", None, None)
            .await
            .unwrap();
        db.upsert_conversation("conv-1", Some("agent-3"), id)
            .await
            .unwrap();

        let conv = db.get_conversation("conv-1").await.unwrap().unwrap();
        assert_eq!(conv.project_id, id);
        assert_eq!(db.list_conversation_ids(id).await.unwrap(), vec!["conv-1"]);
    }

    #[tokio::test]
    async fn test_trait_transcript_roundtrip() {
        let db = test_db().await;
        let segments = vec![TranscriptSegment::new("Speaker_0", "I want a refund")];
        db.save_transcript("tr-1", "conv-1", "I want a refund", &segments)
            .await
            .unwrap();
        let stored = db.get_transcript("conv-1").await.unwrap().unwrap();
        assert_eq!(stored.segments, segments);
    }

    #[tokio::test]
    async fn test_trait_keywords_roundtrip() {
        let db = test_db().await;
        let set = KeywordSet::from_entries([("Billing", "refund")]);
        db.replace_keywords(1, "acme", &set, None).await.unwrap();
        let record = db.get_keywords(1, "acme").await.unwrap().unwrap();
        assert_eq!(record.keywords, set);
    }

    #[tokio::test]
    async fn test_trait_stats() {
        let db = test_db().await;
        db.insert_project("P", "b", None, None).await.unwrap();
        let (projects, conversations, keyword_sets) = db.stats().await.unwrap();
        assert_eq!((projects, conversations, keyword_sets), (1, 0, 0));
    }
}
