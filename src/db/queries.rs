// Database queries — CRUD operations for all tables.
//
// Every database interaction goes through this module. This keeps SQL
// contained in one place and gives the rest of the app clean Rust interfaces.

use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};

use crate::engine::{KeywordSet, TranscriptSegment};

use super::models::{ApiKeyInfo, Conversation, KeywordSetRecord, Project, StoredTranscript};

// --- Projects ---

/// Insert a new project and return its id.
pub fn insert_project(
    conn: &Connection,
    name: &str,
    builder_name: &str,
    location: Option<&str>,
    description: Option<&str>,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO projects (name, builder_name, location, description)
         VALUES (?1, ?2, ?3, ?4)",
        params![name, builder_name, location, description],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Get a project by id.
pub fn get_project(conn: &Connection, id: i64) -> Result<Option<Project>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, builder_name, location, description, created_at, updated_at
         FROM projects WHERE id = ?1",
    )?;
    let result = stmt.query_row(params![id], project_from_row).optional()?;
    Ok(result)
}

/// Get a project by id only if its builder name matches exactly.
/// Used to validate the (project, builder) pair on match requests.
pub fn get_project_for_builder(
    conn: &Connection,
    id: i64,
    builder_name: &str,
) -> Result<Option<Project>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, builder_name, location, description, created_at, updated_at
         FROM projects WHERE id = ?1 AND builder_name = ?2",
    )?;
    let result = stmt
        .query_row(params![id, builder_name], project_from_row)
        .optional()?;
    Ok(result)
}

fn project_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        builder_name: row.get(2)?,
        location: row.get(3)?,
        description: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

pub fn project_count(conn: &Connection) -> Result<i64> {
    Ok(conn.query_row("SELECT COUNT(*) FROM projects", [], |row| row.get(0))?)
}

// --- Conversations ---

/// Insert or update a conversation (upsert on conversation_id).
pub fn upsert_conversation(
    conn: &Connection,
    conversation_id: &str,
    agent_id: Option<&str>,
    project_id: i64,
) -> Result<()> {
    conn.execute(
        "INSERT INTO conversations (conversation_id, agent_id, project_id)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(conversation_id) DO UPDATE SET agent_id = ?2, project_id = ?3",
        params![conversation_id, agent_id, project_id],
    )?;
    Ok(())
}

pub fn get_conversation(conn: &Connection, conversation_id: &str) -> Result<Option<Conversation>> {
    let mut stmt = conn.prepare(
        "SELECT conversation_id, agent_id, project_id FROM conversations
         WHERE conversation_id = ?1",
    )?;
    let result = stmt
        .query_row(params![conversation_id], |row| {
            Ok(Conversation {
                conversation_id: row.get(0)?,
                agent_id: row.get(1)?,
                project_id: row.get(2)?,
            })
        })
        .optional()?;
    Ok(result)
}

/// All conversation ids for a project, in insertion (rowid) order.
pub fn list_conversation_ids(conn: &Connection, project_id: i64) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT conversation_id FROM conversations WHERE project_id = ?1 ORDER BY rowid",
    )?;
    let ids = stmt
        .query_map(params![project_id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(ids)
}

pub fn conversation_count(conn: &Connection) -> Result<i64> {
    Ok(conn.query_row("SELECT COUNT(*) FROM conversations", [], |row| row.get(0))?)
}

// --- Transcripts ---

/// Store a transcript (upsert on transcription_id). Segments are
/// serialized as a JSON array of {speaker, text}.
pub fn save_transcript(
    conn: &Connection,
    transcription_id: &str,
    conversation_id: &str,
    transcript_text: &str,
    segments: &[TranscriptSegment],
) -> Result<()> {
    let segments_json = serde_json::to_string(segments)?;
    conn.execute(
        "INSERT INTO transcripts (transcription_id, conversation_id, transcript_text, diarized_segments)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(transcription_id) DO UPDATE SET
            conversation_id = ?2,
            transcript_text = ?3,
            diarized_segments = ?4",
        params![transcription_id, conversation_id, transcript_text, segments_json],
    )?;
    Ok(())
}

/// Load the transcript for a conversation, if one exists.
pub fn get_transcript(conn: &Connection, conversation_id: &str) -> Result<Option<StoredTranscript>> {
    let mut stmt = conn.prepare(
        "SELECT transcription_id, conversation_id, transcript_text, diarized_segments
         FROM transcripts WHERE conversation_id = ?1",
    )?;
    let row: Option<(String, String, Option<String>, Option<String>)> = stmt
        .query_row(params![conversation_id], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
        })
        .optional()?;

    match row {
        Some((transcription_id, conversation_id, text, segments_json)) => {
            let segments: Vec<TranscriptSegment> = match segments_json {
                Some(json) => serde_json::from_str(&json)?,
                None => Vec::new(),
            };
            Ok(Some(StoredTranscript {
                transcription_id,
                conversation_id,
                transcript_text: text.unwrap_or_default(),
                segments,
            }))
        }
        None => Ok(None),
    }
}

// --- Keyword sets ---

/// Replace the keyword set for a (project, builder) pair.
/// Returns true if an existing set was replaced, false if this was the
/// first set for the pair. Builder name lookup is case-insensitive,
/// matching the historical ingest behavior.
pub fn replace_keywords(
    conn: &Connection,
    project_id: i64,
    builder_name: &str,
    keywords: &KeywordSet,
    actor: Option<&str>,
) -> Result<bool> {
    let keywords_json = serde_json::to_string(keywords)?;

    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM keyword_sets
             WHERE project_id = ?1 AND builder_name = ?2 COLLATE NOCASE",
            params![project_id, builder_name],
            |row| row.get(0),
        )
        .optional()?;

    match existing {
        Some(id) => {
            conn.execute(
                "UPDATE keyword_sets
                 SET keywords = ?1, updated_on = datetime('now'), updated_by = ?2
                 WHERE id = ?3",
                params![keywords_json, actor, id],
            )?;
            Ok(true)
        }
        None => {
            conn.execute(
                "INSERT INTO keyword_sets (project_id, builder_name, keywords, created_by, updated_by)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                params![project_id, builder_name, keywords_json, actor],
            )?;
            Ok(false)
        }
    }
}

/// Load the keyword set for a (project, builder) pair.
pub fn get_keywords(
    conn: &Connection,
    project_id: i64,
    builder_name: &str,
) -> Result<Option<KeywordSetRecord>> {
    let mut stmt = conn.prepare(
        "SELECT project_id, builder_name, keywords, created_on, created_by, updated_on, updated_by
         FROM keyword_sets
         WHERE project_id = ?1 AND builder_name = ?2 COLLATE NOCASE",
    )?;
    let row: Option<(i64, String, String, String, Option<String>, String, Option<String>)> = stmt
        .query_row(params![project_id, builder_name], |row| {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
                row.get(6)?,
            ))
        })
        .optional()?;

    match row {
        Some((project_id, builder_name, json, created_on, created_by, updated_on, updated_by)) => {
            let keywords: KeywordSet = serde_json::from_str(&json)?;
            Ok(Some(KeywordSetRecord {
                project_id,
                builder_name,
                keywords,
                created_on,
                created_by,
                updated_on,
                updated_by,
            }))
        }
        None => Ok(None),
    }
}

pub fn keyword_set_count(conn: &Connection) -> Result<i64> {
    Ok(conn.query_row("SELECT COUNT(*) FROM keyword_sets", [], |row| row.get(0))?)
}

// --- API keys ---

/// Store a new API key record. Only the SHA-256 hash of the key is kept.
pub fn insert_api_key(
    conn: &Connection,
    key_id: &str,
    key_hash: &str,
    owner_name: &str,
    owner_email: Option<&str>,
    description: Option<&str>,
) -> Result<()> {
    conn.execute(
        "INSERT INTO api_keys (key_id, key_hash, owner_name, owner_email, description)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![key_id, key_hash, owner_name, owner_email, description],
    )?;
    Ok(())
}

/// Look up an active key by hash and touch its last_used timestamp.
/// Returns the key metadata when authentication succeeds.
pub fn authenticate_api_key(conn: &Connection, key_hash: &str) -> Result<Option<ApiKeyInfo>> {
    let mut stmt = conn.prepare(
        "SELECT key_id, owner_name, owner_email, description, is_active, created_at, last_used
         FROM api_keys WHERE key_hash = ?1 AND is_active = 1",
    )?;
    let info = stmt
        .query_row(params![key_hash], api_key_from_row)
        .optional()?;

    if let Some(ref key) = info {
        conn.execute(
            "UPDATE api_keys SET last_used = datetime('now') WHERE key_id = ?1",
            params![key.key_id],
        )?;
    }
    Ok(info)
}

/// All keys, newest first (metadata only — hashes never leave this module).
pub fn list_api_keys(conn: &Connection) -> Result<Vec<ApiKeyInfo>> {
    let mut stmt = conn.prepare(
        "SELECT key_id, owner_name, owner_email, description, is_active, created_at, last_used
         FROM api_keys ORDER BY created_at DESC",
    )?;
    let keys = stmt
        .query_map([], api_key_from_row)?
        .collect::<rusqlite::Result<Vec<ApiKeyInfo>>>()?;
    Ok(keys)
}

/// Activate or deactivate a key. Returns false if the key doesn't exist.
pub fn set_api_key_active(conn: &Connection, key_id: &str, active: bool) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE api_keys SET is_active = ?1 WHERE key_id = ?2",
        params![active as i64, key_id],
    )?;
    Ok(changed > 0)
}

fn api_key_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ApiKeyInfo> {
    Ok(ApiKeyInfo {
        key_id: row.get(0)?,
        owner_name: row.get(1)?,
        owner_email: row.get(2)?,
        description: row.get(3)?,
        is_active: row.get::<_, i64>(4)? != 0,
        created_at: row.get(5)?,
        last_used: row.get(6)?,
    })
}
