// Database schema — table creation and migrations.
//
// We use a simple version-based migration approach: a `schema_version` table
// tracks which migrations have run, and each migration is a function that
// executes SQL statements.

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Create all tables if they don't exist yet.
///
/// This is idempotent — safe to call on every startup.
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        -- Tracks schema version for future migrations
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Projects own conversations and keyword sets
        CREATE TABLE IF NOT EXISTS projects (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            builder_name TEXT NOT NULL,
            location TEXT,
            description TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- One row per recorded call
        CREATE TABLE IF NOT EXISTS conversations (
            conversation_id TEXT PRIMARY KEY,
            agent_id TEXT,
            project_id INTEGER NOT NULL
        );

        -- Transcripts: flat text plus the diarized segment list
        -- Segments stored as JSON so the shape can evolve without migrations
        CREATE TABLE IF NOT EXISTS transcripts (
            transcription_id TEXT PRIMARY KEY,
            conversation_id TEXT NOT NULL,
            transcript_text TEXT,
            diarized_segments TEXT            -- JSON array of {speaker, text}
        );

        -- Keyword sets, one per (project, builder) pair
        -- Keywords stored as an ordered JSON array of {category, keywords[]}
        CREATE TABLE IF NOT EXISTS keyword_sets (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            project_id INTEGER NOT NULL,
            builder_name TEXT NOT NULL,
            keywords TEXT NOT NULL,
            created_on TEXT NOT NULL DEFAULT (datetime('now')),
            created_by TEXT,
            updated_on TEXT NOT NULL DEFAULT (datetime('now')),
            updated_by TEXT,
            UNIQUE(project_id, builder_name)
        );

        -- API keys for the HTTP surface; only the SHA-256 hash is stored
        CREATE TABLE IF NOT EXISTS api_keys (
            key_id TEXT PRIMARY KEY,
            key_hash TEXT NOT NULL UNIQUE,
            owner_name TEXT NOT NULL,
            owner_email TEXT,
            description TEXT,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            last_used TEXT
        );

        -- Index for looking up a project's conversations
        CREATE INDEX IF NOT EXISTS idx_conversations_project
            ON conversations(project_id);

        -- Index for looking up a conversation's transcript
        CREATE INDEX IF NOT EXISTS idx_transcripts_conversation
            ON transcripts(conversation_id);
        ",
    )
    .context("Failed to create database tables")?;

    // Record initial schema version if not already set
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [1],
    )?;

    Ok(())
}

/// Run a migration if it hasn't been applied yet.
/// The migration function receives the connection and should execute its SQL.
#[allow(dead_code)]
fn run_migration<F>(conn: &Connection, version: i64, migrate: F) -> Result<()>
where
    F: FnOnce(&Connection) -> rusqlite::Result<()>,
{
    let already_applied: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM schema_version WHERE version = ?1",
        [version],
        |row| row.get(0),
    )?;

    if !already_applied {
        migrate(conn).with_context(|| format!("Migration v{version} failed"))?;
        conn.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            [version],
        )?;
    }

    Ok(())
}

/// Count the number of tables in the database (useful for init confirmation).
pub fn table_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}
