use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use callscan::config::Config;
use callscan::db::models::{Conversation, KeywordSetRecord, Project, StoredTranscript};
use callscan::db::Database;
use callscan::engine::{KeywordMatcher, KeywordSet, TranscriptSegment};

/// Callscan: keyword intelligence for diarized call transcripts.
///
/// Loads transcripts and categorized keyword sets, fuzzy-matches keywords
/// against what was said, and attributes every match to the agent or the
/// customer.
#[derive(Parser)]
#[command(name = "callscan", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Register a project
    AddProject {
        /// Unique project name
        name: String,

        #[arg(long)]
        builder_name: String,

        #[arg(long)]
        location: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },

    /// Load a diarized transcript for a conversation
    LoadTranscript {
        conversation_id: String,

        #[arg(long)]
        project_id: i64,

        /// Agent identifier recorded on the conversation
        #[arg(long)]
        agent_id: Option<String>,

        /// Transcription id (defaults to "tr-<conversation_id>")
        #[arg(long)]
        transcription_id: Option<String>,

        /// Path to a JSON array of {speaker, text} segments
        file: PathBuf,
    },

    /// Replace the keyword set for a project and builder
    LoadKeywords {
        #[arg(long)]
        project_id: i64,

        #[arg(long)]
        builder_name: String,

        /// Path to a JSON array of {category, keyword} entries
        file: PathBuf,
    },

    /// Show the keyword set for a project and builder
    ShowKeywords {
        #[arg(long)]
        project_id: i64,

        #[arg(long)]
        builder_name: String,
    },

    /// Match keywords against a conversation's transcript
    Match {
        conversation_id: String,

        #[arg(long)]
        project_id: i64,

        #[arg(long)]
        builder_name: String,

        /// Use literal containment matching instead of fuzzy scoring
        #[arg(long)]
        containment: bool,

        /// Override the fuzzy match threshold (0-100)
        #[arg(long)]
        threshold: Option<u32>,

        /// Emit the raw JSON report instead of the terminal view
        #[arg(long)]
        json: bool,
    },

    /// Export containment-mode match records as JSON rows
    Export {
        conversation_id: String,

        #[arg(long)]
        project_id: i64,

        #[arg(long)]
        builder_name: String,

        /// Output file (stdout when omitted)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Run the fuzzy matcher across every conversation of a project
    Batch {
        #[arg(long)]
        project_id: i64,

        #[arg(long)]
        builder_name: String,

        /// Number of conversations to match in parallel (default: 8)
        #[arg(long, default_value = "8")]
        concurrency: u32,

        /// Override the fuzzy match threshold (0-100)
        #[arg(long)]
        threshold: Option<u32>,
    },

    /// Show system status (DB stats)
    Status,

    /// Start the HTTP API server
    #[cfg(feature = "web")]
    Serve {
        #[arg(long, default_value = "8080")]
        port: u16,

        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("callscan=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            info!("Initializing Callscan database...");
            let config = Config::load()?;
            let db = callscan::db::initialize_sqlite(&config.db_path)?;
            let table_count = db.table_count().await?;
            println!("Database initialized at: {}", config.db_path);
            println!("Tables created: {table_count}");
            println!("\nCallscan is ready. Next steps:");
            println!("  callscan add-project <name> --builder-name <builder>");
            println!("  callscan load-transcript <conversation> --project-id <id> <segments.json>");
            println!("  callscan load-keywords --project-id <id> --builder-name <builder> <keywords.json>");
        }

        Commands::AddProject {
            name,
            builder_name,
            location,
            description,
        } => {
            let config = Config::load()?;
            let db = open_database(&config)?;
            let id = db
                .insert_project(
                    &name,
                    builder_name.trim(),
                    location.as_deref(),
                    description.as_deref(),
                )
                .await?;
            println!("Project {} created with id {id}", name.bold());
        }

        Commands::LoadTranscript {
            conversation_id,
            project_id,
            agent_id,
            transcription_id,
            file,
        } => {
            let config = Config::load()?;
            let db = open_database(&config)?;

            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let segments: Vec<TranscriptSegment> = serde_json::from_str(&raw)
                .with_context(|| format!("{} is not a JSON array of {{speaker, text}}", file.display()))?;

            // Flat text is derived from the segments; the engine only uses
            // the diarized list, but the flat form is kept for inspection.
            let transcript_text = segments
                .iter()
                .map(|s| s.text.as_str())
                .collect::<Vec<_>>()
                .join(" ");

            let transcription_id =
                transcription_id.unwrap_or_else(|| format!("tr-{conversation_id}"));

            db.upsert_conversation(&conversation_id, agent_id.as_deref(), project_id)
                .await?;
            db.save_transcript(
                &transcription_id,
                &conversation_id,
                &transcript_text,
                &segments,
            )
            .await?;

            println!(
                "Stored transcript {} ({} segments) for conversation {}",
                transcription_id,
                segments.len(),
                conversation_id.bold()
            );
        }

        Commands::LoadKeywords {
            project_id,
            builder_name,
            file,
        } => {
            let config = Config::load()?;
            let db = open_database(&config)?;

            let builder_name = builder_name.trim().to_string();
            if db
                .get_project_for_builder(project_id, &builder_name)
                .await?
                .is_none()
            {
                anyhow::bail!(
                    "Project {project_id} with builder {builder_name:?} not found. \
                     Run `callscan add-project` first."
                );
            }

            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let entries: Vec<KeywordEntry> = serde_json::from_str(&raw).with_context(|| {
                format!("{} is not a JSON array of {{category, keyword}}", file.display())
            })?;

            let set = KeywordSet::from_entries(entries.into_iter().map(|e| (e.category, e.keyword)));
            if set.is_empty() {
                anyhow::bail!("No usable keywords in {} (all entries blank?)", file.display());
            }

            let replaced = db
                .replace_keywords(project_id, &builder_name, &set, None)
                .await?;

            let verb = if replaced { "Replaced" } else { "Loaded" };
            println!(
                "{verb} keyword set for project {project_id} / {}: {} categories, {} keywords",
                builder_name,
                set.category_count(),
                set.keyword_count()
            );
        }

        Commands::ShowKeywords {
            project_id,
            builder_name,
        } => {
            let config = Config::load()?;
            let db = open_database(&config)?;
            match db.get_keywords(project_id, builder_name.trim()).await? {
                Some(record) => {
                    callscan::output::terminal::display_keyword_set(&record.keywords);
                    println!("\n  Last updated: {}", record.updated_on.dimmed());
                }
                None => {
                    println!("No keywords found for project {project_id} / {builder_name}.");
                }
            }
        }

        Commands::Match {
            conversation_id,
            project_id,
            builder_name,
            containment,
            threshold,
            json,
        } => {
            let config = Config::load()?;
            let db = open_database(&config)?;

            if let Some(value) = threshold {
                if value > 100 {
                    anyhow::bail!("--threshold must be between 0 and 100, got {value}");
                }
            }

            let inputs =
                load_match_inputs(&db, &conversation_id, project_id, &builder_name).await?;
            let matcher = KeywordMatcher::new(config.matcher_config(threshold));

            if containment {
                let records = matcher
                    .match_containment(&inputs.transcript.segments, &inputs.keywords.keywords);
                if json {
                    println!("{}", serde_json::to_string_pretty(&records)?);
                } else {
                    callscan::output::terminal::display_containment_records(&records);
                }
            } else {
                let report =
                    matcher.match_fuzzy(&inputs.transcript.segments, &inputs.keywords.keywords);
                if json {
                    let envelope = serde_json::json!({
                        "status": "success",
                        "agent_id": inputs.conversation.agent_id,
                        "conversation_id": inputs.conversation.conversation_id,
                        "project_id": inputs.project.id,
                        "builder_name": inputs.project.builder_name,
                        "matched_Keywords": report,
                        "diarized_text": inputs.transcript.segments,
                        "agent_speaker": config.agent_speaker,
                        "customer_speaker": config.customer_speaker,
                    });
                    println!("{}", serde_json::to_string_pretty(&envelope)?);
                } else {
                    callscan::output::terminal::display_match_report(&report, &conversation_id);
                }
            }
        }

        Commands::Export {
            conversation_id,
            project_id,
            builder_name,
            output,
        } => {
            let config = Config::load()?;
            let db = open_database(&config)?;

            let inputs =
                load_match_inputs(&db, &conversation_id, project_id, &builder_name).await?;
            let matcher = KeywordMatcher::new(config.matcher_config(None));
            let records =
                matcher.match_containment(&inputs.transcript.segments, &inputs.keywords.keywords);

            // One flat row per hit, metadata repeated on every row — the
            // shape the spreadsheet layer expects.
            let rows: Vec<serde_json::Value> = records
                .iter()
                .map(|r| {
                    serde_json::json!({
                        "project_id": inputs.project.id,
                        "conversation_id": inputs.conversation.conversation_id,
                        "builder_name": inputs.project.builder_name,
                        "category": r.category,
                        "keyword": r.keyword,
                        "speaker": r.speaker,
                        "count": 1,
                        "matched_text": r.matched_text,
                    })
                })
                .collect();

            let document = serde_json::json!({
                "conversation_id": inputs.conversation.conversation_id,
                "project_id": inputs.project.id,
                "builder_name": inputs.project.builder_name,
                "exported_at": chrono::Utc::now().to_rfc3339(),
                "records": rows,
            });
            let rendered = serde_json::to_string_pretty(&document)?;

            match output {
                Some(path) => {
                    std::fs::write(&path, rendered)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!(
                        "Exported {} records to {}",
                        records.len(),
                        path.display().to_string().bold()
                    );
                }
                None => println!("{rendered}"),
            }
        }

        Commands::Batch {
            project_id,
            builder_name,
            concurrency,
            threshold,
        } => {
            let config = Config::load()?;
            let db = open_database(&config)?;

            let record = db
                .get_keywords(project_id, builder_name.trim())
                .await?
                .context("No keyword set for this project and builder. Run `callscan load-keywords` first.")?;

            let matcher = KeywordMatcher::new(config.matcher_config(threshold));
            let results = callscan::pipeline::batch::run(
                &db,
                &matcher,
                &record.keywords,
                project_id,
                concurrency as usize,
            )
            .await?;

            if results.is_empty() {
                return Ok(());
            }

            println!("\n{}", "=== Batch Results ===".bold());
            println!(
                "  {:<32} {:>8} {:>8}",
                "Conversation".dimmed(),
                "Keywords".dimmed(),
                "Matches".dimmed()
            );
            for result in &results {
                println!(
                    "  {:<32} {:>8} {:>8}",
                    result.conversation_id, result.matched_keywords, result.total_matches
                );
            }
            let total: u32 = results.iter().map(|r| r.total_matches).sum();
            println!("\n  {} conversations, {} total matches", results.len(), total);
        }

        Commands::Status => {
            let config = Config::load()?;
            let db = open_database(&config)?;
            callscan::status::show(&db, &config.db_path).await?;
        }

        #[cfg(feature = "web")]
        Commands::Serve { port, bind } => {
            let config = Config::load()?;
            let db = open_database(&config)?;
            callscan::web::run_server(config, db, port, &bind).await?;
        }
    }

    Ok(())
}

/// Everything the match and export commands need, loaded and validated.
struct MatchInputs {
    conversation: Conversation,
    project: Project,
    transcript: StoredTranscript,
    keywords: KeywordSetRecord,
}

/// Validate the conversation/project/builder chain and load the transcript
/// and keyword set — the CLI twin of the HTTP endpoint's checks.
async fn load_match_inputs(
    db: &Arc<dyn Database>,
    conversation_id: &str,
    project_id: i64,
    builder_name: &str,
) -> Result<MatchInputs> {
    let builder_name = builder_name.trim();

    let conversation = db
        .get_conversation(conversation_id)
        .await?
        .with_context(|| format!("Conversation {conversation_id:?} not found"))?;

    if conversation.project_id != project_id {
        anyhow::bail!(
            "Conversation {conversation_id:?} belongs to project {}, not {project_id}",
            conversation.project_id
        );
    }

    let project = db
        .get_project_for_builder(project_id, builder_name)
        .await?
        .with_context(|| {
            format!("Project {project_id} has no builder named {builder_name:?}")
        })?;

    let transcript = db
        .get_transcript(conversation_id)
        .await?
        .filter(|t| !t.segments.is_empty() || !t.transcript_text.is_empty())
        .with_context(|| format!("No transcription stored for conversation {conversation_id:?}"))?;

    let keywords = db
        .get_keywords(project_id, builder_name)
        .await?
        .with_context(|| {
            format!("No keyword set for project {project_id} and builder {builder_name:?}")
        })?;

    Ok(MatchInputs {
        conversation,
        project,
        transcript,
        keywords,
    })
}

/// Open the configured database, failing with a hint if it doesn't exist.
fn open_database(config: &Config) -> Result<Arc<dyn Database>> {
    callscan::db::open_sqlite(&config.db_path)
}

/// Flat keyword entry as it appears in keyword files and the replace API.
#[derive(serde::Deserialize)]
struct KeywordEntry {
    category: String,
    keyword: String,
}
