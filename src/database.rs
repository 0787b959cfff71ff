//! SQLite storage for fetched transcripts

use crate::transcript::{TranscriptResult, TranscriptType};
use crate::Result;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::path::Path;
use uuid::Uuid;

/// A transcript as stored in the database
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptRecord {
    pub id: String,
    pub fetched_at: DateTime<Utc>,
    pub transcript: TranscriptResult,
}

/// Handle to the transcript database
///
/// Owns the connection pool; call [`TranscriptDatabase::close`] when done.
#[derive(Debug, Clone)]
pub struct TranscriptDatabase {
    pool: SqlitePool,
}

impl TranscriptDatabase {
    /// Open (creating if needed) the database file and its schema
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS transcripts (
                id TEXT PRIMARY KEY NOT NULL,
                video_id TEXT NOT NULL,
                language TEXT NOT NULL,
                transcript_type TEXT NOT NULL,
                duration REAL NOT NULL,
                transcript TEXT NOT NULL,
                fetched_at TEXT NOT NULL,
                UNIQUE (video_id, language)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert a transcript, replacing any earlier one for the same video and language
    pub async fn save_transcript(&self, transcript: &TranscriptResult) -> Result<TranscriptRecord> {
        let id = Uuid::new_v4().to_string();
        let fetched_at = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO transcripts (id, video_id, language, transcript_type, duration, transcript, fetched_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (video_id, language) DO UPDATE SET
                transcript_type = excluded.transcript_type,
                duration = excluded.duration,
                transcript = excluded.transcript,
                fetched_at = excluded.fetched_at
            "#,
        )
        .bind(&id)
        .bind(&transcript.video_id)
        .bind(&transcript.language)
        .bind(transcript.transcript_type.as_str())
        .bind(transcript.duration)
        .bind(&transcript.transcript)
        .bind(fetched_at)
        .execute(&self.pool)
        .await?;

        tracing::debug!(video_id = %transcript.video_id, language = %transcript.language, "saved transcript");

        self.get_transcript(&transcript.video_id, &transcript.language)
            .await?
            .ok_or_else(|| anyhow::anyhow!("transcript {} vanished after save", transcript.video_id))
    }

    /// Get the stored transcript for a video in one language
    pub async fn get_transcript(&self, video_id: &str, language: &str) -> Result<Option<TranscriptRecord>> {
        let row = sqlx::query(
            "SELECT * FROM transcripts WHERE video_id = ? AND language = ?",
        )
        .bind(video_id)
        .bind(language)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| Self::row_to_record(&r)).transpose()
    }

    /// Get all stored transcripts, newest first
    pub async fn list_transcripts(&self) -> Result<Vec<TranscriptRecord>> {
        let rows = sqlx::query("SELECT * FROM transcripts ORDER BY fetched_at DESC")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::row_to_record).collect()
    }

    /// Delete every stored transcript of a video, returning how many were removed
    pub async fn delete_transcript(&self, video_id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM transcripts WHERE video_id = ?")
            .bind(video_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Close the pool, waiting for open connections to finish
    pub async fn close(&self) {
        self.pool.close().await;
    }

    fn row_to_record(row: &SqliteRow) -> Result<TranscriptRecord> {
        let transcript_type: String = row.try_get("transcript_type")?;

        Ok(TranscriptRecord {
            id: row.try_get("id")?,
            fetched_at: row.try_get("fetched_at")?,
            transcript: TranscriptResult {
                video_id: row.try_get("video_id")?,
                language: row.try_get("language")?,
                transcript_type: transcript_type.parse::<TranscriptType>()?,
                duration: row.try_get("duration")?,
                transcript: row.try_get("transcript")?,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn open() -> (TempDir, TranscriptDatabase) {
        let dir = tempfile::tempdir().unwrap();
        let db = TranscriptDatabase::new(dir.path().join("transcripts.db"))
            .await
            .unwrap();
        (dir, db)
    }

    fn transcript(video_id: &str, language: &str, text: &str) -> TranscriptResult {
        TranscriptResult {
            video_id: video_id.to_string(),
            language: language.to_string(),
            transcript_type: TranscriptType::AutoGenerated,
            duration: 211.5,
            transcript: text.to_string(),
        }
    }

    #[tokio::test]
    async fn test_save_and_get() {
        let (_dir, db) = open().await;
        let saved = db
            .save_transcript(&transcript("dQw4w9WgXcQ", "en", "never gonna give you up"))
            .await
            .unwrap();
        assert!(!saved.id.is_empty());

        let loaded = db.get_transcript("dQw4w9WgXcQ", "en").await.unwrap().unwrap();
        assert_eq!(loaded, saved);
        assert_eq!(loaded.transcript.transcript_type, TranscriptType::AutoGenerated);
        assert_eq!(loaded.transcript.duration, 211.5);

        assert!(db.get_transcript("dQw4w9WgXcQ", "de").await.unwrap().is_none());
        db.close().await;
    }

    #[tokio::test]
    async fn test_save_replaces_same_language() {
        let (_dir, db) = open().await;
        db.save_transcript(&transcript("dQw4w9WgXcQ", "en", "first")).await.unwrap();
        db.save_transcript(&transcript("dQw4w9WgXcQ", "en", "second")).await.unwrap();
        db.save_transcript(&transcript("dQw4w9WgXcQ", "de", "zweite")).await.unwrap();

        let all = db.list_transcripts().await.unwrap();
        assert_eq!(all.len(), 2);

        let en = db.get_transcript("dQw4w9WgXcQ", "en").await.unwrap().unwrap();
        assert_eq!(en.transcript.transcript, "second");
    }

    #[tokio::test]
    async fn test_delete_transcript() {
        let (_dir, db) = open().await;
        db.save_transcript(&transcript("dQw4w9WgXcQ", "en", "a")).await.unwrap();
        db.save_transcript(&transcript("dQw4w9WgXcQ", "de", "b")).await.unwrap();
        db.save_transcript(&transcript("9bZkp7q19f0", "en", "c")).await.unwrap();

        assert_eq!(db.delete_transcript("dQw4w9WgXcQ").await.unwrap(), 2);
        assert_eq!(db.list_transcripts().await.unwrap().len(), 1);
        assert_eq!(db.delete_transcript("dQw4w9WgXcQ").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_reopen_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transcripts.db");

        let db = TranscriptDatabase::new(&path).await.unwrap();
        db.save_transcript(&transcript("dQw4w9WgXcQ", "en", "kept")).await.unwrap();
        db.close().await;

        let db = TranscriptDatabase::new(&path).await.unwrap();
        let loaded = db.get_transcript("dQw4w9WgXcQ", "en").await.unwrap();
        assert_eq!(loaded.map(|r| r.transcript.transcript).as_deref(), Some("kept"));
    }
}
