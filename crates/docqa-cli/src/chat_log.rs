//! Append-only log of answered questions and user feedback

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;
use uuid::Uuid;

use docqa_core::{Error, PipelineState, Result, SourceRef};

/// One answered question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRecord {
    pub conversation_id: Uuid,
    pub question: String,
    pub answer: String,
    pub sources: Vec<SourceRef>,
    pub evaluation: String,
    pub created_at: DateTime<Utc>,
}

/// A rating left for a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub conversation_id: Uuid,
    pub rating: u8,
    #[serde(default)]
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Chat and feedback logs stored as JSON Lines in one directory
pub struct ChatHistory {
    dir: PathBuf,
}

impl ChatHistory {
    pub const CHATS_FILE: &'static str = "chat_history.jsonl";
    pub const FEEDBACK_FILE: &'static str = "feedback.jsonl";

    /// Open the logs in `dir`, creating the directory if needed
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    /// Append a finished pipeline run
    pub async fn record_chat(&self, conversation_id: Uuid, state: &PipelineState) -> Result<ChatRecord> {
        let record = ChatRecord {
            conversation_id,
            question: state.query().to_string(),
            answer: state.answer_text(),
            sources: state.sources().to_vec(),
            evaluation: state.evaluation_text(),
            created_at: Utc::now(),
        };

        self.append(Self::CHATS_FILE, &record).await?;
        Ok(record)
    }

    /// Append a rating between 1 and 5
    pub async fn record_feedback(
        &self,
        conversation_id: Uuid,
        rating: u8,
        comment: Option<String>,
    ) -> Result<FeedbackRecord> {
        if !(1..=5).contains(&rating) {
            return Err(Error::InvalidInput(format!(
                "Rating must be between 1 and 5, got {}",
                rating
            )));
        }

        let record = FeedbackRecord {
            conversation_id,
            rating,
            comment: comment.filter(|c| !c.trim().is_empty()),
            created_at: Utc::now(),
        };

        self.append(Self::FEEDBACK_FILE, &record).await?;
        Ok(record)
    }

    pub async fn read_chats(&self) -> Result<Vec<ChatRecord>> {
        self.read_all(Self::CHATS_FILE).await
    }

    pub async fn read_feedback(&self) -> Result<Vec<FeedbackRecord>> {
        self.read_all(Self::FEEDBACK_FILE).await
    }

    async fn append<T: Serialize>(&self, file_name: &str, record: &T) -> Result<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let path = self.dir.join(file_name);
        let mut file = OpenOptions::new().create(true).append(true).open(&path).await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        debug!(path = %path.display(), "Appended history record");
        Ok(())
    }

    async fn read_all<T: DeserializeOwned>(&self, file_name: &str) -> Result<Vec<T>> {
        let path = self.dir.join(file_name);
        if !fs::try_exists(&path).await? {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path).await?;
        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(Error::from))
            .collect()
    }
}
