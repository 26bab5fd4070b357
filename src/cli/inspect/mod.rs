//! Inspect command - lists the cached records of a question

use std::path::Path;

use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;

use crate::config::StoreConfig;
use crate::domain::answer_cache::CachedAnswerRecord;
use crate::domain::evaluation::Evaluation;
use crate::infrastructure::cache::CacheStoreType;

/// Arguments for the inspect command
#[derive(Args, Debug, Clone)]
pub struct InspectArgs {
    /// Question ID
    #[arg(long)]
    pub question: String,
}

/// Printable view of a cached record; the embedding is reduced to its size
#[derive(Debug, Serialize)]
pub struct RecordView<'a> {
    pub answer_text: &'a str,
    pub dimensions: Option<usize>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub evaluation: &'a Evaluation,
}

impl<'a> From<&'a CachedAnswerRecord> for RecordView<'a> {
    fn from(record: &'a CachedAnswerRecord) -> Self {
        Self {
            answer_text: record.answer_text(),
            dimensions: record.dimensions(),
            created_at: record.created_at(),
            expires_at: record.expires_at(),
            evaluation: record.evaluation(),
        }
    }
}

/// Print the live records cached for a question, newest first
pub async fn run(config_dir: &Path, args: InspectArgs) -> anyhow::Result<()> {
    let config = super::bootstrap(config_dir)?;
    ensure_shared_store(&config.store)?;
    let cache = crate::create_answer_cache(&config).await?;

    let records = cache.cached_records(&args.question).await?;
    let views: Vec<RecordView<'_>> = records.iter().map(RecordView::from).collect();

    println!("{}", serde_json::to_string_pretty(&views)?);

    Ok(())
}

/// A process-local store starts empty on every run, so it has nothing to show
fn ensure_shared_store(store: &StoreConfig) -> anyhow::Result<()> {
    if store.to_cache_store_config()?.store_type == CacheStoreType::InMemory {
        anyhow::bail!(
            "inspect needs a shared store backend such as redis, but store.backend is '{}'",
            store.backend
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::domain::question::QuestionId;

    #[test]
    fn test_record_view_hides_embedding() {
        let record = CachedAnswerRecord::new(
            QuestionId::new("q1").unwrap(),
            "four",
            Some(vec![0.1, 0.2, 0.3]),
            Evaluation::new(1.0, "Correct"),
            Duration::from_secs(60),
        );

        let json = serde_json::to_value(RecordView::from(&record)).unwrap();

        assert_eq!(json["answer_text"], "four");
        assert_eq!(json["dimensions"], 3);
        assert!(json.get("embedding").is_none());
        assert_eq!(json["evaluation"]["score"], 1.0);
    }

    #[test]
    fn test_inspect_rejects_in_memory_store() {
        let store = StoreConfig::default();

        let err = ensure_shared_store(&store).unwrap_err();

        assert!(err.to_string().contains("shared store backend"));
    }

    #[test]
    fn test_inspect_accepts_redis_store() {
        let store = StoreConfig {
            backend: "redis".to_string(),
            redis_url: Some("redis://localhost:6379".to_string()),
            ..StoreConfig::default()
        };

        assert!(ensure_shared_store(&store).is_ok());
    }
}
