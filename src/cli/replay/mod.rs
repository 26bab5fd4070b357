//! Replay command - resolves a JSONL file of answers with bounded concurrency

use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use futures::stream::{self, StreamExt};
use serde::Deserialize;
use tracing::{info, warn};

use crate::infrastructure::metrics;
use crate::infrastructure::services::AnswerEvaluationCache;

/// Arguments for the replay command
#[derive(Args, Debug, Clone)]
pub struct ReplayArgs {
    /// JSONL file with one `{"question_id", "answer"}` object per line
    #[arg(long)]
    pub input: PathBuf,

    /// Maximum number of answers resolved at once
    #[arg(long, default_value = "8")]
    pub concurrency: NonZeroUsize,
}

/// One line of a replay file
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReplayEntry {
    pub question_id: String,
    pub answer: String,
}

/// Outcome counts of a replay run
#[derive(Debug, Default, PartialEq)]
pub struct ReplaySummary {
    /// Keyed by resolution source, or `error:<stage>` for failures
    pub outcomes: BTreeMap<String, usize>,
    /// Lines that were not valid entries
    pub invalid_lines: usize,
}

impl ReplaySummary {
    pub fn total(&self) -> usize {
        self.outcomes.values().sum::<usize>() + self.invalid_lines
    }

    pub fn count(&self, outcome: &str) -> usize {
        self.outcomes.get(outcome).copied().unwrap_or(0)
    }
}

/// Replay every answer in the input file and print outcome counts plus
/// the Prometheus exposition text
pub async fn run(config_dir: &Path, args: ReplayArgs) -> anyhow::Result<()> {
    let config = super::bootstrap(config_dir)?;
    let prometheus = metrics::init_metrics()?;
    let cache = crate::create_answer_cache(&config).await?;

    let contents = tokio::fs::read_to_string(&args.input).await?;
    let (entries, invalid_lines) = parse_entries(&contents);

    info!(
        input = %args.input.display(),
        entries = entries.len(),
        invalid_lines,
        concurrency = args.concurrency.get(),
        "Starting replay"
    );

    let started = Instant::now();
    let mut summary = replay_entries(&cache, entries, args.concurrency).await;
    summary.invalid_lines = invalid_lines;

    info!(
        total = summary.total(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Replay finished"
    );

    for (outcome, count) in &summary.outcomes {
        println!("{:<24} {}", outcome, count);
    }
    if summary.invalid_lines > 0 {
        println!("{:<24} {}", "invalid_line", summary.invalid_lines);
    }
    println!();
    print!("{}", prometheus.render());

    Ok(())
}

/// Parse a JSONL document, skipping blank lines and counting bad ones
pub fn parse_entries(contents: &str) -> (Vec<ReplayEntry>, usize) {
    let mut entries = Vec::new();
    let mut invalid = 0;

    for (index, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<ReplayEntry>(line) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                warn!(line = index + 1, error = %e, "Skipping invalid replay line");
                invalid += 1;
            }
        }
    }

    (entries, invalid)
}

/// Resolve `entries` with at most `concurrency` in flight
pub async fn replay_entries(
    cache: &AnswerEvaluationCache,
    entries: Vec<ReplayEntry>,
    concurrency: NonZeroUsize,
) -> ReplaySummary {
    let outcomes: Vec<String> = stream::iter(entries)
        .map(|entry| async move {
            match cache
                .resolve_detailed(&entry.question_id, &entry.answer)
                .await
            {
                Ok(resolution) => resolution.source.as_str().to_string(),
                Err(e) => {
                    warn!(question_id = %entry.question_id, error = %e, "Replay entry failed");
                    format!("error:{}", e.stage())
                }
            }
        })
        .buffer_unordered(concurrency.get())
        .collect()
        .await;

    let mut summary = ReplaySummary::default();
    for outcome in outcomes {
        *summary.outcomes.entry(outcome).or_insert(0) += 1;
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::domain::embedding::MockEmbeddingProvider;
    use crate::domain::evaluation::{Evaluation, MockEvaluator};
    use crate::domain::question::{Question, QuestionId};
    use crate::infrastructure::cache::InMemoryCacheStore;
    use crate::infrastructure::question::InMemoryQuestionRepository;

    fn cache(evaluator: Arc<MockEvaluator>) -> AnswerEvaluationCache {
        let question = Question::new(
            QuestionId::new("q1").unwrap(),
            "What is 2 + 2?",
            vec!["4".to_string()],
        )
        .unwrap();

        AnswerEvaluationCache::new(
            Arc::new(InMemoryCacheStore::new()),
            Arc::new(MockEmbeddingProvider::new("mock", 16)),
            evaluator,
            Arc::new(InMemoryQuestionRepository::new().with_question(question)),
        )
    }

    fn entry(question_id: &str, answer: &str) -> ReplayEntry {
        ReplayEntry {
            question_id: question_id.to_string(),
            answer: answer.to_string(),
        }
    }

    #[test]
    fn test_parse_entries() {
        let contents = r#"{"question_id": "q1", "answer": "4"}

not json
{"question_id": "q1"}
{"question_id": "q1", "answer": "four"}
"#;

        let (entries, invalid) = parse_entries(contents);

        assert_eq!(entries, vec![entry("q1", "4"), entry("q1", "four")]);
        assert_eq!(invalid, 2);
    }

    #[tokio::test]
    async fn test_replay_counts_outcomes() {
        let evaluator = Arc::new(MockEvaluator::new(Evaluation::new(1.0, "Correct")));
        let cache = cache(evaluator.clone());

        let first = replay_entries(
            &cache,
            vec![entry("q1", "4"), entry("missing", "4"), entry("q1", "")],
            NonZeroUsize::MIN,
        )
        .await;

        assert_eq!(first.count("fresh"), 1);
        assert_eq!(first.count("error:validation"), 2);

        let second = replay_entries(&cache, vec![entry("q1", " 4 ")], NonZeroUsize::MIN).await;

        assert_eq!(second.count("exact_match"), 1);
        assert_eq!(second.total(), 1);
        assert_eq!(evaluator.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_replay_concurrent_duplicates_evaluate_once() {
        let evaluator = Arc::new(
            MockEvaluator::new(Evaluation::new(0.5, "Partial"))
                .with_delay(std::time::Duration::from_millis(100)),
        );
        let cache = cache(evaluator.clone());

        let entries = vec![entry("q1", "5"); 6];
        let summary = replay_entries(&cache, entries, NonZeroUsize::new(6).unwrap()).await;

        assert_eq!(summary.total(), 6);
        assert_eq!(evaluator.calls(), 1);
    }
}
