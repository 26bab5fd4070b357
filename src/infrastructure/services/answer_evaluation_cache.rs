//! Semantic answer-evaluation cache
//!
//! Reuses a previous evaluation when the same answer, or one close enough in
//! embedding space, was already graded for the question. Otherwise grades the
//! answer with the evaluator and stores the result for later callers.
//!
//! Only evaluator, validation and invariant failures fail a request. Store
//! failures degrade to a miss, and embedding failures degrade to a forced
//! evaluator call.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, error, info_span, warn, Instrument};

use crate::domain::answer_cache::{
    normalize_answer, question_set_key, AnswerCacheConfig, CachedAnswerRecord, Resolution,
    ResolutionSource,
};
use crate::domain::cache::{CacheStore, CacheStoreExt};
use crate::domain::embedding::{EmbeddingProvider, EmbeddingRequest};
use crate::domain::error::UpstreamService;
use crate::domain::evaluation::{Evaluation, Evaluator};
use crate::domain::question::{QuestionId, QuestionRepository};
use crate::domain::similarity::cosine_similarity;
use crate::domain::DomainError;
use crate::infrastructure::metrics::{self, LookupOutcome, StoreOperation};

use super::single_flight::SingleFlight;

/// Longest answer prefix written to logs
const LOG_PREVIEW_CHARS: usize = 50;

/// (set key, normalized answer)
type FlightKey = (String, String);

/// Validated inputs of one resolve call
struct ResolveRequest<'a> {
    question_id: QuestionId,
    set_key: String,
    normalized: &'a str,
    raw: &'a str,
}

/// Cache of answer evaluations keyed by question and answer similarity
pub struct AnswerEvaluationCache {
    store: Arc<dyn CacheStore>,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    evaluator: Arc<dyn Evaluator>,
    questions: Arc<dyn QuestionRepository>,
    config: AnswerCacheConfig,
    flights: SingleFlight<FlightKey, Resolution>,
}

impl fmt::Debug for AnswerEvaluationCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnswerEvaluationCache")
            .field("store", &self.store)
            .field("embedding_provider", &self.embedding_provider)
            .field("evaluator", &self.evaluator)
            .field("questions", &"<QuestionRepository>")
            .field("config", &self.config)
            .finish()
    }
}

impl AnswerEvaluationCache {
    /// Create a cache with default configuration
    pub fn new(
        store: Arc<dyn CacheStore>,
        embedding_provider: Arc<dyn EmbeddingProvider>,
        evaluator: Arc<dyn Evaluator>,
        questions: Arc<dyn QuestionRepository>,
    ) -> Self {
        Self {
            store,
            embedding_provider,
            evaluator,
            questions,
            config: AnswerCacheConfig::default(),
            flights: SingleFlight::new(),
        }
    }

    /// Replace the configuration, rejecting invalid values
    pub fn with_config(mut self, config: AnswerCacheConfig) -> Result<Self, DomainError> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    pub fn config(&self) -> &AnswerCacheConfig {
        &self.config
    }

    /// Evaluation for `answer_text` to question `question_id`
    pub async fn resolve(
        &self,
        question_id: &str,
        answer_text: &str,
    ) -> Result<Evaluation, DomainError> {
        self.resolve_detailed(question_id, answer_text)
            .await
            .map(|resolution| resolution.evaluation)
    }

    /// Like [`resolve`](Self::resolve), failing with `Cancelled` once
    /// `deadline` has elapsed
    pub async fn resolve_with_deadline(
        &self,
        question_id: &str,
        answer_text: &str,
        deadline: Duration,
    ) -> Result<Evaluation, DomainError> {
        tokio::time::timeout(deadline, self.resolve(question_id, answer_text))
            .await
            .map_err(|_| {
                DomainError::cancelled(format!(
                    "resolve exceeded its deadline of {}ms",
                    deadline.as_millis()
                ))
            })?
    }

    /// Evaluation plus the path that produced it
    pub async fn resolve_detailed(
        &self,
        question_id: &str,
        answer_text: &str,
    ) -> Result<Resolution, DomainError> {
        let question_id = QuestionId::new(question_id)?;
        let normalized = normalize_answer(answer_text);

        if normalized.is_empty() {
            return Err(DomainError::validation("Answer text cannot be empty"));
        }

        let request = ResolveRequest {
            set_key: question_set_key(&self.config.key_prefix, &question_id),
            question_id,
            normalized,
            raw: answer_text,
        };

        let span = info_span!("resolve", question_id = %request.question_id);
        self.resolve_request(request).instrument(span).await
    }

    /// Live records cached for a question, newest first.
    ///
    /// Store failures are returned rather than absorbed.
    pub async fn cached_records(
        &self,
        question_id: &str,
    ) -> Result<Vec<CachedAnswerRecord>, DomainError> {
        let question_id = QuestionId::new(question_id)?;
        let set_key = question_set_key(&self.config.key_prefix, &question_id);

        let fields = self.store.get_all_fields(&set_key).await?;
        let mut records = decode_live_records(&set_key, fields.into_iter());
        records.sort_by(|a, b| b.created_at().cmp(&a.created_at()));

        Ok(records)
    }

    async fn resolve_request(&self, request: ResolveRequest<'_>) -> Result<Resolution, DomainError> {
        if let Some(record) = self.lookup_exact(&request).await {
            debug!(answer = preview(request.normalized), "Exact match");
            metrics::record_lookup(LookupOutcome::ExactHit);
            return Ok(Resolution::new(
                record.evaluation().clone(),
                ResolutionSource::ExactMatch,
            ));
        }

        if !self.config.single_flight {
            return self.resolve_uncached(&request).await;
        }

        let key = (request.set_key.clone(), request.normalized.to_string());
        let flight = self.flights.run(key, self.resolve_uncached(&request)).await?;

        if flight.joined {
            debug!(answer = preview(request.normalized), "Joined in-flight evaluation");
            metrics::record_single_flight_join();
        }

        Ok(flight.value)
    }

    /// Similarity scan, then evaluator on a miss
    async fn resolve_uncached(&self, request: &ResolveRequest<'_>) -> Result<Resolution, DomainError> {
        let embedding = self.embed(request.normalized).await;

        if let Some(ref embedding) = embedding {
            let records = self.load_records(&request.set_key).await;
            ensure_dimensions(embedding, &records)?;

            if let Some((record, similarity)) = best_match(embedding, &records)? {
                metrics::record_best_similarity(similarity);

                if similarity >= self.config.similarity_threshold {
                    debug!(
                        answer = preview(request.normalized),
                        matched = preview(record.answer_text()),
                        similarity,
                        "Similar answer hit"
                    );
                    metrics::record_lookup(LookupOutcome::SimilarHit);
                    return Ok(Resolution::new(
                        record.evaluation().clone(),
                        ResolutionSource::Similar { similarity },
                    ));
                }

                debug!(similarity, threshold = self.config.similarity_threshold, "Best match below threshold");
            }
        }

        metrics::record_lookup(LookupOutcome::Miss);
        debug!(answer = preview(request.normalized), "Cache miss, evaluating");

        let source = if embedding.is_some() {
            ResolutionSource::Fresh
        } else {
            ResolutionSource::FreshDegraded
        };

        let evaluation = self.evaluate(request).await?;

        let record = CachedAnswerRecord::new(
            request.question_id.clone(),
            request.raw,
            embedding,
            evaluation.clone(),
            self.config.evaluation_ttl(),
        );
        self.store_record(&request.set_key, request.normalized, &record).await;

        Ok(Resolution::new(evaluation, source))
    }

    async fn lookup_exact(&self, request: &ResolveRequest<'_>) -> Option<CachedAnswerRecord> {
        let data = match self
            .store
            .get_field(&request.set_key, request.normalized)
            .await
        {
            Ok(data) => data?,
            Err(e) => {
                warn!(error = %e, "Cache read failed, treating as miss");
                metrics::record_store_error(StoreOperation::Read);
                return None;
            }
        };

        match CachedAnswerRecord::from_bytes(&data) {
            Ok(record) if !record.is_expired() => Some(record),
            Ok(_) => None,
            Err(e) => {
                warn!(set_key = %request.set_key, error = %e, "Skipping undecodable cached answer");
                None
            }
        }
    }

    async fn load_records(&self, set_key: &str) -> Vec<CachedAnswerRecord> {
        match self.store.get_all_fields(set_key).await {
            Ok(fields) => decode_live_records(set_key, fields.into_iter()),
            Err(e) => {
                warn!(error = %e, "Cache read failed, treating as empty");
                metrics::record_store_error(StoreOperation::Read);
                Vec::new()
            }
        }
    }

    /// Embedding of `text`, or `None` when the provider cannot deliver one
    async fn embed(&self, text: &str) -> Option<Vec<f32>> {
        let request = EmbeddingRequest::new(&self.config.embedding_model, text);
        let timeout = self.config.embedding_timeout();

        let result = match tokio::time::timeout(timeout, self.embedding_provider.embed(request)).await {
            Ok(result) => result.and_then(|response| {
                if response.vector().is_empty() {
                    Err(DomainError::malformed_response(
                        UpstreamService::Embedding,
                        "Provider returned an empty embedding",
                    ))
                } else if response.vector().iter().any(|v| !v.is_finite()) {
                    Err(DomainError::malformed_response(
                        UpstreamService::Embedding,
                        "Provider returned a non-finite embedding component",
                    ))
                } else {
                    Ok(response.into_vector())
                }
            }),
            Err(_) => Err(DomainError::unavailable(
                UpstreamService::Embedding,
                format!("Embedding timed out after {}ms", timeout.as_millis()),
            )),
        };

        match result {
            Ok(vector) => Some(vector),
            Err(e) => {
                let e = e.attributed_to(UpstreamService::Embedding);
                warn!(error = %e, "Embedding failed, skipping similarity lookup");
                metrics::record_upstream_error(&e);
                metrics::record_degraded();
                None
            }
        }
    }

    async fn evaluate(&self, request: &ResolveRequest<'_>) -> Result<Evaluation, DomainError> {
        let question = self
            .questions
            .get(&request.question_id)
            .await?
            .ok_or_else(|| {
                DomainError::not_found(format!("Question '{}' not found", request.question_id))
            })?;

        let timeout = self.config.evaluator_timeout();

        let evaluation = tokio::time::timeout(timeout, self.evaluator.evaluate(&question, request.raw))
            .await
            .unwrap_or_else(|_| {
                Err(DomainError::unavailable(
                    UpstreamService::Evaluator,
                    format!("Evaluator timed out after {}ms", timeout.as_millis()),
                ))
            })
            .map_err(|e| {
                let e = e.attributed_to(UpstreamService::Evaluator);
                warn!(error = %e, evaluator = self.evaluator.evaluator_name(), "Evaluation failed");
                metrics::record_upstream_error(&e);
                e
            })?;

        if let Err(e) = evaluation.validate() {
            error!(
                error = %e,
                evaluator = self.evaluator.evaluator_name(),
                "Rejecting out-of-range evaluation"
            );
            return Err(e);
        }

        Ok(evaluation)
    }

    /// Best-effort write; failures are logged and dropped
    async fn store_record(&self, set_key: &str, field_key: &str, record: &CachedAnswerRecord) {
        let result = self
            .store
            .set_json_field(set_key, field_key, record, self.config.evaluation_ttl())
            .await;

        if let Err(e) = result {
            warn!(error = %e, "Cache write failed, evaluation not cached");
            metrics::record_store_error(StoreOperation::Write);
        }
    }
}

/// Decodes field values, dropping expired and undecodable records
fn decode_live_records(
    set_key: &str,
    fields: impl Iterator<Item = (String, Vec<u8>)>,
) -> Vec<CachedAnswerRecord> {
    let now = Utc::now();

    fields
        .filter_map(|(field, data)| match CachedAnswerRecord::from_bytes(&data) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(
                    set_key,
                    field = preview(&field),
                    error = %e,
                    "Skipping undecodable cached answer"
                );
                None
            }
        })
        .filter(|record| !record.is_expired_at(now))
        .collect()
}

/// All embeddings stored for a question share one dimensionality
fn ensure_dimensions(embedding: &[f32], records: &[CachedAnswerRecord]) -> Result<(), DomainError> {
    for record in records {
        if let Some(dimensions) = record.dimensions() {
            if dimensions != embedding.len() {
                error!(
                    stored = dimensions,
                    requested = embedding.len(),
                    "Embedding dimensionality changed for question"
                );
                return Err(DomainError::dimension_mismatch(dimensions, embedding.len()));
            }
        }
    }

    Ok(())
}

/// Most similar record with an embedding; ties go to the newest record
fn best_match<'a>(
    embedding: &[f32],
    records: &'a [CachedAnswerRecord],
) -> Result<Option<(&'a CachedAnswerRecord, f64)>, DomainError> {
    let mut best: Option<(&CachedAnswerRecord, f64)> = None;

    for record in records {
        let Some(candidate) = record.embedding() else {
            continue;
        };

        let similarity = cosine_similarity(embedding, candidate)?;

        let better = match best {
            None => true,
            Some((current, best_similarity)) => {
                similarity > best_similarity
                    || (similarity == best_similarity && record.created_at() > current.created_at())
            }
        };

        if better {
            best = Some((record, similarity));
        }
    }

    Ok(best)
}

fn preview(text: &str) -> &str {
    match text.char_indices().nth(LOG_PREVIEW_CHARS) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}
